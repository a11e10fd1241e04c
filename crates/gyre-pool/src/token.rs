//! Thread identity and liveness.
//!
//! Every thread that touches a pool gets a [`ThreadKey`] from a
//! thread-local token. The token also owns a liveness flag shared with
//! every pool entry assigned to the thread; its destructor clears the
//! flag when the thread exits, which is what lets a later sweep reclaim
//! the entry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gyre_core::ThreadKey;

struct ThreadToken {
    key: ThreadKey,
    alive: Arc<AtomicBool>,
}

impl ThreadToken {
    fn new() -> Self {
        Self {
            key: ThreadKey::next(),
            alive: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl Drop for ThreadToken {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }
}

thread_local! {
    static TOKEN: ThreadToken = ThreadToken::new();
}

/// The calling thread's key.
///
/// During thread teardown, after the token is gone, this returns a fresh
/// key that no pool has seen.
pub fn current_key() -> ThreadKey {
    TOKEN.try_with(|token| token.key).unwrap_or_else(|_| ThreadKey::next())
}

/// The calling thread's key and liveness flag, or `None` once the
/// token has been destroyed during thread teardown.
pub(crate) fn current() -> Option<(ThreadKey, Arc<AtomicBool>)> {
    TOKEN
        .try_with(|token| (token.key, Arc::clone(&token.alive)))
        .ok()
}

/// Whether a liveness flag still belongs to a running thread.
pub(crate) fn is_alive(flag: &AtomicBool) -> bool {
    flag.load(Ordering::Acquire)
}
