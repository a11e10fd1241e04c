//! Integration test: numeric code written against the prelude, driven by
//! every strategy including a thread pool.

use std::sync::Arc;
use std::thread;

use gyre::prelude::*;

/// Row-major 2×2 product written only against `ElementAccess`.
fn mul2<'a>(alloc: Allocator<'a>, a: &MappedView<f64>, b: &MappedView<f64>) -> AnyView<'a, f64> {
    let mut out = alloc.next::<f64>(Shape::Mat2).unwrap();
    for r in 0..2 {
        for c in 0..2 {
            let dot: f64 = (0..2).map(|k| a.get_at(r, k) * b.get_at(k, c)).sum();
            out.set_at(r, c, dot);
        }
    }
    out
}

#[test]
fn product_is_identical_across_strategies() {
    let cyclic = CyclicFactory::new(CacheConfig::default()).unwrap();
    let off_heap = OffHeapFactory::new(CacheConfig::default()).unwrap();
    let a = cyclic.mat2::<f64>();
    a.copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
    let b = cyclic.mat2::<f64>();
    b.copy_from_slice(&[0.0, 1.0, 1.0, 0.0]);

    let results: Vec<Vec<f64>> = [
        Allocator::from(&cyclic),
        Allocator::from(&off_heap),
        Allocator::from(&StaticFactory),
    ]
    .into_iter()
    .map(|alloc| mul2(alloc, a, b).to_vec())
    .collect();

    for result in &results {
        assert_eq!(result, &vec![2.0, 1.0, 4.0, 3.0]);
    }
}

#[test]
fn pooled_threads_widen_their_own_results() {
    let pool = Arc::new(ThreadPoolFactory::cyclic(CacheConfig::default()).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                pool.with(|factory| {
                    let single = factory.vec3::<f32>();
                    single.fill(t as f32 + 0.5);
                    let mut double = factory.vec3::<f64>();
                    widen(&single, &mut double);
                    double.to_vec()
                })
                .unwrap()
            })
        })
        .collect();

    for (t, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), vec![t as f64 + 0.5; 3]);
    }
}

#[test]
fn narrowing_rounds_into_single_precision() {
    let factory = OffHeapFactory::new(CacheConfig::new(1)).unwrap();
    let wide = factory.vec2::<f64>();
    wide.copy_from_slice(&[0.1, 1.0e-50]);
    let mut thin = StaticFactory.next::<f32>(Shape::Vec2).unwrap();
    narrow(&wide, &mut thin);
    assert_eq!(thin.as_slice(), &[0.1f32, 0.0]);
}
