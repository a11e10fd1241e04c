//! Integration test: values written through off-heap views read back
//! bit-for-bit until the storage is overrun, across every shape and both
//! precisions.

use gyre_arena::{CacheConfig, OffHeapFactory};
use gyre_core::{ElementAccess, Scalar, Shape};

const SHAPES: [Shape; 8] = [
    Shape::Vec2,
    Shape::Vec3,
    Shape::Vec4,
    Shape::VecN(13),
    Shape::Mat2,
    Shape::Mat3,
    Shape::Mat4,
    Shape::MatN(6),
];

fn pattern<T: Scalar>(seed: usize, len: usize) -> Vec<T> {
    (0..len)
        .map(|i| T::from_f64((seed * 31 + i) as f64 * 0.1 - 7.0))
        .collect()
}

fn round_trip<T: Scalar>(factory: &OffHeapFactory) {
    let views: Vec<_> = SHAPES
        .iter()
        .enumerate()
        .map(|(seed, &shape)| {
            let view = factory.next::<T>(shape).unwrap();
            view.copy_from_slice(&pattern::<T>(seed, shape.len()));
            view
        })
        .collect();

    for (seed, view) in views.iter().enumerate() {
        let expected = pattern::<T>(seed, view.len());
        let mut actual = vec![T::ZERO; view.len()];
        ElementAccess::copy_to_slice(view, &mut actual, 0, view.len());
        for (a, e) in actual.iter().zip(&expected) {
            assert_eq!(a.to_f64().to_bits(), e.to_f64().to_bits());
        }
    }
}

#[test]
fn single_precision_round_trip() {
    let factory = OffHeapFactory::new(CacheConfig::default()).unwrap();
    round_trip::<f32>(&factory);
}

#[test]
fn double_precision_round_trip() {
    let factory = OffHeapFactory::new(CacheConfig::default()).unwrap();
    round_trip::<f64>(&factory);
}

#[test]
fn element_wise_access_matches_bulk_copy() {
    let factory = OffHeapFactory::new(CacheConfig::new(4)).unwrap();
    let m = factory.mat4::<f64>();
    for row in 0..4 {
        for col in 0..4 {
            m.set_at(row, col, (row * 10 + col) as f64);
        }
    }
    let mut out = [0.0f64; 16];
    m.copy_to_slice(&mut out, 0, 16);
    assert_eq!(out[6], 12.0);
    assert_eq!(m.row(3).to_vec(), vec![30.0, 31.0, 32.0, 33.0]);
}

#[test]
fn explicit_free_after_use() {
    let factory = OffHeapFactory::new(CacheConfig::new(1)).unwrap();
    let expected = factory.allocation_count();
    factory.vec3::<f32>().fill(1.0);
    assert_eq!(factory.free(), expected);
}
