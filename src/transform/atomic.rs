use core::fmt::Debug;
use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use super::Transform;
use crate::math::{Quat, Real, Vec3};

/// Scalars with a lock-free fetch-add.
///
/// The add is a compare-exchange loop on the bit pattern, so concurrent
/// writers never lose an update.
pub trait AtomicScalar: Real {
    type Atomic: Debug + Send + Sync;

    fn new_atomic(v: Self) -> Self::Atomic;

    fn atomic_load(a: &Self::Atomic) -> Self;

    /// Adds `v` and returns the previous value.
    fn atomic_fetch_add(a: &Self::Atomic, v: Self) -> Self;
}

impl AtomicScalar for f32 {
    type Atomic = AtomicU32;

    fn new_atomic(v: f32) -> AtomicU32 {
        AtomicU32::new(v.to_bits())
    }

    fn atomic_load(a: &AtomicU32) -> f32 {
        f32::from_bits(a.load(Ordering::Relaxed))
    }

    fn atomic_fetch_add(a: &AtomicU32, v: f32) -> f32 {
        let (Ok(prev) | Err(prev)) = a.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
            Some((f32::from_bits(bits) + v).to_bits())
        });
        f32::from_bits(prev)
    }
}

impl AtomicScalar for f64 {
    type Atomic = AtomicU64;

    fn new_atomic(v: f64) -> AtomicU64 {
        AtomicU64::new(v.to_bits())
    }

    fn atomic_load(a: &AtomicU64) -> f64 {
        f64::from_bits(a.load(Ordering::Relaxed))
    }

    fn atomic_fetch_add(a: &AtomicU64, v: f64) -> f64 {
        let (Ok(prev) | Err(prev)) = a.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
            Some((f64::from_bits(bits) + v).to_bits())
        });
        f64::from_bits(prev)
    }
}

/// Transform slot that several lanes may accumulate into.
#[derive(Debug)]
pub struct AtomicTransform<T: AtomicScalar> {
    p: [T::Atomic; 3],
    q: [T::Atomic; 4],
}

impl<T: AtomicScalar> AtomicTransform<T> {
    pub fn new(t: &Transform<T>) -> Self {
        Self {
            p: core::array::from_fn(|i| T::new_atomic(t[i])),
            q: core::array::from_fn(|i| T::new_atomic(t[i + 3])),
        }
    }

    pub fn zeros() -> Self {
        let zero = Quat::from_parts(T::zero(), Vec3::zeros());
        Self::new(&Transform::new(Vec3::zeros(), zero))
    }

    pub fn load(&self) -> Transform<T> {
        let p = Vec3::from_fn(|i, _| T::atomic_load(&self.p[i]));
        let q = Quat::new(
            T::atomic_load(&self.q[3]),
            T::atomic_load(&self.q[0]),
            T::atomic_load(&self.q[1]),
            T::atomic_load(&self.q[2]),
        );
        Transform::new(p, q)
    }
}

/// Component-wise atomic `*addr += value`, returning the previous contents.
///
/// Each of the seven scalars is updated atomically on its own; the returned
/// transform is not a consistent snapshot under contention.
pub fn atomic_add<T: AtomicScalar>(
    addr: &AtomicTransform<T>,
    value: &Transform<T>,
) -> Transform<T> {
    let mut prev = Transform::new(Vec3::zeros(), Quat::from_parts(T::zero(), Vec3::zeros()));
    for (i, slot) in addr.p.iter().chain(addr.q.iter()).enumerate() {
        prev[i] = T::atomic_fetch_add(slot, value[i]);
    }
    prev
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_atomic_add_returns_previous() {
        let slot = AtomicTransform::new(&Transform::<f64>::identity());
        let delta = Transform::new(Vector3::new(1., 2., 3.), Quat::new(0.5, 0., 0., 0.));
        let prev = atomic_add(&slot, &delta);
        assert_eq!(prev, Transform::identity());
        let now = slot.load();
        assert_eq!(now.p, Vector3::new(1., 2., 3.));
        assert_eq!(now.q, Quat::new(1.5, 0., 0., 0.));
    }

    #[test]
    fn test_atomic_add_concurrent() {
        let slot = AtomicTransform::<f32>::zeros();
        let delta = Transform::new(Vector3::new(1., -1., 0.5), Quat::new(1., 0.25, 0., 2.));
        let threads = 8;
        let per_thread = 1000;
        std::thread::scope(|s| {
            for _ in 0..threads {
                s.spawn(|| {
                    for _ in 0..per_thread {
                        atomic_add(&slot, &delta);
                    }
                });
            }
        });
        // every increment is exactly representable in f32
        let n = (threads * per_thread) as f32;
        let total = slot.load();
        assert_relative_eq!(total.p, delta.p * n);
        assert_relative_eq!(total.q.coords, delta.q.coords * n);
    }
}
