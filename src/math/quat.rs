use super::{two, Quat, Real, Vec3};

pub fn quat_identity<T: Real>() -> Quat<T> {
    Quat::from_parts(T::one(), Vec3::zeros())
}

/// Rotates `x` by `q`.
///
/// Uses the expanded form `x (2w² - 1) + 2w (u × x) + 2u (u · x)`, which
/// is only a rotation for unit `q`. Non-unit inputs are not renormalized.
#[inline]
pub fn quat_rotate<T: Real>(q: &Quat<T>, x: &Vec3<T>) -> Vec3<T> {
    let u = q.imag();
    let w = q.scalar();
    let c = two::<T>() * w * w - T::one();
    x * c + u.cross(x) * (two::<T>() * w) + u * (two::<T>() * u.dot(x))
}

#[inline]
pub fn adj_quat_rotate<T: Real>(
    q: &Quat<T>,
    x: &Vec3<T>,
    adj_q: &mut Quat<T>,
    adj_x: &mut Vec3<T>,
    adj_ret: &Vec3<T>,
) {
    let u = q.imag();
    let w = q.scalar();
    let two = two::<T>();
    let c = two * w * w - T::one();
    let g = adj_ret;

    *adj_x += g * c + g.cross(&u) * (two * w) + u * (two * u.dot(g));

    let adj_w = two * two * w * g.dot(x) + two * g.dot(&u.cross(x));
    let adj_u = x.cross(g) * (two * w) + (g * u.dot(x) + x * u.dot(g)) * two;
    adj_q.coords += Quat::from_parts(adj_w, adj_u).coords;
}

/// Hamilton product `a * b`.
#[inline]
pub fn quat_mul<T: Real>(a: &Quat<T>, b: &Quat<T>) -> Quat<T> {
    a * b
}

#[inline]
pub fn adj_quat_mul<T: Real>(
    a: &Quat<T>,
    b: &Quat<T>,
    adj_a: &mut Quat<T>,
    adj_b: &mut Quat<T>,
    adj_ret: &Quat<T>,
) {
    // <g, a b> = <g b*, a> = <a* g, b>
    adj_a.coords += (adj_ret * b.conjugate()).coords;
    adj_b.coords += (a.conjugate() * adj_ret).coords;
}

/// Inverse of a unit quaternion, i.e. its conjugate.
#[inline]
pub fn quat_inverse<T: Real>(q: &Quat<T>) -> Quat<T> {
    q.conjugate()
}

#[inline]
pub fn adj_quat_inverse<T: Real>(_q: &Quat<T>, adj_q: &mut Quat<T>, adj_ret: &Quat<T>) {
    adj_q.coords += adj_ret.conjugate().coords;
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{UnitQuaternion, Vector3};

    #[test]
    fn test_rotate_matches_unit_quaternion() {
        let uq = UnitQuaternion::from_euler_angles(0.3, -1.1, 2.0);
        let x = Vector3::new(0.5, -2.0, 1.5);
        let r = quat_rotate(uq.quaternion(), &x);
        assert_relative_eq!(r, uq * x, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_undoes_rotation() {
        let q = *UnitQuaternion::from_euler_angles(-0.7, 0.2, 0.9).quaternion();
        let x = Vector3::new(1.0, 2.0, 3.0);
        let back = quat_rotate(&quat_inverse(&q), &quat_rotate(&q, &x));
        assert_relative_eq!(back, x, epsilon = 1e-12);
    }

    #[test]
    fn test_adj_mul_identity() {
        let a = quat_identity::<f64>();
        let b = Quat::new(0.1, 0.2, 0.3, 0.4);
        let g = Quat::new(1.0, -1.0, 2.0, 0.5);
        let mut adj_a = Quat::new(0.0, 0.0, 0.0, 0.0);
        let mut adj_b = Quat::new(0.0, 0.0, 0.0, 0.0);
        adj_quat_mul(&a, &b, &mut adj_a, &mut adj_b, &g);
        assert_relative_eq!(adj_b, g);
    }
}
