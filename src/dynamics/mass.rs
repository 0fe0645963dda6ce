use nalgebra::DMatrix;

use super::{row_index, Articulation};
use crate::math::Real;
use crate::spatial::SpatialMatrix;

/// Writes the block diagonal mass matrix of `articulation` into `m`.
///
/// The output is `(joint_count * 6)` square, row-major at `m_start`, and
/// block `l` is the spatial inertia of joint `joint_start + l`. Off-diagonal
/// blocks are left as they are.
pub fn spatial_mass<T: Real>(
    i_s: &[SpatialMatrix<T>],
    articulation: &Articulation,
    m_start: usize,
    m: &mut [T],
) {
    let stride = articulation.joint_count * 6;
    let m = &mut m[m_start..];
    for l in 0..articulation.joint_count {
        let inertia = &i_s[articulation.joint_start + l];
        for i in 0..6 {
            for j in 0..6 {
                m[row_index(stride, l * 6 + i, l * 6 + j)] = inertia[(i, j)];
            }
        }
    }
}

pub fn adj_spatial_mass<T: Real>(
    _i_s: &[SpatialMatrix<T>],
    articulation: &Articulation,
    m_start: usize,
    adj_i_s: &mut [SpatialMatrix<T>],
    adj_m: &[T],
) {
    let stride = articulation.joint_count * 6;
    let adj_m = &adj_m[m_start..];
    for l in 0..articulation.joint_count {
        let adj_inertia = &mut adj_i_s[articulation.joint_start + l];
        for i in 0..6 {
            for j in 0..6 {
                adj_inertia[(i, j)] += adj_m[row_index(stride, l * 6 + i, l * 6 + j)];
            }
        }
    }
}

/// Owned mass matrix of a single articulation.
#[derive(Debug, Clone, PartialEq)]
pub struct MassMatrix<T: Real> {
    val: DMatrix<T>,
}

impl<T: Real> MassMatrix<T> {
    pub fn assemble(i_s: &[SpatialMatrix<T>], articulation: &Articulation) -> Self {
        let n = articulation.joint_count * 6;
        let mut buf = vec![T::zero(); n * n];
        spatial_mass(i_s, articulation, 0, &mut buf);
        Self {
            val: DMatrix::from_row_slice(n, n, &buf),
        }
    }

    pub fn block(&self, row: usize, col: usize) -> SpatialMatrix<T> {
        self.val.fixed_view::<6, 6>(row * 6, col * 6).into_owned()
    }

    pub fn as_matrix(&self) -> &DMatrix<T> {
        &self.val
    }

    pub fn into_inner(self) -> DMatrix<T> {
        self.val
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gradcheck::{compare, finite_difference, GradCheckParam};
    use nalgebra::Matrix6;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_block_diagonal() {
        let i0 = Matrix6::from_fn(|i, j| (i * 6 + j) as f64);
        let i1 = Matrix6::from_fn(|i, j| -((i + j) as f64) - 1.);
        let mass = MassMatrix::assemble(&[i0, i1], &Articulation::new(0, 2));
        assert_eq!(mass.as_matrix().shape(), (12, 12));
        assert_eq!(mass.block(0, 0), i0);
        assert_eq!(mass.block(1, 1), i1);
        assert_eq!(mass.block(0, 1), Matrix6::zeros());
        assert_eq!(mass.block(1, 0), Matrix6::zeros());
    }

    #[test]
    fn test_offsets_and_untouched_blocks() {
        // three joints in the batch, the articulation is the last two
        let i_s: Vec<_> = (0..3).map(|k| Matrix6::from_element(k as f64 + 1.)).collect();
        let art = Articulation::new(1, 2);
        let m_start = 4;
        let mut m = vec![9.; m_start + 144];
        spatial_mass(&i_s, &art, m_start, &mut m);
        assert!(m[..m_start].iter().all(|x| *x == 9.));
        let body = &m[m_start..];
        assert_eq!(body[row_index(12, 0, 0)], 2.);
        assert_eq!(body[row_index(12, 11, 11)], 3.);
        // off diagonal keeps its previous contents
        assert_eq!(body[row_index(12, 0, 6)], 9.);
        assert_eq!(body[row_index(12, 7, 2)], 9.);
    }

    #[test]
    fn test_adj_mass_gradcheck() {
        let mut rng = StdRng::seed_from_u64(30);
        let art = Articulation::new(1, 2);
        let m_start = 2;
        let n = 12;
        let i_s: Vec<Matrix6<f64>> = (0..3)
            .map(|_| Matrix6::from_fn(|_, _| rng.gen_range(-1.0..1.0)))
            .collect();
        let adj_m: Vec<f64> = (0..m_start + n * n).map(|_| rng.gen_range(-1.0..1.0)).collect();

        let mut adj_i_s = vec![Matrix6::zeros(); 3];
        adj_spatial_mass(&i_s, &art, m_start, &mut adj_i_s, &adj_m);
        let analytic: Vec<f64> = adj_i_s.iter().flat_map(|x| x.iter().copied()).collect();

        let flat: Vec<f64> = i_s.iter().flat_map(|x| x.iter().copied()).collect();
        let numeric = finite_difference(
            |xs| {
                let i_s: Vec<_> = xs.chunks(36).map(Matrix6::<f64>::from_column_slice).collect();
                let mut m = vec![0.; m_start + n * n];
                spatial_mass(&i_s, &art, m_start, &mut m);
                m.iter().zip(&adj_m).map(|(a, b)| a * b).sum()
            },
            &flat,
            1e-6,
        );
        compare(&analytic, &numeric, &GradCheckParam::default()).unwrap();
        assert_eq!(adj_i_s[0], Matrix6::zeros());
    }

    #[test]
    fn test_adj_mass_ignores_off_diagonal() {
        let art = Articulation::new(0, 2);
        let i_s = vec![Matrix6::<f64>::zeros(); 2];
        let mut adj_m = vec![0.; 144];
        adj_m[row_index(12, 1, 8)] = 5.;
        adj_m[row_index(12, 7, 7)] = 2.;
        let mut adj_i_s = vec![Matrix6::identity(); 2];
        adj_spatial_mass(&i_s, &art, 0, &mut adj_i_s, &adj_m);
        assert_eq!(adj_i_s[0], Matrix6::identity());
        assert_eq!(adj_i_s[1][(1, 1)], 3.);
        assert_eq!(adj_i_s[1].sum(), 8.);
    }
}
