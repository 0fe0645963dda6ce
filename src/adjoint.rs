//! Forward/backward pairs as values.
//!
//! The kernels themselves are free functions. [`Adjoint`] packages a kernel
//! and its `adj_*` partner behind one interface so that generic code (the
//! finite-difference checker in particular) can drive either half.

use core::marker::PhantomData;

/// A primitive with a paired reverse-mode adjoint.
///
/// `backward` accumulates into `adj_input`; it never overwrites it.
pub trait Adjoint {
    type Input;
    type Output;

    fn forward(&self, input: &Self::Input) -> Self::Output;

    fn backward(
        &self,
        input: &Self::Input,
        adj_input: &mut Self::Input,
        adj_output: &Self::Output,
    );
}

/// An [`Adjoint`] built from two closures.
#[derive(Debug, Clone, Copy)]
pub struct Op<I, O, F, B> {
    forward: F,
    backward: B,
    _marker: PhantomData<fn(&I) -> O>,
}

/// Pairs a forward closure with its adjoint.
pub fn op<I, O, F, B>(forward: F, backward: B) -> Op<I, O, F, B>
where
    F: Fn(&I) -> O,
    B: Fn(&I, &mut I, &O),
{
    Op {
        forward,
        backward,
        _marker: PhantomData,
    }
}

impl<I, O, F, B> Adjoint for Op<I, O, F, B>
where
    F: Fn(&I) -> O,
    B: Fn(&I, &mut I, &O),
{
    type Input = I;
    type Output = O;

    fn forward(&self, input: &I) -> O {
        (self.forward)(input)
    }

    fn backward(&self, input: &I, adj_input: &mut I, adj_output: &O) {
        (self.backward)(input, adj_input, adj_output)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_op_square() {
        let square = op(|x: &f64| x * x, |x, adj_x, adj_ret| *adj_x += 2. * x * adj_ret);
        assert_eq!(square.forward(&3.), 9.);
        let mut adj = 1.;
        square.backward(&3., &mut adj, &0.5);
        square.backward(&3., &mut adj, &0.5);
        assert_eq!(adj, 7.);
    }
}
