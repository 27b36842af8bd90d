//! Adapter that exposes a [`Criterion`] as an `argmin` problem.
//!
//! The criterion is minimized directly. Analytic gradients are forwarded
//! after validation; when absent, the gradient is finite-differenced from
//! the cost closure.
use std::cell::RefCell;

use crate::optimization::{
    criterion_optimizer::{
        traits::Criterion,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
    errors::OptError,
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a [`Criterion`] to `argmin`'s `CostFunction` and `Gradient`.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: Criterion> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: Criterion> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

impl<F: Criterion> CostFunction for ArgMinAdapter<'_, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate the criterion and reject non-finite values with
    /// [`OptError::NonFiniteCost`].
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err(OptError::NonFiniteCost { value: output }.into());
        }
        Ok(output)
    }
}

impl<F: Criterion> Gradient for ArgMinAdapter<'_, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Analytic gradient when available, otherwise central differences with a
    /// forward-difference retry.
    ///
    /// The FD closure must return `f64`, so the first cost error is parked in
    /// `closure_err` and `NaN` is returned; it is re-raised after FD.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_func);
                if closure_err.borrow().is_some() || validate_grad(&fd_grad, dim).is_err() {
                    return run_forward_diff(theta, &cost_func, &closure_err);
                }
                Ok(fd_grad)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn run_forward_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Grad, Error> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Cost forwarding without sign changes and non-finite rejection.
    // - Analytic vs finite-difference gradient paths.
    // - Propagation of errors raised during FD evaluations.
    // -------------------------------------------------------------------------

    struct Quadratic;

    impl Criterion for Quadratic {
        type Data = Theta;

        fn value(&self, theta: &Theta, center: &Theta) -> OptResult<Cost> {
            let d = theta - center;
            Ok(d.dot(&d))
        }

        fn check(&self, _theta: &Theta, _center: &Theta) -> OptResult<()> {
            Ok(())
        }
    }

    struct Exploding;

    impl Criterion for Exploding {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<Cost> {
            if theta[0] > 1.0 {
                return Err(OptError::QPNotConverged { iterations: 1, step: 1.0, gap: 1.0 });
            }
            Ok(f64::INFINITY)
        }

        fn check(&self, _theta: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify the cost is forwarded as-is and the FD gradient matches the
    // analytic gradient of a quadratic.
    //
    // Given
    // -----
    // - c(θ) = ||θ − (1, −2)||², evaluated at θ = (0, 0).
    //
    // Expect
    // ------
    // - cost == 5; gradient ≈ (−2, 4).
    fn cost_and_fd_gradient_of_quadratic() {
        let center = array![1.0, -2.0];
        let adapter = ArgMinAdapter::new(&Quadratic, &center);
        let theta = array![0.0, 0.0];

        assert_abs_diff_eq!(adapter.cost(&theta).unwrap(), 5.0, epsilon = 1e-12);
        let g = adapter.gradient(&theta).unwrap();
        assert_abs_diff_eq!(g[0], -2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(g[1], 4.0, epsilon = 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // Ensure non-finite costs and errors raised inside the criterion both
    // surface as `OptError` after the argmin round trip.
    //
    // Given
    // -----
    // - A criterion returning +∞ below 1 and an error above 1.
    //
    // Expect
    // ------
    // - `NonFiniteCost` at θ = 0; `QPNotConverged` at θ = 2.
    fn criterion_errors_survive_argmin() {
        let adapter = ArgMinAdapter::new(&Exploding, &());

        let err = OptError::from(adapter.cost(&array![0.0]).unwrap_err());
        assert!(matches!(err, OptError::NonFiniteCost { .. }));

        let err = OptError::from(adapter.cost(&array![2.0]).unwrap_err());
        assert!(matches!(err, OptError::QPNotConverged { .. }));
    }
}
