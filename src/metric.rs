use nalgebra::DMatrix;

use crate::{error::Error, image::Raster};

pub trait ErrorMetric {
    /// Lower is more similar, zero means identical.
    fn normalized_error(&self, ground_truth: &Raster, candidate: &Raster) -> crate::Result<f64>;
}

/// Root mean squared error divided by the root mean square of the ground truth.
#[derive(Clone, Copy, Debug, Default)]
pub struct EuclideanNrmse;

impl ErrorMetric for EuclideanNrmse {
    fn normalized_error(&self, ground_truth: &Raster, candidate: &Raster) -> crate::Result<f64> {
        if ground_truth.shape() != candidate.shape() {
            return Err(Error::ShapeMismatch {
                expected: ground_truth.shape(),
                actual: candidate.shape(),
            });
        }
        let (squared_error, squared_reference) = ground_truth
            .dots()
            .iter()
            .zip(candidate.dots())
            .fold((0.0, 0.0), |(error, reference), (&truth, &value)| {
                let truth = truth as f64;
                let difference = truth - value as f64;
                (error + difference * difference, reference + truth * truth)
            });
        if squared_error == 0.0 {
            return Ok(0.0);
        }
        if squared_reference == 0.0 {
            return Ok(f64::INFINITY);
        }
        Ok((squared_error / squared_reference).sqrt())
    }
}

pub fn frobenius_error(reference: &DMatrix<f64>, approximation: &DMatrix<f64>) -> crate::Result<f64> {
    if reference.shape() != approximation.shape() {
        return Err(Error::ShapeMismatch {
            expected: reference.shape(),
            actual: approximation.shape(),
        });
    }
    Ok((reference - approximation).norm())
}
