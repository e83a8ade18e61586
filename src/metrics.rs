use crate::Matrix;
use crate::error::{Result, SvdError};
use ndarray::{ArrayBase, Data, Dimension};

fn check_shapes(a: &Matrix, b: &Matrix) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(SvdError::ShapeMismatch {
            expected: a.shape().to_vec(),
            found: b.shape().to_vec(),
        });
    }
    Ok(())
}

pub fn mean_squared_error(original: &Matrix, approx: &Matrix) -> Result<f64> {
    check_shapes(original, approx)?;

    let diff = original - approx;
    Ok(diff.mapv(|x| x * x).mean().unwrap_or(0.0))
}

pub fn frobenius_error(original: &Matrix, approx: &Matrix) -> Result<f64> {
    check_shapes(original, approx)?;

    let diff = original - approx;
    Ok(diff.mapv(|x| x * x).sum().sqrt())
}

pub fn max_abs_error(original: &Matrix, approx: &Matrix) -> Result<f64> {
    check_shapes(original, approx)?;

    let diff = original - approx;
    Ok(diff.iter().fold(0.0, |acc, &x| acc.max(x.abs())))
}

/// PSNR in decibels between two 8-bit images of the same shape.
/// Identical images give `f64::INFINITY`.
pub fn peak_signal_to_noise_ratio<S1, S2, D>(
    original: &ArrayBase<S1, D>,
    approx: &ArrayBase<S2, D>,
) -> Result<f64>
where
    S1: Data<Elem = u8>,
    S2: Data<Elem = u8>,
    D: Dimension,
{
    if original.shape() != approx.shape() {
        return Err(SvdError::ShapeMismatch {
            expected: original.shape().to_vec(),
            found: approx.shape().to_vec(),
        });
    }

    let count = original.len();
    if count == 0 {
        return Ok(f64::INFINITY);
    }

    let sum_sq: f64 = original
        .iter()
        .zip(approx.iter())
        .map(|(&a, &b)| {
            let d = f64::from(a) - f64::from(b);
            d * d
        })
        .sum();
    let mse = sum_sq / count as f64;

    if mse == 0.0 {
        return Ok(f64::INFINITY);
    }

    Ok(10.0 * (255.0 * 255.0 / mse).log10())
}
