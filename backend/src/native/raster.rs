//! N-dimensional raster

use serde::Serialize;

/// Dense raster with a flattened, row-major buffer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterImage {
    shape: Vec<usize>,
    dtype: String,
    data: Vec<f64>,
}

impl RasterImage {
    /// Returns `None` when the buffer length disagrees with the shape
    pub fn new(shape: Vec<usize>, dtype: impl Into<String>, data: Vec<f64>) -> Option<Self> {
        if element_count(&shape)? != data.len() {
            return None;
        }
        Some(Self {
            shape,
            dtype: dtype.into(),
            data,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn dtype(&self) -> &str {
        &self.dtype
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// (min, max) over all samples, ignoring NaN
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Number of elements a shape describes, `None` on overflow
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, d| acc.checked_mul(*d))
}
