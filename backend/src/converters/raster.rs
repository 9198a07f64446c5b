//! RasterConverter - array-like foreign handle → [`RasterImage`]

use super::{ConvertOptions, Converter};
use crate::bridge::{require_capability, try_get_capability, ForeignObject, ForeignValue};
use crate::config::DisplayConfig;
use crate::native::raster::element_count;
use crate::native::RasterImage;
use crate::probe::patterns::{is_raster_like, RASTER_DATA, RASTER_DTYPE, RASTER_NDIM, RASTER_SHAPE};
use crate::result::{ConversionError, ConversionResult, NativeValue, ResultKind};
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct RasterConverter;

impl RasterConverter {
    fn try_convert(&self, handle: &dyn ForeignObject) -> Result<ConversionResult, ConversionError> {
        let shape = read_shape(handle)?;
        let dtype = match require_capability(handle, RASTER_DTYPE)?.call0()? {
            ForeignValue::Str(s) => s,
            other => other.to_string(),
        };
        let ndim = require_capability(handle, RASTER_NDIM)?.call_usize()?;
        if ndim != shape.len() {
            return Err(ConversionError::InvalidShape(format!(
                "ndim is {} but shape has {} dimensions",
                ndim,
                shape.len()
            )));
        }

        if element_count(&shape).is_none() {
            return Err(ConversionError::InvalidShape(format!("shape {:?} overflows element count", shape)));
        }

        let mut data = Vec::new();
        let flat = require_capability(handle, RASTER_DATA)?.call0()?;
        if !flat.flatten_numeric(&mut data) {
            return Err(ConversionError::InvalidShape(format!(
                "{} data is not numeric",
                handle.type_name()
            )));
        }

        let raster = RasterImage::new(shape.clone(), dtype.clone(), data).ok_or_else(|| {
            ConversionError::InvalidShape(format!("data length disagrees with shape {:?}", shape))
        })?;

        info!("Converted {} to raster {:?} ({})", handle.type_name(), shape, dtype);

        Ok(ConversionResult::success(NativeValue::Raster(raster), handle.type_name())
            .with_metadata("shape", shape)
            .with_metadata("dtype", dtype)
            .with_metadata("ndim", ndim))
    }
}

impl Converter for RasterConverter {
    fn name(&self) -> &str {
        "raster"
    }

    fn predicate_name(&self) -> &str {
        "is_raster_like"
    }

    fn converter_name(&self) -> &str {
        "convert_raster"
    }

    fn accepts(&self, handle: &dyn ForeignObject) -> bool {
        is_raster_like(handle)
    }

    fn convert(&self, handle: &dyn ForeignObject, _options: &ConvertOptions, _config: &DisplayConfig) -> ConversionResult {
        self.try_convert(handle)
            .unwrap_or_else(|e| ConversionResult::failure(ResultKind::Raster, e, handle.type_name()))
    }
}

/// Shape as a list of non-negative dimensions
fn read_shape(handle: &dyn ForeignObject) -> Result<Vec<usize>, ConversionError> {
    let Some(cap) = try_get_capability(handle, RASTER_SHAPE) else {
        return Err(ConversionError::MissingCapability(RASTER_SHAPE.to_string()));
    };
    cap.call_list()?
        .iter()
        .map(|dim| {
            dim.as_i64()
                .and_then(|d| usize::try_from(d).ok())
                .ok_or_else(|| ConversionError::InvalidShape(format!("bad dimension {}", dim)))
        })
        .collect()
}
