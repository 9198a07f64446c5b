//! ChartConverter - foreign chart → [`Figure`]
//!
//! # Single Chart
//!
//! The chart saves itself to `{tmp}/chart-{uuid}.{ext}`; the file must exist
//! and be non-empty, then it is loaded as the figure's only panel.
//!
//! # Composite Chart
//!
//! The chart saves into a scoped directory under the base name `combined`;
//! the library writes `combined-{n}.{ext}` per panel. The
//! [`PanelAssembler`] discovers, caps, lays out and loads them.
//!
//! # Resource Handling
//!
//! All artifacts live in a [`tempfile::TempDir`]; it is removed on every exit
//! path, including early returns and errors.

use super::{read_title, ConvertOptions, Converter};
use crate::bridge::{require_capability, try_get_capability, ForeignObject, ForeignValue};
use crate::config::{ChartFormat, DisplayConfig};
use crate::native::Figure;
use crate::panels::{load_panel, PanelAssembler};
use crate::probe::patterns::{is_chart_like, CHART_IS_COMBINED, CHART_SAVE};
use crate::result::{ConversionError, ConversionResult, NativeValue, ResultKind};
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Base name passed to the composite save
pub const COMBINED_BASE_NAME: &str = "combined";

#[derive(Debug, Clone, Copy, Default)]
pub struct ChartConverter;

impl ChartConverter {
    fn try_convert(
        &self,
        handle: &dyn ForeignObject,
        options: &ConvertOptions,
        config: &DisplayConfig,
        is_combined: bool,
    ) -> Result<ConversionResult, ConversionError> {
        let format = options.resolved_format(config);
        let title = read_title(handle);

        let scratch = scoped_dir()?;
        let outcome = if is_combined {
            convert_combined(handle, scratch.path(), format, options, config, title.clone())
        } else {
            convert_single(handle, scratch.path(), format, options.scale, config, title.clone())
        };
        release(scratch);

        let (figure, extra) = outcome?;
        info!(
            "Converted {} to figure with {} panel(s)",
            handle.type_name(),
            figure.panel_count()
        );

        let mut result = ConversionResult::success(NativeValue::Figure(figure), handle.type_name());
        for (key, value) in extra {
            result.insert_metadata(key, value);
        }
        if let Some(title) = title {
            result.insert_metadata("title", title);
        }
        Ok(result)
    }
}

impl Converter for ChartConverter {
    fn name(&self) -> &str {
        "chart"
    }

    fn predicate_name(&self) -> &str {
        "is_chart_like"
    }

    fn converter_name(&self) -> &str {
        "convert_chart"
    }

    fn accepts(&self, handle: &dyn ForeignObject) -> bool {
        is_chart_like(handle)
    }

    fn convert(&self, handle: &dyn ForeignObject, options: &ConvertOptions, config: &DisplayConfig) -> ConversionResult {
        let format = options.resolved_format(config);
        let combined = is_combined(handle);
        let mut result = self
            .try_convert(handle, options, config, combined)
            .unwrap_or_else(|e| ConversionResult::failure(ResultKind::Chart, e, handle.type_name()));

        // Present on success and failure alike
        result.insert_metadata("format", format.extension());
        result.insert_metadata("scale", options.scale);
        result.insert_metadata("is_combined", combined);
        result
    }
}

type ChartOutcome = Result<(Figure, Vec<(&'static str, Value)>), ConversionError>;

fn convert_single(
    handle: &dyn ForeignObject,
    dir: &Path,
    format: ChartFormat,
    scale: f64,
    config: &DisplayConfig,
    title: Option<String>,
) -> ChartOutcome {
    let target = dir.join(format!("chart-{}.{}", Uuid::new_v4(), format.extension()));
    save(handle, &target, scale)?;

    if !target.is_file() {
        return Err(ConversionError::MissingArtifact(target.display().to_string()));
    }

    let panel = load_panel(&target, format)?;
    let mut figure = Figure::single(panel, config.figure_size);
    figure.set_suptitle(title);
    Ok((figure, vec![("panel_count", Value::from(1))]))
}

fn convert_combined(
    handle: &dyn ForeignObject,
    dir: &Path,
    format: ChartFormat,
    options: &ConvertOptions,
    config: &DisplayConfig,
    title: Option<String>,
) -> ChartOutcome {
    let target = dir.join(format!("{}.{}", COMBINED_BASE_NAME, format.extension()));
    save(handle, &target, options.scale)?;

    let assembler = PanelAssembler::new(options.resolved_max_panels(config), options.panel_layout);
    let manifest = assembler.build_manifest(dir, COMBINED_BASE_NAME, format)?;
    debug!(
        "Composite chart {} wrote {} panel file(s)",
        handle.type_name(),
        manifest.discovered()
    );

    let figure = assembler.assemble(&manifest, format, config.figure_size, title);
    let layout = manifest.layout();
    let extra = vec![
        ("panel_count", Value::from(figure.panel_count())),
        ("layout", Value::from(vec![layout.rows, layout.cols])),
        ("truncated", Value::from(manifest.is_truncated())),
    ];
    Ok((figure, extra))
}

/// "Is this a composite?" flag; absent or failing accessor means single
fn is_combined(handle: &dyn ForeignObject) -> bool {
    match try_get_capability(handle, CHART_IS_COMBINED).map(|cap| cap.call_bool()) {
        Some(Ok(flag)) => flag,
        Some(Err(e)) => {
            debug!("Composite flag unreadable on {}: {}", handle.type_name(), e);
            false
        }
        None => false,
    }
}

fn save(handle: &dyn ForeignObject, target: &Path, scale: f64) -> Result<(), ConversionError> {
    require_capability(handle, CHART_SAVE)?.call(&[
        ForeignValue::Str(target.display().to_string()),
        ForeignValue::Float(scale),
    ])?;
    Ok(())
}

fn scoped_dir() -> Result<TempDir, ConversionError> {
    tempfile::Builder::new()
        .prefix("chart-artifacts-")
        .tempdir()
        .map_err(ConversionError::from)
}

/// Remove the scoped directory now, logging (not failing) on cleanup errors
fn release(dir: TempDir) {
    let path = dir.path().display().to_string();
    if let Err(e) = dir.close() {
        warn!("Could not remove chart scratch directory {}: {}", path, e);
    }
}
