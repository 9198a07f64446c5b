//! PanelAssembler - composite figure reconstruction
//!
//! A composite chart cannot hand its panels back directly; its save
//! operation writes one file per panel. The assembler finds those files,
//! decides a grid, and loads each panel into one multi-axes [`Figure`].
//!
//! # Failure Semantics
//!
//! - No panel files at all → [`PanelError::NoPanelFiles`] (whole conversion fails)
//! - Explicit grid with a zero or overflowing cell count → [`PanelError::InvalidGrid`]
//! - More panels than `max_panels` → truncated with a warning
//! - One panel fails to load → in-place placeholder cell

use crate::config::ChartFormat;
use crate::native::{AxesContent, Figure, GridLayout};
use crate::result::NativeValue;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub mod discovery;
pub mod layout;
pub mod rasterize;

pub use discovery::discover_panels;
pub use layout::{fit_explicit, PanelLayout};
pub use rasterize::load_panel;

/// Default cap on panels per composite figure
pub const DEFAULT_MAX_PANELS: usize = 20;

/// Errors from panel discovery and loading
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PanelError {
    #[error("No panel files produced in {0}")]
    NoPanelFiles(String),

    #[error("Panel artifact is empty: {0}")]
    EmptyArtifact(String),

    #[error("Cannot read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Cannot decode {path}: {reason}")]
    Undecodable { path: String, reason: String },

    #[error("Grid {rows}x{cols} cannot hold panels")]
    InvalidGrid { rows: usize, cols: usize },

    #[error("Invalid panel glob pattern: {0}")]
    Pattern(String),
}

/// Ordered panel files of one composite save, with the grid they go into
#[derive(Debug, Clone, PartialEq)]
pub struct PanelManifest {
    paths: Vec<PathBuf>,
    layout: GridLayout,
    discovered: usize,
}

impl PanelManifest {
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Panel files found before truncation
    pub fn discovered(&self) -> usize {
        self.discovered
    }

    pub fn is_truncated(&self) -> bool {
        self.discovered > self.paths.len()
    }
}

/// Builds multi-panel figures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelAssembler {
    max_panels: usize,
    layout: PanelLayout,
}

impl PanelAssembler {
    pub fn new(max_panels: usize, layout: PanelLayout) -> Self {
        Self {
            max_panels: max_panels.max(1),
            layout,
        }
    }

    pub fn max_panels(&self) -> usize {
        self.max_panels
    }

    /// Grid for `count` panels, bounded by `max_panels` cells for explicit grids
    fn resolve_grid(&self, count: usize) -> Result<GridLayout, PanelError> {
        match self.layout {
            PanelLayout::Grid { rows, cols } => {
                let grid = fit_explicit(rows, cols, count, self.max_panels)
                    .ok_or(PanelError::InvalidGrid { rows, cols })?;
                if grid != GridLayout::new(rows, cols) {
                    warn!(
                        "Grid {}x{} trimmed to {}x{} for {} panel(s)",
                        rows, cols, grid.rows, grid.cols, count
                    );
                }
                Ok(grid)
            }
            other => Ok(other.grid_for(count)),
        }
    }

    /// Discover the panels saved under `dir/base.{ext}` and pick a grid
    pub fn build_manifest(&self, dir: &Path, base: &str, format: ChartFormat) -> Result<PanelManifest, PanelError> {
        let mut paths = discover_panels(dir, base, format.extension())?;
        let discovered = paths.len();

        if discovered > self.max_panels {
            warn!(
                "Composite chart produced {} panels; keeping the first {}",
                discovered, self.max_panels
            );
            paths.truncate(self.max_panels);
        }

        let layout = self.resolve_grid(paths.len())?;
        Ok(PanelManifest {
            paths,
            layout,
            discovered,
        })
    }

    /// Load every panel of `manifest` into one figure
    ///
    /// Panels that fail to load become placeholder cells; unused cells are
    /// hidden.
    pub fn assemble(
        &self,
        manifest: &PanelManifest,
        format: ChartFormat,
        size_inches: (f64, f64),
        title: Option<String>,
    ) -> Figure {
        let layout = manifest.layout();
        let mut figure = Figure::grid(layout, size_inches);

        for (index, path) in manifest.paths().iter().enumerate() {
            if index >= layout.capacity() {
                warn!(
                    "Grid {}x{} has no cell for panel {}; remaining panels dropped",
                    layout.rows,
                    layout.cols,
                    index + 1
                );
                break;
            }
            let content = match load_panel(path, format) {
                Ok(image) => AxesContent::Image(image),
                Err(e) => {
                    debug!("Panel {} failed to load: {}", index + 1, e);
                    AxesContent::Placeholder(format!("Panel {} unavailable: {}", index + 1, e))
                }
            };
            figure.place(index, content, None);
        }

        figure.hide_unused();
        figure.set_suptitle(title);
        figure
    }

    /// Lay out already-converted values as one composite figure
    pub fn compose(&self, values: Vec<NativeValue>, size_inches: (f64, f64), title: Option<String>) -> Figure {
        let mut values = values;
        if values.len() > self.max_panels {
            warn!(
                "Batch display of {} values; keeping the first {}",
                values.len(),
                self.max_panels
            );
            values.truncate(self.max_panels);
        }

        let layout = self.resolve_grid(values.len()).unwrap_or_else(|e| {
            warn!("{}; using an automatic grid", e);
            PanelLayout::Auto.grid_for(values.len())
        });
        let mut figure = Figure::grid(layout, size_inches);

        for (index, value) in values.into_iter().enumerate() {
            if index >= layout.capacity() {
                break;
            }
            let content = match value {
                NativeValue::Figure(inner) => match inner.single_image().cloned() {
                    Some(image) => AxesContent::Image(image),
                    None => AxesContent::Native(Box::new(NativeValue::Figure(inner))),
                },
                other => AxesContent::Native(Box::new(other)),
            };
            figure.place(index, content, None);
        }

        figure.hide_unused();
        figure.set_suptitle(title);
        figure
    }
}

impl Default for PanelAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PANELS, PanelLayout::Auto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_panels(dir: &Path, count: usize) {
        for i in 1..=count {
            fs::write(dir.join(format!("combined-{}.svg", i)), br#"<svg width="10" height="10"/>"#).unwrap();
        }
    }

    #[test]
    fn test_manifest_truncates_to_max_panels() {
        let dir = tempfile::tempdir().unwrap();
        write_panels(dir.path(), 7);

        let assembler = PanelAssembler::new(4, PanelLayout::Auto);
        let manifest = assembler.build_manifest(dir.path(), "combined", ChartFormat::Svg).unwrap();

        assert_eq!(manifest.len(), 4);
        assert_eq!(manifest.discovered(), 7);
        assert!(manifest.is_truncated());
        assert_eq!(manifest.layout(), GridLayout::new(2, 2));
    }

    #[test]
    fn test_failed_panel_becomes_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        write_panels(dir.path(), 3);
        fs::write(dir.path().join("combined-2.svg"), b"").unwrap();

        let assembler = PanelAssembler::default();
        let manifest = assembler.build_manifest(dir.path(), "combined", ChartFormat::Svg).unwrap();
        let figure = assembler.assemble(&manifest, ChartFormat::Svg, (8.0, 6.0), Some("Title".into()));

        assert_eq!(figure.panel_count(), 3);
        assert!(figure.axes()[1].is_placeholder());
        assert!(!figure.axes()[0].is_placeholder());
        assert_eq!(figure.suptitle(), Some("Title"));
        // 3 panels in a 2x2 grid leave one hidden cell
        assert_eq!(figure.hidden_count(), 1);
    }

    #[test]
    fn test_explicit_grid_smaller_than_panels() {
        let dir = tempfile::tempdir().unwrap();
        write_panels(dir.path(), 3);

        let assembler = PanelAssembler::new(20, PanelLayout::Grid { rows: 1, cols: 2 });
        let manifest = assembler.build_manifest(dir.path(), "combined", ChartFormat::Svg).unwrap();
        let figure = assembler.assemble(&manifest, ChartFormat::Svg, (8.0, 6.0), None);

        assert_eq!(figure.layout(), GridLayout::new(1, 2));
        assert_eq!(figure.panel_count(), 2);
    }

    #[test]
    fn test_degenerate_explicit_grid_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_panels(dir.path(), 3);

        for (rows, cols) in [(0, 3), (usize::MAX / 2, 3)] {
            let assembler = PanelAssembler::new(20, PanelLayout::Grid { rows, cols });
            let err = assembler.build_manifest(dir.path(), "combined", ChartFormat::Svg).unwrap_err();
            assert_eq!(err, PanelError::InvalidGrid { rows, cols });
        }
    }

    #[test]
    fn test_huge_explicit_grid_trimmed_to_panels() {
        let dir = tempfile::tempdir().unwrap();
        write_panels(dir.path(), 3);

        let assembler = PanelAssembler::new(20, PanelLayout::Grid { rows: 100_000, cols: 100_000 });
        let manifest = assembler.build_manifest(dir.path(), "combined", ChartFormat::Svg).unwrap();
        let figure = assembler.assemble(&manifest, ChartFormat::Svg, (8.0, 6.0), None);

        assert_eq!(manifest.layout(), GridLayout::new(1, 3));
        assert_eq!(figure.axes().len(), 3);
        assert_eq!(figure.panel_count(), 3);
    }

    #[test]
    fn test_compose_with_zero_grid_falls_back_to_auto() {
        let assembler = PanelAssembler::new(20, PanelLayout::Grid { rows: 0, cols: 2 });
        let values = vec![
            NativeValue::Raster(crate::native::RasterImage::new(vec![1], "uint8", vec![0.0]).unwrap()),
            NativeValue::Raster(crate::native::RasterImage::new(vec![1], "uint8", vec![1.0]).unwrap()),
        ];
        let figure = assembler.compose(values, (8.0, 6.0), None);
        assert_eq!(figure.layout(), GridLayout::new(1, 2));
        assert_eq!(figure.panel_count(), 2);
    }
}
