//! Multi-axes figure assembled from chart artifacts

use crate::config::ChartFormat;
use crate::result::NativeValue;
use serde::Serialize;

/// Grid shape of a figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridLayout {
    pub rows: usize,
    pub cols: usize,
}

impl GridLayout {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn single() -> Self {
        Self { rows: 1, cols: 1 }
    }

    /// Cell count, saturating at `usize::MAX`
    pub fn capacity(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    pub fn checked_capacity(&self) -> Option<usize> {
        self.rows.checked_mul(self.cols)
    }

    /// (row, col) of the cell at `index`, row-major
    pub fn position(&self, index: usize) -> (usize, usize) {
        if self.cols == 0 {
            return (0, 0);
        }
        (index / self.cols, index % self.cols)
    }
}

/// One serialized chart artifact loaded into memory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelImage {
    pub format: ChartFormat,
    /// File name the artifact was read from
    pub source_name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Declared width in the artifact's native unit (px for SVG/PNG, pt for PDF)
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl PanelImage {
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

/// What an axes cell shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AxesContent {
    Image(PanelImage),
    /// Another converted value placed into the grid (batch display)
    Native(Box<NativeValue>),
    /// In-place error marker for a panel that failed to load
    Placeholder(String),
}

/// Single subplot cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axes {
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub visible: bool,
    pub title: Option<String>,
    pub content: Option<AxesContent>,
}

impl Axes {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.content, Some(AxesContent::Placeholder(_)))
    }
}

/// Figure with a grid of axes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    layout: GridLayout,
    axes: Vec<Axes>,
    suptitle: Option<String>,
    size_inches: (f64, f64),
}

impl Figure {
    /// Empty grid; every cell starts hidden until something is placed in it
    pub fn grid(layout: GridLayout, size_inches: (f64, f64)) -> Self {
        let axes = (0..layout.capacity())
            .map(|index| {
                let (row, col) = layout.position(index);
                Axes {
                    index,
                    row,
                    col,
                    visible: false,
                    title: None,
                    content: None,
                }
            })
            .collect();
        Self {
            layout,
            axes,
            suptitle: None,
            size_inches,
        }
    }

    /// One-axes figure holding a single panel
    pub fn single(panel: PanelImage, size_inches: (f64, f64)) -> Self {
        let mut figure = Self::grid(GridLayout::single(), size_inches);
        figure.place(0, AxesContent::Image(panel), None);
        figure
    }

    /// Put `content` into cell `index`; returns false when the cell does not exist
    pub fn place(&mut self, index: usize, content: AxesContent, title: Option<String>) -> bool {
        match self.axes.get_mut(index) {
            Some(axes) => {
                axes.visible = true;
                axes.title = title;
                axes.content = Some(content);
                true
            }
            None => false,
        }
    }

    /// Hide every cell that received no content
    pub fn hide_unused(&mut self) {
        for axes in &mut self.axes {
            if axes.content.is_none() {
                axes.visible = false;
            }
        }
    }

    pub fn set_suptitle(&mut self, title: Option<String>) {
        self.suptitle = title;
    }

    pub fn suptitle(&self) -> Option<&str> {
        self.suptitle.as_deref()
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn size_inches(&self) -> (f64, f64) {
        self.size_inches
    }

    pub fn axes(&self) -> &[Axes] {
        &self.axes
    }

    pub fn visible_axes(&self) -> impl Iterator<Item = &Axes> {
        self.axes.iter().filter(|a| a.visible)
    }

    /// Number of visible subplot axes
    pub fn panel_count(&self) -> usize {
        self.visible_axes().count()
    }

    pub fn hidden_count(&self) -> usize {
        self.axes.len() - self.panel_count()
    }

    /// The only image, when the figure is a single panel
    pub fn single_image(&self) -> Option<&PanelImage> {
        if self.panel_count() != 1 {
            return None;
        }
        self.visible_axes().find_map(|a| match &a.content {
            Some(AxesContent::Image(image)) => Some(image),
            _ => None,
        })
    }
}
