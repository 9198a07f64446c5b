//! Console printers
//!
//! Text renderings for every native value, plus the generic introspective
//! printer used whenever conversion or rendering fails.

use crate::native::{AttributedGraph, AxesContent, Figure, ObjectSummary, RasterImage, TabularFrame};
use crate::object::DisplayObject;
use crate::result::{ConversionResult, NativeValue};
use std::io::{self, Write};

/// Widest a preview column is allowed to get
const MAX_CELL_WIDTH: usize = 24;

/// Aligned preview of the first `preview_rows` rows
pub fn write_table_preview(out: &mut dyn Write, frame: &TabularFrame, preview_rows: usize, title: Option<&str>) -> io::Result<()> {
    if let Some(title) = title {
        writeln!(out, "{}", title)?;
    }
    let shown = frame.row_count().min(preview_rows);

    let cells: Vec<Vec<String>> = frame
        .columns()
        .iter()
        .map(|column| column.values.iter().take(shown).map(|v| clip(&v.to_string())).collect())
        .collect();
    let widths: Vec<usize> = frame
        .columns()
        .iter()
        .zip(&cells)
        .map(|(column, values)| {
            values
                .iter()
                .map(|v| v.chars().count())
                .chain(std::iter::once(clip(&column.name).chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = frame
        .columns()
        .iter()
        .zip(&widths)
        .map(|(column, width)| format!("{:>width$}", clip(&column.name), width = width))
        .collect();
    writeln!(out, "{}", header.join("  "))?;

    for row in 0..shown {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(values, width)| format!("{:>width$}", values[row], width = width))
            .collect();
        writeln!(out, "{}", line.join("  "))?;
    }
    if frame.row_count() > shown {
        writeln!(out, "... ({} more rows)", frame.row_count() - shown)?;
    }
    writeln!(out, "[{} rows x {} columns]", frame.row_count(), frame.column_count())
}

/// Shape and per-column dtype only
pub fn write_table_summary(out: &mut dyn Write, frame: &TabularFrame, title: Option<&str>) -> io::Result<()> {
    let (rows, cols) = frame.shape();
    match title {
        Some(title) => writeln!(out, "{}: {} rows x {} columns", title, rows, cols)?,
        None => writeln!(out, "Table: {} rows x {} columns", rows, cols)?,
    }
    for (name, dtype) in frame.dtypes() {
        writeln!(out, "  {}: {}", name, dtype.as_str())?;
    }
    if frame.null_count() > 0 {
        writeln!(out, "  null cells: {}", frame.null_count())?;
    }
    Ok(())
}

pub fn write_figure_summary(out: &mut dyn Write, figure: &Figure) -> io::Result<()> {
    let layout = figure.layout();
    let (width, height) = figure.size_inches();
    writeln!(
        out,
        "Figure {}x{} grid, {} panel(s), {}x{} in",
        layout.rows,
        layout.cols,
        figure.panel_count(),
        width,
        height
    )?;
    if let Some(title) = figure.suptitle() {
        writeln!(out, "  title: {}", title)?;
    }
    for axes in figure.visible_axes() {
        let description = match &axes.content {
            Some(AxesContent::Image(image)) => match (image.width, image.height) {
                (Some(w), Some(h)) => format!("{} {} ({}x{})", image.format.extension(), image.source_name, w, h),
                _ => format!("{} {} ({} bytes)", image.format.extension(), image.source_name, image.byte_len()),
            },
            Some(AxesContent::Native(value)) => value.type_label().to_string(),
            Some(AxesContent::Placeholder(message)) => format!("<{}>", message),
            None => "<empty>".to_string(),
        };
        writeln!(out, "  [{},{}] {}", axes.row, axes.col, description)?;
    }
    Ok(())
}

pub fn write_graph_summary(out: &mut dyn Write, graph: &AttributedGraph, layout: &str) -> io::Result<()> {
    writeln!(
        out,
        "AttributedGraph ({}): {} vertices, {} edges, layout: {}",
        if graph.is_directed() { "directed" } else { "undirected" },
        graph.node_count(),
        graph.edge_count(),
        layout
    )?;
    for node in graph.nodes().iter().take(5) {
        writeln!(out, "  {} {}", node.id, clip(&node.label))?;
    }
    if graph.node_count() > 5 {
        writeln!(out, "  ...")?;
    }
    Ok(())
}

pub fn write_raster_summary(out: &mut dyn Write, raster: &RasterImage) -> io::Result<()> {
    write!(out, "RasterImage shape {:?} dtype {}", raster.shape(), raster.dtype())?;
    match raster.value_range() {
        Some((min, max)) => writeln!(out, ", range [{}, {}]", min, max),
        None => writeln!(out),
    }
}

/// Summary line for a result without payload
pub fn write_empty_result(out: &mut dyn Write, result: &ConversionResult) -> io::Result<()> {
    match result.error() {
        Some(error) => writeln!(out, "Conversion of {} failed: {}", result.source_type(), error),
        None => writeln!(out, "Empty result from {}", result.source_type()),
    }
}

pub fn write_native(out: &mut dyn Write, value: &NativeValue, preview_rows: usize) -> io::Result<()> {
    match value {
        NativeValue::Table(frame) => write_table_preview(out, frame, preview_rows, None),
        NativeValue::Figure(figure) => write_figure_summary(out, figure),
        NativeValue::Graph(graph) => write_graph_summary(out, graph, crate::converters::graph::DEFAULT_LAYOUT),
        NativeValue::Raster(raster) => write_raster_summary(out, raster),
        NativeValue::Generic(summary) => summary.write_to(out),
    }
}

/// Best-effort introspective printer; works for any value
pub fn write_generic(out: &mut dyn Write, obj: &DisplayObject) -> io::Result<()> {
    match obj {
        DisplayObject::Foreign(handle) => ObjectSummary::from_handle(handle.as_ref()).write_to(out),
        DisplayObject::Native(value) => write_native(out, value, 5),
        DisplayObject::Converted(result) => {
            writeln!(out, "ConversionResult<{:?}> from {}", result.kind(), result.source_type())?;
            match result.payload() {
                Some(value) => write_native(out, value, 5),
                None => write_empty_result(out, result),
            }
        }
        DisplayObject::Sequence(items) => {
            writeln!(out, "Sequence of {} item(s)", items.len())?;
            for (index, item) in items.iter().enumerate() {
                writeln!(out, "  [{}] {}", index, item.type_label())?;
            }
            Ok(())
        }
    }
}

fn clip(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_WIDTH {
        return text.to_string();
    }
    let kept: String = text.chars().take(MAX_CELL_WIDTH - 3).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{CellValue, Column};

    fn frame(rows: i64) -> TabularFrame {
        let ids = (0..rows).map(CellValue::Int).collect();
        let names = (0..rows).map(|i| CellValue::Text(format!("cell-{}", i))).collect();
        TabularFrame::new(vec![Column::new("id", ids), Column::new("name", names)], rows as usize)
    }

    fn render<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_preview_truncates_rows() {
        let text = render(|out| write_table_preview(out, &frame(12), 3, Some("Results")));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Results");
        assert!(lines[1].contains("id") && lines[1].contains("name"));
        assert_eq!(lines.len(), 1 + 1 + 3 + 2);
        assert!(text.contains("... (9 more rows)"));
        assert!(text.ends_with("[12 rows x 2 columns]\n"));
    }

    #[test]
    fn test_summary_lists_dtypes() {
        let text = render(|out| write_table_summary(out, &frame(2), None));
        assert!(text.starts_with("Table: 2 rows x 2 columns"));
        assert!(text.contains("id: int64"));
        assert!(text.contains("name: object"));
    }

    #[test]
    fn test_clip_long_cells() {
        let long = "x".repeat(40);
        assert_eq!(clip(&long).chars().count(), MAX_CELL_WIDTH);
        assert!(clip(&long).ends_with("..."));
    }
}
