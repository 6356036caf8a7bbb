//! Static image writer backed by `plotters`
//!
//! Panels are laid out with `split_evenly((n_rows, n_cols))`; cells past the
//! last panel stay blank. A shared legend, when the figure has one, gets a
//! strip on the right.
//!
//! Text needs a system font. Without one the figure is drawn without titles,
//! tick labels and legend labels instead of failing.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::plot::figure::{
    format_number, BarChart, BoxChart, Legend, Orientation, Panel, PanelContent, XAxis,
};
use crate::plot::scale::color_to_rgb;
use crate::writer::Writer;
use crate::{Figure, GgplotError, Result};

const FONT: &str = "sans-serif";
const LEGEND_WIDTH: u32 = 160;
const BOX_HALF_WIDTH: f64 = 0.3;
const CAP_HALF_WIDTH: f64 = 0.15;

fn writer_err<E: std::fmt::Display>(e: E) -> GgplotError {
    GgplotError::WriterError(e.to_string())
}

fn rgb(color: &str) -> Result<RGBColor> {
    let (r, g, b) = color_to_rgb(color)?;
    Ok(RGBColor(r, g, b))
}

fn fonts_available() -> bool {
    (FONT, 12).into_font().box_size("0").is_ok()
}

/// Tick label for `value` on a categorical axis: the label at that integer
/// position, nothing between positions.
fn category_label(labels: &[String], value: f64) -> String {
    let index = value.round();
    if (value - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

/// PNG/SVG writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlottersWriter {
    pub width: u32,
    pub height: u32,
}

impl Default for PlottersWriter {
    fn default() -> Self {
        Self::new(1200, 800)
    }
}

impl PlottersWriter {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn write_png(&self, figure: &Figure, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        self.draw(&root, figure)?;
        root.present().map_err(writer_err)?;
        tracing::debug!(path = %path.display(), "wrote png");
        Ok(())
    }

    pub fn write_svg(&self, figure: &Figure, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let root = SVGBackend::new(path, (self.width, self.height)).into_drawing_area();
        self.draw(&root, figure)?;
        root.present().map_err(writer_err)?;
        tracing::debug!(path = %path.display(), "wrote svg");
        Ok(())
    }

    pub fn write_svg_string(&self, figure: &Figure) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height))
                .into_drawing_area();
            self.draw(&root, figure)?;
            root.present().map_err(writer_err)?;
        }
        Ok(svg)
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        figure: &Figure,
    ) -> Result<()> {
        if figure.panels.is_empty() {
            return Err(GgplotError::WriterError(
                "Figure has no panels to render".to_string(),
            ));
        }
        let text = fonts_available();
        if !text {
            tracing::warn!(font = FONT, "no usable font found; drawing without text");
        }

        root.fill(&WHITE).map_err(writer_err)?;
        let grid = match &figure.legend {
            Some(legend) if self.width > LEGEND_WIDTH => {
                let (main, side) = root.split_horizontally(self.width - LEGEND_WIDTH);
                draw_legend(&side, legend, text)?;
                main
            }
            _ => root.clone(),
        };

        let cells = grid.split_evenly((figure.n_rows.max(1), figure.n_cols.max(1)));
        for (panel, cell) in figure.panels.iter().zip(cells.iter()) {
            match &panel.content {
                PanelContent::Bars(chart) => draw_bars(cell, panel, chart, text)?,
                PanelContent::Boxes(chart) => draw_boxes(cell, panel, chart, text)?,
            }
        }
        Ok(())
    }
}

impl Writer for PlottersWriter {
    type Output = String;

    /// Render to an SVG document.
    fn write(&self, figure: &Figure) -> Result<String> {
        self.write_svg_string(figure)
    }
}

fn chart_builder<'a, 'b, DB: DrawingBackend>(
    area: &'a DrawingArea<DB, Shift>,
    panel: &Panel,
    text: bool,
) -> ChartBuilder<'a, 'b, DB> {
    let mut builder = ChartBuilder::on(area);
    builder.margin(10);
    if text {
        builder
            .caption(&panel.title, (FONT, 16))
            .x_label_area_size(35)
            .y_label_area_size(50);
    }
    builder
}

fn draw_bars<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    data: &BarChart,
    text: bool,
) -> Result<()> {
    let (x0, x1) = data.x_range();
    let y_top = data.y_max() * 1.05;
    let mut chart = chart_builder(area, panel, text)
        .build_cartesian_2d(x0..x1, 0f64..y_top)
        .map_err(writer_err)?;

    let labels: &[String] = match &data.axis {
        XAxis::Categorical { labels } => labels,
        XAxis::Continuous => &[],
    };
    let x_formatter = |v: &f64| match data.axis {
        XAxis::Categorical { .. } => category_label(labels, *v),
        XAxis::Continuous => format_number(*v),
    };
    let y_formatter = |v: &f64| format_number(*v);

    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh();
    if text {
        mesh.x_desc(panel.x_label.as_str())
            .y_desc(panel.y_label.as_str())
            .x_label_formatter(&x_formatter)
            .y_label_formatter(&y_formatter);
        if !labels.is_empty() {
            mesh.x_labels(labels.len() + 1);
        }
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw().map_err(writer_err)?;

    for series in &data.series {
        let fill = rgb(&series.style.fill)?.mix(series.style.opacity);
        chart
            .draw_series(
                series
                    .bars
                    .iter()
                    .map(|b| Rectangle::new([(b.x0, b.y0), (b.x1, b.y1)], fill.filled())),
            )
            .map_err(writer_err)?;
        if let Some(edge) = &series.style.edge {
            let edge = rgb(edge)?;
            chart
                .draw_series(
                    series.bars.iter().map(|b| {
                        Rectangle::new([(b.x0, b.y0), (b.x1, b.y1)], edge.stroke_width(1))
                    }),
                )
                .map_err(writer_err)?;
        }
    }
    Ok(())
}

fn draw_boxes<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    data: &BoxChart,
    text: bool,
) -> Result<()> {
    let (p0, p1) = data.position_range();
    let (v0, v1) = data.value_range();
    let vertical = data.orientation == Orientation::Vertical;
    // (position, value) -> (x, y)
    let pt = |p: f64, v: f64| if vertical { (p, v) } else { (v, p) };

    let mut builder = chart_builder(area, panel, text);
    let mut chart = if vertical {
        builder.build_cartesian_2d(p0..p1, v0..v1)
    } else {
        builder.build_cartesian_2d(v0..v1, p0..p1)
    }
    .map_err(writer_err)?;

    let position_formatter = |v: &f64| category_label(&data.labels, *v);
    let value_formatter = |v: &f64| format_number(*v);

    let mut mesh = chart.configure_mesh();
    if vertical {
        mesh.disable_x_mesh();
    } else {
        mesh.disable_y_mesh();
    }
    if text {
        mesh.x_desc(panel.x_label.as_str()).y_desc(panel.y_label.as_str());
        if vertical {
            mesh.x_label_formatter(&position_formatter)
                .y_label_formatter(&value_formatter)
                .x_labels(data.labels.len() + 1);
        } else {
            mesh.y_label_formatter(&position_formatter)
                .x_label_formatter(&value_formatter)
                .y_labels(data.labels.len() + 1);
        }
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw().map_err(writer_err)?;

    for b in &data.boxes {
        let fill = rgb(&b.style.fill)?.mix(b.style.opacity);
        let edge = match &b.style.edge {
            Some(edge) => rgb(edge)?,
            None => BLACK,
        };
        let p = b.position;
        let corners = [pt(p - BOX_HALF_WIDTH, b.q1), pt(p + BOX_HALF_WIDTH, b.q3)];
        let cap = |v: f64| vec![pt(p - CAP_HALF_WIDTH, v), pt(p + CAP_HALF_WIDTH, v)];

        chart
            .draw_series(std::iter::once(Rectangle::new(corners, fill.filled())))
            .map_err(writer_err)?;
        chart
            .draw_series(std::iter::once(Rectangle::new(corners, edge.stroke_width(1))))
            .map_err(writer_err)?;

        let lines = vec![
            // median
            (vec![pt(p - BOX_HALF_WIDTH, b.median), pt(p + BOX_HALF_WIDTH, b.median)], 2),
            // whiskers
            (vec![pt(p, b.whisker_low), pt(p, b.q1)], 1),
            (vec![pt(p, b.q3), pt(p, b.whisker_high)], 1),
            // caps
            (cap(b.whisker_low), 1),
            (cap(b.whisker_high), 1),
        ];
        chart
            .draw_series(
                lines
                    .into_iter()
                    .map(|(points, width)| PathElement::new(points, edge.stroke_width(width))),
            )
            .map_err(writer_err)?;

        chart
            .draw_series(
                b.fliers
                    .iter()
                    .map(|v| Circle::new(pt(p, *v), 3, edge.stroke_width(1))),
            )
            .map_err(writer_err)?;
    }
    Ok(())
}

fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    legend: &Legend,
    text: bool,
) -> Result<()> {
    for (i, entry) in legend.entries.iter().enumerate() {
        let y = 40 + i as i32 * 22;
        let fill = rgb(&entry.style.fill)?.mix(entry.style.opacity);
        area.draw(&Rectangle::new([(10, y), (26, y + 14)], fill.filled()))
            .map_err(writer_err)?;
        if let Some(edge) = &entry.style.edge {
            area.draw(&Rectangle::new([(10, y), (26, y + 14)], rgb(edge)?.stroke_width(1)))
                .map_err(writer_err)?;
        }
        if text {
            area.draw(&Text::new(entry.label.clone(), (32, y), (FONT, 14).into_font()))
                .map_err(writer_err)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::figure::{Bar, BarSeries, BoxStats, LegendEntry, Style};

    fn style(fill: &str) -> Style {
        Style {
            fill: fill.to_string(),
            edge: Some("#000000".to_string()),
            opacity: 1.0,
        }
    }

    fn figure() -> Figure {
        let bars = Panel {
            title: "MALE".to_string(),
            x_label: "bill_depth_mm".to_string(),
            y_label: "Count".to_string(),
            content: PanelContent::Bars(BarChart {
                axis: XAxis::Continuous,
                stacked: false,
                series: vec![BarSeries {
                    label: "bill_depth_mm".to_string(),
                    style: style("#4e79a7"),
                    bars: vec![
                        Bar { x0: 1.0, x1: 3.0, y0: 0.0, y1: 1.0 },
                        Bar { x0: 3.0, x1: 5.0, y0: 0.0, y1: 1.0 },
                    ],
                }],
            }),
        };
        let boxes = Panel {
            title: "FEMALE".to_string(),
            x_label: String::new(),
            y_label: "v".to_string(),
            content: PanelContent::Boxes(BoxChart {
                orientation: Orientation::Vertical,
                labels: vec!["v".to_string()],
                boxes: vec![BoxStats {
                    label: "v".to_string(),
                    position: 0.0,
                    q1: 2.0,
                    median: 3.0,
                    q3: 4.0,
                    mean: 3.0,
                    whisker_low: 1.0,
                    whisker_high: 4.0,
                    fliers: vec![100.0],
                    count: 5,
                    style: style("#ffffff"),
                }],
            }),
        };
        Figure {
            n_rows: 2,
            n_cols: 3,
            panels: vec![bars, boxes],
            legend: Some(Legend {
                entries: vec![LegendEntry {
                    label: "bill_depth_mm".to_string(),
                    style: style("#4e79a7"),
                }],
            }),
        }
    }

    #[test]
    fn test_category_label() {
        let labels = vec!["Adelie".to_string(), "Gentoo".to_string()];
        assert_eq!(category_label(&labels, 0.0), "Adelie");
        assert_eq!(category_label(&labels, 1.0000000001), "Gentoo");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, -1.0), "");
        assert_eq!(category_label(&labels, 2.0), "");
    }

    #[test]
    fn test_write_svg_string() {
        let svg = PlottersWriter::new(900, 600).write(&figure()).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn test_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PlottersWriter::default();

        let png = dir.path().join("plot.png");
        writer.write_png(&figure(), &png).unwrap();
        assert!(std::fs::metadata(&png).unwrap().len() > 0);

        let svg = dir.path().join("plot.svg");
        writer.write_svg(&figure(), &svg).unwrap();
        assert!(std::fs::read_to_string(&svg).unwrap().contains("<svg"));
    }

    #[test]
    fn test_empty_figure_is_rejected() {
        let figure = Figure {
            n_rows: 1,
            n_cols: 1,
            panels: vec![],
            legend: None,
        };
        assert!(PlottersWriter::default().write_svg_string(&figure).is_err());
    }

    #[test]
    fn test_bad_color_is_a_validation_error() {
        let mut figure = figure();
        figure.legend = None;
        if let PanelContent::Bars(chart) = &mut figure.panels[0].content {
            chart.series[0].style.fill = "not-a-color".to_string();
        }
        let err = PlottersWriter::default().write_svg_string(&figure).unwrap_err();
        assert!(matches!(err, GgplotError::ValidationError(_)));
    }
}
