//! Render-ready figure model
//!
//! Geometries resolve their query results into a [`Figure`]: a grid of
//! panels whose marks are already positioned in data coordinates. Writers only
//! map these coordinates to pixels (or to a JSON spec); they never query.

use serde::Serialize;

/// Box orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Boxes stand upright; values run along the y axis.
    #[default]
    Vertical,
    /// Boxes lie flat; values run along the x axis.
    Horizontal,
}

/// Fill and edge of a series, as hex colors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Style {
    pub fill: String,
    pub edge: Option<String>,
    pub opacity: f64,
}

/// One rectangle of a bar chart, in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bar {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

/// The bars drawn for one column or one stacking category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub label: String,
    pub style: Style,
    pub bars: Vec<Bar>,
}

/// How the x axis of a bar chart is labelled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum XAxis {
    /// Bars sit on a numeric scale (binned histogram).
    Continuous,
    /// Bars sit at integer positions `0..labels.len()`.
    Categorical { labels: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub axis: XAxis,
    pub stacked: bool,
    pub series: Vec<BarSeries>,
}

impl BarChart {
    /// Extent of the x axis.
    pub fn x_range(&self) -> (f64, f64) {
        match &self.axis {
            XAxis::Categorical { labels } => (-0.5, labels.len().max(1) as f64 - 0.5),
            XAxis::Continuous => {
                let bars = self.series.iter().flat_map(|s| s.bars.iter());
                let (min, max) = bars.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), b| {
                    (lo.min(b.x0), hi.max(b.x1))
                });
                if min.is_finite() && max > min {
                    (min, max)
                } else {
                    (0.0, 1.0)
                }
            }
        }
    }

    /// Height of the tallest bar (at least 1).
    pub fn y_max(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.bars.iter())
            .map(|b| b.y1)
            .fold(1.0, f64::max)
    }
}

/// Five-number summary plus outliers for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub label: String,
    /// Position along the categorical axis.
    pub position: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub mean: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub fliers: Vec<f64>,
    pub count: usize,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxChart {
    pub orientation: Orientation,
    /// Labels of the categorical axis, one per `x` column.
    pub labels: Vec<String>,
    pub boxes: Vec<BoxStats>,
}

impl BoxChart {
    /// Extent of the value axis, padded by 5% on each side.
    pub fn value_range(&self) -> (f64, f64) {
        let (min, max) = self
            .boxes
            .iter()
            .flat_map(|b| {
                b.fliers
                    .iter()
                    .copied()
                    .chain([b.whisker_low, b.whisker_high])
            })
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if !min.is_finite() {
            return (0.0, 1.0);
        }
        let pad = if max > min { (max - min) * 0.05 } else { 0.5 };
        (min - pad, max + pad)
    }

    /// Extent of the categorical axis.
    pub fn position_range(&self) -> (f64, f64) {
        (-0.5, self.labels.len().max(1) as f64 - 0.5)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PanelContent {
    Bars(BarChart),
    Boxes(BoxChart),
}

impl PanelContent {
    /// One legend entry per bar series; boxplots are labelled by their axis.
    pub fn legend_entries(&self) -> Vec<LegendEntry> {
        match self {
            PanelContent::Bars(chart) => chart
                .series
                .iter()
                .map(|s| LegendEntry {
                    label: s.label.clone(),
                    style: s.style.clone(),
                })
                .collect(),
            PanelContent::Boxes(_) => Vec::new(),
        }
    }
}

/// One sub-plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub content: PanelContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub entries: Vec<LegendEntry>,
}

/// A grid of panels plus an optional shared legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub n_rows: usize,
    pub n_cols: usize,
    pub panels: Vec<Panel>,
    pub legend: Option<Legend>,
}

/// Short human-readable form of a number for axis and bin labels.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let text = format!("{:.2}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> Style {
        Style {
            fill: "#4e79a7".to_string(),
            edge: None,
            opacity: 1.0,
        }
    }

    #[test]
    fn test_bar_chart_ranges() {
        let chart = BarChart {
            axis: XAxis::Continuous,
            stacked: false,
            series: vec![BarSeries {
                label: "price".to_string(),
                style: style(),
                bars: vec![
                    Bar { x0: 0.0, x1: 5.0, y0: 0.0, y1: 3.0 },
                    Bar { x0: 5.0, x1: 10.0, y0: 0.0, y1: 7.0 },
                ],
            }],
        };
        assert_eq!(chart.x_range(), (0.0, 10.0));
        assert_eq!(chart.y_max(), 7.0);
    }

    #[test]
    fn test_empty_bar_chart_ranges() {
        let chart = BarChart {
            axis: XAxis::Continuous,
            stacked: false,
            series: vec![],
        };
        assert_eq!(chart.x_range(), (0.0, 1.0));
        assert_eq!(chart.y_max(), 1.0);

        let categorical = BarChart {
            axis: XAxis::Categorical {
                labels: vec!["a".into(), "b".into(), "c".into()],
            },
            stacked: false,
            series: vec![],
        };
        assert_eq!(categorical.x_range(), (-0.5, 2.5));
    }

    #[test]
    fn test_box_value_range_includes_fliers() {
        let chart = BoxChart {
            orientation: Orientation::Vertical,
            labels: vec!["x".into()],
            boxes: vec![BoxStats {
                label: "x".into(),
                position: 0.0,
                q1: 2.0,
                median: 3.0,
                q3: 4.0,
                mean: 3.0,
                whisker_low: 1.0,
                whisker_high: 5.0,
                fliers: vec![11.0],
                count: 6,
                style: style(),
            }],
        };
        let (lo, hi) = chart.value_range();
        assert!((lo - 0.5).abs() < 1e-9);
        assert!((hi - 11.5).abs() < 1e-9);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.126), "0.13");
        assert_eq!(format_number(-1.0), "-1");
    }
}
