//! Vega-Lite JSON writer implementation
//!
//! Converts a resolved [`Figure`] into a Vega-Lite v6 specification with
//! inline data, for rendering in a browser.
//!
//! # Mapping Strategy
//!
//! - bar series -> `rect` marks spanning `x0..x1` by `y0..y1`
//! - boxes -> layered `rule` (whiskers), `rect` (box), `rule` (median) and
//!   `point` (fliers) marks
//! - panels -> one view each, wrapped with `concat` and `columns = n_cols`
//! - categorical axes -> numeric positions relabelled with `labelExpr`
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlggplot::writer::{Writer, VegaLiteWriter};
//!
//! let vega_json = VegaLiteWriter::new().write(&figure)?;
//! ```

use serde_json::{json, Map, Value};

use crate::plot::figure::{BarChart, BoxChart, Orientation, Panel, PanelContent, XAxis};
use crate::writer::Writer;
use crate::{GgplotError, Figure, Result};

/// Half the width of a box along its categorical axis.
const BOX_HALF_WIDTH: f64 = 0.3;

/// Vega-Lite JSON writer
///
/// Generates Vega-Lite v6 specifications from figures.
pub struct VegaLiteWriter {
    /// Vega-Lite schema version
    schema: String,
    /// Size of a single panel in pixels
    panel_width: u32,
    panel_height: u32,
}

impl VegaLiteWriter {
    /// Create a new Vega-Lite writer with default settings
    pub fn new() -> Self {
        Self {
            schema: "https://vega.github.io/schema/vega-lite/v6.json".to_string(),
            panel_width: 300,
            panel_height: 200,
        }
    }

    pub fn panel_size(mut self, width: u32, height: u32) -> Self {
        self.panel_width = width;
        self.panel_height = height;
        self
    }

    /// Build the spec as a JSON value.
    pub fn to_value(&self, figure: &Figure) -> Result<Value> {
        if figure.panels.is_empty() {
            return Err(GgplotError::WriterError(
                "Figure has no panels to render".to_string(),
            ));
        }
        let show_legend = figure.legend.is_some();

        let mut views: Vec<Value> = figure
            .panels
            .iter()
            .enumerate()
            .map(|(i, panel)| self.panel_view(panel, show_legend && i == 0))
            .collect();

        let mut spec = if views.len() == 1 && figure.n_rows * figure.n_cols == 1 {
            views.remove(0)
        } else {
            json!({
                "columns": figure.n_cols,
                "concat": views,
            })
        };
        spec["$schema"] = json!(self.schema);
        Ok(spec)
    }

    fn panel_view(&self, panel: &Panel, legend: bool) -> Value {
        let layers = match &panel.content {
            PanelContent::Bars(chart) => bar_layers(chart, panel, legend),
            PanelContent::Boxes(chart) => box_layers(chart, panel),
        };
        json!({
            "title": panel.title,
            "width": self.panel_width,
            "height": self.panel_height,
            "layer": layers,
        })
    }
}

impl Default for VegaLiteWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer for VegaLiteWriter {
    type Output = String;

    fn write(&self, figure: &Figure) -> Result<String> {
        let spec = self.to_value(figure)?;
        serde_json::to_string_pretty(&spec).map_err(|e| {
            GgplotError::WriterError(format!("Failed to serialize Vega-Lite spec: {}", e))
        })
    }
}

/// Axis definition that prints `labels[i]` at position `i`.
fn categorical_axis(labels: &[String]) -> Value {
    let positions: Vec<usize> = (0..labels.len()).collect();
    json!({
        "values": positions,
        "labelExpr": format!("{}[datum.value]", json!(labels)),
        "grid": false,
    })
}

fn bar_layers(chart: &BarChart, panel: &Panel, legend: bool) -> Vec<Value> {
    let values: Vec<Value> = chart
        .series
        .iter()
        .flat_map(|series| {
            series.bars.iter().map(move |bar| {
                json!({
                    "series": series.label,
                    "x0": bar.x0,
                    "x1": bar.x1,
                    "y0": bar.y0,
                    "y1": bar.y1,
                    "stroke": series.style.edge,
                    "opacity": series.style.opacity,
                })
            })
        })
        .collect();

    let (x_min, x_max) = chart.x_range();
    let mut x = Map::new();
    x.insert("field".into(), json!("x0"));
    x.insert("type".into(), json!("quantitative"));
    x.insert("title".into(), json!(panel.x_label));
    x.insert("scale".into(), json!({ "domain": [x_min, x_max], "nice": false }));
    if let XAxis::Categorical { labels } = &chart.axis {
        x.insert("axis".into(), categorical_axis(labels));
    }

    let domain: Vec<&str> = chart.series.iter().map(|s| s.label.as_str()).collect();
    let range: Vec<&str> = chart.series.iter().map(|s| s.style.fill.as_str()).collect();

    let legend = if legend {
        json!({ "title": null })
    } else {
        Value::Null
    };

    vec![json!({
        "data": { "values": values },
        "mark": { "type": "rect" },
        "encoding": {
            "x": Value::Object(x),
            "x2": { "field": "x1" },
            "y": {
                "field": "y0",
                "type": "quantitative",
                "title": panel.y_label,
                "scale": { "domain": [0.0, chart.y_max()] },
            },
            "y2": { "field": "y1" },
            "color": {
                "field": "series",
                "type": "nominal",
                "scale": { "domain": domain, "range": range },
                "legend": legend,
            },
            // edges and opacity are literal per-series values
            "stroke": identity("stroke"),
            "opacity": {
                "field": "opacity",
                "type": "quantitative",
                "scale": null,
                "legend": null,
            },
        },
    })]
}

/// Encoding that takes a nominal field's values literally.
fn identity(field: &str) -> Value {
    json!({ "field": field, "type": "nominal", "scale": null, "legend": null })
}

/// Position encoding over `[min, max]` without an axis.
fn bare_position(field: &str, (min, max): (f64, f64)) -> Value {
    json!({
        "field": field,
        "type": "quantitative",
        "scale": { "domain": [min, max], "nice": false },
        "axis": null,
    })
}

fn box_layers(chart: &BoxChart, panel: &Panel) -> Vec<Value> {
    let (pos, val) = match chart.orientation {
        Orientation::Vertical => ("x", "y"),
        Orientation::Horizontal => ("y", "x"),
    };
    let (pos_title, val_title) = match chart.orientation {
        Orientation::Vertical => (&panel.x_label, &panel.y_label),
        Orientation::Horizontal => (&panel.y_label, &panel.x_label),
    };
    let pos2 = format!("{}2", pos);
    let val2 = format!("{}2", val);

    let stats: Vec<Value> = chart
        .boxes
        .iter()
        .map(|b| {
            json!({
                "label": b.label,
                "position": b.position,
                "p0": b.position - BOX_HALF_WIDTH,
                "p1": b.position + BOX_HALF_WIDTH,
                "q1": b.q1,
                "median": b.median,
                "q3": b.q3,
                "lower": b.whisker_low,
                "upper": b.whisker_high,
                "fill": b.style.fill,
                "stroke": b.style.edge,
            })
        })
        .collect();
    let fliers: Vec<Value> = chart
        .boxes
        .iter()
        .flat_map(|b| {
            b.fliers
                .iter()
                .map(move |v| json!({ "position": b.position, "value": v }))
        })
        .collect();

    let (p_min, p_max) = chart.position_range();
    let (v_min, v_max) = chart.value_range();
    let position = json!({
        "field": "position",
        "type": "quantitative",
        "title": pos_title,
        "scale": { "domain": [p_min, p_max], "nice": false },
        "axis": categorical_axis(&chart.labels),
    });
    let value = |field: &str| {
        json!({
            "field": field,
            "type": "quantitative",
            "title": val_title,
            "scale": { "domain": [v_min, v_max], "nice": false },
        })
    };

    let mut whiskers = Map::new();
    whiskers.insert(pos.into(), position.clone());
    whiskers.insert(val.into(), value("lower"));
    whiskers.insert(val2.clone(), json!({ "field": "upper" }));

    let mut body = Map::new();
    body.insert(pos.into(), bare_position("p0", (p_min, p_max)));
    body.insert(pos2.clone(), json!({ "field": "p1" }));
    body.insert(val.into(), value("q1"));
    body.insert(val2.clone(), json!({ "field": "q3" }));
    body.insert("fill".into(), identity("fill"));
    body.insert("stroke".into(), identity("stroke"));

    let mut median = Map::new();
    median.insert(pos.into(), bare_position("p0", (p_min, p_max)));
    median.insert(pos2, json!({ "field": "p1" }));
    median.insert(val.into(), value("median"));
    median.insert(val2, json!({ "field": "median" }));

    let mut points = Map::new();
    points.insert(pos.into(), position);
    points.insert(val.into(), value("value"));

    let layer = |values: &[Value], mark: Value, encoding: Map<String, Value>| {
        json!({
            "data": { "values": values },
            "mark": mark,
            "encoding": Value::Object(encoding),
        })
    };
    vec![
        layer(&stats, json!({ "type": "rule" }), whiskers),
        layer(&stats, json!({ "type": "rect" }), body),
        layer(&stats, json!({ "type": "rule", "strokeWidth": 2 }), median),
        layer(&fliers, json!({ "type": "point", "filled": false }), points),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::figure::{Bar, BarSeries, BoxStats, Legend, LegendEntry, Style};

    fn style(fill: &str) -> Style {
        Style {
            fill: fill.to_string(),
            edge: None,
            opacity: 1.0,
        }
    }

    fn bar_panel(title: &str) -> Panel {
        Panel {
            title: title.to_string(),
            x_label: "bill_depth_mm".to_string(),
            y_label: "Count".to_string(),
            content: PanelContent::Bars(BarChart {
                axis: XAxis::Continuous,
                stacked: false,
                series: vec![BarSeries {
                    label: "bill_depth_mm".to_string(),
                    style: style("#4e79a7"),
                    bars: vec![Bar { x0: 1.0, x1: 3.0, y0: 0.0, y1: 2.0 }],
                }],
            }),
        }
    }

    #[test]
    fn test_single_panel_is_a_layered_view() {
        let figure = Figure {
            n_rows: 1,
            n_cols: 1,
            panels: vec![bar_panel("'bill_depth_mm' from 'penguins'")],
            legend: None,
        };
        let spec = VegaLiteWriter::new().to_value(&figure).unwrap();

        assert_eq!(spec["$schema"], "https://vega.github.io/schema/vega-lite/v6.json");
        assert_eq!(spec["title"], "'bill_depth_mm' from 'penguins'");
        let layer = &spec["layer"][0];
        assert_eq!(layer["mark"]["type"], "rect");
        assert_eq!(layer["data"]["values"][0]["y1"], 2.0);
        assert_eq!(layer["encoding"]["color"]["scale"]["range"][0], "#4e79a7");
        assert!(layer["encoding"]["color"]["legend"].is_null());
    }

    #[test]
    fn test_facets_are_concatenated() {
        let figure = Figure {
            n_rows: 2,
            n_cols: 3,
            panels: (0..4).map(|i| bar_panel(&i.to_string())).collect(),
            legend: Some(Legend {
                entries: vec![LegendEntry {
                    label: "bill_depth_mm".to_string(),
                    style: style("#4e79a7"),
                }],
            }),
        };
        let spec = VegaLiteWriter::new().to_value(&figure).unwrap();

        assert_eq!(spec["columns"], 3);
        assert_eq!(spec["concat"].as_array().unwrap().len(), 4);
        assert_eq!(spec["concat"][3]["title"], "3");
        assert!(spec["concat"][0]["layer"][0]["encoding"]["color"]["legend"].is_object());
        assert!(spec["concat"][1]["layer"][0]["encoding"]["color"]["legend"].is_null());
    }

    #[test]
    fn test_horizontal_boxes_swap_channels() {
        let figure = Figure {
            n_rows: 1,
            n_cols: 1,
            panels: vec![Panel {
                title: "t".to_string(),
                x_label: "v".to_string(),
                y_label: String::new(),
                content: PanelContent::Boxes(BoxChart {
                    orientation: Orientation::Horizontal,
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
            }],
            legend: None,
        };
        let spec = VegaLiteWriter::new().to_value(&figure).unwrap();
        let layers = spec["layer"].as_array().unwrap();
        assert_eq!(layers.len(), 4);
        assert_eq!(layers[0]["encoding"]["x"]["field"], "lower");
        assert_eq!(layers[0]["encoding"]["y"]["field"], "position");
        assert_eq!(layers[3]["data"]["values"][0]["value"], 100.0);
    }

    #[test]
    fn test_series_keep_their_own_edges() {
        let series = |label: &str, fill: &str, edge: &str| BarSeries {
            label: label.to_string(),
            style: Style {
                fill: fill.to_string(),
                edge: Some(edge.to_string()),
                opacity: 0.6,
            },
            bars: vec![Bar { x0: 1.0, x1: 3.0, y0: 0.0, y1: 2.0 }],
        };
        let figure = Figure {
            n_rows: 1,
            n_cols: 1,
            panels: vec![Panel {
                title: "t".to_string(),
                x_label: "a, b".to_string(),
                y_label: "Count".to_string(),
                content: PanelContent::Bars(BarChart {
                    axis: XAxis::Continuous,
                    stacked: false,
                    series: vec![
                        series("a", "#4e79a7", "#008000"),
                        series("b", "#f28e2b", "#ff00ff"),
                    ],
                }),
            }],
            legend: None,
        };
        let spec = VegaLiteWriter::new().to_value(&figure).unwrap();
        let layer = &spec["layer"][0];

        assert!(layer["mark"]["stroke"].is_null());
        assert_eq!(layer["encoding"]["stroke"]["field"], "stroke");
        assert!(layer["encoding"]["stroke"]["scale"].is_null());
        assert_eq!(layer["data"]["values"][0]["stroke"], "#008000");
        assert_eq!(layer["data"]["values"][1]["stroke"], "#ff00ff");
        assert_eq!(layer["data"]["values"][1]["opacity"], 0.6);
    }

    #[test]
    fn test_categorical_axis_label_expr() {
        let axis = categorical_axis(&["a".to_string(), "b".to_string()]);
        assert_eq!(axis["labelExpr"], "[\"a\",\"b\"][datum.value]");
        assert_eq!(axis["values"], json!([0, 1]));
    }

    #[test]
    fn test_empty_figure_is_rejected() {
        let figure = Figure {
            n_rows: 1,
            n_cols: 1,
            panels: vec![],
            legend: None,
        };
        assert!(VegaLiteWriter::new().write(&figure).is_err());
    }
}
