//! Boxplot geom implementation

use super::types::{default_title, ColumnKind, LayerContext};
use super::{GeomTrait, GeomType};
use crate::naming;
use crate::plot::figure::{BoxChart, BoxStats, Orientation, Panel, PanelContent, Style};
use crate::plot::scale::color_to_hex;
use crate::reader::frame;
use crate::sql::{not_null, number_literal, quote_ident, Filter};
use crate::{GgplotError, Result};

/// Whiskers reach the most extreme values within this many IQRs of the box.
const WHISKER_COEF: f64 = 1.5;

const DEFAULT_FILL: &str = "#ffffff";
const DEFAULT_EDGE: &str = "#000000";

/// Boxplot geom - box and whisker plots, one box per x column
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeomBoxplot {
    pub orientation: Orientation,
}

/// Start a boxplot layer.
pub fn geom_boxplot() -> GeomBoxplot {
    GeomBoxplot::default()
}

impl GeomBoxplot {
    pub fn orient(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }
}

impl GeomTrait for GeomBoxplot {
    fn geom_type(&self) -> GeomType {
        GeomType::Boxplot
    }

    fn draw(&self, ctx: &LayerContext<'_>, panels: &[Filter]) -> Result<Vec<Panel>> {
        let columns = self.columns(ctx.aes)?;
        for column in &columns {
            if ctx.column_kind(column)? != ColumnKind::Numeric {
                return Err(GgplotError::ValidationError(format!(
                    "Boxplots need numeric columns, but '{}' has no numeric values",
                    column
                )));
            }
        }

        let styles = (0..columns.len())
            .map(|i| box_style(ctx, i))
            .collect::<Result<Vec<_>>>()?;
        let title = default_title(&columns, ctx.table);
        let (x_label, y_label) = match self.orientation {
            Orientation::Vertical => (String::new(), columns.join(", ")),
            Orientation::Horizontal => (columns.join(", "), String::new()),
        };

        panels
            .iter()
            .map(|filter| {
                let mut boxes = Vec::with_capacity(columns.len());
                for (i, (column, style)) in columns.iter().zip(&styles).enumerate() {
                    match stat_boxplot(ctx, column, filter)? {
                        Some(summary) => boxes.push(summary.into_box(column, i, style.clone())),
                        None => tracing::debug!(column = %column, "no values for box"),
                    }
                }
                Ok(Panel {
                    title: title.clone(),
                    x_label: x_label.clone(),
                    y_label: y_label.clone(),
                    content: PanelContent::Boxes(BoxChart {
                        orientation: self.orientation,
                        labels: columns.clone(),
                        boxes,
                    }),
                })
            })
            .collect()
    }
}

fn box_style(ctx: &LayerContext<'_>, index: usize) -> Result<Style> {
    let fill = match ctx.aes.fill.cycled(index) {
        Some(color) => color_to_hex(color)?,
        None => DEFAULT_FILL.to_string(),
    };
    let edge = match ctx.aes.color.cycled(index) {
        Some(color) => color_to_hex(color)?,
        None => DEFAULT_EDGE.to_string(),
    };
    Ok(Style {
        fill,
        edge: Some(edge),
        opacity: 1.0,
    })
}

/// Summary statistics of one column within one panel.
#[derive(Debug, Clone, PartialEq)]
struct Summary {
    q1: f64,
    median: f64,
    q3: f64,
    mean: f64,
    count: usize,
    lower: f64,
    upper: f64,
    fliers: Vec<f64>,
}

impl Summary {
    fn into_box(self, column: &str, position: usize, style: Style) -> BoxStats {
        BoxStats {
            label: column.to_string(),
            position: position as f64,
            q1: self.q1,
            median: self.median,
            q3: self.q3,
            mean: self.mean,
            whisker_low: self.lower,
            whisker_high: self.upper,
            fliers: self.fliers,
            count: self.count,
            style,
        }
    }
}

/// Quartiles, whiskers and outliers of `column` under `filter`; `None` when
/// the panel has no values for it.
fn stat_boxplot(ctx: &LayerContext<'_>, column: &str, filter: &Filter) -> Result<Option<Summary>> {
    let v = quote_ident(column);
    let source = ctx.source();
    let filter = filter.clone().and(not_null(column));

    let stat_q1 = naming::stat_column("q1");
    let stat_median = naming::stat_column("median");
    let stat_q3 = naming::stat_column("q3");
    let stat_mean = naming::stat_column("mean");
    let stat_count = naming::stat_column("count");

    // 5-number summary minus the whiskers, which depend on the IQR
    let stats_query = format!(
        "SELECT
          CAST(quantile_cont({v}, 0.25) AS DOUBLE) AS {q1},
          CAST(quantile_cont({v}, 0.5) AS DOUBLE)  AS {median},
          CAST(quantile_cont({v}, 0.75) AS DOUBLE) AS {q3},
          CAST(AVG({v}) AS DOUBLE)                 AS {mean},
          COUNT({v})                               AS {count}
        FROM {source}
        {where_clause}",
        v = v,
        q1 = quote_ident(&stat_q1),
        median = quote_ident(&stat_median),
        q3 = quote_ident(&stat_q3),
        mean = quote_ident(&stat_mean),
        count = quote_ident(&stat_count),
        source = source,
        where_clause = filter.where_clause(),
    );
    let df = ctx.query(&stats_query)?;

    let count = frame::first_f64(&df, &stat_count)?.unwrap_or(0.0) as usize;
    if count == 0 {
        return Ok(None);
    }
    let stat = |name: &str| -> Result<f64> {
        frame::first_f64(&df, name)?.ok_or_else(|| {
            GgplotError::InternalError(format!("Boxplot statistic '{}' is missing", name))
        })
    };
    let (q1, median, q3, mean) = (
        stat(&stat_q1)?,
        stat(&stat_median)?,
        stat(&stat_q3)?,
        stat(&stat_mean)?,
    );

    let iqr = q3 - q1;
    let fence_low = q1 - WHISKER_COEF * iqr;
    let fence_high = q3 + WHISKER_COEF * iqr;

    let stat_lower = naming::stat_column("lower");
    let stat_upper = naming::stat_column("upper");
    let whisker_query = format!(
        "SELECT
          CAST(MIN(CASE WHEN {v} >= {lo} THEN {v} END) AS DOUBLE) AS {lower},
          CAST(MAX(CASE WHEN {v} <= {hi} THEN {v} END) AS DOUBLE) AS {upper}
        FROM {source}
        {where_clause}",
        v = v,
        lo = number_literal(fence_low),
        hi = number_literal(fence_high),
        lower = quote_ident(&stat_lower),
        upper = quote_ident(&stat_upper),
        source = source,
        where_clause = filter.where_clause(),
    );
    let df = ctx.query(&whisker_query)?;
    let lower = frame::first_f64(&df, &stat_lower)?.unwrap_or(q1);
    let upper = frame::first_f64(&df, &stat_upper)?.unwrap_or(q3);

    let stat_value = naming::stat_column("value");
    let flier_query = format!(
        "SELECT CAST({v} AS DOUBLE) AS {value} FROM {source} {where_clause} ORDER BY 1",
        v = v,
        value = quote_ident(&stat_value),
        source = source,
        where_clause = filter
            .clone()
            .and(format!(
                "({v} < {lo} OR {v} > {hi})",
                v = v,
                lo = number_literal(lower),
                hi = number_literal(upper)
            ))
            .where_clause(),
    );
    let fliers = frame::f64_values(&ctx.query(&flier_query)?, &stat_value)?
        .into_iter()
        .flatten()
        .collect();

    Ok(Some(Summary {
        q1,
        median,
        q3,
        mean,
        count,
        lower,
        upper,
        fliers,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::aes;

    #[test]
    fn test_builder() {
        assert_eq!(geom_boxplot().orientation, Orientation::Vertical);
        assert_eq!(
            geom_boxplot().orient(Orientation::Horizontal).orientation,
            Orientation::Horizontal
        );
    }

    #[cfg(feature = "duckdb")]
    mod engine {
        use super::*;
        use crate::reader::data::duckdb_penguins;
        use crate::{Aes, Connection};

        fn draw(
            conn: &Connection,
            table: &str,
            mapping: &Aes,
            panels: &[Filter],
        ) -> Result<Vec<Panel>> {
            let ctx = LayerContext {
                conn,
                table,
                with: &[],
                aes: mapping,
            };
            geom_boxplot().draw(&ctx, panels)
        }

        fn boxes(panel: &Panel) -> &BoxChart {
            match &panel.content {
                PanelContent::Boxes(chart) => chart,
                other => panic!("expected boxes, got {:?}", other),
            }
        }

        #[test]
        fn test_five_number_summary() {
            let conn = duckdb_penguins();
            let panels =
                draw(&conn, "penguins", &aes().x("bill_depth_mm"), &[Filter::new()]).unwrap();
            let chart = boxes(&panels[0]);
            let b = &chart.boxes[0];
            assert_eq!((b.q1, b.median, b.q3), (2.0, 3.0, 4.0));
            assert_eq!((b.whisker_low, b.whisker_high), (1.0, 5.0));
            assert_eq!(b.mean, 3.0);
            assert_eq!(b.count, 5);
            assert!(b.fliers.is_empty());
            assert_eq!(b.style.fill, DEFAULT_FILL);
            assert_eq!(b.style.edge.as_deref(), Some(DEFAULT_EDGE));
        }

        #[test]
        fn test_outliers_become_fliers() {
            let conn = duckdb_penguins();
            conn.run(
                "CREATE TABLE skew AS \
                 SELECT * FROM (VALUES (1.0), (2.0), (3.0), (4.0), (100.0)) t(v)",
            )
            .unwrap();
            let panels = draw(&conn, "skew", &aes().x("v"), &[Filter::new()]).unwrap();
            let b = &boxes(&panels[0]).boxes[0];
            assert_eq!(b.whisker_high, 4.0);
            assert_eq!(b.fliers, vec![100.0]);
        }

        #[test]
        fn test_facet_filter_and_colors() {
            let conn = duckdb_penguins();
            let mapping = aes()
                .x(["bill_depth_mm", "flipper_length_mm"])
                .fill(["red", "blue"])
                .color("k");
            let panels = draw(
                &conn,
                "penguins",
                &mapping,
                &[Filter::new().and("\"sex\" = 'MALE'")],
            )
            .unwrap();
            let chart = boxes(&panels[0]);
            assert_eq!(chart.labels, vec!["bill_depth_mm", "flipper_length_mm"]);
            assert_eq!(chart.boxes.len(), 2);
            assert_eq!((chart.boxes[0].q1, chart.boxes[0].median), (1.5, 2.0));
            assert_eq!(chart.boxes[1].position, 1.0);
            assert_eq!(chart.boxes[1].style.fill, "#0000ff");
            assert_eq!(chart.boxes[1].style.edge.as_deref(), Some("#000000"));
        }

        #[test]
        fn test_empty_panel_has_no_boxes() {
            let conn = duckdb_penguins();
            let panels = draw(
                &conn,
                "penguins",
                &aes().x("bill_depth_mm"),
                &[Filter::new().and("\"sex\" = 'NONE'")],
            )
            .unwrap();
            assert!(boxes(&panels[0]).boxes.is_empty());
        }

        #[test]
        fn test_categorical_column_is_rejected() {
            let conn = duckdb_penguins();
            let err = draw(&conn, "penguins", &aes().x("species"), &[Filter::new()]).unwrap_err();
            assert!(err.to_string().contains("'species'"));
        }
    }
}
