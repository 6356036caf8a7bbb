//! The `Ggplot` builder
//!
//! A plot starts from [`ggplot`] and grows by adding a geom and optionally a
//! facet with `+`. Nothing is queried until [`Ggplot::build`] (or one of the
//! rendering shortcuts) runs.
//!
//! ```rust,ignore
//! let plot = ggplot(&conn, "penguins", aes().x("bill_depth_mm"))
//!     + geom_histogram().bins(10)
//!     + facet_wrap("sex");
//! let figure = plot.build()?;
//! ```

use std::ops::Add;

use serde::Serialize;

use crate::plot::facet::{facet_filter, get_facet_values, FacetWrap};
use crate::plot::figure::{Figure, Legend};
use crate::plot::layer::geom::{Geom, GeomBoxplot, GeomHistogram, LayerContext};
use crate::plot::Aes;
use crate::reader::Connection;
use crate::sql::Filter;
use crate::{GgplotError, Result};

/// A plot over one table (or snippet) of a connection.
#[derive(Debug, Clone)]
pub struct Ggplot<'a> {
    conn: &'a Connection,
    table: String,
    with: Vec<String>,
    mapping: Aes,
    geom: Option<Geom>,
    facet: Option<FacetWrap>,
}

/// Start a plot of `table` with the given aesthetic mapping.
pub fn ggplot<'a>(conn: &'a Connection, table: impl Into<String>, mapping: Aes) -> Ggplot<'a> {
    Ggplot {
        conn,
        table: table.into(),
        with: Vec::new(),
        mapping,
        geom: None,
        facet: None,
    }
}

/// Serializable summary of a plot, for logging and debugging.
#[derive(Debug, Serialize)]
struct PlotSummary<'p> {
    table: &'p str,
    with: &'p [String],
    mapping: &'p Aes,
    geom: Option<String>,
    facet: Option<&'p FacetWrap>,
}

impl<'a> Ggplot<'a> {
    /// Prepend a saved snippet to every query of this plot.
    pub fn with_cte(mut self, name: impl Into<String>) -> Self {
        self.with.push(name.into());
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn mapping(&self) -> &Aes {
        &self.mapping
    }

    pub fn geom(&self) -> Option<&Geom> {
        self.geom.as_ref()
    }

    pub fn facet(&self) -> Option<&FacetWrap> {
        self.facet.as_ref()
    }

    fn with_geom(mut self, geom: Geom) -> Self {
        if let Some(previous) = &self.geom {
            tracing::warn!(
                previous = %previous,
                geom = %geom,
                "plot already has a geometry; replacing it"
            );
        }
        self.geom = Some(geom);
        self
    }

    /// JSON summary of the plot definition.
    pub fn describe(&self) -> String {
        let summary = PlotSummary {
            table: &self.table,
            with: &self.with,
            mapping: &self.mapping,
            geom: self.geom.as_ref().map(ToString::to_string),
            facet: self.facet.as_ref(),
        };
        serde_json::to_string(&summary).unwrap_or_default()
    }

    /// Run the plot's queries and resolve them into a figure.
    ///
    /// # Errors
    ///
    /// `ValidationError` for a plot without a geometry or with an invalid
    /// mapping; `ReaderError` when a query fails.
    pub fn build(&self) -> Result<Figure> {
        let geom = self.geom.as_ref().ok_or_else(|| {
            GgplotError::ValidationError(
                "No geometry to draw; add one with geom_histogram() or geom_boxplot()".to_string(),
            )
        })?;
        // fail on a bad mapping before any facet query runs
        geom.columns(&self.mapping)?;
        tracing::debug!(plot = %self.describe(), "building plot");

        let ctx = LayerContext {
            conn: self.conn,
            table: &self.table,
            with: &self.with,
            aes: &self.mapping,
        };

        let Some(facet) = &self.facet else {
            let panels = geom.draw(&ctx, &[Filter::new()])?;
            let entries = panels
                .first()
                .map(|panel| panel.content.legend_entries())
                .unwrap_or_default();
            return Ok(Figure {
                n_rows: 1,
                n_cols: 1,
                panels,
                legend: (entries.len() > 1).then_some(Legend { entries }),
            });
        };

        let grid = get_facet_values(self.conn, &self.table, &facet.column, &self.with)?;
        let filters: Vec<Filter> = grid
            .values
            .iter()
            .map(|value| facet_filter(&facet.column, value))
            .collect();
        let mut panels = geom.draw(&ctx, &filters)?;
        for (panel, value) in panels.iter_mut().zip(&grid.values) {
            panel.title = value.to_string();
        }

        let legend = if facet.legend {
            panels
                .first()
                .map(|panel| Legend {
                    entries: panel.content.legend_entries(),
                })
                .filter(|legend| !legend.entries.is_empty())
        } else {
            None
        };

        Ok(Figure {
            n_rows: grid.n_rows,
            n_cols: grid.n_cols,
            panels,
            legend,
        })
    }

    /// Render to a PNG or SVG file, chosen by the file extension.
    #[cfg(feature = "plotters")]
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.save_with(path, &crate::writer::PlottersWriter::default())
    }

    /// Like [`Ggplot::save`] with explicit image dimensions.
    #[cfg(feature = "plotters")]
    pub fn save_with(
        &self,
        path: impl AsRef<std::path::Path>,
        writer: &crate::writer::PlottersWriter,
    ) -> Result<()> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);
        match extension.as_deref() {
            Some("png") => writer.write_png(&self.build()?, path),
            Some("svg") => writer.write_svg(&self.build()?, path),
            _ => Err(GgplotError::WriterError(format!(
                "Cannot tell the image format of '{}'; use a .png or .svg extension",
                path.display()
            ))),
        }
    }

    /// Render to a Vega-Lite JSON spec.
    #[cfg(feature = "vegalite")]
    pub fn to_vegalite(&self) -> Result<String> {
        use crate::writer::Writer;
        crate::writer::VegaLiteWriter::new().write(&self.build()?)
    }
}

impl<'a> Add<Geom> for Ggplot<'a> {
    type Output = Ggplot<'a>;

    fn add(self, geom: Geom) -> Self::Output {
        self.with_geom(geom)
    }
}

impl<'a> Add<GeomHistogram> for Ggplot<'a> {
    type Output = Ggplot<'a>;

    fn add(self, geom: GeomHistogram) -> Self::Output {
        self.with_geom(geom.into())
    }
}

impl<'a> Add<GeomBoxplot> for Ggplot<'a> {
    type Output = Ggplot<'a>;

    fn add(self, geom: GeomBoxplot) -> Self::Output {
        self.with_geom(geom.into())
    }
}

impl<'a> Add<FacetWrap> for Ggplot<'a> {
    type Output = Ggplot<'a>;

    fn add(mut self, facet: FacetWrap) -> Self::Output {
        if let Some(previous) = &self.facet {
            tracing::warn!(
                previous = %previous.column,
                column = %facet.column,
                "plot is already faceted; replacing it"
            );
        }
        self.facet = Some(facet);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::figure::PanelContent;
    use crate::plot::layer::geom::GeomType;
    use crate::plot::{aes, facet_wrap, geom_boxplot, geom_histogram};

    #[cfg(feature = "duckdb")]
    use crate::reader::data::duckdb_penguins;

    #[cfg(feature = "duckdb")]
    #[test]
    fn test_build_without_geom() {
        let conn = duckdb_penguins();
        let err = ggplot(&conn, "penguins", aes().x("bill_depth_mm"))
            .build()
            .unwrap_err();
        assert!(matches!(err, GgplotError::ValidationError(_)));
    }

    #[cfg(feature = "duckdb")]
    #[test]
    fn test_add_replaces_geometry() {
        let conn = duckdb_penguins();
        let plot = ggplot(&conn, "penguins", aes().x("bill_depth_mm"))
            + geom_histogram().bins(3)
            + geom_boxplot();
        assert_eq!(plot.geom().map(Geom::geom_type), Some(GeomType::Boxplot));
        assert!(plot.describe().contains("\"geom\":\"boxplot\""));
    }

    #[cfg(feature = "duckdb")]
    #[test]
    fn test_add_prebuilt_geom_then_facet() {
        let conn = duckdb_penguins();
        let geom = Geom::from(geom_histogram().bins(2));
        let plot =
            ggplot(&conn, "penguins", aes().x("bill_depth_mm")) + geom + facet_wrap("species");
        assert_eq!(plot.geom().map(Geom::geom_type), Some(GeomType::Histogram));
        let figure = plot.build().unwrap();
        assert_eq!(figure.panels.len(), 3);
    }

    #[cfg(feature = "duckdb")]
    #[test]
    fn test_single_panel_figure() {
        let conn = duckdb_penguins();
        let plot = ggplot(&conn, "penguins", aes().x("bill_depth_mm")) + geom_histogram().bins(2);
        let figure = plot.build().unwrap();
        assert_eq!((figure.n_rows, figure.n_cols), (1, 1));
        assert_eq!(figure.panels.len(), 1);
        assert_eq!(figure.panels[0].title, "'bill_depth_mm' from 'penguins'");
        // a single series needs no legend
        assert!(figure.legend.is_none());
    }

    #[cfg(feature = "duckdb")]
    #[test]
    fn test_facet_wrap_by_sex() {
        let conn = duckdb_penguins();
        let plot = ggplot(&conn, "penguins", aes().x("bill_depth_mm"))
            + geom_histogram().bins(2)
            + facet_wrap("sex");
        let figure = plot.build().unwrap();

        assert_eq!((figure.n_rows, figure.n_cols), (1, 3));
        let titles: Vec<&str> = figure.panels.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["FEMALE", "MALE", "NULL"]);
        assert!(figure.legend.is_some());
    }

    #[cfg(feature = "duckdb")]
    #[test]
    fn test_facet_by_date_column() {
        let conn = duckdb_penguins();
        conn.run(
            "CREATE TABLE trips AS SELECT * FROM (VALUES \
             (DATE '2021-01-01', 1.0), (DATE '2021-01-01', 2.0), (DATE '2021-01-02', 4.0)) \
             v(d, dist)",
        )
        .unwrap();
        let plot =
            ggplot(&conn, "trips", aes().x("dist")) + geom_histogram().bins(2) + facet_wrap("d");
        let figure = plot.build().unwrap();

        let titles: Vec<&str> = figure.panels.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["2021-01-01", "2021-01-02"]);
        assert_eq!((figure.n_rows, figure.n_cols), (1, 2));
    }

    #[cfg(feature = "duckdb")]
    #[test]
    fn test_facet_without_legend() {
        let conn = duckdb_penguins();
        let plot = ggplot(&conn, "penguins", aes().x("bill_depth_mm"))
            + geom_histogram().bins(2).fill("species")
            + facet_wrap("sex").legend(false);
        let figure = plot.build().unwrap();
        assert!(figure.legend.is_none());
        assert_eq!(figure.panels.len(), 3);
    }

    #[cfg(feature = "duckdb")]
    #[test]
    fn test_stacked_facet_legend_lists_every_category() {
        let conn = duckdb_penguins();
        let plot = ggplot(&conn, "penguins", aes().x("bill_depth_mm"))
            + geom_histogram().bins(2).fill("species")
            + facet_wrap("sex");
        let legend = plot.build().unwrap().legend.unwrap();
        let labels: Vec<&str> = legend.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Adelie", "Chinstrap", "Gentoo"]);
    }

    #[cfg(feature = "duckdb")]
    #[test]
    fn test_mapping_is_checked_before_faceting() {
        let conn = duckdb_penguins();
        let plot = ggplot(&conn, "penguins", aes().x([""]))
            + geom_histogram().bins(10)
            + facet_wrap("no_such_column");
        let err = plot.build().unwrap_err();
        assert!(err.to_string().contains("Column name has not been specified"));

        let stacked = ggplot(&conn, "penguins", aes().x(["", ""]))
            + geom_histogram().bins(10).fill("species")
            + facet_wrap("no_such_column");
        let err = stacked.build().unwrap_err();
        assert!(err.to_string().contains("please ensure that you specify only one column"));
    }

    #[cfg(feature = "duckdb")]
    #[test]
    fn test_faceted_boxplot_over_a_snippet() {
        let mut conn = duckdb_penguins();
        conn.save_snippet("sexed", "SELECT * FROM penguins WHERE sex IS NOT NULL")
            .unwrap();
        let plot = ggplot(&conn, "sexed", aes().x("bill_depth_mm")).with_cte("sexed")
            + geom_boxplot()
            + facet_wrap("sex");
        let figure = plot.build().unwrap();

        assert_eq!((figure.n_rows, figure.n_cols), (1, 2));
        match &figure.panels[1].content {
            PanelContent::Boxes(chart) => assert_eq!(chart.boxes[0].median, 2.0),
            other => panic!("expected boxes, got {:?}", other),
        }
        assert!(figure.legend.is_none());
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_sqlite_histogram_matches_duckdb_binning() {
        let conn = crate::reader::data::sqlite_penguins();
        let plot = ggplot(&conn, "penguins", aes().x("bill_depth_mm")) + geom_histogram().bins(2);
        let figure = plot.build().unwrap();
        match &figure.panels[0].content {
            PanelContent::Bars(chart) => {
                let heights: Vec<f64> = chart.series[0].bars.iter().map(|b| b.y1).collect();
                assert_eq!(heights, vec![2.0, 3.0]);
            }
            other => panic!("expected bars, got {:?}", other),
        }
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_sqlite_boxplot() {
        let conn = crate::reader::data::sqlite_penguins();
        let figure = (ggplot(&conn, "penguins", aes().x("bill_depth_mm")) + geom_boxplot())
            .build()
            .unwrap();
        match &figure.panels[0].content {
            PanelContent::Boxes(chart) => {
                let b = &chart.boxes[0];
                assert_eq!((b.q1, b.median, b.q3), (2.0, 3.0, 4.0));
            }
            other => panic!("expected boxes, got {:?}", other),
        }
    }

    #[cfg(all(feature = "duckdb", feature = "plotters"))]
    #[test]
    fn test_save_by_extension() {
        let conn = duckdb_penguins();
        let plot = ggplot(&conn, "penguins", aes().x("bill_depth_mm"))
            + geom_histogram().bins(2)
            + facet_wrap("species");
        let dir = tempfile::tempdir().unwrap();

        let png = dir.path().join("bill_depth.png");
        plot.save(&png).unwrap();
        assert!(png.exists());

        let err = plot.save(dir.path().join("bill_depth.gif")).unwrap_err();
        assert!(matches!(err, GgplotError::WriterError(_)));
    }

    #[cfg(all(feature = "duckdb", feature = "vegalite"))]
    #[test]
    fn test_to_vegalite() {
        let conn = duckdb_penguins();
        let plot = ggplot(&conn, "penguins", aes().x("bill_depth_mm"))
            + geom_histogram().bins(2)
            + facet_wrap("species");
        let spec: serde_json::Value = serde_json::from_str(&plot.to_vegalite().unwrap()).unwrap();
        assert_eq!(spec["columns"], 3);
        assert_eq!(spec["concat"].as_array().unwrap().len(), 3);
    }
}
