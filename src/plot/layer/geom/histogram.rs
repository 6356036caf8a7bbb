//! Histogram geom implementation
//!
//! Numeric columns are binned in SQL (`FLOOR((x - min) / width)`), other
//! columns are counted per distinct value. Bins and category order are fixed
//! once over the whole source so every facet panel shares them; each panel
//! then runs its own counting query under the panel filter.

use std::collections::{BTreeMap, HashMap};

use super::types::{default_title, series_style, ColumnKind, LayerContext};
use super::{GeomTrait, GeomType};
use crate::naming;
use crate::plot::figure::{
    format_number, Bar, BarChart, BarSeries, Panel, PanelContent, Style, XAxis,
};
use crate::plot::scale::palettes::{colormap, DEFAULT_COLORMAP};
use crate::plot::scale::color_to_hex;
use crate::plot::Aes;
use crate::reader::frame;
use crate::sql::{not_null, number_literal, quote_ident, Filter};
use crate::{DataFrame, GgplotError, Result};

/// Opacity of overlaid numeric histograms.
const OVERLAY_OPACITY: f64 = 0.6;
/// Share of a category slot covered by its bars.
const SLOT_WIDTH: f64 = 0.8;

/// Histogram geom - counts of binned or categorical values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeomHistogram {
    /// Number of bins for numeric columns
    pub bins: Option<usize>,
    /// Column whose categories are stacked within each bar
    pub fill: Option<String>,
    /// Colormap for the stacked categories
    pub cmap: Option<String>,
}

/// Start a histogram layer.
pub fn geom_histogram() -> GeomHistogram {
    GeomHistogram::default()
}

impl GeomHistogram {
    pub fn bins(mut self, bins: usize) -> Self {
        self.bins = Some(bins);
        self
    }

    /// Stack bars by the categories of `column`.
    pub fn fill(mut self, column: impl Into<String>) -> Self {
        self.fill = Some(column.into());
        self
    }

    pub fn cmap(mut self, name: impl Into<String>) -> Self {
        self.cmap = Some(name.into());
        self
    }

    fn valid_bins(&self) -> Result<usize> {
        match self.bins {
            Some(bins) if bins > 0 => Ok(bins),
            _ => Err(GgplotError::ValidationError(
                "Please specify a valid number of bins.".to_string(),
            )),
        }
    }

    /// Shared binning for a numeric column, or `None` for a categorical one.
    fn binning(
        &self,
        ctx: &LayerContext<'_>,
        column: &str,
        kind: ColumnKind,
    ) -> Result<Option<Binning>> {
        match kind {
            ColumnKind::Categorical => Ok(None),
            ColumnKind::Numeric => {
                let bins = self.valid_bins()?;
                let (min, max) = ctx.min_max(column)?.unwrap_or((0.0, 0.0));
                Ok(Some(Binning::new(min, max, bins)))
            }
        }
    }
}

impl GeomTrait for GeomHistogram {
    fn geom_type(&self) -> GeomType {
        GeomType::Histogram
    }

    /// A stacked histogram takes exactly one `x` entry, blank or not.
    fn columns(&self, aes: &Aes) -> Result<Vec<String>> {
        if self.fill.is_some() && aes.x.len() > 1 {
            return Err(GgplotError::ValidationError(format!(
                "Stacked histograms take a single x column but got {}; \
                 please ensure that you specify only one column",
                aes.x.len()
            )));
        }
        aes.columns()
    }

    fn draw(&self, ctx: &LayerContext<'_>, panels: &[Filter]) -> Result<Vec<Panel>> {
        let columns = self.columns(ctx.aes)?;

        let mut binnings = Vec::with_capacity(columns.len());
        for column in &columns {
            let kind = ctx.column_kind(column)?;
            binnings.push(self.binning(ctx, column, kind)?);
        }

        let layout = match &self.fill {
            Some(category) => {
                Layout::Stacked(StackedLayout::new(ctx, self, &columns[0], binnings[0], category)?)
            }
            None => Layout::Series(SeriesLayout::new(ctx, &columns, &binnings)?),
        };

        let title = default_title(&columns, ctx.table);
        let x_label = columns.join(", ");
        panels
            .iter()
            .map(|filter| {
                Ok(Panel {
                    title: title.clone(),
                    x_label: x_label.clone(),
                    y_label: "Count".to_string(),
                    content: PanelContent::Bars(layout.count(ctx, filter)?),
                })
            })
            .collect()
    }
}

// =============================================================================
// Binning
// =============================================================================

/// Equal-width bins starting at the column minimum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binning {
    pub min: f64,
    pub width: f64,
    pub bins: usize,
}

impl Binning {
    /// Bins spanning `[min, max]`. A zero range gets unit-wide bins.
    pub fn new(min: f64, max: f64, bins: usize) -> Self {
        let bins = bins.max(1);
        let range = max - min;
        let width = if range > 0.0 { range / bins as f64 } else { 1.0 };
        Self { min, width, bins }
    }

    /// SQL expression computing the raw bin index of `column`.
    pub fn index_expr(&self, column: &str) -> String {
        format!(
            "FLOOR(({} - ({})) / {})",
            quote_ident(column),
            number_literal(self.min),
            number_literal(self.width)
        )
    }

    /// Clamp a raw index; the maximum lands in the last bin.
    pub fn index(&self, raw: f64) -> usize {
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(self.bins - 1)
        }
    }

    pub fn edges(&self, index: usize) -> (f64, f64) {
        let lo = self.min + index as f64 * self.width;
        (lo, lo + self.width)
    }

    /// `lo-hi` label used when bins share a categorical axis.
    pub fn label(&self, index: usize) -> String {
        let (lo, hi) = self.edges(index);
        format!("{}-{}", format_number(lo), format_number(hi))
    }
}

// =============================================================================
// Axis slots
// =============================================================================

/// Where a count belongs on the x axis.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Slot {
    Bin(usize),
    Value(String),
}

#[derive(Debug, Clone)]
enum Axis {
    Continuous,
    Categorical {
        labels: Vec<String>,
        positions: HashMap<String, usize>,
    },
}

impl Axis {
    fn categorical(labels: Vec<String>) -> Self {
        let positions = labels
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), i))
            .collect();
        Axis::Categorical { labels, positions }
    }

    fn x_axis(&self) -> XAxis {
        match self {
            Axis::Continuous => XAxis::Continuous,
            Axis::Categorical { labels, .. } => XAxis::Categorical {
                labels: labels.clone(),
            },
        }
    }

    /// Horizontal extent of the bar for `slot`, dodged as the `series`-th of
    /// `n_series` bars sharing a category slot.
    fn extent(
        &self,
        slot: &Slot,
        binning: Option<&Binning>,
        series: usize,
        n_series: usize,
    ) -> Option<(f64, f64)> {
        match self {
            Axis::Continuous => match (slot, binning) {
                (Slot::Bin(index), Some(binning)) => Some(binning.edges(*index)),
                _ => None,
            },
            Axis::Categorical { positions, .. } => {
                let key = match slot {
                    Slot::Bin(index) => binning?.label(*index),
                    Slot::Value(value) => value.clone(),
                };
                let position = *positions.get(&key)? as f64;
                let width = SLOT_WIDTH / n_series.max(1) as f64;
                let x0 = position - SLOT_WIDTH / 2.0 + series as f64 * width;
                Some((x0, x0 + width))
            }
        }
    }
}

/// The x expression grouped on: the bin index or the raw column.
fn x_expr(column: &str, binning: Option<&Binning>) -> String {
    match binning {
        Some(binning) => binning.index_expr(column),
        None => quote_ident(column),
    }
}

fn read_slots(df: &DataFrame, name: &str, binning: Option<&Binning>) -> Result<Vec<Option<Slot>>> {
    match binning {
        Some(binning) => Ok(frame::f64_values(df, name)?
            .into_iter()
            .map(|raw| raw.map(|raw| Slot::Bin(binning.index(raw))))
            .collect()),
        None => Ok(frame::values(df, name)?
            .into_iter()
            .map(|value| Some(Slot::Value(value.to_string())))
            .collect()),
    }
}

fn read_counts(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(frame::f64_values(df, name)?
        .into_iter()
        .map(|count| count.unwrap_or(0.0))
        .collect())
}

/// Non-null values of `column` counted per slot under `filter`.
fn count_slots(
    ctx: &LayerContext<'_>,
    column: &str,
    binning: Option<&Binning>,
    filter: &Filter,
) -> Result<BTreeMap<Slot, f64>> {
    let x = naming::stat_column("x");
    let count = naming::stat_column("count");
    let sql = format!(
        "SELECT {expr} AS {x}, COUNT(*) AS {count} FROM {source} {filter} GROUP BY 1 ORDER BY 2 DESC",
        expr = x_expr(column, binning),
        x = quote_ident(&x),
        count = quote_ident(&count),
        source = ctx.source(),
        filter = filter.clone().and(not_null(column)).where_clause(),
    );
    let df = ctx.query(&sql)?;

    let mut counts = BTreeMap::new();
    for (slot, n) in read_slots(&df, &x, binning)?
        .into_iter()
        .zip(read_counts(&df, &count)?)
    {
        if let Some(slot) = slot {
            *counts.entry(slot).or_insert(0.0) += n;
        }
    }
    Ok(counts)
}

// =============================================================================
// Layouts
// =============================================================================

/// Everything fixed over the whole source before panels are counted.
#[derive(Debug)]
enum Layout {
    Series(SeriesLayout),
    Stacked(StackedLayout),
}

impl Layout {
    fn count(&self, ctx: &LayerContext<'_>, filter: &Filter) -> Result<BarChart> {
        match self {
            Layout::Series(layout) => layout.count(ctx, filter),
            Layout::Stacked(layout) => layout.count(ctx, filter),
        }
    }
}

/// One bar series per x column: overlaid when all columns are numeric,
/// dodged on a categorical axis otherwise.
#[derive(Debug)]
struct SeriesLayout {
    axis: Axis,
    columns: Vec<(String, Option<Binning>)>,
    styles: Vec<Style>,
    dodge: bool,
}

impl SeriesLayout {
    fn new(
        ctx: &LayerContext<'_>,
        columns: &[String],
        binnings: &[Option<Binning>],
    ) -> Result<Self> {
        let all_numeric = binnings.iter().all(Option::is_some);
        let axis = if all_numeric {
            Axis::Continuous
        } else {
            let mut labels: Vec<String> = Vec::new();
            for (column, binning) in columns.iter().zip(binnings) {
                let column_labels: Vec<String> = match binning {
                    Some(binning) => (0..binning.bins).map(|i| binning.label(i)).collect(),
                    None => ctx
                        .values_by_frequency(column)?
                        .iter()
                        .map(ToString::to_string)
                        .collect(),
                };
                for label in column_labels {
                    if !labels.contains(&label) {
                        labels.push(label);
                    }
                }
            }
            Axis::categorical(labels)
        };

        let opacity = if all_numeric && columns.len() > 1 {
            OVERLAY_OPACITY
        } else {
            1.0
        };
        let styles = (0..columns.len())
            .map(|i| series_style(ctx.aes, i, opacity))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            axis,
            columns: columns.iter().cloned().zip(binnings.iter().copied()).collect(),
            styles,
            dodge: !all_numeric,
        })
    }

    fn count(&self, ctx: &LayerContext<'_>, filter: &Filter) -> Result<BarChart> {
        let n_series = if self.dodge { self.columns.len() } else { 1 };
        let mut series = Vec::with_capacity(self.columns.len());
        for (k, ((column, binning), style)) in self.columns.iter().zip(&self.styles).enumerate() {
            let position = if self.dodge { k } else { 0 };
            let bars = count_slots(ctx, column, binning.as_ref(), filter)?
                .into_iter()
                .filter_map(|(slot, n)| {
                    let (x0, x1) = self.axis.extent(&slot, binning.as_ref(), position, n_series)?;
                    Some(Bar { x0, x1, y0: 0.0, y1: n })
                })
                .collect();
            series.push(BarSeries {
                label: column.clone(),
                style: style.clone(),
                bars,
            });
        }
        Ok(BarChart {
            axis: self.axis.x_axis(),
            stacked: false,
            series,
        })
    }
}

/// One column split by the categories of a second column, stacked per slot.
#[derive(Debug)]
struct StackedLayout {
    axis: Axis,
    column: String,
    binning: Option<Binning>,
    category: String,
    categories: Vec<String>,
    styles: Vec<Style>,
}

impl StackedLayout {
    fn new(
        ctx: &LayerContext<'_>,
        geom: &GeomHistogram,
        column: &str,
        binning: Option<Binning>,
        category: &str,
    ) -> Result<Self> {
        if ctx.aes.fill.len() > 1 {
            tracing::warn!(
                fill = ?ctx.aes.fill.values(),
                "stacked histogram colors come from the colormap; ignoring aes fill list"
            );
        }

        let categories: Vec<String> = ctx
            .distinct_values(category)?
            .iter()
            .map(ToString::to_string)
            .collect();
        let cmap = geom.cmap.as_deref().unwrap_or(DEFAULT_COLORMAP);
        let edge = ctx.aes.color.first().map(color_to_hex).transpose()?;
        let styles = colormap(cmap, categories.len())?
            .into_iter()
            .map(|fill| Style {
                fill,
                edge: edge.clone(),
                opacity: 1.0,
            })
            .collect();

        let axis = match binning {
            Some(_) => Axis::Continuous,
            None => Axis::categorical(
                ctx.values_by_frequency(column)?
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            ),
        };

        Ok(Self {
            axis,
            column: column.to_string(),
            binning,
            category: category.to_string(),
            categories,
            styles,
        })
    }

    fn count(&self, ctx: &LayerContext<'_>, filter: &Filter) -> Result<BarChart> {
        let x = naming::stat_column("x");
        let category = naming::stat_column("category");
        let count = naming::stat_column("count");
        let sql = format!(
            "SELECT {expr} AS {x}, {cat} AS {category}, COUNT(*) AS {count} FROM {source} {filter} GROUP BY 1, 2",
            expr = x_expr(&self.column, self.binning.as_ref()),
            x = quote_ident(&x),
            cat = quote_ident(&self.category),
            category = quote_ident(&category),
            count = quote_ident(&count),
            source = ctx.source(),
            filter = filter.clone().and(not_null(&self.column)).where_clause(),
        );
        let df = ctx.query(&sql)?;

        let index: HashMap<&str, usize> = self
            .categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        // slot -> count per category
        let mut matrix: BTreeMap<Slot, Vec<f64>> = BTreeMap::new();
        let slots = read_slots(&df, &x, self.binning.as_ref())?;
        let labels = frame::values(&df, &category)?;
        for ((slot, label), n) in slots.into_iter().zip(labels).zip(read_counts(&df, &count)?) {
            let (Some(slot), Some(&i)) = (slot, index.get(label.to_string().as_str())) else {
                continue;
            };
            matrix
                .entry(slot)
                .or_insert_with(|| vec![0.0; self.categories.len()])[i] += n;
        }

        let mut series: Vec<BarSeries> = self
            .categories
            .iter()
            .zip(&self.styles)
            .map(|(label, style)| BarSeries {
                label: label.clone(),
                style: style.clone(),
                bars: Vec::new(),
            })
            .collect();
        for (slot, counts) in matrix {
            let Some((x0, x1)) = self.axis.extent(&slot, self.binning.as_ref(), 0, 1) else {
                continue;
            };
            let mut base = 0.0;
            for (i, n) in counts.into_iter().enumerate() {
                if n > 0.0 {
                    series[i].bars.push(Bar {
                        x0,
                        x1,
                        y0: base,
                        y1: base + n,
                    });
                    base += n;
                }
            }
        }

        Ok(BarChart {
            axis: self.axis.x_axis(),
            stacked: true,
            series,
        })
    }
}
