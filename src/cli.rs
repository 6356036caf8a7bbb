/*!
sqlggplot Command Line Interface

Draws histograms and boxplots of a table, optionally faceted, with every
statistic computed by the database.

```text
sqlggplot histogram --setup "CREATE TABLE penguins AS SELECT * FROM 'penguins.csv'" \
    --table penguins --x bill_depth_mm --bins 10 --facet sex --output bill_depth.png
```
*/

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sqlggplot::plot::{Figure, Geom};
use sqlggplot::prelude::*;
use sqlggplot::VERSION;

#[derive(Parser)]
#[command(name = "sqlggplot")]
#[command(about = "ggplot-style charts computed in SQL")]
#[command(version = VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Draw a histogram of one or more columns
    Histogram {
        #[command(flatten)]
        plot: PlotArgs,

        /// Number of bins for numeric columns
        #[arg(long)]
        bins: Option<usize>,

        /// Stack each bar by the categories of this column
        #[arg(long)]
        stack_by: Option<String>,

        /// Colormap for stacked categories
        #[arg(long)]
        cmap: Option<String>,
    },

    /// Draw a boxplot of one or more numeric columns
    Boxplot {
        #[command(flatten)]
        plot: PlotArgs,

        /// Lay the boxes horizontally
        #[arg(long)]
        horizontal: bool,
    },
}

#[derive(Args, Debug)]
pub struct PlotArgs {
    /// Data source connection string
    #[arg(long, default_value = "duckdb://memory")]
    reader: String,

    /// SQL statement to run before plotting (repeatable)
    #[arg(long)]
    setup: Vec<String>,

    /// Named query the plot can read from, as NAME=SQL (repeatable; each
    /// snippet may read from the ones before it)
    #[arg(long)]
    snippet: Vec<String>,

    /// Table or snippet to plot
    #[arg(long)]
    table: String,

    /// Column(s) to plot (repeatable)
    #[arg(long, required = true)]
    x: Vec<String>,

    /// Face color(s), cycled per column
    #[arg(long)]
    fill: Vec<String>,

    /// Edge color(s), cycled per column
    #[arg(long)]
    color: Vec<String>,

    /// Draw one panel per distinct value of this column
    #[arg(long)]
    facet: Option<String>,

    /// Omit the shared legend of a faceted plot
    #[arg(long)]
    no_legend: bool,

    /// Output file path (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Output format (inferred from the output extension when omitted)
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Image width in pixels
    #[arg(long, default_value_t = 1200)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 800)]
    height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Png,
    Svg,
    Vegalite,
}

impl PlotArgs {
    /// Explicit format, else the output extension, else Vega-Lite.
    fn resolve_format(&self) -> anyhow::Result<Format> {
        if let Some(format) = self.format {
            return Ok(format);
        }
        let Some(output) = &self.output else {
            return Ok(Format::Vegalite);
        };
        let extension = output
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);
        match extension.as_deref() {
            Some("png") => Ok(Format::Png),
            Some("svg") => Ok(Format::Svg),
            Some("json") | Some("vl") => Ok(Format::Vegalite),
            _ => bail!(
                "Cannot infer the output format of '{}'; pass --format",
                output.display()
            ),
        }
    }
}

/// Split `NAME=SQL`.
fn parse_snippet(arg: &str) -> anyhow::Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((name, sql)) if !name.trim().is_empty() => Ok((name.trim(), sql.trim())),
        _ => bail!("Invalid snippet '{}': expected NAME=SQL", arg),
    }
}

fn render(args: &PlotArgs, geom: Geom) -> anyhow::Result<()> {
    let format = args.resolve_format()?;

    let mut conn = Connection::open(&args.reader)
        .with_context(|| format!("Failed to open '{}'", args.reader))?;
    for sql in &args.setup {
        conn.run(sql).context("Setup statement failed")?;
    }
    let mut snippets = Vec::new();
    for arg in &args.snippet {
        let (name, sql) = parse_snippet(arg)?;
        // later snippets may read from earlier ones
        conn.save_snippet_with(name, sql, &snippets)?;
        snippets.push(name.to_string());
    }

    let mapping = aes()
        .x(args.x.clone())
        .fill(args.fill.clone())
        .color(args.color.clone());
    let mut plot = ggplot(&conn, args.table.as_str(), mapping);
    for name in snippets {
        plot = plot.with_cte(name);
    }
    let mut plot = plot + geom;
    if let Some(column) = &args.facet {
        plot = plot + facet_wrap(column.as_str()).legend(!args.no_legend);
    }

    let figure = plot.build()?;
    write_figure(&figure, format, args)
}

fn write_figure(figure: &Figure, format: Format, args: &PlotArgs) -> anyhow::Result<()> {
    match format {
        Format::Vegalite => {
            let json = vegalite(figure, args)?;
            write_text(&json, args.output.as_deref())
        }
        Format::Svg | Format::Png => write_image(figure, format, args),
    }
}

fn write_text(text: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Failed to write '{}'", path.display())),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

/// The image size is shared out between the panels of the grid.
#[cfg(feature = "vegalite")]
fn vegalite(figure: &Figure, args: &PlotArgs) -> anyhow::Result<String> {
    use sqlggplot::writer::{VegaLiteWriter, Writer};
    let cols = u32::try_from(figure.n_cols.max(1))?;
    let rows = u32::try_from(figure.n_rows.max(1))?;
    let writer = VegaLiteWriter::new().panel_size(args.width / cols, args.height / rows);
    Ok(writer.write(figure)?)
}

#[cfg(not(feature = "vegalite"))]
fn vegalite(_figure: &Figure, _args: &PlotArgs) -> anyhow::Result<String> {
    bail!("sqlggplot was built without the 'vegalite' feature")
}

#[cfg(feature = "plotters")]
fn write_image(figure: &Figure, format: Format, args: &PlotArgs) -> anyhow::Result<()> {
    let writer = sqlggplot::writer::PlottersWriter::new(args.width, args.height);
    match (format, &args.output) {
        (Format::Png, Some(output)) => Ok(writer.write_png(figure, output)?),
        (Format::Png, None) => bail!("PNG output needs --output"),
        _ => {
            let svg = writer.write_svg_string(figure)?;
            write_text(&svg, args.output.as_deref())
        }
    }
}

#[cfg(not(feature = "plotters"))]
fn write_image(_figure: &Figure, _format: Format, _args: &PlotArgs) -> anyhow::Result<()> {
    bail!("sqlggplot was built without the 'plotters' feature")
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sqlggplot=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Histogram {
            plot,
            bins,
            stack_by,
            cmap,
        } => {
            let mut geom = geom_histogram();
            if let Some(bins) = bins {
                geom = geom.bins(bins);
            }
            if let Some(column) = stack_by {
                geom = geom.fill(column);
            }
            if let Some(cmap) = cmap {
                geom = geom.cmap(cmap);
            }
            render(&plot, geom.into())
        }
        Commands::Boxplot { plot, horizontal } => {
            let orientation = if horizontal {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            render(&plot, geom_boxplot().orient(orientation).into())
        }
    }
}
