use anyhow::{bail, Context, Result};
use brandgraph::config::{DashboardConfig, Preset};
use brandgraph::csv_reader;
use brandgraph::data::Catalog;
use brandgraph::filter::PriceRange;
use brandgraph::runtime::{self, Chart};
use brandgraph::session::Session;
use brandgraph::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "brandgraph")]
#[command(about = "Compare brands and product types across price ranges from catalog CSV data", long_about = None)]
struct Args {
    /// Catalog file (.csv or .json). CSV is read from stdin when omitted
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Price range to inspect: "0-100", "500+" or "all"
    #[arg(short, long, default_value = "0-100", global = true)]
    range: PriceRange,

    /// Dashboard variant
    #[arg(long, value_enum, default_value_t = Preset::Standard, global = true, conflicts_with = "config")]
    preset: Preset,

    /// JSON dashboard config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Number of product types kept before bucketing into "Others"
    #[arg(long, global = true)]
    top: Option<usize>,

    #[arg(long, global = true)]
    width: Option<u32>,

    #[arg(long, global = true)]
    height: Option<u32>,

    /// Write to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Brand-by-product-type price layout
    Layout {
        #[arg(short, long, value_enum)]
        format: Option<Format>,
    },
    /// Overall vs in-range product type frequencies
    Frequency {
        #[arg(short, long, value_enum)]
        format: Option<Format>,
    },
    /// Distribution table for one or more columns
    Table {
        #[arg(short, long = "column", required = true)]
        columns: Vec<String>,
    },
    /// Each brand's share of products across a column's categories
    Assortment {
        /// Defaults to the product type column
        #[arg(short, long)]
        column: Option<String>,
    },
    /// Range, frequencies and layout as one JSON document
    Dashboard,
    /// Product counts for the standard price buckets
    Buckets,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Png,
    Svg,
    Json,
    Text,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args)?;

    let csv_data = match &args.input {
        Some(path) => csv_reader::read_table_from_path(path)?,
        None => csv_reader::read_csv_from_stdin().context("Failed to read CSV from stdin")?,
    };

    let catalog = Catalog::from_csv(csv_data, &config)?;
    if !catalog.rejected.is_empty() {
        eprintln!(
            "Warning: excluded {} row(s) with invalid prices",
            catalog.rejected.len()
        );
    }

    let mut session = Session::new(config);
    session.load(catalog);
    session.select_range(args.range);

    let bytes = match &args.command {
        Command::Layout { format } => chart_output(&session, Chart::Layout, *format)?,
        Command::Frequency { format } => chart_output(&session, Chart::Frequency, *format)?,
        Command::Table { columns } => runtime::attribute_report(&session, columns)?.into_bytes(),
        Command::Assortment { column } => {
            let column = column
                .clone()
                .unwrap_or_else(|| session.config().product_type_column.clone());
            runtime::assortment_report(&session, &column)?.into_bytes()
        }
        Command::Dashboard => runtime::dashboard_json(&session)?.into_bytes(),
        Command::Buckets => runtime::buckets_report(&session)?.into_bytes(),
    };

    write_output(args.output.as_deref(), &bytes)
}

fn load_config(args: &Args) -> Result<DashboardConfig> {
    let mut config = match &args.config {
        Some(path) => DashboardConfig::from_path(path)?,
        None => DashboardConfig::preset(args.preset),
    };

    if let Some(top) = args.top {
        config.top_n = top;
    }
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    Ok(config)
}

fn chart_output(session: &Session, chart: Chart, format: Option<Format>) -> Result<Vec<u8>> {
    let format = format.unwrap_or(match session.config().render.format {
        OutputFormat::Png => Format::Png,
        OutputFormat::Svg => Format::Svg,
    });

    match format {
        Format::Png => runtime::render_chart(session, chart, &OutputFormat::Png),
        Format::Svg => runtime::render_chart(session, chart, &OutputFormat::Svg),
        Format::Json => Ok(runtime::chart_json(session, chart)?.into_bytes()),
        Format::Text => match chart {
            Chart::Frequency => Ok(runtime::frequency_report(session)?.into_bytes()),
            Chart::Layout => bail!("Text output is only available for the frequency chart"),
        },
    }
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    if let Some(path) = path {
        return std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write output to '{}'", path.display()));
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(bytes)
        .context("Failed to write output to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}
