//! CLI entry point for selection-driven exploration reports.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use emat_explore::{
    ChartStyle, Explore, ExploreConfig, NullSink, RedrawUpdate, Scope, SelectionBox, StatusSummary,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Selection-driven exploration of experiment results",
    long_about = "Loads a CSV of experiment results, applies a selection box and prints \
                  the resulting charts as a JSON report on stdout.\n\n\
                  EXAMPLES:\n  \
                  # Every column, histograms\n  \
                  emat-explore --data results.csv\n\n  \
                  # Scope-driven dashboard under a saved box\n  \
                  emat-explore --data results.csv --scope scope.json --box box.json\n\n  \
                  # Selected columns as KDE curves\n  \
                  emat-explore --data results.csv --column cost --column delay --kde"
)]
struct Args {
    /// CSV file with one row per experiment
    #[arg(short, long)]
    data: PathBuf,

    /// Scope description (JSON)
    #[arg(short, long)]
    scope: Option<PathBuf>,

    /// Selection box (JSON)
    #[arg(short = 'b', long = "box")]
    selection_box: Option<PathBuf>,

    /// Column to chart; repeat for several. Defaults to the scope's
    /// dashboard, or every column without a scope
    #[arg(short, long = "column")]
    columns: Vec<String>,

    /// Number of histogram bins
    #[arg(long, default_value = "20")]
    bins: usize,

    /// Draw KDE curves instead of histograms for continuous columns
    #[arg(long)]
    kde: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Shorthand for --log-level debug
    #[arg(short, long)]
    verbose: bool,
}

/// JSON document printed on stdout.
#[derive(Debug, Serialize)]
struct Report {
    box_name: String,
    status: StatusSummary,
    message: String,
    charts: Vec<RedrawUpdate>,
}

/// Logs go to stderr so stdout stays a clean JSON document.
fn init_logging(level: &str, verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if verbose { "debug" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.verbose);

    if !args.data.exists() {
        return Err(anyhow!("Data file not found: {}", args.data.display()));
    }

    info!("Loading dataset from: {}", args.data.display());
    let data = load_csv(&args.data)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    let scope_given = args.scope.is_some();
    let scope = match &args.scope {
        Some(path) => Scope::from_json(&read_text(path)?)
            .with_context(|| format!("Invalid scope file {}", path.display()))?,
        None => Scope::from_data(file_stem(&args.data), &data),
    };
    let selection_box = match &args.selection_box {
        Some(path) => Some(
            SelectionBox::from_json(&read_text(path)?)
                .with_context(|| format!("Invalid box file {}", path.display()))?,
        ),
        None => None,
    };

    let config = ExploreConfig::builder().default_bins(args.bins).build()?;
    let column_names: Vec<String> = data
        .get_column_names()
        .iter()
        .map(|c| c.to_string())
        .collect();
    let mut explore = Explore::with_config(scope, data, selection_box, Arc::new(NullSink), config)?;

    let style = if args.kde {
        ChartStyle::Kde
    } else {
        ChartStyle::Hist
    };
    let charts = if !args.columns.is_empty() {
        chart_columns(&mut explore, &args.columns, style)
    } else if scope_given {
        let dashboard = explore.complete(style);
        dashboard
            .levers
            .into_iter()
            .chain(dashboard.uncertainties)
            .chain(dashboard.measures)
            .map(|panel| panel.chart)
            .collect()
    } else {
        chart_columns(&mut explore, &column_names, style)
    };

    let status = explore.status();
    let report = Report {
        box_name: explore.selection_box().name.clone(),
        message: status.message(),
        status,
        charts,
    };
    debug!("report holds {} charts", report.charts.len());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn chart_columns(explore: &mut Explore, columns: &[String], style: ChartStyle) -> Vec<RedrawUpdate> {
    let mut charts = Vec::with_capacity(columns.len());
    for column in columns {
        let discrete = explore
            .variable_type(column)
            .is_ok_and(|dtype| dtype.is_discrete_choice());
        let chart = match style {
            ChartStyle::Kde if !discrete => explore.kde_chart(column),
            _ => explore.histogram_chart(column, None),
        };
        match chart {
            Some(chart) => charts.push(chart),
            None => warn!("Skipping column '{}'", column),
        }
    }
    charts
}

fn load_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string())
}
