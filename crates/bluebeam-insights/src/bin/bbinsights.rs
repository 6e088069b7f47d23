use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use bluebeam_insights::{
    ColorMap, CombinedTable, ExtractOptions, ExtractionReport, Filters, Floorplan, MarkupFile,
    TimeMode, extract_batch, read_csv, render_all, write_csv,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "bbinsights",
    version,
    about = "Turn Bluebeam markup exports into CSV tables and behavior-mapping charts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract markup rows from every input and write one combined CSV.
    Extract(ExtractArgs),
    /// Render the density, pie and line charts as SVG files.
    Render(RenderArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Markup file to scan. Repeatable; rows keep the given order.
    #[arg(short, long = "input")]
    inputs: Vec<PathBuf>,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Fail on filenames without a valid HHMM segment instead of using 00:00.
    #[arg(long)]
    strict_time: bool,

    /// Print every warning, not just the count.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output CSV path.
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Debug, Args)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Previously exported CSV to chart instead of scanning markup files.
    #[arg(long, conflicts_with = "inputs")]
    csv: Option<PathBuf>,

    /// Floorplan image (PNG or JPEG) for the density map.
    #[arg(long)]
    floorplan: Option<PathBuf>,

    /// Time to include, as HH:MM. Repeatable; defaults to every time.
    #[arg(long = "time")]
    times: Vec<String>,

    /// Content category to include. Repeatable; defaults to every category.
    #[arg(long = "content")]
    contents: Vec<String>,

    /// Directory that receives density.svg, pie.svg and line.svg.
    #[arg(short, long)]
    output: PathBuf,
}

fn parse_options(args: &InputArgs) -> Result<ExtractOptions> {
    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    let time_mode = if args.strict_time {
        TimeMode::Strict
    } else {
        TimeMode::Lenient
    };

    #[allow(clippy::cast_possible_truncation)]
    let delimiter = args.delimiter as u8;
    Ok(ExtractOptions {
        time_mode,
        delimiter,
    })
}

fn load_inputs(args: &InputArgs, options: &ExtractOptions) -> Result<(CombinedTable, ExtractionReport)> {
    if args.inputs.is_empty() {
        return Err(anyhow!("at least one --input file is required"));
    }

    let files = args
        .inputs
        .iter()
        .map(|path| {
            MarkupFile::read(path).with_context(|| format!("failed to read '{}'", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    extract_batch(&files, options).context("failed to extract markup")
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} file={:?} line={:?}: {}",
                warning.code, warning.file, warning.line, warning.message
            );
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<ExtractionReport> {
    let options = parse_options(&args.input)?;
    let (table, report) = load_inputs(&args.input, &options)?;
    write_csv(&args.output, table.records(), options.delimiter)
        .with_context(|| format!("failed to write '{}'", args.output.display()))?;
    Ok(report)
}

fn write_chart(dir: &Path, name: &str, svg: &str) -> Result<()> {
    let path = dir.join(name);
    std::fs::write(&path, svg).with_context(|| format!("failed to write '{}'", path.display()))
}

fn run_render(args: &RenderArgs) -> Result<ExtractionReport> {
    let options = parse_options(&args.input)?;
    let (table, mut report) = match &args.csv {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open '{}'", path.display()))?;
            let records = read_csv(file, options.delimiter)
                .with_context(|| format!("failed to parse '{}'", path.display()))?;
            let table = CombinedTable::new(records);
            let report = ExtractionReport {
                row_count: table.len(),
                ..ExtractionReport::default()
            };
            (table, report)
        }
        None => load_inputs(&args.input, &options)?,
    };

    let floorplan = args
        .floorplan
        .as_deref()
        .map(|path| {
            Floorplan::open(path)
                .with_context(|| format!("failed to load floorplan '{}'", path.display()))
        })
        .transpose()?;

    let filters = Filters::new(args.times.clone(), args.contents.clone()).or_all(&table);
    let color_map = ColorMap::from_table(&table);
    let charts = render_all(&table, &filters, &color_map, floorplan.as_ref());

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create '{}'", args.output.display()))?;
    if let Some(density) = &charts.density {
        write_chart(&args.output, "density.svg", density)?;
    }
    write_chart(&args.output, "pie.svg", &charts.pie)?;
    write_chart(&args.output, "line.svg", &charts.line)?;

    report.warnings.extend(charts.warnings);
    Ok(report)
}

fn exit_code(result: Result<ExtractionReport>, verbose: bool) -> ExitCode {
    match result {
        Ok(report) => {
            log_report(&report, verbose);
            if report.row_count > 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bluebeam_insights=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => exit_code(run_extract(&args), args.input.verbose),
        Commands::Render(args) => exit_code(run_render(&args), args.input.verbose),
    }
}
