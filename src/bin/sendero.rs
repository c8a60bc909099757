//! Binary entry point for the Sendero roadmap CLI.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use sendero::cli::{
    self, GenerateConfig, GenerateReport, MergeReport, NearestQuery, NearestReport, OpenConfig,
    StatsReport,
};
use sendero::options::RoadmapOptions;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sendero",
    version,
    about = "Inspect, merge, query, and generate motion-planning roadmaps",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(flatten)]
    open: OpenArgs,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(short, long, global = true, action = ArgAction::SetTrue, help = "Enable debug logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct OpenArgs {
    #[arg(
        long,
        short = 'd',
        global = true,
        env = "SENDERO_DIMENSION",
        default_value_t = 2,
        help = "Coordinates per configuration"
    )]
    dimension: usize,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "SENDERO_CONFIG",
        help = "TOML file with roadmap options"
    )]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, help = "Proximity index override")]
    index: Option<IndexArg>,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Print counts, degrees, and bounds of a roadmap file")]
    Stats {
        #[arg(value_name = "ROADMAP")]
        path: PathBuf,
    },

    #[command(about = "Merge roadmap files into one, shifting ids of later files")]
    Merge {
        #[arg(value_name = "INPUT", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        #[arg(long, short, value_name = "FILE", help = "Merged roadmap destination")]
        output: PathBuf,
    },

    #[command(about = "Find configurations close to a query point")]
    Nearest(NearestCmd),

    #[command(about = "Sample a random roadmap in the unit cube")]
    Generate(GenerateCmd),
}

#[derive(Args, Debug)]
struct NearestCmd {
    #[arg(value_name = "ROADMAP")]
    path: PathBuf,

    #[arg(
        long,
        value_name = "X,Y,...",
        value_delimiter = ',',
        allow_negative_numbers = true,
        required = true,
        help = "Query coordinates"
    )]
    point: Vec<f64>,

    #[arg(short, long, default_value_t = 1, help = "Number of neighbors")]
    k: usize,

    #[arg(long, conflicts_with = "k", help = "Radius query with closest fallback")]
    radius: Option<f64>,
}

#[derive(Args, Debug)]
struct GenerateCmd {
    #[arg(long, short, value_name = "FILE")]
    output: PathBuf,

    #[arg(long, default_value_t = 100, help = "Configurations to sample")]
    samples: usize,

    #[arg(long, default_value_t = 8, help = "Neighbors to connect per sample")]
    neighbors: usize,

    #[arg(long, help = "Only connect neighbors within this distance")]
    radius: Option<f64>,

    #[arg(long, default_value_t = 0, help = "Random seed")]
    seed: u64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum IndexArg {
    Linear,
    Navigable,
}

impl From<IndexArg> for sendero::options::IndexKind {
    fn from(arg: IndexArg) -> Self {
        match arg {
            IndexArg::Linear => sendero::options::IndexKind::Linear,
            IndexArg::Navigable => sendero::options::IndexKind::Navigable,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "sendero=debug" } else { "sendero=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let open = build_open_config(&cli.open)?;

    match cli.command {
        Command::Stats { path } => {
            let report = cli::stats(&path, &open)?;
            emit(&cli.format, &report, |_| print_stats_text(&report))?;
        }
        Command::Merge { inputs, output } => {
            let report = cli::merge(&inputs, &output, &open)?;
            emit(&cli.format, &report, |_| print_merge_text(&report))?;
        }
        Command::Nearest(cmd) => {
            let what = match cmd.radius {
                Some(r) => NearestQuery::Radius(r),
                None => NearestQuery::K(cmd.k),
            };
            let report = cli::nearest(&cmd.path, &cmd.point, &what, &open)?;
            emit(&cli.format, &report, |_| print_nearest_text(&report))?;
        }
        Command::Generate(cmd) => {
            let gen = GenerateConfig {
                output: cmd.output,
                samples: cmd.samples,
                neighbors: cmd.neighbors,
                radius: cmd.radius,
                seed: cmd.seed,
            };
            let report = cli::generate(&gen, &open)?;
            emit(&cli.format, &report, |_| print_generate_text(&report))?;
        }
    }
    Ok(())
}

fn build_open_config(args: &OpenArgs) -> Result<OpenConfig, Box<dyn Error>> {
    let mut options = match &args.config {
        Some(path) => RoadmapOptions::load(path)?,
        None => RoadmapOptions::default(),
    };
    if let Some(index) = args.index {
        options.index.kind = index.into();
    }
    Ok(OpenConfig {
        dimension: args.dimension,
        options,
    })
}

fn emit<T, F>(format: &OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: Fn(OutputFormat),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(OutputFormat::Text),
    }
    Ok(())
}

fn print_stats_text(report: &StatsReport) {
    println!("Roadmap: {}", report.path);
    println!(
        "  vertices={} edges={} components={} dimension={}",
        report.vertices, report.edges, report.components, report.dimension
    );
    println!(
        "  max_degree={} mean_degree={:.2} total_weight={:.4}",
        report.max_degree, report.mean_degree, report.total_weight
    );
    if !report.bounds_min.is_empty() {
        println!("  bounds_min={:?}", report.bounds_min);
        println!("  bounds_max={:?}", report.bounds_max);
    }
}

fn print_merge_text(report: &MergeReport) {
    println!(
        "Merged {} roadmaps into {}: vertices={} edges={} components={}",
        report.offsets.len(),
        report.output,
        report.vertices,
        report.edges,
        report.components
    );
    println!("  offsets={:?}", report.offsets);
}

fn print_nearest_text(report: &NearestReport) {
    if report.fallback {
        println!("Nothing in range; closest configuration:");
    }
    for hit in &report.hits {
        println!("{}\t{:.6}\t{:?}", hit.vertex, hit.distance, hit.coords);
    }
}

fn print_generate_text(report: &GenerateReport) {
    println!(
        "Generated {} (seed {}): vertices={} edges={} components={}",
        report.output, report.seed, report.vertices, report.edges, report.components
    );
}
