use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;
use trustbook_analysis::{insert_trust, AnalysisConfig, BitmapRenderer, TrustSource};

use crate::driver;

const DEFAULT_BASE: &str = "./../keml.sample/introductoryExamples/analysis";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Source {
    /// Initial trust estimate (column E).
    Fti,
    /// Actual trust estimate (column F).
    Fta,
}

impl From<Source> for TrustSource {
    fn from(source: Source) -> Self {
        match source {
            Source::Fti => TrustSource::Initial,
            Source::Fta => TrustSource::Actual,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "trustbook",
    about = "Compare trust estimates in Trust worksheets against reference measures."
)]
pub struct Args {
    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON file overriding analysis settings.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Randomize fTi/fTa and analyse every workbook in `<base>/<dir_name>`.
    Run(RunArgs),
    /// Set one validated fTi/fTa value.
    Set(SetArgs),
}

#[derive(ClapArgs)]
struct RunArgs {
    /// Directory name below `--base`.
    dir_name: String,

    /// Base directory containing the input directory.
    #[arg(long, default_value = DEFAULT_BASE)]
    base: PathBuf,

    /// Seed for the random trust values (default: OS entropy).
    #[arg(long)]
    seed: Option<u64>,

    /// Output format of the run report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(ClapArgs)]
struct SetArgs {
    /// Workbook to edit in place.
    workbook: PathBuf,

    #[arg(long, value_enum)]
    source: Source,

    /// Row id as counted by the generator; 0 is the first data row.
    #[arg(long)]
    info_id: u32,

    /// New value in [-1, 1].
    #[arg(long, allow_negative_numbers = true)]
    value: f64,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    run_with_args(args)
}

pub fn run_with_args(args: Args) -> Result<()> {
    init_logging(args.verbose);
    let config = load_config(args.config.as_deref())?;
    match args.command {
        Command::Run(run) => run_directory(run, &config),
        Command::Set(set) => set_value(set, &config),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "trustbook=debug"
    } else {
        "trustbook=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded; keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("load config {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn run_directory(args: RunArgs, config: &AnalysisConfig) -> Result<()> {
    let dir = args.base.join(&args.dir_name);
    anyhow::ensure!(
        dir.is_dir(),
        "input directory {} does not exist",
        dir.display()
    );

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let report = driver::process_directory(&dir, &mut rng, &mut BitmapRenderer, config)?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    match args.format {
        OutputFormat::Text => write!(handle, "{report}")?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut handle, &report)?;
            handle.write_all(b"\n")?;
        }
    }

    if report.failed() > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn set_value(args: SetArgs, config: &AnalysisConfig) -> Result<()> {
    let source = TrustSource::from(args.source);
    // Rejected values still leave the workbook saved with its coloring reapplied.
    let cell = insert_trust(&args.workbook, source, args.value, args.info_id, config)
        .with_context(|| format!("update {}", args.workbook.display()))?;
    println!(
        "{}: {} {} = {}",
        args.workbook.display(),
        source.label(),
        cell,
        args.value
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn run_defaults() {
        let args = Args::try_parse_from(["trustbook", "run", "session"]).unwrap();
        let Command::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.dir_name, "session");
        assert_eq!(run.base, PathBuf::from(DEFAULT_BASE));
        assert_eq!(run.seed, None);
        assert!(matches!(run.format, OutputFormat::Text));
    }

    #[test]
    fn set_accepts_negative_values() {
        let args = Args::try_parse_from([
            "trustbook", "set", "book.xlsx", "--source", "fta", "--info-id", "2", "--value", "-0.5",
            "-v",
        ])
        .unwrap();
        assert!(args.verbose);
        let Command::Set(set) = args.command else {
            panic!("expected set");
        };
        assert_eq!(set.value, -0.5);
        assert_eq!(set.info_id, 2);
        assert!(matches!(TrustSource::from(set.source), TrustSource::Actual));
    }
}
