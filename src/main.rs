use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::{LevelFilter, error, info};
use racepace::{
    ClassifierSelector, DispersionSelector, FileCacheSource, LapFileSource, LapSource,
    RacePaceError, RaceRunSelector, ReportConfig, SessionId, SessionReport, Tier, output_dir,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render best-time and tyre-degradation charts for a session
    Report {
        #[command(flatten)]
        session: SessionArgs,

        /// Root directory for charts, overrides the config file
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Also write best_times.csv next to the charts
        #[arg(long)]
        export_csv: bool,
    },
    /// Print a session table as CSV without rendering anything
    Summary {
        #[command(flatten)]
        session: SessionArgs,

        #[arg(short, long, value_enum, default_value_t = SummaryTable::BestTimes)]
        table: SummaryTable,
    },
    /// Print the effective team tiers
    Tiers {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct SessionArgs {
    #[arg(short, long, default_value_t = 2022)]
    year: u32,

    #[arg(short, long, default_value = "Abu Dhabi")]
    event: String,

    #[arg(short, long, default_value = "FP2")]
    session: String,

    /// Read laps from this CSV/JSONL file instead of the lap cache
    #[arg(short, long)]
    input: Option<PathBuf>,

    #[arg(long)]
    cache_dir: Option<PathBuf>,

    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stints with a lap-time std-dev at or above this (seconds) are not race runs
    #[arg(long)]
    max_stint_std: Option<f64>,

    /// Slow-lap cutoff in pooled std-devs above the mean
    #[arg(long)]
    outlier_factor: Option<f64>,

    #[arg(long, value_enum, default_value_t = SelectorOpt::Dispersion)]
    selector: SelectorOpt,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SelectorOpt {
    Dispersion,
    Classifier,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SummaryTable {
    BestTimes,
    RaceRuns,
    Laps,
}

fn load_config(path: Option<&PathBuf>) -> Result<ReportConfig, RacePaceError> {
    match path {
        Some(path) => ReportConfig::from_file(path),
        None => Ok(ReportConfig::from_local_file()?.unwrap_or_default()),
    }
}

fn build_report(args: &SessionArgs, config: &ReportConfig) -> Result<SessionReport, RacePaceError> {
    let session = SessionId::new(args.year, &args.event, &args.session);

    let source: Box<dyn LapSource> = match (&args.input, &args.cache_dir, &config.cache_dir) {
        (Some(input), _, _) => Box::new(LapFileSource::new(input.clone())),
        (None, Some(cache_dir), _) | (None, None, Some(cache_dir)) => {
            Box::new(FileCacheSource::new(cache_dir.clone()))
        }
        (None, None, None) => Box::new(FileCacheSource::new_default()?),
    };
    let raw_laps = source.load_laps(&session)?;

    let mut params = config.race_runs;
    if let Some(max_stint_std) = args.max_stint_std {
        params.max_stint_std_s = max_stint_std;
    }
    if let Some(outlier_factor) = args.outlier_factor {
        params.outlier_std_factor = outlier_factor;
    }
    let selector: Box<dyn RaceRunSelector> = match args.selector {
        SelectorOpt::Dispersion => Box::new(DispersionSelector::new(params)?),
        SelectorOpt::Classifier => Box::new(ClassifierSelector),
    };

    SessionReport::build(session, &raw_laps, selector.as_ref(), &config.team_tiers)
}

fn report(
    args: &SessionArgs,
    output_root: Option<PathBuf>,
    export_csv: bool,
) -> Result<(), RacePaceError> {
    let config = load_config(args.config.as_ref())?;
    let report = build_report(args, &config)?;

    let output_root = output_root.unwrap_or_else(|| config.output_dir.clone());
    let dir = output_dir(&output_root, &report.session);
    let written = report.write_charts(&dir, &config.chart)?;
    if export_csv {
        let csv_path = dir.join("best_times.csv");
        report.write_best_times_csv(&csv_path)?;
        info!("Wrote {:?}", csv_path);
    }

    info!(
        "{}: {} drivers, {} race-run stints, {} charts in {:?}",
        report.session,
        report.best_times.len(),
        report.race_run_stint_count(),
        written.len(),
        dir
    );
    Ok(())
}

fn summary(args: &SessionArgs, table: SummaryTable) -> Result<(), RacePaceError> {
    let config = load_config(args.config.as_ref())?;
    let report = build_report(args, &config)?;

    let stdout = io::stdout().lock();
    match table {
        SummaryTable::BestTimes => report.write_best_times(stdout),
        SummaryTable::RaceRuns => report.write_race_runs(stdout),
        SummaryTable::Laps => report.write_laps(stdout),
    }
}

fn tiers(config: Option<&PathBuf>) -> Result<(), RacePaceError> {
    let config = load_config(config)?;
    for tier in Tier::ALL {
        for team in config.team_tiers.teams_in(tier) {
            println!("{}\t{}", tier.file_stem(), team);
        }
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let mut builder = colog::default_builder();
    builder.filter_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    builder.parse_default_env();
    builder.init();
}

fn main() {
    let cli = Args::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Report {
            session,
            output_dir,
            export_csv,
        } => report(session, output_dir.clone(), *export_csv),
        Commands::Summary { session, table } => summary(session, *table),
        Commands::Tiers { config } => tiers(config.as_ref()),
    };

    if let Err(e) = result {
        error!("{}", snafu::Report::from_error(e));
        std::process::exit(1);
    }
}
