mod timeparse;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use dose_core::format::{render_stats, render_stats_json, render_view};
use dose_core::ops::{latest_timezone, resolve_timezone};
use dose_core::*;
use std::path::PathBuf;
use std::process::ExitCode;

/// Environment variables checked for the fs-over-http token, in order
const TOKEN_VARS: &[&str] = &["FOH_TOKEN", "FOH_SERVER_AUTH", "TOKEN"];

#[derive(Parser)]
#[command(name = "doses")]
#[command(about = "Dose log with filtered views and unit-aware statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print JSON instead of text
    #[arg(short = 'j', long, global = true)]
    json: bool,

    /// Prefix each line with the unix timestamp
    #[arg(short = 'u', long, global = true)]
    unix: bool,

    /// Compact UTC "dot time" (2023-04-01 17·05-04)
    #[arg(short = 't', long, global = true)]
    dot_time: bool,

    /// Reverse the final output
    #[arg(short = 'r', long, global = true)]
    reverse: bool,

    /// Process newest doses first (before filtering and windowing)
    #[arg(short = 's', long, global = true)]
    start_at_top: bool,

    /// Invert the filter
    #[arg(short = 'v', long, global = true)]
    invert: bool,

    /// Only include doses whose rendered line matches (case-insensitive regex)
    #[arg(short = 'g', long, global = true, value_name = "REGEX")]
    grep: Option<String>,

    /// Number of doses to show; -1 shows all
    #[arg(short = 'n', long, global = true, allow_negative_numbers = true)]
    show: Option<i64>,

    /// Leave notes out of output and filtering
    #[arg(long, global = true)]
    ignore_notes: bool,

    /// Remote log (fs-over-http JSON URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Token for remote writes
    #[arg(long, global = true)]
    token: Option<String>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the most recent doses (default)
    Get,

    /// Log a dose
    Add(AddArgs),

    /// Remove the most recently added dose
    Rm,

    /// Remove the dose at a position
    Rmp {
        #[arg(allow_negative_numbers = true)]
        position: i64,
    },

    /// Move the shown doses to a timezone, keeping their wall-clock time
    ChangeTz { timezone: String },

    /// Move the shown doses to a timezone, keeping the instant
    ConvertTz { timezone: String },

    /// Rewrite the stored log without changing it
    Save,

    /// Totals per substance
    StatTop,

    /// Average dose per substance
    StatAvg,
}

#[derive(Args)]
struct AddArgs {
    /// Substance taken
    #[arg(short = 'd', long)]
    drug: Option<String>,

    /// Amount with unit, e.g. 10mg
    #[arg(short = 'a', long)]
    dosage: Option<String>,

    /// Route of administration
    #[arg(long)]
    roa: Option<String>,

    #[arg(long)]
    note: Option<String>,

    /// Date (YYYY/MM/DD, YYYY-MM-DD, MM/DD/YYYY, MM-DD-YYYY, YYYYMMDD, MM-DD, MMDD)
    #[arg(long)]
    date: Option<String>,

    /// Time of day (3:04pm, 15:04, 1504)
    #[arg(long)]
    time: Option<String>,

    /// IANA timezone; defaults to the latest dose's zone
    #[arg(long)]
    timezone: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.verbose {
        dose_core::logging::init_with_level("debug");
    } else {
        dose_core::logging::init();
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(mut cli: Cli) -> Result<()> {
    let subcommand = cli.command.take().unwrap_or(Commands::Get);
    let is_stats = matches!(subcommand, Commands::StatTop | Commands::StatAvg);

    // Bad filters are rejected before anything is read
    let mut filter = Filter::from_options(cli.grep.as_deref(), cli.invert)?;
    if matches!(subcommand, Commands::Save) && filter.is_some() {
        tracing::warn!("Ignoring the filter: save always writes the whole log");
        filter = None;
    }

    let config = Config::load()?;

    let render = RenderOptions {
        ignore_notes: cli.ignore_notes,
        show_unix_epoch: cli.unix,
        compact_time: cli.dot_time,
    };
    let window = cli
        .show
        .unwrap_or(if is_stats { 0 } else { config.display.show });

    let invocation = Invocation {
        view: ViewSpec {
            filter,
            window,
            start_at_top: cli.start_at_top,
            final_reverse: cli.reverse,
            render,
            bypass: Vec::new(),
        },
        default_route: config.display.default_route.clone(),
        units: UnitTable::new(&config.units),
    };

    let store = open_store(&cli, &config)?;
    let doses = store.load()?;
    let command = build_command(&subcommand, &doses)?;
    let is_save = matches!(command, Command::Save);

    let execution = execute(command, doses, &invocation)?;

    if execution.persist {
        let report = store.save(&execution.doses)?;
        if is_save {
            for location in &report.locations {
                println!("Saved {}", location);
            }
        }
    }

    match &execution.report {
        Report::View(shown) => print!("{}", render_view(shown, cli.json, &render)?),
        Report::Stats(rows) if cli.json => print!("{}", render_stats_json(rows)?),
        Report::Stats(rows) => print!("{}", render_stats(rows)),
        Report::Saved => {}
    }

    Ok(())
}

/// Remote store when a URL is configured, otherwise the data directory
fn open_store(cli: &Cli, config: &Config) -> Result<Box<dyn DoseStore>> {
    match cli.url.clone().or_else(|| config.store.url.clone()) {
        Some(url) => {
            tracing::debug!("Using remote log at {}", url);
            Ok(Box::new(HttpStore::new(url, resolve_token(cli, config))?))
        }
        None => {
            let data_dir = cli
                .data_dir
                .clone()
                .unwrap_or_else(|| config.store.data_dir.clone());
            tracing::debug!("Using local log in {:?}", data_dir);
            Ok(Box::new(FileStore::new(data_dir)))
        }
    }
}

fn resolve_token(cli: &Cli, config: &Config) -> Option<String> {
    cli.token
        .clone()
        .or_else(|| {
            TOKEN_VARS
                .iter()
                .find_map(|var| std::env::var(var).ok().filter(|t| !t.is_empty()))
        })
        .or_else(|| config.store.token.clone())
}

fn build_command(subcommand: &Commands, doses: &[Dose]) -> Result<Command> {
    let command = match subcommand {
        Commands::Get => Command::Get,
        Commands::Add(args) => Command::Add(new_dose(args, doses)?),
        Commands::Rm => Command::Remove,
        Commands::Rmp { position } => Command::RemoveByPosition(*position),
        Commands::ChangeTz { timezone } => Command::TimezoneChange(timezone.clone()),
        Commands::ConvertTz { timezone } => Command::TimezoneConvert(timezone.clone()),
        Commands::Save => Command::Save,
        Commands::StatTop => Command::StatTotal,
        Commands::StatAvg => Command::StatAverage,
    };
    Ok(command)
}

fn new_dose(args: &AddArgs, doses: &[Dose]) -> Result<NewDose> {
    let timezone = args
        .timezone
        .clone()
        .or_else(|| latest_timezone(doses).map(str::to_string))
        .ok_or_else(|| {
            Error::Config("no --timezone given and there is no earlier dose to take one from".into())
        })?;
    let tz = resolve_timezone(&timezone)?;

    let timestamp = timeparse::resolve(
        args.date.as_deref(),
        args.time.as_deref(),
        tz,
        Utc::now().with_timezone(&tz),
    )?;

    Ok(NewDose {
        timestamp,
        timezone,
        dosage: args.dosage.clone().unwrap_or_default(),
        drug: args.drug.clone().unwrap_or_default(),
        route: args.roa.clone(),
        note: args.note.clone().unwrap_or_default(),
    })
}
