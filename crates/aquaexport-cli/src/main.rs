//! aquaexport CLI
//!
//! Projects daily water measurements into the yearly quality and quantity
//! workbooks, and inspects the configuration and layouts behind them.

mod config;
mod logging;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result, anyhow, bail};
use aquaexport_layout::Mode;
use aquaexport_workbook::{
    DateRange, ExportError, ExportOptions, ExportProgress, ExportReport, Exporter,
    JsonFileSource, MeasurementSource,
};
use chrono::{Local, NaiveDate};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::logging::init_tracing;

#[derive(Parser)]
#[command(name = "aquaexport")]
#[command(author, version, about = "Yearly xlsx reports from daily water measurements", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export measurements for a date range into the yearly documents
    Export(ExportArgs),

    /// Validate configuration, layouts and templates
    Check,

    /// Print the resolved layout of a mode
    Layout {
        #[arg(long)]
        mode: Mode,
    },

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct ExportArgs {
    #[arg(long)]
    mode: Mode,

    /// First day (YYYY-MM-DD)
    #[arg(long, requires = "to", conflicts_with = "preset")]
    from: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD), inclusive
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,

    /// Quick-select range ending today
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// Measurements JSON file
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Today,
    Week,
    Month,
    Year,
}

impl ExportArgs {
    fn range(&self, today: NaiveDate) -> Result<DateRange> {
        match (self.from, self.to, self.preset) {
            (Some(from), Some(to), _) => Ok(DateRange::new(from, to)?),
            (_, _, Some(Preset::Today)) => Ok(DateRange::single(today)),
            (_, _, Some(Preset::Week)) => Ok(DateRange::last_days(today, 7)),
            (_, _, Some(Preset::Month)) => Ok(DateRange::last_days(today, 30)),
            (_, _, Some(Preset::Year)) => Ok(DateRange::year_to_date(today)),
            _ => bail!("pass either --from/--to or --preset"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Runs without reading the config so a broken file can be replaced.
        Commands::InitConfig { force } => {
            init_tracing(cli.verbose, None)?;
            init_config(&cli.config, force)
        }
        Commands::Layout { mode } => {
            let config = Config::load(&cli.config)?;
            init_tracing(cli.verbose, None)?;
            print_layout(&config, mode)
        }
        Commands::Export(args) => export(&load_with_log(&cli.config, cli.verbose)?, &args),
        Commands::Check => check(&load_with_log(&cli.config, cli.verbose)?),
    }
}

fn load_with_log(path: &Path, verbose: u8) -> Result<Config> {
    let config = Config::load(path)?;
    init_tracing(verbose, config.log_path().as_deref())?;
    Ok(config)
}

fn export(config: &Config, args: &ExportArgs) -> Result<()> {
    let range = args.range(Local::now().date_naive())?;
    let layouts = config.layout_registry()?;
    let store = config.store();
    let mode = args.mode;
    let mut source = JsonFileSource::new(&args.input);

    let (tx, rx) = mpsc::channel::<ExportProgress>();
    let worker = thread::Builder::new()
        .name("aquaexport-worker".into())
        .spawn(move || -> Result<ExportReport, ExportError> {
            let measurements = source.fetch(mode, &range)?;
            let mut options = ExportOptions::default();
            options.progress = Some(Box::new(move |progress: ExportProgress| {
                // Receiver gone means the foreground is exiting; nothing to report to.
                let _ = tx.send(progress);
            }));
            Exporter::new(&layouts, &store).run(mode, &range, &measurements, options)
        })
        .context("failed to start export worker")?;

    let mut stderr = io::stderr();
    let mut rendered = false;
    for progress in rx {
        write!(
            stderr,
            "\r{mode} {}: {}/{} ({:.0}%)",
            progress.year,
            progress.completed,
            progress.total,
            progress.fraction() * 100.0
        )?;
        rendered = true;
    }
    if rendered {
        writeln!(stderr)?;
    }

    let report = worker
        .join()
        .map_err(|_| anyhow!("export worker panicked"))?
        .with_context(|| format!("{mode} export {} .. {} failed", range.start(), range.end()))?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &ExportReport) {
    if report.years.is_empty() {
        println!("{}: no records in range", report.mode);
    }
    for year in &report.years {
        println!(
            "{} {} ({}): {} records, {} cells",
            report.mode,
            year.path.display(),
            if year.created { "created" } else { "updated" },
            year.records,
            year.cells_written
        );
    }
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    println!("status: {}", report.status.as_str());
}

fn check(config: &Config) -> Result<()> {
    let mut problems = 0usize;

    let registry = match config.layout_registry() {
        Ok(registry) => registry,
        Err(err) => {
            println!("layouts: {err:#}");
            bail!("layouts failed to load");
        }
    };
    println!("layouts: ok");

    let store = config.store();
    for mode in Mode::ALL {
        let layout = registry.get(mode);
        match store.ensure_template(layout) {
            Ok(path) => println!("{mode} template: {}", path.display()),
            Err(err) => {
                println!("{mode} template: {err}");
                problems += 1;
            }
        }
    }

    for issue in config.signal_issues(&registry) {
        if issue.fatal {
            problems += 1;
            println!("error: {issue}");
        } else {
            println!("note: {issue}");
        }
    }

    println!("export root: {}", store.export_root().display());
    if problems > 0 {
        bail!("{problems} problem(s) found");
    }
    Ok(())
}

fn print_layout(config: &Config, mode: Mode) -> Result<()> {
    let registry = config.layout_registry()?;
    let layout = registry.get(mode);
    let store = config.store();

    println!("mode:      {}", layout.mode);
    println!(
        "documents: {}",
        store
            .mode_dir(layout)
            .join(format!("{}_<year>.xlsx", layout.document.file_stem))
            .display()
    );
    println!("template:  {}", store.template_path(layout).display());
    println!(
        "sheets:    {} .. {}",
        layout.sheet_name(1),
        layout.sheet_name(12)
    );
    if !layout.protected_columns.is_empty() {
        println!("protected: {}", layout.protected_columns.join(", "));
    }
    println!();
    println!(
        "{:<34} {:>6}  {:<14} {:<6} column",
        "location", "anchor", "metric", "stat"
    );
    for location in &layout.locations {
        for (metric, stats) in &location.columns {
            for (statistic, column) in stats {
                println!(
                    "{:<34} {:>6}  {:<14} {:<6} {column}",
                    location.name,
                    location.anchor,
                    metric,
                    statistic.as_str()
                );
            }
        }
    }
    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let text = Config::default().to_toml_string()?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}
