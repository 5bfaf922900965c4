use std::process;

use anyhow::Context;
use bochord::cli::Cli;
use bochord::config::{Config, Settings};
use bochord::error::BackupError;
use bochord::mirror::Rsync;
use bochord::report::Reporter;
use bochord::{runner, sysexits};
use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

/// Entry point for the bochord CLI application.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {e}", style("error:").red().bold());
            process::exit(sysexits::EX_CONFIG);
        }
    };
    let config = Config::resolve(cli, settings);

    if !config.source.is_dir() {
        eprintln!(
            "{} source directory '{}' does not exist",
            style("error:").red().bold(),
            config.source.display()
        );
        process::exit(sysexits::EX_NOINPUT);
    }

    let mirror = Rsync::new(&config.mirror_program);
    let mut reporter = Reporter::stdout(config.run.backup.verbose, config.run.backup.dry_run);
    let report = match runner::run(
        &config.source,
        &config.dest,
        &config.run,
        &mirror,
        &mut reporter,
    ) {
        Ok(report) => report,
        Err(e @ BackupError::Io { .. }) if !config.dest.is_dir() => {
            eprintln!("{} {e}", style("error:").red().bold());
            process::exit(sysexits::EX_CANTCREAT);
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!(
                    "failed to back up '{}' to '{}'",
                    config.source.display(),
                    config.dest.display()
                )
            });
        }
    };

    if report.has_failures() {
        process::exit(sysexits::EX_IOERR);
    }
    Ok(())
}

/// Logs to stderr; `--verbose` turns on debug output unless `RUST_LOG` says otherwise.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,bochord={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
