use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use profsnap::backup::{BackupOrchestrator, RunOptions};
use profsnap::cli::Cli;
use profsnap::config::{self, Config};
use profsnap::detect::{CommandLister, RunningAppDetector};
use profsnap::{logging, output};
use std::io;
use std::process;

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        print_completions(shell, &mut Cli::command());
        return Ok(());
    }

    logging::init(cli.debug);
    output::set_verbosity(output::Verbosity::from_flags(cli.quiet, cli.verbose));

    let config_path = config::config_path(cli.config.as_deref())?;
    tracing::debug!(path = %config_path.display(), "loading configuration");
    let mut resolved = Config::load(&config_path)?.resolve(cli.tag.as_deref())?;
    if let Some(dest) = cli.dest {
        resolved.destination = dest;
    }

    let lister = CommandLister::from_argv(resolved.process_list_command.as_deref())?;
    let orchestrator = BackupOrchestrator::new(
        resolved,
        RunningAppDetector::new(lister),
        RunOptions {
            keep_going: cli.keep_going,
            dry_run: cli.dry_run,
        },
    );

    let outcome = orchestrator.run_all()?;
    let failed = outcome.failures().len();
    if failed > 0 {
        anyhow::bail!("{failed} profile backup(s) failed");
    }

    Ok(())
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
