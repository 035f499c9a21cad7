//! Wheelhouse index builder CLI entrypoint.
//!
//! This binary lists the releases of a GitHub repository, downloads every
//! wheel and source distribution attached to them, and writes a static
//! PEP 503 simple index under the output directory.

use clap::Parser;
use std::io::Write;
use wheelhouse_indexer::artefact::download::HttpFetcher;
use wheelhouse_indexer::cli::Cli;
use wheelhouse_indexer::config::IndexConfig;
use wheelhouse_indexer::error::{IndexError, Result};
use wheelhouse_indexer::http::HttpClient;
use wheelhouse_indexer::output::{format_plan, success_message, write_stderr_line};
use wheelhouse_indexer::pipeline::{build_index, plan};
use wheelhouse_indexer::source::github::GitHubReleaseSource;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Installs the logger; `RUST_LOG` overrides the level implied by flags.
fn init_logging(cli: &Cli) {
    let env = env_logger::Env::default().default_filter_or(cli.log_level().as_str());
    if env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init()
        .is_err()
    {
        // A logger is already installed.
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let config = IndexConfig::from_cli(cli)?;
    let client = HttpClient::new(config.timeouts, Some(config.token.expose().to_owned()));
    let source = GitHubReleaseSource::new(
        client.clone(),
        &config.api_url,
        config.repository.clone(),
        config.retry,
    );

    if config.dry_run {
        let planned = plan(&source, &config.yanks)?;
        return writeln!(stdout, "{}", format_plan(&planned))
            .map_err(|source| IndexError::WriteFailed { source });
    }

    let fetcher = HttpFetcher::new(client);
    let report = build_index(&source, &fetcher, &config.yanks, &config.build_options())?;

    if !cli.quiet {
        write_stderr_line(stderr, success_message(&report, &config.output_dir));
    }
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            err.exit_code()
        }
    }
}
