use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use delphi::application::Identifier;
use delphi::application::dto::EngineConfig;
use delphi::domain::services::Database;
use delphi::logging::init_logger;
use delphi::presentation::cli::{Cli, batch_line, report_json, token};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    if cli.paths.is_empty() {
        eprintln!("Missing filename!");
        eprintln!("{}", Cli::command().render_usage());
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = EngineConfig::from_env().with_builtin_signatures(!cli.no_builtin);
    if !cli.databases.is_empty() {
        config = config.with_database_paths(cli.databases.clone());
    }

    let database = load_database(&config, !cli.databases.is_empty())?;
    let identifier = Identifier::with_config(&database, &config);
    let mut stdout = std::io::stdout().lock();

    if cli.json {
        let reports = cli
            .paths
            .iter()
            .map(|path| {
                identifier
                    .identify_detailed(path)
                    .with_context(|| format!("Failed to identify {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;
        writeln!(stdout, "{}", report_json(&reports)?)?;
        return Ok(());
    }

    if let [path] = cli.paths.as_slice() {
        let result = identifier
            .identify(path)
            .with_context(|| format!("Failed to identify {}", path.display()))?;
        write!(stdout, "{}", token(&result))?;
        stdout.flush()?;
        return Ok(());
    }

    for (path, result) in identifier.identify_many(&cli.paths) {
        let result = result.with_context(|| format!("Failed to identify {}", path.display()))?;
        writeln!(stdout, "{}", batch_line(&path, &result))?;
    }
    Ok(())
}

/// Explicit `--db` sources must all exist; default search path entries
/// that are missing are skipped. On-disk sources layer over the built-in set.
fn load_database(config: &EngineConfig, explicit: bool) -> Result<Database> {
    let sources: Vec<PathBuf> = if explicit {
        config.database_paths.clone()
    } else {
        config.existing_database_paths()
    };

    let mut database = if config.builtin_signatures {
        Database::builtin().context("Failed to load built-in signatures")?
    } else {
        Database::new()
    };

    if sources.is_empty() && database.is_empty() {
        tracing::warn!("No signature database found; every bootable medium will be Unknown");
    }

    database.extend_from(&sources).with_context(|| {
        format!(
            "Failed to load signature database from {}",
            sources
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })?;
    Ok(database)
}
