// Courtside entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, stdout carries the JSON result)
// 2. Load config
// 3. Load the slate's player pool
// 4. Optimize the slate, or validate a fixed lineup, and print JSON

use courtside_cli::config;
use courtside_cli::pool::{CsvPlayerSource, PlayerSource};
use courtside_core::{optimize, validate_players, OptimizationRequest, ValidationRules, LINEUP_SIZE};

use anyhow::{bail, Context};
use tracing::{info, warn};

/// What the invocation asked for.
enum Command {
    Optimize,
    Validate(Vec<String>),
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    match args.split_first() {
        None => Ok(Command::Optimize),
        Some((cmd, rest)) if cmd == "optimize" && rest.is_empty() => Ok(Command::Optimize),
        Some((cmd, ids)) if cmd == "validate" => {
            if ids.len() != LINEUP_SIZE {
                bail!("validate takes {LINEUP_SIZE} player ids, got {}", ids.len());
            }
            Ok(Command::Validate(ids.to_vec()))
        }
        Some((cmd, _)) => bail!("unknown command `{cmd}`; usage: courtside [optimize | validate <id>...]"),
    }
}

fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Courtside starting up");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(&args)?;

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: slate={} ({}), {:?} mode, {} lineups",
        config.slate.id, config.slate.date, config.optimizer.mode, config.optimizer.num_lineups
    );

    // 3. Load the player pool
    let cwd = std::env::current_dir().context("failed to read working directory")?;
    let source = CsvPlayerSource::new(config.pool_path(&cwd));
    let players = source
        .load_players()
        .with_context(|| format!("failed to load player pool {}", source.path().display()))?;

    // 4. Run the command
    match command {
        Command::Optimize => {
            let request = OptimizationRequest {
                slate_id: config.slate.id.clone(),
                players,
                settings: config.optimizer.clone(),
            };
            let response = optimize(&request).context("optimization failed")?;
            if let Some(notice) = &response.partial {
                warn!("{}", notice);
                eprintln!("warning: {notice}");
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&response).context("failed to encode response")?
            );
        }
        Command::Validate(ids) => {
            let mut lineup = Vec::with_capacity(ids.len());
            for id in &ids {
                let Some(player) = players.iter().find(|p| p.id == *id) else {
                    bail!("player `{id}` is not in the pool");
                };
                lineup.push(player.clone());
            }
            let report = validate_players(&lineup, &ValidationRules::from_settings(&config.optimizer));
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to encode report")?
            );
            if !report.passed {
                bail!("lineup failed validation with {} violations", report.violations.len());
            }
        }
    }

    info!("Courtside finished");
    Ok(())
}

/// Initialize tracing to log to a file, keeping stdout for JSON output.
///
/// Logs go to the platform data directory when one is available, otherwise
/// to `./logs`.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = match directories::ProjectDirs::from("", "", "courtside") {
        Some(dirs) => dirs.data_local_dir().join("logs"),
        None => std::env::current_dir()?.join("logs"),
    };
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_file = std::fs::File::create(log_dir.join("courtside.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("courtside=info,courtside_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
