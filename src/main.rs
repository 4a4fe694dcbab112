//! Segue CLI - beatmatched two-track mixing
//!
//! Command-line interface for the segue mixing tools.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use segue::cli::commands;
use segue::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Segue v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd, cli.bits),
        None => {
            println!("Segue v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, bits: u16) -> anyhow::Result<()> {
    match cmd {
        Commands::Scan { dir } => {
            commands::scan(&dir).with_context(|| format!("scanning {}", dir.display()))
        }
        Commands::Cues { audio, analysis } => commands::cues(&audio, &analysis)
            .with_context(|| format!("extracting cue points from {}", audio.display())),
        Commands::Tempo { analysis } => commands::tempo(&analysis)
            .with_context(|| format!("estimating tempo from {}", analysis.display())),
        Commands::Eq {
            input,
            output,
            low,
            high,
        } => commands::eq(&input, &output, low, high, bits)
            .with_context(|| format!("applying EQ to {}", input.display())),
        Commands::Transition {
            input,
            output,
            keyframes,
            mode,
            chunk_size,
        } => commands::transition(&input, &output, &keyframes, mode, chunk_size, bits)
            .with_context(|| format!("rendering transition on {}", input.display())),
        Commands::Normalize {
            input,
            output,
            target_db,
        } => commands::normalize_file(&input, &output, target_db, bits)
            .with_context(|| format!("normalizing {}", input.display())),
        Commands::Mix {
            master,
            slave,
            master_analysis,
            slave_analysis,
            output,
            config,
            match_tempo,
        } => commands::mix(
            &master,
            &slave,
            &master_analysis,
            &slave_analysis,
            &output,
            config.as_deref(),
            match_tempo,
            bits,
        )
        .with_context(|| {
            format!(
                "mixing {} into {}",
                master.display(),
                slave.display()
            )
        }),
    }
}
