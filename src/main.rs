use anyhow::{bail, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use std::path::PathBuf;
use std::time::Duration;

use connect4_critical::{
    analysis::{DEFAULT_MAX_PLY, DEFAULT_MIN_PLY},
    bitboard::BitBoard,
    database::CriticalDatabase,
    generator::Generator,
    HEIGHT, WIDTH,
};

/// Generate a database of critical Connect 4 positions
///
/// Walks every position reachable within the ply window, keeps the ones
/// with exactly one non-obvious winning move and writes them to an
/// open-addressed hash file for runtime lookup.
#[derive(Parser)]
#[command(name = "critgen", version)]
struct Cli {
    /// First ply of the analysis window
    #[arg(long, default_value_t = DEFAULT_MIN_PLY)]
    min_ply: usize,

    /// Last ply of the analysis window
    #[arg(long, default_value_t = DEFAULT_MAX_PLY)]
    max_ply: usize,

    /// Destination of the generated database
    #[arg(short, long, default_value = "critical.db")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.min_ply > cli.max_ply {
        bail!(
            "--min-ply ({}) must not exceed --max-ply ({})",
            cli.min_ply,
            cli.max_ply
        );
    }
    if cli.max_ply >= WIDTH * HEIGHT {
        bail!(
            "--max-ply ({}) must be below the full board at {} plies",
            cli.max_ply,
            WIDTH * HEIGHT
        );
    }

    info!(
        "generating critical positions for plies {}..={}, this will take a while (hours)",
        cli.min_ply, cli.max_ply
    );

    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::with_template(
        "{spinner} [{elapsed_precise}] {pos} positions visited • {msg}",
    )?);
    progress.enable_steady_tick(Duration::from_millis(100));

    let mut generator = Generator::new(cli.min_ply, cli.max_ply);
    generator.run(BitBoard::new(), &progress);
    progress.finish_and_clear();

    info!(
        "visited {} positions, searched {} solver nodes",
        generator.visited(),
        generator.nodes_searched()
    );
    info!("found {} critical positions", generator.entries().len());

    let mut per_ply = [0u64; WIDTH * HEIGHT];
    for entry in generator.entries() {
        per_ply[entry.ply as usize] += 1;
    }
    for (ply, count) in per_ply.iter().enumerate() {
        if *count > 0 {
            info!("  ply {:2}: {} positions", ply, count);
        }
    }

    let database = CriticalDatabase::build(generator.entries(), cli.min_ply as u8, cli.max_ply as u8);
    database.save(&cli.output)?;

    info!(
        "saved {} ({} slots, {} bytes)",
        cli.output.display(),
        database.table_size(),
        12 + 5 * database.table_size()
    );

    Ok(())
}
