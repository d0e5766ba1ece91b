use campus_guess::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    leaderboard::{LeaderboardClient, ScoreEntry, SqliteScoreStore},
    manifest::{bundled_manifest, load_manifest},
    play::run_game,
    session::GameSession,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    error::Error,
    io::{self, Write},
    path::PathBuf,
};
use tracing_subscriber::EnvFilter;

/// guess where on campus each photo was taken
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A campus location-guessing game. Each round shows a photo; guess its coordinates and score up to 500 points depending on how close you land."
)]
pub struct Cli {
    /// config file to use instead of the platform default
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// leaderboard database path
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// play a game on the terminal
    Play {
        /// image manifest (JSON array of {filename, lat, lng, label?})
        #[clap(short = 'm', long)]
        manifest: Option<PathBuf>,

        /// number of rounds
        #[clap(short = 'r', long)]
        rounds: Option<usize>,

        /// name to save the final score under
        #[clap(short = 'n', long)]
        name: Option<String>,

        /// seed the round shuffle for a reproducible game
        #[clap(long)]
        seed: Option<u64>,
    },
    /// show the leaderboard
    Scores {
        /// print as csv
        #[clap(long)]
        csv: bool,
    },
    /// show or change saved settings
    Config {
        /// default number of rounds
        #[clap(short = 'r', long)]
        rounds: Option<usize>,

        /// default player name
        #[clap(short = 'n', long)]
        name: Option<String>,

        /// default image manifest
        #[clap(short = 'm', long)]
        manifest: Option<PathBuf>,
    },
    /// add a score to the leaderboard directly
    Submit {
        /// player name (trimmed, at most 64 characters)
        #[clap(short = 'n', long)]
        name: String,

        /// final score
        #[clap(short = 's', long)]
        score: u32,
    },
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    fn open_leaderboard(
        &self,
        config: &Config,
    ) -> Result<LeaderboardClient<SqliteScoreStore>, Box<dyn Error>> {
        let path = self
            .db
            .clone()
            .or_else(AppDirs::db_path)
            .unwrap_or_else(|| PathBuf::from("campus_guess_leaderboard.db"));
        let store = SqliteScoreStore::open(&path, config.leaderboard_capacity)?;
        Ok(LeaderboardClient::new(store))
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.config_store().load();

    match &cli.command {
        Command::Play {
            manifest,
            rounds,
            name,
            seed,
        } => {
            let pool = match manifest.as_ref().or(config.manifest_path.as_ref()) {
                Some(path) => load_manifest(path)?,
                None => bundled_manifest()?,
            };
            let rounds = rounds.unwrap_or(config.rounds_total);
            let name = name.clone().or_else(|| config.player_name.clone());

            let summary = match seed {
                Some(seed) => {
                    let rng = StdRng::seed_from_u64(*seed);
                    play(GameSession::with_rng(rounds, rng), &pool)?
                }
                None => play(GameSession::new(rounds), &pool)?,
            };

            let Some(summary) = summary else {
                return Ok(());
            };
            match name {
                Some(name) => {
                    let mut leaderboard = cli.open_leaderboard(&config)?;
                    let submission = leaderboard.submit(&name, &summary)?;
                    let saved_as = &submission.entry.name;
                    match submission.rank() {
                        Some(rank) => println!(
                            "Saved as {saved_as}, rank {rank} of {}.",
                            submission.ranked.len()
                        ),
                        None => println!(
                            "Saved as {saved_as}, not in the top {}.",
                            config.leaderboard_capacity
                        ),
                    }
                }
                None => println!("Pass --name to save your score."),
            }
        }
        Command::Scores { csv } => {
            let leaderboard = cli.open_leaderboard(&config)?;
            if *csv {
                leaderboard.export_csv(io::stdout().lock())?;
            } else {
                print_scores(&leaderboard.list()?)?;
            }
        }
        Command::Config {
            rounds,
            name,
            manifest,
        } => {
            let mut config = config;
            let changed = rounds.is_some() || name.is_some() || manifest.is_some();
            if let Some(rounds) = rounds {
                config.rounds_total = *rounds;
            }
            if let Some(name) = name {
                config.player_name = Some(name.clone());
            }
            if let Some(manifest) = manifest {
                config.manifest_path = Some(manifest.clone());
            }
            if changed {
                cli.config_store().save(&config)?;
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::Submit { name, score } => {
            let entry = ScoreEntry::new(name, *score, Utc::now())?;
            let mut leaderboard = cli.open_leaderboard(&config)?;
            leaderboard.submit_entry(&entry)?;
            println!("Saved {} for {}.", entry.score, entry.name);
        }
    }

    Ok(())
}

fn play<R: Rng>(
    mut session: GameSession<R>,
    pool: &[campus_guess::LocationRecord],
) -> io::Result<Option<campus_guess::SessionSummary>> {
    let stdin = io::stdin();
    run_game(&mut session, pool, stdin.lock(), io::stdout().lock())
}

fn print_scores(entries: &[ScoreEntry]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if entries.is_empty() {
        writeln!(out, "No scores yet.")?;
        return Ok(());
    }
    writeln!(out, "{:>4}  {:<24} {:>6}  date", "rank", "name", "score")?;
    for (i, e) in entries.iter().enumerate() {
        writeln!(
            out,
            "{:>4}  {:<24} {:>6}  {}",
            i + 1,
            e.name,
            e.score,
            e.date.format("%Y-%m-%d %H:%M")
        )?;
    }
    Ok(())
}
