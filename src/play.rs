//! Line-oriented front end for a [`GameSession`].
//!
//! Stands in for the map UI: the player types a coordinate instead of
//! clicking one. Generic over reader/writer so it runs headless in tests.

use crate::error::GameError;
use crate::manifest::LocationRecord;
use crate::session::{GameSession, Phase, RoundResult, SessionSummary};
use rand::Rng;
use std::io::{self, BufRead, Write};

/// What the player typed at the guess prompt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Guess { lat: f64, lng: f64 },
    Skip,
    Quit,
}

/// Parse `lat,lng`, `lat lng`, `skip`/`s`, or `quit`/`q`
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "skip" | "s" => return Some(Command::Skip),
        "quit" | "q" | "exit" => return Some(Command::Quit),
        _ => {}
    }

    let mut parts = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty());
    let lat = parts.next()?.parse::<f64>().ok()?;
    let lng = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Command::Guess { lat, lng })
}

fn describe(result: &RoundResult) -> String {
    let place = result.location.label.as_deref().unwrap_or("that spot");
    match result.distance_m {
        Some(d) => format!(
            "Distance: {} m, points: {} ({place} is at {:.5}, {:.5})",
            d.round(),
            result.points,
            result.location.lat,
            result.location.lng
        ),
        None => format!(
            "Skipped, 0 points. {place} is at {:.5}, {:.5}",
            result.location.lat, result.location.lng
        ),
    }
}

/// Play one full session. Returns `None` when the player quits or input
/// runs out before the last round.
pub fn run_game<R, I, O>(
    session: &mut GameSession<R>,
    pool: &[LocationRecord],
    input: I,
    mut out: O,
) -> io::Result<Option<SessionSummary>>
where
    R: Rng,
    I: BufRead,
    O: Write,
{
    session
        .start(pool)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut lines = input.lines();

    while session.phase() == Phase::InRound {
        let Some(location) = session.current_round() else {
            break;
        };
        writeln!(
            out,
            "Round {}/{}  photo: {}",
            session.round_number(),
            session.rounds_total(),
            location.filename
        )?;
        if let Some(label) = &location.label {
            writeln!(out, "hint: {label}")?;
        }
        write!(out, "guess (lat,lng | skip | quit)> ")?;
        out.flush()?;

        let Some(line) = lines.next().transpose()? else {
            writeln!(out)?;
            return Ok(None);
        };

        let resolved = match parse_command(&line) {
            Some(Command::Guess { lat, lng }) => session.submit_guess(lat, lng),
            Some(Command::Skip) => session.skip(),
            Some(Command::Quit) => {
                writeln!(out, "Game abandoned at {} points.", session.total_score())?;
                return Ok(None);
            }
            None => {
                writeln!(out, "Could not read that. Try `22.2504, 84.9014` or `skip`.")?;
                continue;
            }
        };

        match resolved {
            Ok(result) => {
                let text = describe(result);
                writeln!(out, "{text}")?;
            }
            Err(e @ GameError::InvalidCoordinate { .. }) => {
                writeln!(out, "{e}")?;
                continue;
            }
            Err(e) => return Err(io::Error::other(e)),
        }

        writeln!(out, "Total: {}", session.total_score())?;
        session.advance().map_err(io::Error::other)?;
    }

    let summary = session.summary().map_err(io::Error::other)?;
    write!(
        out,
        "Game over. Total score: {} / {} ({} rounds)",
        summary.total_score,
        summary.max_score(),
        summary.rounds_total
    )?;
    match summary.mean_distance_m() {
        Some(mean) => writeln!(out, ", mean distance {} m", mean.round())?,
        None => writeln!(out)?,
    }
    Ok(Some(summary))
}
