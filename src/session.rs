use crate::error::{GameError, Result};
use crate::geo::{score_from_distance, Coordinate};
use crate::manifest::LocationRecord;
use crate::rounds::select_rounds_with;
use rand::rngs::ThreadRng;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

pub const DEFAULT_ROUNDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    #[strum(serialize = "not started")]
    NotStarted,
    #[strum(serialize = "in a round")]
    InRound,
    #[strum(serialize = "awaiting advance")]
    AwaitingAdvance,
    #[strum(serialize = "finished")]
    Finished,
}

/// Outcome of one resolved round
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundResult {
    /// 1-based
    pub round: usize,
    pub location: LocationRecord,
    pub guess: Option<Coordinate>,
    pub distance_m: Option<f64>,
    pub points: u32,
}

impl RoundResult {
    pub fn was_skipped(&self) -> bool {
        self.guess.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub rounds_total: usize,
    pub current_round_index: usize,
    pub rounds: Vec<LocationRecord>,
    pub completed_results: Vec<RoundResult>,
    pub total_score: u32,
    pub phase: Phase,
}

impl SessionState {
    pub fn new(rounds_total: usize) -> Self {
        Self {
            rounds_total,
            current_round_index: 0,
            rounds: Vec::new(),
            completed_results: Vec::new(),
            total_score: 0,
            phase: Phase::NotStarted,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_ROUNDS)
    }
}

/// End-of-game aggregate handed to the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub total_score: u32,
    pub rounds_total: usize,
    pub results: Vec<RoundResult>,
}

impl SessionSummary {
    pub fn max_score(&self) -> u64 {
        u64::from(crate::geo::MAX_POINTS).saturating_mul(self.rounds_total as u64)
    }

    pub fn rounds_skipped(&self) -> usize {
        self.results.iter().filter(|r| r.was_skipped()).count()
    }

    /// Mean distance over the rounds that were actually guessed
    pub fn mean_distance_m(&self) -> Option<f64> {
        let distances: Vec<f64> = self.results.iter().filter_map(|r| r.distance_m).collect();
        match distances.len() {
            0 => None,
            n => Some(distances.iter().sum::<f64>() / n as f64),
        }
    }
}

/// Drives one play-through: round selection, guesses, skips, and scoring.
///
/// All mutation goes through `start`, `submit_guess`, `skip` and `advance`.
/// Each either applies completely or returns an error and leaves the state
/// as it was.
#[derive(Debug)]
pub struct GameSession<R: Rng = ThreadRng> {
    state: SessionState,
    rng: R,
}

impl GameSession<ThreadRng> {
    pub fn new(rounds_total: usize) -> Self {
        Self::with_rng(rounds_total, rand::thread_rng())
    }
}

impl Default for GameSession<ThreadRng> {
    fn default() -> Self {
        Self::new(DEFAULT_ROUNDS)
    }
}

impl<R: Rng> GameSession<R> {
    pub fn with_rng(rounds_total: usize, rng: R) -> Self {
        Self {
            state: SessionState::new(rounds_total),
            rng,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn total_score(&self) -> u32 {
        self.state.total_score
    }

    pub fn rounds_total(&self) -> usize {
        self.state.rounds_total
    }

    /// 1-based number of the round being played or just resolved, 0 before start
    pub fn round_number(&self) -> usize {
        self.state.current_round_index
    }

    /// The location being guessed, while a round is active or awaiting advance
    pub fn current_round(&self) -> Option<&LocationRecord> {
        match self.state.phase {
            Phase::InRound | Phase::AwaitingAdvance => self
                .state
                .rounds
                .get(self.state.current_round_index.checked_sub(1)?),
            Phase::NotStarted | Phase::Finished => None,
        }
    }

    /// The result to reveal between rounds
    pub fn last_result(&self) -> Option<&RoundResult> {
        match self.state.phase {
            Phase::AwaitingAdvance => self.state.completed_results.last(),
            _ => None,
        }
    }

    /// Begin a new session, discarding any session in progress.
    pub fn start(&mut self, pool: &[LocationRecord]) -> Result<()> {
        let rounds = select_rounds_with(pool, self.state.rounds_total, &mut self.rng)?;

        self.state = SessionState {
            rounds,
            ..SessionState::new(self.state.rounds_total)
        };
        info!(
            rounds = self.state.rounds_total,
            pool = pool.len(),
            "session started"
        );

        // enter round 1 through the normal advance path
        self.state.phase = Phase::AwaitingAdvance;
        self.advance()
    }

    pub fn submit_guess(&mut self, lat: f64, lng: f64) -> Result<&RoundResult> {
        self.require(Phase::InRound, "submit a guess")?;
        let guess = Coordinate::new(lat, lng)?;
        let location = self.active_location()?.clone();

        let distance_m = location.coordinate()?.distance_to(&guess);
        let points = score_from_distance(distance_m)?;

        info!(
            round = self.state.current_round_index,
            distance_m, points, "guess scored"
        );
        Ok(self.resolve(RoundResult {
            round: self.state.current_round_index,
            location,
            guess: Some(guess),
            distance_m: Some(distance_m),
            points,
        }))
    }

    pub fn skip(&mut self) -> Result<&RoundResult> {
        self.require(Phase::InRound, "skip")?;
        let location = self.active_location()?.clone();

        info!(round = self.state.current_round_index, "round skipped");
        Ok(self.resolve(RoundResult {
            round: self.state.current_round_index,
            location,
            guess: None,
            distance_m: None,
            points: 0,
        }))
    }

    /// Move past the revealed result: into the next round, or to `Finished`
    /// after the last one.
    pub fn advance(&mut self) -> Result<()> {
        self.require(Phase::AwaitingAdvance, "advance")?;

        if self.state.current_round_index < self.state.rounds_total {
            self.state.current_round_index += 1;
            self.state.phase = Phase::InRound;
            debug!(round = self.state.current_round_index, "-> InRound");
        } else {
            self.state.phase = Phase::Finished;
            info!(total_score = self.state.total_score, "session finished");
            debug!("-> Finished");
        }
        Ok(())
    }

    pub fn summary(&self) -> Result<SessionSummary> {
        self.require(Phase::Finished, "summarize")?;
        Ok(SessionSummary {
            total_score: self.state.total_score,
            rounds_total: self.state.rounds_total,
            results: self.state.completed_results.clone(),
        })
    }

    fn require(&self, phase: Phase, operation: &'static str) -> Result<()> {
        if self.state.phase == phase {
            Ok(())
        } else {
            Err(GameError::InvalidTransition {
                operation,
                phase: self.state.phase,
            })
        }
    }

    fn active_location(&self) -> Result<&LocationRecord> {
        self.current_round().ok_or(GameError::InvalidTransition {
            operation: "resolve a round",
            phase: self.state.phase,
        })
    }

    fn resolve(&mut self, result: RoundResult) -> &RoundResult {
        self.state.total_score += result.points;
        self.state.completed_results.push(result);
        self.state.phase = Phase::AwaitingAdvance;
        debug!(round = self.state.current_round_index, "-> AwaitingAdvance");
        &self.state.completed_results[self.state.completed_results.len() - 1]
    }
}
