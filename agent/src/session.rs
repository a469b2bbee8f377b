use std::fmt;

use log::{debug, info, warn};
use thiserror::Error;
use vanguard_core::{Command, PlacementOracle};
use vanguard_world::World;

use crate::Agent;

/// Failures reported by the game client.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The game is over; nothing more can be observed or sent.
    #[error("the game session has ended")]
    SessionEnded,
    /// The connection to the game failed.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The game refused a request.
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Connection to a running game.
///
/// The client also answers placement queries, since only the engine knows
/// every placement rule.
pub trait GameClient: PlacementOracle {
    /// Fetches the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::SessionEnded`] once the game is over, or another
    /// variant when the snapshot could not be fetched this time.
    fn observe(&mut self) -> Result<World, ClientError>;

    /// Sends one tick's commands, fire and forget.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the commands were not delivered.
    fn submit(&mut self, commands: Vec<Command>) -> Result<(), ClientError>;

    /// Lets the game run for `loops` game loops.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the game did not advance.
    fn step(&mut self, loops: u32) -> Result<(), ClientError>;
}

/// Counters collected over a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Snapshots the agent acted on.
    pub ticks: u64,
    /// Snapshots dropped as repeated frames.
    pub skipped: u64,
    /// Commands delivered to the game.
    pub commands: u64,
    /// Boundary failures that were logged and survived.
    pub failures: u64,
    /// Whether the game reported the end of the session.
    pub ended: bool,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks processed, {} skipped, {} commands sent, {} failures",
            self.ticks, self.skipped, self.commands, self.failures
        )?;
        if self.ended {
            f.write_str(", session ended")?;
        }
        Ok(())
    }
}

/// Logs a boundary failure and counts it.
fn absorb(summary: &mut SessionSummary, error: &ClientError) {
    summary.failures += 1;
    warn!("game client failure, carrying on: {error}");
}

/// Drives `agent` against `client` for at most `limit` observations.
///
/// Each round observes, ticks the agent, submits the resulting commands and
/// steps the game by the agent's frames per order. A failed observation,
/// submission or step is logged and only costs that round; the next round
/// starts from a fresh snapshot. The session stops early only when the game
/// reports its end.
pub fn run_session<C>(client: &mut C, agent: &mut Agent, limit: u64) -> SessionSummary
where
    C: GameClient,
{
    let mut summary = SessionSummary::default();
    let loops = agent.config().frames_per_order;

    for _ in 0..limit {
        match client.observe() {
            Ok(world) => match agent.tick(&world, &*client) {
                Some(batch) if batch.is_empty() => summary.ticks += 1,
                Some(batch) => {
                    summary.ticks += 1;
                    let count = batch.len() as u64;
                    match client.submit(batch.into_vec()) {
                        Ok(()) => summary.commands += count,
                        Err(ClientError::SessionEnded) => return ended(summary),
                        Err(error) => absorb(&mut summary, &error),
                    }
                }
                None => summary.skipped += 1,
            },
            Err(ClientError::SessionEnded) => return ended(summary),
            Err(error) => absorb(&mut summary, &error),
        }

        match client.step(loops) {
            Ok(()) => {}
            Err(ClientError::SessionEnded) => return ended(summary),
            Err(error) => absorb(&mut summary, &error),
        }
    }

    debug!("session stopped after {limit} rounds: {summary}");
    summary
}

fn ended(mut summary: SessionSummary) -> SessionSummary {
    info!("game over: {summary}");
    summary.ended = true;
    summary
}
