//! Game session state machine — the single source of truth.
//!
//! Exactly two writers mutate a [`GameSession`]: the button input path via
//! [`apply_input`](GameSession::apply_input) and the 1 Hz tick driver via
//! [`apply_tick`](GameSession::apply_tick). Every other task reads a
//! [`Snapshot`] taken inside the same lock, so nobody can observe a
//! half-applied transition (e.g. a new owner with a stale phase).
//!
//! The phase only ever moves along Idle → Active → Finished → Idle.

use palette::Srgb;

use crate::config::GameConfig;

/// Top-level game phase.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum Phase {
    /// Waiting for the first claim.
    Idle,
    /// Countdown running, the hill is contested.
    Active,
    /// Countdown expired; a button press starts the next game.
    Finished,
}

/// The two competing teams, one per button.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum Team {
    /// Left button.
    Red,
    /// Right button.
    Blue,
}

impl Team {
    pub const fn name(self) -> &'static str {
        match self {
            Team::Red => "RED",
            Team::Blue => "BLUE",
        }
    }

    /// Strip color for this team.
    pub const fn color(self) -> Srgb<u8> {
        match self {
            Team::Red => Srgb::new(255, 0, 0),
            Team::Blue => Srgb::new(0, 0, 255),
        }
    }
}

/// Buzzer cadence, derived from [`Phase`] but stored so the buzzer worker
/// does not re-derive it every poll.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum BuzzerPhase {
    Silent,
    /// Short pulse once per second.
    Ticking,
    /// Continuous end-of-game tone.
    EndSignal,
}

/// A state transition worth telling the outside world about.
///
/// Produced under the session lock, formatted into a notification text
/// afterwards — in particular, `Reset` carries the winner captured *before*
/// the owner field is cleared.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum GameEvent {
    /// First claim of a new game.
    Started { team: Team },
    /// The other team took the hill.
    Captured { team: Team, remaining_secs: u32 },
    /// Half the session duration has elapsed.
    Halfway { remaining_secs: u32 },
    /// The countdown ran out.
    GameOver { winner: Team },
    /// A button press acknowledged the finished game and reset it.
    Reset { winner: Team },
}

/// Consistent, copyable view of the session for presentation workers.
#[derive(Clone, Copy, Debug, defmt::Format)]
pub struct Snapshot {
    pub phase: Phase,
    pub owner: Option<Team>,
    pub elapsed_secs: u32,
    pub remaining_secs: u32,
    pub duration_secs: u32,
    pub buzzer: BuzzerPhase,
}

/// Shared game state. Created once at boot, reset in place, never destroyed.
pub struct GameSession {
    duration_secs: u32,
    phase: Phase,
    owner: Option<Team>,
    elapsed_secs: u32,
    buzzer: BuzzerPhase,
}

impl GameSession {
    pub const fn new(config: GameConfig) -> Self {
        Self {
            duration_secs: config.duration_secs,
            phase: Phase::Idle,
            owner: None,
            elapsed_secs: 0,
            buzzer: BuzzerPhase::Silent,
        }
    }

    /// Apply a debounced button press from `team`.
    ///
    /// - Finished: acknowledge and reset to Idle. The winner is captured
    ///   before the owner field is cleared so the event names the right team.
    /// - Idle: start a new game with `team` on the hill.
    /// - Active: a claim by the current owner is a no-op; a claim by the
    ///   other team takes the hill.
    pub fn apply_input(&mut self, team: Team) -> Option<GameEvent> {
        match self.phase {
            Phase::Finished => {
                let winner = self.owner;
                self.phase = Phase::Idle;
                self.owner = None;
                self.elapsed_secs = 0;
                self.buzzer = BuzzerPhase::Silent;
                winner.map(|winner| GameEvent::Reset { winner })
            }
            Phase::Idle => {
                self.phase = Phase::Active;
                self.owner = Some(team);
                self.elapsed_secs = 0;
                self.buzzer = BuzzerPhase::Ticking;
                Some(GameEvent::Started { team })
            }
            Phase::Active => {
                if self.owner == Some(team) {
                    return None;
                }
                self.owner = Some(team);
                Some(GameEvent::Captured {
                    team,
                    remaining_secs: self.remaining_secs(),
                })
            }
        }
    }

    /// Advance the countdown by one second.
    ///
    /// A no-op outside the Active phase. Fires the halfway event exactly
    /// once per game and moves to Finished when the duration runs out.
    pub fn apply_tick(&mut self) -> Option<GameEvent> {
        if self.phase != Phase::Active {
            return None;
        }

        let mut event = None;
        if self.elapsed_secs == self.duration_secs / 2 {
            event = Some(GameEvent::Halfway {
                remaining_secs: self.remaining_secs(),
            });
        }

        if self.elapsed_secs < self.duration_secs {
            self.elapsed_secs += 1;
        } else {
            self.phase = Phase::Finished;
            self.buzzer = BuzzerPhase::EndSignal;
            if let Some(winner) = self.owner {
                event = Some(GameEvent::GameOver { winner });
            }
        }
        event
    }

    /// One consistent view of all fields. Take this inside the lock.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            owner: self.owner,
            elapsed_secs: self.elapsed_secs,
            remaining_secs: self.remaining_secs(),
            duration_secs: self.duration_secs,
            buzzer: self.buzzer,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn remaining_secs(&self) -> u32 {
        self.duration_secs.saturating_sub(self.elapsed_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;

    fn session(duration_secs: u32) -> GameSession {
        GameSession::new(GameConfig {
            duration_secs,
            retry: RetryPolicy::DEFAULT,
        })
    }

    #[test]
    fn idle_claim_starts_the_game() {
        let mut s = session(900);
        let event = s.apply_input(Team::Red);
        assert_eq!(event, Some(GameEvent::Started { team: Team::Red }));

        let snap = s.snapshot();
        assert_eq!(snap.phase, Phase::Active);
        assert_eq!(snap.owner, Some(Team::Red));
        assert_eq!(snap.elapsed_secs, 0);
        assert_eq!(snap.buzzer, BuzzerPhase::Ticking);
    }

    #[test]
    fn redundant_claim_is_a_noop() {
        let mut s = session(900);
        s.apply_input(Team::Blue);
        s.apply_tick();

        let before = s.snapshot();
        assert_eq!(s.apply_input(Team::Blue), None);
        let after = s.snapshot();
        assert_eq!(after.phase, before.phase);
        assert_eq!(after.owner, before.owner);
        assert_eq!(after.elapsed_secs, before.elapsed_secs);
    }

    #[test]
    fn opposing_claim_takes_the_hill() {
        let mut s = session(900);
        s.apply_input(Team::Red);
        for _ in 0..550 {
            s.apply_tick();
        }

        let event = s.apply_input(Team::Blue);
        assert_eq!(
            event,
            Some(GameEvent::Captured {
                team: Team::Blue,
                remaining_secs: 350,
            })
        );
        assert_eq!(s.snapshot().owner, Some(Team::Blue));
    }

    #[test]
    fn countdown_finishes_and_halfway_fires_once() {
        let mut s = session(10);
        s.apply_input(Team::Red);

        let mut halfway = 0;
        let mut finished_at = None;
        for tick in 1.. {
            match s.apply_tick() {
                Some(GameEvent::Halfway { remaining_secs }) => {
                    halfway += 1;
                    assert_eq!(s.snapshot().elapsed_secs, 6);
                    assert_eq!(remaining_secs, 5);
                }
                Some(GameEvent::GameOver { winner }) => {
                    assert_eq!(winner, Team::Red);
                    finished_at = Some(tick);
                    break;
                }
                _ => {}
            }
        }

        assert_eq!(halfway, 1);
        // Ten increments, then the eleventh tick trips the transition.
        assert_eq!(finished_at, Some(11));
        let snap = s.snapshot();
        assert_eq!(snap.phase, Phase::Finished);
        assert_eq!(snap.elapsed_secs, 10);
        assert_eq!(snap.buzzer, BuzzerPhase::EndSignal);
    }

    #[test]
    fn elapsed_is_frozen_outside_active() {
        let mut s = session(10);
        assert_eq!(s.apply_tick(), None);
        assert_eq!(s.snapshot().elapsed_secs, 0);

        s.apply_input(Team::Red);
        for _ in 0..20 {
            s.apply_tick();
        }
        assert_eq!(s.snapshot().phase, Phase::Finished);
        let frozen = s.snapshot().elapsed_secs;
        assert_eq!(s.apply_tick(), None);
        assert_eq!(s.snapshot().elapsed_secs, frozen);
    }

    #[test]
    fn reset_reports_the_pre_reset_winner() {
        let mut s = session(10);
        s.apply_input(Team::Blue);
        while s.snapshot().phase != Phase::Finished {
            s.apply_tick();
        }

        // The event must carry the winner even though the claim clears it.
        let event = s.apply_input(Team::Red);
        assert_eq!(event, Some(GameEvent::Reset { winner: Team::Blue }));

        let snap = s.snapshot();
        assert_eq!(snap.phase, Phase::Idle);
        assert_eq!(snap.owner, None);
        assert_eq!(snap.elapsed_secs, 0);
        assert_eq!(snap.buzzer, BuzzerPhase::Silent);
    }

    #[test]
    fn phase_never_leaves_the_cycle() {
        let mut s = session(5);
        let mut previous = s.phase();
        let inputs = [Team::Red, Team::Blue, Team::Red, Team::Red, Team::Blue];

        for round in 0..4 {
            for &team in &inputs {
                s.apply_input(team);
                assert_valid_edge(previous, s.phase());
                previous = s.phase();
                for _ in 0..=round {
                    s.apply_tick();
                    assert_valid_edge(previous, s.phase());
                    previous = s.phase();
                }
            }
        }
    }

    fn assert_valid_edge(from: Phase, to: Phase) {
        let valid = from == to
            || matches!(
                (from, to),
                (Phase::Idle, Phase::Active)
                    | (Phase::Active, Phase::Finished)
                    | (Phase::Finished, Phase::Idle)
            );
        assert!(valid, "illegal transition {:?} -> {:?}", from, to);
    }
}
