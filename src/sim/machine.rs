//! Game phase state machine
//!
//! Every legal move is listed in `TRANSITIONS`. Pause is a shortcut between
//! PLAYING and PAUSED that skips the table lookup but not the bookkeeping.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

/// Transitions kept in the history ring
pub const HISTORY_CAPACITY: usize = 10;

/// How long `is_transitioning` stays raised after a commit
pub const SETTLE_MS: f64 = 300.0;

/// Game phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MachineState {
    #[default]
    Initial,
    ReadyToPlay,
    Playing,
    Paused,
    GameOver,
}

impl MachineState {
    pub const ALL: [MachineState; 5] = [
        MachineState::Initial,
        MachineState::ReadyToPlay,
        MachineState::Playing,
        MachineState::Paused,
        MachineState::GameOver,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MachineState::Initial => "INITIAL",
            MachineState::ReadyToPlay => "READY_TO_PLAY",
            MachineState::Playing => "PLAYING",
            MachineState::Paused => "PAUSED",
            MachineState::GameOver => "GAME_OVER",
        }
    }
}

/// Static adjacency table
pub const TRANSITIONS: [(MachineState, MachineState); 7] = [
    (MachineState::Initial, MachineState::ReadyToPlay),
    (MachineState::ReadyToPlay, MachineState::Playing),
    (MachineState::Playing, MachineState::Paused),
    (MachineState::Playing, MachineState::GameOver),
    (MachineState::Paused, MachineState::Playing),
    (MachineState::GameOver, MachineState::ReadyToPlay),
    (MachineState::GameOver, MachineState::Initial),
];

pub fn can_transition(from: MachineState, to: MachineState) -> bool {
    TRANSITIONS.contains(&(from, to))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: MachineState,
    pub to: MachineState,
    pub timestamp: f64,
}

/// A validated transition waiting for its commit time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingTransition {
    pub to: MachineState,
    pub commit_at: f64,
}

#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    state: MachineState,
    history: VecDeque<TransitionRecord>,
    pending: Option<PendingTransition>,
    settle_until: f64,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> MachineState {
        self.state
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == MachineState::Playing
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.state == MachineState::Paused
    }

    /// True while a delayed transition is pending or a commit is still settling
    pub fn is_transitioning(&self, now: f64) -> bool {
        self.pending.is_some() || now < self.settle_until
    }

    /// Oldest first
    pub fn history(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.history.iter()
    }

    pub fn pending(&self) -> Option<PendingTransition> {
        self.pending
    }

    fn ensure_idle(&self) -> Result<(), TransitionError> {
        match self.pending {
            Some(p) => Err(TransitionError::TransitionInProgress { pending: p.to }),
            None => Ok(()),
        }
    }

    fn validate(&self, to: MachineState) -> Result<(), TransitionError> {
        if can_transition(self.state, to) {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition {
                from: self.state,
                to,
            })
        }
    }

    fn commit(&mut self, to: MachineState, now: f64) {
        let from = self.state;
        self.state = to;
        self.settle_until = now + SETTLE_MS;
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(TransitionRecord {
            from,
            to,
            timestamp: now,
        });
        log::info!("State {} -> {}", from.as_str(), to.as_str());
    }

    /// Move to `to` immediately; the state is unchanged on error
    pub fn set_state(&mut self, to: MachineState, now: f64) -> Result<(), TransitionError> {
        self.ensure_idle()?;
        self.validate(to)?;
        self.commit(to, now);
        Ok(())
    }

    /// Pause or resume. Returns false if already in the requested state.
    pub fn set_pause(&mut self, paused: bool, now: f64) -> Result<bool, TransitionError> {
        self.ensure_idle()?;
        match (self.state, paused) {
            (MachineState::Playing, true) => {
                self.commit(MachineState::Paused, now);
                Ok(true)
            }
            (MachineState::Paused, false) => {
                self.commit(MachineState::Playing, now);
                Ok(true)
            }
            (MachineState::Paused, true) | (MachineState::Playing, false) => Ok(false),
            (state, _) => Err(TransitionError::PauseUnavailable { state }),
        }
    }

    /// Validate now, commit on the first `poll` at or after `now + delay_ms`
    pub fn start_transition(
        &mut self,
        to: MachineState,
        delay_ms: f64,
        now: f64,
    ) -> Result<(), TransitionError> {
        self.ensure_idle()?;
        self.validate(to)?;
        self.pending = Some(PendingTransition {
            to,
            commit_at: now + delay_ms.max(0.0),
        });
        Ok(())
    }

    /// Commit a due pending transition, returning the new state
    pub fn poll(&mut self, now: f64) -> Option<MachineState> {
        let pending = self.pending?;
        if now < pending.commit_at {
            return None;
        }
        self.pending = None;
        self.commit(pending.to, now);
        Some(pending.to)
    }

    pub fn cancel_transition(&mut self) -> Option<PendingTransition> {
        self.pending.take()
    }

    /// Jump to GAME_OVER from anywhere, dropping any pending transition
    pub fn force_game_over(&mut self, now: f64) {
        self.pending = None;
        if self.state == MachineState::GameOver {
            return;
        }
        log::warn!("Forcing {} -> GAME_OVER", self.state.as_str());
        self.commit(MachineState::GameOver, now);
    }
}
