//! Error types
//!
//! Only state-machine misuse and engine API misuse reach the caller. Entity
//! faults are absorbed by the frame loop and only logged.

use crate::sim::{EntityId, Group, MachineState};

/// Illegal or concurrent state-machine transitions
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("invalid transition {from:?} -> {to:?}")]
    InvalidTransition { from: MachineState, to: MachineState },

    #[error("transition to {pending:?} already in flight")]
    TransitionInProgress { pending: MachineState },

    #[error("pause is only available while playing or paused (current state {state:?})")]
    PauseUnavailable { state: MachineState },
}

/// Engine API errors
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("no drawing surface bound")]
    NoSurface,

    #[error("entity has no id assigned")]
    MissingId,

    #[error("entity {0:?} already belongs to a group")]
    DuplicateId(EntityId),

    #[error("entity id {0:?} leaves no room for later ids")]
    IdExhausted(EntityId),

    #[error("entity {id:?} not found in group {group:?}")]
    NotFound { id: EntityId, group: Group },

    #[error("{kind} entity cannot join group {group:?}")]
    WrongGroup { kind: &'static str, group: Group },
}

/// A single entity failed its update step
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EntityFault {
    #[error("entity {id:?} has a non-finite position or velocity")]
    NonFinite { id: EntityId },

    #[error("entity {id:?} has a degenerate radius {radius}")]
    Degenerate { id: EntityId, radius: f32 },
}

/// Configuration load/save errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
