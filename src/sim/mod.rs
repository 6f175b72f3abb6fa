//! Simulation module
//!
//! All gameplay logic lives here:
//! - One tick per frame, velocities in units per frame
//! - Seeded RNG only
//! - Insertion-ordered groups, removal in whole-group passes
//! - No platform dependencies; drawing goes through `DrawSurface`

pub mod behavior;
pub mod collision;
pub mod effect;
pub mod entity;
pub mod group;
pub mod machine;
pub mod pool;
pub mod spawn;
pub mod state;
pub mod tick;

pub use behavior::{FrameContext, KeyState};
pub use collision::{MONITORED_PAIRS, check_collisions, circles_overlap};
pub use effect::{Effect, SpawnRequest};
pub use entity::{Entity, EntityId, EntityKind, IdAllocator, asteroid_score};
pub use group::{EntityGroups, Group};
pub use machine::{
    MachineState, PendingTransition, StateMachine, TRANSITIONS, TransitionRecord, can_transition,
};
pub use pool::{BulletConfig, BulletPool, ParticleConfig, ParticlePool, Pool, PoolStats, Poolable};
pub use spawn::{SpawnKind, SpawnScheduler, spawn_asteroids};
pub use state::World;
pub use tick::{TickInput, tick};
