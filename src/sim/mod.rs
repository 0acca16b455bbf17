//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Virtual clock only (delays are scheduler entries, never sleeps)
//! - Seeded RNG only
//! - Stable ordering of tasks scheduled for the same instant
//! - No rendering or platform dependencies

pub mod board;
pub mod direction;
pub mod engine;
pub mod error;
pub mod event;
pub mod schedule;
pub mod walk;

pub use board::{Board, Cell, GamePhase};
pub use direction::Direction;
pub use engine::{CascadeEngine, TapOutcome};
pub use error::GameError;
pub use event::{CascadeStats, EventRecord, GameEvent};
pub use schedule::Scheduler;
pub use walk::{DropWalk, Probe};
