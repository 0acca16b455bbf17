//! Bubble Pop - A chain-reaction grid puzzle
//!
//! Core modules:
//! - `sim`: Deterministic simulation (board, drop walks, cascade scheduling)
//! - `settings`: Game configuration (defaults, validation, JSON loading)

pub mod settings;
pub mod sim;

pub use settings::{BounceAnchor, GameConfig, RefundTiming, SettingsError};
pub use sim::{
    Board, CascadeEngine, CascadeStats, Cell, Direction, EventRecord, GameError, GameEvent,
    GamePhase, TapOutcome,
};

/// Game configuration constants
pub mod consts {
    /// Default grid dimensions
    pub const DEFAULT_WIDTH: usize = 5;
    pub const DEFAULT_HEIGHT: usize = 5;

    /// Random fill range (inclusive). `MAX_VALUE` is also the pop threshold.
    pub const DEFAULT_MIN_VALUE: u32 = 0;
    pub const DEFAULT_MAX_VALUE: u32 = 4;

    /// Move budget at game start
    pub const DEFAULT_INITIAL_MOVES: u32 = 1000;

    /// Delay between a bounce and the enlarged re-probe (ms)
    pub const DEFAULT_BOUNCE_DELAY_MS: u64 = 170;
    /// Delay between a pop and the spawn of its drops (ms)
    pub const DEFAULT_POP_SETTLE_DELAY_MS: u64 = 500;

    /// Maximum scheduled tasks processed by one `run_until_idle` call
    pub const MAX_STEPS_PER_RUN: usize = 100_000;
}
