//! Events published to renderers and other observers

use serde::{Deserialize, Serialize};

use super::direction::Direction;

/// Something observable happened on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    GameStarted {
        height: usize,
        width: usize,
        moves: u32,
    },
    CellValueChanged {
        row: usize,
        col: usize,
        value: u32,
    },
    MovesChanged {
        remaining: u32,
    },
    /// Opens the pop-settle window of a cell
    PopStarted { row: usize, col: usize },
    /// Closes the pop-settle window; drops spawn right after
    PopEnded { row: usize, col: usize },
    /// A drop leaving `(row, col)` is crossing an empty stretch
    DropPassageStarted {
        row: usize,
        col: usize,
        direction: Direction,
    },
    DropPassageEnded {
        row: usize,
        col: usize,
        direction: Direction,
    },
    /// Every pop and drop of the current cascade has finished
    CascadeCompleted { stats: CascadeStats },
    GameWon,
    GameLost,
}

/// An event stamped with the virtual time it happened at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: GameEvent,
}

/// Counters for one cascade (or a whole game when accumulated)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeStats {
    /// Pops of any cause
    pub pops: u32,
    /// Pops caused by landing drops (each refunded one move)
    pub chain_pops: u32,
    pub walks_spawned: u32,
    pub walks_resolved: u32,
    pub walks_terminated: u32,
    pub bounces: u32,
}

impl CascadeStats {
    pub fn accumulate(&mut self, other: &CascadeStats) {
        self.pops += other.pops;
        self.chain_pops += other.chain_pops;
        self.walks_spawned += other.walks_spawned;
        self.walks_resolved += other.walks_resolved;
        self.walks_terminated += other.walks_terminated;
        self.bounces += other.bounces;
    }
}
