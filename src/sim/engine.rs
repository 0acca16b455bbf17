//! Cascade engine: pops, drop walks, delayed scheduling and game outcome
//!
//! The engine owns the board and a virtual clock. A pop resets its cell, waits
//! out the settle delay, then spawns one drop walk per configured direction.
//! Walks that bounce are re-probed after the bounce delay; walks that land may
//! fire chain pops. Win/loss is only evaluated once nothing is outstanding.
//!
//! Nothing here sleeps. Callers drive time with [`CascadeEngine::step`],
//! [`CascadeEngine::advance`] or [`CascadeEngine::run_until_idle`].

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::board::{Board, GamePhase};
use super::direction::Direction;
use super::error::GameError;
use super::event::{CascadeStats, EventRecord, GameEvent};
use super::schedule::Scheduler;
use super::walk::{DropWalk, Probe};
use crate::consts::MAX_STEPS_PER_RUN;
use crate::settings::{GameConfig, RefundTiming};

/// What caused a pop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PopCause {
    Player,
    Chain,
}

/// Deferred work. `epoch` ties each task to the game that scheduled it.
#[derive(Debug)]
enum Task {
    /// Pop settle elapsed; spawn the drops
    Settle {
        epoch: u64,
        row: usize,
        col: usize,
        cause: PopCause,
    },
    /// Bounce delay elapsed; probe again with the enlarged stride
    Reprobe { epoch: u64, walk: DropWalk },
}

impl Task {
    fn epoch(&self) -> u64 {
        match self {
            Task::Settle { epoch, .. } | Task::Reprobe { epoch, .. } => *epoch,
        }
    }
}

/// Result of a tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// Tap applied immediately
    Applied { value: u32, popped: bool },
    /// A cascade is in flight; the tap runs after it (1-based queue position)
    Queued { position: usize },
}

type Listener = Box<dyn FnMut(&EventRecord)>;

/// Chain-reaction engine for one game at a time
pub struct CascadeEngine {
    config: GameConfig,
    board: Board,
    seed: u64,
    schedule: Scheduler<Task>,
    /// Bumped on every game start; stale tasks are dropped
    epoch: u64,
    /// Settling pops plus in-flight walks
    outstanding: usize,
    /// A tap popped something and the cascade has not completed yet
    cascade_open: bool,
    cascade: CascadeStats,
    totals: CascadeStats,
    taps_taken: u32,
    queued_taps: VecDeque<(usize, usize)>,
    events: Vec<EventRecord>,
    listeners: Vec<Listener>,
}

impl Default for CascadeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CascadeEngine {
    /// Engine with no game started
    pub fn new() -> Self {
        Self {
            config: GameConfig::default(),
            board: Board::default(),
            seed: 0,
            schedule: Scheduler::new(),
            epoch: 0,
            outstanding: 0,
            cascade_open: false,
            cascade: CascadeStats::default(),
            totals: CascadeStats::default(),
            taps_taken: 0,
            queued_taps: VecDeque::new(),
            events: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Start a new game on a randomly filled board
    pub fn start_game(&mut self, config: GameConfig) -> Result<(), GameError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = Pcg32::seed_from_u64(seed);

        let mut board = Board::default();
        board.reset(
            config.height,
            config.width,
            config.min_value,
            config.max_value,
            config.initial_moves,
            &mut rng,
        );
        self.install(config, board, seed);
        Ok(())
    }

    /// Start a new game on a preset board. Grid size is taken from `rows`.
    pub fn start_game_with_values(
        &mut self,
        mut config: GameConfig,
        rows: &[Vec<u32>],
    ) -> Result<(), GameError> {
        let board = Board::from_values(rows, config.initial_moves)?;
        config.height = board.height();
        config.width = board.width();
        config.validate()?;
        if let Some(cell) = board.cells().iter().find(|c| c.value > config.max_value) {
            return Err(GameError::InvalidConfiguration(format!(
                "preset value {} at ({}, {}) exceeds max_value {}",
                cell.value, cell.row, cell.col, config.max_value
            )));
        }
        let seed = config.seed.unwrap_or(0);
        self.install(config, board, seed);
        Ok(())
    }

    fn install(&mut self, config: GameConfig, board: Board, seed: u64) {
        // Anything still scheduled belongs to the old board
        self.epoch += 1;
        self.outstanding = 0;
        self.cascade_open = false;
        self.cascade = CascadeStats::default();
        self.totals = CascadeStats::default();
        self.taps_taken = 0;
        self.queued_taps.clear();

        log::info!(
            "Game started: {}x{} board, {} moves, seed {}",
            board.height(),
            board.width(),
            board.moves_remaining(),
            seed
        );
        self.config = config;
        self.board = board;
        self.seed = seed;
        self.emit(GameEvent::GameStarted {
            height: self.board.height(),
            width: self.board.width(),
            moves: self.board.moves_remaining(),
        });
    }

    /// Player taps a cell. Queued while a cascade is in flight.
    pub fn player_tap(&mut self, row: usize, col: usize) -> Result<TapOutcome, GameError> {
        let phase = self.board.phase();
        if phase != GamePhase::Playing {
            return Err(GameError::NotPlaying(phase));
        }
        if !self.board.contains(row, col) {
            return Err(GameError::out_of_bounds(row, col));
        }

        if !self.is_idle() {
            self.queued_taps.push_back((row, col));
            log::debug!(
                "Tap ({row}, {col}) queued behind cascade ({} waiting)",
                self.queued_taps.len()
            );
            return Ok(TapOutcome::Queued {
                position: self.queued_taps.len(),
            });
        }

        let outcome = self.apply_tap(row, col)?;
        self.settle();
        Ok(outcome)
    }

    fn apply_tap(&mut self, row: usize, col: usize) -> Result<TapOutcome, GameError> {
        self.board.apply_player_move(row, col)?;
        self.taps_taken += 1;
        self.emit(GameEvent::MovesChanged {
            remaining: self.board.moves_remaining(),
        });

        let value = self.increment(row, col)?;
        let popped = value > self.config.max_value;
        if popped {
            self.cascade_open = true;
            self.cascade = CascadeStats::default();
            self.fire_pop(row, col, PopCause::Player);
        }
        Ok(TapOutcome::Applied { value, popped })
    }

    fn increment(&mut self, row: usize, col: usize) -> Result<u32, GameError> {
        let value = self.board.increment(row, col)?;
        self.emit(GameEvent::CellValueChanged { row, col, value });
        Ok(value)
    }

    /// Reset an over-threshold cell and schedule its drops
    fn fire_pop(&mut self, row: usize, col: usize, cause: PopCause) {
        if let Err(err) = self.board.clear(row, col) {
            unreachable!("pop fired at ({row}, {col}): {err}");
        }
        if let Some(cell) = self.board.cell_mut(row, col) {
            cell.is_popping = true;
        }

        self.cascade.pops += 1;
        if cause == PopCause::Chain {
            self.cascade.chain_pops += 1;
        }
        self.outstanding += 1;
        log::debug!("Pop at ({row}, {col}) [{cause:?}]");

        self.emit(GameEvent::CellValueChanged { row, col, value: 0 });
        self.emit(GameEvent::PopStarted { row, col });
        self.schedule.schedule_after(
            self.config.pop_settle_delay_ms,
            Task::Settle {
                epoch: self.epoch,
                row,
                col,
                cause,
            },
        );
    }

    /// Settle elapsed: refund chain pops and release the drops
    fn release_drops(&mut self, row: usize, col: usize, cause: PopCause) {
        if let Some(cell) = self.board.cell_mut(row, col) {
            cell.is_popping = false;
        }
        self.emit(GameEvent::PopEnded { row, col });

        let refund = cause == PopCause::Chain;
        if refund && self.config.refund_timing == RefundTiming::BeforeSpawn {
            self.refund_move();
        }

        // All drops of one pop make their first probe in the same tick
        for heading in self.config.directions.clone() {
            self.outstanding += 1;
            self.cascade.walks_spawned += 1;
            self.probe(DropWalk::spawn(row, col, heading));
        }

        if refund && self.config.refund_timing == RefundTiming::AfterSpawn {
            self.refund_move();
        }
        self.outstanding -= 1;
    }

    fn refund_move(&mut self) {
        self.board.refund_move();
        self.emit(GameEvent::MovesChanged {
            remaining: self.board.moves_remaining(),
        });
    }

    fn probe(&mut self, walk: DropWalk) {
        match walk.probe(&self.board, self.config.bounce_anchor) {
            Probe::OffGrid => {
                log::trace!(
                    "Drop from {:?} heading {} fell off after {} bounces",
                    walk.origin,
                    walk.heading,
                    walk.bounce_extension
                );
                self.cascade.walks_terminated += 1;
                self.outstanding -= 1;
            }
            Probe::Bounce(next) => {
                log::trace!(
                    "Drop from {:?} heading {} bounced (extension {})",
                    walk.origin,
                    walk.heading,
                    next.bounce_extension
                );
                self.cascade.bounces += 1;
                self.start_passage(walk.origin, walk.heading);
                self.schedule.schedule_after(
                    self.config.bounce_delay_ms,
                    Task::Reprobe {
                        epoch: self.epoch,
                        walk: next,
                    },
                );
            }
            Probe::Land { row, col } => {
                let value = match self.increment(row, col) {
                    Ok(value) => value,
                    Err(err) => unreachable!("drop landed at ({row}, {col}): {err}"),
                };
                // Chain pop registers before this walk retires so the cascade stays open
                if value > self.config.max_value {
                    self.fire_pop(row, col, PopCause::Chain);
                }
                self.cascade.walks_resolved += 1;
                self.outstanding -= 1;
            }
        }
    }

    fn start_passage(&mut self, (row, col): (usize, usize), direction: Direction) {
        if let Some(cell) = self.board.cell_mut(row, col) {
            if !cell.active_drops.contains(&direction) {
                cell.active_drops.push(direction);
            }
        }
        self.emit(GameEvent::DropPassageStarted {
            row,
            col,
            direction,
        });
    }

    fn end_passage(&mut self, (row, col): (usize, usize), direction: Direction) {
        if let Some(cell) = self.board.cell_mut(row, col) {
            cell.active_drops.retain(|d| *d != direction);
        }
        self.emit(GameEvent::DropPassageEnded {
            row,
            col,
            direction,
        });
    }

    fn run_task(&mut self, task: Task) {
        if task.epoch() != self.epoch {
            log::trace!("Skipping task from a previous game: {task:?}");
            return;
        }
        match task {
            Task::Settle { row, col, cause, .. } => self.release_drops(row, col, cause),
            Task::Reprobe { walk, .. } => {
                self.end_passage(walk.origin, walk.heading);
                self.probe(walk);
            }
        }
        self.settle();
    }

    /// Close a finished cascade, decide the game, then feed queued taps
    fn settle(&mut self) {
        loop {
            if self.outstanding > 0 || self.board.phase() != GamePhase::Playing {
                return;
            }

            if self.cascade_open {
                self.cascade_open = false;
                let stats = self.cascade;
                self.totals.accumulate(&stats);
                log::debug!(
                    "Cascade complete: {} pops ({} chained), {} drops, {} bounces",
                    stats.pops,
                    stats.chain_pops,
                    stats.walks_spawned,
                    stats.bounces
                );
                self.emit(GameEvent::CascadeCompleted { stats });
            }

            if self.evaluate_outcome() {
                return;
            }

            let Some((row, col)) = self.queued_taps.pop_front() else {
                return;
            };
            if let Err(err) = self.apply_tap(row, col) {
                log::warn!("Dropped queued tap ({row}, {col}): {err}");
            }
        }
    }

    /// Win is checked before loss
    fn evaluate_outcome(&mut self) -> bool {
        let (phase, event) = if self.board.is_won() {
            (GamePhase::Won, GameEvent::GameWon)
        } else if self.board.is_lost() {
            (GamePhase::Lost, GameEvent::GameLost)
        } else {
            return false;
        };

        log::info!(
            "Game over: {:?} after {} taps, {} moves left",
            phase,
            self.taps_taken,
            self.board.moves_remaining()
        );
        self.board.set_phase(phase);
        if !self.queued_taps.is_empty() {
            log::warn!("Discarding {} queued taps", self.queued_taps.len());
            self.queued_taps.clear();
        }
        self.emit(event);
        true
    }

    /// Run the next scheduled task, advancing the clock to it.
    /// Returns false when nothing is scheduled.
    pub fn step(&mut self) -> bool {
        match self.schedule.pop_next() {
            Some(task) => {
                self.run_task(task);
                true
            }
            None => false,
        }
    }

    /// Run everything due within the next `ms` milliseconds
    pub fn advance(&mut self, ms: u64) {
        let until = self.schedule.now_ms().saturating_add(ms);
        while let Some(task) = self.schedule.pop_due(until) {
            self.run_task(task);
        }
        self.schedule.advance_to(until);
    }

    /// Run until the current cascade (and any queued taps) complete.
    /// Returns the number of tasks processed.
    pub fn run_until_idle(&mut self) -> usize {
        let mut steps = 0;
        while !self.is_idle() {
            if steps >= MAX_STEPS_PER_RUN {
                log::warn!(
                    "Cascade still running after {steps} steps ({} outstanding)",
                    self.outstanding
                );
                break;
            }
            if !self.step() {
                break;
            }
            steps += 1;
        }
        steps
    }

    /// Subscribe to every event emitted from now on
    pub fn subscribe(&mut self, listener: impl FnMut(&EventRecord) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&mut self, event: GameEvent) {
        let record = EventRecord {
            at_ms: self.schedule.now_ms(),
            event,
        };
        for listener in &mut self.listeners {
            listener(&record);
        }
        self.events.push(record);
    }

    /// Take the events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.events)
    }

    /// Events recorded since the last drain
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// No pop settling and no drop in flight
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.outstanding == 0
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[inline]
    pub fn phase(&self) -> GamePhase {
        self.board.phase()
    }

    /// Seed the current board was filled with
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.schedule.now_ms()
    }

    /// Fire time of the next scheduled task (may belong to a previous game)
    pub fn next_wakeup_ms(&self) -> Option<u64> {
        self.schedule.next_fire_ms()
    }

    /// Settling pops plus in-flight drops
    #[inline]
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn queued_taps(&self) -> usize {
        self.queued_taps.len()
    }

    /// Counters of the running (or last) cascade
    pub fn cascade_stats(&self) -> CascadeStats {
        self.cascade
    }

    /// Counters of every completed cascade this game
    pub fn total_stats(&self) -> CascadeStats {
        self.totals
    }

    pub fn taps_taken(&self) -> u32 {
        self.taps_taken
    }
}
