//! Drop walks: one directional probe spawned by a pop
//!
//! A walk probes `position + step`. An empty target is a bounce: the step
//! grows by one unit on each non-zero axis and the walk probes again later
//! from the same anchor. A non-empty target is where the drop lands. A target
//! off the grid ends the walk.

use glam::IVec2;

use super::board::Board;
use super::direction::{Direction, enlarge};
use crate::settings::BounceAnchor;

/// In-flight drop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropWalk {
    /// Cell whose pop spawned this walk
    pub origin: (usize, usize),
    /// Configured direction the walk was spawned with
    pub heading: Direction,
    /// Probe anchor (grid space)
    pub position: IVec2,
    /// Current offset, grows while bouncing
    pub step: IVec2,
    /// Empty cells skipped so far
    pub bounce_extension: u32,
}

/// Result of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Target is off the grid; the walk ends without touching the board
    OffGrid,
    /// Target is empty; continue with this walk after the bounce delay
    Bounce(DropWalk),
    /// Target holds a value; the drop lands there
    Land { row: usize, col: usize },
}

impl DropWalk {
    /// Fresh walk leaving `(row, col)` along `heading`
    pub fn spawn(row: usize, col: usize, heading: Direction) -> Self {
        Self {
            origin: (row, col),
            heading,
            position: IVec2::new(col as i32, row as i32),
            step: heading.offset(),
            bounce_extension: 0,
        }
    }

    /// Grid position this walk will probe next
    #[inline]
    pub fn target(&self) -> IVec2 {
        self.position + self.step
    }

    /// Probe the board. Reads only; landing is applied by the caller.
    pub fn probe(&self, board: &Board, anchor: BounceAnchor) -> Probe {
        self.check_invariant(anchor);

        let target = self.target();
        let Some((row, col)) = board.locate(target) else {
            return Probe::OffGrid;
        };

        if board.value(row, col) != Some(0) {
            return Probe::Land { row, col };
        }

        let next = match anchor {
            BounceAnchor::Origin => DropWalk {
                step: enlarge(self.step),
                bounce_extension: self.bounce_extension + 1,
                ..*self
            },
            BounceAnchor::Advance => DropWalk {
                position: target,
                bounce_extension: self.bounce_extension + 1,
                ..*self
            },
        };
        Probe::Bounce(next)
    }

    fn check_invariant(&self, anchor: BounceAnchor) {
        let stride = self.bounce_extension as i32 + 1;
        match anchor {
            BounceAnchor::Origin => assert_eq!(
                self.step,
                self.heading.offset() * stride,
                "drop step out of sync with bounce extension"
            ),
            BounceAnchor::Advance => {
                assert_eq!(self.step, self.heading.offset(), "advancing drop changed its step");
                assert_eq!(
                    self.position,
                    IVec2::new(self.origin.1 as i32, self.origin.0 as i32)
                        + self.heading.offset() * (stride - 1),
                    "advancing drop left its line"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[u32]) -> Board {
        let rows: Vec<Vec<u32>> = values.iter().map(|&v| vec![v]).collect();
        Board::from_values(&rows, 10).unwrap()
    }

    #[test]
    fn test_edge_walk_terminates_in_one_probe() {
        let board = Board::from_values(&[vec![3, 3], vec![3, 3]], 1).unwrap();
        let before = board.rows();
        let walk = DropWalk::spawn(0, 0, Direction::TOP);
        assert_eq!(walk.probe(&board, BounceAnchor::Origin), Probe::OffGrid);
        let walk = DropWalk::spawn(1, 1, Direction::RIGHT);
        assert_eq!(walk.probe(&board, BounceAnchor::Origin), Probe::OffGrid);
        assert_eq!(board.rows(), before);
    }

    #[test]
    fn test_lands_on_neighbor() {
        let board = column(&[0, 2]);
        let walk = DropWalk::spawn(0, 0, Direction::BOTTOM);
        assert_eq!(
            walk.probe(&board, BounceAnchor::Origin),
            Probe::Land { row: 1, col: 0 }
        );
    }

    #[test]
    fn test_stride_grows_over_empty_run() {
        // Pop origin at row 0, three empty cells, then a value
        let board = column(&[0, 0, 0, 0, 7]);
        let mut walk = DropWalk::spawn(0, 0, Direction::BOTTOM);
        let mut extensions = Vec::new();

        let landing = loop {
            match walk.probe(&board, BounceAnchor::Origin) {
                Probe::Bounce(next) => {
                    // Anchor never moves, only the stride grows
                    assert_eq!(next.position, walk.position);
                    extensions.push(next.bounce_extension);
                    walk = next;
                }
                other => break other,
            }
        };

        assert_eq!(extensions, vec![1, 2, 3]);
        assert_eq!(walk.step, IVec2::new(0, 4));
        assert_eq!(landing, Probe::Land { row: 4, col: 0 });
    }

    #[test]
    fn test_empty_run_to_edge_terminates() {
        let board = column(&[0, 0, 0]);
        let mut walk = DropWalk::spawn(0, 0, Direction::BOTTOM);
        let mut bounces = 0;
        while let Probe::Bounce(next) = walk.probe(&board, BounceAnchor::Origin) {
            bounces += 1;
            walk = next;
        }
        assert_eq!(bounces, 2);
        assert_eq!(walk.probe(&board, BounceAnchor::Origin), Probe::OffGrid);
    }

    #[test]
    fn test_diagonal_grows_both_axes() {
        let board = Board::from_values(&[vec![0, 0, 0], vec![0, 0, 0], vec![0, 0, 1]], 1).unwrap();
        let walk = DropWalk::spawn(0, 0, Direction::BOTTOM_RIGHT);
        let Probe::Bounce(next) = walk.probe(&board, BounceAnchor::Origin) else {
            panic!("expected bounce over (1, 1)");
        };
        assert_eq!(next.step, IVec2::new(2, 2));
        assert_eq!(
            next.probe(&board, BounceAnchor::Origin),
            Probe::Land { row: 2, col: 2 }
        );
    }

    #[test]
    fn test_advance_anchor_walks_cell_by_cell() {
        let board = column(&[0, 0, 0, 5]);
        let walk = DropWalk::spawn(0, 0, Direction::BOTTOM);
        let Probe::Bounce(next) = walk.probe(&board, BounceAnchor::Advance) else {
            panic!("expected bounce");
        };
        assert_eq!(next.position, IVec2::new(0, 1));
        assert_eq!(next.step, Direction::BOTTOM.offset());
        let Probe::Bounce(next) = next.probe(&board, BounceAnchor::Advance) else {
            panic!("expected bounce");
        };
        assert_eq!(next.bounce_extension, 2);
        assert_eq!(
            next.probe(&board, BounceAnchor::Advance),
            Probe::Land { row: 3, col: 0 }
        );
    }

    #[test]
    #[should_panic(expected = "drop step out of sync")]
    fn test_corrupt_walk_fails_loudly() {
        let board = column(&[0, 1]);
        let mut walk = DropWalk::spawn(0, 0, Direction::BOTTOM);
        walk.bounce_extension = 3;
        walk.probe(&board, BounceAnchor::Origin);
    }
}
