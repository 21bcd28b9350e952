//! The playing grid and its chain-reaction propagation.
//!
//! A cell holds pieces up to its capacity (the number of orthogonal
//! neighbours it has). Going over capacity resets the cell to one piece and
//! hands one piece to every neighbour, whoever owned it, which may overflow
//! in turn.

use protocol::{TeamId, UNCLAIMED};

/// A grid position, `x` is the column and `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Convert wire coordinates, rejecting negatives.
    pub fn from_wire(x: i32, y: i32) -> Option<Self> {
        Some(Self {
            x: usize::try_from(x).ok()?,
            y: usize::try_from(y).ok()?,
        })
    }
}

/// One square of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub owner: TeamId,
    pub count: u32,
    /// Position in the color registry. Always the owner's color.
    pub color_index: usize,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            owner: UNCLAIMED,
            count: 1,
            color_index: 0,
        }
    }
}

/// What a single move did to the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cascade {
    /// Every position that received a piece, in the order it was processed.
    pub visits: Vec<Position>,
    /// How many of those visits overflowed.
    pub overflows: usize,
    /// The cascade stopped early because the mover owns every cell.
    pub conquered: bool,
}

/// A square grid of cells with fixed dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
    /// Cells owned per team, indexed by team id.
    claimed: Vec<usize>,
}

impl Board {
    /// Create a board of `size` x `size` unclaimed cells.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::default(); size * size],
            claimed: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x < self.size && pos.y < self.size
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        if self.in_bounds(pos) {
            Some(&self.cells[self.index(pos)])
        } else {
            None
        }
    }

    /// Rows of cells, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        // `max(1)` keeps `chunks` happy on an empty board.
        self.cells.chunks(self.size.max(1))
    }

    /// Pieces a cell holds before it overflows: 2 in corners, 3 on edges,
    /// 4 elsewhere.
    pub fn capacity(&self, pos: Position) -> u32 {
        let mut capacity = 4;
        if pos.x == 0 || pos.x + 1 == self.size {
            capacity -= 1;
        }
        if pos.y == 0 || pos.y + 1 == self.size {
            capacity -= 1;
        }
        capacity
    }

    /// A team may play on an unclaimed cell or one it already owns.
    pub fn is_valid_move(&self, pos: Position, team: TeamId) -> bool {
        self.cell(pos)
            .is_some_and(|cell| cell.owner == UNCLAIMED || cell.owner == team)
    }

    /// Number of cells `team` owns.
    pub fn claimed_by(&self, team: TeamId) -> usize {
        self.claimed.get(team as usize).copied().unwrap_or(0)
    }

    /// True when `team` owns every cell.
    pub fn is_conquered_by(&self, team: TeamId) -> bool {
        team != UNCLAIMED && self.claimed_by(team) == self.cells.len()
    }

    /// Place a piece for `team` at `pos` and resolve the chain reaction.
    ///
    /// The caller checks [`is_valid_move`](Self::is_valid_move) first; this
    /// only requires `pos` to be in bounds. Overflowing cells push their
    /// neighbours down, right, left, up onto a stack, so the up neighbour is
    /// processed first. The cascade ends when the stack drains or the mover
    /// owns the whole board; past that point every pop would only shuffle
    /// the mover's own pieces, and a saturated board would never drain.
    pub fn apply_move(&mut self, pos: Position, team: TeamId) -> Cascade {
        debug_assert!(self.in_bounds(pos), "move outside the board: {:?}", pos);
        let mut cascade = Cascade::default();
        if !self.in_bounds(pos) {
            return cascade;
        }

        let mut stack = vec![pos];
        while let Some(pos) = stack.pop() {
            self.claim(pos, team);
            cascade.visits.push(pos);

            let index = self.index(pos);
            self.cells[index].count += 1;
            if self.cells[index].count > self.capacity(pos) {
                self.cells[index].count = 1;
                cascade.overflows += 1;
                if pos.y + 1 < self.size {
                    stack.push(Position::new(pos.x, pos.y + 1));
                }
                if pos.x + 1 < self.size {
                    stack.push(Position::new(pos.x + 1, pos.y));
                }
                if pos.x > 0 {
                    stack.push(Position::new(pos.x - 1, pos.y));
                }
                if pos.y > 0 {
                    stack.push(Position::new(pos.x, pos.y - 1));
                }
            }

            if !stack.is_empty() && self.is_conquered_by(team) {
                cascade.conquered = true;
                break;
            }
        }
        cascade
    }

    #[inline]
    fn index(&self, pos: Position) -> usize {
        pos.y * self.size + pos.x
    }

    fn claim(&mut self, pos: Position, team: TeamId) {
        let index = self.index(pos);
        let previous = self.cells[index].owner;
        if previous == team {
            return;
        }
        if previous != UNCLAIMED {
            self.claimed[previous as usize] -= 1;
        }
        if self.claimed.len() <= team as usize {
            self.claimed.resize(team as usize + 1, 0);
        }
        self.claimed[team as usize] += 1;

        let cell = &mut self.cells[index];
        cell.owner = team;
        cell.color_index = team as usize;
    }

    /// Overwrite a cell, keeping the ownership tally consistent.
    #[cfg(test)]
    pub(crate) fn seed(&mut self, pos: Position, owner: TeamId, count: u32) {
        if owner != UNCLAIMED {
            self.claim(pos, owner);
        }
        let index = self.index(pos);
        self.cells[index].count = count;
    }
}
