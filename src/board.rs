//! Board representation for Squava
//!
//! The board is a 5x5 grid of trinary cells: `0` for empty, `+1` for a
//! [`Player::Max`] mark and `-1` for a [`Player::Min`] mark. Storing the
//! marks as signed integers lets line detection work on plain sums: a
//! line summing to `±len` is fully owned by one side.

use std::fmt;

/// Side length of the board
pub const SIZE: usize = 5;

/// Number of cells on the board
pub const CELLS: usize = SIZE * SIZE;

/// Cell value of an empty square
pub const EMPTY: i8 = 0;

/// The two sides of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Player {
    /// The maximizing side, marks as `+1` (`X`); moves first
    #[default]
    Max,
    /// The minimizing side, marks as `-1` (`O`)
    Min,
}

impl Player {
    /// Returns `+1` for [`Player::Max`] and `-1` for [`Player::Min`]
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Player::Max => 1,
            Player::Min => -1,
        }
    }

    /// Returns the cell value this player writes into the board
    #[inline]
    pub fn mark(self) -> i8 {
        self.sign() as i8
    }

    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::Max => Player::Min,
            Player::Min => Player::Max,
        }
    }

    /// Maps a non-zero cell value back to its owner
    #[inline]
    pub fn from_mark(mark: i8) -> Option<Player> {
        match mark {
            1 => Some(Player::Max),
            -1 => Some(Player::Min),
            _ => None,
        }
    }
}

/// Position on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Coord {
    pub row: u8,
    pub col: u8,
}

impl Coord {
    #[inline]
    pub fn new(row: u8, col: u8) -> Self {
        debug_assert!((row as usize) < SIZE && (col as usize) < SIZE);
        Self { row, col }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.row as usize * SIZE + self.col as usize
    }

    #[inline]
    pub fn from_index(idx: usize) -> Self {
        debug_assert!(idx < CELLS);
        Self {
            row: (idx / SIZE) as u8,
            col: (idx % SIZE) as u8,
        }
    }

    /// Returns the coordinate offset by `(dr, dc)` if it stays on the board
    pub fn offset(self, dr: i32, dc: i32) -> Option<Coord> {
        let row = self.row as i32 + dr;
        let col = self.col as i32 + dc;
        if (0..SIZE as i32).contains(&row) && (0..SIZE as i32).contains(&col) {
            Some(Coord::new(row as u8, col as u8))
        } else {
            None
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A fixed-capacity list of moves
///
/// Searches build one of these per node, so it lives on the stack instead
/// of allocating a `Vec` for every recursion step.
#[derive(Clone, Copy)]
pub struct MoveList {
    cells: [Coord; CELLS],
    len: usize,
}

impl MoveList {
    pub fn new() -> Self {
        Self {
            cells: [Coord::default(); CELLS],
            len: 0,
        }
    }

    /// Appends a move. Lists never hold more than one entry per cell.
    #[inline]
    pub fn push(&mut self, cell: Coord) {
        debug_assert!(self.len < CELLS);
        self.cells[self.len] = cell;
        self.len += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[Coord] {
        &self.cells[..self.len]
    }

    pub fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
        self.as_slice().iter().copied()
    }

    pub fn contains(&self, cell: Coord) -> bool {
        self.as_slice().contains(&cell)
    }

    /// Removes the move at `index`; the last move takes its slot.
    pub fn swap_remove(&mut self, index: usize) -> Coord {
        debug_assert!(index < self.len);
        let cell = self.cells[index];
        self.len -= 1;
        self.cells[index] = self.cells[self.len];
        cell
    }
}

impl FromIterator<Coord> for MoveList {
    fn from_iter<I: IntoIterator<Item = Coord>>(iter: I) -> Self {
        let mut moves = MoveList::new();
        moves.extend(iter);
        moves
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MoveList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl Extend<Coord> for MoveList {
    fn extend<I: IntoIterator<Item = Coord>>(&mut self, iter: I) {
        for cell in iter {
            self.push(cell);
        }
    }
}

/// Game board
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [i8; CELLS],
    filled: u8,
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [EMPTY; CELLS],
            filled: 0,
        }
    }

    /// Parses a board from five rows of `X`, `O` and `.` (or `_`).
    ///
    /// Whitespace inside a row is ignored, so `"X . O . ."` and `"X.O.."`
    /// describe the same row. Returns `None` for malformed input.
    pub fn from_rows(rows: &[&str]) -> Option<Self> {
        if rows.len() != SIZE {
            return None;
        }
        let mut board = Board::new();
        for (r, row) in rows.iter().enumerate() {
            let marks: Vec<char> = row.chars().filter(|c| !c.is_whitespace()).collect();
            if marks.len() != SIZE {
                return None;
            }
            for (c, mark) in marks.into_iter().enumerate() {
                let cell = Coord::new(r as u8, c as u8);
                match mark {
                    'X' | 'x' => board.set(cell, Player::Max),
                    'O' | 'o' => board.set(cell, Player::Min),
                    '.' | '_' => {}
                    _ => return None,
                }
            }
        }
        Some(board)
    }

    /// Returns the raw cell value (`-1`, `0` or `1`)
    #[inline]
    pub fn get(&self, cell: Coord) -> i8 {
        self.cells[cell.index()]
    }

    /// Returns the raw cell value by flat index
    #[inline]
    pub fn at(&self, idx: usize) -> i8 {
        self.cells[idx]
    }

    /// Returns the owner of a cell, if any
    #[inline]
    pub fn mark(&self, cell: Coord) -> Option<Player> {
        Player::from_mark(self.get(cell))
    }

    #[inline]
    pub fn is_empty(&self, cell: Coord) -> bool {
        self.get(cell) == EMPTY
    }

    /// Writes a mark into an empty cell
    #[inline]
    pub fn set(&mut self, cell: Coord, player: Player) {
        debug_assert!(self.is_empty(cell), "cell {} already occupied", cell);
        self.cells[cell.index()] = player.mark();
        self.filled += 1;
    }

    /// Empties an occupied cell
    #[inline]
    pub fn clear(&mut self, cell: Coord) {
        debug_assert!(!self.is_empty(cell), "cell {} already empty", cell);
        self.cells[cell.index()] = EMPTY;
        self.filled -= 1;
    }

    /// Number of occupied cells
    #[inline]
    pub fn filled(&self) -> usize {
        self.filled as usize
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.filled as usize == CELLS
    }

    /// All empty cells in row-major order
    pub fn empty_cells(&self) -> MoveList {
        let mut moves = MoveList::new();
        moves.extend(
            (0..CELLS)
                .filter(|&idx| self.cells[idx] == EMPTY)
                .map(Coord::from_index),
        );
        moves
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board(\"{}\")", self)
    }
}

/// Compact single-line form, rows separated by `/`
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..SIZE {
            if row > 0 {
                write!(f, "/")?;
            }
            for col in 0..SIZE {
                let mark = match self.cells[row * SIZE + col] {
                    1 => 'X',
                    -1 => 'O',
                    _ => '.',
                };
                write!(f, "{}", mark)?;
            }
        }
        Ok(())
    }
}
