//! Winning-quad and losing-triplet line tables
//!
//! Squava is won by owning four cells in a row and lost by owning three.
//! Every such line on the 5x5 board is generated once, then indexed by the
//! cells it passes through. Given the cell a move was just played on,
//! detection only needs to look at the handful of lines through that cell
//! instead of the whole catalogue.

use std::sync::OnceLock;

use crate::board::{Board, Coord, Player, CELLS};

/// Directions a line can run in: right, down, down-right, down-left
const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Every line in the catalogue passes through at least one of these cells,
/// so whole-board scans can start from them alone.
pub const COVERING_CELLS: [Coord; 9] = [
    Coord { row: 0, col: 2 },
    Coord { row: 1, col: 2 },
    Coord { row: 2, col: 0 },
    Coord { row: 2, col: 1 },
    Coord { row: 2, col: 2 },
    Coord { row: 2, col: 3 },
    Coord { row: 2, col: 4 },
    Coord { row: 3, col: 2 },
    Coord { row: 4, col: 2 },
];

/// A straight run of `N` cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Line<const N: usize> {
    /// Position of this line in its catalogue
    pub id: u8,
    pub cells: [Coord; N],
}

/// Four in a row: completing one wins
pub type Quad = Line<4>;

/// Three in a row: completing one loses
pub type Triplet = Line<3>;

impl<const N: usize> Line<N> {
    /// Sums the cell values along the line
    #[inline]
    pub fn sum(&self, board: &Board) -> i32 {
        self.cells.iter().map(|&c| board.get(c) as i32).sum()
    }

    /// Returns the player owning every cell of the line, if any
    #[inline]
    pub fn owner(&self, board: &Board) -> Option<Player> {
        match self.sum(board) {
            s if s == N as i32 => Some(Player::Max),
            s if s == -(N as i32) => Some(Player::Min),
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, cell: Coord) -> bool {
        self.cells.contains(&cell)
    }

    /// Step between consecutive cells
    fn direction(&self) -> (i32, i32) {
        (
            self.cells[1].row as i32 - self.cells[0].row as i32,
            self.cells[1].col as i32 - self.cells[0].col as i32,
        )
    }

    /// True if the line cannot be extended at either end
    pub fn is_capped(&self) -> bool {
        let (dr, dc) = self.direction();
        self.cells[0].offset(-dr, -dc).is_none() && self.cells[N - 1].offset(dr, dc).is_none()
    }
}

/// Generates every `N`-cell line on the board in row-major start order
pub fn generate<const N: usize>() -> Vec<Line<N>> {
    let mut lines = Vec::new();
    for start in 0..CELLS {
        let origin = Coord::from_index(start);
        for &(dr, dc) in &DIRECTIONS {
            let mut cells = [origin; N];
            let fits = (1..N).all(|k| match origin.offset(dr * k as i32, dc * k as i32) {
                Some(cell) => {
                    cells[k] = cell;
                    true
                }
                None => false,
            });
            if fits {
                lines.push(Line {
                    id: lines.len() as u8,
                    cells,
                });
            }
        }
    }
    lines
}

/// Lines passing through a single cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellLines {
    pub wins: Vec<Quad>,
    pub losses: Vec<Triplet>,
}

/// Maps each board cell to the lines through it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    cells: [CellLines; CELLS],
}

impl LineIndex {
    /// Builds the per-cell index from a catalogue.
    ///
    /// This is a pure transform: rebuilding from the same catalogue always
    /// yields an equal index, with each line listed once per cell it covers.
    pub fn build(quads: &[Quad], triplets: &[Triplet]) -> Self {
        let mut cells: [CellLines; CELLS] = std::array::from_fn(|_| CellLines::default());
        for quad in quads {
            for cell in quad.cells {
                cells[cell.index()].wins.push(*quad);
            }
        }
        for triplet in triplets {
            for cell in triplet.cells {
                cells[cell.index()].losses.push(*triplet);
            }
        }
        LineIndex { cells }
    }

    #[inline]
    pub fn at(&self, cell: Coord) -> &CellLines {
        &self.cells[cell.index()]
    }
}

/// The full, immutable line catalogue plus its derived lookups
#[derive(Debug)]
pub struct LineTables {
    pub quads: Vec<Quad>,
    pub triplets: Vec<Triplet>,
    pub index: LineIndex,
    /// Triplets not contained in any quad: owning two of them can never lead
    /// anywhere but a loss.
    pub dead_triplets: Vec<Triplet>,
    /// Quads that cannot extend at either end (the four short diagonals)
    pub capped_quads: Vec<Quad>,
}

impl LineTables {
    fn new() -> Self {
        let quads = generate::<4>();
        let triplets = generate::<3>();
        let index = LineIndex::build(&quads, &triplets);
        let dead_triplets = triplets
            .iter()
            .filter(|t| {
                !quads
                    .iter()
                    .any(|q| t.cells.iter().all(|&cell| q.contains(cell)))
            })
            .copied()
            .collect();
        let capped_quads = quads.iter().filter(|q| q.is_capped()).copied().collect();
        log::trace!(
            "built line tables: {} quads, {} triplets",
            quads.len(),
            triplets.len()
        );
        LineTables {
            quads,
            triplets,
            index,
            dead_triplets,
            capped_quads,
        }
    }

    /// Lines through `cell` found by scanning the whole catalogue
    pub fn lines_through(&self, cell: Coord) -> CellLines {
        CellLines {
            wins: self.quads.iter().filter(|q| q.contains(cell)).copied().collect(),
            losses: self
                .triplets
                .iter()
                .filter(|t| t.contains(cell))
                .copied()
                .collect(),
        }
    }
}

static TABLES: OnceLock<LineTables> = OnceLock::new();

/// Returns the process-wide line tables, building them on first use
pub fn tables() -> &'static LineTables {
    TABLES.get_or_init(LineTables::new)
}

/// Lines through `cell`, from the process-wide index
#[inline]
pub fn lines_at(cell: Coord) -> &'static CellLines {
    tables().index.at(cell)
}

/// Looks for a decided game anywhere on the board.
///
/// Quads are checked before triplets: a completed four always contains two
/// completed threes, and the four wins.
pub fn find_winner(board: &Board) -> Option<Player> {
    for cell in COVERING_CELLS {
        if let Some(owner) = lines_at(cell).wins.iter().find_map(|q| q.owner(board)) {
            return Some(owner);
        }
    }
    for cell in COVERING_CELLS {
        if let Some(owner) = lines_at(cell).losses.iter().find_map(|t| t.owner(board)) {
            return Some(owner.opponent());
        }
    }
    None
}

/// Same as [`find_winner`], but only looks at the lines through `cell`.
///
/// Sufficient when `cell` holds the last move of a game that was still
/// undecided before it.
pub fn winner_at(board: &Board, cell: Coord) -> Option<Player> {
    let lines = lines_at(cell);
    if let Some(owner) = lines.wins.iter().find_map(|q| q.owner(board)) {
        return Some(owner);
    }
    lines
        .losses
        .iter()
        .find_map(|t| t.owner(board))
        .map(Player::opponent)
}
