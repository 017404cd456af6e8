//! Board model for Othello.
//!
//! The 8x8 playable region is stored in a flat 10x10 array whose outer ring
//! holds [`Piece::Border`]. Every neighbour of a playable cell is therefore a
//! valid index, and a walk in any direction always stops on a border cell
//! without explicit bounds checks.

use std::fmt;
use std::str::FromStr;

use crate::RulesError;

/// Width of the playable region.
pub const BOARD_WIDTH: usize = 8;
/// Number of playable cells.
pub const PLAYABLE_CELLS: usize = BOARD_WIDTH * BOARD_WIDTH;

const STRIDE: usize = BOARD_WIDTH + 2;
const CELLS: usize = STRIDE * STRIDE;

/// Index offsets of the 8 neighbours in the 10x10 layout.
const DIRECTIONS: [isize; 8] = [-11, -10, -9, -1, 1, 9, 10, 11];

/// One of the two sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    /// Moves first.
    Black,
    White,
}

impl Player {
    /// The other side.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }

    /// Single-character tag used by the text encodings.
    pub fn symbol(self) -> char {
        Piece::from(self).symbol()
    }

    pub(crate) fn from_symbol(c: char) -> Option<Player> {
        match c {
            'b' => Some(Player::Black),
            'w' => Some(Player::White),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Black => f.write_str("black"),
            Player::White => f.write_str("white"),
        }
    }
}

/// Content of a single cell.
///
/// A [`Player`] converts into the piece of the same colour, so the grid and
/// the turn share one encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Piece {
    Empty = 0,
    Black = 1,
    White = 2,
    /// Sentinel surrounding the playable region. Never a legal cell.
    Border = 3,
}

impl Piece {
    /// The owner of this piece, if it is a player's piece.
    #[inline]
    pub fn owner(self) -> Option<Player> {
        match self {
            Piece::Black => Some(Player::Black),
            Piece::White => Some(Player::White),
            Piece::Empty | Piece::Border => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Piece::Empty => '.',
            Piece::Black => 'b',
            Piece::White => 'w',
            Piece::Border => '#',
        }
    }
}

impl From<Player> for Piece {
    #[inline]
    fn from(player: Player) -> Self {
        match player {
            Player::Black => Piece::Black,
            Player::White => Piece::White,
        }
    }
}

/// A playable cell, addressed by zero-based row and column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    /// The four corners, which can never be flipped once taken.
    pub const CORNERS: [Square; 4] = [
        Square(11),
        Square(18),
        Square(81),
        Square(88),
    ];

    /// Builds a square from zero-based coordinates.
    ///
    /// # Errors
    /// `RulesError::OutOfBounds` if either coordinate is outside `0..8`.
    pub fn new(row: usize, col: usize) -> Result<Square, RulesError> {
        if row >= BOARD_WIDTH || col >= BOARD_WIDTH {
            return Err(RulesError::OutOfBounds { row, col });
        }
        Ok(Square(((row + 1) * STRIDE + col + 1) as u8))
    }

    #[inline]
    pub fn row(self) -> usize {
        self.0 as usize / STRIDE - 1
    }

    #[inline]
    pub fn col(self) -> usize {
        self.0 as usize % STRIDE - 1
    }

    /// All playable squares in row-major order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..PLAYABLE_CELLS).map(|i| Square((((i / BOARD_WIDTH) + 1) * STRIDE + i % BOARD_WIDTH + 1) as u8))
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row(), self.col())
    }
}

#[inline]
fn step(index: usize, dir: isize) -> usize {
    // Walks started on a playable cell stop at the border ring, so the
    // result always stays inside 0..CELLS.
    (index as isize + dir) as usize
}

/// Fixed-size Othello board. Copying it is a plain array copy.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Piece; CELLS],
}

impl Board {
    /// A board with every playable cell empty.
    pub fn empty() -> Self {
        let mut cells = [Piece::Border; CELLS];
        for square in Square::all() {
            cells[square.index()] = Piece::Empty;
        }
        Board { cells }
    }

    /// The standard starting position: two pieces per side on the centre
    /// diagonals.
    pub fn initial() -> Self {
        let mut board = Board::empty();
        board.cells[44] = Piece::White;
        board.cells[45] = Piece::Black;
        board.cells[54] = Piece::Black;
        board.cells[55] = Piece::White;
        board
    }

    #[inline]
    pub fn get(&self, square: Square) -> Piece {
        self.cells[square.index()]
    }

    #[inline]
    pub(crate) fn set(&mut self, square: Square, piece: Piece) {
        self.cells[square.index()] = piece;
    }

    /// Number of pieces held by `player`.
    pub fn count(&self, player: Player) -> usize {
        let piece = Piece::from(player);
        Square::all().filter(|&s| self.get(s) == piece).count()
    }

    pub fn empty_count(&self) -> usize {
        Square::all().filter(|&s| self.get(s) == Piece::Empty).count()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.empty_count() == 0
    }

    /// Returns the bracketing piece's index when a piece placed at `from`
    /// by `player` would flip at least one opponent piece along `dir`.
    fn bracket(&self, from: usize, dir: isize, player: Player) -> Option<usize> {
        let own = Piece::from(player);
        let opp = Piece::from(player.opponent());

        let mut cursor = step(from, dir);
        if self.cells[cursor] != opp {
            return None;
        }
        while self.cells[cursor] == opp {
            cursor = step(cursor, dir);
        }
        (self.cells[cursor] == own).then_some(cursor)
    }

    /// Whether `player` may place a piece on `square`: the cell is empty and
    /// at least one direction brackets opponent pieces.
    pub fn is_placement(&self, square: Square, player: Player) -> bool {
        self.get(square) == Piece::Empty
            && DIRECTIONS
                .iter()
                .any(|&dir| self.bracket(square.index(), dir, player).is_some())
    }

    /// Legal placements for `player` in row-major order. Reads only, so it
    /// can be asked for either side regardless of whose turn it is.
    pub fn placements(&self, player: Player) -> impl Iterator<Item = Square> + '_ {
        Square::all().filter(move |&s| self.is_placement(s, player))
    }

    pub fn count_placements(&self, player: Player) -> usize {
        self.placements(player).count()
    }

    /// Writes `player`'s piece on `square` and flips every bracketed line.
    /// The caller must have checked [`Board::is_placement`].
    pub(crate) fn place(&mut self, square: Square, player: Player) {
        let own = Piece::from(player);
        let from = square.index();
        self.cells[from] = own;

        for dir in DIRECTIONS {
            if let Some(bracketer) = self.bracket(from, dir, player) {
                let mut cursor = step(from, dir);
                while cursor != bracketer {
                    self.cells[cursor] = own;
                    cursor = step(cursor, dir);
                }
            }
        }
    }

    /// Whether any of the 8 neighbours of `square` is empty.
    pub fn touches_empty(&self, square: Square) -> bool {
        DIRECTIONS
            .iter()
            .any(|&dir| self.cells[step(square.index(), dir)] == Piece::Empty)
    }

    /// Encodes the playable region as 64 characters in row-major order:
    /// `.` empty, `b` black, `w` white.
    pub fn encode(&self) -> String {
        Square::all().map(|s| self.get(s).symbol()).collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::initial()
    }
}

impl FromStr for Board {
    type Err = RulesError;

    /// Parses the 64-character form produced by [`Board::encode`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != PLAYABLE_CELLS {
            return Err(RulesError::InvalidEncoding {
                message: format!("expected {} cells, got {}", PLAYABLE_CELLS, chars.len()),
            });
        }

        let mut board = Board::empty();
        for (square, c) in Square::all().zip(chars) {
            let piece = match c {
                '.' => Piece::Empty,
                other => match Player::from_symbol(other) {
                    Some(player) => Piece::from(player),
                    None => {
                        return Err(RulesError::InvalidEncoding {
                            message: format!("invalid character '{}' at {}", other, square),
                        })
                    }
                },
            };
            board.set(square, piece);
        }
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        for col in 0..BOARD_WIDTH {
            write!(f, " {}", col + 1)?;
        }
        writeln!(
            f,
            " [b={} w={}]",
            self.count(Player::Black),
            self.count(Player::White)
        )?;

        for row in 0..BOARD_WIDTH {
            write!(f, "{} ", row + 1)?;
            for square in Square::all().skip(row * BOARD_WIDTH).take(BOARD_WIDTH) {
                write!(f, " {}", self.get(square).symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Board").field(&self.encode()).finish()
    }
}
