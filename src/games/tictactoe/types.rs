//! Core domain types for tic-tac-toe.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Number of squares on the board.
pub const BOARD_SIZE: usize = 9;

/// Index of the centre square.
pub const CENTER: usize = 4;

/// Indices of the four corner squares.
pub const CORNERS: [usize; 4] = [0, 2, 6, 8];

/// A player's mark.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Mark {
    /// Mark X (always moves first).
    X,
    /// Mark O (moves second).
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// A square on the tic-tac-toe board.
///
/// On the wire a square is `null` when empty, otherwise the mark (`"X"` / `"O"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<Mark>", into = "Option<Mark>")]
pub enum Square {
    /// Empty square.
    #[default]
    Empty,
    /// Square occupied by a mark.
    Occupied(Mark),
}

impl From<Option<Mark>> for Square {
    fn from(value: Option<Mark>) -> Self {
        value.map_or(Square::Empty, Square::Occupied)
    }
}

impl From<Square> for Option<Mark> {
    fn from(square: Square) -> Self {
        match square {
            Square::Empty => None,
            Square::Occupied(mark) => Some(mark),
        }
    }
}

/// Why a mark could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum PlaceError {
    /// Index is outside 0-8.
    #[display("Position {} is out of bounds (must be 0-8)", _0)]
    OutOfBounds(#[error(not(source))] usize),
    /// Square already holds a mark.
    #[display("Square {} is already occupied", _0)]
    SquareOccupied(#[error(not(source))] usize),
}

/// 3x3 tic-tac-toe board, squares in row-major order (0-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    squares: [Square; BOARD_SIZE],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the square at the given position, `None` when out of bounds.
    pub fn get(&self, pos: usize) -> Option<Square> {
        self.squares.get(pos).copied()
    }

    /// Checks if the square at `pos` exists and is empty.
    pub fn is_empty(&self, pos: usize) -> bool {
        matches!(self.get(pos), Some(Square::Empty))
    }

    /// Writes `mark` into an empty square.
    ///
    /// Squares only ever go from empty to occupied.
    pub fn place(&mut self, pos: usize, mark: Mark) -> Result<(), PlaceError> {
        match self.squares.get_mut(pos) {
            None => Err(PlaceError::OutOfBounds(pos)),
            Some(Square::Occupied(_)) => Err(PlaceError::SquareOccupied(pos)),
            Some(square) => {
                *square = Square::Occupied(mark);
                Ok(())
            }
        }
    }

    /// Returns a copy of this board with `mark` placed at `pos`,
    /// or `None` if the placement is illegal.
    pub fn with_mark(&self, pos: usize, mark: Mark) -> Option<Board> {
        let mut next = *self;
        next.place(pos, mark).ok().map(|()| next)
    }

    /// Iterates the indices of empty squares, left to right.
    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter(|(_, square)| **square == Square::Empty)
            .map(|(pos, _)| pos)
    }

    /// Returns all squares.
    pub fn squares(&self) -> &[Square; BOARD_SIZE] {
        &self.squares
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let pos = row * 3 + col;
                let symbol = match self.squares[pos] {
                    Square::Empty => (pos + 1).to_string(),
                    Square::Occupied(mark) => mark.to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

/// Error parsing a compact board string.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Invalid board '{}': {}", input, reason)]
pub struct BoardParseError {
    /// The rejected input.
    pub input: String,
    /// What was wrong with it.
    pub reason: String,
}

impl FromStr for Board {
    type Err = BoardParseError;

    /// Parses nine characters: `X`/`O` for marks, `-`, `_` or `.` for empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason: String| BoardParseError {
            input: s.to_string(),
            reason,
        };

        let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.len() != BOARD_SIZE {
            return Err(fail(format!("expected 9 squares, found {}", chars.len())));
        }

        let mut squares = [Square::Empty; BOARD_SIZE];
        for (square, c) in squares.iter_mut().zip(chars) {
            *square = match c {
                'X' | 'x' => Square::Occupied(Mark::X),
                'O' | 'o' => Square::Occupied(Mark::O),
                '-' | '_' | '.' => Square::Empty,
                other => return Err(fail(format!("unexpected character '{}'", other))),
            };
        }

        Ok(Self { squares })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_rejects_occupied_square() {
        let mut board = Board::new();
        board.place(4, Mark::X).unwrap();
        assert_eq!(board.place(4, Mark::O), Err(PlaceError::SquareOccupied(4)));
        assert_eq!(board.get(4), Some(Square::Occupied(Mark::X)));
    }

    #[test]
    fn test_place_rejects_out_of_bounds() {
        let mut board = Board::new();
        assert_eq!(board.place(9, Mark::X), Err(PlaceError::OutOfBounds(9)));
    }

    #[test]
    fn test_empty_cells_in_order() {
        let board: Board = "X-O-X----".parse().unwrap();
        let cells: Vec<usize> = board.empty_cells().collect();
        assert_eq!(cells, vec![1, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn test_with_mark_leaves_original_untouched() {
        let board = Board::new();
        let next = board.with_mark(0, Mark::X).unwrap();
        assert!(board.is_empty(0));
        assert_eq!(next.get(0), Some(Square::Occupied(Mark::X)));
        assert!(next.with_mark(0, Mark::O).is_none());
    }

    #[test]
    fn test_wire_format_uses_null_for_empty() {
        let board: Board = "XO-------".parse().unwrap();
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, r#"["X","O",null,null,null,null,null,null,null]"#);
    }

    #[test]
    fn test_wire_format_requires_nine_squares() {
        let short = r#"["X","O",null]"#;
        assert!(serde_json::from_str::<Board>(short).is_err());
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!("XO".parse::<Board>().is_err());
        assert!("XO-------Z".parse::<Board>().is_err());
    }
}
