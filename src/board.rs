//! Board state: stone placement, groups, liberties, and capture resolution.
//!
//! The board is a square grid stored row-major as `Vec<Option<Color>>`.
//! Coordinates are `(x, y)` with `x` the column and `y` the row counted from
//! the top edge. Groups are never stored; they are recomputed on demand with
//! an iterative flood fill.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{DIRECTIONS, MAX_BOARD_SIZE};
use crate::error::GameError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Digit used in snapshots: `1` for Black, `2` for White.
    pub fn code(self) -> char {
        match self {
            Color::Black => '1',
            Color::White => '2',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Black => "Black",
            Color::White => "White",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type Point = (usize, usize);

/// A single placement attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub x: usize,
    pub y: usize,
    pub color: Color,
}

impl Move {
    pub fn new(x: usize, y: usize, color: Color) -> Self {
        Self { x, y, color }
    }

    pub fn point(&self) -> Point {
        (self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Color>>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    /// Build a board from text rows using `X` for Black, `O` for White and
    /// `.` for empty. Whitespace inside a row is ignored.
    pub fn from_rows(rows: &[&str]) -> Result<Self, GameError> {
        let size = rows.len();
        let mut board = Board::new(size);
        for (y, row) in rows.iter().enumerate() {
            let cells: Vec<char> = row.chars().filter(|c| !c.is_whitespace()).collect();
            if cells.len() != size {
                return Err(GameError::InvalidState(format!(
                    "row {y} has {} cells, expected {size}",
                    cells.len()
                )));
            }
            for (x, ch) in cells.into_iter().enumerate() {
                let cell = match ch {
                    'X' | 'x' => Some(Color::Black),
                    'O' | 'o' => Some(Color::White),
                    '.' => None,
                    other => {
                        return Err(GameError::InvalidState(format!(
                            "unexpected cell '{other}' at ({x}, {y})"
                        )));
                    }
                };
                let i = board.idx(x, y);
                board.cells[i] = cell;
            }
        }
        Ok(board)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.size + x
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    /// Stone at `(x, y)`; `None` for empty or off-board points.
    pub fn get(&self, x: usize, y: usize) -> Option<Color> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.cells[self.idx(x, y)]
    }

    pub fn is_empty_at(&self, x: usize, y: usize) -> bool {
        self.in_bounds(x, y) && self.cells[self.idx(x, y)].is_none()
    }

    pub fn stone_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Empty points in row-major order.
    pub fn empty_points(&self) -> impl Iterator<Item = Point> + '_ {
        let s = self.size;
        (0..s * s)
            .filter(move |&i| self.cells[i].is_none())
            .map(move |i| (i % s, i / s))
    }

    /// On-board orthogonal neighbours in search order: down, right, up, left.
    pub fn neighbors(&self, x: usize, y: usize) -> impl Iterator<Item = Point> + '_ {
        DIRECTIONS.iter().filter_map(move |&(dx, dy)| {
            let nx = x.checked_add_signed(dx)?;
            let ny = y.checked_add_signed(dy)?;
            self.in_bounds(nx, ny).then_some((nx, ny))
        })
    }

    /// Write a stone into an empty point. Captures are not resolved here.
    pub fn place(&mut self, mv: Move) -> Result<(), GameError> {
        if !self.in_bounds(mv.x, mv.y) {
            return Err(GameError::OutOfBounds);
        }
        let i = self.idx(mv.x, mv.y);
        if self.cells[i].is_some() {
            return Err(GameError::OccupiedCell);
        }
        self.cells[i] = Some(mv.color);
        Ok(())
    }

    fn clear(&mut self, x: usize, y: usize) {
        let i = self.idx(x, y);
        self.cells[i] = None;
    }

    /// All stones connected to `(x, y)` through same-coloured orthogonal
    /// neighbours. Empty for an empty or off-board point.
    pub fn group(&self, x: usize, y: usize) -> Vec<Point> {
        let Some(color) = self.get(x, y) else {
            return Vec::new();
        };
        let mut stack = vec![(x, y)];
        let mut visited = vec![false; self.size * self.size];
        let mut out = Vec::new();
        while let Some((cx, cy)) = stack.pop() {
            let i = self.idx(cx, cy);
            if visited[i] {
                continue;
            }
            visited[i] = true;
            out.push((cx, cy));
            for (nx, ny) in self.neighbors(cx, cy) {
                if !visited[self.idx(nx, ny)] && self.get(nx, ny) == Some(color) {
                    stack.push((nx, ny));
                }
            }
        }
        out
    }

    /// Empty points adjacent to any member of `group`.
    pub fn liberties(&self, group: &[Point]) -> BTreeSet<Point> {
        let mut libs = BTreeSet::new();
        for &(x, y) in group {
            for (nx, ny) in self.neighbors(x, y) {
                if self.is_empty_at(nx, ny) {
                    libs.insert((nx, ny));
                }
            }
        }
        libs
    }

    /// Opponent stones that the stone of `mv` (already on the board) leaves
    /// without liberties. Each captured group is listed once, in neighbour
    /// search order.
    pub fn captures(&self, mv: Move) -> Vec<Point> {
        let opp = mv.color.opponent();
        let mut captured: Vec<Point> = Vec::new();
        for (nx, ny) in self.neighbors(mv.x, mv.y) {
            if self.get(nx, ny) != Some(opp) || captured.contains(&(nx, ny)) {
                continue;
            }
            let group = self.group(nx, ny);
            if self.liberties(&group).is_empty() {
                captured.extend(group);
            }
        }
        captured
    }

    /// Find the captures caused by `mv` and, when `apply` is set, remove them.
    /// Own-group liberties are not examined; suicide is a separate rule.
    pub fn resolve_captures(&mut self, mv: Move, apply: bool) -> Vec<Point> {
        let captured = self.captures(mv);
        if apply {
            for &(x, y) in &captured {
                self.clear(x, y);
            }
        }
        captured
    }

    /// Place a stone and remove what it captures.
    pub fn play(&mut self, mv: Move) -> Result<Vec<Point>, GameError> {
        self.place(mv)?;
        Ok(self.resolve_captures(mv, true))
    }

    /// Row-major string of cell codes (`0` empty, `1` black, `2` white).
    pub fn snapshot(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.map_or('0', Color::code))
            .collect()
    }

    /// Working copy that keeps the real board borrowed read-only.
    pub fn scratch(&self) -> Scratch<'_> {
        Scratch {
            origin: self,
            work: self.clone(),
        }
    }

    /// Check the invariants an imported board must satisfy.
    pub fn validate(&self) -> Result<(), GameError> {
        if self.size == 0 || self.size > MAX_BOARD_SIZE {
            return Err(GameError::InvalidState(format!(
                "board size {} outside 1..={MAX_BOARD_SIZE}",
                self.size
            )));
        }
        if self.cells.len() != self.size * self.size {
            return Err(GameError::InvalidState(format!(
                "board has {} cells, expected {}",
                self.cells.len(),
                self.size * self.size
            )));
        }
        Ok(())
    }
}

/// Speculative copy of a board.
///
/// Holding a `Scratch` keeps the origin borrowed immutably, so the real board
/// cannot change while a lookahead runs, and dropping it discards every
/// speculative placement on every exit path.
pub struct Scratch<'a> {
    origin: &'a Board,
    work: Board,
}

impl<'a> Scratch<'a> {
    #[cfg(test)]
    fn origin(&self) -> &'a Board {
        self.origin
    }

    pub fn board(&self) -> &Board {
        &self.work
    }

    /// Place a stone on the copy and apply its captures.
    pub fn play(&mut self, mv: Move) -> Result<Vec<Point>, GameError> {
        self.work.play(mv)
    }

    /// Reset the copy to the origin without reallocating.
    pub fn reset(&mut self) {
        self.work.cells.clone_from(&self.origin.cells);
    }
}

/// Parse algebraic notation such as `D4`: column letter from `A`, row number
/// counted from the far (bottom) edge.
pub fn parse_coord(s: &str, size: usize) -> Result<Point, GameError> {
    let invalid = || GameError::InvalidCoordinate(s.to_string());
    let s = s.trim();
    let mut chars = s.chars();
    let letter = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
    if !letter.is_ascii_uppercase() {
        return Err(invalid());
    }
    let x = (letter as u8 - b'A') as usize;
    let row: usize = chars.as_str().parse().map_err(|_| invalid())?;
    if x >= size || row == 0 || row > size {
        return Err(invalid());
    }
    Ok((x, size - row))
}

/// Convert a point to algebraic notation.
pub fn str_coord(pt: Point, size: usize) -> String {
    let letter = (b'A' + pt.0 as u8) as char;
    format!("{letter}{}", size - pt.1)
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.size {
            for x in 0..self.size {
                let ch = match self.get(x, y) {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_rejects_occupied_and_off_board() {
        let mut board = Board::new(9);
        assert!(board.place(Move::new(4, 4, Color::Black)).is_ok());
        assert_eq!(
            board.place(Move::new(4, 4, Color::White)),
            Err(GameError::OccupiedCell)
        );
        assert_eq!(
            board.place(Move::new(9, 0, Color::White)),
            Err(GameError::OutOfBounds)
        );
    }

    #[test]
    fn test_group_and_liberties() {
        let board = Board::from_rows(&[
            "XX...", //
            "X.O..", //
            ".....", //
            ".....", //
            ".....",
        ])
        .unwrap();
        let group = board.group(0, 0);
        assert_eq!(group.len(), 3);
        let libs = board.liberties(&group);
        assert_eq!(libs.into_iter().collect::<Vec<_>>(), vec![(0, 2), (1, 1), (2, 0)]);
        assert!(board.group(3, 3).is_empty());
    }

    #[test]
    fn test_resolve_captures_without_apply_leaves_board() {
        let mut board = Board::from_rows(&[
            "OX...", //
            "X....", //
            ".....", //
            ".....", //
            ".....",
        ])
        .unwrap();
        let before = board.snapshot();
        let captured = board.resolve_captures(Move::new(1, 0, Color::Black), false);
        assert_eq!(captured, vec![(0, 0)]);
        assert_eq!(board.snapshot(), before);

        let captured = board.resolve_captures(Move::new(1, 0, Color::Black), true);
        assert_eq!(captured, vec![(0, 0)]);
        assert_eq!(board.get(0, 0), None);
    }

    #[test]
    fn test_capture_lists_shared_group_once() {
        // The white pair touches the capturing stone on two sides.
        let mut board = Board::from_rows(&[
            "OOX..", //
            "O....", //
            "X....", //
            ".....", //
            ".....",
        ])
        .unwrap();
        let captured = board.play(Move::new(1, 1, Color::Black)).unwrap();
        assert_eq!(captured.len(), 3);
        assert_eq!(board.stone_count(), 3);
    }

    #[test]
    fn test_snapshot_is_row_major() {
        let board = Board::from_rows(&["X.", ".O"]).unwrap();
        assert_eq!(board.snapshot(), "1002");
    }

    #[test]
    fn test_scratch_reset_restores_origin() {
        let board = Board::new(5);
        let mut scratch = board.scratch();
        scratch.play(Move::new(2, 2, Color::Black)).unwrap();
        assert_eq!(scratch.board().stone_count(), 1);
        scratch.reset();
        assert_eq!(scratch.board().stone_count(), 0);
        assert_eq!(scratch.origin().stone_count(), 0);
    }

    #[test]
    fn test_parse_str_coord_roundtrip() {
        for size in [9, 13, 19] {
            for y in 0..size {
                for x in 0..size {
                    let s = str_coord((x, y), size);
                    assert_eq!(parse_coord(&s, size), Ok((x, y)), "Failed roundtrip for {s}");
                }
            }
        }
        assert_eq!(parse_coord("A9", 9), Ok((0, 0)));
        assert_eq!(parse_coord("a1", 9), Ok((0, 8)));
        assert!(parse_coord("Z1", 9).is_err());
        assert!(parse_coord("A0", 9).is_err());
        assert!(parse_coord("", 9).is_err());
    }
}
