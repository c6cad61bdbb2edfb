//! Card patterns and symmetry-aware matching.
//!
//! A pattern is an odd-sized square grid of markers where `1` is a required
//! stone; its center is the middle cell. A pattern may be played in any of
//! its 8 dihedral orientations (4 rotations, each optionally mirrored), so
//! every orientation is precomputed once as a list of center-relative
//! offsets when the pattern is built.
//!
//! Three searches run against the board:
//! - [`matches`]: exact cover of a finished stone sequence.
//! - [`can_still_complete`]: whether a partial sequence can still grow into
//!   some placement of the pattern.
//! - [`candidate_placements`] / [`can_play_anywhere`]: whether a pattern fits
//!   anywhere at all.
//!
//! Every board lookahead runs on a [`Scratch`] copy.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{Board, Color, Move, Point, Scratch};
use crate::constants::{PATTERN_EMPTY, PATTERN_STONE};
use crate::error::GameError;

/// Column and row distance from a pattern's center.
pub type Offset = (isize, isize);

type Grid = Vec<Vec<bool>>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Pattern {
    grid: Grid,
    transforms: Vec<Vec<Offset>>,
}

impl Pattern {
    /// Parse rows of `0`/`1` markers.
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, GameError> {
        let size = rows.len();
        if size % 2 == 0 {
            return Err(GameError::InvalidPattern(format!(
                "size {size} is not odd"
            )));
        }
        let mut grid = Vec::with_capacity(size);
        for (r, row) in rows.iter().enumerate() {
            let cells = row
                .as_ref()
                .chars()
                .map(|c| match c {
                    PATTERN_STONE => Ok(true),
                    PATTERN_EMPTY => Ok(false),
                    other => Err(GameError::InvalidPattern(format!(
                        "unexpected marker '{other}' in row {r}"
                    ))),
                })
                .collect::<Result<Vec<bool>, _>>()?;
            if cells.len() != size {
                return Err(GameError::InvalidPattern(format!(
                    "row {r} has {} cells, expected {size}",
                    cells.len()
                )));
            }
            grid.push(cells);
        }
        if !grid.iter().flatten().any(|&c| c) {
            return Err(GameError::InvalidPattern("no required stones".into()));
        }
        let transforms = transformations(&grid);
        Ok(Self { grid, transforms })
    }

    pub fn size(&self) -> usize {
        self.grid.len()
    }

    /// Number of required stones.
    pub fn stones(&self) -> usize {
        self.transforms[0].len()
    }

    pub fn rows(&self) -> Vec<String> {
        self.grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&c| if c { PATTERN_STONE } else { PATTERN_EMPTY })
                    .collect()
            })
            .collect()
    }

    /// Offsets of every orientation: identity, three clockwise rotations,
    /// the mirror image, then the mirror's three rotations.
    pub fn transformations(&self) -> &[Vec<Offset>] {
        &self.transforms
    }
}

impl TryFrom<Vec<String>> for Pattern {
    type Error = GameError;

    fn try_from(rows: Vec<String>) -> Result<Self, Self::Error> {
        Pattern::parse(&rows)
    }
}

impl From<Pattern> for Vec<String> {
    fn from(pattern: Pattern) -> Self {
        pattern.rows()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.grid {
            for &c in row {
                write!(f, "{} ", if c { 'X' } else { '.' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// 90-degree clockwise rotation: `new[col][size-1-row] = old[row][col]`.
fn rot90(grid: &Grid) -> Grid {
    let size = grid.len();
    let mut out = vec![vec![false; size]; size];
    for (row, cells) in grid.iter().enumerate() {
        for (col, &c) in cells.iter().enumerate() {
            out[col][size - 1 - row] = c;
        }
    }
    out
}

/// Mirror columns.
fn reflect(grid: &Grid) -> Grid {
    grid.iter()
        .map(|row| row.iter().rev().copied().collect())
        .collect()
}

/// Marked cells as offsets from the center, in row-major order.
fn extract_offsets(grid: &Grid) -> Vec<Offset> {
    let center = (grid.len() / 2) as isize;
    let mut out = Vec::new();
    for (row, cells) in grid.iter().enumerate() {
        for (col, &c) in cells.iter().enumerate() {
            if c {
                out.push((col as isize - center, row as isize - center));
            }
        }
    }
    out
}

/// The 8 dihedral orientations of a grid. Symmetric patterns repeat entries.
fn transformations(grid: &Grid) -> Vec<Vec<Offset>> {
    let mut out = Vec::with_capacity(8);
    for start in [grid.clone(), reflect(grid)] {
        let mut g = start;
        out.push(extract_offsets(&g));
        for _ in 0..3 {
            g = rot90(&g);
            out.push(extract_offsets(&g));
        }
    }
    out
}

/// Points covered by `offsets` around `center`, or `None` if any falls off a
/// board of `size`.
fn place(offsets: &[Offset], center: Offset, size: usize) -> Option<Vec<Point>> {
    offsets
        .iter()
        .map(|&(dx, dy)| {
            let x = usize::try_from(center.0 + dx).ok()?;
            let y = usize::try_from(center.1 + dy).ok()?;
            (x < size && y < size).then_some((x, y))
        })
        .collect()
}

fn anchored_center(anchor: Point, offset: Offset) -> Offset {
    (anchor.0 as isize - offset.0, anchor.1 as isize - offset.1)
}

/// Whether `played` covers exactly one placement of `pattern` in some
/// orientation: every pattern cell hit, no extra cells.
pub fn matches(played: &[Point], pattern: &Pattern) -> bool {
    if played.len() != pattern.stones() {
        return false;
    }
    let played_set: BTreeSet<Offset> = played
        .iter()
        .map(|&(x, y)| (x as isize, y as isize))
        .collect();
    if played_set.len() != played.len() {
        return false;
    }
    for offsets in pattern.transformations() {
        for &anchor in played {
            for &offset in offsets {
                let center = anchored_center(anchor, offset);
                let expected: BTreeSet<Offset> = offsets
                    .iter()
                    .map(|&(dx, dy)| (center.0 + dx, center.1 + dy))
                    .collect();
                if expected == played_set {
                    return true;
                }
            }
        }
    }
    false
}

/// One way to lay a pattern on the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub center: Offset,
    pub points: Vec<Point>,
}

/// Every distinct on-board placement that uses some empty point as one of
/// its stones. Points are listed in pattern order.
pub fn candidate_placements(pattern: &Pattern, board: &Board) -> Vec<Placement> {
    let mut seen: BTreeSet<Vec<Point>> = BTreeSet::new();
    let mut out = Vec::new();
    for anchor in board.empty_points() {
        for offsets in pattern.transformations() {
            for &offset in offsets {
                let center = anchored_center(anchor, offset);
                let Some(points) = place(offsets, center, board.size()) else {
                    continue;
                };
                let mut key = points.clone();
                key.sort_unstable();
                if seen.insert(key) {
                    out.push(Placement { center, points });
                }
            }
        }
    }
    out
}

/// Whether `color` can put stones on all of `points`, in some order, on the
/// scratch board. Captures made along the way free points for later stones.
///
/// Own stones only ever remove opponent stones, so placing whichever point is
/// empty next reaches every ordering's outcome.
pub fn completable(scratch: &mut Scratch<'_>, points: &[Point], color: Color) -> bool {
    scratch.reset();
    let mut pending: Vec<Point> = points.to_vec();
    while !pending.is_empty() {
        let Some(i) = pending
            .iter()
            .position(|&(x, y)| scratch.board().is_empty_at(x, y))
        else {
            return false;
        };
        let (x, y) = pending.remove(i);
        if scratch.play(Move::new(x, y, color)).is_err() {
            return false;
        }
    }
    true
}

/// Whether the card sequence `sequence` can still become a placement of
/// `pattern`.
///
/// All but the last point of `sequence` are already on `board`; the last one
/// is the stone being proposed. A placement qualifies when it contains every
/// sequence point and its not-yet-played points are [`completable`].
pub fn can_still_complete(
    board: &Board,
    sequence: &[Point],
    pattern: &Pattern,
    color: Color,
) -> bool {
    let Some((&proposed, placed)) = sequence.split_last() else {
        return true;
    };
    let anchor = sequence[0];
    if sequence.len() > pattern.stones() || placed.contains(&proposed) {
        return false;
    }
    let mut scratch = board.scratch();
    for offsets in pattern.transformations() {
        for &offset in offsets {
            let center = anchored_center(anchor, offset);
            let Some(expected) = place(offsets, center, board.size()) else {
                continue;
            };
            if !sequence.iter().all(|p| expected.contains(p)) {
                continue;
            }
            let pending: Vec<Point> = expected
                .into_iter()
                .filter(|p| !placed.contains(p))
                .collect();
            if completable(&mut scratch, &pending, color) {
                debug!(?center, remaining = pending.len() - 1, "pattern still completable");
                return true;
            }
        }
    }
    debug!(played = sequence.len(), "no completion left for pattern");
    false
}

/// Whether `color` could play the whole pattern somewhere on `board`.
pub fn can_play_anywhere(pattern: &Pattern, board: &Board, color: Color) -> bool {
    let mut scratch = board.scratch();
    candidate_placements(pattern, board)
        .iter()
        .any(|placement| completable(&mut scratch, &placement.points, color))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_shape() -> Pattern {
        Pattern::parse(&["00000", "00100", "00100", "00110", "00000"]).unwrap()
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert!(Pattern::parse(&["01", "10"]).is_err());
        assert!(Pattern::parse(&["000", "020", "000"]).is_err());
        assert!(Pattern::parse(&["000", "000", "000"]).is_err());
        assert!(Pattern::parse(&["000", "0100", "000"]).is_err());
    }

    #[test]
    fn test_single_stone_offsets() {
        let p = Pattern::parse(&["000", "010", "000"]).unwrap();
        assert_eq!(p.stones(), 1);
        assert_eq!(p.transformations().len(), 8);
        assert!(p.transformations().iter().all(|t| t == &vec![(0, 0)]));
    }

    #[test]
    fn test_rotation_four_times_is_identity() {
        let p = l_shape();
        let grid = p.grid.clone();
        let mut g = grid.clone();
        for _ in 0..4 {
            g = rot90(&g);
        }
        assert_eq!(g, grid);
        assert_eq!(reflect(&reflect(&grid)), grid);
    }

    #[test]
    fn test_l_shape_has_eight_distinct_orientations() {
        let p = l_shape();
        let distinct: BTreeSet<Vec<Offset>> = p
            .transformations()
            .iter()
            .map(|t| {
                let mut t = t.clone();
                t.sort_unstable();
                t
            })
            .collect();
        assert_eq!(distinct.len(), 8);
    }

    #[test]
    fn test_first_rotation_is_clockwise() {
        // A stone straight above the center turns to the right of it.
        let p = Pattern::parse(&["010", "000", "000"]).unwrap();
        assert_eq!(p.transformations()[0], vec![(0, -1)]);
        assert_eq!(p.transformations()[1], vec![(1, 0)]);
    }

    #[test]
    fn test_matches_exact_cover_only() {
        let p = l_shape();
        assert!(matches(&[(4, 3), (4, 4), (4, 5), (5, 5)], &p));
        // Mirrored and rotated.
        assert!(matches(&[(1, 1), (2, 1), (3, 1), (1, 2)], &p));
        // Order does not matter.
        assert!(matches(&[(5, 5), (4, 3), (4, 5), (4, 4)], &p));
        // Straight line is not an L.
        assert!(!matches(&[(4, 3), (4, 4), (4, 5), (4, 6)], &p));
        // Wrong count.
        assert!(!matches(&[(4, 3), (4, 4), (4, 5)], &p));
        // Duplicates never match.
        assert!(!matches(&[(4, 3), (4, 4), (4, 5), (4, 5)], &p));
    }

    #[test]
    fn test_candidate_placements_stay_on_board() {
        let p = Pattern::parse(&["110", "000", "000"]).unwrap();
        let board = Board::new(3);
        let placements = candidate_placements(&p, &board);
        // Horizontal and vertical dominoes on a 3x3 board.
        assert_eq!(placements.len(), 12);
        assert!(placements.iter().all(|pl| pl.points.iter().all(|&(x, y)| x < 3 && y < 3)));
    }

    #[test]
    fn test_completable_uses_captures() {
        // (1,0) is held by a white stone in atari; black filling (2,0) first
        // captures it and frees the point.
        let board = Board::from_rows(&[
            "XO.", //
            ".X.", //
            "...",
        ])
        .unwrap();
        let mut scratch = board.scratch();
        assert!(completable(&mut scratch, &[(1, 0), (2, 0)], Color::Black));
        assert!(!completable(&mut scratch, &[(1, 0), (0, 2)], Color::Black));
        assert_eq!(board.stone_count(), 3);
    }

    #[test]
    fn test_can_still_complete_tracks_partial_sequence() {
        let p = Pattern::parse(&["000", "011", "000"]).unwrap();
        let mut board = Board::new(5);
        assert!(can_still_complete(&board, &[(2, 2)], &p, Color::Black));
        board.place(Move::new(2, 2, Color::Black)).unwrap();
        assert!(can_still_complete(&board, &[(2, 2), (2, 3)], &p, Color::Black));
        assert!(!can_still_complete(&board, &[(2, 2), (3, 3)], &p, Color::Black));
    }

    #[test]
    fn test_can_still_complete_off_board_center() {
        // The center of this domino sits off the board when the pair is
        // played along the top-left edge.
        let p = Pattern::parse(&["00000", "00000", "00000", "00011", "00000"]).unwrap();
        let board = Board::new(5);
        assert!(can_still_complete(&board, &[(0, 0)], &p, Color::Black));
    }

    #[test]
    fn test_can_play_anywhere_single_stone() {
        let p = Pattern::parse(&["1"]).unwrap();
        let mut board = Board::new(1);
        assert!(can_play_anywhere(&p, &board, Color::Black));
        board.place(Move::new(0, 0, Color::White)).unwrap();
        assert!(!can_play_anywhere(&p, &board, Color::Black));
    }
}
