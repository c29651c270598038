use chess::Square;
use rand::Rng;
use std::collections::{BTreeMap, HashSet};

use crate::game::utils::square_at;

/// Squares in each half of the board: ranks 1-4 are `0..32`, ranks 5-8 are `32..64`.
pub const HALF_BOARD: usize = 32;

/// Draw `mine_count / 2` distinct squares from each half of the board.
///
/// Collisions are resampled. An odd count is rounded down and each half is
/// capped at its 32 squares.
pub fn generate_mines<R: Rng + ?Sized>(mine_count: u32, rng: &mut R) -> HashSet<Square> {
    let per_half = (mine_count as usize / 2).min(HALF_BOARD);
    let mut mines = HashSet::with_capacity(per_half * 2);

    for start in [0, HALF_BOARD] {
        let mut placed = 0;
        while placed < per_half {
            let square = square_at(rng.gen_range(start..start + HALF_BOARD));
            if mines.insert(square) {
                placed += 1;
            }
        }
    }

    mines
}

/// King-adjacent squares of `square`, clipped at the board edges.
pub fn neighbours(square: Square) -> impl Iterator<Item = Square> {
    let rank = square.get_rank().to_index() as i32;
    let file = square.get_file().to_index() as i32;

    (-1..=1)
        .flat_map(|dr| (-1..=1).map(move |df| (dr, df)))
        .filter(|&(dr, df)| dr != 0 || df != 0)
        .map(move |(dr, df)| (rank + dr, file + df))
        .filter(|&(r, f)| (0..8).contains(&r) && (0..8).contains(&f))
        .map(|(r, f)| square_at(r as usize * 8 + f as usize))
}

pub fn adjacent_mines(square: Square, mines: &HashSet<Square>) -> u8 {
    neighbours(square).filter(|n| mines.contains(n)).count() as u8
}

/// Reveal mine counts starting at `start`.
///
/// Every visited square gets its adjacent-mine count; squares with a count of
/// zero open up their neighbours in turn.
pub fn flood_fill(start: Square, mines: &HashSet<Square>) -> BTreeMap<Square, u8> {
    let mut counts = BTreeMap::new();
    let mut frontier = vec![start];

    while let Some(square) = frontier.pop() {
        if counts.contains_key(&square) {
            continue;
        }
        let count = adjacent_mines(square, mines);
        counts.insert(square, count);
        if count == 0 {
            frontier.extend(neighbours(square).filter(|n| !counts.contains_key(n)));
        }
    }

    counts
}
