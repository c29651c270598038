use chess::{Color, Square};
use rand::Rng;
use std::collections::{BTreeMap, HashSet};

use crate::game::board::{ChessBoard, EngineError};
use crate::game::mines::{flood_fill, generate_mines};
use crate::game::utils::{parse_promotion, parse_square};
use crate::models::{BoardSnapshot, ClientId, ExtraInfo, MoveRecord, Reveal, Timers};

/// Largest cycle length whose ply period still fits in a `u32`.
pub const MAX_MOVES_UNTIL_RESET: u32 = u32::MAX / 2;

/// Settings a fresh game starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    /// Starting time and increment, in seconds.
    pub time_controls: (u32, u32),
    /// Total mines, split evenly between the two halves of the board.
    pub mine_count: u32,
    /// Full moves between mine regenerations; zero disables regeneration.
    pub moves_until_reset: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            time_controls: (600, 0),
            mine_count: 8,
            moves_until_reset: 10,
        }
    }
}

/// Outcome of a sink on one square.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkOutcome {
    pub squares: BTreeMap<Square, Reveal>,
    /// Set when the sink forced a skip; carries that skip's side effects.
    pub forfeit: Option<ExtraInfo>,
}

impl SinkOutcome {
    /// A forced skip that regenerated the mines makes this result stale.
    pub fn reveal(&self) -> bool {
        !self.forfeit.map_or(false, |extra| extra.mines_reset)
    }
}

/// Game state for a specific lobby
pub struct GameState {
    pub board: ChessBoard,
    pub mines: HashSet<Square>,
    pub previous_move: Option<MoveRecord>,
    pub white_player: Option<ClientId>,
    pub black_player: Option<ClientId>,
    pub white_timer: f64,
    pub black_timer: f64,
    /// True while white may still sink once this mine cycle without penalty.
    pub white_free_sink: bool,
    pub black_free_sink: bool,
    pub time_controls: (u32, u32),
    pub mine_count: u32,
    pub moves_until_reset: u32,
}

impl GameState {
    pub fn new<R: Rng + ?Sized>(settings: &GameSettings, rng: &mut R) -> Self {
        let start = settings.time_controls.0 as f64;
        Self {
            board: ChessBoard::new(),
            mines: generate_mines(settings.mine_count, rng),
            previous_move: None,
            white_player: None,
            black_player: None,
            white_timer: start,
            black_timer: start,
            white_free_sink: true,
            black_free_sink: true,
            time_controls: settings.time_controls,
            mine_count: settings.mine_count,
            moves_until_reset: settings.moves_until_reset,
        }
    }

    pub fn settings(&self) -> GameSettings {
        GameSettings {
            time_controls: self.time_controls,
            mine_count: self.mine_count,
            moves_until_reset: self.moves_until_reset,
        }
    }

    /// Start over with the current settings. Claims survive unless `remove_players`.
    pub fn reset<R: Rng + ?Sized>(&mut self, remove_players: bool, rng: &mut R) {
        let mut fresh = GameState::new(&self.settings(), rng);
        if !remove_players {
            fresh.white_player = self.white_player;
            fresh.black_player = self.black_player;
        }
        *self = fresh;
    }

    pub fn player(&self, color: Color) -> Option<ClientId> {
        match color {
            Color::White => self.white_player,
            Color::Black => self.black_player,
        }
    }

    pub fn set_player(&mut self, color: Color, client: Option<ClientId>) {
        match color {
            Color::White => self.white_player = client,
            Color::Black => self.black_player = client,
        }
    }

    pub fn color_of(&self, client: ClientId) -> Option<Color> {
        if self.white_player == Some(client) {
            Some(Color::White)
        } else if self.black_player == Some(client) {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn timers(&self) -> Timers {
        Timers {
            white: self.white_timer,
            black: self.black_timer,
        }
    }

    /// Clocks are whatever the client says they are.
    pub fn set_timers(&mut self, timers: &Timers) {
        self.white_timer = timers.white;
        self.black_timer = timers.black;
    }

    fn free_sink_mut(&mut self, color: Color) -> &mut bool {
        match color {
            Color::White => &mut self.white_free_sink,
            Color::Black => &mut self.black_free_sink,
        }
    }

    pub fn regenerate_mines<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.mines = generate_mines(self.mine_count, rng);
        self.white_free_sink = true;
        self.black_free_sink = true;
    }

    /// Regenerate mines if the last ply completed a mine cycle.
    fn advance_cycle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let period = match self.moves_until_reset.checked_mul(2) {
            Some(period) if period > 0 => period,
            _ => return false,
        };
        if self.board.ply() % period != 0 {
            return false;
        }
        self.regenerate_mines(rng);
        true
    }

    /// Pass the turn.
    pub fn apply_skip<R: Rng + ?Sized>(&mut self, rng: &mut R) -> ExtraInfo {
        self.board.push_null();
        self.previous_move = None;
        ExtraInfo {
            mines_reset: self.advance_cycle(rng),
            game_over: !self.board.is_playable(),
            ..ExtraInfo::default()
        }
    }

    /// Play `record` and let any mines under the moved pieces go off.
    pub fn apply_move<R: Rng + ?Sized>(
        &mut self,
        record: MoveRecord,
        rng: &mut R,
    ) -> Result<ExtraInfo, EngineError> {
        let source = parse_square(&record.from)?;
        let dest = parse_square(&record.to)?;
        let promotion = record.promotion.as_deref().map(parse_promotion).transpose()?;

        let applied = self.board.push_move(source, dest, promotion)?;
        let mut extra = ExtraInfo::default();

        if let Some(side) = applied.castle {
            let rook_square = Square::make_square(dest.get_rank(), side.rook_file());
            if self.mines.contains(&rook_square) {
                self.board.remove_piece(rook_square);
                extra.rook_mine = true;
            }
        }
        if self.mines.contains(&dest) {
            self.board.remove_piece(dest);
            extra.mine = true;
        }

        // A mine can take a king, or a pinned piece, and leave a position
        // nobody can move from. The side to move wins.
        extra.game_over = !self.board.is_playable();

        self.previous_move = Some(record);
        extra.mines_reset = self.advance_cycle(rng);
        Ok(extra)
    }

    /// Probe `square` for `color`.
    ///
    /// The first sink of a mine cycle is free. After that, hitting a mine
    /// forfeits the turn.
    pub fn sink<R: Rng + ?Sized>(&mut self, color: Color, square: Square, rng: &mut R) -> SinkOutcome {
        let free = std::mem::replace(self.free_sink_mut(color), false);

        if self.mines.contains(&square) {
            let mut squares = BTreeMap::new();
            squares.insert(square, Reveal::Mine);
            let forfeit = if free { None } else { Some(self.apply_skip(rng)) };
            return SinkOutcome { squares, forfeit };
        }

        let squares = flood_fill(square, &self.mines)
            .into_iter()
            .map(|(square, count)| (square, Reveal::Count(count)))
            .collect();
        SinkOutcome {
            squares,
            forfeit: None,
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            fen: self.board.fen(),
            mine_count: self.mine_count,
            previous_move: self.previous_move.clone(),
            time_controls: self.time_controls,
            moves_until_reset: self.moves_until_reset,
            timers: self.timers(),
            white_player: self.white_player.is_some(),
            black_player: self.black_player.is_some(),
        }
    }
}
