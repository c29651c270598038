use chess::Color;
use log::info;
use rand::Rng;
use serde_json::Value;
use std::collections::HashSet;
use std::ops::RangeInclusive;

use crate::game::utils::color_name;
use crate::models::{
    ActionError, ClaimNotice, ClientId, Empty, GameSettings, GameState, LobbyCommand, MoveArgs,
    MoveResult, Outbox, ServerMessage, SettingsArgs, SettingsResult, SinkArgs, SinkResult, Success,
    MAX_MOVES_UNTIL_RESET,
};

/// One room: a game and the clients watching or playing it.
///
/// The result of an action goes back to the actor as its reply and is
/// broadcast to every other member. Events nobody asked for (game start, a
/// released claim, a forced skip, a reset caused by new settings) go to all
/// members.
pub struct Lobby {
    code: String,
    game: GameState,
    members: HashSet<ClientId>,
}

impl Lobby {
    pub fn new<R: Rng + ?Sized>(
        code: String,
        creator: ClientId,
        settings: &GameSettings,
        rng: &mut R,
    ) -> Self {
        let mut members = HashSet::new();
        members.insert(creator);
        Self {
            code,
            game: GameState::new(settings, rng),
            members,
        }
    }

    #[cfg(test)]
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    #[cfg(test)]
    pub fn game_mut(&mut self) -> &mut GameState {
        &mut self.game
    }

    pub fn members(&self) -> &HashSet<ClientId> {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn add_member(&mut self, client: ClientId) {
        self.members.insert(client);
    }

    /// Drop `client`. A vacated color restarts the game for everyone left.
    pub fn remove_member<R: Rng + ?Sized>(&mut self, client: ClientId, rng: &mut R, out: &mut Outbox) {
        self.members.remove(&client);

        if let Some(color) = self.game.color_of(client) {
            self.game.set_player(color, None);
            self.game.reset(false, rng);
            info!(
                "Lobby {}: {} left by {}, game reset",
                self.code,
                color_name(&color),
                client
            );
            let notice = ClaimNotice {
                taken: false,
                fen: Some(self.game.board.fen()),
                mine_count: Some(self.game.mine_count),
            };
            self.broadcast(out, None, &ServerMessage::new(claimed_event(color), &notice));
        }
    }

    fn broadcast(&self, out: &mut Outbox, except: Option<ClientId>, message: &ServerMessage) {
        out.broadcast(&self.members, except, message);
    }

    fn require_player(&self, client: ClientId, verb: &'static str) -> Result<Color, ActionError> {
        self.game.color_of(client).ok_or(ActionError::NotAPlayer(verb))
    }

    fn require_turn(&self, client: ClientId, verb: &'static str) -> Result<Color, ActionError> {
        let color = self.require_player(client, verb)?;
        if self.game.board.turn() != color {
            return Err(ActionError::NotYourTurn);
        }
        Ok(color)
    }

    /// Run one action for `client` and return its reply.
    pub fn handle<R: Rng + ?Sized>(
        &mut self,
        client: ClientId,
        command: LobbyCommand,
        rng: &mut R,
        out: &mut Outbox,
    ) -> Result<ServerMessage, ActionError> {
        match command {
            LobbyCommand::ClaimWhite => self.claim(client, Color::White, out),
            LobbyCommand::ClaimBlack => self.claim(client, Color::Black, out),
            LobbyCommand::ResetBoard => self.reset_board(client, rng, out),
            LobbyCommand::Move(args) => self.play_move(client, args, rng, out),
            LobbyCommand::Sink(args) => self.sink(client, args, rng, out),
            LobbyCommand::UpdateSettings(args) => self.update_settings(client, args, rng, out),
        }
    }

    fn claim(&mut self, client: ClientId, color: Color, out: &mut Outbox) -> Result<ServerMessage, ActionError> {
        match self.game.player(color) {
            Some(holder) if holder == client => return Err(ActionError::AlreadyPlaying(color)),
            Some(_) => return Err(ActionError::ColorTaken(color)),
            None => {}
        }
        if let Some(held) = self.game.color_of(client) {
            return Err(ActionError::AlreadyPlaying(held));
        }

        self.game.set_player(color, Some(client));
        info!("Lobby {}: {} claimed {}", self.code, client, color_name(&color));

        let notice = ClaimNotice {
            taken: true,
            fen: None,
            mine_count: None,
        };
        self.broadcast(out, Some(client), &ServerMessage::new(claimed_event(color), &notice));

        if self.game.white_player.is_some() && self.game.black_player.is_some() {
            info!("Lobby {}: both colors claimed, starting game", self.code);
            self.broadcast(out, None, &ServerMessage::new("startGame", &Empty {}));
        }

        let action = match color {
            Color::White => "claimWhite",
            Color::Black => "claimBlack",
        };
        Ok(ServerMessage::new(action, &Success::new()))
    }

    fn reset_board<R: Rng + ?Sized>(
        &mut self,
        client: ClientId,
        rng: &mut R,
        out: &mut Outbox,
    ) -> Result<ServerMessage, ActionError> {
        self.require_player(client, "reset the game")?;
        self.game.reset(true, rng);
        info!("Lobby {}: board reset by {}", self.code, client);

        let message = ServerMessage::new("resetBoard", &self.game.snapshot());
        self.broadcast(out, Some(client), &message);
        Ok(message)
    }

    fn play_move<R: Rng + ?Sized>(
        &mut self,
        client: ClientId,
        args: MoveArgs,
        rng: &mut R,
        out: &mut Outbox,
    ) -> Result<ServerMessage, ActionError> {
        self.require_turn(client, "move")?;

        let (chess_move, extra_info) = if args.skip.unwrap_or(false) {
            (None, self.game.apply_skip(rng))
        } else {
            let record = args.chess_move.ok_or(ActionError::BadShape)?;
            let extra = self.game.apply_move(record.clone(), rng)?;
            (Some(record), extra)
        };
        self.game.set_timers(&args.timers);

        if extra_info.mines_reset {
            info!(
                "Lobby {}: mines regenerated at ply {}",
                self.code,
                self.game.board.ply()
            );
        }
        if extra_info.game_over {
            info!(
                "Lobby {}: game over, {} wins",
                self.code,
                color_name(&self.game.board.turn())
            );
        }

        let result = MoveResult {
            chess_move,
            extra_info,
            timers: self.game.timers(),
            fen: self.game.board.fen(),
        };
        self.broadcast(out, Some(client), &ServerMessage::new("moveAll", &result));
        Ok(ServerMessage::new("move", &result))
    }

    fn sink<R: Rng + ?Sized>(
        &mut self,
        client: ClientId,
        args: SinkArgs,
        rng: &mut R,
        out: &mut Outbox,
    ) -> Result<ServerMessage, ActionError> {
        let color = self.require_turn(client, "sink a square")?;
        let square = args.position.to_square().map_err(|_| ActionError::BadShape)?;

        self.game.set_timers(&args.timers);
        let outcome = self.game.sink(color, square, rng);

        if let Some(extra_info) = outcome.forfeit {
            info!(
                "Lobby {}: {} hit a mine on {} and forfeits the turn",
                self.code,
                color_name(&color),
                square
            );
            let result = MoveResult {
                chess_move: None,
                extra_info,
                timers: self.game.timers(),
                fen: self.game.board.fen(),
            };
            self.broadcast(out, None, &ServerMessage::new("moveAll", &result));
        }

        let result = SinkResult {
            success: true,
            squares: outcome
                .squares
                .iter()
                .map(|(square, reveal)| (square.to_string(), *reveal))
                .collect(),
            reveal: outcome.reveal(),
            forfeited: outcome.forfeit.is_some(),
        };
        Ok(ServerMessage::new("sink", &result))
    }

    fn update_settings<R: Rng + ?Sized>(
        &mut self,
        client: ClientId,
        args: SettingsArgs,
        rng: &mut R,
        out: &mut Outbox,
    ) -> Result<ServerMessage, ActionError> {
        self.require_player(client, "change the settings")?;

        // Validate everything before touching anything.
        let starting_time = parse_setting(
            "startingTime",
            args.starting_time.as_ref(),
            1..=u32::MAX,
            "a positive integer",
        )?;
        let increment = parse_setting(
            "increment",
            args.increment.as_ref(),
            0..=u32::MAX,
            "a non-negative integer",
        )?;
        let per_side = parse_setting(
            "mineCountPerSide",
            args.mine_count_per_side.as_ref(),
            0..=32,
            "an integer between 0 and 32",
        )?;
        let moves_until_reset = parse_setting(
            "movesUntilReset",
            args.moves_until_reset.as_ref(),
            0..=MAX_MOVES_UNTIL_RESET,
            "an integer between 0 and 2147483647",
        )?;

        if let Some(seconds) = starting_time {
            self.game.time_controls.0 = seconds;
        }
        if let Some(seconds) = increment {
            self.game.time_controls.1 = seconds;
        }
        if let Some(count) = per_side {
            self.game.mine_count = count * 2;
        }
        if let Some(moves) = moves_until_reset {
            self.game.moves_until_reset = moves;
        }

        self.game.reset(false, rng);
        info!(
            "Lobby {}: settings changed by {} to {:?}",
            self.code,
            client,
            self.game.settings()
        );
        self.broadcast(out, None, &ServerMessage::new("resetBoard", &self.game.snapshot()));

        let result = SettingsResult {
            success: true,
            time_controls: self.game.time_controls,
            mine_count: self.game.mine_count,
            moves_until_reset: self.game.moves_until_reset,
        };
        Ok(ServerMessage::new("updateSettings", &result))
    }
}

fn claimed_event(color: Color) -> &'static str {
    match color {
        Color::White => "whiteClaimed",
        Color::Black => "blackClaimed",
    }
}

/// An absent field is `Ok(None)`. Present fields must be integer strings
/// (bare JSON integers are tolerated) inside `range`.
fn parse_setting(
    field: &'static str,
    value: Option<&Value>,
    range: RangeInclusive<u32>,
    requirement: &'static str,
) -> Result<Option<u32>, ActionError> {
    let invalid = ActionError::InvalidSetting { field, requirement };
    let parsed = match value {
        None => return Ok(None),
        Some(Value::String(text)) => text.trim().parse::<u32>().ok(),
        Some(Value::Number(number)) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(_) => None,
    };
    match parsed {
        Some(n) if range.contains(&n) => Ok(Some(n)),
        _ => Err(invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::ChessBoard;
    use crate::models::game_state::tests::record;
    use crate::models::{MoveRecord, Timers};
    use chess::Square;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use uuid::Uuid;

    struct Fixture {
        lobby: Lobby,
        rng: StdRng,
        white: ClientId,
        black: ClientId,
        watcher: ClientId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut rng = StdRng::seed_from_u64(3);
            let white = Uuid::new_v4();
            let black = Uuid::new_v4();
            let watcher = Uuid::new_v4();
            let mut lobby = Lobby::new("ABC123".to_string(), white, &GameSettings::default(), &mut rng);
            lobby.add_member(black);
            lobby.add_member(watcher);
            Self {
                lobby,
                rng,
                white,
                black,
                watcher,
            }
        }

        fn run(&mut self, client: ClientId, command: LobbyCommand) -> (Result<ServerMessage, ActionError>, Outbox) {
            let mut out = Outbox::default();
            let result = self.lobby.handle(client, command, &mut self.rng, &mut out);
            (result, out)
        }

        fn seat_players(&mut self) {
            self.run(self.white, LobbyCommand::ClaimWhite).0.unwrap();
            self.run(self.black, LobbyCommand::ClaimBlack).0.unwrap();
        }

        fn move_args(&self, record: MoveRecord) -> MoveArgs {
            MoveArgs {
                chess_move: Some(record),
                skip: None,
                timers: Timers {
                    white: 590.0,
                    black: 600.0,
                },
            }
        }
    }

    fn actions_for(out: &Outbox, client: ClientId) -> Vec<String> {
        out.deliveries()
            .iter()
            .filter(|d| d.to == client)
            .filter_map(|d| d.message.action().map(str::to_string))
            .collect()
    }

    fn args_of(message: &ServerMessage) -> Value {
        serde_json::to_value(message).unwrap()["args"].clone()
    }

    #[test]
    fn test_second_claim_is_rejected() {
        let mut fx = Fixture::new();
        let (result, out) = fx.run(fx.white, LobbyCommand::ClaimWhite);
        assert_eq!(result.unwrap().action(), Some("claimWhite"));
        assert_eq!(actions_for(&out, fx.white), Vec::<String>::new());
        assert_eq!(actions_for(&out, fx.black), vec!["whiteClaimed"]);
        assert_eq!(args_of(&out.deliveries()[0].message), json!({"taken": true}));

        let (result, out) = fx.run(fx.black, LobbyCommand::ClaimWhite);
        assert_eq!(
            result.unwrap_err().to_string(),
            "White is already being played by another player."
        );
        assert!(out.deliveries().is_empty());
    }

    #[test]
    fn test_claiming_both_colors_starts_once() {
        let mut fx = Fixture::new();
        let (_, first) = fx.run(fx.white, LobbyCommand::ClaimWhite);
        let (_, second) = fx.run(fx.black, LobbyCommand::ClaimBlack);
        let starts = first
            .deliveries()
            .iter()
            .chain(second.deliveries())
            .filter(|d| d.message.action() == Some("startGame"))
            .count();
        assert_eq!(starts, 3);
        for member in [fx.white, fx.black, fx.watcher] {
            assert_eq!(
                actions_for(&second, member).iter().filter(|a| *a == "startGame").count(),
                1
            );
        }
    }

    #[test]
    fn test_one_client_cannot_hold_both_colors() {
        let mut fx = Fixture::new();
        fx.run(fx.white, LobbyCommand::ClaimWhite).0.unwrap();
        let (result, _) = fx.run(fx.white, LobbyCommand::ClaimBlack);
        assert_eq!(result.unwrap_err(), ActionError::AlreadyPlaying(Color::White));
        let (result, _) = fx.run(fx.white, LobbyCommand::ClaimWhite);
        assert_eq!(result.unwrap_err(), ActionError::AlreadyPlaying(Color::White));
    }

    #[test]
    fn test_only_players_reset() {
        let mut fx = Fixture::new();
        fx.seat_players();
        let (result, _) = fx.run(fx.watcher, LobbyCommand::ResetBoard);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Only black or white can reset the game."
        );

        let (result, out) = fx.run(fx.black, LobbyCommand::ResetBoard);
        let reply = result.unwrap();
        assert_eq!(reply.action(), Some("resetBoard"));
        assert_eq!(args_of(&reply)["whitePlayer"], false);
        assert_eq!(actions_for(&out, fx.watcher), vec!["resetBoard"]);
        assert!(fx.lobby.game().white_player.is_none());
    }

    #[test]
    fn test_move_onto_mine_is_broadcast() {
        let mut fx = Fixture::new();
        fx.seat_players();
        fx.lobby.game_mut().mines = [Square::E4].into_iter().collect();

        let args = fx.move_args(record("e2", "e4", "w", "p", "b"));
        let (result, out) = fx.run(fx.white, LobbyCommand::Move(args));
        let reply = result.unwrap();
        assert_eq!(reply.action(), Some("move"));
        assert_eq!(args_of(&reply)["extraInfo"]["mine"], true);
        assert_eq!(args_of(&reply)["timers"]["white"], 590.0);

        assert_eq!(actions_for(&out, fx.white), Vec::<String>::new());
        assert_eq!(actions_for(&out, fx.black), vec!["moveAll"]);
        let broadcast = &out.deliveries()[0].message;
        assert_eq!(args_of(broadcast)["move"]["to"], "e4");
        assert_eq!(fx.lobby.game().board.piece_on(Square::E4), None);
    }

    #[test]
    fn test_move_requires_turn_and_player() {
        let mut fx = Fixture::new();
        fx.seat_players();
        let args = fx.move_args(record("e7", "e5", "b", "p", "b"));
        let (result, _) = fx.run(fx.black, LobbyCommand::Move(args.clone()));
        assert_eq!(result.unwrap_err(), ActionError::NotYourTurn);
        let (result, _) = fx.run(fx.watcher, LobbyCommand::Move(args));
        assert_eq!(result.unwrap_err(), ActionError::NotAPlayer("move"));
    }

    #[test]
    fn test_illegal_move_changes_nothing() {
        let mut fx = Fixture::new();
        fx.seat_players();
        let args = fx.move_args(record("e2", "e6", "w", "p", "n"));
        let (result, out) = fx.run(fx.white, LobbyCommand::Move(args));
        assert_eq!(result.unwrap_err().to_string(), "Illegal move.");
        assert!(out.deliveries().is_empty());
        assert_eq!(fx.lobby.game().white_timer, 600.0);
        assert_eq!(fx.lobby.game().board.ply(), 0);
    }

    #[test]
    fn test_skip_passes_turn() {
        let mut fx = Fixture::new();
        fx.seat_players();
        let layout = fx.lobby.game().mines.clone();
        let args = MoveArgs {
            chess_move: None,
            skip: Some(true),
            timers: Timers::default(),
        };
        let (result, out) = fx.run(fx.white, LobbyCommand::Move(args));
        let reply = result.unwrap();
        assert!(args_of(&reply).get("move").is_none());
        assert_eq!(args_of(&reply)["extraInfo"]["minesReset"], false);
        assert_eq!(actions_for(&out, fx.watcher), vec!["moveAll"]);
        assert_eq!(fx.lobby.game().board.turn(), Color::Black);
        assert_eq!(fx.lobby.game().mines, layout);
    }

    #[test]
    fn test_missing_move_is_bad_shape() {
        let mut fx = Fixture::new();
        fx.seat_players();
        let args = MoveArgs {
            chess_move: None,
            skip: Some(false),
            timers: Timers::default(),
        };
        let (result, _) = fx.run(fx.white, LobbyCommand::Move(args));
        assert_eq!(result.unwrap_err(), ActionError::BadShape);
    }

    #[test]
    fn test_sink_result_is_private() {
        let mut fx = Fixture::new();
        fx.seat_players();
        fx.lobby.game_mut().mines = [Square::A1].into_iter().collect();
        let args = SinkArgs {
            position: crate::models::SquareArg::Name("h8".to_string()),
            timers: Timers::default(),
        };
        let (result, out) = fx.run(fx.white, LobbyCommand::Sink(args));
        let reply = args_of(&result.unwrap());
        assert_eq!(reply["success"], true);
        assert_eq!(reply["reveal"], true);
        assert_eq!(reply["squares"]["b2"], 1);
        assert_eq!(reply["squares"].as_object().unwrap().len(), 63);
        assert!(out.deliveries().is_empty());
    }

    #[test]
    fn test_costly_sink_broadcasts_forced_skip() {
        let mut fx = Fixture::new();
        fx.seat_players();
        fx.lobby.game_mut().mines = [Square::C6].into_iter().collect();
        fx.lobby.game_mut().white_free_sink = false;
        let args = SinkArgs {
            position: crate::models::SquareArg::Index(42),
            timers: Timers::default(),
        };
        let (result, out) = fx.run(fx.white, LobbyCommand::Sink(args));
        let reply = args_of(&result.unwrap());
        assert_eq!(reply["squares"]["c6"], "mine");
        assert_eq!(reply["forfeited"], true);
        for member in [fx.white, fx.black, fx.watcher] {
            assert_eq!(actions_for(&out, member), vec!["moveAll"]);
        }
        assert_eq!(fx.lobby.game().board.turn(), Color::Black);
    }

    #[test]
    fn test_invalid_settings_change_nothing() {
        let mut fx = Fixture::new();
        fx.seat_players();
        let before = fx.lobby.game().settings();
        let fen = fx.lobby.game().board.fen();
        let args = SettingsArgs {
            starting_time: Some(json!("300")),
            increment: Some(json!("-1")),
            ..SettingsArgs::default()
        };
        let (result, out) = fx.run(fx.white, LobbyCommand::UpdateSettings(args));
        assert!(matches!(
            result.unwrap_err(),
            ActionError::InvalidSetting { field: "increment", .. }
        ));
        assert!(out.deliveries().is_empty());
        assert_eq!(fx.lobby.game().settings(), before);
        assert_eq!(fx.lobby.game().board.fen(), fen);

        for bad in [json!("0"), json!("ten"), json!("1.5"), json!(true)] {
            let args = SettingsArgs {
                starting_time: Some(bad),
                ..SettingsArgs::default()
            };
            assert!(fx.run(fx.white, LobbyCommand::UpdateSettings(args)).0.is_err());
        }
        let args = SettingsArgs {
            mine_count_per_side: Some(json!("33")),
            ..SettingsArgs::default()
        };
        assert!(fx.run(fx.black, LobbyCommand::UpdateSettings(args)).0.is_err());
        assert_eq!(fx.lobby.game().settings(), before);
    }

    #[test]
    fn test_valid_settings_reset_board_for_everyone() {
        let mut fx = Fixture::new();
        fx.seat_players();
        let args = fx.move_args(record("e2", "e4", "w", "p", "b"));
        fx.run(fx.white, LobbyCommand::Move(args)).0.unwrap();

        let args = SettingsArgs {
            starting_time: Some(json!("180")),
            increment: Some(json!(2)),
            mine_count_per_side: Some(json!("5")),
            moves_until_reset: Some(json!("0")),
        };
        let (result, out) = fx.run(fx.black, LobbyCommand::UpdateSettings(args));
        let reply = args_of(&result.unwrap());
        assert_eq!(reply["timeControls"], json!([180, 2]));
        assert_eq!(reply["mineCount"], 10);
        assert_eq!(reply["movesUntilReset"], 0);

        for member in [fx.white, fx.black, fx.watcher] {
            assert_eq!(actions_for(&out, member), vec!["resetBoard"]);
        }
        let game = fx.lobby.game();
        assert_eq!(game.mines.len(), 10);
        assert_eq!(game.board.ply(), 0);
        assert_eq!(game.timers(), Timers { white: 180.0, black: 180.0 });
        assert_eq!(game.color_of(fx.white), Some(Color::White));
        assert_eq!(game.color_of(fx.black), Some(Color::Black));
    }

    #[test]
    fn test_moves_until_reset_is_capped() {
        let mut fx = Fixture::new();
        fx.seat_players();
        let args = SettingsArgs {
            moves_until_reset: Some(json!("4294967295")),
            ..SettingsArgs::default()
        };
        let (result, _) = fx.run(fx.white, LobbyCommand::UpdateSettings(args));
        assert!(matches!(
            result.unwrap_err(),
            ActionError::InvalidSetting { field: "movesUntilReset", .. }
        ));

        let args = SettingsArgs {
            moves_until_reset: Some(json!("2147483647")),
            ..SettingsArgs::default()
        };
        fx.run(fx.white, LobbyCommand::UpdateSettings(args)).0.unwrap();
        assert_eq!(fx.lobby.game().moves_until_reset, MAX_MOVES_UNTIL_RESET);

        let args = MoveArgs {
            chess_move: None,
            skip: Some(true),
            timers: Timers::default(),
        };
        let reply = fx.run(fx.white, LobbyCommand::Move(args)).0.unwrap();
        assert_eq!(args_of(&reply)["extraInfo"]["minesReset"], false);
    }

    #[test]
    fn test_exposed_king_is_announced() {
        let mut fx = Fixture::new();
        fx.seat_players();
        fx.lobby.game_mut().board = ChessBoard::from_fen("4r2k/8/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
        fx.lobby.game_mut().mines = [Square::E4].into_iter().collect();

        let args = fx.move_args(record("e2", "e4", "w", "r", "n"));
        let (result, out) = fx.run(fx.white, LobbyCommand::Move(args));
        assert_eq!(args_of(&result.unwrap())["extraInfo"]["gameOver"], true);
        let broadcast = &out.deliveries()[0].message;
        assert_eq!(args_of(broadcast)["extraInfo"]["gameOver"], true);

        let args = fx.move_args(record("h8", "g8", "b", "k", "n"));
        let (result, _) = fx.run(fx.black, LobbyCommand::Move(args));
        assert_eq!(result.unwrap_err().to_string(), "The game is over.");
    }

    #[test]
    fn test_player_leaving_releases_color() {
        let mut fx = Fixture::new();
        fx.seat_players();
        let args = fx.move_args(record("d2", "d4", "w", "p", "b"));
        fx.run(fx.white, LobbyCommand::Move(args)).0.unwrap();

        let mut out = Outbox::default();
        let (lobby, rng) = (&mut fx.lobby, &mut fx.rng);
        lobby.remove_member(fx.black, rng, &mut out);

        assert!(!fx.lobby.members().contains(&fx.black));
        assert_eq!(fx.lobby.game().black_player, None);
        assert_eq!(fx.lobby.game().white_player, Some(fx.white));
        assert_eq!(fx.lobby.game().board.ply(), 0);
        assert_eq!(actions_for(&out, fx.black), Vec::<String>::new());
        assert_eq!(actions_for(&out, fx.watcher), vec!["blackClaimed"]);
        let notice = args_of(&out.deliveries()[0].message);
        assert_eq!(notice["taken"], false);
        assert_eq!(notice["mineCount"], 8);
    }

    #[test]
    fn test_watcher_leaving_is_silent() {
        let mut fx = Fixture::new();
        fx.seat_players();
        let mut out = Outbox::default();
        let (lobby, rng) = (&mut fx.lobby, &mut fx.rng);
        lobby.remove_member(fx.watcher, rng, &mut out);
        assert!(out.deliveries().is_empty());
        assert_eq!(fx.lobby.members().len(), 2);
    }

    #[test]
    fn test_parse_setting_accepts_strings_and_integers() {
        let range = 0..=u32::MAX;
        assert_eq!(parse_setting("x", None, range.clone(), "r"), Ok(None));
        assert_eq!(parse_setting("x", Some(&json!(" 42 ")), range.clone(), "r"), Ok(Some(42)));
        assert_eq!(parse_setting("x", Some(&json!(7)), range.clone(), "r"), Ok(Some(7)));
        assert!(parse_setting("x", Some(&json!(-7)), range, "r").is_err());
    }
}
