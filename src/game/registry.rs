use log::{debug, info, warn};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::collections::HashMap;

use crate::game::lobby::Lobby;
use crate::models::{
    parse_args, ActionError, ClientEnvelope, ClientId, GameSettings, JoinLobbyArgs, LobbyCommand,
    LobbyJoined, Outbox, ProtocolError, ServerMessage,
};

const LOBBY_CODE_LENGTH: usize = 6;

/// Owns every lobby and knows which lobby each client is in.
///
/// Each call handles one inbound frame or disconnect to completion and
/// returns the messages it produced, so callers only need to serialize calls.
pub struct ConnectionRegistry {
    lobbies: HashMap<String, Lobby>,
    memberships: HashMap<ClientId, String>,
    settings: GameSettings,
    rng: StdRng,
}

impl ConnectionRegistry {
    pub fn new(settings: GameSettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    pub fn with_rng(settings: GameSettings, rng: StdRng) -> Self {
        Self {
            lobbies: HashMap::new(),
            memberships: HashMap::new(),
            settings,
            rng,
        }
    }

    #[cfg(test)]
    pub fn lobby(&self, code: &str) -> Option<&Lobby> {
        self.lobbies.get(code)
    }

    #[cfg(test)]
    pub fn lobby_of(&self, client: ClientId) -> Option<&Lobby> {
        self.memberships.get(&client).and_then(|code| self.lobbies.get(code))
    }

    #[cfg(test)]
    pub fn lobby_mut(&mut self, code: &str) -> Option<&mut Lobby> {
        self.lobbies.get_mut(code)
    }

    pub fn lobby_count(&self) -> usize {
        self.lobbies.len()
    }

    /// Handle one text frame from `client`. Never fails: every problem is
    /// answered with an error envelope.
    pub fn handle_text(&mut self, client: ClientId, text: &str) -> Outbox {
        let mut out = Outbox::default();

        let envelope: ClientEnvelope = match serde_json::from_str(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Error parsing message from {}: {}", client, e);
                out.send(client, ServerMessage::error(ProtocolError::from(e)));
                return out;
            }
        };

        debug!("Client {} invoked {}", client, envelope.action);
        let action = envelope.action;
        if let Err(error) = self.route(client, &action, envelope.args, &mut out) {
            warn!("Rejected {} from {}: {}", action, client, error);
            out.send(client, ServerMessage::action_error(&action, &error));
        }
        out
    }

    /// Forget `client`, releasing its color and destroying its lobby if empty.
    pub fn disconnect(&mut self, client: ClientId) -> Outbox {
        let mut out = Outbox::default();
        self.leave_current(client, &mut out);
        info!("Client {} disconnected", client);
        out
    }

    fn route(
        &mut self,
        client: ClientId,
        action: &str,
        args: Option<Value>,
        out: &mut Outbox,
    ) -> Result<(), ActionError> {
        match action {
            "joinLobby" => {
                let args: JoinLobbyArgs = parse_args(args)?;
                self.join_lobby(client, &args.lobby_code, out)?;
                self.welcome(client, action, &args.lobby_code, out);
            }
            "createLobby" => {
                let code = self.create_lobby(client, out);
                self.welcome(client, action, &code, out);
            }
            _ => {
                let code = self.memberships.get(&client).ok_or(ActionError::NotInLobby)?;
                if action.starts_with('_') {
                    return Err(ActionError::BuiltIn);
                }
                let command = match LobbyCommand::parse(action, args)? {
                    Some(command) => command,
                    None => {
                        warn!("Unknown action from {}: {}", client, action);
                        let error = ProtocolError::UnknownAction(action.to_string());
                        out.send(client, ServerMessage::error(error));
                        return Ok(());
                    }
                };
                let lobby = self.lobbies.get_mut(code).ok_or(ActionError::NotInLobby)?;
                let reply = lobby.handle(client, command, &mut self.rng, out)?;
                out.send(client, reply);
            }
        }
        Ok(())
    }

    /// Reply to a successful join or create, then send the board.
    fn welcome(&self, client: ClientId, action: &str, code: &str, out: &mut Outbox) {
        let joined = LobbyJoined {
            lobby_code: code.to_string(),
        };
        out.send(client, ServerMessage::new(action, &joined));
        if let Some(lobby) = self.lobbies.get(code) {
            out.send(client, ServerMessage::new("setBoard", &lobby.game().snapshot()));
        }
    }

    fn join_lobby(&mut self, client: ClientId, code: &str, out: &mut Outbox) -> Result<(), ActionError> {
        if !self.lobbies.contains_key(code) {
            return Err(ActionError::LobbyNotFound);
        }
        if self.memberships.get(&client).map(String::as_str) == Some(code) {
            return Ok(());
        }

        self.leave_current(client, out);
        let lobby = self.lobbies.get_mut(code).ok_or(ActionError::LobbyNotFound)?;
        lobby.add_member(client);
        self.memberships.insert(client, code.to_string());
        info!(
            "Client {} joined lobby {} ({} members)",
            client,
            code,
            lobby.members().len()
        );
        Ok(())
    }

    fn create_lobby(&mut self, client: ClientId, out: &mut Outbox) -> String {
        self.leave_current(client, out);

        let code = self.generate_code();
        let lobby = Lobby::new(code.clone(), client, &self.settings, &mut self.rng);
        self.lobbies.insert(code.clone(), lobby);
        self.memberships.insert(client, code.clone());
        info!(
            "Client {} created lobby {} ({} lobbies open)",
            client,
            code,
            self.lobbies.len()
        );
        code
    }

    fn leave_current(&mut self, client: ClientId, out: &mut Outbox) {
        let code = match self.memberships.remove(&client) {
            Some(code) => code,
            None => return,
        };
        if let Some(lobby) = self.lobbies.get_mut(&code) {
            lobby.remove_member(client, &mut self.rng, out);
            if lobby.is_empty() {
                self.lobbies.remove(&code);
                info!("Lobby {} is empty, removed", code);
            }
        }
    }

    fn generate_code(&mut self) -> String {
        loop {
            let code: String = (&mut self.rng)
                .sample_iter(&Alphanumeric)
                .take(LOBBY_CODE_LENGTH)
                .map(char::from)
                .collect();
            if !self.lobbies.contains_key(&code) {
                return code;
            }
        }
    }
}
