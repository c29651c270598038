use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::models::{AppState, ClientId, ClientText, ServerMessage};

/// One WebSocket connection. All game logic lives behind `AppState`.
pub struct GameSocket {
    pub id: ClientId,
    pub app_state: web::Data<AppState>,
}

impl Actor for GameSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let total_sessions = self.app_state.register(self.id, ctx.address());
        info!("WebSocket connection started: {}", self.id);
        info!("Total active sessions: {}", total_sessions);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        let open_lobbies = self.app_state.disconnect(self.id);
        let total_sessions = self.app_state.unregister(self.id);
        info!("WebSocket connection closed: {}", self.id);
        info!(
            "Total active sessions: {}, open lobbies: {}",
            total_sessions, open_lobbies
        );

        Running::Stop
    }
}

impl Handler<ClientText> for GameSocket {
    type Result = ();

    fn handle(&mut self, msg: ClientText, ctx: &mut Self::Context) {
        debug!("Forwarding message to client {}: {}", self.id, msg.0);
        ctx.text(msg.0);
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for GameSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                // Do nothing for pong messages
            }
            Ok(ws::Message::Text(text)) => {
                debug!("Received text message from {}: {}", self.id, text);
                self.app_state.handle_text(self.id, &text);
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                ctx.text(ServerMessage::error("Binary messages are not supported").to_text());
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                warn!("WebSocket protocol error on {}: {}", self.id, e);
                ctx.stop();
            }
        }
    }
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let id = Uuid::new_v4();
    info!("New WebSocket connection: {}", id);

    let socket = GameSocket {
        id,
        app_state: app_state.clone(),
    };

    ws::start(socket, &req, stream)
}
