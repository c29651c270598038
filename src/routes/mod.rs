use actix_web::web;

/// Configure the HTTP routes
///
/// The game is played entirely over the WebSocket; `/` and `/ws` both upgrade.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/").route(web::get().to(crate::websocket::ws_index)));
}
