use actix_web::{web, App, HttpServer};
use log::{error, info};
use std::io;

mod config;
mod game;
mod models;
mod routes;
mod websocket;

use crate::config::Config;
use crate::models::AppState;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(io::Error::new(io::ErrorKind::InvalidInput, e));
        }
    };

    info!(
        "Starting minesweeper chess server at ws://{}:{}",
        config.host, config.port
    );
    info!("New lobbies start with {:?}", config.game);

    // Create shared application state
    let app_state = web::Data::new(AppState::new(config.game));

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
