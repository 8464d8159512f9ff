use std::io;

use actix::Actor;
use actix_cors::Cors;
use actix_web::http::{StatusCode, header};
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::{App, HttpServer};
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info, warn};

use forum_backend::app::{AppState, Stores};
use forum_backend::config::{AppConfig, StorageBackend};
use forum_backend::database::{RedisService, connect_to_mongo, connect_to_redis};
use forum_backend::middleware::error_handler::handle_error;
use forum_backend::middleware::not_found::not_found;
use forum_backend::realtime::BroadcastHub;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let stores = match config.storage_backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage, data will not survive a restart");
            Stores::in_memory()
        }
        StorageBackend::Mongo => {
            let client = connect_to_mongo(&config.mongodb_uri)
                .await
                .map_err(io::Error::other)?;
            Stores::mongo(&client, &config.database_name)
                .await
                .map_err(|e| io::Error::other(e.to_string()))?
        }
    };

    let redis = match config.redis_url.as_deref() {
        Some(url) => match connect_to_redis(url).await {
            Ok(client) => Some(RedisService::new(&client)),
            Err(e) => {
                warn!("Redis unavailable, running without sessions and rate limits: {}", e);
                None
            }
        },
        None => {
            info!("REDIS_URL not set, running without sessions and rate limits");
            None
        }
    };

    let hub = BroadcastHub::new().start();
    let state = AppState::new(config.clone(), stores, redis, hub);

    state
        .category_service()
        .seed_defaults()
        .await
        .map_err(|e| io::Error::other(e.to_string()))?;

    let bind_addr = (config.host.clone(), config.port);
    let cors_origin = config.cors_origin.clone();

    info!("Starting server on http://{}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&cors_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .supports_credentials()
            .max_age(3600);

        let state = state.clone();
        App::new()
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::NOT_FOUND, not_found)
                    .default_handler(handle_error),
            )
            .wrap(cors)
            .wrap(Logger::default())
            .configure(move |cfg| state.configure(cfg))
    })
    .bind(bind_addr)?
    .run()
    .await?;

    info!("Server has stopped");

    Ok(())
}
