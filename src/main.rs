mod analytics;
mod config;
mod errors;
mod filters;
mod handlers;
mod models;
mod store;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use crate::config::AppConfig;
use crate::store::ReviewStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|err| {
        log::error!("Invalid configuration: {err}");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string())
    })?;

    let store = match &config.seed_file {
        Some(path) => ReviewStore::from_file(path).await,
        None => ReviewStore::seeded(),
    }
    .map_err(|err| {
        log::error!("Failed to load reviews: {err}");
        std::io::Error::new(std::io::ErrorKind::InvalidData, err.to_string())
    })?;

    log::info!(
        "Review store ready with {} reviews across {} properties",
        store.len(),
        store.list_properties().len()
    );

    let store = web::Data::new(store);
    let bind_address = config.bind_address();

    log::info!("Starting review moderation service on {}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(store.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .run()
    .await
}
