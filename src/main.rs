use actix_web::middleware::Logger;
use actix_web::{App, HttpServer};
use diner_feedback::api::AppState;
use diner_feedback::config::Config;
use diner_feedback::db::Database;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize the database
    let db = match Database::open(&config.db_path) {
        Ok(db) => db,
        Err(e) => {
            log::error!("Failed to open database {}: {}", config.db_path, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = db.create_schema().await {
        log::error!("Failed to create schema: {}", e);
        std::process::exit(1);
    }

    let state = AppState::new(db.clone(), &config);
    log::info!("listening on http://{}", &config.bind_addr);

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(Logger::default())
            .configure(move |cfg| state.configure(cfg))
    })
    .bind(&config.bind_addr)?
    .run()
    .await?;

    // Workers are gone by now; release the connection explicitly
    if let Err(e) = db.close() {
        log::error!("Failed to close database: {}", e);
    }
    log::info!("shut down");
    Ok(())
}
