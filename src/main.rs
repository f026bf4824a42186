use actix_cors::Cors;
use actix_web::{http, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};

use videoflow_backend::{config::Config, handlers, services, AppState};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let db_pool = match services::init_db_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database {}: {:?}", config.database_url, e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e));
        }
    };

    let bind_addr = (config.host.clone(), config.port);
    let allowed_origins = config.cors_allowed_origins.clone();
    let app_state = web::Data::new(AppState { db_pool, config });

    info!("Starting HTTP server on {}:{}", bind_addr.0, bind_addr.1);
    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
            .supports_credentials();

        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .configure(handlers::configure_routes)
    })
    .bind(bind_addr)?
    .run()
    .await
}
