use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware::Logger, web};
use dotenv::dotenv;
use migration::{Migrator, MigratorTrait};
use soultalk_backend::assistant::Assistant;
use soultalk_backend::assistant::gemini::GeminiClient;
use soultalk_backend::auth::jwt::JwtService;
use soultalk_backend::cache::{CacheConfig, RedisCache};
use soultalk_backend::config::AppConfig;
use soultalk_backend::create_pool;
use soultalk_backend::gateway::PaymentGateway;
use soultalk_backend::gateway::chapa::ChapaClient;
use soultalk_backend::handlers;
use soultalk_backend::realtime::hub::RealtimeHub;
use soultalk_backend::storage::{FileStorage, LocalStorage};
use std::io;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    io::Error::other(format!("{context}: {e}"))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = AppConfig::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    let db = create_pool(&config.database_url)
        .await
        .map_err(|e| startup_error("Failed to connect to database", e))?;
    Migrator::up(&db, None)
        .await
        .map_err(|e| startup_error("Failed to run migrations", e))?;
    let db_data = web::Data::new(db);

    let redis_cache = RedisCache::new(&config.redis_url)
        .await
        .map_err(|e| startup_error("Failed to connect to Redis", e))?;
    let redis_data = web::Data::new(Arc::new(redis_cache));
    let cache_config = web::Data::new(CacheConfig::from_env());
    tracing::info!("Connected to Redis");

    let jwt = web::Data::new(JwtService::new(&config.jwt));

    if config.chapa.is_dev_mode() {
        tracing::warn!("CHAPA_SECRET_KEY missing or placeholder, payment verification runs in dev mode");
    }
    let gateway: Arc<dyn PaymentGateway> = Arc::new(ChapaClient::new(&config.chapa));
    let gateway = web::Data::new(gateway);

    let assistant: Arc<dyn Assistant> = Arc::new(
        GeminiClient::new(&config.gemini)
            .map_err(|e| startup_error("Failed to build AI client", e))?,
    );
    let assistant = web::Data::new(assistant);

    let media_root = config.media_root.clone();
    std::fs::create_dir_all(&media_root)?;
    let storage: Arc<dyn FileStorage> = Arc::new(LocalStorage::new(media_root.clone()));
    let storage = web::Data::new(storage);

    // Live socket registry shared by the WebSocket endpoint and REST handlers.
    let hub = web::Data::new(Arc::new(RealtimeHub::new()));

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let config_data = web::Data::new(config);
    tracing::info!("Server running at http://{bind_addr}");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(db_data.clone())
            .app_data(redis_data.clone())
            .app_data(cache_config.clone())
            .app_data(jwt.clone())
            .app_data(gateway.clone())
            .app_data(assistant.clone())
            .app_data(storage.clone())
            .app_data(hub.clone())
            .app_data(config_data.clone())
            .service(web::scope("/api").configure(handlers::init_routes))
            .service(Files::new("/media", media_root.clone()))
    })
    .bind(&bind_addr)?
    .run()
    .await
}
