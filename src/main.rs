use std::io;
use std::process;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use tasklane::auth::{
    MemorySessionStore, PasswordHasher, RedisSessionStore, SessionStore, TokenCodec,
};
use tasklane::config::Config;
use tasklane::repository::{PgTaskRepository, PgUserRepository};
use tasklane::routes::{self, health};
use tasklane::AppState;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn io_error(context: &str, error: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, error))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {}", e);
            process::exit(1);
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    let connect_options = PgConnectOptions::from_str(&config.database_url)
        .map_err(|e| io_error("invalid DATABASE_URL", e))?
        .options([("statement_timeout", config.store_timeout.as_millis().to_string())]);
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(config.store_timeout)
        .connect_with(connect_options)
        .await
        .map_err(|e| io_error("failed to connect to database", e))?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|e| io_error("failed to run migrations", e))?;

    let sessions: Arc<dyn SessionStore> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisSessionStore::connect(url, config.store_timeout)
                .await
                .map_err(|e| io_error("failed to connect to redis", e))?,
        ),
        None => {
            log::warn!("REDIS_URL is not set; sessions are kept in process memory and are not shared between instances");
            let store = Arc::new(MemorySessionStore::new());
            let sweeper = Arc::clone(&store);
            actix_web::rt::spawn(async move {
                let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
                loop {
                    ticker.tick().await;
                    sweeper.purge_expired();
                }
            });
            store
        }
    };

    let state = web::Data::new(AppState::new(
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(PgTaskRepository::new(pool.clone())),
        sessions,
        PasswordHasher::new(config.bcrypt_cost),
        TokenCodec::new(config.jwt_secret.as_bytes(), config.app_name.clone()),
        config.token_ttl,
    ));

    log::info!("Starting {} server at {}", config.app_name, config.server_url());

    HttpServer::new(move || {
        let authenticator = state.authenticator.clone();
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(web::scope("/v1").configure(routes::config(authenticator)))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await?;

    log::info!("Server stopped, closing database pool");
    pool.close().await;
    Ok(())
}
