use config::Config;
use patreon::PatreonClient;
use sqlx::PgPool;

pub mod common;
pub mod config;
pub mod database;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod patreon;
pub mod router;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub patreon: PatreonClient,
}
