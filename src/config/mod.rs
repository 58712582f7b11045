use std::env;
use std::time::Duration;

const DEFAULT_PATREON_API_URL: &str = "https://www.patreon.com/api/oauth2/v2";
const DEFAULT_JWT_EXPIRATION_HOURS: u64 = 24;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub server_host: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub login_rate_limit: u32,
    pub form_rate_limit: u32,
    pub patreon_access_token: String,
    pub patreon_campaign_id: String,
    pub patreon_cache_ttl_secs: u64,
    pub patreon_api_url: String,
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let jwt_expiration = parse_expiration_hours(&var_or("JWT_EXPIRATION", "24h"));

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_secs: jwt_expiration * 3600,
            server_host: var_or("SERVER_HOST", "0.0.0.0"),
            server_port: var_or("PORT", "8080").parse().unwrap_or(8080),
            cors_origins: parse_origins(&var_or("CORS_ORIGINS", "")),
            rate_limit_window_secs: parse_window_secs(&var_or("RATE_LIMIT_WINDOW", "60")),
            rate_limit_requests: var_or("RATE_LIMIT_REQUESTS", "100").parse().unwrap_or(100),
            login_rate_limit: var_or("LOGIN_RATE_LIMIT", "5").parse().unwrap_or(5),
            form_rate_limit: var_or("FORM_RATE_LIMIT", "10").parse().unwrap_or(10),
            patreon_access_token: var_or("PATREON_ACCESS_TOKEN", ""),
            patreon_campaign_id: var_or("PATREON_CAMPAIGN_ID", ""),
            patreon_cache_ttl_secs: var_or("PATREON_CACHE_TTL", "900").parse().unwrap_or(900),
            patreon_api_url: var_or("PATREON_API_URL", DEFAULT_PATREON_API_URL),
            admin_username: var_or("ADMIN_USERNAME", "admin"),
            admin_email: var_or("ADMIN_EMAIL", "admin@subcult.tv"),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn patreon_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.patreon_cache_ttl_secs)
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        tracing::debug!("{} not set, using default", key);
        default.to_string()
    })
}

/// `JWT_EXPIRATION` is a whole number of hours, optionally suffixed with `h`.
fn parse_expiration_hours(raw: &str) -> u64 {
    match raw.trim().trim_end_matches('h').parse::<u64>() {
        Ok(hours) if hours > 0 => hours,
        _ => {
            tracing::warn!(
                "Invalid JWT_EXPIRATION {:?}, using {}h",
                raw,
                DEFAULT_JWT_EXPIRATION_HOURS
            );
            DEFAULT_JWT_EXPIRATION_HOURS
        }
    }
}

// 窗口为 0 时计数永不重置，清理任务也无法调度
fn parse_window_secs(raw: &str) -> u64 {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => secs,
        _ => {
            tracing::warn!(
                "Invalid RATE_LIMIT_WINDOW {:?}, using {}s",
                raw,
                DEFAULT_RATE_LIMIT_WINDOW_SECS
            );
            DEFAULT_RATE_LIMIT_WINDOW_SECS
        }
    }
}

/// Splits a comma separated origin list, falling back to the local dev server.
fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect();

    if origins.is_empty() {
        vec!["http://localhost:5175".to_string()]
    } else {
        origins
    }
}
