mod auth;
mod logger;
mod rate_limit;
mod security;

pub use auth::auth_middleware;
pub use logger::{log_errors, log_requests};
pub use rate_limit::{RateLimiter, RateLimiters, client_key, rate_limit};
pub use security::security_headers;
