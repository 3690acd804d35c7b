use anyhow::Context;
use axum::http::HeaderValue;
use std::net::SocketAddr;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Server settings read from the environment.
///
/// | Variable      | Default                 |
/// |---------------|-------------------------|
/// | `HOST`        | `0.0.0.0`               |
/// | `PORT`        | `3001`                  |
/// | `CORS_ORIGIN` | `http://localhost:3000` |
/// | `ADMIN_KEY`   | unset (admin disabled)  |
///
/// `CORS_ORIGIN` must name a single origin; `*` is rejected since responses
/// allow credentials.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: HeaderValue,
    pub admin_key: Option<String>,
}

impl ServerConfig {
    /// Reads the configuration from process environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {raw:?}"))?,
            None => DEFAULT_PORT,
        };

        let origin = lookup("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());
        // Credentialed CORS requires a concrete origin
        if origin.trim() == "*" {
            anyhow::bail!("CORS_ORIGIN cannot be `*` because credentials are allowed; set a specific origin");
        }
        let cors_origin = HeaderValue::from_str(&origin)
            .with_context(|| format!("CORS_ORIGIN is not a valid header value: {origin:?}"))?;

        let admin_key = lookup("ADMIN_KEY").filter(|key| !key.is_empty());

        Ok(Self {
            host,
            port,
            cors_origin,
            admin_key,
        })
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
