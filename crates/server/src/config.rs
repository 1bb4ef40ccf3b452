use std::net::IpAddr;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use newsfeed_core::builder::NewsfeedConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            base_path: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub domain: NewsfeedConfig,
}

impl AppConfig {
    /// Loads config.toml (if present) overridden by `NEWSFEED_`-prefixed
    /// environment variables.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("config.toml").nested())
            .merge(Env::prefixed("NEWSFEED_").split("__"))
            .extract()
    }

    pub fn bind_address(&self) -> Result<std::net::SocketAddr, std::net::AddrParseError> {
        let ip: IpAddr = self.server.host.parse()?;
        Ok(std::net::SocketAddr::new(ip, self.server.port))
    }
}
