use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

pub const SERVICE_NAME: &str = "learnpath-backend-rust";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_LOG_DIR: &str = "./logs";

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

/// Runtime settings, read once at startup. Everything comes from the
/// environment (or `.env` via dotenvy); unparseable values fall back to
/// defaults instead of aborting.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    /// Directory for rolling log files; `None` leaves file logging off.
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        let log_dir = env_flag("ENABLE_FILE_LOGS").then(|| {
            PathBuf::from(std::env::var("LOG_DIR").unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string()))
        });

        Self {
            host: env_parse("HOST", IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))),
            port: env_parse("PORT", DEFAULT_PORT),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_dir,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
