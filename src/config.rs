//! Server configuration, read from command-line flags or `RDLM_*`
//! environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

/// Ceiling for `--max-wait` and `--max-lifetime`: one year, in seconds.
pub const LIMIT_CEILING_SECS: u64 = 365 * 24 * 60 * 60;

/// Upper bounds applied to acquire requests before they reach the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_wait: Duration,
    pub max_lifetime: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_wait: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "rdlm", version, about = "Restful distributed lock manager")]
pub struct ServerConfig {
    /// Address the HTTP gateway listens on
    #[arg(long, env = "RDLM_LISTEN", default_value = "127.0.0.1:8888")]
    pub listen: SocketAddr,

    /// Milliseconds between expiry sweeps
    #[arg(
        long,
        env = "RDLM_REAPER_INTERVAL_MS",
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub reaper_interval_ms: u64,

    /// Longest wait (seconds) an acquire may ask for
    #[arg(
        long,
        env = "RDLM_MAX_WAIT",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(..=LIMIT_CEILING_SECS)
    )]
    pub max_wait: u64,

    /// Longest lifetime (seconds) an acquire may ask for
    #[arg(
        long,
        env = "RDLM_MAX_LIFETIME",
        default_value_t = 3600,
        value_parser = clap::value_parser!(u64).range(1..=LIMIT_CEILING_SECS)
    )]
    pub max_lifetime: u64,

    /// Default log filter; `RUST_LOG` takes precedence
    #[arg(long, env = "RDLM_LOG", default_value = "info")]
    pub log: String,
}

impl ServerConfig {
    pub fn limits(&self) -> Limits {
        Limits {
            max_wait: Duration::from_secs(self.max_wait),
            max_lifetime: Duration::from_secs(self.max_lifetime),
        }
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_millis(self.reaper_interval_ms)
    }
}
