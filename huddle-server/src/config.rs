use anyhow::Context;
use std::env;
use std::net::SocketAddr;

/// Runtime configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the signaling server listens on. `HUDDLE_ADDR`, default
    /// `0.0.0.0:3000`.
    pub bind_addr: SocketAddr,
    /// Capacity of the coordinator command channel. `HUDDLE_COMMAND_BUFFER`,
    /// default 256.
    pub command_buffer: usize,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let addr = env::var("HUDDLE_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_addr = addr
            .parse()
            .with_context(|| format!("invalid HUDDLE_ADDR: {addr}"))?;

        let command_buffer = match env::var("HUDDLE_COMMAND_BUFFER") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("invalid HUDDLE_COMMAND_BUFFER: {v}"))?,
            Err(_) => 256,
        };

        Ok(Self {
            bind_addr,
            command_buffer,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            command_buffer: 256,
        }
    }
}
