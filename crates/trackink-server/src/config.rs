//! Server configuration from flags and environment.

use crate::relay::CHANNEL_CAPACITY;
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// trackink relay server
#[derive(Debug, Clone, Parser)]
#[command(name = "trackink-server", version, about)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3030)]
    pub port: u16,

    /// Frames buffered per channel before slow peers start skipping
    #[arg(long, env = "TRACKINK_CHANNEL_CAPACITY", default_value_t = CHANNEL_CAPACITY)]
    pub channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3030,
            channel_capacity: CHANNEL_CAPACITY,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
