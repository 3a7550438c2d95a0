//! Listener configuration for the admin API and the mock listener.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_ADMIN_PORT: u16 = 2525;
pub const DEFAULT_MOCK_PORT: u16 = 8080;

/// `admin` section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AdminConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_admin_port")]
    pub port: u16,
}

/// `mock` section
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MockConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_mock_port")]
    pub port: u16,
}

impl AdminConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl MockConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_admin_port() -> u16 {
    DEFAULT_ADMIN_PORT
}

fn default_mock_port() -> u16 {
    DEFAULT_MOCK_PORT
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_admin_port(),
        }
    }
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_mock_port(),
        }
    }
}
