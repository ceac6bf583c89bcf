use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::err::decode_error::ReError;

/// 默认的连接超时时间
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Client settings loaded from a TOML file.
///
/// ```toml
/// addr = "127.0.0.1:3306"
/// user = "root"
/// password = "123456"
/// database = "test"
/// read_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// `host:port`, or a unix socket path such as `/var/run/mysqld/mysqld.sock`.
    pub addr: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: Option<u64>,
    pub write_timeout_ms: Option<u64>,

    pub buffer_size: Option<usize>,
    pub charset: Option<String>,
    pub collation: Option<String>,

    /// Upgrade to TLS after the greeting.
    #[serde(default)]
    pub ssl: bool,
    /// Accept any server certificate when `ssl` is on.
    #[serde(default)]
    pub ssl_skip_verify: bool,

    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            addr: "127.0.0.1:3306".to_string(),
            user: "root".to_string(),
            password: String::new(),
            database: String::new(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_ms: None,
            write_timeout_ms: None,
            buffer_size: None,
            charset: None,
            collation: None,
            ssl: false,
            ssl_skip_verify: false,
            attributes: HashMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout_ms.map(Duration::from_millis)
    }
}

pub fn parse_config(content: &str) -> Result<ClientConfig, ReError> {
    toml::from_str(content).map_err(|e| ReError::ConfigFileParseErr(e.to_string()))
}

pub fn read_config<P: AsRef<Path>>(path: P) -> Result<ClientConfig, ReError> {
    let mut file = File::open(path.as_ref())?;
    let mut s = String::new();
    file.read_to_string(&mut s)?;
    parse_config(s.as_str())
}
