use std::time::Duration;

pub mod bytes;
pub mod commands;
pub mod conn;
pub mod declar;
pub mod packet;

///Packet Constants
pub const PACKET_HEADER_SIZE: usize = 4;
pub const COMPRESSED_HEADER_SIZE: usize = 7;
/// 单个packet payload的最大长度, 超过时需要拆包
pub const MAX_PAYLOAD_LEN: usize = 16777215;
pub const NULL_TERMINATOR: u8 = 0;

/// Payloads shorter than this are sent uncompressed even when compression is on.
pub const MIN_COMPRESS_LENGTH: usize = 50;

/// max_packet_size advertised in the handshake response.
pub const MAX_PACKET_SIZE: u32 = 16777216;

pub const PROTOCOL_VERSION: u8 = 10;
/// Greeting sent by the X Protocol port (33060).
pub const X_PROTOCOL_VERSION: u8 = 11;

pub const DEFAULT_CHARSET: &str = "utf8";
pub const DEFAULT_COLLATION_NAME: &str = "utf8_general_ci";
pub const DEFAULT_COLLATION_ID: u8 = 33;

/// Most columns a table or resultset can have.
pub const MAX_COLUMN_COUNT: usize = 4096;

/// Upper bound of auth exchange packets read after the handshake response.
pub const MAX_AUTH_ROUNDS: usize = 8;

/// zstd level sent in the handshake response when zstd compression is requested.
pub const ZSTD_COMPRESSION_LEVEL: u8 = 3;

/// Default read buffer size of the packet channel, 64kb.
pub const DEFAULT_BUFFER_SIZE: usize = 65536;

/// Timeout constants
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
