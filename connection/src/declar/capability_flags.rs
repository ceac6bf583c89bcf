//! Client/server capability bits, as sent in the greeting and the handshake response.
//!
//! ref: https://dev.mysql.com/doc/dev/mysql-server/latest/group__group__cs__capabilities__flags.html

pub const CLIENT_LONG_PASSWORD: u32 = 0x0000_0001;

/// Send found rows instead of affected rows in EOF_Packet.
pub const CLIENT_FOUND_ROWS: u32 = 0x0000_0002;

/// Longer flags in Protocol::ColumnDefinition320.
pub const CLIENT_LONG_FLAG: u32 = 0x0000_0004;

/// Schema name can be sent in the handshake response.
pub const CLIENT_CONNECT_WITH_DB: u32 = 0x0000_0008;

/// Don't allow database.table.column.
pub const CLIENT_NO_SCHEMA: u32 = 0x0000_0010;

/// Switch to the compressed protocol after authentication.
pub const CLIENT_COMPRESS: u32 = 0x0000_0020;

pub const CLIENT_ODBC: u32 = 0x0000_0040;

/// Can use LOAD DATA LOCAL.
pub const CLIENT_LOCAL_FILES: u32 = 0x0000_0080;

/// Let the parser ignore spaces before '('.
pub const CLIENT_IGNORE_SPACE: u32 = 0x0000_0100;

/// New 4.1 protocol. Required by this client.
pub const CLIENT_PROTOCOL_41: u32 = 0x0000_0200;

/// Use net_interactive_timeout instead of net_wait_timeout.
pub const CLIENT_INTERACTIVE: u32 = 0x0000_0400;

/// Switch to SSL after sending the capability flags.
pub const CLIENT_SSL: u32 = 0x0000_0800;

/// Client only flag, not used.
pub const CLIENT_IGNORE_SIGPIPE: u32 = 0x0000_1000;

/// Status flags are sent in OK_Packet / EOF_Packet.
pub const CLIENT_TRANSACTIONS: u32 = 0x0000_2000;

pub const CLIENT_RESERVED: u32 = 0x0000_4000;

/// 4.1 authentication. Impacts the greeting format.
pub const CLIENT_SECURE_CONNECTION: u32 = 0x0000_8000;

/// May send multiple statements per COM_QUERY.
pub const CLIENT_MULTI_STATEMENTS: u32 = 0x0001_0000;

/// Can handle multiple resultsets for COM_QUERY.
pub const CLIENT_MULTI_RESULTS: u32 = 0x0002_0000;

/// Can handle multiple resultsets for COM_STMT_EXECUTE.
pub const CLIENT_PS_MULTI_RESULTS: u32 = 0x0004_0000;

/// Supports authentication plugins.
pub const CLIENT_PLUGIN_AUTH: u32 = 0x0008_0000;

/// Sends connection attributes in the handshake response.
pub const CLIENT_CONNECT_ATTRS: u32 = 0x0010_0000;

/// Auth response in the handshake response is a length encoded string,
/// needed once it grows past 250 bytes.
pub const CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA: u32 = 0x0020_0000;

/// Can handle expired passwords.
pub const CLIENT_CAN_HANDLE_EXPIRED_PASSWORDS: u32 = 0x0040_0000;

/// Expects session state information in OK_Packet.
pub const CLIENT_SESSION_TRACK: u32 = 0x0080_0000;

/// Expects an OK_Packet (instead of EOF_Packet) after the resultset rows.
pub const CLIENT_DEPRECATE_EOF: u32 = 0x0100_0000;

/// The client can handle optional metadata information in the resultset.
pub const CLIENT_OPTIONAL_RESULTSET_METADATA: u32 = 0x0200_0000;

/// Compression protocol extended to support zstd.
pub const CLIENT_ZSTD_COMPRESSION_ALGORITHM: u32 = 0x0400_0000;

/// Optional query attributes in COM_QUERY and COM_STMT_EXECUTE.
pub const CLIENT_QUERY_ATTRIBUTES: u32 = 0x0800_0000;

/// Multi factor authentication, AuthNextFactor packets.
pub const MULTI_FACTOR_AUTHENTICATION: u32 = 0x1000_0000;

/// Reserved for extending the 32 bit flags.
pub const CLIENT_CAPABILITY_EXTENSION: u32 = 0x2000_0000;

/// Verify server certificate. Client only flag, deprecated in favor of --ssl-mode.
pub const CLIENT_SSL_VERIFY_SERVER_CERT: u32 = 0x4000_0000;

/// Don't reset the options after an unsuccessful connect. Client only flag.
pub const CLIENT_REMEMBER_OPTIONS: u32 = 0x8000_0000;

/// Names of every capability bit, in bit order.
pub static CAPABILITY_FLAG_NAMES: &[(u64, &str)] = &[
    (CLIENT_LONG_PASSWORD as u64, "CLIENT_LONG_PASSWORD"),
    (CLIENT_FOUND_ROWS as u64, "CLIENT_FOUND_ROWS"),
    (CLIENT_LONG_FLAG as u64, "CLIENT_LONG_FLAG"),
    (CLIENT_CONNECT_WITH_DB as u64, "CLIENT_CONNECT_WITH_DB"),
    (CLIENT_NO_SCHEMA as u64, "CLIENT_NO_SCHEMA"),
    (CLIENT_COMPRESS as u64, "CLIENT_COMPRESS"),
    (CLIENT_ODBC as u64, "CLIENT_ODBC"),
    (CLIENT_LOCAL_FILES as u64, "CLIENT_LOCAL_FILES"),
    (CLIENT_IGNORE_SPACE as u64, "CLIENT_IGNORE_SPACE"),
    (CLIENT_PROTOCOL_41 as u64, "CLIENT_PROTOCOL_41"),
    (CLIENT_INTERACTIVE as u64, "CLIENT_INTERACTIVE"),
    (CLIENT_SSL as u64, "CLIENT_SSL"),
    (CLIENT_IGNORE_SIGPIPE as u64, "CLIENT_IGNORE_SIGPIPE"),
    (CLIENT_TRANSACTIONS as u64, "CLIENT_TRANSACTIONS"),
    (CLIENT_RESERVED as u64, "CLIENT_RESERVED"),
    (CLIENT_SECURE_CONNECTION as u64, "CLIENT_SECURE_CONNECTION"),
    (CLIENT_MULTI_STATEMENTS as u64, "CLIENT_MULTI_STATEMENTS"),
    (CLIENT_MULTI_RESULTS as u64, "CLIENT_MULTI_RESULTS"),
    (CLIENT_PS_MULTI_RESULTS as u64, "CLIENT_PS_MULTI_RESULTS"),
    (CLIENT_PLUGIN_AUTH as u64, "CLIENT_PLUGIN_AUTH"),
    (CLIENT_CONNECT_ATTRS as u64, "CLIENT_CONNECT_ATTRS"),
    (
        CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA as u64,
        "CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA",
    ),
    (
        CLIENT_CAN_HANDLE_EXPIRED_PASSWORDS as u64,
        "CLIENT_CAN_HANDLE_EXPIRED_PASSWORDS",
    ),
    (CLIENT_SESSION_TRACK as u64, "CLIENT_SESSION_TRACK"),
    (CLIENT_DEPRECATE_EOF as u64, "CLIENT_DEPRECATE_EOF"),
    (
        CLIENT_OPTIONAL_RESULTSET_METADATA as u64,
        "CLIENT_OPTIONAL_RESULTSET_METADATA",
    ),
    (
        CLIENT_ZSTD_COMPRESSION_ALGORITHM as u64,
        "CLIENT_ZSTD_COMPRESSION_ALGORITHM",
    ),
    (CLIENT_QUERY_ATTRIBUTES as u64, "CLIENT_QUERY_ATTRIBUTES"),
    (MULTI_FACTOR_AUTHENTICATION as u64, "MULTI_FACTOR_AUTHENTICATION"),
    (CLIENT_CAPABILITY_EXTENSION as u64, "CLIENT_CAPABILITY_EXTENSION"),
    (CLIENT_SSL_VERIFY_SERVER_CERT as u64, "CLIENT_SSL_VERIFY_SERVER_CERT"),
    (CLIENT_REMEMBER_OPTIONS as u64, "CLIENT_REMEMBER_OPTIONS"),
];
