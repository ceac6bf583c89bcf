/// 响应包的第一个字节
pub const OK: u8 = 0x00;
pub const ERROR: u8 = 0xFF;
pub const EOF: u8 = 0xFE;
pub const AUTH_PLUGIN_SWITCH: u8 = 0xFE;
pub const LOCAL_INFILE: u8 = 0xFB;

/// caching_sha2_password / sha256_password extra data.
pub const AUTH_MORE_DATA: u8 = 0x01;

/// caching_sha2_password
pub const CACHE_SHA2_REQUEST_PUBLIC_KEY: u8 = 0x02;
pub const CACHE_SHA2_FAST_AUTH: u8 = 0x03;
pub const CACHE_SHA2_FULL_AUTH: u8 = 0x04;
