use std::fmt;
use std::str::FromStr;

use common::err::decode_error::ReError;

pub const MY_SQL_NATIVE_PASSWORD: &str = "mysql_native_password";
pub const CACHING_SHA2_PASSWORD: &str = "caching_sha2_password";
pub const SHA256_PASSWORD: &str = "sha256_password";
pub const MY_SQL_CLEAR_PASSWORD: &str = "mysql_clear_password";

/// Authentication plugins this client can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPlugin {
    MySqlNativePassword,
    CachingSha2Password,
    Sha256Password,
    MySqlClearPassword,
}

impl AuthPlugin {
    pub fn name(&self) -> &'static str {
        match self {
            AuthPlugin::MySqlNativePassword => MY_SQL_NATIVE_PASSWORD,
            AuthPlugin::CachingSha2Password => CACHING_SHA2_PASSWORD,
            AuthPlugin::Sha256Password => SHA256_PASSWORD,
            AuthPlugin::MySqlClearPassword => MY_SQL_CLEAR_PASSWORD,
        }
    }
}

impl FromStr for AuthPlugin {
    type Err = ReError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            MY_SQL_NATIVE_PASSWORD => Ok(AuthPlugin::MySqlNativePassword),
            CACHING_SHA2_PASSWORD => Ok(AuthPlugin::CachingSha2Password),
            SHA256_PASSWORD => Ok(AuthPlugin::Sha256Password),
            MY_SQL_CLEAR_PASSWORD => Ok(AuthPlugin::MySqlClearPassword),
            _ => Err(ReError::AuthenticationError(format!(
                "{} auth plugin is not supported.",
                s
            ))),
        }
    }
}

impl fmt::Display for AuthPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
