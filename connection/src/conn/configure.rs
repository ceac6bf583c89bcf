use tracing::instrument;

use common::config::ClientConfig;
use common::err::decode_error::ReError;
use common::err::CResult;

use crate::conn::connection::Conn;
use crate::conn::connection_options::{
    with_attributes, with_buffer_size, with_charset, with_collation, with_read_timeout, with_ssl,
    with_write_timeout, ConnOption,
};
use crate::declar::collation::{collation_by_name, default_collation_for_charset};

/// Turns a [`ClientConfig`] into connect options. Charset and collation names are checked up front.
pub fn options_from_config(config: &ClientConfig) -> CResult<Vec<ConnOption>> {
    let mut options: Vec<ConnOption> = Vec::new();

    if let Some(timeout) = config.read_timeout() {
        options.push(with_read_timeout(timeout));
    }
    if let Some(timeout) = config.write_timeout() {
        options.push(with_write_timeout(timeout));
    }
    if let Some(buffer_size) = config.buffer_size {
        options.push(with_buffer_size(buffer_size));
    }

    if let Some(charset) = &config.charset {
        if default_collation_for_charset(charset).is_none() {
            return Err(ReError::ConfigurationError(format!("Unknown charset {}", charset)));
        }
        options.push(with_charset(charset));
    }
    if let Some(collation) = &config.collation {
        if collation_by_name(collation).is_none() {
            return Err(ReError::ConfigurationError(format!(
                "Unknown collation {}",
                collation
            )));
        }
        options.push(with_collation(collation));
    }

    if config.ssl {
        options.push(with_ssl(config.ssl_skip_verify));
    } else if config.ssl_skip_verify {
        return Err(ReError::ConfigurationError(String::from(
            "ssl_skip_verify requires ssl = true",
        )));
    }

    if !config.attributes.is_empty() {
        options.push(with_attributes(config.attributes.clone()));
    }
    Ok(options)
}

#[instrument(skip(config), fields(addr = %config.addr, user = %config.user))]
pub fn connect_with_config(config: &ClientConfig) -> CResult<Conn> {
    let options = options_from_config(config)?;
    Conn::connect_with_timeout(
        &config.addr,
        &config.user,
        &config.password,
        &config.database,
        config.connect_timeout(),
        options,
    )
}
