pub mod configure;
pub mod connection;
pub mod connection_options;
pub mod dialer;
pub mod handshake;
pub mod packet_channel;
pub mod query_result;
pub mod stmt;

#[cfg(test)]
pub(crate) mod mock;
