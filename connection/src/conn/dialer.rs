use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use tracing::debug;

use crate::conn::packet_channel::ChannelStream;

pub const NETWORK_TCP: &str = "tcp";
pub const NETWORK_UNIX: &str = "unix";

/// Opens the raw stream of a session.
pub trait Dialer {
    fn dial(&self, network: &str, address: &str, timeout: Duration) -> io::Result<ChannelStream>;
}

impl<F> Dialer for F
where
    F: Fn(&str, &str, Duration) -> io::Result<ChannelStream>,
{
    fn dial(&self, network: &str, address: &str, timeout: Duration) -> io::Result<ChannelStream> {
        self(network, address, timeout)
    }
}

/// Default dialer: tcp with a connect timeout, or a unix socket.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

impl Dialer for TcpDialer {
    fn dial(&self, network: &str, address: &str, timeout: Duration) -> io::Result<ChannelStream> {
        if network == NETWORK_UNIX {
            return Ok(ChannelStream::Unix(UnixStream::connect(address)?));
        }

        let mut last_err = None;
        for socket_addr in address.to_socket_addrs()? {
            match TcpStream::connect_timeout(&socket_addr, timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    debug!(%socket_addr, "connected");
                    return Ok(ChannelStream::Tcp(stream));
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("could not resolve address {}", address),
            )
        }))
    }
}

/// Address containing a `/` is a unix socket path.
pub fn network_of(address: &str) -> &'static str {
    if address.contains('/') {
        NETWORK_UNIX
    } else {
        NETWORK_TCP
    }
}

/// Host part of `host:port`, used as the TLS server name.
pub fn host_of(address: &str) -> &str {
    if let Some(rest) = address.strip_prefix('[') {
        // [::1]:3306
        return rest.split(']').next().unwrap_or(rest);
    }
    match address.rsplit_once(':') {
        Some((host, _)) => host,
        None => address,
    }
}
