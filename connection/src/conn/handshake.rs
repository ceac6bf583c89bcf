use tracing::{debug, instrument, trace};

use common::err::decode_error::{ReError, ServerError};
use common::err::CResult;

use crate::bytes::{encrypt_password, encrypt_password_rsa};
use crate::commands::auth_plugin_switch_command::AuthPluginSwitchCommand;
use crate::commands::authenticate_command::AuthenticateCommand;
use crate::commands::ssl_request_command::SslRequestCommand;
use crate::conn::connection::Conn;
use crate::conn::dialer::{host_of, NETWORK_UNIX};
use crate::conn::packet_channel::Compression;
use crate::declar::auth_plugin_names::AuthPlugin;
use crate::declar::capability_flags::*;
use crate::declar::collation::{collation_by_name, default_collation_for_charset, Collation};
use crate::declar::status_flags::StatusFlags;
use crate::packet::auth_switch_packet::AuthPluginSwitchPacket;
use crate::packet::error_packet::ErrorPacket;
use crate::packet::handshake_packet::HandshakePacket;
use crate::packet::ok_packet::OkPacket;
use crate::packet::response_type;
use crate::{
    DEFAULT_COLLATION_ID, MAX_AUTH_ROUNDS, MAX_PACKET_SIZE, NULL_TERMINATOR,
    ZSTD_COMPRESSION_LEVEL,
};

/// Client capabilities honoured when requested with `with_capability`.
const REQUESTABLE_CAPABILITIES: u32 = CLIENT_FOUND_ROWS
    | CLIENT_IGNORE_SPACE
    | CLIENT_MULTI_STATEMENTS
    | CLIENT_MULTI_RESULTS
    | CLIENT_PS_MULTI_RESULTS
    | CLIENT_CONNECT_ATTRS
    | CLIENT_COMPRESS
    | CLIENT_ZSTD_COMPRESSION_ALGORITHM
    | CLIENT_LOCAL_FILES
    | CLIENT_DEPRECATE_EOF
    | CLIENT_QUERY_ATTRIBUTES;

/// Longest auth response that fits the 1 byte length of HandshakeResponse41.
const MAX_SHORT_AUTH_RESPONSE: usize = 250;

/// Auth exchange state after the handshake response went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthState {
    /// Waiting for OK, ERR, auth switch or more data.
    ReadResult,
    /// caching_sha2_password asked for the RSA public key.
    AwaitPublicKey,
    Done(StatusFlags),
}

/// Plugin and challenge in use, the server may replace both once.
#[derive(Debug)]
struct AuthContext {
    plugin: AuthPlugin,
    scramble: Vec<u8>,
    switched: bool,
}

impl Conn {
    /// Greeting, handshake response with an optional TLS upgrade, auth exchange, then session setup.
    /// The caller closes the transport when this fails.
    #[instrument(skip(self), fields(addr = %self.addr, user = %self.user))]
    pub(crate) fn handshake(&mut self) -> CResult<()> {
        let greeting = self.read_packet()?;
        let handshake = HandshakePacket::parse(&greeting)?;
        debug!(
            server_version = %handshake.server_version,
            connection_id = handshake.connection_id,
            auth_plugin = %handshake.auth_plugin_name,
            "read greeting"
        );

        if self.ssl_opts.is_some() && handshake.server_capabilities & CLIENT_SSL == 0 {
            return Err(ReError::AuthenticationError(String::from(
                "TLS is required but the server does not support it",
            )));
        }

        let (collation_id, deferred_collation) = self.handshake_collation()?;
        let mut auth = AuthContext {
            plugin: handshake.auth_plugin_name.parse()?,
            scramble: handshake.scramble.clone(),
            switched: false,
        };

        let auth_response = self.auth_response(auth.plugin, &auth.scramble);
        let capability = self.negotiate_capability(handshake.server_capabilities, auth_response.len());
        self.capability = capability;

        if capability & CLIENT_SSL != 0 {
            let ssl_request = SslRequestCommand::new(capability, MAX_PACKET_SIZE, collation_id);
            self.transport.write_packet(&ssl_request.serialize()?)?;

            let ssl_opts = self.ssl_opts.clone().unwrap_or_default();
            self.transport.upgrade_to_tls(host_of(&self.addr), &ssl_opts)?;
            trace!("upgraded to tls");
        }

        let mut attributes: Vec<(String, String)> = self
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        attributes.sort();

        let command = AuthenticateCommand {
            client_capabilities: capability,
            max_packet_size: MAX_PACKET_SIZE,
            client_collation: collation_id,
            username: self.user.clone(),
            auth_response,
            database: (!self.db.is_empty()).then(|| self.db.clone()),
            auth_plugin_name: auth.plugin.name().to_string(),
            attributes,
            zstd_compression_level: (capability & CLIENT_ZSTD_COMPRESSION_ALGORITHM != 0)
                .then_some(ZSTD_COMPRESSION_LEVEL),
        };
        self.transport.write_packet(&command.serialize()?)?;

        let status = self.read_auth_result(&mut auth)?;

        self.server_version = handshake.server_version;
        self.connection_id = handshake.connection_id;
        self.salt = auth.scramble;
        self.auth_plugin_name = auth.plugin.name().to_string();
        self.status = status;

        if capability & CLIENT_COMPRESS != 0 {
            self.transport.set_compression(Compression::Zlib);
        } else if capability & CLIENT_ZSTD_COMPRESSION_ALGORITHM != 0 {
            self.transport.set_compression(Compression::Zstd);
        }

        if let Some(collation) = deferred_collation {
            self.exec(&format!(
                "SET NAMES {} COLLATE {}",
                collation.charset, collation.name
            ))?;
        }
        if let Some(collation) = collation_by_name(&self.collation) {
            self.charset = collation.charset.to_string();
        }
        Ok(())
    }

    /// Collation id for the handshake response, plus the collation to apply afterwards when its id does not fit in a byte.
    fn handshake_collation(&self) -> CResult<(u8, Option<&'static Collation>)> {
        if self.collation.is_empty() {
            let collation = default_collation_for_charset(&self.charset).ok_or_else(|| {
                ReError::ConfigurationError(format!("Unknown charset {}", self.charset))
            })?;
            return Ok((collation.id as u8, None));
        }

        let collation = collation_by_name(&self.collation).ok_or_else(|| {
            ReError::ConfigurationError(format!("Unknown collation {}", self.collation))
        })?;
        match u8::try_from(collation.id) {
            Ok(id) => Ok((id, None)),
            Err(_) => Ok((DEFAULT_COLLATION_ID, Some(collation))),
        }
    }

    fn negotiate_capability(&self, server_capabilities: u32, auth_response_len: usize) -> u32 {
        let mut capability = CLIENT_PROTOCOL_41
            | CLIENT_SECURE_CONNECTION
            | CLIENT_LONG_PASSWORD
            | CLIENT_TRANSACTIONS
            | CLIENT_PLUGIN_AUTH
            | (server_capabilities & CLIENT_LONG_FLAG);
        capability |= self.ccaps & REQUESTABLE_CAPABILITIES;

        if self.ssl_opts.is_some() {
            capability |= CLIENT_SSL;
        }
        if !self.db.is_empty() {
            capability |= CLIENT_CONNECT_WITH_DB;
        }
        if auth_response_len > MAX_SHORT_AUTH_RESPONSE {
            capability |= CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA;
        }

        capability & server_capabilities
    }

    /// TLS was requested, or the socket is local.
    fn is_secure_channel(&self) -> bool {
        self.ssl_opts.is_some() || self.transport.is_tls() || self.proto == NETWORK_UNIX
    }

    /// First answer for `plugin`, both in the handshake response and after an auth switch.
    fn auth_response(&self, plugin: AuthPlugin, scramble: &[u8]) -> Vec<u8> {
        if plugin == AuthPlugin::Sha256Password && !self.password.is_empty() && self.is_secure_channel() {
            return cleartext_password(&self.password);
        }
        encrypt_password(&self.password, scramble, &plugin)
    }

    fn read_auth_result(&mut self, auth: &mut AuthContext) -> CResult<StatusFlags> {
        let mut state = AuthState::ReadResult;
        for _ in 0..MAX_AUTH_ROUNDS {
            state = match state {
                AuthState::ReadResult => self.read_auth_packet(auth)?,
                AuthState::AwaitPublicKey => self.send_rsa_password(auth)?,
                AuthState::Done(status) => return Ok(status),
            };
        }

        match state {
            AuthState::Done(status) => Ok(status),
            _ => Err(ReError::AuthenticationError(format!(
                "Authentication did not finish within {} rounds",
                MAX_AUTH_ROUNDS
            ))),
        }
    }

    fn read_auth_packet(&mut self, auth: &mut AuthContext) -> CResult<AuthState> {
        let data = self.read_packet()?;
        match data.first() {
            Some(&response_type::OK) => {
                let ok = OkPacket::parse(&data, self.capability)?;
                Ok(AuthState::Done(ok.status_flags))
            }
            Some(&response_type::ERROR) => Err(auth_error(&data, self.capability)),
            Some(&response_type::AUTH_PLUGIN_SWITCH) => {
                if auth.switched {
                    return Err(ReError::AuthenticationError(String::from(
                        "The server requested a second auth switch",
                    )));
                }
                let switch = AuthPluginSwitchPacket::parse(&data)?;
                debug!(auth_plugin = %switch.auth_plugin_name, "auth switch");

                auth.switched = true;
                auth.plugin = switch.auth_plugin_name.parse()?;
                auth.scramble = switch.auth_plugin_data;

                let response = if auth.plugin == AuthPlugin::Sha256Password {
                    self.auth_response(auth.plugin, &auth.scramble)
                } else {
                    AuthPluginSwitchCommand::new(&self.password, &auth.scramble, auth.plugin).serialize()
                };
                self.transport.write_packet(&response)?;
                Ok(AuthState::ReadResult)
            }
            Some(&response_type::AUTH_MORE_DATA) => self.handle_auth_more_data(auth, &data[1..]),
            _ => Err(ReError::ProtocolError(String::from(
                "Unexpected packet during authentication",
            ))),
        }
    }

    fn handle_auth_more_data(&mut self, auth: &AuthContext, data: &[u8]) -> CResult<AuthState> {
        match auth.plugin {
            AuthPlugin::CachingSha2Password => match data.first() {
                Some(&response_type::CACHE_SHA2_FAST_AUTH) => {
                    trace!("caching_sha2_password fast auth");
                    Ok(AuthState::ReadResult)
                }
                Some(&response_type::CACHE_SHA2_FULL_AUTH) => {
                    if self.is_secure_channel() {
                        let password = cleartext_password(&self.password);
                        self.transport.write_packet(&password)?;
                        Ok(AuthState::ReadResult)
                    } else {
                        trace!("caching_sha2_password full auth, requesting public key");
                        self.transport
                            .write_packet(&[response_type::CACHE_SHA2_REQUEST_PUBLIC_KEY])?;
                        Ok(AuthState::AwaitPublicKey)
                    }
                }
                _ => Err(ReError::ProtocolError(String::from(
                    "Unexpected caching_sha2_password auth data",
                ))),
            },
            // public key sent in answer to the 0x01 request
            AuthPlugin::Sha256Password => {
                let encrypted = encrypt_password_rsa(&self.password, &auth.scramble, data)?;
                self.transport.write_packet(&encrypted)?;
                Ok(AuthState::ReadResult)
            }
            _ => Err(ReError::ProtocolError(format!(
                "Unexpected auth data for {}",
                auth.plugin
            ))),
        }
    }

    fn send_rsa_password(&mut self, auth: &AuthContext) -> CResult<AuthState> {
        let data = self.read_packet()?;
        match data.first() {
            Some(&response_type::AUTH_MORE_DATA) => {
                let encrypted = encrypt_password_rsa(&self.password, &auth.scramble, &data[1..])?;
                self.transport.write_packet(&encrypted)?;
                Ok(AuthState::ReadResult)
            }
            Some(&response_type::ERROR) => Err(auth_error(&data, self.capability)),
            _ => Err(ReError::ProtocolError(String::from(
                "Expected the server public key",
            ))),
        }
    }
}

fn cleartext_password(password: &str) -> Vec<u8> {
    let mut value = password.as_bytes().to_vec();
    value.push(NULL_TERMINATOR);
    value
}

fn auth_error(data: &[u8], capability: u32) -> ReError {
    match ErrorPacket::parse(data, capability) {
        Ok(error) => ReError::AuthenticationError(ServerError::from(error).to_string()),
        Err(e) => e,
    }
}
