use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use common::err::decode_error::ReError;
use common::err::CResult;

use crate::bytes::read_null_term_string;
use crate::declar::auth_plugin_names::MY_SQL_NATIVE_PASSWORD;
use crate::declar::capability_flags::{CLIENT_PLUGIN_AUTH, CLIENT_PROTOCOL_41, CLIENT_SECURE_CONNECTION};
use crate::declar::status_flags::StatusFlags;
use crate::packet::error_packet::ErrorPacket;
use crate::packet::response_type;
use crate::{PROTOCOL_VERSION, X_PROTOCOL_VERSION};

/// Initial greeting, Protocol::HandshakeV10.
///
/// ref: https://dev.mysql.com/doc/dev/mysql-server/latest/page_protocol_connection_phase_packets_protocol_handshake_v10.html
#[derive(Debug, Clone)]
pub struct HandshakePacket {
    pub protocol_version: u8,
    pub server_version: String,
    pub connection_id: u32,
    /// auth-plugin-data-part-1 + auth-plugin-data-part-2, trailing NUL removed.
    pub scramble: Vec<u8>,
    pub server_capabilities: u32,
    pub server_collation: u8,
    pub server_status: StatusFlags,
    pub auth_plugin_name: String,
}

impl HandshakePacket {
    pub fn parse(packet: &[u8]) -> CResult<Self> {
        if packet.first() == Some(&response_type::ERROR) {
            let error = ErrorPacket::parse(packet, CLIENT_PROTOCOL_41)?;
            return Err(ReError::MySqlError(error.into()));
        }

        let mut cursor = Cursor::new(packet);
        let protocol_version = cursor.read_u8()?;
        if protocol_version != PROTOCOL_VERSION {
            let mut message = format!("Unsupported protocol version {}", protocol_version);
            if protocol_version == X_PROTOCOL_VERSION {
                message.push_str(", the address looks like the X Protocol port");
            }
            return Err(ReError::ProtocolError(message));
        }

        let server_version = read_null_term_string(&mut cursor)?;
        let connection_id = cursor.read_u32::<LittleEndian>()?;

        let mut scramble = vec![0u8; 8];
        cursor.read_exact(&mut scramble)?;
        // filler
        cursor.read_u8()?;

        let mut server_capabilities = cursor.read_u16::<LittleEndian>()? as u32;
        if server_capabilities & CLIENT_PROTOCOL_41 == 0 {
            return Err(ReError::ProtocolError(String::from(
                "The MySQL server does not support protocol 4.1 or higher",
            )));
        }

        let mut server_collation = 0;
        let mut server_status = 0;
        let mut auth_plugin_name = String::new();
        if (cursor.position() as usize) < packet.len() {
            server_collation = cursor.read_u8()?;
            server_status = cursor.read_u16::<LittleEndian>()?;
            server_capabilities |= (cursor.read_u16::<LittleEndian>()? as u32) << 16;

            let auth_data_len = cursor.read_u8()? as usize;
            // reserved
            let mut reserved = [0u8; 10];
            cursor.read_exact(&mut reserved)?;

            if server_capabilities & CLIENT_SECURE_CONNECTION != 0 {
                let part2_len = 13.max(auth_data_len.saturating_sub(8));
                let mut part2 = vec![0u8; part2_len];
                cursor.read_exact(&mut part2)?;
                if part2.last() == Some(&0) {
                    part2.pop();
                }
                scramble.extend_from_slice(&part2);
            }

            if server_capabilities & CLIENT_PLUGIN_AUTH != 0 {
                auth_plugin_name = read_null_term_string(&mut cursor)?;
            }
        }

        if auth_plugin_name.is_empty() {
            auth_plugin_name = MY_SQL_NATIVE_PASSWORD.to_string();
        }

        Ok(Self {
            protocol_version,
            server_version,
            connection_id,
            scramble,
            server_capabilities,
            server_collation,
            server_status: StatusFlags::new(server_status),
            auth_plugin_name,
        })
    }
}
