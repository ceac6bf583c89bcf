use std::io::{Cursor, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use common::err::decode_error::ReError;
use common::err::CResult;

use crate::bytes::{write_len_enc_bytes, write_len_enc_num, write_null_term_string};
use crate::declar::capability_flags;

/// Protocol::HandshakeResponse41
///
/// ref: https://dev.mysql.com/doc/dev/mysql-server/latest/page_protocol_connection_phase_packets_protocol_handshake_response.html
pub struct AuthenticateCommand {
    pub client_capabilities: u32,
    pub max_packet_size: u32,
    pub client_collation: u8,
    pub username: String,
    pub auth_response: Vec<u8>,
    pub database: Option<String>,
    pub auth_plugin_name: String,
    /// Sorted by key so the packet is stable.
    pub attributes: Vec<(String, String)>,
    pub zstd_compression_level: Option<u8>,
}

impl AuthenticateCommand {
    pub fn serialize(&self) -> CResult<Vec<u8>> {
        let mut vec = Vec::new();
        let mut cursor = Cursor::new(&mut vec);
        let caps = self.client_capabilities;

        cursor.write_u32::<LittleEndian>(caps)?;
        cursor.write_u32::<LittleEndian>(self.max_packet_size)?;
        cursor.write_u8(self.client_collation)?;

        // Fill reserved bytes
        cursor.write_all(&[0u8; 23])?;

        write_null_term_string(&mut cursor, &self.username)?;

        if caps & capability_flags::CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA != 0 {
            write_len_enc_bytes(&mut cursor, &self.auth_response)?;
        } else {
            if self.auth_response.len() > 250 {
                return Err(ReError::AuthenticationError(String::from(
                    "Auth response is too long for a 1 byte length",
                )));
            }
            cursor.write_u8(self.auth_response.len() as u8)?;
            cursor.write_all(&self.auth_response)?;
        }

        if caps & capability_flags::CLIENT_CONNECT_WITH_DB != 0 {
            if let Some(database) = &self.database {
                write_null_term_string(&mut cursor, database)?;
            }
        }

        if caps & capability_flags::CLIENT_PLUGIN_AUTH != 0 {
            write_null_term_string(&mut cursor, &self.auth_plugin_name)?;
        }

        if caps & capability_flags::CLIENT_CONNECT_ATTRS != 0 {
            let mut attrs = Vec::new();
            for (key, value) in &self.attributes {
                write_len_enc_bytes(&mut attrs, key.as_bytes())?;
                write_len_enc_bytes(&mut attrs, value.as_bytes())?;
            }
            write_len_enc_num(&mut cursor, attrs.len() as u64)?;
            cursor.write_all(&attrs)?;
        }

        if caps & capability_flags::CLIENT_ZSTD_COMPRESSION_ALGORITHM != 0 {
            if let Some(level) = self.zstd_compression_level {
                cursor.write_u8(level)?;
            }
        }

        Ok(vec)
    }
}

#[cfg(test)]
mod test {
    use crate::commands::authenticate_command::AuthenticateCommand;
    use crate::declar::capability_flags::*;

    fn command(caps: u32) -> AuthenticateCommand {
        AuthenticateCommand {
            client_capabilities: caps,
            max_packet_size: 16777216,
            client_collation: 33,
            username: "root".to_string(),
            auth_response: vec![0xAA; 20],
            database: Some("test".to_string()),
            auth_plugin_name: "mysql_native_password".to_string(),
            attributes: vec![("_client_name".to_string(), "connection".to_string())],
            zstd_compression_level: Some(3),
        }
    }

    #[test]
    fn test_serialize_minimal() {
        let packet = command(CLIENT_PROTOCOL_41 | CLIENT_SECURE_CONNECTION).serialize().unwrap();

        assert_eq!(packet[8], 33);
        assert_eq!(&packet[32..37], b"root\0");
        assert_eq!(packet[37], 20);
        // no db, plugin, attrs or zstd level without the capability bits
        assert_eq!(packet.len(), 32 + 5 + 1 + 20);
    }

    #[test]
    fn test_serialize_full() {
        let caps = CLIENT_PROTOCOL_41
            | CLIENT_SECURE_CONNECTION
            | CLIENT_CONNECT_WITH_DB
            | CLIENT_PLUGIN_AUTH
            | CLIENT_CONNECT_ATTRS
            | CLIENT_ZSTD_COMPRESSION_ALGORITHM;
        let packet = command(caps).serialize().unwrap();

        let tail = &packet[32 + 5 + 1 + 20..];
        assert!(tail.starts_with(b"test\0mysql_native_password\0"));
        let attrs = &tail[b"test\0mysql_native_password\0".len()..];
        assert_eq!(attrs[0] as usize, 1 + 12 + 1 + 10);
        assert_eq!(&attrs[1..14], b"\x0c_client_name");
        assert_eq!(*packet.last().unwrap(), 3);
    }

    #[test]
    fn test_long_auth_response() {
        let mut cmd = command(CLIENT_PROTOCOL_41);
        cmd.auth_response = vec![1; 256];
        assert!(cmd.serialize().is_err());

        cmd.client_capabilities |= CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA;
        let packet = cmd.serialize().unwrap();
        assert_eq!(&packet[37..40], &[0xFC, 0x00, 0x01]);
    }
}
