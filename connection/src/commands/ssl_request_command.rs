use std::io;
use std::io::{Cursor, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::declar::capability_flags;

/// Protocol::SSLRequest, the first 32 bytes of a HandshakeResponse41.
/// Sent in plain text right before the TLS upgrade, so it never carries credentials.
pub struct SslRequestCommand {
    pub client_capabilities: u32,
    pub max_packet_size: u32,
    pub client_collation: u8,
}

impl SslRequestCommand {
    pub fn new(client_capabilities: u32, max_packet_size: u32, client_collation: u8) -> Self {
        Self {
            client_capabilities: client_capabilities | capability_flags::CLIENT_SSL,
            max_packet_size,
            client_collation,
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, io::Error> {
        let mut vec = Vec::with_capacity(32);
        let mut cursor = Cursor::new(&mut vec);

        cursor.write_u32::<LittleEndian>(self.client_capabilities)?;
        cursor.write_u32::<LittleEndian>(self.max_packet_size)?;
        cursor.write_u8(self.client_collation)?;

        // Fill reserved bytes
        cursor.write_all(&[0u8; 23])?;

        Ok(vec)
    }
}
