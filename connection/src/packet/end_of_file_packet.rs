use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use common::err::CResult;

use crate::declar::capability_flags::CLIENT_PROTOCOL_41;
use crate::declar::status_flags::StatusFlags;

#[derive(Debug)]
pub struct EndOfFilePacket {
    pub warning_count: u16,
    pub server_status: StatusFlags,
}

impl EndOfFilePacket {
    /// `packet` includes the 0xFE header. Warnings and status are only sent with CLIENT_PROTOCOL_41.
    pub fn parse(packet: &[u8], capability: u32) -> CResult<Self> {
        let mut cursor = Cursor::new(packet);
        cursor.read_u8()?;

        let mut warning_count = 0;
        let mut server_status = 0;
        if capability & CLIENT_PROTOCOL_41 != 0 && packet.len() >= 5 {
            warning_count = cursor.read_u16::<LittleEndian>()?;
            server_status = cursor.read_u16::<LittleEndian>()?;
        }

        Ok(Self {
            warning_count,
            server_status: StatusFlags::new(server_status),
        })
    }
}

#[cfg(test)]
mod test {
    use crate::declar::capability_flags::CLIENT_PROTOCOL_41;
    use crate::declar::status_flags::SERVER_STATUS_AUTOCOMMIT;
    use crate::packet::end_of_file_packet::EndOfFilePacket;

    #[test]
    fn test_parse() {
        let eof = EndOfFilePacket::parse(&[0xFE, 0x01, 0x00, 0x02, 0x00], CLIENT_PROTOCOL_41).unwrap();
        assert_eq!(eof.warning_count, 1);
        assert!(eof.server_status.contains(SERVER_STATUS_AUTOCOMMIT));

        let eof = EndOfFilePacket::parse(&[0xFE], CLIENT_PROTOCOL_41).unwrap();
        assert_eq!(eof.warning_count, 0);
    }
}
