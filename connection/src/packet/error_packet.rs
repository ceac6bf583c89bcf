use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use common::err::decode_error::{ReError, ServerError};
use common::err::CResult;

use crate::declar::capability_flags::CLIENT_PROTOCOL_41;
use crate::packet::response_type;

/// ERR_Packet
///
/// ```txt
/// int<1>    header          0xFF
/// int<2>    error_code
/// string[1] sql_state_marker '#', if CLIENT_PROTOCOL_41
/// string[5] sql_state
/// string<EOF> error_message
/// ```
#[derive(Debug, Clone)]
pub struct ErrorPacket {
    pub error_code: u16,
    pub sql_state: String,
    pub error_message: String,
}

impl ErrorPacket {
    pub fn parse(packet: &[u8], capability: u32) -> CResult<Self> {
        let mut cursor = Cursor::new(packet);

        let header = cursor.read_u8()?;
        if header != response_type::ERROR {
            return Err(ReError::ProtocolError(format!(
                "Unexpected error packet header: {:#x}",
                header
            )));
        }
        let error_code = cursor.read_u16::<LittleEndian>()?;

        let mut sql_state = String::new();
        let position = cursor.position() as usize;
        if capability & CLIENT_PROTOCOL_41 != 0 && packet.get(position) == Some(&b'#') {
            let mut state = [0u8; 6];
            cursor.read_exact(&mut state)?;
            sql_state = String::from_utf8_lossy(&state[1..]).to_string();
        }

        let mut message = Vec::new();
        cursor.read_to_end(&mut message)?;

        Ok(Self {
            error_code,
            sql_state,
            error_message: String::from_utf8_lossy(&message).to_string(),
        })
    }
}

impl From<ErrorPacket> for ServerError {
    fn from(packet: ErrorPacket) -> Self {
        ServerError {
            code: packet.error_code,
            state: packet.sql_state,
            message: packet.error_message,
        }
    }
}

#[cfg(test)]
mod test {
    use crate::declar::capability_flags::CLIENT_PROTOCOL_41;
    use crate::packet::error_packet::ErrorPacket;

    #[test]
    fn test_parse_without_state() {
        let mut packet = vec![0xFF, 0x15, 0x04];
        packet.extend_from_slice(b"Access denied");

        let error = ErrorPacket::parse(&packet, 0).unwrap();
        assert_eq!(error.error_code, 1045);
        assert_eq!(error.sql_state, "");
        assert_eq!(error.error_message, "Access denied");

        // protocol 41 without the '#' marker
        let error = ErrorPacket::parse(&packet, CLIENT_PROTOCOL_41).unwrap();
        assert_eq!(error.error_message, "Access denied");
    }

    #[test]
    fn test_parse_wrong_header() {
        assert!(ErrorPacket::parse(&[0x00, 0x01, 0x02], 0).is_err());
    }
}
