use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use common::err::CResult;

use crate::bytes::{read_len_enc_bytes, read_len_enc_num};
use crate::declar::capability_flags::{CLIENT_PROTOCOL_41, CLIENT_SESSION_TRACK, CLIENT_TRANSACTIONS};
use crate::declar::status_flags::{StatusFlags, SERVER_SESSION_STATE_CHANGED};

/// OK_Packet, also used as the resultset terminator when CLIENT_DEPRECATE_EOF is set (header 0xFE).
///
/// ref: https://dev.mysql.com/doc/dev/mysql-server/latest/page_protocol_basic_ok_packet.html
#[derive(Debug, Clone, Default)]
pub struct OkPacket {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub status_flags: StatusFlags,
    pub warnings: u16,
    pub info: String,
    /// Raw session state change data, present with CLIENT_SESSION_TRACK.
    pub session_state_info: Option<Vec<u8>>,
}

impl OkPacket {
    pub fn parse(packet: &[u8], capability: u32) -> CResult<Self> {
        let mut cursor = Cursor::new(packet);

        let _header = cursor.read_u8()?;
        let affected_rows = read_len_enc_num(&mut cursor)?.1;
        let last_insert_id = read_len_enc_num(&mut cursor)?.1;

        let mut status = 0u16;
        let mut warnings = 0u16;
        if capability & CLIENT_PROTOCOL_41 != 0 {
            status = cursor.read_u16::<LittleEndian>()?;
            warnings = cursor.read_u16::<LittleEndian>()?;
        } else if capability & CLIENT_TRANSACTIONS != 0 {
            status = cursor.read_u16::<LittleEndian>()?;
        }
        let status_flags = StatusFlags::new(status);

        let mut info = String::new();
        let mut session_state_info = None;
        let has_remaining = (cursor.position() as usize) < packet.len();
        if capability & CLIENT_SESSION_TRACK != 0 {
            if has_remaining {
                let value = read_len_enc_bytes(&mut cursor)?.unwrap_or_default();
                info = String::from_utf8_lossy(&value).to_string();
            }
            if status_flags.contains(SERVER_SESSION_STATE_CHANGED) {
                session_state_info = read_len_enc_bytes(&mut cursor)?;
            }
        } else if has_remaining {
            let mut value = Vec::new();
            cursor.read_to_end(&mut value)?;
            info = String::from_utf8_lossy(&value).to_string();
        }

        Ok(Self {
            affected_rows,
            last_insert_id,
            status_flags,
            warnings,
            info,
            session_state_info,
        })
    }
}
