use common::err::decode_error::ReError;
use common::err::CResult;

use crate::packet::error_packet::ErrorPacket;

pub mod auth_switch_packet;
pub mod end_of_file_packet;
pub mod error_packet;
pub mod field_packet;
pub mod handshake_packet;
pub mod ok_packet;
pub mod response_type;
pub mod result_set_row_packet;

/// EOF packets are at most 5 bytes, longer 0xFE packets are length encoded data
/// or, with CLIENT_DEPRECATE_EOF, an OK packet closing the resultset.
pub const MAX_EOF_PACKET_LENGTH: usize = 5;

pub fn is_eof_packet(packet: &[u8]) -> bool {
    packet.first() == Some(&response_type::EOF) && packet.len() <= MAX_EOF_PACKET_LENGTH
}

/// Fails with the server error when `packet` is an ERR packet.
pub fn check_error_packet(packet: &[u8], capability: u32) -> CResult<()> {
    if packet.first() == Some(&response_type::ERROR) {
        let error = ErrorPacket::parse(packet, capability)?;
        return Err(ReError::MySqlError(error.into()));
    }

    Ok(())
}
