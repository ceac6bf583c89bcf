use std::io::{Cursor, Read};

use byteorder::ReadBytesExt;

use common::err::CResult;

use crate::bytes::read_null_term_string;

/// Protocol::AuthSwitchRequest: 0xFE, plugin name, new challenge.
#[derive(Debug)]
pub struct AuthPluginSwitchPacket {
    pub auth_plugin_name: String,
    pub auth_plugin_data: Vec<u8>,
}

impl AuthPluginSwitchPacket {
    pub fn parse(packet: &[u8]) -> CResult<Self> {
        let mut cursor = Cursor::new(packet);
        let _header = cursor.read_u8()?;

        let auth_plugin_name = read_null_term_string(&mut cursor)?;
        let mut auth_plugin_data = Vec::new();
        cursor.read_to_end(&mut auth_plugin_data)?;
        if auth_plugin_data.last() == Some(&0) {
            auth_plugin_data.pop();
        }

        Ok(Self {
            auth_plugin_name,
            auth_plugin_data,
        })
    }
}

#[cfg(test)]
mod test {
    use crate::packet::auth_switch_packet::AuthPluginSwitchPacket;

    #[test]
    fn test_parse() {
        let mut packet = vec![0xFE];
        packet.extend_from_slice(b"mysql_native_password\0");
        packet.extend_from_slice(b"01234567890123456789\0");

        let switch = AuthPluginSwitchPacket::parse(&packet).unwrap();
        assert_eq!(switch.auth_plugin_name, "mysql_native_password");
        assert_eq!(switch.auth_plugin_data, b"01234567890123456789".to_vec());
    }
}
