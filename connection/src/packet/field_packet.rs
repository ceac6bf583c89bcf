use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use common::err::decode_error::ReError;
use common::err::CResult;

use crate::bytes::{read_len_enc_bytes, read_len_enc_num, read_len_enc_str};
use crate::declar::column_type::ColumnType;
use crate::declar::field_flags::UNSIGNED_FLAG;

/// Column definition, Protocol::ColumnDefinition41.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub catalog: String,
    pub schema: String,
    pub table: String,
    pub org_table: String,
    pub name: String,
    pub org_name: String,
    pub character_set: u16,
    pub column_length: u32,
    pub column_type: ColumnType,
    pub flags: u16,
    pub decimals: u8,
    /// Only sent in COM_FIELD_LIST responses.
    pub default_value: Option<Vec<u8>>,
}

impl Field {
    pub fn parse(packet: &[u8]) -> CResult<Self> {
        let mut cursor = Cursor::new(packet);

        let catalog = read_len_enc_str(&mut cursor)?;
        let schema = read_len_enc_str(&mut cursor)?;
        let table = read_len_enc_str(&mut cursor)?;
        let org_table = read_len_enc_str(&mut cursor)?;
        let name = read_len_enc_str(&mut cursor)?;
        let org_name = read_len_enc_str(&mut cursor)?;
        // length of fixed length fields, always 0x0c
        let _ = read_len_enc_num(&mut cursor)?;
        let character_set = cursor.read_u16::<LittleEndian>()?;
        let column_length = cursor.read_u32::<LittleEndian>()?;
        let type_code = cursor.read_u8()?;
        let column_type = ColumnType::try_from(type_code).map_err(|_| {
            ReError::ProtocolError(format!("Unknown column type {} of field {}", type_code, name))
        })?;
        let flags = cursor.read_u16::<LittleEndian>()?;
        let decimals = cursor.read_u8()?;
        let _filler = cursor.read_u16::<LittleEndian>()?;

        let mut default_value = None;
        if (cursor.position() as usize) < packet.len() {
            default_value = read_len_enc_bytes(&mut cursor)?;
        }

        Ok(Self {
            catalog,
            schema,
            table,
            org_table,
            name,
            org_name,
            character_set,
            column_length,
            column_type,
            flags,
            decimals,
            default_value,
        })
    }

    pub fn is_unsigned(&self) -> bool {
        self.flags & UNSIGNED_FLAG != 0
    }
}
