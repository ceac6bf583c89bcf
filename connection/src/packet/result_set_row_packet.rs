use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use common::err::decode_error::ReError;
use common::err::CResult;

use crate::bytes::read_len_enc_bytes;
use crate::packet::field_packet::Field;

/// One decoded text protocol cell.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bytes(Vec<u8>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::Unsigned(v) => Some(*v),
            FieldValue::Signed(v) if *v >= 0 => Some(*v as u64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Signed(v) => Some(*v),
            FieldValue::Unsigned(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("NULL"),
            FieldValue::Unsigned(v) => write!(f, "{}", v),
            FieldValue::Signed(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Bytes(v) => f.write_str(&String::from_utf8_lossy(v)),
        }
    }
}

/// ProtocolText::ResultsetRow
pub struct ResultSetRowPacket;

impl ResultSetRowPacket {
    pub fn parse(packet: &[u8], fields: &[Field]) -> CResult<Vec<FieldValue>> {
        let mut values = Vec::with_capacity(fields.len());
        Self::parse_into(packet, fields, &mut values)?;
        Ok(values)
    }

    /// Decodes into `values`, clearing it first so one Vec can serve a whole stream.
    pub fn parse_into(packet: &[u8], fields: &[Field], values: &mut Vec<FieldValue>) -> CResult<()> {
        values.clear();
        let mut cursor = Cursor::new(packet);

        for field in fields {
            let value = match read_len_enc_bytes(&mut cursor)? {
                None => FieldValue::Null,
                Some(raw) => parse_text_value(raw, field)?,
            };
            values.push(value);
        }

        if (cursor.position() as usize) != packet.len() {
            return Err(ReError::ProtocolError(format!(
                "Row has trailing data, expected {} columns",
                fields.len()
            )));
        }
        Ok(())
    }
}

/// 数值类型按照column类型转换, 其余类型保留原始数据
fn parse_text_value(raw: Vec<u8>, field: &Field) -> CResult<FieldValue> {
    if field.column_type.is_integer() {
        return if field.is_unsigned() {
            Ok(FieldValue::Unsigned(parse_number::<u64>(&raw)?))
        } else {
            Ok(FieldValue::Signed(parse_number::<i64>(&raw)?))
        };
    }
    if field.column_type.is_float() {
        return Ok(FieldValue::Float(parse_number::<f64>(&raw)?));
    }
    Ok(FieldValue::Bytes(raw))
}

fn parse_number<T: FromStr>(raw: &[u8]) -> CResult<T> {
    let value = std::str::from_utf8(raw)?;
    value.parse::<T>().map_err(|_| {
        ReError::ProtocolError(format!("Can not parse value:{{{value}}} to number"))
    })
}
