use std::collections::HashMap;
use std::io::Cursor;

use tracing::trace;

use common::err::decode_error::ReError;
use common::err::CResult;

use crate::bytes::read_len_enc_num;
use crate::conn::connection::Conn;
use crate::declar::capability_flags::CLIENT_DEPRECATE_EOF;
use crate::declar::status_flags::StatusFlags;
use crate::packet::end_of_file_packet::EndOfFilePacket;
use crate::packet::error_packet::ErrorPacket;
use crate::packet::field_packet::Field;
use crate::packet::ok_packet::OkPacket;
use crate::packet::result_set_row_packet::{FieldValue, ResultSetRowPacket};
use crate::packet::{is_eof_packet, response_type};
use crate::{MAX_COLUMN_COUNT, MAX_PAYLOAD_LEN};

/// Whether a resultset holds its rows or handed them to a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Streaming {
    #[default]
    None,
    Select,
    Multiple,
}

#[derive(Debug, Clone, Default)]
pub struct Resultset {
    pub fields: Vec<Field>,
    pub field_names: HashMap<String, usize>,
    /// Empty when streaming.
    pub values: Vec<Vec<FieldValue>>,
    /// Rows read from the server, counted in streaming mode as well.
    pub row_count: usize,
    pub streaming: Streaming,
    pub streaming_done: bool,
}

impl Resultset {
    pub fn new(fields: Vec<Field>) -> Self {
        let field_names = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Resultset {
            fields,
            field_names,
            ..Resultset::default()
        }
    }

    pub fn column_number(&self) -> usize {
        self.fields.len()
    }

    pub fn row_number(&self) -> usize {
        self.values.len()
    }

    pub fn get_value(&self, row: usize, column: usize) -> Option<&FieldValue> {
        self.values.get(row).and_then(|r| r.get(column))
    }

    pub fn get_value_by_name(&self, row: usize, name: &str) -> Option<&FieldValue> {
        let column = *self.field_names.get(name)?;
        self.get_value(row, column)
    }
}

/// Outcome of one statement.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub status: StatusFlags,
    pub warnings: u16,
    pub insert_id: u64,
    pub affected_rows: u64,
    pub info: String,
    pub resultset: Option<Resultset>,
}

impl QueryResult {
    pub fn from_resultset(resultset: Resultset) -> Self {
        QueryResult {
            resultset: Some(resultset),
            ..QueryResult::default()
        }
    }

    pub fn has_resultset(&self) -> bool {
        self.resultset.is_some()
    }

    pub fn is_streaming_multiple_done(&self) -> bool {
        matches!(&self.resultset, Some(rs) if rs.streaming == Streaming::Multiple && rs.streaming_done)
    }

    fn apply_ok(&mut self, ok: OkPacket) {
        self.status = ok.status_flags;
        self.warnings = ok.warnings;
        self.insert_id = ok.last_insert_id;
        self.affected_rows = ok.affected_rows;
        self.info = ok.info;
    }
}

impl From<OkPacket> for QueryResult {
    fn from(ok: OkPacket) -> Self {
        let mut result = QueryResult::default();
        result.apply_ok(ok);
        result
    }
}

impl Conn {
    /// Parses an OK packet and records its status on the session.
    pub fn handle_ok_packet(&mut self, data: &[u8]) -> CResult<QueryResult> {
        let ok = OkPacket::parse(data, self.capability)?;
        self.status = ok.status_flags;
        Ok(ok.into())
    }

    /// Converts an ERR packet into the error returned to the caller.
    pub fn handle_error_packet(&self, data: &[u8]) -> ReError {
        match ErrorPacket::parse(data, self.capability) {
            Ok(error) => ReError::MySqlError(error.into()),
            Err(e) => e,
        }
    }

    pub fn read_ok_packet(&mut self) -> CResult<QueryResult> {
        let data = self.read_packet()?;
        match data.first() {
            Some(&response_type::OK) => self.handle_ok_packet(&data),
            Some(&response_type::ERROR) => Err(self.handle_error_packet(&data)),
            _ => Err(ReError::ProtocolError(String::from("expected an OK packet"))),
        }
    }

    /// Reads the response of a text command with every row kept in the result.
    pub(crate) fn read_result(&mut self) -> CResult<QueryResult> {
        let data = self.read_packet()?;
        self.classify_result(&data)
    }

    /// Dispatches on the first packet of a response.
    pub(crate) fn classify_result(&mut self, data: &[u8]) -> CResult<QueryResult> {
        match data.first() {
            Some(&response_type::OK) => self.handle_ok_packet(data),
            Some(&response_type::ERROR) => Err(self.handle_error_packet(data)),
            Some(&response_type::LOCAL_INFILE) => Err(ReError::ProtocolError(String::from(
                "LOCAL INFILE requests are not supported",
            ))),
            Some(_) => self.read_resultset(data),
            None => Err(ReError::malformed_packet()),
        }
    }

    fn read_resultset(&mut self, data: &[u8]) -> CResult<QueryResult> {
        let column_count = parse_column_count(data)?;
        let fields = self.read_result_columns(column_count)?;
        let mut result = QueryResult::from_resultset(Resultset::new(fields));

        let mut buf = Vec::new();
        loop {
            buf.clear();
            self.read_packet_reuse_mem(&mut buf)?;
            if self.is_result_terminator(&buf) {
                self.finish_resultset(&buf, &mut result)?;
                break;
            }
            if buf.first() == Some(&response_type::ERROR) {
                return Err(self.handle_error_packet(&buf));
            }

            if let Some(resultset) = result.resultset.as_mut() {
                let row = ResultSetRowPacket::parse(&buf, &resultset.fields)?;
                resultset.values.push(row);
                resultset.row_count += 1;
            }
        }
        Ok(result)
    }

    /// Reads column definitions, then the EOF that follows them unless CLIENT_DEPRECATE_EOF is on.
    fn read_result_columns(&mut self, column_count: usize) -> CResult<Vec<Field>> {
        let mut fields = Vec::with_capacity(column_count);
        let mut buf = Vec::new();
        for _ in 0..column_count {
            buf.clear();
            self.read_packet_reuse_mem(&mut buf)?;
            if buf.first() == Some(&response_type::ERROR) {
                return Err(self.handle_error_packet(&buf));
            }
            fields.push(Field::parse(&buf)?);
        }

        if self.capability & CLIENT_DEPRECATE_EOF == 0 {
            buf.clear();
            self.read_packet_reuse_mem(&mut buf)?;
            if !is_eof_packet(&buf) {
                return Err(ReError::ProtocolError(String::from(
                    "expected EOF after column definitions",
                )));
            }
            let eof = EndOfFilePacket::parse(&buf, self.capability)?;
            self.status = eof.server_status;
        }
        trace!(column_count, "read result columns");
        Ok(fields)
    }

    /// EOF packet, or with CLIENT_DEPRECATE_EOF an OK packet with the 0xFE header.
    pub(crate) fn is_result_terminator(&self, data: &[u8]) -> bool {
        if data.first() != Some(&response_type::EOF) {
            return false;
        }
        if self.capability & CLIENT_DEPRECATE_EOF != 0 {
            data.len() < MAX_PAYLOAD_LEN
        } else {
            data.len() <= crate::packet::MAX_EOF_PACKET_LENGTH
        }
    }

    fn finish_resultset(&mut self, data: &[u8], result: &mut QueryResult) -> CResult<()> {
        if self.capability & CLIENT_DEPRECATE_EOF != 0 {
            let ok = OkPacket::parse(data, self.capability)?;
            self.status = ok.status_flags;
            result.apply_ok(ok);
        } else {
            let eof = EndOfFilePacket::parse(data, self.capability)?;
            self.status = eof.server_status;
            result.status = eof.server_status;
            result.warnings = eof.warning_count;
        }
        Ok(())
    }

    /// Streams the response of a text command: rows go to `per_row` one at a time and are never stored.
    pub(crate) fn read_result_streaming<R>(
        &mut self,
        result: &mut QueryResult,
        mut per_row: R,
        per_result: Option<&mut dyn FnMut(&QueryResult) -> CResult<()>>,
    ) -> CResult<()>
    where
        R: FnMut(&[FieldValue]) -> CResult<()>,
    {
        let mut buf = Vec::new();
        self.read_packet_reuse_mem(&mut buf)?;

        match buf.first() {
            Some(&response_type::OK) => {
                let ok = self.handle_ok_packet(&buf)?;
                *result = ok;
                return Ok(());
            }
            Some(&response_type::ERROR) => return Err(self.handle_error_packet(&buf)),
            Some(&response_type::LOCAL_INFILE) => {
                return Err(ReError::ProtocolError(String::from(
                    "LOCAL INFILE requests are not supported",
                )))
            }
            Some(_) => {}
            None => return Err(ReError::malformed_packet()),
        }

        let column_count = parse_column_count(&buf)?;
        let fields = self.read_result_columns(column_count)?;
        let mut resultset = Resultset::new(fields);
        resultset.streaming = Streaming::Select;

        let mut row: Vec<FieldValue> = Vec::with_capacity(column_count);
        let mut callback_error: Option<ReError> = None;
        loop {
            buf.clear();
            self.read_packet_reuse_mem(&mut buf)?;
            if self.is_result_terminator(&buf) {
                self.finish_resultset(&buf, result)?;
                break;
            }
            if buf.first() == Some(&response_type::ERROR) {
                return Err(self.handle_error_packet(&buf));
            }

            resultset.row_count += 1;
            // 回调失败后继续读完剩余的行, 保证连接可用
            if callback_error.is_some() {
                continue;
            }
            ResultSetRowPacket::parse_into(&buf, &resultset.fields, &mut row)?;
            if let Err(e) = per_row(&row) {
                callback_error = Some(e);
            }
        }

        resultset.streaming_done = true;
        result.resultset = Some(resultset);

        if let Some(e) = callback_error {
            return Err(e);
        }
        if let Some(per_result) = per_result {
            per_result(result)?;
        }
        Ok(())
    }
}

/// The column count packet is a single length encoded integer.
fn parse_column_count(data: &[u8]) -> CResult<usize> {
    let mut cursor = Cursor::new(data);
    let (used, count) = read_len_enc_num(&mut cursor)?;
    if used != data.len() {
        return Err(ReError::malformed_packet());
    }
    if count > MAX_COLUMN_COUNT as u64 {
        return Err(ReError::ProtocolError(format!(
            "column count {} exceeds {}",
            count, MAX_COLUMN_COUNT
        )));
    }
    Ok(count as usize)
}

#[cfg(test)]
mod test {
    use common::err::decode_error::ReError;

    use crate::conn::query_result::{parse_column_count, QueryResult, Resultset, Streaming};
    use crate::declar::column_type::ColumnType;
    use crate::packet::field_packet::test::column_definition;
    use crate::packet::field_packet::Field;
    use crate::packet::result_set_row_packet::FieldValue;
    use crate::MAX_COLUMN_COUNT;

    #[test]
    fn test_parse_column_count() {
        assert_eq!(parse_column_count(&[0x02]).unwrap(), 2);
        assert_eq!(parse_column_count(&[0xFC, 0x00, 0x01]).unwrap(), 256);
        assert!(parse_column_count(&[0x02, 0x00]).is_err());
    }

    #[test]
    fn test_column_count_too_large() {
        let mut data = vec![0xFE];
        data.extend_from_slice(&(1u64 << 60).to_le_bytes());
        assert!(matches!(parse_column_count(&data), Err(ReError::ProtocolError(_))));

        assert_eq!(parse_column_count(&[0xFC, 0x00, 0x10]).unwrap(), MAX_COLUMN_COUNT);
        assert!(parse_column_count(&[0xFC, 0x01, 0x10]).is_err());
    }

    #[test]
    fn test_resultset_lookup() {
        let fields = vec![
            Field::parse(&column_definition("id", ColumnType::Long, 0)).unwrap(),
            Field::parse(&column_definition("name", ColumnType::VarString, 0)).unwrap(),
        ];
        let mut rs = Resultset::new(fields);
        rs.values.push(vec![FieldValue::Signed(1), FieldValue::Bytes(b"a".to_vec())]);

        assert_eq!(rs.column_number(), 2);
        assert_eq!(rs.row_number(), 1);
        assert_eq!(rs.get_value_by_name(0, "name"), Some(&FieldValue::Bytes(b"a".to_vec())));
        assert!(rs.get_value_by_name(0, "missing").is_none());
        assert!(rs.get_value(1, 0).is_none());

        let result = QueryResult::from_resultset(rs);
        assert!(result.has_resultset());
        assert!(!result.is_streaming_multiple_done());
        assert_eq!(result.resultset.unwrap().streaming, Streaming::None);
    }
}
