use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use once_cell::sync::Lazy;
use tracing::{debug, instrument, warn};

use common::err::decode_error::ReError;
use common::err::CResult;

use crate::commands::command::{Command, CommandType};
use crate::conn::connection_options::{ConnOption, SslOpts};
use crate::conn::dialer::{network_of, Dialer, TcpDialer, NETWORK_TCP};
use crate::conn::packet_channel::{PacketChannel, PacketTransport};
use crate::conn::query_result::{QueryResult, Resultset, Streaming};
use crate::conn::stmt::StatementHandler;
use crate::declar::capability_flags::{CAPABILITY_FLAG_NAMES, CLIENT_CONNECT_ATTRS};
use crate::declar::collation::{collation_by_name, default_collation_for_charset};
use crate::declar::status_flags::{StatusFlags, STATUS_FLAG_NAMES};
use crate::declar::flags_to_string;
use crate::packet::field_packet::Field;
use crate::packet::response_type;
use crate::packet::result_set_row_packet::FieldValue;
use crate::{DEFAULT_BUFFER_SIZE, DEFAULT_CHARSET, DEFAULT_CONNECT_TIMEOUT};

/// Connection attributes sent with every handshake, computed once per process.
pub static DEFAULT_ATTRIBUTES: Lazy<Vec<(&'static str, String)>> = Lazy::new(|| {
    vec![
        ("_client_name", env!("CARGO_PKG_NAME").to_string()),
        ("_client_version", env!("CARGO_PKG_VERSION").to_string()),
        ("_os", std::env::consts::OS.to_string()),
        ("_platform", std::env::consts::ARCH.to_string()),
        ("_pid", std::process::id().to_string()),
    ]
});

/// One client session.
///
/// Not safe for concurrent use: every command takes `&mut self` and the server answers strictly in order.
pub struct Conn {
    pub(crate) transport: Box<dyn PacketTransport>,

    pub(crate) addr: String,
    /// `tcp` or `unix`
    pub(crate) proto: String,
    pub(crate) user: String,
    pub(crate) password: String,
    pub(crate) db: String,
    pub(crate) ssl_opts: Option<SslOpts>,

    pub(crate) read_timeout: Option<Duration>,
    pub(crate) write_timeout: Option<Duration>,
    pub(crate) buffer_size: usize,

    pub(crate) server_version: String,
    /// Negotiated capabilities, written once by the handshake.
    pub(crate) capability: u32,
    /// Capabilities requested by the client.
    pub(crate) ccaps: u32,
    pub(crate) attributes: HashMap<String, String>,

    pub(crate) status: StatusFlags,
    pub(crate) charset: String,
    pub(crate) collation: String,

    pub(crate) salt: Vec<u8>,
    pub(crate) auth_plugin_name: String,
    pub(crate) connection_id: u32,

    pub(crate) statement_handler: Option<Box<dyn StatementHandler>>,
}

impl fmt::Debug for Conn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conn")
            .field("addr", &self.addr)
            .field("proto", &self.proto)
            .field("user", &self.user)
            .field("db", &self.db)
            .field("server_version", &self.server_version)
            .field("connection_id", &self.connection_id)
            .field("capability", &self.capability_string())
            .field("status", &self.status_string())
            .field("charset", &self.charset)
            .field("collation", &self.collation)
            .field("transport", &self.transport)
            .finish()
    }
}

impl Conn {
    fn new(
        transport: Box<dyn PacketTransport>,
        proto: &str,
        addr: &str,
        user: &str,
        password: &str,
        db: &str,
    ) -> Self {
        let attributes = DEFAULT_ATTRIBUTES
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();

        Conn {
            transport,
            addr: addr.to_string(),
            proto: proto.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            db: db.to_string(),
            ssl_opts: None,
            read_timeout: None,
            write_timeout: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            server_version: String::new(),
            capability: 0,
            ccaps: CLIENT_CONNECT_ATTRS,
            attributes,
            status: StatusFlags::empty(),
            charset: DEFAULT_CHARSET.to_string(),
            collation: String::new(),
            salt: Vec::new(),
            auth_plugin_name: String::new(),
            connection_id: 0,
            statement_handler: None,
        }
    }

    /// Dials `addr` with the default 10s timeout. An address containing `/` is a unix socket path.
    pub fn connect(
        addr: &str,
        user: &str,
        password: &str,
        db: &str,
        options: Vec<ConnOption>,
    ) -> CResult<Conn> {
        Conn::connect_with_timeout(addr, user, password, db, DEFAULT_CONNECT_TIMEOUT, options)
    }

    pub fn connect_with_timeout(
        addr: &str,
        user: &str,
        password: &str,
        db: &str,
        timeout: Duration,
        options: Vec<ConnOption>,
    ) -> CResult<Conn> {
        Conn::connect_with_dialer(
            network_of(addr),
            addr,
            user,
            password,
            db,
            timeout,
            &TcpDialer,
            options,
        )
    }

    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(password, dialer, options))]
    pub fn connect_with_dialer(
        network: &str,
        addr: &str,
        user: &str,
        password: &str,
        db: &str,
        timeout: Duration,
        dialer: &dyn Dialer,
        options: Vec<ConnOption>,
    ) -> CResult<Conn> {
        let stream = dialer
            .dial(network, addr, timeout)
            .map_err(|e| ReError::DialError(format!("{} {}: {}", network, addr, e)))?;
        let transport = Box::new(PacketChannel::new(stream));

        Conn::establish(
            Conn::new(transport, network, addr, user, password, db),
            options,
        )
    }

    /// Runs options and the handshake over an already opened transport.
    pub fn connect_with_transport(
        transport: Box<dyn PacketTransport>,
        addr: &str,
        user: &str,
        password: &str,
        db: &str,
        options: Vec<ConnOption>,
    ) -> CResult<Conn> {
        let network = if addr.is_empty() { NETWORK_TCP } else { network_of(addr) };
        Conn::establish(
            Conn::new(transport, network, addr, user, password, db),
            options,
        )
    }

    fn establish(mut conn: Conn, options: Vec<ConnOption>) -> CResult<Conn> {
        let result = conn.apply_options(options).and_then(|_| conn.handshake());
        if let Err(e) = result {
            debug!("connect to {} failed: {}", conn.addr, e);
            if let Err(close_err) = conn.transport.close() {
                warn!("close transport failed: {}", close_err);
            }
            return Err(e);
        }

        debug!(
            connection_id = conn.connection_id,
            server_version = %conn.server_version,
            "connected to {}",
            conn.addr
        );
        Ok(conn)
    }

    fn apply_options(&mut self, options: Vec<ConnOption>) -> CResult<()> {
        for option in options {
            option(self)?;
        }

        self.transport.set_read_timeout(self.read_timeout)?;
        self.transport.set_write_timeout(self.write_timeout)?;
        self.transport.set_buffer_size(self.buffer_size);
        Ok(())
    }

    /// Runs a statement. Without args it is a text query, with args it goes through the statement handler.
    #[instrument(skip(self, args))]
    pub fn execute(&mut self, sql: &str, args: &[FieldValue]) -> CResult<QueryResult> {
        if args.is_empty() {
            self.exec(sql)
        } else {
            self.execute_prepared(sql, args)
        }
    }

    pub(crate) fn exec(&mut self, sql: &str) -> CResult<QueryResult> {
        self.write_command(&Command::query(sql))?;
        self.read_result()
    }

    fn execute_prepared(&mut self, sql: &str, args: &[FieldValue]) -> CResult<QueryResult> {
        let mut handler = self.statement_handler.take().ok_or_else(|| {
            ReError::ConfigurationError(String::from(
                "Arguments need a statement handler, none is installed",
            ))
        })?;

        let result = self.run_statement(handler.as_mut(), sql, args);
        self.statement_handler = Some(handler);
        result
    }

    fn run_statement(
        &mut self,
        handler: &mut dyn StatementHandler,
        sql: &str,
        args: &[FieldValue],
    ) -> CResult<QueryResult> {
        let mut stmt = handler.prepare(self, sql)?;
        let result = stmt.execute(self, args);
        if let Err(e) = stmt.close(self) {
            warn!("close statement failed: {}", e);
        }
        result
    }

    /// Runs a multi statement query, handing every result to `per_result` as it is read.
    ///
    /// Reading stops after an error or after a result without SERVER_MORE_RESULTS_EXISTS.
    /// Returns an empty resultset marked [`Streaming::Multiple`] and done.
    #[instrument(skip(self, per_result))]
    pub fn execute_multiple<F>(&mut self, sql: &str, mut per_result: F) -> CResult<QueryResult>
    where
        F: FnMut(CResult<QueryResult>),
    {
        self.write_command(&Command::query(sql))?;

        let mut buf = Vec::new();
        loop {
            buf.clear();
            self.read_packet_reuse_mem(&mut buf)?;

            let result = self.classify_result(&buf);
            let more_results = matches!(&result, Ok(r) if r.status.more_results_exists());
            per_result(result);
            if !more_results {
                break;
            }
        }

        let resultset = Resultset {
            streaming: Streaming::Multiple,
            streaming_done: true,
            ..Resultset::default()
        };
        Ok(QueryResult::from_resultset(resultset))
    }

    /// Runs a query and passes every row to `per_row` without keeping it.
    ///
    /// `per_result` runs once after the resultset terminator, not when the column metadata
    /// arrives, so it sees the final status, field list and row count. It is not called
    /// for an OK response or when a row fails.
    /// If `per_row` fails the remaining rows are drained and its error is returned.
    #[instrument(skip(self, result, per_row, per_result))]
    pub fn execute_select_streaming<R>(
        &mut self,
        sql: &str,
        result: &mut QueryResult,
        per_row: R,
        per_result: Option<&mut dyn FnMut(&QueryResult) -> CResult<()>>,
    ) -> CResult<()>
    where
        R: FnMut(&[FieldValue]) -> CResult<()>,
    {
        self.write_command(&Command::query(sql))?;
        self.read_result_streaming(result, per_row, per_result)
    }

    pub fn use_db(&mut self, db: &str) -> CResult<()> {
        if self.db == db {
            return Ok(());
        }

        self.write_command(&Command::with_str(CommandType::InitDb, db))?;
        self.read_ok_packet()?;
        self.db = db.to_string();
        Ok(())
    }

    pub fn ping(&mut self) -> CResult<()> {
        self.write_command(&Command::new(CommandType::Ping))?;
        self.read_ok_packet()?;
        Ok(())
    }

    pub fn begin(&mut self) -> CResult<()> {
        self.exec("BEGIN")?;
        Ok(())
    }

    pub fn commit(&mut self) -> CResult<()> {
        self.exec("COMMIT")?;
        Ok(())
    }

    pub fn rollback(&mut self) -> CResult<()> {
        self.exec("ROLLBACK")?;
        Ok(())
    }

    /// COM_FIELD_LIST, deprecated by the server but still answered.
    pub fn field_list(&mut self, table: &str, wildcard: &str) -> CResult<Vec<Field>> {
        self.write_command(&Command::field_list(table, wildcard))?;

        let mut fields = Vec::new();
        loop {
            let data = self.read_packet()?;
            if data.first() == Some(&response_type::ERROR) {
                return Err(self.handle_error_packet(&data));
            }
            if self.is_result_terminator(&data) {
                return Ok(fields);
            }
            fields.push(Field::parse(&data)?);
        }
    }

    /// `SET NAMES` when the charset differs from the active one.
    pub fn set_charset(&mut self, charset: &str) -> CResult<()> {
        if self.charset == charset {
            return Ok(());
        }

        self.exec(&format!("SET NAMES {}", charset))?;
        self.charset = charset.to_string();
        Ok(())
    }

    /// Collation requested in the handshake. Only valid before the connection is established.
    pub fn set_collation(&mut self, collation: &str) -> CResult<()> {
        if !self.server_version.is_empty() {
            return Err(ReError::ConfigurationError(String::from(
                "Collation can only be set before the connection is established",
            )));
        }
        if collation_by_name(collation).is_none() {
            return Err(ReError::ConfigurationError(format!("Unknown collation {}", collation)));
        }

        self.collation = collation.to_string();
        Ok(())
    }

    /// Charset whose default collation is sent in the handshake when no collation is set.
    pub fn set_handshake_charset(&mut self, charset: &str) -> CResult<()> {
        if !self.server_version.is_empty() {
            return Err(ReError::ConfigurationError(String::from(
                "Use set_charset on an established connection",
            )));
        }
        if default_collation_for_charset(charset).is_none() {
            return Err(ReError::ConfigurationError(format!("Unknown charset {}", charset)));
        }

        self.charset = charset.to_string();
        Ok(())
    }

    /// Sends COM_QUIT without waiting for an answer, then closes the transport.
    pub fn quit(&mut self) -> CResult<()> {
        let sent = self.write_command(&Command::new(CommandType::Quit));
        let closed = self.transport.close();
        sent.and(closed)
    }

    pub fn close(&mut self) -> CResult<()> {
        self.transport.close()
    }

    pub fn set_auto_commit(&mut self) -> CResult<()> {
        if !self.is_auto_commit() {
            self.exec("SET AUTOCOMMIT = 1")?;
        }
        Ok(())
    }

    pub fn is_auto_commit(&self) -> bool {
        self.status.autocommit()
    }

    pub fn is_in_transaction(&self) -> bool {
        self.status.in_transaction()
    }

    pub fn set_capability(&mut self, capability: u32) {
        self.ccaps |= capability;
    }

    pub fn unset_capability(&mut self, capability: u32) {
        self.ccaps &= !capability;
    }

    pub fn has_capability(&self, capability: u32) -> bool {
        self.ccaps & capability != 0
    }

    /// TLS with default options. `insecure_skip_verify` disables certificate and host name checks.
    pub fn use_ssl(&mut self, insecure_skip_verify: bool) {
        self.ssl_opts = Some(
            SslOpts::default()
                .with_danger_accept_invalid_certs(insecure_skip_verify)
                .with_danger_skip_domain_validation(insecure_skip_verify),
        );
    }

    pub fn set_ssl_opts(&mut self, ssl_opts: SslOpts) {
        self.ssl_opts = Some(ssl_opts);
    }

    /// Merged over the default attributes, user values win.
    pub fn set_attributes(&mut self, attributes: HashMap<String, String>) {
        self.attributes.extend(attributes);
    }

    pub fn set_statement_handler(&mut self, handler: Box<dyn StatementHandler>) {
        self.statement_handler = Some(handler);
    }

    pub fn db(&self) -> &str {
        &self.db
    }

    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    pub fn compare_server_version(&self, version: &str) -> CResult<Ordering> {
        compare_server_versions(&self.server_version, version)
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn collation(&self) -> &str {
        &self.collation
    }

    pub fn connection_id(&self) -> u32 {
        self.connection_id
    }

    pub fn status(&self) -> StatusFlags {
        self.status
    }

    pub fn capability(&self) -> u32 {
        self.capability
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn auth_plugin_name(&self) -> &str {
        &self.auth_plugin_name
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    pub fn capability_string(&self) -> String {
        flags_to_string(self.capability as u64, CAPABILITY_FLAG_NAMES)
    }

    pub fn status_string(&self) -> String {
        flags_to_string(self.status.bits() as u64, STATUS_FLAG_NAMES)
    }

    pub fn read_packet(&mut self) -> CResult<Vec<u8>> {
        self.transport.read_packet()
    }

    pub fn read_packet_reuse_mem(&mut self, buf: &mut Vec<u8>) -> CResult<usize> {
        self.transport.read_packet_reuse_mem(buf)
    }

    pub fn write_packet(&mut self, payload: &[u8]) -> CResult<()> {
        self.transport.write_packet(payload)
    }

    pub fn sequence(&self) -> u8 {
        self.transport.sequence()
    }

    pub fn reset_sequence(&mut self) {
        self.transport.reset_sequence()
    }

    /// Every command starts a new sequence.
    pub(crate) fn write_command(&mut self, command: &Command) -> CResult<()> {
        self.transport.reset_sequence();
        let payload = command.serialize()?;
        self.transport.write_packet(&payload)
    }
}

/// Compares dotted versions by the numeric prefix of each part, `8.0.36-log` reads as `8.0.36`.
/// Missing trailing parts count as 0.
pub fn compare_server_versions(a: &str, b: &str) -> CResult<Ordering> {
    let mut a = parse_version(a)?;
    let mut b = parse_version(b)?;
    let len = a.len().max(b.len());
    a.resize(len, 0);
    b.resize(len, 0);
    Ok(a.cmp(&b))
}

fn parse_version(version: &str) -> CResult<Vec<u64>> {
    version
        .split('.')
        .map(|part| {
            let end = part
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(part.len());
            Ok(part[..end].parse::<u64>()?)
        })
        .collect()
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::cmp::Ordering;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    use common::err::decode_error::ReError;
    use common::err::CResult;

    use crate::commands::command::CommandType;
    use crate::conn::connection::{compare_server_versions, Conn, DEFAULT_ATTRIBUTES};
    use crate::conn::connection_options::with_capability;
    use crate::conn::mock::*;
    use crate::conn::query_result::{QueryResult, Streaming};
    use crate::conn::stmt::{Statement, StatementHandler};
    use crate::declar::capability_flags::{CAPABILITY_FLAG_NAMES, CLIENT_DEPRECATE_EOF};
    use crate::declar::column_type::ColumnType;
    use crate::declar::field_flags::{BINARY_FLAG, NOT_NULL_FLAG};
    use crate::declar::flags_from_string;
    use crate::declar::status_flags::*;
    use crate::packet::field_packet::test::column_definition;
    use crate::packet::result_set_row_packet::FieldValue;

    fn select_one(conn_mock: &MockTransport) {
        conn_mock.push_reads(vec![
            column_count(1),
            column_definition("1", ColumnType::LongLong, NOT_NULL_FLAG | BINARY_FLAG),
            eof_packet(SERVER_STATUS_AUTOCOMMIT),
            text_row(&[Some("1")]),
            eof_packet(SERVER_STATUS_AUTOCOMMIT),
        ]);
    }

    #[test]
    fn test_execute_select_one() {
        let (mock, mut conn) = connected(vec![]);
        select_one(&mock);

        let result = conn.execute("SELECT 1", &[]).unwrap();
        let rs = result.resultset.unwrap();
        assert_eq!(rs.fields.len(), 1);
        assert_eq!(rs.values.len(), 1);
        assert_eq!(rs.row_count, 1);
        assert_eq!(rs.values[0][0], FieldValue::Signed(1));
        assert_eq!(rs.get_value_by_name(0, "1"), Some(&FieldValue::Signed(1)));

        let writes = mock.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0][0], u8::from(CommandType::Query));
        assert_eq!(&writes[0][1..], b"SELECT 1");
    }

    #[test]
    fn test_execute_ok_updates_status() {
        let (mock, mut conn) = connected(vec![]);
        mock.push_read(ok_packet(3, 7, SERVER_STATUS_IN_TRANS | SERVER_STATUS_AUTOCOMMIT));

        let result = conn.execute("UPDATE t SET a = 1", &[]).unwrap();
        assert_eq!(result.affected_rows, 3);
        assert_eq!(result.insert_id, 7);
        assert!(!result.has_resultset());
        assert!(conn.is_in_transaction());
        assert!(conn.is_auto_commit());
    }

    #[test]
    fn test_query_error_keeps_session() {
        let (mock, mut conn) = connected(vec![]);
        mock.push_read(err_packet(1146, "42S02", "Table 'test.nope' doesn't exist"));
        mock.push_read(ok_packet(0, 0, SERVER_STATUS_AUTOCOMMIT));

        let err = conn.execute("SELECT * FROM nope", &[]).unwrap_err();
        assert!(err.is_query_error());
        assert_eq!(err.server_error().map(|e| e.code), Some(1146));
        assert_eq!(err.server_error().map(|e| e.state.as_str()), Some("42S02"));

        assert!(conn.execute("DO 1", &[]).is_ok());
        assert!(!mock.is_closed());
    }

    #[test]
    fn test_local_infile_rejected() {
        let (mock, mut conn) = connected(vec![]);
        let mut packet = vec![0xFB];
        packet.extend_from_slice(b"/etc/passwd");
        mock.push_read(packet);

        let err = conn.execute("LOAD DATA LOCAL INFILE '/etc/passwd' INTO TABLE t", &[]);
        assert!(matches!(err, Err(ReError::ProtocolError(_))));
    }

    #[test]
    fn test_deprecate_eof_terminator() {
        let (mock, mut conn) = connected(vec![with_capability(CLIENT_DEPRECATE_EOF)]);
        assert!(conn.capability() & CLIENT_DEPRECATE_EOF != 0);
        mock.push_reads(vec![
            column_count(2),
            column_definition("id", ColumnType::Long, 0),
            column_definition("name", ColumnType::VarString, 0),
            text_row(&[Some("1"), Some("a")]),
            text_row(&[Some("2"), None]),
            ok_terminator(SERVER_STATUS_AUTOCOMMIT, 1),
        ]);

        let result = conn.execute("SELECT id, name FROM t", &[]).unwrap();
        assert_eq!(result.warnings, 1);
        assert!(result.status.autocommit());
        let rs = result.resultset.unwrap();
        assert_eq!(rs.values.len(), 2);
        assert_eq!(rs.values[1][1], FieldValue::Null);
        assert_eq!(mock.remaining_reads(), 0);
    }

    #[test]
    fn test_execute_multiple_until_last() {
        let (mock, mut conn) = connected(vec![]);
        let more = SERVER_STATUS_AUTOCOMMIT | SERVER_MORE_RESULTS_EXISTS;
        mock.push_reads(vec![
            ok_packet(1, 0, more),
            column_count(1),
            column_definition("1", ColumnType::LongLong, 0),
            eof_packet(more),
            text_row(&[Some("1")]),
            eof_packet(more),
            ok_packet(2, 0, SERVER_STATUS_AUTOCOMMIT),
            // never read
            ok_packet(9, 0, SERVER_STATUS_AUTOCOMMIT),
        ]);

        let mut results: Vec<CResult<QueryResult>> = Vec::new();
        let sentinel = conn
            .execute_multiple("UPDATE t SET a=1; SELECT 1; DELETE FROM t", |r| results.push(r))
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().affected_rows, 1);
        assert_eq!(results[1].as_ref().unwrap().resultset.as_ref().unwrap().values.len(), 1);
        assert_eq!(results[2].as_ref().unwrap().affected_rows, 2);
        assert!(sentinel.is_streaming_multiple_done());
        assert_eq!(mock.remaining_reads(), 1);
    }

    #[test]
    fn test_execute_multiple_stops_on_error() {
        let (mock, mut conn) = connected(vec![]);
        mock.push_reads(vec![
            ok_packet(1, 0, SERVER_STATUS_AUTOCOMMIT | SERVER_MORE_RESULTS_EXISTS),
            err_packet(1064, "42000", "You have an error in your SQL syntax"),
            ok_packet(2, 0, SERVER_STATUS_AUTOCOMMIT),
        ]);

        let mut calls = 0;
        let mut errors = 0;
        let sentinel = conn
            .execute_multiple("DO 1; SELEC; DO 2", |r| {
                calls += 1;
                if r.is_err() {
                    errors += 1;
                }
            })
            .unwrap();

        assert_eq!(calls, 2);
        assert_eq!(errors, 1);
        assert_eq!(sentinel.resultset.unwrap().streaming, Streaming::Multiple);
        assert_eq!(mock.remaining_reads(), 1);
    }

    #[test]
    fn test_execute_multiple_read_error() {
        let (_mock, mut conn) = connected(vec![]);
        let mut calls = 0;
        let result = conn.execute_multiple("DO 1", |_| calls += 1);
        assert!(matches!(result, Err(ReError::IoError(_))));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_select_streaming() {
        let (mock, mut conn) = connected(vec![]);
        mock.push_reads(vec![
            column_count(2),
            column_definition("id", ColumnType::LongLong, 0),
            column_definition("name", ColumnType::VarString, 0),
            eof_packet(SERVER_STATUS_AUTOCOMMIT),
            text_row(&[Some("1"), Some("a")]),
            text_row(&[Some("2"), Some("b")]),
            text_row(&[Some("3"), Some("c")]),
            eof_packet(SERVER_STATUS_AUTOCOMMIT),
        ]);

        let mut ids = Vec::new();
        let mut summary = None;
        let mut per_result = |r: &QueryResult| -> CResult<()> {
            let rs = r.resultset.as_ref().unwrap();
            summary = Some((rs.column_number(), rs.row_count, rs.values.len()));
            Ok(())
        };
        let mut result = QueryResult::default();
        conn.execute_select_streaming(
            "SELECT id, name FROM t",
            &mut result,
            |row| {
                ids.push(row[0].as_i64().unwrap());
                Ok(())
            },
            Some(&mut per_result),
        )
        .unwrap();

        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(summary, Some((2, 3, 0)));
        let rs = result.resultset.unwrap();
        assert!(rs.values.is_empty());
        assert_eq!(rs.streaming, Streaming::Select);
        assert!(rs.streaming_done);
    }

    #[test]
    fn test_select_streaming_callback_error_drains() {
        let (mock, mut conn) = connected(vec![]);
        mock.push_reads(vec![
            column_count(1),
            column_definition("id", ColumnType::LongLong, 0),
            eof_packet(SERVER_STATUS_AUTOCOMMIT),
            text_row(&[Some("1")]),
            text_row(&[Some("2")]),
            eof_packet(SERVER_STATUS_AUTOCOMMIT),
        ]);
        mock.push_read(ok_packet(0, 0, SERVER_STATUS_AUTOCOMMIT));

        let mut calls = 0;
        let mut result = QueryResult::default();
        let err = conn
            .execute_select_streaming(
                "SELECT id FROM t",
                &mut result,
                |_| {
                    calls += 1;
                    Err(ReError::ConfigurationError(String::from("stop")))
                },
                None,
            )
            .unwrap_err();

        assert!(matches!(err, ReError::ConfigurationError(_)));
        assert_eq!(calls, 1);
        // the session is still in sync
        assert!(conn.ping().is_ok());
    }

    #[test]
    fn test_select_streaming_ok() {
        let (mock, mut conn) = connected(vec![]);
        mock.push_read(ok_packet(4, 0, SERVER_STATUS_AUTOCOMMIT));

        let mut result = QueryResult::default();
        conn.execute_select_streaming("DELETE FROM t", &mut result, |_| Ok(()), None)
            .unwrap();
        assert_eq!(result.affected_rows, 4);
        assert!(result.resultset.is_none());
    }

    #[test]
    fn test_column_count_too_large() {
        let (mock, mut conn) = connected(vec![]);
        let mut packet = vec![0xFE];
        packet.extend_from_slice(&(1u64 << 60).to_le_bytes());
        mock.push_read(packet);

        let err = conn.execute("SELECT 1", &[]).unwrap_err();
        assert!(matches!(err, ReError::ProtocolError(_)));
    }

    fn rows_then_error(conn_mock: &MockTransport) {
        conn_mock.push_reads(vec![
            column_count(1),
            column_definition("id", ColumnType::LongLong, 0),
            eof_packet(SERVER_STATUS_AUTOCOMMIT),
            text_row(&[Some("1")]),
            err_packet(1317, "70100", "Query execution was interrupted"),
            ok_packet(0, 0, SERVER_STATUS_AUTOCOMMIT),
        ]);
    }

    #[test]
    fn test_error_in_row_stream() {
        let (mock, mut conn) = connected(vec![]);
        rows_then_error(&mock);

        let err = conn.execute("SELECT id FROM t", &[]).unwrap_err();
        assert!(err.is_query_error());
        assert_eq!(err.server_error().map(|e| e.code), Some(1317));

        assert!(conn.ping().is_ok());
        assert_eq!(mock.remaining_reads(), 0);
    }

    #[test]
    fn test_select_streaming_error_in_row_stream() {
        let (mock, mut conn) = connected(vec![]);
        rows_then_error(&mock);

        let mut ids = Vec::new();
        let mut per_result_calls = 0;
        let mut per_result = |_: &QueryResult| -> CResult<()> {
            per_result_calls += 1;
            Ok(())
        };
        let mut result = QueryResult::default();
        let err = conn
            .execute_select_streaming(
                "SELECT id FROM t",
                &mut result,
                |row| {
                    ids.push(row[0].as_i64().unwrap());
                    Ok(())
                },
                Some(&mut per_result),
            )
            .unwrap_err();

        assert!(err.is_query_error());
        assert_eq!(ids, vec![1]);
        assert_eq!(per_result_calls, 0);
        assert!(conn.ping().is_ok());
    }

    #[test]
    fn test_use_db_idempotent() {
        let (mock, mut conn) = connected(vec![]);
        mock.push_read(ok_packet(0, 0, SERVER_STATUS_AUTOCOMMIT));

        conn.use_db("orders").unwrap();
        assert_eq!(conn.db(), "orders");
        conn.use_db("orders").unwrap();

        let writes = mock.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0][0], u8::from(CommandType::InitDb));
        assert_eq!(&writes[0][1..], b"orders");
    }

    #[test]
    fn test_use_db_error_keeps_db() {
        let (mock, mut conn) = connected(vec![]);
        mock.push_read(err_packet(1049, "42000", "Unknown database 'nope'"));

        assert!(conn.use_db("nope").unwrap_err().is_query_error());
        assert_eq!(conn.db(), "");
    }

    #[test]
    fn test_ping_and_transactions() {
        let (mock, mut conn) = connected(vec![]);
        mock.push_reads(vec![
            ok_packet(0, 0, SERVER_STATUS_AUTOCOMMIT),
            ok_packet(0, 0, SERVER_STATUS_AUTOCOMMIT | SERVER_STATUS_IN_TRANS),
            ok_packet(0, 0, SERVER_STATUS_AUTOCOMMIT),
        ]);

        conn.ping().unwrap();
        conn.begin().unwrap();
        assert!(conn.is_in_transaction());
        conn.commit().unwrap();
        assert!(!conn.is_in_transaction());

        let writes = mock.writes();
        assert_eq!(writes[0], vec![u8::from(CommandType::Ping)]);
        assert_eq!(&writes[1][1..], b"BEGIN");
        assert_eq!(&writes[2][1..], b"COMMIT");
    }

    #[test]
    fn test_every_command_resets_sequence() {
        let (mock, mut conn) = connected(vec![]);
        mock.push_reads(vec![
            ok_packet(0, 0, SERVER_STATUS_AUTOCOMMIT),
            ok_packet(0, 0, SERVER_STATUS_AUTOCOMMIT),
        ]);

        conn.ping().unwrap();
        // one write, one read
        assert_eq!(conn.sequence(), 2);
        conn.rollback().unwrap();
        assert_eq!(conn.sequence(), 2);
    }

    #[test]
    fn test_set_auto_commit() {
        let (mock, mut conn) = connected(vec![]);
        mock.push_read(ok_packet(0, 0, 0));
        conn.execute("SET AUTOCOMMIT = 0", &[]).unwrap();
        assert!(!conn.is_auto_commit());

        mock.push_read(ok_packet(0, 0, SERVER_STATUS_AUTOCOMMIT));
        conn.set_auto_commit().unwrap();
        assert!(conn.is_auto_commit());
        conn.set_auto_commit().unwrap();
        assert_eq!(mock.writes().len(), 2);
    }

    #[test]
    fn test_field_list() {
        let (mock, mut conn) = connected(vec![]);
        mock.push_reads(vec![
            column_definition("id", ColumnType::Long, NOT_NULL_FLAG),
            column_definition("name", ColumnType::VarString, 0),
            eof_packet(SERVER_STATUS_AUTOCOMMIT),
        ]);

        let fields = conn.field_list("t", "").unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].name, "name");
        assert_eq!(mock.writes()[0], vec![u8::from(CommandType::FieldList), b't', 0]);

        mock.push_read(err_packet(1146, "42S02", "Table 'test.x' doesn't exist"));
        assert!(conn.field_list("x", "").unwrap_err().is_query_error());
    }

    #[test]
    fn test_set_charset() {
        let (mock, mut conn) = connected(vec![]);
        assert_eq!(conn.charset(), "utf8");
        conn.set_charset("utf8").unwrap();
        assert!(mock.writes().is_empty());

        mock.push_read(ok_packet(0, 0, SERVER_STATUS_AUTOCOMMIT));
        conn.set_charset("utf8mb4").unwrap();
        assert_eq!(conn.charset(), "utf8mb4");
        assert_eq!(&mock.writes()[0][1..], b"SET NAMES utf8mb4");
    }

    #[test]
    fn test_set_collation_after_connect() {
        let (mock, mut conn) = connected(vec![]);
        let before = conn.collation().to_string();

        let err = conn.set_collation("utf8mb4_bin").unwrap_err();
        assert!(matches!(err, ReError::ConfigurationError(_)));
        assert_eq!(conn.collation(), before);
        assert!(conn.set_handshake_charset("utf8mb4").is_err());
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn test_quit() {
        let (mock, mut conn) = connected(vec![]);
        conn.quit().unwrap();

        assert_eq!(
            mock.events(),
            vec![MockEvent::Write(vec![u8::from(CommandType::Quit)]), MockEvent::Close]
        );
        assert!(conn.ping().is_err());
    }

    #[test]
    fn test_flag_strings_round_trip() {
        let (mock, mut conn) = connected(vec![]);
        let caps = conn.capability_string();
        assert!(caps.contains("CLIENT_PROTOCOL_41"));
        assert_eq!(
            flags_from_string(&caps, CAPABILITY_FLAG_NAMES),
            Some(conn.capability() as u64)
        );

        mock.push_read(ok_packet(0, 0, SERVER_STATUS_AUTOCOMMIT | SERVER_STATUS_IN_TRANS));
        conn.begin().unwrap();
        assert_eq!(conn.status_string(), "SERVER_STATUS_IN_TRANS|SERVER_STATUS_AUTOCOMMIT");
        assert_eq!(
            flags_from_string(&conn.status_string(), STATUS_FLAG_NAMES),
            Some(conn.status().bits() as u64)
        );
    }

    #[test]
    fn test_default_attributes() {
        let (_mock, conn) = connected(vec![]);
        for (key, value) in DEFAULT_ATTRIBUTES.iter() {
            assert_eq!(conn.attributes().get(*key), Some(value));
        }
        assert_eq!(
            conn.attributes().get("_client_name").map(String::as_str),
            Some("connection")
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let (_mock, conn) = connected(vec![]);
        let text = format!("{:?}", conn);
        assert!(text.contains("8.0.36"));
        assert!(!text.contains(TEST_PASSWORD));
    }

    #[test]
    fn test_compare_server_versions() {
        assert_eq!(compare_server_versions("8.0.36", "8.0.4").unwrap(), Ordering::Greater);
        assert_eq!(compare_server_versions("5.7.44-log", "5.7.44").unwrap(), Ordering::Equal);
        assert_eq!(compare_server_versions("8.0", "8.0.0").unwrap(), Ordering::Equal);
        assert_eq!(compare_server_versions("5.6.51", "5.7").unwrap(), Ordering::Less);
        assert!(matches!(
            compare_server_versions("x.1", "8.0"),
            Err(ReError::ParseIntError(_))
        ));

        let (_mock, conn) = connected(vec![]);
        assert_eq!(conn.compare_server_version("8.0.0").unwrap(), Ordering::Greater);
    }

    #[derive(Default)]
    struct Calls {
        prepared: Vec<String>,
        executed: Vec<Vec<FieldValue>>,
        closed: usize,
    }

    struct RecordingHandler {
        calls: Arc<Mutex<Calls>>,
    }

    struct RecordingStatement {
        calls: Arc<Mutex<Calls>>,
    }

    impl StatementHandler for RecordingHandler {
        fn prepare(&mut self, conn: &mut Conn, query: &str) -> CResult<Box<dyn Statement>> {
            assert!(conn.statement_handler.is_none());
            self.calls.lock().unwrap().prepared.push(query.to_string());
            Ok(Box::new(RecordingStatement {
                calls: self.calls.clone(),
            }))
        }
    }

    impl Statement for RecordingStatement {
        fn execute(&mut self, _conn: &mut Conn, args: &[FieldValue]) -> CResult<QueryResult> {
            self.calls.lock().unwrap().executed.push(args.to_vec());
            Ok(QueryResult {
                affected_rows: 1,
                ..QueryResult::default()
            })
        }

        fn close(&mut self, _conn: &mut Conn) -> CResult<()> {
            self.calls.lock().unwrap().closed += 1;
            Ok(())
        }
    }

    #[test]
    fn test_execute_with_args() {
        let (mock, mut conn) = connected(vec![]);
        let err = conn
            .execute("SELECT ?", &[FieldValue::Signed(1)])
            .unwrap_err();
        assert!(matches!(err, ReError::ConfigurationError(_)));

        let calls = Arc::new(Mutex::new(Calls::default()));
        conn.set_statement_handler(Box::new(RecordingHandler {
            calls: calls.clone(),
        }));
        let result = conn
            .execute("UPDATE t SET a = ?", &[FieldValue::Unsigned(5)])
            .unwrap();
        assert_eq!(result.affected_rows, 1);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.prepared, vec!["UPDATE t SET a = ?".to_string()]);
        assert_eq!(calls.executed, vec![vec![FieldValue::Unsigned(5)]]);
        assert_eq!(calls.closed, 1);
        assert!(conn.statement_handler.is_some());
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn test_rows_are_not_shared_between_callbacks() {
        let (mock, mut conn) = connected(vec![]);
        mock.push_reads(vec![
            column_count(1),
            column_definition("v", ColumnType::VarString, 0),
            eof_packet(SERVER_STATUS_AUTOCOMMIT),
            text_row(&[Some("first")]),
            text_row(&[Some("second")]),
            eof_packet(SERVER_STATUS_AUTOCOMMIT),
        ]);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut result = QueryResult::default();
        conn.execute_select_streaming(
            "SELECT v FROM t",
            &mut result,
            move |row| {
                sink.borrow_mut().push(row[0].to_string());
                Ok(())
            },
            None,
        )
        .unwrap();
        assert_eq!(*seen.borrow(), vec!["first".to_string(), "second".to_string()]);
    }
}
