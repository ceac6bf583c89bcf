//! Scripted in-memory transport for driving the session in unit tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::Level;

use common::err::decode_error::ReError;
use common::err::CResult;

use crate::bytes::{write_len_enc_bytes, write_len_enc_num};
use crate::conn::connection::Conn;
use crate::conn::connection_options::{ConnOption, SslOpts};
use crate::conn::packet_channel::{Compression, PacketTransport};
use crate::declar::auth_plugin_names::MY_SQL_NATIVE_PASSWORD;
use crate::declar::status_flags::SERVER_STATUS_AUTOCOMMIT;
use crate::packet::handshake_packet::test::{greeting, server_capabilities};

pub const TEST_USER: &str = "root";
pub const TEST_PASSWORD: &str = "s3cr3t-pw";

static TEST_LOG: Once = Once::new();

/// TRACE level subscriber writing through the test harness, installed once per test binary.
pub fn init_test_log() {
    TEST_LOG.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_test_writer()
            .finish();
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Unable to set test subscriber: {}", e);
        }
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Write(Vec<u8>),
    UpgradeTls,
    Close,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub reads: VecDeque<Vec<u8>>,
    pub events: Vec<MockEvent>,
    pub sequence: u8,
    pub compression: Compression,
    pub tls: bool,
    pub closed: bool,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub buffer_size: usize,
}

/// Clones share the state, so a test keeps one handle while the session owns another.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport::default()
    }

    pub fn with_reads(reads: Vec<Vec<u8>>) -> Self {
        let mock = MockTransport::new();
        mock.push_reads(reads);
        mock
    }

    pub fn push_read(&self, packet: Vec<u8>) {
        self.state.lock().unwrap().reads.push_back(packet);
    }

    pub fn push_reads(&self, packets: Vec<Vec<u8>>) {
        self.state.lock().unwrap().reads.extend(packets);
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MockEvent::Write(payload) => Some(payload),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&self) {
        self.state.lock().unwrap().events.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    pub fn remaining_reads(&self) -> usize {
        self.state.lock().unwrap().reads.len()
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

impl PacketTransport for MockTransport {
    fn read_packet_reuse_mem(&mut self, buf: &mut Vec<u8>) -> CResult<usize> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "transport closed").into());
        }
        let packet = state
            .reads
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted packet"))?;
        state.sequence = state.sequence.wrapping_add(1);
        buf.extend_from_slice(&packet);
        Ok(packet.len())
    }

    fn write_packet(&mut self, payload: &[u8]) -> CResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "transport closed").into());
        }
        state.sequence = state.sequence.wrapping_add(1);
        state.events.push(MockEvent::Write(payload.to_vec()));
        Ok(())
    }

    fn close(&mut self) -> CResult<()> {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        state.events.push(MockEvent::Close);
        Ok(())
    }

    fn sequence(&self) -> u8 {
        self.state.lock().unwrap().sequence
    }

    fn set_sequence(&mut self, sequence: u8) {
        self.state.lock().unwrap().sequence = sequence;
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> CResult<()> {
        self.state.lock().unwrap().read_timeout = timeout;
        Ok(())
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> CResult<()> {
        self.state.lock().unwrap().write_timeout = timeout;
        Ok(())
    }

    fn set_buffer_size(&mut self, buffer_size: usize) {
        self.state.lock().unwrap().buffer_size = buffer_size;
    }

    fn compression(&self) -> Compression {
        self.state.lock().unwrap().compression
    }

    fn set_compression(&mut self, compression: Compression) {
        self.state.lock().unwrap().compression = compression;
    }

    fn upgrade_to_tls(&mut self, _domain: &str, _ssl_opts: &SslOpts) -> CResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.tls {
            return Err(ReError::ProtocolError(String::from("already upgraded")));
        }
        state.tls = true;
        state.events.push(MockEvent::UpgradeTls);
        Ok(())
    }

    fn is_tls(&self) -> bool {
        self.state.lock().unwrap().tls
    }
}

pub fn ok_packet(affected_rows: u64, last_insert_id: u64, status: u16) -> Vec<u8> {
    let mut packet = vec![0x00];
    write_len_enc_num(&mut packet, affected_rows).unwrap();
    write_len_enc_num(&mut packet, last_insert_id).unwrap();
    packet.write_u16::<LittleEndian>(status).unwrap();
    packet.write_u16::<LittleEndian>(0).unwrap();
    packet
}

/// OK packet with the 0xFE header that closes a resultset under CLIENT_DEPRECATE_EOF.
pub fn ok_terminator(status: u16, warnings: u16) -> Vec<u8> {
    let mut packet = vec![0xFE, 0x00, 0x00];
    packet.write_u16::<LittleEndian>(status).unwrap();
    packet.write_u16::<LittleEndian>(warnings).unwrap();
    packet
}

pub fn eof_packet(status: u16) -> Vec<u8> {
    let mut packet = vec![0xFE];
    packet.write_u16::<LittleEndian>(0).unwrap();
    packet.write_u16::<LittleEndian>(status).unwrap();
    packet
}

pub fn err_packet(code: u16, state: &str, message: &str) -> Vec<u8> {
    let mut packet = vec![0xFF];
    packet.write_u16::<LittleEndian>(code).unwrap();
    packet.push(b'#');
    packet.extend_from_slice(state.as_bytes());
    packet.extend_from_slice(message.as_bytes());
    packet
}

pub fn column_count(count: u64) -> Vec<u8> {
    let mut packet = Vec::new();
    write_len_enc_num(&mut packet, count).unwrap();
    packet
}

/// Text protocol row, `None` is NULL.
pub fn text_row(values: &[Option<&str>]) -> Vec<u8> {
    let mut packet = Vec::new();
    for value in values {
        match value {
            Some(v) => write_len_enc_bytes(&mut packet, v.as_bytes()).unwrap(),
            None => packet.push(0xFB),
        }
    }
    packet
}

/// Runs the connect sequence over `mock` with the scripted packets it already holds.
pub fn connect_mock(mock: &MockTransport, options: Vec<ConnOption>) -> CResult<Conn> {
    init_test_log();
    Conn::connect_with_transport(
        Box::new(mock.clone()),
        "127.0.0.1:3306",
        TEST_USER,
        TEST_PASSWORD,
        "",
        options,
    )
}

/// A session authenticated with mysql_native_password, events cleared.
pub fn connected(options: Vec<ConnOption>) -> (MockTransport, Conn) {
    let mock = MockTransport::with_reads(vec![
        greeting(server_capabilities(), MY_SQL_NATIVE_PASSWORD),
        ok_packet(0, 0, SERVER_STATUS_AUTOCOMMIT),
    ]);
    let conn = connect_mock(&mock, options).unwrap();
    mock.clear_events();
    (mock, conn)
}

#[cfg(test)]
mod test {
    use crate::conn::mock::{init_test_log, MockEvent, MockTransport};
    use crate::conn::packet_channel::PacketTransport;

    #[test]
    fn test_init_test_log_twice() {
        init_test_log();
        init_test_log();
        tracing::trace!("test subscriber installed");
    }

    #[test]
    fn test_shared_state() {
        let mock = MockTransport::with_reads(vec![vec![0x00]]);
        let mut transport = mock.clone();
        assert_eq!(transport.read_packet().unwrap(), vec![0x00]);
        transport.write_packet(b"\x0e").unwrap();
        transport.close().unwrap();

        assert_eq!(mock.events(), vec![MockEvent::Write(vec![0x0e]), MockEvent::Close]);
        assert!(mock.is_closed());
        assert!(transport.read_packet().is_err());
    }
}
