use std::io::{BufReader, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::os::unix::net::UnixStream;
use std::time::Duration;
use std::{fmt, io, mem};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use tracing::{debug, trace};

use common::err::decode_error::ReError;
use common::err::CResult;

use crate::conn::connection_options::SslOpts;
use crate::{
    COMPRESSED_HEADER_SIZE, DEFAULT_BUFFER_SIZE, MAX_PAYLOAD_LEN, MIN_COMPRESS_LENGTH,
    PACKET_HEADER_SIZE, ZSTD_COMPRESSION_LEVEL,
};

/// Compression codec of the compressed protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Zlib,
    Zstd,
}

/// Packet level transport used by the session.
///
/// Implementations own the sequence counter, the compression state and the TLS state of one connection.
pub trait PacketTransport: Send + fmt::Debug {
    /// Reads one logical packet, joining packets split at 16MB.
    fn read_packet(&mut self) -> CResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.read_packet_reuse_mem(&mut buf)?;
        Ok(buf)
    }

    /// Appends the payload of the next logical packet to `buf`, returns the number of bytes appended.
    fn read_packet_reuse_mem(&mut self, buf: &mut Vec<u8>) -> CResult<usize>;

    fn write_packet(&mut self, payload: &[u8]) -> CResult<()>;

    fn close(&mut self) -> CResult<()>;

    fn sequence(&self) -> u8;

    fn set_sequence(&mut self, sequence: u8);

    /// Called before every command.
    fn reset_sequence(&mut self) {
        self.set_sequence(0);
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> CResult<()>;

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> CResult<()>;

    fn set_buffer_size(&mut self, _buffer_size: usize) {}

    fn compression(&self) -> Compression;

    fn set_compression(&mut self, compression: Compression);

    /// Wraps the stream in TLS. The sequence number is kept.
    fn upgrade_to_tls(&mut self, domain: &str, ssl_opts: &SslOpts) -> CResult<()>;

    fn is_tls(&self) -> bool;
}

#[derive(Debug)]
pub struct PacketChannel {
    /// Reads go through the buffer, writes go straight to the inner stream.
    stream: BufReader<ChannelStream>,
    sequence: u8,
    compressed_sequence: u8,
    compression: Compression,
    /// Uncompressed bytes of the last compressed frame not consumed yet.
    pending: Vec<u8>,
    pending_pos: usize,
    buffer_size: usize,
}

impl PacketChannel {
    pub fn new(stream: ChannelStream) -> Self {
        Self {
            stream: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
            sequence: 0,
            compressed_sequence: 0,
            compression: Compression::None,
            pending: Vec::new(),
            pending_pos: 0,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    fn take_stream(&mut self) -> ChannelStream {
        mem::replace(&mut self.stream, BufReader::with_capacity(0, ChannelStream::Closed)).into_inner()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> CResult<()> {
        if self.compression == Compression::None {
            self.stream.read_exact(buf)?;
            return Ok(());
        }

        let mut filled = 0;
        while filled < buf.len() {
            if self.pending_pos >= self.pending.len() {
                self.read_compressed_frame()?;
                continue;
            }
            let n = (buf.len() - filled).min(self.pending.len() - self.pending_pos);
            buf[filled..filled + n].copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + n]);
            filled += n;
            self.pending_pos += n;
        }
        Ok(())
    }

    fn read_compressed_frame(&mut self) -> CResult<()> {
        let mut header = [0u8; COMPRESSED_HEADER_SIZE];
        self.stream.read_exact(&mut header)?;
        let compressed_len = (&header[0..3]).read_u24::<LittleEndian>()? as usize;
        let seq_num = header[3];
        let uncompressed_len = (&header[4..7]).read_u24::<LittleEndian>()? as usize;

        if seq_num != self.compressed_sequence {
            return Err(ReError::ProtocolError(format!(
                "invalid compressed sequence {} != {}",
                seq_num, self.compressed_sequence
            )));
        }
        self.compressed_sequence = seq_num.wrapping_add(1);

        let mut data = vec![0u8; compressed_len];
        self.stream.read_exact(&mut data)?;

        // 长度为0表示未压缩
        self.pending = if uncompressed_len == 0 {
            data
        } else {
            decompress(self.compression, &data, uncompressed_len)?
        };
        self.pending_pos = 0;
        trace!(compressed_len, uncompressed_len, "read compressed frame");
        Ok(())
    }

    fn write_compressed(&mut self, data: &[u8]) -> CResult<()> {
        let mut out = Vec::with_capacity(data.len() + COMPRESSED_HEADER_SIZE);
        for chunk in data.chunks(MAX_PAYLOAD_LEN) {
            let (body, uncompressed_len) = if chunk.len() < MIN_COMPRESS_LENGTH {
                (chunk.to_vec(), 0)
            } else {
                (compress(self.compression, chunk)?, chunk.len())
            };

            out.write_u24::<LittleEndian>(body.len() as u32)?;
            out.write_u8(self.compressed_sequence)?;
            out.write_u24::<LittleEndian>(uncompressed_len as u32)?;
            out.extend_from_slice(&body);
            self.compressed_sequence = self.compressed_sequence.wrapping_add(1);
        }
        self.stream.get_mut().write_all(&out)?;
        Ok(())
    }
}

impl PacketTransport for PacketChannel {
    fn read_packet_reuse_mem(&mut self, buf: &mut Vec<u8>) -> CResult<usize> {
        let start = buf.len();
        loop {
            let mut header = [0u8; PACKET_HEADER_SIZE];
            self.read_exact(&mut header)?;
            let packet_size = (&header[0..3]).read_u24::<LittleEndian>()? as usize;
            let seq_num = header[3];

            // 压缩协议下内层序号由压缩帧保证
            if self.compression == Compression::None && seq_num != self.sequence {
                return Err(ReError::ProtocolError(format!(
                    "invalid sequence {} != {}",
                    seq_num, self.sequence
                )));
            }
            self.sequence = seq_num.wrapping_add(1);

            let offset = buf.len();
            buf.resize(offset + packet_size, 0);
            self.read_exact(&mut buf[offset..])?;

            if packet_size < MAX_PAYLOAD_LEN {
                break;
            }
        }
        trace!(len = buf.len() - start, "read packet");
        Ok(buf.len() - start)
    }

    fn write_packet(&mut self, payload: &[u8]) -> CResult<()> {
        let mut data = Vec::with_capacity(payload.len() + PACKET_HEADER_SIZE);
        let mut offset = 0;
        loop {
            let size = (payload.len() - offset).min(MAX_PAYLOAD_LEN);
            data.write_u24::<LittleEndian>(size as u32)?;
            data.write_u8(self.sequence)?;
            data.extend_from_slice(&payload[offset..offset + size]);
            self.sequence = self.sequence.wrapping_add(1);
            offset += size;

            // a payload of exactly 16MB is followed by an empty packet
            if size < MAX_PAYLOAD_LEN {
                break;
            }
        }

        if self.compression == Compression::None {
            self.stream.get_mut().write_all(&data)?;
        } else {
            self.write_compressed(&data)?;
        }
        self.stream.get_mut().flush()?;
        trace!(len = payload.len(), "write packet");
        Ok(())
    }

    fn close(&mut self) -> CResult<()> {
        let mut stream = self.take_stream();
        match stream.shutdown() {
            Ok(()) => Ok(()),
            // 对端已关闭
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn sequence(&self) -> u8 {
        self.sequence
    }

    fn set_sequence(&mut self, sequence: u8) {
        self.sequence = sequence;
    }

    fn reset_sequence(&mut self) {
        self.sequence = 0;
        self.compressed_sequence = 0;
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> CResult<()> {
        self.stream.get_ref().set_read_timeout(timeout)?;
        Ok(())
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> CResult<()> {
        self.stream.get_ref().set_write_timeout(timeout)?;
        Ok(())
    }

    fn set_buffer_size(&mut self, buffer_size: usize) {
        self.buffer_size = buffer_size;
        // bytes already buffered would be dropped by a new reader
        if self.stream.capacity() == buffer_size || !self.stream.buffer().is_empty() {
            return;
        }
        let stream = self.take_stream();
        self.stream = BufReader::with_capacity(buffer_size, stream);
        trace!(buffer_size, "packet channel read buffer");
    }

    fn compression(&self) -> Compression {
        self.compression
    }

    fn set_compression(&mut self, compression: Compression) {
        debug!(?compression, "packet channel compression");
        self.compression = compression;
    }

    fn upgrade_to_tls(&mut self, domain: &str, ssl_opts: &SslOpts) -> CResult<()> {
        let tls_connector = ssl_opts.build_connector()?;
        if !self.stream.buffer().is_empty() {
            return Err(ReError::ProtocolError(String::from(
                "Unexpected data before the TLS handshake",
            )));
        }

        let buffer_size = self.buffer_size;
        match self.take_stream() {
            ChannelStream::Tcp(tcp_stream) => {
                let secure_stream = tls_connector.connect(domain, tcp_stream).map_err(|err| {
                    ReError::ProtocolError(format!("Can not connect tls. err:{{{err}}}"))
                })?;
                self.stream = BufReader::with_capacity(
                    buffer_size,
                    ChannelStream::Tls(Box::new(secure_stream)),
                );
                debug!(domain, "upgraded to tls");
                Ok(())
            }
            ChannelStream::Unix(unix_stream) => {
                self.stream = BufReader::with_capacity(buffer_size, ChannelStream::Unix(unix_stream));
                Err(ReError::ConfigurationError(String::from(
                    "TLS is not supported over a unix socket",
                )))
            }
            stream => {
                self.stream = BufReader::with_capacity(buffer_size, stream);
                Ok(())
            }
        }
    }

    fn is_tls(&self) -> bool {
        matches!(self.stream.get_ref(), ChannelStream::Tls(_))
    }
}

fn compress(compression: Compression, data: &[u8]) -> CResult<Vec<u8>> {
    match compression {
        Compression::None => Ok(data.to_vec()),
        Compression::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        Compression::Zstd => Ok(zstd::bulk::compress(data, ZSTD_COMPRESSION_LEVEL as i32)?),
    }
}

fn decompress(compression: Compression, data: &[u8], uncompressed_len: usize) -> CResult<Vec<u8>> {
    let out = match compression {
        Compression::None => data.to_vec(),
        Compression::Zlib => {
            let mut out = Vec::with_capacity(uncompressed_len);
            ZlibDecoder::new(data).read_to_end(&mut out)?;
            out
        }
        Compression::Zstd => zstd::bulk::decompress(data, uncompressed_len)?,
    };
    if out.len() != uncompressed_len {
        return Err(ReError::ProtocolError(format!(
            "compressed frame length mismatch {} != {}",
            out.len(),
            uncompressed_len
        )));
    }
    Ok(out)
}

pub enum ChannelStream {
    Tcp(TcpStream),
    Unix(UnixStream),
    Tls(Box<native_tls::TlsStream<TcpStream>>),
    Closed,
}

impl ChannelStream {
    pub fn shutdown(&mut self) -> io::Result<()> {
        match self {
            ChannelStream::Tcp(stream) => stream.shutdown(Shutdown::Both),
            ChannelStream::Unix(stream) => stream.shutdown(Shutdown::Both),
            ChannelStream::Tls(stream) => stream.shutdown(),
            ChannelStream::Closed => Ok(()),
        }
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            ChannelStream::Tcp(stream) => stream.set_read_timeout(timeout),
            ChannelStream::Unix(stream) => stream.set_read_timeout(timeout),
            ChannelStream::Tls(stream) => stream.get_ref().set_read_timeout(timeout),
            ChannelStream::Closed => Ok(()),
        }
    }

    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            ChannelStream::Tcp(stream) => stream.set_write_timeout(timeout),
            ChannelStream::Unix(stream) => stream.set_write_timeout(timeout),
            ChannelStream::Tls(stream) => stream.get_ref().set_write_timeout(timeout),
            ChannelStream::Closed => Ok(()),
        }
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "connection is closed")
}

impl Write for ChannelStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ChannelStream::Tcp(stream) => stream.write(buf),
            ChannelStream::Unix(stream) => stream.write(buf),
            ChannelStream::Tls(stream) => stream.write(buf),
            ChannelStream::Closed => Err(closed_error()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ChannelStream::Tcp(stream) => stream.flush(),
            ChannelStream::Unix(stream) => stream.flush(),
            ChannelStream::Tls(stream) => stream.flush(),
            ChannelStream::Closed => Err(closed_error()),
        }
    }
}

impl Read for ChannelStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ChannelStream::Tcp(stream) => stream.read(buf),
            ChannelStream::Unix(stream) => stream.read(buf),
            ChannelStream::Tls(stream) => stream.read(buf),
            ChannelStream::Closed => Err(closed_error()),
        }
    }
}

impl fmt::Debug for ChannelStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ChannelStream::Tcp(ref s) => write!(f, "Tcp stream {:?}", s),
            ChannelStream::Unix(ref s) => write!(f, "Unix stream {:?}", s),
            ChannelStream::Tls(ref s) => write!(f, "Tls stream {:?}", s),
            ChannelStream::Closed => write!(f, "Closed stream"),
        }
    }
}
