// src/codec.rs
//! Line framing and the two text protocols.
//!
//! Every request and reply is one `\n`-terminated line of at most
//! [`MAX_LINE`] content bytes. Lines that break the framing rules are
//! [`Frame::Invalid`]; handlers drop them without replying.

use bytes::{BufMut, Bytes, BytesMut};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::registry::{Airport, Visit};

/// Maximum content bytes in one line, terminator excluded.
pub const MAX_LINE: usize = 79;

/// Longest well-formed frame on the wire: content plus `\n`.
const FRAME_LIMIT: u64 = MAX_LINE as u64 + 1;

/// One line read off a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Well-framed content, terminator stripped.
    Line(String),
    /// Missing terminator, empty, too long, `\r`, or not UTF-8.
    Invalid,
}

/// Classify a raw line as read from the wire (terminator included).
pub fn classify(raw: &[u8]) -> Frame {
    let Some((&b'\n', content)) = raw.split_last() else {
        return Frame::Invalid;
    };
    if content.is_empty() || content.len() > MAX_LINE {
        return Frame::Invalid;
    }
    if content.iter().any(|&b| b == b'\r' || b == b'\n') {
        return Frame::Invalid;
    }
    match std::str::from_utf8(content) {
        Ok(s) => Frame::Line(s.to_owned()),
        Err(_) => Frame::Invalid,
    }
}

/// Read and classify the next line.
///
/// Returns `Ok(None)` once the peer has closed and nothing is pending. A line
/// longer than [`MAX_LINE`] is drained through its terminator and reported
/// as a single [`Frame::Invalid`].
pub async fn read_frame<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<Frame>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let n = (&mut *reader).take(FRAME_LIMIT).read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') && n as u64 == FRAME_LIMIT {
        discard_line(reader, buf).await?;
        return Ok(Some(Frame::Invalid));
    }
    Ok(Some(classify(buf)))
}

async fn discard_line<R>(reader: &mut R, scratch: &mut Vec<u8>) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        scratch.clear();
        let n = (&mut *reader).take(FRAME_LIMIT).read_until(b'\n', scratch).await?;
        if n == 0 || scratch.last() == Some(&b'\n') {
            return Ok(());
        }
    }
}

/// `true` if `s` holds a character no protocol field may carry.
pub fn has_forbidden_chars(s: &str) -> bool {
    s.contains(['\n', '\r', ':'])
}

/// Parse a port: ASCII digits only, value in `1..=65535`.
pub fn parse_port(s: &str) -> Option<u16> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // leading zeros are allowed, so parse wide before range-checking
    let value = s.bytes().try_fold(0u32, |acc, b| {
        let acc = acc * 10 + u32::from(b - b'0');
        (acc <= u32::from(u16::MAX)).then_some(acc)
    })?;
    u16::try_from(value).ok().filter(|&p| p != 0)
}

pub fn is_valid_port(s: &str) -> bool {
    parse_port(s).is_some()
}

/// Requests understood by the mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryRequest {
    /// `?<id>`
    Lookup(String),
    /// `!<id>:<port>`
    Register(Airport),
    /// `@`
    List,
}

impl DirectoryRequest {
    /// Parse a framed line. `None` means the line is ignored.
    pub fn parse(line: &str) -> Option<Self> {
        if line == "@" {
            return Some(Self::List);
        }
        if let Some(id) = line.strip_prefix('?') {
            if id.is_empty() || id.contains(':') {
                return None;
            }
            return Some(Self::Lookup(id.to_owned()));
        }
        let (id, port) = line.strip_prefix('!')?.split_once(':')?;
        if id.is_empty() || !is_valid_port(port) {
            return None;
        }
        Some(Self::Register(Airport::new(id, port)))
    }
}

/// Replies sent by the mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryResponse {
    /// `<port>`
    Port(String),
    /// `;`
    Unknown,
    /// One `<id>:<port>` line per entry, no terminator line.
    Listing(Vec<Airport>),
}

impl DirectoryResponse {
    pub fn encode(&self) -> Bytes {
        let mut dst = BytesMut::new();
        match self {
            Self::Port(port) => put_line(&mut dst, port),
            Self::Unknown => put_line(&mut dst, ";"),
            Self::Listing(airports) => {
                for a in airports {
                    dst.reserve(a.id.len() + a.port.len() + 2);
                    dst.put_slice(a.id.as_bytes());
                    dst.put_u8(b':');
                    put_line(&mut dst, &a.port);
                }
            }
        }
        dst.freeze()
    }
}

/// Requests understood by a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRequest {
    /// Any other line: an aircraft reporting in.
    Visit(Visit),
    /// `log`
    Log,
}

impl LogRequest {
    pub fn parse(line: &str) -> Option<Self> {
        if line.contains(':') {
            return None;
        }
        if line == "log" {
            return Some(Self::Log);
        }
        Some(Self::Visit(Visit::new(line)))
    }
}

/// Replies sent by a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogResponse<'a> {
    /// The control's info line.
    Info(&'a str),
    /// Every visit in order, then a `.` line.
    Listing(Vec<Visit>),
}

impl LogResponse<'_> {
    pub fn encode(&self) -> Bytes {
        let mut dst = BytesMut::new();
        match self {
            Self::Info(info) => put_line(&mut dst, info),
            Self::Listing(visits) => {
                for v in visits {
                    put_line(&mut dst, &v.aircraft);
                }
                put_line(&mut dst, ".");
            }
        }
        dst.freeze()
    }
}

fn put_line(dst: &mut BytesMut, s: &str) {
    dst.reserve(s.len() + 1);
    dst.put_slice(s.as_bytes());
    dst.put_u8(b'\n');
}
