// src/client.rs
//! The `roc` route client: resolve destinations through the mapper, then
//! visit each control in turn and collect its info line.

use std::io;
use std::net::Ipv4Addr;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::codec::{has_forbidden_chars, parse_port, read_frame, Frame, MAX_LINE};
use crate::error::ClientError;

/// Info lines gathered along a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightLog {
    /// One info line per control that answered, in route order.
    pub entries: Vec<String>,
    /// At least one destination could not be reached or answered badly.
    pub failed: bool,
}

async fn connect(port: u16) -> io::Result<TcpStream> {
    TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await
}

/// Turn every destination into a port, asking the mapper for the ones that
/// are not already a valid port number.
///
/// The mapper is dialed once up front, even if every destination is
/// numeric, and the same connection serves every lookup. Ids the mapper
/// would silently drop (empty, holding `:`/`\r`/`\n`, or too long for one
/// line) are reported as unknown without asking.
pub async fn resolve_destinations(
    mapper_port: u16,
    destinations: &[String],
) -> Result<Vec<u16>, ClientError> {
    let stream = connect(mapper_port)
        .await
        .map_err(|source| ClientError::MapperUnreachable {
            port: mapper_port,
            source,
        })?;
    let mut mapper = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut ports = Vec::with_capacity(destinations.len());

    for dest in destinations {
        if let Some(port) = parse_port(dest) {
            ports.push(port);
            continue;
        }

        let no_entry = || ClientError::NoMapEntry { id: dest.clone() };
        if dest.is_empty() || has_forbidden_chars(dest) || dest.len() + 1 > MAX_LINE {
            debug!(destination = %dest, "not a lookup id");
            return Err(no_entry());
        }
        mapper
            .get_mut()
            .write_all(format!("?{dest}\n").as_bytes())
            .await
            .map_err(|_| no_entry())?;
        let reply = match read_frame(&mut mapper, &mut buf).await {
            Ok(Some(Frame::Line(line))) if !line.contains(':') => line,
            _ => return Err(no_entry()),
        };
        if reply == ";" {
            return Err(no_entry());
        }
        let port = parse_port(&reply).ok_or_else(no_entry)?;
        debug!(destination = %dest, port, "resolved");
        ports.push(port);
    }
    Ok(ports)
}

/// Resolve without a mapper: every destination must already be a port.
pub fn numeric_destinations(destinations: &[String]) -> Option<Vec<u16>> {
    destinations.iter().map(|d| parse_port(d)).collect()
}

/// Visit each port in order: send `plane_id`, keep the one-line answer.
pub async fn collect_log(plane_id: &str, ports: &[u16]) -> FlightLog {
    let mut log = FlightLog::default();
    for &port in ports {
        match visit(plane_id, port).await {
            Ok(Some(info)) => log.entries.push(info),
            Ok(None) => {
                warn!(port, "destination sent no valid info line");
                log.failed = true;
            }
            Err(e) => {
                warn!(port, error = %e, "destination unreachable");
                log.failed = true;
            }
        }
    }
    log
}

async fn visit(plane_id: &str, port: u16) -> io::Result<Option<String>> {
    let mut stream = BufReader::new(connect(port).await?);
    stream
        .get_mut()
        .write_all(format!("{plane_id}\n").as_bytes())
        .await?;
    let mut buf = Vec::new();
    Ok(match read_frame(&mut stream, &mut buf).await? {
        Some(Frame::Line(line)) if !line.contains(':') => Some(line),
        _ => None,
    })
}
