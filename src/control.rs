// src/control.rs
//! A control: logs visiting aircraft and answers with its info line.

use parking_lot::Mutex;
use std::net::Ipv4Addr;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::codec::{has_forbidden_chars, LogRequest, LogResponse};
use crate::error::ServerError;
use crate::handler::{Reply, Role};
use crate::registry::{Registry, Visit};

/// Log role.
///
/// Any line other than `log` is an aircraft id: it is logged and answered
/// with the info line. `log` returns every visit in id order followed by
/// `.`, then the connection is closed.
#[derive(Debug, Clone)]
pub struct Control {
    info: String,
}

impl Control {
    pub fn new(info: impl Into<String>) -> Self {
        Self { info: info.into() }
    }
}

impl Role for Control {
    type Entry = Visit;

    fn name(&self) -> &'static str {
        "control"
    }

    fn dispatch(&self, line: &str, registry: &Mutex<Registry<Visit>>) -> Reply {
        match LogRequest::parse(line) {
            None => {
                debug!(line, "ignoring malformed visit");
                Reply::Silent
            }
            Some(LogRequest::Visit(visit)) => {
                debug!(aircraft = %visit.aircraft, "visit");
                registry.lock().insert_ordered(visit);
                Reply::Send(LogResponse::Info(&self.info).encode())
            }
            Some(LogRequest::Log) => {
                let visits = registry.lock().snapshot_all();
                Reply::Close(LogResponse::Listing(visits).encode())
            }
        }
    }
}

/// Startup identity of a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlIdentity {
    pub id: String,
    pub info: String,
}

impl ControlIdentity {
    /// `None` if either field contains `\n`, `\r` or `:`.
    pub fn new(id: impl Into<String>, info: impl Into<String>) -> Option<Self> {
        let (id, info) = (id.into(), info.into());
        if has_forbidden_chars(&id) || has_forbidden_chars(&info) {
            return None;
        }
        Some(Self { id, info })
    }
}

/// Register this control with a mapper: one `!ID:PORT` line, no reply
/// expected.
pub async fn report_to_mapper(
    mapper_port: u16,
    id: &str,
    control_port: u16,
) -> Result<(), ServerError> {
    let mut stream = TcpStream::connect((Ipv4Addr::LOCALHOST, mapper_port))
        .await
        .map_err(|source| ServerError::MapperUnreachable {
            port: mapper_port,
            source,
        })?;
    stream
        .write_all(format!("!{id}:{control_port}\n").as_bytes())
        .await?;
    stream.shutdown().await?;
    info!(mapper_port, id, control_port, "reported to mapper");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_is_logged_and_answered() {
        let reg = Registry::<Visit>::shared();
        let control = Control::new("Brisbane tower");
        assert_eq!(
            control.dispatch("QF1", &reg),
            Reply::Send(bytes::Bytes::from_static(b"Brisbane tower\n"))
        );
        assert_eq!(reg.lock().snapshot_all(), vec![Visit::new("QF1")]);
    }

    #[test]
    fn empty_log_is_single_dot() {
        let reg = Registry::<Visit>::shared();
        assert_eq!(
            Control::new("x").dispatch("log", &reg),
            Reply::Close(bytes::Bytes::from_static(b".\n"))
        );
    }

    #[test]
    fn log_lists_visits_sorted_with_duplicates() {
        let reg = Registry::<Visit>::shared();
        let control = Control::new("x");
        for id in ["CD456", "AB123", "CD456"] {
            control.dispatch(id, &reg);
        }
        assert_eq!(
            control.dispatch("log", &reg),
            Reply::Close(bytes::Bytes::from_static(b"AB123\nCD456\nCD456\n.\n"))
        );
    }

    #[test]
    fn colon_lines_are_ignored() {
        let reg = Registry::<Visit>::shared();
        assert_eq!(Control::new("x").dispatch("QF:1", &reg), Reply::Silent);
        assert!(reg.lock().is_empty());
    }

    #[test]
    fn identity_rejects_protocol_characters() {
        assert!(ControlIdentity::new("BNE", "Brisbane").is_some());
        assert!(ControlIdentity::new("B:NE", "Brisbane").is_none());
        assert!(ControlIdentity::new("BNE", "Bris\nbane").is_none());
        assert!(ControlIdentity::new("BNE", "Bris\rbane").is_none());
    }
}
