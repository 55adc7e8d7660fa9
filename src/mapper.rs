// src/mapper.rs
//! The mapper: a directory of airport id → control port.

use parking_lot::Mutex;
use tracing::debug;

use crate::codec::{DirectoryRequest, DirectoryResponse};
use crate::handler::{Reply, Role};
use crate::registry::{Airport, Registry};

/// Directory role.
///
/// `?ID` looks up a port (`;` when unknown), `!ID:PORT` registers an airport
/// once and never replies, `@` lists every airport in id order.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mapper;

impl Role for Mapper {
    type Entry = Airport;

    fn name(&self) -> &'static str {
        "mapper"
    }

    fn dispatch(&self, line: &str, registry: &Mutex<Registry<Airport>>) -> Reply {
        let Some(request) = DirectoryRequest::parse(line) else {
            debug!(line, "ignoring unknown directory request");
            return Reply::Silent;
        };

        let response = match request {
            DirectoryRequest::Lookup(id) => {
                let port = registry.lock().get(&id).map(|a| a.port.clone());
                match port {
                    Some(port) => DirectoryResponse::Port(port),
                    None => DirectoryResponse::Unknown,
                }
            }
            DirectoryRequest::Register(airport) => {
                let inserted = registry.lock().insert_if_absent(airport.clone());
                debug!(id = %airport.id, port = %airport.port, inserted, "register");
                return Reply::Silent;
            }
            DirectoryRequest::List => DirectoryResponse::Listing(registry.lock().snapshot_all()),
        };
        Reply::Send(response.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(reply: Reply) -> String {
        match reply {
            Reply::Send(b) => String::from_utf8(b.to_vec()).unwrap(),
            other => panic!("expected Send, got {other:?}"),
        }
    }

    #[test]
    fn register_then_lookup() {
        let reg = Registry::<Airport>::shared();
        assert_eq!(Mapper.dispatch("!BNE:8001", &reg), Reply::Silent);
        assert_eq!(send(Mapper.dispatch("?BNE", &reg)), "8001\n");
        assert_eq!(send(Mapper.dispatch("?XYZ", &reg)), ";\n");
    }

    #[test]
    fn second_registration_is_ignored() {
        let reg = Registry::<Airport>::shared();
        Mapper.dispatch("!BNE:8001", &reg);
        Mapper.dispatch("!BNE:9999", &reg);
        assert_eq!(send(Mapper.dispatch("?BNE", &reg)), "8001\n");
        assert_eq!(send(Mapper.dispatch("@", &reg)), "BNE:8001\n");
    }

    #[test]
    fn malformed_registrations_change_nothing() {
        let reg = Registry::<Airport>::shared();
        for line in ["!onlyid", "!:9999", "!id:abc", "!id:0", "?", "hello"] {
            assert_eq!(Mapper.dispatch(line, &reg), Reply::Silent, "{line}");
        }
        assert!(reg.lock().is_empty());
        assert_eq!(Mapper.dispatch("@", &reg), Reply::Send(bytes::Bytes::new()));
    }

    #[test]
    fn listing_is_sorted() {
        let reg = Registry::<Airport>::shared();
        for line in ["!SYD:3000", "!ADL:1000", "!MEL:2000"] {
            Mapper.dispatch(line, &reg);
        }
        assert_eq!(
            send(Mapper.dispatch("@", &reg)),
            "ADL:1000\nMEL:2000\nSYD:3000\n"
        );
    }
}
