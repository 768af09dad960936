//! Per-connection service loop
//!
//! Each accepted connection is bound to exactly one transaction. The loop
//! reads framed requests, dispatches PUT/GET against the store, and ends
//! on COMMIT, on an aborted status (the reply goes out first), or on any
//! protocol fault, in which case a still-pending transaction is aborted
//! before the connection closes.

use std::net::TcpStream;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use versant_concurrency::{Transaction, TransactionManager, TxnStatus};
use versant_core::{Blob, Error, Key, Result};
use versant_storage::Store;

use crate::protocol::{recv_packet, send_packet, Packet, PacketType, ReplyStatus};
use crate::registry::ClientRegistry;

/// Serve one client connection to completion.
///
/// Registers with `registry`, creates the connection's transaction, runs
/// the request loop, then unregisters. The socket closes on drop.
pub fn serve_client(
    mut stream: TcpStream,
    manager: &TransactionManager,
    store: &Store,
    registry: &ClientRegistry,
) {
    let conn = match registry.register(&stream) {
        Ok(conn) => conn,
        Err(err) => {
            warn!(%err, "failed to register client");
            return;
        }
    };
    debug!(conn, "starting client service");

    let txn = manager.create();
    match run_session(&mut stream, &txn, store) {
        Ok(()) => {}
        Err(err) if err.is_disconnect() => debug!(conn, "client disconnected"),
        Err(err) => warn!(conn, %err, "client session failed"),
    }

    // Whatever ended the loop, a pending transaction must not outlive its
    // client.
    if txn.status() == TxnStatus::Pending {
        txn.abort();
    }

    debug!(conn, "ending client service");
    registry.unregister(conn);
}

fn run_session(stream: &mut TcpStream, txn: &Arc<Transaction>, store: &Store) -> Result<()> {
    loop {
        let (packet, _) = recv_packet(stream)?;
        match packet.kind {
            PacketType::Put => {
                let key = expect_carrier(stream, PacketType::Key)?;
                let value = expect_carrier(stream, PacketType::Value)?;
                debug!(txn = txn.id(), key_len = key.len(), value_len = value.len(), "PUT");

                let status = store.put(txn, Key::from_bytes(key), Blob::new(value));
                trace!(contents = ?store, "store after put");
                send_packet(stream, Packet::reply(reply_for(status)), None)?;
                if status.is_aborted() {
                    return Ok(());
                }
            }
            PacketType::Get => {
                let key = expect_carrier(stream, PacketType::Key)?;
                debug!(txn = txn.id(), key_len = key.len(), "GET");

                let (value, status) = store.get(txn, Key::from_bytes(key));
                trace!(contents = ?store, "store after get");
                send_packet(stream, Packet::reply(reply_for(status)), None)?;
                if status.is_aborted() {
                    return Ok(());
                }

                match value {
                    Some(blob) => {
                        let header = Packet::data(Some(blob.len() as u32));
                        send_packet(stream, header, Some(blob.as_bytes()))?;
                    }
                    None => send_packet(stream, Packet::data(None), None)?,
                }
            }
            PacketType::Commit => {
                debug!(txn = txn.id(), "COMMIT");
                let status = txn.commit();
                let reply = if status.is_committed() {
                    ReplyStatus::Committed
                } else {
                    ReplyStatus::Aborted
                };
                send_packet(stream, Packet::reply(reply), None)?;
                return Ok(());
            }
            other => {
                return Err(Error::protocol(format!(
                    "unexpected {other:?} packet in request position"
                )));
            }
        }
    }
}

/// Receive a payload-carrier packet of the expected kind and return its
/// bytes (empty when the header announced size zero).
fn expect_carrier(stream: &mut TcpStream, expected: PacketType) -> Result<Vec<u8>> {
    let (packet, payload) = recv_packet(stream)?;
    if packet.kind != expected {
        return Err(Error::protocol(format!(
            "expected {expected:?} packet, got {:?}",
            packet.kind
        )));
    }
    Ok(payload.unwrap_or_default())
}

fn reply_for(status: TxnStatus) -> ReplyStatus {
    if status.is_aborted() {
        ReplyStatus::Aborted
    } else {
        ReplyStatus::Ok
    }
}
