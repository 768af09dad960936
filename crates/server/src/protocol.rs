//! Wire framing
//!
//! Every message is a fixed-size header, optionally followed by a payload
//! of `size` bytes. Multi-byte integers travel in network byte order.
//!
//! ```text
//! Header Layout (16 bytes):
//! ┌──────────┬──────────┬──────────┬──────────┬───────────────────┐
//! │ type (1) │ status(1)│ null (1) │ pad (1)  │ size (4)          │
//! ├──────────┴──────────┴──────────┴──────────┼───────────────────┤
//! │ timestamp_sec (4)                         │ timestamp_nsec (4)│
//! └───────────────────────────────────────────┴───────────────────┘
//! ```
//!
//! The timestamps are stamped at send time from a process-start monotonic
//! clock. `null = 1` marks a payload that represents "no value", which is
//! distinct from a present, zero-length payload.

use std::io::{Cursor, Read, Write};
use std::time::Instant;

use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};
use once_cell::sync::Lazy;
use tracing::trace;
use versant_core::{Error, Result};

/// Header length on the wire.
pub const HEADER_LEN: usize = 16;

/// Largest payload accepted from a peer. Anything bigger is treated as a
/// malformed frame rather than an allocation request.
pub const MAX_PAYLOAD: u32 = 1 << 20;

static PROCESS_START: Lazy<Instant> = Lazy::new(Instant::now);

/// Packet type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// Placeholder; never sent.
    Nothing = 0,
    /// Request: look up a key.
    Get = 1,
    /// Request: map a key to a value.
    Put = 2,
    /// Key payload carrier (follows `Get` or `Put`).
    Key = 3,
    /// Value payload carrier (follows `Put`).
    Value = 4,
    /// Server reply header.
    Reply = 5,
    /// Value payload carrier in a `Get` reply.
    Data = 6,
    /// Request: resolve the transaction.
    Commit = 7,
}

impl TryFrom<u8> for PacketType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(PacketType::Nothing),
            1 => Ok(PacketType::Get),
            2 => Ok(PacketType::Put),
            3 => Ok(PacketType::Key),
            4 => Ok(PacketType::Value),
            5 => Ok(PacketType::Reply),
            6 => Ok(PacketType::Data),
            7 => Ok(PacketType::Commit),
            other => Err(Error::UnknownPacketType(other)),
        }
    }
}

/// Status byte carried by `Reply` packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyStatus {
    /// Operation succeeded, transaction still pending.
    Ok = 0,
    /// Transaction committed.
    Committed = 1,
    /// Transaction aborted.
    Aborted = 2,
}

impl TryFrom<u8> for ReplyStatus {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(ReplyStatus::Ok),
            1 => Ok(ReplyStatus::Committed),
            2 => Ok(ReplyStatus::Aborted),
            other => Err(Error::protocol(format!("unknown reply status {other}"))),
        }
    }
}

/// One decoded packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    /// Packet type.
    pub kind: PacketType,
    /// Reply status code; zero on requests.
    pub status: u8,
    /// Whether the payload represents a null value.
    pub null: bool,
    /// Payload byte length.
    pub size: u32,
    /// Monotonic seconds at send.
    pub timestamp_sec: u32,
    /// Monotonic nanoseconds at send.
    pub timestamp_nsec: u32,
}

impl Packet {
    /// A bare request or carrier header with no payload.
    pub fn request(kind: PacketType) -> Self {
        Packet {
            kind,
            status: 0,
            null: false,
            size: 0,
            timestamp_sec: 0,
            timestamp_nsec: 0,
        }
    }

    /// A payload carrier header (`Key` or `Value`) announcing `size` bytes.
    pub fn carrier(kind: PacketType, size: u32) -> Self {
        Packet {
            size,
            ..Packet::request(kind)
        }
    }

    /// A reply header.
    pub fn reply(status: ReplyStatus) -> Self {
        Packet {
            status: status as u8,
            ..Packet::request(PacketType::Reply)
        }
    }

    /// A data header for a `Get` reply; `None` marks a null value.
    pub fn data(size: Option<u32>) -> Self {
        Packet {
            null: size.is_none(),
            size: size.unwrap_or(0),
            ..Packet::request(PacketType::Data)
        }
    }
}

/// Write a packet header (stamped with the current monotonic time) and its
/// payload, if any.
///
/// The payload length must match `packet.size`; that is the caller's
/// contract, asserted in debug builds.
pub fn send_packet(writer: &mut impl Write, packet: Packet, payload: Option<&[u8]>) -> Result<()> {
    debug_assert_eq!(
        packet.size as usize,
        payload.map_or(0, <[u8]>::len),
        "header size must match payload length"
    );

    let elapsed = PROCESS_START.elapsed();
    let mut header = [0u8; HEADER_LEN];
    {
        let mut cursor = Cursor::new(&mut header[..]);
        cursor.write_u8(packet.kind as u8)?;
        cursor.write_u8(packet.status)?;
        cursor.write_u8(u8::from(packet.null))?;
        cursor.write_u8(0)?;
        cursor.write_u32::<NetworkEndian>(packet.size)?;
        cursor.write_u32::<NetworkEndian>(elapsed.as_secs() as u32)?;
        cursor.write_u32::<NetworkEndian>(elapsed.subsec_nanos())?;
    }

    writer.write_all(&header)?;
    if let Some(payload) = payload {
        if !payload.is_empty() {
            writer.write_all(payload)?;
        }
    }
    writer.flush()?;

    trace!(kind = ?packet.kind, size = packet.size, "send packet");
    Ok(())
}

/// Read one packet header and its payload, if any.
///
/// A peer that closes the stream cleanly at a packet boundary yields
/// [`Error::Disconnected`]; a close mid-header or mid-payload is a
/// protocol error.
pub fn recv_packet(reader: &mut impl Read) -> Result<(Packet, Option<Vec<u8>>)> {
    let header = read_header(reader)?;
    let mut cursor = Cursor::new(&header[..]);

    let kind = PacketType::try_from(cursor.read_u8()?)?;
    let status = cursor.read_u8()?;
    let null = cursor.read_u8()? != 0;
    let _pad = cursor.read_u8()?;
    let size = cursor.read_u32::<NetworkEndian>()?;
    let timestamp_sec = cursor.read_u32::<NetworkEndian>()?;
    let timestamp_nsec = cursor.read_u32::<NetworkEndian>()?;

    if size > MAX_PAYLOAD {
        return Err(Error::PayloadTooLarge {
            size,
            limit: MAX_PAYLOAD,
        });
    }

    let payload = if size > 0 {
        let mut buf = vec![0u8; size as usize];
        reader
            .read_exact(&mut buf)
            .map_err(|_| Error::protocol("stream closed mid-payload"))?;
        Some(buf)
    } else {
        None
    };

    let packet = Packet {
        kind,
        status,
        null,
        size,
        timestamp_sec,
        timestamp_nsec,
    };
    trace!(kind = ?packet.kind, size = packet.size, "recv packet");
    Ok((packet, payload))
}

fn read_header(reader: &mut impl Read) -> Result<[u8; HEADER_LEN]> {
    let mut buf = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return if filled == 0 {
                    Err(Error::Disconnected)
                } else {
                    Err(Error::protocol("stream closed mid-header"))
                };
            }
            Ok(n) => filled += n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(buf)
}
