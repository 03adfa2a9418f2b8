//! Muster wire format — the text payloads exchanged over UDP.
//!
//! One payload per datagram, no length prefix. Every payload starts with
//! a kind tag so a chat body can never be mistaken for a control command:
//!
//!   REGISTER:<name>                          participant -> service
//!   UNREGISTER:<name>                        participant -> service
//!   PEERS:<self_id>[:<id>,<ip>,<port>,<name>]*   service -> participant
//!   CHAT:<sender_id>:<name>:<millis>:<body>  participant -> participant
//!
//! Peer-list entries are colon-separated, entry fields comma-separated,
//! in registry insertion order. An empty registry encodes as
//! `PEERS:<self_id>` with no trailing colon. The chat body is the final
//! field and may contain any text, colons included.
//!
//! Decoding never indexes past bounds: a payload that does not match its
//! shape yields a [`WireError`], not a panic.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use bytes::Bytes;

/// Identifier assigned to a participant by the registry at registration.
/// Stable across refreshes from the same endpoint.
pub type PeerId = u64;

/// Maximum datagram payload in bytes. The transport silently truncates
/// anything larger, so the codec refuses to produce it.
pub const MAX_DATAGRAM: usize = 1024;

/// One entry of a peer-list payload: a registered participant as the
/// service advertises it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEntry {
    pub id: PeerId,
    pub addr: SocketAddr,
    pub name: String,
}

/// A decoded wire payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Register {
        name: String,
    },
    Unregister {
        name: String,
    },
    PeerList {
        /// The id the service assigned to the addressee of this payload.
        self_id: PeerId,
        peers: Vec<PeerEntry>,
    },
    Chat {
        sender_id: PeerId,
        sender: String,
        timestamp_ms: u64,
        body: String,
    },
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors that can arise when interpreting wire payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("payload is not UTF-8 text")]
    NotUtf8,

    #[error("unknown payload kind: {0:?}")]
    UnknownKind(String),

    #[error("{0} payload is missing a required field")]
    MissingField(&'static str),

    #[error("invalid peer id: {0:?}")]
    BadPeerId(String),

    #[error("invalid address: {0:?}")]
    BadAddr(String),

    #[error("non-numeric port: {0:?}")]
    BadPort(String),

    #[error("non-numeric timestamp: {0:?}")]
    BadTimestamp(String),

    #[error("name {0:?} is empty or contains a reserved character")]
    BadName(String),

    #[error("encoded payload is {0} bytes, exceeds maximum {}", MAX_DATAGRAM)]
    PayloadTooLarge(usize),
}

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Names travel inside colon- and comma-delimited payloads, so they may
/// contain neither delimiter.
fn check_name(name: &str) -> Result<(), WireError> {
    if name.is_empty() || name.contains(':') || name.contains(',') {
        return Err(WireError::BadName(name.to_string()));
    }
    Ok(())
}

fn check_len(encoded: String) -> Result<Bytes, WireError> {
    if encoded.len() > MAX_DATAGRAM {
        return Err(WireError::PayloadTooLarge(encoded.len()));
    }
    Ok(Bytes::from(encoded.into_bytes()))
}

/// Encode a registration request.
pub fn encode_register(name: &str) -> Result<Bytes, WireError> {
    check_name(name)?;
    check_len(format!("REGISTER:{name}"))
}

/// Encode an unregistration notice.
pub fn encode_unregister(name: &str) -> Result<Bytes, WireError> {
    check_name(name)?;
    check_len(format!("UNREGISTER:{name}"))
}

/// Encode a peer-list reply for the participant `self_id`.
pub fn encode_peer_list(self_id: PeerId, peers: &[PeerEntry]) -> Result<Bytes, WireError> {
    let mut out = format!("PEERS:{self_id}");
    for peer in peers {
        check_name(&peer.name)?;
        // IPv6 addresses contain the entry separator; the grammar is IPv4-only.
        if !peer.addr.is_ipv4() {
            return Err(WireError::BadAddr(peer.addr.to_string()));
        }
        out.push(':');
        out.push_str(&format!(
            "{},{},{},{}",
            peer.id,
            peer.addr.ip(),
            peer.addr.port(),
            peer.name
        ));
    }
    check_len(out)
}

/// Encode a chat payload from `sender_id`.
pub fn encode_chat(
    sender_id: PeerId,
    sender: &str,
    timestamp_ms: u64,
    body: &str,
) -> Result<Bytes, WireError> {
    check_name(sender)?;
    check_len(format!("CHAT:{sender_id}:{sender}:{timestamp_ms}:{body}"))
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Decode one datagram payload into a [`Frame`].
pub fn decode(payload: &[u8]) -> Result<Frame, WireError> {
    let text = std::str::from_utf8(payload).map_err(|_| WireError::NotUtf8)?;

    let (kind, rest) = match text.split_once(':') {
        Some((kind, rest)) => (kind, rest),
        // A bare tag with no separator is only the shape of a truncated
        // command; report it as the nearest known kind.
        None => {
            return Err(match text {
                "REGISTER" => WireError::MissingField("REGISTER"),
                "UNREGISTER" => WireError::MissingField("UNREGISTER"),
                "PEERS" => WireError::MissingField("PEERS"),
                "CHAT" => WireError::MissingField("CHAT"),
                other => WireError::UnknownKind(truncate_for_error(other)),
            });
        }
    };

    match kind {
        "REGISTER" => {
            check_name(rest)?;
            Ok(Frame::Register {
                name: rest.to_string(),
            })
        }
        "UNREGISTER" => {
            check_name(rest)?;
            Ok(Frame::Unregister {
                name: rest.to_string(),
            })
        }
        "PEERS" => decode_peer_list(rest),
        "CHAT" => decode_chat(rest),
        other => Err(WireError::UnknownKind(truncate_for_error(other))),
    }
}

fn decode_peer_list(rest: &str) -> Result<Frame, WireError> {
    let (self_id, entries) = match rest.split_once(':') {
        Some((id, entries)) => (id, Some(entries)),
        None => (rest, None),
    };
    let self_id = parse_peer_id(self_id)?;

    let mut peers = Vec::new();
    if let Some(entries) = entries {
        for entry in entries.split(':') {
            peers.push(decode_peer_entry(entry)?);
        }
    }

    Ok(Frame::PeerList { self_id, peers })
}

fn decode_peer_entry(entry: &str) -> Result<PeerEntry, WireError> {
    let fields: Vec<&str> = entry.split(',').collect();
    let [id, ip, port, name] = fields.as_slice() else {
        return Err(WireError::MissingField("PEERS entry"));
    };

    let id = parse_peer_id(id)?;
    let ip: Ipv4Addr = ip
        .parse()
        .map_err(|_| WireError::BadAddr(ip.to_string()))?;
    let port: u16 = port
        .parse()
        .map_err(|_| WireError::BadPort(port.to_string()))?;
    check_name(name)?;

    Ok(PeerEntry {
        id,
        addr: SocketAddr::new(IpAddr::V4(ip), port),
        name: name.to_string(),
    })
}

fn decode_chat(rest: &str) -> Result<Frame, WireError> {
    let mut fields = rest.splitn(4, ':');
    let (Some(id), Some(sender), Some(ts), Some(body)) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return Err(WireError::MissingField("CHAT"));
    };

    let sender_id = parse_peer_id(id)?;
    check_name(sender)?;
    let timestamp_ms: u64 = ts
        .parse()
        .map_err(|_| WireError::BadTimestamp(ts.to_string()))?;

    Ok(Frame::Chat {
        sender_id,
        sender: sender.to_string(),
        timestamp_ms,
        body: body.to_string(),
    })
}

fn parse_peer_id(field: &str) -> Result<PeerId, WireError> {
    field
        .parse()
        .map_err(|_| WireError::BadPeerId(field.to_string()))
}

fn truncate_for_error(kind: &str) -> String {
    kind.chars().take(32).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
