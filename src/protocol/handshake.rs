//! Handshake payloads.
//!
//! The Handshake packet exchange carries JSON bodies in both directions. The
//! client announces itself; the server answers with a status code, the heartbeat
//! interval and, optionally, the route dictionary both sides will use for route
//! compression. After a successful response the client sends an empty
//! HandshakeAck packet.
//!
//! ```text
//! client -> server  Handshake     {"sys":{"type":"rust","version":"0.1.0"},"user":{}}
//! server -> client  Handshake     {"code":200,"sys":{"heartbeat":3,"dict":{"user.login":1}}}
//! client -> server  HandshakeAck  (empty)
//! ```
//!
//! Connection state and heartbeat timers belong to the session layer; this
//! module only encodes and decodes the bodies.

use crate::core::packet::{Packet, PacketKind};
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::route::RouteTable;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Handshake accepted
pub const CODE_OK: u16 = 200;
/// Handshake failed
pub const CODE_FAIL: u16 = 500;
/// Client version is too old for the server
pub const CODE_OLD_CLIENT: u16 = 501;

fn handshake_packet<T: Serialize>(body: &T) -> Result<Packet> {
    let payload = serde_json::to_vec(body).map_err(|e| {
        ProtocolError::HandshakeError(format!("{}: {e}", constants::ERR_HANDSHAKE_ENCODE))
    })?;
    Ok(Packet::new(PacketKind::Handshake, payload))
}

fn whole_seconds_ceil(interval: Duration) -> u64 {
    let secs = interval.as_secs();
    if interval.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}

fn parse_handshake<T: for<'de> Deserialize<'de>>(packet: &Packet) -> Result<T> {
    if packet.kind != PacketKind::Handshake {
        return Err(ProtocolError::UnexpectedPacket(packet.kind.as_u8()));
    }
    serde_json::from_slice(&packet.payload).map_err(|e| {
        ProtocolError::HandshakeError(format!("{}: {e}", constants::ERR_HANDSHAKE_DECODE))
    })
}

/// Client identification sent in the request's `sys` object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSys {
    #[serde(rename = "type")]
    pub client_type: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsa: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakeRequest {
    pub sys: ClientSys,
    /// Application data passed through to the server's handshake hook
    #[serde(default)]
    pub user: Value,
}

impl HandshakeRequest {
    pub fn new(client_type: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            sys: ClientSys {
                client_type: client_type.into(),
                version: version.into(),
                rsa: None,
            },
            user: Value::Object(Default::default()),
        }
    }

    #[must_use]
    pub fn with_user(mut self, user: Value) -> Self {
        self.user = user;
        self
    }

    pub fn to_packet(&self) -> Result<Packet> {
        handshake_packet(self)
    }

    pub fn from_packet(packet: &Packet) -> Result<Self> {
        let request: Self = parse_handshake(packet)?;
        debug!(
            client_type = %request.sys.client_type,
            version = %request.sys.version,
            "Handshake request decoded"
        );
        Ok(request)
    }
}

/// Server settings sent in the response's `sys` object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerSys {
    /// Heartbeat interval in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dict: Option<BTreeMap<String, u16>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protos: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakeResponse {
    pub code: u16,
    #[serde(default)]
    pub sys: ServerSys,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

impl HandshakeResponse {
    /// Successful response advertising `heartbeat` and the current contents of `routes`.
    ///
    /// The interval travels in whole seconds. Fractional intervals round up, so
    /// only `Duration::ZERO` advertises heartbeats as disabled.
    pub fn accept(heartbeat: Duration, routes: &RouteTable) -> Self {
        let dict = routes.snapshot();
        Self {
            code: CODE_OK,
            sys: ServerSys {
                heartbeat: Some(whole_seconds_ceil(heartbeat)),
                dict: (!dict.is_empty()).then_some(dict),
                protos: None,
            },
            user: None,
        }
    }

    pub fn reject(code: u16) -> Self {
        Self {
            code,
            sys: ServerSys::default(),
            user: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }

    /// Heartbeat interval, if the server enabled heartbeats.
    pub fn heartbeat(&self) -> Option<Duration> {
        self.sys
            .heartbeat
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn to_packet(&self) -> Result<Packet> {
        handshake_packet(self)
    }

    pub fn from_packet(packet: &Packet) -> Result<Self> {
        let response: Self = parse_handshake(packet)?;
        debug!(code = response.code, "Handshake response decoded");
        Ok(response)
    }

    /// Register the advertised dictionary into `routes`.
    ///
    /// # Errors
    /// `HandshakeError` if the server rejected the handshake.
    pub fn install_dict(&self, routes: &RouteTable) -> Result<usize> {
        if !self.is_ok() {
            warn!(code = self.code, "Refusing dictionary from rejected handshake");
            return Err(ProtocolError::HandshakeError(format!(
                "{} (code {})",
                constants::ERR_HANDSHAKE_REJECTED,
                self.code
            )));
        }
        let Some(dict) = &self.sys.dict else {
            return Ok(0);
        };
        let inserted = routes.register(dict.iter().map(|(route, code)| (route.as_str(), *code)))?;
        info!(advertised = dict.len(), inserted, "Installed route dictionary from handshake");
        Ok(inserted)
    }
}
