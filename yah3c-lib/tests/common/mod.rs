//! Common test utilities and shared imports

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use hex;
#[allow(unused_imports)]
pub use yah3c_lib::auth::{ChallengeMode, Credentials};
#[allow(unused_imports)]
pub use yah3c_lib::constants::*;
#[allow(unused_imports)]
pub use yah3c_lib::error::H3cError;
#[allow(unused_imports)]
pub use yah3c_lib::message::{Packet, Request, decode_login_message};
#[allow(unused_imports)]
pub use yah3c_lib::packet::{EapCode, EapType, EapolType, EthernetHeader, MacAddr};
#[allow(unused_imports)]
pub use yah3c_lib::session::{AuthState, CancelToken, Lifecycle, Session, SessionOptions, Transport};

use std::collections::VecDeque;
use std::io;
use tracing_subscriber::EnvFilter;

/// Routes library logs through the test harness; `RUST_LOG` selects the level.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[allow(dead_code)]
pub const LOCAL_MAC: MacAddr = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);

#[allow(dead_code)]
pub const AUTHENTICATOR_MAC: MacAddr = MacAddr([0x00, 0x0f, 0xe2, 0x12, 0x34, 0x56]);

/// Sixteen known challenge bytes: 0x10..=0x1f
#[allow(dead_code)]
pub const CHALLENGE: [u8; 16] = [
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d, 0x1e, 0x1f,
];

/// Decode hex string to bytes for testing
#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Bytes {
    Bytes::from(hex::decode(hex_data).expect("Failed to decode hex"))
}

/// Wraps an EAPOL-relative body in an Ethernet header from the authenticator.
#[allow(dead_code)]
pub fn inbound_frame(eapol: &[u8]) -> Bytes {
    let mut frame = Vec::with_capacity(ETHERNET_HEADER_SIZE + eapol.len());
    frame.extend_from_slice(&LOCAL_MAC.0);
    frame.extend_from_slice(&AUTHENTICATOR_MAC.0);
    frame.extend_from_slice(&ETHERTYPE_PAE.to_be_bytes());
    frame.extend_from_slice(eapol);
    Bytes::from(frame)
}

/// EAP packet with `code`/`id` and optional type + data, inside EAPOL.
#[allow(dead_code)]
pub fn eap_body(code: u8, id: u8, typed: Option<(u8, &[u8])>) -> Vec<u8> {
    let eap_len = match typed {
        Some((_, data)) => 5 + data.len(),
        None => 4,
    };
    let mut body = vec![EAPOL_VERSION, 0x00];
    body.extend_from_slice(&(eap_len as u16).to_be_bytes());
    body.push(code);
    body.push(id);
    body.extend_from_slice(&(eap_len as u16).to_be_bytes());
    if let Some((req_type, data)) = typed {
        body.push(req_type);
        body.extend_from_slice(data);
    }
    body
}

#[allow(dead_code)]
pub fn request_frame(id: u8, req_type: u8, data: &[u8]) -> Bytes {
    inbound_frame(&eap_body(0x01, id, Some((req_type, data))))
}

#[allow(dead_code)]
pub fn md5_request_frame(id: u8, challenge: &[u8]) -> Bytes {
    let mut data = vec![challenge.len() as u8];
    data.extend_from_slice(challenge);
    request_frame(id, 0x04, &data)
}

#[allow(dead_code)]
pub fn success_frame(id: u8) -> Bytes {
    inbound_frame(&eap_body(0x03, id, None))
}

#[allow(dead_code)]
pub fn failure_frame(id: u8) -> Bytes {
    inbound_frame(&eap_body(0x04, id, None))
}

/// One step of a scripted receive sequence.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Step {
    Frame(Bytes),
    /// Raise the cancel token and report an empty poll
    Interrupt,
}

/// In-memory transport: replays a script and records every sent frame.
/// Running out of script is reported as a transport error.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    pub script: VecDeque<Step>,
    pub sent: Vec<Bytes>,
    pub cancel: CancelToken,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new(script: Vec<Step>, cancel: CancelToken) -> Self {
        Self {
            script: script.into(),
            sent: Vec::new(),
            cancel,
        }
    }

    /// Sent frames with the Ethernet header removed.
    pub fn sent_bodies(&self) -> Vec<Bytes> {
        self.sent.iter().map(|f| f.slice(ETHERNET_HEADER_SIZE..)).collect()
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, frame: &[u8]) -> Result<(), H3cError> {
        self.sent.push(Bytes::copy_from_slice(frame));
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<Bytes>, H3cError> {
        match self.script.pop_front() {
            Some(Step::Frame(frame)) => Ok(Some(frame)),
            Some(Step::Interrupt) => {
                self.cancel.cancel();
                Ok(None)
            }
            None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted").into()),
        }
    }
}

/// Records which hooks ran, in order.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct RecordingLifecycle {
    pub calls: Vec<String>,
}

impl Lifecycle for RecordingLifecycle {
    fn run_dhcp_client(&mut self, command: &str, interface: &str) {
        self.calls.push(format!("dhcp {} {}", command, interface));
    }

    fn daemonize(&mut self) -> Result<(), H3cError> {
        self.calls.push("daemonize".to_string());
        Ok(())
    }
}

#[allow(dead_code)]
pub fn credentials(username: &str, password: &str, mode: ChallengeMode) -> Credentials {
    Credentials::new(username, password, mode).expect("Failed to build credentials")
}

#[allow(dead_code)]
pub fn session(
    credentials: Credentials,
    options: SessionOptions,
    script: Vec<Step>,
    cancel: &CancelToken,
) -> Session<ScriptedTransport, RecordingLifecycle> {
    Session::new(
        ScriptedTransport::new(script, cancel.clone()),
        RecordingLifecycle::default(),
        credentials,
        LOCAL_MAC,
        options,
    )
}
