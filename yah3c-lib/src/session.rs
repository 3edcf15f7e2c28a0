//! Authentication session and its state machine.
//!
//! ```text
//! Idle -> Started -> AwaitingRequest -> Responding{Identity,Vendor,Challenge} -> AwaitingRequest
//!                                     \-> Success | Failure | LoggedOff
//! ```
//!
//! The loop is single-threaded and blocking: receive one frame, handle it
//! completely, receive again. The only suspension point is
//! [`Transport::receive`], which is also where cancellation is observed.

use crate::auth::Credentials;
use crate::error::H3cError;
use crate::message::{Packet, Request, decode_login_message};
use crate::packet::{EapType, EthernetHeader, MacAddr, encode_eap_response, encode_logoff, encode_start, strip_ethernet};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use strum_macros::Display;
use tracing::{debug, error, info, warn};

/// Link-layer collaborator. Frames include the 14-byte Ethernet header.
pub trait Transport {
    fn send(&mut self, frame: &[u8]) -> Result<(), H3cError>;

    /// Blocks until a PAE frame arrives. `Ok(None)` means the poll interval
    /// elapsed (or a signal interrupted the wait) without one.
    fn receive(&mut self) -> Result<Option<Bytes>, H3cError>;
}

/// Process-level side effects run once authentication succeeds.
pub trait Lifecycle {
    /// Runs `command interface`. Failures are the implementation's to report.
    fn run_dhcp_client(&mut self, command: &str, interface: &str);

    fn daemonize(&mut self) -> Result<(), H3cError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AuthState {
    Idle,
    Started,
    AwaitingRequest,
    RespondingIdentity,
    RespondingVendor,
    RespondingChallenge,
    Success,
    Failure,
    LoggedOff,
}

/// Mutable per-session flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Set once an EAPOL-Logoff has been sent; tells a logoff
    /// acknowledgment apart from a rejected authentication.
    pub has_sent_logoff: bool,
}

/// What to do after EAP Success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub interface: String,
    pub dhcp_command: Option<String>,
    pub daemon: bool,
}

/// Shared cancellation flag, raised from a signal handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns whether cancellation was requested and clears the request.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    /// The underlying flag, for `signal_hook::flag::register`.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}

pub struct Session<T: Transport, L: Lifecycle> {
    transport: T,
    lifecycle: L,
    credentials: Credentials,
    options: SessionOptions,
    header: EthernetHeader,
    state: AuthState,
    flags: SessionState,
    online: bool,
}

impl<T: Transport, L: Lifecycle> Session<T, L> {
    /// `local_addr` is the hardware address of the bound interface.
    pub fn new(
        transport: T,
        lifecycle: L,
        credentials: Credentials,
        local_addr: MacAddr,
        options: SessionOptions,
    ) -> Self {
        Self {
            transport,
            lifecycle,
            credentials,
            options,
            header: EthernetHeader::new(local_addr),
            state: AuthState::Idle,
            flags: SessionState::default(),
            online: false,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn has_sent_logoff(&self) -> bool {
        self.flags.has_sent_logoff
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn lifecycle(&self) -> &L {
        &self.lifecycle
    }

    /// Runs until the authenticator sends EAP Failure or the user gives up.
    ///
    /// The first cancellation sends Logoff and keeps listening for the
    /// Failure that acknowledges it (returned as
    /// `ProtocolFailure { after_logoff: true }`). A second cancellation
    /// returns `Ok(())` without waiting.
    pub fn run(&mut self, cancel: &CancelToken) -> Result<(), H3cError> {
        self.start()?;
        loop {
            if cancel.take() {
                if self.flags.has_sent_logoff {
                    warn!("Interrupted again, leaving without logoff acknowledgment");
                    return Ok(());
                }
                info!("Interrupted by user");
                self.logoff()?;
            }

            let Some(frame) = self.transport.receive()? else {
                continue;
            };
            self.handle_frame(frame)?;
        }
    }

    pub fn start(&mut self) -> Result<(), H3cError> {
        let frame = encode_start(&self.header);
        self.send(&frame)?;
        info!("Sending EAPOL start");
        self.state = AuthState::Started;
        Ok(())
    }

    pub fn logoff(&mut self) -> Result<(), H3cError> {
        let frame = encode_logoff(&self.header);
        self.send(&frame)?;
        self.flags.has_sent_logoff = true;
        self.state = AuthState::LoggedOff;
        info!("Sending EAPOL logoff");
        Ok(())
    }

    /// Handles one received link-layer frame.
    ///
    /// EAP Failure ends the session with `ProtocolFailure`; decode errors are
    /// fatal as well. Unknown codes and request types are logged and ignored.
    pub fn handle_frame(&mut self, frame: Bytes) -> Result<(), H3cError> {
        debug!(bytes = hex::encode(&frame), "Frame in");
        let (_, eapol) = strip_ethernet(&frame)?;
        let eapol = frame.slice_ref(eapol);

        match Packet::try_from(eapol)? {
            Packet::Request { id, request } => self.respond(id, request)?,
            Packet::Success { .. } => self.on_success()?,
            Packet::Failure { .. } => {
                self.state = AuthState::Failure;
                let after_logoff = self.flags.has_sent_logoff;
                if after_logoff {
                    info!("Logoff Successfully!");
                } else {
                    error!("Got EAP Failure");
                }
                return Err(H3cError::ProtocolFailure { after_logoff });
            }
            Packet::Response { id } => warn!(id, "Got Unknown EAP Response"),
            Packet::LoginMessage(msg) => match decode_login_message(&msg) {
                Some(text) => info!("Message from server: {}", text),
                None => info!(bytes = hex::encode(&msg), "Undecodable message from server"),
            },
            Packet::UnknownCode { code, id } => warn!(id, "Got unknown EAP code ({})", code),
            Packet::UnknownEapol(kind) => warn!("Got unknown EAPOL type {}", kind),
        }
        Ok(())
    }

    fn respond(&mut self, id: u8, request: Request) -> Result<(), H3cError> {
        if self.flags.has_sent_logoff {
            debug!(id, "Ignoring request after logoff");
            return Ok(());
        }

        let (state, eap_type, payload) = match request {
            Request::Identity => {
                info!(id, "Got EAP Request for identity");
                (
                    AuthState::RespondingIdentity,
                    EapType::Identity,
                    self.credentials.identity_response(),
                )
            }
            Request::H3c => {
                info!(id, "Got EAP Request for Allocation");
                (AuthState::RespondingVendor, EapType::H3c, self.credentials.h3c_response())
            }
            Request::Md5Challenge(challenge) => {
                info!(id, "Got EAP Request for MD5-Challenge");
                (
                    AuthState::RespondingChallenge,
                    EapType::Md5Challenge,
                    self.credentials.md5_response(id, &challenge)?,
                )
            }
            Request::Unknown(req_type) => {
                warn!(id, "Got unknown Request type ({})", req_type);
                return Ok(());
            }
        };

        self.state = state;
        let frame = encode_eap_response(&self.header, id, eap_type, &payload)?;
        self.send(&frame)?;
        match eap_type {
            EapType::Identity => info!(
                "Sending EAP response with identity = [{}]",
                self.credentials.display_username()
            ),
            _ => info!("Sending EAP response with password"),
        }
        self.state = AuthState::AwaitingRequest;
        Ok(())
    }

    fn on_success(&mut self) -> Result<(), H3cError> {
        if self.flags.has_sent_logoff {
            info!("Ignoring EAP Success after logoff");
            return Ok(());
        }
        info!("Got EAP Success");
        self.state = AuthState::Success;
        if self.online {
            return Ok(());
        }
        self.online = true;

        if let Some(command) = &self.options.dhcp_command {
            info!("Obtaining IP Address:");
            self.lifecycle.run_dhcp_client(command, &self.options.interface);
        }
        if self.options.daemon {
            self.lifecycle.daemonize()?;
        }
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), H3cError> {
        debug!(bytes = hex::encode(frame), "Frame out");
        self.transport.send(frame)
    }
}
