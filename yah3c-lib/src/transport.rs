use crate::constants::{ETHERNET_HEADER_SIZE, ETHERTYPE_PAE, RECV_BUFFER_SIZE};
use crate::error::H3cError;
use crate::packet::{MacAddr, strip_ethernet};
use crate::session::Transport;
use bytes::Bytes;
use pnet::datalink::{self, Channel, Config, DataLinkReceiver, DataLinkSender};
use std::io;
use std::time::Duration;
use tracing::{debug, info};

/// How often a blocked receive wakes up to look at the cancel token.
/// Not a protocol timeout: the session keeps waiting for the peer.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Raw link-layer channel on one network interface.
pub struct RawTransport {
    local_addr: MacAddr,
    tx: Box<dyn DataLinkSender>,
    rx: Box<dyn DataLinkReceiver>,
}

impl RawTransport {
    /// Opens a raw channel on `interface_name` and reads its hardware address.
    pub fn bind(interface_name: &str) -> Result<Self, H3cError> {
        info!("Binding to interface {}...", interface_name);
        let interface = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == interface_name)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("interface {} not found", interface_name),
                )
            })?;

        let pnet::util::MacAddr(a, b, c, d, e, f) = interface.mac.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("interface {} has no hardware address", interface_name),
            )
        })?;
        let local_addr = MacAddr([a, b, c, d, e, f]);

        let config = Config {
            read_buffer_size: RECV_BUFFER_SIZE,
            read_timeout: Some(POLL_INTERVAL),
            promiscuous: false,
            ..Default::default()
        };
        let (tx, rx) = match datalink::channel(&interface, config)? {
            Channel::Ethernet(tx, rx) => (tx, rx),
            _ => return Err(io::Error::other("unsupported datalink channel type").into()),
        };
        info!(%local_addr, "Interface bound");

        Ok(Self {
            local_addr,
            tx,
            rx,
        })
    }

    pub fn local_addr(&self) -> MacAddr {
        self.local_addr
    }
}

impl Transport for RawTransport {
    fn send(&mut self, frame: &[u8]) -> Result<(), H3cError> {
        match self.tx.send_to(frame, None) {
            Some(result) => Ok(result?),
            None => Err(io::Error::other("send buffer exhausted").into()),
        }
    }

    fn receive(&mut self) -> Result<Option<Bytes>, H3cError> {
        let local_addr = self.local_addr;
        match self.rx.next() {
            Ok(frame) if is_inbound_pae(frame, local_addr) => Ok(Some(Bytes::copy_from_slice(frame))),
            Ok(frame) => {
                if frame.len() >= ETHERNET_HEADER_SIZE {
                    debug!(len = frame.len(), "Skipping non-PAE or outgoing frame");
                }
                Ok(None)
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// The raw channel sees every frame on the wire, including our own.
/// Only PAE frames from someone else belong to the session.
pub fn is_inbound_pae(frame: &[u8], local_addr: MacAddr) -> bool {
    match strip_ethernet(frame) {
        Ok((header, _)) => header.ethertype() == ETHERTYPE_PAE && header.source() != local_addr,
        Err(_) => false,
    }
}
