//! # EAPOL / EAP frame codec
//!
//! Three nested layers make up every frame exchanged with the authenticator:
//!
//! ```text
//! +-------------------+-------------------+----------------+
//! | Ethernet (14 B)   | EAPOL (4 B)       | EAP (4 B + ..) |
//! | dst | src | type  | ver | type | len  | code | id | len | [type | data]
//! +-------------------+-------------------+----------------+
//! ```
//!
//! All multi-byte fields are big-endian. Decoders take the buffer that
//! follows the Ethernet header ("EAPOL-relative") and never read past it:
//! a buffer shorter than a fixed header is `MalformedFrame`, a declared
//! length running past the buffer is `TruncatedPacket`.

use crate::constants::*;
use crate::error::H3cError;
use bytes::{BufMut, Bytes, BytesMut};
use num_enum::{FromPrimitive, IntoPrimitive};
use std::fmt;
use strum_macros::Display;
use zerocopy::byteorder::big_endian::U16;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Hardware address of a link-layer endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MacAddr(pub [u8; 6]);

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive, Display)]
#[repr(u8)]
pub enum EapolType {
    EapPacket = 0,
    Start = 1,
    Logoff = 2,
    Key = 3,

    #[num_enum(catch_all)]
    Unknown(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive, Display)]
#[repr(u8)]
pub enum EapCode {
    Request = 1,
    Response = 2,
    Success = 3,
    Failure = 4,

    #[num_enum(catch_all)]
    Unknown(u8),
}

/// Request/Response type byte. `H3c` is the vendor plaintext password type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive, Display)]
#[repr(u8)]
pub enum EapType {
    Identity = 0x01,
    #[strum(to_string = "MD5-Challenge")]
    Md5Challenge = 0x04,
    #[strum(to_string = "H3C")]
    H3c = 0x07,

    #[num_enum(catch_all)]
    Unknown(u8),
}

/// Link-layer prefix of every outbound frame. Built once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct EthernetHeader {
    pub destination: [u8; 6],
    pub source: [u8; 6],
    pub ethertype: U16,
}

impl EthernetHeader {
    /// Header addressed to the PAE group from `source`.
    pub fn new(source: MacAddr) -> Self {
        Self {
            destination: PAE_GROUP_ADDR,
            source: source.0,
            ethertype: U16::new(ETHERTYPE_PAE),
        }
    }

    pub fn source(&self) -> MacAddr {
        MacAddr(self.source)
    }

    pub fn ethertype(&self) -> u16 {
        self.ethertype.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct EapolHeader {
    pub version: u8,
    pub packet_type: u8,
    pub length: U16,
}

impl EapolHeader {
    pub fn new(packet_type: EapolType, length: u16) -> Self {
        Self {
            version: EAPOL_VERSION,
            packet_type: packet_type.into(),
            length: U16::new(length),
        }
    }

    pub fn kind(&self) -> EapolType {
        EapolType::from_primitive(self.packet_type)
    }

    pub fn length(&self) -> u16 {
        self.length.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct EapHeader {
    pub code: u8,
    pub identifier: u8,
    pub length: U16,
}

impl EapHeader {
    pub fn new(code: EapCode, identifier: u8, length: u16) -> Self {
        Self {
            code: code.into(),
            identifier,
            length: U16::new(length),
        }
    }

    pub fn code(&self) -> EapCode {
        EapCode::from_primitive(self.code)
    }

    pub fn length(&self) -> u16 {
        self.length.get()
    }
}

fn encode_eapol_only(header: &EthernetHeader, kind: EapolType) -> Bytes {
    let mut frame = BytesMut::with_capacity(ETHERNET_HEADER_SIZE + EAPOL_HEADER_SIZE);
    frame.put_slice(header.as_bytes());
    frame.put_slice(EapolHeader::new(kind, 0).as_bytes());
    frame.freeze()
}

/// `header ++ EAPOL{Start, length 0}`
pub fn encode_start(header: &EthernetHeader) -> Bytes {
    encode_eapol_only(header, EapolType::Start)
}

/// `header ++ EAPOL{Logoff, length 0}`
pub fn encode_logoff(header: &EthernetHeader) -> Bytes {
    encode_eapol_only(header, EapolType::Logoff)
}

/// Builds a full EAP Response frame. Both length fields cover the EAP
/// header, the type byte and `payload`.
pub fn encode_eap_response(
    header: &EthernetHeader,
    id: u8,
    eap_type: EapType,
    payload: &[u8],
) -> Result<Bytes, H3cError> {
    let eap_len = u16::try_from(EAP_TYPED_HEADER_SIZE + payload.len())
        .map_err(|_| H3cError::PayloadTooLarge(payload.len()))?;
    let mut frame = BytesMut::with_capacity(ETHERNET_HEADER_SIZE + EAPOL_HEADER_SIZE + eap_len as usize);
    frame.put_slice(header.as_bytes());
    frame.put_slice(EapolHeader::new(EapolType::EapPacket, eap_len).as_bytes());
    frame.put_slice(EapHeader::new(EapCode::Response, id, eap_len).as_bytes());
    frame.put_u8(eap_type.into());
    frame.put_slice(payload);
    Ok(frame.freeze())
}

/// Splits a received link-layer frame into its Ethernet header and the
/// EAPOL-relative remainder.
pub fn strip_ethernet(frame: &[u8]) -> Result<(EthernetHeader, &[u8]), H3cError> {
    EthernetHeader::read_from_prefix(frame).map_err(|_| H3cError::malformed(ETHERNET_HEADER_SIZE, frame.len()))
}

pub fn decode_eapol(buf: &[u8]) -> Result<EapolHeader, H3cError> {
    EapolHeader::read_from_prefix(buf)
        .map(|(header, _)| header)
        .map_err(|_| H3cError::malformed(EAPOL_HEADER_SIZE, buf.len()))
}

/// Reads the EAP header that follows the EAPOL header.
pub fn decode_eap_header(buf: &[u8]) -> Result<EapHeader, H3cError> {
    let body = buf.get(EAPOL_HEADER_SIZE..).unwrap_or_default();
    EapHeader::read_from_prefix(body)
        .map(|(header, _)| header)
        .map_err(|_| H3cError::malformed(EAPOL_HEADER_SIZE + EAP_HEADER_SIZE, buf.len()))
}

/// Returns the request type and the `length - 5` bytes of type-data.
///
/// Only meaningful when the EAP code is Request.
pub fn decode_request(buf: &[u8]) -> Result<(EapType, &[u8]), H3cError> {
    let header = decode_eap_header(buf)?;
    let eap_len = header.length() as usize;
    if eap_len < EAP_TYPED_HEADER_SIZE {
        return Err(H3cError::malformed(EAP_TYPED_HEADER_SIZE, eap_len));
    }
    let end = EAPOL_HEADER_SIZE + eap_len;
    if end > buf.len() {
        return Err(H3cError::truncated(end, buf.len()));
    }
    let type_offset = EAPOL_HEADER_SIZE + EAP_HEADER_SIZE;
    let req_type = EapType::from_primitive(buf[type_offset]);
    Ok((req_type, &buf[type_offset + 1..end]))
}
