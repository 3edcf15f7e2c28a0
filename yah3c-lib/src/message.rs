use crate::constants::*;
use crate::error::H3cError;
use crate::packet::{EapCode, EapType, EapolType, decode_eap_header, decode_eapol, decode_request};
use bytes::Bytes;
use encoding_rs::GBK;

/// What the authenticator asked for in an EAP Request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Identity,
    /// Vendor plaintext password request
    H3c,
    /// MD5-Challenge with the challenge value (value-size prefix removed)
    Md5Challenge(Bytes),
    Unknown(u8),
}

/// An inbound frame, classified by EAPOL type and EAP code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Request { id: u8, request: Request },
    Response { id: u8 },
    Success { id: u8 },
    Failure { id: u8 },
    /// Vendor quirk: code 10 with identifier 5 carries a text message from
    /// the access-control server. No reply is expected.
    LoginMessage(Bytes),
    UnknownCode { code: u8, id: u8 },
    /// EAPOL frame that does not carry an EAP packet
    UnknownEapol(EapolType),
}

impl TryFrom<Bytes> for Packet {
    type Error = H3cError;

    /// Parses an EAPOL-relative buffer (Ethernet header already stripped).
    fn try_from(buf: Bytes) -> Result<Self, Self::Error> {
        let eapol = decode_eapol(&buf)?;
        if eapol.kind() != EapolType::EapPacket {
            return Ok(Packet::UnknownEapol(eapol.kind()));
        }

        let eap = decode_eap_header(&buf)?;
        let id = eap.identifier;
        let packet = match eap.code() {
            EapCode::Request => Packet::Request {
                id,
                request: parse_request(&buf)?,
            },
            EapCode::Response => Packet::Response { id },
            EapCode::Success => Packet::Success { id },
            EapCode::Failure => Packet::Failure { id },
            EapCode::Unknown(LOGIN_MESSAGE_CODE) if id == LOGIN_MESSAGE_ID => {
                let start = LOGIN_MESSAGE_OFFSET.min(buf.len());
                Packet::LoginMessage(buf.slice(start..))
            }
            EapCode::Unknown(code) => Packet::UnknownCode { code, id },
        };
        Ok(packet)
    }
}

fn parse_request(buf: &Bytes) -> Result<Request, H3cError> {
    let (req_type, data) = decode_request(buf)?;
    let request = match req_type {
        EapType::Identity => Request::Identity,
        EapType::H3c => Request::H3c,
        EapType::Md5Challenge => {
            // type-data is value-size (1 byte) followed by the value
            let (&size, rest) = data.split_first().ok_or(H3cError::truncated(1, 0))?;
            let size = size as usize;
            if size > rest.len() {
                return Err(H3cError::truncated(size, rest.len()));
            }
            Request::Md5Challenge(Bytes::copy_from_slice(&rest[..size]))
        }
        EapType::Unknown(t) => Request::Unknown(t),
    };
    Ok(request)
}

/// Server login text is GBK and NUL padded. `None` if it does not decode.
pub fn decode_login_message(msg: &[u8]) -> Option<String> {
    let end = msg.iter().rposition(|&b| b != 0).map_or(0, |last| last + 1);
    let (text, had_errors) = GBK.decode_without_bom_handling(&msg[..end]);
    (!had_errors).then(|| text.into_owned())
}
