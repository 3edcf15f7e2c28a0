//! Credential responder
//!
//! Builds the type-data of the three EAP Responses this client answers:
//!
//! - **Identity**: `VERSION_TOKEN ++ username`
//! - **H3C vendor type**: `len(password) ++ password ++ username`. The
//!   password travels in clear text. This is how the vendor protocol works
//!   and hashing it would break interoperability.
//! - **MD5-Challenge**: `0x10 ++ digest ++ username`, where the digest is
//!   either `MD5(id ++ password ++ challenge)` ([`ChallengeMode::Hashed`]) or
//!   the password XORed with the first 16 challenge bytes
//!   ([`ChallengeMode::Xor`], legacy deployments). The mode is configured,
//!   never detected.
//!
//! Text is encoded one byte per character (ISO-8859-1), and the password is
//! cut to its first 16 bytes. Longer passwords are truncated, not rejected.

use crate::constants::{MAX_USERNAME_LEN, MD5_BLOCK_SIZE, VERSION_TOKEN};
use crate::error::H3cError;
use bytes::{BufMut, Bytes, BytesMut};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum_macros::Display;

/// Selects the MD5-Challenge response algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeMode {
    #[default]
    #[serde(alias = "md5")]
    #[strum(to_string = "hashed")]
    Hashed,
    #[strum(to_string = "xor")]
    Xor,
}

impl FromStr for ChallengeMode {
    type Err = H3cError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hashed" | "md5" => Ok(ChallengeMode::Hashed),
            "xor" => Ok(ChallengeMode::Xor),
            other => Err(H3cError::Config(format!(
                "unknown challenge mode '{}', expected 'hashed' or 'xor'",
                other
            ))),
        }
    }
}

/// Username, password and challenge mode, already in wire encoding.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: Vec<u8>,
    password: Vec<u8>,
    mode: ChallengeMode,
}

impl Credentials {
    /// Encodes `username` and `password` as single-byte text.
    ///
    /// Fails for characters above U+00FF or an oversized username.
    pub fn new(username: &str, password: &str, mode: ChallengeMode) -> Result<Self, H3cError> {
        let username = encode_latin1(username, "username")?;
        let password = encode_latin1(password, "password")?;
        Self::from_bytes(username, &password, mode)
    }

    /// Takes already-encoded bytes. The password is truncated to 16 bytes.
    pub fn from_bytes(username: impl Into<Vec<u8>>, password: &[u8], mode: ChallengeMode) -> Result<Self, H3cError> {
        let username = username.into();
        if username.len() > MAX_USERNAME_LEN {
            return Err(H3cError::InvalidCredentials(format!(
                "username is {} bytes, at most {} allowed",
                username.len(),
                MAX_USERNAME_LEN
            )));
        }
        let password = password[..password.len().min(MD5_BLOCK_SIZE)].to_vec();
        Ok(Self {
            username,
            password,
            mode,
        })
    }

    pub fn username(&self) -> &[u8] {
        &self.username
    }

    /// The password as sent on the wire (at most 16 bytes).
    pub fn password(&self) -> &[u8] {
        &self.password
    }

    pub fn mode(&self) -> ChallengeMode {
        self.mode
    }

    /// Username decoded back to text, for log output.
    pub fn display_username(&self) -> String {
        self.username.iter().map(|&b| b as char).collect()
    }

    pub fn identity_response(&self) -> Bytes {
        let mut payload = BytesMut::with_capacity(VERSION_TOKEN.len() + self.username.len());
        payload.put_slice(VERSION_TOKEN);
        payload.put_slice(&self.username);
        payload.freeze()
    }

    /// Password length byte, the password in plaintext, then the username.
    /// The authenticator expects it unhashed; anyone on the segment can read it.
    pub fn h3c_response(&self) -> Bytes {
        let mut payload = BytesMut::with_capacity(1 + self.password.len() + self.username.len());
        payload.put_u8(self.password.len() as u8);
        payload.put_slice(&self.password);
        payload.put_slice(&self.username);
        payload.freeze()
    }

    /// Answers an MD5-Challenge carrying `challenge`, sent with identifier `id`.
    pub fn md5_response(&self, id: u8, challenge: &[u8]) -> Result<Bytes, H3cError> {
        let digest = match self.mode {
            ChallengeMode::Hashed => hashed_digest(id, &self.password, challenge),
            ChallengeMode::Xor => xor_digest(&self.password, challenge)?,
        };
        let mut payload = BytesMut::with_capacity(1 + MD5_BLOCK_SIZE + self.username.len());
        payload.put_u8(MD5_BLOCK_SIZE as u8);
        payload.put_slice(&digest);
        payload.put_slice(&self.username);
        Ok(payload.freeze())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.display_username())
            .field("password", &"<redacted>")
            .field("mode", &self.mode)
            .finish()
    }
}

/// `MD5(id ++ password ++ challenge)`
pub fn hashed_digest(id: u8, password: &[u8], challenge: &[u8]) -> [u8; MD5_BLOCK_SIZE] {
    let mut hasher = Md5::new();
    hasher.update([id]);
    hasher.update(password);
    hasher.update(challenge);
    let mut digest = [0u8; MD5_BLOCK_SIZE];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Zero-padded password XOR the first 16 challenge bytes.
pub fn xor_digest(password: &[u8], challenge: &[u8]) -> Result<[u8; MD5_BLOCK_SIZE], H3cError> {
    if challenge.len() < MD5_BLOCK_SIZE {
        return Err(H3cError::truncated(MD5_BLOCK_SIZE, challenge.len()));
    }
    let mut digest = [0u8; MD5_BLOCK_SIZE];
    let len = password.len().min(MD5_BLOCK_SIZE);
    digest[..len].copy_from_slice(&password[..len]);
    for (d, c) in digest.iter_mut().zip(challenge) {
        *d ^= c;
    }
    Ok(digest)
}

fn encode_latin1(text: &str, what: &str) -> Result<Vec<u8>, H3cError> {
    text.chars()
        .map(|c| {
            u8::try_from(c).map_err(|_| {
                H3cError::InvalidCredentials(format!("{} contains '{}', which is not a single-byte character", what, c))
            })
        })
        .collect()
}
