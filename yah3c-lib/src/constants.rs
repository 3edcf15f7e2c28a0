// Protocol constants for 802.1X / H3C

/// PAE group address, destination of every outbound frame
pub const PAE_GROUP_ADDR: [u8; 6] = [0x01, 0x80, 0xC2, 0x00, 0x00, 0x03];

/// Ethertype of EAPOL frames
pub const ETHERTYPE_PAE: u16 = 0x888E;

/// EAPOL protocol version sent in outbound frames (802.1X-2001)
pub const EAPOL_VERSION: u8 = 1;

/// Size of the Ethernet header (dst + src + ethertype)
pub const ETHERNET_HEADER_SIZE: usize = 14;

/// Size of the EAPOL header (version + type + body length)
pub const EAPOL_HEADER_SIZE: usize = 4;

/// Size of the EAP header (code + identifier + length)
pub const EAP_HEADER_SIZE: usize = 4;

/// EAP header plus the type byte of a Request/Response
pub const EAP_TYPED_HEADER_SIZE: usize = EAP_HEADER_SIZE + 1;

/// Block size of the MD5-Challenge response and of the encoded password
pub const MD5_BLOCK_SIZE: usize = 16;

/// Receive buffer size handed to the link layer
pub const RECV_BUFFER_SIZE: usize = 1600;

/// Client version/signature blob the H3C authenticator expects in front of
/// the identity. Opaque; never recomputed.
pub const VERSION_TOKEN: &[u8] = b"\x06\x07PmJeSU5UNyV8Tk42cwZ7LLjgIxI=\x20\x20";

/// EAP code of the vendor login message frame
pub const LOGIN_MESSAGE_CODE: u8 = 10;

/// EAP identifier of the vendor login message frame
pub const LOGIN_MESSAGE_ID: u8 = 5;

/// EAPOL-relative offset of the login message text
pub const LOGIN_MESSAGE_OFFSET: usize = 12;

/// Longest accepted username; keeps every response inside one frame
pub const MAX_USERNAME_LEN: usize = 1024;
