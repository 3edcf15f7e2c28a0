pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod lifecycle;
pub mod message;
pub mod packet;
pub mod session;
pub mod transport;


// Re-export the session types for easy access
pub use auth::{ChallengeMode, Credentials};
pub use error::H3cError;
pub use session::{CancelToken, Session};
