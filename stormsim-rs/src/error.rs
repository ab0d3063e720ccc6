use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by the appliance client.
///
/// A vanished run-status resource during polling is deliberately NOT an
/// error; it is a terminal poll signal (see [`crate::RunOutcome::Unknown`]).
#[derive(Debug, Error)]
pub enum Error {
    /// Session handshake or credential login failed. Aborts startup.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The client speaks an older API revision than the server.
    #[error("client version {client} is older than server version {server}")]
    Version { client: String, server: String },

    /// 400 from the appliance, with the server-provided diagnostic body.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Any non-2xx, non-400 status.
    #[error("request failed: status {status}, {body}")]
    Transport { status: u16, body: String },

    /// Network-level failure before a status code was available.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local file access during import/export.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered, but not in the shape this call site expects.
    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),

    /// A search by name came back empty.
    #[error("not found: {0}")]
    NotFound(String),
}
