//! Request signer port.
//!
//! Signs an outgoing upstream request. The client builds the canonical
//! pieces; the signer returns the headers to attach.

use chrono::{DateTime, Utc};

/// The parts of an HTTP request that take part in signing.
#[derive(Debug, Clone)]
pub struct SignableRequest<'a> {
    pub method: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    /// Headers to sign, names in any case.
    pub headers: &'a [(String, String)],
    pub body: &'a [u8],
    pub timestamp: DateTime<Utc>,
}

/// Port for per-call request signing.
pub trait RequestSigner: Send + Sync {
    /// Returns headers (name, value) to add to the request.
    fn sign(&self, request: &SignableRequest<'_>) -> Vec<(String, String)>;
}
