//! PA-API 5.0 adapters.
//!
//! - `PaapiClient` - live client over reqwest, SigV4-signed
//! - `SigV4Signer` - AWS Signature Version 4 request signer
//! - `MockProductApi` - scripted client for tests and local runs

mod client;
mod error_map;
mod mock_client;
mod signer;
mod wire;

pub use client::{Operation, PaapiClient, PaapiClientConfig, DEFAULT_BASE_URL, DEFAULT_MARKETPLACE};
pub use error_map::{map_error_code, map_error_response};
pub use mock_client::{MockCall, MockOutcome, MockProductApi};
pub use signer::{derive_signing_key, SigV4Signer, ALGORITHM, PAAPI_SERVICE};
