//! AWS Signature Version 4 request signing.
//!
//! PA-API 5.0 authenticates every call with SigV4 over HMAC-SHA256 using the
//! service name `ProductAdvertisingAPI`.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::{Digest, Sha256};

use crate::ports::{RequestSigner, SignableRequest};

type HmacSha256 = Hmac<Sha256>;

/// Signing algorithm identifier.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Service name PA-API requests are scoped to.
pub const PAAPI_SERVICE: &str = "ProductAdvertisingAPI";

/// SigV4 signer holding the access key pair.
#[derive(Debug, Clone)]
pub struct SigV4Signer {
    access_key: String,
    secret_key: Secret<String>,
    region: String,
    service: String,
}

impl SigV4Signer {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: Secret<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key,
            region: region.into(),
            service: service.into(),
        }
    }

    /// Signer scoped to the PA-API service.
    pub fn for_paapi(
        access_key: impl Into<String>,
        secret_key: Secret<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::new(access_key, secret_key, region, PAAPI_SERVICE)
    }

    /// Builds the canonical request and the signed-headers list.
    pub fn canonical_request(request: &SignableRequest<'_>) -> (String, String) {
        let mut headers: Vec<(String, String)> = request
            .headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string()))
            .collect();
        headers.sort();

        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value))
            .collect();
        let signed_headers = headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            request.method,
            request.path,
            "",
            canonical_headers,
            signed_headers,
            hex_sha256(request.body)
        );
        (canonical, signed_headers)
    }

    /// Derives the per-day signing key.
    pub fn signing_key(&self, date: &str) -> Vec<u8> {
        derive_signing_key(self.secret_key.expose_secret(), date, &self.region, &self.service)
    }

    fn credential_scope(&self, date: &str) -> String {
        format!("{}/{}/{}/aws4_request", date, self.region, self.service)
    }

    /// Computes the hex signature for a request.
    pub fn signature(&self, request: &SignableRequest<'_>) -> (String, String) {
        let amz_date = request.timestamp.format("%Y%m%dT%H%M%SZ").to_string();
        let date = request.timestamp.format("%Y%m%d").to_string();

        let (canonical, signed_headers) = Self::canonical_request(request);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            self.credential_scope(&date),
            hex_sha256(canonical.as_bytes())
        );

        let signature = hex::encode(hmac(&self.signing_key(&date), string_to_sign.as_bytes()));
        (signature, signed_headers)
    }
}

impl RequestSigner for SigV4Signer {
    fn sign(&self, request: &SignableRequest<'_>) -> Vec<(String, String)> {
        let date = request.timestamp.format("%Y%m%d").to_string();
        let (signature, signed_headers) = self.signature(request);
        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM,
            self.access_key,
            self.credential_scope(&date),
            signed_headers,
            signature
        );
        vec![("Authorization".to_string(), authorization)]
    }
}

/// `kSigning = HMAC(HMAC(HMAC(HMAC("AWS4" + secret, date), region), service), "aws4_request")`
pub fn derive_signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac(format!("AWS4{}", secret).as_bytes(), date.as_bytes());
    let k_region = hmac(&k_date, region.as_bytes());
    let k_service = hmac(&k_region, service.as_bytes());
    hmac(&k_service, b"aws4_request")
}

fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
