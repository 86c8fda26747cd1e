use std::error::Error as StdError;

use reqwest::blocking::Client;
use thiserror::Error;

pub const USER_AGENT: &str = concat!("cmsv-client/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVerification {
    Enabled,
    Disabled,
}

/// How much the peer certificate was trusted for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustLevel {
    Verified,
    /// Obtained after certificate verification was switched off.
    Downgraded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<T> {
    pub value: T,
    pub trust: TrustLevel,
}

impl<T> Fetched<T> {
    pub fn map<U>(self, op: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched {
            value: op(self.value),
            trust: self.trust,
        }
    }

    pub fn is_downgraded(&self) -> bool {
        self.trust == TrustLevel::Downgraded
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error("certificate verification failed: {0}")]
    CertificateTrust(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("server responded with HTTP status {0}")]
    Status(u16),
}

impl TransportError {
    pub fn is_certificate_trust(&self) -> bool {
        matches!(self, Self::CertificateTrust(_))
    }
}

pub trait HttpFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str, tls: TlsVerification) -> Result<Vec<u8>, TransportError>;
}

/// GET with one insecure retry, and only after a certificate-trust failure.
#[derive(Debug, Clone)]
pub struct FallbackTransport<F> {
    fetcher: F,
}

impl<F> FallbackTransport<F>
where
    F: HttpFetcher,
{
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn get(&self, url: &str) -> Result<Fetched<Vec<u8>>, TransportError> {
        match self.fetcher.fetch(url, TlsVerification::Enabled) {
            Ok(body) => Ok(Fetched {
                value: body,
                trust: TrustLevel::Verified,
            }),
            Err(error) if error.is_certificate_trust() => {
                tracing::warn!(
                    error = %error,
                    "certificate verification failed, retrying once without verification"
                );
                let body = self.fetcher.fetch(url, TlsVerification::Disabled)?;
                tracing::warn!("response accepted from a server with an untrusted certificate");
                Ok(Fetched {
                    value: body,
                    trust: TrustLevel::Downgraded,
                })
            }
            Err(error) => Err(error),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    verified: Client,
    insecure: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self {
            verified: build_client(TlsVerification::Enabled)?,
            insecure: build_client(TlsVerification::Disabled)?,
        })
    }
}

fn build_client(tls: TlsVerification) -> Result<Client, TransportError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .danger_accept_invalid_certs(tls == TlsVerification::Disabled)
        .build()
        .map_err(|error| TransportError::Client(error.to_string()))
}

impl HttpFetcher for ReqwestFetcher {
    fn fetch(&self, url: &str, tls: TlsVerification) -> Result<Vec<u8>, TransportError> {
        let client = match tls {
            TlsVerification::Enabled => &self.verified,
            TlsVerification::Disabled => &self.insecure,
        };

        let response = client.get(url).send().map_err(classify_request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        response
            .bytes()
            .map(|body| body.to_vec())
            .map_err(classify_request_error)
    }
}

/// The request URL carries credentials and the session token, so it is
/// stripped before the message is built. Only the source chain is checked
/// for certificate markers.
fn classify_request_error(error: reqwest::Error) -> TransportError {
    let error = error.without_url();
    let message = error_chain_message(&error);
    if error.source().is_some_and(is_certificate_error) {
        TransportError::CertificateTrust(message)
    } else {
        TransportError::Request(message)
    }
}

fn error_chain_message(error: &(dyn StdError + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

const CERTIFICATE_MARKERS: &[&str] = &[
    "invalid peer certificate",
    "unknownissuer",
    "unknown issuer",
    "certificate signed by unknown authority",
    "self-signed certificate",
    "self signed certificate",
    "certificate verify failed",
    "x509",
];

/// Walks the source chain looking for a certificate-trust failure.
pub fn is_certificate_error(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(inner) = current {
        let text = inner.to_string().to_ascii_lowercase();
        if CERTIFICATE_MARKERS.iter().any(|marker| text.contains(marker)) {
            return true;
        }
        current = inner.source();
    }
    false
}
