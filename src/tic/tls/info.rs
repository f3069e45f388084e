//! Negotiated TLS session details
//!
//! Populated once the `starttls` handshake completes, for callers that want
//! to report or assert on what was negotiated.

use openssl::nid::Nid;
use openssl::ssl::SslRef;
use openssl::x509::X509NameRef;

/// TLS details available after handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsInfo {
    /// Negotiated TLS version (e.g., "TLSv1.3")
    pub version: String,

    /// Negotiated cipher suite
    pub cipher: String,

    /// SNI servername sent by the client
    pub servername: Option<String>,

    /// Common Name of the peer certificate
    pub peer_subject: Option<String>,
}

impl TlsInfo {
    /// Collect details from an established SSL connection
    pub fn from_ssl(ssl: &SslRef) -> Self {
        TlsInfo {
            version: ssl.version_str().to_string(),
            cipher: ssl
                .current_cipher()
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| "<undef>".to_string()),
            servername: ssl
                .servername(openssl::ssl::NameType::HOST_NAME)
                .map(|s| s.to_string()),
            peer_subject: ssl
                .peer_certificate()
                .and_then(|cert| common_name(cert.subject_name())),
        }
    }
}

fn common_name(name: &X509NameRef) -> Option<String> {
    name.entries_by_nid(Nid::COMMONNAME)
        .next()
        .and_then(|entry| std::str::from_utf8(entry.data().as_slice()).ok())
        .map(str::to_string)
}
