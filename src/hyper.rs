//! Type aliases for use with `hyper` crate's HTTP client.

use hyper_tls::HttpsConnector;

pub type Connector = HttpsConnector<hyper_pkg::client::HttpConnector>;
pub type HttpClient = hyper_pkg::Client<Connector, hyper_pkg::Body>;
pub type Client<P = crate::MemorySession> = crate::Client<HttpClient, P>;
pub type ReverseGeocoder = crate::geocode::ReverseGeocoder<HttpClient>;
pub type Error = crate::Error<hyper_pkg::Error>;

/// Builds an HTTPS `hyper` client.
///
/// # Panics
///
/// This will panic if the underlying HTTPS connector failed to initialize.
pub fn http_client() -> HttpClient {
    let conn = HttpsConnector::new();
    hyper_pkg::Client::builder().build::<_, hyper_pkg::Body>(conn)
}
