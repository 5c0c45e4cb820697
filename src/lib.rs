#![doc(html_root_url = "https://docs.rs/unoffimap/0.1.0")]

/*!
# Unoffimap

Client-side state and backend calls for the Unoffimap place-sharing map.

## Usage

Add `unoffimap` to your dependencies in your project's `Cargo.toml`:

```toml
[dependencies]
tokio = { version = "1", features = ["macros", "rt-multi-thread"] }
unoffimap = "0.1.0"
```

## Overview

Here is a basic example that prints the places registered around Seoul Station:

```rust,no_run
use unoffimap::{Client, Config, LatLng, MemorySession};

# #[tokio::main]
# async fn main() {
let config = Config::from_env();
let client = Client::new(&config, MemorySession::new());

let pois = client.load_location(LatLng::new(37.5547, 126.9707)).await.unwrap();
for poi in pois {
    println!("{} {:?}", poi.place_title, poi.tags);
}
# }
```

The map view itself is driven through [`MapView`], which is generic over the
host's map widget ([`MapWidget`]) and clustering layer ([`ClusterLayer`]).
*/

#[cfg(feature = "hyper")]
extern crate hyper_pkg;

#[macro_use]
mod util;

pub mod cluster;
pub mod config;
pub mod error;
pub mod filter;
pub mod form;
pub mod geo;
pub mod geocode;
pub mod geolocation;
#[cfg(feature = "hyper")]
pub mod hyper;
pub mod marker;
pub mod poi;
pub mod popup;
pub mod search;
pub mod session;
pub mod sync;
pub mod types;
pub mod view;

mod api;
mod service;
mod token;

pub use crate::api::{Comment, PlaceDetail};
pub use crate::cluster::GridClusterer;
pub use crate::config::{Config, StalePolicy};
pub use crate::error::Error;
pub use crate::filter::TagQuery;
pub use crate::geo::LatLng;
pub use crate::marker::{ClusterLayer, MapWidget};
pub use crate::poi::{Poi, PoiKey};
pub use crate::service::HttpService;
pub use crate::session::{MemorySession, SessionProvider, TokenStore};
pub use crate::token::Token;
pub use crate::view::MapView;

use http::uri::PathAndQuery;

use crate::types::Uri;

/// A handle on the backend API.
///
/// `S` is the HTTP client used to send requests and `P` supplies the bearer
/// token for the endpoints that need one.
///
/// ## Example
///
/// ```rust,no_run
/// use unoffimap::{Client, Config, TokenStore};
///
/// # #[tokio::main]
/// # async fn main() {
/// let config = Config::from_env();
/// let store = TokenStore::new(config.get_token_path().clone());
/// let client = Client::new(&config, store);
///
/// let token = client.login("alice", "hunter2").await.unwrap();
/// client.session().save(&token).unwrap();
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Client<S, P = MemorySession> {
    service: S,
    api_base: Uri,
    session: P,
}

#[cfg(feature = "hyper")]
impl<P: SessionProvider> Client<crate::hyper::HttpClient, P> {
    /// Creates a client backed by `hyper` over HTTPS.
    ///
    /// # Panics
    ///
    /// This will panic if the underlying HTTPS connector failed to initialize.
    pub fn new(config: &Config, session: P) -> Self {
        Client::with_service(crate::hyper::http_client(), config, session)
    }
}

impl<S, P: SessionProvider> Client<S, P> {
    /// Same as `new` except that it uses `service` to make HTTP requests.
    pub fn with_service(service: S, config: &Config, session: P) -> Self {
        Client {
            service,
            api_base: config.get_api_base().clone(),
            session,
        }
    }

    pub fn session(&self) -> &P {
        &self.session
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn api_base(&self) -> &Uri {
        &self.api_base
    }

    /// Resolves `path_and_query` (which must start with `/`) against the API base.
    pub(crate) fn endpoint(&self, path_and_query: &str) -> Result<Uri, http::Error> {
        let base = self
            .api_base
            .path_and_query()
            .map(PathAndQuery::path)
            .unwrap_or("")
            .trim_end_matches('/');
        let mut parts = self.api_base.clone().into_parts();
        parts.path_and_query = Some(format!("{}{}", base, path_and_query).parse()?);
        Ok(Uri::from_parts(parts)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_base_path() {
        let mut config = Config::default();
        config.api_base(Uri::from_static("http://localhost:8080/api/"));
        let client = Client::with_service((), &config, MemorySession::new());

        let uri = client.endpoint("/load_location?lat=1&lng=2").unwrap();
        assert_eq!(uri.to_string(), "http://localhost:8080/api/load_location?lat=1&lng=2");

        let client = Client::with_service((), &Config::default(), MemorySession::new());
        let uri = client.endpoint("/bookmarks/3").unwrap();
        assert_eq!(uri.to_string(), "https://api.unoffimap.site/bookmarks/3");
    }
}
