//! Reverse geocoding of coordinates into street addresses.

use std::error;
use std::fmt::Display;

use http::uri::PathAndQuery;
use http::Request;
use http_body::Body;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Error;
use crate::geo::LatLng;
use crate::service::{round_trip, HttpService};
use crate::types::Uri;
use crate::util::{null_as_default, Query};

/// Shown in place of an address that could not be resolved.
pub const ADDRESS_NOT_FOUND: &str = "address not found";

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    formatted_address: String,
}

/// Looks up the formatted address of a coordinate.
///
/// Every lookup issues its own request; nothing is cached.
#[derive(Clone, Debug)]
pub struct ReverseGeocoder<S> {
    service: S,
    endpoint: Uri,
    key: Option<String>,
}

#[cfg(feature = "hyper")]
impl ReverseGeocoder<crate::hyper::HttpClient> {
    /// # Panics
    ///
    /// This will panic if the underlying HTTPS connector failed to initialize.
    pub fn new(config: &Config) -> Self {
        ReverseGeocoder::with_service(crate::hyper::http_client(), config)
    }
}

impl<S> ReverseGeocoder<S> {
    pub fn with_service(service: S, config: &Config) -> Self {
        ReverseGeocoder {
            service,
            endpoint: config.get_geocode_endpoint().clone(),
            key: config.get_geocode_key().map(str::to_owned),
        }
    }

    /// The first formatted address for `at`, or `None` when the service knows none.
    pub async fn lookup<B>(&self, at: LatLng) -> Result<Option<String>, Error<S::Error>>
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        B: Default,
    {
        let mut query = vec![("latlng", format!("{},{}", at.lat, at.lng))];
        if let Some(ref key) = self.key {
            query.push(("key", key.clone()));
        }
        let path = self
            .endpoint
            .path_and_query()
            .map(PathAndQuery::path)
            .unwrap_or("/");
        let mut parts = self.endpoint.clone().into_parts();
        let path_and_query = format!("{}?{}", path, Query(&query))
            .parse::<PathAndQuery>()
            .map_err(http::Error::from)?;
        parts.path_and_query = Some(path_and_query);
        let uri = Uri::from_parts(parts).map_err(http::Error::from)?;

        let req = Request::get(uri).body(B::default())?;
        let (parts, body) = round_trip(&self.service, req).await?;
        if !parts.status.is_success() {
            return Err(Error::Http(parts.status));
        }

        let res: GeocodeResponse = serde_json::from_slice(&body)?;
        let address = res.results.into_iter().next().map(|r| r.formatted_address);
        debug!(lat = at.lat, lng = at.lng, found = address.is_some(), "reverse geocoded");
        Ok(address)
    }

    /// Same as `lookup` except that failures and misses give [`ADDRESS_NOT_FOUND`].
    pub async fn address<B>(&self, at: LatLng) -> String
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        S::Error: Display,
        B: Default,
    {
        match self.lookup(at).await {
            Ok(Some(address)) => address,
            Ok(None) => ADDRESS_NOT_FOUND.to_owned(),
            Err(e) => {
                warn!("reverse geocoding failed: {}", e);
                ADDRESS_NOT_FOUND.to_owned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use futures::executor::block_on;
    use http::Response;
    use hyper_pkg::Body as HyperBody;

    use super::*;
    use crate::service::mock;

    fn geocoder(
        status: u16,
        body: &'static str,
    ) -> ReverseGeocoder<
        impl tower_service::Service<
                Request<HyperBody>,
                Response = Response<HyperBody>,
                Error = Infallible,
            > + Clone,
    > {
        let service = mock::service(move |req| {
            assert_eq!(req.uri().path(), "/maps/api/geocode/json");
            assert_eq!(req.uri().query(), Some("latlng=37.5%2C127.03&key=k"));
            mock::respond(status, body)
        });
        let mut config = Config::default();
        config.geocode_key("k".to_owned());
        ReverseGeocoder::with_service(service, &config)
    }

    const AT: LatLng = LatLng::new(37.5, 127.03);

    #[test]
    fn first_result_wins() {
        let g = geocoder(
            200,
            r#"{"results":[{"formatted_address":"Seoul"},{"formatted_address":"Korea"}]}"#,
        );
        assert_eq!(block_on(g.lookup(AT)).unwrap().as_deref(), Some("Seoul"));
        assert_eq!(block_on(g.address(AT)), "Seoul");
    }

    #[test]
    fn placeholder_on_failure() {
        assert_eq!(block_on(geocoder(200, r#"{"results":[]}"#).address(AT)), ADDRESS_NOT_FOUND);
        assert_eq!(block_on(geocoder(200, "{}").address(AT)), ADDRESS_NOT_FOUND);
        assert_eq!(block_on(geocoder(403, "denied").address(AT)), ADDRESS_NOT_FOUND);
        assert_eq!(block_on(geocoder(200, "<html>").address(AT)), ADDRESS_NOT_FOUND);
    }
}
