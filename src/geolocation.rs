//! Device location providers.

use std::future::Future;

use futures_util::future::{self, Ready};

use crate::error::GeolocationError;
use crate::geo::LatLng;

/// A source of the device's current position.
///
/// The map view asks for the position once per mount (and once per reload).
pub trait Geolocation {
    type Future: Future<Output = Result<LatLng, GeolocationError>>;

    fn current_position(&mut self) -> Self::Future;
}

impl<'a, G: Geolocation + ?Sized> Geolocation for &'a mut G {
    type Future = G::Future;

    fn current_position(&mut self) -> G::Future {
        (**self).current_position()
    }
}

/// A provider that always reports the same outcome.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedPosition(Result<LatLng, GeolocationError>);

impl FixedPosition {
    pub fn new(position: LatLng) -> Self {
        FixedPosition(Ok(position))
    }

    /// A platform without geolocation support.
    pub fn unsupported() -> Self {
        FixedPosition(Err(GeolocationError::Unsupported))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        FixedPosition(Err(GeolocationError::Unavailable(reason.into())))
    }
}

impl Geolocation for FixedPosition {
    type Future = Ready<Result<LatLng, GeolocationError>>;

    fn current_position(&mut self) -> Self::Future {
        future::ready(self.0.clone())
    }
}
