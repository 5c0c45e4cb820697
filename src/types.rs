//! Common types used across the crate.

pub use http::Method as RequestMethod;
pub use http::StatusCode;
pub use http::Uri;

pub use crate::geo::LatLng;

/// Backend-assigned identifier of a place.
pub type PlaceId = i64;

str_enum! {
    /// Pin style of a marker on the map. `as_ref` gives the pin background colour.
    #[derive(Clone, Copy, Debug, PartialEq, Hash, Eq)]
    pub enum MarkerStyle {
        /// The fixed marker at the device location.
        UserLocation = "#000",
        /// A place matching the active tag query.
        Highlighted = "#FF5733",
        Default = "#1C4966",
    }
}

impl MarkerStyle {
    /// Colour of the glyph inside the pin.
    pub fn glyph_color(&self) -> &'static str {
        "#fff"
    }

    /// Colour of the pin border.
    pub fn border_color(&self) -> &'static str {
        "#fff"
    }
}

impl std::default::Default for MarkerStyle {
    fn default() -> Self {
        MarkerStyle::Default
    }
}

impl std::fmt::Display for MarkerStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(AsRef::<str>::as_ref(self))
    }
}

str_enum! {
    /// What the map view shows in place of the map while it has no center.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum MapStatus {
        Locating = "Locating…",
        Located = "Got the current location",
        Unavailable = "Unable to get the current location",
        Unsupported = "This browser does not offer geolocation",
    }
}

impl std::fmt::Display for MapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(AsRef::<str>::as_ref(self))
    }
}
