//! The info popup of a clicked marker and the place detail page behind it.

use std::error;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use http_body::Body;
use tracing::{error, warn};

use crate::api::PlaceDetail;
use crate::error::{Error, LoginRequired};
use crate::geo::LatLng;
use crate::geocode::ReverseGeocoder;
use crate::poi::Poi;
use crate::service::HttpService;
use crate::session::SessionProvider;
use crate::types::PlaceId;
use crate::Client;

/// Shown when a place has no description.
pub const DEFAULT_DESCRIPTION: &str = "example";
/// Shown when a place has no image.
pub const DEFAULT_IMAGE: &str = "/images.png";

/// Route of the detail page of a place: `/place/{id}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DetailRoute(pub PlaceId);

impl DetailRoute {
    pub fn place_id(&self) -> PlaceId {
        self.0
    }

    /// Parses a `/place/{id}` path.
    pub fn parse(path: &str) -> Option<Self> {
        path.strip_prefix("/place/")?
            .trim_end_matches('/')
            .parse()
            .ok()
            .map(DetailRoute)
    }
}

impl Display for DetailRoute {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "/place/{}", self.0)
    }
}

impl FromStr for DetailRoute {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        DetailRoute::parse(s).ok_or(())
    }
}

/// Inline summary of a place, opened by clicking its marker.
#[derive(Clone, Debug, PartialEq)]
pub struct InfoPopup {
    place_id: PlaceId,
    title: String,
    description: String,
    image_url: String,
    location: LatLng,
    address: Option<String>,
    liked: bool,
    bookmarked: bool,
}

impl InfoPopup {
    /// A popup for `poi` whose address has not been looked up yet.
    pub fn new(poi: &Poi) -> Self {
        InfoPopup {
            place_id: poi.place_id,
            title: poi.title.clone(),
            description: DEFAULT_DESCRIPTION.to_owned(),
            image_url: poi
                .image_url
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE.to_owned()),
            location: poi.location,
            address: None,
            liked: false,
            bookmarked: false,
        }
    }

    /// Opens the popup for `poi` and resolves its address.
    ///
    /// Each call makes a fresh geocoding request.
    pub async fn open<S, B>(poi: &Poi, geocoder: &ReverseGeocoder<S>) -> Self
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        S::Error: Display,
        B: Default,
    {
        let mut popup = InfoPopup::new(poi);
        popup.address = Some(geocoder.address(poi.location).await);
        popup
    }

    pub fn with_description(mut self, description: &str) -> Self {
        if !description.is_empty() {
            self.description = description.to_owned();
        }
        self
    }

    pub fn place_id(&self) -> PlaceId {
        self.place_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn location(&self) -> LatLng {
        self.location
    }

    /// The resolved address, or `None` while the lookup is pending.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn liked(&self) -> bool {
        self.liked
    }

    pub fn bookmarked(&self) -> bool {
        self.bookmarked
    }

    /// Where the "more" action leads.
    pub fn detail_route(&self) -> DetailRoute {
        DetailRoute(self.place_id)
    }

    /// Flips the like marker. Returns the new state.
    pub fn toggle_like<P: SessionProvider>(&mut self, session: &P) -> Result<bool, LoginRequired> {
        if !session.is_logged_in() {
            return Err(LoginRequired::new("like"));
        }
        self.liked = !self.liked;
        Ok(self.liked)
    }

    /// Flips the bookmark marker. Returns the new state.
    pub fn toggle_bookmark<P: SessionProvider>(
        &mut self,
        session: &P,
    ) -> Result<bool, LoginRequired> {
        if !session.is_logged_in() {
            return Err(LoginRequired::new("bookmark"));
        }
        self.bookmarked = !self.bookmarked;
        Ok(self.bookmarked)
    }
}

/// The detail page at `/place/{id}`.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceDetailPage {
    route: DetailRoute,
    loading: bool,
    detail: Option<PlaceDetail>,
    address: Option<String>,
    liked: bool,
    bookmarked: bool,
}

impl PlaceDetailPage {
    pub fn new(route: DetailRoute) -> Self {
        PlaceDetailPage {
            route,
            loading: true,
            detail: None,
            address: None,
            liked: false,
            bookmarked: false,
        }
    }

    pub fn route(&self) -> DetailRoute {
        self.route
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The loaded place, or `None` while loading or after a failed load.
    pub fn detail(&self) -> Option<&PlaceDetail> {
        self.detail.as_ref()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn liked(&self) -> bool {
        self.liked
    }

    pub fn bookmarked(&self) -> bool {
        self.bookmarked
    }

    /// Loads the place and then its address.
    ///
    /// On failure the page ends up not loading and without a place.
    pub async fn load<S, P, G, B>(&mut self, client: &Client<S, P>, geocoder: &ReverseGeocoder<G>)
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        S::Error: Display,
        P: SessionProvider,
        G: HttpService<B> + Clone,
        <G::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        G::Error: Display,
        B: Default,
    {
        self.loading = true;
        match client.place_detail(self.route.place_id()).await {
            Ok(detail) => {
                self.address = Some(geocoder.address(detail.location()).await);
                self.detail = Some(detail);
            }
            Err(e) => {
                error!(place_id = self.route.place_id(), "failed to load place: {}", e);
                self.detail = None;
            }
        }
        self.loading = false;
    }

    /// Flips the like marker. Nothing is sent to the backend.
    pub fn toggle_like<P: SessionProvider>(&mut self, session: &P) -> Result<bool, LoginRequired> {
        if !session.is_logged_in() {
            return Err(LoginRequired::new("like"));
        }
        self.liked = !self.liked;
        Ok(self.liked)
    }

    /// Adds or removes the bookmark on the backend, then flips the local state.
    ///
    /// The state is left alone when the request fails.
    pub async fn toggle_bookmark<S, P, B>(
        &mut self,
        client: &Client<S, P>,
    ) -> Result<bool, Error<<S as HttpService<B>>::Error>>
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        P: SessionProvider,
        B: Default + From<Vec<u8>>,
    {
        let want = !self.bookmarked;
        if let Err(e) = client.set_bookmark(self.route.place_id(), want).await {
            if let Error::Unauthorized = e {
                warn!("log in to bookmark");
            }
            return Err(e);
        }
        self.bookmarked = want;
        Ok(want)
    }
}
