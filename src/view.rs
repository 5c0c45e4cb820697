//! Page state: the map view and the dashboard around it.

use std::error;
use std::fmt::Display;

use http_body::Body;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::GeolocationError;
use crate::filter::{filter, TagQuery};
use crate::geo::LatLng;
use crate::geocode::ReverseGeocoder;
use crate::geolocation::Geolocation;
use crate::marker::{ClusterLayer, MapWidget, MarkerLayer};
use crate::poi::{Poi, PoiKey};
use crate::popup::InfoPopup;
use crate::service::HttpService;
use crate::session::SessionProvider;
use crate::sync::{Outcome, ProximitySync};
use crate::types::MapStatus;
use crate::Client;

/// The map of nearby places.
///
/// Owns the proximity sync and the markers drawn for it. `W` is the host map
/// widget and `C` its clustering layer.
pub struct MapView<W: MapWidget, C> {
    status: MapStatus,
    user_center: Option<LatLng>,
    camera: Option<LatLng>,
    sync: ProximitySync,
    query: TagQuery,
    layer: MarkerLayer<W, C>,
}

impl<W, C> MapView<W, C>
where
    W: MapWidget,
    C: ClusterLayer<W::Marker>,
{
    pub fn new(config: &Config, widget: W, clusterer: C) -> Self {
        MapView {
            status: MapStatus::Locating,
            user_center: None,
            camera: None,
            sync: ProximitySync::new(config),
            query: TagQuery::default(),
            layer: MarkerLayer::new(widget, clusterer),
        }
    }

    pub fn status(&self) -> MapStatus {
        self.status
    }

    /// The device location found on the first successful mount since the view was last unmounted.
    pub fn user_center(&self) -> Option<LatLng> {
        self.user_center
    }

    /// The last reported camera center.
    pub fn camera(&self) -> Option<LatLng> {
        self.camera
    }

    pub fn query(&self) -> &TagQuery {
        &self.query
    }

    /// Every place of the last applied fetch, filtered or not.
    pub fn pois(&self) -> &[Poi] {
        self.sync.pois()
    }

    pub fn poi(&self, key: &PoiKey) -> Option<&Poi> {
        self.sync.pois().iter().find(|poi| &poi.key == key)
    }

    /// The places that pass the current filter, in fetch order.
    pub fn visible_pois(&self) -> Vec<&Poi> {
        filter(self.sync.pois(), &self.query)
    }

    pub fn sync(&self) -> &ProximitySync {
        &self.sync
    }

    pub fn layer(&self) -> &MarkerLayer<W, C> {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut MarkerLayer<W, C> {
        &mut self.layer
    }

    /// Locates the device, centers on it and loads the places around it.
    ///
    /// Without a location the status explains why and nothing is fetched.
    pub async fn mount<G, S, P, B>(&mut self, geolocation: &mut G, client: &Client<S, P>) -> Outcome
    where
        G: Geolocation,
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        S::Error: Display,
        P: SessionProvider,
        B: Default,
    {
        self.sync.resume();
        self.status = MapStatus::Locating;
        let position = match geolocation.current_position().await {
            Ok(position) => position,
            Err(e) => {
                warn!("{}", e);
                self.status = match e {
                    GeolocationError::Unsupported => MapStatus::Unsupported,
                    GeolocationError::Unavailable(_) => MapStatus::Unavailable,
                };
                return Outcome::Skipped;
            }
        };

        self.status = MapStatus::Located;
        if self.user_center.is_none() {
            info!(lat = position.lat, lng = position.lng, "located device");
            self.user_center = Some(position);
            self.layer.set_user_location(position);
        }
        self.camera = Some(position);

        let outcome = self.sync.force_refresh(position, client).await;
        self.render();
        outcome
    }

    /// Locates the device again and refetches regardless of distance,
    /// e.g. after a place was registered.
    pub async fn reload<G, S, P, B>(&mut self, geolocation: &mut G, client: &Client<S, P>) -> Outcome
    where
        G: Geolocation,
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        S::Error: Display,
        P: SessionProvider,
        B: Default,
    {
        self.mount(geolocation, client).await
    }

    /// Handles a camera move, refetching when it went far enough.
    pub async fn camera_changed<S, P, B>(&mut self, center: LatLng, client: &Client<S, P>) -> Outcome
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        S::Error: Display,
        P: SessionProvider,
        B: Default,
    {
        debug!(lat = center.lat, lng = center.lng, "camera changed");
        if center.is_finite() {
            self.camera = Some(center);
        }
        let outcome = self.sync.refresh_if_moved(center, client).await;
        if let Outcome::Applied(_) = outcome {
            self.render();
        }
        outcome
    }

    /// Sets the tag filter and redraws. Returns the number of visible markers.
    pub fn set_filter(&mut self, raw: &str) -> usize {
        self.query = TagQuery::new(raw);
        self.render()
    }

    fn render(&mut self) -> usize {
        self.layer.render(self.sync.pois(), &self.query)
    }

    /// The key of the place a native marker was drawn for.
    pub fn marker_key(&self, marker: &W::Marker) -> Option<&PoiKey>
    where
        W::Marker: PartialEq,
    {
        self.layer.registry().key_of(marker)
    }

    /// Opens the info popup of the place whose marker was clicked.
    ///
    /// Returns `None` when no marker is mounted for `key`, e.g. because the
    /// filter hides it.
    pub async fn marker_clicked<S, B>(
        &self,
        key: &PoiKey,
        geocoder: &ReverseGeocoder<S>,
    ) -> Option<InfoPopup>
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        S::Error: Display,
        B: Default,
    {
        if !self.layer.registry().contains(key) {
            debug!(?key, "click on a marker that is not mounted");
            return None;
        }
        let poi = self.poi(key)?;
        Some(InfoPopup::open(poi, geocoder).await)
    }

    /// Tears the view down: pending fetches are ignored and every marker is removed.
    ///
    /// The view can be mounted again afterwards.
    pub fn unmount(&mut self) {
        self.sync.teardown();
        self.layer.clear();
        self.user_center = None;
        self.camera = None;
        self.status = MapStatus::Locating;
    }
}

/// Something that happened on the dashboard.
#[derive(Clone, Debug, PartialEq)]
pub enum DashboardEvent {
    /// The search box changed.
    SearchInput(String),
    /// Suggestions for the current input arrived.
    SuggestionsLoaded(Vec<String>),
    /// A suggestion was clicked.
    SuggestionPicked(String),
    OpenModal,
    CloseModal,
    /// The registration form was submitted successfully.
    PlaceRegistered,
}

/// State of the dashboard page.
///
/// `reload` counts the requests to reload the map; the map view reloads
/// whenever it changes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardState {
    pub search_input: String,
    pub suggestions: Vec<String>,
    pub modal_open: bool,
    pub reload: u64,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::SearchInput(input) => {
                if input.is_empty() {
                    self.suggestions.clear();
                }
                self.search_input = input;
            }
            DashboardEvent::SuggestionsLoaded(tags) => self.suggestions = tags,
            DashboardEvent::SuggestionPicked(tag) => {
                self.search_input = tag;
                self.suggestions.clear();
                self.reload += 1;
            }
            DashboardEvent::OpenModal => self.modal_open = true,
            DashboardEvent::CloseModal => self.modal_open = false,
            DashboardEvent::PlaceRegistered => {
                self.modal_open = false;
                self.reload += 1;
            }
        }
    }

    /// The map filters on whatever is in the search box.
    pub fn filter(&self) -> TagQuery {
        TagQuery::new(&self.search_input)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use futures::executor::block_on;
    use http::{Request, Response};
    use hyper_pkg::Body as HyperBody;

    use super::*;
    use crate::geolocation::FixedPosition;
    use crate::marker::mock::{FlatLayer, RecordingWidget};
    use crate::service::mock;
    use crate::session::MemorySession;
    use crate::types::MarkerStyle;

    const BODY: &str = r#"{"poi":[
        {"latitude":37.50,"longitude":127.03,"placeTitle":"cafe","placeId":1,"tags":["카페"]},
        {"latitude":37.51,"longitude":127.04,"placeTitle":"sea","placeId":2,"tags":["바다"]},
        {"latitude":37.52,"longitude":127.05,"placeTitle":"both","placeId":3,"tags":["카페","바다"]}
    ]}"#;

    fn client(
        body: &'static str,
    ) -> (
        Arc<AtomicUsize>,
        Client<
            impl tower_service::Service<
                    Request<HyperBody>,
                    Response = Response<HyperBody>,
                    Error = Infallible,
                > + Clone,
        >,
    ) {
        let (calls, service) = mock::counting(body);
        (
            calls,
            Client::with_service(service, &Config::default(), MemorySession::new()),
        )
    }

    fn view() -> MapView<RecordingWidget, FlatLayer> {
        MapView::new(&Config::default(), RecordingWidget::default(), FlatLayer::default())
    }

    const HOME: LatLng = LatLng::new(37.5, 127.03);

    #[test]
    fn mount_loads_and_renders() {
        let (calls, client) = client(BODY);
        let mut map = view();
        assert_eq!(map.status(), MapStatus::Locating);

        let outcome = block_on(map.mount(&mut FixedPosition::new(HOME), &client));
        assert_eq!(outcome, Outcome::Applied(3));
        assert_eq!(map.status(), MapStatus::Located);
        assert_eq!(map.user_center(), Some(HOME));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(map.layer().clusterer().markers.len(), 3);
        // three places and the user marker
        assert_eq!(map.layer().widget().live.len(), 4);
    }

    #[test]
    fn geolocation_failures_set_status() {
        let (calls, client) = client(BODY);

        let mut map = view();
        block_on(map.mount(&mut FixedPosition::unsupported(), &client));
        assert_eq!(map.status(), MapStatus::Unsupported);

        let mut map = view();
        block_on(map.mount(&mut FixedPosition::unavailable("denied"), &client));
        assert_eq!(map.status(), MapStatus::Unavailable);
        assert_eq!(map.status().as_ref(), "Unable to get the current location");

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(map.pois().is_empty());
    }

    #[test]
    fn filter_changes_visible_markers() {
        let (_, client) = client(BODY);
        let mut map = view();
        block_on(map.mount(&mut FixedPosition::new(HOME), &client));

        assert_eq!(map.set_filter(" 카페 "), 2);
        let titles: Vec<_> = map.visible_pois().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["cafe", "both"]);
        assert_eq!(map.layer().clusterer().markers.len(), 2);
        let highlighted = map
            .layer()
            .widget()
            .live
            .values()
            .filter(|&&(_, style)| style == MarkerStyle::Highlighted)
            .count();
        assert_eq!(highlighted, 2);

        assert_eq!(map.set_filter("없음"), 0);
        assert!(map.layer().clusterer().markers.is_empty());

        assert_eq!(map.set_filter(""), 3);
    }

    #[test]
    fn camera_moves() {
        let (calls, client) = client(BODY);
        let mut map = view();
        block_on(map.mount(&mut FixedPosition::new(HOME), &client));

        let near = LatLng::new(37.5, 127.25);
        assert_eq!(block_on(map.camera_changed(near, &client)), Outcome::Skipped);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(map.camera(), Some(near));

        let far = LatLng::new(37.5, 127.30);
        assert_eq!(block_on(map.camera_changed(far, &client)), Outcome::Applied(3));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(map.sync().last_position(), Some(far));
        assert_eq!(map.user_center(), Some(HOME));
    }

    #[test]
    fn reload_refetches_without_moving_user_marker() {
        let (calls, client) = client(BODY);
        let mut map = view();
        block_on(map.mount(&mut FixedPosition::new(HOME), &client));

        let moved = LatLng::new(37.501, 127.031);
        assert_eq!(
            block_on(map.reload(&mut FixedPosition::new(moved), &client)),
            Outcome::Applied(3)
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(map.user_center(), Some(HOME));
        assert_eq!(map.layer().user_location(), Some(HOME));
    }

    #[test]
    fn unmount_ignores_late_work() {
        let (_, client) = client(BODY);
        let mut map = view();
        block_on(map.mount(&mut FixedPosition::new(HOME), &client));
        map.unmount();
        assert!(map.layer().widget().live.is_empty());

        let far = LatLng::new(38.5, 127.03);
        assert_eq!(block_on(map.camera_changed(far, &client)), Outcome::Cancelled);
        assert!(map.pois().is_empty());
    }

    #[test]
    fn remount_after_unmount() {
        let (calls, client) = client(BODY);
        let mut map = view();
        block_on(map.mount(&mut FixedPosition::new(HOME), &client));
        map.unmount();
        assert_eq!(map.user_center(), None);
        assert_eq!(map.layer().user_location(), None);

        let away = LatLng::new(35.1, 129.04);
        let outcome = block_on(map.mount(&mut FixedPosition::new(away), &client));
        assert_eq!(outcome, Outcome::Applied(3));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(map.pois().len(), 3);
        assert_eq!(map.user_center(), Some(away));
        assert_eq!(map.layer().user_location(), Some(away));
        assert_eq!(map.layer().widget().live.len(), 4);
    }

    #[test]
    fn clicking_a_marker_opens_its_popup() {
        let (_, client) = client(BODY);
        let geocoder = ReverseGeocoder::with_service(
            mock::service(|_| mock::respond(200, r#"{"results":[{"formatted_address":"Seoul"}]}"#)),
            &Config::default(),
        );
        let mut map = view();
        block_on(map.mount(&mut FixedPosition::new(HOME), &client));
        map.set_filter("바다");

        let sea = map.pois().iter().find(|p| p.title == "sea").unwrap().key.clone();
        let cafe = map.pois().iter().find(|p| p.title == "cafe").unwrap().key.clone();

        let (&id, _) = map
            .layer()
            .widget()
            .keys
            .iter()
            .find(|(_, key)| **key == sea)
            .unwrap();
        assert_eq!(map.marker_key(&id), Some(&sea));

        let popup = block_on(map.marker_clicked(&sea, &geocoder)).unwrap();
        assert_eq!(popup.title(), "sea");
        assert_eq!(popup.place_id(), 2);
        assert_eq!(popup.address(), Some("Seoul"));
        assert_eq!(popup.detail_route().to_string(), "/place/2");

        // filtered out, so there is no marker to click
        assert!(block_on(map.marker_clicked(&cafe, &geocoder)).is_none());
        assert!(block_on(map.marker_clicked(&PoiKey::from("nope"), &geocoder)).is_none());
    }

    #[test]
    fn dashboard_transitions() {
        let mut state = DashboardState::new();
        state.apply(DashboardEvent::SearchInput("카".into()));
        state.apply(DashboardEvent::SuggestionsLoaded(vec!["카페".into()]));
        assert_eq!(state.suggestions, ["카페"]);

        state.apply(DashboardEvent::SuggestionPicked("카페".into()));
        assert_eq!(state.search_input, "카페");
        assert!(state.suggestions.is_empty());
        assert_eq!(state.reload, 1);
        assert_eq!(state.filter().as_str(), "카페");

        state.apply(DashboardEvent::SuggestionsLoaded(vec!["x".into()]));
        state.apply(DashboardEvent::SearchInput(String::new()));
        assert!(state.suggestions.is_empty());

        state.apply(DashboardEvent::OpenModal);
        assert!(state.modal_open);
        state.apply(DashboardEvent::PlaceRegistered);
        assert!(!state.modal_open);
        assert_eq!(state.reload, 2);
    }
}
