//! Marker lifecycle on top of a host map widget and clustering layer.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::filter::{filter, TagQuery};
use crate::geo::LatLng;
use crate::poi::{Poi, PoiKey};
use crate::types::MarkerStyle;

/// What a host map needs to draw one pin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerSpec<'a> {
    /// The place the pin stands for; `None` for the user-location marker.
    pub key: Option<&'a PoiKey>,
    pub position: LatLng,
    pub title: &'a str,
    pub style: MarkerStyle,
}

/// The host map widget, which owns the native marker objects.
pub trait MapWidget {
    /// Handle to a native marker.
    type Marker: Clone;

    fn create_marker(&mut self, spec: MarkerSpec<'_>) -> Self::Marker;

    fn remove_marker(&mut self, marker: Self::Marker);
}

/// The layer that groups markers into clusters.
pub trait ClusterLayer<M> {
    fn clear_markers(&mut self);

    fn add_markers(&mut self, markers: Vec<M>);
}

impl<'a, W: MapWidget + ?Sized> MapWidget for &'a mut W {
    type Marker = W::Marker;

    fn create_marker(&mut self, spec: MarkerSpec<'_>) -> W::Marker {
        (**self).create_marker(spec)
    }

    fn remove_marker(&mut self, marker: W::Marker) {
        (**self).remove_marker(marker)
    }
}

impl<'a, M, C: ClusterLayer<M> + ?Sized> ClusterLayer<M> for &'a mut C {
    fn clear_markers(&mut self) {
        (**self).clear_markers()
    }

    fn add_markers(&mut self, markers: Vec<M>) {
        (**self).add_markers(markers)
    }
}

/// Native markers that are currently mounted, by place key.
#[derive(Clone, Debug)]
pub struct MarkerRegistry<M> {
    markers: HashMap<PoiKey, (M, MarkerStyle)>,
}

impl<M> Default for MarkerRegistry<M> {
    fn default() -> Self {
        MarkerRegistry {
            markers: HashMap::new(),
        }
    }
}

impl<M> MarkerRegistry<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `marker` under `key`. Returns `false`, leaving the registry as it was,
    /// when `key` is already registered.
    pub fn register(&mut self, key: PoiKey, marker: M, style: MarkerStyle) -> bool {
        if self.markers.contains_key(&key) {
            return false;
        }
        self.markers.insert(key, (marker, style));
        true
    }

    /// Removes the marker under `key`, if any.
    pub fn deregister(&mut self, key: &PoiKey) -> Option<M> {
        self.markers.remove(key).map(|(marker, _)| marker)
    }

    pub fn get(&self, key: &PoiKey) -> Option<&M> {
        self.markers.get(key).map(|(marker, _)| marker)
    }

    pub fn style(&self, key: &PoiKey) -> Option<MarkerStyle> {
        self.markers.get(key).map(|&(_, style)| style)
    }

    pub fn contains(&self, key: &PoiKey) -> bool {
        self.markers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PoiKey> {
        self.markers.keys()
    }

    /// The key `marker` is registered under, for hosts that only get the native marker back.
    pub fn key_of(&self, marker: &M) -> Option<&PoiKey>
    where
        M: PartialEq,
    {
        self.markers
            .iter()
            .find(|(_, (m, _))| m == marker)
            .map(|(key, _)| key)
    }

    fn drain(&mut self) -> impl Iterator<Item = M> + '_ {
        self.markers.drain().map(|(_, (marker, _))| marker)
    }
}

/// Keeps the clustering layer's marker set equal to the filtered place set.
///
/// The user-location marker is owned here too but never handed to the
/// clustering layer and never filtered.
pub struct MarkerLayer<W: MapWidget, C> {
    widget: W,
    clusterer: C,
    registry: MarkerRegistry<W::Marker>,
    user_marker: Option<(LatLng, W::Marker)>,
}

impl<W, C> MarkerLayer<W, C>
where
    W: MapWidget,
    C: ClusterLayer<W::Marker>,
{
    pub fn new(widget: W, clusterer: C) -> Self {
        MarkerLayer {
            widget,
            clusterer,
            registry: MarkerRegistry::new(),
            user_marker: None,
        }
    }

    /// Places the fixed marker at the device location. Only the first call has an effect.
    pub fn set_user_location(&mut self, at: LatLng) {
        if self.user_marker.is_some() {
            return;
        }
        let marker = self.widget.create_marker(MarkerSpec {
            key: None,
            position: at,
            title: "",
            style: MarkerStyle::UserLocation,
        });
        self.user_marker = Some((at, marker));
    }

    pub fn user_location(&self) -> Option<LatLng> {
        self.user_marker.as_ref().map(|&(at, _)| at)
    }

    /// Brings markers and clusters in line with `pois` filtered by `query`.
    ///
    /// Markers of places that dropped out are unmounted, new ones mounted, and the
    /// clustering layer is cleared and refilled with exactly the filtered set, in order.
    /// Returns the number of markers handed to the clustering layer.
    pub fn render(&mut self, pois: &[Poi], query: &TagQuery) -> usize {
        let visible = filter(pois, query);

        let wanted: HashSet<&PoiKey> = visible.iter().map(|poi| &poi.key).collect();
        let stale: Vec<PoiKey> = self
            .registry
            .keys()
            .filter(|key| !wanted.contains(key))
            .cloned()
            .collect();
        for key in &stale {
            self.unmount(key);
        }

        for poi in &visible {
            let style = query.style_for(&poi.tags);
            match self.registry.style(&poi.key) {
                Some(s) if s == style => continue,
                Some(_) => self.unmount(&poi.key),
                None => {}
            }
            let marker = self.widget.create_marker(MarkerSpec {
                key: Some(&poi.key),
                position: poi.location,
                title: &poi.title,
                style,
            });
            self.registry.register(poi.key.clone(), marker, style);
        }

        let markers: Vec<W::Marker> = visible
            .iter()
            .filter_map(|poi| self.registry.get(&poi.key).cloned())
            .collect();
        let count = markers.len();
        self.clusterer.clear_markers();
        self.clusterer.add_markers(markers);

        debug!(
            total = pois.len(),
            visible = count,
            unmounted = stale.len(),
            query = query.as_str(),
            "rendered markers"
        );
        count
    }

    /// Unmounts every marker, the user-location marker included.
    pub fn clear(&mut self) {
        self.clusterer.clear_markers();
        let markers: Vec<W::Marker> = self.registry.drain().collect();
        for marker in markers {
            self.widget.remove_marker(marker);
        }
        if let Some((_, marker)) = self.user_marker.take() {
            self.widget.remove_marker(marker);
        }
    }

    pub fn registry(&self) -> &MarkerRegistry<W::Marker> {
        &self.registry
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn clusterer(&self) -> &C {
        &self.clusterer
    }

    pub fn clusterer_mut(&mut self) -> &mut C {
        &mut self.clusterer
    }

    fn unmount(&mut self, key: &PoiKey) {
        if let Some(marker) = self.registry.deregister(key) {
            self.widget.remove_marker(marker);
        }
    }
}
