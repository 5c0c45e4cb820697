//! A grid-based clustering layer for hosts without a native clusterer.
//!
//! Markers are bucketed by the Web-Mercator pixel cell they fall into at the
//! current zoom level. A cell holding one marker is shown as that marker.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::geo::LatLng;
use crate::marker::ClusterLayer;

/// Side of a grid cell in screen pixels.
pub const DEFAULT_GRID_SIZE: f64 = 60.0;
/// Zoom level the map view opens at.
pub const DEFAULT_ZOOM: u8 = 15;

const TILE_SIZE: f64 = 256.0;
const MAX_LATITUDE: f64 = 85.051_128_78;

/// A marker handle that knows where it is drawn.
pub trait Positioned {
    fn position(&self) -> LatLng;
}

impl Positioned for LatLng {
    fn position(&self) -> LatLng {
        *self
    }
}

/// One collapsed group of markers.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster<M> {
    /// Mean position of the members.
    pub center: LatLng,
    pub markers: Vec<M>,
}

impl<M> Cluster<M> {
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// A cluster of one is drawn as the plain marker.
    pub fn is_single(&self) -> bool {
        self.markers.len() == 1
    }
}

#[derive(Clone, Debug)]
pub struct GridClusterer<M> {
    markers: Vec<M>,
    grid_size: f64,
    zoom: u8,
}

impl<M> Default for GridClusterer<M> {
    fn default() -> Self {
        GridClusterer {
            markers: Vec::new(),
            grid_size: DEFAULT_GRID_SIZE,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl<M: Positioned + Clone> GridClusterer<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grid_size(&mut self, pixels: f64) -> &mut Self {
        self.grid_size = pixels.max(1.0);
        self
    }

    pub fn set_zoom(&mut self, zoom: u8) -> &mut Self {
        self.zoom = zoom.min(22);
        self
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn markers(&self) -> &[M] {
        &self.markers
    }

    /// Groups the current markers at the current zoom, in order of first appearance.
    pub fn clusters(&self) -> Vec<Cluster<M>> {
        let mut index: HashMap<(i64, i64), usize> = HashMap::new();
        let mut clusters: Vec<Cluster<M>> = Vec::new();

        for marker in &self.markers {
            let cell = self.cell_of(marker.position());
            match index.get(&cell) {
                Some(&i) => clusters[i].markers.push(marker.clone()),
                None => {
                    index.insert(cell, clusters.len());
                    clusters.push(Cluster {
                        center: marker.position(),
                        markers: vec![marker.clone()],
                    });
                }
            }
        }

        for cluster in &mut clusters {
            let n = cluster.markers.len() as f64;
            let (lat, lng) = cluster
                .markers
                .iter()
                .map(Positioned::position)
                .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
            cluster.center = LatLng::new(lat / n, lng / n);
        }

        clusters
    }

    fn cell_of(&self, at: LatLng) -> (i64, i64) {
        let (x, y) = world_pixel(at, self.zoom);
        (
            (x / self.grid_size).floor() as i64,
            (y / self.grid_size).floor() as i64,
        )
    }
}

impl<M: Positioned + Clone> ClusterLayer<M> for GridClusterer<M> {
    fn clear_markers(&mut self) {
        self.markers.clear();
    }

    fn add_markers(&mut self, markers: Vec<M>) {
        self.markers.extend(markers);
    }
}

/// Web-Mercator pixel coordinates of `at` at `zoom`.
fn world_pixel(at: LatLng, zoom: u8) -> (f64, f64) {
    let scale = TILE_SIZE * f64::from(1u32 << zoom);
    let lat = at.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    let x = (at.lng + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * scale;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_pixel_corners() {
        let (x, y) = world_pixel(LatLng::new(0.0, 0.0), 0);
        assert!((x - 128.0).abs() < 1e-9);
        assert!((y - 128.0).abs() < 1e-9);

        let (x, _) = world_pixel(LatLng::new(0.0, -180.0), 1);
        assert_eq!(x, 0.0);
        let (_, y) = world_pixel(LatLng::new(90.0, 0.0), 0);
        assert!(y.abs() < 1e-6, "{}", y);
    }

    #[test]
    fn nearby_markers_collapse_at_low_zoom() {
        let mut layer = GridClusterer::new();
        layer.add_markers(vec![
            LatLng::new(37.5000, 127.0300),
            LatLng::new(37.5010, 127.0310),
            LatLng::new(35.1798, 129.0750),
        ]);

        layer.set_zoom(8);
        let clusters = layer.clusters();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].len(), 2);
        assert!((clusters[0].center.lat - 37.5005).abs() < 1e-9);
        assert!(clusters[1].is_single());

        layer.set_zoom(20);
        assert!(layer.clusters().iter().all(Cluster::is_single));
    }

    #[test]
    fn clear_empties_layer() {
        let mut layer = GridClusterer::new();
        layer.add_markers(vec![LatLng::new(1.0, 1.0)]);
        layer.clear_markers();
        assert!(layer.markers().is_empty());
        assert!(layer.clusters().is_empty());
    }
}
