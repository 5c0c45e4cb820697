// This is free and unencumbered software released into the public domain.
//
// Anyone is free to copy, modify, publish, use, compile, sell, or
// distribute this software, either in source code form or as a compiled
// binary, for any purpose, commercial or non-commercial, and by any
// means.
//
// In jurisdictions that recognize copyright laws, the author or authors
// of this software dedicate any and all copyright interest in the
// software to the public domain. We make this dedication for the benefit
// of the public at large and to the detriment of our heirs and
// successors. We intend this dedication to be an overt act of
// relinquishment in perpetuity of all present and future rights to this
// software under copyright law.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.
// IN NO EVENT SHALL THE AUTHORS BE LIABLE FOR ANY CLAIM, DAMAGES OR
// OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE,
// ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR
// OTHER DEALINGS IN THE SOFTWARE.
//
// For more information, please refer to <http://unlicense.org/>

//! Prints the places around a coordinate, clustered as a map would show them.
//!
//! ```text
//! cargo run --example nearby -- 37.5547 126.9707 카페
//! ```

use std::env;

use tracing_subscriber::EnvFilter;
use unoffimap::cluster::{GridClusterer, Positioned};
use unoffimap::geocode::ReverseGeocoder;
use unoffimap::geolocation::FixedPosition;
use unoffimap::marker::{MapWidget, MarkerSpec};
use unoffimap::types::MarkerStyle;
use unoffimap::{Client, Config, LatLng, MapView, PoiKey, TokenStore};

/// A pin drawn on the terminal.
#[derive(Clone, Debug)]
struct Pin {
    id: usize,
    key: Option<PoiKey>,
    at: LatLng,
    title: String,
    style: MarkerStyle,
}

impl Positioned for Pin {
    fn position(&self) -> LatLng {
        self.at
    }
}

#[derive(Default)]
struct Terminal {
    next_id: usize,
}

impl MapWidget for Terminal {
    type Marker = Pin;

    fn create_marker(&mut self, spec: MarkerSpec<'_>) -> Pin {
        self.next_id += 1;
        Pin {
            id: self.next_id,
            key: spec.key.cloned(),
            at: spec.position,
            title: spec.title.to_owned(),
            style: spec.style,
        }
    }

    fn remove_marker(&mut self, _: Pin) {}
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let lat = args.next().and_then(|s| s.parse().ok()).unwrap_or(37.5547);
    let lng = args.next().and_then(|s| s.parse().ok()).unwrap_or(126.9707);
    let tag = args.next().unwrap_or_default();

    let config = Config::from_env();
    let client = Client::new(&config, TokenStore::new(config.get_token_path().clone()));
    let geocoder = ReverseGeocoder::new(&config);

    let mut map = MapView::new(&config, Terminal::default(), GridClusterer::new());
    let outcome = map
        .mount(&mut FixedPosition::new(LatLng::new(lat, lng)), &client)
        .await;
    println!("{} ({:?})", map.status(), outcome);

    let visible = map.set_filter(&tag);
    println!("{} of {} places match {:?}", visible, map.pois().len(), tag);

    let mut clicked = None;
    for cluster in map.layer().clusterer().clusters() {
        if cluster.is_single() {
            let pin = &cluster.markers[0];
            println!("#{} {} [{}] at {:?}", pin.id, pin.title, pin.style, pin.at);
            if clicked.is_none() {
                clicked = pin.key.clone();
            }
        } else {
            println!("cluster of {} around {:?}", cluster.len(), cluster.center);
        }
    }

    if let Some(key) = clicked {
        if let Some(popup) = map.marker_clicked(&key, &geocoder).await {
            println!(
                "{}: {} ({})",
                popup.title(),
                popup.address().unwrap_or_default(),
                popup.detail_route()
            );
        }
    }

    map.unmount();
}
