//! Points of interest returned by the proximity endpoint.

use std::fmt::{self, Display, Formatter};

use serde::Deserialize;

use crate::geo::LatLng;
use crate::types::PlaceId;
use crate::util::{null_as_default, random_base36};

/// Body of `GET /load_location`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct LoadLocationResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub poi: Vec<PoiRecord>,
}

/// A place as it appears on the wire.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoiRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub place_title: String,
    #[serde(rename = "placeImageURL", default)]
    pub place_image_url: Option<String>,
    #[serde(rename = "userid", default)]
    pub user_id: Option<i64>,
    pub place_id: PlaceId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

/// Rendering key of a [`Poi`]: random, local, and regenerated on every fetch.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoiKey(String);

impl PoiKey {
    pub fn random() -> Self {
        PoiKey(random_base36(8))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PoiKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PoiKey {
    fn from(s: &str) -> Self {
        PoiKey(s.to_owned())
    }
}

/// A point of interest held by the map view.
#[derive(Clone, Debug, PartialEq)]
pub struct Poi {
    pub key: PoiKey,
    pub place_id: PlaceId,
    pub title: String,
    pub location: LatLng,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
}

impl From<PoiRecord> for Poi {
    fn from(record: PoiRecord) -> Self {
        Poi {
            key: PoiKey::random(),
            place_id: record.place_id,
            title: record.place_title,
            location: LatLng::new(record.latitude, record.longitude),
            tags: record.tags,
            image_url: record.place_image_url.filter(|url| !url.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_response() {
        let json = r#"{
            "poi": [
                {
                    "latitude": 37.5,
                    "longitude": 127.03,
                    "placeTitle": "Seoul Forest",
                    "placeImageURL": "https://example.com/a.jpg",
                    "userid": 3,
                    "placeId": 12,
                    "tags": ["카페", "뷰맛집"]
                },
                {
                    "latitude": 37.6,
                    "longitude": 127.1,
                    "placeTitle": "Nowhere",
                    "placeId": 13,
                    "tags": null
                }
            ]
        }"#;
        let res: LoadLocationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(res.poi.len(), 2);
        assert_eq!(res.poi[0].tags, ["카페", "뷰맛집"]);
        assert_eq!(res.poi[0].user_id, Some(3));
        assert!(res.poi[1].tags.is_empty());
        assert_eq!(res.poi[1].place_image_url, None);

        let poi = Poi::from(res.poi[0].clone());
        assert_eq!(poi.place_id, 12);
        assert_eq!(poi.title, "Seoul Forest");
        assert_eq!(poi.location, LatLng::new(37.5, 127.03));
        assert_eq!(poi.key.as_str().len(), 8);
    }

    #[test]
    fn missing_or_null_list_is_empty() {
        let res: LoadLocationResponse = serde_json::from_str("{}").unwrap();
        assert!(res.poi.is_empty());
        let res: LoadLocationResponse = serde_json::from_str(r#"{"poi":null}"#).unwrap();
        assert!(res.poi.is_empty());
        let res: LoadLocationResponse = serde_json::from_str(r#"{"poi":[]}"#).unwrap();
        assert!(res.poi.is_empty());
    }

    #[test]
    fn keys_are_regenerated() {
        let record = PoiRecord {
            latitude: 0.0,
            longitude: 0.0,
            place_title: "x".into(),
            place_image_url: Some(String::new()),
            user_id: None,
            place_id: 1,
            tags: vec![],
        };
        let a = Poi::from(record.clone());
        let b = Poi::from(record);
        assert_ne!(a.key, b.key);
        assert_eq!(a.image_url, None);
    }
}
