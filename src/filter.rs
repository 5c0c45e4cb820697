//! Tag filtering of places.

use crate::poi::Poi;
use crate::types::MarkerStyle;

/// A normalized (trimmed, lowercased) tag query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagQuery {
    normalized: String,
}

impl TagQuery {
    pub fn new(raw: &str) -> Self {
        TagQuery {
            normalized: raw.trim().to_lowercase(),
        }
    }

    /// An empty query lets every place through.
    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Whether a place with `tags` passes the query.
    pub fn matches<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        self.is_empty()
            || tags
                .iter()
                .any(|tag| tag.as_ref().to_lowercase().contains(&self.normalized))
    }

    /// The pin style for a place with `tags`.
    ///
    /// A place is highlighted exactly when it passes [`matches`](Self::matches).
    pub fn style_for<S: AsRef<str>>(&self, tags: &[S]) -> MarkerStyle {
        if self.matches(tags) {
            MarkerStyle::Highlighted
        } else {
            MarkerStyle::Default
        }
    }
}

impl From<&str> for TagQuery {
    fn from(raw: &str) -> Self {
        TagQuery::new(raw)
    }
}

/// The places in `pois` whose tags match `query`, in their original order.
pub fn filter<'a>(pois: &'a [Poi], query: &TagQuery) -> Vec<&'a Poi> {
    pois.iter().filter(|poi| query.matches(&poi.tags)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LatLng;
    use crate::poi::PoiKey;

    fn poi(key: &str, tags: &[&str]) -> Poi {
        Poi {
            key: PoiKey::from(key),
            place_id: 1,
            title: key.to_owned(),
            location: LatLng::new(37.5, 127.0),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            image_url: None,
        }
    }

    #[test]
    fn normalization() {
        assert_eq!(TagQuery::new("  CaFe \t").as_str(), "cafe");
        assert!(TagQuery::new("   ").is_empty());
    }

    #[test]
    fn korean_tags() {
        let p = poi("a", &["카페", "뷰맛집"]);
        assert!(TagQuery::new("카페").matches(&p.tags));
        assert!(TagQuery::new("맛집").matches(&p.tags));
        assert!(!TagQuery::new("바다").matches(&p.tags));
    }

    #[test]
    fn case_insensitive_substring() {
        let p = poi("a", &["Rooftop BAR"]);
        assert!(TagQuery::new("bar").matches(&p.tags));
        assert!(TagQuery::new(" TOP ").matches(&p.tags));
        assert!(!TagQuery::new("pub").matches(&p.tags));
    }

    #[test]
    fn empty_query_passes_everything() {
        let pois = vec![poi("a", &["x"]), poi("b", &[]), poi("c", &["y", "z"])];
        let all = filter(&pois, &TagQuery::new(""));
        assert_eq!(all.len(), pois.len());
        assert!(all.iter().zip(&pois).all(|(a, b)| std::ptr::eq(*a, b)));
    }

    #[test]
    fn filtered_is_subset_in_order() {
        let pois = vec![
            poi("a", &["night view"]),
            poi("b", &["parking"]),
            poi("c", &["View"]),
            poi("d", &[]),
        ];
        let hits = filter(&pois, &TagQuery::new("view"));
        let keys: Vec<_> = hits.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["a", "c"]);
        assert!(hits.iter().all(|h| pois.iter().any(|p| std::ptr::eq(*h, p))));
    }

    #[test]
    fn highlight_follows_match() {
        let tags = ["카페"];
        assert_eq!(TagQuery::new("카페").style_for(&tags), MarkerStyle::Highlighted);
        assert_eq!(TagQuery::new("").style_for(&tags), MarkerStyle::Highlighted);
        assert_eq!(TagQuery::new("바다").style_for(&tags), MarkerStyle::Default);
    }

    #[test]
    fn every_passing_place_is_highlighted() {
        let pois = vec![poi("a", &["카페"]), poi("b", &[]), poi("c", &["바다", "뷰맛집"])];
        for raw in ["", "  ", "카페", "맛집", "없음"] {
            let query = TagQuery::new(raw);
            for p in &pois {
                let highlighted = query.style_for(&p.tags) == MarkerStyle::Highlighted;
                assert_eq!(highlighted, query.matches(&p.tags), "{:?} {:?}", raw, p.tags);
            }
            assert!(filter(&pois, &query)
                .iter()
                .all(|p| query.style_for(&p.tags) == MarkerStyle::Highlighted));
        }
    }
}
