//! State of the place registration form.

use std::error;
use std::fmt::Display;

use http_body::Body;

use crate::error::ValidationError;
use crate::geo::LatLng;
use crate::geocode::ReverseGeocoder;
use crate::service::HttpService;
use crate::util::Multipart;

/// Tags offered as local suggestions while typing.
pub const KNOWN_TAGS: [&str; 4] = ["카페", "주차장", "야경", "뷰맛집"];

pub const MAX_RATING: u8 = 5;

/// An image picked from disk or captured from the camera.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        ImageFile {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// A JPEG frame grabbed from the camera.
    pub fn captured(data: Vec<u8>) -> Self {
        ImageFile::new("captured.jpg", "image/jpeg", data)
    }
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Field values of the registration form while it is being edited.
#[derive(Clone, Debug, Default)]
pub struct PlaceForm {
    pub title: String,
    pub description: String,
    location: Option<LatLng>,
    address: Option<String>,
    rating: u8,
    image: Option<ImageFile>,
    tag_input: String,
    tags: Vec<String>,
}

impl PlaceForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// A form whose location starts at the device position.
    pub fn at(location: LatLng) -> Self {
        let mut form = Self::new();
        form.set_location(location);
        form
    }

    pub fn location(&self) -> Option<LatLng> {
        self.location
    }

    /// Moves the pin, e.g. after a click or a drag on the picker map.
    ///
    /// A previously confirmed address no longer applies and is dropped.
    pub fn set_location(&mut self, location: LatLng) {
        self.location = Some(location);
        self.address = None;
    }

    /// The address confirmed for the current location, if any.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Resolves the address of the current location.
    ///
    /// Returns `None`, leaving the form untouched, when there is no location or
    /// the geocoder finds nothing.
    pub async fn confirm_location<S, B>(&mut self, geocoder: &ReverseGeocoder<S>) -> Option<&str>
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        S::Error: Display,
        B: Default,
    {
        let location = self.location?;
        match geocoder.lookup(location).await {
            Ok(Some(address)) => {
                self.address = Some(address);
                self.address.as_deref()
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!("address lookup failed: {}", e);
                None
            }
        }
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    /// Sets the star rating, clamped to `0..=5`.
    pub fn set_rating(&mut self, rating: u8) {
        self.rating = rating.min(MAX_RATING);
    }

    pub fn image(&self) -> Option<&ImageFile> {
        self.image.as_ref()
    }

    pub fn set_image(&mut self, image: ImageFile) {
        self.image = Some(image);
    }

    pub fn tag_input(&self) -> &str {
        &self.tag_input
    }

    pub fn set_tag_input(&mut self, input: impl Into<String>) {
        self.tag_input = input.into();
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Selects `tag`. Returns `false` if it was already selected.
    ///
    /// Selecting a new tag clears the tag input.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        if self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_owned());
        self.tag_input.clear();
        true
    }

    /// Selects the typed tag, as pressing Enter in the tag field does.
    pub fn commit_tag_input(&mut self) -> bool {
        let tag = self.tag_input.trim().to_owned();
        if tag.is_empty() {
            return false;
        }
        self.add_tag(&tag)
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    /// Known tags containing the trimmed input that are not selected yet.
    pub fn tag_suggestions(&self) -> Vec<&'static str> {
        let input = self.tag_input.trim();
        KNOWN_TAGS
            .iter()
            .copied()
            .filter(|tag| tag.contains(input))
            .filter(|tag| !self.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// Checks that every field is filled in.
    ///
    /// The location must be a finite coordinate; zero is a valid degree value.
    pub fn validate(&self) -> Result<PlaceSubmission, ValidationError> {
        let location = self.location.filter(LatLng::is_finite).ok_or(ValidationError)?;
        let image = self.image.clone().ok_or(ValidationError)?;
        if self.title.is_empty() || self.description.is_empty() || self.tags.is_empty() {
            return Err(ValidationError);
        }

        Ok(PlaceSubmission {
            title: self.title.clone(),
            description: self.description.clone(),
            location,
            rating: self.rating,
            image,
            tags: self.tags.clone(),
        })
    }
}

/// A validated registration, ready to be sent.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceSubmission {
    pub title: String,
    pub description: String,
    pub location: LatLng,
    pub rating: u8,
    pub image: ImageFile,
    pub tags: Vec<String>,
}

impl PlaceSubmission {
    /// Encodes the submission as `multipart/form-data`,
    /// returning the `Content-Type` value and the body.
    pub fn to_multipart(&self) -> (String, Vec<u8>) {
        let mut form = Multipart::new();
        form.text("placeTitle", &self.title)
            .text("placeDescription", &self.description)
            .text("lng", &self.location.lng.to_string())
            .text("lat", &self.location.lat.to_string())
            .text("rating", &self.rating.to_string())
            .file(
                "placeImageURL",
                &self.image.file_name,
                &self.image.content_type,
                &self.image.data,
            );
        for tag in &self.tags {
            form.text("tags", tag);
        }
        form.finish()
    }
}
