//! Requests to the backend endpoints.

use std::error;

use http::header::{HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use http::Request;
use http_body::Body;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::Error;
use crate::form::PlaceSubmission;
use crate::geo::LatLng;
use crate::poi::{LoadLocationResponse, PoiRecord};
use crate::service::{round_trip, HttpService};
use crate::session::SessionProvider;
use crate::token::Token;
use crate::types::{PlaceId, RequestMethod, StatusCode};
use crate::util::{null_as_default, string_or_number, Query};
use crate::Client;

const APPLICATION_JSON: &str = "application/json";

/// Full record of a place as shown on its detail page.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaceDetail {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(rename = "placeImageURL")]
    pub place_image_url: Option<String>,
    pub latitude: f64,
    /// The backend spells this `longtitude`.
    #[serde(alias = "longtitude")]
    pub longitude: f64,
    pub rating: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    pub place_id: PlaceId,
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: Option<String>,
    pub create_time: Option<String>,
    pub username: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub comments: Vec<Comment>,
}

impl PlaceDetail {
    pub fn location(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Comment {
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: Option<String>,
    pub profile_image: Option<String>,
    pub comment: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginFailure {
    error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BookmarkRequest {
    place_id: PlaceId,
}

impl<S, P: SessionProvider> Client<S, P> {
    /// `GET /load_location?lat&lng`: places near `center`.
    ///
    /// A missing or empty `poi` list yields an empty `Vec`.
    pub async fn load_location<B>(
        &self,
        center: LatLng,
    ) -> Result<Vec<PoiRecord>, Error<<S as HttpService<B>>::Error>>
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        B: Default,
    {
        let query = [("lat", center.lat.to_string()), ("lng", center.lng.to_string())];
        let uri = self.endpoint(&format!("/load_location?{}", Query(&query)))?;
        let req = Request::get(uri).body(B::default())?;

        let body = self.send(req).await?;
        if body.is_empty() {
            return Ok(Vec::new());
        }
        let res: LoadLocationResponse = serde_json::from_slice(&body)?;
        debug!(count = res.poi.len(), "loaded nearby places");
        Ok(res.poi)
    }

    /// `POST /login`: exchanges credentials for a bearer token.
    ///
    /// The token is not stored anywhere; hand it to the session yourself.
    pub async fn login<B>(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Token, Error<<S as HttpService<B>>::Error>>
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        B: From<Vec<u8>>,
    {
        let data = serde_json::to_vec(&LoginRequest { username, password })?;
        let req = Request::post(self.endpoint("/login")?)
            .header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))
            .header(CONTENT_LENGTH, data.len())
            .body(B::from(data))?;

        let (parts, body) = round_trip(&self.service, req).await?;
        if !parts.status.is_success() {
            let msg = serde_json::from_slice::<LoginFailure>(&body)
                .ok()
                .and_then(|f| f.error)
                .unwrap_or_else(|| "login failed".to_owned());
            warn!(status = %parts.status, "login rejected: {}", msg);
            return Err(Error::Login(msg));
        }

        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(Token::from_authorization)
            .ok_or(Error::MissingToken)
    }

    /// `GET /tags/autocomplete?prefix`: known tags starting with `prefix`.
    ///
    /// An empty prefix returns no suggestions without a request, and an empty
    /// response body is an empty list.
    pub async fn autocomplete_tags<B>(
        &self,
        prefix: &str,
    ) -> Result<Vec<String>, Error<<S as HttpService<B>>::Error>>
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        B: Default,
    {
        if prefix.is_empty() {
            return Ok(Vec::new());
        }

        let query = [("prefix", prefix.to_owned())];
        let uri = self.endpoint(&format!("/tags/autocomplete?{}", Query(&query)))?;
        let req = Request::get(uri).body(B::default())?;

        let body = self.send(req).await?;
        if body.is_empty() {
            return Ok(Vec::new());
        }
        let tags: Option<Vec<String>> = serde_json::from_slice(&body)?;
        Ok(tags.unwrap_or_default())
    }

    /// Same as `autocomplete_tags` except that every failure is logged and
    /// turned into an empty list.
    pub async fn suggest_tags<B>(&self, prefix: &str) -> Vec<String>
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        <S as HttpService<B>>::Error: std::fmt::Display,
        B: Default,
    {
        match self.autocomplete_tags(prefix).await {
            Ok(tags) => tags,
            Err(e) => {
                error!("tag autocomplete failed: {}", e);
                Vec::new()
            }
        }
    }

    /// `POST /api/place/add`: registers a new place.
    ///
    /// Fails with `Error::Unauthorized` without a request when there is no session.
    pub async fn add_place<B>(
        &self,
        place: &PlaceSubmission,
    ) -> Result<(), Error<<S as HttpService<B>>::Error>>
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        B: From<Vec<u8>>,
    {
        let authorization = match self.authorization() {
            Some(value) => value,
            None => return Err(Error::Unauthorized),
        };
        let (content_type, data) = place.to_multipart();

        let req = Request::post(self.endpoint("/api/place/add")?)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, data.len())
            .body(B::from(data))?;

        let (parts, _) = round_trip(&self.service, req).await?;
        if parts.status != StatusCode::OK {
            error!(status = %parts.status, "place registration failed");
            return Err(Error::Http(parts.status));
        }
        Ok(())
    }

    /// `GET /api/post/place_id={id}`: the detail record of a place.
    pub async fn place_detail<B>(
        &self,
        id: PlaceId,
    ) -> Result<PlaceDetail, Error<<S as HttpService<B>>::Error>>
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        B: Default,
    {
        let mut req =
            Request::get(self.endpoint(&format!("/api/post/place_id={}", id))?)
                .header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        if let Some(authorization) = self.authorization() {
            req = req.header(AUTHORIZATION, authorization);
        }

        let body = self.send(req.body(B::default())?).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `POST /bookmarks`
    pub async fn add_bookmark<B>(
        &self,
        id: PlaceId,
    ) -> Result<(), Error<<S as HttpService<B>>::Error>>
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        B: From<Vec<u8>>,
    {
        let authorization = match self.authorization() {
            Some(value) => value,
            None => return Err(Error::Unauthorized),
        };
        let data = serde_json::to_vec(&BookmarkRequest { place_id: id })?;
        let req = Request::post(self.endpoint("/bookmarks")?)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))
            .header(CONTENT_LENGTH, data.len())
            .body(B::from(data))?;

        self.send(req).await.map(drop)
    }

    /// `DELETE /bookmarks/{id}`
    pub async fn remove_bookmark<B>(
        &self,
        id: PlaceId,
    ) -> Result<(), Error<<S as HttpService<B>>::Error>>
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        B: Default,
    {
        let authorization = match self.authorization() {
            Some(value) => value,
            None => return Err(Error::Unauthorized),
        };
        let req = Request::builder()
            .method(RequestMethod::DELETE)
            .uri(self.endpoint(&format!("/bookmarks/{}", id))?)
            .header(AUTHORIZATION, authorization)
            .body(B::default())?;

        self.send(req).await.map(drop)
    }

    /// Adds or removes the bookmark so that it ends up as `bookmarked`.
    pub async fn set_bookmark<B>(
        &self,
        id: PlaceId,
        bookmarked: bool,
    ) -> Result<(), Error<<S as HttpService<B>>::Error>>
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
        B: Default + From<Vec<u8>>,
    {
        if bookmarked {
            self.add_bookmark(id).await
        } else {
            self.remove_bookmark(id).await
        }
    }

    fn authorization(&self) -> Option<HeaderValue> {
        self.session.auth_token().and_then(|token| token.authorization())
    }

    /// Sends `req` and returns the body of a successful response.
    async fn send<B>(&self, req: Request<B>) -> Result<Vec<u8>, Error<<S as HttpService<B>>::Error>>
    where
        S: HttpService<B> + Clone,
        <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
    {
        let (parts, body) = round_trip(&self.service, req).await?;
        if !parts.status.is_success() {
            warn!(status = %parts.status, "request failed");
            return Err(Error::Http(parts.status));
        }
        Ok(body)
    }
}
