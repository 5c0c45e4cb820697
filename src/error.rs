//! Error types

use std::error;
use std::fmt::{self, Debug, Display, Formatter};

use crate::types::StatusCode;

/// An error occurred while talking to the backend API or the geocoding service.
#[derive(Debug)]
pub enum Error<E = Box<dyn error::Error + Send + Sync>> {
    /// An error from the underlying HTTP client.
    Service(E),
    /// An error while reading the response body.
    Body(Box<dyn error::Error + Send + Sync>),
    /// A non-success HTTP status from the server.
    Http(StatusCode),
    /// The response body was not the expected JSON.
    Json(serde_json::Error),
    /// The request needs a session token but there is none.
    Unauthorized,
    /// The server rejected the credentials, with its message.
    Login(String),
    /// The login succeeded but the response had no bearer token in it.
    MissingToken,
    /// Failed to build the request (e.g. the configured base URL is invalid).
    Request(http::Error),
}

impl<E> Error<E> {
    /// Whether the error came from the HTTP status of the response.
    pub fn status(&self) -> Option<StatusCode> {
        match *self {
            Error::Http(status) => Some(status),
            _ => None,
        }
    }
}

impl<E: error::Error + 'static> error::Error for Error<E> {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        use Error::*;

        match *self {
            Service(ref e) => Some(e),
            Body(ref e) => Some(&**e),
            Json(ref e) => Some(e),
            Request(ref e) => Some(e),
            Http(_) | Unauthorized | Login(_) | MissingToken => None,
        }
    }
}

impl<E: Display> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use Error::*;

        match *self {
            Service(ref e) => Display::fmt(e, f),
            Body(ref e) => write!(f, "error reading response body: {}", e),
            Http(ref code) => Display::fmt(code, f),
            Json(ref e) => write!(f, "malformed response: {}", e),
            Unauthorized => f.write_str("not logged in"),
            Login(ref msg) => write!(f, "login failed: {}", msg),
            MissingToken => f.write_str("no bearer token in login response"),
            Request(ref e) => Display::fmt(e, f),
        }
    }
}

impl<E> From<serde_json::Error> for Error<E> {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl<E> From<http::Error> for Error<E> {
    fn from(e: http::Error) -> Self {
        Error::Request(e)
    }
}

/// The device location could not be determined.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeolocationError {
    /// The platform has no geolocation support.
    Unsupported,
    /// The provider failed or the user denied access.
    Unavailable(String),
}

impl error::Error for GeolocationError {}

impl Display for GeolocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            GeolocationError::Unsupported => f.write_str("geolocation is not supported"),
            GeolocationError::Unavailable(ref reason) => {
                write!(f, "unable to get the current location: {}", reason)
            }
        }
    }
}

/// The place registration form is incomplete.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidationError;

impl error::Error for ValidationError {}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("fill all fields")
    }
}

/// An action that is only available to logged-in users was attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoginRequired {
    action: &'static str,
}

impl LoginRequired {
    pub(crate) fn new(action: &'static str) -> Self {
        LoginRequired { action }
    }

    /// The action that was refused, e.g. `"like"`.
    pub fn action(&self) -> &'static str {
        self.action
    }
}

impl error::Error for LoginRequired {}

impl Display for LoginRequired {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "log in to {}", self.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let e: Error = Error::Http(StatusCode::NOT_FOUND);
        assert_eq!(e.to_string(), "404 Not Found");
        assert_eq!(e.status(), Some(StatusCode::NOT_FOUND));

        let e: Error = Error::Login("bad password".into());
        assert_eq!(e.to_string(), "login failed: bad password");
        assert_eq!(e.status(), None);

        assert_eq!(ValidationError.to_string(), "fill all fields");
        assert_eq!(LoginRequired::new("bookmark").to_string(), "log in to bookmark");
    }
}
