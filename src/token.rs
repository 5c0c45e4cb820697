use std::fmt::{self, Debug, Formatter};

use http::header::HeaderValue;

/// A bearer token used to authenticate against the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Token(token.into())
    }

    /// Extracts the token from an `Authorization: Bearer <token>` header value,
    /// the way the login endpoint hands it out.
    pub fn from_authorization(value: &HeaderValue) -> Option<Self> {
        let value = value.to_str().ok()?;
        let token = value.split(' ').nth(1)?.trim();
        if token.is_empty() {
            None
        } else {
            Some(Token::new(token))
        }
    }

    /// The `Authorization` header value carrying this token.
    pub fn authorization(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!("Bearer {}", self.0))
            .ok()
            .map(|mut v| {
                v.set_sensitive(true);
                v
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_authorization() {
        let v = HeaderValue::from_static("Bearer abc.def.ghi");
        assert_eq!(Token::from_authorization(&v), Some(Token::new("abc.def.ghi")));

        assert_eq!(Token::from_authorization(&HeaderValue::from_static("abc")), None);
        assert_eq!(Token::from_authorization(&HeaderValue::from_static("Bearer ")), None);
    }

    #[test]
    fn header_round_trip() {
        let token = Token::new("t0k3n");
        let header = token.authorization().unwrap();
        assert_eq!(header, "Bearer t0k3n");
        assert!(header.is_sensitive());
        assert_eq!(Token::from_authorization(&header), Some(token));
    }

    #[test]
    fn debug_is_redacted() {
        assert_eq!(format!("{:?}", Token::new("secret")), "Token(<redacted>)");
    }
}
