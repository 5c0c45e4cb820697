use std::fmt::{self, Display, Formatter};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes};
use futures_core::Stream;
use futures_util::{future, TryStreamExt};
use http_body::Body;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use pin_project_lite::pin_project;
use rand::Rng;
use serde::de::{Deserialize, Deserializer};

/// Creates an enum with `AsRef<str>` impl.
macro_rules! str_enum {
    (
        $(#[$attr:meta])*
        pub enum $E:ident {
            $(
                $(#[$v_attr:meta])*
                $V:ident = $by:expr
            ),*$(,)?
        }
    ) => {
        $(#[$attr])*
        pub enum $E {
            $(
                $(#[$v_attr])*
                $V,
            )*
        }

        impl std::convert::AsRef<str> for $E {
            fn as_ref(&self) -> &str {
                match *self {
                    $($E::$V => $by,)*
                }
            }
        }
    }
}

pin_project! {
    /// Wraps `http_body::Body` to make it a `Stream`.
    pub struct HttpBodyAsStream<B> {
        #[pin]
        pub inner: B,
    }
}

impl<B: Body> HttpBodyAsStream<B> {
    pub fn new(inner: B) -> Self {
        HttpBodyAsStream { inner }
    }
}

impl<B: Body> Stream for HttpBodyAsStream<B> {
    type Item = Result<Bytes, B::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_data(cx).map(|opt| {
            opt.map(|result| result.map(|mut buf| buf.copy_to_bytes(buf.remaining())))
        })
    }
}

/// Reads a whole response body into memory.
pub async fn read_body<B: Body>(body: B) -> Result<Vec<u8>, B::Error> {
    HttpBodyAsStream::new(body)
        .try_fold(Vec::new(), |mut buf, chunk| {
            buf.extend_from_slice(&chunk);
            future::ok(buf)
        })
        .await
}

/// Characters left unescaped in query components (RFC 3986 unreserved set).
const QUERY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A `key=value&...` query string, percent-encoded when displayed.
pub struct Query<'a>(pub &'a [(&'a str, String)]);

impl<'a> Display for Query<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut iter = self.0.iter();
        if let Some((k, v)) = iter.next() {
            fmt_pair(k, v, f)?;
            for (k, v) in iter {
                f.write_str("&")?;
                fmt_pair(k, v, f)?;
            }
        }
        Ok(())
    }
}

fn fmt_pair(key: &str, value: &str, f: &mut Formatter<'_>) -> fmt::Result {
    write!(
        f,
        "{}={}",
        utf8_percent_encode(key, QUERY),
        utf8_percent_encode(value, QUERY)
    )
}

/// Builds a `multipart/form-data` request body.
pub struct Multipart {
    boundary: String,
    body: Vec<u8>,
}

impl Multipart {
    pub fn new() -> Self {
        Multipart {
            boundary: format!("----unoffimap{}", random_base36(24)),
            body: Vec::new(),
        }
    }

    pub fn text(&mut self, name: &str, value: &str) -> &mut Self {
        self.open_part();
        self.body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn file(
        &mut self,
        name: &str,
        file_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> &mut Self {
        self.open_part();
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: {}\r\n\r\n",
                name,
                file_name.replace('"', "%22"),
                content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Returns the `Content-Type` header value and the encoded body.
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        let content_type = format!("multipart/form-data; boundary={}", self.boundary);
        (content_type, self.body)
    }

    fn open_part(&mut self) {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
    }
}

impl Default for Multipart {
    fn default() -> Self {
        Multipart::new()
    }
}

/// A random string of `len` lowercase base-36 digits.
pub fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| std::char::from_digit(rng.gen_range(0..36), 36).unwrap_or('0'))
        .collect()
}

/// Deserializes `null` as `T::default()`.
pub fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Option::unwrap_or_default)
}

/// Deserializes an optional identifier sent either as a string or as a number.
pub fn string_or_number<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Id>::deserialize(d)?.map(|id| match id {
        Id::Str(s) => s,
        Id::Int(n) => n.to_string(),
        Id::Float(n) => n.to_string(),
    }))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn query_encoding() {
        let q = Query(&[("prefix", "카페 bar".to_owned()), ("lat", 37.5.to_string())]).to_string();
        assert_eq!(q, "prefix=%EC%B9%B4%ED%8E%98%20bar&lat=37.5");
        assert_eq!(Query(&[]).to_string(), "");
    }

    #[test]
    fn multipart_layout() {
        let mut form = Multipart::new();
        form.text("placeTitle", "Namsan")
            .file("placeImageURL", "a.jpg", "image/jpeg", b"\xff\xd8");
        let boundary = form.boundary.clone();
        let (content_type, body) = form.finish();

        assert_eq!(
            content_type,
            format!("multipart/form-data; boundary={}", boundary)
        );
        let body = String::from_utf8_lossy(&body);
        assert!(body.starts_with(&format!("--{}\r\n", boundary)));
        assert!(body.contains("name=\"placeTitle\"\r\n\r\nNamsan\r\n"));
        assert!(body.contains("filename=\"a.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"));
        assert!(body.ends_with(&format!("--{}--\r\n", boundary)));
    }

    #[test]
    fn base36_keys() {
        let key = random_base36(8);
        assert_eq!(key.len(), 8);
        assert!(key.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn ids_as_strings() {
        #[derive(serde::Deserialize)]
        struct T {
            #[serde(default, deserialize_with = "string_or_number")]
            id: Option<String>,
        }

        let parse = |s| serde_json::from_str::<T>(s).unwrap().id;
        assert_eq!(parse(r#"{"id":"kim"}"#).as_deref(), Some("kim"));
        assert_eq!(parse(r#"{"id":42}"#).as_deref(), Some("42"));
        assert_eq!(parse(r#"{"id":null}"#), None);
        assert_eq!(parse("{}"), None);
    }

    #[test]
    fn body_is_collected() {
        let body = hyper_pkg::Body::from("hello world");
        let bytes = futures::executor::block_on(read_body(body)).unwrap();
        assert_eq!(bytes, b"hello world");
    }
}
