//! A trait alias for [`Service`](tower_service::Service).

use std::error;
use std::future::Future;
use std::task::{Context, Poll};

use futures_util::future::poll_fn;
use http::response::Parts;
use http::{Request, Response};
use http_body::Body;
use tower_service::Service;

use crate::error::Error;
use crate::util;

use private::Sealed;

/// An HTTP client (like [`hyper::Client`](hyper_pkg::client::Client)).
///
/// This is just an alias for [`tower_service::Service`](tower_service::Service)
/// introduced to reduce the number of type parameters on `Client` and
/// `ReverseGeocoder`.
pub trait HttpService<B>: Sealed<B> {
    /// Body of the responses given by the service.
    type ResponseBody: Body;
    type Error;
    type Future: Future<Output = Result<Response<Self::ResponseBody>, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>>;

    fn call(&mut self, req: Request<B>) -> Self::Future;
}

impl<S, ReqB, ResB> HttpService<ReqB> for S
where
    S: Service<Request<ReqB>, Response = Response<ResB>> + ?Sized,
    ResB: Body,
{
    type ResponseBody = ResB;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), S::Error>> {
        Service::poll_ready(self, cx)
    }

    fn call(&mut self, req: Request<ReqB>) -> S::Future {
        Service::call(self, req)
    }
}

/// Sends `req` on a clone of `service` once it is ready, and reads the whole response body.
///
/// The status code is not checked here.
pub(crate) async fn round_trip<S, B>(
    service: &S,
    req: Request<B>,
) -> Result<(Parts, Vec<u8>), Error<S::Error>>
where
    S: HttpService<B> + Clone,
    <S::ResponseBody as Body>::Error: Into<Box<dyn error::Error + Send + Sync>>,
{
    let mut service = service.clone();
    poll_fn(|cx| HttpService::poll_ready(&mut service, cx))
        .await
        .map_err(Error::Service)?;
    let res = HttpService::call(&mut service, req).await.map_err(Error::Service)?;
    let (parts, body) = res.into_parts();
    let body = util::read_body(body)
        .await
        .map_err(|e| Error::Body(e.into()))?;
    Ok((parts, body))
}

mod private {
    use http::{Request, Response};
    use http_body::Body;
    use tower_service::Service;

    pub trait Sealed<B> {}

    impl<S, ReqB, ResB> Sealed<ReqB> for S
    where
        S: Service<Request<ReqB>, Response = Response<ResB>> + ?Sized,
        ResB: Body,
    {
    }
}
