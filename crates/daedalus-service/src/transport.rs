//! Hyper connection adapter.
//!
//! The dispatcher itself never touches sockets. [`DispatchService`] bridges
//! it to hyper so callers can mount a [`Service`] on whatever connection
//! loop they run, for example `hyper_util::server::conn::auto`.

use std::convert::Infallible;

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;

use daedalus_core::BoxFuture;

use crate::mux::BoxError;
use crate::service::Service;

/// Adapts a [`Service`] to hyper's per-connection service contract.
///
/// Every call boxes the incoming body and hands the request to
/// [`Service::handle`]. Dispatch never fails at the transport level;
/// errors surface as JSON error responses.
#[derive(Debug, Clone)]
pub struct DispatchService {
    service: Service,
}

impl DispatchService {
    /// Wraps a service for mounting on a hyper connection.
    #[must_use]
    pub const fn new(service: Service) -> Self {
        Self { service }
    }

    /// The wrapped service.
    #[must_use]
    pub const fn service(&self) -> &Service {
        &self.service
    }
}

impl hyper::service::Service<Request<Incoming>> for DispatchService {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn call(&self, request: Request<Incoming>) -> Self::Future {
        let service = self.service.clone();
        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let body = body.map_err(|err| Box::new(err) as BoxError).boxed();
            Ok(service.handle(Request::from_parts(parts, body)).await)
        })
    }
}
