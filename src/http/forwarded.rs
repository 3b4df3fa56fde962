//! Tower adapter running a [`RequestHook`] before the application.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use tower::{Layer, Service};

use crate::normalize::RequestHook;
use crate::variables::names::{HTTP_X_FORWARDED_FOR, HTTP_X_FORWARDED_PROTO, X_REQUESTED_WITH};
use crate::variables::{TransportVariables, VariableBag};

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
const X_REQUESTED_WITH_HEADER: HeaderName = HeaderName::from_static("x-requested-with");

/// Layer that invokes the begin-request hook on each request's bag.
///
/// Must sit inside [`TransportVariablesLayer`](crate::http::TransportVariablesLayer).
#[derive(Clone)]
pub struct ForwardedHeadersLayer {
    hook: Arc<dyn RequestHook<TransportVariables>>,
    sync_request_headers: bool,
}

impl ForwardedHeadersLayer {
    pub fn new(hook: Arc<dyn RequestHook<TransportVariables>>, sync_request_headers: bool) -> Self {
        Self {
            hook,
            sync_request_headers,
        }
    }
}

impl<S> Layer<S> for ForwardedHeadersLayer {
    type Service = ForwardedHeaders<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ForwardedHeaders {
            inner,
            hook: Arc::clone(&self.hook),
            sync_request_headers: self.sync_request_headers,
        }
    }
}

/// Service created by [`ForwardedHeadersLayer`].
#[derive(Clone)]
pub struct ForwardedHeaders<S> {
    inner: S,
    hook: Arc<dyn RequestHook<TransportVariables>>,
    sync_request_headers: bool,
}

impl<S, ReqBody> Service<Request<ReqBody>> for ForwardedHeaders<S>
where
    S: Service<Request<ReqBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let (mut parts, body) = req.into_parts();

        match parts.extensions.get_mut::<TransportVariables>() {
            Some(vars) => {
                self.hook.begin_request(vars);
                if self.sync_request_headers {
                    sync_headers(&mut parts.headers, vars);
                }
            }
            None => {
                tracing::warn!(
                    uri = %parts.uri,
                    "Request has no transport variables; forwarded headers left untouched"
                );
            }
        }

        self.inner.call(Request::from_parts(parts, body))
    }
}

/// Mirror the normalized bag onto the request headers.
fn sync_headers(headers: &mut HeaderMap, vars: &TransportVariables) {
    match vars.get(HTTP_X_FORWARDED_FOR) {
        Some(chain) => match HeaderValue::from_str(chain) {
            Ok(value) => {
                headers.insert(X_FORWARDED_FOR, value);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Forwarded-for chain is not a valid header value");
            }
        },
        None => {
            headers.remove(X_FORWARDED_FOR);
        }
    }

    if vars.get(HTTP_X_FORWARDED_PROTO).is_none() {
        headers.remove(X_FORWARDED_PROTO);
    }

    if let Some(requested_with) = vars.get(X_REQUESTED_WITH) {
        if !headers.contains_key(&X_REQUESTED_WITH_HEADER) {
            if let Ok(value) = HeaderValue::from_str(requested_with) {
                headers.insert(X_REQUESTED_WITH_HEADER, value);
            }
        }
    }
}
