//! Builds the per-request transport variable bag.
//!
//! # Responsibilities
//! - Derive CGI-style variables from connection info and request line
//! - Expose every request header as `HTTP_<NAME>`
//! - Hand the bag to later layers read-only, through request extensions

use std::net::SocketAddr;
use std::str::FromStr;
use std::task::{Context, Poll};

use axum::extract::ConnectInfo;
use axum::http::{header, uri::Authority, Request};
use tower::{Layer, Service};

use crate::normalize::chain::SEPARATOR;
use crate::variables::names::{
    header_variable, HTTPS, PATH_INFO, QUERY_STRING, REMOTE_ADDR, REMOTE_PORT, REQUEST_METHOD,
    SERVER_NAME, SERVER_PORT, SERVER_PORT_SECURE, SERVER_PROTOCOL,
};
use crate::variables::{ReadOnlyToggle, TransportVariables, VariableBag, VariablesError};

/// Layer that attaches a read-only [`TransportVariables`] bag to each request.
#[derive(Debug, Clone, Copy)]
pub struct TransportVariablesLayer {
    local_addr: SocketAddr,
}

impl TransportVariablesLayer {
    /// `local_addr` is the address the listener is bound to.
    pub fn new(local_addr: SocketAddr) -> Self {
        Self { local_addr }
    }
}

impl<S> Layer<S> for TransportVariablesLayer {
    type Service = TransportVariablesService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TransportVariablesService {
            inner,
            local_addr: self.local_addr,
        }
    }
}

/// Service created by [`TransportVariablesLayer`].
#[derive(Debug, Clone)]
pub struct TransportVariablesService<S> {
    inner: S,
    local_addr: SocketAddr,
}

impl<S, ReqBody> Service<Request<ReqBody>> for TransportVariablesService<S>
where
    S: Service<Request<ReqBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let remote = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let vars = build_variables(&req, remote, self.local_addr);
        req.extensions_mut().insert(vars);
        self.inner.call(req)
    }
}

/// Build a read-only bag describing `req` as received on `local`.
pub fn build_variables<B>(
    req: &Request<B>,
    remote: Option<SocketAddr>,
    local: SocketAddr,
) -> TransportVariables {
    let mut vars = TransportVariables::new();
    if let Err(e) = populate(&mut vars, req, remote, local) {
        tracing::warn!(error = %e, "Incomplete transport variables");
    }
    vars.set_read_only(true);
    vars
}

fn populate<B>(
    vars: &mut TransportVariables,
    req: &Request<B>,
    remote: Option<SocketAddr>,
    local: SocketAddr,
) -> Result<(), VariablesError> {
    if let Some(remote) = remote {
        vars.set(REMOTE_ADDR, &remote.ip().to_string())?;
        vars.set(REMOTE_PORT, &remote.port().to_string())?;
    }

    vars.set(SERVER_NAME, &server_name(req, local))?;
    vars.set(SERVER_PORT, &local.port().to_string())?;
    vars.set(HTTPS, "off")?;
    vars.set(SERVER_PORT_SECURE, "0")?;
    vars.set(SERVER_PROTOCOL, &format!("{:?}", req.version()))?;
    vars.set(REQUEST_METHOD, req.method().as_str())?;
    vars.set(PATH_INFO, req.uri().path())?;
    vars.set(QUERY_STRING, req.uri().query().unwrap_or_default())?;

    for (name, value) in req.headers() {
        let value = String::from_utf8_lossy(value.as_bytes());
        vars.append(&header_variable(name.as_str()), &value, SEPARATOR)?;
    }
    Ok(())
}

/// Host from the request target or `Host` header, without port.
fn server_name<B>(req: &Request<B>, local: SocketAddr) -> String {
    if let Some(host) = req.uri().host() {
        return host.to_string();
    }

    req.headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| Authority::from_str(h).ok())
        .map(|authority| authority.host().to_string())
        .unwrap_or_else(|| local.ip().to_string())
}
