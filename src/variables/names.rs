//! Canonical transport variable names.

pub const REMOTE_ADDR: &str = "REMOTE_ADDR";
pub const REMOTE_PORT: &str = "REMOTE_PORT";
pub const SERVER_NAME: &str = "SERVER_NAME";
pub const SERVER_PORT: &str = "SERVER_PORT";
pub const SERVER_PORT_SECURE: &str = "SERVER_PORT_SECURE";
pub const SERVER_PROTOCOL: &str = "SERVER_PROTOCOL";
pub const HTTPS: &str = "HTTPS";
pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
pub const PATH_INFO: &str = "PATH_INFO";
pub const QUERY_STRING: &str = "QUERY_STRING";

/// Original client chain, appended to by every hop.
pub const HTTP_X_FORWARDED_FOR: &str = "HTTP_X_FORWARDED_FOR";
/// Scheme the client used to reach the balancer.
pub const HTTP_X_FORWARDED_PROTO: &str = "HTTP_X_FORWARDED_PROTO";
pub const HTTP_X_REQUESTED_WITH: &str = "HTTP_X_REQUESTED_WITH";

/// Conventional header casing that application code inspects for AJAX requests.
pub const X_REQUESTED_WITH: &str = "X-Requested-With";

/// Prefix used for variables derived from request headers.
pub const HTTP_PREFIX: &str = "HTTP_";

/// Converts a header name into its variable name (`x-forwarded-for` → `HTTP_X_FORWARDED_FOR`).
pub fn header_variable(header: &str) -> String {
    let mut name = String::with_capacity(HTTP_PREFIX.len() + header.len());
    name.push_str(HTTP_PREFIX);
    name.extend(header.chars().map(|c| match c {
        '-' => '_',
        c => c.to_ascii_uppercase(),
    }));
    name
}
