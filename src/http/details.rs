//! Diagnostic handlers dumping what the application sees.

use std::fmt;

use axum::extract::rejection::FormRejection;
use axum::extract::{Extension, Query};
use axum::http::{header, HeaderMap, Method};
use axum::response::IntoResponse;
use axum::{Form, Json};
use serde::Serialize;

use crate::variables::names::{HTTPS, PATH_INFO, QUERY_STRING, REMOTE_ADDR, SERVER_NAME, SERVER_PORT};
use crate::variables::{ReadOnlyToggle, TransportVariables, VariableBag};

type Pairs = Vec<(String, String)>;

/// Request as observed after normalization.
#[derive(Debug, Serialize)]
pub struct RequestDetails {
    pub url: String,
    pub secure: bool,
    pub remote_addr: Option<String>,
    pub path: String,
    /// Whether the bag handed to the application is read-only.
    pub read_only: bool,
    pub variables: TransportVariables,
    pub headers: Pairs,
    pub query: Pairs,
    pub form: Pairs,
    pub cookies: Pairs,
}

impl RequestDetails {
    pub fn collect(variables: TransportVariables, headers: &HeaderMap, query: Pairs, form: Pairs) -> Self {
        let cookies = cookies(headers);
        let headers = headers
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        Self {
            url: request_url(&variables),
            secure: is_secure(&variables),
            remote_addr: variables.get(REMOTE_ADDR).map(str::to_owned),
            path: variables.get(PATH_INFO).unwrap_or("/").to_string(),
            read_only: variables.is_read_only(),
            variables,
            headers,
            query,
            form,
            cookies,
        }
    }
}

impl fmt::Display for RequestDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "### Request")?;
        writeln!(f, "Url: {}", self.url)?;
        writeln!(f, "Secure: {}", self.secure)?;
        writeln!(f, "Remote address: {}", self.remote_addr.as_deref().unwrap_or("unknown"))?;
        writeln!(f, "Path: {}", self.path)?;
        writeln!(f, "Read-only variables: {}", self.read_only)?;
        writeln!(f)?;

        writeln!(f, "### Transport variables")?;
        for (name, value) in self.variables.iter() {
            writeln!(f, "{name}: {value}")?;
        }
        writeln!(f)?;

        write_section(f, "Request headers", &self.headers)?;
        writeln!(f)?;

        write_section(f, "Query string", &self.query)?;
        writeln!(f)?;
        write_section(f, "Form variables", &self.form)?;
        writeln!(f)?;
        write_section(f, "Cookies", &self.cookies)
    }
}

fn write_section(f: &mut fmt::Formatter<'_>, title: &str, pairs: &[(String, String)]) -> fmt::Result {
    writeln!(f, "### {title}")?;
    for (name, value) in pairs {
        writeln!(f, "{name}: {value}")?;
    }
    Ok(())
}

/// Split every `Cookie` header line into `name=value` pairs.
fn cookies(headers: &HeaderMap) -> Pairs {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|line| line.to_str().ok())
        .flat_map(|line| line.split(';'))
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (name.trim().to_string(), value.trim().to_string())
        })
        .collect()
}

/// Fields of an url-encoded body. GET and HEAD carry none.
fn posted_form(method: &Method, form: Result<Form<Pairs>, FormRejection>) -> Pairs {
    if method == Method::GET || method == Method::HEAD {
        return Vec::new();
    }
    match form {
        Ok(Form(fields)) => fields,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Request body is not a form");
            Vec::new()
        }
    }
}

fn is_secure(vars: &TransportVariables) -> bool {
    vars.get(HTTPS)
        .map(|v| v.eq_ignore_ascii_case("on"))
        .unwrap_or(false)
}

/// Absolute URL as the client addressed it; default ports are omitted.
pub fn request_url(vars: &TransportVariables) -> String {
    let secure = is_secure(vars);
    let scheme = if secure { "https" } else { "http" };
    let host = vars.get(SERVER_NAME).unwrap_or("localhost");
    let port = match (vars.get(SERVER_PORT), secure) {
        (Some("443"), true) | (Some("80"), false) | (None, _) => String::new(),
        (Some(port), _) => format!(":{port}"),
    };
    let path = vars.get(PATH_INFO).unwrap_or("/");
    let query = match vars.get(QUERY_STRING) {
        Some(q) if !q.is_empty() => format!("?{q}"),
        _ => String::new(),
    };
    format!("{scheme}://{host}{port}{path}{query}")
}

/// Plain-text dump of the normalized request.
pub async fn request_details(
    Extension(vars): Extension<TransportVariables>,
    Query(query): Query<Pairs>,
    method: Method,
    headers: HeaderMap,
    form: Result<Form<Pairs>, FormRejection>,
) -> impl IntoResponse {
    let form = posted_form(&method, form);
    let details = RequestDetails::collect(vars, &headers, query, form);
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        details.to_string(),
    )
}

/// JSON dump of the normalized request.
pub async fn request_details_json(
    Extension(vars): Extension<TransportVariables>,
    Query(query): Query<Pairs>,
    method: Method,
    headers: HeaderMap,
    form: Result<Form<Pairs>, FormRejection>,
) -> Json<RequestDetails> {
    let form = posted_form(&method, form);
    Json(RequestDetails::collect(vars, &headers, query, form))
}

/// Fails the request with a panic; the server answers 500 and keeps serving.
pub async fn intentional_error() -> &'static str {
    tracing::warn!("Failing request on purpose");
    panic!("request failed on purpose")
}

/// Fallback for every other path.
pub async fn greeting() -> &'static str {
    "forwarded-normalizer: request details at /_details\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(entries: &[(&str, &str)]) -> TransportVariables {
        let mut vars = TransportVariables::new();
        for (name, value) in entries {
            vars.set(name, value).unwrap();
        }
        vars
    }

    #[test]
    fn default_ports_are_hidden() {
        let secure = vars(&[
            (HTTPS, "on"),
            (SERVER_NAME, "example.com"),
            (SERVER_PORT, "443"),
            (PATH_INFO, "/cart"),
        ]);
        assert_eq!(request_url(&secure), "https://example.com/cart");

        let plain = vars(&[
            (HTTPS, "off"),
            (SERVER_NAME, "example.com"),
            (SERVER_PORT, "80"),
            (PATH_INFO, "/"),
            (QUERY_STRING, "a=1"),
        ]);
        assert_eq!(request_url(&plain), "http://example.com/?a=1");
    }

    #[test]
    fn balancer_port_is_visible_before_normalization() {
        let internal = vars(&[
            (HTTPS, "off"),
            (SERVER_NAME, "example.com"),
            (SERVER_PORT, "8080"),
            (PATH_INFO, "/"),
        ]);
        assert_eq!(request_url(&internal), "http://example.com:8080/");
    }

    fn pair(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn text_dump_lists_sections() {
        let details = RequestDetails::collect(
            vars(&[(REMOTE_ADDR, "203.0.113.7"), (HTTPS, "on")]),
            &HeaderMap::new(),
            vec![pair("q", "rust")],
            vec![pair("item", "42")],
        );

        let text = details.to_string();
        assert!(text.contains("Remote address: 203.0.113.7"));
        assert!(text.contains("Secure: true"));
        assert!(text.contains("Read-only variables: false"));
        assert!(text.contains("### Transport variables\nREMOTE_ADDR: 203.0.113.7\nHTTPS: on\n"));
        assert!(text.contains("### Query string\nq: rust\n"));
        assert!(text.contains("### Form variables\nitem: 42\n"));
        assert!(text.ends_with("### Cookies\n"));
    }

    #[test]
    fn cookie_lines_are_split_into_pairs() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, "session=abc; theme=dark".parse().unwrap());
        headers.append(header::COOKIE, "flag; ;lang = en".parse().unwrap());

        assert_eq!(
            cookies(&headers),
            vec![
                pair("session", "abc"),
                pair("theme", "dark"),
                pair("flag", ""),
                pair("lang", "en"),
            ]
        );
    }

    #[test]
    fn get_requests_have_no_form() {
        let query_as_form = Ok(Form(vec![pair("q", "rust")]));
        assert!(posted_form(&Method::GET, query_as_form).is_empty());

        let posted = Ok(Form(vec![pair("item", "42")]));
        assert_eq!(posted_form(&Method::POST, posted), vec![pair("item", "42")]);
    }
}
