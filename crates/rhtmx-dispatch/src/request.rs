// File: src/request.rs
// Purpose: Incoming request representation and the per-request routing context

use std::borrow::Cow;
use std::collections::HashMap;

use crate::config::Config;
use crate::path::{PathCursor, PathState};
use crate::response::Response;

/// Request fields handed over by the transport layer.
///
/// `script_name` / `path_info` are the already-consumed and not-yet-consumed
/// halves of the path (CGI `SCRIPT_NAME` / `PATH_INFO`). At top-level entry
/// `script_name` is normally empty. The body is opaque to the matcher.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: String,
    pub script_name: String,
    pub path_info: String,
    pub query_string: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    /// Creates a request for `method` and `path`; the method is uppercased.
    ///
    /// A `?` in `path` splits off the query string.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_dispatch::Request;
    ///
    /// let req = Request::new("get", "/signup?email=a%40b.c");
    /// assert_eq!(req.method, "GET");
    /// assert_eq!(req.path_info, "/signup");
    /// assert_eq!(req.query_string, "email=a%40b.c");
    /// ```
    pub fn new(method: impl AsRef<str>, path: impl AsRef<str>) -> Self {
        let (path_info, query_string) = match path.as_ref().split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (path.as_ref().to_string(), String::new()),
        };

        Self {
            method: method.as_ref().to_ascii_uppercase(),
            path_info,
            query_string,
            ..Self::default()
        }
    }

    pub fn get(path: impl AsRef<str>) -> Self {
        Self::new("GET", path)
    }

    pub fn with_script_name(mut self, script_name: impl Into<String>) -> Self {
        self.script_name = script_name.into();
        self
    }

    pub fn with_query(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = query_string.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

// ============================================================================
// Query
// ============================================================================

/// Query parameters parsed once from the query string (key → values).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: HashMap<String, Vec<String>>,
}

impl Query {
    /// Parses `a=1&b=2&b=3` style query strings.
    ///
    /// Keys without `=` map to an empty value. Percent escapes are decoded;
    /// sequences that are not valid UTF-8 are kept verbatim.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_dispatch::request::Query;
    ///
    /// let query = Query::parse("email=john%40doe.com&tag=a&tag=b&flag", true);
    /// assert_eq!(query.get("email"), Some("john@doe.com"));
    /// assert_eq!(query.values("tag"), ["a", "b"]);
    /// assert_eq!(query.get("flag"), Some(""));
    /// assert_eq!(query.get("missing"), None);
    /// ```
    pub fn parse(query_string: &str, plus_as_space: bool) -> Self {
        let mut params: HashMap<String, Vec<String>> = HashMap::new();

        for pair in query_string.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(key, plus_as_space);
            if key.is_empty() {
                continue;
            }
            params
                .entry(key)
                .or_default()
                .push(decode_component(value, plus_as_space));
        }

        Self { params }
    }

    /// The last value given for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Every value given for `key`, in order.
    pub fn values(&self, key: &str) -> &[String] {
        self.params.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

fn decode_component(raw: &str, plus_as_space: bool) -> String {
    let raw: Cow<'_, str> = if plus_as_space && raw.contains('+') {
        Cow::Owned(raw.replace('+', " "))
    } else {
        Cow::Borrowed(raw)
    };

    let decoded = urlencoding::decode(&raw).map(Cow::into_owned);
    decoded.unwrap_or_else(|_| raw.into_owned())
}

// ============================================================================
// Headers
// ============================================================================

/// Request headers with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: HashMap<String, String>,
}

impl Headers {
    pub fn new<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries = headers
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_ascii_lowercase(), value.into()))
            .collect();

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

// ============================================================================
// Routing Context
// ============================================================================

/// Per-request state threaded through a route tree walk.
///
/// The method, query and headers are fixed at creation. The path state is
/// mutated only by matchers (and restored by them); the response is written
/// by handler blocks.
#[derive(Debug, Clone)]
pub struct RoutingContext {
    method: String,
    path: PathState,
    query: Query,
    headers: Headers,
    body: Vec<u8>,
    response: Response,
}

impl RoutingContext {
    pub fn new(request: Request) -> Self {
        Self::with_config(request, &Config::default())
    }

    pub fn with_config(request: Request, config: &Config) -> Self {
        let Request {
            method,
            script_name,
            path_info,
            query_string,
            headers,
            body,
        } = request;

        Self {
            method,
            path: PathState::new(&script_name, &path_info),
            query: Query::parse(&query_string, config.query.plus_as_space),
            headers: Headers::new(headers),
            body,
            response: Response::new(
                config.response.default_status,
                &config.response.content_type,
            ),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &PathState {
        &self.path
    }

    pub fn path_mut(&mut self) -> &mut PathState {
        &mut self.path
    }

    /// `SCRIPT_NAME` view of the path state.
    pub fn script_name(&self) -> &str {
        self.path.consumed()
    }

    /// `PATH_INFO` view of the path state.
    pub fn path_info(&self) -> &str {
        self.path.remaining()
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Appends a chunk to the response body.
    pub fn write(&mut self, chunk: impl Into<String>) {
        self.response.write(chunk);
    }

    pub fn into_response(self) -> Response {
        self.response
    }
}

impl PathCursor for RoutingContext {
    fn path_state(&self) -> &PathState {
        &self.path
    }

    fn path_state_mut(&mut self) -> &mut PathState {
        &mut self.path
    }
}
