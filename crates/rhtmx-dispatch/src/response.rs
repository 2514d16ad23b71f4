// File: src/response.rs
// Purpose: Response accumulator written by handler blocks

/// Status, headers and body length captured by [`Response::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    status: u16,
    headers: Vec<(String, String)>,
    chunks: usize,
}

/// Ordered body chunks, headers and a status code.
///
/// Handlers append to the body with [`Response::write`]; the dispatcher sets
/// the not-found status when a walk ends without a terminal reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<String>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new(200, "text/html; charset=utf-8")
    }
}

impl Response {
    pub fn new(status: u16, content_type: &str) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: Vec::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Appends a chunk to the body.
    pub fn write(&mut self, chunk: impl Into<String>) {
        self.body.push(chunk.into());
    }

    /// The body chunks in write order.
    pub fn chunks(&self) -> &[String] {
        &self.body
    }

    /// The body chunks joined together.
    pub fn body(&self) -> String {
        self.body.concat()
    }

    /// Returns a header value (case-insensitive name lookup).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Sets a header, replacing any existing value with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self
            .headers
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    /// Removes a header (case-insensitive name match).
    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn snapshot(&self) -> ResponseSnapshot {
        ResponseSnapshot {
            status: self.status,
            headers: self.headers.clone(),
            chunks: self.body.len(),
        }
    }

    /// Puts status and headers back and drops chunks written since
    /// `snapshot` was taken.
    pub fn restore(&mut self, snapshot: ResponseSnapshot) {
        self.status = snapshot.status;
        self.headers = snapshot.headers;
        self.body.truncate(snapshot.chunks);
    }

    /// Consumes the accumulator, adding `Content-Length`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_dispatch::Response;
    ///
    /// let mut response = Response::default();
    /// response.write("Hello, ");
    /// response.write("World");
    ///
    /// let (status, headers, body) = response.finish();
    /// assert_eq!(status, 200);
    /// assert!(headers.contains(&("Content-Length".to_string(), "12".to_string())));
    /// assert_eq!(body, vec!["Hello, ", "World"]);
    /// ```
    pub fn finish(mut self) -> (u16, Vec<(String, String)>, Vec<String>) {
        let length: usize = self.body.iter().map(String::len).sum();
        self.set_header("Content-Length", length.to_string());
        (self.status, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_response() {
        let response = Response::default();
        assert_eq!(response.status(), 200);
        assert_eq!(response.header("content-type"), Some("text/html; charset=utf-8"));
        assert_eq!(response.body(), "");
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut response = Response::default();
        response.set_header("content-type", "text/css");
        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.header("Content-Type"), Some("text/css"));
    }

    #[test]
    fn test_restore_drops_later_writes() {
        let mut response = Response::default();
        response.write("kept");
        let snapshot = response.snapshot();

        response.set_status(500);
        response.set_header("X-Debug", "1");
        response.write("leak");
        response.restore(snapshot);

        assert_eq!(response.status(), 200);
        assert_eq!(response.header("x-debug"), None);
        assert_eq!(response.body(), "kept");
    }

    #[test]
    fn test_remove_header() {
        let mut response = Response::default();
        response.remove_header("content-type");
        assert!(response.headers().is_empty());
    }

    #[test]
    fn test_finish_counts_bytes() {
        let mut response = Response::new(404, "text/plain");
        response.write("é");
        let (status, headers, _) = response.finish();
        assert_eq!(status, 404);
        assert!(headers.contains(&("Content-Length".to_string(), "2".to_string())));
    }
}
