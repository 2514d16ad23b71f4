//! HTTP verbs recognized by verb operators
//!
//! Each verb operator stores one [`Verb`] and compares it against the
//! request method. The check consumes no path and yields no captures.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Trace,
    Connect,
}

impl Verb {
    /// Every known verb with its wire name.
    pub const TABLE: [(Verb, &'static str); 9] = [
        (Verb::Get, "GET"),
        (Verb::Head, "HEAD"),
        (Verb::Post, "POST"),
        (Verb::Put, "PUT"),
        (Verb::Patch, "PATCH"),
        (Verb::Delete, "DELETE"),
        (Verb::Options, "OPTIONS"),
        (Verb::Trace, "TRACE"),
        (Verb::Connect, "CONNECT"),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Head => "HEAD",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Options => "OPTIONS",
            Verb::Trace => "TRACE",
            Verb::Connect => "CONNECT",
        }
    }

    /// Whether `method` (an uppercase request method) is this verb.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_dispatch::Verb;
    ///
    /// assert!(Verb::Get.matches("GET"));
    /// assert!(!Verb::Get.matches("POST"));
    /// assert!(!Verb::Get.matches("get"));
    /// ```
    pub fn matches(&self, method: &str) -> bool {
        self.as_str() == method
    }
}

impl FromStr for Verb {
    type Err = UnknownVerb;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::TABLE
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s))
            .map(|(verb, _)| *verb)
            .ok_or_else(|| UnknownVerb(s.to_string()))
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A method name outside [`Verb::TABLE`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown HTTP verb `{0}`")]
pub struct UnknownVerb(pub String);
