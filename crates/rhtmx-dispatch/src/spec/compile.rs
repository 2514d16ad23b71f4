// File: src/spec/compile.rs
// Purpose: Compile author matcher expressions into immutable matchers

use std::ops::Range;

use regex::Regex;
use tracing::trace;

use super::pattern::{expand_placeholders, placeholder_names, SEGMENT_GROUP};
use super::{Condition, MatchOption, Spec};
use crate::error::CompileError;

/// A compiled matcher, built once with the route tree and shared read-only by
/// every request.
#[derive(Debug, Clone)]
pub struct Matcher {
    pub(crate) kind: MatcherKind,
    label: String,
}

#[derive(Debug, Clone)]
pub(crate) enum MatcherKind {
    /// Consumes whole segments from the front of the remaining path.
    Path(PathMatcher),
    Param(String),
    Header(String),
    Accept(String),
    Always,
    Never,
    Condition(Condition),
    Any(Vec<Alternative>),
    Seq(Vec<MatcherKind>),
}

/// Anchored path regex of the form `\A/(<fragment>)<tail>`.
///
/// Group 1 is the consumed span (without its leading `/`); `captures` is the
/// range of groups reported to the block.
#[derive(Debug, Clone)]
pub(crate) struct PathMatcher {
    pub(crate) regex: Regex,
    pub(crate) captures: Range<usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct Alternative {
    pub(crate) kind: MatcherKind,
    /// String alternatives report the text they matched.
    pub(crate) captures_text: bool,
}

impl Matcher {
    /// Compiles a matcher expression, failing fast on author errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_dispatch::spec::{seg, Matcher, Spec};
    ///
    /// let matcher = Matcher::compile(&Spec::from(("user", seg()))).unwrap();
    /// assert_eq!(matcher.capture_count(), Some(1));
    ///
    /// assert!(Matcher::compile(&Spec::from("posts/(\\d+")).is_err());
    /// ```
    pub fn compile(spec: &Spec) -> Result<Self, CompileError> {
        let kind = compile_kind(spec)?;
        let label = spec.to_string();
        trace!(matcher = %label, "compiled matcher");
        Ok(Self { kind, label })
    }

    /// Human-readable form used in trace events.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of captures a successful match yields, when fixed.
    ///
    /// Alternations whose branches disagree have no fixed arity.
    pub fn capture_count(&self) -> Option<usize> {
        arity(&self.kind)
    }
}

fn arity(kind: &MatcherKind) -> Option<usize> {
    match kind {
        MatcherKind::Path(path) => Some(path.captures.len()),
        MatcherKind::Param(_) | MatcherKind::Header(_) => Some(1),
        MatcherKind::Accept(_)
        | MatcherKind::Always
        | MatcherKind::Never
        | MatcherKind::Condition(_) => Some(0),
        MatcherKind::Seq(items) => items.iter().map(arity).sum(),
        MatcherKind::Any(alternatives) => {
            let mut counts = alternatives
                .iter()
                .map(|alt| arity(&alt.kind).map(|n| n + usize::from(alt.captures_text)));
            let first = counts.next()?;
            counts.all(|count| count == first).then_some(first).flatten()
        }
    }
}

fn compile_kind(spec: &Spec) -> Result<MatcherKind, CompileError> {
    match spec {
        Spec::Pattern(pattern) => {
            let fragment = expand_placeholders(pattern);
            let names = placeholder_names(pattern);
            if !names.is_empty() {
                trace!(pattern = %pattern, placeholders = ?names, "expanded placeholders");
            }
            segment_matcher(&fragment, pattern)
        }
        Spec::Literal(text) => segment_matcher(&regex::escape(text), text),
        Spec::Segment => segment_matcher(SEGMENT_GROUP, ":segment"),
        Spec::Regex(source) => segment_matcher(source, source),
        Spec::Option { key, value } => match MatchOption::parse(key, value)? {
            MatchOption::Extension(ext) => extension_matcher(&ext),
            MatchOption::Param(name) => Ok(MatcherKind::Param(name)),
        },
        Spec::Header(name) => Ok(MatcherKind::Header(name.clone())),
        Spec::Accept(mime) => Ok(MatcherKind::Accept(mime.clone())),
        Spec::Any(specs) => specs
            .iter()
            .map(|spec| {
                Ok(Alternative {
                    kind: compile_kind(spec)?,
                    captures_text: matches!(spec, Spec::Pattern(_) | Spec::Literal(_)),
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()
            .map(MatcherKind::Any),
        Spec::Seq(specs) => specs
            .iter()
            .map(compile_kind)
            .collect::<Result<Vec<_>, CompileError>>()
            .map(MatcherKind::Seq),
        Spec::Bool(true) => Ok(MatcherKind::Always),
        Spec::Bool(false) => Ok(MatcherKind::Never),
        Spec::Condition(condition) => Ok(MatcherKind::Condition(condition.clone())),
    }
}

/// `\A/(fragment)(/|\z)`: the span must end at a `/` or at the end of the
/// path, and the trailing `/` is left in the remaining path.
fn segment_matcher(fragment: &str, source: &str) -> Result<MatcherKind, CompileError> {
    let regex = Regex::new(&format!(r"\A/({})(/|\z)", fragment))
        .map_err(|err| CompileError::invalid_pattern(source, err))?;

    // Group 0 is the whole match, group 1 the span, the last group the boundary
    let captures = 2..regex.captures_len() - 1;
    Ok(MatcherKind::Path(PathMatcher { regex, captures }))
}

/// File name at the final remaining segment; captures the stem.
fn extension_matcher(ext: &str) -> Result<MatcherKind, CompileError> {
    let regex = Regex::new(&format!(r"\A/(([^/]+?)\.{}\z)", regex::escape(ext)))
        .map_err(|err| CompileError::invalid_pattern(ext, err))?;

    Ok(MatcherKind::Path(PathMatcher {
        regex,
        captures: 2..3,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{cond, extension, param, re, seg};

    fn compile(spec: impl Into<Spec>) -> Matcher {
        Matcher::compile(&spec.into()).unwrap()
    }

    #[test]
    fn test_capture_arity() {
        assert_eq!(compile("home").capture_count(), Some(0));
        assert_eq!(compile(seg()).capture_count(), Some(1));
        assert_eq!(compile(r"posts/(\d+)-(.*)").capture_count(), Some(2));
        assert_eq!(compile("u/:uid/posts/:id").capture_count(), Some(2));
        assert_eq!(compile(extension("css")).capture_count(), Some(1));
        assert_eq!(compile(param("email")).capture_count(), Some(1));
        assert_eq!(compile(true).capture_count(), Some(0));
        assert_eq!(compile(cond(|_| true)).capture_count(), Some(0));
        assert_eq!(compile(("user", seg(), seg())).capture_count(), Some(2));
    }

    #[test]
    fn test_alternation_arity() {
        assert_eq!(compile(["p", "q"]).capture_count(), Some(1));
        assert_eq!(compile([re(r"(\d+)"), re(r"\d+(bar)?")]).capture_count(), Some(1));
        assert_eq!(compile([re(r"(\d+)"), re(r"\d+")]).capture_count(), None);
    }

    #[test]
    fn test_literal_escapes_metacharacters() {
        let matcher = compile(Spec::literal("a.b"));
        let MatcherKind::Path(path) = &matcher.kind else {
            panic!("expected a path matcher");
        };
        assert!(path.regex.is_match("/a.b"));
        assert!(!path.regex.is_match("/axb"));
    }

    #[test]
    fn test_pattern_is_segment_respecting() {
        let matcher = compile("about");
        let MatcherKind::Path(path) = &matcher.kind else {
            panic!("expected a path matcher");
        };
        assert!(path.regex.is_match("/about"));
        assert!(path.regex.is_match("/about/team"));
        assert!(!path.regex.is_match("/aboutus"));
    }

    #[test]
    fn test_invalid_regex_is_an_author_error() {
        let err = Matcher::compile(&re("posts/(\\d+")).unwrap_err();
        assert!(matches!(err, CompileError::InvalidPattern { ref pattern, .. } if pattern == "posts/(\\d+"));
    }

    #[test]
    fn test_unknown_option_is_an_author_error() {
        let err = Matcher::compile(&Spec::option("suffix", "css")).unwrap_err();
        assert!(matches!(err, CompileError::UnknownOption { ref key } if key == "suffix"));
    }

    #[test]
    fn test_nested_errors_surface() {
        let spec: Spec = ("ok", [re("fine"), re("(")]).into();
        assert!(Matcher::compile(&spec).is_err());
    }

    #[test]
    fn test_label() {
        assert_eq!(compile(("user", seg())).label(), r#"("user", :segment)"#);
        assert_eq!(compile(()).label(), "()");
    }
}
