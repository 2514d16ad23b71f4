//! Author-facing matcher expressions
//!
//! A [`Spec`] is what route authors hand to dispatch operators. It is compiled
//! once, when the route tree is built, into an immutable
//! [`Matcher`](compile::Matcher).
//!
//! | Expression | Spec | Captures |
//! |---|---|---|
//! | `"about"`, `"a/b"` | path pattern | regex groups in the text |
//! | `"posts/:id"` | path pattern with placeholders | one per `:name` |
//! | `seg()` | one path segment | 1 |
//! | `re("...")` | regular expression | its groups |
//! | `extension("css")` | file name at the final segment | 1 |
//! | `param("email")` | query parameter presence | 1 |
//! | `["p", "q"]`, `vec![..]` | ordered alternation | the winner's |
//! | `("user", seg())` | sequence | concatenated |
//! | `true` / `false` / `cond(..)` | guard | 0 |

pub mod compile;
pub mod pattern;

use std::fmt;
use std::sync::Arc;

use crate::error::CompileError;
use crate::request::RoutingContext;

pub use compile::Matcher;

/// Predicate evaluated against the routing context.
///
/// The predicate may mutate the context (for example consume path); when it
/// returns `false` every path mutation is rolled back.
#[derive(Clone)]
pub struct Condition(Arc<dyn Fn(&mut RoutingContext) -> bool + Send + Sync>);

impl Condition {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&mut RoutingContext) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    pub fn evaluate(&self, ctx: &mut RoutingContext) -> bool {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition(..)")
    }
}

/// The two recognized matcher options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOption {
    /// File name with this extension at the final remaining segment.
    Extension(String),
    /// Presence of this query parameter.
    Param(String),
}

impl MatchOption {
    /// Resolves a `key => value` option, rejecting unknown keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_dispatch::spec::MatchOption;
    ///
    /// assert_eq!(
    ///     MatchOption::parse("extension", "css").unwrap(),
    ///     MatchOption::Extension("css".to_string())
    /// );
    /// assert!(MatchOption::parse("suffix", "css").is_err());
    /// ```
    pub fn parse(key: &str, value: &str) -> Result<Self, CompileError> {
        if value.is_empty() {
            return Err(CompileError::EmptyOption {
                key: key.to_string(),
            });
        }

        match key {
            "extension" => Ok(MatchOption::Extension(value.to_string())),
            "param" => Ok(MatchOption::Param(value.to_string())),
            _ => Err(CompileError::UnknownOption {
                key: key.to_string(),
            }),
        }
    }
}

/// A matcher expression as written by the route author.
#[derive(Debug, Clone)]
pub enum Spec {
    /// Path pattern: `:name` placeholders plus regular-expression text.
    Pattern(String),
    /// Exact text; metacharacters are matched literally.
    Literal(String),
    /// One whole path segment.
    Segment,
    /// Regular expression source.
    Regex(String),
    /// `key => value` option, validated at compile time.
    Option { key: String, value: String },
    /// Request header presence, capturing its value.
    Header(String),
    /// `Accept` header lists this media type.
    Accept(String),
    /// Ordered alternation.
    Any(Vec<Spec>),
    /// Positional sequence.
    Seq(Vec<Spec>),
    Bool(bool),
    Condition(Condition),
}

impl Spec {
    pub fn literal(text: impl Into<String>) -> Self {
        Spec::Literal(text.into())
    }

    pub fn option(key: impl Into<String>, value: impl Into<String>) -> Self {
        Spec::Option {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A single path segment placeholder.
pub fn seg() -> Spec {
    Spec::Segment
}

/// A regular expression given by its source; compiled with the tree.
///
/// Flags are written inline, e.g. `re("(?i)about")` for a case-insensitive
/// match. A compiled `Regex` is not accepted because its builder flags cannot
/// be recovered from it.
pub fn re(source: impl Into<String>) -> Spec {
    Spec::Regex(source.into())
}

pub fn extension(ext: impl Into<String>) -> Spec {
    Spec::option("extension", ext)
}

pub fn param(name: impl Into<String>) -> Spec {
    Spec::option("param", name)
}

pub fn header(name: impl Into<String>) -> Spec {
    Spec::Header(name.into())
}

pub fn accept(mime: impl Into<String>) -> Spec {
    Spec::Accept(mime.into())
}

pub fn cond<F>(predicate: F) -> Spec
where
    F: Fn(&mut RoutingContext) -> bool + Send + Sync + 'static,
{
    Spec::Condition(Condition::new(predicate))
}

// ============================================================================
// Conversions
// ============================================================================

impl From<&str> for Spec {
    fn from(pattern: &str) -> Self {
        Spec::Pattern(pattern.to_string())
    }
}

impl From<String> for Spec {
    fn from(pattern: String) -> Self {
        Spec::Pattern(pattern)
    }
}

impl From<&String> for Spec {
    fn from(pattern: &String) -> Self {
        Spec::Pattern(pattern.clone())
    }
}

impl From<bool> for Spec {
    fn from(value: bool) -> Self {
        Spec::Bool(value)
    }
}

impl From<MatchOption> for Spec {
    fn from(option: MatchOption) -> Self {
        match option {
            MatchOption::Extension(ext) => extension(ext),
            MatchOption::Param(name) => param(name),
        }
    }
}

impl From<Condition> for Spec {
    fn from(condition: Condition) -> Self {
        Spec::Condition(condition)
    }
}

impl<T: Into<Spec>> From<Vec<T>> for Spec {
    fn from(alternatives: Vec<T>) -> Self {
        Spec::Any(alternatives.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Spec>, const N: usize> From<[T; N]> for Spec {
    fn from(alternatives: [T; N]) -> Self {
        Spec::Any(alternatives.into_iter().map(Into::into).collect())
    }
}

/// No arguments: always matches, consumes nothing.
impl From<()> for Spec {
    fn from(_: ()) -> Self {
        Spec::Seq(Vec::new())
    }
}

/// Implement `From` for tuples: positional arguments form a sequence
macro_rules! sequence_tuple ({ $($T:ident),+ } => {
    impl<$($T: Into<Spec>),+> From<($($T,)+)> for Spec {
        #[allow(non_snake_case)]
        fn from(($($T,)+): ($($T,)+)) -> Self {
            Spec::Seq(vec![$($T.into()),+])
        }
    }
});

sequence_tuple!(A);
sequence_tuple!(A, B);
sequence_tuple!(A, B, C);
sequence_tuple!(A, B, C, D);
sequence_tuple!(A, B, C, D, E);
sequence_tuple!(A, B, C, D, E, F);
sequence_tuple!(A, B, C, D, E, F, G);
sequence_tuple!(A, B, C, D, E, F, G, H);

// ============================================================================
// Display (used as the label in trace events)
// ============================================================================

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, specs: &[Spec], sep: &str) -> fmt::Result {
            for (i, spec) in specs.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{}", spec)?;
            }
            Ok(())
        }

        match self {
            Spec::Pattern(pattern) => write!(f, "{:?}", pattern),
            Spec::Literal(text) => write!(f, "literal({:?})", text),
            Spec::Segment => f.write_str(":segment"),
            Spec::Regex(source) => write!(f, "/{}/", source),
            Spec::Option { key, value } => write!(f, "{}: {:?}", key, value),
            Spec::Header(name) => write!(f, "header({:?})", name),
            Spec::Accept(mime) => write!(f, "accept({:?})", mime),
            Spec::Any(specs) => {
                f.write_str("[")?;
                join(f, specs, " | ")?;
                f.write_str("]")
            }
            Spec::Seq(specs) => {
                f.write_str("(")?;
                join(f, specs, ", ")?;
                f.write_str(")")
            }
            Spec::Bool(value) => write!(f, "{}", value),
            Spec::Condition(_) => f.write_str("<condition>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_is_sequence() {
        let spec: Spec = ("user", seg()).into();
        assert!(matches!(spec, Spec::Seq(ref items) if items.len() == 2));
    }

    #[test]
    fn test_array_is_alternation() {
        let spec: Spec = ["p", "q"].into();
        assert!(matches!(spec, Spec::Any(ref items) if items.len() == 2));
    }

    #[test]
    fn test_unit_is_empty_sequence() {
        let spec: Spec = ().into();
        assert!(matches!(spec, Spec::Seq(ref items) if items.is_empty()));
    }

    #[test]
    fn test_regex_keeps_source() {
        let spec = re(r"(?i)posts/(\d+)");
        assert!(matches!(spec, Spec::Regex(ref src) if src == r"(?i)posts/(\d+)"));
    }

    #[test]
    fn test_option_validation() {
        assert!(matches!(
            MatchOption::parse("param", ""),
            Err(CompileError::EmptyOption { .. })
        ));
        assert_eq!(
            MatchOption::parse("param", "email").unwrap(),
            MatchOption::Param("email".to_string())
        );
    }

    #[test]
    fn test_display_label() {
        let spec: Spec = ("user", seg(), [re(r"\d+"), extension("css")]).into();
        assert_eq!(
            spec.to_string(),
            r#"("user", :segment, [/\d+/ | extension: "css"])"#
        );
    }
}
