//! Placeholder expansion for pattern strings
//!
//! Pure functions turning author pattern strings such as `"u/:uid/posts/:id"`
//! into regular-expression fragments where every `:name` token becomes a
//! single-segment capturing group.

use std::borrow::Cow;

/// Fragment substituted for every `:name` token: one or more non-`/` chars.
pub const SEGMENT_GROUP: &str = "([^/]+)";

/// A lexical piece of a pattern string
///
/// # Examples
///
/// ```
/// use rhtmx_dispatch::spec::pattern::{tokenize, PatternToken};
///
/// let tokens = tokenize("posts/:id");
/// assert_eq!(
///     tokens,
///     vec![PatternToken::Text("posts/"), PatternToken::Placeholder("id")]
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternToken<'a> {
    /// Text copied verbatim into the regular expression
    Text(&'a str),
    /// A `:name` token (the name without the colon)
    Placeholder(&'a str),
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Splits a pattern string into text and placeholder tokens (pure function)
///
/// # Rules
///
/// - `:` followed by one or more word characters starts a placeholder
/// - `?:` is left alone so `(?:...)` groups keep working
/// - `\:` is left alone (escaped colon)
/// - A lone `:` is plain text (`"u:(\\w+)"` has no placeholder)
pub fn tokenize(pattern: &str) -> Vec<PatternToken<'_>> {
    let bytes = pattern.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let starts_placeholder = bytes[i] == b':'
            && bytes.get(i + 1).copied().is_some_and(is_name_byte)
            && !matches!(i.checked_sub(1).map(|p| bytes[p]), Some(b'?') | Some(b'\\'));

        if !starts_placeholder {
            i += 1;
            continue;
        }

        let name_end = bytes[i + 1..]
            .iter()
            .position(|&b| !is_name_byte(b))
            .map_or(bytes.len(), |offset| i + 1 + offset);

        if text_start < i {
            tokens.push(PatternToken::Text(&pattern[text_start..i]));
        }
        tokens.push(PatternToken::Placeholder(&pattern[i + 1..name_end]));

        text_start = name_end;
        i = name_end;
    }

    if text_start < pattern.len() {
        tokens.push(PatternToken::Text(&pattern[text_start..]));
    }

    tokens
}

/// Replaces every `:name` token with [`SEGMENT_GROUP`]
///
/// Returns `Cow::Borrowed` when the pattern has no placeholders.
///
/// # Examples
///
/// ```
/// use rhtmx_dispatch::spec::pattern::expand_placeholders;
/// use std::borrow::Cow;
///
/// assert_eq!(expand_placeholders("u/:uid/posts/:id"), "u/([^/]+)/posts/([^/]+)");
/// assert!(matches!(expand_placeholders("about"), Cow::Borrowed("about")));
/// ```
pub fn expand_placeholders(pattern: &str) -> Cow<'_, str> {
    let tokens = tokenize(pattern);

    if !tokens
        .iter()
        .any(|token| matches!(token, PatternToken::Placeholder(_)))
    {
        return Cow::Borrowed(pattern);
    }

    Cow::Owned(
        tokens
            .iter()
            .map(|token| match token {
                PatternToken::Text(text) => *text,
                PatternToken::Placeholder(_) => SEGMENT_GROUP,
            })
            .collect(),
    )
}

/// Names of the placeholders in a pattern string, in order
pub fn placeholder_names(pattern: &str) -> Vec<&str> {
    tokenize(pattern)
        .into_iter()
        .filter_map(|token| match token {
            PatternToken::Placeholder(name) => Some(name),
            PatternToken::Text(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_plain_text() {
        assert_eq!(tokenize("about"), vec![PatternToken::Text("about")]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_tokenize_multiple_placeholders() {
        assert_eq!(
            tokenize("u/:uid/posts/:id"),
            vec![
                PatternToken::Text("u/"),
                PatternToken::Placeholder("uid"),
                PatternToken::Text("/posts/"),
                PatternToken::Placeholder("id"),
            ]
        );
    }

    #[test]
    fn test_tokenize_leading_placeholder() {
        assert_eq!(
            tokenize(":id.json"),
            vec![PatternToken::Placeholder("id"), PatternToken::Text(".json")]
        );
    }

    #[test]
    fn test_non_capturing_group_survives() {
        assert_eq!(expand_placeholders("(?:a|b)/:id"), "(?:a|b)/([^/]+)");
    }

    #[test]
    fn test_escaped_and_lone_colons() {
        assert_eq!(expand_placeholders(r"u\:name"), r"u\:name");
        assert_eq!(expand_placeholders(r"u:(\w+)"), r"u:(\w+)");
        assert_eq!(expand_placeholders("a:"), "a:");
    }

    #[test]
    fn test_placeholder_names() {
        assert_eq!(placeholder_names("u/:uid/posts/:id"), vec!["uid", "id"]);
        assert!(placeholder_names("(\\d+)").is_empty());
    }
}
