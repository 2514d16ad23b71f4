// File: src/engine.rs
// Purpose: Apply compiled matchers to the routing context

use crate::path::SnapshotGuard;
use crate::request::RoutingContext;
use crate::spec::compile::{MatcherKind, PathMatcher};
use crate::spec::Matcher;

/// Captures of a successful match; `None` means no match (and no side effect
/// on the path state or the response).
pub type MatchResult = Option<Vec<String>>;

/// Everything a successful match produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Match {
    pub captures: Vec<String>,
    /// Media type negotiated by an `accept` guard. The matcher never writes
    /// it; the operator applies it to the response while its block runs.
    pub content_type: Option<String>,
}

/// Applies `matcher` to the remaining path of `ctx`.
///
/// On success the matched span has been moved from the remaining path onto
/// the consumed prefix. On failure the path state and the response are
/// exactly what they were on entry, however far a sequence got before
/// failing. The path state is also restored when a condition panics.
///
/// # Examples
///
/// ```
/// use rhtmx_dispatch::engine::try_match;
/// use rhtmx_dispatch::spec::{seg, Matcher, Spec};
/// use rhtmx_dispatch::{Request, RoutingContext};
///
/// let matcher = Matcher::compile(&Spec::from(("user", seg()))).unwrap();
/// let mut ctx = RoutingContext::new(Request::get("/user/jdoe/posts"));
///
/// assert_eq!(try_match(&matcher, &mut ctx), Some(vec!["jdoe".to_string()]));
/// assert_eq!(ctx.script_name(), "/user/jdoe");
/// assert_eq!(ctx.path_info(), "/posts");
/// ```
pub fn try_match(matcher: &Matcher, ctx: &mut RoutingContext) -> MatchResult {
    match_request(matcher, ctx).map(|found| found.captures)
}

/// Like [`try_match`], also reporting the media type an `accept` guard
/// negotiated.
pub fn match_request(matcher: &Matcher, ctx: &mut RoutingContext) -> Option<Match> {
    let response = ctx.response().snapshot();
    let mut guard = SnapshotGuard::new(ctx);
    let mut found = Match::default();

    if apply(&matcher.kind, &mut guard, &mut found) {
        guard.commit();
        Some(found)
    } else {
        guard.response_mut().restore(response);
        None
    }
}

fn apply(kind: &MatcherKind, ctx: &mut RoutingContext, found: &mut Match) -> bool {
    match kind {
        MatcherKind::Path(path) => consume(path, ctx, &mut found.captures),
        MatcherKind::Param(name) => match ctx.query().get(name) {
            Some(value) => {
                found.captures.push(value.to_string());
                true
            }
            None => false,
        },
        MatcherKind::Header(name) => match ctx.headers().get(name) {
            Some(value) => {
                found.captures.push(value.to_string());
                true
            }
            None => false,
        },
        MatcherKind::Accept(mime) => {
            let accepted = ctx
                .headers()
                .get("accept")
                .is_some_and(|accept| accepts(accept, mime));
            if accepted {
                found.content_type = Some(mime.clone());
            }
            accepted
        }
        MatcherKind::Always => true,
        MatcherKind::Never => false,
        MatcherKind::Condition(condition) => condition.evaluate(ctx),
        MatcherKind::Seq(items) => items.iter().all(|item| apply(item, ctx, found)),
        MatcherKind::Any(alternatives) => alternatives.iter().any(|alt| {
            let snapshot = ctx.path().snapshot();
            let response = ctx.response().snapshot();
            let mark = found.captures.len();
            let content_type = found.content_type.clone();
            let start = ctx.path().consumed().len();

            if !apply(&alt.kind, ctx, found) {
                found.captures.truncate(mark);
                found.content_type = content_type;
                ctx.path_mut().restore(snapshot);
                ctx.response_mut().restore(response);
                return false;
            }

            // The matched path text, not the pattern source
            if alt.captures_text {
                let matched = &ctx.path().consumed()[start..];
                found
                    .captures
                    .push(matched.strip_prefix('/').unwrap_or(matched).to_string());
            }
            true
        }),
    }
}

fn consume(path: &PathMatcher, ctx: &mut RoutingContext, captures: &mut Vec<String>) -> bool {
    let span_end = {
        let Some(caps) = path.regex.captures(ctx.path().remaining()) else {
            return false;
        };
        let Some(span) = caps.get(1) else {
            return false;
        };

        // Groups that did not take part in the match report an empty string
        captures.extend(
            path.captures
                .clone()
                .map(|i| caps.get(i).map_or_else(String::new, |m| m.as_str().to_string())),
        );
        span.end()
    };

    ctx.path_mut().advance(span_end)
}

fn accepts(accept: &str, mime: &str) -> bool {
    accept
        .split(',')
        .filter_map(|item| item.split(';').next())
        .any(|item| item.trim().eq_ignore_ascii_case(mime))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use crate::spec::{accept, cond, extension, header, param, re, seg, Spec};
    use pretty_assertions::assert_eq;

    fn matcher(spec: impl Into<Spec>) -> Matcher {
        Matcher::compile(&spec.into()).unwrap()
    }

    fn ctx(path: &str) -> RoutingContext {
        RoutingContext::new(Request::get(path))
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_literal_leaves_trailing_slash() {
        let mut ctx = ctx("/about/team");
        assert_eq!(try_match(&matcher("about"), &mut ctx), Some(vec![]));
        assert_eq!(ctx.script_name(), "/about");
        assert_eq!(ctx.path_info(), "/team");
    }

    #[test]
    fn test_empty_string_consumes_one_slash() {
        let mut ctx = ctx("///1");
        assert!(try_match(&matcher(""), &mut ctx).is_some());
        assert_eq!(ctx.path_info(), "//1");

        let mut ctx = self::ctx("/1");
        assert!(try_match(&matcher(""), &mut ctx).is_none());
        assert_eq!(ctx.path_info(), "/1");
    }

    #[test]
    fn test_segment_takes_whole_segment() {
        let mut ctx = ctx("/1.1");
        assert_eq!(try_match(&matcher(seg()), &mut ctx), Some(strings(&["1.1"])));

        let mut ctx = self::ctx("/one/two/three");
        assert_eq!(try_match(&matcher(seg()), &mut ctx), Some(strings(&["one"])));
        assert_eq!(ctx.path_info(), "/two/three");
    }

    #[test]
    fn test_regex_must_end_at_boundary() {
        let mut ctx = ctx("/1.2");
        assert_eq!(try_match(&matcher(re(r"(\d+)")), &mut ctx), None);
        assert_eq!(ctx.path_info(), "/1.2");
    }

    #[test]
    fn test_pattern_fragment_may_span_segments() {
        let mut ctx = ctx("/foo/bar.css");
        assert_eq!(
            try_match(&matcher(r"(.+\.css)"), &mut ctx),
            Some(strings(&["foo/bar.css"]))
        );
        assert!(ctx.path().is_exhausted());
    }

    #[test]
    fn test_sequence_rolls_back_entirely() {
        let mut ctx = ctx("/post/1");
        assert_eq!(try_match(&matcher(("post", false)), &mut ctx), None);
        assert_eq!(ctx.script_name(), "");
        assert_eq!(ctx.path_info(), "/post/1");
    }

    #[test]
    fn test_failed_condition_rolls_back_its_mutation() {
        let mut ctx = ctx("/hello");
        let spec = cond(|ctx| {
            ctx.path_mut().advance("/hello".len());
            false
        });
        assert_eq!(try_match(&matcher(spec), &mut ctx), None);
        assert_eq!(ctx.script_name(), "");
        assert_eq!(ctx.path_info(), "/hello");
    }

    #[test]
    fn test_alternation_order() {
        let alternatives = matcher([re(r"(\d+)"), re(r"\d+(bar)?")]);

        let mut ctx = ctx("/123");
        assert_eq!(try_match(&alternatives, &mut ctx), Some(strings(&["123"])));

        let mut ctx = self::ctx("/123bar");
        assert_eq!(try_match(&alternatives, &mut ctx), Some(strings(&["bar"])));

        let mut ctx = self::ctx("/123bard");
        assert_eq!(try_match(&alternatives, &mut ctx), None);
    }

    #[test]
    fn test_alternation_captures_string_text() {
        let alternatives = matcher(["p", "q"]);
        let mut ctx = ctx("/q");
        assert_eq!(try_match(&alternatives, &mut ctx), Some(strings(&["q"])));
    }

    #[test]
    fn test_alternation_discards_failed_branch_captures() {
        let alternatives = matcher([Spec::from(("a", seg(), "x")), Spec::from(("a", seg()))]);
        let mut ctx = ctx("/a/b/c");
        assert_eq!(try_match(&alternatives, &mut ctx), Some(strings(&["b"])));
        assert_eq!(ctx.path_info(), "/c");
    }

    #[test]
    fn test_optional_group_reports_empty_string() {
        let mut ctx = ctx("/123");
        assert_eq!(
            try_match(&matcher(re(r"\d+(bar)?")), &mut ctx),
            Some(strings(&[""]))
        );
    }

    #[test]
    fn test_extension() {
        let mut ctx = ctx("/reset.css");
        assert_eq!(try_match(&matcher(extension("css")), &mut ctx), Some(strings(&["reset"])));

        let mut ctx = self::ctx("/reset.bar");
        assert_eq!(try_match(&matcher(extension("css")), &mut ctx), None);

        let mut ctx = self::ctx("/css/reset.css");
        assert_eq!(try_match(&matcher(extension("css")), &mut ctx), None);
    }

    #[test]
    fn test_param_does_not_consume() {
        let mut ctx = RoutingContext::new(Request::get("/signup?email="));
        assert_eq!(try_match(&matcher(param("email")), &mut ctx), Some(strings(&[""])));
        assert_eq!(ctx.path_info(), "/signup");
        assert_eq!(try_match(&matcher(param("name")), &mut ctx), None);
    }

    #[test]
    fn test_header_and_accept() {
        let req = Request::get("/")
            .with_header("X-Token", "abc")
            .with_header("Accept", "text/html, application/json;q=0.9");
        let mut ctx = RoutingContext::new(req);

        assert_eq!(try_match(&matcher(header("x-token")), &mut ctx), Some(strings(&["abc"])));
        assert_eq!(
            match_request(&matcher(accept("application/json")), &mut ctx),
            Some(Match {
                captures: vec![],
                content_type: Some("application/json".to_string()),
            })
        );
        assert_eq!(try_match(&matcher(accept("text/css")), &mut ctx), None);
    }

    #[test]
    fn test_accept_leaves_response_alone() {
        let req = Request::get("/page").with_header("Accept", "application/json");
        let mut ctx = RoutingContext::new(req);

        assert!(try_match(&matcher(accept("application/json")), &mut ctx).is_some());
        assert_eq!(
            ctx.response().header("content-type"),
            Some("text/html; charset=utf-8")
        );
    }

    #[test]
    fn test_failed_sequence_forgets_negotiated_type() {
        let req = Request::get("/page").with_header("Accept", "application/json");
        let mut ctx = RoutingContext::new(req);

        let spec = [Spec::from((accept("application/json"), "api")), Spec::from("page")];
        let found = match_request(&matcher(spec), &mut ctx);
        assert_eq!(
            found,
            Some(Match {
                captures: strings(&["page"]),
                content_type: None,
            })
        );
    }

    #[test]
    fn test_failed_condition_restores_response() {
        let mut ctx = ctx("/hello");
        ctx.response_mut().write("kept");
        let spec = cond(|ctx| {
            ctx.response_mut().set_status(500);
            ctx.response_mut().set_header("X-Debug", "1");
            ctx.response_mut().write("leak");
            false
        });

        assert_eq!(try_match(&matcher(spec), &mut ctx), None);
        assert_eq!(ctx.response().status(), 200);
        assert_eq!(ctx.response().header("x-debug"), None);
        assert_eq!(ctx.response().body(), "kept");
    }

    #[test]
    fn test_failed_alternative_restores_response() {
        let mut ctx = ctx("/b");
        let spec = [
            cond(|ctx| {
                ctx.response_mut().write("leak");
                false
            }),
            Spec::from("b"),
        ];

        assert_eq!(try_match(&matcher(spec), &mut ctx), Some(strings(&["b"])));
        assert_eq!(ctx.response().body(), "");
    }

    #[test]
    fn test_panicking_condition_restores_path() {
        let spec = matcher(cond(|ctx| {
            ctx.path_mut().advance(2);
            panic!("condition failed");
        }));
        let mut ctx = ctx("/a/b");

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            try_match(&spec, &mut ctx)
        }));

        assert!(result.is_err());
        assert_eq!(ctx.script_name(), "");
        assert_eq!(ctx.path_info(), "/a/b");
    }
}
