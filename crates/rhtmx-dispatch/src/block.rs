//! Route blocks and dispatch operators
//!
//! A route tree is written as nested closures over a [`RouteBlock`] builder:
//!
//! ```
//! use rhtmx_dispatch::{seg, App, Request};
//!
//! let app = App::build(|r| {
//!     r.on("user", |r| {
//!         r.get(seg(), |r| r.handle(|_, args| format!("user {}", &args[0])));
//!     });
//! })
//! .unwrap();
//!
//! assert_eq!(app.call(Request::get("/user/jdoe")).body(), "user jdoe");
//! assert_eq!(app.call(Request::get("/users")).status(), 404);
//! ```
//!
//! Every operator is compiled when the tree is built. At request time the
//! steps of a block run in order until one of them halts.

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::app::App;
use crate::engine::match_request;
use crate::error::CompileError;
use crate::path::SnapshotGuard;
use crate::request::RoutingContext;
use crate::spec::{Matcher, Spec};
use crate::verb::Verb;

// ============================================================================
// Flow and replies
// ============================================================================

/// Outcome of evaluating a block.
///
/// `Halt` means a terminal response has been produced and must propagate
/// through every enclosing operator. `Continue` means the block declined and
/// the walk goes on with the next sibling.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Halt,
    Continue,
}

impl Flow {
    pub fn is_halt(self) -> bool {
        self == Flow::Halt
    }
}

/// Values a handler may return.
///
/// | Value | Effect |
/// |---|---|
/// | `&str`, `String` | written to the body, halts |
/// | `()` | halts (the handler wrote what it needed) |
/// | `(u16, T)` | sets the status, then applies `T` |
/// | `Option<T>` | `None` declines, `Some(t)` applies `t` |
/// | [`Flow`] | used as is |
pub trait IntoReply {
    fn into_reply(self, ctx: &mut RoutingContext) -> Flow;
}

impl IntoReply for Flow {
    fn into_reply(self, _ctx: &mut RoutingContext) -> Flow {
        self
    }
}

impl IntoReply for () {
    fn into_reply(self, _ctx: &mut RoutingContext) -> Flow {
        Flow::Halt
    }
}

impl IntoReply for String {
    fn into_reply(self, ctx: &mut RoutingContext) -> Flow {
        ctx.write(self);
        Flow::Halt
    }
}

impl IntoReply for &str {
    fn into_reply(self, ctx: &mut RoutingContext) -> Flow {
        ctx.write(self);
        Flow::Halt
    }
}

impl<T: IntoReply> IntoReply for (u16, T) {
    fn into_reply(self, ctx: &mut RoutingContext) -> Flow {
        ctx.response_mut().set_status(self.0);
        self.1.into_reply(ctx)
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self, ctx: &mut RoutingContext) -> Flow {
        match self {
            Some(reply) => reply.into_reply(ctx),
            None => Flow::Continue,
        }
    }
}

// ============================================================================
// Captures
// ============================================================================

/// Captures handed to a block.
///
/// Indexing and [`Args::get`] see only the captures of the operator that owns
/// the block; [`Args::all`] also includes those of enclosing operators,
/// outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    values: Vec<String>,
    own_start: usize,
}

impl Args {
    fn nest(&self, captures: Vec<String>) -> Self {
        let mut values = Vec::with_capacity(self.values.len() + captures.len());
        values.extend_from_slice(&self.values);
        values.extend(captures);

        Self {
            values,
            own_start: self.values.len(),
        }
    }

    /// Captures of the operator that owns this block.
    pub fn own(&self) -> &[String] {
        &self.values[self.own_start..]
    }

    /// Captures of the enclosing operators only.
    pub fn inherited(&self) -> &[String] {
        &self.values[..self.own_start]
    }

    /// Captures of every enclosing operator, outermost first.
    pub fn all(&self) -> &[String] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.own().get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.own().len()
    }

    pub fn is_empty(&self) -> bool {
        self.own().is_empty()
    }
}

impl Index<usize> for Args {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.own()[index]
    }
}

// ============================================================================
// Compiled tree
// ============================================================================

type Handler = Arc<dyn Fn(&mut RoutingContext, &Args) -> Flow + Send + Sync>;
type Tap = Arc<dyn Fn(&mut RoutingContext, &Args) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// `on`: the match may leave path behind.
    Prefix,
    /// `is`: the match must consume the rest of the path.
    Exact,
}

struct Route {
    mode: Mode,
    verb: Option<Verb>,
    matcher: Matcher,
    block: Block,
}

enum Step {
    Route(Route),
    Handle(Handler),
    Tap(Tap),
    Run(Arc<App>),
}

/// A compiled, immutable block of steps.
#[derive(Default)]
pub struct Block {
    steps: Vec<Step>,
}

impl Block {
    /// Runs the steps in order, stopping at the first halt.
    pub fn evaluate(&self, ctx: &mut RoutingContext, args: &Args) -> Flow {
        for step in &self.steps {
            let flow = match step {
                Step::Route(route) => route.dispatch(ctx, args),
                Step::Handle(handler) => handler(ctx, args),
                Step::Tap(tap) => {
                    tap(ctx, args);
                    Flow::Continue
                }
                Step::Run(app) => {
                    trace!(remaining = ctx.path_info(), "running mounted app");
                    app.run(ctx)
                }
            };

            if flow.is_halt() {
                return Flow::Halt;
            }
        }

        Flow::Continue
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for step in &self.steps {
            match step {
                Step::Route(route) => {
                    list.entry(&format_args!(
                        "{} {} {}",
                        match route.mode {
                            Mode::Prefix => "on",
                            Mode::Exact => "is",
                        },
                        route.verb.map_or("*", |verb| verb.as_str()),
                        route.matcher.label()
                    ));
                }
                Step::Handle(_) => {
                    list.entry(&format_args!("handle"));
                }
                Step::Tap(_) => {
                    list.entry(&format_args!("tap"));
                }
                Step::Run(_) => {
                    list.entry(&format_args!("run"));
                }
            }
        }
        list.finish()
    }
}

impl Route {
    fn dispatch(&self, ctx: &mut RoutingContext, args: &Args) -> Flow {
        // Verb checks consume nothing, so a mismatch needs no rollback
        if let Some(verb) = self.verb {
            if !verb.matches(ctx.method()) {
                trace!(verb = %verb, method = ctx.method(), "verb mismatch");
                return Flow::Continue;
            }
        }

        trace!(
            matcher = self.matcher.label(),
            remaining = ctx.path_info(),
            "attempting"
        );
        let mut guard = SnapshotGuard::new(ctx);

        let Some(found) = match_request(&self.matcher, &mut guard) else {
            trace!(matcher = self.matcher.label(), remaining = guard.path_info(), "no match");
            return Flow::Continue;
        };

        if self.mode == Mode::Exact && !guard.path().is_exhausted() {
            trace!(
                matcher = self.matcher.label(),
                remaining = guard.path_info(),
                "not an exact match"
            );
            return Flow::Continue;
        }

        trace!(
            matcher = self.matcher.label(),
            captures = ?found.captures,
            consumed = guard.script_name(),
            "matched"
        );

        // A negotiated media type holds only while the block runs
        let previous_type = found.content_type.as_ref().map(|mime| {
            let previous = guard.response().header("Content-Type").map(str::to_string);
            guard.response_mut().set_header("Content-Type", mime.as_str());
            previous
        });

        let args = args.nest(found.captures);
        let flow = self.block.evaluate(&mut guard, &args);

        if !flow.is_halt() {
            debug!(
                matcher = self.matcher.label(),
                consumed = guard.script_name(),
                "block declined, rolling back"
            );
            match previous_type {
                Some(Some(previous)) => guard.response_mut().set_header("Content-Type", previous),
                Some(None) => guard.response_mut().remove_header("Content-Type"),
                None => {}
            }
        }
        flow
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for a block of routing steps.
///
/// Operators compile their matchers immediately; the first author error is
/// kept and reported by [`App::build`].
#[derive(Default)]
pub struct RouteBlock {
    steps: Vec<Step>,
    error: Option<CompileError>,
}

impl RouteBlock {
    /// Prefix operator: matches `spec` at the front of the remaining path.
    pub fn on<S, F>(&mut self, spec: S, build: F)
    where
        S: Into<Spec>,
        F: FnOnce(&mut RouteBlock),
    {
        self.route(Mode::Prefix, None, spec.into(), build);
    }

    /// Exact operator: like [`on`](Self::on) but the match must consume the
    /// whole remaining path. `is((), ..)` matches an already-empty path.
    pub fn is<S, F>(&mut self, spec: S, build: F)
    where
        S: Into<Spec>,
        F: FnOnce(&mut RouteBlock),
    {
        self.route(Mode::Exact, None, spec.into(), build);
    }

    /// Verb operator: checks the request method, then behaves as `on`.
    pub fn verb<S, F>(&mut self, verb: Verb, spec: S, build: F)
    where
        S: Into<Spec>,
        F: FnOnce(&mut RouteBlock),
    {
        self.route(Mode::Prefix, Some(verb), spec.into(), build);
    }

    pub fn get<S: Into<Spec>, F: FnOnce(&mut RouteBlock)>(&mut self, spec: S, build: F) {
        self.verb(Verb::Get, spec, build);
    }

    pub fn head<S: Into<Spec>, F: FnOnce(&mut RouteBlock)>(&mut self, spec: S, build: F) {
        self.verb(Verb::Head, spec, build);
    }

    pub fn post<S: Into<Spec>, F: FnOnce(&mut RouteBlock)>(&mut self, spec: S, build: F) {
        self.verb(Verb::Post, spec, build);
    }

    pub fn put<S: Into<Spec>, F: FnOnce(&mut RouteBlock)>(&mut self, spec: S, build: F) {
        self.verb(Verb::Put, spec, build);
    }

    pub fn patch<S: Into<Spec>, F: FnOnce(&mut RouteBlock)>(&mut self, spec: S, build: F) {
        self.verb(Verb::Patch, spec, build);
    }

    pub fn delete<S: Into<Spec>, F: FnOnce(&mut RouteBlock)>(&mut self, spec: S, build: F) {
        self.verb(Verb::Delete, spec, build);
    }

    pub fn options<S: Into<Spec>, F: FnOnce(&mut RouteBlock)>(&mut self, spec: S, build: F) {
        self.verb(Verb::Options, spec, build);
    }

    /// Adds a handler step. Its reply decides whether the walk halts.
    pub fn handle<F, R>(&mut self, handler: F)
    where
        F: Fn(&mut RoutingContext, &Args) -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        self.steps.push(Step::Handle(Arc::new(
            move |ctx: &mut RoutingContext, args: &Args| handler(ctx, args).into_reply(ctx),
        )));
    }

    /// Adds a side-effect step; the walk always continues after it.
    pub fn tap<F>(&mut self, tap: F)
    where
        F: Fn(&mut RoutingContext, &Args) + Send + Sync + 'static,
    {
        self.steps.push(Step::Tap(Arc::new(tap)));
    }

    /// Hands the rest of the request to another app. Always terminal: when
    /// the mounted app finds nothing, the walk ends with its not-found status.
    pub fn run(&mut self, app: Arc<App>) {
        self.steps.push(Step::Run(app));
    }

    fn route<F>(&mut self, mode: Mode, verb: Option<Verb>, spec: Spec, build: F)
    where
        F: FnOnce(&mut RouteBlock),
    {
        let mut nested = RouteBlock::default();
        build(&mut nested);

        if let Some(err) = nested.error {
            self.error.get_or_insert(err);
            return;
        }

        match Matcher::compile(&spec) {
            Ok(matcher) => self.steps.push(Step::Route(Route {
                mode,
                verb,
                matcher,
                block: Block {
                    steps: nested.steps,
                },
            })),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
    }

    /// Finishes the builder into a compiled block.
    pub fn finish(self) -> Result<Block, CompileError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(Block { steps: self.steps }),
        }
    }
}
