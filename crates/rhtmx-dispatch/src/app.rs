// File: src/app.rs
// Purpose: Compiled route tree and the per-request entry point

use std::sync::Arc;

use tracing::debug;

use crate::block::{Args, Block, Flow, RouteBlock};
use crate::config::Config;
use crate::error::CompileError;
use crate::request::{Request, RoutingContext};
use crate::response::Response;

/// A compiled route tree plus the config it answers with.
///
/// `App` is immutable once built and can be shared (`Arc<App>`) across any
/// number of concurrent requests; all per-request state lives in the
/// [`RoutingContext`].
#[derive(Debug)]
pub struct App {
    root: Block,
    config: Config,
}

impl App {
    /// Builds and compiles a route tree with the default config.
    ///
    /// Fails with the first author error found (invalid pattern or
    /// unsupported matcher option) before any request is handled.
    pub fn build<F>(build: F) -> Result<Self, CompileError>
    where
        F: FnOnce(&mut RouteBlock),
    {
        Self::build_with_config(Config::default(), build)
    }

    pub fn build_with_config<F>(config: Config, build: F) -> Result<Self, CompileError>
    where
        F: FnOnce(&mut RouteBlock),
    {
        let mut root = RouteBlock::default();
        build(&mut root);
        let root = root.finish()?;

        debug!(steps = root.len(), "compiled route tree");
        Ok(Self { root, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handles one request: builds its context, walks the tree and returns
    /// the accumulated response.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_dispatch::{App, Request};
    ///
    /// let app = App::build(|r| {
    ///     r.is("", |r| r.handle(|_, _| "+1"));
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(app.call(Request::get("/")).body(), "+1");
    /// assert_eq!(app.call(Request::get("//")).status(), 404);
    /// ```
    pub fn call(&self, request: Request) -> Response {
        let mut ctx = RoutingContext::with_config(request, &self.config);
        let flow = self.dispatch(&mut ctx);
        debug!(?flow, status = ctx.response().status(), "request dispatched");
        ctx.into_response()
    }

    /// Walks the tree over an existing context.
    ///
    /// When nothing halts, the response status becomes the configured
    /// not-found status. The path state is the same on return as on entry.
    pub fn dispatch(&self, ctx: &mut RoutingContext) -> Flow {
        let flow = self.root.evaluate(ctx, &Args::default());
        if !flow.is_halt() {
            debug!(
                path = ctx.path().full(),
                status = self.config.response.not_found_status,
                "no route matched"
            );
            ctx.response_mut()
                .set_status(self.config.response.not_found_status);
        }
        flow
    }

    /// Runs this app as a mounted sub-tree; always terminal.
    pub(crate) fn run(&self, ctx: &mut RoutingContext) -> Flow {
        let _ = self.dispatch(ctx);
        Flow::Halt
    }

    /// Wraps the app for sharing or mounting.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
