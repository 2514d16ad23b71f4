//! RHTMX Dispatch - nested match-tree request routing
//!
//! Routes are written as a tree of operators. Each operator tries a matcher
//! against the remaining request path; on success it consumes the matched
//! segments and runs its nested block with the captures, on failure the path
//! is left exactly as it was and the next sibling is tried. The first block
//! that produces a response halts the whole walk.
//!
//! ```
//! use rhtmx_dispatch::{extension, App, Request};
//!
//! let app = App::build(|r| {
//!     r.on("posts/:id", |r| {
//!         r.is((), |r| r.handle(|_, args| format!("post {}", args.all()[0])));
//!         r.get("comments", |r| r.handle(|_, args| format!("comments of {}", args.all()[0])));
//!     });
//!     r.on("styles", |r| {
//!         r.on(extension("css"), |r| r.handle(|_, args| args[0].to_string()));
//!     });
//! })
//! .unwrap();
//!
//! assert_eq!(app.call(Request::get("/posts/42")).body(), "post 42");
//! assert_eq!(app.call(Request::get("/posts/42/comments")).body(), "comments of 42");
//! assert_eq!(app.call(Request::get("/styles/reset.css")).body(), "reset");
//! assert_eq!(app.call(Request::get("/styles/reset.bar")).status(), 404);
//! ```

pub mod app;
pub mod block;
pub mod config;
pub mod engine;
pub mod error;
pub mod path;
pub mod request;
pub mod response;
pub mod spec;
pub mod verb;

#[cfg(feature = "axum")]
pub mod adapter;

pub use app::App;
pub use block::{Args, Block, Flow, IntoReply, RouteBlock};
pub use config::Config;
pub use error::CompileError;
pub use request::{Request, RoutingContext};
pub use response::Response;
pub use spec::{accept, cond, extension, header, param, re, seg, MatchOption, Spec};
pub use verb::Verb;
