// Demo: serve a small route tree over HTTP
//
// cargo run -p rhtmx-dispatch --example server --features axum

use rhtmx_dispatch::adapter;
use rhtmx_dispatch::{extension, param, seg, App, Config, Flow};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load_default().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}, using defaults", e);
        Config::default()
    });

    let events = App::build(|r| {
        r.on("", |r| r.handle(|_, _| "Hooray"));
        r.is((), |r| r.handle(|_, _| "Foo"));
    })?
    .shared();

    let app = App::build_with_config(config, |r| {
        r.is("", |r| r.handle(|_, _| "<h1>Welcome to RHTMX Dispatch</h1>"));

        r.on("user", |r| {
            r.get(seg(), |r| {
                r.handle(|_, args| format!("<p>User {}</p>", &args[0]));
            });
        });

        r.get(("signup", param("email")), |r| {
            r.handle(|_, args| format!("<p>Signing up {}</p>", &args[0]));
        });

        r.on("styles", |r| {
            r.get(extension("css"), |r| {
                r.handle(|ctx, args| {
                    ctx.response_mut().set_header("Content-Type", "text/css");
                    ctx.write(format!("/* {} */", &args[0]));
                    Flow::Halt
                });
            });
        });

        r.on("events", |r| r.run(events.clone()));
    })?
    .shared();

    let router = adapter::router(app);

    let addr = "127.0.0.1:3000";
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, router).await?;

    Ok(())
}
