mod auth;
mod context;
mod docs;
mod errors;
mod labs;
mod pages;
mod schemas;
mod serialized;
mod system;
mod topics;

use std::net::{Ipv4Addr, SocketAddr};

use axum::routing::get;
use log::info;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use auth::SESSION_COOKIE;
pub use context::ServerContext;
pub use errors::{ServerError, ServerResult};
pub use minijinja::Error as TemplateError;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 8080;

pub type Router = axum::Router<ServerContext>;

/// Builds the complete router with every page and API route
pub fn router(context: ServerContext) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        .nest("/topics", topics::router())
        .nest("/labs", labs::router())
        .nest("/auth", auth::router())
        .merge(system::router())
        .route("/docs", get(docs::docs));

    Router::new()
        .merge(pages::router())
        .nest("/api", api_router)
        .route("/health", get(system::health))
        .layer(cors)
        .with_state(context)
}

/// Starts the manual server
pub async fn run_server(context: ServerContext, port: u16) -> std::io::Result<()> {
    let addr: SocketAddr = (Ipv4Addr::UNSPECIFIED, port).into();
    let listener = TcpListener::bind(&addr).await?;

    info!("Listening on {}", addr);

    axum::serve(listener, router(context)).await
}
