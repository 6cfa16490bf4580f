use axum::{
    http::{header, HeaderValue},
    routing::get,
};
use log::info;
use std::{
    io,
    net::{Ipv6Addr, SocketAddr},
};
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;

mod auth;
mod config;
mod context;
mod cookies;
mod docs;
mod errors;
mod game;
mod schemas;
mod serialized;

pub use config::{Config, ConfigError};
pub use context::ServerContext;

pub type Router = axum::Router<ServerContext>;

/// Builds every route, with caching disabled on all responses
pub fn app(context: ServerContext) -> axum::Router {
    Router::new()
        .merge(game::router())
        .merge(auth::router())
        .route("/api.json", get(docs::docs))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .with_state(context)
}

/// Starts the campusguessr server
pub async fn run_server(context: ServerContext) -> io::Result<()> {
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, context.config.port).into();
    let listener = TcpListener::bind(&addr).await?;

    info!("Listening on {}", addr);

    axum::serve(listener, app(context)).await
}
