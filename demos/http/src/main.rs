use axum::{extract::State, routing::get, Router};
use bytes::Bytes;
use http::{header::HeaderName, HeaderMap, Request};
use http_body_util::{BodyExt, Empty};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use tower::{Service, ServiceBuilder, ServiceExt};
use tower_header_forwarding::forward::{
    ForwardRule, HeaderForwardingClient, HeaderForwardingClientLayer, HeaderForwardingLayer,
};
use tracing::Level;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

type ForwardingClient = HeaderForwardingClient<Client<HttpConnector, Empty<Bytes>>>;

#[derive(Clone)]
struct AppState {
    client: ForwardingClient,
    downstream: String,
}

/// Calls the downstream route through the forwarding client; every header
/// selected from the inbound request is appended to that call automatically.
async fn frontend(State(state): State<AppState>) -> String {
    let request = Request::get(state.downstream.as_str())
        .body(Empty::new())
        .unwrap();

    let mut client = state.client.clone();
    let response = client.ready().await.unwrap().call(request).await.unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();

    format!("downstream saw:\n{}", String::from_utf8_lossy(&body))
}

/// Reports the `x-*` headers this request arrived with.
async fn downstream(headers: HeaderMap) -> String {
    let mut lines: Vec<String> = headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("x-"))
        .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or("<opaque>")))
        .collect();
    lines.sort();
    lines.join("\n")
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(LevelFilter::from_level(Level::DEBUG))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rule = ForwardRule::builder()
        .header(HeaderName::from_static("x-correlation-id"))
        .filter(|name| name.starts_with("x-b3-"))
        .build();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let client = ServiceBuilder::new()
        .layer(HeaderForwardingClientLayer::new())
        .service(Client::builder(TokioExecutor::new()).build_http::<Empty<Bytes>>());
    let state = AppState {
        client,
        downstream: format!("http://{addr}/downstream"),
    };

    let app = Router::new()
        .route("/", get(frontend))
        .route("/downstream", get(downstream))
        .layer(HeaderForwardingLayer::new(rule))
        .with_state(state);
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let probe = Client::builder(TokioExecutor::new()).build_http::<Empty<Bytes>>();
    let request = Request::get(format!("http://{addr}/"))
        .header("x-correlation-id", "45ccff40-63f9-4296-ae1d-67ff72f151a1")
        .header("x-b3-traceid", "80f198ee56343ba864fe8b2a57d3eff7")
        .header("x-b3-spanid", "e457b5a2e4d86bd1")
        .header("x-b3-sampled", "1")
        .header("x-not-forwarded", "stays-behind")
        .body(Empty::new())
        .unwrap();
    let response = probe.request(request).await.unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();

    tracing::info!("{}", String::from_utf8_lossy(&body));
}
