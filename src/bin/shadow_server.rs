use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use shadow_maze::shadow_store::ShadowStore;
use tokio::sync::Mutex;

type SharedState = Arc<Mutex<HashMap<String, ShadowStore>>>;

#[tokio::main]
async fn main() {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let state: SharedState = Arc::new(Mutex::new(HashMap::new()));
    let app = build_router(state);

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind server socket");

    println!("[shadow-server] listening on :{port}");
    axum::serve(listener, app)
        .await
        .expect("server runtime failed");
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/things/{thing}/shadow",
            get(get_shadow).post(update_shadow),
        )
        .with_state(state)
}

async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn get_shadow(
    State(state): State<SharedState>,
    Path(thing): Path<String>,
) -> (StatusCode, Json<Value>) {
    let guard = state.lock().await;
    match guard.get(&thing) {
        Some(store) => (StatusCode::OK, Json(store.to_value())),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("no shadow exists for thing '{thing}'") })),
        ),
    }
}

async fn update_shadow(
    State(state): State<SharedState>,
    Path(thing): Path<String>,
    body: String,
) -> (StatusCode, Json<Value>) {
    let mut guard = state.lock().await;
    let existed = guard.contains_key(&thing);
    let store = guard.entry(thing.clone()).or_default();
    match store.apply_update(&body) {
        Ok(version) => {
            println!("[shadow-server] {thing} updated to version {version}");
            (StatusCode::OK, Json(store.to_value()))
        }
        Err(error) => {
            if !existed {
                guard.remove(&thing);
            }
            eprintln!("[shadow-server] rejected update for {thing}: {error}");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": error.to_string() })),
            )
        }
    }
}
