//! A throwaway registry for adapter tests: an axum server on an ephemeral
//! port that answers canned JSON by request path.

use std::sync::{Arc, Mutex};

use axum::{
  Json, Router,
  extract::State,
  http::{HeaderMap, StatusCode, Uri, header::AUTHORIZATION},
  response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::{OpenMrsClient, OpenMrsConfig};

pub struct Route {
  path:   &'static str,
  status: u16,
  body:   Value,
}

impl Route {
  pub fn json(path: &'static str, body: Value) -> Self { Self { path, status: 200, body } }

  pub fn status(path: &'static str, status: u16) -> Self {
    Self { path, status, body: Value::Null }
  }
}

pub struct Registry {
  routes:   Vec<Route>,
  requests: Mutex<Vec<String>>,
}

async fn answer(State(registry): State<Arc<Registry>>, uri: Uri, headers: HeaderMap) -> Response {
  registry.requests.lock().unwrap().push(uri.to_string());

  if !headers.contains_key(AUTHORIZATION) {
    return StatusCode::UNAUTHORIZED.into_response();
  }
  let path = uri.path().trim_start_matches("/openmrs");
  match registry.routes.iter().find(|r| r.path == path) {
    Some(route) => {
      let status = StatusCode::from_u16(route.status).unwrap();
      (status, Json(route.body.clone())).into_response()
    }
    None => StatusCode::NOT_FOUND.into_response(),
  }
}

/// Serve `routes` and return a client pointed at them, plus the log of
/// request URIs (path and query) the server received.
pub async fn serve_recording(routes: Vec<Route>) -> (OpenMrsClient, Arc<Registry>) {
  let registry = Arc::new(Registry { routes, requests: Mutex::new(Vec::new()) });
  let app = Router::new().fallback(answer).with_state(registry.clone());

  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

  let client = OpenMrsClient::new(OpenMrsConfig {
    url:          format!("http://{addr}/openmrs"),
    username:     "superman".into(),
    password:     "Admin123".into(),
    timeout_secs: 5,
  })
  .unwrap();
  (client, registry)
}

pub async fn serve(routes: Vec<Route>) -> OpenMrsClient { serve_recording(routes).await.0 }

impl Registry {
  pub fn requests(&self) -> Vec<String> { self.requests.lock().unwrap().clone() }
}
