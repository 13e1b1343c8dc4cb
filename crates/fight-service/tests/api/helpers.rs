use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use fight_service::{app, build_state, infra::backend_mock::MockBackend, AppState, Settings};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub backend: Arc<MockBackend>,
    pub state: AppState,
    pub cancel_token: CancellationToken,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

/// Router wired to a seeded in-memory backend. Needs a running tokio runtime
pub fn spawn_app() -> TestApp {
    let backend = Arc::new(MockBackend::seeded(OffsetDateTime::now_utc()));
    let settings = Settings::default();
    let (state, _tracker, cancel_token) = build_state(backend.clone(), &settings);
    let router = app(state.clone(), settings.api_settings.origins);
    TestApp {
        router,
        backend,
        state,
        cancel_token,
    }
}

impl TestApp {
    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let request = with_auth(Request::builder().method("GET").uri(path), token, None)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: Value,
        token: Option<&str>,
        user_id: Option<&str>,
    ) -> (StatusCode, Value) {
        let request = with_auth(Request::builder().method("POST").uri(path), token, user_id)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    /// The tracker runs on its own task; poll until it has caught up
    pub async fn wait_for_unlocks(&self, count: usize) {
        for _ in 0..100 {
            if self.backend.unlocks().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {} unlocks, saw {:?}",
            count,
            self.backend.unlocks()
        );
    }
}

fn with_auth(
    builder: axum::http::request::Builder,
    token: Option<&str>,
    user_id: Option<&str>,
) -> axum::http::request::Builder {
    let builder = match token {
        Some(token) => builder.header("authorization", format!("Bearer {}", token)),
        None => builder,
    };
    match user_id {
        Some(user_id) => builder.header("x-user-id", user_id),
        None => builder,
    }
}
