use std::collections::HashSet;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

#[cfg(feature = "http-server")]
#[allow(dead_code)]
pub mod app {
    //! In-process app builders for driving the router with `oneshot`.

    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::Value;
    use tower::ServiceExt;

    use recall_backend::db::repositories::LocalRepository;
    use recall_backend::db::repository::FullRepository;
    use recall_backend::http::{create_router, AppState};
    use recall_backend::models::FixedClock;

    pub fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 31, 8, 0, 0).unwrap()
    }

    /// A router over a fresh in-memory store, plus handles to poke at both.
    pub struct TestApp {
        pub router: Router,
        pub repo: LocalRepository,
        pub clock: Arc<FixedClock>,
    }

    impl TestApp {
        pub fn new() -> Self {
            let repo = LocalRepository::new();
            let clock = Arc::new(FixedClock::new(start()));
            let state = AppState::new(Arc::new(repo.clone()) as Arc<dyn FullRepository>)
                .with_clock(clock.clone());
            Self {
                router: create_router(state),
                repo,
                clock,
            }
        }

        /// Send a request and return the status with the parsed JSON body.
        pub async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            let body = match body {
                Some(json) => {
                    builder = builder.header(header::CONTENT_TYPE, "application/json");
                    Body::from(json.to_string())
                }
                None => Body::empty(),
            };
            self.send_request(builder.body(body).unwrap()).await
        }

        pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes)
                    .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
            };
            (status, json)
        }

        /// Register a user and return their bearer token.
        pub async fn register(&self, name: &str, email: &str) -> String {
            let (status, body) = self
                .send(
                    Method::POST,
                    "/v1/register",
                    None,
                    Some(serde_json::json!({
                        "name": name,
                        "email": email,
                        "password": "correct horse battery",
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            body["data"]["token"].as_str().unwrap().to_string()
        }
    }
}
