#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use bedtime_api::auth::{AppState, AppStateInner, JwtConfig};
use bedtime_api::routes;
use bedtime_db::Database;

pub const ADMIN: &str = "admin-1";
pub const PARENT: &str = "parent-1";
pub const OTHER_PARENT: &str = "parent-2";

pub struct TestApp {
    pub state: AppState,
    router: Router,
    jwt: JwtConfig,
}

impl TestApp {
    pub fn new() -> Self {
        let jwt = JwtConfig::new("integration-test-secret", None);
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt: jwt.clone(),
        });
        let router = routes::router(state.clone());
        Self { state, router, jwt }
    }

    /// App with `ADMIN` already holding the admin flag.
    pub async fn with_admin() -> Self {
        let app = Self::new();
        app.save_settings(ADMIN, "9999").await;
        assert!(app.state.db.set_admin(ADMIN, true).unwrap());
        app
    }

    pub fn token(&self, user_id: &str) -> String {
        self.jwt
            .issue(user_id, chrono::Duration::minutes(10))
            .unwrap()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, user: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, user, None).await
    }

    pub async fn post(&self, uri: &str, user: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn save_settings(&self, user: &str, pin: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/parent-settings",
                user,
                json!({
                    "pin": pin,
                    "readingTimeLimit": 20,
                    "fullscreenLockEnabled": true,
                    "theme": "night",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }

    /// Create a story as `user` and return its JSON.
    pub async fn create_story(&self, user: &str, title: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/stories",
                user,
                json!({
                    "title": title,
                    "content": "Once upon a time, a little owl could not sleep.",
                    "summary": "An owl learns to rest.",
                    "imageUrl": "https://img.example/owl.png",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    pub async fn submit(&self, user: &str, story_id: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            &format!("/api/stories/{story_id}/submit"),
            Some(user),
            None,
        )
        .await
    }

    pub async fn review(&self, user: &str, story_id: &str, body: Value) -> (StatusCode, Value) {
        self.post(&format!("/api/admin/review-story/{story_id}"), user, body)
            .await
    }

    /// Create, submit and approve a story; returns its id.
    pub async fn published_story(&self, user: &str, title: &str) -> String {
        let id = self.create_story(user, title).await["id"]
            .as_str()
            .unwrap()
            .to_string();
        assert_eq!(self.submit(user, &id).await.0, StatusCode::OK);
        let (status, body) = self.review(ADMIN, &id, json!({ "action": "approve" })).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        id
    }
}
