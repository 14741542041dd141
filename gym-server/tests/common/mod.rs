//! In-process test harness: migrated temp database, full middleware stack

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use gym_server::auth::JwtConfig;
use gym_server::{Config, ServerState, build_app};
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@gym.test";
pub const ADMIN_PASSWORD: &str = "admin-password-1";

pub struct TestApp {
    pub app: Router,
    pub state: ServerState,
    _dir: TempDir,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: http::HeaderMap,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Numeric error code of a failure envelope
    pub fn code(&self) -> Option<u64> {
        self.json()["code"].as_u64()
    }
}

impl TestApp {
    /// Fresh app: grant 10, check-in cost 1, bootstrap admin
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::with_overrides(dir.path().to_string_lossy(), 0);
        config.starting_token_grant = 10;
        config.gym_checkin_cost = 1;
        config.reconcile_interval_secs = 0;
        config.auth_rate_limit = 10_000;
        config.admin_email = Some(ADMIN_EMAIL.into());
        config.admin_password = Some(ADMIN_PASSWORD.into());
        config.log_dir = None;
        config.jwt = JwtConfig {
            secret: "integration-test-secret-long-enough!!".into(),
            expiration_minutes: 60,
            issuer: "gym-server".into(),
            audience: "gym-clients".into(),
        };

        let state = ServerState::initialize(&config).await.unwrap();
        Self {
            app: build_app(&state),
            state,
            _dir: dir,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        Reply {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> Reply {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Reply {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Reply {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn admin_token(&self) -> String {
        let reply = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "admin login: {}", reply.text());
        reply.json()["data"]["token"].as_str().unwrap().to_string()
    }

    /// Register a member; returns (token, member id)
    pub async fn register(&self, email: &str) -> (String, i64) {
        let (token, member_id, _) = self.register_account(email).await;
        (token, member_id)
    }

    /// Register a member; returns (token, member id, user id)
    pub async fn register_account(&self, email: &str) -> (String, i64, i64) {
        let reply = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "name": email.split('@').next().unwrap(),
                    "email": email,
                    "password": "password123",
                })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "register: {}", reply.text());
        let data = &reply.json()["data"];
        (
            data["token"].as_str().unwrap().to_string(),
            data["profile"]["memberId"].as_i64().unwrap(),
            data["user"]["id"].as_i64().unwrap(),
        )
    }

    /// Class created by the admin; returns its id
    pub async fn class(&self, admin: &str, capacity: i64, cost: i64) -> i64 {
        let reply = self
            .post(
                "/api/classes",
                admin,
                json!({
                    "name": "Spin",
                    "day": "monday",
                    "startTime": "18:00",
                    "durationMinutes": 60,
                    "maxCapacity": capacity,
                    "tokenCost": cost,
                }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "class: {}", reply.text());
        reply.json()["data"]["id"].as_i64().unwrap()
    }

    pub async fn balance(&self, token: &str, member_id: i64) -> i64 {
        let reply = self
            .get(&format!("/api/tokens/balance/{member_id}"), token)
            .await;
        assert_eq!(reply.status, StatusCode::OK, "balance: {}", reply.text());
        reply.json()["data"]["balance"].as_i64().unwrap()
    }
}
