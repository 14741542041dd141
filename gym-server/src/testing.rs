//! Fixtures for unit tests: a migrated database in a temp dir

use std::sync::Arc;

use shared::models::{Class, ClassCreate, Member, RegisterRequest};
use tempfile::TempDir;

use crate::auth::{JwtConfig, JwtService};
use crate::core::{Config, ServerState};
use crate::db::DbService;
use crate::db::repository::class;
use crate::services::attendance::CheckIn;
use crate::services::registration;

pub struct TestEnv {
    pub state: ServerState,
    _dir: TempDir,
}

impl TestEnv {
    /// Fresh database; registration grant 10, gym check-in cost 1
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::with_overrides(dir.path().to_string_lossy(), 0);
        config.starting_token_grant = 10;
        config.gym_checkin_cost = 1;
        config.reconcile_interval_secs = 0;
        config.auth_rate_limit = 1_000;
        config.jwt = JwtConfig {
            secret: "unit-test-secret-that-is-long-enough!!".into(),
            expiration_minutes: 60,
            issuer: "gym-server".into(),
            audience: "gym-clients".into(),
        };

        let db = DbService::new(&config.database_file().to_string_lossy())
            .await
            .unwrap();
        let jwt = Arc::new(JwtService::with_config(config.jwt.clone()));
        Self {
            state: ServerState::new(config, db, jwt),
            _dir: dir,
        }
    }

    /// Registered member holding the starting grant
    pub async fn member(&self, email: &str) -> Member {
        let req = RegisterRequest {
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            password: "password123".into(),
            phone: None,
        };
        registration::register_member(&self.state, &req)
            .await
            .unwrap()
            .member
    }

    pub async fn class(&self, data: ClassCreate) -> Class {
        let mut conn = self.state.db.writer.acquire().await.unwrap();
        class::create(&mut conn, &data, None).await.unwrap()
    }
}

pub fn check_in_req(member_id: i64, class_id: Option<i64>) -> CheckIn {
    CheckIn {
        member_id,
        class_id,
        actor: None,
    }
}
