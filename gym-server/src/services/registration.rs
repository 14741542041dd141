//! Account creation

use shared::models::{Gym, GymCreate, Member, RegisterRequest, RelatedDocument, Role, User};
use shared::{AppError, AppResult, ErrorCode};

use crate::auth::password::hash_password;
use crate::core::ServerState;
use crate::db::repository::gym::NewGym;
use crate::db::repository::user::NewUser;
use crate::db::repository::{RepoError, gym, member, user};
use crate::ledger::{self, LedgerEntry};

/// New member account, with the starting grant already on the ledger
#[derive(Debug, Clone)]
pub struct Registered {
    pub user: User,
    pub member: Member,
}

fn email_taken(err: RepoError, code: ErrorCode) -> AppError {
    match err {
        RepoError::Duplicate(_) => AppError::new(code),
        other => other.into(),
    }
}

/// Create a member user, its profile and the registration credit
///
/// The starting grant is a ledger credit (`REG-{member id}`) so the balance
/// equals the ledger sum from the first moment.
pub async fn register_member(state: &ServerState, req: &RegisterRequest) -> AppResult<Registered> {
    let password_hash = hash_password(&req.password).await?;
    let grant = state.config.starting_token_grant;
    let db = &state.db;

    let registered = db
        .bounded(async {
            let mut tx = db.writer.begin().await.map_err(RepoError::from)?;

            let user = user::create(
                &mut tx,
                NewUser {
                    name: &req.name,
                    email: &req.email,
                    password_hash: &password_hash,
                    role: Role::Member,
                    phone: req.phone.as_deref(),
                },
            )
            .await
            .map_err(|e| email_taken(e, ErrorCode::EmailAlreadyRegistered))?;

            let mut member = member::create(&mut tx, user.id).await?;

            if grant > 0 {
                let recorded = ledger::record(
                    &mut tx,
                    LedgerEntry::credit(member.id, grant, "Registration bonus")
                        .reference(format!("REG-{}", member.id))
                        .related(RelatedDocument::Registration),
                )
                .await?;
                member.token_balance = recorded.balance;
            }

            tx.commit().await.map_err(RepoError::from)?;
            Ok(Registered { user, member })
        })
        .await?;

    tracing::info!(
        user_id = registered.user.id,
        member_id = registered.member.id,
        member_code = %registered.member.member_code,
        "Member registered"
    );
    Ok(registered)
}

/// Seed the bootstrap admin; an existing account with that email is left alone
pub async fn ensure_admin(state: &ServerState, email: &str, password: &str) -> AppResult<()> {
    if let Some(existing) = user::find_by_email(&state.db.pool, email).await? {
        if existing.role != Role::Admin {
            tracing::warn!(
                email = %email,
                role = %existing.role,
                "Bootstrap admin email belongs to a non-admin account"
            );
        }
        return Ok(());
    }

    let password_hash = hash_password(password).await?;
    let db = &state.db;
    let admin = db
        .bounded(async {
            let mut tx = db.writer.begin().await.map_err(RepoError::from)?;
            let admin = user::create(
                &mut tx,
                NewUser {
                    name: "Administrator",
                    email,
                    password_hash: &password_hash,
                    role: Role::Admin,
                    phone: None,
                },
            )
            .await?;
            tx.commit().await.map_err(RepoError::from)?;
            Ok(admin)
        })
        .await?;

    tracing::info!(user_id = admin.id, email = %email, "Bootstrap admin created");
    Ok(())
}

/// Create a gym together with its owner account (role `gym`)
pub async fn create_gym(state: &ServerState, req: &GymCreate) -> AppResult<Gym> {
    let password_hash = hash_password(&req.password).await?;
    let hours = req.operating_hours.clone().unwrap_or_default();
    let db = &state.db;

    let gym = db
        .bounded(async {
            let mut tx = db.writer.begin().await.map_err(RepoError::from)?;

            let owner = user::create(
                &mut tx,
                NewUser {
                    name: &req.name,
                    email: &req.email,
                    password_hash: &password_hash,
                    role: Role::Gym,
                    phone: req.phone.as_deref(),
                },
            )
            .await
            .map_err(|e| email_taken(e, ErrorCode::GymEmailExists))?;

            let gym = gym::create(
                &mut tx,
                NewGym {
                    owner_id: owner.id,
                    name: &req.name,
                    email: &req.email,
                    phone: req.phone.as_deref(),
                    address: &req.address,
                    hours: &hours,
                },
            )
            .await
            .map_err(|e| email_taken(e, ErrorCode::GymEmailExists))?;

            tx.commit().await.map_err(RepoError::from)?;
            Ok(gym)
        })
        .await?;

    tracing::info!(gym_id = gym.id, owner_id = gym.owner_id, "Gym created");
    Ok(gym)
}
