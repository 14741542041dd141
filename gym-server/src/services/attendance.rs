//! Check-in, check-out and class withdrawal
//!
//! A check-in opens an attendance session and pays for it with one ledger
//! debit tagged with the attendance. With a class it is also the enrollment:
//! the member takes a seat and joins the participant list. Checks run in a
//! fixed order before anything is written, and the first failure is
//! reported:
//!
//! 1. member exists, then member is active
//! 2. class exists and is active (cost = class token cost, or the flat gym
//!    check-in cost without a class)
//! 3. no open session
//! 4. balance covers the cost
//! 5. class has a free seat, then member not already enrolled
//!
//! All of it runs in one writer transaction, so two check-ins can never both
//! pass a check that only one of them should.

use shared::models::{
    Attendance, CheckInResult, CheckOutResult, Class, RelatedDocument, duration_minutes,
};
use shared::util::now_millis;
use shared::{AppError, AppResult, ErrorCode};

use crate::core::ServerState;
use crate::db::repository::{RepoError, attendance, class, member};
use crate::ledger::{self, LedgerEntry};

#[derive(Debug, Clone)]
pub struct CheckIn {
    pub member_id: i64,
    pub class_id: Option<i64>,
    /// Acting user, recorded on the ledger entry
    pub actor: Option<i64>,
}

pub async fn check_in(state: &ServerState, req: CheckIn) -> AppResult<CheckInResult> {
    let db = &state.db;
    let flat_cost = state.config.gym_checkin_cost;

    let result = db
        .bounded(async {
            let mut tx = db.writer.begin().await.map_err(RepoError::from)?;

            let member = member::find_by_id(&mut *tx, req.member_id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::MemberNotFound))?;
            if !member.is_active {
                return Err(AppError::new(ErrorCode::MemberInactive));
            }

            let class = match req.class_id {
                Some(class_id) => Some(load_active_class(&mut tx, class_id).await?),
                None => None,
            };
            let cost = class.as_ref().map_or(flat_cost, |c| c.token_cost);

            if let Some(open) = attendance::find_open_by_member(&mut *tx, member.id).await? {
                return Err(AppError::new(ErrorCode::AlreadyCheckedIn)
                    .with_detail("attendanceId", open.id));
            }

            if member.token_balance < cost {
                return Err(AppError::new(ErrorCode::InsufficientTokens)
                    .with_detail("balance", member.token_balance)
                    .with_detail("required", cost));
            }

            if let Some(class) = &class {
                if class.is_full() {
                    return Err(class_full(class));
                }
                if class::is_participant(&mut *tx, class.id, member.id).await? {
                    return Err(AppError::new(ErrorCode::AlreadyEnrolled));
                }
            }

            let now = now_millis();
            let attendance_id = attendance::insert(&mut tx, member.id, req.class_id, now, cost)
                .await
                .map_err(|e| match e {
                    RepoError::Duplicate(_) => AppError::new(ErrorCode::AlreadyCheckedIn),
                    other => other.into(),
                })?;

            if let Some(class) = &class {
                if !class::increment_enrollment(&mut *tx, class.id).await? {
                    return Err(class_full(class));
                }
                class::add_participant(&mut *tx, class.id, member.id, now)
                    .await
                    .map_err(|e| match e {
                        RepoError::Duplicate(_) => AppError::new(ErrorCode::AlreadyEnrolled),
                        other => other.into(),
                    })?;
            }

            let balance = if cost > 0 {
                let description = match &class {
                    Some(class) => format!("Class attendance: {}", class.name),
                    None => "Gym check-in".to_string(),
                };
                let mut entry = LedgerEntry::debit(member.id, cost, description)
                    .reference(format!("CHECKIN-{attendance_id}"))
                    .related(RelatedDocument::Attendance { id: attendance_id });
                entry.created_by = req.actor;
                ledger::record(&mut tx, entry).await?.balance
            } else {
                member.token_balance
            };

            member::record_check_in(&mut *tx, member.id, now).await?;
            tx.commit().await.map_err(RepoError::from)?;

            Ok(CheckInResult {
                attendance_id,
                remaining_tokens: balance,
                token_used: cost,
                class_id: req.class_id,
                check_in: now,
            })
        })
        .await?;

    tracing::info!(
        member_id = req.member_id,
        class_id = ?req.class_id,
        attendance_id = result.attendance_id,
        token_used = result.token_used,
        remaining = result.remaining_tokens,
        "Member checked in"
    );
    Ok(result)
}

async fn load_active_class(conn: &mut sqlx::SqliteConnection, class_id: i64) -> AppResult<Class> {
    let class = class::find_by_id(&mut *conn, class_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ClassNotFound))?;
    if !class.is_active {
        return Err(AppError::new(ErrorCode::ClassInactive));
    }
    Ok(class)
}

fn class_full(class: &Class) -> AppError {
    AppError::new(ErrorCode::ClassFull)
        .with_detail("classId", class.id)
        .with_detail("maxCapacity", class.max_capacity)
}

/// Close an open session; no ledger effect
pub async fn check_out(state: &ServerState, attendance_id: i64) -> AppResult<CheckOutResult> {
    let db = &state.db;
    let closed = db
        .bounded(async {
            let mut tx = db.writer.begin().await.map_err(RepoError::from)?;
            let record = attendance::find_by_id(&mut *tx, attendance_id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::AttendanceNotFound))?;
            if !record.is_open() || !attendance::close(&mut *tx, attendance_id, now_millis()).await? {
                return Err(AppError::new(ErrorCode::AlreadyCheckedOut));
            }
            let closed = attendance::find_by_id(&mut *tx, attendance_id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::AttendanceNotFound))?;
            tx.commit().await.map_err(RepoError::from)?;
            Ok(closed)
        })
        .await?;

    let check_out = closed.check_out.unwrap_or(closed.check_in);
    let duration = duration_minutes(closed.check_in, check_out);
    tracing::info!(
        attendance_id,
        member_id = closed.member_id,
        duration,
        "Member checked out"
    );
    Ok(CheckOutResult {
        attendance_id,
        check_out,
        duration,
    })
}

/// Load one record, for ownership checks before check-out
pub async fn get_attendance(state: &ServerState, attendance_id: i64) -> AppResult<Attendance> {
    state
        .db
        .bounded(async {
            attendance::find_by_id(&state.db.pool, attendance_id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::AttendanceNotFound))
        })
        .await
}

/// Remove a participant and free the seat; tokens are not returned
pub async fn withdraw(state: &ServerState, class_id: i64, member_id: i64) -> AppResult<()> {
    let db = &state.db;
    db.bounded(async {
        let mut tx = db.writer.begin().await.map_err(RepoError::from)?;
        if class::find_by_id(&mut *tx, class_id).await?.is_none() {
            return Err(AppError::new(ErrorCode::ClassNotFound));
        }
        if !class::remove_participant(&mut *tx, class_id, member_id).await? {
            return Err(AppError::new(ErrorCode::NotEnrolled));
        }
        class::decrement_enrollment(&mut *tx, class_id).await?;
        tx.commit().await.map_err(RepoError::from)?;
        Ok(())
    })
    .await?;

    tracing::info!(class_id, member_id, "Participant withdrawn");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestEnv, check_in_req};
    use shared::models::{ClassCreate, Weekday};

    fn spin(capacity: i64, cost: i64) -> ClassCreate {
        ClassCreate {
            name: "Spin".into(),
            description: None,
            trainer: None,
            gym_id: None,
            day: Weekday::Monday,
            start_time: "18:00".into(),
            duration_minutes: 45,
            max_capacity: capacity,
            token_cost: cost,
        }
    }

    #[tokio::test]
    async fn test_class_check_in_debits_cost() {
        let env = TestEnv::new().await;
        let member = env.member("ada@example.com").await;
        let class = env.class(spin(10, 3)).await;

        let result = check_in(&env.state, check_in_req(member.id, Some(class.id)))
            .await
            .unwrap();
        assert_eq!(result.remaining_tokens, 7);
        assert_eq!(result.token_used, 3);

        let class = class::find_by_id(&env.state.db.pool, class.id).await.unwrap().unwrap();
        assert_eq!(class.current_enrollment, 1);
        let member = member::find_by_id(&env.state.db.pool, member.id).await.unwrap().unwrap();
        assert_eq!(member.token_balance, 7);
        assert_eq!(member.check_in_count, 1);
    }

    #[tokio::test]
    async fn test_second_open_session_rejected() {
        let env = TestEnv::new().await;
        let member = env.member("bob@example.com").await;

        check_in(&env.state, check_in_req(member.id, None)).await.unwrap();
        let err = check_in(&env.state, check_in_req(member.id, None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyCheckedIn);

        let member = member::find_by_id(&env.state.db.pool, member.id).await.unwrap().unwrap();
        assert_eq!(member.token_balance, 9);
    }

    #[tokio::test]
    async fn test_check_order_reports_first_failure() {
        let env = TestEnv::new().await;
        let member = env.member("cy@example.com").await;
        let class = env.class(spin(1, 50)).await;

        let err = check_in(&env.state, check_in_req(member.id, Some(class.id)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientTokens);

        let err = check_in(&env.state, check_in_req(9999, Some(class.id)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MemberNotFound);

        let err = check_in(&env.state, check_in_req(member.id, Some(9999)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ClassNotFound);
    }

    #[tokio::test]
    async fn test_inactive_member_rejected() {
        let env = TestEnv::new().await;
        let member = env.member("dee@example.com").await;
        member::set_active(&env.state.db.writer, member.id, false).await.unwrap();

        let err = check_in(&env.state, check_in_req(member.id, None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MemberInactive);
    }

    #[tokio::test]
    async fn test_full_class_and_reenrollment() {
        let env = TestEnv::new().await;
        let a = env.member("a@example.com").await;
        let b = env.member("b@example.com").await;
        let class = env.class(spin(1, 1)).await;

        check_in(&env.state, check_in_req(a.id, Some(class.id))).await.unwrap();
        let err = check_in(&env.state, check_in_req(b.id, Some(class.id)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ClassFull);

        // close the session; the seat is still taken until withdrawal
        let open = attendance::find_open_by_member(&env.state.db.pool, a.id)
            .await
            .unwrap()
            .unwrap();
        check_out(&env.state, open.id).await.unwrap();
        let err = check_in(&env.state, check_in_req(b.id, Some(class.id)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ClassFull);

        withdraw(&env.state, class.id, a.id).await.unwrap();
        check_in(&env.state, check_in_req(b.id, Some(class.id))).await.unwrap();
    }

    #[tokio::test]
    async fn test_already_enrolled_after_checkout() {
        let env = TestEnv::new().await;
        let member = env.member("eve@example.com").await;
        let class = env.class(spin(5, 1)).await;

        let first = check_in(&env.state, check_in_req(member.id, Some(class.id)))
            .await
            .unwrap();
        check_out(&env.state, first.attendance_id).await.unwrap();

        let err = check_in(&env.state, check_in_req(member.id, Some(class.id)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyEnrolled);
    }

    #[tokio::test]
    async fn test_check_out_twice() {
        let env = TestEnv::new().await;
        let member = env.member("fay@example.com").await;
        let session = check_in(&env.state, check_in_req(member.id, None)).await.unwrap();

        let out = check_out(&env.state, session.attendance_id).await.unwrap();
        assert!(out.check_out >= session.check_in);
        assert_eq!(out.duration, 0);

        let err = check_out(&env.state, session.attendance_id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyCheckedOut);

        let err = check_out(&env.state, 424242).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AttendanceNotFound);
    }

    #[tokio::test]
    async fn test_free_class_writes_no_ledger_entry() {
        let env = TestEnv::new().await;
        let member = env.member("gus@example.com").await;
        let class = env.class(spin(5, 0)).await;

        let result = check_in(&env.state, check_in_req(member.id, Some(class.id)))
            .await
            .unwrap();
        assert_eq!(result.remaining_tokens, 10);

        let summary = ledger::get_balance(&env.state.db, member.id).await.unwrap();
        assert_eq!(summary.total_debits, 0);
        assert_eq!(summary.balance, 10);
    }

    #[tokio::test]
    async fn test_withdraw_not_enrolled() {
        let env = TestEnv::new().await;
        let member = env.member("hal@example.com").await;
        let class = env.class(spin(5, 1)).await;

        let err = withdraw(&env.state, class.id, member.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotEnrolled);
        let err = withdraw(&env.state, 777, member.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ClassNotFound);
    }
}
