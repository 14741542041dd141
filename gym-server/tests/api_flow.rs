//! End-to-end flows through the HTTP stack

mod common;

use common::TestApp;
use futures::future::join_all;
use gym_server::ErrorCode;
use http::{Method, StatusCode, header};
use serde_json::json;

fn code(c: ErrorCode) -> Option<u64> {
    Some(c.code() as u64)
}

#[tokio::test]
async fn test_class_check_in_and_check_out() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (member, member_id) = app.register("ana@gym.test").await;
    assert_eq!(app.balance(&member, member_id).await, 10);

    let class_id = app.class(&admin, 10, 3).await;
    let reply = app
        .post(
            "/api/attendance/checkin",
            &member,
            json!({ "memberId": member_id, "classId": class_id }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.text());
    let data = reply.json()["data"].clone();
    assert_eq!(data["remainingTokens"], 7);
    assert_eq!(data["tokenUsed"], 3);
    let attendance_id = data["attendanceId"].as_i64().unwrap();

    let class = app.get(&format!("/api/classes/{class_id}"), &member).await;
    assert_eq!(class.json()["data"]["currentEnrollment"], 1);

    let reply = app
        .post(&format!("/api/attendance/checkout/{attendance_id}"), &member, json!({}))
        .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.text());
    assert_eq!(app.balance(&member, member_id).await, 7);

    let again = app
        .post(&format!("/api/attendance/checkout/{attendance_id}"), &member, json!({}))
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.code(), code(ErrorCode::AlreadyCheckedOut));
}

#[tokio::test]
async fn test_single_open_session() {
    let app = TestApp::new().await;
    let (member, member_id) = app.register("ben@gym.test").await;

    let first = app
        .post("/api/attendance/checkin", &member, json!({ "memberId": member_id }))
        .await;
    assert_eq!(first.status, StatusCode::CREATED, "{}", first.text());

    let second = app
        .post("/api/attendance/checkin", &member, json!({ "memberId": member_id }))
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.code(), code(ErrorCode::AlreadyCheckedIn));
    assert_eq!(app.balance(&member, member_id).await, 9);
}

#[tokio::test]
async fn test_admin_credit_with_reference() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (member, member_id) = app.register("cai@gym.test").await;

    let adjustment = json!({ "amount": 20, "description": "Promo", "reference": "promo" });
    let reply = app
        .post(&format!("/api/tokens/{member_id}/credit"), &admin, adjustment.clone())
        .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.text());
    assert_eq!(reply.json()["data"]["balance"], 30);
    assert_eq!(reply.json()["data"]["transaction"]["reference"], "promo");

    let duplicate = app
        .post(&format!("/api/tokens/{member_id}/credit"), &admin, adjustment)
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.code(), code(ErrorCode::DuplicateReference));

    assert_eq!(app.balance(&member, member_id).await, 30);

    let history = app
        .get("/api/tokens/transactions?type=credit", &member)
        .await;
    assert_eq!(history.status, StatusCode::OK, "{}", history.text());
    assert_eq!(history.json()["total"], 2);
}

#[tokio::test]
async fn test_refund_exceeding_balance_is_rejected() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (member, member_id) = app.register("dee@gym.test").await;

    let reply = app
        .post(
            "/api/payments",
            &admin,
            json!({
                "memberId": member_id,
                "tokens": 15,
                "paymentDetails": { "amount": 30.0, "method": "card" },
            }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.text());
    assert_eq!(reply.json()["data"]["newBalance"], 25);
    let payment_id = reply.json()["data"]["payment"]["id"].as_i64().unwrap();

    let spend = app
        .post(&format!("/api/tokens/{member_id}/debit"), &admin, json!({ "amount": 15 }))
        .await;
    assert_eq!(spend.status, StatusCode::OK, "{}", spend.text());
    assert_eq!(app.balance(&member, member_id).await, 10);

    let refund = app
        .post(
            &format!("/api/payments/{payment_id}/refund"),
            &admin,
            json!({ "reason": "changed mind" }),
        )
        .await;
    assert_eq!(refund.status, StatusCode::BAD_REQUEST);
    assert_eq!(refund.code(), code(ErrorCode::InsufficientBalance));

    let payment = app.get(&format!("/api/payments/{payment_id}"), &member).await;
    assert_eq!(payment.json()["data"]["status"], "completed");
    assert_eq!(app.balance(&member, member_id).await, 10);
}

#[tokio::test]
async fn test_concurrent_enrollment_respects_capacity() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let capacity = 3;
    let class_id = app.class(&admin, capacity, 1).await;

    let mut members = Vec::new();
    for i in 0..=capacity {
        members.push(app.register(&format!("m{i}@gym.test")).await);
    }

    let uri = format!("/api/classes/{class_id}/enroll");
    let replies = join_all(
        members
            .iter()
            .map(|(token, _)| app.send(Method::POST, &uri, Some(token), None)),
    )
    .await;

    let enrolled = replies.iter().filter(|r| r.status == StatusCode::CREATED).count();
    let full = replies
        .iter()
        .filter(|r| r.code() == code(ErrorCode::ClassFull))
        .count();
    assert_eq!(enrolled, capacity as usize);
    assert_eq!(full, 1);

    let class = app.get(&format!("/api/classes/{class_id}"), &admin).await;
    assert_eq!(class.json()["data"]["currentEnrollment"], capacity);
}

#[tokio::test]
async fn test_role_gating() {
    let app = TestApp::new().await;
    let (member, member_id) = app.register("eve@gym.test").await;
    let (other, other_id) = app.register("fay@gym.test").await;

    let anonymous = app
        .send(Method::GET, "/api/members/me", None, None)
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let forged = app.get("/api/members/me", "not-a-token").await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);

    let credit = app
        .post(&format!("/api/tokens/{member_id}/credit"), &member, json!({ "amount": 5 }))
        .await;
    assert_eq!(credit.status, StatusCode::FORBIDDEN);

    let foreign = app.get(&format!("/api/tokens/balance/{other_id}"), &member).await;
    assert_eq!(foreign.status, StatusCode::FORBIDDEN);
    assert_eq!(app.balance(&other, other_id).await, 10);

    let export = app.get("/api/reports/export/members/csv", &member).await;
    assert_eq!(export.status, StatusCode::FORBIDDEN);

    let public = app.send(Method::GET, "/api/gyms", None, None).await;
    assert_eq!(public.status, StatusCode::OK);
}

#[tokio::test]
async fn test_csv_export_header_only_when_empty() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let reply = app.get("/api/reports/export/gyms/csv", &admin).await;
    assert_eq!(reply.status, StatusCode::OK);
    let content_type = reply.headers[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/csv"));
    let disposition = reply.headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"gyms-"));
    assert_eq!(reply.text().lines().count(), 1);

    let unknown = app.get("/api/reports/export/orders/csv", &admin).await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ledger_sums_match_balances() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (member, member_id) = app.register("gus@gym.test").await;
    let class_id = app.class(&admin, 5, 2).await;

    app.post(&format!("/api/tokens/{member_id}/credit"), &admin, json!({ "amount": 4 }))
        .await;
    let enroll = app
        .send(Method::POST, &format!("/api/classes/{class_id}/enroll"), Some(&member), None)
        .await;
    assert_eq!(enroll.status, StatusCode::CREATED, "{}", enroll.text());

    let summary = app
        .get(&format!("/api/tokens/balance/{member_id}"), &member)
        .await
        .json()["data"]
        .clone();
    assert_eq!(summary["balance"], 12);
    assert_eq!(
        summary["totalCredits"].as_i64().unwrap() - summary["totalDebits"].as_i64().unwrap(),
        12
    );

    let report = app.get("/api/tokens/reconcile", &admin).await;
    assert_eq!(report.status, StatusCode::OK, "{}", report.text());
    assert_eq!(report.json()["data"]["driftCount"], 0);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let reply = app.send(Method::GET, "/api/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["status"], "ok");
    assert!(reply.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_deactivated_account_is_rejected() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (member, member_id, user_id) = app.register_account("hal@gym.test").await;

    let reply = app
        .put(&format!("/api/admin/users/{user_id}"), &admin, json!({ "isActive": false }))
        .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.text());
    assert_eq!(reply.json()["data"]["isActive"], false);

    let check_in = app
        .post("/api/attendance/checkin", &member, json!({ "memberId": member_id }))
        .await;
    assert_eq!(check_in.status, StatusCode::FORBIDDEN);
    assert_eq!(check_in.code(), code(ErrorCode::AccountDisabled));

    let balance = app.get(&format!("/api/tokens/balance/{member_id}"), &member).await;
    assert_eq!(balance.status, StatusCode::FORBIDDEN);

    let reply = app
        .put(&format!("/api/admin/users/{user_id}"), &admin, json!({ "isActive": true }))
        .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.text());
    assert_eq!(app.balance(&member, member_id).await, 10);
}

#[tokio::test]
async fn test_role_change_applies_to_existing_token() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (member, _, user_id) = app.register_account("ida@gym.test").await;

    let before = app.get("/api/admin/users", &member).await;
    assert_eq!(before.status, StatusCode::FORBIDDEN);

    let reply = app
        .put(&format!("/api/admin/users/{user_id}"), &admin, json!({ "role": "admin" }))
        .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.text());

    let after = app.get("/api/admin/users", &member).await;
    assert_eq!(after.status, StatusCode::OK, "{}", after.text());
}

#[tokio::test]
async fn test_malformed_requests_use_envelope() {
    let app = TestApp::new().await;
    let (member, _) = app.register("jon@gym.test").await;

    let replies = [
        app.post("/api/attendance/checkin", &member, json!({ "memberId": "abc" }))
            .await,
        app.get("/api/tokens/transactions?type=bogus", &member).await,
        app.get("/api/tokens/balance/abc", &member).await,
    ];
    for reply in replies {
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{}", reply.text());
        let body = reply.json();
        assert_eq!(body["success"], false, "{}", reply.text());
        assert_eq!(reply.code(), code(ErrorCode::InvalidRequest));
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }
}

#[tokio::test]
async fn test_my_classes_lists_enrollments() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (member, _) = app.register("kim@gym.test").await;
    let (other, _) = app.register("lou@gym.test").await;
    let enrolled = app.class(&admin, 10, 1).await;
    let skipped = app.class(&admin, 10, 1).await;

    let enroll = app
        .send(Method::POST, &format!("/api/classes/{enrolled}/enroll"), Some(&member), None)
        .await;
    assert_eq!(enroll.status, StatusCode::CREATED, "{}", enroll.text());
    let enroll = app
        .send(Method::POST, &format!("/api/classes/{skipped}/enroll"), Some(&other), None)
        .await;
    assert_eq!(enroll.status, StatusCode::CREATED, "{}", enroll.text());

    let reply = app.get("/api/classes/my", &member).await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.text());
    let body = reply.json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["id"], enrolled);

    let admin_reply = app.get("/api/classes/my", &admin).await;
    assert_eq!(admin_reply.status, StatusCode::NOT_FOUND);
    assert_eq!(admin_reply.code(), code(ErrorCode::MemberNotFound));
}

#[tokio::test]
async fn test_gym_members_for_owner_and_admin() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let gym = app
        .post(
            "/api/gyms",
            &admin,
            json!({ "name": "Iron Temple", "email": "owner@iron.test", "password": "owner-pass-1" }),
        )
        .await;
    assert_eq!(gym.status, StatusCode::CREATED, "{}", gym.text());
    let gym_id = gym.json()["data"]["id"].as_i64().unwrap();

    let login = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "owner@iron.test", "password": "owner-pass-1" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK, "{}", login.text());
    let owner = login.json()["data"]["token"].as_str().unwrap().to_string();

    let class = app
        .post(
            "/api/classes",
            &owner,
            json!({
                "name": "Lifting",
                "day": "friday",
                "startTime": "07:00",
                "durationMinutes": 60,
                "maxCapacity": 10,
                "tokenCost": 1,
            }),
        )
        .await;
    assert_eq!(class.status, StatusCode::CREATED, "{}", class.text());
    let class_id = class.json()["data"]["id"].as_i64().unwrap();

    let (member, member_id) = app.register("max@gym.test").await;
    app.register("ned@gym.test").await;
    let check_in = app
        .post(
            "/api/attendance/checkin",
            &member,
            json!({ "memberId": member_id, "classId": class_id }),
        )
        .await;
    assert_eq!(check_in.status, StatusCode::CREATED, "{}", check_in.text());

    let mine = app.get("/api/gyms/my/members", &owner).await;
    assert_eq!(mine.status, StatusCode::OK, "{}", mine.text());
    assert_eq!(mine.json()["total"], 1);
    assert_eq!(mine.json()["data"][0]["id"], member_id);

    let by_id = app.get(&format!("/api/gyms/{gym_id}/members"), &admin).await;
    assert_eq!(by_id.status, StatusCode::OK, "{}", by_id.text());
    assert_eq!(by_id.json()["total"], 1);

    let denied = app.get(&format!("/api/gyms/{gym_id}/members"), &member).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let missing = app.get("/api/gyms/9999/members", &admin).await;
    assert_eq!(missing.code(), code(ErrorCode::GymNotFound));
}
