//! Attendance API Module
//!
//! | Path | Method | Policy |
//! |------|--------|--------|
//! | /api/attendance/checkin | POST | Attendance:CheckIn |
//! | /api/attendance/checkout/{id} | POST | Attendance:CheckOut |
//! | /api/attendance/{id} | GET | Attendance:Read |
//! | /api/attendance/member/{member_id} | GET | Attendance:Read |
//! | /api/attendance/stats/{member_id} | GET | Attendance:Read |
//! | /api/attendance/active | GET | Attendance:List |
//! | /api/attendance/class/{class_id} | GET | Attendance:List |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{Action, Resource, require_policy};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/attendance", routes())
}

fn routes() -> Router<ServerState> {
    let check_in = Router::new()
        .route("/checkin", post(handler::check_in))
        .layer(middleware::from_fn(require_policy(Resource::Attendance, Action::CheckIn)));

    let check_out = Router::new()
        .route("/checkout/{attendance_id}", post(handler::check_out))
        .layer(middleware::from_fn(require_policy(Resource::Attendance, Action::CheckOut)));

    let read_routes = Router::new()
        .route("/{id}", get(handler::get_by_id))
        .route("/member/{member_id}", get(handler::member_history))
        .route("/stats/{member_id}", get(handler::member_stats))
        .layer(middleware::from_fn(require_policy(Resource::Attendance, Action::Read)));

    let list_routes = Router::new()
        .route("/active", get(handler::active))
        .route("/class/{class_id}", get(handler::class_history))
        .layer(middleware::from_fn(require_policy(Resource::Attendance, Action::List)));

    check_in
        .merge(check_out)
        .merge(read_routes)
        .merge(list_routes)
}
