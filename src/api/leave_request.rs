use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType, NewLeave};
use crate::model::settings::LeavePolicy;
use crate::service::leave_accrual::{self, LeaveSummary, LeaveWindow};
use crate::service::review::{Transition, decide};
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "Casual")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[serde(default, with = "crate::utils::time_fmt::hhmm_opt")]
    #[schema(value_type = Option<String>, example = "10:00")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "crate::utils::time_fmt::hhmm_opt")]
    #[schema(value_type = Option<String>, example = "13:00")]
    pub end_time: Option<NaiveTime>,
    #[schema(example = "Family event")]
    pub reason: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// `all`, `pending`, `approved` or `rejected`
    #[schema(example = "pending")]
    pub status: Option<String>,
}

async fn policy_for(state: &AppState, admin_id: u64) -> AppResult<LeavePolicy> {
    Ok(state
        .settings
        .leave_policy(admin_id)
        .await?
        .unwrap_or_else(|| LeavePolicy::defaults_for(admin_id)))
}

/// Apply for leave
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Application refused", body = Object, example = json!({
            "message": "Leave Quota Exceeded",
            "description": "You requested 3 day(s) but only 2 are available."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateLeave>,
) -> AppResult<HttpResponse> {
    let admin_id = auth.require_employee()?;
    let payload = payload.into_inner();

    let reason = payload.reason.trim();
    if reason.is_empty() {
        return Err(AppError::validation(
            "Missing Fields",
            "Please give a reason for your leave.",
        ));
    }

    let employee = state
        .users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".into()))?;
    let admin = state
        .users
        .find_by_id(admin_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Admin not found".into()))?;

    let policy = policy_for(&state, admin_id).await?;
    let history = state.leaves.list_for_employee(employee.id).await?;
    let now = state.clock.now();

    let window = LeaveWindow {
        start_date: payload.start_date,
        end_date: payload.end_date,
        start_time: payload.start_time,
        end_time: payload.end_time,
    };
    let days_requested =
        leave_accrual::check_application(&window, &history, now, &policy, admin.tracing_method)?;

    let leave = state
        .leaves
        .create(NewLeave {
            employee_id: employee.id,
            admin_id,
            employee_name: employee.name,
            start_date: window.start_date,
            end_date: window.end_date,
            start_time: window.start_time,
            end_time: window.end_time,
            leave_type: payload.leave_type,
            reason: reason.to_string(),
            applied_on: now.date(),
            days_requested,
        })
        .await?;

    tracing::info!(leave_id = leave.id, days = days_requested, "Leave applied");
    Ok(HttpResponse::Created().json(leave))
}

/// Own leave requests, newest first
#[utoipa::path(
    get,
    path = "/api/leave/mine",
    responses(
        (status = 200, description = "Leave requests", body = Vec<LeaveRequest>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn my_leaves(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    auth.require_employee()?;
    let leaves = state.leaves.list_for_employee(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

/// Quota, carry-forward and availability for the current month
#[utoipa::path(
    get,
    path = "/api/leave/summary",
    responses(
        (status = 200, description = "Leave balance", body = LeaveSummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_summary(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let admin_id = auth.require_employee()?;
    let policy = policy_for(&state, admin_id).await?;
    let history = state.leaves.list_for_employee(auth.user_id).await?;
    let today = state.clock.now().date();

    Ok(HttpResponse::Ok().json(leave_accrual::summarize(&history, today, &policy)))
}

/// Leave requests of the admin's employees
#[utoipa::path(
    get,
    path = "/api/leave",
    params(
        ("status" = Option<String>, Query, description = "all, pending, approved or rejected")
    ),
    responses(
        (status = 200, description = "Leave requests", body = Vec<LeaveRequest>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<LeaveFilter>,
) -> AppResult<HttpResponse> {
    let admin_id = auth.require_admin()?;

    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
        .map(|s| {
            s.parse::<LeaveStatus>().map_err(|_| {
                AppError::validation("Invalid Status", format!("Unknown leave status `{s}`."))
            })
        })
        .transpose()?;

    let leaves: Vec<LeaveRequest> = state
        .leaves
        .list_for_admin(admin_id)
        .await?
        .into_iter()
        .filter(|l| status.is_none_or(|s| l.status == s))
        .collect();
    Ok(HttpResponse::Ok().json(leaves))
}

async fn review(
    auth: AuthUser,
    state: web::Data<AppState>,
    id: u64,
    target: LeaveStatus,
) -> AppResult<HttpResponse> {
    let admin_id = auth.require_admin()?;

    let leave = state
        .leaves
        .find(id)
        .await?
        .filter(|l| l.admin_id == admin_id)
        .ok_or_else(|| AppError::NotFound("Leave request not found".into()))?;

    if decide(leave.status, LeaveStatus::Pending, target)? == Transition::Apply {
        state.leaves.set_status(id, target).await?;
        tracing::info!(leave_id = id, status = %target, "Leave reviewed");
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Leave request {}", target.as_ref().to_lowercase()),
        "status": target
    })))
}

/// Approve a pending leave request
#[utoipa::path(
    put,
    path = "/api/leave/{id}/approve",
    params(
        ("id" = u64, Path, description = "Leave request ID")
    ),
    responses(
        (status = 200, description = "Leave approved", body = Object, example = json!({
            "message": "Leave request approved",
            "status": "Approved"
        })),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request was already Rejected")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    review(auth, state, path.into_inner(), LeaveStatus::Approved).await
}

/// Reject a pending leave request
#[utoipa::path(
    put,
    path = "/api/leave/{id}/reject",
    params(
        ("id" = u64, Path, description = "Leave request ID")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = Object, example = json!({
            "message": "Leave request rejected",
            "status": "Rejected"
        })),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request was already Approved")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    review(auth, state, path.into_inner(), LeaveStatus::Rejected).await
}
