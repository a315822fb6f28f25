use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::wfh_request::{NewWfh, WfhRequest, WfhStatus, WfhType};
use crate::service::review::{Transition, decide};
use crate::service::wfh_export::{self, WfhFilter, WfhStats};
use crate::state::AppState;
use actix_web::{HttpResponse, http::header, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateWfh {
    #[schema(example = "Full Day")]
    pub request_type: WfhType,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Internet installation at home")]
    pub reason: String,
    #[schema(example = "Home, Pune")]
    pub work_location: String,
    pub emergency_phone: Option<String>,
    pub additional_notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct WfhDecision {
    #[schema(example = "Enjoy the quiet")]
    pub admin_notes: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Submit a work-from-home request
#[utoipa::path(
    post,
    path = "/api/wfh",
    request_body = CreateWfh,
    responses(
        (status = 201, description = "WFH request submitted", body = WfhRequest),
        (status = 400, description = "Missing fields or invalid dates"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "WFH"
)]
pub async fn create_wfh(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateWfh>,
) -> AppResult<HttpResponse> {
    let admin_id = auth.require_employee()?;
    let payload = payload.into_inner();
    let now = state.clock.now();

    let reason = payload.reason.trim();
    let work_location = payload.work_location.trim();
    if reason.is_empty() || work_location.is_empty() {
        return Err(AppError::validation(
            "Missing Fields",
            "Reason and work location are required.",
        ));
    }
    if payload.start_date > payload.end_date {
        return Err(AppError::validation(
            "Invalid Dates",
            "Start date cannot be after end date.",
        ));
    }
    if payload.start_date < now.date() {
        return Err(AppError::validation(
            "Invalid Start Date",
            "Work from home cannot start in the past.",
        ));
    }

    let employee = state
        .users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".into()))?;

    let request = state
        .wfh
        .create(NewWfh {
            employee_id: employee.id,
            admin_id,
            employee_name: employee.name,
            employee_email: employee.email.unwrap_or_default(),
            department: employee.department.unwrap_or_default(),
            request_type: payload.request_type,
            start_date: payload.start_date,
            end_date: payload.end_date,
            reason: reason.to_string(),
            work_location: work_location.to_string(),
            emergency_phone: non_empty(payload.emergency_phone),
            additional_notes: non_empty(payload.additional_notes),
            submitted_at: now,
        })
        .await?;

    tracing::info!(wfh_id = request.id, "WFH request submitted");
    Ok(HttpResponse::Created().json(request))
}

/// Own WFH requests
#[utoipa::path(
    get,
    path = "/api/wfh/mine",
    responses(
        (status = 200, description = "WFH requests", body = Vec<WfhRequest>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "WFH"
)]
pub async fn my_wfh(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    auth.require_employee()?;
    Ok(HttpResponse::Ok().json(state.wfh.list_for_employee(auth.user_id).await?))
}

async fn filtered(auth: &AuthUser, state: &AppState, filter: &WfhFilter) -> AppResult<Vec<WfhRequest>> {
    let admin_id = auth.require_admin()?;
    let requests = state.wfh.list_for_admin(admin_id).await?;
    Ok(wfh_export::filter_requests(requests, filter))
}

/// WFH requests of the admin's employees
#[utoipa::path(
    get,
    path = "/api/wfh",
    params(WfhFilter),
    responses(
        (status = 200, description = "WFH requests", body = Vec<WfhRequest>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "WFH"
)]
pub async fn wfh_list(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<WfhFilter>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(filtered(&auth, &state, &query).await?))
}

/// Request counts per status
#[utoipa::path(
    get,
    path = "/api/wfh/stats",
    responses(
        (status = 200, description = "WFH counts", body = WfhStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "WFH"
)]
pub async fn wfh_stats(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let admin_id = auth.require_admin()?;
    let requests = state.wfh.list_for_admin(admin_id).await?;
    Ok(HttpResponse::Ok().json(wfh_export::stats(&requests)))
}

/// CSV export of the filtered list
#[utoipa::path(
    get,
    path = "/api/wfh/export",
    params(WfhFilter),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "WFH"
)]
pub async fn export_wfh(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<WfhFilter>,
) -> AppResult<HttpResponse> {
    let requests = filtered(&auth, &state, &query).await?;
    let body = wfh_export::to_csv(&requests).map_err(|e| {
        tracing::error!(error = %e, "Failed to write WFH CSV");
        AppError::Internal
    })?;

    let filename = format!("wfh_requests_{}.csv", state.clock.now().date());
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(body))
}

async fn review(
    auth: AuthUser,
    state: web::Data<AppState>,
    id: u64,
    target: WfhStatus,
    notes: Option<web::Json<WfhDecision>>,
) -> AppResult<HttpResponse> {
    let admin_id = auth.require_admin()?;

    let request = state
        .wfh
        .find(id)
        .await?
        .filter(|r| r.admin_id == admin_id)
        .ok_or_else(|| AppError::NotFound("WFH request not found".into()))?;

    if decide(request.status, WfhStatus::Pending, target)? == Transition::Apply {
        let notes = non_empty(notes.and_then(|n| n.into_inner().admin_notes)).unwrap_or_else(|| {
            match target {
                WfhStatus::Rejected => "Rejected by admin",
                _ => "Approved by admin",
            }
            .to_string()
        });
        state.wfh.decide(id, target, &notes, state.clock.now()).await?;
        tracing::info!(wfh_id = id, status = %target, "WFH request reviewed");
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("WFH request {target}"),
        "status": target
    })))
}

/// Approve a pending WFH request
#[utoipa::path(
    put,
    path = "/api/wfh/{id}/approve",
    params(
        ("id" = u64, Path, description = "WFH request ID")
    ),
    request_body(content = WfhDecision, description = "Optional admin notes"),
    responses(
        (status = 200, description = "WFH request approved", body = Object, example = json!({
            "message": "WFH request approved",
            "status": "approved"
        })),
        (status = 404, description = "WFH request not found"),
        (status = 409, description = "Request was already rejected")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "WFH"
)]
pub async fn approve_wfh(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    notes: Option<web::Json<WfhDecision>>,
) -> AppResult<HttpResponse> {
    review(auth, state, path.into_inner(), WfhStatus::Approved, notes).await
}

/// Reject a pending WFH request
#[utoipa::path(
    put,
    path = "/api/wfh/{id}/reject",
    params(
        ("id" = u64, Path, description = "WFH request ID")
    ),
    request_body(content = WfhDecision, description = "Optional admin notes"),
    responses(
        (status = 200, description = "WFH request rejected", body = Object, example = json!({
            "message": "WFH request rejected",
            "status": "rejected"
        })),
        (status = 404, description = "WFH request not found"),
        (status = 409, description = "Request was already approved")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "WFH"
)]
pub async fn reject_wfh(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    notes: Option<web::Json<WfhDecision>>,
) -> AppResult<HttpResponse> {
    review(auth, state, path.into_inner(), WfhStatus::Rejected, notes).await
}
