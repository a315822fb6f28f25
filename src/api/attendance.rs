use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::service::calendar::{self, CalendarDay};
use crate::service::check_in::{self, TodayState};
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use chrono::{Duration, NaiveDate, Timelike};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CheckInReq {
    /// where the check-in happened
    #[serde(default)]
    #[schema(example = "Office Geo")]
    pub location: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// defaults to 30 days before `to`
    #[param(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    /// defaults to today
    #[param(value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams)]
pub struct CalendarQuery {
    /// middle day of the strip, defaults to today
    #[param(value_type = Option<String>, format = "date")]
    pub anchor: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = "date")]
    pub selected: Option<NaiveDate>,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = CheckInReq,
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully",
            "record": {"status": "present", "check_in_time": "09:02"}
        })),
        (status = 400, description = "Check-in not available today"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CheckInReq>,
) -> AppResult<HttpResponse> {
    let admin_id = auth.require_employee()?;
    let now = state.clock.now();

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

    let settings = state
        .settings_cache
        .daily_settings(state.settings.as_ref(), admin_id)
        .await?;
    check_in::ensure_can_check_in(now.date(), admin.tracing_method, &settings)?;

    let at = now.time().with_nanosecond(0).unwrap_or(now.time());
    let status = check_in::classify(at, &settings);

    let location = payload
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or("Office")
        .to_string();

    let record = state
        .attendance
        .insert(NewAttendance {
            employee_id: employee.id,
            admin_id,
            employee_name: employee.name,
            date: now.date(),
            check_in_time: at,
            status,
            location,
        })
        .await?;

    tracing::info!(employee_id = record.employee_id, status = %record.status, "Checked in");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked in successfully",
        "record": record
    })))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    auth.require_employee()?;
    let now = state.clock.now();
    let today = now.date();

    let record = state
        .attendance
        .find_for_day(auth.user_id, today)
        .await?
        .ok_or_else(|| {
            AppError::validation(
                "No active check-in found for today",
                "Check in before checking out.",
            )
        })?;

    let already = || {
        AppError::validation(
            "Already checked out today",
            "Your attendance for today is complete.",
        )
    };
    if record.check_out_time.is_some() {
        return Err(already());
    }

    let at = now.time().with_nanosecond(0).unwrap_or(now.time());
    if !state.attendance.check_out(auth.user_id, today, at).await? {
        return Err(already());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully"
    })))
}

/// Today's record and the next allowed action
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's attendance state", body = TodayState),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let admin_id = auth.require_employee()?;
    let today = state.clock.now().date();

    let settings = state
        .settings_cache
        .daily_settings(state.settings.as_ref(), admin_id)
        .await?;
    let record = state.attendance.find_for_day(auth.user_id, today).await?;

    Ok(HttpResponse::Ok().json(check_in::today_state(today, record, &settings)))
}

/// Own attendance records, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Attendance records", body = Vec<AttendanceRecord>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<HistoryQuery>,
) -> AppResult<HttpResponse> {
    auth.require_employee()?;
    let to = query.to.unwrap_or_else(|| state.clock.now().date());
    let from = query.from.unwrap_or(to - Duration::days(30));
    if from > to {
        return Err(AppError::validation(
            "Invalid Dates",
            "Start date cannot be after end date.",
        ));
    }

    let records: Vec<AttendanceRecord> = state
        .attendance
        .list_for_employee(auth.user_id, from, to)
        .await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Seven-day strip centred on a date
#[utoipa::path(
    get,
    path = "/api/attendance/calendar",
    params(CalendarQuery),
    responses(
        (status = 200, description = "Calendar days", body = Vec<CalendarDay>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn calendar_week(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<CalendarQuery>,
) -> AppResult<HttpResponse> {
    auth.require_employee()?;
    let today = state.clock.now().date();
    let anchor = query.anchor.unwrap_or(today);

    let records = state
        .attendance
        .list_for_employee(auth.user_id, anchor - Duration::days(3), anchor + Duration::days(3))
        .await?;
    let leaves = state.leaves.list_for_employee(auth.user_id).await?;

    Ok(HttpResponse::Ok().json(calendar::week_around(
        anchor,
        today,
        query.selected,
        &records,
        &leaves,
    )))
}

#[cfg(test)]
mod tests {
    use crate::model::settings::TracingMethod;
    use crate::test_support::{TestApp, at, bearer};
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn check_in_then_out_once_per_day() {
        // Monday, inside the default window
        let ctx = TestApp::new().at(at(2026, 3, 9, 9, 15));
        let admin = ctx.admin("9000000001").await;
        ctx.state
            .users
            .set_tracing_method(admin.id, TracingMethod::DailyAttendance)
            .await
            .unwrap();
        let employee = ctx.employee("9876543210", admin.id).await;
        let token = ctx.token(&employee);
        let app = ctx.init().await;

        let check_in = || {
            bearer(test::TestRequest::post().uri("/api/attendance/check-in"), &token)
                .set_json(json!({ "location": "HQ" }))
                .to_request()
        };
        let resp = test::call_service(&app, check_in()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["record"]["status"], "present");
        assert_eq!(body["record"]["check_in_time"], "09:15");

        let resp = test::call_service(&app, check_in()).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Already checked in today");

        let check_out = || bearer(test::TestRequest::post().uri("/api/attendance/check-out"), &token).to_request();
        assert_eq!(test::call_service(&app, check_out()).await.status(), StatusCode::OK);

        let resp = test::call_service(&app, check_out()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Already checked out today");

        let req = bearer(test::TestRequest::get().uri("/api/attendance/today"), &token).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["next_action"], "none");
    }

    #[actix_web::test]
    async fn check_out_without_check_in_is_refused() {
        let ctx = TestApp::new().at(at(2026, 3, 9, 18, 0));
        let admin = ctx.admin("9000000001").await;
        let employee = ctx.employee("9876543210", admin.id).await;
        let token = ctx.token(&employee);
        let app = ctx.init().await;

        let req = bearer(test::TestRequest::post().uri("/api/attendance/check-out"), &token).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "No active check-in found for today");
    }

    #[actix_web::test]
    async fn check_in_needs_daily_attendance_and_a_working_day() {
        // Saturday
        let ctx = TestApp::new().at(at(2026, 3, 7, 9, 0));
        let admin = ctx.admin("9000000001").await;
        let employee = ctx.employee("9876543210", admin.id).await;
        let token = ctx.token(&employee);
        let app = ctx.init().await;

        let req = bearer(test::TestRequest::post().uri("/api/attendance/check-in"), &token)
            .set_json(json!({}))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["message"], "Check-in Unavailable");

        ctx.state
            .users
            .set_tracing_method(admin.id, TracingMethod::DailyAttendance)
            .await
            .unwrap();
        let req = bearer(test::TestRequest::post().uri("/api/attendance/check-in"), &token)
            .set_json(json!({}))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["message"], "Non-working Day");
    }
}
