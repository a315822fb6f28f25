use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::attendance::AttendanceRecord;
use crate::service::dashboard::{self, Activity, DailyCounts, RecordFilter};
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use utoipa::IntoParams;

/// Records older than this are left out of unfiltered views.
const DEFAULT_RANGE_DAYS: i64 = 30;

#[derive(Deserialize, IntoParams)]
pub struct DayQuery {
    /// defaults to today
    #[param(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams)]
pub struct ActivityQuery {
    #[param(example = 10)]
    pub limit: Option<usize>,
}

/// Attendance counts for one day
#[utoipa::path(
    get,
    path = "/api/dashboard",
    params(DayQuery),
    responses(
        (status = 200, description = "Daily counts", body = DailyCounts),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Dashboard"
)]
pub async fn daily_counts(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<DayQuery>,
) -> AppResult<HttpResponse> {
    let admin_id = auth.require_admin()?;
    let day = query.date.unwrap_or_else(|| state.clock.now().date());

    let employees = state.users.list_employees(admin_id).await?;
    let records = state.attendance.list_for_admin(admin_id, day, day).await?;
    let leaves = state.leaves.list_for_admin(admin_id).await?;

    Ok(HttpResponse::Ok().json(dashboard::daily_counts(day, &employees, &records, &leaves)))
}

/// Attendance records of the admin's employees
#[utoipa::path(
    get,
    path = "/api/dashboard/records",
    params(RecordFilter),
    responses(
        (status = 200, description = "Attendance records", body = Vec<AttendanceRecord>),
        (status = 400, description = "Invalid dates"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Dashboard"
)]
pub async fn records(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<RecordFilter>,
) -> AppResult<HttpResponse> {
    let admin_id = auth.require_admin()?;
    let filter = query.into_inner();

    let to = filter.to.unwrap_or_else(|| state.clock.now().date());
    let from = filter
        .from
        .unwrap_or(to - Duration::days(DEFAULT_RANGE_DAYS));
    if from > to {
        return Err(AppError::validation(
            "Invalid Dates",
            "Start date cannot be after end date.",
        ));
    }

    let records = state.attendance.list_for_admin(admin_id, from, to).await?;
    let records: Vec<AttendanceRecord> = dashboard::filter_records(records, &filter);
    Ok(HttpResponse::Ok().json(records))
}

/// Latest check-ins and check-outs
#[utoipa::path(
    get,
    path = "/api/dashboard/activity",
    params(ActivityQuery),
    responses(
        (status = 200, description = "Recent activity", body = Vec<Activity>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Dashboard"
)]
pub async fn recent_activity(
    auth: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<ActivityQuery>,
) -> AppResult<HttpResponse> {
    let admin_id = auth.require_admin()?;
    let today = state.clock.now().date();
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let records = state
        .attendance
        .list_for_admin(admin_id, today - Duration::days(7), today)
        .await?;
    Ok(HttpResponse::Ok().json(dashboard::recent_activity(&records, limit)))
}

#[cfg(test)]
mod tests {
    use crate::model::attendance::{AttendanceStatus, NewAttendance};
    use crate::model::leave_request::{LeaveStatus, LeaveType, NewLeave};
    use crate::test_support::{TestApp, bearer};
    use actix_web::{http::StatusCode, test};
    use chrono::{NaiveDate, NaiveTime};
    use serde_json::Value;

    #[actix_web::test]
    async fn counts_and_filters_the_admins_team() {
        let ctx = TestApp::new();
        let admin = ctx.admin("9000000001").await;
        let late = ctx.employee("9876543210", admin.id).await;
        let away = ctx.employee("9876543211", admin.id).await;
        ctx.employee("9876543212", admin.id).await;
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();

        ctx.state
            .attendance
            .insert(NewAttendance {
                employee_id: late.id,
                admin_id: admin.id,
                employee_name: "Late Larry".into(),
                date: today,
                check_in_time: NaiveTime::from_hms_opt(10, 20, 0).unwrap(),
                status: AttendanceStatus::Late,
                location: "Office".into(),
            })
            .await
            .unwrap();
        let leave = ctx
            .state
            .leaves
            .create(NewLeave {
                employee_id: away.id,
                admin_id: admin.id,
                employee_name: away.name.clone(),
                start_date: today,
                end_date: today,
                start_time: None,
                end_time: None,
                leave_type: LeaveType::Sick,
                reason: "Flu".into(),
                applied_on: today,
                days_requested: 1,
            })
            .await
            .unwrap();
        ctx.state
            .leaves
            .set_status(leave.id, LeaveStatus::Approved)
            .await
            .unwrap();

        let token = ctx.token(&admin);
        let app = ctx.init().await;

        let req = bearer(test::TestRequest::get().uri("/api/dashboard"), &token).to_request();
        let counts: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(counts["late"], 1);
        assert_eq!(counts["on_leave"], 1);
        assert_eq!(counts["unmarked"], 1);
        assert_eq!(counts["total_employees"], 3);

        let req = bearer(
            test::TestRequest::get().uri("/api/dashboard/records?status=LATE&search=larry"),
            &token,
        )
        .to_request();
        let records: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(records.as_array().unwrap().len(), 1);

        let req = bearer(test::TestRequest::get().uri("/api/dashboard/activity?limit=5"), &token).to_request();
        let activity: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(activity[0]["kind"], "check_in");
        assert_eq!(activity[0]["at"], "2026-03-10T10:20:00");
    }

    #[actix_web::test]
    async fn employees_cannot_open_the_dashboard() {
        let ctx = TestApp::new();
        let admin = ctx.admin("9000000001").await;
        let employee = ctx.employee("9876543210", admin.id).await;
        let token = ctx.token(&employee);
        let app = ctx.init().await;

        let req = bearer(test::TestRequest::get().uri("/api/dashboard"), &token).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
