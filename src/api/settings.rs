use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::settings::{
    ChangeRequestStatus, DailyAttendanceSettings, LeavePolicy, LeaveTrackingMode, Meeting,
    MethodChangeRequest, NewChangeRequest, NewMeeting, TracingMethod, WorkingDays,
};
use crate::model::user::User;
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum RequestStatus {
    Pending,
    Approved,
    None,
}

#[derive(Serialize, ToSchema)]
pub struct SettingsView {
    pub tracing_method: Option<TracingMethod>,
    /// current method plus methods unlocked by an approved request
    pub enabled_methods: Vec<TracingMethod>,
    pub request_status: RequestStatus,
    pub daily_settings: DailyAttendanceSettings,
    pub leave_policy: LeavePolicy,
    pub meetings: Vec<Meeting>,
    pub change_requests: Vec<MethodChangeRequest>,
}

#[derive(Deserialize, ToSchema)]
pub struct DailySettingsReq {
    #[serde(default)]
    pub working_days: WorkingDays,
    #[serde(with = "crate::utils::time_fmt::hhmm")]
    #[schema(value_type = String, example = "08:30")]
    pub check_in_start_time: NaiveTime,
    #[serde(with = "crate::utils::time_fmt::hhmm")]
    #[schema(value_type = String, example = "10:00")]
    pub check_in_end_time: NaiveTime,
    #[serde(with = "crate::utils::time_fmt::hhmm")]
    #[schema(value_type = String, example = "17:00")]
    pub check_out_start_time: NaiveTime,
    #[serde(with = "crate::utils::time_fmt::hhmm")]
    #[schema(value_type = String, example = "18:30")]
    pub check_out_end_time: NaiveTime,
    #[schema(example = 8)]
    pub working_hours: u32,
    #[serde(default)]
    pub early_check_in_allowed: u32,
    #[serde(default)]
    pub late_check_in_allowed: u32,
    #[serde(default)]
    pub late_check_out_allowed: u32,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateMeeting {
    #[schema(example = "Weekly sync")]
    pub title: String,
    #[schema(example = "2026-01-05", format = "date", value_type = Option<String>)]
    pub meeting_date: Option<NaiveDate>,
    #[serde(default, with = "crate::utils::time_fmt::hhmm_opt")]
    #[schema(value_type = Option<String>, example = "11:00")]
    pub meeting_time: Option<NaiveTime>,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    #[serde(default = "default_early_check_in")]
    pub early_check_in_allowed: u32,
    #[serde(default)]
    pub attendees: Vec<u64>,
}

fn default_duration() -> u32 {
    60
}

fn default_early_check_in() -> u32 {
    15
}

#[derive(Deserialize, ToSchema)]
pub struct ChangeMethodReq {
    #[schema(example = "Schedule Meetings")]
    pub requested_method: TracingMethod,
}

#[derive(Deserialize, ToSchema)]
pub struct LeavePolicyReq {
    #[schema(example = 2)]
    pub leave_quota: u32,
    #[serde(default)]
    pub carry_forward: bool,
    #[serde(default)]
    pub maximum_days_carry_forward: u32,
    #[serde(default = "default_tracking_mode")]
    pub tracking_mode: LeaveTrackingMode,
}

fn default_tracking_mode() -> LeaveTrackingMode {
    LeaveTrackingMode::PerDay
}

async fn current_admin(auth: &AuthUser, state: &AppState) -> AppResult<User> {
    let admin_id = auth.require_admin()?;
    state
        .users
        .find_by_id(admin_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Admin not found".into()))
}

/// The current method plus every approved method. Approval keeps the
/// method the admin started with enabled, so switching back stays possible.
fn enabled_methods(admin: &User, requests: &[MethodChangeRequest]) -> Vec<TracingMethod> {
    let mut methods: Vec<TracingMethod> = admin.tracing_method.into_iter().collect();
    for r in requests.iter().filter(|r| r.status == ChangeRequestStatus::Approved) {
        let other = match r.requested_method {
            TracingMethod::DailyAttendance => TracingMethod::ScheduleMeetings,
            TracingMethod::ScheduleMeetings => TracingMethod::DailyAttendance,
        };
        for method in [other, r.requested_method] {
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
    }
    methods
}

fn request_status(requests: &[MethodChangeRequest]) -> RequestStatus {
    if requests.iter().any(|r| r.status == ChangeRequestStatus::Pending) {
        RequestStatus::Pending
    } else if requests.iter().any(|r| r.status == ChangeRequestStatus::Approved) {
        RequestStatus::Approved
    } else {
        RequestStatus::None
    }
}

/// Tracing methods are mutually exclusive: an admin may switch only to a
/// method unlocked by an approved change request.
async fn ensure_method_allowed(state: &AppState, admin: &User, method: TracingMethod) -> AppResult<()> {
    let current = match admin.tracing_method {
        None => return Ok(()),
        Some(current) if current == method => return Ok(()),
        Some(current) => current,
    };

    let requests = state.settings.change_requests(admin.id).await?;
    if enabled_methods(admin, &requests).contains(&method) {
        return Ok(());
    }
    Err(AppError::validation(
        "Method Not Enabled",
        format!("{current} is active. Request {method} from the super admin first."),
    ))
}

/// Settings overview
#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "Admin settings", body = SettingsView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn view_settings(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let admin = current_admin(&auth, &state).await?;

    let change_requests = state.settings.change_requests(admin.id).await?;
    let daily_settings = state
        .settings_cache
        .daily_settings(state.settings.as_ref(), admin.id)
        .await?;
    let leave_policy = state
        .settings
        .leave_policy(admin.id)
        .await?
        .unwrap_or_else(|| LeavePolicy::defaults_for(admin.id));
    let meetings = state.settings.meetings_for_admin(admin.id).await?;

    Ok(HttpResponse::Ok().json(SettingsView {
        tracing_method: admin.tracing_method,
        enabled_methods: enabled_methods(&admin, &change_requests),
        request_status: request_status(&change_requests),
        daily_settings,
        leave_policy,
        meetings,
        change_requests,
    }))
}

/// Save daily attendance rules and switch to daily attendance
#[utoipa::path(
    put,
    path = "/api/settings/daily",
    request_body = DailySettingsReq,
    responses(
        (status = 200, description = "Settings saved", body = DailyAttendanceSettings),
        (status = 400, description = "Invalid times or method not enabled"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn save_daily_settings(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<DailySettingsReq>,
) -> AppResult<HttpResponse> {
    let admin = current_admin(&auth, &state).await?;
    let req = payload.into_inner();

    if req.check_in_start_time >= req.check_in_end_time
        || req.check_out_start_time >= req.check_out_end_time
    {
        return Err(AppError::validation(
            "Invalid Time",
            "Each window must start before it ends.",
        ));
    }
    ensure_method_allowed(&state, &admin, TracingMethod::DailyAttendance).await?;

    let settings = DailyAttendanceSettings {
        admin_id: admin.id,
        working_days: req.working_days,
        check_in_start_time: req.check_in_start_time,
        check_in_end_time: req.check_in_end_time,
        check_out_start_time: req.check_out_start_time,
        check_out_end_time: req.check_out_end_time,
        working_hours: req.working_hours,
        early_check_in_allowed: req.early_check_in_allowed,
        late_check_in_allowed: req.late_check_in_allowed,
        late_check_out_allowed: req.late_check_out_allowed,
    };
    state.settings.save_daily_settings(&settings).await?;
    state
        .users
        .set_tracing_method(admin.id, TracingMethod::DailyAttendance)
        .await?;
    state.settings_cache.store(settings.clone()).await;

    tracing::info!(admin_id = admin.id, "Daily attendance settings saved");
    Ok(HttpResponse::Ok().json(settings))
}

/// Schedule a meeting and switch to meeting-based attendance
#[utoipa::path(
    post,
    path = "/api/settings/meetings",
    request_body = CreateMeeting,
    responses(
        (status = 201, description = "Meeting scheduled", body = Meeting),
        (status = 400, description = "Missing fields, unknown attendees or method not enabled"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn schedule_meeting(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CreateMeeting>,
) -> AppResult<HttpResponse> {
    let admin = current_admin(&auth, &state).await?;
    let req = payload.into_inner();

    let title = req.title.trim();
    let meeting_date = match req.meeting_date {
        Some(date) if !title.is_empty() => date,
        _ => {
            return Err(AppError::validation(
                "Missing Fields",
                "Meeting title and date are required.",
            ));
        }
    };

    let team: Vec<u64> = state
        .users
        .list_employees(admin.id)
        .await?
        .into_iter()
        .map(|e| e.id)
        .collect();
    if let Some(stranger) = req.attendees.iter().find(|id| !team.contains(id)) {
        return Err(AppError::validation(
            "Invalid Attendees",
            format!("Employee {stranger} is not in your team."),
        ));
    }
    ensure_method_allowed(&state, &admin, TracingMethod::ScheduleMeetings).await?;

    let mut attendees = req.attendees;
    attendees.sort_unstable();
    attendees.dedup();

    let meeting = state
        .settings
        .create_meeting(NewMeeting {
            admin_id: admin.id,
            title: title.to_string(),
            meeting_date,
            meeting_time: req.meeting_time,
            duration_minutes: req.duration_minutes,
            early_check_in_allowed: req.early_check_in_allowed,
            attendees,
            created_by: admin.id,
            created_at: state.clock.now(),
        })
        .await?;
    state
        .users
        .set_tracing_method(admin.id, TracingMethod::ScheduleMeetings)
        .await?;

    tracing::info!(admin_id = admin.id, meeting_id = meeting.id, "Meeting scheduled");
    Ok(HttpResponse::Created().json(meeting))
}

/// Ask for the other tracing method to be enabled
#[utoipa::path(
    post,
    path = "/api/settings/change-request",
    request_body = ChangeMethodReq,
    responses(
        (status = 201, description = "Request created", body = MethodChangeRequest),
        (status = 400, description = "Request already pending or method already active", body = Object, example = json!({
            "message": "Request Already Pending",
            "description": "A request for Schedule Meetings is awaiting approval."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn request_method_change(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<ChangeMethodReq>,
) -> AppResult<HttpResponse> {
    let admin = current_admin(&auth, &state).await?;
    let method = payload.requested_method;

    if admin.tracing_method == Some(method) {
        return Err(AppError::validation(
            "Method Already Active",
            format!("{method} is already your tracing method."),
        ));
    }

    let existing = state.settings.change_requests(admin.id).await?;
    if existing
        .iter()
        .any(|r| r.requested_method == method && r.status == ChangeRequestStatus::Pending)
    {
        return Err(AppError::validation(
            "Request Already Pending",
            format!("A request for {method} is awaiting approval."),
        ));
    }

    let request = state
        .settings
        .create_change_request(NewChangeRequest {
            admin_id: admin.id,
            admin_name: admin.name,
            admin_email: admin.email,
            requested_method: method,
            request_date: state.clock.now().date(),
        })
        .await?;

    tracing::info!(admin_id = request.admin_id, method = %method, "Method change requested");
    Ok(HttpResponse::Created().json(request))
}

/// Save the monthly leave policy
#[utoipa::path(
    put,
    path = "/api/settings/leave-policy",
    request_body = LeavePolicyReq,
    responses(
        (status = 200, description = "Policy saved", body = LeavePolicy),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn save_leave_policy(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<LeavePolicyReq>,
) -> AppResult<HttpResponse> {
    let admin_id = auth.require_admin()?;
    let req = payload.into_inner();

    let policy = LeavePolicy {
        admin_id,
        leave_quota: req.leave_quota,
        carry_forward: req.carry_forward,
        maximum_days_carry_forward: if req.carry_forward {
            req.maximum_days_carry_forward
        } else {
            0
        },
        tracking_mode: req.tracking_mode,
    };
    state.settings.save_leave_policy(&policy).await?;
    Ok(HttpResponse::Ok().json(policy))
}

/// Meetings the employee is invited to
#[utoipa::path(
    get,
    path = "/api/meetings/mine",
    responses(
        (status = 200, description = "Meetings", body = Vec<Meeting>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Settings"
)]
pub async fn my_meetings(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    auth.require_employee()?;
    let mut meetings = state.settings.meetings_for_attendee(auth.user_id).await?;
    meetings.sort_by_key(|m| (m.meeting_date, m.meeting_time));
    Ok(HttpResponse::Ok().json(meetings))
}

#[cfg(test)]
mod tests {
    use crate::model::settings::ChangeRequestStatus;
    use crate::repo::{MemoryStore, SettingsRepo};
    use crate::test_support::{TestApp, bearer};
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn daily() -> Value {
        json!({
            "check_in_start_time": "09:00",
            "check_in_end_time": "10:00",
            "check_out_start_time": "17:00",
            "check_out_end_time": "18:00",
            "working_hours": 8,
            "late_check_in_allowed": 15
        })
    }

    #[actix_web::test]
    async fn methods_are_exclusive_until_a_request_is_approved() {
        let store = Arc::new(MemoryStore::new());
        let ctx = TestApp::with_store(store.clone());
        let admin = ctx.admin("9000000001").await;
        let employee = ctx.employee("9876543210", admin.id).await;
        let token = ctx.token(&admin);
        let app = ctx.init().await;

        let req = bearer(test::TestRequest::put().uri("/api/settings/daily"), &token)
            .set_json(daily())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let meeting = json!({
            "title": "Standup",
            "meeting_date": "2026-03-12",
            "attendees": [employee.id]
        });
        let req = bearer(test::TestRequest::post().uri("/api/settings/meetings"), &token)
            .set_json(&meeting)
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["message"], "Method Not Enabled");

        let ask = || {
            bearer(test::TestRequest::post().uri("/api/settings/change-request"), &token)
                .set_json(json!({ "requested_method": "Schedule Meetings" }))
                .to_request()
        };
        let created: Value = test::call_and_read_body_json(&app, ask()).await;
        let body: Value = test::read_body_json(test::call_service(&app, ask()).await).await;
        assert_eq!(body["message"], "Request Already Pending");

        store
            .set_change_request_status(created["id"].as_u64().unwrap(), ChangeRequestStatus::Approved)
            .unwrap();
        let req = bearer(test::TestRequest::post().uri("/api/settings/meetings"), &token)
            .set_json(&meeting)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = bearer(test::TestRequest::get().uri("/api/settings"), &token).to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["tracing_method"], "Schedule Meetings");
        assert_eq!(view["request_status"], "Approved");
        assert_eq!(view["enabled_methods"].as_array().unwrap().len(), 2);
        assert_eq!(view["daily_settings"]["late_check_in_allowed"], 15);
        assert_eq!(view["meetings"][0]["attendees"], json!([employee.id]));

        let invited = SettingsRepo::meetings_for_attendee(store.as_ref(), employee.id)
            .await
            .unwrap();
        assert_eq!(invited.len(), 1);
    }

    #[actix_web::test]
    async fn meetings_need_title_date_and_own_employees() {
        let ctx = TestApp::new();
        let admin = ctx.admin("9000000001").await;
        let other = ctx.admin("9000000002").await;
        let stranger = ctx.employee("9876543210", other.id).await;
        let token = ctx.token(&admin);
        let app = ctx.init().await;

        let req = bearer(test::TestRequest::post().uri("/api/settings/meetings"), &token)
            .set_json(json!({ "title": "", "meeting_date": "2026-03-12" }))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["message"], "Missing Fields");

        let req = bearer(test::TestRequest::post().uri("/api/settings/meetings"), &token)
            .set_json(json!({
                "title": "Planning",
                "meeting_date": "2026-03-12",
                "attendees": [stranger.id]
            }))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["message"], "Invalid Attendees");
    }
}
