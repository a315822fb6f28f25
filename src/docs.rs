use crate::api::attendance::CheckInReq;
use crate::api::employees::{CreateEmployee, EmployeeStatus};
use crate::api::leave_request::{CreateLeave, LeaveFilter};
use crate::api::profile::{CompleteAccount, UpdateProfile};
use crate::api::settings::{
    ChangeMethodReq, CreateMeeting, DailySettingsReq, LeavePolicyReq, RequestStatus, SettingsView,
};
use crate::api::wfh_request::{CreateWfh, WfhDecision};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use crate::model::role::Role;
use crate::model::settings::{
    ChangeRequestStatus, DailyAttendanceSettings, LeavePolicy, LeaveTrackingMode, Meeting,
    MethodChangeRequest, TracingMethod, WorkingDays,
};
use crate::model::user::User;
use crate::model::wfh_request::{WfhRequest, WfhStatus, WfhType};
use crate::models::{LoginReqDto, LoginResponse, OtpSendReq, OtpVerifyReq, RegisterReq};
use crate::service::calendar::{CalendarDay, DayStatus};
use crate::service::check_in::{NextAction, TodayState};
use crate::service::dashboard::{Activity, ActivityKind, DailyCounts, RecordFilter};
use crate::service::leave_accrual::LeaveSummary;
use crate::service::wfh_export::{WfhFilter, WfhStats};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Portal API",
        version = "1.0.0",
        description = r#"
## Attendance Portal

Backend for a small-team attendance portal with an **admin** side and an **employee** side.

### 🔹 Key Features
- **Sign-in**
  - Phone OTP or email/password, with role-based landing routes
- **Attendance**
  - Daily check-in/check-out classified against the admin's windows
  - Seven-day calendar strip
- **Leave**
  - Monthly quota with optional carry-forward, admin approval
- **Work from home**
  - Requests, filtering, stats and CSV export
- **Settings**
  - Daily attendance rules or scheduled meetings, leave policy, method change requests

### 🔐 Security
Everything under `/api` needs a **JWT Bearer** access token.
Admin-only and employee-only operations answer `403` for the other role.

### 📦 Response Format
- JSON bodies; errors carry `message` and, for validation failures, `description`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::send_otp,
        crate::auth::handlers::verify_otp,
        crate::auth::handlers::session,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today,
        crate::api::attendance::history,
        crate::api::attendance::calendar_week,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::my_leaves,
        crate::api::leave_request::leave_summary,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::wfh_request::create_wfh,
        crate::api::wfh_request::my_wfh,
        crate::api::wfh_request::wfh_list,
        crate::api::wfh_request::wfh_stats,
        crate::api::wfh_request::export_wfh,
        crate::api::wfh_request::approve_wfh,
        crate::api::wfh_request::reject_wfh,

        crate::api::dashboard::daily_counts,
        crate::api::dashboard::records,
        crate::api::dashboard::recent_activity,

        crate::api::settings::view_settings,
        crate::api::settings::save_daily_settings,
        crate::api::settings::schedule_meeting,
        crate::api::settings::request_method_change,
        crate::api::settings::save_leave_policy,
        crate::api::settings::my_meetings,

        crate::api::profile::get_profile,
        crate::api::profile::update_profile,
        crate::api::profile::upload_picture,
        crate::api::profile::complete_account,

        crate::api::employees::list_employees,
        crate::api::employees::create_employee,
        crate::api::employees::set_status
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            OtpSendReq,
            OtpVerifyReq,
            LoginResponse,
            User,
            Role,
            TracingMethod,
            CheckInReq,
            AttendanceRecord,
            AttendanceStatus,
            TodayState,
            NextAction,
            CalendarDay,
            DayStatus,
            CreateLeave,
            LeaveFilter,
            LeaveRequest,
            LeaveStatus,
            LeaveType,
            LeaveSummary,
            LeaveTrackingMode,
            CreateWfh,
            WfhDecision,
            WfhFilter,
            WfhRequest,
            WfhStatus,
            WfhType,
            WfhStats,
            DailyCounts,
            RecordFilter,
            Activity,
            ActivityKind,
            SettingsView,
            RequestStatus,
            DailySettingsReq,
            DailyAttendanceSettings,
            WorkingDays,
            CreateMeeting,
            Meeting,
            ChangeMethodReq,
            MethodChangeRequest,
            ChangeRequestStatus,
            LeavePolicyReq,
            LeavePolicy,
            UpdateProfile,
            CompleteAccount,
            CreateEmployee,
            EmployeeStatus
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Sign-in and session APIs"),
        (name = "Attendance", description = "Check-in, check-out and calendar APIs"),
        (name = "Leave", description = "Leave application and review APIs"),
        (name = "WFH", description = "Work-from-home request APIs"),
        (name = "Dashboard", description = "Admin dashboard APIs"),
        (name = "Settings", description = "Tracing method, rules and meetings APIs"),
        (name = "Profile", description = "Profile and account APIs"),
        (name = "Employee", description = "Employee management APIs"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/attendance/check-in"));
        assert!(doc.paths.paths.contains_key("/auth/otp/verify"));
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("LeaveSummary"));
    }
}
