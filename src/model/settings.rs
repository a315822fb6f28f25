use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Attendance-capture mode an admin runs their team under.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum TracingMethod {
    #[serde(rename = "Daily Attendance")]
    #[strum(serialize = "Daily Attendance")]
    DailyAttendance,
    #[serde(rename = "Schedule Meetings")]
    #[strum(serialize = "Schedule Meetings")]
    ScheduleMeetings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WorkingDays {
    pub mon: bool,
    pub tue: bool,
    pub wed: bool,
    pub thu: bool,
    pub fri: bool,
    pub sat: bool,
    pub sun: bool,
}

impl Default for WorkingDays {
    fn default() -> Self {
        Self {
            mon: true,
            tue: true,
            wed: true,
            thu: true,
            fri: true,
            sat: false,
            sun: false,
        }
    }
}

impl WorkingDays {
    pub fn includes(&self, day: Weekday) -> bool {
        match day {
            Weekday::Mon => self.mon,
            Weekday::Tue => self.tue,
            Weekday::Wed => self.wed,
            Weekday::Thu => self.thu,
            Weekday::Fri => self.fri,
            Weekday::Sat => self.sat,
            Weekday::Sun => self.sun,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailyAttendanceSettings {
    #[schema(example = 1)]
    pub admin_id: u64,
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
    /// minutes
    #[schema(example = 30)]
    pub early_check_in_allowed: u32,
    /// minutes
    #[schema(example = 30)]
    pub late_check_in_allowed: u32,
    /// minutes
    #[schema(example = 30)]
    pub late_check_out_allowed: u32,
}

impl DailyAttendanceSettings {
    /// Rules applied for admins that never saved a configuration.
    pub fn defaults_for(admin_id: u64) -> Self {
        let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN);
        Self {
            admin_id,
            working_days: WorkingDays::default(),
            check_in_start_time: hm(8, 30),
            check_in_end_time: hm(10, 0),
            check_out_start_time: hm(17, 0),
            check_out_end_time: hm(18, 30),
            working_hours: 8,
            early_check_in_allowed: 30,
            late_check_in_allowed: 30,
            late_check_out_allowed: 30,
        }
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LeaveTrackingMode {
    /// one leave application per month, within the quota
    Monthly,
    /// quota counted in days only
    PerDay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeavePolicy {
    #[schema(example = 1)]
    pub admin_id: u64,
    /// days per month
    #[schema(example = 2)]
    pub leave_quota: u32,
    pub carry_forward: bool,
    #[schema(example = 2)]
    pub maximum_days_carry_forward: u32,
    pub tracking_mode: LeaveTrackingMode,
}

impl LeavePolicy {
    pub fn defaults_for(admin_id: u64) -> Self {
        Self {
            admin_id,
            leave_quota: 2,
            carry_forward: false,
            maximum_days_carry_forward: 0,
            tracking_mode: LeaveTrackingMode::PerDay,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Meeting {
    pub id: u64,
    pub admin_id: u64,
    #[schema(example = "Weekly sync")]
    pub title: String,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub meeting_date: NaiveDate,
    #[serde(with = "crate::utils::time_fmt::hhmm_opt")]
    #[schema(value_type = Option<String>, example = "11:00")]
    pub meeting_time: Option<NaiveTime>,
    #[schema(example = 60)]
    pub duration_minutes: u32,
    #[schema(example = 15)]
    pub early_check_in_allowed: u32,
    pub attendees: Vec<u64>,
    #[schema(example = "upcoming")]
    pub status: String,
    pub created_by: u64,
    #[schema(example = "2026-01-01T09:00:00", format = "date-time", value_type = String)]
    pub created_at: NaiveDateTime,
}

pub struct NewMeeting {
    pub admin_id: u64,
    pub title: String,
    pub meeting_date: NaiveDate,
    pub meeting_time: Option<NaiveTime>,
    pub duration_minutes: u32,
    pub early_check_in_allowed: u32,
    pub attendees: Vec<u64>,
    pub created_by: u64,
    pub created_at: NaiveDateTime,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[strum(ascii_case_insensitive)]
pub enum ChangeRequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// Admin asking to enable the other tracing method.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MethodChangeRequest {
    pub id: u64,
    pub admin_id: u64,
    pub admin_name: String,
    pub admin_email: Option<String>,
    pub requested_method: TracingMethod,
    pub status: ChangeRequestStatus,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub request_date: NaiveDate,
}

pub struct NewChangeRequest {
    pub admin_id: u64,
    pub admin_name: String,
    pub admin_email: Option<String>,
    pub requested_method: TracingMethod,
    pub request_date: NaiveDate,
}
