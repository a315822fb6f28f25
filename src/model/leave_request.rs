use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[strum(ascii_case_insensitive)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[strum(ascii_case_insensitive)]
pub enum LeaveType {
    Sick,
    Casual,
    Vacation,
    Unpaid,
    Other,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 7)]
    pub employee_id: u64,
    #[schema(example = 1)]
    pub admin_id: u64,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[serde(with = "crate::utils::time_fmt::hhmm_opt")]
    #[schema(value_type = Option<String>, example = "10:00")]
    pub start_time: Option<NaiveTime>,
    #[serde(with = "crate::utils::time_fmt::hhmm_opt")]
    #[schema(value_type = Option<String>, example = "13:00")]
    pub end_time: Option<NaiveTime>,
    pub leave_type: LeaveType,
    #[schema(example = "Family event")]
    pub reason: String,
    pub status: LeaveStatus,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub applied_on: NaiveDate,
    #[schema(example = 1)]
    pub days_requested: u32,
}

impl LeaveRequest {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.start_date.and_time(self.start_time.unwrap_or(NaiveTime::MIN))
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.end_date.and_time(self.end_time.unwrap_or(NaiveTime::MIN))
    }

    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }

    /// Approved or still awaiting a decision.
    pub fn counts_against_quota(&self) -> bool {
        matches!(self.status, LeaveStatus::Approved | LeaveStatus::Pending)
    }
}

pub struct NewLeave {
    pub employee_id: u64,
    pub admin_id: u64,
    pub employee_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub leave_type: LeaveType,
    pub reason: String,
    pub applied_on: NaiveDate,
    pub days_requested: u32,
}
