use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WfhStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[strum(ascii_case_insensitive)]
pub enum WfhType {
    #[serde(rename = "Full Day")]
    #[strum(serialize = "Full Day")]
    FullDay,
    #[serde(rename = "Half Day")]
    #[strum(serialize = "Half Day")]
    HalfDay,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WfhRequest {
    pub id: u64,
    pub employee_id: u64,
    pub admin_id: u64,
    #[schema(example = "Jane Smith")]
    pub employee_name: String,
    #[schema(example = "jane@example.com")]
    pub employee_email: String,
    #[schema(example = "Sales")]
    pub department: String,
    pub request_type: WfhType,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub status: WfhStatus,
    pub reason: String,
    #[schema(example = "Home, Pune")]
    pub work_location: String,
    pub emergency_phone: Option<String>,
    pub additional_notes: Option<String>,
    pub admin_notes: Option<String>,
    #[schema(example = "2026-01-01T09:00:00", format = "date-time", value_type = String)]
    pub submitted_at: NaiveDateTime,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub decided_at: Option<NaiveDateTime>,
}

pub struct NewWfh {
    pub employee_id: u64,
    pub admin_id: u64,
    pub employee_name: String,
    pub employee_email: String,
    pub department: String,
    pub request_type: WfhType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub work_location: String,
    pub emergency_phone: Option<String>,
    pub additional_notes: Option<String>,
    pub submitted_at: NaiveDateTime,
}
