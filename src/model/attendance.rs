use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    Early,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: u64,
    pub admin_id: u64,
    pub employee_name: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[serde(with = "crate::utils::time_fmt::hhmm")]
    #[schema(value_type = String, example = "09:05")]
    pub check_in_time: NaiveTime,
    #[serde(with = "crate::utils::time_fmt::hhmm_opt")]
    #[schema(value_type = Option<String>, example = "17:45")]
    pub check_out_time: Option<NaiveTime>,
    pub status: AttendanceStatus,
    #[schema(example = "Office Geo")]
    pub location: String,
}

pub struct NewAttendance {
    pub employee_id: u64,
    pub admin_id: u64,
    pub employee_name: String,
    pub date: NaiveDate,
    pub check_in_time: NaiveTime,
    pub status: AttendanceStatus,
    pub location: String,
}
