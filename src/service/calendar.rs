use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus},
    leave_request::{LeaveRequest, LeaveStatus},
};

const DAYS_SHOWN: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Present,
    Late,
    Absent,
    Early,
    Leave,
}

impl From<AttendanceStatus> for DayStatus {
    fn from(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Present => DayStatus::Present,
            AttendanceStatus::Late => DayStatus::Late,
            AttendanceStatus::Absent => DayStatus::Absent,
            AttendanceStatus::Early => DayStatus::Early,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CalendarDay {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Mon")]
    pub weekday: String,
    #[schema(example = 5)]
    pub day: u32,
    pub status: Option<DayStatus>,
    pub is_today: bool,
    pub is_selected: bool,
}

/// A week strip with `anchor` in the middle slot.
pub fn week_around(
    anchor: NaiveDate,
    today: NaiveDate,
    selected: Option<NaiveDate>,
    records: &[AttendanceRecord],
    leaves: &[LeaveRequest],
) -> Vec<CalendarDay> {
    let centre = DAYS_SHOWN / 2;
    (-centre..=centre)
        .map(|offset| {
            let date = anchor + Duration::days(offset);
            let status = records
                .iter()
                .find(|r| r.date == date)
                .map(|r| DayStatus::from(r.status))
                .or_else(|| {
                    leaves
                        .iter()
                        .any(|l| l.status == LeaveStatus::Approved && l.covers(date))
                        .then_some(DayStatus::Leave)
                });
            CalendarDay {
                date,
                weekday: date.format("%a").to_string(),
                day: date.day(),
                status,
                is_today: date == today,
                is_selected: selected == Some(date),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::LeaveType;
    use chrono::NaiveTime;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn anchor_sits_in_the_middle() {
        let record = AttendanceRecord {
            id: 1,
            employee_id: 7,
            admin_id: 1,
            employee_name: "John".into(),
            date: day(9),
            check_in_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            check_out_time: None,
            status: AttendanceStatus::Late,
            location: "Office".into(),
        };
        let leave = LeaveRequest {
            id: 1,
            employee_id: 7,
            admin_id: 1,
            employee_name: "John".into(),
            start_date: day(11),
            end_date: day(12),
            start_time: None,
            end_time: None,
            leave_type: LeaveType::Vacation,
            reason: String::new(),
            status: LeaveStatus::Approved,
            applied_on: day(1),
            days_requested: 1,
        };

        let week = week_around(day(10), day(10), Some(day(9)), &[record], &[leave]);
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, day(7));
        assert!(week[3].is_today);
        assert_eq!(week[3].weekday, "Tue");
        assert_eq!(week[2].status, Some(DayStatus::Late));
        assert!(week[2].is_selected);
        assert_eq!(week[4].status, Some(DayStatus::Leave));
        assert_eq!(week[6].status, None);
    }
}
