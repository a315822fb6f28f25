//! Admin dashboard figures computed from an admin's records.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus},
    leave_request::{LeaveRequest, LeaveStatus},
    user::User,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DailyCounts {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub present: usize,
    pub late: usize,
    pub early: usize,
    pub absent: usize,
    /// employees with an approved leave covering the date and no record
    pub on_leave: usize,
    /// employees with neither a record nor a leave
    pub unmarked: usize,
    pub total_employees: usize,
}

pub fn daily_counts(
    day: NaiveDate,
    employees: &[User],
    records: &[AttendanceRecord],
    leaves: &[LeaveRequest],
) -> DailyCounts {
    let mut counts = DailyCounts {
        date: day,
        total_employees: employees.len(),
        ..Default::default()
    };

    let mut marked = HashSet::new();
    for record in records.iter().filter(|r| r.date == day) {
        marked.insert(record.employee_id);
        match record.status {
            AttendanceStatus::Present => counts.present += 1,
            AttendanceStatus::Late => counts.late += 1,
            AttendanceStatus::Early => counts.early += 1,
            AttendanceStatus::Absent => counts.absent += 1,
        }
    }

    let on_leave: HashSet<u64> = leaves
        .iter()
        .filter(|l| l.status == LeaveStatus::Approved && l.covers(day))
        .map(|l| l.employee_id)
        .filter(|id| !marked.contains(id))
        .collect();
    counts.on_leave = on_leave.len();

    counts.unmarked = employees
        .iter()
        .filter(|e| !marked.contains(&e.id) && !on_leave.contains(&e.id))
        .count();

    counts
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct RecordFilter {
    /// first day, inclusive
    #[param(value_type = Option<String>, format = "date")]
    #[schema(value_type = Option<String>, format = "date", example = "2026-01-01")]
    pub from: Option<NaiveDate>,
    /// last day, inclusive
    #[param(value_type = Option<String>, format = "date")]
    #[schema(value_type = Option<String>, format = "date", example = "2026-01-31")]
    pub to: Option<NaiveDate>,
    /// `all` or an attendance status
    #[schema(example = "late")]
    pub status: Option<String>,
    /// case-insensitive employee name search
    #[schema(example = "john")]
    pub search: Option<String>,
}

pub fn filter_records(records: Vec<AttendanceRecord>, filter: &RecordFilter) -> Vec<AttendanceRecord> {
    let status = filter
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"));
    let needle = filter
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    records
        .into_iter()
        .filter(|r| filter.from.is_none_or(|from| r.date >= from))
        .filter(|r| filter.to.is_none_or(|to| r.date <= to))
        .filter(|r| status.is_none_or(|s| r.status.as_ref().eq_ignore_ascii_case(s)))
        .filter(|r| {
            needle
                .as_deref()
                .is_none_or(|n| r.employee_name.to_lowercase().contains(n))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    CheckIn,
    CheckOut,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Activity {
    pub kind: ActivityKind,
    pub employee_id: u64,
    pub employee_name: String,
    #[schema(example = "2026-01-05T09:02:00", format = "date-time", value_type = String)]
    pub at: NaiveDateTime,
}

/// Check-ins and check-outs, newest first.
pub fn recent_activity(records: &[AttendanceRecord], limit: usize) -> Vec<Activity> {
    let mut events: Vec<Activity> = records
        .iter()
        .flat_map(|r| {
            let check_in = Activity {
                kind: ActivityKind::CheckIn,
                employee_id: r.employee_id,
                employee_name: r.employee_name.clone(),
                at: r.date.and_time(r.check_in_time),
            };
            let check_out = r.check_out_time.map(|t| Activity {
                kind: ActivityKind::CheckOut,
                employee_id: r.employee_id,
                employee_name: r.employee_name.clone(),
                at: r.date.and_time(t),
            });
            std::iter::once(check_in).chain(check_out)
        })
        .collect();

    events.sort_by(|a, b| b.at.cmp(&a.at));
    events.truncate(limit);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{leave_request::LeaveType, role::Role};
    use chrono::NaiveTime;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn employee(id: u64, name: &str) -> User {
        User {
            id,
            name: name.into(),
            phone: format!("98765432{id:02}"),
            email: None,
            password_hash: None,
            role: Role::Employee,
            admin_id: Some(1),
            tracing_method: None,
            is_active: true,
            is_new: false,
            department: None,
            designation: None,
            profile_picture_url: None,
            join_date: None,
            last_login_at: None,
        }
    }

    fn record(employee_id: u64, name: &str, date: NaiveDate, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id: employee_id,
            employee_id,
            admin_id: 1,
            employee_name: name.into(),
            date,
            check_in_time: NaiveTime::from_hms_opt(9, employee_id as u32, 0).unwrap(),
            check_out_time: None,
            status,
            location: "Office".into(),
        }
    }

    fn approved_leave(employee_id: u64, from: NaiveDate, to: NaiveDate) -> LeaveRequest {
        LeaveRequest {
            id: employee_id,
            employee_id,
            admin_id: 1,
            employee_name: String::new(),
            start_date: from,
            end_date: to,
            start_time: None,
            end_time: None,
            leave_type: LeaveType::Sick,
            reason: String::new(),
            status: LeaveStatus::Approved,
            applied_on: from,
            days_requested: 1,
        }
    }

    #[test]
    fn counts_cover_every_employee_once() {
        let employees: Vec<User> = (1..=5).map(|i| employee(i, &format!("E{i}"))).collect();
        let records = vec![
            record(1, "E1", day(10), AttendanceStatus::Present),
            record(2, "E2", day(10), AttendanceStatus::Late),
            record(3, "E3", day(9), AttendanceStatus::Present),
        ];
        let leaves = vec![
            approved_leave(4, day(9), day(11)),
            approved_leave(4, day(10), day(10)),
        ];

        let counts = daily_counts(day(10), &employees, &records, &leaves);
        assert_eq!(counts.present, 1);
        assert_eq!(counts.late, 1);
        assert_eq!(counts.on_leave, 1);
        assert_eq!(counts.unmarked, 2);
        assert_eq!(counts.total_employees, 5);
    }

    #[test]
    fn checking_in_on_a_leave_day_counts_as_attendance() {
        let employees: Vec<User> = (1..=2).map(|i| employee(i, &format!("E{i}"))).collect();
        let records = vec![record(1, "E1", day(10), AttendanceStatus::Late)];
        let leaves = vec![approved_leave(1, day(10), day(10))];

        let counts = daily_counts(day(10), &employees, &records, &leaves);
        assert_eq!(counts.late, 1);
        assert_eq!(counts.on_leave, 0);
        assert_eq!(counts.unmarked, 1);
        assert_eq!(
            counts.present + counts.late + counts.early + counts.absent + counts.on_leave + counts.unmarked,
            counts.total_employees
        );
    }

    #[test]
    fn filters_combine() {
        let records = vec![
            record(1, "John Doe", day(10), AttendanceStatus::Late),
            record(2, "Jane Smith", day(10), AttendanceStatus::Present),
            record(1, "John Doe", day(2), AttendanceStatus::Late),
        ];
        let filter = RecordFilter {
            from: Some(day(5)),
            to: None,
            status: Some("LATE".into()),
            search: Some("john".into()),
        };
        let hits = filter_records(records.clone(), &filter);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].date, day(10));

        let all = RecordFilter {
            status: Some("all".into()),
            ..Default::default()
        };
        assert_eq!(filter_records(records, &all).len(), 3);
    }

    #[test]
    fn recent_activity_is_newest_first() {
        let mut first = record(1, "E1", day(10), AttendanceStatus::Present);
        first.check_out_time = NaiveTime::from_hms_opt(18, 0, 0);
        let second = record(2, "E2", day(10), AttendanceStatus::Present);

        let events = recent_activity(&[first, second], 2);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, ActivityKind::CheckOut);
        assert_eq!(events[1].employee_id, 2);
    }
}
