use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus},
    settings::{DailyAttendanceSettings, TracingMethod},
};

/// Moves a wall-clock time by `minutes`, clamping at the day's edges.
fn shift(time: NaiveTime, minutes: i64) -> NaiveTime {
    let (shifted, overflow) = time.overflowing_add_signed(Duration::minutes(minutes));
    match overflow.signum() {
        1 => NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(shifted),
        -1 => NaiveTime::MIN,
        _ => shifted,
    }
}

/// Status a check-in at `now` receives under the admin's window.
pub fn classify(now: NaiveTime, settings: &DailyAttendanceSettings) -> AttendanceStatus {
    let end = settings.check_in_end_time;
    if now > shift(end, i64::from(settings.late_check_in_allowed)) {
        AttendanceStatus::Absent
    } else if now > end {
        AttendanceStatus::Late
    } else if now < shift(settings.check_in_start_time, -i64::from(settings.early_check_in_allowed)) {
        AttendanceStatus::Early
    } else {
        AttendanceStatus::Present
    }
}

pub fn is_working_day(day: NaiveDate, settings: &DailyAttendanceSettings) -> bool {
    settings.working_days.includes(day.weekday())
}

pub fn ensure_can_check_in(
    day: NaiveDate,
    method: Option<TracingMethod>,
    settings: &DailyAttendanceSettings,
) -> AppResult<()> {
    if method != Some(TracingMethod::DailyAttendance) {
        return Err(AppError::validation(
            "Check-in Unavailable",
            "Your admin does not track daily attendance.",
        ));
    }
    if !is_working_day(day, settings) {
        return Err(AppError::validation(
            "Non-working Day",
            "Check-in is not available today.",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum NextAction {
    CheckIn,
    CheckOut,
    None,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TodayState {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub is_working_day: bool,
    pub record: Option<AttendanceRecord>,
    pub next_action: NextAction,
}

pub fn today_state(
    day: NaiveDate,
    record: Option<AttendanceRecord>,
    settings: &DailyAttendanceSettings,
) -> TodayState {
    let working = is_working_day(day, settings);
    let next_action = match &record {
        None if working => NextAction::CheckIn,
        None => NextAction::None,
        Some(r) if r.check_out_time.is_none() => NextAction::CheckOut,
        Some(_) => NextAction::None,
    };
    TodayState {
        date: day,
        is_working_day: working,
        record,
        next_action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn default_window_classification() {
        let s = DailyAttendanceSettings::defaults_for(1);
        assert_eq!(classify(hm(7, 30), &s), AttendanceStatus::Early);
        assert_eq!(classify(hm(8, 0), &s), AttendanceStatus::Present);
        assert_eq!(classify(hm(9, 15), &s), AttendanceStatus::Present);
        assert_eq!(classify(hm(10, 15), &s), AttendanceStatus::Late);
        assert_eq!(classify(hm(10, 31), &s), AttendanceStatus::Absent);
    }

    #[test]
    fn window_edges_do_not_wrap_past_midnight() {
        let mut s = DailyAttendanceSettings::defaults_for(1);
        s.check_in_start_time = hm(0, 10);
        s.check_in_end_time = hm(23, 50);
        assert_eq!(classify(hm(0, 0), &s), AttendanceStatus::Present);
        assert_eq!(classify(hm(23, 55), &s), AttendanceStatus::Late);
    }

    #[test]
    fn weekends_are_closed_by_default() {
        let s = DailyAttendanceSettings::defaults_for(1);
        let saturday = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        let err = ensure_can_check_in(saturday, Some(TracingMethod::DailyAttendance), &s);
        assert!(err.is_err());

        let monday = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert!(ensure_can_check_in(monday, Some(TracingMethod::DailyAttendance), &s).is_ok());
        assert!(ensure_can_check_in(monday, Some(TracingMethod::ScheduleMeetings), &s).is_err());
        assert_eq!(today_state(saturday, None, &s).next_action, NextAction::None);
        assert_eq!(today_state(monday, None, &s).next_action, NextAction::CheckIn);
    }
}
