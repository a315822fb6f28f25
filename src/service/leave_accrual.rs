//! Monthly leave balance and the checks a new application must pass.
//!
//! Everything here is pure: callers load the employee's leave history and
//! their admin's policy, then ask whether an application fits.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::{
    leave_request::{LeaveRequest, LeaveStatus},
    settings::{LeavePolicy, LeaveTrackingMode, TracingMethod},
};

/// Requested leave window as submitted by the employee.
#[derive(Debug, Clone, Copy)]
pub struct LeaveWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

impl LeaveWindow {
    fn starts_at(&self) -> NaiveDateTime {
        self.start_date.and_time(self.start_time.unwrap_or(NaiveTime::MIN))
    }

    fn ends_at(&self) -> NaiveDateTime {
        self.end_date.and_time(self.end_time.unwrap_or(NaiveTime::MIN))
    }

    pub fn days(&self) -> u32 {
        span_days(self.starts_at(), self.ends_at())
    }
}

/// Whole days between two instants, rounded up; never less than one.
pub fn span_days(start: NaiveDateTime, end: NaiveDateTime) -> u32 {
    let secs = (end - start).num_seconds();
    if secs <= 0 {
        return 1;
    }
    let day = Duration::days(1).num_seconds();
    ((secs + day - 1) / day) as u32
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

fn previous_month_day(today: NaiveDate) -> NaiveDate {
    let first = today.with_day(1).unwrap_or(today);
    first.pred_opt().unwrap_or(first)
}

fn request_days(request: &LeaveRequest) -> u32 {
    span_days(request.starts_at(), request.ends_at())
}

/// Approved or pending days of requests starting this month.
pub fn leaves_taken_this_month(history: &[LeaveRequest], today: NaiveDate) -> u32 {
    history
        .iter()
        .filter(|r| r.counts_against_quota() && same_month(r.start_date, today))
        .map(request_days)
        .sum()
}

pub fn last_month_approved_days(history: &[LeaveRequest], today: NaiveDate) -> u32 {
    let last_month = previous_month_day(today);
    history
        .iter()
        .filter(|r| r.status == LeaveStatus::Approved && same_month(r.start_date, last_month))
        .map(request_days)
        .sum()
}

/// Unused quota of last month, capped by the policy maximum.
pub fn carried_forward_leaves(policy: &LeavePolicy, last_month_taken: u32) -> u32 {
    if !policy.carry_forward {
        return 0;
    }
    policy
        .leave_quota
        .saturating_sub(last_month_taken)
        .min(policy.maximum_days_carry_forward)
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaveSummary {
    #[schema(example = 2)]
    pub leave_quota: u32,
    pub carry_forward_enabled: bool,
    #[schema(example = 1)]
    pub carried_forward: u32,
    #[schema(example = 1)]
    pub taken_this_month: u32,
    #[schema(example = 0)]
    pub last_month_approved: u32,
    /// may go negative once pending requests exceed the balance
    #[schema(example = 2)]
    pub available: i64,
    pub tracking_mode: LeaveTrackingMode,
}

pub fn summarize(history: &[LeaveRequest], today: NaiveDate, policy: &LeavePolicy) -> LeaveSummary {
    let taken = leaves_taken_this_month(history, today);
    let last_month = last_month_approved_days(history, today);
    let carried = carried_forward_leaves(policy, last_month);

    LeaveSummary {
        leave_quota: policy.leave_quota,
        carry_forward_enabled: policy.carry_forward,
        carried_forward: carried,
        taken_this_month: taken,
        last_month_approved: last_month,
        available: i64::from(policy.leave_quota) + i64::from(carried) - i64::from(taken),
        tracking_mode: policy.tracking_mode,
    }
}

/// Validates an application and returns the number of days it asks for.
pub fn check_application(
    window: &LeaveWindow,
    history: &[LeaveRequest],
    now: NaiveDateTime,
    policy: &LeavePolicy,
    method: Option<TracingMethod>,
) -> AppResult<u32> {
    let today = now.date();

    if window.start_date > window.end_date {
        return Err(AppError::validation(
            "Invalid Dates",
            "Start date cannot be after end date.",
        ));
    }

    if window.start_date < today {
        return Err(AppError::validation(
            "Invalid Start Date",
            "Leave cannot start in the past.",
        ));
    }

    if method.is_none() {
        return Err(AppError::validation(
            "Tracing Method Not Set",
            "Your admin has not configured attendance tracking yet.",
        ));
    }

    if !same_month(window.start_date, today) || !same_month(window.end_date, today) {
        return Err(AppError::validation(
            "Invalid Leave Period",
            "Leave can only be applied within the current month.",
        ));
    }

    if policy.tracking_mode == LeaveTrackingMode::Monthly
        && history
            .iter()
            .any(|r| r.counts_against_quota() && same_month(r.start_date, today))
    {
        return Err(AppError::validation(
            "Monthly Leave Limit Reached",
            "You have already applied for leave this month.",
        ));
    }

    let summary = summarize(history, today, policy);
    if summary.available <= 0 {
        return Err(AppError::validation(
            "No Leave Balance",
            "You have no leave available this month.",
        ));
    }

    let requested = window.days();
    if i64::from(requested) > summary.available {
        let description = format!(
            "You requested {requested} day(s) but only {} are available.",
            summary.available
        );
        return Err(if policy.carry_forward {
            AppError::validation("Carry Forward Limit Exceeded", description)
        } else {
            AppError::validation("Leave Quota Exceeded", description)
        });
    }

    if window.start_date == window.end_date {
        if let (Some(start), Some(end)) = (window.start_time, window.end_time) {
            if start >= end {
                return Err(AppError::validation(
                    "Invalid Time",
                    "End time must be after start time.",
                ));
            }
        }
        if window.start_date == today {
            let now_time = now.time();
            let passed = [window.start_time, window.end_time]
                .into_iter()
                .flatten()
                .any(|t| t < now_time);
            if passed {
                return Err(AppError::validation(
                    "Invalid Time",
                    "Leave time cannot be in the past.",
                ));
            }
        }
    }

    Ok(requested)
}
