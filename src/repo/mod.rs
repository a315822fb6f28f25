//! Persistence boundary.
//!
//! Handlers talk to these traits only; `MySqlStore` backs them in
//! production and `MemoryStore` backs them in tests and demo runs.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use derive_more::Display;

use crate::model::{
    attendance::{AttendanceRecord, NewAttendance},
    leave_request::{LeaveRequest, LeaveStatus, NewLeave},
    settings::{
        DailyAttendanceSettings, LeavePolicy, Meeting, MethodChangeRequest, NewChangeRequest,
        NewMeeting, TracingMethod,
    },
    user::{NewUser, ProfileChanges, User},
    wfh_request::{NewWfh, WfhRequest, WfhStatus},
};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, Display)]
pub enum RepoError {
    /// unique key violated
    #[display(fmt = "{}", _0)]
    Duplicate(String),
    #[display(fmt = "{}", _0)]
    Backend(String),
}

impl std::error::Error for RepoError {}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_id(&self, id: u64) -> RepoResult<Option<User>>;

    async fn find_by_phone(&self, phone: &str) -> RepoResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    /// Fails with `Duplicate` when the phone or email is already registered.
    async fn create(&self, user: NewUser) -> RepoResult<User>;

    async fn list_employees(&self, admin_id: u64) -> RepoResult<Vec<User>>;

    /// Applies the changes and copies a new name onto the user's attendance,
    /// leave and WFH documents as one unit.
    async fn update_profile(&self, id: u64, changes: &ProfileChanges) -> RepoResult<Option<User>>;

    async fn set_tracing_method(&self, admin_id: u64, method: TracingMethod) -> RepoResult<()>;

    /// Returns false when no such employee belongs to the admin.
    async fn set_active(&self, admin_id: u64, employee_id: u64, active: bool) -> RepoResult<bool>;

    async fn set_profile_picture(&self, id: u64, url: &str) -> RepoResult<()>;

    async fn record_login(&self, id: u64, at: NaiveDateTime) -> RepoResult<()>;

    async fn all_phones(&self) -> RepoResult<Vec<String>>;
}

#[async_trait]
pub trait AttendanceRepo: Send + Sync {
    async fn find_for_day(&self, employee_id: u64, date: NaiveDate) -> RepoResult<Option<AttendanceRecord>>;

    /// Fails with `Duplicate` when the employee already has a record that day.
    async fn insert(&self, record: NewAttendance) -> RepoResult<AttendanceRecord>;

    /// Sets the check-out time on an open record; false when none is open.
    async fn check_out(&self, employee_id: u64, date: NaiveDate, at: NaiveTime) -> RepoResult<bool>;

    async fn list_for_employee(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<AttendanceRecord>>;

    async fn list_for_admin(
        &self,
        admin_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<AttendanceRecord>>;
}

#[async_trait]
pub trait LeaveRepo: Send + Sync {
    async fn create(&self, leave: NewLeave) -> RepoResult<LeaveRequest>;

    async fn find(&self, id: u64) -> RepoResult<Option<LeaveRequest>>;

    /// Newest application first.
    async fn list_for_employee(&self, employee_id: u64) -> RepoResult<Vec<LeaveRequest>>;

    async fn list_for_admin(&self, admin_id: u64) -> RepoResult<Vec<LeaveRequest>>;

    async fn set_status(&self, id: u64, status: LeaveStatus) -> RepoResult<()>;
}

#[async_trait]
pub trait WfhRepo: Send + Sync {
    async fn create(&self, request: NewWfh) -> RepoResult<WfhRequest>;

    async fn find(&self, id: u64) -> RepoResult<Option<WfhRequest>>;

    async fn list_for_employee(&self, employee_id: u64) -> RepoResult<Vec<WfhRequest>>;

    async fn list_for_admin(&self, admin_id: u64) -> RepoResult<Vec<WfhRequest>>;

    async fn decide(
        &self,
        id: u64,
        status: WfhStatus,
        admin_notes: &str,
        at: NaiveDateTime,
    ) -> RepoResult<()>;
}

#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn daily_settings(&self, admin_id: u64) -> RepoResult<Option<DailyAttendanceSettings>>;

    /// Overwrites any previous configuration of the admin.
    async fn save_daily_settings(&self, settings: &DailyAttendanceSettings) -> RepoResult<()>;

    async fn leave_policy(&self, admin_id: u64) -> RepoResult<Option<LeavePolicy>>;

    async fn save_leave_policy(&self, policy: &LeavePolicy) -> RepoResult<()>;

    async fn create_meeting(&self, meeting: NewMeeting) -> RepoResult<Meeting>;

    async fn meetings_for_admin(&self, admin_id: u64) -> RepoResult<Vec<Meeting>>;

    async fn meetings_for_attendee(&self, employee_id: u64) -> RepoResult<Vec<Meeting>>;

    async fn change_requests(&self, admin_id: u64) -> RepoResult<Vec<MethodChangeRequest>>;

    async fn create_change_request(&self, request: NewChangeRequest) -> RepoResult<MethodChangeRequest>;
}

/// Refresh-token ledger used for rotation and logout.
#[async_trait]
pub trait TokenRepo: Send + Sync {
    async fn store(&self, user_id: u64, jti: &str, expires_at: NaiveDateTime) -> RepoResult<()>;

    /// Owner of the token when it exists and is not revoked.
    async fn active_owner(&self, jti: &str) -> RepoResult<Option<u64>>;

    /// True only for the call that flipped the token to revoked.
    async fn revoke(&self, jti: &str) -> RepoResult<bool>;
}
