use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::MySqlDatabaseError;
use sqlx::{FromRow, MySqlPool};

use super::{
    AttendanceRepo, LeaveRepo, RepoError, RepoResult, SettingsRepo, TokenRepo, UserRepo, WfhRepo,
};
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, NewAttendance},
    leave_request::{LeaveRequest, LeaveStatus, LeaveType, NewLeave},
    role::Role,
    settings::{
        ChangeRequestStatus, DailyAttendanceSettings, LeavePolicy, LeaveTrackingMode, Meeting,
        MethodChangeRequest, NewChangeRequest, NewMeeting, TracingMethod, WorkingDays,
    },
    user::{NewUser, ProfileChanges, User},
    wfh_request::{NewWfh, WfhRequest, WfhStatus, WfhType},
};

/// MySQL `ER_DUP_ENTRY`
const DUP_ENTRY: u16 = 1062;

/// Name of the unique key a failed insert or update collided with.
fn duplicate_key(err: &sqlx::Error) -> Option<String> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    let mysql_err = db_err.try_downcast_ref::<MySqlDatabaseError>()?;
    if mysql_err.number() != DUP_ENTRY {
        return None;
    }
    Some(key_name(mysql_err.message()).to_string())
}

/// "Duplicate entry '…' for key 'users.uq_users_email'" -> "uq_users_email"
fn key_name(message: &str) -> &str {
    let key = message
        .rsplit("for key ")
        .next()
        .unwrap_or_default()
        .trim_matches('\'');
    key.rsplit('.').next().unwrap_or(key)
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if duplicate_key(&err).is_some() {
            return RepoError::Duplicate("Record already exists".into());
        }
        RepoError::Backend(err.to_string())
    }
}

/// Maps unique-key collisions on `users` to the field that clashed.
fn user_conflict(err: sqlx::Error) -> RepoError {
    match duplicate_key(&err).as_deref() {
        Some("uq_users_email") => RepoError::Duplicate("Email already registered".into()),
        Some("uq_users_phone") => RepoError::Duplicate("Phone number already registered".into()),
        _ => err.into(),
    }
}

fn parse_column<T: FromStr>(column: &str, value: &str) -> RepoResult<T> {
    value
        .parse()
        .map_err(|_| RepoError::Backend(format!("unexpected {column} value `{value}`")))
}

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/* =========================
Users
========================= */

const USER_COLUMNS: &str = "id, name, phone, email, password_hash, role, admin_id, tracing_method, \
     is_active, is_new, department, designation, profile_picture_url, join_date, last_login_at";

#[derive(FromRow)]
struct UserRow {
    id: u64,
    name: String,
    phone: String,
    email: Option<String>,
    password_hash: Option<String>,
    role: String,
    admin_id: Option<u64>,
    tracing_method: Option<String>,
    is_active: bool,
    is_new: bool,
    department: Option<String>,
    designation: Option<String>,
    profile_picture_url: Option<String>,
    join_date: Option<NaiveDate>,
    last_login_at: Option<NaiveDateTime>,
}

impl TryFrom<UserRow> for User {
    type Error = RepoError;

    fn try_from(row: UserRow) -> RepoResult<Self> {
        let tracing_method = row
            .tracing_method
            .as_deref()
            .map(|m| parse_column::<TracingMethod>("tracing_method", m))
            .transpose()?;
        Ok(User {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            password_hash: row.password_hash,
            role: parse_column::<Role>("role", &row.role)?,
            admin_id: row.admin_id,
            tracing_method,
            is_active: row.is_active,
            is_new: row.is_new,
            department: row.department,
            designation: row.designation,
            profile_picture_url: row.profile_picture_url,
            join_date: row.join_date,
            last_login_at: row.last_login_at,
        })
    }
}

impl MySqlStore {
    async fn fetch_user(&self, filter: &str, value: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {filter} = ? LIMIT 1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }
}

#[async_trait]
impl UserRepo for MySqlStore {
    async fn find_by_id(&self, id: u64) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_phone(&self, phone: &str) -> RepoResult<Option<User>> {
        self.fetch_user("phone", phone).await
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.fetch_user("email", email).await
    }

    async fn create(&self, user: NewUser) -> RepoResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users
                (name, phone, email, password_hash, role, admin_id, tracing_method,
                 department, designation, join_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.name)
        .bind(&user.phone)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_ref())
        .bind(user.admin_id)
        .bind(user.tracing_method.map(|m| m.to_string()))
        .bind(&user.department)
        .bind(&user.designation)
        .bind(user.join_date)
        .execute(&self.pool)
        .await
        .map_err(user_conflict)?;

        self.find_by_id(result.last_insert_id())
            .await?
            .ok_or_else(|| RepoError::Backend("inserted user vanished".into()))
    }

    async fn list_employees(&self, admin_id: u64) -> RepoResult<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = 'employee' AND admin_id = ? ORDER BY name"
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(admin_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn update_profile(&self, id: u64, changes: &ProfileChanges) -> RepoResult<Option<User>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE(?, name),
                email = COALESCE(?, email),
                department = COALESCE(?, department),
                designation = COALESCE(?, designation),
                is_new = IF(?, FALSE, is_new)
            WHERE id = ?
            "#,
        )
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(&changes.department)
        .bind(&changes.designation)
        .bind(changes.complete_account)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(user_conflict)?;

        if let Some(name) = &changes.name {
            for table in ["attendance", "leave_requests", "wfh_requests"] {
                let sql = format!("UPDATE {table} SET employee_name = ? WHERE employee_id = ?");
                sqlx::query(&sql).bind(name).bind(id).execute(&mut *tx).await?;
            }
        }
        if let Some(email) = &changes.email {
            sqlx::query("UPDATE wfh_requests SET employee_email = ? WHERE employee_id = ?")
                .bind(email)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.find_by_id(id).await
    }

    async fn set_tracing_method(&self, admin_id: u64, method: TracingMethod) -> RepoResult<()> {
        sqlx::query("UPDATE users SET tracing_method = ? WHERE id = ?")
            .bind(method.to_string())
            .bind(admin_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_active(&self, admin_id: u64, employee_id: u64, active: bool) -> RepoResult<bool> {
        let existing = sqlx::query_scalar::<_, u64>(
            "SELECT id FROM users WHERE id = ? AND admin_id = ? AND role = 'employee'",
        )
        .bind(employee_id)
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await?;
        if existing.is_none() {
            return Ok(false);
        }

        sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(employee_id)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    async fn set_profile_picture(&self, id: u64, url: &str) -> RepoResult<()> {
        sqlx::query("UPDATE users SET profile_picture_url = ? WHERE id = ?")
            .bind(url)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_login(&self, id: u64, at: NaiveDateTime) -> RepoResult<()> {
        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn all_phones(&self) -> RepoResult<Vec<String>> {
        Ok(sqlx::query_scalar::<_, String>("SELECT phone FROM users")
            .fetch_all(&self.pool)
            .await?)
    }
}

/* =========================
Attendance
========================= */

const ATTENDANCE_COLUMNS: &str = "id, employee_id, admin_id, employee_name, date, check_in_time, \
     check_out_time, status, location";

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    admin_id: u64,
    employee_name: String,
    date: NaiveDate,
    check_in_time: NaiveTime,
    check_out_time: Option<NaiveTime>,
    status: String,
    location: String,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = RepoError;

    fn try_from(row: AttendanceRow) -> RepoResult<Self> {
        Ok(AttendanceRecord {
            id: row.id,
            employee_id: row.employee_id,
            admin_id: row.admin_id,
            employee_name: row.employee_name,
            date: row.date,
            check_in_time: row.check_in_time,
            check_out_time: row.check_out_time,
            status: parse_column::<AttendanceStatus>("attendance status", &row.status)?,
            location: row.location,
        })
    }
}

#[async_trait]
impl AttendanceRepo for MySqlStore {
    async fn find_for_day(&self, employee_id: u64, date: NaiveDate) -> RepoResult<Option<AttendanceRecord>> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?");
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn insert(&self, record: NewAttendance) -> RepoResult<AttendanceRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (employee_id, admin_id, employee_name, date, check_in_time, status, location)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.employee_id)
        .bind(record.admin_id)
        .bind(&record.employee_name)
        .bind(record.date)
        .bind(record.check_in_time)
        .bind(record.status.as_ref())
        .bind(&record.location)
        .execute(&self.pool)
        .await
        .map_err(|e| match RepoError::from(e) {
            RepoError::Duplicate(_) => RepoError::Duplicate("Already checked in today".into()),
            other => other,
        })?;

        Ok(AttendanceRecord {
            id: result.last_insert_id(),
            employee_id: record.employee_id,
            admin_id: record.admin_id,
            employee_name: record.employee_name,
            date: record.date,
            check_in_time: record.check_in_time,
            check_out_time: None,
            status: record.status,
            location: record.location,
        })
    }

    async fn check_out(&self, employee_id: u64, date: NaiveDate, at: NaiveTime) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out_time = ?
            WHERE employee_id = ?
            AND date = ?
            AND check_out_time IS NULL
            "#,
        )
        .bind(at)
        .bind(employee_id)
        .bind(date)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_employee(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE employee_id = ? AND date BETWEEN ? AND ? ORDER BY date DESC"
        );
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(AttendanceRecord::try_from)
            .collect()
    }

    async fn list_for_admin(
        &self,
        admin_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE admin_id = ? AND date BETWEEN ? AND ? ORDER BY date DESC, check_in_time DESC"
        );
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(admin_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(AttendanceRecord::try_from)
            .collect()
    }
}

/* =========================
Leave requests
========================= */

const LEAVE_COLUMNS: &str = "id, employee_id, admin_id, employee_name, start_date, end_date, \
     start_time, end_time, leave_type, reason, status, applied_on, days_requested";

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    admin_id: u64,
    employee_name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    leave_type: String,
    reason: String,
    status: String,
    applied_on: NaiveDate,
    days_requested: u32,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = RepoError;

    fn try_from(row: LeaveRow) -> RepoResult<Self> {
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            admin_id: row.admin_id,
            employee_name: row.employee_name,
            start_date: row.start_date,
            end_date: row.end_date,
            start_time: row.start_time,
            end_time: row.end_time,
            leave_type: parse_column::<LeaveType>("leave_type", &row.leave_type)?,
            reason: row.reason,
            // stored values may carry stray whitespace
            status: parse_column::<LeaveStatus>("leave status", row.status.trim())?,
            applied_on: row.applied_on,
            days_requested: row.days_requested,
        })
    }
}

impl MySqlStore {
    async fn leaves_where(&self, filter: &str, id: u64) -> RepoResult<Vec<LeaveRequest>> {
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE {filter} = ? \
             ORDER BY applied_on DESC, id DESC"
        );
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect()
    }
}

#[async_trait]
impl LeaveRepo for MySqlStore {
    async fn create(&self, leave: NewLeave) -> RepoResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, admin_id, employee_name, start_date, end_date, start_time, end_time,
                 leave_type, reason, status, applied_on, days_requested)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'Pending', ?, ?)
            "#,
        )
        .bind(leave.employee_id)
        .bind(leave.admin_id)
        .bind(&leave.employee_name)
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(leave.start_time)
        .bind(leave.end_time)
        .bind(leave.leave_type.as_ref())
        .bind(&leave.reason)
        .bind(leave.applied_on)
        .bind(leave.days_requested)
        .execute(&self.pool)
        .await?;

        LeaveRepo::find(self, result.last_insert_id())
            .await?
            .ok_or_else(|| RepoError::Backend("inserted leave request vanished".into()))
    }

    async fn find(&self, id: u64) -> RepoResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn list_for_employee(&self, employee_id: u64) -> RepoResult<Vec<LeaveRequest>> {
        self.leaves_where("employee_id", employee_id).await
    }

    async fn list_for_admin(&self, admin_id: u64) -> RepoResult<Vec<LeaveRequest>> {
        self.leaves_where("admin_id", admin_id).await
    }

    async fn set_status(&self, id: u64, status: LeaveStatus) -> RepoResult<()> {
        sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ?")
            .bind(status.as_ref())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/* =========================
WFH requests
========================= */

const WFH_COLUMNS: &str = "id, employee_id, admin_id, employee_name, employee_email, department, \
     request_type, start_date, end_date, status, reason, work_location, emergency_phone, \
     additional_notes, admin_notes, submitted_at, decided_at";

#[derive(FromRow)]
struct WfhRow {
    id: u64,
    employee_id: u64,
    admin_id: u64,
    employee_name: String,
    employee_email: String,
    department: String,
    request_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    reason: String,
    work_location: String,
    emergency_phone: Option<String>,
    additional_notes: Option<String>,
    admin_notes: Option<String>,
    submitted_at: NaiveDateTime,
    decided_at: Option<NaiveDateTime>,
}

impl TryFrom<WfhRow> for WfhRequest {
    type Error = RepoError;

    fn try_from(row: WfhRow) -> RepoResult<Self> {
        Ok(WfhRequest {
            id: row.id,
            employee_id: row.employee_id,
            admin_id: row.admin_id,
            employee_name: row.employee_name,
            employee_email: row.employee_email,
            department: row.department,
            request_type: parse_column::<WfhType>("request_type", &row.request_type)?,
            start_date: row.start_date,
            end_date: row.end_date,
            status: parse_column::<WfhStatus>("wfh status", &row.status)?,
            reason: row.reason,
            work_location: row.work_location,
            emergency_phone: row.emergency_phone,
            additional_notes: row.additional_notes,
            admin_notes: row.admin_notes,
            submitted_at: row.submitted_at,
            decided_at: row.decided_at,
        })
    }
}

impl MySqlStore {
    async fn wfh_where(&self, filter: &str, id: u64) -> RepoResult<Vec<WfhRequest>> {
        let sql = format!(
            "SELECT {WFH_COLUMNS} FROM wfh_requests WHERE {filter} = ? ORDER BY submitted_at DESC"
        );
        sqlx::query_as::<_, WfhRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(WfhRequest::try_from)
            .collect()
    }
}

#[async_trait]
impl WfhRepo for MySqlStore {
    async fn create(&self, request: NewWfh) -> RepoResult<WfhRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO wfh_requests
                (employee_id, admin_id, employee_name, employee_email, department, request_type,
                 start_date, end_date, status, reason, work_location, emergency_phone,
                 additional_notes, submitted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.employee_id)
        .bind(request.admin_id)
        .bind(&request.employee_name)
        .bind(&request.employee_email)
        .bind(&request.department)
        .bind(request.request_type.as_ref())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.reason)
        .bind(&request.work_location)
        .bind(&request.emergency_phone)
        .bind(&request.additional_notes)
        .bind(request.submitted_at)
        .execute(&self.pool)
        .await?;

        WfhRepo::find(self, result.last_insert_id())
            .await?
            .ok_or_else(|| RepoError::Backend("inserted wfh request vanished".into()))
    }

    async fn find(&self, id: u64) -> RepoResult<Option<WfhRequest>> {
        let sql = format!("SELECT {WFH_COLUMNS} FROM wfh_requests WHERE id = ?");
        sqlx::query_as::<_, WfhRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(WfhRequest::try_from)
            .transpose()
    }

    async fn list_for_employee(&self, employee_id: u64) -> RepoResult<Vec<WfhRequest>> {
        self.wfh_where("employee_id", employee_id).await
    }

    async fn list_for_admin(&self, admin_id: u64) -> RepoResult<Vec<WfhRequest>> {
        self.wfh_where("admin_id", admin_id).await
    }

    async fn decide(
        &self,
        id: u64,
        status: WfhStatus,
        admin_notes: &str,
        at: NaiveDateTime,
    ) -> RepoResult<()> {
        sqlx::query("UPDATE wfh_requests SET status = ?, admin_notes = ?, decided_at = ? WHERE id = ?")
            .bind(status.as_ref())
            .bind(admin_notes)
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/* =========================
Settings, meetings, change requests
========================= */

#[derive(FromRow)]
struct DailySettingsRow {
    admin_id: u64,
    work_mon: bool,
    work_tue: bool,
    work_wed: bool,
    work_thu: bool,
    work_fri: bool,
    work_sat: bool,
    work_sun: bool,
    check_in_start_time: NaiveTime,
    check_in_end_time: NaiveTime,
    check_out_start_time: NaiveTime,
    check_out_end_time: NaiveTime,
    working_hours: u32,
    early_check_in_allowed: u32,
    late_check_in_allowed: u32,
    late_check_out_allowed: u32,
}

impl From<DailySettingsRow> for DailyAttendanceSettings {
    fn from(row: DailySettingsRow) -> Self {
        DailyAttendanceSettings {
            admin_id: row.admin_id,
            working_days: WorkingDays {
                mon: row.work_mon,
                tue: row.work_tue,
                wed: row.work_wed,
                thu: row.work_thu,
                fri: row.work_fri,
                sat: row.work_sat,
                sun: row.work_sun,
            },
            check_in_start_time: row.check_in_start_time,
            check_in_end_time: row.check_in_end_time,
            check_out_start_time: row.check_out_start_time,
            check_out_end_time: row.check_out_end_time,
            working_hours: row.working_hours,
            early_check_in_allowed: row.early_check_in_allowed,
            late_check_in_allowed: row.late_check_in_allowed,
            late_check_out_allowed: row.late_check_out_allowed,
        }
    }
}

#[derive(FromRow)]
struct LeavePolicyRow {
    admin_id: u64,
    leave_quota: u32,
    carry_forward: bool,
    maximum_days_carry_forward: u32,
    tracking_mode: String,
}

#[derive(FromRow)]
struct MeetingRow {
    id: u64,
    admin_id: u64,
    title: String,
    meeting_date: NaiveDate,
    meeting_time: Option<NaiveTime>,
    duration_minutes: u32,
    early_check_in_allowed: u32,
    status: String,
    created_by: u64,
    created_at: NaiveDateTime,
}

#[derive(FromRow)]
struct ChangeRequestRow {
    id: u64,
    admin_id: u64,
    admin_name: String,
    admin_email: Option<String>,
    requested_method: String,
    status: String,
    request_date: NaiveDate,
}

impl TryFrom<ChangeRequestRow> for MethodChangeRequest {
    type Error = RepoError;

    fn try_from(row: ChangeRequestRow) -> RepoResult<Self> {
        Ok(MethodChangeRequest {
            id: row.id,
            admin_id: row.admin_id,
            admin_name: row.admin_name,
            admin_email: row.admin_email,
            requested_method: parse_column::<TracingMethod>("requested_method", &row.requested_method)?,
            status: parse_column::<ChangeRequestStatus>("change request status", &row.status)?,
            request_date: row.request_date,
        })
    }
}

const MEETING_COLUMNS: &str = "m.id, m.admin_id, m.title, m.meeting_date, m.meeting_time, \
     m.duration_minutes, m.early_check_in_allowed, m.status, m.created_by, m.created_at";

impl MySqlStore {
    /// Loads meetings plus their attendee lists; `filter` selects meeting ids.
    async fn meetings_matching(&self, join: &str, filter: &str, id: u64) -> RepoResult<Vec<Meeting>> {
        let sql = format!(
            "SELECT {MEETING_COLUMNS} FROM meetings m {join} WHERE {filter} = ? \
             ORDER BY m.meeting_date DESC, m.id DESC"
        );
        let rows = sqlx::query_as::<_, MeetingRow>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        let attendee_sql = format!(
            "SELECT a.meeting_id, a.employee_id FROM meeting_attendees a \
             WHERE a.meeting_id IN (SELECT m.id FROM meetings m {join} WHERE {filter} = ?)"
        );
        let pairs = sqlx::query_as::<_, (u64, u64)>(&attendee_sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        let mut attendees: HashMap<u64, Vec<u64>> = HashMap::new();
        for (meeting_id, employee_id) in pairs {
            attendees.entry(meeting_id).or_default().push(employee_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| Meeting {
                attendees: attendees.remove(&row.id).unwrap_or_default(),
                id: row.id,
                admin_id: row.admin_id,
                title: row.title,
                meeting_date: row.meeting_date,
                meeting_time: row.meeting_time,
                duration_minutes: row.duration_minutes,
                early_check_in_allowed: row.early_check_in_allowed,
                status: row.status,
                created_by: row.created_by,
                created_at: row.created_at,
            })
            .collect())
    }
}

#[async_trait]
impl SettingsRepo for MySqlStore {
    async fn daily_settings(&self, admin_id: u64) -> RepoResult<Option<DailyAttendanceSettings>> {
        Ok(sqlx::query_as::<_, DailySettingsRow>(
            r#"
            SELECT admin_id, work_mon, work_tue, work_wed, work_thu, work_fri, work_sat, work_sun,
                   check_in_start_time, check_in_end_time, check_out_start_time, check_out_end_time,
                   working_hours, early_check_in_allowed, late_check_in_allowed, late_check_out_allowed
            FROM daily_attendance_settings
            WHERE admin_id = ?
            "#,
        )
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await?
        .map(DailyAttendanceSettings::from))
    }

    async fn save_daily_settings(&self, settings: &DailyAttendanceSettings) -> RepoResult<()> {
        let days = &settings.working_days;
        sqlx::query(
            r#"
            REPLACE INTO daily_attendance_settings
                (admin_id, work_mon, work_tue, work_wed, work_thu, work_fri, work_sat, work_sun,
                 check_in_start_time, check_in_end_time, check_out_start_time, check_out_end_time,
                 working_hours, early_check_in_allowed, late_check_in_allowed, late_check_out_allowed)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(settings.admin_id)
        .bind(days.mon)
        .bind(days.tue)
        .bind(days.wed)
        .bind(days.thu)
        .bind(days.fri)
        .bind(days.sat)
        .bind(days.sun)
        .bind(settings.check_in_start_time)
        .bind(settings.check_in_end_time)
        .bind(settings.check_out_start_time)
        .bind(settings.check_out_end_time)
        .bind(settings.working_hours)
        .bind(settings.early_check_in_allowed)
        .bind(settings.late_check_in_allowed)
        .bind(settings.late_check_out_allowed)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn leave_policy(&self, admin_id: u64) -> RepoResult<Option<LeavePolicy>> {
        let row = sqlx::query_as::<_, LeavePolicyRow>(
            r#"
            SELECT admin_id, leave_quota, carry_forward, maximum_days_carry_forward, tracking_mode
            FROM leave_policies
            WHERE admin_id = ?
            "#,
        )
        .bind(admin_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(LeavePolicy {
                admin_id: row.admin_id,
                leave_quota: row.leave_quota,
                carry_forward: row.carry_forward,
                maximum_days_carry_forward: row.maximum_days_carry_forward,
                tracking_mode: parse_column::<LeaveTrackingMode>("tracking_mode", &row.tracking_mode)?,
            })
        })
        .transpose()
    }

    async fn save_leave_policy(&self, policy: &LeavePolicy) -> RepoResult<()> {
        sqlx::query(
            r#"
            REPLACE INTO leave_policies
                (admin_id, leave_quota, carry_forward, maximum_days_carry_forward, tracking_mode)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(policy.admin_id)
        .bind(policy.leave_quota)
        .bind(policy.carry_forward)
        .bind(policy.maximum_days_carry_forward)
        .bind(policy.tracking_mode.as_ref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_meeting(&self, meeting: NewMeeting) -> RepoResult<Meeting> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO meetings
                (admin_id, title, meeting_date, meeting_time, duration_minutes,
                 early_check_in_allowed, status, created_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 'upcoming', ?, ?)
            "#,
        )
        .bind(meeting.admin_id)
        .bind(&meeting.title)
        .bind(meeting.meeting_date)
        .bind(meeting.meeting_time)
        .bind(meeting.duration_minutes)
        .bind(meeting.early_check_in_allowed)
        .bind(meeting.created_by)
        .bind(meeting.created_at)
        .execute(&mut *tx)
        .await?;
        let meeting_id = result.last_insert_id();

        for employee_id in &meeting.attendees {
            sqlx::query("INSERT INTO meeting_attendees (meeting_id, employee_id) VALUES (?, ?)")
                .bind(meeting_id)
                .bind(employee_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(Meeting {
            id: meeting_id,
            admin_id: meeting.admin_id,
            title: meeting.title,
            meeting_date: meeting.meeting_date,
            meeting_time: meeting.meeting_time,
            duration_minutes: meeting.duration_minutes,
            early_check_in_allowed: meeting.early_check_in_allowed,
            attendees: meeting.attendees,
            status: "upcoming".to_string(),
            created_by: meeting.created_by,
            created_at: meeting.created_at,
        })
    }

    async fn meetings_for_admin(&self, admin_id: u64) -> RepoResult<Vec<Meeting>> {
        self.meetings_matching("", "m.admin_id", admin_id).await
    }

    async fn meetings_for_attendee(&self, employee_id: u64) -> RepoResult<Vec<Meeting>> {
        self.meetings_matching(
            "JOIN meeting_attendees ma ON ma.meeting_id = m.id",
            "ma.employee_id",
            employee_id,
        )
        .await
    }

    async fn change_requests(&self, admin_id: u64) -> RepoResult<Vec<MethodChangeRequest>> {
        sqlx::query_as::<_, ChangeRequestRow>(
            r#"
            SELECT id, admin_id, admin_name, admin_email, requested_method, status, request_date
            FROM admin_change_requests
            WHERE admin_id = ?
            ORDER BY id
            "#,
        )
        .bind(admin_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(MethodChangeRequest::try_from)
        .collect()
    }

    async fn create_change_request(&self, request: NewChangeRequest) -> RepoResult<MethodChangeRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO admin_change_requests
                (admin_id, admin_name, admin_email, requested_method, status, request_date)
            VALUES (?, ?, ?, ?, 'Pending', ?)
            "#,
        )
        .bind(request.admin_id)
        .bind(&request.admin_name)
        .bind(&request.admin_email)
        .bind(request.requested_method.to_string())
        .bind(request.request_date)
        .execute(&self.pool)
        .await?;

        Ok(MethodChangeRequest {
            id: result.last_insert_id(),
            admin_id: request.admin_id,
            admin_name: request.admin_name,
            admin_email: request.admin_email,
            requested_method: request.requested_method,
            status: ChangeRequestStatus::Pending,
            request_date: request.request_date,
        })
    }
}

/* =========================
Refresh tokens
========================= */

#[async_trait]
impl TokenRepo for MySqlStore {
    async fn store(&self, user_id: u64, jti: &str, expires_at: NaiveDateTime) -> RepoResult<()> {
        sqlx::query("INSERT INTO refresh_tokens (user_id, jti, expires_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(jti)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn active_owner(&self, jti: &str) -> RepoResult<Option<u64>> {
        Ok(sqlx::query_scalar::<_, u64>(
            "SELECT user_id FROM refresh_tokens WHERE jti = ? AND revoked = FALSE",
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn revoke(&self, jti: &str) -> RepoResult<bool> {
        let result =
            sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ? AND revoked = FALSE")
                .bind(jti)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }
}
