use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::{
    AttendanceRepo, LeaveRepo, RepoError, RepoResult, SettingsRepo, TokenRepo, UserRepo, WfhRepo,
};
use crate::model::{
    attendance::{AttendanceRecord, NewAttendance},
    leave_request::{LeaveRequest, LeaveStatus, NewLeave},
    role::Role,
    settings::{
        ChangeRequestStatus, DailyAttendanceSettings, LeavePolicy, Meeting, MethodChangeRequest,
        NewChangeRequest, NewMeeting, TracingMethod,
    },
    user::{NewUser, ProfileChanges, User},
    wfh_request::{NewWfh, WfhRequest, WfhStatus},
};

struct RefreshEntry {
    user_id: u64,
    revoked: bool,
}

#[derive(Default)]
struct Tables {
    next_id: u64,
    users: Vec<User>,
    attendance: Vec<AttendanceRecord>,
    leaves: Vec<LeaveRequest>,
    wfh: Vec<WfhRequest>,
    daily: HashMap<u64, DailyAttendanceSettings>,
    policies: HashMap<u64, LeavePolicy>,
    meetings: Vec<Meeting>,
    change_requests: Vec<MethodChangeRequest>,
    tokens: HashMap<String, RefreshEntry>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store. Every trait call runs under one lock, so the
/// multi-collection rename is atomic here too.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RepoResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| RepoError::Backend("memory store lock poisoned".into()))
    }

    fn write(&self) -> RepoResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| RepoError::Backend("memory store lock poisoned".into()))
    }

    /// Stand-in for the external approver of method change requests.
    #[cfg(test)]
    pub fn set_change_request_status(&self, id: u64, status: ChangeRequestStatus) -> RepoResult<()> {
        let mut tables = self.write()?;
        if let Some(request) = tables.change_requests.iter_mut().find(|r| r.id == id) {
            request.status = status;
        }
        Ok(())
    }
}

fn email_taken(users: &[User], email: &str, except: Option<u64>) -> bool {
    users.iter().any(|u| {
        Some(u.id) != except && u.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email))
    })
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_id(&self, id: u64) -> RepoResult<Option<User>> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> RepoResult<Option<User>> {
        Ok(self.read()?.users.iter().find(|u| u.phone == phone).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)))
            .cloned())
    }

    async fn create(&self, user: NewUser) -> RepoResult<User> {
        let mut tables = self.write()?;
        if tables.users.iter().any(|u| u.phone == user.phone) {
            return Err(RepoError::Duplicate("Phone number already registered".into()));
        }
        if let Some(email) = &user.email {
            if email_taken(&tables.users, email, None) {
                return Err(RepoError::Duplicate("Email already registered".into()));
            }
        }
        let user = User {
            id: tables.next_id(),
            name: user.name,
            phone: user.phone,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            admin_id: user.admin_id,
            tracing_method: user.tracing_method,
            is_active: true,
            is_new: true,
            department: user.department,
            designation: user.designation,
            profile_picture_url: None,
            join_date: user.join_date,
            last_login_at: None,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn list_employees(&self, admin_id: u64) -> RepoResult<Vec<User>> {
        Ok(self
            .read()?
            .users
            .iter()
            .filter(|u| u.role == Role::Employee && u.admin_id == Some(admin_id))
            .cloned()
            .collect())
    }

    async fn update_profile(&self, id: u64, changes: &ProfileChanges) -> RepoResult<Option<User>> {
        let mut tables = self.write()?;
        if let Some(email) = &changes.email {
            if email_taken(&tables.users, email, Some(id)) {
                return Err(RepoError::Duplicate("Email already registered".into()));
            }
        }
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            user.name = name.clone();
        }
        if let Some(email) = &changes.email {
            user.email = Some(email.clone());
        }
        if let Some(department) = &changes.department {
            user.department = Some(department.clone());
        }
        if let Some(designation) = &changes.designation {
            user.designation = Some(designation.clone());
        }
        if changes.complete_account {
            user.is_new = false;
        }
        let updated = user.clone();

        if let Some(name) = &changes.name {
            for record in tables.attendance.iter_mut().filter(|r| r.employee_id == id) {
                record.employee_name = name.clone();
            }
            for leave in tables.leaves.iter_mut().filter(|l| l.employee_id == id) {
                leave.employee_name = name.clone();
            }
            for request in tables.wfh.iter_mut().filter(|w| w.employee_id == id) {
                request.employee_name = name.clone();
            }
        }
        if let Some(email) = &changes.email {
            for request in tables.wfh.iter_mut().filter(|w| w.employee_id == id) {
                request.employee_email = email.clone();
            }
        }
        Ok(Some(updated))
    }

    async fn set_tracing_method(&self, admin_id: u64, method: TracingMethod) -> RepoResult<()> {
        let mut tables = self.write()?;
        if let Some(admin) = tables.users.iter_mut().find(|u| u.id == admin_id) {
            admin.tracing_method = Some(method);
        }
        Ok(())
    }

    async fn set_active(&self, admin_id: u64, employee_id: u64, active: bool) -> RepoResult<bool> {
        let mut tables = self.write()?;
        match tables
            .users
            .iter_mut()
            .find(|u| u.id == employee_id && u.admin_id == Some(admin_id))
        {
            Some(employee) => {
                employee.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_profile_picture(&self, id: u64, url: &str) -> RepoResult<()> {
        let mut tables = self.write()?;
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.profile_picture_url = Some(url.to_string());
        }
        Ok(())
    }

    async fn record_login(&self, id: u64, at: NaiveDateTime) -> RepoResult<()> {
        let mut tables = self.write()?;
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn all_phones(&self) -> RepoResult<Vec<String>> {
        Ok(self.read()?.users.iter().map(|u| u.phone.clone()).collect())
    }
}

#[async_trait]
impl AttendanceRepo for MemoryStore {
    async fn find_for_day(&self, employee_id: u64, date: NaiveDate) -> RepoResult<Option<AttendanceRecord>> {
        Ok(self
            .read()?
            .attendance
            .iter()
            .find(|r| r.employee_id == employee_id && r.date == date)
            .cloned())
    }

    async fn insert(&self, record: NewAttendance) -> RepoResult<AttendanceRecord> {
        let mut tables = self.write()?;
        if tables
            .attendance
            .iter()
            .any(|r| r.employee_id == record.employee_id && r.date == record.date)
        {
            return Err(RepoError::Duplicate("Already checked in today".into()));
        }
        let record = AttendanceRecord {
            id: tables.next_id(),
            employee_id: record.employee_id,
            admin_id: record.admin_id,
            employee_name: record.employee_name,
            date: record.date,
            check_in_time: record.check_in_time,
            check_out_time: None,
            status: record.status,
            location: record.location,
        };
        tables.attendance.push(record.clone());
        Ok(record)
    }

    async fn check_out(&self, employee_id: u64, date: NaiveDate, at: NaiveTime) -> RepoResult<bool> {
        let mut tables = self.write()?;
        match tables.attendance.iter_mut().find(|r| {
            r.employee_id == employee_id && r.date == date && r.check_out_time.is_none()
        }) {
            Some(record) => {
                record.check_out_time = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_for_employee(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        let mut records: Vec<_> = self
            .read()?
            .attendance
            .iter()
            .filter(|r| r.employee_id == employee_id && r.date >= from && r.date <= to)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    async fn list_for_admin(
        &self,
        admin_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        let mut records: Vec<_> = self
            .read()?
            .attendance
            .iter()
            .filter(|r| r.admin_id == admin_id && r.date >= from && r.date <= to)
            .cloned()
            .collect();
        records.sort_by(|a, b| (b.date, b.check_in_time).cmp(&(a.date, a.check_in_time)));
        Ok(records)
    }
}

#[async_trait]
impl LeaveRepo for MemoryStore {
    async fn create(&self, leave: NewLeave) -> RepoResult<LeaveRequest> {
        let mut tables = self.write()?;
        let leave = LeaveRequest {
            id: tables.next_id(),
            employee_id: leave.employee_id,
            admin_id: leave.admin_id,
            employee_name: leave.employee_name,
            start_date: leave.start_date,
            end_date: leave.end_date,
            start_time: leave.start_time,
            end_time: leave.end_time,
            leave_type: leave.leave_type,
            reason: leave.reason,
            status: LeaveStatus::Pending,
            applied_on: leave.applied_on,
            days_requested: leave.days_requested,
        };
        tables.leaves.push(leave.clone());
        Ok(leave)
    }

    async fn find(&self, id: u64) -> RepoResult<Option<LeaveRequest>> {
        Ok(self.read()?.leaves.iter().find(|l| l.id == id).cloned())
    }

    async fn list_for_employee(&self, employee_id: u64) -> RepoResult<Vec<LeaveRequest>> {
        let mut leaves: Vec<_> = self
            .read()?
            .leaves
            .iter()
            .filter(|l| l.employee_id == employee_id)
            .cloned()
            .collect();
        leaves.sort_by(|a, b| (b.applied_on, b.id).cmp(&(a.applied_on, a.id)));
        Ok(leaves)
    }

    async fn list_for_admin(&self, admin_id: u64) -> RepoResult<Vec<LeaveRequest>> {
        let mut leaves: Vec<_> = self
            .read()?
            .leaves
            .iter()
            .filter(|l| l.admin_id == admin_id)
            .cloned()
            .collect();
        leaves.sort_by(|a, b| (b.applied_on, b.id).cmp(&(a.applied_on, a.id)));
        Ok(leaves)
    }

    async fn set_status(&self, id: u64, status: LeaveStatus) -> RepoResult<()> {
        let mut tables = self.write()?;
        if let Some(leave) = tables.leaves.iter_mut().find(|l| l.id == id) {
            leave.status = status;
        }
        Ok(())
    }
}

#[async_trait]
impl WfhRepo for MemoryStore {
    async fn create(&self, request: NewWfh) -> RepoResult<WfhRequest> {
        let mut tables = self.write()?;
        let request = WfhRequest {
            id: tables.next_id(),
            employee_id: request.employee_id,
            admin_id: request.admin_id,
            employee_name: request.employee_name,
            employee_email: request.employee_email,
            department: request.department,
            request_type: request.request_type,
            start_date: request.start_date,
            end_date: request.end_date,
            status: WfhStatus::Pending,
            reason: request.reason,
            work_location: request.work_location,
            emergency_phone: request.emergency_phone,
            additional_notes: request.additional_notes,
            admin_notes: None,
            submitted_at: request.submitted_at,
            decided_at: None,
        };
        tables.wfh.push(request.clone());
        Ok(request)
    }

    async fn find(&self, id: u64) -> RepoResult<Option<WfhRequest>> {
        Ok(self.read()?.wfh.iter().find(|w| w.id == id).cloned())
    }

    async fn list_for_employee(&self, employee_id: u64) -> RepoResult<Vec<WfhRequest>> {
        let mut requests: Vec<_> = self
            .read()?
            .wfh
            .iter()
            .filter(|w| w.employee_id == employee_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(requests)
    }

    async fn list_for_admin(&self, admin_id: u64) -> RepoResult<Vec<WfhRequest>> {
        let mut requests: Vec<_> = self
            .read()?
            .wfh
            .iter()
            .filter(|w| w.admin_id == admin_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(requests)
    }

    async fn decide(
        &self,
        id: u64,
        status: WfhStatus,
        admin_notes: &str,
        at: NaiveDateTime,
    ) -> RepoResult<()> {
        let mut tables = self.write()?;
        if let Some(request) = tables.wfh.iter_mut().find(|w| w.id == id) {
            request.status = status;
            request.admin_notes = Some(admin_notes.to_string());
            request.decided_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsRepo for MemoryStore {
    async fn daily_settings(&self, admin_id: u64) -> RepoResult<Option<DailyAttendanceSettings>> {
        Ok(self.read()?.daily.get(&admin_id).cloned())
    }

    async fn save_daily_settings(&self, settings: &DailyAttendanceSettings) -> RepoResult<()> {
        self.write()?.daily.insert(settings.admin_id, settings.clone());
        Ok(())
    }

    async fn leave_policy(&self, admin_id: u64) -> RepoResult<Option<LeavePolicy>> {
        Ok(self.read()?.policies.get(&admin_id).cloned())
    }

    async fn save_leave_policy(&self, policy: &LeavePolicy) -> RepoResult<()> {
        self.write()?.policies.insert(policy.admin_id, policy.clone());
        Ok(())
    }

    async fn create_meeting(&self, meeting: NewMeeting) -> RepoResult<Meeting> {
        let mut tables = self.write()?;
        let meeting = Meeting {
            id: tables.next_id(),
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
        };
        tables.meetings.push(meeting.clone());
        Ok(meeting)
    }

    async fn meetings_for_admin(&self, admin_id: u64) -> RepoResult<Vec<Meeting>> {
        Ok(self
            .read()?
            .meetings
            .iter()
            .filter(|m| m.admin_id == admin_id)
            .cloned()
            .collect())
    }

    async fn meetings_for_attendee(&self, employee_id: u64) -> RepoResult<Vec<Meeting>> {
        Ok(self
            .read()?
            .meetings
            .iter()
            .filter(|m| m.attendees.contains(&employee_id))
            .cloned()
            .collect())
    }

    async fn change_requests(&self, admin_id: u64) -> RepoResult<Vec<MethodChangeRequest>> {
        Ok(self
            .read()?
            .change_requests
            .iter()
            .filter(|r| r.admin_id == admin_id)
            .cloned()
            .collect())
    }

    async fn create_change_request(&self, request: NewChangeRequest) -> RepoResult<MethodChangeRequest> {
        let mut tables = self.write()?;
        let request = MethodChangeRequest {
            id: tables.next_id(),
            admin_id: request.admin_id,
            admin_name: request.admin_name,
            admin_email: request.admin_email,
            requested_method: request.requested_method,
            status: ChangeRequestStatus::Pending,
            request_date: request.request_date,
        };
        tables.change_requests.push(request.clone());
        Ok(request)
    }
}

#[async_trait]
impl TokenRepo for MemoryStore {
    async fn store(&self, user_id: u64, jti: &str, _expires_at: NaiveDateTime) -> RepoResult<()> {
        self.write()?.tokens.insert(
            jti.to_string(),
            RefreshEntry {
                user_id,
                revoked: false,
            },
        );
        Ok(())
    }

    async fn active_owner(&self, jti: &str) -> RepoResult<Option<u64>> {
        Ok(self
            .read()?
            .tokens
            .get(jti)
            .filter(|entry| !entry.revoked)
            .map(|entry| entry.user_id))
    }

    async fn revoke(&self, jti: &str) -> RepoResult<bool> {
        Ok(match self.write()?.tokens.get_mut(jti) {
            Some(entry) if !entry.revoked => {
                entry.revoked = true;
                true
            }
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(phone: &str, admin_id: u64) -> NewUser {
        NewUser {
            name: "Jane Smith".into(),
            phone: phone.into(),
            email: Some(format!("{phone}@example.com")),
            password_hash: None,
            role: Role::Employee,
            admin_id: Some(admin_id),
            tracing_method: None,
            department: Some("Sales".into()),
            designation: None,
            join_date: None,
        }
    }

    #[actix_web::test]
    async fn phone_numbers_are_unique() {
        let store = MemoryStore::new();
        UserRepo::create(&store, employee("9000000001", 1)).await.unwrap();
        let err = UserRepo::create(&store, employee("9000000001", 1)).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[actix_web::test]
    async fn emails_are_unique_across_accounts() {
        let store = MemoryStore::new();
        let first = UserRepo::create(&store, employee("9000000001", 1)).await.unwrap();
        let second = UserRepo::create(&store, employee("9000000002", 1)).await.unwrap();

        let clash = NewUser {
            email: Some("9000000001@EXAMPLE.com".into()),
            ..employee("9000000003", 1)
        };
        let err = UserRepo::create(&store, clash).await.unwrap_err();
        assert_eq!(err.to_string(), "Email already registered");

        let steal = ProfileChanges {
            email: first.email.clone(),
            ..Default::default()
        };
        let err = store.update_profile(second.id, &steal).await.unwrap_err();
        assert_eq!(err.to_string(), "Email already registered");

        // keeping your own address is fine
        let keep = ProfileChanges {
            email: first.email.clone(),
            ..Default::default()
        };
        assert!(store.update_profile(first.id, &keep).await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn a_refresh_token_is_revoked_once() {
        let store = MemoryStore::new();
        let expires = NaiveDate::from_ymd_opt(2026, 3, 9)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        store.store(7, "jti-1", expires).await.unwrap();

        assert_eq!(store.active_owner("jti-1").await.unwrap(), Some(7));
        assert!(store.revoke("jti-1").await.unwrap());
        assert!(!store.revoke("jti-1").await.unwrap());
        assert!(!store.revoke("unknown").await.unwrap());
        assert_eq!(store.active_owner("jti-1").await.unwrap(), None);
    }

    #[actix_web::test]
    async fn one_attendance_record_per_employee_and_day() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let new = || NewAttendance {
            employee_id: 5,
            admin_id: 1,
            employee_name: "Jane".into(),
            date,
            check_in_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            status: crate::model::attendance::AttendanceStatus::Present,
            location: "Office Geo".into(),
        };
        store.insert(new()).await.unwrap();
        assert!(matches!(store.insert(new()).await, Err(RepoError::Duplicate(_))));

        let out = NaiveTime::from_hms_opt(17, 30, 0).unwrap();
        assert!(store.check_out(5, date, out).await.unwrap());
        assert!(!store.check_out(5, date, out).await.unwrap());
    }

    #[actix_web::test]
    async fn renaming_a_user_updates_their_documents() {
        let store = MemoryStore::new();
        let user = UserRepo::create(&store, employee("9000000002", 1)).await.unwrap();
        store
            .insert(NewAttendance {
                employee_id: user.id,
                admin_id: 1,
                employee_name: user.name.clone(),
                date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                check_in_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                status: crate::model::attendance::AttendanceStatus::Present,
                location: "Office Geo".into(),
            })
            .await
            .unwrap();

        let changes = ProfileChanges {
            name: Some("Jane Doe".into()),
            ..Default::default()
        };
        let updated = store.update_profile(user.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.name, "Jane Doe");

        let from = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        let records = AttendanceRepo::list_for_employee(&store, user.id, from, to).await.unwrap();
        assert_eq!(records[0].employee_name, "Jane Doe");
    }
}
