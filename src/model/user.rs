use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{role::Role, settings::TracingMethod};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "name": "John Doe",
        "phone": "9876543210",
        "email": "john.doe@example.com",
        "role": "employee",
        "admin_id": 1,
        "tracing_method": "Daily Attendance",
        "is_active": true,
        "is_new": false,
        "department": "Engineering",
        "designation": "Senior Developer",
        "profile_picture_url": null,
        "join_date": "2023-01-15",
        "last_login_at": null
    })
)]
pub struct User {
    pub id: u64,
    pub name: String,
    /// national number without country code
    pub phone: String,
    pub email: Option<String>,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub role: Role,
    /// owning admin, for employees
    pub admin_id: Option<u64>,
    pub tracing_method: Option<TracingMethod>,
    pub is_active: bool,
    pub is_new: bool,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub profile_picture_url: Option<String>,
    #[schema(example = "2023-01-15", format = "date", value_type = Option<String>)]
    pub join_date: Option<NaiveDate>,
    #[schema(example = "2026-01-01T09:00:00", format = "date-time", value_type = Option<String>)]
    pub last_login_at: Option<NaiveDateTime>,
}

impl User {
    /// Admin whose rules and collections this user works under.
    pub fn scope_admin_id(&self) -> Option<u64> {
        match self.role {
            Role::Admin => Some(self.id),
            Role::Employee => self.admin_id,
        }
    }
}

pub struct NewUser {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Role,
    pub admin_id: Option<u64>,
    pub tracing_method: Option<TracingMethod>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub join_date: Option<NaiveDate>,
}

/// Fields an account owner may edit after sign-in.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    /// clears the first-login flag
    pub complete_account: bool,
}
