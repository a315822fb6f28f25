use crate::model::{role::Role, user::User};

pub const LOGIN: &str = "/login";
pub const ADMIN_HOME: &str = "/admin";
pub const EMPLOYEE_HOME: &str = "/employee";
pub const ADMIN_ONBOARDING: &str = "/createaccount/admin-create-account";
pub const EMPLOYEE_ONBOARDING: &str = "/createaccount/employee-create-account";

/// Page a client should open after sign-in.
pub fn landing_route(user: Option<&User>) -> &'static str {
    match user {
        None => LOGIN,
        Some(u) => match (u.role, u.is_new) {
            (Role::Admin, true) => ADMIN_ONBOARDING,
            (Role::Admin, false) => ADMIN_HOME,
            (Role::Employee, true) => EMPLOYEE_ONBOARDING,
            (Role::Employee, false) => EMPLOYEE_HOME,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, is_new: bool) -> User {
        User {
            id: 1,
            name: "Asha".into(),
            phone: "9876543210".into(),
            email: None,
            password_hash: None,
            role,
            admin_id: None,
            tracing_method: None,
            is_active: true,
            is_new,
            department: None,
            designation: None,
            profile_picture_url: None,
            join_date: None,
            last_login_at: None,
        }
    }

    #[test]
    fn routes_by_role_and_first_login() {
        assert_eq!(landing_route(None), "/login");
        assert_eq!(landing_route(Some(&user(Role::Admin, true))), ADMIN_ONBOARDING);
        assert_eq!(landing_route(Some(&user(Role::Admin, false))), "/admin");
        assert_eq!(landing_route(Some(&user(Role::Employee, true))), EMPLOYEE_ONBOARDING);
        assert_eq!(landing_route(Some(&user(Role::Employee, false))), "/employee");
    }
}
