use crate::auth::auth::AuthUser;
use crate::auth::otp::normalize_phone;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::role::Role;
use crate::model::user::{NewUser, User};
use crate::state::AppState;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "9876543210")]
    pub phone: String,
    #[schema(example = "john.doe@example.com")]
    pub email: Option<String>,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
    #[schema(example = "Senior Developer")]
    pub designation: Option<String>,
    #[schema(example = "2023-01-15", format = "date", value_type = Option<String>)]
    pub join_date: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct EmployeeStatus {
    pub is_active: bool,
}

/// Employees under the signed-in admin
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "Employees", body = Vec<User>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employee"
)]
pub async fn list_employees(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let admin_id = auth.require_admin()?;
    let mut employees = state.users.list_employees(admin_id).await?;
    employees.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(HttpResponse::Ok().json(employees))
}

/// Add an employee; they sign in by OTP and complete their account
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = User),
        (status = 400, description = "Missing name or invalid phone"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Phone number already registered")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    auth: AuthUser,
    state: web::Data<AppState>,
    config: web::Data<Config>,
    payload: web::Json<CreateEmployee>,
) -> AppResult<HttpResponse> {
    let admin_id = auth.require_admin()?;
    let payload = payload.into_inner();

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Missing Fields", "Employee name is required."));
    }
    let phone = normalize_phone(&payload.phone, &config.phone_country_code)?;

    if state.phones.might_exist(&phone) && state.users.find_by_phone(&phone).await?.is_some() {
        return Err(AppError::Conflict("Phone number already registered".into()));
    }

    let email = payload
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    if let Some(email) = &email {
        if state.users.find_by_email(email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".into()));
        }
    }

    let employee = state
        .users
        .create(NewUser {
            name: name.to_string(),
            phone: phone.clone(),
            email,
            password_hash: None,
            role: Role::Employee,
            admin_id: Some(admin_id),
            tracing_method: None,
            department: payload.department.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            designation: payload.designation.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            join_date: payload.join_date.or_else(|| Some(state.clock.now().date())),
        })
        .await?;
    state.phones.insert(&phone);

    tracing::info!(admin_id, employee_id = employee.id, "Employee created");
    Ok(HttpResponse::Created().json(employee))
}

/// Activate or deactivate an employee
#[utoipa::path(
    put,
    path = "/api/employees/{id}/status",
    params(
        ("id" = u64, Path, description = "Employee ID")
    ),
    request_body = EmployeeStatus,
    responses(
        (status = 200, description = "Status updated", body = Object, example = json!({
            "id": 7,
            "is_active": false
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Employee"
)]
pub async fn set_status(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
    payload: web::Json<EmployeeStatus>,
) -> AppResult<HttpResponse> {
    let admin_id = auth.require_admin()?;
    let id = path.into_inner();

    if !state.users.set_active(admin_id, id, payload.is_active).await? {
        return Err(AppError::NotFound("Employee not found".into()));
    }

    tracing::info!(admin_id, employee_id = id, active = payload.is_active, "Employee status changed");
    Ok(HttpResponse::Ok().json(json!({ "id": id, "is_active": payload.is_active })))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{TestApp, bearer, peer};
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn admins_add_and_deactivate_their_employees() {
        let ctx = TestApp::new();
        let admin = ctx.admin("9000000001").await;
        let token = ctx.token(&admin);
        let app = ctx.init().await;

        let add = |phone: &str| {
            bearer(test::TestRequest::post().uri("/api/employees"), &token)
                .set_json(json!({ "name": "Ravi Kumar", "phone": phone, "department": "Sales" }))
                .to_request()
        };
        let resp = test::call_service(&app, add("+91 98765-43210")).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let employee: Value = test::read_body_json(resp).await;
        assert_eq!(employee["phone"], "9876543210");
        assert_eq!(employee["is_new"], true);
        assert_eq!(employee["admin_id"], admin.id);

        let resp = test::call_service(&app, add("9876543210")).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = bearer(
            test::TestRequest::put().uri(&format!("/api/employees/{}/status", employee["id"])),
            &token,
        )
        .set_json(json!({ "is_active": false }))
        .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = peer(test::TestRequest::post().uri("/auth/otp/send"))
            .set_json(json!({ "phone": "9876543210" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = bearer(test::TestRequest::get().uri("/api/employees"), &token).to_request();
        let listed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed[0]["is_active"], false);
    }

    #[actix_web::test]
    async fn status_of_another_admins_employee_is_not_found() {
        let ctx = TestApp::new();
        let admin = ctx.admin("9000000001").await;
        let other = ctx.admin("9000000002").await;
        let employee = ctx.employee("9876543210", other.id).await;
        let token = ctx.token(&admin);
        let app = ctx.init().await;

        let req = bearer(
            test::TestRequest::put().uri(&format!("/api/employees/{}/status", employee.id)),
            &token,
        )
        .set_json(json!({ "is_active": false }))
        .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
