use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::user::{ProfileChanges, User};
use crate::service::routing::landing_route;
use crate::state::AppState;
use crate::storage::image_extension;
use actix_web::{HttpRequest, HttpResponse, http::header, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Deserialize, ToSchema)]
pub struct UpdateProfile {
    #[schema(example = "John Doe")]
    pub name: Option<String>,
    #[schema(example = "john.doe@example.com")]
    pub email: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CompleteAccount {
    #[schema(example = "John Doe")]
    pub name: Option<String>,
    #[schema(example = "john.doe@example.com")]
    pub email: Option<String>,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
    #[schema(example = "Senior Developer")]
    pub designation: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims and lowercases the email and makes sure nobody else holds it.
async fn checked_changes(
    state: &AppState,
    user_id: u64,
    mut changes: ProfileChanges,
) -> AppResult<ProfileChanges> {
    changes.name = trimmed(changes.name);
    changes.email = trimmed(changes.email).map(|e| e.to_lowercase());

    if let Some(email) = &changes.email {
        if !email.contains('@') {
            return Err(AppError::validation(
                "Invalid Email",
                "Enter a valid email address.",
            ));
        }
        let holder = state.users.find_by_email(email).await?;
        if holder.is_some_and(|u| u.id != user_id) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
    }
    Ok(changes)
}

async fn apply(state: &AppState, user_id: u64, changes: &ProfileChanges) -> AppResult<User> {
    state
        .users
        .update_profile(user_id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Signed-in user's profile
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Profile", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Profile"
)]
pub async fn get_profile(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(HttpResponse::Ok().json(user))
}

/// Edit name and email; a new name shows up on past records too
#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 400, description = "Invalid email"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Email already registered")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Profile"
)]
pub async fn update_profile(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<UpdateProfile>,
) -> AppResult<HttpResponse> {
    let payload = payload.into_inner();
    let changes = checked_changes(
        &state,
        auth.user_id,
        ProfileChanges {
            name: payload.name,
            email: payload.email,
            ..Default::default()
        },
    )
    .await?;

    let user = apply(&state, auth.user_id, &changes).await?;
    tracing::info!(user_id = user.id, renamed = changes.name.is_some(), "Profile updated");
    Ok(HttpResponse::Ok().json(user))
}

/// Upload a profile picture as the raw request body
#[utoipa::path(
    put,
    path = "/api/profile/picture",
    request_body(content = Vec<u8>, content_type = "image/png", description = "PNG, JPEG or WebP image"),
    responses(
        (status = 200, description = "Picture stored", body = Object, example = json!({
            "profile_picture_url": "http://localhost:8080/uploads/profile-pictures/7-3f1c.png"
        })),
        (status = 400, description = "Empty, too large or unsupported image"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Profile"
)]
pub async fn upload_picture(
    auth: AuthUser,
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    if body.is_empty() {
        return Err(AppError::validation("No Image", "Choose an image to upload."));
    }
    if body.len() > config.max_upload_bytes {
        return Err(AppError::validation(
            "File Too Large",
            format!("Images must be at most {} KB.", config.max_upload_bytes / 1024),
        ));
    }

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let ext = image_extension(content_type).ok_or_else(|| {
        AppError::validation("Unsupported Image", "Upload a PNG, JPEG or WebP image.")
    })?;

    let key = format!("profile-pictures/{}-{}.{}", auth.user_id, Uuid::new_v4(), ext);
    let url = state.objects.put(&key, body.to_vec()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to store profile picture");
        AppError::Internal
    })?;
    state.users.set_profile_picture(auth.user_id, &url).await?;

    Ok(HttpResponse::Ok().json(json!({ "profile_picture_url": url })))
}

/// First-login account completion
#[utoipa::path(
    post,
    path = "/api/account/complete",
    request_body = CompleteAccount,
    responses(
        (status = 200, description = "Account completed", body = Object, example = json!({
            "redirect": "/employee",
            "user": {"id": 7, "is_new": false}
        })),
        (status = 400, description = "Missing name"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Email already registered")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Profile"
)]
pub async fn complete_account(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<CompleteAccount>,
) -> AppResult<HttpResponse> {
    let payload = payload.into_inner();
    let changes = checked_changes(
        &state,
        auth.user_id,
        ProfileChanges {
            name: payload.name,
            email: payload.email,
            department: trimmed(payload.department),
            designation: trimmed(payload.designation),
            complete_account: true,
        },
    )
    .await?;

    let user = apply(&state, auth.user_id, &changes).await?;
    if user.name.trim().is_empty() {
        return Err(AppError::validation("Missing Fields", "Your name is required."));
    }

    tracing::info!(user_id = user.id, "Account completed");
    Ok(HttpResponse::Ok().json(json!({
        "redirect": landing_route(Some(&user)),
        "user": user
    })))
}

#[cfg(test)]
mod tests {
    use crate::model::attendance::{AttendanceStatus, NewAttendance};
    use crate::test_support::{TestApp, bearer};
    use actix_web::{http::StatusCode, test};
    use chrono::{NaiveDate, NaiveTime};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn rename_reaches_past_records_and_completion_clears_is_new() {
        let ctx = TestApp::new();
        let admin = ctx.admin("9000000001").await;
        let employee = ctx.employee("9876543210", admin.id).await;
        ctx.state
            .attendance
            .insert(NewAttendance {
                employee_id: employee.id,
                admin_id: admin.id,
                employee_name: employee.name.clone(),
                date: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
                check_in_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                status: AttendanceStatus::Present,
                location: "Office".into(),
            })
            .await
            .unwrap();
        let token = ctx.token(&employee);
        let app = ctx.init().await;

        let req = bearer(test::TestRequest::put().uri("/api/profile"), &token)
            .set_json(json!({ "name": "  Johnny Doe ", "email": "Johnny@Example.com" }))
            .to_request();
        let user: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(user["name"], "Johnny Doe");
        assert_eq!(user["email"], "johnny@example.com");
        assert_eq!(user["is_new"], true);

        let req = bearer(test::TestRequest::get().uri("/api/attendance/history"), &token).to_request();
        let history: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(history[0]["employee_name"], "Johnny Doe");

        let req = bearer(test::TestRequest::post().uri("/api/account/complete"), &token)
            .set_json(json!({ "designation": "Developer" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["redirect"], "/employee");
        assert_eq!(body["user"]["is_new"], false);
    }

    #[actix_web::test]
    async fn email_taken_by_someone_else_is_refused() {
        let ctx = TestApp::new();
        let admin = ctx.admin("9000000001").await;
        let employee = ctx.employee("9876543210", admin.id).await;
        let token = ctx.token(&employee);
        let app = ctx.init().await;

        let req = bearer(test::TestRequest::put().uri("/api/profile"), &token)
            .set_json(json!({ "email": "9000000001@example.com" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn pictures_are_checked_then_stored() {
        let ctx = TestApp::new();
        let admin = ctx.admin("9000000001").await;
        let token = ctx.token(&admin);
        let app = ctx.init().await;

        let req = bearer(test::TestRequest::put().uri("/api/profile/picture"), &token)
            .insert_header(("Content-Type", "image/gif"))
            .set_payload(vec![1u8; 16])
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["message"], "Unsupported Image");

        let req = bearer(test::TestRequest::put().uri("/api/profile/picture"), &token)
            .insert_header(("Content-Type", "image/png"))
            .set_payload(vec![1u8; 2048])
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["message"], "File Too Large");

        let req = bearer(test::TestRequest::put().uri("/api/profile/picture"), &token)
            .insert_header(("Content-Type", "image/png"))
            .set_payload(vec![1u8; 64])
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let url = body["profile_picture_url"].as_str().unwrap();
        assert!(url.starts_with(&format!("http://localhost:8080/uploads/profile-pictures/{}-", admin.id)));
        assert!(url.ends_with(".png"));

        let req = bearer(test::TestRequest::get().uri("/api/profile"), &token).to_request();
        let profile: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(profile["profile_picture_url"], url);
    }
}
