use crate::{
    auth::{
        auth::AuthUser,
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        otp::normalize_phone,
        password::{hash_password, verify_password},
    },
    config::Config,
    error::{AppError, AppResult},
    model::{role::Role, user::{NewUser, User}},
    models::{LoginReqDto, LoginResponse, OtpSendReq, OtpVerifyReq, RegisterReq, TokenType},
    service::routing::landing_route,
    state::AppState,
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, error, info, instrument};

const INACTIVE: &str = "Your account is not active. Please contact the admin.";

fn token_error(e: jsonwebtoken::errors::Error) -> AppError {
    error!(error = %e, "Failed to sign token");
    AppError::Internal
}

/// Issues an access/refresh pair, records the refresh token and the login.
async fn start_session(state: &AppState, config: &Config, user: User) -> AppResult<LoginResponse> {
    debug!(user_id = user.id, "Generating tokens");

    let access_token =
        generate_access_token(&user, &config.jwt_secret, config.access_token_ttl).map_err(token_error)?;
    let (refresh_token, refresh_claims) =
        generate_refresh_token(&user, &config.jwt_secret, config.refresh_token_ttl).map_err(token_error)?;

    let expires_at = DateTime::<Utc>::from_timestamp(refresh_claims.exp as i64, 0)
        .map(|t| t.naive_utc())
        .ok_or(AppError::Internal)?;
    state
        .tokens
        .store(user.id, &refresh_claims.jti, expires_at)
        .await?;

    // non-fatal
    if let Err(e) = state.users.record_login(user.id, state.clock.now()).await {
        error!(error = %e, "Failed to update last_login_at");
    }

    Ok(LoginResponse {
        access_token,
        refresh_token,
        redirect: landing_route(Some(&user)).to_string(),
        user,
    })
}

/// Admin self-registration.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Admin account created", body = Object, example = json!({
            "message": "Account created",
            "user_id": 1
        })),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Phone number already registered")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip(payload, state, config))]
pub async fn register(
    payload: web::Json<RegisterReq>,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let name = payload.name.trim();
    let email = payload.email.trim().to_lowercase();
    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(AppError::validation(
            "Missing Fields",
            "Name, email and password are required.",
        ));
    }
    let phone = normalize_phone(&payload.phone, &config.phone_country_code)?;

    // Cuckoo filter: fast negative, storage confirms a maybe
    if state.phones.might_exist(&phone) && state.users.find_by_phone(&phone).await?.is_some() {
        return Err(AppError::Conflict("Phone number already registered".into()));
    }
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        AppError::Internal
    })?;

    let user = state
        .users
        .create(NewUser {
            name: name.to_string(),
            phone: phone.clone(),
            email: Some(email),
            password_hash: Some(password_hash),
            role: Role::Admin,
            admin_id: None,
            tracing_method: None,
            department: None,
            designation: None,
            join_date: Some(state.clock.now().date()),
        })
        .await?;
    state.phones.insert(&phone);

    info!(user_id = user.id, "Admin registered");
    Ok(HttpResponse::Created().json(json!({
        "message": "Account created",
        "user_id": user.id
    })))
}

/// Email and password sign-in.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account not active")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(payload, state, config),
    fields(email = %payload.email)
)]
pub async fn login(
    payload: web::Json<LoginReqDto>,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    info!("Login request received");

    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::validation(
            "Missing Fields",
            "Email and password are required.",
        ));
    }

    let invalid = || AppError::Unauthorized("Invalid credentials".into());

    let user = state.users.find_by_email(&email).await?.ok_or_else(|| {
        info!("Invalid credentials: user not found");
        invalid()
    })?;

    let hashed = user.password_hash.as_deref().ok_or_else(invalid)?;
    if let Err(e) = verify_password(&payload.password, hashed) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(invalid());
    }

    if !user.is_active {
        return Err(AppError::Forbidden(INACTIVE.into()));
    }

    let session = start_session(&state, &config, user).await?;
    info!("Login successful");
    Ok(HttpResponse::Ok().json(session))
}

/// Sends a one-time sign-in code to a registered phone.
#[utoipa::path(
    post,
    path = "/auth/otp/send",
    request_body = OtpSendReq,
    responses(
        (status = 200, description = "Code sent", body = Object, example = json!({
            "message": "OTP sent"
        })),
        (status = 400, description = "Invalid phone number"),
        (status = 403, description = "Account not active"),
        (status = 404, description = "User not found")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_otp_send", skip(payload, state, config))]
pub async fn send_otp(
    payload: web::Json<OtpSendReq>,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let phone = normalize_phone(&payload.phone, &config.phone_country_code)?;

    if !state.phones.might_exist(&phone) {
        debug!("Phone rejected by filter");
        return Err(AppError::NotFound("User not found".into()));
    }
    let user = state
        .users
        .find_by_phone(&phone)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if !user.is_active {
        return Err(AppError::Forbidden(INACTIVE.into()));
    }

    let code = state.otp.issue(&phone).await?;
    let international = format!("{}{}", config.phone_country_code, phone);
    state
        .otp_sender
        .send(&international, &code)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to deliver OTP");
            AppError::Internal
        })?;

    Ok(HttpResponse::Ok().json(json!({ "message": "OTP sent" })))
}

/// Exchanges a valid code for a session.
#[utoipa::path(
    post,
    path = "/auth/otp/verify",
    request_body = OtpVerifyReq,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid or expired code"),
        (status = 404, description = "User not found")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_otp_verify", skip(payload, state, config))]
pub async fn verify_otp(
    payload: web::Json<OtpVerifyReq>,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let phone = normalize_phone(&payload.phone, &config.phone_country_code)?;
    state.otp.verify(&phone, &payload.code).await?;

    let user = state
        .users
        .find_by_phone(&phone)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if !user.is_active {
        return Err(AppError::Forbidden(INACTIVE.into()));
    }

    let session = start_session(&state, &config, user).await?;
    info!("OTP sign-in successful");
    Ok(HttpResponse::Ok().json(session))
}

/// Current user and the page they belong on.
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Signed-in user", body = Object, example = json!({
            "redirect": "/employee",
            "user": {"id": 7, "name": "John Doe"}
        })),
        (status = 401, description = "Not signed in")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn session(auth: AuthUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let user = state.users.find_by_id(auth.user_id).await?;
    let redirect = landing_route(user.as_ref());
    match user {
        Some(user) => Ok(HttpResponse::Ok().json(json!({ "redirect": redirect, "user": user }))),
        None => Err(AppError::Unauthorized("No user".into())),
    }
}

fn refresh_claims(req: &HttpRequest, config: &Config) -> AppResult<crate::models::Claims> {
    let token = AuthUser::bearer(req)?;
    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid token".into()))?;
    if claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthorized("Refresh token required".into()));
    }
    Ok(claims)
}

/// Rotates a refresh token.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = LoginResponse),
        (status = 401, description = "Refresh token invalid or revoked")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let claims = refresh_claims(&req, &config)?;

    // 🔍 find refresh token
    let owner = state
        .tokens
        .active_owner(&claims.jti)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Refresh token revoked".into()))?;

    // 🔥 revoke old refresh token; a concurrent refresh that lost the race gets nothing
    if !state.tokens.revoke(&claims.jti).await? {
        return Err(AppError::Unauthorized("Refresh token revoked".into()));
    }

    let user = state
        .users
        .find_by_id(owner)
        .await?
        .ok_or_else(|| AppError::Unauthorized("No user".into()))?;
    if !user.is_active {
        return Err(AppError::Forbidden(INACTIVE.into()));
    }

    // 🔄 issue new pair
    let session = start_session(&state, &config, user).await?;
    Ok(HttpResponse::Ok().json(session))
}

/// Revokes the presented refresh token; always succeeds.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Signed out")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    state: web::Data<AppState>,
    config: web::Data<Config>,
) -> impl Responder {
    if let Ok(claims) = refresh_claims(&req, &config) {
        // revoke refresh token (idempotent)
        if let Err(e) = state.tokens.revoke(&claims.jti).await {
            error!(error = %e, "Failed to revoke refresh token");
        }
    }

    HttpResponse::NoContent().finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::otp::testing::CapturingSender;
    use crate::test_support::{TestApp, peer};
    use actix_web::{http::StatusCode, test};
    use std::sync::Arc;

    #[actix_web::test]
    async fn otp_sign_in_routes_new_employees_to_onboarding() {
        let sender = Arc::new(CapturingSender::default());
        let ctx = TestApp::new().with_sender(sender.clone());
        let admin = ctx.admin("9000000001").await;
        ctx.employee("9876543210", admin.id).await;
        let app = ctx.init().await;

        let req = peer(test::TestRequest::post().uri("/auth/otp/send"))
            .set_json(json!({ "phone": "+91 98765 43210" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let code = sender.last_code("+919876543210").unwrap();
        let req = peer(test::TestRequest::post().uri("/auth/otp/verify"))
            .set_json(json!({ "phone": "9876543210", "code": code }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["redirect"], "/createaccount/employee-create-account");
        assert!(body["access_token"].as_str().is_some());
    }

    #[actix_web::test]
    async fn unknown_and_inactive_numbers_are_turned_away() {
        let ctx = TestApp::new();
        let admin = ctx.admin("9000000001").await;
        let employee = ctx.employee("9876543210", admin.id).await;
        ctx.state
            .users
            .set_active(admin.id, employee.id, false)
            .await
            .unwrap();
        let app = ctx.init().await;

        let req = peer(test::TestRequest::post().uri("/auth/otp/send"))
            .set_json(json!({ "phone": "9123456789" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = peer(test::TestRequest::post().uri("/auth/otp/send"))
            .set_json(json!({ "phone": "9876543210" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], INACTIVE);
    }

    #[actix_web::test]
    async fn refresh_tokens_rotate_once() {
        let ctx = TestApp::new();
        let app = ctx.init().await;

        let req = peer(test::TestRequest::post().uri("/auth/register"))
            .set_json(json!({
                "name": "Asha",
                "phone": "9000000001",
                "email": "Asha@Example.com",
                "password": "s3cret!"
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = peer(test::TestRequest::post().uri("/auth/login"))
            .set_json(json!({ "email": "asha@example.com", "password": "s3cret!" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["redirect"], "/createaccount/admin-create-account");
        let refresh = body["refresh_token"].as_str().unwrap().to_string();

        let rotate = |token: &str| {
            peer(test::TestRequest::post().uri("/auth/refresh"))
                .insert_header(("Authorization", format!("Bearer {token}")))
                .to_request()
        };
        assert_eq!(test::call_service(&app, rotate(&refresh)).await.status(), StatusCode::OK);
        assert_eq!(
            test::call_service(&app, rotate(&refresh)).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn parallel_refreshes_with_one_token_yield_one_session() {
        let ctx = TestApp::new();
        let admin = ctx.admin("9000000001").await;
        let session = start_session(&ctx.state, &ctx.config, admin).await.unwrap();
        let app = ctx.init().await;

        let rotate = || {
            peer(test::TestRequest::post().uri("/auth/refresh"))
                .insert_header(("Authorization", format!("Bearer {}", session.refresh_token)))
                .to_request()
        };
        let (a, b) = futures::join!(
            test::call_service(&app, rotate()),
            test::call_service(&app, rotate())
        );
        let mut statuses = [a.status(), b.status()];
        statuses.sort();
        assert_eq!(statuses, [StatusCode::OK, StatusCode::UNAUTHORIZED]);
    }
}
