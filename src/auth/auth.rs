use crate::{
    auth::jwt::verify_token,
    config::Config,
    error::{AppError, AppResult},
    model::role::Role,
    models::{Claims, TokenType},
};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

/// Signed-in caller, resolved once per request by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub phone: String,
    pub role: Role,

    /// Admin whose team this user works in (own id for admins)
    pub admin_id: Option<u64>,
}

impl AuthUser {
    pub fn from_claims(claims: Claims) -> AppResult<Self> {
        if claims.token_type != TokenType::Access {
            return Err(AppError::Unauthorized("Access token required".into()));
        }
        let role = Role::from_id(claims.role)
            .ok_or_else(|| AppError::Unauthorized("Invalid role".into()))?;
        Ok(AuthUser {
            user_id: claims.user_id,
            phone: claims.sub,
            role,
            admin_id: claims.admin_id,
        })
    }

    pub fn bearer(req: &HttpRequest) -> AppResult<&str> {
        req.headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("Missing token".into()))
    }

    fn resolve(req: &HttpRequest) -> AppResult<Self> {
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return Ok(user.clone());
        }

        let token = Self::bearer(req)?;
        let config = req.app_data::<Data<Config>>().ok_or_else(|| {
            tracing::error!("Config missing from app data");
            AppError::Internal
        })?;
        let claims = verify_token(token, &config.jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid token".into()))?;
        Self::from_claims(claims)
    }

    /// Returns the admin's own id.
    pub fn require_admin(&self) -> AppResult<u64> {
        if self.role == Role::Admin {
            Ok(self.user_id)
        } else {
            Err(AppError::Forbidden("Admin only".into()))
        }
    }

    /// Returns the id of the employee's admin.
    pub fn require_employee(&self) -> AppResult<u64> {
        match (self.role, self.admin_id) {
            (Role::Employee, Some(admin_id)) => Ok(admin_id),
            (Role::Employee, None) => Err(AppError::Forbidden("Employee is not assigned to an admin".into())),
            _ => Err(AppError::Forbidden("Employees only".into())),
        }
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Self::resolve(req))
    }
}
