use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::user::User;

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "Asha Verma")]
    pub name: String,
    #[schema(example = "+91 98765 43210")]
    pub phone: String,
    #[schema(example = "asha@example.com")]
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "asha@example.com")]
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct OtpSendReq {
    #[schema(example = "9876543210")]
    pub phone: String,
}

#[derive(Deserialize, ToSchema)]
pub struct OtpVerifyReq {
    #[schema(example = "9876543210")]
    pub phone: String,
    #[schema(example = "123456")]
    pub code: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// page the client should open next
    #[schema(example = "/employee")]
    pub redirect: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// phone number
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Admin whose team the user works in (their own id for admins)
    pub admin_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
