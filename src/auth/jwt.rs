use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

use crate::{
    model::user::User,
    models::{Claims, TokenType},
};

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

fn claims_for(user: &User, token_type: TokenType, ttl: usize) -> Claims {
    Claims {
        user_id: user.id,
        sub: user.phone.clone(),
        role: user.role.id(),
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
        admin_id: user.scope_admin_id(),
    }
}

fn sign(claims: &Claims, secret: &str) -> Result<String, Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn generate_access_token(user: &User, secret: &str, ttl: usize) -> Result<String, Error> {
    sign(&claims_for(user, TokenType::Access, ttl), secret)
}

pub fn generate_refresh_token(
    user: &User,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    let claims = claims_for(user, TokenType::Refresh, ttl);
    let token = sign(&claims, secret)?;
    Ok((token, claims))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn employee() -> User {
        User {
            id: 7,
            name: "John".into(),
            phone: "9876543210".into(),
            email: None,
            password_hash: None,
            role: Role::Employee,
            admin_id: Some(1),
            tracing_method: None,
            is_active: true,
            is_new: false,
            department: None,
            designation: None,
            profile_picture_url: None,
            join_date: None,
            last_login_at: None,
        }
    }

    #[test]
    fn tokens_carry_scope_and_type() {
        let access = generate_access_token(&employee(), "k", 60).unwrap();
        let claims = verify_token(&access, "k").unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.admin_id, Some(1));
        assert_eq!(claims.token_type, TokenType::Access);

        let (refresh, issued) = generate_refresh_token(&employee(), "k", 60).unwrap();
        assert_eq!(verify_token(&refresh, "k").unwrap().jti, issued.jti);
        assert!(verify_token(&refresh, "other").is_err());
    }
}
