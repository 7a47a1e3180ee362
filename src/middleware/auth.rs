use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    error::AppError,
    roles::{Role, RoleSet},
};

/// Request context populated once at the boundary from the bearer token.
/// Every operation receives it explicitly; nothing reads ambient session
/// state.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub roles: RoleSet,
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if !user.roles.contains(role) {
        return Err(AppError::AuthorizationDenied(format!(
            "Requires the {role} role"
        )));
    }
    Ok(())
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::AuthenticationRequired)?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::AuthenticationRequired)?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::AuthenticationRequired);
        }
        let token = auth_str.trim_start_matches("Bearer ").trim();

        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::AuthenticationRequired)?;

        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::AuthenticationRequired)?;

        let roles = RoleSet::parse(&decoded.claims.role)
            .map_err(|_| AppError::AuthenticationRequired)?;

        Ok(AuthUser { user_id, roles })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_role_checks_set_membership() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            roles: RoleSet::parse("buyer,seller").unwrap(),
        };
        assert!(ensure_role(&user, Role::Buyer).is_ok());
        assert!(ensure_role(&user, Role::Seller).is_ok());
        assert!(matches!(
            ensure_role(&user, Role::Admin),
            Err(AppError::AuthorizationDenied(_))
        ));
    }
}
