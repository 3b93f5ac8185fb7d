use crate::{
    errors::AppError,
    models::{Claims, Role},
    state::AppState,
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Authenticated HRMS user extractor.
/// Add `auth: AuthUser` as a parameter in any handler that requires authentication.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    /// Payroll is reserved for HR managers.
    pub fn require_payroll_access(&self) -> Result<(), AppError> {
        match self.role {
            Role::HrManager => Ok(()),
            _ => Err(AppError::Forbidden(format!(
                "User '{}' is not allowed to manage payroll",
                self.username
            ))),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let headers: &HeaderMap = &parts.headers;

        let auth_header = headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization format".to_string()))?;

        let secret = state.config.jwt_secret.as_bytes();
        let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &Validation::default())
            .map_err(|_| AppError::InvalidToken)?;

        let user_id = token_data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::InvalidToken)?;

        Ok(AuthUser {
            user_id,
            username: token_data.claims.username,
            role: token_data.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "jane".to_string(),
            role,
        }
    }

    #[test]
    fn only_hr_managers_reach_payroll() {
        assert!(user(Role::HrManager).require_payroll_access().is_ok());
        for role in [Role::Admin, Role::Owner, Role::HrAssistant, Role::Manager, Role::Other] {
            assert!(matches!(
                user(role).require_payroll_access(),
                Err(AppError::Forbidden(_))
            ));
        }
    }
}
