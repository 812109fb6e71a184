use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_access_token;
use crate::config::Config;
use crate::model::role::Role;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::AUTHORIZATION,
    web::Data,
};
use serde_json::json;
use tracing::debug;

/// Pulls the token out of an `Authorization: Bearer <token>` value.
fn bearer_token(header: Option<&str>) -> Result<&str, &'static str> {
    let value = header.ok_or("Missing Authorization header")?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or("Authorization header must start with Bearer")
}

fn unauthorized(req: ServiceRequest, message: &str, details: Option<String>) -> ServiceResponse<BoxBody> {
    debug!(path = req.path(), reason = message, "Request rejected");
    let body = match details {
        Some(details) => json!({ "message": message, "details": details }),
        None => json!({ "message": message }),
    };
    req.into_response(HttpResponse::Unauthorized().json(body).map_into_boxed_body())
}

/// Verifies the bearer token and stores the caller's `AuthUser` in the
/// request extensions for the `AuthUser` extractor.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let header = req
        .headers()
        .get(AUTHORIZATION)
        .map(|h| h.to_str().map(str::to_string));
    let header = match header {
        Some(Err(_)) => {
            return Ok(unauthorized(req, "Invalid Authorization header encoding", None));
        }
        Some(Ok(value)) => Some(value),
        None => None,
    };

    let token = match bearer_token(header.as_deref()) {
        Ok(token) => token,
        Err(message) => return Ok(unauthorized(req, message, None)),
    };

    let claims = match verify_access_token(token, &config.jwt_secret) {
        Ok(claims) => claims,
        Err(e) => return Ok(unauthorized(req, "Invalid or expired token", Some(e))),
    };

    let Some(role) = Role::from_id(claims.role) else {
        return Ok(unauthorized(req, "Invalid role", None));
    };

    let auth_user = AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
        employee_id: claims.employee_id,
    };

    debug!(user_id = auth_user.user_id, username = %auth_user.username, role = ?auth_user.role, "Authenticated");
    req.extensions_mut().insert(auth_user);

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(Some("Bearer abc.def")), Ok("abc.def"));
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        assert_eq!(bearer_token(None), Err("Missing Authorization header"));
        assert!(bearer_token(Some("Basic dXNlcg==")).is_err());
        assert!(bearer_token(Some("Bearer   ")).is_err());
    }
}
