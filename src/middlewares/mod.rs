pub mod admin;
pub mod user;

use actix_web::{dev::ServiceRequest, web};
use uuid::Uuid;

use crate::{errors::ActionError, schema::SessionUser, utils::decode_token, GlobalState};

/// Resolves the bearer token of a request into the calling user.
fn authenticate(req: &ServiceRequest) -> Result<SessionUser, ActionError> {
    let state = req
        .app_data::<web::Data<GlobalState>>()
        .ok_or_else(|| ActionError::Unknown("Internal Server Error".to_string()))?;

    let token = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| ActionError::Unauthorized("Token Not found".to_string()))?
        .to_str()
        .map_err(|_| ActionError::Unauthorized("Invalid token".to_string()))?;

    let claims = decode_token(token, &state.config.jwt_secret)
        .map_err(|_| ActionError::Unauthorized("Invalid token".to_string()))?;

    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ActionError::Unauthorized("Invalid token".to_string()))?;

    Ok(SessionUser { id, email: claims.email, role: claims.role })
}
