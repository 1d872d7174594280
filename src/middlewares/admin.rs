use actix_web::{body::{EitherBody, MessageBody}, dev::{ServiceRequest, ServiceResponse}, middleware::Next, Error, HttpMessage, ResponseError};

use crate::{errors::ActionError, models::user::Role};

use super::authenticate;

/// Requires a signed-in user carrying the admin role.
pub async fn admin_middleware(
    req:ServiceRequest,
    next: Next<impl MessageBody>
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, Error>{

    let session = match authenticate(&req) {
        Ok(session) => session,
        Err(e) => return Ok(req.into_response(e.error_response()).map_into_right_body()),
    };

    if session.role != Role::Admin {
        tracing::warn!(user = %session.id, path = req.path(), "non-admin on admin route");
        let denied = ActionError::Forbidden("Admin access required".to_string());
        return Ok(req.into_response(denied.error_response()).map_into_right_body());
    }

    req.extensions_mut().insert(session);
    next.call(req).await.map(ServiceResponse::map_into_left_body)
}
