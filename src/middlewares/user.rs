use actix_web::{body::{EitherBody, MessageBody}, dev::{ServiceRequest, ServiceResponse}, middleware::Next, Error, HttpMessage, ResponseError};

use super::authenticate;

/// Requires any signed-in user.
pub async fn user_middleware(
    req:ServiceRequest,
    next: Next<impl MessageBody>) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, Error>
{
    let session = match authenticate(&req) {
        Ok(session) => session,
        Err(e) => return Ok(req.into_response(e.error_response()).map_into_right_body()),
    };

    // handlers read the caller back from the extensions
    req.extensions_mut().insert(session);
    next.call(req).await.map(ServiceResponse::map_into_left_body)
}
