use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Role;

pub mod user;
pub mod course;
pub mod upload;

#[derive(Deserialize, Serialize, Debug)]
pub struct JWTClaims{
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

/// The authenticated caller, placed in request extensions by the auth middlewares.
#[derive(Debug, Clone)]
pub struct SessionUser{
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status{
    #[display("success")]
    Success,
    #[display("error")]
    Error,
}

/// Uniform result of every mutating endpoint.
#[derive(Debug, Display, Serialize, Deserialize)]
#[display("{status}: {message}")]
pub struct ApiResponse{
    pub status: Status,
    pub message: String,
}

impl ApiResponse {
    pub fn success(message: impl Into<String>) -> Self {
        ApiResponse { status: Status::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ApiResponse { status: Status::Error, message: message.into() }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SignupResponse{
    pub message: String,
    pub id: Uuid,
}

#[derive(Serialize, Deserialize)]
pub struct SigninResponse{
    pub message: String,
    pub token: String,
}
