use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const MAX_IMAGE_BYTES: i64 = 5 * 1024 * 1024;
pub const MAX_FILE_BYTES: i64 = 5 * 1024 * 1024 * 1024;

#[derive(Debug, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_size"))]
pub struct PresignRequest{
    #[validate(length(min = 1, max = 200))]
    pub file_name: String,
    #[validate(length(min = 1))]
    pub content_type: String,
    pub size: i64,
    pub is_image: bool,
}

fn validate_size(request: &PresignRequest) -> Result<(), ValidationError> {
    let limit = if request.is_image { MAX_IMAGE_BYTES } else { MAX_FILE_BYTES };
    if request.size < 1 || request.size > limit {
        return Err(ValidationError::new("size"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PresignResponse{
    pub presigned_url: String,
    pub key: String,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct DeleteObject{
    #[validate(length(min = 1))]
    pub key: String,
}
