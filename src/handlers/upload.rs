use actix_web::{delete, post, web::{self, Json}, HttpResponse};
use validator::Validate;

use crate::{
    errors::ActionError,
    schema::{upload::{DeleteObject, PresignRequest, PresignResponse}, ApiResponse},
    GlobalState,
};

#[post("/uploads")]
async fn presign_upload_handler(data:web::Data<GlobalState>, upload:Json<PresignRequest>) -> Result<HttpResponse, ActionError>{

    upload.validate()?;

    let (presigned_url, key) = data.storage
        .presign_upload(&upload.file_name, &upload.content_type, upload.size)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "presign failed");
            ActionError::ExternalService("Failed to generate upload URL".to_string())
        })?;

    Ok(HttpResponse::Ok().json(PresignResponse{presigned_url, key}))
}

#[delete("/uploads")]
async fn delete_object_handler(data:web::Data<GlobalState>, object:Json<DeleteObject>) -> Result<HttpResponse, ActionError>{

    object.validate()?;

    data.storage.delete(&object.key).await.map_err(|e| {
        tracing::error!(error = %e, key = %object.key, "object delete failed");
        ActionError::ExternalService("Failed to delete file".to_string())
    })?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("File deleted successfully")))
}
