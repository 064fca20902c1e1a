use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    http::{HeaderValue, header},
    response::IntoResponse,
};
use tokio_util::io::ReaderStream;

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::dto::{
    BrowseResponse, CreateFolderRequest, DeleteItemRequest, FolderParams, RenameRequest,
    UploadResponse, required,
};
use crate::server::response::{ApiError, ApiResponse, message};
use crate::storage::{UploadSession, validate_file_name};
use crate::types::Permissions;

fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::bad_request(e.body_text())
}

pub async fn create_folder(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<CreateFolderRequest>,
) -> impl IntoResponse {
    auth.require(Permissions::STORAGE_WRITE)?;

    let folder =
        required(req.folder_path).ok_or_else(|| ApiError::bad_request("Folder path is required"))?;
    state
        .objects
        .create_folder(&auth.identity, &name, &folder)
        .await?;

    Ok::<_, ApiError>(message("Folder created"))
}

pub async fn browse(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<FolderParams>,
) -> impl IntoResponse {
    auth.require(Permissions::STORAGE_READ)?;

    let folder = params.folder.unwrap_or_default();
    let items = state.objects.browse(&auth.identity, &name, &folder).await?;

    Ok::<_, ApiError>(Json(ApiResponse::success(BrowseResponse { items })))
}

/// Accepts a multipart body with a `file` part and an optional `folder`
/// part, in either order. The file is streamed to a temp file and only
/// moved into the bucket once the whole body has been read. A `Content-Length`
/// header on the file part is taken as its declared size.
pub async fn upload(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(bucket): Path<String>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    auth.require(Permissions::STORAGE_WRITE)?;

    let mut folder = String::new();
    let mut pending: Option<(UploadSession, String)> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("folder") => {
                folder = field.text().await.map_err(multipart_error)?;
            }
            Some("file") => {
                if pending.is_some() {
                    return Err(ApiError::bad_request("Only one file per upload"));
                }

                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::bad_request("File name is required"))?;
                validate_file_name(&filename)?;

                let declared_size = field
                    .headers()
                    .get(header::CONTENT_LENGTH)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok());
                let mut session = state
                    .objects
                    .begin_upload(&auth.identity, &bucket, declared_size)
                    .await?;
                while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                    session.write_chunk(&chunk).await?;
                }

                pending = Some((session, filename));
            }
            _ => {}
        }
    }

    let (session, filename) = pending.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    let size = session.finish(&folder, &filename).await?;

    Ok::<_, ApiError>(Json(ApiResponse::success(UploadResponse { filename, size })))
}

pub async fn download(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path((bucket, filename)): Path<(String, String)>,
    Query(params): Query<FolderParams>,
) -> impl IntoResponse {
    auth.require(Permissions::STORAGE_READ)?;

    validate_file_name(&filename)?;
    let folder = params.folder.unwrap_or_default();
    let path = format!("{}/{filename}", folder.trim_end_matches('/'));

    let (reader, size) = state
        .objects
        .download(&auth.identity, &bucket, &path)
        .await?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename*=UTF-8''{}",
        urlencoding::encode(&filename)
    ))
    .map_err(|e| ApiError::internal(format!("Invalid Content-Disposition: {e}")))?;

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        ),
        (header::CONTENT_LENGTH, HeaderValue::from(size)),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    let body = Body::from_stream(ReaderStream::new(reader));

    Ok::<_, ApiError>((headers, body))
}

pub async fn delete_item(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<DeleteItemRequest>,
) -> impl IntoResponse {
    auth.require(Permissions::STORAGE_WRITE)?;

    let path = required(req.path).ok_or_else(|| ApiError::bad_request("Path is required"))?;
    state.objects.delete_item(&auth.identity, &name, &path).await?;

    Ok::<_, ApiError>(message("Item deleted"))
}

pub async fn rename_item(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<RenameRequest>,
) -> impl IntoResponse {
    auth.require(Permissions::STORAGE_WRITE)?;

    let (Some(old_path), Some(new_path)) = (required(req.old_path), required(req.new_path)) else {
        return Err(ApiError::bad_request("Both old and new paths are required"));
    };
    state
        .objects
        .rename(&auth.identity, &name, &old_path, &new_path)
        .await?;

    Ok::<_, ApiError>(message("Item renamed"))
}
