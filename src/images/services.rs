use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use axum::extract::Multipart;
use bytes::Bytes;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, FieldError, StoreError};
use crate::storage::StorageClient;

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const IMAGE_FIELD: &str = "image";
const PRESIGN_TTL: Duration = Duration::from_secs(10 * 60);

/// An image pulled out of a multipart request.
#[derive(Debug)]
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

fn invalid_image(message: &str) -> ApiError {
    ApiError::Validation(vec![FieldError::new(IMAGE_FIELD, message)])
}

/// Reads the `image` field, ignoring any other fields.
pub async fn read_image_field(mut mp: Multipart) -> Result<UploadItem, ApiError> {
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let content_type = field
            .content_type()
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
        if ext_from_mime(&content_type).is_none() {
            return Err(invalid_image("image must be jpeg, png, webp or gif"));
        }
        let body = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        if body.is_empty() {
            return Err(invalid_image("image is empty"));
        }
        if body.len() > MAX_IMAGE_BYTES {
            return Err(invalid_image("image must be at most 10 MiB"));
        }
        return Ok(UploadItem { body, content_type });
    }
    Err(invalid_image("image is required"))
}

/// Uploads under `{collection}/{entity_id}/{uuid}.{ext}` and returns the key.
pub async fn store_image(
    storage: &dyn StorageClient,
    collection: &str,
    entity_id: Uuid,
    item: UploadItem,
) -> anyhow::Result<String> {
    let ext = ext_from_mime(&item.content_type).unwrap_or("bin");
    let key = format!("{}/{}/{}.{}", collection, entity_id, Uuid::new_v4(), ext);
    storage
        .put_object(&key, item.body, &item.content_type)
        .await
        .with_context(|| format!("upload image for {collection}/{entity_id}"))?;
    debug!(%key, "image stored");
    Ok(key)
}

/// Stores `item` and points the entity at it through `set_image`, which gets
/// the new key and content type and returns the updated entity with its
/// previous key. The object left unreferenced afterwards is discarded: the
/// previous one on success, the new one when the entity is gone or the store
/// fails. `Ok(None)` means the entity does not exist.
pub async fn replace_image<T, F, Fut>(
    storage: &dyn StorageClient,
    collection: &str,
    entity_id: Uuid,
    item: UploadItem,
    set_image: F,
) -> Result<Option<T>, ApiError>
where
    F: FnOnce(String, String) -> Fut,
    Fut: Future<Output = Result<Option<(T, Option<String>)>, StoreError>>,
{
    let content_type = item.content_type.clone();
    let key = store_image(storage, collection, entity_id, item).await?;

    match set_image(key.clone(), content_type).await {
        Ok(Some((entity, previous))) => {
            if let Some(old) = previous.as_deref() {
                discard_image(storage, old).await;
            }
            info!(%collection, %entity_id, "image replaced");
            Ok(Some(entity))
        }
        Ok(None) => {
            discard_image(storage, &key).await;
            Ok(None)
        }
        Err(e) => {
            error!(error = %e, %collection, %entity_id, "set_image failed");
            discard_image(storage, &key).await;
            Err(e.into())
        }
    }
}

/// Deletes an object that is no longer referenced. Failures only leave an
/// orphan behind, so they are logged and swallowed.
pub async fn discard_image(storage: &dyn StorageClient, key: &str) {
    if let Err(e) = storage.delete_object(key).await {
        warn!(error = %e, %key, "failed to delete orphaned image");
    }
}

pub async fn presign_image(storage: &dyn StorageClient, key: &str) -> anyhow::Result<String> {
    storage
        .presign_get(key, PRESIGN_TTL)
        .await
        .with_context(|| format!("presign url for {key}"))
}
