//! Multipart file intake. Files are written under the configured upload
//! directory and their public paths appended to the owning record.

use std::path::{Path, PathBuf};

use axum::{body::Bytes, extract::Multipart};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::uploads::{UploadList, UploadedFile},
    entity::{
        custom_requests::Entity as CustomRequests,
        orders::Entity as Orders,
        products::Entity as Products,
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    policy::{Action, ensure_allowed, ensure_owner_or_admin},
    response::ApiResponse,
    state::AppState,
};

/// URL prefix the upload directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];
const DESIGN_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "gif", "pdf", "ai", "eps", "svg", "psd", "zip",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    Avatar,
    Product,
    Order,
    CustomDesign,
}

impl UploadTarget {
    pub fn folder(self) -> &'static str {
        match self {
            UploadTarget::Avatar => "avatars",
            UploadTarget::Product => "products",
            UploadTarget::Order => "orders",
            UploadTarget::CustomDesign => "custom-designs",
        }
    }

    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            UploadTarget::Avatar | UploadTarget::Product => IMAGE_EXTENSIONS,
            UploadTarget::Order | UploadTarget::CustomDesign => DESIGN_EXTENSIONS,
        }
    }

    fn max_files(self) -> usize {
        match self {
            UploadTarget::Avatar => 1,
            UploadTarget::Product => 10,
            UploadTarget::Order | UploadTarget::CustomDesign => 5,
        }
    }
}

/// Lowercased extension of `file_name` if the target accepts it.
pub fn checked_extension(target: UploadTarget, file_name: &str) -> AppResult<String> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if target.allowed_extensions().contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(AppError::BadRequest(format!(
            "File type not allowed for {}; accepted: {}",
            target.folder(),
            target.allowed_extensions().join(", ")
        )))
    }
}

/// `{field}-{timestamp_ms}-{random}.{ext}`; the field name is reduced to a
/// filesystem-safe slug.
pub fn stored_file_name(field: &str, timestamp_ms: i64, random: &str, ext: &str) -> String {
    let slug: String = field
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    let slug = if slug.is_empty() { "file" } else { slug.as_str() };
    format!("{slug}-{timestamp_ms}-{random}.{ext}")
}

/// A validated file still held in memory.
struct PendingFile {
    field: String,
    original_name: String,
    ext: String,
    bytes: Bytes,
}

/// Files written to disk for one request; removed again if the owning record
/// cannot be updated.
struct StoredBatch {
    written: Vec<PathBuf>,
    files: Vec<UploadedFile>,
}

impl StoredBatch {
    fn paths(&self) -> Vec<String> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    async fn discard(self) {
        for path in self.written {
            if let Err(err) = tokio::fs::remove_file(&path).await {
                tracing::warn!(error = %err, file = %path.display(), "failed to remove upload");
            }
        }
    }

    /// Keeps the files if `record` succeeds, deletes them otherwise.
    async fn commit(
        self,
        record: impl Future<Output = AppResult<()>>,
    ) -> AppResult<Vec<UploadedFile>> {
        match record.await {
            Ok(()) => Ok(self.files),
            Err(err) => {
                self.discard().await;
                Err(err)
            }
        }
    }
}

/// Reads and checks every part before anything touches the disk.
async fn collect_files(
    state: &AppState,
    target: UploadTarget,
    mut multipart: Multipart,
) -> AppResult<Vec<PendingFile>> {
    let mut pending = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if pending.len() >= target.max_files() {
            return Err(AppError::BadRequest(format!(
                "At most {} file(s) per upload",
                target.max_files()
            )));
        }
        let field_name = field.name().unwrap_or("file").to_string();
        let ext = checked_extension(target, &original_name)?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".into()));
        }
        if bytes.len() > state.config.max_upload_bytes {
            return Err(AppError::BadRequest(format!(
                "File exceeds the {} byte limit",
                state.config.max_upload_bytes
            )));
        }

        pending.push(PendingFile {
            field: field_name,
            original_name,
            ext,
            bytes,
        });
    }

    if pending.is_empty() {
        return Err(AppError::BadRequest("No file provided".into()));
    }
    Ok(pending)
}

async fn write_batch(
    dir: &Path,
    target: UploadTarget,
    pending: Vec<PendingFile>,
) -> AppResult<StoredBatch> {
    let mut batch = StoredBatch {
        written: Vec::with_capacity(pending.len()),
        files: Vec::with_capacity(pending.len()),
    };
    for file in pending {
        let random = Uuid::new_v4().simple().to_string();
        let file_name = stored_file_name(
            &file.field,
            Utc::now().timestamp_millis(),
            &random[..12],
            &file.ext,
        );
        let path = dir.join(&file_name);
        if let Err(err) = tokio::fs::write(&path, &file.bytes).await {
            batch.discard().await;
            return Err(AppError::Internal(err.into()));
        }
        tracing::debug!(file = %file_name, size = file.bytes.len(), "upload stored");

        batch.written.push(path);
        batch.files.push(UploadedFile {
            field: file.field,
            original_name: Some(file.original_name),
            path: format!("{PUBLIC_PREFIX}/{}/{file_name}", target.folder()),
            size: file.bytes.len(),
        });
    }
    Ok(batch)
}

async fn save_files(
    state: &AppState,
    target: UploadTarget,
    multipart: Multipart,
) -> AppResult<StoredBatch> {
    let pending = collect_files(state, target, multipart).await?;
    let dir = PathBuf::from(&state.config.upload_dir).join(target.folder());
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    write_batch(&dir, target, pending).await
}

/// Append paths to a JSONB array column in one statement.
async fn append_paths(
    state: &AppState,
    table: &str,
    column: &str,
    id: Uuid,
    paths: &[String],
) -> AppResult<()> {
    let value = serde_json::to_value(paths).map_err(|e| AppError::Internal(e.into()))?;
    let sql = format!(
        "UPDATE {table} SET {column} = {column} || $1::jsonb, updated_at = NOW() WHERE id = $2"
    );
    let result = sqlx::query(&sql)
        .bind(value)
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

async fn finish(
    state: &AppState,
    user: &AuthUser,
    target: UploadTarget,
    id: Uuid,
    files: Vec<UploadedFile>,
) -> ApiResponse<UploadList> {
    audit::record(
        &state.pool,
        user.user_id,
        "file_upload",
        target.folder(),
        serde_json::json!({ "id": id, "files": files.len() }),
    )
    .await;
    ApiResponse::item("Uploaded", UploadList { items: files })
}

pub async fn upload_avatar(
    state: &AppState,
    user: &AuthUser,
    multipart: Multipart,
) -> AppResult<ApiResponse<UploadList>> {
    ensure_allowed(user, Action::UploadFiles)?;
    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let batch = save_files(state, UploadTarget::Avatar, multipart).await?;
    let mut active: UserActive = existing.into();
    active.avatar_url = Set(batch.paths().into_iter().next());
    active.updated_at = Set(Utc::now().into());
    let files = batch
        .commit(async {
            active.update(&state.orm).await?;
            Ok::<(), AppError>(())
        })
        .await?;

    Ok(finish(state, user, UploadTarget::Avatar, user.user_id, files).await)
}

pub async fn upload_product_images(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    multipart: Multipart,
) -> AppResult<ApiResponse<UploadList>> {
    ensure_allowed(user, Action::ManageCatalog)?;
    Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let batch = save_files(state, UploadTarget::Product, multipart).await?;
    let paths = batch.paths();
    let files = batch
        .commit(append_paths(state, "products", "images", id, &paths))
        .await?;

    Ok(finish(state, user, UploadTarget::Product, id, files).await)
}

pub async fn upload_order_files(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    multipart: Multipart,
) -> AppResult<ApiResponse<UploadList>> {
    ensure_allowed(user, Action::UploadFiles)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner_or_admin(user, order.user_id).map_err(|_| AppError::NotFound)?;

    let batch = save_files(state, UploadTarget::Order, multipart).await?;
    let paths = batch.paths();
    let files = batch
        .commit(append_paths(state, "orders", "attachments", id, &paths))
        .await?;

    Ok(finish(state, user, UploadTarget::Order, id, files).await)
}

pub async fn upload_custom_files(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    multipart: Multipart,
) -> AppResult<ApiResponse<UploadList>> {
    ensure_allowed(user, Action::UploadFiles)?;
    let request = CustomRequests::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner_or_admin(user, request.user_id).map_err(|_| AppError::NotFound)?;

    let batch = save_files(state, UploadTarget::CustomDesign, multipart).await?;
    let paths = batch.paths();
    let files = batch
        .commit(append_paths(state, "custom_requests", "attachments", id, &paths))
        .await?;

    Ok(finish(state, user, UploadTarget::CustomDesign, id, files).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_only_for_avatars() {
        assert_eq!(checked_extension(UploadTarget::Avatar, "me.PNG").unwrap(), "png");
        assert!(checked_extension(UploadTarget::Avatar, "logo.pdf").is_err());
        assert!(checked_extension(UploadTarget::Product, "noext").is_err());
    }

    #[test]
    fn design_files_accepted_for_orders() {
        for name in ["art.ai", "art.eps", "bundle.zip", "mock.psd", "vector.svg"] {
            assert!(checked_extension(UploadTarget::CustomDesign, name).is_ok());
            assert!(checked_extension(UploadTarget::Order, name).is_ok());
        }
        assert!(checked_extension(UploadTarget::Order, "run.exe").is_err());
    }

    #[test]
    fn stored_name_layout() {
        assert_eq!(
            stored_file_name("designs", 1_700_000_000_000, "abc123", "png"),
            "designs-1700000000000-abc123.png"
        );
        assert_eq!(stored_file_name("../etc", 1, "r", "zip"), "etc-1-r.zip");
        assert_eq!(stored_file_name("", 1, "r", "gif"), "file-1-r.gif");
    }

    fn pending(field: &str, ext: &str, body: &'static [u8]) -> PendingFile {
        PendingFile {
            field: field.into(),
            original_name: format!("{field}.{ext}"),
            ext: ext.into(),
            bytes: Bytes::from_static(body),
        }
    }

    #[tokio::test]
    async fn files_are_kept_when_the_record_is_updated() {
        let dir = tempfile::tempdir().unwrap();
        let batch = write_batch(
            dir.path(),
            UploadTarget::Order,
            vec![pending("brief", "pdf", b"%PDF"), pending("art", "png", b"png")],
        )
        .await
        .unwrap();
        let written = batch.written.clone();

        let files = batch.commit(async { Ok::<(), AppError>(()) }).await.unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].path.starts_with("/uploads/orders/brief-"));
        for path in written {
            assert!(path.exists());
        }
    }

    #[tokio::test]
    async fn files_are_removed_when_the_record_update_fails() {
        let dir = tempfile::tempdir().unwrap();
        let batch = write_batch(
            dir.path(),
            UploadTarget::CustomDesign,
            vec![pending("logo", "svg", b"<svg/>"), pending("mock", "zip", b"PK")],
        )
        .await
        .unwrap();
        let written = batch.written.clone();
        assert!(written.iter().all(|p| p.exists()));

        let err = batch
            .commit(async { Err(AppError::NotFound) })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
        assert!(written.iter().all(|p| !p.exists()));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let result = write_batch(
            &missing,
            UploadTarget::Product,
            vec![pending("front", "png", b"png")],
        )
        .await;
        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn folders_match_targets() {
        assert_eq!(UploadTarget::CustomDesign.folder(), "custom-designs");
        assert_eq!(UploadTarget::Avatar.folder(), "avatars");
    }
}
