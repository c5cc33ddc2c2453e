use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedFile {
    pub field: String,
    pub original_name: Option<String>,
    pub path: String,
    pub size: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadList {
    pub items: Vec<UploadedFile>,
}
