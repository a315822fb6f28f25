use std::path::PathBuf;

use actix_web::web;
use async_trait::async_trait;

/// Blob storage for uploaded files; returns the public URL of the object.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> anyhow::Result<String>;
}

/// Writes objects under a local directory served at `{base}/uploads`.
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> anyhow::Result<String> {
        if key.split('/').any(|part| part.is_empty() || part == "..") {
            anyhow::bail!("invalid object key `{key}`");
        }

        let path = self.root.join(key);
        web::block(move || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, bytes)
        })
        .await??;

        Ok(format!("{}/uploads/{}", self.public_base_url, key))
    }
}

/// File extension for the image types accepted as profile pictures.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type.split(';').next().map(str::trim) {
        Some("image/png") => Some("png"),
        Some("image/jpeg") | Some("image/jpg") => Some("jpg"),
        Some("image/webp") => Some("webp"),
        _ => None,
    }
}
