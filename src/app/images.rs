use anyhow::anyhow;
use bytes::Bytes;
use image::ImageFormat;
use sha2::{Digest, Sha256};
use url::Url;

use crate::app::error::{ServiceError, ServiceResult};
use crate::domain::image::StoredImage;
use crate::infra::storage::ObjectStorage;

const MAX_NAME_LEN: usize = 255;

/// Stores post images in object storage, addressed by content hash.
#[derive(Clone)]
pub struct ImageService {
    storage: ObjectStorage,
    public_base: String,
    max_bytes: usize,
}

impl ImageService {
    pub fn new(storage: ObjectStorage, public_base: String, max_bytes: usize) -> Self {
        Self {
            storage,
            public_base,
            max_bytes,
        }
    }

    pub async fn upload(&self, file_name: Option<&str>, data: Bytes) -> ServiceResult<StoredImage> {
        if data.is_empty() {
            return Err(ServiceError::invalid_input("image is empty"));
        }
        if data.len() > self.max_bytes {
            return Err(ServiceError::invalid_input("image is too large"));
        }

        let (content_type, ext) = sniff_image(&data)?;
        let id = content_id(&data);
        let key = format!("images/{}.{}", id, ext);

        self.storage.put_object(&key, content_type, data).await?;

        let url = public_url(&self.public_base, self.storage.bucket(), &key)?;
        let name = display_name(file_name, &id, ext);
        tracing::info!(image_id = %id, "image stored");

        Ok(StoredImage { id, url, name })
    }
}

fn sniff_image(data: &[u8]) -> ServiceResult<(&'static str, &'static str)> {
    let format = image::guess_format(data)
        .map_err(|_| ServiceError::invalid_input("file is not a supported image"))?;
    match format {
        ImageFormat::Jpeg => Ok(("image/jpeg", "jpg")),
        ImageFormat::Png => Ok(("image/png", "png")),
        ImageFormat::WebP => Ok(("image/webp", "webp")),
        ImageFormat::Gif => Ok(("image/gif", "gif")),
        _ => Err(ServiceError::invalid_input("file is not a supported image")),
    }
}

fn content_id(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn public_url(base: &str, bucket: &str, key: &str) -> ServiceResult<String> {
    let base = if base.contains("://") {
        base.to_string()
    } else {
        format!("http://{}", base)
    };
    let mut url = Url::parse(&base).map_err(|err| anyhow!("invalid public endpoint: {}", err))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("public endpoint cannot be a base"))?
        .pop_if_empty()
        .push(bucket)
        .extend(key.split('/'));
    Ok(url.to_string())
}

fn display_name(file_name: Option<&str>, id: &str, ext: &str) -> String {
    let trimmed = file_name
        .map(|name| name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name).trim())
        .filter(|name| !name.is_empty());
    match trimmed {
        Some(name) => name.chars().take(MAX_NAME_LEN).collect(),
        None => format!("{}.{}", id, ext),
    }
}
