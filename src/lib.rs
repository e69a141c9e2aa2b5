pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use crate::app::images::ImageService;
use crate::app::tokens::TokenService;
use crate::config::AppConfig;
use crate::infra::{db::Db, storage::ObjectStorage};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub storage: ObjectStorage,
    pub token_key: [u8; 32],
    pub token_ttl_hours: u64,
    pub upload_max_bytes: usize,
    pub image_public_base: String,
    pub cors_allow_origin: Option<String>,
}

impl AppState {
    pub fn new(config: &AppConfig, db: Db, storage: ObjectStorage) -> Self {
        Self {
            db,
            storage,
            token_key: config.token_key,
            token_ttl_hours: config.token_ttl_hours,
            upload_max_bytes: config.upload_max_bytes,
            image_public_base: config
                .s3_public_endpoint
                .clone()
                .unwrap_or_else(|| config.s3_endpoint.clone()),
            cors_allow_origin: config.cors_allow_origin.clone(),
        }
    }

    pub fn tokens(&self) -> TokenService {
        TokenService::new(self.token_key, self.token_ttl_hours)
    }

    pub fn images(&self) -> ImageService {
        ImageService::new(
            self.storage.clone(),
            self.image_public_base.clone(),
            self.upload_max_bytes,
        )
    }
}
