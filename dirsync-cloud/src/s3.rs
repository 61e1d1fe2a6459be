//! S3-backed [`ObjectStore`].
//!
//! Credentials come from the standard AWS chain (environment, profile,
//! IAM role); request timeouts and retries are the SDK's. An endpoint
//! override switches to path-style addressing for MinIO-style testing.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier, StorageClass};
use aws_sdk_s3::Client;
use tracing::debug;

use crate::config::SyncConfig;
use crate::store::{DeleteOutcome, ObjectStore, RemoteObject, StoreError, StoreResult};

/// Object store implementation over an S3 bucket.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    storage_class: Option<StorageClass>,
}

impl S3ObjectStore {
    /// Builds a client for the configured bucket.
    pub async fn new(config: &SyncConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_override {
            loader = loader.endpoint_url(endpoint);
        }

        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if config.endpoint_override.is_some() {
            builder = builder.force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            storage_class: config
                .storage_class
                .as_deref()
                .map(StorageClass::from),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list(&self) -> StoreResult<Vec<RemoteObject>> {
        let mut objects = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| StoreError::List(e.to_string()))?;
            for obj in page.contents() {
                let Some(key) = obj.key() else { continue };
                objects.push(RemoteObject {
                    key: key.to_string(),
                    size: obj.size().unwrap_or(0).max(0) as u64,
                    etag: obj.e_tag().unwrap_or_default().trim_matches('"').to_string(),
                });
            }
        }

        debug!(objects = objects.len(), bucket = %self.bucket, "listed bucket");
        Ok(objects)
    }

    async fn put(&self, key: &str, local_path: &Path) -> StoreResult<()> {
        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| StoreError::Put {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .set_storage_class(self.storage_class.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::Put {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        debug!(key, "uploaded object");
        Ok(())
    }

    async fn delete_batch(&self, keys: &[String]) -> StoreResult<Vec<DeleteOutcome>> {
        let identifiers = keys
            .iter()
            .map(|key| {
                ObjectIdentifier::builder()
                    .key(key)
                    .build()
                    .map_err(|e| StoreError::Delete(e.to_string()))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .build()
            .map_err(|e| StoreError::Delete(e.to_string()))?;

        let resp = self
            .client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| StoreError::Delete(e.to_string()))?;

        let failures: HashMap<&str, &str> = resp
            .errors()
            .iter()
            .filter_map(|e| Some((e.key()?, e.message().unwrap_or("delete rejected"))))
            .collect();

        debug!(requested = keys.len(), failed = failures.len(), "bulk delete");
        Ok(keys
            .iter()
            .map(|key| DeleteOutcome {
                key: key.clone(),
                error: failures.get(key.as_str()).map(|m| (*m).to_string()),
            })
            .collect())
    }
}
