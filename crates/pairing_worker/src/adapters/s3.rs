use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{Tag, Tagging};

use crate::adapters::object_store::ObjectStore;
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    bucket: String,
    s3_client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(s3_client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            s3_client,
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        let result = self
            .s3_client
            .head_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(error)
                if error
                    .as_service_error()
                    .map(|service_error| service_error.is_not_found())
                    .unwrap_or(false) =>
            {
                Ok(false)
            }
            Err(error) => Err(StoreError::Lookup {
                path: path.to_string(),
                message: DisplayErrorContext(&error).to_string(),
            }),
        }
    }

    async fn set_tags(
        &self,
        path: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<(), StoreError> {
        let tag_error = |message: String| StoreError::Tag {
            path: path.to_string(),
            message,
        };

        let tag_set = tags
            .iter()
            .map(|(key, value)| Tag::builder().key(key).value(value).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| tag_error(format!("invalid tag: {error}")))?;
        let tagging = Tagging::builder()
            .set_tag_set(Some(tag_set))
            .build()
            .map_err(|error| tag_error(format!("invalid tag set: {error}")))?;

        self.s3_client
            .put_object_tagging()
            .bucket(&self.bucket)
            .key(path)
            .tagging(tagging)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| tag_error(DisplayErrorContext(&error).to_string()))
    }
}
