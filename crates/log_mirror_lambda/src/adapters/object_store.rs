use aws_sdk_s3::types::ServerSideEncryption;
use serde_json::json;

use crate::backoff::{run_with_backoff, sdk_remote_error};
use crate::logging::{log_debug, log_info};
use crate::runtime::contract::{CopySummary, MirrorError, ObjectDescriptor, ScopedCredentials};
use crate::runtime::keys::{exclude_folder_marker, PREFIX_DELIMITER};
use crate::runtime::retry::{RemoteCallError, RemoteErrorClass, RetryPolicy};

const COMPONENT: &str = "object_mirror";
const FALLBACK_STORAGE_CLASS: &str = "STANDARD";

pub trait ObjectMirror {
    fn copy_all(&self, destination_bucket: &str, prefix: &str) -> Result<CopySummary, MirrorError>;
}

/// Opens a mirror session against the source bucket from assumed-role
/// credentials.
pub trait ObjectMirrorFactory {
    type Mirror: ObjectMirror;

    fn with_credentials(&self, credentials: &ScopedCredentials) -> Self::Mirror;
}

pub struct S3ObjectMirror {
    source_bucket: String,
    s3_client: aws_sdk_s3::Client,
}

impl S3ObjectMirror {
    pub fn new(s3_client: aws_sdk_s3::Client, source_bucket: impl Into<String>) -> Self {
        Self {
            source_bucket: source_bucket.into(),
            s3_client,
        }
    }

    /// Full listing under `prefix`, folder marker excluded. The pagination
    /// walk is one retry unit; a throttled page restarts the walk.
    pub fn list_by_prefix(
        &self,
        prefix: &str,
        delimiter: &str,
    ) -> Result<Vec<ObjectDescriptor>, MirrorError> {
        let bucket = self.source_bucket.clone();
        let listing_prefix = prefix.to_string();
        let listing_delimiter = delimiter.to_string();
        let client = self.s3_client.clone();

        let objects = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                run_with_backoff(RetryPolicy::default(), COMPONENT, || {
                    let client = client.clone();
                    let bucket = bucket.clone();
                    let listing_prefix = listing_prefix.clone();
                    let listing_delimiter = listing_delimiter.clone();
                    async move {
                        list_all_pages(&client, &bucket, &listing_prefix, &listing_delimiter).await
                    }
                })
                .await
            })
        })?;

        let objects = exclude_folder_marker(objects, prefix);
        log_debug(
            COMPONENT,
            "prefix_listed",
            json!({
                "prefix": prefix,
                "objects": objects,
            }),
        );
        log_info(
            COMPONENT,
            "prefix_object_count",
            json!({
                "prefix": prefix,
                "object_count": objects.len(),
            }),
        );
        Ok(objects)
    }
}

impl ObjectMirror for S3ObjectMirror {
    fn copy_all(&self, destination_bucket: &str, prefix: &str) -> Result<CopySummary, MirrorError> {
        let objects = self.list_by_prefix(prefix, PREFIX_DELIMITER)?;

        let bucket = self.source_bucket.clone();
        let destination = destination_bucket.to_string();
        let client = self.s3_client.clone();
        let copy_objects = objects.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                run_with_backoff(RetryPolicy::default(), COMPONENT, || {
                    let client = client.clone();
                    let bucket = bucket.clone();
                    let destination = destination.clone();
                    let copy_objects = copy_objects.clone();
                    async move {
                        copy_objects_once(&client, &bucket, &destination, &copy_objects).await
                    }
                })
                .await
            })
        })?;

        let summary = CopySummary {
            objects_copied: objects.len(),
            bytes_copied: objects.iter().map(|object| object.size).sum(),
        };
        log_info(
            COMPONENT,
            "prefix_copied",
            json!({
                "prefix": prefix,
                "source_bucket": self.source_bucket,
                "destination_bucket": destination_bucket,
                "objects_copied": summary.objects_copied,
                "bytes_copied": summary.bytes_copied,
            }),
        );
        Ok(summary)
    }
}

async fn list_all_pages(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    prefix: &str,
    delimiter: &str,
) -> Result<Vec<ObjectDescriptor>, RemoteCallError> {
    let mut objects = Vec::new();
    let mut continuation_token: Option<String> = None;

    loop {
        let response = client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .delimiter(delimiter)
            .set_continuation_token(continuation_token.take())
            .send()
            .await
            .map_err(|error| sdk_remote_error("list_objects_v2", error))?;

        for object in response.contents() {
            let Some(key) = object.key() else {
                continue;
            };
            objects.push(ObjectDescriptor {
                key: key.to_string(),
                size: object.size().unwrap_or_default(),
                storage_class: object
                    .storage_class()
                    .map(|storage_class| storage_class.as_str().to_string())
                    .unwrap_or_else(|| FALLBACK_STORAGE_CLASS.to_string()),
            });
        }

        if !response.is_truncated().unwrap_or_default() {
            return Ok(objects);
        }

        continuation_token = response.next_continuation_token().map(str::to_string);
        if continuation_token.is_none() {
            // A truncated page without a continuation token cannot be resumed.
            return Err(RemoteCallError {
                operation: "list_objects_v2".to_string(),
                class: RemoteErrorClass::Pagination,
                code: None,
                message: format!(
                    "truncated listing for prefix {prefix} carried no continuation token"
                ),
            });
        }
    }
}

async fn copy_objects_once(
    client: &aws_sdk_s3::Client,
    source_bucket: &str,
    destination_bucket: &str,
    objects: &[ObjectDescriptor],
) -> Result<(), RemoteCallError> {
    for object in objects {
        client
            .copy_object()
            .copy_source(format!("{source_bucket}/{}", object.key))
            .bucket(destination_bucket)
            .key(&object.key)
            .server_side_encryption(ServerSideEncryption::AwsKms)
            .bucket_key_enabled(true)
            .send()
            .await
            .map_err(|error| sdk_remote_error("copy_object", error))?;
    }
    Ok(())
}

pub struct S3MirrorFactory {
    sdk_config: aws_config::SdkConfig,
    source_bucket: String,
}

impl S3MirrorFactory {
    pub fn new(sdk_config: aws_config::SdkConfig, source_bucket: impl Into<String>) -> Self {
        Self {
            sdk_config,
            source_bucket: source_bucket.into(),
        }
    }
}

impl ObjectMirrorFactory for S3MirrorFactory {
    type Mirror = S3ObjectMirror;

    fn with_credentials(&self, credentials: &ScopedCredentials) -> Self::Mirror {
        let scoped = aws_sdk_s3::config::Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            Some(credentials.session_token.clone()),
            None,
            "copy_logs_role",
        );
        let config = aws_sdk_s3::config::Builder::from(&self.sdk_config)
            .credentials_provider(scoped)
            .build();

        S3ObjectMirror::new(
            aws_sdk_s3::Client::from_conf(config),
            self.source_bucket.clone(),
        )
    }
}
