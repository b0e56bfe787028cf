use serde_json::json;

use crate::backoff::{run_with_backoff, sdk_remote_error};
use crate::logging::log_info;
use crate::runtime::contract::{MirrorError, ScopedCredentials};
use crate::runtime::retry::{RemoteCallError, RemoteErrorClass, RetryPolicy};

const COMPONENT: &str = "credential_broker";

pub trait CredentialBroker {
    fn assume_role(
        &self,
        role_arn: &str,
        duration_seconds: i32,
        session_name: &str,
    ) -> Result<ScopedCredentials, MirrorError>;
}

pub struct StsCredentialBroker {
    sts_client: aws_sdk_sts::Client,
}

impl StsCredentialBroker {
    pub fn new(sts_client: aws_sdk_sts::Client) -> Self {
        Self { sts_client }
    }
}

impl CredentialBroker for StsCredentialBroker {
    fn assume_role(
        &self,
        role_arn: &str,
        duration_seconds: i32,
        session_name: &str,
    ) -> Result<ScopedCredentials, MirrorError> {
        let target_role_arn = role_arn.to_string();
        let role_session_name = session_name.to_string();
        let client = self.sts_client.clone();

        let credentials = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                run_with_backoff(RetryPolicy::default(), COMPONENT, || {
                    let client = client.clone();
                    let target_role_arn = target_role_arn.clone();
                    let role_session_name = role_session_name.clone();
                    async move {
                        let response = client
                            .assume_role()
                            .role_arn(target_role_arn)
                            .role_session_name(role_session_name)
                            .duration_seconds(duration_seconds)
                            .send()
                            .await
                            .map_err(|error| sdk_remote_error("assume_role", error))?;

                        let credentials = response.credentials().ok_or_else(|| RemoteCallError {
                                operation: "assume_role".to_string(),
                                class: RemoteErrorClass::Other,
                                code: None,
                                message: "assume_role response carried no credentials".to_string(),
                            })?;

                        Ok(ScopedCredentials {
                            access_key_id: credentials.access_key_id().to_string(),
                            secret_access_key: credentials.secret_access_key().to_string(),
                            session_token: credentials.session_token().to_string(),
                        })
                    }
                })
                .await
            })
        })?;

        log_info(
            COMPONENT,
            "role_assumed",
            json!({
                "role_arn": role_arn,
                "duration_seconds": duration_seconds,
            }),
        );
        Ok(credentials)
    }
}
