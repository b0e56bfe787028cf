use aws_sdk_ssm::types::ParameterType;
use serde_json::json;

use crate::backoff::{run_with_backoff, sdk_remote_error};
use crate::logging::log_info;
use crate::runtime::contract::MirrorError;
use crate::runtime::retry::{RemoteCallError, RemoteErrorClass, RetryPolicy};

const COMPONENT: &str = "checkpoint_store";

pub trait CheckpointStore {
    fn get(&self, name: &str) -> Result<String, MirrorError>;
    fn set(&self, name: &str, value: &str) -> Result<i64, MirrorError>;
}

pub struct SsmCheckpointStore {
    ssm_client: aws_sdk_ssm::Client,
}

impl SsmCheckpointStore {
    pub fn new(ssm_client: aws_sdk_ssm::Client) -> Self {
        Self { ssm_client }
    }
}

impl CheckpointStore for SsmCheckpointStore {
    fn get(&self, name: &str) -> Result<String, MirrorError> {
        let parameter_name = name.to_string();
        let client = self.ssm_client.clone();

        let value = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                run_with_backoff(RetryPolicy::default(), COMPONENT, || {
                    let client = client.clone();
                    let parameter_name = parameter_name.clone();
                    async move {
                        let response = client
                            .get_parameter()
                            .name(&parameter_name)
                            .with_decryption(true)
                            .send()
                            .await
                            .map_err(|error| sdk_remote_error("get_parameter", error))?;

                        response
                            .parameter()
                            .and_then(|parameter| parameter.value())
                            .map(str::to_string)
                            .ok_or_else(|| RemoteCallError {
                                operation: "get_parameter".to_string(),
                                class: RemoteErrorClass::Other,
                                code: None,
                                message: format!("parameter {parameter_name} has no value"),
                            })
                    }
                })
                .await
            })
        })?;

        log_info(
            COMPONENT,
            "checkpoint_loaded",
            json!({
                "parameter": name,
                "value": value,
            }),
        );
        Ok(value)
    }

    fn set(&self, name: &str, value: &str) -> Result<i64, MirrorError> {
        let parameter_name = name.to_string();
        let parameter_value = value.to_string();
        let client = self.ssm_client.clone();

        let version = tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                run_with_backoff(RetryPolicy::default(), COMPONENT, || {
                    let client = client.clone();
                    let parameter_name = parameter_name.clone();
                    let parameter_value = parameter_value.clone();
                    async move {
                        let response = client
                            .put_parameter()
                            .name(parameter_name)
                            .value(parameter_value)
                            .r#type(ParameterType::String)
                            .overwrite(true)
                            .send()
                            .await
                            .map_err(|error| sdk_remote_error("put_parameter", error))?;
                        Ok(response.version())
                    }
                })
                .await
            })
        })?;

        log_info(
            COMPONENT,
            "checkpoint_stored",
            json!({
                "parameter": name,
                "value": value,
                "version": version,
            }),
        );
        Ok(version)
    }
}
