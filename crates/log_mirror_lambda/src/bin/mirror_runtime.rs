use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use log_mirror_lambda::adapters::checkpoint::SsmCheckpointStore;
use log_mirror_lambda::adapters::credentials::StsCredentialBroker;
use log_mirror_lambda::adapters::object_store::S3MirrorFactory;
use log_mirror_lambda::config::MirrorJobConfig;
use log_mirror_lambda::handlers::mirror::{
    handle_mirror_event, MirrorHandlerConfig, MirrorRunReport,
};
use log_mirror_lambda::logging::{init_logging, log_debug, LoggingConfig};
use serde_json::{json, Value};

async fn handle_request(
    event: LambdaEvent<Value>,
    job_config: MirrorJobConfig,
) -> Result<MirrorRunReport, Error> {
    log_debug(
        "mirror_runtime",
        "scheduled_event_received",
        json!({
            "request_id": event.context.request_id,
            "payload": event.payload,
        }),
    );

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let checkpoints = SsmCheckpointStore::new(aws_sdk_ssm::Client::new(&aws_config));
    let broker = StsCredentialBroker::new(aws_sdk_sts::Client::new(&aws_config));
    let mirrors = S3MirrorFactory::new(aws_config, job_config.source_bucket.clone());

    let handler_config = MirrorHandlerConfig {
        base_prefix: job_config.base_prefix,
        checkpoint_parameter: job_config.checkpoint_parameter,
        target_bucket: job_config.target_bucket,
        copy_role_arn: job_config.copy_role_arn,
        session_name: job_config.session_name,
        today: Utc::now().date_naive(),
    };

    handle_mirror_event(&handler_config, &checkpoints, &broker, &mirrors)
        .map_err(|error| Error::from(error.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let job_config = MirrorJobConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    init_logging(LoggingConfig {
        minimum_level: job_config.log_level,
    });

    lambda_runtime::run(service_fn(move |event| {
        handle_request(event, job_config.clone())
    }))
    .await
}
