use crate::logging::LogLevel;

pub const S3_BASE_PREFIX_VAR: &str = "S3_BASE_PREFIX";
pub const LAST_COPY_PARAM_NAME_VAR: &str = "LAST_COPY_PARAM_NAME";
pub const SOURCE_BUCKET_VAR: &str = "SOURCE_BUCKET";
pub const TARGET_BUCKET_VAR: &str = "TARGET_BUCKET";
pub const COPY_LOGS_ROLE_ARN_VAR: &str = "COPY_LOGS_ROLE_ARN";
pub const MODULE_NAME_VAR: &str = "MODULE_NAME";
pub const LOGGING_LEVEL_VAR: &str = "LOGGING_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorJobConfig {
    pub base_prefix: String,
    pub checkpoint_parameter: String,
    pub source_bucket: String,
    pub target_bucket: String,
    pub copy_role_arn: String,
    pub session_name: String,
    pub log_level: LogLevel,
}

impl MirrorJobConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let log_level_value = required(&lookup, LOGGING_LEVEL_VAR)?;
        let log_level = LogLevel::parse(&log_level_value).ok_or_else(|| {
            ConfigError::new(format!(
                "{LOGGING_LEVEL_VAR} must be one of DEBUG, INFO, WARNING, ERROR (got '{log_level_value}')"
            ))
        })?;

        Ok(Self {
            base_prefix: required(&lookup, S3_BASE_PREFIX_VAR)?,
            checkpoint_parameter: required(&lookup, LAST_COPY_PARAM_NAME_VAR)?,
            source_bucket: required(&lookup, SOURCE_BUCKET_VAR)?,
            target_bucket: required(&lookup, TARGET_BUCKET_VAR)?,
            copy_role_arn: required(&lookup, COPY_LOGS_ROLE_ARN_VAR)?,
            session_name: required(&lookup, MODULE_NAME_VAR)?,
            log_level,
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String, ConfigError> {
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::new(format!("{name} must be configured"))),
    }
}
