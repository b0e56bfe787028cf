use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::adapters::checkpoint::CheckpointStore;
use crate::adapters::credentials::CredentialBroker;
use crate::adapters::object_store::{ObjectMirror, ObjectMirrorFactory};
use crate::logging::{log_error, log_info};
use crate::runtime::calendar::{format_checkpoint, parse_checkpoint, pending_days};
use crate::runtime::contract::{CopySummary, MirrorError, ASSUME_ROLE_DURATION_SECONDS};
use crate::runtime::keys::dated_prefix;

const COMPONENT: &str = "mirror_handler";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorHandlerConfig {
    pub base_prefix: String,
    pub checkpoint_parameter: String,
    pub target_bucket: String,
    pub copy_role_arn: String,
    pub session_name: String,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MirrorRunReport {
    pub status: String,
    pub days_processed: usize,
    pub objects_copied: usize,
    pub bytes_copied: i64,
    pub checkpoint: String,
}

pub fn handle_mirror_event(
    config: &MirrorHandlerConfig,
    checkpoints: &impl CheckpointStore,
    broker: &impl CredentialBroker,
    mirrors: &impl ObjectMirrorFactory,
) -> Result<MirrorRunReport, MirrorError> {
    let started_at = Instant::now();
    log_info(
        COMPONENT,
        "mirror_started",
        json!({
            "checkpoint_parameter": config.checkpoint_parameter,
            "target_bucket": config.target_bucket,
            "today": format_checkpoint(config.today),
        }),
    );

    match mirror_pending_days(config, checkpoints, broker, mirrors) {
        Ok(report) => {
            log_info(
                COMPONENT,
                "mirror_completed",
                json!({
                    "status": report.status,
                    "days_processed": report.days_processed,
                    "objects_copied": report.objects_copied,
                    "bytes_copied": report.bytes_copied,
                    "checkpoint": report.checkpoint,
                    "duration_ms": started_at.elapsed().as_millis(),
                }),
            );
            Ok(report)
        }
        Err(error) => {
            log_error(
                COMPONENT,
                "mirror_failed",
                json!({
                    "error": error.to_string(),
                    "duration_ms": started_at.elapsed().as_millis(),
                }),
            );
            Err(error)
        }
    }
}

fn mirror_pending_days(
    config: &MirrorHandlerConfig,
    checkpoints: &impl CheckpointStore,
    broker: &impl CredentialBroker,
    mirrors: &impl ObjectMirrorFactory,
) -> Result<MirrorRunReport, MirrorError> {
    let stored = checkpoints.get(&config.checkpoint_parameter)?;
    let checkpoint = parse_checkpoint(&stored)?;

    let days = pending_days(checkpoint, config.today);
    let Some(&last_day) = days.last() else {
        log_info(
            COMPONENT,
            "mirror_up_to_date",
            json!({
                "checkpoint": format_checkpoint(checkpoint),
                "today": format_checkpoint(config.today),
            }),
        );
        return Ok(MirrorRunReport {
            status: "up_to_date".to_string(),
            days_processed: 0,
            objects_copied: 0,
            bytes_copied: 0,
            checkpoint: format_checkpoint(checkpoint),
        });
    };

    let credentials = broker.assume_role(
        &config.copy_role_arn,
        ASSUME_ROLE_DURATION_SECONDS,
        &config.session_name,
    )?;
    let mirror = mirrors.with_credentials(&credentials);

    let mut totals = CopySummary::default();
    for day in &days {
        let prefix = dated_prefix(&config.base_prefix, *day);
        let summary = mirror.copy_all(&config.target_bucket, &prefix)?;
        totals.merge(&summary);
    }

    let checkpoint_value = format_checkpoint(last_day);
    let version = checkpoints.set(&config.checkpoint_parameter, &checkpoint_value)?;
    log_info(
        COMPONENT,
        "checkpoint_advanced",
        json!({
            "parameter": config.checkpoint_parameter,
            "checkpoint": checkpoint_value,
            "version": version,
        }),
    );

    Ok(MirrorRunReport {
        status: "mirrored".to_string(),
        days_processed: days.len(),
        objects_copied: totals.objects_copied,
        bytes_copied: totals.bytes_copied,
        checkpoint: checkpoint_value,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::runtime::contract::ScopedCredentials;
    use crate::runtime::retry::{RemoteCallError, RemoteErrorClass};

    struct RecordingCheckpointStore {
        stored_value: String,
        fail_writes: bool,
        writes: Mutex<Vec<(String, String)>>,
    }

    impl RecordingCheckpointStore {
        fn with_value(value: &str) -> Self {
            Self {
                stored_value: value.to_string(),
                fail_writes: false,
                writes: Mutex::new(Vec::new()),
            }
        }

        fn writes(&self) -> Vec<(String, String)> {
            self.writes.lock().expect("poisoned mutex").clone()
        }
    }

    impl CheckpointStore for RecordingCheckpointStore {
        fn get(&self, _name: &str) -> Result<String, MirrorError> {
            Ok(self.stored_value.clone())
        }

        fn set(&self, name: &str, value: &str) -> Result<i64, MirrorError> {
            if self.fail_writes {
                return Err(MirrorError::Remote(remote_error(
                    "put_parameter",
                    "InternalServerError",
                )));
            }
            self.writes
                .lock()
                .expect("poisoned mutex")
                .push((name.to_string(), value.to_string()));
            Ok(7)
        }
    }

    struct RecordingBroker {
        requests: Mutex<Vec<(String, i32, String)>>,
    }

    impl RecordingBroker {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<(String, i32, String)> {
            self.requests.lock().expect("poisoned mutex").clone()
        }
    }

    impl CredentialBroker for RecordingBroker {
        fn assume_role(
            &self,
            role_arn: &str,
            duration_seconds: i32,
            session_name: &str,
        ) -> Result<ScopedCredentials, MirrorError> {
            self.requests.lock().expect("poisoned mutex").push((
                role_arn.to_string(),
                duration_seconds,
                session_name.to_string(),
            ));
            Ok(sample_credentials())
        }
    }

    #[derive(Clone)]
    struct ScriptedMirror {
        copies: Arc<Mutex<Vec<(String, String)>>>,
        fail_on_prefix: Option<String>,
    }

    impl ScriptedMirror {
        fn new() -> Self {
            Self {
                copies: Arc::new(Mutex::new(Vec::new())),
                fail_on_prefix: None,
            }
        }

        fn failing_on(prefix: &str) -> Self {
            Self {
                copies: Arc::new(Mutex::new(Vec::new())),
                fail_on_prefix: Some(prefix.to_string()),
            }
        }

        fn copies(&self) -> Vec<(String, String)> {
            self.copies.lock().expect("poisoned mutex").clone()
        }
    }

    impl ObjectMirror for ScriptedMirror {
        fn copy_all(
            &self,
            destination_bucket: &str,
            prefix: &str,
        ) -> Result<CopySummary, MirrorError> {
            if self.fail_on_prefix.as_deref() == Some(prefix) {
                return Err(MirrorError::Remote(remote_error(
                    "copy_object",
                    "AccessDenied",
                )));
            }
            self.copies
                .lock()
                .expect("poisoned mutex")
                .push((destination_bucket.to_string(), prefix.to_string()));
            Ok(CopySummary {
                objects_copied: 2,
                bytes_copied: 120,
            })
        }
    }

    struct ScriptedMirrorFactory {
        mirror: ScriptedMirror,
        credentials_seen: Mutex<Vec<ScopedCredentials>>,
    }

    impl ScriptedMirrorFactory {
        fn new(mirror: ScriptedMirror) -> Self {
            Self {
                mirror,
                credentials_seen: Mutex::new(Vec::new()),
            }
        }

        fn sessions_opened(&self) -> usize {
            self.credentials_seen.lock().expect("poisoned mutex").len()
        }
    }

    impl ObjectMirrorFactory for ScriptedMirrorFactory {
        type Mirror = ScriptedMirror;

        fn with_credentials(&self, credentials: &ScopedCredentials) -> Self::Mirror {
            self.credentials_seen
                .lock()
                .expect("poisoned mutex")
                .push(credentials.clone());
            self.mirror.clone()
        }
    }

    fn remote_error(operation: &str, code: &str) -> RemoteCallError {
        RemoteCallError {
            operation: operation.to_string(),
            class: RemoteErrorClass::Other,
            code: Some(code.to_string()),
            message: "simulated failure".to_string(),
        }
    }

    fn sample_credentials() -> ScopedCredentials {
        ScopedCredentials {
            access_key_id: "AKIAEXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: "token".to_string(),
        }
    }

    fn sample_config() -> MirrorHandlerConfig {
        MirrorHandlerConfig {
            base_prefix: "logs/app1/".to_string(),
            checkpoint_parameter: "/mirror/last-copied-day".to_string(),
            target_bucket: "log-archive".to_string(),
            copy_role_arn: "arn:aws:iam::123456789012:role/copy-logs".to_string(),
            session_name: "log-mirror".to_string(),
            today: NaiveDate::from_ymd_opt(2024, 1, 4).expect("valid calendar day"),
        }
    }

    #[test]
    fn mirrors_each_pending_day_in_order_and_advances_checkpoint() {
        let checkpoints = RecordingCheckpointStore::with_value("2024/01/01");
        let broker = RecordingBroker::new();
        let mirror = ScriptedMirror::new();
        let mirrors = ScriptedMirrorFactory::new(mirror.clone());

        let report = handle_mirror_event(&sample_config(), &checkpoints, &broker, &mirrors)
            .expect("mirror run should succeed");

        assert_eq!(
            mirror.copies(),
            vec![
                (
                    "log-archive".to_string(),
                    "logs/app1/2024/01/02/".to_string()
                ),
                (
                    "log-archive".to_string(),
                    "logs/app1/2024/01/03/".to_string()
                ),
            ]
        );
        assert_eq!(
            checkpoints.writes(),
            vec![(
                "/mirror/last-copied-day".to_string(),
                "2024/01/03".to_string()
            )]
        );
        assert_eq!(
            broker.requests(),
            vec![(
                "arn:aws:iam::123456789012:role/copy-logs".to_string(),
                3_600,
                "log-mirror".to_string()
            )]
        );
        assert_eq!(mirrors.sessions_opened(), 1);

        assert_eq!(report.status, "mirrored");
        assert_eq!(report.days_processed, 2);
        assert_eq!(report.objects_copied, 4);
        assert_eq!(report.bytes_copied, 240);
        assert_eq!(report.checkpoint, "2024/01/03");
    }

    #[test]
    fn up_to_date_run_copies_nothing_and_keeps_checkpoint() {
        let checkpoints = RecordingCheckpointStore::with_value("2024/01/03");
        let broker = RecordingBroker::new();
        let mirror = ScriptedMirror::new();
        let mirrors = ScriptedMirrorFactory::new(mirror.clone());

        let report = handle_mirror_event(&sample_config(), &checkpoints, &broker, &mirrors)
            .expect("up-to-date run should succeed");

        assert_eq!(report.status, "up_to_date");
        assert_eq!(report.days_processed, 0);
        assert_eq!(report.objects_copied, 0);
        assert_eq!(report.checkpoint, "2024/01/03");

        assert!(mirror.copies().is_empty());
        assert!(checkpoints.writes().is_empty());
        assert!(broker.requests().is_empty());
        assert_eq!(mirrors.sessions_opened(), 0);
    }

    #[test]
    fn failed_day_leaves_checkpoint_untouched() {
        let checkpoints = RecordingCheckpointStore::with_value("2024/01/01");
        let broker = RecordingBroker::new();
        let mirror = ScriptedMirror::failing_on("logs/app1/2024/01/03/");
        let mirrors = ScriptedMirrorFactory::new(mirror.clone());

        let error = handle_mirror_event(&sample_config(), &checkpoints, &broker, &mirrors)
            .expect_err("mirror run should fail");

        match error {
            MirrorError::Remote(remote) => {
                assert_eq!(remote.code.as_deref(), Some("AccessDenied"));
            }
            other => panic!("expected Remote, got {other:?}"),
        }

        // The first day was copied before the failure; nothing was written.
        assert_eq!(
            mirror.copies(),
            vec![(
                "log-archive".to_string(),
                "logs/app1/2024/01/02/".to_string()
            )]
        );
        assert!(checkpoints.writes().is_empty());
    }

    #[test]
    fn malformed_checkpoint_fails_before_credentials() {
        let checkpoints = RecordingCheckpointStore::with_value("01-2024-05");
        let broker = RecordingBroker::new();
        let mirrors = ScriptedMirrorFactory::new(ScriptedMirror::new());

        let error = handle_mirror_event(&sample_config(), &checkpoints, &broker, &mirrors)
            .expect_err("mirror run should fail");

        assert!(matches!(error, MirrorError::Checkpoint(_)));
        assert!(broker.requests().is_empty());
        assert_eq!(mirrors.sessions_opened(), 0);
    }

    #[test]
    fn checkpoint_write_failure_propagates_after_copies() {
        let checkpoints = RecordingCheckpointStore {
            stored_value: "2024/01/02".to_string(),
            fail_writes: true,
            writes: Mutex::new(Vec::new()),
        };
        let broker = RecordingBroker::new();
        let mirror = ScriptedMirror::new();
        let mirrors = ScriptedMirrorFactory::new(mirror.clone());

        let error = handle_mirror_event(&sample_config(), &checkpoints, &broker, &mirrors)
            .expect_err("mirror run should fail");

        match error {
            MirrorError::Remote(remote) => assert_eq!(remote.operation, "put_parameter"),
            other => panic!("expected Remote, got {other:?}"),
        }
        assert_eq!(mirror.copies().len(), 1);
    }
}
