//! Command execution.
//!
//! Maps each command type from the queue onto a local action: `ping` is
//! answered in-process, the lifecycle verbs drive the bot's systemd unit.
//! The unit name comes from the command payload (`service`) or the
//! daemon's configured default, and is validated before it ever reaches
//! `systemctl`.

use std::time::Duration;

use serde_json::json;

use crate::client::PolledCommand;

/// Default timeout for a systemctl invocation.
const EXEC_TIMEOUT: Duration = Duration::from_secs(60);

/// Terminal result of executing one command.
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// Report `succeeded` with this result object.
    Success(serde_json::Value),
    /// Report `failed` with this message.
    Failure(String),
}

/// Allowed unit name characters: alphanumeric, hyphen, underscore, dot.
/// Prevents shell injection via the payload.
fn is_safe_unit_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 128
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Executes commands against the local host.
pub struct Executor {
    /// Unit managed when the payload does not name one.
    default_service: String,
}

impl Executor {
    pub fn new(default_service: String) -> Self {
        Executor { default_service }
    }

    /// Execute a command to completion and produce its report.
    pub async fn execute(&self, command: &PolledCommand) -> ExecutionOutcome {
        let start = std::time::Instant::now();

        let outcome = match command.command_type.as_str() {
            "ping" => ExecutionOutcome::Success(json!({ "pong": true })),
            "start" => self.systemctl("start", self.unit_for(command)).await,
            "stop" => self.systemctl("stop", self.unit_for(command)).await,
            "restart" => self.systemctl("restart", self.unit_for(command)).await,
            // The update unit pulls and installs the new bot build; a
            // restart of it re-runs the deployment.
            "update" => self.systemctl("restart", self.unit_for(command)).await,
            "shutdown" => self.systemctl("poweroff", None).await,
            other => ExecutionOutcome::Failure(format!("unsupported command type '{other}'")),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match outcome {
            ExecutionOutcome::Success(mut result) => {
                if let Some(object) = result.as_object_mut() {
                    object.insert("duration_ms".into(), json!(elapsed_ms));
                }
                ExecutionOutcome::Success(result)
            }
            failure => failure,
        }
    }

    fn unit_for<'a>(&'a self, command: &'a PolledCommand) -> Option<&'a str> {
        Some(
            command
                .payload
                .get("service")
                .and_then(|v| v.as_str())
                .unwrap_or(&self.default_service),
        )
    }

    /// Run a systemctl verb, optionally against a unit, under a timeout.
    async fn systemctl(&self, verb: &str, unit: Option<&str>) -> ExecutionOutcome {
        let mut args = vec![verb.to_string()];
        if let Some(unit) = unit {
            if !is_safe_unit_name(unit) {
                return ExecutionOutcome::Failure(format!("invalid service name '{unit}'"));
            }
            args.push(unit.to_string());
        }

        tracing::info!(verb, ?unit, "Executing systemctl");

        let result = tokio::time::timeout(
            EXEC_TIMEOUT,
            tokio::process::Command::new("systemctl").args(&args).output(),
        )
        .await;

        match result {
            Ok(Ok(output)) if output.status.success() => ExecutionOutcome::Success(json!({
                "verb": verb,
                "service": unit,
            })),
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                ExecutionOutcome::Failure(format!(
                    "systemctl {verb} failed (exit {}): {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim(),
                ))
            }
            Ok(Err(e)) => ExecutionOutcome::Failure(format!("failed to execute systemctl: {e}")),
            Err(_) => ExecutionOutcome::Failure(format!(
                "systemctl {verb} timed out after {}s",
                EXEC_TIMEOUT.as_secs(),
            )),
        }
    }
}
