//! The daemon's main loop: heartbeat on one timer, command polling on
//! another, both driven through `tokio::select!`.
//!
//! Failures are logged and retried on the next tick; the loop only exits
//! when the backend revokes this agent, which the operator resolves with
//! a fresh pairing.

use std::time::Duration;

use uuid::Uuid;

use crate::client::{ApiClient, CommandReport, PolledCommand};
use crate::executor::{ExecutionOutcome, Executor};
use crate::metrics;

/// Interval between command polls.
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Run heartbeat and poll loops until the agent is revoked.
pub async fn run(
    client: &ApiClient,
    executor: &Executor,
    agent_id: Uuid,
    heartbeat_interval: Duration,
) {
    let mut heartbeat_ticker = tokio::time::interval(heartbeat_interval);
    let mut poll_ticker = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = heartbeat_ticker.tick() => {
                match client.heartbeat(agent_id, metrics::collect()).await {
                    Ok(_) => tracing::debug!("Heartbeat accepted"),
                    Err(e) if is_revoked(&e) => {
                        tracing::error!("Agent has been revoked; stopping");
                        return;
                    }
                    Err(e) => tracing::warn!(error = %e, "Heartbeat failed"),
                }
            }
            _ = poll_ticker.tick() => {
                match client.poll_commands().await {
                    Ok(commands) => {
                        for command in commands {
                            handle_command(client, executor, &command).await;
                        }
                    }
                    Err(e) if is_revoked(&e) => {
                        tracing::error!("Agent has been revoked; stopping");
                        return;
                    }
                    Err(e) => tracing::warn!(error = %e, "Command poll failed"),
                }
            }
        }
    }
}

/// A 403 from heartbeat or poll means revocation, not a transient fault.
fn is_revoked(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<crate::client::ApiError>()
        .is_some_and(|api| api.code == "FORBIDDEN")
}

/// ack -> execute -> report, with each step logged.
async fn handle_command(client: &ApiClient, executor: &Executor, command: &PolledCommand) {
    tracing::info!(
        command_id = %command.id,
        command_type = %command.command_type,
        "Executing command",
    );

    if let Err(e) = client.ack_command(command.id).await {
        // Raced with a cancel or expiry; the backend owns the record.
        tracing::warn!(command_id = %command.id, error = %e, "Ack rejected, skipping");
        return;
    }

    let report = match executor.execute(command).await {
        ExecutionOutcome::Success(result) => CommandReport {
            outcome: "succeeded",
            result: Some(result),
            error_message: None,
        },
        ExecutionOutcome::Failure(message) => {
            tracing::error!(command_id = %command.id, error = %message, "Command failed");
            CommandReport {
                outcome: "failed",
                result: None,
                error_message: Some(message),
            }
        }
    };

    if let Err(e) = client.report_command(command.id, &report).await {
        tracing::error!(command_id = %command.id, error = %e, "Failed to report outcome");
    }
}
