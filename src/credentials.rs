//! Secrets for the external services: none, a static value, or a shell
//! command that prints a fresh value (e.g. `gcloud auth print-access-token`).

use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Timeout for secret command execution.
const SECRET_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to execute secret command: {0}")]
    Spawn(String),
    #[error("Secret command timed out")]
    Timeout,
    #[error("Secret command failed with status {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("Secret command returned an empty value")]
    Empty,
}

#[derive(Clone, Default, PartialEq)]
pub enum SecretSource {
    #[default]
    None,
    Static(String),
    /// Executed before each request so rotating tokens stay fresh.
    Command(String),
}

impl std::fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::None => write!(f, "None"),
            SecretSource::Static(_) => write!(f, "Static(***)"),
            SecretSource::Command(cmd) => write!(f, "Command({:?})", cmd),
        }
    }
}

impl SecretSource {
    /// Builds a source from the pair of config fields `*_key` / `*_command`.
    /// A static value wins over a command.
    pub fn from_parts(value: Option<String>, command: Option<String>) -> Self {
        match (value.filter(|v| !v.trim().is_empty()), command) {
            (Some(value), _) => SecretSource::Static(value),
            (None, Some(cmd)) if !cmd.trim().is_empty() => SecretSource::Command(cmd),
            _ => SecretSource::None,
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, SecretSource::None)
    }

    /// Get the current secret, executing the command if necessary.
    pub async fn get(&self) -> Result<Option<String>, CredentialError> {
        match self {
            SecretSource::None => Ok(None),
            SecretSource::Static(value) => Ok(Some(value.clone())),
            SecretSource::Command(cmd) => {
                debug!(command = %cmd, "Fetching secret via command");

                let result = tokio::time::timeout(
                    SECRET_COMMAND_TIMEOUT,
                    Command::new("sh").arg("-c").arg(cmd).output(),
                )
                .await;

                let output = match result {
                    Ok(Ok(output)) => output,
                    Ok(Err(e)) => {
                        warn!(command = %cmd, error = %e, "secret command failed to execute");
                        return Err(CredentialError::Spawn(e.to_string()));
                    }
                    Err(_) => {
                        warn!(command = %cmd, "secret command timed out");
                        return Err(CredentialError::Timeout);
                    }
                };

                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                    warn!(command = %cmd, stderr = %stderr, "secret command failed");
                    return Err(CredentialError::Failed {
                        status: output.status.to_string(),
                        stderr,
                    });
                }

                let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if value.is_empty() {
                    warn!(command = %cmd, "secret command returned empty value");
                    return Err(CredentialError::Empty);
                }

                Ok(Some(value))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_value_wins_over_command() {
        let source = SecretSource::from_parts(Some("abc".into()), Some("echo x".into()));
        assert_eq!(source, SecretSource::Static("abc".into()));

        let source = SecretSource::from_parts(Some("  ".into()), Some("echo x".into()));
        assert_eq!(source, SecretSource::Command("echo x".into()));

        assert!(!SecretSource::from_parts(None, None).is_configured());
    }

    #[test]
    fn debug_hides_static_secret() {
        let printed = format!("{:?}", SecretSource::Static("hunter2".into()));
        assert!(!printed.contains("hunter2"));
    }

    #[tokio::test]
    async fn command_output_is_trimmed() {
        let source = SecretSource::Command("echo '  token-123  '".into());
        assert_eq!(source.get().await.unwrap(), Some("token-123".to_string()));
    }

    #[tokio::test]
    async fn failing_or_empty_command_is_an_error() {
        assert!(matches!(
            SecretSource::Command("exit 3".into()).get().await,
            Err(CredentialError::Failed { .. })
        ));
        assert!(matches!(
            SecretSource::Command("true".into()).get().await,
            Err(CredentialError::Empty)
        ));
    }
}
