use super::config::CanisterConfig;
use super::error::{AgentError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Anything that can hand back the shop canister's raw Candid text.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_shop(&self) -> Result<String>;

    /// Command a user can run by hand when fetching fails.
    fn manual_command(&self) -> String;
}

/// Queries the shop through `dfx canister call`.
pub struct DfxCatalogSource {
    program: String,
    args: Vec<String>,
    strip_marker: String,
    timeout: Duration,
}

impl DfxCatalogSource {
    pub fn new(config: &CanisterConfig) -> Self {
        let (program, args) = config.command_line();
        Self {
            program,
            args,
            strip_marker: config.strip_marker.clone(),
            timeout: config.timeout(),
        }
    }
}

#[async_trait]
impl CatalogSource for DfxCatalogSource {
    async fn fetch_shop(&self) -> Result<String> {
        info!("Running canister query: {}", self.manual_command());

        let mut command = Command::new(&self.program);
        command.args(&self.args).kill_on_drop(true);
        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) if err.kind() == ErrorKind::NotFound => {
                return Err(AgentError::Command(format!(
                    "Command '{}' not found. Make sure it is installed and the configured path is correct.",
                    self.program
                )));
            }
            Ok(Err(err)) => return Err(AgentError::Io(err)),
            Err(_) => {
                return Err(AgentError::Command(format!(
                    "'{}' did not finish within {}s",
                    self.program,
                    self.timeout.as_secs_f32()
                )));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() { stdout } else { stderr };
            return Err(AgentError::Command(format!(
                "dfx command failed ({}): {}",
                output.status, detail
            )));
        }

        debug!(bytes = stdout.len(), "canister query succeeded");
        Ok(strip_marker(&stdout, &self.strip_marker))
    }

    fn manual_command(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Drop everything up to and including the last `marker` occurrence.
pub fn strip_marker(output: &str, marker: &str) -> String {
    if marker.is_empty() {
        return output.trim().to_string();
    }
    match output.rfind(marker) {
        Some(index) => output[index + marker.len()..].trim().to_string(),
        None => output.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_prefix_is_removed() {
        let out = "Decryption complete.\n(record { available = vec {} })";
        assert_eq!(
            strip_marker(out, "Decryption complete."),
            "(record { available = vec {} })"
        );
        assert_eq!(strip_marker("  (record {})  ", "Decryption complete."), "(record {})");
        assert_eq!(strip_marker("Decryption complete. x", ""), "Decryption complete. x");
    }

    #[test]
    fn manual_command_matches_config() {
        let source = DfxCatalogSource::new(&CanisterConfig {
            use_wsl: true,
            canister_id: "uxrrr-q7777-77774-qaaaq-cai".to_string(),
            ..CanisterConfig::default()
        });
        assert_eq!(
            source.manual_command(),
            "wsl dfx canister call uxrrr-q7777-77774-qaaaq-cai getShop"
        );
    }

    #[cfg(unix)]
    fn shell(script: &str, timeout: Duration) -> DfxCatalogSource {
        DfxCatalogSource {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            strip_marker: "Decryption complete.".to_string(),
            timeout,
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdout_is_returned_without_marker() {
        let source = shell(
            "printf 'Decryption complete.\\n(record { available = vec {} })\\n'",
            Duration::from_secs(10),
        );
        assert_eq!(
            source.fetch_shop().await.unwrap(),
            "(record { available = vec {} })"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failure_prefers_stderr() {
        let source = shell("echo partial; echo replica down >&2; exit 3", Duration::from_secs(10));
        let err = source.fetch_shop().await.unwrap_err().to_string();
        assert!(err.contains("replica down"), "{err}");
        assert!(!err.contains("partial"), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failure_falls_back_to_stdout() {
        let source = shell("echo canister not installed; exit 1", Duration::from_secs(10));
        let err = source.fetch_shop().await.unwrap_err().to_string();
        assert!(err.contains("canister not installed"), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_command_times_out() {
        let source = shell("sleep 5", Duration::from_millis(200));
        let err = source.fetch_shop().await.unwrap_err().to_string();
        assert!(err.contains("did not finish"), "{err}");
    }

    #[tokio::test]
    async fn missing_program_reports_not_found() {
        let source = DfxCatalogSource::new(&CanisterConfig {
            dfx_path: "/nonexistent/hq4l/dfx".to_string(),
            ..CanisterConfig::default()
        });
        let err = source.fetch_shop().await.unwrap_err().to_string();
        assert!(err.contains("not found"), "{err}");
    }
}
