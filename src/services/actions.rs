//! Script actions run on committed transitions

use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::DispatchError;

/// Fire-and-forget runner for a configured action reference
pub trait ActionInvoker: Send + Sync {
    fn invoke(&self, action: &str) -> Result<(), DispatchError>;
}

/// Runs actions as executables from a scripts directory.
///
/// A reference of `script.arm_lights` (or plain `arm_lights`) resolves to
/// `<scripts_dir>/arm_lights`.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    scripts_dir: PathBuf,
}

impl ScriptRunner {
    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
        }
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    /// Resolve an action reference to the executable it names
    pub fn resolve(&self, action: &str) -> Result<PathBuf, DispatchError> {
        let name = action.strip_prefix("script.").unwrap_or(action);
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return Err(DispatchError::InvalidReference(action.to_string()));
        }
        Ok(self.scripts_dir.join(name))
    }
}

impl ActionInvoker for ScriptRunner {
    fn invoke(&self, action: &str) -> Result<(), DispatchError> {
        let path = self.resolve(action)?;
        debug!("Running action {} from {}", action, path.display());

        let mut child = Command::new(&path)
            .spawn()
            .map_err(|e| DispatchError::Spawn {
                target: action.to_string(),
                reason: e.to_string(),
            })?;

        let action = action.to_string();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => info!("Action {} completed", action),
                Ok(status) => warn!(
                    "Action {} exited with code {}",
                    action,
                    status.code().unwrap_or(-1)
                ),
                Err(e) => warn!("Failed to wait for action {}: {}", action, e),
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_script_prefixed_references() {
        let runner = ScriptRunner::new("/opt/alarm/scripts");
        assert_eq!(
            runner.resolve("script.arm_lights").unwrap(),
            PathBuf::from("/opt/alarm/scripts/arm_lights")
        );
        assert_eq!(
            runner.resolve("siren_off").unwrap(),
            PathBuf::from("/opt/alarm/scripts/siren_off")
        );
    }

    #[test]
    fn rejects_references_escaping_the_directory() {
        let runner = ScriptRunner::new("/opt/alarm/scripts");
        assert!(matches!(
            runner.resolve("script.../bin/sh"),
            Err(DispatchError::InvalidReference(_))
        ));
        assert!(runner.resolve("script.").is_err());
    }

    #[tokio::test]
    async fn missing_script_is_reported() {
        let runner = ScriptRunner::new("/nonexistent/synthetic-alarm-scripts");
        let err = runner.invoke("script.arm_home").unwrap_err();
        assert!(matches!(err, DispatchError::Spawn { .. }));
    }
}
