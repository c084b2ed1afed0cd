//! Build state and outcome models.

use serde::Serialize;

/// State of the build slot, derived on demand from the liveness marker.
///
/// Never stored: every call to the lock probe recomputes it from the
/// filesystem and a signal-0 probe of the recorded process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildState {
    /// No marker file.
    Idle,
    /// Marker names a live process.
    Running { pid: u32 },
    /// Marker names a process that no longer exists.
    #[serde(rename = "stale_lock")]
    Stale { pid: u32 },
    /// Marker exists but could not be read or parsed.
    Error { message: String },
}

impl BuildState {
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    pub const fn pid(&self) -> Option<u32> {
        match self {
            Self::Running { pid } | Self::Stale { pid } => Some(*pid),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running { .. } => "running",
            Self::Stale { .. } => "stale_lock",
            Self::Error { .. } => "error",
        }
    }
}

/// How a build invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Succeeded,
    Failed { code: i32 },
    Terminated { signal: i32 },
    /// The script could not be launched or its output could not be read.
    Errored { message: String },
}

impl BuildOutcome {
    /// Text of the terminal marker line written to the build log.
    pub fn describe(&self) -> String {
        match self {
            Self::Succeeded => "Build completed successfully".to_string(),
            Self::Failed { code } => format!("Build failed with exit code {code}"),
            Self::Terminated { signal } => format!("Build terminated by signal {signal}"),
            Self::Errored { message } => format!("Build error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_state_serialization() {
        let json = serde_json::to_value(BuildState::Idle).unwrap();
        assert_eq!(json, serde_json::json!({"status": "idle"}));

        let json = serde_json::to_value(BuildState::Running { pid: 12 }).unwrap();
        assert_eq!(json, serde_json::json!({"status": "running", "pid": 12}));

        let json = serde_json::to_value(BuildState::Stale { pid: 9 }).unwrap();
        assert_eq!(json, serde_json::json!({"status": "stale_lock", "pid": 9}));

        let json = serde_json::to_value(BuildState::Error {
            message: "bad pid".into(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "error", "message": "bad pid"})
        );
    }

    #[test]
    fn test_outcome_descriptions() {
        assert_eq!(
            BuildOutcome::Failed { code: 3 }.describe(),
            "Build failed with exit code 3"
        );
        assert_eq!(
            BuildOutcome::Succeeded.describe(),
            "Build completed successfully"
        );
        assert!(BuildOutcome::Errored {
            message: "no such file".into()
        }
        .describe()
        .starts_with("Build error:"));
    }
}
