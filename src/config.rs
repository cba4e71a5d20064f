use std::path::PathBuf;

/// Environment variable naming the workflow log directory override.
pub const ENV_WORKFLOW_DIR: &str = "WORKFLOW_DIR";
/// Environment variable gating checkpoint/summary production.
pub const ENV_LOG_ENABLED: &str = "WARPIO_LOG";
/// Environment variable overriding the session artifact root.
pub const ENV_LOG_ROOT: &str = "WARPIO_LOG_DIR";
/// Environment variable carrying the session id when the envelope omits it.
pub const ENV_SESSION_ID: &str = "CLAUDE_SESSION_ID";
/// Environment variable carrying the version label used in artifacts.
pub const ENV_VERSION: &str = "WARPIO_VERSION";

/// Per-invocation configuration, read from the environment exactly once and
/// threaded as an argument. Each hook invocation is a fresh process, so there
/// is no cross-call state to cache.
#[derive(Debug, Clone)]
pub struct HookConfig {
    /// Workflow log directory override (`WORKFLOW_DIR`).
    pub workflow_dir: Option<PathBuf>,
    /// Root for session-scoped artifacts (`WARPIO_LOG_DIR`, default `.warpio-logs`).
    pub log_root: PathBuf,
    /// Checkpoint/summary gate (`WARPIO_LOG` set to a non-empty value).
    pub logging_enabled: bool,
    /// Session label fallback (`CLAUDE_SESSION_ID`).
    pub session_id: Option<String>,
    /// Version label for artifact attribution (`WARPIO_VERSION`).
    pub version: String,
    /// Invoking user's home directory, for the fallback log location.
    pub home_dir: Option<PathBuf>,
    /// Working directory captured at invocation.
    pub working_dir: PathBuf,
}

impl HookConfig {
    /// Reads configuration from the process environment.
    ///
    /// Never fails: missing or unreadable variables fall back to defaults so
    /// that a misconfigured environment cannot break a hook invocation.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        Self {
            workflow_dir: non_empty(ENV_WORKFLOW_DIR).map(PathBuf::from),
            log_root: non_empty(ENV_LOG_ROOT)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".warpio-logs")),
            logging_enabled: non_empty(ENV_LOG_ENABLED).is_some(),
            session_id: non_empty(ENV_SESSION_ID),
            version: non_empty(ENV_VERSION).unwrap_or_else(|| "1.0.0".to_string()),
            home_dir: non_empty("HOME").map(PathBuf::from),
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Session label for log records: the given id when present, else the
    /// environment passthrough, else `"unknown"`.
    pub fn session_label(&self, envelope_session_id: &str) -> String {
        if !envelope_session_id.is_empty() {
            return envelope_session_id.to_string();
        }
        self.session_id
            .clone()
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Session-scoped artifact directory under the log root.
    ///
    /// Named from the session id when one is known, so every hook of a
    /// session lands in the same directory; an anonymous session falls back
    /// to the invocation timestamp.
    pub fn session_dir(
        &self,
        envelope_session_id: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> PathBuf {
        let label = if !envelope_session_id.is_empty() {
            envelope_session_id.to_string()
        } else if let Some(id) = &self.session_id {
            id.clone()
        } else {
            now.format("%Y%m%d-%H%M%S").to_string()
        };
        self.log_root.join(format!("session-{label}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> HookConfig {
        HookConfig {
            workflow_dir: None,
            log_root: PathBuf::from(".warpio-logs"),
            logging_enabled: false,
            session_id: None,
            version: "1.0.0".to_string(),
            home_dir: None,
            working_dir: PathBuf::from("/tmp"),
        }
    }

    #[test]
    fn session_label_prefers_envelope_id() {
        let mut config = test_config();
        config.session_id = Some("env-session".to_string());
        assert_eq!(config.session_label("envelope-session"), "envelope-session");
    }

    #[test]
    fn session_label_falls_back_to_environment() {
        let mut config = test_config();
        config.session_id = Some("env-session".to_string());
        assert_eq!(config.session_label(""), "env-session");
    }

    #[test]
    fn session_label_defaults_to_unknown() {
        let config = test_config();
        assert_eq!(config.session_label(""), "unknown");
    }

    #[test]
    fn session_dir_is_deterministic_for_a_known_session() {
        let config = test_config();
        let now = chrono::Utc::now();
        let later = now + chrono::Duration::seconds(90);
        assert_eq!(config.session_dir("s-1", now), config.session_dir("s-1", later));
        assert!(config
            .session_dir("s-1", now)
            .ends_with("session-s-1"));
    }

    #[test]
    fn session_dir_falls_back_to_timestamp_when_anonymous() {
        let config = test_config();
        let now: chrono::DateTime<chrono::Utc> = "2026-08-23T10:30:00Z".parse().unwrap();
        assert!(config
            .session_dir("", now)
            .ends_with("session-20260823-103000"));
    }

    #[test]
    fn from_env_produces_usable_defaults() {
        // Whatever the ambient environment, from_env must not panic and must
        // yield a non-empty version and log root.
        let config = HookConfig::from_env();
        assert!(!config.version.is_empty());
        assert!(!config.log_root.as_os_str().is_empty());
    }
}
