//! # Launcher configuration from the environment.
//!
//! [`Config`] is read once at start-up with [`Envconfig::init_from_env`].
//! Every variable has a default, so an empty environment gives the classic
//! launcher: `cyber` in the current directory, 5s backoff doubling to 120s,
//! 10 starts before a cooldown, 1500 MB memory limit checked every 10s.
//!
//! Sentinels: `MEMORY_LIMIT_MB=0` and `MAX_RESTARTS=0` disable the watchdog
//! and the ceiling; an empty `WEBHOOK_URL` counts as unset.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time;

use envconfig::Envconfig;

use crate::core::SupervisorConfig;
use crate::memory::MemoryScope;
use crate::policies::{BackoffPolicy, JitterPolicy, RestartPolicy};
use crate::updater::UpdateDetection;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub host: IpAddr,

    #[envconfig(from = "PORT", default = "8080")]
    pub port: u16,

    #[envconfig(from = "WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    #[envconfig(from = "REPO_PATH", default = ".")]
    pub repo_path: PathBuf,

    #[envconfig(from = "BOT_COMMAND", default = "cyber")]
    pub bot_command: String,

    #[envconfig(from = "BOT_ARGS", default = "")]
    pub bot_args: String,

    #[envconfig(from = "LOG_DIR", default = "logs")]
    pub log_dir: PathBuf,

    #[envconfig(from = "LOG_FILE", default = "launcher.log")]
    pub log_file: String,

    #[envconfig(from = "MAX_RESTARTS", default = "10")]
    pub max_restarts: u32,

    #[envconfig(from = "RESTART_DELAY_MS", default = "5000")]
    pub restart_delay: EnvMsDuration,

    #[envconfig(from = "MAX_RESTART_DELAY_MS", default = "120000")]
    pub max_restart_delay: EnvMsDuration,

    #[envconfig(from = "BACKOFF_FACTOR", default = "2.0")]
    pub backoff_factor: f64,

    #[envconfig(from = "RESTART_JITTER", default = "none")]
    pub restart_jitter: JitterPolicy,

    #[envconfig(from = "RESTART_POLICY", default = "on-failure")]
    pub restart_policy: RestartPolicy,

    #[envconfig(from = "MEMORY_LIMIT_MB", default = "1500")]
    pub memory_limit_mb: u64,

    #[envconfig(from = "MEMORY_CHECK_INTERVAL_MS", default = "10000")]
    pub memory_check_interval: EnvMsDuration,

    #[envconfig(from = "MEMORY_SCOPE", default = "child")]
    pub memory_scope: MemoryScope,

    #[envconfig(from = "AUTO_UPDATE", default = "true")]
    pub auto_update: bool,

    #[envconfig(from = "UPDATE_DETECTION", default = "marker")]
    pub update_detection: UpdateDetection,

    #[envconfig(from = "UPDATE_TIMEOUT_MS", default = "60000")]
    pub update_timeout: EnvMsDuration,

    #[envconfig(from = "GIT_BINARY", default = "git")]
    pub git_binary: String,

    #[envconfig(from = "ALERT_TIMEOUT_MS", default = "10000")]
    pub alert_timeout: EnvMsDuration,

    #[envconfig(
        from = "BACKUP_FILES",
        default = "appstate.json,config.json,bot_launcher.log"
    )]
    pub backup_files: FileList,

    #[envconfig(from = "STATUS_PAGE", default = "index.html")]
    pub status_page: PathBuf,

    #[envconfig(from = "SHUTDOWN_GRACE_MS", default = "10000")]
    pub shutdown_grace: EnvMsDuration,

    #[envconfig(from = "EXIT_ON_STOP", default = "false")]
    pub exit_on_stop: bool,
}

impl Config {
    /// Address for the health server.
    pub fn bind(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Webhook URL, `None` when unset or blank.
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Worker arguments, split on whitespace.
    pub fn bot_args(&self) -> Vec<String> {
        self.bot_args.split_whitespace().map(String::from).collect()
    }

    /// Status page path; relative paths resolve against `REPO_PATH`.
    pub fn status_page(&self) -> PathBuf {
        self.repo_path.join(&self.status_page)
    }

    /// Full path of the current log file.
    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(&self.log_file)
    }

    /// Supervisor knobs derived from the environment.
    pub fn supervisor(&self) -> SupervisorConfig {
        SupervisorConfig {
            grace: self.shutdown_grace.0,
            max_restarts: self.max_restarts,
            restart: self.restart_policy,
            backoff: BackoffPolicy {
                first: self.restart_delay.0,
                max: self.max_restart_delay.0,
                factor: self.backoff_factor,
                jitter: self.restart_jitter,
            },
            memory_limit: self.memory_limit_mb.saturating_mul(1024 * 1024),
            memory_interval: self.memory_check_interval.0,
            memory_scope: self.memory_scope,
            ..SupervisorConfig::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnvMsDuration(pub time::Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvMsDurationError;

impl FromStr for EnvMsDuration {
    type Err = ParseEnvMsDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms = s.trim().parse::<u64>().map_err(|_| ParseEnvMsDurationError)?;

        Ok(EnvMsDuration(time::Duration::from_millis(ms)))
    }
}

/// Comma separated file names; blanks are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileList(pub Vec<String>);

impl FromStr for FileList {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FileList(
            s.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::init_from_hashmap(&map).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = env(&[]);
        assert_eq!(cfg.bind(), "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cfg.webhook_url(), None);
        assert_eq!(cfg.bot_command, "cyber");
        assert!(cfg.bot_args().is_empty());
        assert!(cfg.auto_update);
        assert!(!cfg.exit_on_stop);
        assert_eq!(cfg.log_path(), PathBuf::from("logs/launcher.log"));
        assert_eq!(cfg.status_page(), PathBuf::from("./index.html"));
        assert_eq!(
            cfg.backup_files.0,
            vec!["appstate.json", "config.json", "bot_launcher.log"]
        );

        let sup = cfg.supervisor();
        assert_eq!(sup.max_restarts, 10);
        assert_eq!(sup.backoff.first, Duration::from_millis(5000));
        assert_eq!(sup.backoff.max, Duration::from_millis(120_000));
        assert_eq!(sup.backoff.factor, 2.0);
        assert_eq!(sup.backoff.jitter, JitterPolicy::None);
        assert_eq!(sup.restart, RestartPolicy::OnFailure);
        assert_eq!(sup.memory_limit, 1500 * 1024 * 1024);
        assert_eq!(sup.memory_interval, Duration::from_secs(10));
        assert_eq!(sup.memory_scope, MemoryScope::Child);
        assert_eq!(sup.grace, Duration::from_secs(10));
        assert!(sup.handle_signals);
    }

    #[test]
    fn test_overrides() {
        let cfg = env(&[
            ("PORT", "9000"),
            ("BIND_HOST", "127.0.0.1"),
            ("WEBHOOK_URL", "http://hooks.local/x"),
            ("BOT_ARGS", "  --name  cyber  "),
            ("RESTART_POLICY", "always"),
            ("RESTART_JITTER", "full"),
            ("MEMORY_LIMIT_MB", "0"),
            ("MEMORY_SCOPE", "launcher"),
            ("UPDATE_DETECTION", "revision"),
            ("BACKUP_FILES", "a.json, ,b.json,"),
            ("REPO_PATH", "/srv/bot"),
            ("STATUS_PAGE", "/var/www/status.html"),
        ]);
        assert_eq!(cfg.bind(), "127.0.0.1:9000".parse().unwrap());
        assert_eq!(cfg.webhook_url(), Some("http://hooks.local/x"));
        assert_eq!(cfg.bot_args(), vec!["--name", "cyber"]);
        assert_eq!(cfg.update_detection, UpdateDetection::Revision);
        assert_eq!(cfg.backup_files.0, vec!["a.json", "b.json"]);
        assert_eq!(cfg.status_page(), PathBuf::from("/var/www/status.html"));

        let sup = cfg.supervisor();
        assert_eq!(sup.restart, RestartPolicy::Always);
        assert_eq!(sup.backoff.jitter, JitterPolicy::Full);
        assert_eq!(sup.memory_watch(), None);
        assert_eq!(sup.memory_scope, MemoryScope::Launcher);
    }

    #[test]
    fn test_blank_webhook_is_unset() {
        assert_eq!(env(&[("WEBHOOK_URL", "")]).webhook_url(), None);
        assert_eq!(env(&[("WEBHOOK_URL", "   ")]).webhook_url(), None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for (key, value) in [
            ("PORT", "http"),
            ("RESTART_DELAY_MS", "5s"),
            ("RESTART_POLICY", "sometimes"),
            ("MEMORY_SCOPE", "host"),
        ] {
            let map = HashMap::from([(key.to_string(), value.to_string())]);
            assert!(Config::init_from_hashmap(&map).is_err(), "{key}={value}");
        }
    }
}
