use crate::cluster::{MatchPolicy, DEFAULT_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Every job field the scheduler's output-format option accepts, in the
/// column order the dump is requested with.
pub const SCHEDULER_FIELDS: &[&str] = &[
    "jobid", "stat", "user", "queue", "job_description", "job_name",
    "proj_name", "application", "service_class", "job_group",
    "job_priority", "dependency", "command", "pre_exec_command",
    "post_exec_command", "resize_notification_command", "pids",
    "exit_code", "exit_reason", "from_host", "first_host",
    "exec_host", "nexec_host", "submit_time", "start_time",
    "estimated_start_time", "specified_start_time",
    "specified_terminate_time", "time_left", "finish_time",
    "%complete", "warning_action", "action_warning_time",
    "cpu_used", "run_time", "idle_factor", "exception_status",
    "slots", "mem", "max_mem", "avg_mem", "memlimit", "swap",
    "swaplimit", "min_req_proc", "max_req_proc", "effective_resreq",
    "network_req", "filelimit", "corelimit", "stacklimit",
    "processlimit", "input_file", "output_file", "error_file",
    "output_dir", "sub_cwd", "exec_home", "exec_cwd",
    "forward_cluster", "forward_time",
];

/// Largest cell width the scheduler will print. Anything longer is cut off
/// before it reaches us and cannot be detected.
pub const MAX_FIELD_WIDTH: usize = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub delimiter: char,
    pub field_width: usize,
    pub fields: Vec<String>,
    pub command_column: String,
    pub user_column: String,
    pub queue_column: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            delimiter: '|',
            field_width: MAX_FIELD_WIDTH,
            fields: SCHEDULER_FIELDS.iter().map(|f| f.to_string()).collect(),
            command_column: "command".into(),
            user_column: "user".into(),
            queue_column: "queue".into(),
        }
    }
}

impl SchedulerConfig {
    /// The output-format argument that makes the scheduler print a padded
    /// table in `fields` order, e.g. `jobid:4096 stat:4096 delimiter='|'`.
    pub fn output_format(&self) -> String {
        let mut out = String::new();
        for field in &self.fields {
            out.push_str(&format!("{field}:{} ", self.field_width));
        }
        out.push_str(&format!("delimiter='{}'", self.delimiter));
        out
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fields.is_empty() {
            return Err(ConfigError::Invalid("no scheduler fields".into()));
        }
        if self.field_width == 0 {
            return Err(ConfigError::Invalid("field_width must be positive".into()));
        }
        // Cells are trimmed after cutting, so a whitespace delimiter would vanish.
        if self.delimiter.is_whitespace() {
            return Err(ConfigError::Invalid(format!("delimiter {:?} is whitespace", self.delimiter)));
        }
        if let Some(f) = self.fields.iter().find(|f| f.contains(self.delimiter)) {
            return Err(ConfigError::Invalid(format!(
                "delimiter {:?} appears in field name {f:?}",
                self.delimiter
            )));
        }
        for column in [&self.command_column, &self.user_column, &self.queue_column] {
            if !self.fields.contains(column) {
                return Err(ConfigError::Invalid(format!("column {column:?} is not a requested field")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub threshold: f64,
    pub policy: MatchPolicy,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD, policy: MatchPolicy::default() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub scheduler: SchedulerConfig,
    pub clustering: ClusteringConfig,
}

impl MonitorConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler.validate()?;
        let t = self.clustering.threshold;
        if !t.is_finite() || t <= 0.0 {
            return Err(ConfigError::Invalid(format!("threshold must be finite and positive, got {t}")));
        }
        Ok(())
    }
}
