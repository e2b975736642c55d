//! CLI configuration
//!
//! The project file (`kiln.json`) and the log settings derived from it.

use kiln_api::{CpuConfig, LimitConfig, LogLevel, RunConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::Level;

/// Contents of `kiln.json`
#[derive(Debug, Deserialize)]
pub struct Project {
    /// Compiled program, relative to the project file
    pub entry: String,
    #[serde(default)]
    pub cpu: CpuConfig,
    #[serde(default)]
    pub limits: LimitConfig,
    pub log_level: Option<LogLevel>,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Also append runtime records to this file, relative to the project file
    pub log_file: Option<String>,
    #[serde(default)]
    pub host: HostClock,
    /// Log the program listing before running it
    #[serde(default)]
    pub dump_program: bool,
    /// Keys typed into the console, one per tick
    #[serde(default)]
    pub input: String,
}

/// Simulated host clock
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HostClock {
    pub fixed_delta: f64,
    pub frame_delta: f64,
    pub max_ticks: u64,
}

impl Default for HostClock {
    fn default() -> Self {
        let run = RunConfig::default();
        Self {
            fixed_delta: run.fixed_delta,
            frame_delta: run.frame_delta,
            max_ticks: run.max_ticks,
        }
    }
}

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Colored multi-line output
    Pretty,
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

/// CLI log configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level of the runtime's own records
    pub runtime: Level,
    /// Level of CLI events; never quieter than info
    pub cli: Level,
    pub format: LogFormat,
    /// Runtime log file, already resolved
    pub file: Option<PathBuf>,
}

impl LogConfig {
    pub fn from_project(project: &Project, project_path: &Path) -> Self {
        let runtime = project.log_level.map_or(Level::WARN, to_tracing_level);
        Self {
            runtime,
            cli: runtime.max(Level::INFO),
            format: project.log_format,
            file: project.log_file.as_deref().map(|file| Project::resolve(project_path, file)),
        }
    }
}

impl Project {
    pub fn read(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Err(format!(
                "'{}' not found\n\nThis directory is not a Kiln project.\nHint: create '{}' with an 'entry' field",
                path.display(),
                path.display()
            ));
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
        let project: Project =
            serde_json::from_str(&content).map_err(|e| format!("failed to parse '{}': {}", path.display(), e))?;

        if project.entry.is_empty() {
            return Err(format!("'entry' in '{}' must not be empty", path.display()));
        }
        Ok(project)
    }

    /// Resolve `file` relative to the project file's directory
    pub fn resolve(project_path: &Path, file: &str) -> PathBuf {
        let base_dir = project_path.parent().unwrap_or(Path::new("."));
        base_dir.join(file)
    }
}

fn to_tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}

pub fn to_log_level(level: Level) -> kiln_log::Level {
    if level == Level::TRACE {
        kiln_log::Level::Trace
    } else if level == Level::DEBUG {
        kiln_log::Level::Debug
    } else if level == Level::INFO {
        kiln_log::Level::Info
    } else if level == Level::WARN {
        kiln_log::Level::Warn
    } else {
        kiln_log::Level::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_project() {
        let project: Project = serde_json::from_str(r#"{ "entry": "boot.json" }"#).unwrap();
        assert_eq!(project.cpu, CpuConfig::default());
        assert_eq!(project.host.fixed_delta, 0.02);
        assert_eq!(project.log_format, LogFormat::Compact);
        assert!(project.input.is_empty());
    }

    #[test]
    fn test_overrides() {
        let project: Project = serde_json::from_str(
            r#"{
                "entry": "boot.json",
                "cpu": { "instructions_per_update": 10 },
                "host": { "max_ticks": 3 },
                "log_level": "debug",
                "log_format": "json",
                "log_file": "logs/run.log"
            }"#,
        )
        .unwrap();
        assert_eq!(project.cpu.instructions_per_update, 10);
        assert_eq!(project.cpu.trigger_instruction_budget, 200);
        assert_eq!(project.host.max_ticks, 3);

        let log = LogConfig::from_project(&project, Path::new("games/pong/kiln.json"));
        assert_eq!(log.runtime, Level::DEBUG);
        assert_eq!(log.cli, Level::DEBUG);
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.file.as_deref(), Some(Path::new("games/pong/logs/run.log")));
    }

    #[test]
    fn test_default_log_levels() {
        let project: Project = serde_json::from_str(r#"{ "entry": "boot.json" }"#).unwrap();
        let log = LogConfig::from_project(&project, Path::new("kiln.json"));
        assert!(log.file.is_none());
        assert_eq!(log.runtime, Level::WARN);
        assert_eq!(log.cli, Level::INFO);
        assert_eq!(to_log_level(log.runtime), kiln_log::Level::Warn);
    }

    #[test]
    fn test_resolve_is_relative_to_project() {
        let path = Project::resolve(Path::new("games/pong/kiln.json"), "boot.json");
        assert_eq!(path, Path::new("games/pong/boot.json"));
    }
}
