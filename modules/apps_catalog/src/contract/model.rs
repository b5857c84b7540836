use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Container runtime an app version launches with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Runtime {
    Docker,
    Singularity,
    Zip,
}

impl Runtime {
    pub const ALL: &'static [&'static str] = &["DOCKER", "SINGULARITY", "ZIP"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Docker => "DOCKER",
            Self::Singularity => "SINGULARITY",
            Self::Zip => "ZIP",
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Runtime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DOCKER" => Ok(Self::Docker),
            "SINGULARITY" => Ok(Self::Singularity),
            "ZIP" => Ok(Self::Zip),
            other => Err(format!("unknown runtime: {other}")),
        }
    }
}

/// How the job scheduler runs an app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    Batch,
    Fork,
}

impl JobType {
    pub const ALL: &'static [&'static str] = &["BATCH", "FORK"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Batch => "BATCH",
            Self::Fork => "FORK",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BATCH" => Ok(Self::Batch),
            "FORK" => Ok(Self::Fork),
            other => Err(format!("unknown job type: {other}")),
        }
    }
}

/// One version of an app joined with its identity row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub tenant: String,
    pub id: String,
    pub version: String,
    pub latest_version: String,
    pub owner: String,
    pub enabled: bool,
    pub deleted: bool,
    pub description: Option<String>,
    pub runtime: Runtime,
    pub runtime_version: Option<String>,
    pub job_type: JobType,
    pub max_jobs: i64,
    pub max_jobs_per_user: i64,
    pub strict_file_inputs: bool,
    pub tags: Vec<String>,
    pub uuid: Uuid,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl App {
    pub fn is_latest(&self) -> bool {
        self.version == self.latest_version
    }

    /// Text form of a searchable attribute, as a client would pass it back
    /// in `startAfter`. Arrays have no single sort value.
    pub fn attribute_text(&self, attribute: &str) -> Option<String> {
        let text = match attribute {
            "id" => self.id.clone(),
            "owner" => self.owner.clone(),
            "enabled" => self.enabled.to_string(),
            "deleted" => self.deleted.to_string(),
            "latest_version" => self.latest_version.clone(),
            "version" => self.version.clone(),
            "description" => self.description.clone()?,
            "runtime" => self.runtime.to_string(),
            "runtime_version" => self.runtime_version.clone()?,
            "job_type" => self.job_type.to_string(),
            "max_jobs" => self.max_jobs.to_string(),
            "max_jobs_per_user" => self.max_jobs_per_user.to_string(),
            "strict_file_inputs" => self.strict_file_inputs.to_string(),
            "uuid" => self.uuid.to_string(),
            "created" => self.created.to_rfc3339(),
            "updated" => self.updated.to_rfc3339(),
            _ => return None,
        };
        Some(text)
    }
}

/// Attributes of a new version; identity comes from the caller or the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppVersion {
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    pub runtime: Runtime,
    #[serde(default)]
    pub runtime_version: Option<String>,
    pub job_type: JobType,
    #[serde(default)]
    pub max_jobs: i64,
    #[serde(default)]
    pub max_jobs_per_user: i64,
    #[serde(default)]
    pub strict_file_inputs: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewAppVersion {
    pub fn new(version: impl Into<String>, runtime: Runtime, job_type: JobType) -> Self {
        Self {
            version: version.into(),
            description: None,
            runtime,
            runtime_version: None,
            job_type,
            max_jobs: 0,
            max_jobs_per_user: 0,
            strict_file_inputs: false,
            tags: Vec::new(),
        }
    }
}

/// A new app: identity row plus its first version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApp {
    pub id: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(flatten)]
    pub version: NewAppVersion,
}

fn enabled_by_default() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("docker".parse::<Runtime>().unwrap(), Runtime::Docker);
        assert_eq!("Fork".parse::<JobType>().unwrap(), JobType::Fork);
        assert!("podman".parse::<Runtime>().is_err());
    }

    #[test]
    fn enum_tables_match_display() {
        for (s, r) in Runtime::ALL
            .iter()
            .zip([Runtime::Docker, Runtime::Singularity, Runtime::Zip])
        {
            assert_eq!(*s, r.as_str());
        }
        for (s, j) in JobType::ALL.iter().zip([JobType::Batch, JobType::Fork]) {
            assert_eq!(*s, j.as_str());
        }
    }

    #[test]
    fn new_app_reads_flattened_version() {
        let app: NewApp = serde_json::from_str(
            r#"{"id":"sleep","version":"1.0","runtime":"DOCKER","jobType":"BATCH","tags":["demo"]}"#,
        )
        .unwrap();
        assert!(app.enabled);
        assert_eq!(app.version.version, "1.0");
        assert_eq!(app.version.tags, vec!["demo"]);
    }
}
