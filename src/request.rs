use log::debug;
use std::collections::BTreeSet;
use std::path::PathBuf;
use url::Url;

use crate::config::Config;
use crate::error::DeployError;
use crate::service::{EnvVar, ProjectId, Region, ServiceName, Variant};

pub const DEFAULT_GITLAB_BASE_URL: &str = "https://code.lioncloud.net/api/v4";

/// Everything one `run deploy` call needs. Built per run and dropped after the call returns.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub variant: Variant,
    pub project_id: ProjectId,
    pub region: Region,
    pub service: ServiceName,
    pub source: PathBuf,
    pub env_vars: Vec<EnvVar>,
}

impl DeploymentRequest {
    /// Collects the variant's settings from `config`.
    ///
    /// Project and region are checked first, then the service settings. The same checks run
    /// again in [`DeploymentRequest::validate`] before every deployment.
    pub fn from_config(variant: Variant, config: &Config) -> Result<Self, DeployError> {
        let project_id = config.project_id.clone().unwrap_or_default();
        let region = config.region.clone().unwrap_or_default();
        check_identifier("project_id", &project_id)?;
        check_identifier("region", &region)?;

        let env_vars = match variant {
            Variant::Confluence => {
                let section = config.confluence.clone().unwrap_or_default();
                let base_url = required("confluence.base_url", section.base_url)?;
                vec![
                    EnvVar::plain(
                        "CONFLUENCE_BASE_URL",
                        normalize_url("confluence.base_url", &base_url)?,
                    ),
                    EnvVar::secret("CONFLUENCE_PAT", required("confluence.pat", section.pat)?),
                ]
            }
            Variant::Github => {
                let section = config.github.clone().unwrap_or_default();
                vec![EnvVar::secret(
                    "GITHUB_TOKEN",
                    required("github.token", section.token)?,
                )]
            }
            Variant::Gitlab => {
                let section = config.gitlab.clone().unwrap_or_default();
                let base_url = section
                    .base_url
                    .filter(|url| !url.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_GITLAB_BASE_URL.to_string());
                vec![
                    EnvVar::secret("GITLAB_TOKEN", required("gitlab.token", section.token)?),
                    EnvVar::plain(
                        "GITLAB_BASE_URL",
                        normalize_url("gitlab.base_url", &base_url)?,
                    ),
                ]
            }
        };

        let request = Self {
            variant,
            project_id: ProjectId::new(project_id),
            region: Region::new(region),
            service: variant.service_name(),
            source: config.source.clone().unwrap_or_else(|| PathBuf::from(".")),
            env_vars,
        };
        debug!("built request: {:?}", request.redacted());
        Ok(request)
    }

    /// Local preconditions, checked before anything is spawned.
    pub fn validate(&self) -> Result<(), DeployError> {
        check_identifier("project_id", self.project_id.as_str())?;
        check_identifier("region", self.region.as_str())?;

        let expected: BTreeSet<&str> = self.variant.env_keys().iter().copied().collect();
        let actual: BTreeSet<&str> = self.env_vars.iter().map(|var| var.name).collect();
        if expected != actual || actual.len() != self.env_vars.len() {
            return Err(DeployError::InvalidSetting {
                key: "env_vars".to_string(),
                reason: format!(
                    "{} expects exactly {:?}, got {:?}",
                    self.service.as_str(),
                    self.variant.env_keys(),
                    self.env_vars.iter().map(|var| var.name).collect::<Vec<_>>()
                ),
            });
        }
        if let Some(var) = self.env_vars.iter().find(|var| var.value.trim().is_empty()) {
            return Err(DeployError::MissingSetting(var.name.to_string()));
        }

        if !self.source.is_dir() {
            return Err(DeployError::SourceNotFound(self.source.clone()));
        }
        Ok(())
    }

    fn redacted(&self) -> Vec<(&str, &str)> {
        self.env_vars
            .iter()
            .map(|var| (var.name, var.display_value()))
            .collect()
    }
}

fn required(key: &str, value: Option<String>) -> Result<String, DeployError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(DeployError::MissingSetting(key.to_string())),
    }
}

fn check_identifier(key: &str, value: &str) -> Result<(), DeployError> {
    if value.is_empty() {
        return Err(DeployError::MissingSetting(key.to_string()));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(DeployError::InvalidSetting {
            key: key.to_string(),
            reason: format!("`{value}` contains whitespace"),
        });
    }
    Ok(())
}

// The servers append their API paths to the base URL, so a trailing slash is dropped.
fn normalize_url(key: &str, raw: &str) -> Result<String, DeployError> {
    let invalid = |reason: String| DeployError::InvalidSetting {
        key: key.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(format!("`{raw}`: {e}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!("`{raw}` is not an http(s) URL")));
    }
    Ok(raw.trim().trim_end_matches('/').to_string())
}
