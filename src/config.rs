use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::DeployError;
use figment2::{
    Figment,
    providers::{Env, Format, Toml},
    value::Uncased,
};

pub const DEFAULT_CONFIG_FILE: &str = "mcp-deploy.toml";
pub const ENV_PREFIX: &str = "MCP_DEPLOY_";

/// The variable names the deployed servers read themselves, accepted as-is from the operator's shell.
const SERVICE_ENV: [(&str, &str); 5] = [
    ("CONFLUENCE_BASE_URL", "confluence.base_url"),
    ("CONFLUENCE_PAT", "confluence.pat"),
    ("GITHUB_TOKEN", "github.token"),
    ("GITLAB_TOKEN", "gitlab.token"),
    ("GITLAB_BASE_URL", "gitlab.base_url"),
];

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Confluence {
    #[serde(default, deserialize_with = "scalar_string")]
    pub base_url: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub pat: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Github {
    #[serde(default, deserialize_with = "scalar_string")]
    pub token: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Gitlab {
    #[serde(default, deserialize_with = "scalar_string")]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub base_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default, deserialize_with = "scalar_string")]
    pub project_id: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "scalar_path")]
    pub source: Option<PathBuf>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub gcloud: Option<String>,
    #[serde(default)]
    pub allow_unauthenticated: bool,
    #[serde(default)]
    pub quiet: bool,
    pub confluence: Option<Confluence>,
    pub github: Option<Github>,
    pub gitlab: Option<Gitlab>,
}

// Env values arrive typed, so a project number or an all-digit token shows up as an integer.
struct ScalarString;

impl<'de> Visitor<'de> for ScalarString {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string or a number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(ScalarString)
    }
}

fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    deserializer.deserialize_any(ScalarString)
}

fn scalar_path<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<PathBuf>, D::Error> {
    Ok(scalar_string(deserializer)?.map(PathBuf::from))
}

/// Layers the TOML file, the services' own variable names and `MCP_DEPLOY_*` variables, later wins.
pub fn load_config(config_path: &Path) -> Result<Config, DeployError> {
    let config: Config = Figment::new()
        .merge(Toml::file(config_path))
        .merge(Env::raw().filter_map(|key| {
            SERVICE_ENV
                .iter()
                .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
                .map(|(_, path)| Uncased::from(*path))
        }))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    Ok(config)
}
