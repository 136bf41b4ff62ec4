use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// One of the MCP servers this tool knows how to deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Confluence,
    Github,
    Gitlab,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Confluence, Variant::Github, Variant::Gitlab];

    pub fn name(&self) -> &'static str {
        match self {
            Variant::Confluence => "confluence",
            Variant::Github => "github",
            Variant::Gitlab => "gitlab",
        }
    }

    pub fn service_name(&self) -> ServiceName {
        match self {
            Variant::Confluence => ServiceName::new("confluence-mcp-server"),
            Variant::Github => ServiceName::new("github-mcp-server"),
            Variant::Gitlab => ServiceName::new("gitlab-mcp-server"),
        }
    }

    /// Names of the environment variables injected into the running service, in emit order.
    pub fn env_keys(&self) -> &'static [&'static str] {
        match self {
            Variant::Confluence => &["CONFLUENCE_BASE_URL", "CONFLUENCE_PAT"],
            Variant::Github => &["GITHUB_TOKEN"],
            Variant::Gitlab => &["GITLAB_TOKEN", "GITLAB_BASE_URL"],
        }
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown service `{s}`"))
    }
}

#[derive(Serialize, Debug, Clone, Hash, Eq, PartialEq)]
pub struct ServiceName(pub String);

impl ServiceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize, Debug, Clone, Hash, Eq, PartialEq)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize, Debug, Clone, Hash, Eq, PartialEq)]
pub struct Region(pub String);

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single variable injected into the deployed service's environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub name: &'static str,
    pub value: String,
    pub secret: bool,
}

impl EnvVar {
    pub fn plain(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
            secret: false,
        }
    }

    pub fn secret(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
            secret: true,
        }
    }

    /// Value as it may appear in logs.
    pub fn display_value(&self) -> &str {
        if self.secret { "****" } else { &self.value }
    }
}
