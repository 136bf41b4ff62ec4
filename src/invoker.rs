use log::info;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

use crate::config::Config;
use crate::error::DeployError;
use crate::request::DeploymentRequest;
use crate::service::{EnvVar, ProjectId, Region, ServiceName};

const DEFAULT_GCLOUD: &str = "gcloud";
const DELIMITER_CANDIDATES: [char; 6] = ['@', '#', ';', '|', '~', ':'];

#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub gcloud: String,
    pub allow_unauthenticated: bool,
    pub quiet: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            gcloud: DEFAULT_GCLOUD.to_string(),
            allow_unauthenticated: false,
            quiet: false,
        }
    }
}

impl From<&Config> for DeployOptions {
    fn from(config: &Config) -> Self {
        Self {
            gcloud: config
                .gcloud
                .clone()
                .filter(|gcloud| !gcloud.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GCLOUD.to_string()),
            allow_unauthenticated: config.allow_unauthenticated,
            quiet: config.quiet,
        }
    }
}

/// A fully resolved command line. `args` carries secrets; `display_args` is safe to print.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    #[serde(skip)]
    pub args: Vec<String>,
    #[serde(rename = "args")]
    pub display_args: Vec<String>,
    pub service: ServiceName,
    pub project: ProjectId,
    pub region: Region,
}

impl Display for Invocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.display_args {
            if arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Turns a request into the `gcloud run deploy` command line.
pub fn plan(request: &DeploymentRequest, options: &DeployOptions) -> Result<Invocation, DeployError> {
    let delimiter = choose_delimiter(&request.env_vars)?;
    let base = vec![
        "run".to_string(),
        "deploy".to_string(),
        request.service.as_str().to_string(),
        "--source".to_string(),
        request.source.display().to_string(),
        "--project".to_string(),
        request.project_id.as_str().to_string(),
        "--region".to_string(),
        request.region.as_str().to_string(),
        if options.allow_unauthenticated {
            "--allow-unauthenticated".to_string()
        } else {
            "--no-allow-unauthenticated".to_string()
        },
    ];

    let mut args = base.clone();
    let mut display_args = base;
    if options.quiet {
        args.push("--quiet".to_string());
        display_args.push("--quiet".to_string());
    }
    if !request.env_vars.is_empty() {
        args.push("--set-env-vars".to_string());
        args.push(env_vars_arg(&request.env_vars, delimiter, false));
        display_args.push("--set-env-vars".to_string());
        display_args.push(env_vars_arg(&request.env_vars, delimiter, true));
    }

    Ok(Invocation {
        program: options.gcloud.clone(),
        args,
        display_args,
        service: request.service.clone(),
        project: request.project_id.clone(),
        region: request.region.clone(),
    })
}

// gcloud splits --set-env-vars on commas unless the value starts with `^D^`.
fn choose_delimiter(vars: &[EnvVar]) -> Result<Option<char>, DeployError> {
    if !vars.iter().any(|var| var.value.contains(',')) {
        return Ok(None);
    }
    DELIMITER_CANDIDATES
        .into_iter()
        .find(|d| {
            !vars
                .iter()
                .any(|var| var.name.contains(*d) || var.value.contains(*d))
        })
        .map(Some)
        .ok_or(DeployError::NoDelimiter)
}

fn env_vars_arg(vars: &[EnvVar], delimiter: Option<char>, masked: bool) -> String {
    let pairs: Vec<String> = vars
        .iter()
        .map(|var| {
            let value = if masked { var.display_value() } else { var.value.as_str() };
            format!("{}={}", var.name, value)
        })
        .collect();
    match delimiter {
        Some(d) => format!("^{d}^{}", pairs.join(&d.to_string())),
        None => pairs.join(","),
    }
}

/// Runs a planned invocation against the deployment platform.
pub trait Deployer {
    fn deploy(&self, invocation: &Invocation) -> impl Future<Output = Result<(), DeployError>>;
}

/// Spawns the gcloud CLI with inherited stdio, so its diagnostics reach the operator verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct GcloudDeployer;

impl Deployer for GcloudDeployer {
    async fn deploy(&self, invocation: &Invocation) -> Result<(), DeployError> {
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| DeployError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(DeployError::InvocationFailed {
                program: invocation.program.clone(),
                code: exit_code(status),
            })
        }
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// Validates the request, then hands exactly one invocation to `deployer`. No retries.
pub async fn deploy<D: Deployer>(
    deployer: &D,
    request: &DeploymentRequest,
    options: &DeployOptions,
) -> Result<Invocation, DeployError> {
    request.validate()?;
    let invocation = plan(request, options)?;
    info!(
        "deploying {} to project {} in {}",
        request.service.as_str(),
        request.project_id.as_str(),
        request.region.as_str()
    );
    info!("running: {invocation}");
    deployer.deploy(&invocation).await?;
    info!("{} deployed", request.service.as_str());
    Ok(invocation)
}
