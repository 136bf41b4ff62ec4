//! Deploy one MCP server to Cloud Run
mod cli;

use crate::cli::{Cli, configure_cli};
use env_logger::Env;
use log::{debug, error};
use mcp_deploy::config::load_config;
use mcp_deploy::{DeployError, DeployOptions, DeploymentRequest, GcloudDeployer, deploy, plan};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = configure_cli();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<(), DeployError> {
    let mut config = load_config(&cli.config)?;
    debug!("loaded configuration from {}", cli.config.display());
    cli.apply(&mut config);

    let request = DeploymentRequest::from_config(cli.variant, &config)?;
    let options = DeployOptions::from(&config);

    if cli.dry_run {
        request.validate()?;
        let invocation = plan(&request, &options)?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&invocation)?);
        } else {
            println!("{invocation}");
        }
        return Ok(());
    }

    deploy(&GcloudDeployer, &request, &options).await?;
    Ok(())
}
