use clap::{Arg, ArgAction, ArgMatches, Command};
use mcp_deploy::Variant;
use mcp_deploy::config::{Config, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;

pub struct Cli {
    pub variant: Variant,
    pub config: PathBuf,
    pub project: Option<String>,
    pub region: Option<String>,
    pub source: Option<PathBuf>,
    pub gcloud: Option<String>,
    pub dry_run: bool,
    pub json: bool,
}

impl Cli {
    /// Command line values win over the config file and environment.
    pub(crate) fn apply(&self, config: &mut Config) {
        if let Some(project) = &self.project {
            config.project_id = Some(project.clone());
        }
        if let Some(region) = &self.region {
            config.region = Some(region.clone());
        }
        if let Some(source) = &self.source {
            config.source = Some(source.clone());
        }
        if let Some(gcloud) = &self.gcloud {
            config.gcloud = Some(gcloud.clone());
        }
    }
}

impl From<ArgMatches> for Cli {
    fn from(matches: ArgMatches) -> Self {
        Cli {
            variant: *matches
                .get_one::<Variant>("variant")
                .unwrap_or(&Variant::Confluence),
            config: matches
                .get_one::<PathBuf>("config")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
            project: matches.get_one::<String>("project").cloned(),
            region: matches.get_one::<String>("region").cloned(),
            source: matches.get_one::<PathBuf>("source").cloned(),
            gcloud: matches.get_one::<String>("gcloud").cloned(),
            dry_run: matches.get_flag("dry_run"),
            json: matches.get_flag("json"),
        }
    }
}

fn command() -> Command {
    Command::new("mcp-deploy")
        .version(env!("CARGO_PKG_VERSION"))
        .about("deploy the confluence, github and gitlab MCP servers to Cloud Run")
        .arg(
            Arg::new("variant")
                .value_name("SERVICE")
                .help("service to deploy: confluence, github or gitlab")
                .required(true)
                .value_parser(|s: &str| s.parse::<Variant>()),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help(format!("config file (default: {DEFAULT_CONFIG_FILE})"))
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("project")
                .short('p')
                .long("project")
                .value_name("PROJECT_ID")
                .help("cloud project to deploy into"),
        )
        .arg(
            Arg::new("region")
                .short('r')
                .long("region")
                .value_name("REGION")
                .help("region to deploy into, e.g. us-central1"),
        )
        .arg(
            Arg::new("source")
                .short('s')
                .long("source")
                .value_name("DIR")
                .help("source directory to build (default: .)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("gcloud")
                .long("gcloud")
                .value_name("PATH")
                .help("gcloud binary to invoke (default: gcloud)"),
        )
        .arg(
            Arg::new("dry_run")
                .long("dry-run")
                .help("print the command instead of running it, secrets masked")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("print the dry run as JSON")
                .requires("dry_run")
                .action(ArgAction::SetTrue),
        )
}

pub(crate) fn configure_cli() -> Cli {
    command().get_matches().into()
}
