#![cfg(unix)]

use mcp_deploy::config::{Config, Github, Gitlab};
use mcp_deploy::service::ProjectId;
use mcp_deploy::{DeployError, DeployOptions, DeploymentRequest, GcloudDeployer, Variant, deploy};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let script = dir.join(name);
    fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

// Records one argument per line, then exits with `code`.
fn write_stub(dir: &Path, name: &str, code: i32) -> PathBuf {
    let record = dir.join(format!("{name}.args"));
    write_script(
        dir,
        name,
        &format!(
            "for arg in \"$@\"; do printf '%s\\n' \"$arg\" >> '{}'; done\necho 'ERROR: (gcloud.run.deploy) stub failure' >&2\nexit {code}",
            record.display()
        ),
    )
}

fn recorded_args(script: &Path) -> Vec<String> {
    let record = script.with_file_name(format!(
        "{}.args",
        script.file_name().unwrap().to_string_lossy()
    ));
    fs::read_to_string(record)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

fn config(source: &Path) -> Config {
    Config {
        project_id: Some("demo".to_string()),
        region: Some("us-central1".to_string()),
        source: Some(source.to_path_buf()),
        github: Some(Github {
            token: Some("ghp_secret".to_string()),
        }),
        gitlab: Some(Gitlab {
            token: Some("glpat-secret".to_string()),
            base_url: Some("https://gitlab.example.com/api/v4/".to_string()),
        }),
        ..Default::default()
    }
}

// Scenarios run sequentially in one test so no other thread forks while a stub is being written.
#[tokio::test]
async fn test_gcloud_stub_invocations() {
    let workdir = tempfile::tempdir().unwrap();
    let source = workdir.path().join("src");
    fs::create_dir(&source).unwrap();

    // success: the tool sees exactly the planned argv
    let ok = write_stub(workdir.path(), "gcloud-ok", 0);
    let options = DeployOptions {
        gcloud: ok.display().to_string(),
        quiet: true,
        ..Default::default()
    };
    let request = DeploymentRequest::from_config(Variant::Gitlab, &config(&source)).unwrap();
    deploy(&GcloudDeployer, &request, &options).await.unwrap();
    assert_eq!(
        recorded_args(&ok),
        vec![
            "run".to_string(),
            "deploy".to_string(),
            "gitlab-mcp-server".to_string(),
            "--source".to_string(),
            source.display().to_string(),
            "--project".to_string(),
            "demo".to_string(),
            "--region".to_string(),
            "us-central1".to_string(),
            "--no-allow-unauthenticated".to_string(),
            "--quiet".to_string(),
            "--set-env-vars".to_string(),
            "GITLAB_TOKEN=glpat-secret,GITLAB_BASE_URL=https://gitlab.example.com/api/v4"
                .to_string(),
        ]
    );

    // failure: the exit code comes back unchanged
    let failing = write_stub(workdir.path(), "gcloud-fail", 3);
    let options = DeployOptions {
        gcloud: failing.display().to_string(),
        ..Default::default()
    };
    let request = DeploymentRequest::from_config(Variant::Github, &config(&source)).unwrap();
    let err = deploy(&GcloudDeployer, &request, &options)
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::InvocationFailed { code: 3, .. }));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(recorded_args(&failing).len(), 12);

    // an empty project never reaches the tool
    let untouched = write_stub(workdir.path(), "gcloud-untouched", 0);
    let options = DeployOptions {
        gcloud: untouched.display().to_string(),
        ..Default::default()
    };
    let mut request = DeploymentRequest::from_config(Variant::Github, &config(&source)).unwrap();
    request.project_id = ProjectId::new("");
    let err = deploy(&GcloudDeployer, &request, &options)
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::MissingSetting(key) if key == "project_id"));
    assert!(recorded_args(&untouched).is_empty());

    // killed by a signal: 128 + SIGKILL
    let killed = write_script(workdir.path(), "gcloud-killed", "kill -9 $$");
    let options = DeployOptions {
        gcloud: killed.display().to_string(),
        ..Default::default()
    };
    let request = DeploymentRequest::from_config(Variant::Github, &config(&source)).unwrap();
    let err = deploy(&GcloudDeployer, &request, &options)
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::InvocationFailed { code: 137, .. }));
    assert_eq!(err.exit_code(), 137);

    // a missing binary is a spawn error
    let options = DeployOptions {
        gcloud: workdir.path().join("no-such-gcloud").display().to_string(),
        ..Default::default()
    };
    let request = DeploymentRequest::from_config(Variant::Github, &config(&source)).unwrap();
    let err = deploy(&GcloudDeployer, &request, &options)
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::Spawn { .. }));
    assert_eq!(err.exit_code(), 127);
}
