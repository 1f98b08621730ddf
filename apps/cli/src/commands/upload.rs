//! `upload` and `batch` commands.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use pushdeck_protocol::{BatchUploadRequest, UploadOutcome, UploadRequest};
use pushdeck_ssh::SshConfig;
use pushdeck_transfer::shell_quote;
use pushdeck_upload::{ConnectionSession, SessionConnector, UploadOptions, UploadOrchestrator};
use tracing::warn;

use super::{Target, TargetArgs};
use crate::config::UploaderConfig;
use crate::render::spawn_renderer;
use crate::session_adapter::SshConnector;

fn connector(target: &Target) -> Arc<dyn SessionConnector> {
    Arc::new(SshConnector::new(SshConfig {
        connect_timeout: target.timeout,
        ..Default::default()
    }))
}

fn options(target: &Target, temp_dir: Option<&Path>) -> UploadOptions {
    let mut options = UploadOptions {
        connect_timeout: target.timeout,
        ..Default::default()
    };
    if let Some(dir) = temp_dir {
        options = options.with_temp_dir(dir);
    }
    options
}

/// `upload <local>`: one file or directory.
pub async fn upload(
    local: &Path,
    list: bool,
    args: &TargetArgs,
    config: &mut UploaderConfig,
    config_path: &Path,
) -> anyhow::Result<ExitCode> {
    let target = args.resolve(config)?;
    let connector = connector(&target);
    let request = UploadRequest {
        local_path: local.to_string_lossy().into_owned(),
        remote_path: target.remote_path.clone(),
        credentials: target.credentials.clone(),
    };

    let mut orchestrator = UploadOrchestrator::new(Arc::clone(&connector), options(&target, None));
    let renderer = orchestrator.take_events().map(spawn_renderer);
    let outcome = orchestrator.estimate_and_upload(&request).await;
    drop(orchestrator);
    if let Some(handle) = renderer {
        let _ = handle.await;
    }

    let code = finish(&outcome, args, &target, config, config_path);
    if outcome.success && list {
        print_listing(connector.as_ref(), &target).await;
    }
    Ok(code)
}

/// `batch <folders>...`: archive and upload each folder.
pub async fn batch(
    folders: &[PathBuf],
    temp_dir: Option<&Path>,
    args: &TargetArgs,
    config: &mut UploaderConfig,
    config_path: &Path,
) -> anyhow::Result<ExitCode> {
    let target = args.resolve(config)?;
    let request = BatchUploadRequest {
        folder_paths: folders
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect(),
        remote_path: target.remote_path.clone(),
        credentials: target.credentials.clone(),
    };

    let mut orchestrator = UploadOrchestrator::new(connector(&target), options(&target, temp_dir));
    let renderer = orchestrator.take_events().map(spawn_renderer);
    let outcome = orchestrator.upload_batch_archived(&request).await;
    drop(orchestrator);
    if let Some(handle) = renderer {
        let _ = handle.await;
    }

    Ok(finish(&outcome, args, &target, config, config_path))
}

/// Prints the outcome and remembers the target after a success.
fn finish(
    outcome: &UploadOutcome,
    args: &TargetArgs,
    target: &Target,
    config: &mut UploaderConfig,
    config_path: &Path,
) -> ExitCode {
    if !outcome.success {
        eprintln!("error: {}", outcome.message);
        return ExitCode::FAILURE;
    }
    println!("{}", outcome.message);

    let password = args
        .remember_password
        .then_some(target.credentials.password.as_str());
    config.remember_upload(
        &target.credentials.host,
        &target.credentials.username,
        password,
        &target.remote_path,
    );
    if let Err(e) = config.save_to(config_path) {
        warn!(error = %e, "cannot record last upload target");
    }
    ExitCode::SUCCESS
}

/// Lists the remote directory on a fresh session.
async fn print_listing(connector: &dyn SessionConnector, target: &Target) {
    let session =
        match ConnectionSession::connect(connector, &target.credentials, target.timeout).await {
            Ok(s) => s,
            Err(e) => {
                eprintln!("cannot list {}: {e}", target.remote_path);
                return;
            }
        };
    let command = format!("ls -la {}", shell_quote(&target.remote_path));
    match session.exec(&command).await {
        Ok(output) if output.success() => print!("{}", output.stdout),
        Ok(output) => eprintln!("ls failed: {}", output.stderr.trim()),
        Err(e) => eprintln!("cannot list {}: {e}", target.remote_path),
    }
    session.dispose().await;
}
