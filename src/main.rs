use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;

mod cli;
mod config;
mod credentials;
mod error;
#[cfg(test)]
mod fakes;
mod http;
mod logging;
mod poller;
mod publisher;
mod store;
mod util;
mod workflow;

use cli::{Command, RootArgs, RunOverrides};
use config::Settings;
use error::RunError;
use http::{build_agent, REQUEST_TIMEOUT};
use poller::ThreadSleeper;
use publisher::GraphPublisher;
use store::{DriveStore, MediaStore};
use workflow::{PublishWorkflow, RunOutcome, RunPlan};

fn main() -> ExitCode {
    let args = RootArgs::parse();
    logging::init(args.verbose);

    match dispatch(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // RunError messages already embed their cause.
            match err.downcast_ref::<RunError>() {
                Some(run_err) => eprintln!("error: {run_err}"),
                None => eprintln!("error: {err:#}"),
            }
            exit_code_for(&err)
        }
    }
}

fn dispatch(args: RootArgs) -> Result<()> {
    load_env_file(args.env_file.as_deref())?;
    match args.command {
        Command::Run(overrides) => cmd_run(&overrides),
        Command::Check(overrides) => cmd_check(&overrides),
    }
}

/// Config and dotenv problems exit with 2; every other failure with 1.
fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<RunError>() {
        Some(run_err) => run_err.exit_code(),
        None => ExitCode::from(2),
    }
}

/// Load a dotenv file without overriding variables already in the process.
/// An absent default `./.env` is not an error; an absent explicit file is.
fn load_env_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("load env file {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded env file");
        }
        None => match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded env file"),
            Err(err) if err.not_found() => {}
            Err(err) => return Err(err).context("load .env"),
        },
    }
    Ok(())
}

fn load_settings(overrides: &RunOverrides) -> Result<Settings, RunError> {
    Ok(Settings::from_env(overrides)?)
}

fn cmd_run(overrides: &RunOverrides) -> Result<()> {
    let settings = load_settings(overrides)?;
    let agent = build_agent(REQUEST_TIMEOUT);
    let plan = RunPlan {
        folder_id: settings.storage.folder_id.clone(),
        caption_template: settings.caption_template.clone(),
        poll: settings.poll,
    };
    let store = DriveStore::new(
        agent.clone(),
        settings.storage.credentials,
        &settings.storage.mime_type,
    );
    let publisher = GraphPublisher::new(
        agent,
        &settings.publishing.api_version,
        &settings.publishing.account_id,
        settings.publishing.access_token,
    );
    let sleeper = ThreadSleeper;

    let outcome = PublishWorkflow::new(&store, &publisher, &sleeper).run(&plan)?;
    match outcome {
        RunOutcome::NothingToDo => {
            println!("nothing to publish in folder {}", plan.folder_id);
        }
        RunOutcome::Published(report) => {
            println!(
                "published {} as {} (container {}, {} status checks)",
                report.item.name, report.publication_id, report.container_id, report.poll_attempts
            );
            if !report.source_deleted {
                println!(
                    "warning: source {} ({}) was not deleted and will be published again next run",
                    report.item.name, report.item.id
                );
            }
        }
    }
    Ok(())
}

fn cmd_check(overrides: &RunOverrides) -> Result<()> {
    let settings = load_settings(overrides)?;
    let agent = build_agent(REQUEST_TIMEOUT);
    let folder_id = settings.storage.folder_id.clone();
    let store = DriveStore::new(
        agent,
        settings.storage.credentials,
        &settings.storage.mime_type,
    );

    println!("configuration ok (account {})", settings.publishing.account_id);
    let next = store
        .find_oldest_media(&folder_id)
        .map_err(RunError::from)?;
    match next {
        Some(item) => println!("next: {} ({})", item.name, item.id),
        None => println!("nothing to publish in folder {folder_id}"),
    }
    Ok(())
}
