// UI layer: the fixed upload-then-trigger flow run by the binary.
// Kept small and synchronous; every step logs what it did.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::api::{AdaClient, Trigger, TriggerAction};

/// What to upload and how to trigger the match afterwards.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub file: PathBuf,
    pub template_id: i64,
    pub trigger_action: TriggerAction,
}

/// Upload `opts.file` and trigger a match on it.
///
/// Stops at the first failing call: when the upload fails no trigger is
/// sent. The caller decides how to report the error.
pub fn run(client: &mut AdaClient, opts: &RunOptions) -> Result<Trigger> {
    info!("Note: links to log output work only if you authenticate to Ada in the web browser first.");

    let spinner = spinner(&format!("Uploading {}...", opts.file.display()));
    let uploaded = client.upload_file(&opts.file);
    spinner.finish_and_clear();
    let upload = uploaded.with_context(|| format!("Uploading {}", opts.file.display()))?;

    if opts.template_id == 0 {
        warn!("Template id is 0; pass --template or set Ada_template_id to use a configured template");
    }

    let trigger = client
        .trigger_match(&upload, opts.template_id, opts.trigger_action)
        .with_context(|| format!("Triggering {} match for upload {}", opts.trigger_action, upload.id))?;
    Ok(trigger)
}

/// Ask for the Ada password without echoing it.
pub fn prompt_password(email: &str) -> Result<String> {
    let password = Password::new()
        .with_prompt(format!("Ada password for {email}"))
        .interact()
        .context("Reading password from terminal")?;
    Ok(password)
}

// Spinner on stderr; indicatif hides it when stderr is not a terminal.
fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
