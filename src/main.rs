// Entrypoint for the CLI application.
// - Reads flags (falling back to the `Ada_*` environment variables),
//   builds the client and runs the upload-then-trigger flow.
// - Any failure is logged with its full context and exits with 255.

use std::path::PathBuf;
use std::process::ExitCode;

use ada_cli::ui::{prompt_password, run, RunOptions};
use ada_cli::{AdaClient, AdaConfig, TriggerAction};
use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Upload a spreadsheet to Ada and trigger a match on it.
#[derive(Parser, Debug)]
#[command(name = "ada-cli", version, about)]
struct Cli {
    /// Base URL of the Ada deployment, e.g. https://ada.example.com/
    #[arg(long, env = "Ada_base_url")]
    base_url: String,

    #[arg(long, env = "Ada_email")]
    email: String,

    /// Prompted for when neither the flag nor the variable is set.
    #[arg(long, env = "Ada_password", hide_env_values = true)]
    password: Option<String>,

    /// Id of the Ada template that maps the file's columns.
    #[arg(long = "template", env = "Ada_template_id", default_value_t = 0)]
    template_id: i64,

    /// `difference` to preview the match, `load` to insert new records.
    #[arg(long = "action", default_value = "difference")]
    trigger_action: TriggerAction,

    /// csv or xlsx file to upload.
    #[arg(default_value = "TestFile.csv")]
    file: PathBuf,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let res = try_main(cli);
    if let Err(err) = &res {
        error!("{err:#}");
    }
    ExitCode::from(exit_status(&res))
}

/// 0 on success, 255 for any failure.
fn exit_status(res: &anyhow::Result<()>) -> u8 {
    match res {
        Ok(()) => 0,
        Err(_) => 255,
    }
}

fn try_main(cli: Cli) -> anyhow::Result<()> {
    let password = match cli.password {
        Some(password) => password,
        None => prompt_password(&cli.email)?,
    };

    let config = AdaConfig::new(cli.base_url, cli.email, password)?
        .with_template_id(cli.template_id)
        .with_trigger_action(cli.trigger_action);
    let mut client = AdaClient::new(config).context("Creating Ada client")?;

    let opts = RunOptions {
        file: cli.file,
        template_id: client.config().default_template_id,
        trigger_action: client.config().default_trigger_action,
    };
    run(&mut client, &opts)?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .init();
}
