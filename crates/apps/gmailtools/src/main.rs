//! gmailtools - Query, label and archive Gmail from the command line
//!
//! This is the main entry point for the gmailtools binary.

use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use mail::actions::{ActionHandler, reduce_keys};
use mail::{
    BodyFormat, GmailAuth, GmailClient, MailApi, PostAction, SearchSpec, dispatch, fetch_messages,
};

mod cli;
mod menu;

use cli::{AuthArgs, Cli, Commands, QueryAction};
use menu::Menu;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Query { action } => {
            // Validate search flags before touching the network
            let spec = action.search().to_spec()?;
            spec.to_query()?;
            let client = connect(&cli.auth)?;
            query(client.as_ref(), spec, action)
        }
        Commands::AssignLabel {
            name,
            file,
            keys,
            force,
        } => assign_label(connect(&cli.auth)?, &name, &file, &keys, force),
        Commands::MarkRead => {
            let count = ActionHandler::new(connect(&cli.auth)?).mark_all_read()?;
            println!("All emails marked read ({})", count);
            Ok(())
        }
        Commands::Filters => {
            let filters = ActionHandler::new(connect(&cli.auth)?).list_filters()?;
            println!("{}", serde_json::to_string_pretty(&filters)?);
            Ok(())
        }
    }
}

fn connect(auth: &AuthArgs) -> Result<Arc<GmailClient>> {
    let auth = GmailAuth::from_config(&auth.to_config())?;
    let client = GmailClient::new(auth);
    client
        .authenticate()
        .context("Failed to authenticate with Gmail")?;
    info!("Gmail client initialized successfully");
    Ok(Arc::new(client))
}

fn assign_label(
    client: Arc<GmailClient>,
    name: &str,
    file: &Path,
    keys: &[String],
    force: bool,
) -> Result<()> {
    let path = config::normalize_path(&file.to_string_lossy());
    let document: serde_json::Value = config::load_json_file(&path)?;
    let addresses = reduce_keys(&document, keys)?;

    let filter = ActionHandler::new(client).assign_label(name, &addresses, force)?;
    println!(
        "Label {:?} assigned to {} sender(s) (filter {})",
        name,
        addresses.len(),
        filter.id.as_deref().unwrap_or("?")
    );
    Ok(())
}

fn query(api: &dyn MailApi, spec: SearchSpec, action: QueryAction) -> Result<()> {
    let format = BodyFormat::default();
    let (query, messages) = fetch_messages(api, &spec, format)?;
    if messages.is_empty() {
        anyhow::bail!("No messages matched query {}", query);
    }

    let post_action = match action {
        QueryAction::PrintEmails { await_menu, .. } => PostAction::Print { await_menu },
        QueryAction::StoreEmails {
            output,
            verbose,
            no_overwrite,
            ..
        } => PostAction::Store {
            output,
            allow_overwrite: !no_overwrite,
            verbose,
        },
        QueryAction::DownloadAttachments {
            dir, verbose, force, ..
        } => PostAction::Download { dir, force, verbose },
    };

    dispatch(&messages, &post_action)?;

    if let PostAction::Print { await_menu: true } = post_action {
        let stdin = io::stdin();
        Menu::new(api, spec, messages, stdin.lock(), io::stdout())
            .with_format(format)
            .run()?;
    }
    Ok(())
}
