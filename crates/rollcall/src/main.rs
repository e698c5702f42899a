//! `rollcall` - CLI for the attendance collector
//!
//! This binary runs the attendance server and inspects the stored records.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;

use rollcall::cli::{Cli, Command, ConfigCommand, ListCommand, RecordsCommand, SessionCommand};
use rollcall::qr;
use rollcall::query::sessions;
use rollcall::{filter_by_session, init_logging, server, Config, JsonFileStore, RecordStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let mut config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Serve(cmd) => {
            if let Some(host) = cmd.host {
                config.server.host = host;
            }
            if let Some(port) = cmd.port {
                config.server.port = port;
            }
            config.validate()?;
            server::serve(&config).await?;
        }
        Command::Session(cmd) => handle_session(&config, &cmd)?,
        Command::Records(cmd) => handle_records(&config, cmd)?,
        Command::Config(cmd) => handle_config(&config, cmd)?,
    }

    Ok(())
}

fn handle_session(config: &Config, cmd: &SessionCommand) -> anyhow::Result<()> {
    let session = cmd.session_key_now();
    let form_url = server::form_url(&config.public_url(), &session)?;
    let store = JsonFileStore::new(config.attendance_path());
    let records = filter_by_session(&store.load(), &session);

    if cmd.json {
        let view = server::SessionView {
            qr_svg: qr::svg(&form_url)?,
            session,
            form_url,
            records,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("Session:   {session}");
    println!("Form link: {form_url}");
    println!();
    println!("{}", qr::terminal(&form_url)?);
    println!();
    if records.is_empty() {
        println!("No attendance submitted yet.");
    } else {
        println!("{:<24} {:<12} PHOTO", "NAME", "ROLL NO");
        for record in &records {
            println!(
                "{:<24} {:<12} {}",
                record.student_name, record.roll_no, record.photo
            );
        }
    }
    Ok(())
}

fn handle_records(config: &Config, cmd: RecordsCommand) -> anyhow::Result<()> {
    let store = JsonFileStore::new(config.attendance_path());

    match cmd {
        RecordsCommand::List(filter) => list_records(&store, &filter)?,
        RecordsCommand::Sessions { json } => {
            let summaries = sessions(&store.load());
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else if summaries.is_empty() {
                println!("No sessions recorded.");
            } else {
                println!("{:<24} {:<12} {:<8} COUNT", "LECTURE", "DATE", "TIME");
                for summary in &summaries {
                    println!(
                        "{:<24} {:<12} {:<8} {}",
                        summary.key.lecture_name, summary.key.date, summary.key.time, summary.count
                    );
                }
            }
        }
        RecordsCommand::Verify => {
            let path = store.path().display().to_string();
            let stats = store
                .stats()
                .with_context(|| format!("attendance file {path} is not readable"))?;
            println!("Attendance file: {path}");
            println!("  Records:  {}", stats.total_records);
            println!("  Sessions: {}", stats.total_sessions);
            println!("  Size:     {} bytes", stats.file_size_bytes);
            println!("Attendance file is valid.");
        }
    }
    Ok(())
}

fn list_records(store: &JsonFileStore, filter: &ListCommand) -> anyhow::Result<()> {
    let records: Vec<_> = store
        .load()
        .into_iter()
        .filter(|record| filter.matches(record))
        .collect();

    if filter.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No records found.");
        return Ok(());
    }

    println!(
        "{:<20} {:<12} {:<8} {:<24} {:<12} PHOTO",
        "LECTURE", "DATE", "TIME", "NAME", "ROLL NO"
    );
    for record in &records {
        println!(
            "{:<20} {:<12} {:<8} {:<24} {:<12} {}",
            record.lecture_name,
            record.date,
            record.time,
            record.student_name,
            record.roll_no,
            record.photo
        );
    }
    println!();
    println!("{} record(s)", records.len());
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Data directory:     {}", config.data_dir().display());
                println!("  Attendance file:    {}", config.attendance_path().display());
                println!("  Uploads directory:  {}", config.uploads_path().display());
                println!();
                println!("[Server]");
                println!("  Listen address:     {}", config.listen_address());
                println!("  Public URL:         {}", config.public_url());
                println!();
                println!("[Uploads]");
                println!(
                    "  Allowed extensions: {}",
                    config.uploads.allowed_extensions.join(", ")
                );
                println!("  Max photo bytes:    {}", config.uploads.max_photo_bytes);
                println!();
                println!("[Live]");
                println!("  Channel capacity:   {}", config.live.channel_capacity);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
