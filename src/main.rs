use anyhow::Result;
use clipglot::app::run_daemon;
use clipglot::cli::{Cli, Commands};
use clipglot::config::Config;
use clipglot::ipc::client::send_command;
use clipglot::ipc::protocol::{Command, Response};
use clipglot::ipc::server::IpcServer;
use clap::Parser;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::time::{Duration, UNIX_EPOCH};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Bare `clipglot` runs the daemon in the foreground.
        None => {
            let config = load_config(cli.config.as_deref())?;
            run_daemon(config, None, cli.quiet, cli.verbose).await?;
        }
        Some(Commands::Daemon {
            socket,
            flush_timeout,
        }) => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(timeout) = flush_timeout {
                config.buffer.timeout_secs = timeout.as_secs_f64();
            }
            run_daemon(config, socket, cli.quiet, cli.verbose).await?;
        }
        Some(Commands::Status { socket }) => {
            handle_ipc_command(socket, Command::Translation).await?;
        }
        Some(Commands::Reset { socket }) => {
            handle_ipc_command(socket, Command::Reset).await?;
        }
        Some(Commands::Stats { socket }) => {
            handle_ipc_command(socket, Command::CacheStats).await?;
        }
        Some(Commands::History { socket, limit }) => {
            handle_ipc_command(socket, Command::History { limit }).await?;
        }
        Some(Commands::Shutdown { socket }) => {
            handle_ipc_command(socket, Command::Shutdown).await?;
        }
    }

    Ok(())
}

fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        Config::load(path)
    } else {
        Config::load_or_default(&Config::default_path())
    }
}

/// Send IPC command to a running daemon and render the response.
async fn handle_ipc_command(socket: Option<PathBuf>, command: Command) -> Result<()> {
    let socket_path = socket.unwrap_or_else(IpcServer::default_socket_path);

    match send_command(&socket_path, command).await {
        Ok(response) => match response {
            Response::Ok => {
                println!("{}", "ok".green());
            }
            Response::Translation { current } => {
                println!("Translation:");
                println!("  {}      #{}", "Id:".dimmed(), current.id);
                println!(
                    "  {}    {}",
                    "Busy:".dimmed(),
                    if current.busy { "yes" } else { "no" }
                );
                println!(
                    "  {} {}",
                    "Context:".dimmed(),
                    if current.context_active { "active" } else { "off" }
                );
                if current.text.is_empty() {
                    println!("  {}    {}", "Text:".dimmed(), "(none yet)".dimmed());
                } else {
                    println!("  {}    {}", "Text:".dimmed(), current.text);
                }
            }
            Response::CacheStats { stats } => {
                println!("RAM cache:");
                println!(
                    "  {}    {}/{}",
                    "Size:".dimmed(),
                    stats.size,
                    stats.capacity
                );
                println!("  {}    {}", "Hits:".dimmed(), stats.hits);
                println!("  {}  {}", "Misses:".dimmed(), stats.misses);
                println!("  {}    {:.1}%", "Rate:".dimmed(), stats.hit_rate);
            }
            Response::History { entries } => {
                if entries.is_empty() {
                    println!("{}", "No stored translations yet".dimmed());
                }
                for entry in entries {
                    println!("{}  {}", format_timestamp(entry.created_at).dimmed(), entry.value);
                }
            }
            Response::Error { message } => {
                eprintln!("{}", format!("Error: {}", message).red());
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!(
                "{}",
                format!("Failed to communicate with daemon: {}", e).red()
            );
            eprintln!("Is the daemon running? Start it with: clipglot daemon");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Render a stored unix timestamp as RFC 3339 with second precision.
fn format_timestamp(created_at: i64) -> String {
    let time = UNIX_EPOCH + Duration::from_secs(created_at.max(0) as u64);
    humantime::format_rfc3339_seconds(time).to_string()
}
