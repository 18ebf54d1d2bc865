//! termtap: process-aware command runner over tmux panes.

use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use termtap_core::{FileConfig, Supervisor};
use termtap_process::AutoConfirm;
use termtap_tmux::{SocketTarget, TmuxCommandRunner, TmuxExecutor};

mod cli;
mod commands;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("TERMTAP_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    // Pin the server this process already lives in; --tmux-socket wins.
    let mut executor = TmuxExecutor::from_env();
    if let Some(socket) = &args.tmux_socket {
        executor = executor.with_socket(SocketTarget::Path(socket.clone()));
    }
    let runner: Arc<dyn TmuxCommandRunner> = Arc::new(executor);

    let mut supervisor = Supervisor::new(runner);
    if let Some(path) = &args.config {
        supervisor = supervisor.with_config(Arc::new(FileConfig::load(Path::new(path))?));
    }
    supervisor = if args.yes {
        supervisor.with_confirmer(Arc::new(AutoConfirm))
    } else {
        supervisor.with_confirmer(Arc::new(commands::TtyConfirmer))
    };
    let supervisor = Arc::new(supervisor);

    match &args.command {
        cli::Command::Send(opts) => commands::cmd_send(&supervisor, opts).await?,
        cli::Command::Read(opts) => commands::cmd_read(&supervisor, opts)?,
        cli::Command::Ls => commands::cmd_ls(&supervisor)?,
        cli::Command::Interrupt { address } => commands::cmd_interrupt(&supervisor, address)?,
        cli::Command::Kill { address, session } => {
            commands::cmd_kill(&supervisor, address, *session)?
        }
        cli::Command::Init(opts) => commands::cmd_init(&supervisor, opts).await?,
    }

    Ok(())
}
