//! CLI definition using clap derive.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "termtap", about = "process-aware command runner over tmux panes")]
pub struct Cli {
    /// Path to a JSON config file (pane defaults and init groups)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    /// tmux socket path (tmux -S)
    #[arg(long, global = true)]
    pub tmux_socket: Option<String>,

    /// Answer yes to every confirmation prompt
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Send a command to a pane and wait for it to finish
    Send(SendOpts),
    /// Read pane output without sending anything
    Read(ReadOpts),
    /// List all panes across sessions
    Ls,
    /// Send the interrupt key to a pane
    Interrupt {
        /// Pane address (%id, session:window.pane, session, session.service)
        address: String,
    },
    /// Kill a pane, or a whole session with --session
    Kill {
        /// Pane address, or session name with --session
        address: String,
        #[arg(long)]
        session: bool,
    },
    /// Start an init group's services in dependency order
    Init(InitOpts),
}

#[derive(clap::Args)]
pub struct SendOpts {
    /// Pane address (%id, session:window.pane, session, session.service)
    pub address: String,

    /// Command text to send
    pub command: String,

    /// Seconds to wait before reporting a timeout
    #[arg(long, default_value = "30")]
    pub timeout: f64,

    /// Return immediately after sending
    #[arg(long)]
    pub no_wait: bool,

    /// Regex marking the command ready before it goes idle
    #[arg(long)]
    pub ready_pattern: Option<String>,

    /// Delivery route: auto, always or never use the paste buffer
    #[arg(long, default_value = "auto")]
    pub paste: String,
}

#[derive(clap::Args)]
pub struct ReadOpts {
    /// Pane address
    pub address: String,

    /// Number of trailing lines (default: visible content / unread tail)
    #[arg(long, short = 'n')]
    pub lines: Option<u32>,

    /// Read from the durable stream mirror instead of the screen buffer
    #[arg(long)]
    pub stream: bool,
}

#[derive(clap::Args)]
pub struct InitOpts {
    /// Init group name
    pub group: Option<String>,

    /// List available init groups
    #[arg(long)]
    pub list: bool,
}
