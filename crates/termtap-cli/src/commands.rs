//! Subcommand implementations. Each wraps exactly one supervisor or pane
//! operation and prints the result as JSON.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use termtap_core::{
    ExecuteRequest, PastePreference, ReadMode, Supervisor, run_init_group,
};
use termtap_process::{Confirmation, Confirmer};

use crate::cli::{InitOpts, ReadOpts, SendOpts};

/// Terminal stand-in for the hover-dialog collaborator: prompt on stderr,
/// read one line from stdin.
pub struct TtyConfirmer;

impl Confirmer for TtyConfirmer {
    fn confirm(&self, title: &str, body: &str) -> Confirmation {
        eprintln!("{title}");
        eprintln!("  {body}");
        eprint!("continue? [y/N/e(dit)] ");
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_err() {
            return Confirmation::Abort;
        }
        match line.trim() {
            "y" | "Y" | "yes" => Confirmation::Proceed,
            "e" | "edit" => {
                eprint!("new command: ");
                let _ = std::io::stderr().flush();
                let mut edited = String::new();
                if std::io::stdin().read_line(&mut edited).is_err() {
                    return Confirmation::Abort;
                }
                Confirmation::Edit(edited.trim_end().to_string())
            }
            _ => Confirmation::Abort,
        }
    }
}

pub async fn cmd_send(supervisor: &Arc<Supervisor>, opts: &SendOpts) -> anyhow::Result<()> {
    let paste = match opts.paste.as_str() {
        "always" => PastePreference::Always,
        "never" => PastePreference::Never,
        _ => PastePreference::Auto,
    };
    let mut request = ExecuteRequest::new(&opts.command)
        .with_timeout(Duration::from_secs_f64(opts.timeout))
        .with_paste(paste);
    if opts.no_wait {
        request = request.no_wait();
    }
    if let Some(pattern) = &opts.ready_pattern {
        request = request.with_ready_pattern(pattern);
    }

    let pane = supervisor.pane(&opts.address)?;
    let result = pane.execute(request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub fn cmd_read(supervisor: &Arc<Supervisor>, opts: &ReadOpts) -> anyhow::Result<()> {
    let mode = if opts.stream {
        ReadMode::Stream
    } else {
        ReadMode::Direct
    };
    let pane = supervisor.pane(&opts.address)?;
    let output = pane.read_output(opts.lines, mode)?;
    print!("{output}");
    Ok(())
}

pub fn cmd_ls(supervisor: &Arc<Supervisor>) -> anyhow::Result<()> {
    let panes = supervisor.list_panes()?;
    let rows: Vec<serde_json::Value> = panes
        .iter()
        .map(|p| {
            json!({
                "pane_id": p.pane_id,
                "address": p.address(),
                "window": p.window_name,
                "active": p.active,
                "current": supervisor.is_current_pane(&p.pane_id),
                "pid": p.pane_pid,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

pub fn cmd_interrupt(supervisor: &Arc<Supervisor>, address: &str) -> anyhow::Result<()> {
    let pane = supervisor.pane(address)?;
    pane.interrupt()?;
    println!("{}", json!({ "interrupted": pane.id() }));
    Ok(())
}

pub fn cmd_kill(
    supervisor: &Arc<Supervisor>,
    address: &str,
    whole_session: bool,
) -> anyhow::Result<()> {
    if whole_session {
        supervisor.kill_session(address)?;
        println!("{}", json!({ "killed_session": address }));
        return Ok(());
    }
    let pane = supervisor.pane(address)?;
    pane.kill()?;
    println!("{}", json!({ "killed_pane": pane.id() }));
    Ok(())
}

pub async fn cmd_init(supervisor: &Arc<Supervisor>, opts: &InitOpts) -> anyhow::Result<()> {
    if opts.list || opts.group.is_none() {
        let groups = supervisor.config().list_init_groups();
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }
    let name = opts.group.as_deref().unwrap_or_default();
    let group = supervisor
        .config()
        .init_group(name)
        .ok_or_else(|| anyhow::anyhow!("init group '{name}' not found"))?;
    let reports = run_init_group(supervisor, &group).await?;
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
