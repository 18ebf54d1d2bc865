//! termtap-tmux: tmux backend IO boundary.
//! Provides subprocess execution, pane listing/capture, address resolution,
//! keystroke and paste-buffer delivery, and pipe-pane stream control.
//! No business logic — pure IO boundary; pane content is never interpreted.

pub mod address;
pub mod capture;
pub mod error;
pub mod executor;
pub mod layout;
pub mod pane_info;
pub mod pipe;
pub mod send;

pub use address::{PaneAddress, ResolveError, resolve_panes, resolve_single};
pub use capture::{capture_all, capture_last_n, capture_visible};
pub use error::TmuxError;
pub use executor::{SocketTarget, TmuxCommandRunner, TmuxExecutor, resolve_socket};
pub use layout::{
    SessionInfo, SplitDirection, create_session, create_window, kill_pane, kill_session,
    list_sessions, session_exists, split_pane,
};
pub use pane_info::{
    LIST_PANES_FORMAT, TmuxPaneInfo, current_pane_id, leader_pid, list_panes, pane_address,
    parse_list_panes_output,
};
pub use pipe::{pipe_started, start_pipe, stop_pipe};
pub use send::{paste_buffer_name, send_key, send_keys, send_via_paste_buffer};
