//! The session controller and its observable state.

mod command;
mod config;
mod controller;
mod event;
mod handle;
mod state;

pub use {
    command::SessionCommand,
    config::SessionConfig,
    controller::SessionController,
    handle::SessionHandle,
    state::{RetryAction, SessionFault, SessionSnapshot, SessionState, TakeSummary},
};
