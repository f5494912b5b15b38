//! Wit.ai converse client
//!
//! Drives the converse protocol: query the service for the next decision,
//! run the matching local action, repeat until the turn is done. Overlapping
//! turns for one session are resolved by letting the newest one win.

pub mod action_loop;
pub mod actions;
pub mod config;
pub mod converse;
mod error;
pub mod interactive;
pub mod session;
mod wit;

#[cfg(test)]
mod testing;

pub use action_loop::{ActionLoop, BotResponse};
pub use actions::{Action, ActionError, ActionName, ActionRequest, ActionTable, BotReply, FnAction};
pub use config::WitConfig;
pub use converse::{Context, ConverseClient, ConverseError, ConverseErrorKind, ConverseResponse, WitClient};
pub use error::WitError;
pub use session::{EpochRegistry, SessionRegistry};
pub use wit::Wit;
