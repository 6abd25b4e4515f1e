//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod config_cmd;
pub mod customers;
pub mod entities;
pub mod path;
pub mod summary;
pub mod tree;
pub mod util;

use bankwatch_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a store-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Tree(args) => tree::handle(controller, &args, global),
        Command::Path(args) => path::handle(controller, &args, global).await,
        Command::Entities(args) => entities::handle(controller, args, global).await,
        Command::Customers(args) => customers::handle(controller, args, global).await,
        Command::Summary(args) => summary::handle(controller, &args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "does not need a store connection".into(),
        }),
    }
}
