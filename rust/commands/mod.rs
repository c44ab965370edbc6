use anyhow::Result;

use crate::{cli::Command, config::Config};

pub mod convert;
pub mod tools;

#[derive(Clone, Debug)]
pub struct CommandContext {
    pub config: Config,
    pub json: bool,
}

pub fn run_command(command: Command, ctx: CommandContext) -> Result<()> {
    match command {
        Command::Tools(args) => tools::handle(args, &ctx),
        conversion => convert::handle(conversion, &ctx),
    }
}
