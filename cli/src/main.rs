mod commands;
mod terminal;

use commands::{CommandLine, Commands, probe, sweep};
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init();

    match commands.command {
        Commands::Sweep(args) => sweep::sweep(args).await,
        Commands::Probe { host, port } => probe::probe(&host, port).await,
    }
}
