mod cli;
mod paths;
mod run;
mod settings;

use anyhow::Result;
use cli::{Command, ConfigAction};
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();
    let paths = AppPaths::discover()?;

    match cli.command {
        Some(Command::Config(config_cmd)) => match config_cmd.action {
            ConfigAction::Where => run::print_where(&paths),
            ConfigAction::Check => run::check(&cli.run, &paths),
        },
        None => run::run(&cli.run, &paths),
    }
}
