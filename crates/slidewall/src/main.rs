mod cli;
mod paths;
mod run;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    let config = cli.config.as_deref();
    match cli.command {
        Some(Command::Check) => run::check(config, &cli.run),
        Some(Command::Render(args)) => run::render(config, &cli.run, args),
        None => run::run(config, cli.run),
    }
}
