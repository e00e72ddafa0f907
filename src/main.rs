mod cli;
mod commands;
mod config;
mod env;
mod exec;
mod git;
mod github;
mod guard;
mod paths;
mod staleness;
mod testutil;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_file = config::load(cli.config.as_deref())?;
    let actions_env = env::ActionsEnv::from_env();

    match cli.command {
        Command::Commit(args) => {
            let options = config::resolve_commit(&args, &config_file)?;
            let result = commands::cmd_commit(&options, &actions_env)?;
            output(&result, cli.json, commands::format_commit_human)?;
        }
        Command::Api(args) => {
            let options = config::resolve_api(&args, &config_file)?;
            let result = commands::cmd_api(&options, &actions_env)?;
            let failed = result.failed();
            output(&result, cli.json, commands::format_api_human)?;
            if failed {
                std::process::exit(1);
            }
        }
        Command::Check(args) => {
            let options = config::resolve_check(&args, &config_file);
            let result = commands::cmd_check(&options)?;
            output(&result, cli.json, commands::format_check_human)?;
        }
    }
    Ok(())
}

fn output<T: serde::Serialize>(result: &T, json: bool, human_fn: fn(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        let text = human_fn(result);
        if !text.is_empty() {
            println!("{}", text);
        }
    }
    Ok(())
}
