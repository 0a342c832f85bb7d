mod args;
mod commands;

use crate::args::{Command, ContextParams};
use args::Args;
use clap::Parser;
use colored::Colorize;
use rusty_query::cache;
use rusty_query::context::{Context, ContextName};
use std::process::exit;

fn main() {
    env_logger::init();

    let args = Args::parse();

    let result = match args.command {
        Command::CreateContext(context) => create_context(context),
        Command::UseContext { name } => use_context(name),
        Command::ListContexts => list_contexts(),
        Command::Sql { scenario } => commands::print_sql(scenario),
        Command::Run { scenario } => commands::run(scenario),
    };

    if let Err(error) = result {
        eprintln!("{intro}: {error}", intro = "error".bold().red());
        exit(1);
    }
}

fn create_context(params: ContextParams) -> Result<(), rusty_query::Error> {
    let use_it = params.use_it;
    let new_context: Context = params.into();

    cache::write(&new_context)?;

    println!("Created new context {}.", new_context.name.to_string().bold());

    if use_it {
        use_context(new_context.name.into())?;
    } else {
        println!(
            "Switch to it by running {}.",
            format!("study use-context {}", new_context.name).bold()
        );
    }

    Ok(())
}

fn use_context(name: String) -> Result<(), rusty_query::Error> {
    let context_name: ContextName = name.into();

    cache::write(&context_name)?;

    println!("Switched to context {}.", context_name.to_string().bold());

    Ok(())
}

fn list_contexts() -> Result<(), rusty_query::Error> {
    let current_context = ContextName::current().ok();
    let known_contexts: Vec<Context> = cache::read_all()?;

    println!("Available contexts:");
    for context in &known_contexts {
        println!(
            "{}{}: {}",
            if current_context.as_ref() == Some(&context.name) {
                " * ".bold()
            } else {
                "   ".into()
            },
            context.name.to_string().bold(),
            context.server_params
        )
    }

    Ok(())
}
