use crate::commands::scenarios::Scenario;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Password;
use log::warn;
use rusty_query::context::{Context, ContextName};
use rusty_query::{cache, domain, BlockingGateway, Dialect, Error, Session};

pub mod scenarios;

/// The current context, if one was picked.
fn current_context() -> Option<Context> {
    let context = ContextName::current().and_then(|name| cache::read(&name));

    match context {
        Ok(context) => Some(context),
        Err(error) => {
            warn!("no usable current context, falling back to SQLite: {error}");
            None
        }
    }
}

pub fn print_sql(scenario: Scenario) -> Result<(), Error> {
    let dialect = current_context()
        .map(|context| context.server_params.db_type)
        .unwrap_or(Dialect::Sqlite);

    let statement = scenario.build()?.statement(dialect)?;

    println!("-- {}", dialect.to_string().bold());
    println!("{statement}");
    for (index, param) in statement.params.iter().enumerate() {
        println!("-- {}: {}", index + 1, param.to_string().green());
    }

    Ok(())
}

pub fn run(scenario: Scenario) -> Result<(), Error> {
    let session = match current_context() {
        Some(context) if context.server_params.needs_password() => {
            let password = ask_for_password(&context)?;
            Session::new(BlockingGateway::connect(&context.server_params, &password)?)
        }
        _ => Session::new(BlockingGateway::sqlite_in_memory()?),
    };

    session.create_schema()?;
    domain::reseed(&session)?;
    for mut member in scenario.extra_members() {
        session.persist(&mut member)?;
    }
    session.clear();

    let results = scenario.build()?.run(&session)?;
    println!("{}", serde_json::to_string_pretty(&results)?);

    Ok(())
}

/// Ask the user for a password.
///
/// Passwords are never stored.
fn ask_for_password(context: &Context) -> Result<String, Error> {
    println!("Using context {}", context.name.to_string().bold().green());
    println!(
        "Please provide the password for {}",
        context.server_params.to_string().bold().green()
    );
    Ok(Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password: ")
        .interact()?)
}
