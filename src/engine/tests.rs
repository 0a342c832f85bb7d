//! Every scenario runs against its own in-memory SQLite database.
use crate::domain::seed;
use crate::engine::session::Session;
use crate::engine::sql::querying::BlockingGateway;

mod dynamic_queries;
mod joins;
mod mutations;
mod projections;
mod searching;
mod subqueries;

/// A session over the seeded schema, with nothing held in its identity map.
fn seeded_session() -> Session {
    let _ = env_logger::builder().is_test(true).try_init();

    let session = Session::new(BlockingGateway::sqlite_in_memory().unwrap());
    session.create_schema().unwrap();
    seed(&session).unwrap();
    session.clear();

    session
}

fn usernames(members: &[crate::domain::Member]) -> Vec<&str> {
    members
        .iter()
        .map(|member| member.username.as_deref().unwrap_or("<null>"))
        .collect()
}
