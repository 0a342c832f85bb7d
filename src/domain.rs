//! The two mapped entities, their paths and the records rows can be projected into.
use crate::engine::query_builder::delete;
use crate::engine::session::Session;
use crate::error::Error;
use log::info;

mod dto;
mod member;
mod team;

pub use dto::{MemberDto, UserDto};
pub use member::{Member, QMember};
pub use team::{QTeam, Team};

/// Persists the demo data: `teamA` with member1 and member2, `teamB` with member3 and member4,
/// aged 10 to 40.
///
/// The session keeps holding the persisted entities afterwards.
pub fn seed(session: &Session) -> Result<(Team, Team), Error> {
    let mut team_a = Team::new("teamA");
    let mut team_b = Team::new("teamB");
    session.persist(&mut team_a)?;
    session.persist(&mut team_b)?;

    for (username, age, team) in [
        ("member1", 10, &team_a),
        ("member2", 20, &team_a),
        ("member3", 30, &team_b),
        ("member4", 40, &team_b),
    ] {
        session.persist(&mut Member::new(Some(username), age, Some(team)))?;
    }

    Ok((team_a, team_b))
}

/// Empties the `member` and `team` tables, then [seed]s them again.
///
/// Anything held by the session is forgotten.
pub fn reseed(session: &Session) -> Result<(Team, Team), Error> {
    let removed = delete(&QMember::member()).execute(session)? + delete(&QTeam::team()).execute(session)?;
    if removed > 0 {
        info!("removed {removed} rows left over from earlier runs");
    }
    session.clear();

    seed(session)
}
