use super::{seeded_session, usernames};
use crate::domain::{Member, QMember, QTeam};
use crate::engine::entity::{EntityPath, Relation};
use crate::engine::query_builder::{select, select_from};

#[test]
fn join_on_the_team_association() {
    let session = seeded_session();
    let member = QMember::member();
    let team = QTeam::team();

    let result = select_from(&member)
        .join(&member.team, &team)
        .filter(team.name.eq("teamA"))
        .order_by([member.username.asc()])
        .fetch(&session)
        .unwrap();

    assert_eq!(usernames(&result), vec!["member1", "member2"]);
}

#[test]
fn theta_join_matches_usernames_to_team_names() {
    let session = seeded_session();
    for name in ["teamA", "teamB", "teamC"] {
        session.persist(&mut Member::named(name)).unwrap();
    }
    let member = QMember::member();
    let team = QTeam::team();

    let result = select(member.clone())
        .from(&member)
        .from(&team)
        .filter(member.username.eq(&team.name))
        .order_by([member.id.asc()])
        .fetch(&session)
        .unwrap();

    assert_eq!(usernames(&result), vec!["teamA", "teamB"]);
}

#[test]
fn join_on_filters_the_joined_rows() {
    let session = seeded_session();
    let member = QMember::member();
    let team = QTeam::team();

    let inner = select((member.clone(), team.clone()))
        .from(&member)
        .join(&member.team, &team)
        .on(team.name.eq("teamA"))
        .fetch(&session)
        .unwrap();

    assert_eq!(inner.len(), 2);
    assert!(inner.iter().all(|(_, team)| team.name == "teamA"));

    let outer = select((member.clone(), team.or_none()))
        .from(&member)
        .left_join(&member.team, &team)
        .on(team.name.eq("teamA"))
        .order_by([member.id.asc()])
        .fetch(&session)
        .unwrap();

    let teams: Vec<Option<&str>> = outer
        .iter()
        .map(|(_, team)| team.as_ref().map(|team| team.name.as_str()))
        .collect();
    assert_eq!(teams, vec![Some("teamA"), Some("teamA"), None, None]);
}

#[test]
fn left_join_without_an_association() {
    let session = seeded_session();
    for name in ["teamA", "teamB", "teamC"] {
        session.persist(&mut Member::named(name)).unwrap();
    }
    let member = QMember::member();
    let team = QTeam::team();

    let result = select((member.clone(), team.or_none()))
        .from(&member)
        .left_join_on(&team)
        .on(member.username.eq(&team.name))
        .order_by([member.id.asc()])
        .fetch(&session)
        .unwrap();

    assert_eq!(result.len(), 7);

    let matched: Vec<(&str, &str)> = result
        .iter()
        .filter_map(|(member, team)| {
            Some((member.username.as_deref()?, team.as_ref()?.name.as_str()))
        })
        .collect();
    assert_eq!(matched, vec![("teamA", "teamA"), ("teamB", "teamB")]);
}

#[test]
fn a_required_entity_on_the_nullable_side_is_an_error() {
    let session = seeded_session();
    session.persist(&mut Member::named("loner")).unwrap();
    let member = QMember::member();
    let team = QTeam::team();

    let result = select((member.clone(), team.clone()))
        .from(&member)
        .left_join(&member.team, &team)
        .fetch(&session);

    assert!(result.is_err());
}

#[test]
fn without_fetch_join_the_team_is_not_loaded() {
    let session = seeded_session();
    let member = QMember::member();

    let mut found = select_from(&member)
        .filter(member.username.eq("member1"))
        .fetch_one(&session)
        .unwrap()
        .unwrap();

    let team = found.team.as_mut().unwrap();
    assert!(matches!(team, Relation::Unresolved(_)));

    assert_eq!(team.resolve(&session).unwrap().name, "teamA");
    assert!(team.is_loaded());
}

#[test]
fn fetch_join_loads_the_team() {
    let session = seeded_session();
    let member = QMember::member();
    let team = QTeam::team();

    let found = select_from(&member)
        .join(&member.team, &team)
        .fetch_join()
        .filter(member.username.eq("member1"))
        .fetch_one(&session)
        .unwrap()
        .unwrap();

    let team = found.team.unwrap();
    assert!(team.is_loaded());
    assert_eq!(team.get().unwrap().name, "teamA");
}

#[test]
fn fetch_join_upgrades_held_members() {
    let session = seeded_session();
    let member = QMember::member();
    let team = QTeam::team();

    let plain = select_from(&member).fetch(&session).unwrap();
    assert!(plain.iter().all(|member| !member.team.as_ref().unwrap().is_loaded()));

    let fetched = select_from(&member)
        .join(&member.team, &team)
        .fetch_join()
        .fetch(&session)
        .unwrap();

    assert!(fetched.iter().all(|member| member.team.as_ref().unwrap().is_loaded()));
}

#[test]
fn team_members_are_an_explicit_query() {
    let session = seeded_session();
    let team = QTeam::team();

    let team_b = select_from(&team)
        .filter(team.name.eq("teamB"))
        .fetch_one(&session)
        .unwrap()
        .unwrap();

    assert_eq!(usernames(&team_b.members(&session).unwrap()), vec!["member3", "member4"]);
}

#[test]
fn counting_entities_through_their_path() {
    let session = seeded_session();
    let member = QMember::member();
    let team = QTeam::team();

    let counts = select((team.name.clone(), member.count()))
        .from(&member)
        .join(&member.team, &team)
        .group_by(&team.name)
        .order_by([team.name.asc()])
        .fetch(&session)
        .unwrap();

    assert_eq!(
        counts,
        vec![("teamA".to_string(), 2), ("teamB".to_string(), 2)]
    );
}
