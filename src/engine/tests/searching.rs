use super::{seeded_session, usernames};
use crate::domain::{Member, QMember, QTeam, Team};
use crate::engine::entity::EntityPath;
use crate::engine::query_builder::{select, select_from};
use crate::engine::rendering::Dialect;
use crate::engine::value::Value;
use crate::error::ErrorKind;
use crate::tuple;

#[test]
fn search_by_username() {
    let session = seeded_session();
    let member = QMember::member();

    let found = select_from(&member)
        .filter(member.username.eq("member1"))
        .fetch_one(&session)
        .unwrap()
        .unwrap();

    assert_eq!(found.username.as_deref(), Some("member1"));
    assert_eq!(found.age, 10);
}

#[test]
fn search_with_chained_predicates() {
    let session = seeded_session();
    let member = QMember::member();

    let found = select_from(&member)
        .filter(member.username.eq("member1").and(member.age.between(10, 30)))
        .fetch_one(&session)
        .unwrap();

    assert_eq!(found.unwrap().username.as_deref(), Some("member1"));
}

#[test]
fn search_with_a_predicate_list() {
    let session = seeded_session();
    let member = QMember::member();

    let found = select_from(&member)
        .filter_all([Some(member.username.eq("member1")), Some(member.age.eq(10))])
        .fetch(&session)
        .unwrap();

    assert_eq!(usernames(&found), vec!["member1"]);
}

#[test]
fn fetch_one_refuses_multiple_rows() {
    let session = seeded_session();
    let member = QMember::member();

    let error = select_from(&member).fetch_one(&session).unwrap_err();

    assert!(matches!(error.kind(), ErrorKind::NonUniqueResult));
}

#[test]
fn fetch_one_without_a_match_is_none() {
    let session = seeded_session();
    let member = QMember::member();

    let found = select_from(&member)
        .filter(member.username.eq("nobody"))
        .fetch_one(&session)
        .unwrap();

    assert_eq!(found, None);
}

#[test]
fn fetch_first_takes_the_first_row() {
    let session = seeded_session();
    let member = QMember::member();

    let first = select_from(&member)
        .order_by([member.age.desc()])
        .fetch_first(&session)
        .unwrap()
        .unwrap();

    assert_eq!(first.username.as_deref(), Some("member4"));
}

#[test]
fn counting_ignores_order_and_paging() {
    let session = seeded_session();
    let member = QMember::member();

    let query = select_from(&member)
        .filter(member.age.gt(10))
        .order_by([member.age.desc()])
        .limit(1);

    assert_eq!(query.fetch_count(&session).unwrap(), 3);
    assert_eq!(query.fetch(&session).unwrap().len(), 1);
}

#[test]
fn counting_grouped_queries_counts_groups() {
    let session = seeded_session();
    let member = QMember::member();
    let team = QTeam::team();

    let count = select(team.name.clone())
        .from(&member)
        .join(&member.team, &team)
        .group_by(&team.name)
        .fetch_count(&session)
        .unwrap();

    assert_eq!(count, 2);
}

#[test]
fn sort_with_nulls_last() {
    let session = seeded_session();
    session.persist(&mut Member::new(None, 100, None)).unwrap();
    session.persist(&mut Member::new(Some("member5"), 100, None)).unwrap();
    session.persist(&mut Member::new(Some("member6"), 100, None)).unwrap();
    let member = QMember::member();

    let sorted = select_from(&member)
        .filter(member.age.eq(100))
        .order_by([member.age.desc(), member.username.asc().nulls_last()])
        .fetch(&session)
        .unwrap();

    assert_eq!(usernames(&sorted), vec!["member5", "member6", "<null>"]);
}

#[test]
fn paging() {
    let session = seeded_session();
    let member = QMember::member();

    let page = select_from(&member)
        .order_by([member.username.desc()])
        .offset(1)
        .limit(2)
        .fetch(&session)
        .unwrap();

    assert_eq!(usernames(&page), vec!["member3", "member2"]);
}

#[test]
fn offset_without_a_limit() {
    let session = seeded_session();
    let member = QMember::member();

    let rest = select_from(&member)
        .order_by([member.age.asc()])
        .offset(3)
        .fetch(&session)
        .unwrap();

    assert_eq!(usernames(&rest), vec!["member4"]);
}

#[test]
fn aggregation() {
    let session = seeded_session();
    let member = QMember::member();

    let result = select(tuple![
        member.count(),
        member.age.sum(),
        member.age.avg(),
        member.age.max(),
        member.age.min()
    ])
    .from(&member)
    .fetch(&session)
    .unwrap();

    let tuple = &result[0];
    assert_eq!(tuple.get(&member.count()).unwrap(), 4);
    assert_eq!(tuple.get(&member.age.sum()).unwrap(), 100);
    assert_eq!(tuple.get(&member.age.avg()).unwrap(), 25.0);
    assert_eq!(tuple.get(&member.age.max()).unwrap(), 40);
    assert_eq!(tuple.get(&member.age.min()).unwrap(), 10);
}

#[test]
fn group_by_team_name() {
    let session = seeded_session();
    let member = QMember::member();
    let team = QTeam::team();

    let result = select(tuple![team.name, member.age.avg()])
        .from(&member)
        .join(&member.team, &team)
        .group_by(&team.name)
        .order_by([team.name.asc()])
        .fetch(&session)
        .unwrap();

    assert_eq!(result[0].get(&team.name).unwrap(), "teamA");
    assert_eq!(result[0].get(&member.age.avg()).unwrap(), 15.0);
    assert_eq!(result[1].get(&team.name).unwrap(), "teamB");
    assert_eq!(result[1].get(&member.age.avg()).unwrap(), 35.0);
}

#[test]
fn having_filters_groups() {
    let session = seeded_session();
    let member = QMember::member();
    let team = QTeam::team();

    let names = select(team.name.clone())
        .from(&member)
        .join(&member.team, &team)
        .group_by(&team.name)
        .having(member.age.avg().gt(20.0))
        .fetch(&session)
        .unwrap();

    assert_eq!(names, vec!["teamB".to_string()]);
}

#[test]
fn literals_are_always_bound() {
    let member = QMember::member();
    let query = |username: &str, age: i64| {
        select_from(&member)
            .filter(member.username.eq(username).and(member.age.goe(age)))
            .limit(10)
            .to_statement(Dialect::Sqlite)
            .unwrap()
    };

    let first = query("member1", 10);
    let second = query("'; DROP TABLE member; --", 99);

    assert_eq!(first.sql, second.sql);
    assert!(!first.sql.contains("member1"));
    assert!(!second.sql.contains("DROP"));
    assert_eq!(
        second.params,
        vec![
            Value::Text("'; DROP TABLE member; --".into()),
            Value::Integer(99),
            Value::Integer(10)
        ]
    );
}

#[test]
fn lower_case_usernames() {
    let session = seeded_session();
    let member = QMember::member();

    let result = select(member.username.clone())
        .from(&member)
        .filter(member.username.eq(member.username.lower()))
        .order_by([member.username.asc()])
        .fetch(&session)
        .unwrap();

    assert_eq!(result, vec!["member1", "member2", "member3", "member4"]);
}

#[test]
fn the_identity_map_hands_out_held_entities() {
    let session = seeded_session();
    let member = QMember::member();

    let loaded = select_from(&member)
        .filter(member.username.eq("member1"))
        .fetch_one(&session)
        .unwrap()
        .unwrap();
    let id = loaded.id.unwrap();

    assert!(session.contains::<Member>(id));
    assert_eq!(session.find::<Member>(id).unwrap(), Some(loaded));

    session.evict::<Member>(id);
    assert!(!session.contains::<Member>(id));
    assert!(session.find::<Member>(id).unwrap().is_some());
    assert_eq!(session.find::<Member>(-1).unwrap(), None);
}

#[test]
fn persisting_twice_is_refused() {
    let session = seeded_session();
    let mut team = Team::new("teamC");

    session.persist(&mut team).unwrap();

    assert!(team.id.is_some());
    assert!(session.persist(&mut team).is_err());
}

#[test]
fn dangling_team_references_violate_a_constraint() {
    let session = seeded_session();
    let mut ghost = Team::new("ghost");
    ghost.id = Some(999);

    let error = session
        .persist(&mut Member::new(Some("member5"), 50, Some(&ghost)))
        .unwrap_err();

    assert!(matches!(error.kind(), ErrorKind::ConstraintViolation(_)));
}
