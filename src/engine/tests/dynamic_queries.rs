use super::seeded_session;
use crate::domain::{Member, QMember};
use crate::engine::expression::{and, Predicate, PredicateBuilder};
use crate::engine::query_builder::select_from;
use crate::engine::session::Session;

fn search_with_builder(session: &Session, username: Option<&str>, age: Option<i64>) -> Vec<Member> {
    let member = QMember::member();
    let mut builder = PredicateBuilder::new();

    if let Some(username) = username {
        builder.and(member.username.eq(username));
    }
    if let Some(age) = age {
        builder.and(member.age.eq(age));
    }

    select_from(&member).filter(builder).fetch(session).unwrap()
}

fn username_eq(member: &QMember, username: Option<&str>) -> Option<Predicate> {
    username.map(|username| member.username.eq(username))
}

fn age_eq(member: &QMember, age: Option<i64>) -> Option<Predicate> {
    age.map(|age| member.age.eq(age))
}

fn search_with_parameters(session: &Session, username: Option<&str>, age: Option<i64>) -> Vec<Member> {
    let member = QMember::member();

    select_from(&member)
        .filter(and(username_eq(&member, username), age_eq(&member, age)))
        .fetch(session)
        .unwrap()
}

#[test]
fn predicate_builder_skips_missing_conditions() {
    let session = seeded_session();

    assert_eq!(search_with_builder(&session, Some("member1"), None).len(), 1);
    assert_eq!(search_with_builder(&session, Some("member1"), Some(20)).len(), 0);
    assert_eq!(search_with_builder(&session, None, None).len(), 4);
}

#[test]
fn optional_where_parameters() {
    let session = seeded_session();

    assert_eq!(search_with_parameters(&session, Some("member1"), Some(10)).len(), 1);
    assert_eq!(search_with_parameters(&session, None, Some(30)).len(), 1);
    assert_eq!(search_with_parameters(&session, None, None).len(), 4);
}

#[test]
fn predicates_can_be_combined_with_or_and_negated() {
    let session = seeded_session();
    let member = QMember::member();

    let result = select_from(&member)
        .filter(
            member
                .age
                .eq(10)
                .or(member.age.eq(40))
                .negate(),
        )
        .order_by([member.age.asc()])
        .fetch(&session)
        .unwrap();

    let ages: Vec<i64> = result.iter().map(|member| member.age).collect();
    assert_eq!(ages, vec![20, 30]);
}
