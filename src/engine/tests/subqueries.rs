use super::seeded_session;
use crate::domain::QMember;
use crate::engine::entity::EntityPath;
use crate::engine::query_builder::{select, select_from};

fn ages(members: &[crate::domain::Member]) -> Vec<i64> {
    members.iter().map(|member| member.age).collect()
}

#[test]
fn oldest_member() {
    let session = seeded_session();
    let member = QMember::member();
    let member_sub = QMember::new("member_sub");

    let result = select_from(&member)
        .filter(member.age.eq(select(member_sub.age.max()).from(&member_sub)))
        .fetch(&session)
        .unwrap();

    assert_eq!(ages(&result), vec![40]);
}

#[test]
fn members_at_least_as_old_as_the_average() {
    let session = seeded_session();
    let member = QMember::member();
    let member_sub = QMember::new("member_sub");

    let result = select_from(&member)
        .filter(member.age.goe(select(member_sub.age.avg()).from(&member_sub)))
        .order_by([member.age.asc()])
        .fetch(&session)
        .unwrap();

    assert_eq!(ages(&result), vec![30, 40]);
}

#[test]
fn members_in_a_subquery() {
    let session = seeded_session();
    let member = QMember::member();
    let member_sub = QMember::new("member_sub");

    let older = select(member_sub.age.clone())
        .from(&member_sub)
        .filter(member_sub.age.gt(10));

    let result = select_from(&member)
        .filter(member.age.in_subquery(&older))
        .order_by([member.age.asc()])
        .fetch(&session)
        .unwrap();

    assert_eq!(ages(&result), vec![20, 30, 40]);
}

#[test]
fn correlated_subqueries_see_the_outer_row() {
    let session = seeded_session();
    let member = QMember::member();
    let member_sub = QMember::new("member_sub");

    // Members without an older teammate.
    let older_teammates = select(member_sub.count())
        .from(&member_sub)
        .filter(
            member_sub
                .team
                .id()
                .eq(member.team.id())
                .and(member_sub.age.gt(&member.age)),
        );

    let result = select_from(&member)
        .filter(older_teammates.as_expr().eq(0))
        .order_by([member.age.asc()])
        .fetch(&session)
        .unwrap();

    assert_eq!(ages(&result), vec![20, 40]);
}

#[test]
fn subquery_in_the_projection() {
    let session = seeded_session();
    let member = QMember::member();
    let member_sub = QMember::new("member_sub");

    let average = select(member_sub.age.avg()).from(&member_sub);

    let result = select((member.username.clone(), average.as_expr()))
        .from(&member)
        .order_by([member.username.asc()])
        .fetch(&session)
        .unwrap();

    assert_eq!(result.len(), 4);
    assert_eq!(result[0], ("member1".to_string(), 25.0));
    assert!(result.iter().all(|(_, average)| *average == 25.0));
}
