use super::{seeded_session, usernames};
use crate::domain::{reseed, QMember};
use crate::engine::query_builder::{delete, select, select_from, update};

#[test]
fn bulk_update_bypasses_held_entities() {
    let session = seeded_session();
    let member = QMember::member();
    let everyone = select_from(&member).order_by([member.age.asc()]);

    // Loads every member into the session.
    everyone.fetch(&session).unwrap();

    let count = update(&member)
        .set(&member.username, "non-member")
        .filter(member.age.lt(28))
        .execute(&session)
        .unwrap();
    assert_eq!(count, 2);

    let stale = everyone.fetch(&session).unwrap();
    assert_eq!(usernames(&stale), vec!["member1", "member2", "member3", "member4"]);

    session.clear();

    let fresh = everyone.fetch(&session).unwrap();
    assert_eq!(
        usernames(&fresh),
        vec!["non-member", "non-member", "member3", "member4"]
    );
}

#[test]
fn scalar_reads_see_bulk_updates_right_away() {
    let session = seeded_session();
    let member = QMember::member();

    update(&member)
        .set(&member.username, "non-member")
        .filter(member.age.lt(28))
        .execute(&session)
        .unwrap();

    let usernames = select(member.username.clone())
        .from(&member)
        .order_by([member.age.asc()])
        .fetch(&session)
        .unwrap();

    assert_eq!(usernames, vec!["non-member", "non-member", "member3", "member4"]);
}

#[test]
fn bulk_add() {
    let session = seeded_session();
    let member = QMember::member();

    let count = update(&member)
        .set(&member.age, member.age.multiply(2))
        .execute(&session)
        .unwrap();
    assert_eq!(count, 4);

    let ages = select(member.age.clone())
        .from(&member)
        .order_by([member.age.asc()])
        .fetch(&session)
        .unwrap();
    assert_eq!(ages, vec![20, 40, 60, 80]);
}

#[test]
fn bulk_delete() {
    let session = seeded_session();
    let member = QMember::member();

    let count = delete(&member)
        .filter(member.age.gt(18))
        .execute(&session)
        .unwrap();
    assert_eq!(count, 3);

    session.clear();
    let left = select_from(&member).fetch(&session).unwrap();
    assert_eq!(usernames(&left), vec!["member1"]);
}

#[test]
fn updates_without_assignments_are_refused() {
    let session = seeded_session();
    let member = QMember::member();

    assert!(update(&member)
        .filter(member.age.gt(18))
        .execute(&session)
        .is_err());
}

#[test]
fn reseeding_replaces_earlier_rows() {
    let session = seeded_session();
    let member = QMember::member();

    update(&member).set(&member.age, 99).execute(&session).unwrap();
    reseed(&session).unwrap();
    session.clear();

    assert_eq!(select_from(&member).fetch_count(&session).unwrap(), 4);

    let member1 = select_from(&member)
        .filter(member.username.eq("member1"))
        .fetch_one(&session)
        .unwrap()
        .unwrap();
    assert_eq!(member1.age, 10);
}
