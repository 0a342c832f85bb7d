use super::seeded_session;
use crate::domain::{MemberDto, QMember, UserDto};
use crate::engine::expression::case::case;
use crate::engine::expression::template::template;
use crate::engine::expression::{constant, literal, ExprNode};
use crate::engine::mapping::record::{bean, constructor, fields};
use crate::engine::query_builder::select;
use crate::error::ErrorKind;
use crate::tuple;

#[test]
fn simple_projection() {
    let session = seeded_session();
    let member = QMember::member();

    let usernames = select(member.username.clone())
        .from(&member)
        .order_by([member.username.asc()])
        .fetch(&session)
        .unwrap();

    assert_eq!(usernames, vec!["member1", "member2", "member3", "member4"]);
}

#[test]
fn nullable_columns_need_an_optional_projection() {
    let session = seeded_session();
    session
        .persist(&mut crate::domain::Member::new(None, 50, None))
        .unwrap();
    let member = QMember::member();

    assert!(select(member.username.clone())
        .from(&member)
        .fetch(&session)
        .is_err());

    let usernames = select(member.username.nullable())
        .from(&member)
        .filter(member.age.eq(50))
        .fetch(&session)
        .unwrap();
    assert_eq!(usernames, vec![None]);
}

#[test]
fn tuple_projection() {
    let session = seeded_session();
    let member = QMember::member();

    let result = select(tuple![member.username, member.age])
        .from(&member)
        .order_by([member.age.asc()])
        .fetch(&session)
        .unwrap();

    assert_eq!(result.len(), 4);
    assert_eq!(result[0].get(&member.username).unwrap(), "member1");
    assert_eq!(result[0].get(&member.age).unwrap(), 10);
    assert_eq!(
        serde_json::to_string(&result[3]).unwrap(),
        r#"["member4",40]"#
    );
}

#[test]
fn simple_case() {
    let session = seeded_session();
    let member = QMember::member();

    let result = select(
        member
            .age
            .when(10)
            .then("ten")
            .when(20)
            .then("twenty")
            .otherwise("other"),
    )
    .from(&member)
    .order_by([member.age.asc()])
    .fetch(&session)
    .unwrap();

    assert_eq!(result, vec!["ten", "twenty", "other", "other"]);
}

#[test]
fn searched_case() {
    let session = seeded_session();
    let member = QMember::member();

    let result = select(
        case()
            .when(member.age.between(0, 20))
            .then("0~20")
            .when(member.age.between(21, 30))
            .then("21~30")
            .otherwise("other"),
    )
    .from(&member)
    .order_by([member.age.asc()])
    .fetch(&session)
    .unwrap();

    assert_eq!(result, vec!["0~20", "0~20", "21~30", "other"]);
}

#[test]
fn the_first_matching_branch_wins() {
    let session = seeded_session();
    let member = QMember::member();

    let result = select(
        case()
            .when(member.age.goe(10))
            .then(1)
            .when(member.age.goe(30))
            .then(2)
            .otherwise(3),
    )
    .from(&member)
    .fetch(&session)
    .unwrap();

    assert_eq!(result, vec![1i64, 1, 1, 1]);
}

#[test]
fn constants_are_selected_for_every_row() {
    let session = seeded_session();
    let member = QMember::member();
    let a = constant::<String>("A");

    let result = select(tuple![member.username, a])
        .from(&member)
        .fetch(&session)
        .unwrap();

    assert_eq!(result.len(), 4);
    assert!(result.iter().all(|tuple| tuple.get(&a).unwrap() == "A"));
}

#[test]
fn concatenation() {
    let session = seeded_session();
    let member = QMember::member();

    let result = select(member.username.concat("_").concat(member.age.string_value()))
        .from(&member)
        .filter(member.username.eq("member1"))
        .fetch(&session)
        .unwrap();

    assert_eq!(result, vec!["member1_10"]);
}

#[test]
fn sql_templates() {
    let session = seeded_session();
    let member = QMember::member();

    let replaced = template::<String>(
        "replace({0}, {1}, {2})",
        [ExprNode::from(&member.username), literal("member"), literal("M")],
    )
    .unwrap();

    let result = select(replaced)
        .from(&member)
        .order_by([member.username.asc()])
        .fetch(&session)
        .unwrap();

    assert_eq!(result, vec!["M1", "M2", "M3", "M4"]);
}

#[test]
fn templates_need_all_their_arguments() {
    let member = QMember::member();

    let error = template::<String>("replace({0}, {1}, {2})", [ExprNode::from(&member.username)])
        .unwrap_err();

    assert!(matches!(error.kind(), ErrorKind::Translation(_)));
}

#[test]
fn records_by_setter() {
    let session = seeded_session();
    let member = QMember::member();

    let result = select(bean::<MemberDto>(tuple![member.username, member.age]))
        .from(&member)
        .order_by([member.age.asc()])
        .fetch(&session)
        .unwrap();

    assert_eq!(result[0], MemberDto::new("member1".to_string(), 10));
    assert_eq!(result.len(), 4);
}

#[test]
fn records_by_field() {
    let session = seeded_session();
    let member = QMember::member();

    let result = select(fields::<MemberDto>(tuple![member.username, member.age, member.id]))
        .from(&member)
        .order_by([member.age.desc()])
        .fetch(&session)
        .unwrap();

    assert_eq!(result[0], MemberDto::new("member4".to_string(), 40));
}

#[test]
fn records_by_constructor() {
    let session = seeded_session();
    let member = QMember::member();

    let result = select(constructor::<UserDto>(tuple![member.username, member.age]))
        .from(&member)
        .order_by([member.age.asc()])
        .fetch(&session)
        .unwrap();

    assert_eq!(result[1], UserDto::new("member2".to_string(), 20));
}

#[test]
fn constructor_arity_mismatches_fail_before_querying() {
    let session = seeded_session();
    let member = QMember::member();

    let error = select(constructor::<UserDto>(tuple![member.username, member.age, member.id]))
        .from(&member)
        .fetch(&session)
        .unwrap_err();

    assert!(matches!(
        error.kind(),
        ErrorKind::ProjectionArity {
            expected: 2,
            found: 3
        }
    ));
}

#[test]
fn records_by_alias_and_subquery() {
    let session = seeded_session();
    let member = QMember::member();
    let member_sub = QMember::new("member_sub");

    let oldest = select(member_sub.age.max()).from(&member_sub);

    let result = select(fields::<UserDto>(tuple![
        member.username.alias("name"),
        oldest.as_expr().alias("age")
    ]))
    .from(&member)
    .order_by([member.username.asc()])
    .fetch(&session)
    .unwrap();

    assert_eq!(result[0], UserDto::new("member1".to_string(), 40));
    assert!(result.iter().all(|user| user.age == 40));
}
