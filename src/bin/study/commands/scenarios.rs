//! The demo queries, one per scenario of the study.
use clap::ValueEnum;
use rusty_query::domain::{Member, MemberDto, QMember, QTeam, UserDto};
use rusty_query::{
    bean, case, constant, constructor, delete, fields, literal, select, select_from, template,
    tuple, update, Delete, Dialect, EntityPath, Error, ExprNode, Predicate, PredicateBuilder,
    Projection, Query, Session, Statement, Update,
};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, ValueEnum, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// member1, by username
    Search,
    /// age 100 members by username, nulls last
    Sort,
    /// second page of two
    Paging,
    /// count, sum, avg, max and min of all ages
    Aggregation,
    /// average age per team
    Group,
    /// members of teamA
    Join,
    /// members named like a team
    ThetaJoin,
    /// members with their team, if it's teamA
    JoinOnFiltering,
    /// members with the team they are named after
    JoinOnNoRelation,
    /// member1 with its team loaded
    FetchJoin,
    /// the oldest members
    SubQuery,
    /// members at least as old as the average
    SubQueryGoe,
    /// members older than 10, through IN
    SubQueryIn,
    /// usernames next to the average age
    SelectSubQuery,
    BasicCase,
    ComplexCase,
    Constant,
    Concat,
    SimpleProjection,
    TupleProjection,
    DtoBySetter,
    DtoByField,
    DtoByConstructor,
    /// username as name, oldest age as age
    UserDto,
    /// member1 of any age
    DynamicQuery,
    /// members older than 10
    Count,
    /// renames members younger than 28
    BulkUpdate,
    /// doubles every age
    BulkAdd,
    /// removes members older than 18
    BulkDelete,
    /// replace() through a template
    SqlFunction,
    /// members whose username is lower case
    SqlFunction2,
}

/// Something a scenario can render and run.
pub trait Runnable {
    fn statement(&self, dialect: Dialect) -> Result<Statement, Error>;

    fn run(&self, session: &Session) -> Result<serde_json::Value, Error>;
}

impl<P> Runnable for Query<P>
where
    P: Projection,
    P::Output: Serialize,
{
    fn statement(&self, dialect: Dialect) -> Result<Statement, Error> {
        self.to_statement(dialect)
    }

    fn run(&self, session: &Session) -> Result<serde_json::Value, Error> {
        Ok(serde_json::to_value(self.fetch(session)?)?)
    }
}

impl Runnable for Update {
    fn statement(&self, dialect: Dialect) -> Result<Statement, Error> {
        self.to_statement(dialect)
    }

    fn run(&self, session: &Session) -> Result<serde_json::Value, Error> {
        Ok(json!({ "affected": self.execute(session)? }))
    }
}

impl Runnable for Delete {
    fn statement(&self, dialect: Dialect) -> Result<Statement, Error> {
        self.to_statement(dialect)
    }

    fn run(&self, session: &Session) -> Result<serde_json::Value, Error> {
        Ok(json!({ "affected": self.execute(session)? }))
    }
}

/// Runs the count query instead of the query itself.
struct Counted<P>(Query<P>);

impl<P> Runnable for Counted<P>
where
    P: Projection,
{
    fn statement(&self, dialect: Dialect) -> Result<Statement, Error> {
        self.0.to_count_statement(dialect)
    }

    fn run(&self, session: &Session) -> Result<serde_json::Value, Error> {
        Ok(json!({ "count": self.0.fetch_count(session)? }))
    }
}

fn username_eq(member: &QMember, username: Option<&str>) -> Option<Predicate> {
    username.map(|username| member.username.eq(username))
}

fn age_eq(member: &QMember, age: Option<i64>) -> Option<Predicate> {
    age.map(|age| member.age.eq(age))
}

impl Scenario {
    /// Members some scenarios need on top of the seeded ones.
    pub fn extra_members(&self) -> Vec<Member> {
        match self {
            Scenario::Sort => vec![
                Member::new(None, 100, None),
                Member::new(Some("member5"), 100, None),
                Member::new(Some("member6"), 100, None),
            ],
            Scenario::ThetaJoin | Scenario::JoinOnNoRelation => ["teamA", "teamB", "teamC"]
                .into_iter()
                .map(Member::named)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn build(&self) -> Result<Box<dyn Runnable>, Error> {
        let member = QMember::member();
        let member_sub = QMember::new("member_sub");
        let team = QTeam::team();

        let runnable: Box<dyn Runnable> = match self {
            Scenario::Search => Box::new(
                select_from(&member)
                    .filter(member.username.eq("member1").and(member.age.between(10, 30))),
            ),
            Scenario::Sort => Box::new(
                select_from(&member)
                    .filter(member.age.eq(100))
                    .order_by([member.age.desc(), member.username.asc().nulls_last()]),
            ),
            Scenario::Paging => Box::new(
                select_from(&member)
                    .order_by([member.username.desc()])
                    .offset(1)
                    .limit(2),
            ),
            Scenario::Aggregation => Box::new(
                select(tuple![
                    member.count(),
                    member.age.sum(),
                    member.age.avg(),
                    member.age.max(),
                    member.age.min()
                ])
                .from(&member),
            ),
            Scenario::Group => Box::new(
                select(tuple![team.name, member.age.avg()])
                    .from(&member)
                    .join(&member.team, &team)
                    .group_by(&team.name)
                    .order_by([team.name.asc()]),
            ),
            Scenario::Join => Box::new(
                select_from(&member)
                    .join(&member.team, &team)
                    .filter(team.name.eq("teamA")),
            ),
            Scenario::ThetaJoin => Box::new(
                select(member.clone())
                    .from(&member)
                    .from(&team)
                    .filter(member.username.eq(&team.name)),
            ),
            Scenario::JoinOnFiltering => Box::new(
                select((member.clone(), team.or_none()))
                    .from(&member)
                    .left_join(&member.team, &team)
                    .on(team.name.eq("teamA")),
            ),
            Scenario::JoinOnNoRelation => Box::new(
                select((member.clone(), team.or_none()))
                    .from(&member)
                    .left_join_on(&team)
                    .on(member.username.eq(&team.name)),
            ),
            Scenario::FetchJoin => Box::new(
                select_from(&member)
                    .join(&member.team, &team)
                    .fetch_join()
                    .filter(member.username.eq("member1")),
            ),
            Scenario::SubQuery => Box::new(
                select_from(&member)
                    .filter(member.age.eq(select(member_sub.age.max()).from(&member_sub))),
            ),
            Scenario::SubQueryGoe => Box::new(
                select_from(&member)
                    .filter(member.age.goe(select(member_sub.age.avg()).from(&member_sub))),
            ),
            Scenario::SubQueryIn => Box::new(
                select_from(&member).filter(
                    member.age.in_subquery(
                        &select(member_sub.age.clone())
                            .from(&member_sub)
                            .filter(member_sub.age.gt(10)),
                    ),
                ),
            ),
            Scenario::SelectSubQuery => Box::new(
                select((
                    member.username.clone(),
                    select(member_sub.age.avg()).from(&member_sub).as_expr(),
                ))
                .from(&member),
            ),
            Scenario::BasicCase => Box::new(
                select(
                    member
                        .age
                        .when(10)
                        .then("ten")
                        .when(20)
                        .then("twenty")
                        .otherwise("other"),
                )
                .from(&member),
            ),
            Scenario::ComplexCase => Box::new(
                select(
                    case()
                        .when(member.age.between(0, 20))
                        .then("0~20")
                        .when(member.age.between(21, 30))
                        .then("21~30")
                        .otherwise("other"),
                )
                .from(&member),
            ),
            Scenario::Constant => Box::new(
                select(tuple![member.username, constant::<String>("A")]).from(&member),
            ),
            Scenario::Concat => Box::new(
                select(member.username.concat("_").concat(member.age.string_value()))
                    .from(&member)
                    .filter(member.username.eq("member1")),
            ),
            Scenario::SimpleProjection => Box::new(select(member.username.clone()).from(&member)),
            Scenario::TupleProjection => {
                Box::new(select(tuple![member.username, member.age]).from(&member))
            }
            Scenario::DtoBySetter => Box::new(
                select(bean::<MemberDto>(tuple![member.username, member.age])).from(&member),
            ),
            Scenario::DtoByField => Box::new(
                select(fields::<MemberDto>(tuple![member.username, member.age])).from(&member),
            ),
            Scenario::DtoByConstructor => Box::new(
                select(constructor::<UserDto>(tuple![member.username, member.age]))
                    .from(&member),
            ),
            Scenario::UserDto => Box::new(
                select(fields::<UserDto>(tuple![
                    member.username.alias("name"),
                    select(member_sub.age.max())
                        .from(&member_sub)
                        .as_expr()
                        .alias("age")
                ]))
                .from(&member),
            ),
            Scenario::DynamicQuery => {
                let mut builder = PredicateBuilder::new();
                builder
                    .and(username_eq(&member, Some("member1")))
                    .and(age_eq(&member, None));

                Box::new(select_from(&member).filter(builder))
            }
            Scenario::Count => Box::new(Counted(
                select_from(&member).filter(member.age.gt(10)),
            )),
            Scenario::BulkUpdate => Box::new(
                update(&member)
                    .set(&member.username, "non-member")
                    .filter(member.age.lt(28)),
            ),
            Scenario::BulkAdd => {
                Box::new(update(&member).set(&member.age, member.age.multiply(2)))
            }
            Scenario::BulkDelete => Box::new(delete(&member).filter(member.age.gt(18))),
            Scenario::SqlFunction => Box::new(
                select(template::<String>(
                    "replace({0}, {1}, {2})",
                    [ExprNode::from(&member.username), literal("member"), literal("M")],
                )?)
                .from(&member),
            ),
            Scenario::SqlFunction2 => Box::new(
                select(member.username.clone())
                    .from(&member)
                    .filter(member.username.eq(member.username.lower())),
            ),
        };

        Ok(runnable)
    }
}
