use crate::domain::team::{QTeam, Team};
use crate::engine::entity::{
    ColumnDef, ColumnType, Entity, EntityPath, EntityRecord, Relation, RelationPath,
};
use crate::engine::expression::Expr;
use crate::engine::mapping::{entity_selection, read_required_entity, Hydration, Projection, RowReader};
use crate::engine::query_builder::Selection;
use crate::engine::session::Session;
use crate::engine::value::Value;
use crate::error::Error;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub age: i64,
    /// Loaded when fetch joined, otherwise only the key is known until resolved.
    pub team: Option<Relation<Team>>,
}

impl Member {
    pub fn new(username: Option<&str>, age: i64, team: Option<&Team>) -> Self {
        Member {
            id: None,
            username: username.map(str::to_string),
            age,
            team: team.cloned().map(Relation::Loaded),
        }
    }

    /// A member without a team, aged 0.
    pub fn named(username: &str) -> Self {
        Member::new(Some(username), 0, None)
    }

    pub fn team_id(&self) -> Option<i64> {
        self.team.as_ref().and_then(Relation::id)
    }
}

impl Entity for Member {
    const TABLE: &'static str = "member";
    const COLUMNS: &'static [ColumnDef] = &[
        ColumnDef::id(),
        ColumnDef::new("username", ColumnType::Text, true),
        ColumnDef::new("age", ColumnType::Integer, false),
        ColumnDef::new("team_id", ColumnType::Reference(Team::TABLE), true),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn values(&self) -> Result<Vec<Value>, Error> {
        let team_id = match &self.team {
            None => None,
            Some(team) => Some(team.id().ok_or_else(|| {
                Error::translation("the member's team has to be persisted first")
            })?),
        };

        Ok(vec![
            self.username.clone().into(),
            self.age.into(),
            team_id.into(),
        ])
    }

    fn hydrate(record: &mut EntityRecord, hydration: &mut Hydration) -> Result<Self, Error> {
        let team_id: Option<i64> = record.take("team_id")?;
        let team = match hydration.related::<Team>("team")? {
            Some(team) => Some(Relation::Loaded(team)),
            None => team_id.map(Relation::Unresolved),
        };

        Ok(Member {
            id: record.take("id")?,
            username: record.take("username")?,
            age: record.take("age")?,
            team,
        })
    }

    fn absorb(&mut self, fresh: Self) {
        if !matches!(self.team, Some(Relation::Unresolved(_))) {
            return;
        }

        if let Some(Relation::Loaded(team)) = fresh.team {
            self.team = Some(Relation::Loaded(team));
        }
    }
}

/// Column handles for `member`, under some alias.
#[derive(Debug, Clone)]
pub struct QMember {
    alias: String,
    pub id: Expr<i64>,
    pub username: Expr<String>,
    pub age: Expr<i64>,
    pub team: RelationPath<QTeam>,
}

impl QMember {
    pub fn new(alias: &str) -> Self {
        QMember {
            alias: alias.to_string(),
            id: Expr::column(alias, "id"),
            username: Expr::column(alias, "username"),
            age: Expr::column(alias, "age"),
            team: RelationPath::new(alias, "team", "team_id"),
        }
    }

    pub fn member() -> Self {
        QMember::new("member")
    }
}

impl EntityPath for QMember {
    type Entity = Member;

    fn alias(&self) -> &str {
        &self.alias
    }
}

impl Projection for QMember {
    type Output = Member;

    fn selections(&self) -> Vec<Selection> {
        entity_selection(self)
    }

    fn read(&self, reader: &mut RowReader, session: &Session) -> Result<Member, Error> {
        read_required_entity(&self.alias, reader, session)
    }
}
