use crate::domain::member::{Member, QMember};
use crate::engine::entity::{ColumnDef, ColumnType, Entity, EntityPath, EntityRecord};
use crate::engine::expression::Expr;
use crate::engine::mapping::{entity_selection, read_required_entity, Hydration, Projection, RowReader};
use crate::engine::query_builder::{select_from, Selection};
use crate::engine::session::Session;
use crate::engine::value::Value;
use crate::error::Error;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Team {
    pub id: Option<i64>,
    pub name: String,
}

impl Team {
    pub fn new(name: &str) -> Self {
        Team {
            id: None,
            name: name.to_string(),
        }
    }

    /// Members of the team, by key. A team that was never persisted has none.
    pub fn members(&self, session: &Session) -> Result<Vec<Member>, Error> {
        let Some(id) = self.id else {
            return Ok(Vec::new());
        };

        let member = QMember::member();

        select_from(&member)
            .filter(member.team.id().eq(id))
            .order_by([member.id.asc()])
            .fetch(session)
    }
}

impl Entity for Team {
    const TABLE: &'static str = "team";
    const COLUMNS: &'static [ColumnDef] = &[
        ColumnDef::id(),
        ColumnDef::new("name", ColumnType::Text, false),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn values(&self) -> Result<Vec<Value>, Error> {
        Ok(vec![self.name.as_str().into()])
    }

    fn hydrate(record: &mut EntityRecord, _hydration: &mut Hydration) -> Result<Self, Error> {
        Ok(Team {
            id: record.take("id")?,
            name: record.take("name")?,
        })
    }
}

/// Column handles for `team`, under some alias.
#[derive(Debug, Clone)]
pub struct QTeam {
    alias: String,
    pub id: Expr<i64>,
    pub name: Expr<String>,
}

impl QTeam {
    pub fn new(alias: &str) -> Self {
        QTeam {
            alias: alias.to_string(),
            id: Expr::column(alias, "id"),
            name: Expr::column(alias, "name"),
        }
    }

    pub fn team() -> Self {
        QTeam::new("team")
    }
}

impl EntityPath for QTeam {
    type Entity = Team;

    fn alias(&self) -> &str {
        &self.alias
    }
}

impl Projection for QTeam {
    type Output = Team;

    fn selections(&self) -> Vec<Selection> {
        entity_selection(self)
    }

    fn read(&self, reader: &mut RowReader, session: &Session) -> Result<Team, Error> {
        read_required_entity(&self.alias, reader, session)
    }
}
