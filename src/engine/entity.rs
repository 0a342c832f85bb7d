use crate::engine::expression::Expr;
use crate::engine::mapping::{Hydration, OptionalEntity};
use crate::engine::session::Session;
use crate::engine::value::{FromValue, Value};
use crate::error::Error;
use serde::Serialize;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Generated primary key. Always the first column of an entity.
    Id,
    Integer,
    Text,
    /// Foreign key to the primary key of the named table.
    Reference(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl ColumnDef {
    pub const fn id() -> Self {
        ColumnDef {
            name: "id",
            column_type: ColumnType::Id,
            nullable: false,
        }
    }

    pub const fn new(name: &'static str, column_type: ColumnType, nullable: bool) -> Self {
        ColumnDef {
            name,
            column_type,
            nullable,
        }
    }
}

/// A persistent type mapped onto a single table.
pub trait Entity: Clone + 'static {
    const TABLE: &'static str;
    /// All mapped columns, starting with the primary key.
    const COLUMNS: &'static [ColumnDef];

    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    /// Values for every column except the primary key, in [Entity::COLUMNS] order.
    fn values(&self) -> Result<Vec<Value>, Error>;

    fn hydrate(record: &mut EntityRecord, hydration: &mut Hydration) -> Result<Self, Error>;

    /// Merges data from a fresh read into an instance already held by the session. The cached
    /// column values win.
    fn absorb(&mut self, _fresh: Self) {}

    fn column_names() -> Vec<&'static str> {
        Self::COLUMNS.iter().map(|column| column.name).collect()
    }
}

/// An aliased reference to an entity, `QMember::new("m")` for example.
pub trait EntityPath {
    type Entity: Entity;

    fn alias(&self) -> &str;

    fn table(&self) -> &'static str {
        Self::Entity::TABLE
    }

    fn id_column(&self) -> Expr<i64> {
        Expr::column(self.alias(), "id")
    }

    /// Number of entities, as an aggregate over the primary key.
    fn count(&self) -> Expr<i64> {
        self.id_column().count()
    }

    /// Projects the entity as `Option<Entity>`, for the nullable side of left joins.
    fn or_none(&self) -> OptionalEntity<Self>
    where
        Self: Clone,
    {
        OptionalEntity::new(self.clone())
    }
}

/// A to-one association from an owning entity to the entity path `P`.
pub struct RelationPath<P> {
    owner_alias: String,
    name: &'static str,
    foreign_key: &'static str,
    marker: PhantomData<fn() -> P>,
}

impl<P> RelationPath<P> {
    pub fn new(owner_alias: &str, name: &'static str, foreign_key: &'static str) -> Self {
        RelationPath {
            owner_alias: owner_alias.to_string(),
            name,
            foreign_key,
            marker: PhantomData,
        }
    }

    /// The foreign key column on the owner.
    pub fn id(&self) -> Expr<i64> {
        Expr::column(&self.owner_alias, self.foreign_key)
    }

    pub fn owner_alias(&self) -> &str {
        &self.owner_alias
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn foreign_key(&self) -> &'static str {
        self.foreign_key
    }
}

impl<P> Clone for RelationPath<P> {
    fn clone(&self) -> Self {
        RelationPath {
            owner_alias: self.owner_alias.clone(),
            name: self.name,
            foreign_key: self.foreign_key,
            marker: PhantomData,
        }
    }
}

impl<P> Debug for RelationPath<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.owner_alias, self.name)
    }
}

/// The target of a to-one association. Unless it was fetch-joined, only its key is known.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Relation<T> {
    Loaded(T),
    Unresolved(i64),
}

impl<T> Relation<T>
where
    T: Entity,
{
    pub fn id(&self) -> Option<i64> {
        match self {
            Relation::Loaded(entity) => entity.id(),
            Relation::Unresolved(id) => Some(*id),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Relation::Loaded(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Relation::Loaded(entity) => Some(entity),
            Relation::Unresolved(_) => None,
        }
    }

    /// Loads the target through the session if it's not there yet.
    pub fn resolve(&mut self, session: &Session) -> Result<&T, Error> {
        if let Relation::Unresolved(id) = *self {
            let entity = session.find::<T>(id)?.ok_or_else(|| {
                Error::decode(format!("no {} row with id {id}", T::TABLE))
            })?;
            *self = Relation::Loaded(entity);
        }

        match self {
            Relation::Loaded(entity) => Ok(entity),
            Relation::Unresolved(id) => Err(Error::decode(format!(
                "{} {id} is still unresolved",
                T::TABLE
            ))),
        }
    }
}

/// Column values of a single entity, read from one row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityRecord {
    values: Vec<(&'static str, Value)>,
}

impl EntityRecord {
    pub fn new(values: Vec<(&'static str, Value)>) -> Self {
        EntityRecord { values }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    /// Moves a column value out of the record.
    pub fn take<T>(&mut self, column: &str) -> Result<T, Error>
    where
        T: FromValue,
    {
        let value = self
            .values
            .iter_mut()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| std::mem::replace(value, Value::Null))
            .ok_or_else(|| Error::decode(format!("column {column} was not selected")))?;

        T::from_value(value).map_err(|error| {
            Error::decode(format!("column {column}: {error}"))
        })
    }

    pub fn id(&self) -> Option<i64> {
        match self.get("id") {
            Some(Value::Integer(id)) => Some(*id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_hand_out_each_value_once() {
        let mut record = EntityRecord::new(vec![
            ("id", Value::Integer(1)),
            ("username", Value::Text("member1".into())),
        ]);

        assert_eq!(record.id(), Some(1));
        assert_eq!(record.take::<String>("username").unwrap(), "member1");
        assert_eq!(record.take::<Option<String>>("username").unwrap(), None);
        assert!(record.take::<i64>("age").is_err());
    }

    #[test]
    fn relation_paths_point_at_the_foreign_key() {
        let team = RelationPath::<()>::new("member", "team", "team_id");

        assert_eq!(team.id().node(), Expr::<i64>::column("member", "team_id").node());
        assert_eq!(format!("{:?}", team), "member.team");
    }
}
