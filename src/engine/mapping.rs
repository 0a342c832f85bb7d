use crate::engine::entity::{Entity, EntityPath, EntityRecord};
use crate::engine::expression::{Expr, ExprNode};
use crate::engine::query_builder::Selection;
use crate::engine::rendering::FetchSlot;
use crate::engine::session::Session;
use crate::engine::sql::Row;
use crate::engine::value::{FromValue, Value};
use crate::error::Error;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

pub mod record;

/// Describes what a query selects, and how to turn each row back into Rust values.
pub trait Projection {
    type Output;

    fn selections(&self) -> Vec<Selection>;

    /// Reads one row. Implementations consume exactly as many values as they select.
    fn read(&self, reader: &mut RowReader, session: &Session) -> Result<Self::Output, Error>;

    /// Checks the projection before the query is sent.
    fn validate(&self) -> Result<(), Error> {
        Ok(())
    }
}

/// Hands out the values of a row in selection order.
#[derive(Debug)]
pub struct RowReader {
    values: std::vec::IntoIter<Value>,
    /// Fetch joined entities: owner alias, relation name and the record itself.
    relations: Vec<(String, &'static str, EntityRecord)>,
}

impl RowReader {
    pub(crate) fn new(row: Row, fetches: &[FetchSlot]) -> Result<Self, Error> {
        let mut values: Vec<Value> = row.into_iter().map(|(_, value)| value).collect();
        let mut relations = Vec::with_capacity(fetches.len());

        // Fetched columns come last, so peel them off from the back.
        for slot in fetches.iter().rev() {
            if values.len() != slot.offset + slot.columns.len() {
                return Err(Error::decode(format!(
                    "expected the columns of {}.{} at position {}, but the row has {} columns",
                    slot.owner_alias,
                    slot.relation,
                    slot.offset,
                    values.len()
                )));
            }

            let fetched = values.split_off(slot.offset);
            let record = EntityRecord::new(slot.columns.iter().copied().zip(fetched).collect());
            relations.push((slot.owner_alias.clone(), slot.relation, record));
        }

        Ok(RowReader {
            values: values.into_iter(),
            relations,
        })
    }

    pub fn next_value(&mut self) -> Result<Value, Error> {
        self.values
            .next()
            .ok_or_else(|| Error::decode("the row has fewer columns than the projection"))
    }

    pub fn read<T>(&mut self) -> Result<T, Error>
    where
        T: FromValue,
    {
        T::from_value(self.next_value()?)
    }

    pub fn entity_record(&mut self, columns: &[&'static str]) -> Result<EntityRecord, Error> {
        let values = columns
            .iter()
            .map(|column| Ok((*column, self.next_value()?)))
            .collect::<Result<_, Error>>()?;

        Ok(EntityRecord::new(values))
    }

    /// Fetched relation records belonging to the entity aliased `owner_alias`.
    pub fn take_relations(&mut self, owner_alias: &str) -> Vec<(&'static str, EntityRecord)> {
        let (owned, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.relations)
            .into_iter()
            .partition(|(owner, _, _)| owner == owner_alias);
        self.relations = rest;

        owned
            .into_iter()
            .map(|(_, relation, record)| (relation, record))
            .collect()
    }
}

/// Context for [Entity::hydrate]: the session and whatever relations were fetched along.
pub struct Hydration<'a> {
    session: &'a Session,
    relations: Vec<(&'static str, EntityRecord)>,
}

impl<'a> Hydration<'a> {
    pub(crate) fn new(session: &'a Session, relations: Vec<(&'static str, EntityRecord)>) -> Self {
        Hydration { session, relations }
    }

    /// The fetched target of the named relation, if it was fetch joined and matched a row.
    pub fn related<E>(&mut self, name: &str) -> Result<Option<E>, Error>
    where
        E: Entity,
    {
        let Some(index) = self.relations.iter().position(|(relation, _)| *relation == name) else {
            return Ok(None);
        };

        let (_, record) = self.relations.swap_remove(index);
        if record.id().is_none() {
            return Ok(None);
        }

        self.session.hydrate::<E>(record, Vec::new()).map(Some)
    }
}

pub fn entity_selection<P>(path: &P) -> Vec<Selection>
where
    P: EntityPath,
{
    vec![Selection::Entity {
        alias: path.alias().to_string(),
        table: path.table(),
        columns: P::Entity::column_names(),
    }]
}

/// Reads the entity aliased `alias`, `None` if its key is NULL.
pub fn read_entity<E>(alias: &str, reader: &mut RowReader, session: &Session) -> Result<Option<E>, Error>
where
    E: Entity,
{
    let record = reader.entity_record(&E::column_names())?;
    let relations = reader.take_relations(alias);

    if record.id().is_none() {
        return Ok(None);
    }

    session.hydrate(record, relations).map(Some)
}

pub fn read_required_entity<E>(alias: &str, reader: &mut RowReader, session: &Session) -> Result<E, Error>
where
    E: Entity,
{
    read_entity(alias, reader, session)?.ok_or_else(|| {
        Error::decode(format!(
            "{alias} has no {} row, use or_none() on the nullable side of left joins",
            E::TABLE
        ))
    })
}

impl<T> Projection for Expr<T>
where
    T: FromValue,
{
    type Output = T;

    fn selections(&self) -> Vec<Selection> {
        vec![Selection::Expression(self.node().clone())]
    }

    fn read(&self, reader: &mut RowReader, _session: &Session) -> Result<T, Error> {
        reader.read()
    }
}

macro_rules! tuple_projection {
    ($($name:ident),+) => {
        impl<$($name),+> Projection for ($($name,)+)
        where
            $($name: Projection,)+
        {
            type Output = ($($name::Output,)+);

            fn selections(&self) -> Vec<Selection> {
                #[allow(non_snake_case)]
                let ($($name,)+) = self;
                let mut selections = Vec::new();
                $(selections.extend($name.selections());)+

                selections
            }

            fn read(&self, reader: &mut RowReader, session: &Session) -> Result<Self::Output, Error> {
                #[allow(non_snake_case)]
                let ($($name,)+) = self;

                Ok(($($name.read(reader, session)?,)+))
            }

            fn validate(&self) -> Result<(), Error> {
                #[allow(non_snake_case)]
                let ($($name,)+) = self;
                $($name.validate()?;)+

                Ok(())
            }
        }
    };
}

tuple_projection!(A, B);
tuple_projection!(A, B, C);
tuple_projection!(A, B, C, D);

/// The nullable side of a left join, see [EntityPath::or_none].
#[derive(Debug, Clone)]
pub struct OptionalEntity<P> {
    path: P,
}

impl<P> OptionalEntity<P> {
    pub fn new(path: P) -> Self {
        OptionalEntity { path }
    }
}

impl<P> Projection for OptionalEntity<P>
where
    P: EntityPath,
{
    type Output = Option<P::Entity>;

    fn selections(&self) -> Vec<Selection> {
        entity_selection(&self.path)
    }

    fn read(&self, reader: &mut RowReader, session: &Session) -> Result<Self::Output, Error> {
        read_entity(self.path.alias(), reader, session)
    }
}

/// Selects any number of expressions into a [Tuple], see [tuple!](crate::tuple).
#[derive(Debug, Clone, PartialEq)]
pub struct TupleProjection {
    nodes: Vec<ExprNode>,
}

impl TupleProjection {
    pub fn new(nodes: Vec<ExprNode>) -> Self {
        TupleProjection { nodes }
    }
}

/// A row of values, looked up by the expressions that selected them.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    entries: Vec<(ExprNode, Value)>,
}

impl Tuple {
    pub fn get<T>(&self, expr: &Expr<T>) -> Result<T, Error>
    where
        T: FromValue,
    {
        let value = self
            .entries
            .iter()
            .find(|(node, _)| node == expr.node())
            .map(|(_, value)| value.clone())
            .ok_or_else(|| Error::decode(format!("{:?} was not selected", expr.node())))?;

        T::from_value(value)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Tuple {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for value in self.values() {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

impl Projection for TupleProjection {
    type Output = Tuple;

    fn selections(&self) -> Vec<Selection> {
        self.nodes.iter().cloned().map(Selection::Expression).collect()
    }

    fn read(&self, reader: &mut RowReader, _session: &Session) -> Result<Tuple, Error> {
        let entries = self
            .nodes
            .iter()
            .map(|node| Ok((node.clone(), reader.next_value()?)))
            .collect::<Result<_, Error>>()?;

        Ok(Tuple { entries })
    }
}

/// Builds a [TupleProjection](crate::TupleProjection) from expressions:
/// `select(tuple![member.username, member.age])`.
#[macro_export]
macro_rules! tuple {
    ($($expr:expr),* $(,)?) => {
        $crate::TupleProjection::new(vec![$($crate::ExprNode::from(&$expr)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: Vec<Value>) -> Row {
        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| (format!("c{index}"), value))
            .collect()
    }

    #[test]
    fn fetched_columns_are_split_off() {
        let fetches = [FetchSlot {
            owner_alias: "member".to_string(),
            relation: "team",
            columns: vec!["id", "name"],
            offset: 2,
        }];
        let row = row(vec![
            Value::Integer(1),
            Value::Text("member1".into()),
            Value::Integer(7),
            Value::Text("teamA".into()),
        ]);

        let mut reader = RowReader::new(row, &fetches).unwrap();

        assert_eq!(reader.read::<i64>().unwrap(), 1);
        assert_eq!(reader.read::<String>().unwrap(), "member1");
        assert!(reader.next_value().is_err());

        let relations = reader.take_relations("member");
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].1.id(), Some(7));
        assert!(reader.take_relations("member").is_empty());
    }

    #[test]
    fn short_rows_are_rejected() {
        let fetches = [FetchSlot {
            owner_alias: "member".to_string(),
            relation: "team",
            columns: vec!["id", "name"],
            offset: 2,
        }];

        assert!(RowReader::new(row(vec![Value::Integer(1)]), &fetches).is_err());
    }

    #[test]
    fn tuples_find_values_by_expression() {
        let username = Expr::<String>::column("member", "username");
        let age = Expr::<i64>::column("member", "age");
        let tuple = Tuple {
            entries: vec![
                (username.node().clone(), Value::Text("member1".into())),
                (age.node().clone(), Value::Integer(10)),
            ],
        };

        assert_eq!(tuple.get(&username).unwrap(), "member1");
        assert_eq!(tuple.get(&age).unwrap(), 10);
        assert!(tuple.get(&age.max()).is_err());
        assert_eq!(serde_json::to_string(&tuple).unwrap(), r#"["member1",10]"#);
    }

    #[test]
    fn the_tuple_macro_keeps_the_order() {
        let username = Expr::<String>::column("member", "username");
        let age = Expr::<i64>::column("member", "age");

        let projection = crate::tuple![username, age.avg()];

        assert_eq!(
            projection.selections(),
            vec![
                Selection::Expression(username.node().clone()),
                Selection::Expression(age.avg().node().clone()),
            ]
        );
    }
}
