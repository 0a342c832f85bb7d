//! The unit of work queries run in.
//!
//! A session keeps one instance per persisted entity (its identity map). Reading a row for an
//! entity it already holds hands back the held instance, not the fresh column values. Bulk
//! updates and deletes go straight to the database, so call [Session::clear] after them before
//! reading the affected entities again.
use crate::engine::entity::{Entity, EntityRecord};
use crate::engine::expression::{ColumnRef, Condition, ExprNode};
use crate::engine::mapping::{Hydration, Projection, RowReader};
use crate::engine::query_builder::{Delete, Query, QueryDescriptor, Selection, Source, Update};
use crate::engine::rendering::{self, Dialect};
use crate::engine::sql::{Gateway, Statement};
use crate::engine::value::{FromValue, Value};
use crate::engine::Comparison;
use crate::error::{Error, ErrorKind};
use log::{debug, warn};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;

type IdentityMap = HashMap<(&'static str, i64), Box<dyn Any>>;

pub struct Session {
    gateway: Box<dyn Gateway>,
    identity_map: RefCell<IdentityMap>,
}

impl Session {
    pub fn new(gateway: impl Gateway + 'static) -> Self {
        Session {
            gateway: Box::new(gateway),
            identity_map: RefCell::new(HashMap::new()),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.gateway.dialect()
    }

    pub fn gateway(&self) -> &dyn Gateway {
        self.gateway.as_ref()
    }

    /// Creates the `team` and `member` tables if they don't exist yet.
    pub fn create_schema(&self) -> Result<(), Error> {
        use crate::domain::{Member, Team};

        self.gateway
            .execute(&rendering::render_table::<Team>(self.dialect())?)?;
        self.gateway
            .execute(&rendering::render_table::<Member>(self.dialect())?)?;

        Ok(())
    }

    /// Inserts the entity and fills in its generated key. The session keeps a copy.
    pub fn persist<E>(&self, entity: &mut E) -> Result<(), Error>
    where
        E: Entity,
    {
        if let Some(id) = entity.id() {
            return Err(Error::translation(format!(
                "{} {id} is already persistent",
                E::TABLE
            )));
        }

        let statement = rendering::render_insert(entity, self.dialect())?;
        let rows = self.gateway.query(&statement)?;

        let id = rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .map(|(_, value)| i64::from_value(value))
            .transpose()?
            .ok_or_else(|| Error::decode(format!("inserting into {} returned no key", E::TABLE)))?;

        entity.set_id(id);
        debug!("persisted {} {id}", E::TABLE);

        self.identity_map
            .borrow_mut()
            .insert((E::TABLE, id), Box::new(entity.clone()));

        Ok(())
    }

    /// Looks the entity up by key, going to the database only if the session doesn't hold it.
    pub fn find<E>(&self, id: i64) -> Result<Option<E>, Error>
    where
        E: Entity,
    {
        if let Some(entity) = self.cached::<E>(id) {
            return Ok(Some(entity));
        }

        let descriptor = QueryDescriptor {
            select: vec![Selection::Entity {
                alias: E::TABLE.to_string(),
                table: E::TABLE,
                columns: E::column_names(),
            }],
            from: Some(Source {
                table: E::TABLE,
                alias: E::TABLE.to_string(),
            }),
            filter: Some(Condition::Compare {
                left: ExprNode::Column(ColumnRef {
                    alias: E::TABLE.to_string(),
                    column: "id",
                }),
                comparison: Comparison::Equals,
                right: ExprNode::Literal(Value::Integer(id)),
            }),
            ..QueryDescriptor::default()
        };

        let statement = rendering::render_select(&descriptor, self.dialect())?.statement;
        let Some(row) = self.gateway.query(&statement)?.into_iter().next() else {
            return Ok(None);
        };

        let mut reader = RowReader::new(row, &[])?;
        let record = reader.entity_record(&E::column_names())?;

        self.hydrate(record, Vec::new()).map(Some)
    }

    fn cached<E>(&self, id: i64) -> Option<E>
    where
        E: Entity,
    {
        self.identity_map
            .borrow()
            .get(&(E::TABLE, id))
            .and_then(|entity| entity.downcast_ref::<E>())
            .cloned()
    }

    pub fn contains<E>(&self, id: i64) -> bool
    where
        E: Entity,
    {
        self.identity_map.borrow().contains_key(&(E::TABLE, id))
    }

    /// Forgets a single entity, the next read loads it from the database.
    pub fn evict<E>(&self, id: i64)
    where
        E: Entity,
    {
        self.identity_map.borrow_mut().remove(&(E::TABLE, id));
    }

    /// Forgets every entity.
    pub fn clear(&self) {
        let mut identity_map = self.identity_map.borrow_mut();
        debug!("clearing {} entities from the session", identity_map.len());

        identity_map.clear();
    }

    /// Turns a record into an entity, or into the instance already held for its key.
    pub(crate) fn hydrate<E>(
        &self,
        mut record: EntityRecord,
        relations: Vec<(&'static str, EntityRecord)>,
    ) -> Result<E, Error>
    where
        E: Entity,
    {
        let id = record
            .id()
            .ok_or_else(|| Error::decode(format!("{} row without a key", E::TABLE)))?;

        // Relations are hydrated first, they borrow the identity map themselves.
        let mut hydration = Hydration::new(self, relations);
        let fresh = E::hydrate(&mut record, &mut hydration)?;

        let mut identity_map = self.identity_map.borrow_mut();
        match identity_map
            .get_mut(&(E::TABLE, id))
            .and_then(|entity| entity.downcast_mut::<E>())
        {
            Some(held) => {
                held.absorb(fresh);

                Ok(held.clone())
            }
            None => {
                identity_map.insert((E::TABLE, id), Box::new(fresh.clone()));

                Ok(fresh)
            }
        }
    }

    fn query_rows<P>(&self, projection: &P, descriptor: &QueryDescriptor) -> Result<Vec<P::Output>, Error>
    where
        P: Projection,
    {
        projection.validate()?;
        let rendered = rendering::render_select(descriptor, self.dialect())?;

        self.gateway
            .query(&rendered.statement)?
            .into_iter()
            .map(|row| {
                let mut reader = RowReader::new(row, &rendered.fetches)?;
                projection.read(&mut reader, self)
            })
            .collect()
    }

    fn execute_bulk(&self, statement: &Statement, what: &str) -> Result<u64, Error> {
        let affected = self.gateway.execute(statement)?;

        if affected > 0 && !self.identity_map.borrow().is_empty() {
            warn!("bulk {what} changed {affected} rows, entities held by the session may be stale");
        }

        Ok(affected)
    }
}

impl<P> Query<P>
where
    P: Projection,
{
    pub fn fetch(&self, session: &Session) -> Result<Vec<P::Output>, Error> {
        session.query_rows(self.projection(), self.descriptor())
    }

    /// At most one result. Matching more than one row is an error.
    pub fn fetch_one(&self, session: &Session) -> Result<Option<P::Output>, Error> {
        let descriptor = if self.descriptor().limit.is_none() {
            self.clone_with_limit(2)
        } else {
            self.descriptor().clone()
        };

        let mut results = session.query_rows(self.projection(), &descriptor)?;
        if results.len() > 1 {
            return Err(ErrorKind::NonUniqueResult.into());
        }

        Ok(results.pop())
    }

    /// The first result, if any.
    pub fn fetch_first(&self, session: &Session) -> Result<Option<P::Output>, Error> {
        let descriptor = self.clone_with_limit(1);

        Ok(session
            .query_rows(self.projection(), &descriptor)?
            .into_iter()
            .next())
    }

    /// Number of rows the query matches, ignoring ordering and paging.
    pub fn fetch_count(&self, session: &Session) -> Result<u64, Error> {
        let statement = rendering::render_count(self.descriptor(), session.dialect())?;

        let row = session
            .gateway
            .query(&statement)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::decode("the count query returned no rows"))?;

        let count: i64 = RowReader::new(row, &[])?.read()?;

        u64::try_from(count).map_err(|_| Error::decode(format!("negative row count {count}")))
    }

    fn clone_with_limit(&self, limit: u64) -> QueryDescriptor {
        QueryDescriptor {
            limit: Some(limit),
            ..self.descriptor().clone()
        }
    }
}

impl Update {
    /// Runs the update, returning the number of changed rows.
    pub fn execute(&self, session: &Session) -> Result<u64, Error> {
        let statement = self.to_statement(session.dialect())?;

        session.execute_bulk(&statement, "update")
    }
}

impl Delete {
    /// Runs the delete, returning the number of removed rows.
    pub fn execute(&self, session: &Session) -> Result<u64, Error> {
        let statement = self.to_statement(session.dialect())?;

        session.execute_bulk(&statement, "delete")
    }
}
