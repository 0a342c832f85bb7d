//! Projections into plain record types (DTOs).
//!
//! A record declares how it can be populated in [Bindings]: through named setters, through named
//! fields, or through a constructor taking every selected value in order. The binding strategy is
//! picked per query with [bean], [fields] or [constructor].
use crate::engine::expression::ExprNode;
use crate::engine::mapping::{Projection, RowReader, TupleProjection};
use crate::engine::query_builder::Selection;
use crate::engine::session::Session;
use crate::engine::value::Value;
use crate::error::{Error, ErrorKind};
use std::fmt::{Debug, Formatter};

pub type Binder<R> = fn(&mut R, Value) -> Result<(), Error>;
pub type Constructor<R> = fn(Vec<Value>) -> Result<R, Error>;

pub trait Record: Default {
    fn bindings() -> Bindings<Self>;
}

pub struct Bindings<R> {
    setters: Vec<(&'static str, Binder<R>)>,
    fields: Vec<(&'static str, Binder<R>)>,
    constructor: Option<(usize, Constructor<R>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Setters,
    Fields,
    Constructor,
}

/// Reads rows into `R` using one of its bindings.
pub struct RecordProjection<R> {
    strategy: Strategy,
    nodes: Vec<ExprNode>,
    bindings: Bindings<R>,
}

impl<R> Bindings<R> {
    pub fn new() -> Self {
        Bindings {
            setters: Vec::new(),
            fields: Vec::new(),
            constructor: None,
        }
    }

    pub fn setter(mut self, property: &'static str, setter: Binder<R>) -> Self {
        self.setters.push((property, setter));

        self
    }

    pub fn field(mut self, field: &'static str, binder: Binder<R>) -> Self {
        self.fields.push((field, binder));

        self
    }

    pub fn constructor(mut self, arity: usize, constructor: Constructor<R>) -> Self {
        self.constructor = Some((arity, constructor));

        self
    }
}

impl<R> Default for Bindings<R> {
    fn default() -> Self {
        Bindings::new()
    }
}

impl<R> Clone for Bindings<R> {
    fn clone(&self) -> Self {
        Bindings {
            setters: self.setters.clone(),
            fields: self.fields.clone(),
            constructor: self.constructor,
        }
    }
}

impl<R> Debug for Bindings<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names = |binders: &[(&'static str, Binder<R>)]| {
            binders.iter().map(|(name, _)| *name).collect::<Vec<_>>()
        };

        f.debug_struct("Bindings")
            .field("setters", &names(&self.setters))
            .field("fields", &names(&self.fields))
            .field("constructor", &self.constructor.map(|(arity, _)| arity))
            .finish()
    }
}

impl<R> Clone for RecordProjection<R> {
    fn clone(&self) -> Self {
        RecordProjection {
            strategy: self.strategy,
            nodes: self.nodes.clone(),
            bindings: self.bindings.clone(),
        }
    }
}

impl<R> Debug for RecordProjection<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordProjection")
            .field("strategy", &self.strategy)
            .field("nodes", &self.nodes)
            .finish()
    }
}

fn projection<R>(strategy: Strategy, selection: TupleProjection) -> RecordProjection<R>
where
    R: Record,
{
    RecordProjection {
        strategy,
        nodes: selection.nodes,
        bindings: R::bindings(),
    }
}

/// Populates a default `R` through its setters, matching selections by column name or alias.
/// Selections without a matching setter are skipped.
pub fn bean<R>(selection: TupleProjection) -> RecordProjection<R>
where
    R: Record,
{
    projection(Strategy::Setters, selection)
}

/// Like [bean], but through the record's field bindings.
pub fn fields<R>(selection: TupleProjection) -> RecordProjection<R>
where
    R: Record,
{
    projection(Strategy::Fields, selection)
}

/// Passes every selected value, in order, to the record's constructor.
pub fn constructor<R>(selection: TupleProjection) -> RecordProjection<R>
where
    R: Record,
{
    projection(Strategy::Constructor, selection)
}

impl<R> RecordProjection<R>
where
    R: Record,
{
    fn bind_by_name(
        &self,
        binders: &[(&'static str, Binder<R>)],
        reader: &mut RowReader,
    ) -> Result<R, Error> {
        let mut record = R::default();

        for node in &self.nodes {
            let value = reader.next_value()?;
            let Some(name) = node.name() else {
                continue;
            };

            if let Some((_, bind)) = binders.iter().find(|(property, _)| *property == name) {
                bind(&mut record, value)
                    .map_err(|error| Error::decode(format!("property {name}: {error}")))?;
            }
        }

        Ok(record)
    }
}

impl<R> Projection for RecordProjection<R>
where
    R: Record,
{
    type Output = R;

    fn selections(&self) -> Vec<Selection> {
        self.nodes.iter().cloned().map(Selection::Expression).collect()
    }

    fn read(&self, reader: &mut RowReader, _session: &Session) -> Result<R, Error> {
        match self.strategy {
            Strategy::Setters => self.bind_by_name(&self.bindings.setters, reader),
            Strategy::Fields => self.bind_by_name(&self.bindings.fields, reader),
            Strategy::Constructor => {
                self.validate()?;
                let Some((_, construct)) = self.bindings.constructor else {
                    return Err(Error::translation("the record has no constructor binding"));
                };

                let values = self
                    .nodes
                    .iter()
                    .map(|_| reader.next_value())
                    .collect::<Result<Vec<_>, Error>>()?;

                construct(values)
            }
        }
    }

    fn validate(&self) -> Result<(), Error> {
        if self.strategy != Strategy::Constructor {
            return Ok(());
        }

        match self.bindings.constructor {
            None => Err(Error::translation("the record has no constructor binding")),
            Some((arity, _)) if arity != self.nodes.len() => Err(ErrorKind::ProjectionArity {
                expected: arity,
                found: self.nodes.len(),
            }
            .into()),
            Some(_) => Ok(()),
        }
    }
}
