//! SQL function templates like `replace({0}, {1}, {2})`.
//!
//! The text between placeholders goes into the statement verbatim, so templates are meant for
//! function calls the builder has no method for, never for user input.
use crate::engine::expression::{Expr, ExprNode};
use crate::error::Error;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "engine/expression/template.pest"]
struct TemplateParser;

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    /// Index into the template's argument list.
    Argument(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Template, Error> {
        let pairs = TemplateParser::parse(Rule::template, source)?;

        let mut segments = Vec::new();
        for pair in pairs.flatten() {
            match pair.as_rule() {
                Rule::text => segments.push(Segment::Text(pair.as_str().to_string())),
                Rule::index => {
                    let index = pair.as_str().parse().map_err(|_| {
                        Error::translation(format!("placeholder {{{}}} is out of range", pair.as_str()))
                    })?;
                    segments.push(Segment::Argument(index));
                }
                _ => {}
            }
        }

        Ok(Template { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    fn placeholders(&self) -> impl Iterator<Item = usize> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Argument(index) => Some(*index),
            Segment::Text(_) => None,
        })
    }
}

/// Builds an expression from an SQL template and its arguments. Every `{n}` placeholder must
/// have a matching argument.
///
/// ```
/// use rusty_query::domain::QMember;
/// use rusty_query::{literal, template};
///
/// let member = QMember::member();
/// let replaced = template::<String>(
///     "replace({0}, {1}, {2})",
///     [(&member.username).into(), literal("member"), literal("M")],
/// );
///
/// assert!(replaced.is_ok());
/// ```
pub fn template<T>(
    sql: &str,
    arguments: impl IntoIterator<Item = ExprNode>,
) -> Result<Expr<T>, Error> {
    let template = Template::parse(sql)?;
    let arguments: Vec<ExprNode> = arguments.into_iter().collect();

    if let Some(index) = template.placeholders().find(|index| *index >= arguments.len()) {
        return Err(Error::translation(format!(
            "template \"{sql}\" uses placeholder {{{index}}}, but only {} arguments were given",
            arguments.len()
        )));
    }

    Ok(Expr::from_node(ExprNode::Template {
        template,
        arguments,
    }))
}
