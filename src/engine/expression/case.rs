//! CASE expressions.
//!
//! The builders are typestates: a `when` must be followed by a `then`, and only a complete list
//! of branches can be finished with `otherwise`. The result type is fixed by the first `then`.
use crate::engine::expression::{Condition, Expr, ExprNode, IntoExpr, Predicate};
use crate::engine::value::Value;
use crate::engine::Comparison;
use std::marker::PhantomData;

/// Starts a searched CASE expression:
/// `case().when(member.age.between(0, 20)).then("0~20").otherwise("other")`.
pub fn case() -> CaseBuilder {
    CaseBuilder
}

/// Values that can open the list of branches, fixing the type of the whole CASE.
pub trait CaseValue {
    type Output;

    fn into_case_node(self) -> ExprNode;
}

#[derive(Debug, Clone, Copy)]
pub struct CaseBuilder;

#[derive(Debug, Clone)]
pub struct CaseWhen {
    branches: Vec<(Condition, ExprNode)>,
    condition: Condition,
}

#[derive(Debug, Clone)]
pub struct Cases<R> {
    branches: Vec<(Condition, ExprNode)>,
    marker: PhantomData<fn() -> R>,
}

#[derive(Debug, Clone)]
pub struct CasesWhen<R> {
    cases: Cases<R>,
    condition: Condition,
}

/// A CASE over a single operand, started with [Expr::when].
#[derive(Debug, Clone)]
pub struct SimpleCaseWhen<T> {
    operand: ExprNode,
    value: ExprNode,
    marker: PhantomData<fn() -> T>,
}

#[derive(Debug, Clone)]
pub struct SimpleCases<T, R> {
    operand: ExprNode,
    cases: Cases<R>,
    marker: PhantomData<fn() -> T>,
}

#[derive(Debug, Clone)]
pub struct SimpleCasesWhen<T, R> {
    cases: SimpleCases<T, R>,
    value: ExprNode,
}

impl CaseBuilder {
    pub fn when(self, predicate: Predicate) -> CaseWhen {
        CaseWhen {
            branches: Vec::new(),
            condition: predicate.0,
        }
    }
}

impl CaseWhen {
    pub fn then<V>(self, value: V) -> Cases<V::Output>
    where
        V: CaseValue,
    {
        let mut branches = self.branches;
        branches.push((self.condition, value.into_case_node()));

        Cases {
            branches,
            marker: PhantomData,
        }
    }
}

impl<R> Cases<R> {
    pub fn when(self, predicate: Predicate) -> CasesWhen<R> {
        CasesWhen {
            cases: self,
            condition: predicate.0,
        }
    }

    pub fn otherwise(self, value: impl IntoExpr<R>) -> Expr<R> {
        Expr::from_node(ExprNode::Case {
            branches: self.branches,
            otherwise: Box::new(value.into_expr_node()),
        })
    }
}

impl<R> CasesWhen<R> {
    pub fn then(self, value: impl IntoExpr<R>) -> Cases<R> {
        let mut cases = self.cases;
        cases.branches.push((self.condition, value.into_expr_node()));

        cases
    }
}

/// A simple CASE compares with `=`, so a NULL branch value never matches.
fn equals(operand: &ExprNode, value: ExprNode) -> Condition {
    if value == ExprNode::Literal(Value::Null) {
        return Condition::In {
            operand: operand.clone(),
            values: Vec::new(),
        };
    }

    Condition::Compare {
        left: operand.clone(),
        comparison: Comparison::Equals,
        right: value,
    }
}

impl<T> SimpleCaseWhen<T> {
    pub(crate) fn new(operand: ExprNode, value: ExprNode) -> Self {
        SimpleCaseWhen {
            operand,
            value,
            marker: PhantomData,
        }
    }

    pub fn then<V>(self, result: V) -> SimpleCases<T, V::Output>
    where
        V: CaseValue,
    {
        let branch = (equals(&self.operand, self.value), result.into_case_node());

        SimpleCases {
            operand: self.operand,
            cases: Cases {
                branches: vec![branch],
                marker: PhantomData,
            },
            marker: PhantomData,
        }
    }
}

impl<T, R> SimpleCases<T, R> {
    pub fn when(self, value: impl IntoExpr<T>) -> SimpleCasesWhen<T, R> {
        SimpleCasesWhen {
            cases: self,
            value: value.into_expr_node(),
        }
    }

    pub fn otherwise(self, value: impl IntoExpr<R>) -> Expr<R> {
        self.cases.otherwise(value)
    }
}

impl<T, R> SimpleCasesWhen<T, R> {
    pub fn then(self, result: impl IntoExpr<R>) -> SimpleCases<T, R> {
        let mut cases = self.cases;
        let condition = equals(&cases.operand, self.value);
        cases.cases.branches.push((condition, result.into_expr_node()));

        cases
    }
}

macro_rules! case_value {
    ($($source:ty => $output:ty),* $(,)?) => {
        $(
            impl CaseValue for $source {
                type Output = $output;

                fn into_case_node(self) -> ExprNode {
                    IntoExpr::<$output>::into_expr_node(self)
                }
            }
        )*
    };
}

case_value!(
    i64 => i64,
    i32 => i64,
    f64 => f64,
    bool => bool,
    &str => String,
    String => String,
);

impl<T> CaseValue for Expr<T> {
    type Output = T;

    fn into_case_node(self) -> ExprNode {
        self.into()
    }
}

impl<T> CaseValue for &Expr<T> {
    type Output = T;

    fn into_case_node(self) -> ExprNode {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branches_keep_their_order() {
        let age = Expr::<i64>::column("member", "age");
        let label = case()
            .when(age.between(0, 20))
            .then("0~20")
            .when(age.between(21, 30))
            .then("21~30")
            .otherwise("other");

        match label.node() {
            ExprNode::Case {
                branches,
                otherwise,
            } => {
                assert_eq!(branches.len(), 2);
                assert_eq!(branches[1].1, crate::literal("21~30"));
                assert_eq!(**otherwise, crate::literal("other"));
            }
            other => panic!("expected a CASE, got {:?}", other),
        }
    }

    #[test]
    fn simple_cases_compare_the_operand() {
        let age = Expr::<i64>::column("member", "age");
        let label = age.when(10).then("ten").when(20).then("twenty").otherwise("other");

        let ExprNode::Case { branches, .. } = label.node() else {
            panic!("expected a CASE");
        };
        assert_eq!(branches[0].0, age.eq(10).0);
        assert_eq!(branches[1].0, age.eq(20).0);
    }

    #[test]
    fn null_branch_values_never_match() {
        let age = Expr::<i64>::column("member", "age");

        let condition = equals(age.node(), ExprNode::Literal(Value::Null));

        assert_eq!(
            condition,
            Condition::In {
                operand: age.node().clone(),
                values: Vec::new(),
            }
        );
    }
}
