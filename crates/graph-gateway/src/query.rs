//! The declarative traversal `spec` consumed by [`crate::GraphGateway::query`]
//! (§6): predicates on category and properties, boolean connectives,
//! order-by, and range-based pagination.

use crate::{category::Category, value::AttrValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// A predicate over a vertex or edge's category and attributes.
#[derive(Debug, Clone)]
pub enum Predicate {
    CategoryIs(Category),
    Eq(String, AttrValue),
    Substring(String, String),
    Lt(String, i64),
    Lte(String, i64),
    Gt(String, i64),
    Gte(String, i64),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    #[must_use]
    pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self::And(predicates.into_iter().collect())
    }

    #[must_use]
    pub fn or(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Or(predicates.into_iter().collect())
    }
}

/// A half-open pagination window `[lo, hi)` over an ordered result (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub lo: usize,
    pub hi: usize,
}

impl Range {
    #[must_use]
    pub const fn new(lo: usize, hi: usize) -> Self {
        Self { lo, hi }
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.hi.saturating_sub(self.lo)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.hi <= self.lo
    }
}

#[derive(Debug, Clone)]
pub struct OrderKey {
    pub field: String,
    pub direction: OrderDirection,
}

/// A full declarative traversal: what to match, how to order it, and which
/// page of the ordering to return. `range: None` means "return everything".
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub predicate: Predicate,
    pub order_by: Vec<OrderKey>,
    pub range: Option<Range>,
}

impl QuerySpec {
    #[must_use]
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            order_by: Vec::new(),
            range: None,
        }
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: OrderDirection) -> Self {
        self.order_by.push(OrderKey {
            field: field.into(),
            direction,
        });
        self
    }

    #[must_use]
    pub fn range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }
}
