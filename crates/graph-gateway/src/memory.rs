//! A reference, in-process implementation of [`GraphGateway`] backed by
//! `HashMap`s, standing in for the real traversal backend (an out-of-scope
//! external collaborator, §1) in tests and the demo CLI.

use std::{
    cmp::Ordering as CmpOrdering,
    collections::HashMap,
    sync::{
        atomic::{AtomicI64, Ordering as AtomicOrdering},
        Mutex,
    },
};

use error_stack::{Report, Result};
use tracing::instrument;

use crate::{
    category::Category,
    error::GatewayError,
    gateway::{AbortToken, GraphGateway, VertexRecord},
    id::GatewayId,
    query::{OrderDirection, Predicate, QuerySpec},
    value::{AttrMap, AttrValue},
};

#[derive(Debug, Clone)]
struct Element {
    category: Category,
    attrs: AttrMap,
    out_id: Option<GatewayId>,
    in_id: Option<GatewayId>,
}

/// An in-memory [`GraphGateway`]. Not persistent, not concurrent-writer-safe
/// beyond its own mutex, and not meant to be: it exists so the domain layer
/// (§4.3–§4.6) can be exercised without a real graph database.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    elements: Mutex<HashMap<GatewayId, Element>>,
    next_id: AtomicI64,
}

impl InMemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn allocate_id(&self) -> GatewayId {
        GatewayId::new(self.next_id.fetch_add(1, AtomicOrdering::Relaxed))
    }

    fn check_abort(&self, abort: &AbortToken) -> Result<(), GatewayError> {
        if abort.is_cancelled() {
            return Err(Report::new(GatewayError::Aborted));
        }
        Ok(())
    }

    fn to_record(id: GatewayId, element: &Element) -> VertexRecord {
        VertexRecord {
            id,
            category: element.category,
            attrs: element.attrs.clone(),
            endpoints: element.out_id.zip(element.in_id),
        }
    }
}

fn matches(predicate: &Predicate, id: GatewayId, element: &Element) -> bool {
    match predicate {
        Predicate::CategoryIs(category) => element.category == *category,
        Predicate::Eq(key, value) => {
            if key == "id" {
                return value.as_int() == Some(id.raw());
            }
            element.attrs.get(key) == Some(value)
        }
        Predicate::Substring(key, needle) => element
            .attrs
            .get(key)
            .and_then(AttrValue::as_text)
            .is_some_and(|haystack| haystack.contains(needle.as_str())),
        Predicate::Lt(key, rhs) => attr_as_int(element, key).is_some_and(|lhs| lhs < *rhs),
        Predicate::Lte(key, rhs) => attr_as_int(element, key).is_some_and(|lhs| lhs <= *rhs),
        Predicate::Gt(key, rhs) => attr_as_int(element, key).is_some_and(|lhs| lhs > *rhs),
        Predicate::Gte(key, rhs) => attr_as_int(element, key).is_some_and(|lhs| lhs >= *rhs),
        Predicate::And(predicates) => predicates.iter().all(|p| matches(p, id, element)),
        Predicate::Or(predicates) => predicates.iter().any(|p| matches(p, id, element)),
    }
}

fn attr_as_int(element: &Element, key: &str) -> Option<i64> {
    element.attrs.get(key).and_then(AttrValue::as_int)
}

fn order_key_cmp(field: &str, lhs: &Element, rhs: &Element) -> CmpOrdering {
    match (lhs.attrs.get(field), rhs.attrs.get(field)) {
        (Some(a), Some(b)) => compare_values(a, b),
        (Some(_), None) => CmpOrdering::Less,
        (None, Some(_)) => CmpOrdering::Greater,
        (None, None) => CmpOrdering::Equal,
    }
}

fn compare_values(a: &AttrValue, b: &AttrValue) -> CmpOrdering {
    match (a, b) {
        (AttrValue::Text(a), AttrValue::Text(b)) => a.cmp(b),
        (AttrValue::Int(a), AttrValue::Int(b)) => a.cmp(b),
        (AttrValue::Bool(a), AttrValue::Bool(b)) => a.cmp(b),
        (AttrValue::Seq(a), AttrValue::Seq(b)) => a.cmp(b),
        _ => CmpOrdering::Equal,
    }
}

impl GraphGateway for InMemoryGateway {
    #[instrument(skip(self, attrs, abort), fields(%category))]
    fn add_vertex(&self, category: Category, attrs: AttrMap, abort: &AbortToken) -> Result<GatewayId, GatewayError> {
        self.check_abort(abort)?;
        let id = self.allocate_id();
        self.elements.lock().unwrap_or_else(std::sync::PoisonError::into_inner).insert(
            id,
            Element {
                category,
                attrs,
                out_id: None,
                in_id: None,
            },
        );
        Ok(id)
    }

    #[instrument(skip(self, attrs, abort), fields(%category, %out_id, %in_id))]
    fn add_edge(
        &self,
        category: Category,
        out_id: GatewayId,
        in_id: GatewayId,
        attrs: AttrMap,
        abort: &AbortToken,
    ) -> Result<GatewayId, GatewayError> {
        self.check_abort(abort)?;
        let id = self.allocate_id();
        self.elements.lock().unwrap_or_else(std::sync::PoisonError::into_inner).insert(
            id,
            Element {
                category,
                attrs,
                out_id: Some(out_id),
                in_id: Some(in_id),
            },
        );
        Ok(id)
    }

    #[instrument(skip(self, attrs, abort), fields(%id))]
    fn set_vertex_properties(&self, id: GatewayId, attrs: AttrMap, abort: &AbortToken) -> Result<(), GatewayError> {
        self.set_edge_properties(id, attrs, abort)
    }

    #[instrument(skip(self, attrs, abort), fields(%id))]
    fn set_edge_properties(&self, id: GatewayId, attrs: AttrMap, abort: &AbortToken) -> Result<(), GatewayError> {
        self.check_abort(abort)?;
        let mut elements = self.elements.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let element = elements
            .get_mut(&id)
            .ok_or_else(|| Report::new(GatewayError::NotFound { id: id.raw() }))?;
        element.attrs.extend(attrs);
        Ok(())
    }

    #[instrument(skip(self, abort), fields(%id))]
    fn get_vertex(&self, id: GatewayId, abort: &AbortToken) -> Result<VertexRecord, GatewayError> {
        self.check_abort(abort)?;
        let elements = self.elements.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let element = elements
            .get(&id)
            .ok_or_else(|| Report::new(GatewayError::NotFound { id: id.raw() }))?;
        Ok(Self::to_record(id, element))
    }

    fn get_edge(&self, id: GatewayId, abort: &AbortToken) -> Result<VertexRecord, GatewayError> {
        self.get_vertex(id, abort)
    }

    #[instrument(skip(self, spec, abort))]
    fn query(&self, spec: &QuerySpec, abort: &AbortToken) -> Result<Vec<VertexRecord>, GatewayError> {
        self.check_abort(abort)?;
        let elements = self.elements.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut matched: Vec<_> = elements
            .iter()
            .filter(|(id, element)| matches(&spec.predicate, **id, element))
            .collect();

        for key in spec.order_by.iter().rev() {
            matched.sort_by(|(_, a), (_, b)| {
                let ordering = order_key_cmp(&key.field, a, b);
                match key.direction {
                    OrderDirection::Asc => ordering,
                    OrderDirection::Desc => ordering.reverse(),
                }
            });
        }

        let records: Vec<_> = matched
            .into_iter()
            .map(|(id, element)| Self::to_record(*id, element))
            .collect();

        Ok(match spec.range {
            Some(range) => records
                .into_iter()
                .skip(range.lo)
                .take(range.len())
                .collect(),
            None => records,
        })
    }

    #[instrument(skip(self, abort), fields(%vertex))]
    fn incident_edges(
        &self,
        vertex: GatewayId,
        categories: &[Category],
        abort: &AbortToken,
    ) -> Result<Vec<VertexRecord>, GatewayError> {
        self.check_abort(abort)?;
        let elements = self.elements.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(elements
            .iter()
            .filter(|(_, element)| {
                categories.contains(&element.category)
                    && (element.out_id == Some(vertex) || element.in_id == Some(vertex))
            })
            .map(|(id, element)| Self::to_record(*id, element))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_vertex() {
        let gateway = InMemoryGateway::new();
        let abort = AbortToken::new();
        let mut attrs = AttrMap::new();
        attrs.insert("name".to_owned(), AttrValue::from("antenna"));
        let id = gateway
            .add_vertex(Category::ComponentType, attrs, &abort)
            .expect("insert succeeds");
        let record = gateway.get_vertex(id, &abort).expect("lookup succeeds");
        assert_eq!(record.attrs.get("name").and_then(AttrValue::as_text), Some("antenna"));
    }

    #[test]
    fn query_filters_by_category_and_substring() {
        let gateway = InMemoryGateway::new();
        let abort = AbortToken::new();
        for name in ["antenna", "amplifier", "cable"] {
            let mut attrs = AttrMap::new();
            attrs.insert("name".to_owned(), AttrValue::from(name));
            gateway
                .add_vertex(Category::ComponentType, attrs, &abort)
                .expect("insert succeeds");
        }
        let spec = QuerySpec::new(Predicate::and([
            Predicate::CategoryIs(Category::ComponentType),
            Predicate::Substring("name".to_owned(), "an".to_owned()),
        ]));
        let results = gateway.query(&spec, &abort).expect("query succeeds");
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn aborted_token_short_circuits() {
        let gateway = InMemoryGateway::new();
        let abort = AbortToken::new();
        abort.cancel();
        let error = gateway.get_vertex(GatewayId::new(1), &abort).unwrap_err();
        assert!(matches!(error.current_context(), GatewayError::Aborted));
    }
}
