use graph_gateway::{AbortToken, AttrMap, AttrValue, Category, GraphGateway};
use tracing::instrument;

use crate::{
    cache::Cache,
    entities::Component,
    error::{domain_err, from_gateway, DomainError, Result},
};

impl Component {
    /// Adds a directed `rel_subcomponent` edge `self -> child` (§4.5).
    /// `SubcomponentToSelf` if `child == self`; `IsSubcomponentOfOther` if
    /// the inverse edge already exists; `AlreadySubcomponent` if this exact
    /// edge already exists — irreflexive and antisymmetric (§3, §8).
    #[instrument(skip(self, child, gateway, abort), fields(parent = %self.name(), child = %child.name()))]
    pub fn subcomponent_connect(&self, child: &Component, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<()> {
        if self == child {
            return domain_err(DomainError::SubcomponentToSelf);
        }
        let edges = from_gateway(gateway.incident_edges(self.id(), &[Category::RelSubcomponent], abort))?;
        for edge in &edges {
            let active = edge.attrs.get("active").and_then(AttrValue::as_bool).unwrap_or(true);
            if !active {
                continue;
            }
            let Some((out_id, in_id)) = edge.endpoints else {
                continue;
            };
            if out_id == self.id() && in_id == child.id() {
                return domain_err(DomainError::AlreadySubcomponent);
            }
            if out_id == child.id() && in_id == self.id() {
                return domain_err(DomainError::IsSubcomponentOfOther);
            }
        }
        from_gateway(gateway.add_edge(Category::RelSubcomponent, self.id(), child.id(), AttrMap::new(), abort))?;
        Ok(())
    }

    /// Direct children: components for which `self -> child` exists (§3
    /// SUPPLEMENT, feeding `as_dict`).
    pub fn subcomponents(&self, cache: &Cache, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<Vec<Component>> {
        let edges = from_gateway(gateway.incident_edges(self.id(), &[Category::RelSubcomponent], abort))?;
        let mut children = Vec::new();
        for edge in edges {
            let active = edge.attrs.get("active").and_then(AttrValue::as_bool).unwrap_or(true);
            let Some((out_id, in_id)) = edge.endpoints else {
                continue;
            };
            if active && out_id == self.id() {
                children.push(Component::from_id(cache, gateway, in_id, abort)?);
            }
        }
        Ok(children)
    }

    /// Direct parents: components for which `parent -> self` exists.
    pub fn supercomponents(&self, cache: &Cache, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<Vec<Component>> {
        let edges = from_gateway(gateway.incident_edges(self.id(), &[Category::RelSubcomponent], abort))?;
        let mut parents = Vec::new();
        for edge in edges {
            let active = edge.attrs.get("active").and_then(AttrValue::as_bool).unwrap_or(true);
            let Some((out_id, in_id)) = edge.endpoints else {
                continue;
            };
            if active && in_id == self.id() {
                parents.push(Component::from_id(cache, gateway, out_id, abort)?);
            }
        }
        Ok(parents)
    }
}
