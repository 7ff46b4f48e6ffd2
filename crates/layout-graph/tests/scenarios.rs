//! End-to-end coverage of §8's quantified invariants, laws, and literal
//! scenarios against the in-memory gateway (`Box<dyn Error>` + `?`
//! propagation, `current_context()` for domain-error assertions).

use std::error::Error;

use graph_gateway::{memory::InMemoryGateway, AbortToken, AttrValue};
use layout_graph::{
    cache::Cache,
    entities::{Component, ComponentType, Property, PropertyType},
    error::{DomainError, Error as DomainLayerError},
};
use temporal_versioning::Timestamp;

fn harness() -> (InMemoryGateway, Cache, AbortToken) {
    (InMemoryGateway::new(), Cache::new(), AbortToken::new())
}

fn t(seconds: i64) -> Timestamp {
    Timestamp::from_unix_seconds(seconds)
}

#[test]
fn scenario_1_component_of_type_round_trips_by_name() -> Result<(), Box<dyn Error>> {
    let (gateway, cache, abort) = harness();

    let antenna = ComponentType::new("antenna", "");
    antenna.add(&cache, &gateway, &abort)?;

    let a1 = Component::new("A1", antenna.clone(), None);
    a1.add(&cache, &gateway, &abort)?;

    let found = Component::from_name(&cache, &gateway, "A1", &abort)?.expect("A1 was just added");
    assert_eq!(found.component_type().name(), "antenna");
    Ok(())
}

#[test]
fn scenarios_2_3_4_set_property_progression() -> Result<(), Box<dyn Error>> {
    let (gateway, cache, abort) = harness();

    let antenna = ComponentType::new("antenna", "");
    antenna.add(&cache, &gateway, &abort)?;
    let a1 = Component::new("A1", antenna.clone(), None);
    a1.add(&cache, &gateway, &abort)?;

    let gain_db = PropertyType::new("gain_db", "dB", r"^-?[0-9]+(\.[0-9]+)?$", 1, "", vec![antenna.clone()]);
    gain_db.add(&cache, &gateway, &abort)?;

    let first = Property::new(vec!["12.5".to_owned()], gain_db.clone());
    a1.set_property(&first, t(1000), "u", None, t(1000), "", false, &cache, &gateway, &abort)?;

    let at_1500 = a1.get_property(&gain_db, t(1500), &cache, &gateway, &abort)?.expect("property active at 1500");
    assert_eq!(at_1500.values(), vec!["12.5".to_owned()]);

    // scenario 3: a second property closes the first at its own start time.
    let second = Property::new(vec!["13.0".to_owned()], gain_db.clone());
    a1.set_property(&second, t(2000), "u", None, t(2000), "", false, &cache, &gateway, &abort)?;

    assert_eq!(
        a1.get_property(&gain_db, t(1500), &cache, &gateway, &abort)?.expect("still active before 2000").values(),
        vec!["12.5".to_owned()]
    );
    assert_eq!(
        a1.get_property(&gain_db, t(2500), &cache, &gateway, &abort)?.expect("active after 2000").values(),
        vec!["13.0".to_owned()]
    );

    // scenario 4: identical values at a covered instant is a no-op rejection.
    let duplicate = Property::new(vec!["13.0".to_owned()], gain_db.clone());
    let result = a1.set_property(&duplicate, t(2500), "u", None, t(2500), "", false, &cache, &gateway, &abort);
    let report = result.expect_err("identical values must be rejected");
    assert!(matches!(report.current_context(), DomainLayerError::Domain(DomainError::PropertyIsSame)));

    assert_eq!(
        a1.get_property(&gain_db, t(2500), &cache, &gateway, &abort)?.expect("unchanged after rejection").values(),
        vec!["13.0".to_owned()]
    );
    Ok(())
}

#[test]
fn scenario_5_connect_to_self_is_rejected() -> Result<(), Box<dyn Error>> {
    let (gateway, cache, abort) = harness();
    let antenna = ComponentType::new("antenna", "");
    antenna.add(&cache, &gateway, &abort)?;
    let a1 = Component::new("A1", antenna, None);
    a1.add(&cache, &gateway, &abort)?;

    let result = a1.connect(&a1, t(0), "u", None, t(0), "", false, &gateway, &abort);
    let report = result.expect_err("a component cannot connect to itself");
    assert!(matches!(report.current_context(), DomainLayerError::Domain(DomainError::ConnectToSelf)));
    Ok(())
}

#[test]
fn scenario_6_connect_overlap_and_force_cap() -> Result<(), Box<dyn Error>> {
    let (gateway, cache, abort) = harness();
    let antenna = ComponentType::new("antenna", "");
    antenna.add(&cache, &gateway, &abort)?;
    let a = Component::new("A", antenna.clone(), None);
    a.add(&cache, &gateway, &abort)?;
    let b = Component::new("B", antenna, None);
    b.add(&cache, &gateway, &abort)?;

    a.connect(&b, t(1000), "u", None, t(1000), "", false, &gateway, &abort)?;

    let already = a.connect(&b, t(2000), "u", None, t(2000), "", false, &gateway, &abort);
    assert!(matches!(
        already.expect_err("1000 connection is still open at 2000").current_context(),
        DomainLayerError::Domain(DomainError::ComponentsAlreadyConnected)
    ));

    let a2 = Component::new("A2", ComponentType::from_name(&cache, &gateway, "antenna", &abort)?.unwrap(), None);
    a2.add(&cache, &gateway, &abort)?;
    a2.connect(&b, t(1000), "u", None, t(1000), "", false, &gateway, &abort)?;

    let blocked = a2.connect(&b, t(500), "u", None, t(500), "", false, &gateway, &abort);
    assert!(matches!(
        blocked.expect_err("force=false must block before an existing later connection").current_context(),
        DomainLayerError::Domain(DomainError::ConnectBeforeExistingConnection)
    ));

    let a3 = Component::new("A3", ComponentType::from_name(&cache, &gateway, "antenna", &abort)?.unwrap(), None);
    a3.add(&cache, &gateway, &abort)?;
    a3.connect(&b, t(1000), "u", None, t(1000), "", false, &gateway, &abort)?;
    a3.connect(&b, t(500), "u", None, t(500), "", true, &gateway, &abort)?;

    let connections = a3.connections_at(Some(t(700)), &cache, &gateway, &abort)?;
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0], b);
    let connections_at_1000 = a3.connections_at(Some(t(1000)), &cache, &gateway, &abort)?;
    assert!(connections_at_1000.is_empty(), "the force-capped edge ends exactly at the later connection's start");
    Ok(())
}

#[test]
fn add_is_idempotent() -> Result<(), Box<dyn Error>> {
    let (gateway, cache, abort) = harness();
    let antenna = ComponentType::new("antenna", "");
    antenna.add(&cache, &gateway, &abort)?;

    let result = antenna.add(&cache, &gateway, &abort);
    assert!(matches!(
        result.expect_err("re-adding the same entity must fail").current_context(),
        DomainLayerError::Domain(DomainError::VertexAlreadyAdded)
    ));
    Ok(())
}

#[test]
fn from_id_round_trips_observable_attributes() -> Result<(), Box<dyn Error>> {
    let (gateway, cache, abort) = harness();
    let antenna = ComponentType::new("antenna", "a dish");
    antenna.add(&cache, &gateway, &abort)?;

    let reloaded = ComponentType::from_id(&cache, &gateway, antenna.id(), &abort)?;
    assert_eq!(reloaded.name(), antenna.name());
    assert_eq!(reloaded.comments(), antenna.comments());
    // the identity cache makes this an object-identity round trip, not just
    // an attribute-equal one (§8 invariant 6).
    assert_eq!(reloaded, antenna);
    Ok(())
}

#[test]
fn property_closure_law() -> Result<(), Box<dyn Error>> {
    let (gateway, cache, abort) = harness();
    let antenna = ComponentType::new("antenna", "");
    antenna.add(&cache, &gateway, &abort)?;
    let a1 = Component::new("A1", antenna.clone(), None);
    a1.add(&cache, &gateway, &abort)?;
    let gain_db = PropertyType::new("gain_db", "dB", r"^-?[0-9]+(\.[0-9]+)?$", 1, "", vec![antenna]);
    gain_db.add(&cache, &gateway, &abort)?;

    let p = Property::new(vec!["12.5".to_owned()], gain_db.clone());
    a1.set_property(&p, t(1000), "u", None, t(1000), "", false, &cache, &gateway, &abort)?;
    a1.unset_property(&gain_db, t(2000), "u", t(2000), "", &cache, &gateway, &abort)?;

    assert!(a1.get_property(&gain_db, t(1500), &cache, &gateway, &abort)?.is_some());
    assert!(a1.get_property(&gain_db, t(2500), &cache, &gateway, &abort)?.is_none());
    Ok(())
}

#[test]
fn subcomponent_antisymmetry() -> Result<(), Box<dyn Error>> {
    let (gateway, cache, abort) = harness();
    let antenna = ComponentType::new("antenna", "");
    antenna.add(&cache, &gateway, &abort)?;
    let a = Component::new("A", antenna.clone(), None);
    a.add(&cache, &gateway, &abort)?;
    let b = Component::new("B", antenna, None);
    b.add(&cache, &gateway, &abort)?;

    a.subcomponent_connect(&b, &gateway, &abort)?;
    let result = b.subcomponent_connect(&a, &gateway, &abort);
    assert!(matches!(
        result.expect_err("the inverse edge must be rejected").current_context(),
        DomainLayerError::Domain(DomainError::IsSubcomponentOfOther)
    ));
    Ok(())
}

#[test]
fn cache_lookups_are_injective() -> Result<(), Box<dyn Error>> {
    let (gateway, cache, abort) = harness();
    let antenna = ComponentType::new("antenna", "");
    antenna.add(&cache, &gateway, &abort)?;

    let a = ComponentType::from_id(&cache, &gateway, antenna.id(), &abort)?;
    let b = ComponentType::from_id(&cache, &gateway, antenna.id(), &abort)?;
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn replacement_chains_terminate() -> Result<(), Box<dyn Error>> {
    use graph_gateway::GraphGateway as _;

    let (gateway, cache, abort) = harness();
    let old = ComponentType::new("antenna-v1", "");
    old.add(&cache, &gateway, &abort)?;
    let new = ComponentType::new("antenna-v2", "");
    old.replace(&new, &cache, &gateway, t(1000), &abort)?;

    let mut current = old.id();
    let mut steps = 0;
    loop {
        let record = gateway.get_vertex(current, &abort)?;
        let Some(next) = record.attrs.get("replacement").and_then(AttrValue::as_int).filter(|raw| *raw != 0) else {
            break;
        };
        current = graph_gateway::GatewayId::new(next);
        steps += 1;
        assert!(steps < 100, "replacement chain did not terminate");
    }
    assert_eq!(steps, 1);
    Ok(())
}

#[test]
fn from_name_returns_none_for_unknown_component() -> Result<(), Box<dyn Error>> {
    let (gateway, cache, abort) = harness();
    assert!(Component::from_name(&cache, &gateway, "missing", &abort)?.is_none());
    Ok(())
}
