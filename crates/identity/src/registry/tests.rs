use proptest::prelude::*;
use shapeshot_host::{BaseTemplate, ObjectClass};

use super::*;

fn plain() -> HostObject {
	HostObject::new(ObjectClass::Plain)
}

fn stamping(field: &str) -> IdentityRegistry {
	IdentityRegistry::with_strategy(IdentityStrategy::Stamp { field: field.to_string() }, NameSanitizer::standard())
}

#[test]
fn repeated_queries_return_the_same_id() {
	let registry = IdentityRegistry::new();
	let obj = plain();
	let first = registry.id_of(&obj);
	assert_eq!(registry.id_of(&obj), first);
	assert_eq!(registry.id_of(&obj.clone()), first);
	assert_eq!(registry.known(&obj), Some(first));
	assert_eq!(registry.len(), 1);
}

#[test]
fn ids_start_at_the_reserved_floor_and_count_up() {
	let registry = IdentityRegistry::new();
	let objects: Vec<_> = (0..5).map(|_| plain()).collect();
	for (n, obj) in objects.iter().enumerate() {
		assert_eq!(registry.id_of(obj).get(), ObjectId::RESERVED_FLOOR + n as u64);
	}
	assert_eq!(registry.next_id().get(), ObjectId::RESERVED_FLOOR + 5);
}

#[test]
fn resolve_reports_freshness() {
	let registry = IdentityRegistry::new();
	let obj = plain();
	assert!(registry.resolve(&obj).fresh);
	assert!(!registry.resolve(&obj).fresh);
}

#[test]
fn side_table_leaves_objects_untouched() {
	let registry = IdentityRegistry::new();
	let obj = plain();
	registry.id_of(&obj);
	assert!(obj.is_empty());
}

#[test]
fn isolated_registries_do_not_share_ids() {
	let a = IdentityRegistry::new();
	let b = IdentityRegistry::new();
	let obj = plain();
	a.id_of(&plain());
	assert_eq!(a.id_of(&obj).get(), ObjectId::RESERVED_FLOOR + 1);
	assert_eq!(b.id_of(&obj).get(), ObjectId::RESERVED_FLOOR);
	assert_eq!(b.known(&plain()), None);
}

#[test]
fn stamping_attaches_a_hidden_field() {
	let registry = stamping(DEFAULT_ID_FIELD);
	let obj = plain();
	obj.set("visible", 1);
	let id = registry.id_of(&obj);

	let slot = obj.get_own(DEFAULT_ID_FIELD).expect("stamped field");
	assert!(!slot.enumerable);
	assert_eq!(slot.value.as_number(), Some(id.get() as f64));
	assert_eq!(obj.own_enumerable().len(), 1);
	assert_eq!(registry.id_of(&obj), id);
}

#[test]
fn stamping_sanitizes_template_member_names() {
	let registry = stamping("valueOf");
	let template = BaseTemplate::standard();
	let obj = template.instantiate(ObjectClass::Plain);

	let id = registry.id_of(&obj);
	assert!(obj.get_own("valueOf").is_none(), "inherited member must not be shadowed");
	assert!(obj.get_own("@@valueOf@@").is_some());
	assert_eq!(registry.id_of(&obj), id);
}

#[test]
fn storage_objects_fall_back_to_the_side_list() {
	let registry = stamping(DEFAULT_ID_FIELD);
	let storage = HostObject::new(ObjectClass::Storage);
	let other = HostObject::new(ObjectClass::Storage);

	let id = registry.id_of(&storage);
	assert!(storage.is_empty());
	assert_eq!(registry.id_of(&storage), id);
	assert_ne!(registry.id_of(&other), id);
	assert_eq!(registry.known(&storage), Some(id));
}

#[test]
fn colliding_own_members_are_never_trusted() {
	let registry = stamping(DEFAULT_ID_FIELD);
	let decoy = plain();
	registry.id_of(&decoy);

	// Enumerable member with a plausible issued id.
	let hostile = plain();
	hostile.set(DEFAULT_ID_FIELD, ObjectId::RESERVED_FLOOR as f64);
	let id = registry.id_of(&hostile);
	assert_ne!(id, registry.id_of(&decoy));
	assert_eq!(registry.id_of(&hostile), id);

	// Hidden member outside the issued range.
	let forged = plain();
	forged.define_hidden(DEFAULT_ID_FIELD, HostValue::Number(1.0e9)).unwrap();
	let forged_id = registry.id_of(&forged);
	assert_eq!(forged_id.get(), ObjectId::RESERVED_FLOOR + 2);
	assert_eq!(registry.id_of(&forged), forged_id);
}

#[test]
fn forged_hidden_stamps_are_never_trusted() {
	let registry = stamping(DEFAULT_ID_FIELD);
	let decoy = plain();
	let decoy_id = registry.id_of(&decoy);

	// Hidden member holding an id this registry really issued.
	let forged = plain();
	forged.define_hidden(DEFAULT_ID_FIELD, HostValue::Number(decoy_id.get() as f64)).unwrap();
	let forged_id = registry.id_of(&forged);
	assert_ne!(forged_id, decoy_id);
	assert_eq!(registry.id_of(&forged), forged_id);
	assert_eq!(registry.id_of(&decoy), decoy_id);
}

#[test]
fn stamping_registries_keep_isolated_id_spaces() {
	let a = stamping(DEFAULT_ID_FIELD);
	let b = stamping(DEFAULT_ID_FIELD);
	let (x0, x1) = (plain(), plain());
	let (z0, z1) = (plain(), plain());

	a.id_of(&x0);
	a.id_of(&x1);
	b.id_of(&z0);
	let z1_id = b.id_of(&z1);

	// x1 carries a's stamp with a value inside b's issued range.
	let x1_id = b.id_of(&x1);
	assert_ne!(x1_id, z1_id);
	assert_eq!(x1_id.get(), ObjectId::RESERVED_FLOOR + 2);
	assert_eq!(b.id_of(&x1), x1_id);
	assert_eq!(a.id_of(&x1).get(), ObjectId::RESERVED_FLOOR + 1);
}

#[test]
fn two_node_cycle_is_detected_by_id() {
	let registry = IdentityRegistry::new();
	let x = plain();
	let y = plain();
	x.set("next", &y);
	y.set("next", &x);

	let mut seen = Vec::new();
	let mut cursor = Some(x.clone());
	while let Some(node) = cursor {
		let resolved = registry.resolve(&node);
		if !resolved.fresh {
			assert_eq!(resolved.id, registry.id_of(&x));
			break;
		}
		seen.push(resolved.id);
		cursor = node.get("next").and_then(|v| v.as_object().cloned());
	}
	assert_eq!(seen.len(), 2);
}

#[test]
fn global_registry_is_shared() {
	let obj = plain();
	let id = IdentityRegistry::global().id_of(&obj);
	assert_eq!(IdentityRegistry::global().id_of(&obj), id);
	assert!(id.get() >= ObjectId::RESERVED_FLOOR);
}

proptest! {
	#[test]
	fn distinct_objects_get_distinct_ids(count in 1usize..64, stamp in any::<bool>()) {
		let registry = if stamp { stamping(DEFAULT_ID_FIELD) } else { IdentityRegistry::new() };
		let objects: Vec<_> = (0..count)
			.map(|n| HostObject::new(if n % 3 == 0 { ObjectClass::Storage } else { ObjectClass::Plain }))
			.collect();
		let ids: Vec<_> = objects.iter().map(|obj| registry.id_of(obj)).collect();

		for (n, id) in ids.iter().enumerate() {
			prop_assert_eq!(id.get(), ObjectId::RESERVED_FLOOR + n as u64);
		}
		for (obj, id) in objects.iter().zip(&ids) {
			prop_assert_eq!(registry.id_of(obj), *id);
		}
	}
}
