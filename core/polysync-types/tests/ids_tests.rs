use polysync_types::{EntityIdentity, EntityRef, Error, RunId, SourceInfo};
use std::collections::HashSet;
use std::str::FromStr;

// ── EntityIdentity ───────────────────────────────────────────────

#[test]
fn identity_accessors() {
    let id = EntityIdentity::new("contact", "42");
    assert_eq!(id.common_type(), "contact");
    assert_eq!(id.common_id(), "42");
}

#[test]
fn identity_display_roundtrip() {
    let id = EntityIdentity::new("contact", "42");
    let s = id.to_string();
    assert_eq!(s, "contact:42");
    let parsed: EntityIdentity = s.parse().unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn identity_parse_keeps_colons_in_id() {
    let parsed = EntityIdentity::from_str("invoice:2024:0001").unwrap();
    assert_eq!(parsed.common_type, "invoice");
    assert_eq!(parsed.common_id, "2024:0001");
}

#[test]
fn identity_parse_rejects_missing_separator() {
    assert!(EntityIdentity::from_str("contact").is_err());
}

#[test]
fn identity_parse_rejects_empty_parts() {
    assert!(EntityIdentity::from_str(":42").is_err());
    assert!(EntityIdentity::from_str("contact:").is_err());
}

#[test]
fn identity_serde_uses_camel_case() {
    let id = EntityIdentity::new("contact", "42");
    let json = serde_json::to_value(&id).unwrap();
    assert_eq!(json["commonType"], "contact");
    assert_eq!(json["commonId"], "42");
}

#[test]
fn identity_hash_eq() {
    let mut set = HashSet::new();
    set.insert(EntityIdentity::new("contact", "1"));
    set.insert(EntityIdentity::new("contact", "1"));
    set.insert(EntityIdentity::new("account", "1"));
    assert_eq!(set.len(), 2);
}

// ── EntityRef ────────────────────────────────────────────────────

#[test]
fn bare_id_takes_common_type_from_context() {
    let r = EntityRef::from("42");
    assert_eq!(r.into_identity("contact"), EntityIdentity::new("contact", "42"));
}

#[test]
fn full_identity_is_kept_as_is() {
    let r = EntityRef::from(EntityIdentity::new("account", "7"));
    assert_eq!(r.into_identity("contact"), EntityIdentity::new("account", "7"));
}

#[test]
fn entity_ref_from_owned_string() {
    let r: EntityRef = String::from("9").into();
    assert_eq!(r, EntityRef::Id("9".into()));
}

// ── SourceInfo ───────────────────────────────────────────────────

#[test]
fn source_info_display() {
    let info = SourceInfo::new("crm", "Sales CRM");
    assert_eq!(info.to_string(), "Sales CRM (crm)");
}

// ── RunId ────────────────────────────────────────────────────────

#[test]
fn run_id_unique() {
    assert_ne!(RunId::new(), RunId::new());
}

#[test]
fn run_id_time_ordered() {
    let a = RunId::new();
    let b = RunId::new();
    assert!(a <= b);
}

#[test]
fn run_id_display_roundtrip() {
    let id = RunId::new();
    let parsed: RunId = id.to_string().parse().unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn run_id_from_str_invalid() {
    let err = RunId::from_str("bad").unwrap_err();
    assert!(matches!(err, Error::InvalidUuid(_)));
    assert!(err.to_string().starts_with("invalid UUID"));
}
