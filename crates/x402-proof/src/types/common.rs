/// Ordered string-keyed map.
///
/// Proof metadata is covered by the signature, so its serialization must not
/// depend on insertion order; `BTreeMap` serializes keys sorted on both sides
/// of the wire.
pub type Record<V> = std::collections::BTreeMap<String, V>;

pub type AnyJson = serde_json::Value;
