//! Merge policies for combining configuration layers
//!
//! Two policies cover the whole fold. `second_level_merge` recurses into
//! mappings exactly one level: entries of a nested mapping are injected
//! verbatim over the existing ones, anything deeper (and every scalar or
//! sequence) is replaced wholesale. `override_merge` discards the
//! accumulated view entirely. Neither policy ever lets a top-level null
//! erase an existing value, so a layer that does not mention a key leaves
//! that key alone.

use crate::value::Value;

/// Merge `src` over `dst`, recursing into mappings exactly one level.
///
/// For each non-null top-level entry of `src`: when both sides hold a
/// mapping under the key, the entries of `src`'s mapping are copied over
/// the entries of `dst`'s mapping one by one, nulls included. In every
/// other case `src`'s entry replaces `dst`'s. A null on either side at
/// the top yields the other side unchanged.
pub fn second_level_merge(dst: Value, src: Value) -> Value {
    match (dst, src) {
        (dst, Value::Null) => dst,
        (Value::Null, src) => src,
        (Value::Mapping(mut base), Value::Mapping(overlay)) => {
            for (key, incoming) in overlay {
                if incoming.is_null() {
                    continue;
                }
                if let Value::Mapping(inner) = incoming {
                    if let Some(Value::Mapping(existing)) = base.get_mut(&key) {
                        existing.extend(inner);
                        continue;
                    }
                    base.insert(key, Value::Mapping(inner));
                } else {
                    base.insert(key, incoming);
                }
            }
            Value::Mapping(base)
        }
        (_, src) => src,
    }
}

/// Replace `dst` with `src` unconditionally.
pub fn override_merge(_dst: Value, src: Value) -> Value {
    src
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn mapping(entries: &[(&str, Value)]) -> Value {
        let mut map = IndexMap::new();
        for (key, value) in entries {
            map.insert(key.to_string(), value.clone());
        }
        Value::Mapping(map)
    }

    #[test]
    fn test_null_src_keeps_dst() {
        let dst = mapping(&[("a", Value::Integer(1))]);
        assert_eq!(second_level_merge(dst.clone(), Value::Null), dst);
    }

    #[test]
    fn test_null_dst_takes_src() {
        let src = mapping(&[("a", Value::Integer(1))]);
        assert_eq!(second_level_merge(Value::Null, src.clone()), src);
    }

    #[test]
    fn test_scalars_replace_wholesale() {
        let dst = mapping(&[("port", Value::Integer(80)), ("host", "old".into())]);
        let src = mapping(&[("port", Value::Integer(8080))]);

        let merged = second_level_merge(dst, src);
        let map = merged.as_mapping().unwrap();
        assert_eq!(map["port"], Value::Integer(8080));
        assert_eq!(map["host"], Value::String("old".into()));
    }

    #[test]
    fn test_sequences_replace_wholesale() {
        let dst = mapping(&[("servers", Value::from(vec!["a", "b"]))]);
        let src = mapping(&[("servers", Value::from(vec!["c"]))]);

        let merged = second_level_merge(dst, src);
        assert_eq!(
            merged.as_mapping().unwrap()["servers"],
            Value::from(vec!["c"])
        );
    }

    #[test]
    fn test_nested_mapping_merges_one_level() {
        let dst = mapping(&[(
            "database",
            mapping(&[("host", "localhost".into()), ("port", Value::Integer(5432))]),
        )]);
        let src = mapping(&[("database", mapping(&[("host", "prod-db".into())]))]);

        let merged = second_level_merge(dst, src);
        let db = merged.as_mapping().unwrap()["database"].as_mapping().unwrap();
        assert_eq!(db["host"], Value::String("prod-db".into()));
        assert_eq!(db["port"], Value::Integer(5432));
    }

    #[test]
    fn test_third_level_replaced_wholesale() {
        let dst = mapping(&[(
            "server",
            mapping(&[(
                "tls",
                mapping(&[("cert", "c1".into()), ("key", "k1".into())]),
            )]),
        )]);
        let src = mapping(&[(
            "server",
            mapping(&[("tls", mapping(&[("cert", "c2".into())]))]),
        )]);

        let merged = second_level_merge(dst, src);
        let tls = merged.as_mapping().unwrap()["server"].as_mapping().unwrap()["tls"]
            .as_mapping()
            .unwrap();
        // The second-level entry comes over verbatim: no third-level merge
        assert_eq!(tls.len(), 1);
        assert_eq!(tls["cert"], Value::String("c2".into()));
    }

    #[test]
    fn test_top_level_null_never_erases() {
        let dst = mapping(&[("keep", Value::Integer(1))]);
        let src = mapping(&[("keep", Value::Null), ("add", Value::Integer(2))]);

        let merged = second_level_merge(dst, src);
        let map = merged.as_mapping().unwrap();
        assert_eq!(map["keep"], Value::Integer(1));
        assert_eq!(map["add"], Value::Integer(2));
    }

    #[test]
    fn test_second_level_null_is_injected() {
        let dst = mapping(&[(
            "db",
            mapping(&[("host", "h".into()), ("port", Value::Integer(1))]),
        )]);
        let src = mapping(&[("db", mapping(&[("port", Value::Null)]))]);

        let merged = second_level_merge(dst, src);
        let db = merged.as_mapping().unwrap()["db"].as_mapping().unwrap();
        assert_eq!(db["host"], Value::String("h".into()));
        // Nested entries land verbatim, nulls included
        assert_eq!(db["port"], Value::Null);
    }

    #[test]
    fn test_mapping_replaces_scalar_and_back() {
        let dst = mapping(&[("entry", Value::Integer(1))]);
        let src = mapping(&[("entry", mapping(&[("deep", Value::Integer(2))]))]);
        let merged = second_level_merge(dst, src);
        assert!(merged.as_mapping().unwrap()["entry"].is_mapping());

        let dst = mapping(&[("entry", mapping(&[("deep", Value::Integer(2))]))]);
        let src = mapping(&[("entry", Value::Integer(1))]);
        let merged = second_level_merge(dst, src);
        assert_eq!(merged.as_mapping().unwrap()["entry"], Value::Integer(1));
    }

    #[test]
    fn test_override_merge_is_total() {
        let dst = mapping(&[("a", Value::Integer(1))]);
        let src = mapping(&[("b", Value::Integer(2))]);
        assert_eq!(override_merge(dst.clone(), src.clone()), src);

        // Even an empty src wins
        let empty = Value::Mapping(IndexMap::new());
        assert_eq!(override_merge(dst, empty.clone()), empty);
    }
}
