use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

/// Reduces a batch of records to the single authoritative record per key:
/// the one with the greatest timestamp, ties broken by greatest id.
///
/// Every "latest" lookup in the engine (hedge legs per contract, quote
/// series per symbol/month) goes through this one reducer so the
/// tie-breaking rule cannot drift between entities.
pub fn latest_by_key<K, T, FK, FO>(records: Vec<T>, key_of: FK, order_of: FO) -> HashMap<K, T>
where
    K: Eq + Hash,
    FK: Fn(&T) -> K,
    FO: Fn(&T) -> (chrono::DateTime<chrono::Utc>, i64),
{
    let mut latest: HashMap<K, T> = HashMap::new();

    for record in records {
        let key = key_of(&record);
        match latest.entry(key) {
            Entry::Occupied(mut entry) => {
                if order_of(&record) > order_of(entry.get()) {
                    *entry.get_mut() = record;
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(record);
            }
        }
    }

    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[derive(Debug, Clone, PartialEq)]
    struct Rec {
        id: i64,
        key: &'static str,
        ts: chrono::DateTime<chrono::Utc>,
    }

    fn rec(id: i64, key: &'static str, secs: i64) -> Rec {
        Rec {
            id,
            key,
            ts: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn picks_max_timestamp_per_key() {
        let out = latest_by_key(
            vec![rec(1, "a", 100), rec(2, "a", 300), rec(3, "a", 200), rec(4, "b", 50)],
            |r| r.key,
            |r| (r.ts, r.id),
        );
        assert_eq!(out["a"].id, 2);
        assert_eq!(out["b"].id, 4);
    }

    #[test]
    fn breaks_timestamp_ties_by_highest_id() {
        let out = latest_by_key(
            vec![rec(7, "a", 100), rec(9, "a", 100), rec(8, "a", 100)],
            |r| r.key,
            |r| (r.ts, r.id),
        );
        assert_eq!(out["a"].id, 9);
    }

    #[test]
    fn empty_input_yields_empty_map() {
        let out = latest_by_key(Vec::<Rec>::new(), |r| r.key, |r| (r.ts, r.id));
        assert!(out.is_empty());
    }
}
