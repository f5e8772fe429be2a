use std::collections::BTreeMap;

use crate::mr::Mapping;

/// Key-sorted view of a mapping, values sorted too.
pub fn sorted(mapping: &Mapping) -> BTreeMap<&str, Vec<&str>> {
    mapping
        .iter()
        .map(|(k, vs)| {
            let mut vs: Vec<&str> = vs.iter().map(String::as_str).collect();
            vs.sort_unstable();
            (k.as_str(), vs)
        })
        .collect()
}

/// One `key  v1 v2 ..` line per key, keys padded to a common width.
pub fn table(mapping: &Mapping) -> String {
    let rows = sorted(mapping);
    let width = rows.keys().map(|k| k.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for (key, values) in rows {
        out.push_str(&format!("{key:<width$}  {}\n", values.join(" ")));
    }
    out
}

pub fn json(mapping: &Mapping) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&sorted(mapping))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Mapping {
        let mut m = Mapping::new();
        m.insert("the".into(), vec!["3".into(), "1".into()]);
        m.insert("a".into(), vec!["2".into()]);
        m
    }

    #[test]
    fn table_is_sorted_and_aligned() {
        assert_eq!(table(&sample()), "a    2\nthe  1 3\n");
        assert_eq!(table(&Mapping::new()), "");
    }

    #[test]
    fn json_is_an_object_of_arrays() {
        let value: serde_json::Value = serde_json::from_str(&json(&sample()).unwrap()).unwrap();
        assert_eq!(value["the"], serde_json::json!(["1", "3"]));
        assert_eq!(value["a"], serde_json::json!(["2"]));
    }
}
