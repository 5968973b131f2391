use serde::Serialize;
use std::collections::HashSet;

/// Keeps only the requested keys (case-insensitive) of each object row. An
/// empty field list keeps everything.
pub fn filter_fields(mut rows: Vec<serde_json::Value>, fields: &[String]) -> Vec<serde_json::Value> {
    if fields.is_empty() {
        return rows;
    }
    let want: HashSet<String> = fields.iter().map(|s| s.to_lowercase()).collect();
    for row in rows.iter_mut() {
        if let Some(obj) = row.as_object_mut() {
            obj.retain(|k, _| want.contains(&k.to_lowercase()));
        }
    }
    rows
}

/// Serialises `value` to rows; non-array values become a single row.
pub fn to_rows<T: Serialize>(value: &T) -> serde_json::Result<Vec<serde_json::Value>> {
    match serde_json::to_value(value)? {
        serde_json::Value::Array(items) => Ok(items),
        other => Ok(vec![other]),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_requested_fields_only() {
        let rows = vec![json!({ "Title": "a", "domain": "sport", "content": "x" })];
        let kept = filter_fields(rows, &["title".into(), "DOMAIN".into()]);
        assert_eq!(kept, vec![json!({ "Title": "a", "domain": "sport" })]);
    }

    #[test]
    fn empty_field_list_is_identity() {
        let rows = vec![json!({ "a": 1 }), json!(2)];
        assert_eq!(filter_fields(rows.clone(), &[]), rows);
    }

    #[test]
    fn scalars_become_single_rows() {
        assert_eq!(to_rows(&json!({ "a": 1 })).unwrap().len(), 1);
        assert_eq!(to_rows(&vec![1, 2, 3]).unwrap().len(), 3);
    }
}
