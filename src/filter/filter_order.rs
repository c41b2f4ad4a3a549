use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection};
use super::valid_identifier;

pub struct FilterOrder;

impl FilterOrder {
    /// Accepts `"created_at desc"`, `["created_at desc", "name"]` or
    /// `{ "created_at": "desc", "name": "asc" }`.
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let infos = match order {
            Value::String(s) => Self::parse_order_string(s)?,
            Value::Array(arr) => {
                let mut out = Vec::new();
                for v in arr {
                    match v {
                        Value::String(s) => out.extend(Self::parse_order_string(s)?),
                        _ => {
                            return Err(FilterError::InvalidOrderClause(
                                "order array entries must be strings".to_string(),
                            ))
                        }
                    }
                }
                out
            }
            Value::Object(obj) => {
                let mut out = Vec::new();
                for (k, v) in obj {
                    let sort = match v.as_str().unwrap_or("asc").to_ascii_lowercase().as_str() {
                        "desc" => SortDirection::Desc,
                        _ => SortDirection::Asc,
                    };
                    out.push(FilterOrderInfo { column: k.clone(), sort });
                }
                out
            }
            Value::Null => vec![],
            _ => {
                return Err(FilterError::InvalidOrderClause(
                    "order must be a string, array or object".to_string(),
                ))
            }
        };

        for info in &infos {
            if !valid_identifier(&info.column) {
                return Err(FilterError::InvalidOrderClause(format!(
                    "invalid order column: {}",
                    info.column
                )));
            }
        }
        Ok(infos)
    }

    fn parse_order_string(s: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::new();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut it = trimmed.split_whitespace();
            if let Some(col) = it.next() {
                let dir = it.next().unwrap_or("asc");
                let sort = if dir.eq_ignore_ascii_case("desc") {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                };
                out.push(FilterOrderInfo { column: col.to_string(), sort });
            }
        }
        Ok(out)
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> =
            infos.iter().map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql())).collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_strings_arrays_and_objects() {
        let infos = FilterOrder::validate_and_parse(&json!("created_at desc, name")).unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].sort, SortDirection::Desc);
        assert_eq!(infos[1].sort, SortDirection::Asc);

        let infos = FilterOrder::validate_and_parse(&json!(["scheduled_at desc"])).unwrap();
        assert_eq!(FilterOrder::generate(&infos), "ORDER BY \"scheduled_at\" DESC");

        let infos = FilterOrder::validate_and_parse(&json!({ "name": "asc" })).unwrap();
        assert_eq!(FilterOrder::generate(&infos), "ORDER BY \"name\" ASC");
    }

    #[test]
    fn rejects_unsafe_order_columns() {
        assert!(FilterOrder::validate_and_parse(&json!("name\"; drop")).is_err());
        assert!(FilterOrder::validate_and_parse(&json!(42)).is_err());
    }
}
