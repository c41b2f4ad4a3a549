use serde_json::Value;

use super::error::FilterError;
use super::valid_identifier;

/// Translates a caller's `where` document into one SQL boolean expression
/// with positional parameters.
///
/// Parameter numbering starts after `starting_param_index`, so the caller can
/// bind its own leading parameters (the tenant scope does exactly that).
/// System conditions are never added here; [`super::Filter`] conjoins them.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_offset: usize,
    max_depth: u32,
}

impl FilterWhere {
    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self {
            param_values: vec![],
            param_offset: starting_param_index,
            max_depth: crate::config::config().filter.max_nested_depth,
        };
        let clause = filter_where.build_clause(where_data, 0)?;
        Ok((clause, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Object(_) | Value::Null => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be a JSON object".to_string())),
        }
    }

    fn build_clause(&mut self, where_data: &Value, depth: u32) -> Result<String, FilterError> {
        if depth > self.max_depth {
            return Err(FilterError::NestingTooDeep(self.max_depth));
        }

        let obj = match where_data {
            Value::Object(obj) => obj,
            _ => {
                return Err(FilterError::InvalidWhereClause(
                    "WHERE must be a JSON object".to_string(),
                ))
            }
        };

        let mut parts = Vec::new();
        for (key, value) in obj {
            if key.starts_with('$') {
                parts.push(self.build_logical(key, value, depth)?);
            } else {
                self.build_field(&mut parts, key, value)?;
            }
        }

        match parts.len() {
            0 => Ok(String::new()),
            1 => Ok(parts.remove(0)),
            _ => Ok(parts.join(" AND ")),
        }
    }

    fn build_logical(&mut self, op: &str, value: &Value, depth: u32) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value.as_array().ok_or_else(|| {
                    FilterError::InvalidOperatorData(format!("{} requires an array", op))
                })?;
                if arr.is_empty() {
                    return Err(FilterError::InvalidOperatorData(format!(
                        "{} requires a non-empty array",
                        op
                    )));
                }
                let mut sub = Vec::with_capacity(arr.len());
                for v in arr {
                    sub.push(format!("({})", self.build_clause(v, depth + 1)?));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", sub.join(joiner)))
            }
            "$not" => Ok(format!("NOT ({})", self.build_clause(value, depth + 1)?)),
            other => Err(FilterError::UnsupportedOperator(other.to_string())),
        }
    }

    fn build_field(
        &mut self,
        parts: &mut Vec<String>,
        field: &str,
        value: &Value,
    ) -> Result<(), FilterError> {
        if !valid_identifier(field) {
            return Err(FilterError::InvalidColumn(field.to_string()));
        }

        if let Value::Object(ops) = value {
            if ops.is_empty() {
                return Err(FilterError::InvalidOperatorData(format!(
                    "field '{}' has an empty operator object",
                    field
                )));
            }
            for (op_key, op_val) in ops {
                parts.push(self.build_op(field, op_key, op_val)?);
            }
        } else {
            // Implicit equality: { field: value }
            parts.push(self.build_op(field, "$eq", value)?);
        }
        Ok(())
    }

    fn build_op(&mut self, field: &str, op_key: &str, data: &Value) -> Result<String, FilterError> {
        let column = format!("\"{}\"", field);
        Ok(match op_key {
            "$eq" => {
                if data.is_null() {
                    format!("{} IS NULL", column)
                } else {
                    format!("{} = {}", column, self.param(data.clone()))
                }
            }
            "$ne" | "$neq" => {
                if data.is_null() {
                    format!("{} IS NOT NULL", column)
                } else {
                    format!("{} <> {}", column, self.param(data.clone()))
                }
            }
            "$gt" => format!("{} > {}", column, self.param(data.clone())),
            "$gte" => format!("{} >= {}", column, self.param(data.clone())),
            "$lt" => format!("{} < {}", column, self.param(data.clone())),
            "$lte" => format!("{} <= {}", column, self.param(data.clone())),
            "$like" => format!("{} LIKE {}", column, self.param(data.clone())),
            "$nlike" => format!("{} NOT LIKE {}", column, self.param(data.clone())),
            "$ilike" => format!("{} ILIKE {}", column, self.param(data.clone())),
            "$nilike" => format!("{} NOT ILIKE {}", column, self.param(data.clone())),
            "$in" => self.build_list(&column, data, false)?,
            "$nin" => self.build_list(&column, data, true)?,
            "$between" => {
                let values = data.as_array().filter(|v| v.len() == 2).ok_or_else(|| {
                    FilterError::InvalidOperatorData(
                        "$between requires an array of exactly 2 values".to_string(),
                    )
                })?;
                format!(
                    "{} BETWEEN {} AND {}",
                    column,
                    self.param(values[0].clone()),
                    self.param(values[1].clone())
                )
            }
            "$null" => match data.as_bool() {
                Some(true) => format!("{} IS NULL", column),
                Some(false) => format!("{} IS NOT NULL", column),
                None => {
                    return Err(FilterError::InvalidOperatorData(
                        "$null requires a boolean".to_string(),
                    ))
                }
            },
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn build_list(&mut self, column: &str, data: &Value, negated: bool) -> Result<String, FilterError> {
        let values = data.as_array().ok_or_else(|| {
            FilterError::InvalidOperatorData("$in/$nin require an array".to_string())
        })?;
        if values.is_empty() {
            // Empty IN set matches nothing; empty NOT IN matches everything.
            return Ok(if negated { "1=1".to_string() } else { "1=0".to_string() });
        }
        let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
        let keyword = if negated { "NOT IN" } else { "IN" };
        Ok(format!("{} {} ({})", column, keyword, params.join(", ")))
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        format!("${}", self.param_offset + self.param_values.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_equality() {
        let (sql, params) = FilterWhere::generate(&json!({ "name": "Acme" }), 0).unwrap();
        assert_eq!(sql, "\"name\" = $1");
        assert_eq!(params, vec![json!("Acme")]);
    }

    #[test]
    fn parameter_numbering_honors_the_offset() {
        let (sql, params) =
            FilterWhere::generate(&json!({ "status": "scheduled", "city": "Austin" }), 2).unwrap();
        assert!(sql.contains("$3") && sql.contains("$4"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn operator_objects() {
        let (sql, params) =
            FilterWhere::generate(&json!({ "total": { "$gte": 100, "$lt": 500 } }), 0).unwrap();
        assert_eq!(sql, "\"total\" >= $1 AND \"total\" < $2");
        assert_eq!(params, vec![json!(100), json!(500)]);
    }

    #[test]
    fn null_and_negation_operators() {
        let (sql, _) = FilterWhere::generate(&json!({ "email": { "$null": true } }), 0).unwrap();
        assert_eq!(sql, "\"email\" IS NULL");

        let (sql, _) = FilterWhere::generate(&json!({ "email": { "$ne": null } }), 0).unwrap();
        assert_eq!(sql, "\"email\" IS NOT NULL");
    }

    #[test]
    fn in_lists_and_empty_lists() {
        let (sql, params) =
            FilterWhere::generate(&json!({ "status": { "$in": ["a", "b"] } }), 0).unwrap();
        assert_eq!(sql, "\"status\" IN ($1, $2)");
        assert_eq!(params.len(), 2);

        let (sql, params) = FilterWhere::generate(&json!({ "status": { "$in": [] } }), 0).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());

        let (sql, _) = FilterWhere::generate(&json!({ "status": { "$nin": [] } }), 0).unwrap();
        assert_eq!(sql, "1=1");
    }

    #[test]
    fn logical_composition_is_parenthesized() {
        let (sql, params) = FilterWhere::generate(
            &json!({ "$or": [{ "city": "Austin" }, { "city": "Dallas" }] }),
            0,
        )
        .unwrap();
        assert_eq!(sql, "((\"city\" = $1) OR (\"city\" = $2))");
        assert_eq!(params.len(), 2);

        let (sql, _) = FilterWhere::generate(&json!({ "$not": { "archived": true } }), 0).unwrap();
        assert_eq!(sql, "NOT (\"archived\" = $1)");
    }

    #[test]
    fn nested_logical_parameters_stay_sequential() {
        let (sql, params) = FilterWhere::generate(
            &json!({
                "status": "open",
                "$or": [{ "total": { "$gt": 10 } }, { "total": { "$lt": 2 } }]
            }),
            1,
        )
        .unwrap();
        for placeholder in ["$2", "$3", "$4"] {
            assert!(sql.contains(placeholder), "missing {} in {}", placeholder, sql);
        }
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn rejects_bad_columns_and_operators() {
        assert!(matches!(
            FilterWhere::generate(&json!({ "bad;drop": 1 }), 0),
            Err(FilterError::InvalidColumn(_))
        ));
        assert!(matches!(
            FilterWhere::generate(&json!({ "name": { "$regex": ".*" } }), 0),
            Err(FilterError::UnsupportedOperator(_))
        ));
    }

    #[test]
    fn rejects_excessive_nesting() {
        let mut clause = json!({ "name": "x" });
        for _ in 0..20 {
            clause = json!({ "$not": clause });
        }
        assert!(matches!(
            FilterWhere::generate(&clause, 0),
            Err(FilterError::NestingTooDeep(_))
        ));
    }
}
