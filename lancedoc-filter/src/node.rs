//! Filter trees.
//!
//! A filter is either a comparison, `{"field", "operator", "value"}`, or a
//! logical combination, `{"operator", "conditions"}`. Trees are usually parsed
//! from JSON with [`FilterNode::from_json`], but can also be built directly.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use lancedoc_result::{Error, Result};
use lancedoc_types::DataFrame;
use serde_json::{Map, Value};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
    In,
    NotIn,
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::NotEq => "!=",
            ComparisonOp::Gt => ">",
            ComparisonOp::GtEq => ">=",
            ComparisonOp::Lt => "<",
            ComparisonOp::LtEq => "<=",
            ComparisonOp::In => "in",
            ComparisonOp::NotIn => "not in",
        }
    }

    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            ComparisonOp::Gt | ComparisonOp::GtEq | ComparisonOp::Lt | ComparisonOp::LtEq
        )
    }
}

impl FromStr for ComparisonOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let op = match s {
            "==" => ComparisonOp::Eq,
            "!=" => ComparisonOp::NotEq,
            ">" => ComparisonOp::Gt,
            ">=" => ComparisonOp::GtEq,
            "<" => ComparisonOp::Lt,
            "<=" => ComparisonOp::LtEq,
            "in" => ComparisonOp::In,
            "not in" => ComparisonOp::NotIn,
            other => {
                return Err(Error::filter(format!(
                    "unknown comparison operator '{other}', expected one of \
                     '==', '!=', '>', '>=', '<', '<=', 'in', 'not in'"
                )));
            }
        };
        Ok(op)
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
            LogicalOp::Not => "NOT",
        }
    }
}

impl FromStr for LogicalOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AND" => Ok(LogicalOp::And),
            "OR" => Ok(LogicalOp::Or),
            "NOT" => Ok(LogicalOp::Not),
            other => Err(Error::filter(format!(
                "unknown logical operator '{other}', expected one of 'AND', 'OR', 'NOT'"
            ))),
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Timestamp(OffsetDateTime),
    /// Compared through its canonical JSON text.
    DataFrame(DataFrame),
    List(Vec<FilterValue>),
    Map(BTreeMap<String, FilterValue>),
}

impl FilterValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FilterValue::Null => "null",
            FilterValue::Bool(_) => "bool",
            FilterValue::Int(_) => "int",
            FilterValue::Float(_) => "float",
            FilterValue::String(_) => "string",
            FilterValue::Timestamp(_) => "timestamp",
            FilterValue::DataFrame(_) => "dataframe",
            FilterValue::List(_) => "list",
            FilterValue::Map(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FilterValue::Null)
    }

    fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FilterValue::Null,
            Value::Bool(b) => FilterValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FilterValue::Int(i),
                // u64 beyond i64 and every non-integer land here.
                None => FilterValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FilterValue::String(s.clone()),
            Value::Array(items) => FilterValue::List(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => FilterValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

macro_rules! impl_from_for_filter_value {
    ($variant:ident, $($ty:ty),+) => {
        $(impl From<$ty> for FilterValue {
            fn from(value: $ty) -> Self {
                FilterValue::$variant(value.into())
            }
        })+
    };
}

impl_from_for_filter_value!(Int, i32, i64, u32);
impl_from_for_filter_value!(Float, f32, f64);
impl_from_for_filter_value!(Bool, bool);
impl_from_for_filter_value!(String, String, &str);
impl_from_for_filter_value!(Timestamp, OffsetDateTime);
impl_from_for_filter_value!(DataFrame, DataFrame);

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        FilterValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FilterValue::Null, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub field: String,
    pub operator: ComparisonOp,
    pub value: FilterValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Logical {
    pub operator: LogicalOp,
    pub conditions: Vec<FilterNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Comparison(Comparison),
    Logical(Logical),
}

impl FilterNode {
    pub fn comparison(
        field: impl Into<String>,
        operator: ComparisonOp,
        value: impl Into<FilterValue>,
    ) -> Self {
        FilterNode::Comparison(Comparison {
            field: field.into(),
            operator,
            value: value.into(),
        })
    }

    pub fn all_of(conditions: Vec<FilterNode>) -> Self {
        Self::logical(LogicalOp::And, conditions)
    }

    pub fn any_of(conditions: Vec<FilterNode>) -> Self {
        Self::logical(LogicalOp::Or, conditions)
    }

    /// `NOT (c1 AND c2 ...)`.
    pub fn none_of(conditions: Vec<FilterNode>) -> Self {
        Self::logical(LogicalOp::Not, conditions)
    }

    pub fn logical(operator: LogicalOp, conditions: Vec<FilterNode>) -> Self {
        FilterNode::Logical(Logical {
            operator,
            conditions,
        })
    }

    /// Parse a filter tree, checking its shape on the way down.
    ///
    /// A node with a `field` key is a comparison; any other object is a
    /// logical node. Missing keys, unknown operators and wrongly typed
    /// members are reported with the offending node.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::filter(format!("filter node must be an object, found {value}")))?;
        if object.contains_key("field") {
            parse_comparison(object)
        } else {
            parse_logical(object)
        }
    }

    /// Parse a filter tree from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }
}

impl TryFrom<&Value> for FilterNode {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        FilterNode::from_json(value)
    }
}

fn required<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a Value> {
    object.get(key).ok_or_else(|| {
        Error::filter(format!(
            "'{key}' key missing in {}",
            Value::Object(object.clone())
        ))
    })
}

fn required_str<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    required(object, key)?
        .as_str()
        .ok_or_else(|| Error::filter(format!("'{key}' must be a string")))
}

fn parse_comparison(object: &Map<String, Value>) -> Result<FilterNode> {
    let field = required_str(object, "field")?;
    let operator = required_str(object, "operator")?.parse()?;
    let value = required(object, "value")?;
    Ok(FilterNode::Comparison(Comparison {
        field: field.to_string(),
        operator,
        value: FilterValue::from_json(value),
    }))
}

fn parse_logical(object: &Map<String, Value>) -> Result<FilterNode> {
    let operator = required_str(object, "operator")?.parse()?;
    let conditions = required(object, "conditions")?
        .as_array()
        .ok_or_else(|| Error::filter("'conditions' must be a list of filter nodes"))?
        .iter()
        .map(FilterNode::from_json)
        .collect::<Result<Vec<_>>>()?;
    Ok(FilterNode::Logical(Logical {
        operator,
        conditions,
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_nested_trees() {
        let node = FilterNode::from_json(&json!({
            "operator": "OR",
            "conditions": [
                {"field": "meta.count", "operator": ">=", "value": 3},
                {"operator": "NOT", "conditions": [
                    {"field": "meta.tags", "operator": "in", "value": ["a", 1, 2.5, true]}
                ]}
            ]
        }))
        .unwrap();

        let expected = FilterNode::any_of(vec![
            FilterNode::comparison("meta.count", ComparisonOp::GtEq, 3),
            FilterNode::none_of(vec![FilterNode::comparison(
                "meta.tags",
                ComparisonOp::In,
                FilterValue::List(vec![
                    FilterValue::from("a"),
                    FilterValue::Int(1),
                    FilterValue::Float(2.5),
                    FilterValue::Bool(true),
                ]),
            )]),
        ]);
        assert_eq!(node, expected);
    }

    #[test]
    fn null_value_is_kept_distinct_from_missing_value() {
        let node =
            FilterNode::from_json(&json!({"field": "meta.x", "operator": "==", "value": null}))
                .unwrap();
        assert_eq!(
            node,
            FilterNode::comparison("meta.x", ComparisonOp::Eq, FilterValue::Null)
        );

        let err = FilterNode::from_json(&json!({"field": "meta.x", "operator": "=="})).unwrap_err();
        assert!(err.to_string().contains("'value' key missing"));
    }

    #[test]
    fn structural_errors_are_filter_errors() {
        let cases = [
            json!({"field": "meta.x", "value": 1}),
            json!({"field": "meta.x", "operator": "~", "value": 1}),
            json!({"field": 3, "operator": "==", "value": 1}),
            json!({"operator": "AND"}),
            json!({"operator": "XOR", "conditions": []}),
            json!({"operator": "AND", "conditions": {"field": "a"}}),
            json!({"conditions": []}),
            json!([1, 2]),
        ];
        for case in cases {
            let err = FilterNode::from_json(&case).unwrap_err();
            assert!(matches!(err, Error::Filter(_)), "{case}: {err}");
        }
    }

    #[test]
    fn operators_parse_and_print() {
        for op in ["==", "!=", ">", ">=", "<", "<=", "in", "not in"] {
            assert_eq!(op.parse::<ComparisonOp>().unwrap().as_str(), op);
        }
        assert!(ComparisonOp::LtEq.is_ordering());
        assert!(!ComparisonOp::In.is_ordering());
        assert_eq!("NOT".parse::<LogicalOp>().unwrap(), LogicalOp::Not);
    }

    #[test]
    fn option_and_vec_convert_into_values() {
        assert_eq!(FilterValue::from(None::<i64>), FilterValue::Null);
        assert_eq!(
            FilterValue::from(vec!["a", "b"]),
            FilterValue::List(vec![FilterValue::from("a"), FilterValue::from("b")])
        );
    }
}
