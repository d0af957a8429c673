//! Lowering filter trees into predicates.
//!
//! Absence is never inferred from a physical null alone. Metadata fields are
//! present only when their sibling `_isempty` flag is false *and* the value is
//! not null; the vector is present only when its root flag is false. Every
//! comparison against a value is gated on presence, so an absent field never
//! satisfies `!=`, ordering or `in`.

use lancedoc_result::{Error, Result};
use lancedoc_types::columns::{
    BLOB_COLUMN, CONTENT_COLUMN, DATAFRAME_COLUMN, EMBEDDING_FIELD, ID_COLUMN, ISEMPTY_COLUMN,
    META_COLUMN, VECTOR_COLUMN,
};
use lancedoc_types::timestamp::{parse_iso8601, to_epoch_seconds};
use tracing::{debug, trace};

use crate::node::{Comparison, ComparisonOp, FilterNode, FilterValue, Logical, LogicalOp};
use crate::predicate::{ColumnPath, CompareOp, Predicate, Scalar};

/// Compile a filter tree into a predicate string.
pub fn compile(node: &FilterNode) -> Result<String> {
    let sql = lower(node)?.to_sql()?;
    debug!(predicate = %sql, "compiled filter");
    Ok(sql)
}

/// Parse and compile a JSON filter tree.
pub fn compile_json(value: &serde_json::Value) -> Result<String> {
    compile(&FilterNode::from_json(value)?)
}

/// Lower a filter tree into a typed predicate.
pub fn lower(node: &FilterNode) -> Result<Predicate> {
    match node {
        FilterNode::Comparison(comparison) => lower_comparison(comparison),
        FilterNode::Logical(logical) => lower_logical(logical),
    }
}

/// Predicate selecting documents by id, used for deletes.
///
/// An empty id list selects nothing.
pub fn delete_predicate<S: AsRef<str>>(ids: &[S]) -> Predicate {
    if ids.is_empty() {
        return Predicate::Literal(false);
    }
    Predicate::InList {
        column: ColumnPath::new([ID_COLUMN]),
        values: ids
            .iter()
            .map(|id| Scalar::String(id.as_ref().to_string()))
            .collect(),
        negated: false,
    }
}

fn lower_logical(logical: &Logical) -> Result<Predicate> {
    if logical.conditions.is_empty() {
        return Err(Error::filter(format!(
            "logical operator '{}' needs at least one condition",
            logical.operator
        )));
    }
    let parts = logical
        .conditions
        .iter()
        .map(lower)
        .collect::<Result<Vec<_>>>()?;
    Ok(match logical.operator {
        LogicalOp::And => Predicate::And(parts),
        LogicalOp::Or => Predicate::Or(parts),
        LogicalOp::Not => Predicate::not(Predicate::And(parts)),
    })
}

/// Where a filter field lives in the stored row.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Vector,
    /// Member path below `meta`, at least one segment long.
    Meta(Vec<String>),
    Root(&'static str),
}

impl Target {
    fn resolve(field: &str) -> Result<Self> {
        let segments: Vec<&str> = field.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::filter(format!("invalid filter field '{field}'")));
        }
        if segments.contains(&ISEMPTY_COLUMN) {
            return Err(Error::filter(format!(
                "filter field '{field}' refers to the reserved '{ISEMPTY_COLUMN}' name"
            )));
        }

        let target = match segments.as_slice() {
            [VECTOR_COLUMN] | [EMBEDDING_FIELD] => Target::Vector,
            [META_COLUMN, rest @ ..] if !rest.is_empty() => {
                Target::Meta(rest.iter().map(|s| s.to_string()).collect())
            }
            [ID_COLUMN] => Target::Root(ID_COLUMN),
            [CONTENT_COLUMN] => Target::Root(CONTENT_COLUMN),
            [DATAFRAME_COLUMN] => Target::Root(DATAFRAME_COLUMN),
            [BLOB_COLUMN] => Target::Root(BLOB_COLUMN),
            _ => {
                return Err(Error::filter(format!(
                    "unknown filter field '{field}'; use a document field or a 'meta.' path"
                )));
            }
        };
        Ok(target)
    }

    fn column(&self) -> ColumnPath {
        match self {
            Target::Vector => ColumnPath::new([VECTOR_COLUMN]),
            Target::Meta(path) => {
                ColumnPath::new(std::iter::once(META_COLUMN).chain(path.iter().map(String::as_str)))
            }
            Target::Root(name) => ColumnPath::new([*name]),
        }
    }

    /// Path of the `_isempty` flag that covers this field, if it has one.
    fn flag(&self) -> Option<ColumnPath> {
        match self {
            Target::Vector => Some(ColumnPath::new([ISEMPTY_COLUMN, VECTOR_COLUMN])),
            Target::Meta(path) => {
                let (leaf, parents) = path.split_last()?;
                Some(ColumnPath::new(
                    std::iter::once(META_COLUMN)
                        .chain(parents.iter().map(String::as_str))
                        .chain([ISEMPTY_COLUMN, leaf.as_str()]),
                ))
            }
            Target::Root(_) => None,
        }
    }

    fn presence(&self) -> Predicate {
        match (self, self.flag()) {
            (Target::Vector, Some(flag)) => flag_is(flag, false),
            (_, Some(flag)) => Predicate::And(vec![
                flag_is(flag, false),
                Predicate::IsNotNull(self.column()),
            ]),
            (_, None) => Predicate::IsNotNull(self.column()),
        }
    }

    fn absence(&self) -> Predicate {
        match (self, self.flag()) {
            (Target::Vector, Some(flag)) => flag_is(flag, true),
            (_, Some(flag)) => Predicate::Or(vec![
                flag_is(flag, true),
                Predicate::IsNull(self.column()),
            ]),
            (_, None) => Predicate::IsNull(self.column()),
        }
    }
}

fn flag_is(flag: ColumnPath, empty: bool) -> Predicate {
    Predicate::Compare {
        column: flag,
        op: CompareOp::Eq,
        value: Scalar::Bool(empty),
    }
}

fn lower_comparison(comparison: &Comparison) -> Result<Predicate> {
    let Comparison {
        field,
        operator,
        value,
    } = comparison;
    let target = Target::resolve(field)?;
    trace!(field = field.as_str(), operator = operator.as_str(), "lowering comparison");

    if target == Target::Vector && !value.is_null() {
        return Err(Error::filter(format!(
            "'{field}' can only be compared with null to test for an embedding"
        )));
    }

    let predicate = match operator {
        ComparisonOp::Eq | ComparisonOp::NotEq => {
            if value.is_null() {
                return Ok(if *operator == ComparisonOp::Eq {
                    target.absence()
                } else {
                    target.presence()
                });
            }
            let scalar = scalar(value, field, *operator)?;
            gated(&target, CompareOp::try_from(*operator)?, scalar)
        }
        ComparisonOp::Gt | ComparisonOp::GtEq | ComparisonOp::Lt | ComparisonOp::LtEq => {
            if value.is_null() {
                return Ok(Predicate::Literal(false));
            }
            let scalar = match scalar(value, field, *operator)? {
                Scalar::String(text) => {
                    let parsed = parse_iso8601(&text).map_err(|_| {
                        Error::filter(format!(
                            "'{field}': strings are only comparable with '{operator}' when they \
                             are ISO-8601 dates, found '{text}'"
                        ))
                    })?;
                    Scalar::Timestamp(to_epoch_seconds(&parsed))
                }
                other => other,
            };
            gated(&target, CompareOp::try_from(*operator)?, scalar)
        }
        ComparisonOp::In | ComparisonOp::NotIn => {
            let FilterValue::List(members) = value else {
                return Err(Error::filter(format!(
                    "'{field}': value must be a list when using '{operator}', found {}",
                    value.type_name()
                )));
            };
            let negated = *operator == ComparisonOp::NotIn;
            if members.is_empty() {
                return Ok(Predicate::Literal(negated));
            }
            let values = members
                .iter()
                .map(|member| {
                    if member.is_null() {
                        return Err(Error::filter(format!(
                            "'{field}': null is not allowed inside a '{operator}' list"
                        )));
                    }
                    scalar(member, field, *operator)
                })
                .collect::<Result<Vec<_>>>()?;
            let membership = Predicate::InList {
                column: target.column(),
                values,
                negated,
            };
            if negated {
                Predicate::any_of(vec![target.absence(), membership])
            } else {
                Predicate::all_of(vec![target.presence(), membership])
            }
        }
    };
    Ok(predicate)
}

fn gated(target: &Target, op: CompareOp, value: Scalar) -> Predicate {
    Predicate::all_of(vec![
        target.presence(),
        Predicate::Compare {
            column: target.column(),
            op,
            value,
        },
    ])
}

impl TryFrom<ComparisonOp> for CompareOp {
    type Error = Error;

    /// Membership operators have no scalar counterpart.
    fn try_from(operator: ComparisonOp) -> Result<Self> {
        match operator {
            ComparisonOp::Eq => Ok(CompareOp::Eq),
            ComparisonOp::NotEq => Ok(CompareOp::NotEq),
            ComparisonOp::Gt => Ok(CompareOp::Gt),
            ComparisonOp::GtEq => Ok(CompareOp::GtEq),
            ComparisonOp::Lt => Ok(CompareOp::Lt),
            ComparisonOp::LtEq => Ok(CompareOp::LtEq),
            ComparisonOp::In | ComparisonOp::NotIn => Err(Error::filter(format!(
                "'{operator}' is a membership operator, not a scalar comparison"
            ))),
        }
    }
}

/// Convert a non-null, non-container value to a literal.
fn scalar(value: &FilterValue, field: &str, operator: ComparisonOp) -> Result<Scalar> {
    let scalar = match value {
        FilterValue::Bool(b) => Scalar::Bool(*b),
        FilterValue::Int(i) => Scalar::Int(*i),
        FilterValue::Float(f) if f.is_finite() => Scalar::Float(*f),
        FilterValue::Float(f) => {
            return Err(Error::filter(format!(
                "'{field}': non-finite number {f} cannot be used in a filter"
            )));
        }
        FilterValue::String(s) => Scalar::String(s.clone()),
        FilterValue::Timestamp(t) => Scalar::Timestamp(to_epoch_seconds(t)),
        FilterValue::DataFrame(frame) => Scalar::String(frame.to_canonical_json()),
        FilterValue::Null | FilterValue::List(_) | FilterValue::Map(_) => {
            return Err(Error::filter(format!(
                "'{field}': a {} value cannot be used with '{operator}'",
                value.type_name()
            )));
        }
    };
    Ok(scalar)
}
