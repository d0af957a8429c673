//! Typed predicate tree.
//!
//! Filters are lowered into a [`Predicate`] before anything is rendered. The
//! same tree can be turned into SQL text for the storage engine, or evaluated
//! in memory against a [`StorageRow`] using SQL three-valued logic.

use std::cmp::Ordering;

use lancedoc_result::{Error, Result};
use lancedoc_types::timestamp::{parse_iso8601, to_epoch_seconds};
use lancedoc_types::{StorageRow, StorageValue};

use crate::quote::{bool_literal, format_float, quote_path, quote_string, timestamp_literal};

/// Dotted path to a (possibly nested) column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnPath(Vec<String>);

impl ColumnPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn to_sql(&self) -> String {
        quote_path(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::NotEq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::LtEq => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::GtEq => ordering != Ordering::Less,
        }
    }
}

/// A literal operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Epoch seconds, UTC.
    Timestamp(i64),
}

impl Scalar {
    pub fn to_sql(&self) -> Result<String> {
        match self {
            Scalar::Bool(b) => Ok(bool_literal(*b).to_string()),
            Scalar::Int(i) => Ok(i.to_string()),
            Scalar::Float(f) => format_float(*f),
            Scalar::String(s) => Ok(quote_string(s)),
            Scalar::Timestamp(seconds) => timestamp_literal(*seconds),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Literal(bool),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    IsNull(ColumnPath),
    IsNotNull(ColumnPath),
    Compare {
        column: ColumnPath,
        op: CompareOp,
        value: Scalar,
    },
    InList {
        column: ColumnPath,
        values: Vec<Scalar>,
        negated: bool,
    },
}

impl Predicate {
    /// Conjunction that splices nested conjunctions into one group.
    pub fn all_of(parts: Vec<Predicate>) -> Predicate {
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Predicate::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        Predicate::And(flat)
    }

    /// Disjunction that splices nested disjunctions into one group.
    pub fn any_of(parts: Vec<Predicate>) -> Predicate {
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Predicate::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        Predicate::Or(flat)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Predicate) -> Predicate {
        Predicate::Not(Box::new(inner))
    }

    /// Render as SQL text.
    ///
    /// Groups are always parenthesized, so the output never depends on
    /// operator precedence in the engine.
    pub fn to_sql(&self) -> Result<String> {
        let mut out = String::new();
        self.write_sql(&mut out)?;
        Ok(out)
    }

    fn write_sql(&self, out: &mut String) -> Result<()> {
        match self {
            Predicate::Literal(b) => out.push_str(bool_literal(*b)),
            // Empty groups render as their identity, matching `evaluate`.
            Predicate::And(parts) if parts.is_empty() => out.push_str(bool_literal(true)),
            Predicate::Or(parts) if parts.is_empty() => out.push_str(bool_literal(false)),
            Predicate::And(parts) => write_group(out, parts, " AND ")?,
            Predicate::Or(parts) => write_group(out, parts, " OR ")?,
            Predicate::Not(inner) => {
                out.push_str("NOT ");
                match inner.as_ref() {
                    Predicate::And(_) | Predicate::Or(_) => inner.write_sql(out)?,
                    other => {
                        out.push('(');
                        other.write_sql(out)?;
                        out.push(')');
                    }
                }
            }
            Predicate::IsNull(column) => {
                out.push_str(&column.to_sql());
                out.push_str(" IS NULL");
            }
            Predicate::IsNotNull(column) => {
                out.push_str(&column.to_sql());
                out.push_str(" IS NOT NULL");
            }
            Predicate::Compare { column, op, value } => {
                out.push_str(&format!(
                    "{} {} {}",
                    column.to_sql(),
                    op.as_str(),
                    value.to_sql()?
                ));
            }
            Predicate::InList {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    return Err(Error::filter("cannot render an empty IN list"));
                }
                let rendered = values
                    .iter()
                    .map(Scalar::to_sql)
                    .collect::<Result<Vec<_>>>()?;
                out.push_str(&format!(
                    "{} {}IN ({})",
                    column.to_sql(),
                    if *negated { "NOT " } else { "" },
                    rendered.join(", ")
                ));
            }
        }
        Ok(())
    }

    /// Evaluate against a stored row. `None` is SQL `NULL`.
    pub fn evaluate(&self, row: &StorageRow) -> Result<Option<bool>> {
        match self {
            Predicate::Literal(b) => Ok(Some(*b)),
            Predicate::And(parts) => {
                let mut result = Some(true);
                for part in parts {
                    match part.evaluate(row)? {
                        Some(false) => return Ok(Some(false)),
                        None => result = None,
                        Some(true) => {}
                    }
                }
                Ok(result)
            }
            Predicate::Or(parts) => {
                let mut result = Some(false);
                for part in parts {
                    match part.evaluate(row)? {
                        Some(true) => return Ok(Some(true)),
                        None => result = None,
                        Some(false) => {}
                    }
                }
                Ok(result)
            }
            Predicate::Not(inner) => Ok(inner.evaluate(row)?.map(|b| !b)),
            Predicate::IsNull(column) => Ok(Some(lookup(row, column)?.is_null())),
            Predicate::IsNotNull(column) => Ok(Some(!lookup(row, column)?.is_null())),
            Predicate::Compare { column, op, value } => {
                let stored = lookup(row, column)?;
                Ok(compare(stored, value)?.map(|ordering| op.holds(ordering)))
            }
            Predicate::InList {
                column,
                values,
                negated,
            } => {
                let stored = lookup(row, column)?;
                if stored.is_null() {
                    return Ok(None);
                }
                let mut found = false;
                for candidate in values {
                    if compare(stored, candidate)? == Some(Ordering::Equal) {
                        found = true;
                        break;
                    }
                }
                Ok(Some(found != *negated))
            }
        }
    }

    /// Whether `row` passes, i.e. the predicate evaluates to `TRUE`.
    pub fn matches(&self, row: &StorageRow) -> Result<bool> {
        Ok(self.evaluate(row)? == Some(true))
    }
}

fn write_group(out: &mut String, parts: &[Predicate], connective: &str) -> Result<()> {
    out.push('(');
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            out.push_str(connective);
        }
        part.write_sql(out)?;
    }
    out.push(')');
    Ok(())
}

fn lookup<'a>(row: &'a StorageRow, column: &ColumnPath) -> Result<&'a StorageValue> {
    row.get_path(column.segments())
        .ok_or_else(|| Error::filter(format!("unknown column '{}'", column.to_sql())))
}

/// Order a stored value against a literal. `None` when the stored value is
/// null or NaN, or when the literal's type does not match the column's, so a
/// mismatched operand never selects a row.
fn compare(stored: &StorageValue, literal: &Scalar) -> Result<Option<Ordering>> {
    if stored.is_null() {
        return Ok(None);
    }

    // Integers compare exactly; anything involving a float goes through f64.
    let numeric = match (stored.as_i64(), stored.as_f64(), literal) {
        (Some(a), _, Scalar::Int(b)) => Some(Some(a.cmp(b))),
        (_, Some(a), Scalar::Int(b)) => Some(a.partial_cmp(&(*b as f64))),
        (_, Some(a), Scalar::Float(b)) => Some(a.partial_cmp(b)),
        _ => None,
    };
    if let Some(ordering) = numeric {
        return Ok(ordering);
    }

    let ordering = match (stored, literal) {
        (StorageValue::Boolean(a), Scalar::Bool(b)) => a.cmp(b),
        (StorageValue::Utf8(a), Scalar::String(b)) => a.as_str().cmp(b.as_str()),
        (StorageValue::TimestampSecond(a), Scalar::Timestamp(b)) => a.cmp(b),
        (StorageValue::TimestampSecond(a), Scalar::String(text)) => {
            let parsed = parse_iso8601(text).map_err(|_| {
                Error::filter(format!("'{text}' is not an ISO-8601 date"))
            })?;
            a.cmp(&to_epoch_seconds(&parsed))
        }
        _ => return Ok(None),
    };
    Ok(Some(ordering))
}

#[cfg(test)]
mod tests {
    use lancedoc_types::StructValue;

    use super::*;

    fn col(path: &str) -> ColumnPath {
        ColumnPath::new(path.split('.'))
    }

    fn row() -> StorageRow {
        StructValue::new()
            .with("id", StorageValue::Utf8("a".into()))
            .with("content", StorageValue::Null)
            .with(
                "meta",
                StorageValue::Struct(
                    StructValue::new()
                        .with("count", StorageValue::Int32(5))
                        .with("rating", StorageValue::Float64(2.5))
                        .with("date", StorageValue::TimestampSecond(1_704_164_645)),
                ),
            )
    }

    #[test]
    fn renders_nested_groups() {
        let predicate = Predicate::any_of(vec![
            Predicate::all_of(vec![
                Predicate::IsNotNull(col("meta.count")),
                Predicate::Compare {
                    column: col("meta.count"),
                    op: CompareOp::GtEq,
                    value: Scalar::Int(3),
                },
            ]),
            Predicate::not(Predicate::IsNull(col("content"))),
        ]);
        assert_eq!(
            predicate.to_sql().unwrap(),
            "((meta.count IS NOT NULL AND meta.count >= 3) OR NOT (content IS NULL))"
        );
    }

    #[test]
    fn not_of_a_group_reuses_its_parentheses() {
        let predicate = Predicate::not(Predicate::And(vec![
            Predicate::IsNull(col("content")),
            Predicate::Literal(true),
        ]));
        assert_eq!(predicate.to_sql().unwrap(), "NOT (content IS NULL AND TRUE)");
    }

    #[test]
    fn all_of_splices_nested_conjunctions() {
        let inner = Predicate::And(vec![Predicate::Literal(true), Predicate::Literal(false)]);
        let outer = Predicate::all_of(vec![inner, Predicate::IsNull(col("content"))]);
        assert_eq!(outer.to_sql().unwrap(), "(TRUE AND FALSE AND content IS NULL)");
    }

    #[test]
    fn renders_in_lists_and_literals() {
        let predicate = Predicate::InList {
            column: col("meta.name"),
            values: vec![
                Scalar::String("o'brien".into()),
                Scalar::Float(1.0),
                Scalar::Timestamp(0),
            ],
            negated: true,
        };
        assert_eq!(
            predicate.to_sql().unwrap(),
            "meta.name NOT IN ('o''brien', 1.0, TIMESTAMP '1970-01-01 00:00:00')"
        );
    }

    #[test]
    fn three_valued_logic() {
        let row = row();
        let null_cmp = Predicate::Compare {
            column: col("content"),
            op: CompareOp::Eq,
            value: Scalar::String("x".into()),
        };
        assert_eq!(null_cmp.evaluate(&row).unwrap(), None);
        assert_eq!(Predicate::not(null_cmp.clone()).evaluate(&row).unwrap(), None);
        assert_eq!(
            Predicate::Or(vec![null_cmp.clone(), Predicate::Literal(true)])
                .evaluate(&row)
                .unwrap(),
            Some(true)
        );
        assert_eq!(
            Predicate::And(vec![null_cmp.clone(), Predicate::Literal(false)])
                .evaluate(&row)
                .unwrap(),
            Some(false)
        );
        assert!(!Predicate::And(vec![null_cmp, Predicate::Literal(true)])
            .matches(&row)
            .unwrap());
    }

    #[test]
    fn compares_across_numeric_widths_and_timestamps() {
        let row = row();
        let gt = |path: &str, value: Scalar| Predicate::Compare {
            column: col(path),
            op: CompareOp::Gt,
            value,
        };
        assert!(gt("meta.count", Scalar::Int(4)).matches(&row).unwrap());
        assert!(gt("meta.count", Scalar::Float(4.5)).matches(&row).unwrap());
        assert!(!gt("meta.rating", Scalar::Int(3)).matches(&row).unwrap());
        assert!(gt("meta.date", Scalar::Timestamp(0)).matches(&row).unwrap());
        assert!(
            gt("meta.date", Scalar::String("2023-12-31".into()))
                .matches(&row)
                .unwrap()
        );
    }

    #[test]
    fn mismatched_types_never_match() {
        let row = row().with("name", StorageValue::Utf8("zed".into()));
        let eq = Predicate::Compare {
            column: col("id"),
            op: CompareOp::Eq,
            value: Scalar::Int(1),
        };
        assert_eq!(eq.evaluate(&row).unwrap(), None);

        // An ISO date lowered against a text column.
        let later = Predicate::Compare {
            column: col("name"),
            op: CompareOp::Gt,
            value: Scalar::Timestamp(1_609_459_200),
        };
        assert_eq!(later.evaluate(&row).unwrap(), None);
        assert!(!later.matches(&row).unwrap());

        // Mixed lists still find the matching member.
        let mixed = |first: &str, negated| Predicate::InList {
            column: col("id"),
            values: vec![Scalar::String(first.into()), Scalar::Int(7)],
            negated,
        };
        assert_eq!(mixed("b", false).evaluate(&row).unwrap(), Some(false));
        assert_eq!(mixed("b", true).evaluate(&row).unwrap(), Some(true));
        assert_eq!(
            Predicate::InList {
                column: col("id"),
                values: vec![Scalar::Int(7), Scalar::String("a".into())],
                negated: false,
            }
            .evaluate(&row)
            .unwrap(),
            Some(true)
        );
    }

    #[test]
    fn unknown_columns_and_bad_dates_fail() {
        let row = row();
        assert!(matches!(
            Predicate::IsNull(col("nope")).evaluate(&row),
            Err(Error::Filter(_))
        ));

        let bad_date = Predicate::Compare {
            column: col("meta.date"),
            op: CompareOp::Gt,
            value: Scalar::String("soon".into()),
        };
        let err = bad_date.evaluate(&row).unwrap_err();
        assert!(matches!(&err, Error::Filter(msg) if !msg.contains("validation")));
    }

    #[test]
    fn empty_groups_render_as_their_identity() {
        let row = row();
        let all = Predicate::all_of(vec![]);
        let any = Predicate::any_of(vec![]);
        assert_eq!(all.to_sql().unwrap(), "TRUE");
        assert_eq!(any.to_sql().unwrap(), "FALSE");
        assert_eq!(all.evaluate(&row).unwrap(), Some(true));
        assert_eq!(any.evaluate(&row).unwrap(), Some(false));
        assert_eq!(Predicate::not(any).to_sql().unwrap(), "NOT FALSE");
    }
}
