//! Serializable metadata schema description.
//!
//! Store descriptions carry the user's metadata schema as plain data:
//!
//! ```json
//! {"type": "struct", "children": [
//!     {"name": "count", "type": "int32", "nullable": true, "metadata": null},
//!     {"name": "info", "type": "struct", "nullable": true, "metadata": null,
//!      "children": [{"name": "page", "type": "string", "nullable": true, "metadata": null}]}
//! ]}
//! ```
//!
//! `SchemaDict -> Fields -> SchemaDict` reproduces the input. Synthetic
//! `_isempty` fields are skipped when converting from Arrow, so a canonical
//! metadata struct serializes to the user's declaration (in sorted order).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, FieldRef, Fields, TimeUnit};
use lancedoc_result::{Error, Result};
use lancedoc_types::columns::ISEMPTY_COLUMN;
use serde::{Deserialize, Deserializer, Serialize};

const STRUCT_TYPE: &str = "struct";

/// A struct type description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDict {
    #[serde(rename = "type")]
    pub kind: String,
    pub children: Vec<FieldDict>,
}

/// A single field description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDict {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub nullable: bool,
    /// Arrow keeps no distinction between an empty map and none, so `{}`
    /// reads as `null`.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FieldDict>>,
}

impl SchemaDict {
    /// Describe an Arrow struct's fields, skipping `_isempty` maps.
    pub fn from_fields(fields: &Fields) -> Result<Self> {
        Ok(Self {
            kind: STRUCT_TYPE.to_string(),
            children: describe_children(fields)?,
        })
    }

    /// Rebuild the Arrow struct fields.
    pub fn to_fields(&self) -> Result<Fields> {
        if self.kind != STRUCT_TYPE {
            return Err(Error::configuration(format!(
                "metadata schema must have type 'struct', found '{}'",
                self.kind
            )));
        }
        build_children(&self.children)
    }

    /// Rebuild the Arrow struct type.
    pub fn to_data_type(&self) -> Result<DataType> {
        self.to_fields().map(DataType::Struct)
    }
}

impl FieldDict {
    pub fn from_field(field: &Field) -> Result<Self> {
        let metadata = if field.metadata().is_empty() {
            None
        } else {
            Some(
                field
                    .metadata()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            )
        };

        let (type_name, children) = match field.data_type() {
            DataType::Struct(children) => (
                STRUCT_TYPE.to_string(),
                Some(describe_children(children)?),
            ),
            other => (type_name_of(other, field.name())?.to_string(), None),
        };

        Ok(Self {
            name: field.name().clone(),
            type_name,
            nullable: field.is_nullable(),
            metadata,
            children,
        })
    }

    pub fn to_field(&self) -> Result<Field> {
        let data_type = if self.type_name == STRUCT_TYPE {
            let children = self.children.as_deref().ok_or_else(|| {
                Error::configuration(format!("struct field '{}' has no children", self.name))
            })?;
            DataType::Struct(build_children(children)?)
        } else {
            if self.children.is_some() {
                return Err(Error::configuration(format!(
                    "field '{}' of type '{}' cannot have children",
                    self.name, self.type_name
                )));
            }
            data_type_of(&self.type_name, &self.name)?
        };

        let mut field = Field::new(self.name.clone(), data_type, self.nullable);
        if let Some(metadata) = self.metadata.as_ref().filter(|m| !m.is_empty()) {
            let metadata: HashMap<String, String> = metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            field = field.with_metadata(metadata);
        }
        Ok(field)
    }
}

fn empty_as_none<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let metadata = Option::<BTreeMap<String, String>>::deserialize(deserializer)?;
    Ok(metadata.filter(|m| !m.is_empty()))
}

fn describe_children(fields: &Fields) -> Result<Vec<FieldDict>> {
    fields
        .iter()
        .filter(|f| f.name() != ISEMPTY_COLUMN)
        .map(|f| FieldDict::from_field(f))
        .collect()
}

fn build_children(children: &[FieldDict]) -> Result<Fields> {
    let fields = children
        .iter()
        .map(|child| child.to_field().map(Arc::new))
        .collect::<Result<Vec<FieldRef>>>()?;
    Ok(Fields::from(fields))
}

fn type_name_of(data_type: &DataType, field_name: &str) -> Result<&'static str> {
    let name = match data_type {
        DataType::Utf8 => "string",
        DataType::Int32 => "int32",
        DataType::Int64 => "int64",
        DataType::Float32 => "float",
        DataType::Float64 => "double",
        DataType::Boolean => "bool",
        DataType::Binary => "binary",
        DataType::Timestamp(TimeUnit::Second, None) => "timestamp[s]",
        other => {
            return Err(Error::configuration(format!(
                "field '{field_name}' has type {other}, which has no schema description"
            )));
        }
    };
    Ok(name)
}

fn data_type_of(type_name: &str, field_name: &str) -> Result<DataType> {
    let data_type = match type_name {
        "string" => DataType::Utf8,
        "int32" => DataType::Int32,
        "int64" => DataType::Int64,
        "float" => DataType::Float32,
        "double" => DataType::Float64,
        "bool" => DataType::Boolean,
        "binary" => DataType::Binary,
        "timestamp[s]" => DataType::Timestamp(TimeUnit::Second, None),
        other => {
            return Err(Error::configuration(format!(
                "unknown type '{other}' for field '{field_name}'"
            )));
        }
    };
    Ok(data_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonicalize_metadata;

    fn leaf(name: &str, type_name: &str) -> FieldDict {
        FieldDict {
            name: name.to_string(),
            type_name: type_name.to_string(),
            nullable: true,
            metadata: None,
            children: None,
        }
    }

    #[test]
    fn every_type_name_round_trips() {
        let dict = SchemaDict {
            kind: "struct".into(),
            children: ["string", "int32", "int64", "float", "double", "bool", "binary", "timestamp[s]"]
                .iter()
                .enumerate()
                .map(|(idx, ty)| leaf(&format!("f{idx}"), ty))
                .collect(),
        };
        let fields = dict.to_fields().unwrap();
        assert_eq!(fields[7].data_type(), &DataType::Timestamp(TimeUnit::Second, None));
        assert_eq!(SchemaDict::from_fields(&fields).unwrap(), dict);
    }

    #[test]
    fn canonical_struct_drops_presence_maps() {
        let mut info = leaf("info", "struct");
        info.children = Some(vec![leaf("page", "string")]);
        let mut tagged = leaf("tag", "string");
        tagged.metadata = Some(BTreeMap::from([("origin".to_string(), "user".to_string())]));
        let dict = SchemaDict {
            kind: "struct".into(),
            children: vec![leaf("count", "int32"), info, tagged],
        };

        let canonical = canonicalize_metadata(&dict.to_fields().unwrap()).unwrap();
        assert_eq!(SchemaDict::from_fields(&canonical).unwrap(), dict);
    }

    #[test]
    fn empty_field_metadata_reads_as_null() {
        let text = r#"{"type":"struct","children":[{"name":"a","type":"string","nullable":true,"metadata":{}}]}"#;
        let dict: SchemaDict = serde_json::from_str(text).unwrap();
        assert_eq!(dict.children[0].metadata, None);

        let fields = dict.to_fields().unwrap();
        assert!(fields[0].metadata().is_empty());
        assert_eq!(SchemaDict::from_fields(&fields).unwrap(), dict);

        // A hand-built empty map attaches nothing either.
        let mut built = leaf("a", "string");
        built.metadata = Some(BTreeMap::new());
        assert!(built.to_field().unwrap().metadata().is_empty());
    }

    #[test]
    fn unknown_types_and_shapes_are_rejected() {
        let dict = SchemaDict {
            kind: "struct".into(),
            children: vec![leaf("x", "decimal")],
        };
        assert!(matches!(dict.to_fields(), Err(Error::Configuration(_))));

        let not_struct = SchemaDict {
            kind: "list".into(),
            children: vec![],
        };
        assert!(matches!(not_struct.to_fields(), Err(Error::Configuration(_))));

        let childless = SchemaDict {
            kind: "struct".into(),
            children: vec![leaf("s", "struct")],
        };
        assert!(matches!(childless.to_fields(), Err(Error::Configuration(_))));
    }
}
