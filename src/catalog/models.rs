//! Entity shapes exchanged with the catalog's OpenAPI v3 entity endpoints.
//!
//! These are transfer objects only. Missing fields decode to their default
//! value and optional fields are left out when encoding.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Source tag stamped on glossary terms created by this tool.
pub const INTERNAL_TERM_SOURCE: &str = "INTERNAL";

/// Every aspect travels wrapped in a `{"value": ...}` envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aspect<T> {
    pub value: T,
}

impl<T> Aspect<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dataset {
    pub urn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_metadata: Option<Aspect<SchemaMetadata>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_key: Option<Aspect<DatasetKey>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_tags: Option<Aspect<GlobalTags>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glossary_terms: Option<Aspect<GlossaryTerms>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editable_schema_metadata: Option<Aspect<EditableSchemaMetadata>>,
}

impl Dataset {
    pub fn schema_name(&self) -> Option<&str> {
        self.schema_metadata
            .as_ref()
            .map(|m| m.value.schema_name.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn dataset_name(&self) -> Option<&str> {
        self.dataset_key
            .as_ref()
            .map(|k| k.value.name.as_str())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaMetadata {
    pub schema_name: String,
    pub platform: String,
    pub version: i64,
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_schema: Option<PlatformSchema>,
    pub fields: Vec<SchemaField>,
}

/// Platform specific schema text, e.g. the DDL the dataset was described with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformSchema {
    #[serde(
        rename = "com.linkedin.schema.OtherSchema",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub other_schema: Option<OtherSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OtherSchema {
    pub raw_schema: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaField {
    pub field_path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<SchemaFieldDataType>,
    pub native_data_type: String,
    pub recursive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glossary_terms: Option<GlossaryTerms>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaFieldDataType {
    #[serde(rename = "type")]
    pub kind: FieldType,
}

impl SchemaFieldDataType {
    pub fn string() -> Self {
        Self {
            kind: FieldType::String,
        }
    }

    pub fn number() -> Self {
        Self {
            kind: FieldType::Number,
        }
    }
}

const STRING_TYPE_TAG: &str = "com.linkedin.schema.StringType";
const NUMBER_TYPE_TAG: &str = "com.linkedin.schema.NumberType";

/// Exactly one type tag is set per field.
///
/// Tags other than string and number come from the catalog too (booleans,
/// dates, arrays, ...). They are kept as they arrived so that listing and
/// re-posting leaves them untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub enum FieldType {
    String,
    Number,
    Other { tag: String, body: Value },
}

impl FieldType {
    pub fn tag(&self) -> &str {
        match self {
            FieldType::String => STRING_TYPE_TAG,
            FieldType::Number => NUMBER_TYPE_TAG,
            FieldType::Other { tag, .. } => tag,
        }
    }
}

impl TryFrom<Map<String, Value>> for FieldType {
    type Error = String;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        if map.len() != 1 {
            return Err(format!("expected exactly one field type tag, found {}", map.len()));
        }
        let Some((tag, body)) = map.into_iter().next() else {
            return Err("missing field type tag".to_string());
        };

        Ok(match tag.as_str() {
            STRING_TYPE_TAG => FieldType::String,
            NUMBER_TYPE_TAG => FieldType::Number,
            _ => FieldType::Other { tag, body },
        })
    }
}

impl From<FieldType> for Map<String, Value> {
    fn from(kind: FieldType) -> Self {
        let (tag, body) = match kind {
            FieldType::String => (STRING_TYPE_TAG.to_string(), Value::Object(Map::new())),
            FieldType::Number => (NUMBER_TYPE_TAG.to_string(), Value::Object(Map::new())),
            FieldType::Other { tag, body } => (tag, body),
        };

        let mut map = Map::new();
        map.insert(tag, body);
        map
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetKey {
    pub platform: String,
    pub name: String,
    pub origin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalTags {
    pub tags: Vec<TagAssociation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagAssociation {
    pub tag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlossaryTerms {
    pub terms: Vec<GlossaryTermAssociation>,
    pub audit_stamp: AuditStamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlossaryTermAssociation {
    pub urn: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditStamp {
    pub time: i64,
    pub actor: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditableSchemaMetadata {
    pub editable_schema_field_info: Vec<EditableSchemaFieldInfo>,
}

/// Per-field glossary term overrides edited in the catalog UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditableSchemaFieldInfo {
    pub field_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glossary_terms: Option<GlossaryTerms>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlossaryTerm {
    pub urn: String,
    #[serde(rename = "glossaryTermInfo")]
    pub info: Aspect<GlossaryTermInfo>,
}

impl GlossaryTerm {
    /// Builds a term owned by this tool. Without an explicit URN one is
    /// derived from the name.
    pub fn internal(name: &str, urn: Option<&str>, definition: &str) -> Self {
        let urn = match urn {
            Some(urn) if !urn.is_empty() => urn.to_string(),
            _ => format!("urn:li:glossaryTerm:{}", name),
        };

        Self {
            urn,
            info: Aspect::new(GlossaryTermInfo {
                name: name.to_string(),
                definition: definition.to_string(),
                source: INTERNAL_TERM_SOURCE.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlossaryTermInfo {
    pub name: String,
    pub definition: String,
    #[serde(rename = "termSource")]
    pub source: String,
}

/// Identifying bits of a generated response, kept alongside it in history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSummary {
    pub schema_name: Option<String>,
    pub schema_urn: Option<String>,
    pub dataset_name: Option<String>,
}

/// The few parts of a generated dataset the summary reads; the rest of the
/// document is skipped without being checked.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryFields {
    urn: Option<String>,
    schema_metadata: Option<Envelope<SchemaNameField>>,
    dataset_key: Option<Envelope<DatasetNameField>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Envelope<T> {
    value: T,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SchemaNameField {
    schema_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DatasetNameField {
    name: Option<String>,
}

impl SchemaSummary {
    /// Summarises the first dataset of a generated response. The response
    /// must be an array of objects; the three values are read when present
    /// and fail the decode only when they hold something other than text.
    pub fn from_response(response: &str) -> Result<Self, serde_json::Error> {
        let datasets: Vec<SummaryFields> = serde_json::from_str(response)?;
        Ok(datasets.into_iter().next().map(Self::from).unwrap_or_default())
    }
}

impl From<SummaryFields> for SchemaSummary {
    fn from(fields: SummaryFields) -> Self {
        let non_empty = |value: Option<String>| value.filter(|s| !s.is_empty());

        Self {
            schema_name: non_empty(fields.schema_metadata.and_then(|m| m.value.schema_name)),
            schema_urn: non_empty(fields.urn),
            dataset_name: non_empty(fields.dataset_key.and_then(|k| k.value.name)),
        }
    }
}
