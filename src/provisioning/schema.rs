//! Declarative table schema submitted by tenants.
//!
//! The wire format is deliberately forgiving: unknown field types become
//! text columns and missing flags default to `false`.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Postgres truncates identifiers longer than this many bytes.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// A named collection of tables to provision for one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TableSchema {
    pub tables: Vec<TableSpec>,
}

/// One logical table; its physical name is prefixed by the tenant slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TableSpec {
    #[schema(example = "orders")]
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// A single declared column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldSpec {
    #[schema(example = "customer_id")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_field_type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<RelationSpec>,
}

/// Column types understood by the translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Boolean,
    Date,
    Uuid,
}

impl FieldType {
    /// Maps a declared type string onto a column type. Matching is
    /// case-sensitive and anything unrecognized falls back to text.
    pub fn from_declared(declared: &str) -> Self {
        match declared {
            "string" | "text" => FieldType::Text,
            "number" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            "date" => FieldType::Date,
            "uuid" => FieldType::Uuid,
            _ => FieldType::Text,
        }
    }
}

fn lenient_field_type<'de, D>(deserializer: D) -> Result<FieldType, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .map(FieldType::from_declared)
        .unwrap_or_default())
}

/// A declared foreign-key relationship to another table of the same tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelationSpec {
    #[serde(rename = "type", alias = "kind")]
    #[schema(value_type = String, example = "belongsTo")]
    pub kind: RelationKind,
    #[serde(alias = "table")]
    #[schema(example = "customers")]
    pub target_table: String,
    #[serde(alias = "column", default = "default_target_column")]
    #[schema(example = "id")]
    pub target_column: String,
}

fn default_target_column() -> String {
    "id".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    #[serde(rename = "belongsTo")]
    BelongsTo,
    /// Any other relation kind is accepted on the wire and ignored.
    #[serde(other)]
    Unsupported,
}

impl FieldSpec {
    /// Returns the relation when it should materialize as a foreign key.
    pub fn belongs_to(&self) -> Option<&RelationSpec> {
        self.relation
            .as_ref()
            .filter(|relation| relation.kind == RelationKind::BelongsTo)
    }
}

/// Normalizes a tenant slug into an identifier prefix.
///
/// Every character outside `[A-Za-z0-9_]` becomes an underscore, so
/// `acme-shop` yields `acme_shop`.
pub fn normalize_slug(slug: &str) -> String {
    slug.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Physical table name for a logical table under the given normalized prefix.
pub fn physical_table_name(prefix: &str, table: &str) -> String {
    truncate_identifier(format!("{prefix}_{table}"))
}

/// Deterministic foreign-key constraint name for a column of a physical table.
pub fn foreign_key_name(physical_table: &str, field: &str) -> String {
    truncate_identifier(format!("{physical_table}_{field}_fkey"))
}

/// Cuts an identifier to the length Postgres keeps, on a char boundary, so
/// that catalog lookups see the same name the server stored.
pub fn truncate_identifier(mut ident: String) -> String {
    if ident.len() > MAX_IDENTIFIER_LEN {
        let mut end = MAX_IDENTIFIER_LEN;
        while !ident.is_char_boundary(end) {
            end -= 1;
        }
        ident.truncate(end);
    }
    ident
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_type_mapping() {
        assert_eq!(FieldType::from_declared("string"), FieldType::Text);
        assert_eq!(FieldType::from_declared("text"), FieldType::Text);
        assert_eq!(FieldType::from_declared("number"), FieldType::Number);
        assert_eq!(FieldType::from_declared("boolean"), FieldType::Boolean);
        assert_eq!(FieldType::from_declared("date"), FieldType::Date);
        assert_eq!(FieldType::from_declared("uuid"), FieldType::Uuid);
        // Case-sensitive: capitalized names are not recognized
        assert_eq!(FieldType::from_declared("Number"), FieldType::Text);
        assert_eq!(FieldType::from_declared("weird"), FieldType::Text);
    }

    #[test]
    fn test_lenient_field_parsing() {
        let field: FieldSpec = serde_json::from_value(json!({
            "name": "score",
            "type": 42
        }))
        .unwrap();
        assert_eq!(field.field_type, FieldType::Text);
        assert!(!field.required);
        assert!(!field.unique);
        assert!(field.relation.is_none());

        let field: FieldSpec = serde_json::from_value(json!({ "name": "notes" })).unwrap();
        assert_eq!(field.field_type, FieldType::Text);
    }

    #[test]
    fn test_relation_accepts_both_spellings() {
        let short: FieldSpec = serde_json::from_value(json!({
            "name": "customer_id",
            "type": "uuid",
            "relation": { "type": "belongsTo", "table": "customers", "column": "id" }
        }))
        .unwrap();
        let camel: FieldSpec = serde_json::from_value(json!({
            "name": "customer_id",
            "type": "uuid",
            "relation": { "kind": "belongsTo", "targetTable": "customers", "targetColumn": "id" }
        }))
        .unwrap();

        assert_eq!(short, camel);
        let relation = short.belongs_to().unwrap();
        assert_eq!(relation.target_table, "customers");
        assert_eq!(relation.target_column, "id");
    }

    #[test]
    fn test_unsupported_relation_is_ignored() {
        let field: FieldSpec = serde_json::from_value(json!({
            "name": "tags",
            "relation": { "type": "hasMany", "table": "tags" }
        }))
        .unwrap();
        assert_eq!(
            field.relation.as_ref().unwrap().kind,
            RelationKind::Unsupported
        );
        assert!(field.belongs_to().is_none());
    }

    #[test]
    fn test_normalize_slug() {
        assert_eq!(normalize_slug("acme-shop"), "acme_shop");
        assert_eq!(normalize_slug("my.app v2"), "my_app_v2");
        assert_eq!(normalize_slug("already_fine"), "already_fine");
    }

    #[test]
    fn test_deterministic_names() {
        let table = physical_table_name("acme_shop", "orders");
        assert_eq!(table, "acme_shop_orders");
        assert_eq!(
            foreign_key_name(&table, "customer_id"),
            "acme_shop_orders_customer_id_fkey"
        );
    }

    #[test]
    fn test_long_identifiers_are_truncated() {
        let table = physical_table_name(&"t".repeat(40), &"x".repeat(40));
        assert_eq!(table.len(), MAX_IDENTIFIER_LEN);

        let name = foreign_key_name(&table, "owner");
        assert_eq!(name.len(), MAX_IDENTIFIER_LEN);
        assert_eq!(name, foreign_key_name(&table, "owner"));

        // Multi-byte characters are never split
        let wide = truncate_identifier("ä".repeat(40));
        assert!(wide.len() <= MAX_IDENTIFIER_LEN);
        assert_eq!(wide.chars().count(), 31);
    }
}
