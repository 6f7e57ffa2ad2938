//! Dump option models.
//!
//! `data_only` and `schema_only` are mutually exclusive. The options are
//! stored as a single [`DumpKind`] so the invalid combination cannot be
//! represented.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What a dump contains.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DumpKind {
    /// Schema and data.
    #[default]
    Full,
    /// Data only (`pg_dump --data-only`).
    DataOnly,
    /// Schema only (`pg_dump --schema-only`).
    SchemaOnly,
}

impl DumpKind {
    /// Suffix appended to generated dump file names.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            DumpKind::Full => "_full",
            DumpKind::DataOnly => "_data",
            DumpKind::SchemaOnly => "_schema",
        }
    }
}

/// User-chosen options for a dump download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DumpOptions {
    kind: DumpKind,
}

impl DumpOptions {
    /// Options for a full dump.
    pub fn full() -> Self {
        Self::default()
    }

    /// Options for a data-only dump.
    pub fn data_only() -> Self {
        Self {
            kind: DumpKind::DataOnly,
        }
    }

    /// Options for a schema-only dump.
    pub fn schema_only() -> Self {
        Self {
            kind: DumpKind::SchemaOnly,
        }
    }

    /// Builds options from two flags; `data_only` wins if both are set.
    pub fn from_flags(data_only: bool, schema_only: bool) -> Self {
        let mut options = Self::default();
        options.set_schema_only(schema_only);
        options.set_data_only(data_only);
        options
    }

    pub fn kind(&self) -> DumpKind {
        self.kind
    }

    pub fn is_data_only(&self) -> bool {
        self.kind == DumpKind::DataOnly
    }

    pub fn is_schema_only(&self) -> bool {
        self.kind == DumpKind::SchemaOnly
    }

    /// Toggles data-only. Enabling it clears schema-only.
    pub fn set_data_only(&mut self, enabled: bool) {
        if enabled {
            self.kind = DumpKind::DataOnly;
        } else if self.kind == DumpKind::DataOnly {
            self.kind = DumpKind::Full;
        }
    }

    /// Toggles schema-only. Enabling it clears data-only.
    pub fn set_schema_only(&mut self, enabled: bool) {
        if enabled {
            self.kind = DumpKind::SchemaOnly;
        } else if self.kind == DumpKind::SchemaOnly {
            self.kind = DumpKind::Full;
        }
    }

    /// Query parameters for the dump endpoint. Empty for a full dump.
    pub fn query_pairs(&self) -> Vec<(&'static str, &'static str)> {
        match self.kind {
            DumpKind::Full => Vec::new(),
            DumpKind::DataOnly => vec![("data_only", "true")],
            DumpKind::SchemaOnly => vec![("schema_only", "true")],
        }
    }
}

impl From<DumpKind> for DumpOptions {
    fn from(kind: DumpKind) -> Self {
        Self { kind }
    }
}

/// Query string accepted by the dump endpoints.
///
/// Values are kept as raw strings; anything that does not parse as a boolean
/// is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct DumpQuery {
    #[serde(default)]
    pub data_only: Option<String>,
    #[serde(default)]
    pub schema_only: Option<String>,
}

impl DumpQuery {
    /// Resolves the query into dump options.
    pub fn options(&self) -> DumpOptions {
        DumpOptions::from_flags(
            parse_flag(self.data_only.as_deref()),
            parse_flag(self.schema_only.as_deref()),
        )
    }
}

fn parse_flag(raw: Option<&str>) -> bool {
    match raw.map(|v| v.trim().to_lowercase()) {
        Some(v) => matches!(v.as_str(), "1" | "t" | "true"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabling_data_only_clears_schema_only() {
        let mut options = DumpOptions::schema_only();
        options.set_data_only(true);
        assert!(options.is_data_only());
        assert!(!options.is_schema_only());

        options.set_schema_only(true);
        assert!(options.is_schema_only());
        assert!(!options.is_data_only());
    }

    #[test]
    fn test_disabling_active_flag_returns_to_full() {
        let mut options = DumpOptions::data_only();
        options.set_schema_only(false);
        assert!(options.is_data_only());

        options.set_data_only(false);
        assert_eq!(options.kind(), DumpKind::Full);
        assert!(options.query_pairs().is_empty());
    }

    #[test]
    fn test_query_pairs_send_a_single_flag() {
        assert_eq!(DumpOptions::data_only().query_pairs(), vec![("data_only", "true")]);
        assert_eq!(
            DumpOptions::schema_only().query_pairs(),
            vec![("schema_only", "true")]
        );
    }

    #[test]
    fn test_dump_query_ignores_unparsable_values() {
        let query = DumpQuery {
            data_only: Some("maybe".into()),
            schema_only: Some("TRUE".into()),
        };
        assert_eq!(query.options().kind(), DumpKind::SchemaOnly);
        assert_eq!(DumpQuery::default().options().kind(), DumpKind::Full);
    }
}
