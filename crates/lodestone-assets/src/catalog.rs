//! Catalog document parsing and the validated id registry.
//!
//! The parser stays string-level (no id/type hashing) so the concerns remain
//! isolated: [`CatalogParser`] turns JSON into raw entries, [`AssetCatalog`]
//! resolves paths, hashes ids, and enforces uniqueness.

use std::path::Path;

use ahash::AHashMap;
use serde::Deserialize;

use crate::error::{AssetError, AssetErrorCode, AssetResult};
use crate::id::{AssetId, AssetType};
use crate::resolver::AssetPathResolver;

/// The supported catalog document version.
pub const CATALOG_VERSION: i64 = 1;

/// One parsed entry, strings exactly as authored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCatalogEntry {
    pub id: String,
    pub type_name: String,
    pub path: String,
}

#[derive(Deserialize)]
struct ArrayEntryDoc {
    id: String,
    #[serde(rename = "type")]
    type_name: String,
    path: String,
}

#[derive(Deserialize)]
struct ObjectEntryDoc {
    #[serde(rename = "type")]
    type_name: String,
    path: String,
}

/// Parses the JSON catalog document:
///
/// ```json
/// { "version": 1, "assets": [ {"id": "...", "type": "...", "path": "..."} ] }
/// ```
///
/// An object form is also accepted, keyed by id:
///
/// ```json
/// { "assets": { "ui.title": { "type": "text", "path": "ui/title.txt" } } }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogParser;

impl CatalogParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, text: &str, source_name: &str) -> AssetResult<Vec<RawCatalogEntry>> {
        let doc: serde_json::Value = serde_json::from_str(text).map_err(|e| {
            AssetError::with_detail(
                AssetErrorCode::ParseFailed,
                "catalog is not valid JSON",
                format!("{source_name}: {e}"),
            )
        })?;

        let Some(obj) = doc.as_object() else {
            return Err(AssetError::with_detail(
                AssetErrorCode::ParseFailed,
                "catalog top level must be an object",
                source_name,
            ));
        };

        if let Some(version) = obj.get("version") {
            if version.as_i64() != Some(CATALOG_VERSION) {
                return Err(AssetError::with_detail(
                    AssetErrorCode::ParseFailed,
                    "unsupported catalog version",
                    format!("{source_name}: version={version}"),
                ));
            }
        }

        let Some(assets) = obj.get("assets") else {
            return Err(AssetError::with_detail(
                AssetErrorCode::ParseFailed,
                "catalog has no \"assets\" key",
                source_name,
            ));
        };

        let mut out = Vec::new();
        match assets {
            serde_json::Value::Array(items) => {
                for item in items {
                    let entry: ArrayEntryDoc =
                        serde_json::from_value(item.clone()).map_err(|e| {
                            AssetError::with_detail(
                                AssetErrorCode::InvalidCatalogEntry,
                                "catalog entry is missing a required field",
                                format!("{source_name}: {e}"),
                            )
                        })?;
                    out.push(RawCatalogEntry {
                        id: entry.id,
                        type_name: entry.type_name,
                        path: entry.path,
                    });
                }
            }
            serde_json::Value::Object(map) => {
                for (id, value) in map {
                    let entry: ObjectEntryDoc =
                        serde_json::from_value(value.clone()).map_err(|e| {
                            AssetError::with_detail(
                                AssetErrorCode::InvalidCatalogEntry,
                                "catalog entry is missing a required field",
                                format!("{source_name}: id={id}: {e}"),
                            )
                        })?;
                    out.push(RawCatalogEntry {
                        id: id.clone(),
                        type_name: entry.type_name,
                        path: entry.path,
                    });
                }
            }
            _ => {
                return Err(AssetError::with_detail(
                    AssetErrorCode::ParseFailed,
                    "\"assets\" must be an array or an object",
                    source_name,
                ));
            }
        }

        Ok(out)
    }
}

/// One validated catalog row. Read-only after creation.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub id: AssetId,
    pub asset_type: AssetType,
    /// Relative path as authored.
    pub source_path: String,
    /// Backing-store path produced by the resolver.
    pub resolved_path: String,
}

/// Validated id -> entry registry. Duplicate ids fail the whole load, and a
/// failed load leaves the previous contents untouched.
#[derive(Debug, Default)]
pub struct AssetCatalog {
    entries: AHashMap<AssetId, CatalogEntry>,
}

impl AssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(
        &mut self,
        raw_entries: Vec<RawCatalogEntry>,
        resolver: &AssetPathResolver,
    ) -> AssetResult<()> {
        let mut staged: AHashMap<AssetId, CatalogEntry> =
            AHashMap::with_capacity(raw_entries.len());

        for raw in raw_entries {
            let resolved_path = resolver.resolve(&raw.path)?;
            let id = AssetId::from_name(&raw.id);
            let asset_type = AssetType::from_name(&raw.type_name);

            let entry = CatalogEntry {
                id: id.clone(),
                asset_type,
                source_path: raw.path,
                resolved_path,
            };

            if staged.insert(id, entry).is_some() {
                return Err(AssetError::with_detail(
                    AssetErrorCode::InvalidCatalogEntry,
                    "duplicate asset id in catalog",
                    raw.id,
                ));
            }
        }

        tracing::info!(entries = staged.len(), "asset catalog loaded");
        self.entries = staged;
        Ok(())
    }

    pub fn load_from_str(
        &mut self,
        text: &str,
        source_name: &str,
        parser: &CatalogParser,
        resolver: &AssetPathResolver,
    ) -> AssetResult<()> {
        let raw = parser.parse(text, source_name)?;
        self.build(raw, resolver)
    }

    pub fn load_from_file(
        &mut self,
        path: impl AsRef<Path>,
        parser: &CatalogParser,
        resolver: &AssetPathResolver,
    ) -> AssetResult<()> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            AssetError::with_detail(
                AssetErrorCode::IoFailed,
                "failed to read catalog file",
                format!("{}: {e}", path.display()),
            )
        })?;
        self.load_from_str(&text, &path.display().to_string(), parser, resolver)
    }

    pub fn find(&self, id: &AssetId) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverOptions;

    fn resolver() -> AssetPathResolver {
        AssetPathResolver::new(ResolverOptions {
            assets_root: "/tmp/assets".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn parse_array_form() {
        let raw = CatalogParser::new()
            .parse(
                r#"{"version":1,"assets":[{"id":"ui.title","type":"text","path":"ui/title.txt"}]}"#,
                "test.json",
            )
            .unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].id, "ui.title");
        assert_eq!(raw[0].type_name, "text");
        assert_eq!(raw[0].path, "ui/title.txt");
    }

    #[test]
    fn parse_object_form() {
        let raw = CatalogParser::new()
            .parse(
                r#"{"assets":{"ui.title":{"type":"text","path":"ui/title.txt"}}}"#,
                "test.json",
            )
            .unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].id, "ui.title");
    }

    #[test]
    fn parse_rejects_unknown_version() {
        let err = CatalogParser::new()
            .parse(r#"{"version":2,"assets":[]}"#, "test.json")
            .unwrap_err();
        assert_eq!(err.code, AssetErrorCode::ParseFailed);
    }

    #[test]
    fn parse_rejects_missing_field() {
        let err = CatalogParser::new()
            .parse(r#"{"assets":[{"id":"a","type":"text"}]}"#, "test.json")
            .unwrap_err();
        assert_eq!(err.code, AssetErrorCode::InvalidCatalogEntry);
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let err = CatalogParser::new().parse("{not json", "test.json").unwrap_err();
        assert_eq!(err.code, AssetErrorCode::ParseFailed);
    }

    #[test]
    fn parse_rejects_scalar_assets() {
        let err = CatalogParser::new()
            .parse(r#"{"assets":42}"#, "test.json")
            .unwrap_err();
        assert_eq!(err.code, AssetErrorCode::ParseFailed);
    }

    #[test]
    fn build_resolves_and_indexes() {
        let mut catalog = AssetCatalog::new();
        catalog
            .load_from_str(
                r#"{"assets":[{"id":"ui.title","type":"text","path":"ui/title.txt"}]}"#,
                "test.json",
                &CatalogParser::new(),
                &resolver(),
            )
            .unwrap();

        let entry = catalog.find(&AssetId::from_name("ui.title")).unwrap();
        assert_eq!(entry.resolved_path, "/tmp/assets/ui/title.txt");
        assert_eq!(entry.source_path, "ui/title.txt");
        assert_eq!(entry.asset_type, AssetType::text());
    }

    #[test]
    fn duplicate_id_fails_and_preserves_previous_contents() {
        let mut catalog = AssetCatalog::new();
        catalog
            .load_from_str(
                r#"{"assets":[{"id":"keep","type":"text","path":"keep.txt"}]}"#,
                "first.json",
                &CatalogParser::new(),
                &resolver(),
            )
            .unwrap();

        let err = catalog
            .load_from_str(
                r#"{"assets":[
                    {"id":"a","type":"text","path":"a.txt"},
                    {"id":"a","type":"text","path":"b.txt"}
                ]}"#,
                "second.json",
                &CatalogParser::new(),
                &resolver(),
            )
            .unwrap_err();
        assert_eq!(err.code, AssetErrorCode::InvalidCatalogEntry);

        // The failed load did not clobber the catalog.
        assert!(catalog.contains(&AssetId::from_name("keep")));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn entry_path_escaping_root_fails_the_load() {
        let mut catalog = AssetCatalog::new();
        let err = catalog
            .load_from_str(
                r#"{"assets":[{"id":"evil","type":"text","path":"../../etc/passwd"}]}"#,
                "test.json",
                &CatalogParser::new(),
                &resolver(),
            )
            .unwrap_err();
        assert_eq!(err.code, AssetErrorCode::PathEscapesRoot);
    }
}
