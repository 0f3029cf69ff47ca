use serde_json::{Map, Value};
use std::path::Path;

use crate::errors::OpenApiError;

pub const EMBEDDED_DOCUMENT: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/nextdns-openapi.yaml"));

const MAX_REF_DEPTH: usize = 16;

/// An OpenAPI 3 document held as JSON.
#[derive(Debug, Clone)]
pub struct OpenApiDocument {
    root: Value,
}

impl OpenApiDocument {
    pub fn parse(raw: &str) -> Result<Self, OpenApiError> {
        let root: Value = serde_yaml::from_str(raw)?;
        if !root.get("paths").map(Value::is_object).unwrap_or(false) {
            return Err(OpenApiError::MissingPaths);
        }
        Ok(Self { root })
    }

    pub fn embedded() -> Result<Self, OpenApiError> {
        Self::parse(EMBEDDED_DOCUMENT)
    }

    pub fn from_file(path: &Path) -> Result<Self, OpenApiError> {
        let raw = std::fs::read_to_string(path).map_err(|source| OpenApiError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// The file at `path` when given, otherwise the copy shipped with the crate.
    pub fn load(path: Option<&Path>) -> Result<Self, OpenApiError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::embedded(),
        }
    }

    pub fn paths(&self) -> &Map<String, Value> {
        static EMPTY: once_cell::sync::Lazy<Map<String, Value>> =
            once_cell::sync::Lazy::new(Map::new);
        self.root
            .get("paths")
            .and_then(Value::as_object)
            .unwrap_or(&EMPTY)
    }

    fn lookup(&self, reference: &str) -> Result<&Value, OpenApiError> {
        let pointer = reference
            .strip_prefix('#')
            .ok_or_else(|| OpenApiError::UnresolvedRef(reference.to_string()))?;
        self.root
            .pointer(pointer)
            .ok_or_else(|| OpenApiError::UnresolvedRef(reference.to_string()))
    }

    /// Follows a chain of `$ref`s at the top of `value`.
    pub fn resolve<'a>(&'a self, mut value: &'a Value) -> Result<&'a Value, OpenApiError> {
        for _ in 0..MAX_REF_DEPTH {
            match value.get("$ref").and_then(Value::as_str) {
                Some(reference) => value = self.lookup(reference)?,
                None => return Ok(value),
            }
        }
        Err(OpenApiError::UnresolvedRef(
            value
                .get("$ref")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        ))
    }

    /// Inlines every local `$ref` inside `value`. Cycles are cut at a fixed
    /// depth and replaced by an empty schema.
    pub fn inline_refs(&self, value: &Value) -> Result<Value, OpenApiError> {
        self.inline_at(value, 0)
    }

    fn inline_at(&self, value: &Value, depth: usize) -> Result<Value, OpenApiError> {
        if depth > MAX_REF_DEPTH {
            return Ok(Value::Object(Map::new()));
        }
        match value {
            Value::Object(map) => {
                if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                    let target = self.lookup(reference)?;
                    return self.inline_at(target, depth + 1);
                }
                let mut out = Map::new();
                for (key, child) in map {
                    out.insert(key.clone(), self.inline_at(child, depth)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.inline_at(item, depth))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SMALL: &str = r##"
openapi: 3.0.3
paths:
  /things:
    get:
      operationId: listThings
components:
  schemas:
    Thing:
      type: object
      properties:
        child:
          $ref: "#/components/schemas/Child"
    Child:
      type: string
    Loop:
      $ref: "#/components/schemas/Loop"
"##;

    #[test]
    fn embedded_document_parses() {
        let doc = OpenApiDocument::embedded().unwrap();
        assert!(doc.paths().contains_key("/profiles"));
        assert!(doc.paths().len() > 20);
    }

    #[test]
    fn document_without_paths_is_rejected() {
        let err = OpenApiDocument::parse("openapi: 3.0.3\n").unwrap_err();
        assert!(matches!(err, OpenApiError::MissingPaths));
    }

    #[test]
    fn inline_refs_resolves_nested_schemas() {
        let doc = OpenApiDocument::parse(SMALL).unwrap();
        let inlined = doc
            .inline_refs(&json!({"$ref": "#/components/schemas/Thing"}))
            .unwrap();
        assert_eq!(inlined["properties"]["child"], json!({"type": "string"}));
    }

    #[test]
    fn unresolved_and_cyclic_refs() {
        let doc = OpenApiDocument::parse(SMALL).unwrap();
        let nope = json!({"$ref": "#/components/schemas/Nope"});
        let missing = doc.resolve(&nope);
        assert!(matches!(missing, Err(OpenApiError::UnresolvedRef(_))));
        let looped = json!({"$ref": "#/components/schemas/Loop"});
        assert!(doc.resolve(&looped).is_err());
        assert_eq!(doc.inline_refs(&looped).unwrap(), json!({}));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = OpenApiDocument::from_file(Path::new("/nonexistent/openapi.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/openapi.yaml"));
    }
}
