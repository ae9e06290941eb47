//! Type Signatures
//!
//! Declared shape of a component's data, used to reject bindings that read
//! paths the data can never have.

use crate::error::{CompileError, Result};
use crate::path::{Path, PathSegment};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static LENGTH_TYPE: Lazy<TypeSignature> = Lazy::new(|| TypeSignature::scalar("number"));

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeSignature {
    pub name: String,
    /// Named members, for object types
    #[serde(default)]
    pub properties: Option<IndexMap<String, TypeSignature>>,
    /// Element type, for indexable types
    #[serde(default)]
    pub indexed: Option<Box<TypeSignature>>,
}

impl TypeSignature {
    pub fn scalar(name: &str) -> Self {
        TypeSignature {
            name: name.to_string(),
            ..TypeSignature::default()
        }
    }

    pub fn object(name: &str, properties: Vec<(&str, TypeSignature)>) -> Self {
        TypeSignature {
            name: name.to_string(),
            properties: Some(
                properties
                    .into_iter()
                    .map(|(key, value)| (key.to_string(), value))
                    .collect(),
            ),
            indexed: None,
        }
    }

    pub fn array(element: TypeSignature) -> Self {
        TypeSignature {
            name: format!("Array<{}>", element.name),
            properties: None,
            indexed: Some(Box::new(element)),
        }
    }
}

/// Follows `path` through `data_type` and returns the type at its end
pub fn resolve_path_type<'t>(path: &Path, data_type: &'t TypeSignature) -> Result<&'t TypeSignature> {
    let mismatch = |reason: String| CompileError::TypeMismatch {
        path: path.to_string(),
        reason,
    };
    let mut current = data_type;
    for segment in path.segments() {
        current = match segment {
            PathSegment::Marker { alias, .. } => current
                .indexed
                .as_deref()
                .ok_or_else(|| mismatch(format!("indexable property does not exist on `{}`", alias)))?,
            PathSegment::Property(name) if name == "length" && current.indexed.is_some() => &*LENGTH_TYPE,
            PathSegment::Property(name) => {
                let properties = current
                    .properties
                    .as_ref()
                    .ok_or_else(|| mismatch(format!("`{}` does not have any properties", current.name)))?;
                properties.get(name).ok_or_else(|| {
                    mismatch(format!(
                        "property `{}` does not exist on type `{}`",
                        name, current.name
                    ))
                })?
            }
        };
    }
    Ok(current)
}
