//! Compiler Config
//!
//! Options threaded through a compile. None of them change the dependency
//! graph; they only shape the emitted source.

use serde::{Deserialize, Serialize};

/// Target dialect for printed server code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLanguage {
    #[default]
    Javascript,
    Typescript,
}

/// Compiler configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerConfig {
    /// Strip optional whitespace from printed output
    pub minify: bool,
    /// Dialect used when printing the server renderer
    pub script_language: ScriptLanguage,
    /// Drop trailing `0` arguments from render calls
    pub trim_trailing_zeros: bool,
}

impl CompilerConfig {
    pub fn minified() -> Self {
        CompilerConfig {
            minify: true,
            ..CompilerConfig::default()
        }
    }

    pub fn print_types(&self) -> bool {
        self.script_language == ScriptLanguage::Typescript
    }
}
