use std::collections::BTreeMap;

use gg_core::{GalgameError, ScriptDocument};
use tracing::debug;

/// Read-only access to loaded scripts by name.
pub trait SceneLookup {
    fn document(&self, script: &str) -> Option<&ScriptDocument>;
}

/// Fetches raw script JSON by name.
pub trait ScriptLoader {
    fn load(&self, script: &str) -> Result<String, GalgameError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryScriptLoader {
    sources: BTreeMap<String, String>,
}

impl MemoryScriptLoader {
    pub fn new(sources: BTreeMap<String, String>) -> Self {
        Self { sources }
    }
}

impl ScriptLoader for MemoryScriptLoader {
    fn load(&self, script: &str) -> Result<String, GalgameError> {
        self.sources.get(script).cloned().ok_or_else(|| {
            GalgameError::new(
                "SCRIPT_NOT_FOUND",
                format!("Script \"{}\" is not available.", script),
            )
        })
    }
}

/// Parsed documents cached by name; a document is loaded once and then only
/// replaced wholesale.
pub struct ScriptLibrary {
    loader: Box<dyn ScriptLoader>,
    documents: BTreeMap<String, ScriptDocument>,
}

impl ScriptLibrary {
    pub fn new(loader: Box<dyn ScriptLoader>) -> Self {
        Self {
            loader,
            documents: BTreeMap::new(),
        }
    }

    pub fn ensure(&mut self, script: &str) -> Result<&ScriptDocument, GalgameError> {
        if !self.documents.contains_key(script) {
            self.reload(script)?;
        }
        self.documents.get(script).ok_or_else(|| {
            GalgameError::new(
                "SCRIPT_NOT_FOUND",
                format!("Script \"{}\" is not available.", script),
            )
        })
    }

    pub fn reload(&mut self, script: &str) -> Result<(), GalgameError> {
        let raw = self.loader.load(script)?;
        let document = ScriptDocument::parse(script, &raw)?;
        debug!(script, scenes = document.scenes.len(), "script loaded");
        self.documents.insert(script.to_string(), document);
        Ok(())
    }

    pub fn loaded(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }
}

impl SceneLookup for ScriptLibrary {
    fn document(&self, script: &str) -> Option<&ScriptDocument> {
        self.documents.get(script)
    }
}

#[cfg(test)]
mod library_tests {
    use super::*;

    fn loader() -> MemoryScriptLoader {
        MemoryScriptLoader::new(BTreeMap::from([
            (
                "a.json".to_string(),
                r#"{"scenes": [{"id": 1, "text": "a"}]}"#.to_string(),
            ),
            ("broken.json".to_string(), "{".to_string()),
        ]))
    }

    #[test]
    fn ensure_loads_once_and_caches() {
        let mut library = ScriptLibrary::new(Box::new(loader()));
        assert!(library.document("a.json").is_none());
        let scenes = library.ensure("a.json").expect("load").scenes.len();
        assert_eq!(scenes, 1);
        assert!(library.document("a.json").is_some());
        assert_eq!(library.loaded().collect::<Vec<_>>(), vec!["a.json"]);
    }

    #[test]
    fn ensure_reports_missing_and_broken_scripts() {
        let mut library = ScriptLibrary::new(Box::new(loader()));
        let missing = library.ensure("none.json").err().expect("missing");
        assert_eq!(missing.code, "SCRIPT_NOT_FOUND");
        let broken = library.ensure("broken.json").err().expect("broken");
        assert_eq!(broken.code, "SCRIPT_PARSE");
        assert!(library.document("broken.json").is_none());
    }
}
