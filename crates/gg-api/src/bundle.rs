use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use gg_core::{GalgameError, OverlaySpec};
use gg_runtime::{AssetRoot, SpecialResponseTable, StoryConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

pub const MANIFEST_FILE: &str = "galgame.json";

/// `galgame.json`: which script is the base story and where its tables live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleManifest {
    #[serde(default)]
    pub title: String,
    pub base_script: String,
    pub protagonist: String,
    #[serde(default)]
    pub asset_root: AssetRoot,
    #[serde(default)]
    pub overlays: BTreeMap<String, OverlaySpec>,
    #[serde(default)]
    pub special_responses: Option<String>,
    #[serde(default)]
    pub chat_lexicon: Option<String>,
}

impl BundleManifest {
    pub fn story_config(&self) -> StoryConfig {
        StoryConfig {
            title: self.title.clone(),
            base_script: self.base_script.clone(),
            protagonist: self.protagonist.clone(),
            assets: self.asset_root.clone(),
            overlays: self.overlays.clone(),
        }
    }
}

/// A scanned story directory. `files` holds every JSON file keyed by its
/// `/`-separated path relative to `root`.
#[derive(Debug, Clone)]
pub struct StoryBundle {
    pub id: String,
    pub root: PathBuf,
    pub manifest: BundleManifest,
    pub files: BTreeMap<String, String>,
}

impl StoryBundle {
    pub fn title(&self) -> &str {
        if self.manifest.title.is_empty() {
            &self.manifest.base_script
        } else {
            &self.manifest.title
        }
    }

    pub fn special_responses(&self) -> Result<SpecialResponseTable, GalgameError> {
        let Some(file) = &self.manifest.special_responses else {
            return Ok(SpecialResponseTable::default());
        };
        let raw = self.file(file)?;
        SpecialResponseTable::parse(raw)
    }

    pub fn file(&self, name: &str) -> Result<&str, GalgameError> {
        self.files.get(name).map(String::as_str).ok_or_else(|| {
            GalgameError::new(
                "BUNDLE_FILE_NOT_FOUND",
                format!(
                    "Bundle file \"{}\" does not exist under {}.",
                    name,
                    self.root.display()
                ),
            )
        })
    }
}

pub fn make_bundle_id(root: &Path) -> String {
    format!("bundle:{}", root.display())
}

pub fn resolve_bundle_dir(dir: &str) -> Result<PathBuf, GalgameError> {
    let path = PathBuf::from(dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(|error| {
                GalgameError::new(
                    "BUNDLE_PATH",
                    format!("Failed to resolve current directory: {}", error),
                )
            })?
            .join(path)
    };

    if !absolute.exists() {
        return Err(GalgameError::new(
            "BUNDLE_NOT_FOUND",
            format!("scripts dir does not exist: {}", absolute.display()),
        ));
    }
    if !absolute.is_dir() {
        return Err(GalgameError::new(
            "BUNDLE_NOT_DIR",
            format!("scripts dir is not a directory: {}", absolute.display()),
        ));
    }
    Ok(absolute)
}

pub fn read_bundle_files(root: &Path) -> Result<BTreeMap<String, String>, GalgameError> {
    let mut files = BTreeMap::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        let content = fs::read_to_string(path).map_err(|error| {
            GalgameError::new(
                "BUNDLE_READ",
                format!("Failed to read {}: {}", path.display(), error),
            )
        })?;
        files.insert(relative, content);
    }

    Ok(files)
}

pub fn load_bundle_dir(dir: &str) -> Result<StoryBundle, GalgameError> {
    let root = resolve_bundle_dir(dir)?;
    let files = read_bundle_files(&root)?;
    let raw_manifest = files.get(MANIFEST_FILE).ok_or_else(|| {
        GalgameError::new(
            "BUNDLE_MANIFEST_NOT_FOUND",
            format!("{} is missing under {}.", MANIFEST_FILE, root.display()),
        )
    })?;
    let manifest: BundleManifest = serde_json::from_str(raw_manifest).map_err(|error| {
        GalgameError::new(
            "BUNDLE_MANIFEST_PARSE",
            format!("Failed to parse {}: {}", MANIFEST_FILE, error),
        )
    })?;
    if !files.contains_key(&manifest.base_script) {
        return Err(GalgameError::new(
            "BUNDLE_BASE_SCRIPT",
            format!(
                "Base script \"{}\" is not part of the bundle.",
                manifest.base_script
            ),
        ));
    }

    debug!(root = %root.display(), files = files.len(), "bundle scanned");
    Ok(StoryBundle {
        id: make_bundle_id(&root),
        root,
        manifest,
        files,
    })
}
