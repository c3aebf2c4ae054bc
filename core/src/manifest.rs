use std::path::Path;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::Result;
use crate::error::RunnerErr;

/// The slice of `package.json` this core reads. The manifest belongs to the
/// caller's project and is a read-only input.
#[derive(Debug, Default, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub scripts: IndexMap<String, String>,
    #[serde(default)]
    pub main: Option<String>,
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: IndexMap<String, String>,
}

pub fn manifest_path(package_dir: &Path) -> PathBuf {
    package_dir.join("package.json")
}

pub async fn load_manifest(package_dir: &Path) -> Result<PackageManifest> {
    let path = manifest_path(package_dir);
    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|_| RunnerErr::NotFound(format!("package.json not found at {}", path.display())))?;
    serde_json::from_str(&contents).map_err(|err| {
        RunnerErr::MalformedInput(format!("failed to parse {}: {err}", path.display()))
    })
}
