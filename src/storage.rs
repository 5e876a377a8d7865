use crate::errors::AppError;
use crate::models::{Collection, TabDocument};
use std::{
    env,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::error;

pub const SAVE_EXTENSION: &str = "json";

pub fn resolve_save_dir() -> PathBuf {
    if let Ok(path) = env::var("SHINY_SAVE_DIR") {
        return PathBuf::from(path);
    }

    PathBuf::from("shiny_saves")
}

/// Filesystem-safe key for a tab name. Every character outside
/// alphanumerics, underscore, hyphen, dot, and space becomes an underscore;
/// the result is trimmed, lowercased, and internal spaces become
/// underscores. Deterministic, but not collision-free: "A B" and "a_b"
/// yield the same key, which is accepted.
pub fn storage_key(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    replaced.trim().to_lowercase().replace(' ', "_")
}

pub fn save_path(dir: &Path, tab_name: &str) -> PathBuf {
    dir.join(format!("{}.{SAVE_EXTENSION}", storage_key(tab_name)))
}

/// Resolves a user-supplied file name to a path inside the save directory.
/// Path separators are rejected; a missing extension is filled in.
pub fn resolve_save_file(dir: &Path, file: &str) -> Result<PathBuf, AppError> {
    let file = file.trim();
    if file.is_empty() || file.contains('/') || file.contains('\\') || file.contains("..") {
        return Err(AppError::bad_request(
            "file must name an entry in the save directory",
        ));
    }

    let mut path = dir.join(file);
    if path.extension().is_none() {
        path.set_extension(SAVE_EXTENSION);
    }
    Ok(path)
}

pub async fn save_tab(dir: &Path, collection: &Collection) -> Result<PathBuf, AppError> {
    let path = save_path(dir, &collection.name);
    let payload =
        serde_json::to_vec_pretty(&collection.to_document()).map_err(AppError::internal)?;
    fs::write(&path, payload).await.map_err(AppError::internal)?;
    Ok(path)
}

pub async fn load_document(path: &Path) -> Result<TabDocument, AppError> {
    let bytes = fs::read(path).await.map_err(|err| {
        AppError::bad_request(format!("could not read {}: {err}", path.display()))
    })?;
    serde_json::from_slice(&bytes).map_err(|err| {
        AppError::bad_request(format!("malformed document {}: {err}", path.display()))
    })
}

/// Loads every save file in the directory. Files that fail to read or parse
/// are logged and skipped; the scan itself only fails if the directory
/// cannot be listed.
pub async fn scan_save_dir(dir: &Path) -> Result<Vec<Collection>, std::io::Error> {
    let mut entries = fs::read_dir(dir).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some(SAVE_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut collections = Vec::new();
    for path in paths {
        match load_document(&path).await {
            Ok(document) => collections.push(Collection::from_document(document)),
            Err(err) => error!("skipping save file: {}", err.message),
        }
    }
    Ok(collections)
}

pub async fn list_saves(dir: &Path) -> Result<Vec<String>, std::io::Error> {
    let mut entries = fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some(SAVE_EXTENSION) {
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Removes the save file backing a tab, if any. Returns whether a file was
/// actually deleted.
pub async fn delete_save(dir: &Path, tab_name: &str) -> Result<bool, std::io::Error> {
    match fs::remove_file(save_path(dir, tab_name)).await {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_save_dir() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut dir = std::env::temp_dir();
        dir.push(format!("shiny_saves_{}_{}", std::process::id(), nanos));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn storage_key_sanitizes_and_lowercases() {
        assert_eq!(storage_key("Pokemon Glazed!"), "pokemon_glazed_");
        assert_eq!(storage_key("  Fire Red  "), "fire_red");
        assert_eq!(storage_key("v1.2-beta"), "v1.2-beta");
        assert_eq!(storage_key("a/b:c"), "a_b_c");
    }

    #[test]
    fn storage_key_collides_for_equivalent_names() {
        // Accepted limitation of the derivation, asserted rather than fixed.
        assert_eq!(storage_key("Pokemon Glazed!"), storage_key("pokemon_glazed!"));
    }

    #[test]
    fn resolve_save_file_rejects_path_escapes() {
        let dir = PathBuf::from("saves");
        assert!(resolve_save_file(&dir, "../etc/passwd").is_err());
        assert!(resolve_save_file(&dir, "a/b.json").is_err());
        assert!(resolve_save_file(&dir, "").is_err());

        let path = resolve_save_file(&dir, "emerald").unwrap();
        assert_eq!(path, dir.join("emerald.json"));
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = temp_save_dir();
        let mut collection = Collection::new("Soul Silver");
        collection.add_counter("Lugia");
        collection.counters[0].increment();

        let path = save_tab(&dir, &collection).await.unwrap();
        assert_eq!(path, dir.join("soul_silver.json"));

        let document = load_document(&path).await.unwrap();
        assert_eq!(Collection::from_document(document), collection);
    }

    #[tokio::test]
    async fn scan_skips_corrupt_files() {
        let dir = temp_save_dir();
        let collection = Collection::new("Good Save");
        save_tab(&dir, &collection).await.unwrap();
        std::fs::write(dir.join("broken.json"), b"{ not json").unwrap();

        let loaded = scan_save_dir(&dir).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Good Save");
    }

    #[tokio::test]
    async fn delete_save_reports_whether_file_existed() {
        let dir = temp_save_dir();
        let collection = Collection::new("Short Lived");
        save_tab(&dir, &collection).await.unwrap();

        assert!(delete_save(&dir, "Short Lived").await.unwrap());
        assert!(!delete_save(&dir, "Short Lived").await.unwrap());
    }
}
