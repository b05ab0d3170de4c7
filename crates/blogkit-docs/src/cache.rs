use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::store::DocError;

/// Raw document JSON kept as `<dir>/<document id>.json`.
#[derive(Debug, Clone)]
pub struct JsonCache {
    dir: PathBuf,
}

impl JsonCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, document_id: &str) -> Result<PathBuf, DocError> {
        if !is_document_id(document_id) {
            return Err(DocError::InvalidId(document_id.to_string()));
        }
        Ok(self.dir.join(format!("{document_id}.json")))
    }

    pub fn cached(&self, document_id: &str) -> Result<bool, DocError> {
        Ok(self.path_for(document_id)?.is_file())
    }

    pub fn load(&self, document_id: &str) -> Result<Value, DocError> {
        let path = self.path_for(document_id)?;
        let bytes = fs::read(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => DocError::NotFound {
                document_id: document_id.to_string(),
            },
            _ => DocError::Io {
                path: path.clone(),
                source,
            },
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save(&self, document_id: &str, document: &Value) -> Result<PathBuf, DocError> {
        let path = self.path_for(document_id)?;
        fs::create_dir_all(&self.dir).map_err(|source| DocError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let bytes = serde_json::to_vec_pretty(document)?;
        fs::write(&path, bytes).map_err(|source| DocError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = ?path, "document cached");
        Ok(path)
    }
}

/// Document ids are URL-safe base64-ish tokens.
pub fn is_document_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let cache = JsonCache::new(dir.path().join("cache"));
        let id = "1jALRWW76qjrcl12e-umDm_ZbGlm8HcGuaA2jGdl1Zro";
        assert!(!cache.cached(id).unwrap());

        let doc = json!({"documentId": id, "title": "T"});
        let path = cache.save(id, &doc).unwrap();
        assert!(path.ends_with(format!("{id}.json")));
        assert!(cache.cached(id).unwrap());
        assert_eq!(cache.load(id).unwrap(), doc);
    }

    #[test]
    fn missing_entry_is_not_found() {
        let dir = TempDir::new().unwrap();
        let cache = JsonCache::new(dir.path());
        assert!(matches!(cache.load("absent"), Err(DocError::NotFound { .. })));
    }

    #[test]
    fn path_like_ids_are_rejected() {
        let cache = JsonCache::new("/tmp");
        assert!(matches!(
            cache.path_for("../etc/passwd"),
            Err(DocError::InvalidId(_))
        ));
        assert!(cache.path_for("").is_err());
    }
}
