//! Small key-value store for client state that outlives a session: the
//! filter sidebar flag of each table and the auth token.
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::TableError;

pub const AUTH_TOKEN_KEY: &str = "auth.token";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), TableError>;

    fn remove(&mut self, key: &str) -> Result<(), TableError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), TableError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), TableError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a pretty-printed JSON object on disk, rewritten on every
/// change.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// A missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, TableError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), TableError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), TableError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn remove(&mut self, key: &str) -> Result<(), TableError> {
        if self.entries.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}

fn sidebar_key(table_key: &str) -> String {
    format!("sidebar.{table_key}")
}

/// Whether the filter sidebar of `table_key` was left open. Closed by default.
pub fn sidebar_open(store: &dyn KeyValueStore, table_key: &str) -> bool {
    store
        .get(&sidebar_key(table_key))
        .is_some_and(|value| value == "true")
}

pub fn set_sidebar_open(
    store: &mut dyn KeyValueStore,
    table_key: &str,
    open: bool,
) -> Result<(), TableError> {
    store.set(&sidebar_key(table_key), if open { "true" } else { "false" })
}

pub fn auth_token(store: &dyn KeyValueStore) -> Option<String> {
    store
        .get(AUTH_TOKEN_KEY)
        .filter(|token| !token.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("datatable_store_{}_{name}", std::process::id()))
            .join("state.json")
    }

    #[test]
    fn sidebar_flag_defaults_to_closed_and_is_per_table() {
        let mut store = MemoryStore::default();
        assert!(!sidebar_open(&store, "users"));
        set_sidebar_open(&mut store, "users", true).unwrap();
        assert!(sidebar_open(&store, "users"));
        assert!(!sidebar_open(&store, "accounts"));
        set_sidebar_open(&mut store, "users", false).unwrap();
        assert!(!sidebar_open(&store, "users"));
    }

    #[test]
    fn auth_token_ignores_blank_values() {
        let mut store = MemoryStore::default();
        assert_eq!(auth_token(&store), None);
        store.set(AUTH_TOKEN_KEY, " ").unwrap();
        assert_eq!(auth_token(&store), None);
        store.set(AUTH_TOKEN_KEY, "abc").unwrap();
        assert_eq!(auth_token(&store).as_deref(), Some("abc"));
    }

    #[test]
    fn json_file_store_persists_across_loads() {
        let path = temp_path("persist");
        let _ = fs::remove_file(&path);

        let mut store = JsonFileStore::load(&path).unwrap();
        assert_eq!(store.get("sidebar.users"), None);
        set_sidebar_open(&mut store, "users", true).unwrap();
        store.set(AUTH_TOKEN_KEY, "t0ken").unwrap();

        let reloaded = JsonFileStore::load(&path).unwrap();
        assert!(sidebar_open(&reloaded, "users"));
        assert_eq!(auth_token(&reloaded).as_deref(), Some("t0ken"));

        let mut reloaded = reloaded;
        reloaded.remove(AUTH_TOKEN_KEY).unwrap();
        assert_eq!(JsonFileStore::load(&path).unwrap().get(AUTH_TOKEN_KEY), None);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_state_file_is_an_error() {
        let path = temp_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        assert!(matches!(JsonFileStore::load(&path), Err(TableError::Json(_))));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
