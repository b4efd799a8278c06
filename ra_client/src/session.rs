use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Key under which the session record is stored.
pub const SESSION_KEY: &str = "ra.session";

/// Key under which the login token is stored.
pub const TOKEN_KEY: &str = "ra.token";

/// The game and player this client was last playing as.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub game_id: String,
    pub player_name: String,
}

/// Durable string key/value storage.
pub trait Storage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&mut self, key: &str) -> anyhow::Result<()>;
}

/// Stores every key in its own file inside a directory.
///
/// Writes go to a temporary file first which then replaces the old file, so
/// a reader never sees half a record.
#[derive(Debug, Clone)]
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.json"))
    }
}

fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, text)?;
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        Ok(write_text_atomic(&self.path_for(key), value)?)
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.items.insert(String::from(key), String::from(value));
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// Persists the [`SessionRecord`].
///
/// Storage failures never reach the caller: they are logged, `restore()`
/// then reports no session and `save()`/`clear()` do nothing.
pub struct SessionStore<S> {
    storage: S,
}

impl<S: Storage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn save(&mut self, game_id: &str, player_name: &str) {
        let record = SessionRecord {
            game_id: String::from(game_id),
            player_name: String::from(player_name),
        };
        let result = serde_json::to_string(&record)
            .map_err(anyhow::Error::from)
            .and_then(|text| self.storage.set(SESSION_KEY, &text));
        match result {
            Ok(()) => debug!(game_id, player_name, "Saved session"),
            Err(err) => warn!("Could not save session: {:#}", err),
        }
    }

    pub fn restore(&self) -> Option<SessionRecord> {
        let text = match self.storage.get(SESSION_KEY) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(err) => {
                warn!("Could not read session: {:#}", err);
                return None;
            }
        };
        match serde_json::from_str::<SessionRecord>(&text) {
            Ok(record) => Some(record),
            Err(err) => {
                debug!("Ignoring malformed session record: {}", err);
                None
            }
        }
    }

    pub fn clear(&mut self) {
        if let Err(err) = self.storage.remove(SESSION_KEY) {
            warn!("Could not clear session: {:#}", err);
        }
    }

    pub fn save_token(&mut self, token: &str) {
        if let Err(err) = self.storage.set(TOKEN_KEY, token) {
            warn!("Could not save login token: {:#}", err);
        }
    }

    /// The token of the last successful login, if any.
    pub fn restore_token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|token| !token.is_empty()),
            Err(err) => {
                warn!("Could not read login token: {:#}", err);
                None
            }
        }
    }

    pub fn clear_token(&mut self) {
        if let Err(err) = self.storage.remove(TOKEN_KEY) {
            warn!("Could not clear login token: {:#}", err);
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}
