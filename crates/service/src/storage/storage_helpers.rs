use cotizador_core::storage::Storage;
use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::path::Path;

struct CachedStorage {
    path: String,
    storage: Storage,
}

thread_local! {
    static STORAGE_CACHE: RefCell<Option<CachedStorage>> = const { RefCell::new(None) };
}

/// Per-thread handle to the sqlite connection. Dropping the handle parks the
/// connection back in the thread-local cache so worker threads do not reopen
/// the database on every request.
pub(crate) struct StorageHandle {
    path: String,
    storage: Option<Storage>,
}

impl StorageHandle {
    fn new(path: String, storage: Storage) -> Self {
        Self {
            path,
            storage: Some(storage),
        }
    }
}

impl Deref for StorageHandle {
    type Target = Storage;

    fn deref(&self) -> &Self::Target {
        self.storage.as_ref().expect("storage handle should exist")
    }
}

impl DerefMut for StorageHandle {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.storage.as_mut().expect("storage handle should exist")
    }
}

impl Drop for StorageHandle {
    fn drop(&mut self) {
        let Some(storage) = self.storage.take() else {
            return;
        };
        let path = self.path.clone();
        STORAGE_CACHE.with(|cell| {
            let mut cache = cell.borrow_mut();
            *cache = Some(CachedStorage { path, storage });
        });
    }
}

pub(crate) fn open_storage() -> Option<StorageHandle> {
    let path = match std::env::var(crate::process_env::ENV_DB_PATH) {
        Ok(path) => path,
        Err(_) => {
            log::warn!("{} not set", crate::process_env::ENV_DB_PATH);
            return None;
        }
    };
    open_storage_at_path(&path)
}

fn open_storage_at_path(path: &str) -> Option<StorageHandle> {
    if let Some(storage) = take_cached_storage(path) {
        return Some(StorageHandle::new(path.to_string(), storage));
    }

    if !Path::new(path).exists() {
        log::warn!("storage path missing: {}", path);
    }
    let storage = match Storage::open(Path::new(path)) {
        Ok(storage) => storage,
        Err(err) => {
            log::error!("open storage failed: {} ({})", path, err);
            return None;
        }
    };
    Some(StorageHandle::new(path.to_string(), storage))
}

/// Runs the schema migrations once at startup. Not part of `open_storage`
/// so per-request opens do not repeat the migration checks.
pub(crate) fn initialize_storage() -> Result<(), String> {
    let path = std::env::var(crate::process_env::ENV_DB_PATH)
        .map_err(|_| format!("{} not set", crate::process_env::ENV_DB_PATH))?;
    if !Path::new(&path).exists() {
        log::warn!("storage path missing: {}", path);
    }
    let storage = Storage::open(Path::new(&path))
        .map_err(|err| format!("open storage failed: {} ({})", path, err))?;
    storage
        .init()
        .map_err(|err| format!("storage init failed: {} ({})", path, err))?;
    Ok(())
}

fn take_cached_storage(path: &str) -> Option<Storage> {
    STORAGE_CACHE.with(|cell| {
        let mut cache = cell.borrow_mut();
        match cache.take() {
            Some(CachedStorage {
                path: cached_path,
                storage,
            }) if cached_path == path => Some(storage),
            Some(other) => {
                *cache = Some(other);
                None
            }
            None => None,
        }
    })
}
