//! Asset management system
//!
//! Assets are loaded synchronously, cached by path and addressed through
//! typed handles. Each asset type may register a default that stands in
//! for an empty path or a failed load, so callers always get something
//! drawable when a default exists.

pub mod texture;

pub use texture::Texture;

use std::any::TypeId;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::ecs::AsAny;
use crate::engine::AssetConfig;
use crate::foundation::collections::{DefaultKey, HandleMap, TypedHandle};

/// Asset handle type
pub type AssetHandle<T> = TypedHandle<T>;

/// Asset trait for loadable resources
pub trait Asset: Send + Sync + 'static {
    /// Load asset from raw bytes
    fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError>
    where
        Self: Sized;

    /// Free whatever the asset holds outside of Rust ownership
    fn release(&mut self) {}
}

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Failed to load asset
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    /// Invalid asset data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Unsupported asset format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

struct StoredAsset<T> {
    asset: T,
    path: String,
}

/// All assets of one type
struct AssetStore<T: Asset> {
    assets: HandleMap<StoredAsset<T>>,
    by_path: HashMap<String, DefaultKey>,
    default: Option<DefaultKey>,
}

impl<T: Asset> Default for AssetStore<T> {
    fn default() -> Self {
        Self { assets: HandleMap::new(), by_path: HashMap::new(), default: None }
    }
}

/// Type-erased view of an [`AssetStore`]
trait AnyStore: AsAny + Send + Sync {
    fn release_all(&mut self);
    fn count(&self) -> usize;
}

impl<T: Asset> AnyStore for AssetStore<T> {
    fn release_all(&mut self) {
        for (_, mut stored) in self.assets.drain() {
            stored.asset.release();
        }
        self.by_path.clear();
        self.default = None;
    }

    fn count(&self) -> usize {
        self.assets.len()
    }
}

/// Asset management system
#[derive(Default)]
pub struct AssetManager {
    stores: HashMap<TypeId, Box<dyn AnyStore>>,
    search_paths: Vec<PathBuf>,
}

impl AssetManager {
    /// Create a new asset manager
    pub fn new(config: &AssetConfig) -> Self {
        Self {
            stores: HashMap::new(),
            search_paths: config.search_paths.iter().map(PathBuf::from).collect(),
        }
    }

    /// Directories tried, in order, before the path itself
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Append a directory to the search paths
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.search_paths.push(path.into());
    }

    /// Load an asset, falling back to the type's default
    ///
    /// An empty path yields the default. A path loaded before yields the
    /// cached handle. A read or decode failure is logged and also yields the
    /// default, which is `None` if none was registered.
    pub fn load<T: Asset>(&mut self, path: &str) -> Option<AssetHandle<T>> {
        if path.is_empty() {
            return self.default_handle::<T>();
        }
        match self.try_load::<T>(path) {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to load {} from '{path}': {e}", std::any::type_name::<T>());
                self.default_handle::<T>()
            }
        }
    }

    /// Load an asset without falling back to the default
    pub fn try_load<T: Asset>(&mut self, path: &str) -> Result<AssetHandle<T>, AssetError> {
        if let Some(key) = self.store::<T>().and_then(|store| store.by_path.get(path).copied()) {
            return Ok(AssetHandle::new(key));
        }

        let file_path = self.resolve(path).ok_or_else(|| AssetError::NotFound(path.to_string()))?;
        let bytes = fs::read(&file_path)?;
        let asset = T::from_bytes(&bytes)?;
        log::debug!("Loaded {} from {}", std::any::type_name::<T>(), file_path.display());

        Ok(self.insert(asset, path))
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .map(|search_path| search_path.join(path))
            .chain(std::iter::once(PathBuf::from(path)))
            .find(|candidate| candidate.is_file())
    }

    /// Register an asset built at runtime under `path`
    ///
    /// Ignored for an empty path; if `path` is already taken the existing
    /// asset is kept and its handle returned.
    pub fn register<T: Asset>(&mut self, asset: T, path: &str) -> Option<AssetHandle<T>> {
        if path.is_empty() {
            log::debug!("Ignoring {} registered without a path", std::any::type_name::<T>());
            return None;
        }
        if let Some(key) = self.store::<T>().and_then(|store| store.by_path.get(path).copied()) {
            return Some(AssetHandle::new(key));
        }
        Some(self.insert(asset, path))
    }

    /// Set the asset used for empty paths and failed loads
    ///
    /// A previous default of the same type is released and replaced.
    pub fn register_default<T: Asset>(&mut self, asset: T) -> AssetHandle<T> {
        let store = self.store_mut::<T>();
        if let Some(mut previous) = store.default.take().and_then(|key| store.assets.remove(key)) {
            previous.asset.release();
        }
        let key = store.assets.insert(StoredAsset { asset, path: String::new() });
        store.default = Some(key);
        AssetHandle::new(key)
    }

    /// Handle of the type's default asset, if one was registered
    pub fn default_handle<T: Asset>(&self) -> Option<AssetHandle<T>> {
        self.store::<T>()?.default.map(AssetHandle::new)
    }

    fn insert<T: Asset>(&mut self, asset: T, path: &str) -> AssetHandle<T> {
        let store = self.store_mut::<T>();
        let key = store.assets.insert(StoredAsset { asset, path: path.to_string() });
        store.by_path.insert(path.to_string(), key);
        AssetHandle::new(key)
    }

    /// Get an asset by handle
    pub fn get<T: Asset>(&self, handle: AssetHandle<T>) -> Option<&T> {
        self.store::<T>()?.assets.get(handle.key()).map(|stored| &stored.asset)
    }

    /// Get mutable access to an asset by handle
    pub fn get_mut<T: Asset>(&mut self, handle: AssetHandle<T>) -> Option<&mut T> {
        self.store_mut_existing::<T>()?.assets.get_mut(handle.key()).map(|stored| &mut stored.asset)
    }

    /// Path an asset was loaded from; empty for the default
    pub fn path<T: Asset>(&self, handle: AssetHandle<T>) -> Option<&str> {
        self.store::<T>()?.assets.get(handle.key()).map(|stored| stored.path.as_str())
    }

    /// True if the handle still names a cached asset
    pub fn is_loaded<T: Asset>(&self, handle: AssetHandle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Number of cached assets of type `T`, default included
    pub fn len<T: Asset>(&self) -> usize {
        self.store::<T>().map_or(0, |store| store.assets.len())
    }

    /// Total number of cached assets of every type
    pub fn total_len(&self) -> usize {
        self.stores.values().map(|store| store.count()).sum()
    }

    /// Release every asset and default
    pub fn clear(&mut self) {
        let released = self.total_len();
        for store in self.stores.values_mut() {
            store.release_all();
        }
        self.stores.clear();
        if released > 0 {
            log::debug!("Released {released} assets");
        }
    }

    fn store<T: Asset>(&self) -> Option<&AssetStore<T>> {
        let store: &dyn AnyStore = self.stores.get(&TypeId::of::<T>())?.as_ref();
        store.as_any().downcast_ref::<AssetStore<T>>()
    }

    fn store_mut_existing<T: Asset>(&mut self) -> Option<&mut AssetStore<T>> {
        let store: &mut dyn AnyStore = self.stores.get_mut(&TypeId::of::<T>())?.as_mut();
        store.as_any_mut().downcast_mut::<AssetStore<T>>()
    }

    fn store_mut<T: Asset>(&mut self) -> &mut AssetStore<T> {
        let store = self
            .stores
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(AssetStore::<T>::default()));
        let store: &mut dyn AnyStore = store.as_mut();
        match store.as_any_mut().downcast_mut::<AssetStore<T>>() {
            Some(store) => store,
            None => unreachable!("asset stores are keyed by their own TypeId"),
        }
    }
}

impl Drop for AssetManager {
    fn drop(&mut self) {
        self.clear();
    }
}
