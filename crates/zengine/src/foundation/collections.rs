//! Specialized collection types

pub use slotmap::{SlotMap, DefaultKey};

/// Handle-based map using slot map for stable references
pub type HandleMap<T> = SlotMap<DefaultKey, T>;

/// Typed handle for type-safe asset references
#[derive(Debug)]
pub struct TypedHandle<T> {
    key: DefaultKey,
    _phantom: std::marker::PhantomData<fn() -> T>,
}

impl<T> TypedHandle<T> {
    /// Create a new typed handle from a key
    pub fn new(key: DefaultKey) -> Self {
        Self {
            key,
            _phantom: std::marker::PhantomData,
        }
    }
    
    /// Get the underlying key
    pub fn key(&self) -> DefaultKey {
        self.key
    }
}

impl<T> Clone for TypedHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedHandle<T> {}

impl<T> PartialEq for TypedHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for TypedHandle<T> {}

impl<T> std::hash::Hash for TypedHandle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Marker;

    #[test]
    fn test_typed_handle_equality_ignores_marker() {
        let mut map: HandleMap<u32> = HandleMap::new();
        let a = map.insert(1);
        let b = map.insert(2);

        let ha: TypedHandle<Marker> = TypedHandle::new(a);
        let ha_copy = ha;
        assert_eq!(ha, ha_copy);
        assert_ne!(ha, TypedHandle::<Marker>::new(b));
        assert_eq!(ha.key(), a);
    }
}
