//! Synchronous events broadcast from an entity to itself and its components
//!
//! An event is any `'static` value implementing [`Event`]. It lives on the
//! caller's stack for the duration of [`World::broadcast`](super::World::broadcast);
//! receivers inspect it with [`downcast_ref`](trait.Event.html#method.downcast_ref).

use super::AsAny;

/// Marker trait for broadcastable event types
pub trait Event: AsAny + 'static {}

impl dyn Event {
    /// True if the event is a `T`
    pub fn is<T: Event>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrow the event as a `T`
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Damage(u32);
    impl Event for Damage {}

    struct Heal;
    impl Event for Heal {}

    #[test]
    fn test_downcast_matches_concrete_type() {
        let event: &dyn Event = &Damage(7);
        assert!(event.is::<Damage>());
        assert!(!event.is::<Heal>());
        assert_eq!(event.downcast_ref::<Damage>().map(|d| d.0), Some(7));
        assert!(event.downcast_ref::<Heal>().is_none());
    }
}
