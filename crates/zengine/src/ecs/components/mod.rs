//! Built-in components

pub mod lifetime;

pub use lifetime::Lifetime;
