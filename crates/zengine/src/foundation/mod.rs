//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and the 2D transform
//! - Handle-based collections
//! - Frame timing and the fixed-step accumulator
//! - Logging setup

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;
