//! # Engine Module
//!
//! Internal storage engine implementation.
//!
//! This module contains all core building blocks:
//! - Handle and slot map management
//! - Component type metadata
//! - Type-erased column storage
//! - Archetypes and row migration
//! - The archetype index
//! - The registry façade
//! - Query execution
//!
//! Public API exposure is controlled by `lib.rs`.

pub mod types;
pub mod error;
pub mod component;
pub mod storage;
pub mod slot_map;
pub mod archetype;
pub mod index;
pub mod registry;
pub mod view;
