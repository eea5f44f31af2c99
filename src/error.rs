//! Error types for Hamstead.
//!
//! Each failure surface has its own enum so callers can match on the exact
//! condition. None of these are fatal to the running app: systems log them
//! and carry on.

use std::path::PathBuf;

use thiserror::Error;

/// A name did not resolve against the content catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("guest '{0}' is not in the catalog")]
    Guest(String),

    #[error("item '{0}' is not in the catalog")]
    Item(String),
}

/// Content data that breaks a catalog invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("affinity table has no entries")]
    EmptyAffinityTable,

    #[error("threshold {threshold} for guest '{guest}' is outside (0, 1]")]
    ThresholdOutOfRange { guest: String, threshold: f64 },

    #[error("threshold {threshold} for guest '{guest}' does not exceed previous {previous}")]
    NonIncreasingThreshold {
        guest: String,
        threshold: f64,
        previous: f64,
    },

    #[error("final threshold is {threshold}, expected 1.0")]
    FinalThresholdNotOne { threshold: f64 },

    #[error("guest '{guest}' appears twice in one affinity table")]
    DuplicateGuest { guest: String },

    #[error("guest '{guest}' has {field} range [{min}, {max}] with max below min")]
    InvalidRange {
        guest: String,
        field: &'static str,
        min: u32,
        max: u32,
    },

    #[error("item '{item}' lists unknown guest '{guest}'")]
    UnknownGuest { item: String, guest: String },
}

/// A player command against the biome could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BiomeError {
    #[error("slot {slot} does not exist (biome has {slot_count} slots)")]
    SlotOutOfRange { slot: usize, slot_count: usize },

    #[error("slot {slot} is empty")]
    SlotEmpty { slot: usize },

    #[error("item '{item}' is already placed in slot {slot}")]
    ItemAlreadyPlaced { item: String, slot: usize },

    #[error(transparent)]
    NotFound(#[from] NotFoundError),
}

/// One saved slot or visit record that could not be reconstructed.
/// The record is dropped; the rest of the save still loads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestoreError {
    #[error("record has an empty {0} name")]
    EmptyName(&'static str),

    #[error("{field} timestamp '{value}' is not RFC 3339")]
    BadTimestamp { field: &'static str, value: String },

    #[error("visit by '{guest}' departs at or before it arrives")]
    EmptyWindow { guest: String },

    #[error("slot {slot} is outside this biome")]
    SlotOutOfRange { slot: usize },

    #[error("item '{0}' is already in another slot")]
    DuplicateItem(String),

    #[error("visit at '{0}' belongs to no slot")]
    OrphanVisit(String),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse config: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("no save at {0}")]
    Missing(PathBuf),

    #[error("save I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("save serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
