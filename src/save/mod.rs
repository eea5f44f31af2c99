//! Save domain: persists the biome and ledger as JSON.
//!
//! Saves go to `SanctuaryConfig::save_path`, written to a temp file first and
//! then renamed into place. The save is restored once, the first time the game
//! reaches Playing, and written again after any frame that paid a gift or
//! changed a slot, and on suspend.

pub mod snapshot;

use bevy::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::biome::{Biome, VisitRng};
use crate::clock::SessionClock;
use crate::config::SanctuaryConfig;
use crate::error::SaveError;
use crate::ledger::Ledger;
use crate::shared::*;

pub use snapshot::{restore_biome, SaveFile, SlotSnapshot, VisitRecord, SAVE_VERSION};

// ═══════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════

/// Write the current biome and ledger to the configured path.
#[derive(Event, Debug, Clone, Default)]
pub struct SaveRequestEvent;

/// Replace the current biome and ledger with the configured save.
#[derive(Event, Debug, Clone, Default)]
pub struct LoadRequestEvent;

/// Sent by SavePlugin after a save completes (success or failure).
#[derive(Event, Debug, Clone)]
pub struct SaveCompleteEvent {
    pub path: PathBuf,
    pub success: bool,
    pub error_message: Option<String>,
}

/// Sent by SavePlugin after a load completes.
#[derive(Event, Debug, Clone)]
pub struct LoadCompleteEvent {
    pub path: PathBuf,
    pub success: bool,
    pub error_message: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SaveRequestEvent>()
            .add_event::<LoadRequestEvent>()
            .add_event::<SaveCompleteEvent>()
            .add_event::<LoadCompleteEvent>()
            .add_event::<Gift>()
            .add_event::<SlotChangedEvent>()
            .add_systems(OnEnter(GameState::Playing), restore_on_first_play)
            .add_systems(OnEnter(GameState::Suspended), autosave_on_suspend)
            // PostUpdate so the ledger has already applied this frame's gifts
            // (apply_gifts runs after observe_slots in Update).
            .add_systems(
                PostUpdate,
                (autosave_on_change, handle_load_request)
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                PostUpdate,
                handle_save_request
                    .after(autosave_on_change)
                    .run_if(in_state(GameState::Playing).or(in_state(GameState::Suspended))),
            );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// FILESYSTEM HELPERS
// ═══════════════════════════════════════════════════════════════════════

pub fn write_save(path: &Path, file: &SaveFile) -> Result<(), SaveError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }
    let json = serde_json::to_string_pretty(file)?;

    // Write to a temp file first, then rename for atomicity
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

pub fn read_save(path: &Path) -> Result<SaveFile, SaveError> {
    if !path.exists() {
        return Err(SaveError::Missing(path.to_path_buf()));
    }
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

fn restore_on_first_play(
    mut done: Local<bool>,
    config: Res<SanctuaryConfig>,
    mut load_writer: EventWriter<LoadRequestEvent>,
) {
    if *done {
        return;
    }
    *done = true;
    if Path::new(&config.save_path).exists() {
        info!("[Save] Found {}, restoring", config.save_path);
        load_writer.send(LoadRequestEvent);
    }
}

fn autosave_on_suspend(config: Res<SanctuaryConfig>, mut save_writer: EventWriter<SaveRequestEvent>) {
    if config.autosave {
        info!("[Save] Autosaving on suspend");
        save_writer.send(SaveRequestEvent);
    }
}

/// Requests one save for any frame that paid a gift or changed a slot.
fn autosave_on_change(
    mut gifts: EventReader<Gift>,
    mut changes: EventReader<SlotChangedEvent>,
    config: Res<SanctuaryConfig>,
    mut save_writer: EventWriter<SaveRequestEvent>,
) {
    let changed = gifts.read().count() + changes.read().count() > 0;
    if changed && config.autosave {
        save_writer.send(SaveRequestEvent);
    }
}

fn handle_save_request(
    mut save_events: EventReader<SaveRequestEvent>,
    mut complete_events: EventWriter<SaveCompleteEvent>,
    biome: Res<Biome>,
    ledger: Res<Ledger>,
    clock: Res<SessionClock>,
    config: Res<SanctuaryConfig>,
) {
    // Several requests in one frame collapse into one write.
    if save_events.read().count() == 0 {
        return;
    }
    let path = PathBuf::from(&config.save_path);
    let file = SaveFile::capture(&biome, &ledger, clock.now());

    match write_save(&path, &file) {
        Ok(()) => {
            debug!("[Save] Wrote {}", path.display());
            complete_events.send(SaveCompleteEvent {
                path,
                success: true,
                error_message: None,
            });
        }
        Err(e) => {
            warn!("[Save] Save to {} FAILED: {}", path.display(), e);
            complete_events.send(SaveCompleteEvent {
                path,
                success: false,
                error_message: Some(e.to_string()),
            });
        }
    }
}

fn handle_load_request(
    mut load_events: EventReader<LoadRequestEvent>,
    mut complete_events: EventWriter<LoadCompleteEvent>,
    mut biome: ResMut<Biome>,
    mut ledger: ResMut<Ledger>,
    mut rng: ResMut<VisitRng>,
    catalog: Res<Catalog>,
    clock: Res<SessionClock>,
    config: Res<SanctuaryConfig>,
) {
    if load_events.read().count() == 0 {
        return;
    }
    let path = PathBuf::from(&config.save_path);

    match read_save(&path) {
        Ok(file) => {
            *biome = restore_biome(&file, &catalog, config.slot_count, clock.now(), &mut rng.0);
            *ledger = file.ledger;
            info!("[Save] Load from {} succeeded.", path.display());
            complete_events.send(LoadCompleteEvent {
                path,
                success: true,
                error_message: None,
            });
        }
        Err(e) => {
            warn!("[Save] Load from {} FAILED: {}", path.display(), e);
            complete_events.send(LoadCompleteEvent {
                path,
                success: false,
                error_message: Some(e.to_string()),
            });
        }
    }
}
