//! Biome domain: slots, their visit schedules, and gift settlement.
//!
//! Player commands arrive as events and are applied in a fixed order each
//! frame: place, remove, refill, then observation at the session clock, then
//! rescheduling of exhausted slots. Gifts and slot changes go out as events.

pub mod presence;
pub mod slot;
pub mod state;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::clock::SessionClock;
use crate::config::SanctuaryConfig;
use crate::shared::*;

pub use presence::GuestPresence;
pub use slot::{PlacedItem, Slot, SlotPhase};
pub use state::{Biome, BuildContext, Removal};

/// Randomness for visit generation. Seeded from config when a seed is set.
#[derive(Resource, Debug, Clone)]
pub struct VisitRng(pub StdRng);

impl VisitRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl FromWorld for VisitRng {
    fn from_world(world: &mut World) -> Self {
        match world.get_resource::<SanctuaryConfig>().and_then(|c| c.rng_seed) {
            Some(seed) => {
                info!("[Biome] Visit RNG seeded with {}", seed);
                Self::seeded(seed)
            }
            None => Self(StdRng::from_entropy()),
        }
    }
}

impl FromWorld for Biome {
    fn from_world(world: &mut World) -> Self {
        let slot_count = world
            .get_resource::<SanctuaryConfig>()
            .map(|c| c.slot_count)
            .unwrap_or(DEFAULT_SLOT_COUNT);
        Biome::new(slot_count)
    }
}

pub struct BiomePlugin;

impl Plugin for BiomePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SanctuaryConfig>()
            .init_resource::<SessionClock>()
            .init_resource::<VisitRng>()
            .init_resource::<Biome>()
            .add_event::<PlaceItemEvent>()
            .add_event::<RemoveItemEvent>()
            .add_event::<RefillItemEvent>()
            .add_event::<SlotChangedEvent>()
            .add_event::<Gift>()
            .add_systems(
                Update,
                (
                    handle_place_requests,
                    handle_remove_requests,
                    handle_refill_requests,
                    observe_slots,
                    auto_reschedule.run_if(auto_reschedule_enabled),
                )
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            );
    }
}

// ─── Run Conditions ───────────────────────────────────────────────────────────

fn auto_reschedule_enabled(config: Res<SanctuaryConfig>) -> bool {
    config.auto_reschedule
}

// ─── Command handlers ────────────────────────────────────────────────────────

fn handle_place_requests(
    mut requests: EventReader<PlaceItemEvent>,
    mut biome: ResMut<Biome>,
    mut rng: ResMut<VisitRng>,
    catalog: Res<Catalog>,
    config: Res<SanctuaryConfig>,
    clock: Res<SessionClock>,
    mut gifts: EventWriter<Gift>,
    mut changes: EventWriter<SlotChangedEvent>,
) {
    for ev in requests.read() {
        let replaced = biome
            .slot(ev.slot)
            .ok()
            .and_then(|s| s.item())
            .map(str::to_string);
        let ctx = BuildContext {
            catalog: &catalog,
            fallback: &config.fallback,
            rng: &mut rng.0,
        };
        match biome.place_item(ev.slot, &ev.item, clock.now(), ctx) {
            Ok(settled) => {
                gifts.send_batch(settled);
                if let Some(old) = replaced {
                    changes.send(SlotChangedEvent {
                        slot: ev.slot,
                        change: SlotChange::Removed(old),
                    });
                }
                changes.send(SlotChangedEvent {
                    slot: ev.slot,
                    change: SlotChange::Placed(ev.item.clone()),
                });
            }
            Err(e) => warn!("[Biome] Cannot place '{}': {}", ev.item, e),
        }
    }
}

fn handle_remove_requests(
    mut requests: EventReader<RemoveItemEvent>,
    mut biome: ResMut<Biome>,
    clock: Res<SessionClock>,
    mut gifts: EventWriter<Gift>,
    mut changes: EventWriter<SlotChangedEvent>,
) {
    for ev in requests.read() {
        match biome.remove_item(ev.slot, clock.now()) {
            Ok(removal) => {
                gifts.send_batch(removal.gifts);
                changes.send(SlotChangedEvent {
                    slot: ev.slot,
                    change: SlotChange::Removed(removal.item),
                });
            }
            Err(e) => warn!("[Biome] Cannot remove from slot {}: {}", ev.slot, e),
        }
    }
}

fn handle_refill_requests(
    mut requests: EventReader<RefillItemEvent>,
    mut biome: ResMut<Biome>,
    mut rng: ResMut<VisitRng>,
    catalog: Res<Catalog>,
    config: Res<SanctuaryConfig>,
    clock: Res<SessionClock>,
    mut gifts: EventWriter<Gift>,
    mut changes: EventWriter<SlotChangedEvent>,
) {
    for ev in requests.read() {
        let ctx = BuildContext {
            catalog: &catalog,
            fallback: &config.fallback,
            rng: &mut rng.0,
        };
        match biome.refill_slot(ev.slot, clock.now(), ctx) {
            Ok(settled) => {
                gifts.send_batch(settled);
                if let Ok(Some(item)) = biome.slot(ev.slot).map(|s| s.item()) {
                    changes.send(SlotChangedEvent {
                        slot: ev.slot,
                        change: SlotChange::Refilled(item.to_string()),
                    });
                }
            }
            Err(e) => warn!("[Biome] Cannot refill slot {}: {}", ev.slot, e),
        }
    }
}

// ─── Time-driven systems ─────────────────────────────────────────────────────

/// Settles the biome at the session clock. Every command handler runs
/// before it, so systems ordered after it see all of this frame's gifts.
pub fn observe_slots(mut biome: ResMut<Biome>, clock: Res<SessionClock>, mut gifts: EventWriter<Gift>) {
    let settled = biome.observe(clock.now());
    if !settled.is_empty() {
        gifts.send_batch(settled);
    }
}

fn auto_reschedule(
    mut biome: ResMut<Biome>,
    mut rng: ResMut<VisitRng>,
    catalog: Res<Catalog>,
    config: Res<SanctuaryConfig>,
    clock: Res<SessionClock>,
    mut changes: EventWriter<SlotChangedEvent>,
) {
    let ctx = BuildContext {
        catalog: &catalog,
        fallback: &config.fallback,
        rng: &mut rng.0,
    };
    for (slot, item) in biome.reschedule_exhausted(clock.now(), ctx) {
        changes.send(SlotChangedEvent {
            slot,
            change: SlotChange::Rescheduled(item),
        });
    }
}
