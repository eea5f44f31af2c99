//! Visit generation: guest selection, single-visit timing, per-item schedules
//! and cross-item arbitration. Everything here is pure and takes its RNG by
//! reference; the biome owns the state.

pub mod arbitration;
pub mod generator;
pub mod schedule;
pub mod select;

pub use arbitration::{affinity_rank, arbitrate, arbitrate_at};
pub use generator::generate_visit;
pub use schedule::{ItemVisits, ScheduleBuilder, VisitSchedule};
pub use select::{resolve_fallback, select_guest, select_guest_with_draw};
