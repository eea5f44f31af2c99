//! Data layer: populates the content catalog at startup.
//!
//! This plugin runs in OnEnter(GameState::Loading), fills the `Catalog` from
//! the hard-coded content in submodules, validates it, then transitions the
//! game into GameState::Playing.
//!
//! No other domain needs to seed the catalog. All domain plugins can safely
//! read it once GameState has advanced past Loading.

mod guests;
mod items;

use bevy::prelude::*;

use crate::error::CatalogError;
use crate::shared::*;

pub struct DataPlugin;

impl Plugin for DataPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Catalog>()
            .add_systems(OnEnter(GameState::Loading), load_catalog);
    }
}

/// The built-in guests and items, validated.
pub fn builtin_catalog() -> Result<Catalog, CatalogError> {
    let mut catalog = Catalog::default();
    guests::populate_guests(&mut catalog);
    items::populate_items(&mut catalog)?;
    catalog.validate()?;
    Ok(catalog)
}

/// Populates the catalog and then transitions to Playing. Bad content keeps
/// the app in Loading.
fn load_catalog(mut catalog: ResMut<Catalog>, mut next_state: ResMut<NextState<GameState>>) {
    info!("[Data] Populating catalog…");
    match builtin_catalog() {
        Ok(loaded) => {
            info!(
                "[Data] Guests loaded: {}, items loaded: {}",
                loaded.guests.len(),
                loaded.items.len()
            );
            *catalog = loaded;
            next_state.set(GameState::Playing);
        }
        Err(e) => error!("[Data] Content failed validation: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = builtin_catalog().unwrap();
        assert_eq!(catalog.guests.len(), 10);
        assert_eq!(catalog.items.len(), 8);
    }

    #[test]
    fn test_ball_table_matches_design() {
        let catalog = builtin_catalog().unwrap();
        let ball = catalog.lookup_item("Ball").unwrap();
        let first = &ball.affinity.entries()[0];
        assert_eq!((first.guest.as_str(), first.threshold), ("Gizmo", 0.1));
        assert_eq!(ball.affinity.rank_of("Bear"), Some(1));
        assert_eq!(ball.affinity.entries().last().unwrap().guest, "Biscuit");
    }

    #[test]
    fn test_every_table_guest_exists() {
        let catalog = builtin_catalog().unwrap();
        for item in catalog.items.values() {
            for guest in item.affinity.guests() {
                assert!(catalog.lookup_guest(guest).is_ok(), "{} -> {}", item.name, guest);
            }
        }
    }
}
