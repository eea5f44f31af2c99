use crate::error::CatalogError;
use crate::shared::*;

/// Populate the catalog with every placeable item.
///
/// Affinity tables list the rarest guest first; each threshold is the
/// cumulative upper bound of that guest's band.
pub fn populate_items(catalog: &mut Catalog) -> Result<(), CatalogError> {
    let items = [
        item(
            "Ball",
            30,
            6,
            2,
            &[
                ("Gizmo", 0.1),
                ("Bear", 0.2),
                ("Pudding", 0.35),
                ("Mochi", 0.5),
                ("Peanut", 0.7),
                ("Biscuit", 1.0),
            ],
        )?,
        item(
            "Wheel",
            80,
            8,
            3,
            &[
                ("Bear", 0.05),
                ("Peanut", 0.3),
                ("Pepper", 0.55),
                ("Nugget", 0.75),
                ("Biscuit", 1.0),
            ],
        )?,
        item(
            "Tunnel",
            50,
            6,
            2,
            &[
                ("Gizmo", 0.05),
                ("Clover", 0.25),
                ("Hazel", 0.5),
                ("Peanut", 0.75),
                ("Pudding", 1.0),
            ],
        )?,
        item(
            "Hammock",
            120,
            12,
            1,
            &[
                ("Bear", 0.15),
                ("Hazel", 0.4),
                ("Mochi", 0.7),
                ("Biscuit", 1.0),
            ],
        )?,
        item(
            "Sunflower Seeds",
            10,
            3,
            3,
            &[
                ("Nugget", 0.2),
                ("Mochi", 0.45),
                ("Pepper", 0.65),
                ("Peanut", 0.85),
                ("Biscuit", 1.0),
            ],
        )?,
        item(
            "Cardboard Castle",
            150,
            24,
            1,
            &[
                ("Gizmo", 0.1),
                ("Pepper", 0.3),
                ("Clover", 0.55),
                ("Bear", 0.8),
                ("Hazel", 1.0),
            ],
        )?,
        item(
            "Apple Slice",
            15,
            2,
            2,
            &[
                ("Pudding", 0.25),
                ("Mochi", 0.55),
                ("Nugget", 0.8),
                ("Biscuit", 1.0),
            ],
        )?,
        item(
            "Teacup",
            60,
            6,
            1,
            &[
                ("Clover", 0.15),
                ("Hazel", 0.35),
                ("Pudding", 0.6),
                ("Gizmo", 0.65),
                ("Biscuit", 1.0),
            ],
        )?,
    ];
    for i in items {
        catalog.insert_item(i);
    }
    Ok(())
}

fn item(
    name: &str,
    price: u32,
    duration_hours: u32,
    max_visits_per_hour: u8,
    bands: &[(&str, f64)],
) -> Result<ItemDef, CatalogError> {
    Ok(ItemDef {
        name: name.into(),
        price,
        duration_hours,
        max_visits_per_hour,
        affinity: AffinityTable::new(bands.iter().copied())?,
    })
}
