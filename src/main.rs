use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use hamstead::biome::BiomePlugin;
use hamstead::clock::ClockPlugin;
use hamstead::config::SanctuaryConfig;
use hamstead::data::DataPlugin;
use hamstead::ledger::LedgerPlugin;
use hamstead::save::SavePlugin;
use hamstead::shared::*;

const CONFIG_PATH: &str = "sanctuary.ron";
const TICKS_PER_SECOND: f64 = 10.0;

fn main() {
    // Config goes in before the plugins: the RNG and slot count are read
    // from it when the biome resources are created.
    let config = SanctuaryConfig::load_or_default(CONFIG_PATH);

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(
            Duration::from_secs_f64(1.0 / TICKS_PER_SECOND),
        )))
        .add_plugins(LogPlugin::default())
        .add_plugins(StatesPlugin)
        .insert_resource(config)
        // Game state
        .init_state::<GameState>()
        // Domain plugins
        .add_plugins(DataPlugin)
        .add_plugins(ClockPlugin)
        .add_plugins(BiomePlugin)
        .add_plugins(LedgerPlugin)
        .add_plugins(SavePlugin)
        .run();
}
