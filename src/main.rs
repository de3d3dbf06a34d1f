mod actions;
mod render;

use stats_counter::PLUGIN_ID;
use streamdeck_lib::prelude::*;
use tracing::info;

use actions::stats::StatsCounterAction;

fn main() -> anyhow::Result<()> {
    let _guard = init(PLUGIN_ID);
    info!("Starting Stats Counter Stream Deck plugin");

    let plugin = Plugin::new().add_action(ActionFactory::default_of::<StatsCounterAction>());

    run_plugin(plugin)
}
