pub mod stats;

pub mod ids {
    use stats_counter::PLUGIN_ID;

    pub const STATS_COUNTER: &str = const_format::concatcp!(PLUGIN_ID, ".counter");
}
