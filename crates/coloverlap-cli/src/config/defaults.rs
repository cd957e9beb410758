use coloverlap::engine::config::DEFAULT_BATCH_SIZE;

/// Values used when neither the config file nor the command line sets them.
pub struct DefaultsConfig {
    pub batch_size: usize,
    pub merge_conformers: bool,
    pub pretty: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            merge_conformers: true,
            pretty: false,
        }
    }
}
