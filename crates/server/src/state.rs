use gamelist_core::{Config, GameLibrary};

/// Shared application state
pub struct AppState {
    config: Config,
    library: GameLibrary,
}

impl AppState {
    pub fn new(config: Config, library: GameLibrary) -> Self {
        Self { config, library }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn library(&self) -> &GameLibrary {
        &self.library
    }
}
