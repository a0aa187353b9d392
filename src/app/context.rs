use std::path::Path;
use std::sync::Arc;

use crate::app::Result;
use crate::config::Settings;
use crate::covers::CoverStore;
use crate::graphql::{HttpTransport, Transport};
use crate::hardcover::HardcoverClient;
use crate::selection::Selection;

/// Wires the engine together: settings, transport, client and the
/// process-lifetime caches. Components are constructed here and handed
/// down explicitly so tests can assemble the same shape around fakes.
pub struct AppContext {
    pub client: HardcoverClient,
    pub selection: Selection,
    pub settings: Settings,
}

impl AppContext {
    pub fn new() -> Result<Self> {
        Ok(Self::with_settings(Settings::load()?))
    }

    pub fn from_config_file(path: &Path) -> Result<Self> {
        Ok(Self::with_settings(Settings::from_file(path)?))
    }

    pub fn with_settings(settings: Settings) -> Self {
        let transport: Arc<dyn Transport> =
            Arc::new(HttpTransport::new(settings.bearer_token().unwrap_or_default()));
        let covers = Arc::new(CoverStore::new());
        let client = HardcoverClient::new(settings.clone(), transport, covers);

        Self {
            client,
            selection: Selection::new(),
            settings,
        }
    }
}
