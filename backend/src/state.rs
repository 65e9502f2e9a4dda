use crate::config::Config;
use crate::storage::SharePointStore;

/// Shared application state, injected into handlers as `web::Data` in
/// `main.rs`. Immutable after startup: nothing here is mutated across requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: SharePointStore,
}
