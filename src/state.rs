// src/state.rs
use crate::db::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    /// Ver `Config::fixture_fallback`.
    pub fixture_fallback: bool,
}

// Permite extrair a Store diretamente
impl axum::extract::FromRef<AppState> for Store {
    fn from_ref(state: &AppState) -> Store {
        state.store.clone()
    }
}
