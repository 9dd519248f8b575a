use std::rc::Rc;

use tracing::info;

use crate::config::{AppConfig, LogConfig};
use crate::state::AppState;
use crate::storage::KeyValueStore;

/// Opens the platform store and runs the startup sequence.
pub fn build_app(config: AppConfig) -> anyhow::Result<AppState> {
    let backend = open_backend(&config)?;
    let state = AppState::from_parts(config, backend);
    let status = state.auth().status();
    info!(
        users = status.total_users,
        logged_in = status.current_user.is_some(),
        "fittrack ready"
    );
    Ok(state)
}

#[cfg(not(target_arch = "wasm32"))]
fn open_backend(config: &AppConfig) -> anyhow::Result<Rc<dyn KeyValueStore>> {
    use anyhow::Context;

    let store = crate::storage::FileStore::open(&config.data_dir)
        .with_context(|| format!("open data dir {}", config.data_dir.display()))?;
    info!(root = %store.root().display(), "using file store");
    Ok(Rc::new(store))
}

#[cfg(target_arch = "wasm32")]
fn open_backend(_config: &AppConfig) -> anyhow::Result<Rc<dyn KeyValueStore>> {
    let store = crate::storage::BrowserStore::open()?;
    info!("using browser localStorage");
    Ok(Rc::new(store))
}

pub fn init_tracing(log: &LogConfig) {
    if log.json {
        tracing_subscriber::fmt()
            .with_env_filter(log.filter.as_str())
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(log.filter.as_str())
            .init();
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::auth::services::{DEMO_EMAIL, DEMO_PASSWORD};

    #[test]
    fn build_app_persists_to_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig {
            data_dir: dir.path().join("store"),
            ..AppConfig::default()
        };

        let mut state = build_app(config.clone()).expect("startup");
        assert!(dir.path().join("store/fittrack_users.json").exists());
        let _ = state.auth_mut().login(DEMO_EMAIL, DEMO_PASSWORD).unwrap();

        let restarted = build_app(config).expect("restart");
        assert_eq!(restarted.auth().directory().len(), 1);
        assert!(restarted.auth().is_logged_in());
    }
}
