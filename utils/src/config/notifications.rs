use anyhow::anyhow;
use notify::{Config as NotifyConfig, Event, RecommendedWatcher, Watcher};
use std::{
    fmt::Debug,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing::{debug, error};

pub trait Load: Default + Send + Debug {
    fn load(path: &Path) -> anyhow::Result<Self>;
}

/// Builds a watcher that reloads `target` from `path` whenever the file is modified.
/// A reload that fails to parse keeps the previous value.
pub fn initialize<T: Load + 'static>(
    target: Arc<Mutex<T>>,
    path: PathBuf,
) -> anyhow::Result<RecommendedWatcher> {
    let t_clone = Arc::clone(&target);
    RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event.kind.is_modify() {
                    match T::load(&path) {
                        Ok(config) => {
                            let mut current = t_clone.lock().unwrap_or_else(|e| e.into_inner());
                            *current = config;
                            debug!(target: "Notify", "New configuration loaded, {:?}", current);
                        }
                        Err(e) => error!(target: "Notify", "Error loading config, {}", e),
                    }
                }
            }
            Err(e) => error!(target: "Notify", "Error processing notify event: {}", e),
        },
        NotifyConfig::default()
            .with_poll_interval(Duration::from_secs(2))
            .with_compare_contents(true),
    )
    .map_err(|e| anyhow!("Error creating notification watcher, {e}"))
}
