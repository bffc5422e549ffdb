use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "DentSync";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reconciliation cadence (milliseconds).
pub const RECONCILE_INTERVAL_MS: u64 = 4_000;

/// Sleep granularity inside the reconciliation loop, for responsive shutdown.
pub const RECONCILE_SLEEP_GRANULARITY_MS: u64 = 500;

/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "dentsync=info";

/// Get the application data directory
/// ~/DentSync/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("DentSync")
}

/// Default path of the file-backed store.
pub fn store_path() -> PathBuf {
    app_data_dir().join("store.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("DentSync"));
    }

    #[test]
    fn store_path_under_app_data() {
        let path = store_path();
        assert!(path.starts_with(app_data_dir()));
        assert!(path.ends_with("store.json"));
    }

    #[test]
    fn sleep_granularity_divides_interval() {
        assert_eq!(RECONCILE_INTERVAL_MS % RECONCILE_SLEEP_GRANULARITY_MS, 0);
    }
}
