//! View configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Texts shown on the playback controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonLabels {
    /// Idle: start a simulation
    pub simulate: String,
    /// Computing: waiting for the backend
    pub simulating: String,
    /// Ready: start playback
    pub run: String,
    /// Playing: stop playback
    pub stop: String,
}

impl Default for ButtonLabels {
    fn default() -> Self {
        Self {
            simulate: "Simulate".to_string(),
            simulating: "Simulating".to_string(),
            run: "Run".to_string(),
            stop: "Stop".to_string(),
        }
    }
}

/// Configuration for a network view and its server.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    /// Width of the side menu left of the canvas, in page pixels
    pub side_panel_width: f64,
    /// Delay between packet animation frames
    pub frame_interval: Duration,
    /// HTTP listen port
    pub port: u16,
    /// Control texts
    pub labels: ButtonLabels,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            side_panel_width: 0.0,
            frame_interval: Duration::from_millis(1000),
            port: 3000,
            labels: ButtonLabels::default(),
        }
    }
}

impl ViewConfig {
    /// Create config from environment variables, falling back to defaults.
    ///
    /// - `NETPLAY_SIDE_PANEL_WIDTH`
    /// - `NETPLAY_FRAME_INTERVAL_MS`
    /// - `NETPLAY_PORT`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup("NETPLAY_SIDE_PANEL_WIDTH") {
            let width: f64 = raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("NETPLAY_SIDE_PANEL_WIDTH={raw}")))?;
            if !width.is_finite() || width < 0.0 {
                return Err(Error::Config(format!("NETPLAY_SIDE_PANEL_WIDTH={raw}")));
            }
            config.side_panel_width = width;
        }

        if let Some(raw) = lookup("NETPLAY_FRAME_INTERVAL_MS") {
            let ms: u64 = raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("NETPLAY_FRAME_INTERVAL_MS={raw}")))?;
            config.frame_interval = Duration::from_millis(ms);
        }

        if let Some(raw) = lookup("NETPLAY_PORT") {
            config.port = raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("NETPLAY_PORT={raw}")))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ViewConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.side_panel_width, 0.0);
        assert_eq!(config.frame_interval, Duration::from_millis(1000));
        assert_eq!(config.port, 3000);
        assert_eq!(config.labels.stop, "Stop");
    }

    #[test]
    fn reads_overrides() {
        let config = ViewConfig::from_lookup(lookup(&[
            ("NETPLAY_SIDE_PANEL_WIDTH", "200"),
            ("NETPLAY_FRAME_INTERVAL_MS", " 250 "),
            ("NETPLAY_PORT", "8081"),
        ]))
        .unwrap();
        assert_eq!(config.side_panel_width, 200.0);
        assert_eq!(config.frame_interval, Duration::from_millis(250));
        assert_eq!(config.port, 8081);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            ViewConfig::from_lookup(lookup(&[("NETPLAY_PORT", "http")])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ViewConfig::from_lookup(lookup(&[("NETPLAY_SIDE_PANEL_WIDTH", "-4")])),
            Err(Error::Config(_))
        ));
    }
}
