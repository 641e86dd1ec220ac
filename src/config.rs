//! Viewer settings: built-in defaults, overridden by a JSON blob in `localStorage`, overridden by
//! URL query parameters.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::ZoomBounds;

pub const STORAGE_KEY: &str = "tgv_config";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("stored config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("zoom range invalid: need 0 < min ({min}) <= default ({default}) <= max ({max})")]
    ZoomRange { min: f32, default: f32, max: f32 },
    #[error("grid spacing must be positive, got {0}")]
    Spacing(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub map_url: String,
    pub sprite_url: String,
    /// Empty disables selection reports.
    pub report_url: String,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub default_zoom: f32,
    pub grid_spacing: f32,
    pub log_filter: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            map_url: "/api/map".into(),
            sprite_url: "/assets/tank.png".into(),
            report_url: "/api/highlight".into(),
            min_zoom: 0.5,
            max_zoom: 3.0,
            default_zoom: 1.0,
            grid_spacing: 0.4,
            log_filter: "info".into(),
        }
    }
}

impl ViewerConfig {
    /// Stored settings; absent fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Overrides URLs and the log filter from query parameters. Blank values are ignored.
    pub fn apply_query(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields: [(&str, &mut String); 4] = [
            ("map", &mut self.map_url),
            ("sprite", &mut self.sprite_url),
            ("report", &mut self.report_url),
            ("log", &mut self.log_filter),
        ];
        for (key, slot) in fields {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *slot = value;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = self.min_zoom > 0.0
            && self.min_zoom <= self.default_zoom
            && self.default_zoom <= self.max_zoom
            && self.max_zoom.is_finite();
        if !ordered {
            return Err(ConfigError::ZoomRange {
                min: self.min_zoom,
                default: self.default_zoom,
                max: self.max_zoom,
            });
        }
        if !(self.grid_spacing > 0.0 && self.grid_spacing.is_finite()) {
            return Err(ConfigError::Spacing(self.grid_spacing));
        }
        Ok(())
    }

    /// Resets the numeric fields to defaults if they fail validation, returning the problem.
    pub fn sanitize(&mut self) -> Option<ConfigError> {
        let err = self.validate().err()?;
        let defaults = Self::default();
        match err {
            ConfigError::ZoomRange { .. } => {
                self.min_zoom = defaults.min_zoom;
                self.max_zoom = defaults.max_zoom;
                self.default_zoom = defaults.default_zoom;
            }
            ConfigError::Spacing(_) => self.grid_spacing = defaults.grid_spacing,
            ConfigError::Json(_) => {}
        }
        // Both numeric groups may be bad at once.
        if let Some(ConfigError::Spacing(_)) = self.validate().err() {
            self.grid_spacing = defaults.grid_spacing;
        }
        Some(err)
    }

    pub fn zoom_bounds(&self) -> ZoomBounds {
        ZoomBounds {
            min: self.min_zoom,
            max: self.max_zoom,
        }
    }

    /// Reads the layered configuration from the page. Problems are returned rather than logged
    /// because the subscriber is configured from the result.
    pub fn load() -> (Self, Vec<ConfigError>) {
        let mut issues = Vec::new();
        let Some(window) = web_sys::window() else {
            return (Self::default(), issues);
        };
        let stored = window
            .local_storage()
            .ok()
            .flatten()
            .and_then(|store| store.get_item(STORAGE_KEY).ok().flatten());
        let mut config = match stored.as_deref().map(Self::from_json) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                issues.push(e);
                Self::default()
            }
            None => Self::default(),
        };
        let params = window
            .location()
            .search()
            .ok()
            .and_then(|search| web_sys::UrlSearchParams::new_with_str(&search).ok());
        if let Some(params) = params {
            config.apply_query(|key| params.get(key));
        }
        issues.extend(config.sanitize());
        (config, issues)
    }
}
