//! Adapter configuration: one-time viewer layout and reconciliation
//! behavior toggles, with TOML preset support.
//!
//! [`LayoutOptions`] is handed to the viewer exactly once at mount;
//! the adapter treats it as immutable afterwards. [`AdapterOptions`]
//! controls reconciliation behavior and may differ per adapter
//! instance. Both use `#[serde(default)]` so partial TOML files work.

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::MolsyncError;

/// How the viewer's control panel reacts to viewport size.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ControlsDisplay {
    /// Collapse automatically on narrow viewports.
    #[default]
    Reactive,
    /// Always visible.
    Landscape,
    /// Always collapsed.
    Portrait,
}

/// One-time viewer display configuration: which UI panels the viewer
/// shows. Fixed after the first mount; later changes are ignored.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema,
)]
#[schemars(title = "Layout", inline)]
#[serde(default)]
pub struct LayoutOptions {
    /// Show the import controls panel.
    #[schemars(title = "Show Import Controls")]
    pub show_import_controls: bool,
    /// Show the session controls panel.
    #[schemars(title = "Show Session Controls")]
    pub show_session_controls: bool,
    /// Show the structure source controls panel.
    #[schemars(title = "Show Source Controls")]
    pub show_structure_source_controls: bool,
    /// Show the measurements controls panel.
    #[schemars(title = "Show Measurements Controls")]
    pub show_measurements_controls: bool,
    /// Show the superposition controls panel.
    #[schemars(title = "Show Superposition Controls")]
    pub show_superposition_controls: bool,
    /// Show the quick styles controls panel.
    #[schemars(title = "Show Quick Styles Controls")]
    pub show_quick_styles_controls: bool,
    /// Show the structure component controls panel.
    #[schemars(title = "Show Component Controls")]
    pub show_structure_component_controls: bool,
    /// Show the volume streaming controls panel.
    #[schemars(title = "Show Volume Streaming Controls")]
    pub show_volume_streaming_controls: bool,
    /// Show the validation report controls panel.
    #[schemars(title = "Show Validation Report Controls")]
    pub show_validation_report_controls: bool,
    /// Start with the layout expanded to fill its container.
    #[schemars(title = "Expanded Layout")]
    pub layout_is_expanded: bool,
    /// Show the left controls column.
    #[schemars(title = "Show Controls")]
    pub layout_show_controls: bool,
    /// How the controls column reacts to viewport size.
    #[schemars(title = "Controls Display")]
    pub layout_controls_display: ControlsDisplay,
    /// Show the sequence panel.
    #[schemars(title = "Show Sequence")]
    pub layout_show_sequence: bool,
    /// Show the log panel.
    #[schemars(title = "Show Log")]
    pub layout_show_log: bool,
    /// Show the viewport expand button.
    #[schemars(title = "Show Expand Button")]
    pub viewport_show_expand: bool,
    /// Show the selection-mode toggle button.
    #[schemars(title = "Show Selection Mode Button")]
    pub viewport_show_selection_mode: bool,
    /// Show the welcome toast on first mount.
    #[schemars(title = "Show Welcome Toast")]
    pub show_welcome_toast: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            show_import_controls: false,
            show_session_controls: true,
            show_structure_source_controls: true,
            show_measurements_controls: true,
            show_superposition_controls: true,
            show_quick_styles_controls: true,
            show_structure_component_controls: true,
            show_volume_streaming_controls: false,
            show_validation_report_controls: false,
            layout_is_expanded: false,
            layout_show_controls: false,
            layout_controls_display: ControlsDisplay::Reactive,
            layout_show_sequence: true,
            layout_show_log: false,
            viewport_show_expand: true,
            viewport_show_selection_mode: true,
            show_welcome_toast: false,
        }
    }
}

/// Reconciliation behavior toggles.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default,
    JsonSchema,
)]
#[schemars(title = "Adapter", inline)]
#[serde(default)]
pub struct AdapterOptions {
    /// Focus the camera on a structure right after its load resolves.
    #[schemars(title = "Auto Focus")]
    pub auto_focus: bool,
    /// Re-apply the last focus descriptor whenever the trajectory
    /// frame changes.
    #[schemars(title = "Update Focus On Frame Change")]
    pub update_focus_on_frame_change: bool,
    /// Re-apply the last selection descriptor whenever the trajectory
    /// frame changes.
    #[schemars(title = "Update Selection On Frame Change")]
    pub update_selection_on_frame_change: bool,
}

/// Top-level options container for presets.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// One-time viewer layout.
    pub layout: LayoutOptions,
    /// Reconciliation behavior.
    pub adapter: AdapterOptions,
}

impl Options {
    /// Generate a JSON Schema describing the options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`MolsyncError::Io`] if the file cannot be read and
    /// [`MolsyncError::OptionsParse`] if it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, MolsyncError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| MolsyncError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`MolsyncError::OptionsParse`] on serialization failure
    /// and [`MolsyncError::Io`] on write failure.
    pub fn save(&self, path: &Path) -> Result<(), MolsyncError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| MolsyncError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content).map_err(MolsyncError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::{ControlsDisplay, LayoutOptions, Options};

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed: Options = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r"
[adapter]
auto_focus = true
";
        let opts: Options = toml::from_str(toml_str).unwrap();
        assert!(opts.adapter.auto_focus);
        // Everything else should be default
        assert!(!opts.adapter.update_focus_on_frame_change);
        assert!(opts.layout.layout_show_sequence);
        assert_eq!(
            opts.layout.layout_controls_display,
            ControlsDisplay::Reactive
        );
    }

    #[test]
    fn layout_defaults_match_viewer_conventions() {
        let layout = LayoutOptions::default();
        assert!(!layout.show_import_controls);
        assert!(layout.show_session_controls);
        assert!(!layout.show_welcome_toast);
        assert!(layout.viewport_show_selection_mode);
    }
}
