//! dotlink-export: Pure format serializers (sans-IO)
//!
//! Converts round snapshots into output formats: SVG for display and
//! JSON for the action log.

pub mod json;
pub mod svg;

pub use json::{ExportError, action_log_from_json, action_log_to_json, snapshot_to_json};
pub use svg::{COMPONENT_COLORS, SvgMetadata, WON_COLOR, component_color, to_svg};
