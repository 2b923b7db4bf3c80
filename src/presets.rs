//! Fixed catalog of named overlay color presets

/// A named (label, color) pair selectable from the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub key: &'static str,
    pub label: &'static str,
    pub color: &'static str,
}

/// Sentinel preset key for a user-picked color
pub const CUSTOM_KEY: &str = "custom";

pub const PRESETS: &[Preset] = &[
    Preset { key: "sunset", label: "Sunset", color: "#f4e9d8" },
    Preset { key: "amber", label: "Amber", color: "#ffd6a3" },
    Preset { key: "forest", label: "Forest", color: "#d4f0c1" },
    Preset { key: "ocean", label: "Ocean", color: "#c6d5ff" },
    Preset { key: "charcoal", label: "Charcoal", color: "#383838" },
    Preset { key: "night", label: "Night", color: "#1f2535" },
];

/// Look up a preset by key; `CUSTOM_KEY` is not in the catalog
pub fn find(key: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.key == key)
}
