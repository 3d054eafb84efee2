// ============================================================================
// FILTER SETTINGS — the persisted per-instance record
// ============================================================================
//
// One flat record per filter instance.  Values are stored exactly as the user
// entered them (percentages, packed colors, pixel units); turning them into
// render parameters is the job of `params::EffectParams::rebuild`.
//
// Presets are bincode files with a small magic/version header, the same way
// project files are written elsewhere in the app family.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Magic header for preset files.
const PRESET_MAGIC: &str = "EFX1";
/// Current preset layout version.
pub const PRESET_VERSION: u64 = 1;
/// Upper bound on a preset's encoded size; a real one is a few hundred bytes.
const PRESET_SIZE_LIMIT: u64 = 64 * 1024;

/// Settings shared by the edge highlight and both shadows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeSettings {
    pub enabled: bool,
    /// Packed color, byte 0 = red, byte 1 = green, byte 2 = blue.
    pub color: u32,
    /// Output alpha in percent (0–100).
    pub alpha: f64,
    pub range_min: f64,
    pub range_max: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for RangeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            color: 0x0000_0000,
            alpha: 100.0,
            range_min: 0.0,
            range_max: 4.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlowSettings {
    pub enabled: bool,
    pub color: u32,
    pub alpha: f64,
    pub width: f64,
    /// Percent (0–100).
    pub sharpness: f64,
}

impl Default for GlowSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            color: 0xFFFF_FFFF,
            alpha: 100.0,
            width: 4.0,
            sharpness: 50.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutlineSettings {
    pub enabled: bool,
    pub color: u32,
    pub alpha: f64,
    pub width: f64,
    pub offset: f64,
    pub sharpness: f64,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            color: 0x0000_0000,
            alpha: 100.0,
            width: 4.0,
            offset: 0.0,
            sharpness: 50.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    pub taa: RangeSettings,
    pub outer_shadow: RangeSettings,
    pub inner_shadow: RangeSettings,
    pub outer_glow: GlowSettings,
    pub inner_glow: GlowSettings,
    pub outline: OutlineSettings,
    /// Only controls whether the field options are shown in a property UI.
    pub advanced: bool,
    /// Field resolution in percent of the frame size.
    pub scale: f64,
    /// Binarization threshold in percent of full alpha.
    pub threshold: f64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            taa: RangeSettings::default(),
            outer_shadow: RangeSettings::default(),
            inner_shadow: RangeSettings::default(),
            outer_glow: GlowSettings::default(),
            inner_glow: GlowSettings::default(),
            outline: OutlineSettings::default(),
            advanced: false,
            scale: 100.0,
            threshold: 50.0,
        }
    }
}

// ============================================================================
// SETTING DESCRIPTORS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingKind {
    Toggle,
    Color,
    Number,
}

/// Key, kind and property-sheet slider bounds of one setting.
#[derive(Clone, Copy, Debug)]
pub struct SettingDescriptor {
    pub key: &'static str,
    pub kind: SettingKind,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

const fn toggle(key: &'static str) -> SettingDescriptor {
    SettingDescriptor { key, kind: SettingKind::Toggle, min: 0.0, max: 1.0, step: 1.0 }
}

const fn color(key: &'static str) -> SettingDescriptor {
    SettingDescriptor { key, kind: SettingKind::Color, min: 0.0, max: 4_294_967_295.0, step: 1.0 }
}

const fn number(key: &'static str, min: f64, max: f64, step: f64) -> SettingDescriptor {
    SettingDescriptor { key, kind: SettingKind::Number, min, max, step }
}

/// Every setting key, in property-sheet order.
pub const DESCRIPTORS: &[SettingDescriptor] = &[
    toggle("taa.enabled"),
    number("taa.range.min", -16.0, 16.0, 0.01),
    number("taa.range.max", -16.0, 16.0, 0.01),
    number("taa.offset.x", -100.0, 100.0, 0.01),
    number("taa.offset.y", -100.0, 100.0, 0.01),
    color("taa.color"),
    number("taa.alpha", 0.0, 100.0, 0.1),
    toggle("shadow.outer.enabled"),
    number("shadow.outer.range.min", -16.0, 16.0, 0.01),
    number("shadow.outer.range.max", -16.0, 16.0, 0.01),
    number("shadow.outer.offset.x", -100.0, 100.0, 0.01),
    number("shadow.outer.offset.y", -100.0, 100.0, 0.01),
    color("shadow.outer.color"),
    number("shadow.outer.alpha", 0.0, 100.0, 0.1),
    toggle("shadow.inner.enabled"),
    number("shadow.inner.range.min", -16.0, 16.0, 0.01),
    number("shadow.inner.range.max", -16.0, 16.0, 0.01),
    number("shadow.inner.offset.x", -100.0, 100.0, 0.01),
    number("shadow.inner.offset.y", -100.0, 100.0, 0.01),
    color("shadow.inner.color"),
    number("shadow.inner.alpha", 0.0, 100.0, 0.1),
    toggle("glow.outer.enabled"),
    color("glow.outer.color"),
    number("glow.outer.alpha", 0.0, 100.0, 0.1),
    number("glow.outer.width", 0.0, 16.0, 0.01),
    number("glow.outer.sharpness", 0.0, 100.0, 0.01),
    toggle("glow.inner.enabled"),
    color("glow.inner.color"),
    number("glow.inner.alpha", 0.0, 100.0, 0.1),
    number("glow.inner.width", 0.0, 16.0, 0.01),
    number("glow.inner.sharpness", 0.0, 100.0, 0.01),
    toggle("outline.enabled"),
    color("outline.color"),
    number("outline.alpha", 0.0, 100.0, 0.1),
    number("outline.width", 0.0, 16.0, 0.01),
    number("outline.offset", -16.0, 16.0, 0.01),
    number("outline.sharpness", 0.0, 100.0, 0.01),
    toggle("advanced"),
    number("sdf.scale", 0.1, 500.0, 0.1),
    number("sdf.threshold", 0.0, 100.0, 0.01),
];

/// Look up the descriptor for a key.
pub fn descriptor(key: &str) -> Option<&'static SettingDescriptor> {
    DESCRIPTORS.iter().find(|d| d.key == key)
}

enum Slot<'a> {
    Toggle(&'a mut bool),
    Color(&'a mut u32),
    Number(&'a mut f64),
}

impl FilterSettings {
    fn slot(&mut self, key: &str) -> Option<Slot<'_>> {
        let (group, field) = key.rsplit_once('.').unwrap_or(("", key));
        let slot = match (group, field) {
            ("", "advanced") => Slot::Toggle(&mut self.advanced),
            ("sdf", "scale") => Slot::Number(&mut self.scale),
            ("sdf", "threshold") => Slot::Number(&mut self.threshold),
            ("outline", "enabled") => Slot::Toggle(&mut self.outline.enabled),
            ("outline", "color") => Slot::Color(&mut self.outline.color),
            ("outline", "alpha") => Slot::Number(&mut self.outline.alpha),
            ("outline", "width") => Slot::Number(&mut self.outline.width),
            ("outline", "offset") => Slot::Number(&mut self.outline.offset),
            ("outline", "sharpness") => Slot::Number(&mut self.outline.sharpness),
            ("glow.outer" | "glow.inner", _) => {
                let glow = if group == "glow.outer" { &mut self.outer_glow } else { &mut self.inner_glow };
                match field {
                    "enabled" => Slot::Toggle(&mut glow.enabled),
                    "color" => Slot::Color(&mut glow.color),
                    "alpha" => Slot::Number(&mut glow.alpha),
                    "width" => Slot::Number(&mut glow.width),
                    "sharpness" => Slot::Number(&mut glow.sharpness),
                    _ => return None,
                }
            }
            _ => {
                // Range family: "<effect>[.range|.offset].<field>"
                let (effect, sub) = match group.strip_suffix(".range") {
                    Some(e) => (e, "range"),
                    None => match group.strip_suffix(".offset") {
                        Some(e) => (e, "offset"),
                        None => (group, ""),
                    },
                };
                let range = match effect {
                    "taa" => &mut self.taa,
                    "shadow.outer" => &mut self.outer_shadow,
                    "shadow.inner" => &mut self.inner_shadow,
                    _ => return None,
                };
                match (sub, field) {
                    ("", "enabled") => Slot::Toggle(&mut range.enabled),
                    ("", "color") => Slot::Color(&mut range.color),
                    ("", "alpha") => Slot::Number(&mut range.alpha),
                    ("range", "min") => Slot::Number(&mut range.range_min),
                    ("range", "max") => Slot::Number(&mut range.range_max),
                    ("offset", "x") => Slot::Number(&mut range.offset_x),
                    ("offset", "y") => Slot::Number(&mut range.offset_y),
                    _ => return None,
                }
            }
        };
        Some(slot)
    }

    /// Set one value from text, e.g. `set("outline.width", "4")`.
    ///
    /// Only keys listed in [`DESCRIPTORS`] are accepted, and the value is
    /// parsed according to the descriptor's kind.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), FilterError> {
        let d = descriptor(key)
            .ok_or_else(|| FilterError::InvalidSettings(format!("unknown setting '{}'", key)))?;
        let value = value.trim();
        let invalid = || FilterError::InvalidSettings(format!("invalid value '{}' for '{}'", value, key));
        match (d.kind, self.slot(key)) {
            (SettingKind::Toggle, Some(Slot::Toggle(b))) => *b = parse_toggle(value).ok_or_else(invalid)?,
            (SettingKind::Color, Some(Slot::Color(c))) => *c = parse_color(value).ok_or_else(invalid)?,
            (SettingKind::Number, Some(Slot::Number(n))) => *n = value.parse::<f64>().map_err(|_| invalid())?,
            (kind, _) => {
                return Err(FilterError::InvalidSettings(format!(
                    "setting '{}' has no {:?} field",
                    key, kind
                )));
            }
        }
        Ok(())
    }

    /// Apply a `key=value` assignment.
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<(), FilterError> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            FilterError::InvalidSettings(format!("expected key=value, got '{}'", assignment))
        })?;
        self.set(key.trim(), value)
    }

    /// Current value of a key formatted as text.
    pub fn get(&self, key: &str) -> Option<String> {
        descriptor(key)?;
        let mut scratch = self.clone();
        let text = match scratch.slot(key)? {
            Slot::Toggle(b) => b.to_string(),
            Slot::Color(c) => format!("0x{:08X}", c),
            Slot::Number(n) => n.to_string(),
        };
        Some(text)
    }
}

fn parse_toggle(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// `#RRGGBB` (opaque), `0xAABBGGRR` (packed as stored) or a decimal integer.
fn parse_color(value: &str) -> Option<u32> {
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let rgb = u32::from_str_radix(hex, 16).ok()?;
        let (r, g, b) = ((rgb >> 16) & 0xFF, (rgb >> 8) & 0xFF, rgb & 0xFF);
        return Some(0xFF00_0000 | (b << 16) | (g << 8) | r);
    }
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).ok();
    }
    value.parse::<u32>().ok()
}

// ============================================================================
// PRESET FILES
// ============================================================================

/// Plain bincode layout (fixed-width integers), bounded so a corrupt length
/// prefix fails instead of allocating.
fn preset_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_limit(PRESET_SIZE_LIMIT)
}

#[derive(Serialize, Deserialize)]
struct PresetFile {
    magic: String,
    version: u64,
    settings: FilterSettings,
}

/// Write settings as a preset file.
pub fn save_preset(settings: &FilterSettings, path: &Path) -> Result<(), FilterError> {
    let preset = PresetFile {
        magic: PRESET_MAGIC.to_string(),
        version: PRESET_VERSION,
        settings: settings.clone(),
    };
    let writer = BufWriter::new(File::create(path)?);
    preset_options().serialize_into(writer, &preset)?;
    Ok(())
}

/// Read a preset file written by [`save_preset`].
pub fn load_preset(path: &Path) -> Result<FilterSettings, FilterError> {
    let reader = BufReader::new(File::open(path)?);
    let preset: PresetFile = preset_options().deserialize_from(reader)?;
    if preset.magic != PRESET_MAGIC {
        return Err(FilterError::InvalidSettings(format!(
            "not a preset file (magic '{}')",
            preset.magic
        )));
    }
    Ok(migrate(preset.settings, preset.version))
}

/// Bring settings written by an older version up to date.  Every layout so far
/// is identical, so this passes the record through unchanged.
pub fn migrate(settings: FilterSettings, _version: u64) -> FilterSettings {
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_factory_values() {
        let s = FilterSettings::default();
        assert!(!s.outline.enabled);
        assert_eq!(s.outer_glow.color, 0xFFFF_FFFF);
        assert_eq!(s.taa.range_max, 4.0);
        assert_eq!(s.outline.sharpness, 50.0);
        assert_eq!(s.scale, 100.0);
        assert_eq!(s.threshold, 50.0);
    }

    #[test]
    fn every_descriptor_key_is_settable() {
        let mut s = FilterSettings::default();
        for d in DESCRIPTORS {
            let value = match d.kind {
                SettingKind::Toggle => "on",
                SettingKind::Color => "#102030",
                SettingKind::Number => "3.5",
            };
            s.set(d.key, value).unwrap_or_else(|e| panic!("{}: {}", d.key, e));
            assert!(s.get(d.key).is_some(), "{}", d.key);
        }
        assert!(s.outline.enabled);
        assert_eq!(s.inner_shadow.offset_y, 3.5);
        assert_eq!(s.scale, 3.5);
    }

    #[test]
    fn descriptor_table_and_record_agree() {
        let s = FilterSettings::default();
        for d in DESCRIPTORS {
            let value = s.get(d.key).unwrap_or_else(|| panic!("{} has no field", d.key));
            let parsed_kind = match value.as_str() {
                "true" | "false" => SettingKind::Toggle,
                v if v.starts_with("0x") => SettingKind::Color,
                _ => SettingKind::Number,
            };
            assert_eq!(parsed_kind, d.kind, "{}", d.key);
        }
        // Keys the record could resolve but the table does not list.
        assert!(descriptor("taa").is_none());
        assert!(s.get("taa.range.min.x").is_none());
    }

    #[test]
    fn set_writes_the_named_field() {
        let mut s = FilterSettings::default();
        s.apply_assignment("outline.width = 6").unwrap();
        s.apply_assignment("shadow.outer.range.min=-2").unwrap();
        s.apply_assignment("glow.inner.sharpness=75").unwrap();
        assert_eq!(s.outline.width, 6.0);
        assert_eq!(s.outer_shadow.range_min, -2.0);
        assert_eq!(s.inner_shadow.range_min, 0.0);
        assert_eq!(s.inner_glow.sharpness, 75.0);
        assert_eq!(s.outer_glow.sharpness, 50.0);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        let mut s = FilterSettings::default();
        assert!(s.set("outline.depth", "1").is_err());
        assert!(s.set("taa.range.mid", "1").is_err());
        assert!(s.set("outline.width", "wide").is_err());
        assert!(s.set("outline.enabled", "maybe").is_err());
        assert!(s.apply_assignment("outline.width").is_err());
    }

    #[test]
    fn colors_parse_into_packed_layout() {
        assert_eq!(parse_color("#FF0000"), Some(0xFF00_00FF));
        assert_eq!(parse_color("#0000ff"), Some(0xFFFF_0000));
        assert_eq!(parse_color("0x000000FF"), Some(0xFF));
        assert_eq!(parse_color("255"), Some(255));
        assert_eq!(parse_color("#FFF"), None);
    }

    #[test]
    fn preset_round_trips_through_a_file() {
        let mut s = FilterSettings::default();
        s.outline.enabled = true;
        s.outline.color = 0xFF00_00FF;
        s.scale = 50.0;

        let path = std::env::temp_dir().join(format!("edgefx-preset-{}.efx", uuid::Uuid::new_v4()));
        save_preset(&s, &path).unwrap();
        let loaded = load_preset(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, s);
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        // Magic string claiming to be 2^62 bytes long.
        let mut bytes = (1u64 << 62).to_le_bytes().to_vec();
        bytes.extend_from_slice(b"EFX1");
        let path = std::env::temp_dir().join(format!("edgefx-huge-{}.efx", uuid::Uuid::new_v4()));
        std::fs::write(&path, &bytes).unwrap();
        let result = load_preset(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(FilterError::Serialize(_))));
    }

    #[test]
    fn preset_with_wrong_magic_is_rejected() {
        let preset = PresetFile {
            magic: "PFE1".to_string(),
            version: PRESET_VERSION,
            settings: FilterSettings::default(),
        };
        let path = std::env::temp_dir().join(format!("edgefx-bad-{}.efx", uuid::Uuid::new_v4()));
        std::fs::write(&path, bincode::serialize(&preset).unwrap()).unwrap();
        let result = load_preset(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(FilterError::InvalidSettings(_))));
    }
}
