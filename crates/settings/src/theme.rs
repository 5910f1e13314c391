use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn from_hex(input: &str) -> Result<Self, ThemeLoadError> {
        parse_hex(input).map_err(|reason| ThemeLoadError::InvalidColor {
            value: input.to_string(),
            reason,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    Dark,
    Light,
}

/// Raw palette as stored in theme files. Field names mirror the widget
/// roles the applets paint: window chrome, toolbar, buttons, entry
/// fields, foreground text, selection, and the slide canvas default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemePalette {
    pub window: String,
    pub toolbar: String,
    pub widget: String,
    pub field: String,
    pub text: String,
    pub selection: String,
    pub canvas: String,
}

/// Palette with every entry parsed into a concrete colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPalette {
    pub window: Color,
    pub toolbar: Color,
    pub widget: Color,
    pub field: Color,
    pub text: Color,
    pub selection: Color,
    pub canvas: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeDefinition {
    pub name: String,
    pub kind: ThemeKind,
    pub palette: ThemePalette,
}

impl ThemeDefinition {
    /// The dark scheme the original applets shipped with.
    pub fn builtin_dark() -> Self {
        Self {
            name: "Nova Dark".into(),
            kind: ThemeKind::Dark,
            palette: ThemePalette {
                window: "#1e1e1e".into(),
                toolbar: "#1e1e1e".into(),
                widget: "#2d2d2d".into(),
                field: "#2b2b2b".into(),
                text: "#ffffff".into(),
                selection: "#555555".into(),
                canvas: "#202020".into(),
            },
        }
    }

    pub fn builtin_light() -> Self {
        Self {
            name: "Nova Light".into(),
            kind: ThemeKind::Light,
            palette: ThemePalette {
                window: "#ffffff".into(),
                toolbar: "#ffffff".into(),
                widget: "#f0f0f0".into(),
                field: "#ffffff".into(),
                text: "#000000".into(),
                selection: "#c0c0ff".into(),
                canvas: "#ffffff".into(),
            },
        }
    }

    pub fn resolve_palette(&self) -> Result<ResolvedPalette, ThemeLoadError> {
        Ok(ResolvedPalette {
            window: Color::from_hex(&self.palette.window)?,
            toolbar: Color::from_hex(&self.palette.toolbar)?,
            widget: Color::from_hex(&self.palette.widget)?,
            field: Color::from_hex(&self.palette.field)?,
            text: Color::from_hex(&self.palette.text)?,
            selection: Color::from_hex(&self.palette.selection)?,
            canvas: Color::from_hex(&self.palette.canvas)?,
        })
    }
}

struct ThemeEntry {
    definition: ThemeDefinition,
    palette: ResolvedPalette,
}

impl ThemeEntry {
    fn new(definition: ThemeDefinition) -> Result<Self, ThemeLoadError> {
        let palette = definition.resolve_palette()?;
        Ok(Self {
            definition,
            palette,
        })
    }
}

/// Holds the available themes and the active selection. The applets'
/// Dark / Light toolbar button is `toggle`.
pub struct ThemeManager {
    entries: Vec<ThemeEntry>,
    active: usize,
}

impl ThemeManager {
    pub fn new(definitions: Vec<ThemeDefinition>) -> Result<Self, ThemeLoadError> {
        if definitions.is_empty() {
            return Err(ThemeLoadError::Empty);
        }
        let mut entries = Vec::with_capacity(definitions.len());
        for definition in definitions {
            entries.push(ThemeEntry::new(definition)?);
        }
        Ok(Self { entries, active: 0 })
    }

    /// Manager seeded with the built-in dark and light themes, dark active.
    pub fn builtin() -> Self {
        Self::new(vec![
            ThemeDefinition::builtin_dark(),
            ThemeDefinition::builtin_light(),
        ])
        .expect("built-in themes must resolve")
    }

    /// Loads `*.json` theme definitions from a directory, falling back to
    /// the built-ins when the directory is missing or empty.
    pub fn load_from_dir(path: impl AsRef<Path>) -> Result<Self, ThemeLoadError> {
        let dir = path.as_ref();
        let mut definitions = Vec::new();
        if dir.is_dir() {
            let mut paths: Vec<_> = fs::read_dir(dir)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| {
                    path.extension()
                        .and_then(|ext| ext.to_str())
                        .map(|ext| ext.eq_ignore_ascii_case("json"))
                        .unwrap_or(false)
                })
                .collect();
            paths.sort();
            for path in paths {
                let data = fs::read_to_string(&path)?;
                let definition: ThemeDefinition = serde_json::from_str(&data)?;
                definition.resolve_palette()?;
                definitions.push(definition);
            }
        }

        if definitions.is_empty() {
            return Ok(Self::builtin());
        }
        Self::new(definitions)
    }

    pub fn active_theme(&self) -> &ThemeDefinition {
        &self.entries[self.active].definition
    }

    pub fn active_palette(&self) -> &ResolvedPalette {
        &self.entries[self.active].palette
    }

    pub fn is_dark(&self) -> bool {
        matches!(self.active_theme().kind, ThemeKind::Dark)
    }

    /// Switches to the first theme of the opposite kind, when one exists.
    pub fn toggle(&mut self) -> &ThemeDefinition {
        let current_kind = self.active_theme().kind;
        if let Some(index) = self
            .entries
            .iter()
            .position(|entry| entry.definition.kind != current_kind)
        {
            self.active = index;
        }
        self.active_theme()
    }

    pub fn set_active_by_name(&mut self, name: &str) -> Option<&ThemeDefinition> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.definition.name == name)?;
        self.active = index;
        Some(&self.entries[self.active].definition)
    }

    pub fn theme_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .map(|entry| entry.definition.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum ThemeLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("theme file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid color {value}: {reason}")]
    InvalidColor {
        value: String,
        reason: ColorParseError,
    },
    #[error("no theme definitions were provided")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("missing leading '#'")]
    MissingHashPrefix,
    #[error("expected 6 or 8 hexadecimal digits")]
    InvalidLength,
    #[error("contains non-hexadecimal digits")]
    InvalidHex,
}

fn parse_hex(input: &str) -> Result<Color, ColorParseError> {
    let hex = input
        .trim()
        .strip_prefix('#')
        .ok_or(ColorParseError::MissingHashPrefix)?;
    if hex.len() != 6 && hex.len() != 8 {
        return Err(ColorParseError::InvalidLength);
    }
    let mut rgba = [0u8, 0, 0, 255];
    for i in 0..(hex.len() / 2) {
        let slice = &hex[i * 2..i * 2 + 2];
        rgba[i] = u8::from_str_radix(slice, 16).map_err(|_| ColorParseError::InvalidHex)?;
    }
    Ok(Color {
        r: rgba[0],
        g: rgba[1],
        b: rgba[2],
        a: rgba[3],
    })
}
