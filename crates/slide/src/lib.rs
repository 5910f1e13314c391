//! Slide deck model for NovaSlide: an ordered list of slides, each a
//! background colour plus freeform positioned text items. Persistence
//! is a bare JSON array of slides, the exact shape the original applet
//! dumped to disk.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// New text items land at the canvas centre the original hardcoded.
pub const DEFAULT_TEXT_X: f32 = 400.0;
pub const DEFAULT_TEXT_Y: f32 = 300.0;

/// Theme-default slide backgrounds. The original stored the literal
/// `"white"` for light slides, so loads accept it alongside hex.
pub const DARK_BACKGROUND: &str = "#202020";
pub const LIGHT_BACKGROUND: &str = "#ffffff";

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("presentation JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("presentation contains no slides")]
    Empty,
}

/// One positioned text element drawn onto a slide's canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    pub text: String,
    #[serde(default = "default_x")]
    pub x: f32,
    #[serde(default = "default_y")]
    pub y: f32,
    #[serde(default = "default_item_color")]
    pub color: String,
    #[serde(default = "default_item_size")]
    pub size: u32,
}

fn default_x() -> f32 {
    DEFAULT_TEXT_X
}

fn default_y() -> f32 {
    DEFAULT_TEXT_Y
}

fn default_item_color() -> String {
    "#ffffff".to_string()
}

fn default_item_size() -> u32 {
    32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    #[serde(default)]
    pub items: Vec<TextItem>,
    #[serde(default = "default_slide_background")]
    pub bg: String,
}

fn default_slide_background() -> String {
    DARK_BACKGROUND.to_string()
}

impl Slide {
    pub fn with_background(bg: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            bg: bg.into(),
        }
    }
}

fn theme_default_background(dark: bool) -> &'static str {
    if dark {
        DARK_BACKGROUND
    } else {
        LIGHT_BACKGROUND
    }
}

fn is_theme_default(bg: &str) -> bool {
    matches!(bg, DARK_BACKGROUND | LIGHT_BACKGROUND | "white")
}

/// The deck: slides plus the current position. A deck always holds at
/// least one slide.
#[derive(Debug, Clone)]
pub struct Deck {
    slides: Vec<Slide>,
    current: usize,
}

impl Deck {
    pub fn new(dark: bool) -> Self {
        Self {
            slides: vec![Slide::with_background(theme_default_background(dark))],
            current: 0,
        }
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &Slide {
        &self.slides[self.current]
    }

    pub fn current_mut(&mut self) -> &mut Slide {
        &mut self.slides[self.current]
    }

    /// Appends a slide with the theme-default background and moves to it.
    pub fn add_slide(&mut self, dark: bool) {
        self.slides
            .push(Slide::with_background(theme_default_background(dark)));
        self.current = self.slides.len() - 1;
    }

    /// Moves to the previous slide; returns whether the position changed.
    pub fn prev(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Moves to the next slide; returns whether the position changed.
    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.slides.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Adds a text item at the default canvas position.
    pub fn add_text(&mut self, text: impl Into<String>, color: impl Into<String>, size: u32) {
        self.current_mut().items.push(TextItem {
            text: text.into(),
            x: DEFAULT_TEXT_X,
            y: DEFAULT_TEXT_Y,
            color: color.into(),
            size,
        });
    }

    /// Recolours the most recently added item on the current slide, as
    /// the original's Text Color button did.
    pub fn recolor_last(&mut self, color: impl Into<String>) -> bool {
        if let Some(item) = self.current_mut().items.last_mut() {
            item.color = color.into();
            true
        } else {
            false
        }
    }

    pub fn set_background(&mut self, color: impl Into<String>) {
        self.current_mut().bg = color.into();
    }

    /// Theme toggle: the current slide's background follows the theme
    /// when it still holds a theme-default value.
    pub fn retheme(&mut self, dark: bool) {
        let slide = self.current_mut();
        if is_theme_default(&slide.bg) {
            slide.bg = theme_default_background(dark).to_string();
        }
    }

    /// Compact JSON array of slides, as `json.dump` wrote it.
    pub fn to_json(&self) -> Result<String, DeckError> {
        Ok(serde_json::to_string(&self.slides)?)
    }

    pub fn from_json(input: &str) -> Result<Self, DeckError> {
        let slides: Vec<Slide> = serde_json::from_str(input)?;
        if slides.is_empty() {
            return Err(DeckError::Empty);
        }
        Ok(Self { slides, current: 0 })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DeckError> {
        let path = path.as_ref();
        let payload = self.to_json()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, payload.as_bytes())?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DeckError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_deck_starts_with_one_themed_slide() {
        let deck = Deck::new(true);
        assert_eq!(deck.len(), 1);
        assert_eq!(deck.current().bg, DARK_BACKGROUND);

        let light = Deck::new(false);
        assert_eq!(light.current().bg, LIGHT_BACKGROUND);
    }

    #[test]
    fn navigation_clamps_at_the_ends() {
        let mut deck = Deck::new(true);
        assert!(!deck.prev());
        assert!(!deck.next());

        deck.add_slide(true);
        deck.add_slide(true);
        assert_eq!(deck.current_index(), 2);
        assert!(deck.prev());
        assert!(deck.prev());
        assert!(!deck.prev());
        assert_eq!(deck.current_index(), 0);
        assert!(deck.next());
        assert_eq!(deck.current_index(), 1);
    }

    #[test]
    fn add_text_uses_the_default_position() {
        let mut deck = Deck::new(true);
        deck.add_text("Title", "#ffffff", 40);
        let item = &deck.current().items[0];
        assert_eq!((item.x, item.y), (DEFAULT_TEXT_X, DEFAULT_TEXT_Y));
        assert_eq!(item.size, 40);
    }

    #[test]
    fn recolor_last_targets_the_newest_item() {
        let mut deck = Deck::new(true);
        assert!(!deck.recolor_last("#ff0000"));
        deck.add_text("one", "#ffffff", 32);
        deck.add_text("two", "#ffffff", 32);
        assert!(deck.recolor_last("#ff0000"));
        assert_eq!(deck.current().items[0].color, "#ffffff");
        assert_eq!(deck.current().items[1].color, "#ff0000");
    }

    #[test]
    fn retheme_only_touches_theme_default_backgrounds() {
        let mut deck = Deck::new(true);
        deck.retheme(false);
        assert_eq!(deck.current().bg, LIGHT_BACKGROUND);

        deck.set_background("#123456");
        deck.retheme(true);
        assert_eq!(deck.current().bg, "#123456");
    }

    #[test]
    fn json_round_trip_matches_the_original_shape() {
        let mut deck = Deck::new(true);
        deck.add_text("Hello", "#ffee00", 48);
        deck.add_slide(true);
        deck.set_background("#334455");

        let json = deck.to_json().unwrap();
        // 頂層是投影片陣列。 / The top level is a bare array of slides.
        assert!(json.starts_with('['));

        let reloaded = Deck::from_json(&json).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.current_index(), 0);
        assert_eq!(reloaded.slides()[0].items[0].text, "Hello");
        assert_eq!(reloaded.slides()[1].bg, "#334455");
    }

    #[test]
    fn loads_files_written_by_the_original_applet() {
        let json = r#"[{"items": [{"text": "Intro", "x": 400, "y": 300, "color": "white", "size": 32}], "bg": "white"}]"#;
        let deck = Deck::from_json(json).unwrap();
        let item = &deck.slides()[0].items[0];
        assert_eq!(item.text, "Intro");
        assert_eq!(item.x, 400.0);
        assert_eq!(deck.slides()[0].bg, "white");
    }

    #[test]
    fn empty_presentations_are_rejected() {
        assert!(matches!(Deck::from_json("[]"), Err(DeckError::Empty)));
    }

    #[test]
    fn save_and_load_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("talk.json");

        let mut deck = Deck::new(false);
        deck.add_text("Persisted", "#000000", 28);
        deck.save(&path).unwrap();

        let reloaded = Deck::load(&path).unwrap();
        assert_eq!(reloaded.slides()[0].items[0].text, "Persisted");
    }
}
