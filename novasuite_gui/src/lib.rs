//! Shared egui chrome for the four NovaSuite applets.
//!
//! Each binary builds its own toolbar and central widget, but they all
//! paint from the same palette, lay out rich text the same way, and use
//! the same path-entry file bar in place of native dialogs.

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

use egui::text::{LayoutJob, TextFormat};
use egui::{Align, Color32, Context, FontFamily, FontId, Stroke, Ui};
use novasuite_core::metrics::char_to_byte;
use novasuite_core::rich::SegmentStyle;
use novasuite_core::StyledText;
use novasuite_settings::{Color, ResolvedPalette};
use once_cell::sync::Lazy;

/// Size lists mirrored from the original toolbars.
pub const TEXT_FONT_SIZES: &[u16] = &[8, 10, 12, 14, 16, 18, 20, 24, 28, 32];
pub const BOOK_FONT_SIZES: &[u16] = &[10, 12, 14, 16, 18, 20, 24, 28, 32];
pub const SLIDE_FONT_SIZES: &[u32] = &[16, 20, 24, 28, 32, 40, 48, 56, 64];

/// Background used for search-result highlighting, as the original's
/// yellow `search` tag.
pub const SEARCH_HIGHLIGHT: Color32 = Color32::from_rgb(0xff, 0xff, 0x00);

pub fn color32(color: Color) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

/// Colour names the original applets wrote into saved files.
static NAMED_COLORS: Lazy<BTreeMap<&'static str, Color32>> = Lazy::new(|| {
    BTreeMap::from([
        ("white", Color32::WHITE),
        ("black", Color32::BLACK),
        ("lightgray", Color32::from_rgb(0xd3, 0xd3, 0xd3)),
        ("yellow", Color32::from_rgb(0xff, 0xff, 0x00)),
    ])
});

/// Parses `#rrggbb` plus the colour names the original wrote into
/// saved files.
pub fn parse_color(value: &str) -> Option<Color32> {
    if let Some(named) = NAMED_COLORS.get(value) {
        return Some(*named);
    }
    Color::from_hex(value).ok().map(color32)
}

pub fn hex_of(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

/// Normal and strong text colours for the palette. Default egui fonts
/// carry no bold face, so bold spans render in the strong colour while
/// regular text sits a step closer to the background, the same split
/// egui's own weak/strong text uses.
pub fn text_colors(palette: &ResolvedPalette) -> (Color32, Color32) {
    let strong = color32(palette.text);
    let window = color32(palette.window);
    let mix = |a: u8, b: u8| -> u8 {
        let a = a as f32;
        let b = b as f32;
        (a + (b - a) * 0.22).round() as u8
    };
    let normal = Color32::from_rgb(
        mix(strong.r(), window.r()),
        mix(strong.g(), window.g()),
        mix(strong.b(), window.b()),
    );
    (normal, strong)
}

/// Pushes the palette into egui's visuals, the Dark / Light toggle's
/// whole-window repaint.
pub fn apply_palette(ctx: &Context, dark: bool, palette: &ResolvedPalette) {
    let mut visuals = if dark {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };
    let (normal_text, _) = text_colors(palette);
    visuals.override_text_color = Some(normal_text);
    visuals.panel_fill = color32(palette.toolbar);
    visuals.window_fill = color32(palette.window);
    visuals.extreme_bg_color = color32(palette.field);
    visuals.selection.bg_fill = color32(palette.selection);
    visuals.widgets.noninteractive.bg_fill = color32(palette.window);
    visuals.widgets.inactive.bg_fill = color32(palette.widget);
    visuals.widgets.inactive.fg_stroke.color = color32(palette.text);
    visuals.widgets.hovered.bg_fill = color32(palette.selection);
    visuals.widgets.active.bg_fill = color32(palette.selection);
    visuals.widgets.active.fg_stroke.color = color32(palette.text);
    ctx.set_visuals(visuals);
}

/// Builds the layout job for a styled buffer: colour spans, italics and
/// underline render natively, bold falls back to the strong colour, and
/// search hits get the highlight background.
#[allow(clippy::too_many_arguments)]
pub fn rich_layout_job(
    text: &str,
    styled: &StyledText,
    font_size: f32,
    family: FontFamily,
    normal_color: Color32,
    strong_color: Color32,
    highlights: &[Range<usize>],
    halign: Align,
    wrap_width: f32,
) -> LayoutJob {
    let mut job = LayoutJob::default();
    job.halign = halign;
    job.wrap.max_width = wrap_width;

    let font_id = FontId::new(font_size, family);
    let mut cuts = vec![0, text.len()];
    for (range, _) in styled.segments() {
        cuts.push(range.start.min(text.len()));
        cuts.push(range.end.min(text.len()));
    }
    for range in highlights {
        cuts.push(range.start.min(text.len()));
        cuts.push(range.end.min(text.len()));
    }
    cuts.retain(|cut| text.is_char_boundary(*cut));
    cuts.sort_unstable();
    cuts.dedup();

    let segments = styled.segments();
    for pair in cuts.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if start >= end {
            continue;
        }
        let style = segments
            .iter()
            .find(|(range, _)| range.start <= start && end <= range.end)
            .map(|(_, style)| style.clone())
            .unwrap_or_default();
        let highlighted = highlights
            .iter()
            .any(|range| range.start <= start && end <= range.end);
        job.append(
            &text[start..end],
            0.0,
            segment_format(&style, &font_id, normal_color, strong_color, highlighted),
        );
    }
    if text.is_empty() {
        job.append(
            "",
            0.0,
            TextFormat {
                font_id,
                color: normal_color,
                ..Default::default()
            },
        );
    }
    job
}

fn segment_format(
    style: &SegmentStyle,
    font_id: &FontId,
    normal_color: Color32,
    strong_color: Color32,
    highlighted: bool,
) -> TextFormat {
    let mut color = if style.bold { strong_color } else { normal_color };
    if let Some(span_color) = style.color.as_deref().and_then(parse_color) {
        color = span_color;
    }
    TextFormat {
        font_id: font_id.clone(),
        color,
        background: if highlighted {
            SEARCH_HIGHLIGHT
        } else {
            Color32::TRANSPARENT
        },
        italics: style.italic,
        underline: if style.underline {
            Stroke::new(1.0, color)
        } else {
            Stroke::NONE
        },
        ..Default::default()
    }
}

/// Single-format layout used by the sheet cells, which style the whole
/// cell rather than spans.
pub fn plain_layout_job(
    text: &str,
    font_id: FontId,
    color: Color32,
    italic: bool,
    underline: bool,
    wrap_width: f32,
) -> LayoutJob {
    let mut job = LayoutJob::default();
    job.wrap.max_width = wrap_width;
    job.append(
        text,
        0.0,
        TextFormat {
            font_id,
            color,
            italics: italic,
            underline: if underline {
                Stroke::new(1.0, color)
            } else {
                Stroke::NONE
            },
            ..Default::default()
        },
    );
    job
}

/// Converts a text-edit cursor pair (char indices) into an ordered byte
/// range, or `None` when the selection is empty.
pub fn byte_range_from_chars(text: &str, a: usize, b: usize) -> Option<Range<usize>> {
    if a == b {
        return None;
    }
    let a = char_to_byte(text, a);
    let b = char_to_byte(text, b);
    Some(a.min(b)..a.max(b))
}

/// Path-entry file bar standing in for the native save/open dialogs.
pub struct FileBar {
    pub path: String,
}

impl FileBar {
    pub fn new(default_path: impl Into<String>) -> Self {
        Self {
            path: default_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        Path::new(&self.path)
    }

    /// Draws the path field plus one button per action; returns the
    /// action that was clicked, if any.
    pub fn show<A: Copy>(&mut self, ui: &mut Ui, actions: &[(A, &str)]) -> Option<A> {
        let mut clicked = None;
        ui.label("File:");
        ui.add(
            egui::TextEdit::singleline(&mut self.path)
                .desired_width(220.0)
                .hint_text("path/to/file"),
        );
        for (action, label) in actions {
            if ui.button(*label).clicked() {
                clicked = Some(*action);
            }
        }
        clicked
    }
}

/// Small modal prompt for a single line of text (page titles, slide
/// text, search terms), replacing the original's `simpledialog`.
#[derive(Default)]
pub struct TextPrompt {
    title: String,
    value: String,
    open: bool,
}

impl TextPrompt {
    pub fn open(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.value.clear();
        self.open = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Shows the prompt; returns the entered text once confirmed.
    pub fn show(&mut self, ctx: &Context) -> Option<String> {
        if !self.open {
            return None;
        }
        let mut submitted = None;
        let mut cancelled = false;
        egui::Window::new(self.title.clone())
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                let response = ui.text_edit_singleline(&mut self.value);
                response.request_focus();
                let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() || enter {
                        submitted = Some(self.value.clone());
                    }
                    if ui.button("Cancel").clicked() {
                        cancelled = true;
                    }
                });
            });
        if submitted.is_some() || cancelled {
            self.open = false;
        }
        submitted
    }
}

/// Status message shown in the toolbar after a save/load attempt.
pub fn io_status(action: &str, result: Result<(), String>) -> String {
    match result {
        Ok(()) => format!("{action} at {}", chrono::Local::now().format("%H:%M:%S")),
        Err(err) => format!("{action} failed: {err}"),
    }
}
