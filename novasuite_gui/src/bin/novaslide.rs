//! NovaSlide: the slide deck editor. Slides are painted directly onto
//! the central panel; items are freeform positioned text.

use eframe::{egui, App, Frame, NativeOptions};
use egui::{Align2, Color32, FontId, Pos2, Vec2};
use novasuite_gui::{
    apply_palette, color32, hex_of, io_status, parse_color, FileBar, TextPrompt, SLIDE_FONT_SIZES,
};
use novasuite_settings::{PreferencesStore, ThemeManager};
use novasuite_slide::Deck;

const APP_TITLE: &str = "NovaSlide";
const PREFERENCES_FILE: &str = "config/preferences.json";

#[derive(Clone, Copy)]
enum FileAction {
    Save,
    Load,
}

struct NovaSlideApp {
    deck: Deck,
    themes: ThemeManager,
    preferences: PreferencesStore,
    file_bar: FileBar,
    add_text_prompt: TextPrompt,
    font_size: u32,
    size_choice: u32,
    text_color: Color32,
    background_color: Color32,
    status: String,
    theme_dirty: bool,
}

impl Default for NovaSlideApp {
    fn default() -> Self {
        let preferences = PreferencesStore::load(PREFERENCES_FILE)
            .unwrap_or_else(|_| PreferencesStore::new(PREFERENCES_FILE, Default::default()));
        let mut themes = ThemeManager::builtin();
        if !preferences.preferences().ui.dark_mode {
            themes.toggle();
        }
        let dark = themes.is_dark();

        Self {
            deck: Deck::new(dark),
            themes,
            preferences,
            file_bar: FileBar::new("presentation.json"),
            add_text_prompt: TextPrompt::default(),
            font_size: 32,
            size_choice: 32,
            text_color: Color32::from_rgb(0xd0, 0x30, 0x30),
            background_color: Color32::from_rgb(0x20, 0x20, 0x20),
            status: "Ready".into(),
            theme_dirty: true,
        }
    }
}

impl NovaSlideApp {
    fn default_text_color(&self) -> String {
        // 與原程式相同：深色背景給白字、淺色給黑字。 /
        // As the original: white text on dark slides, black on light.
        if self.themes.is_dark() {
            "#ffffff".to_string()
        } else {
            "#000000".to_string()
        }
    }

    fn handle_file_action(&mut self, action: FileAction) {
        let path = self.file_bar.path().to_path_buf();
        match action {
            FileAction::Save => match self.deck.save(&path) {
                Ok(()) => self.status = io_status("Saved", Ok(())),
                Err(err) => self.status = io_status("Save", Err(err.to_string())),
            },
            FileAction::Load => match Deck::load(&path) {
                Ok(deck) => {
                    self.deck = deck;
                    self.status = io_status("Loaded", Ok(()));
                }
                Err(err) => self.status = io_status("Load", Err(err.to_string())),
            },
        }
    }

    fn toggle_theme(&mut self) {
        self.themes.toggle();
        let dark = self.themes.is_dark();
        let _ = self.preferences.update(|prefs| prefs.ui.dark_mode = dark);
        self.deck.retheme(dark);
        self.theme_dirty = true;
    }

    fn show_toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                if ui.button("New Slide").clicked() {
                    self.deck.add_slide(self.themes.is_dark());
                }
                if ui.button("Prev").clicked() {
                    self.deck.prev();
                }
                if ui.button("Next").clicked() {
                    self.deck.next();
                }
                ui.separator();

                if ui.button("Add Text").clicked() {
                    self.add_text_prompt.open("Text");
                }
                ui.color_edit_button_srgba(&mut self.text_color);
                if ui.button("Text Color").clicked() {
                    let color = hex_of(self.text_color);
                    self.deck.recolor_last(color);
                }

                ui.label("Size");
                egui::ComboBox::from_id_source("text_size")
                    .width(60.0)
                    .selected_text(self.size_choice.to_string())
                    .show_ui(ui, |ui| {
                        for size in SLIDE_FONT_SIZES {
                            ui.selectable_value(&mut self.size_choice, *size, size.to_string());
                        }
                    });
                if ui.button("Set Size").clicked() {
                    self.font_size = self.size_choice;
                }
                ui.separator();

                ui.color_edit_button_srgba(&mut self.background_color);
                if ui.button("Slide Background").clicked() {
                    let color = hex_of(self.background_color);
                    self.deck.set_background(color);
                }
                ui.separator();

                if let Some(action) = self
                    .file_bar
                    .show(ui, &[(FileAction::Save, "Save"), (FileAction::Load, "Load")])
                {
                    self.handle_file_action(action);
                }
                if ui.button("Dark / Light").clicked() {
                    self.toggle_theme();
                }
                ui.label(format!(
                    "Slide {}/{}",
                    self.deck.current_index() + 1,
                    self.deck.len()
                ));
                ui.label(&self.status);
            });
        });
    }

    fn show_canvas(&mut self, ctx: &egui::Context) {
        let fallback = color32(self.themes.active_palette().canvas);
        egui::CentralPanel::default().show(ctx, |ui| {
            let rect = ui.max_rect();
            let painter = ui.painter_at(rect);
            let slide = self.deck.current();
            let background = parse_color(&slide.bg).unwrap_or(fallback);
            painter.rect_filled(rect, 0.0, background);

            for item in &slide.items {
                let color = parse_color(&item.color).unwrap_or(Color32::WHITE);
                let pos = Pos2::new(rect.min.x, rect.min.y) + Vec2::new(item.x, item.y);
                painter.text(
                    pos,
                    Align2::CENTER_CENTER,
                    &item.text,
                    FontId::proportional(item.size as f32),
                    color,
                );
            }
        });
    }
}

impl App for NovaSlideApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        if self.theme_dirty {
            apply_palette(ctx, self.themes.is_dark(), self.themes.active_palette());
            self.theme_dirty = false;
        }

        if let Some(text) = self.add_text_prompt.show(ctx) {
            if !text.is_empty() {
                let color = self.default_text_color();
                self.deck.add_text(text, color, self.font_size);
            }
        }

        self.show_toolbar(ctx);
        self.show_canvas(ctx);
    }
}

fn main() -> eframe::Result<()> {
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_maximized(true),
        ..Default::default()
    };
    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(|_cc| Box::<NovaSlideApp>::default()),
    )
}
