//! NovaWrite: the single-buffer word processor.

use std::ops::Range;
use std::sync::Arc;

use eframe::{egui, App, Frame, NativeOptions};
use egui::{Align, Color32, FontFamily, FontId, Key};
use novasuite_core::{metrics, Alignment, Attr, Document, StyledText};
use novasuite_gui::{
    apply_palette, byte_range_from_chars, hex_of, io_status, rich_layout_job, text_colors, FileBar,
    TextPrompt, TEXT_FONT_SIZES,
};
use novasuite_search::{SearchOptions, Searcher};
use novasuite_settings::{PreferencesStore, RecentFilesStore, ThemeManager};

const APP_TITLE: &str = "NovaWrite";
const PREFERENCES_FILE: &str = "config/preferences.json";
const RECENT_FILE: &str = "config/recent_files.json";

#[derive(Clone, Copy, PartialEq, Eq)]
enum FamilyChoice {
    Proportional,
    Monospace,
}

impl FamilyChoice {
    fn label(self) -> &'static str {
        match self {
            FamilyChoice::Proportional => "Proportional",
            FamilyChoice::Monospace => "Monospace",
        }
    }

    fn family(self) -> FontFamily {
        match self {
            FamilyChoice::Proportional => FontFamily::Proportional,
            FamilyChoice::Monospace => FontFamily::Monospace,
        }
    }
}

struct NovaWriteApp {
    document: Document,
    styled: StyledText,
    buffer: String,
    themes: ThemeManager,
    preferences: PreferencesStore,
    recent: Option<RecentFilesStore>,
    font_family: FamilyChoice,
    family_choice: FamilyChoice,
    font_size: u16,
    size_choice: u16,
    pick_color: Color32,
    file_bar: FileBar,
    find_prompt: TextPrompt,
    highlights: Vec<Range<usize>>,
    selection: Option<Range<usize>>,
    cursor_byte: usize,
    status: String,
    theme_dirty: bool,
}

impl Default for NovaWriteApp {
    fn default() -> Self {
        let preferences = PreferencesStore::load(PREFERENCES_FILE)
            .unwrap_or_else(|_| PreferencesStore::new(PREFERENCES_FILE, Default::default()));
        let mut themes = ThemeManager::builtin();
        if !preferences.preferences().ui.dark_mode {
            themes.toggle();
        }
        let font_size = preferences.preferences().editor.font_size;

        Self {
            document: Document::new(),
            styled: StyledText::new(),
            buffer: String::new(),
            themes,
            preferences,
            recent: RecentFilesStore::load(RECENT_FILE, 10).ok(),
            font_family: FamilyChoice::Proportional,
            family_choice: FamilyChoice::Proportional,
            font_size,
            size_choice: font_size,
            pick_color: Color32::from_rgb(0xd0, 0x30, 0x30),
            file_bar: FileBar::new("document.txt"),
            find_prompt: TextPrompt::default(),
            highlights: Vec::new(),
            selection: None,
            cursor_byte: 0,
            status: "Ready".into(),
            theme_dirty: true,
        }
    }
}

#[derive(Clone, Copy)]
enum FileAction {
    Open,
    Save,
}

impl NovaWriteApp {
    fn toggle_attr(&mut self, attr: Attr) {
        if let Some(range) = self.selection.clone() {
            self.styled.toggle(range, attr);
        }
    }

    fn apply_color(&mut self) {
        if let Some(range) = self.selection.clone() {
            self.styled.apply(range, Attr::Color(hex_of(self.pick_color)));
        }
    }

    fn align(&mut self, alignment: Alignment) {
        if let Some(range) = self.selection.clone() {
            self.styled.set_alignment(range, alignment);
        }
    }

    fn bullet_list(&mut self) {
        if let Some(range) = self.selection.clone() {
            if let Some(new_text) = metrics::bullet_lines(&self.buffer, range) {
                self.buffer = new_text;
                self.styled.reconcile(&self.buffer);
                self.document.mark_dirty();
            }
        }
    }

    fn open_file(&mut self) {
        let path = self.file_bar.path().to_path_buf();
        match Document::open(&path) {
            Ok(document) => {
                self.buffer = document.contents().to_owned();
                self.styled.replace_text(self.buffer.clone());
                self.highlights.clear();
                self.selection = None;
                self.document = document;
                if let Some(recent) = self.recent.as_mut() {
                    let _ = recent.add(&path);
                }
                self.status = io_status("Opened", Ok(()));
            }
            Err(err) => self.status = io_status("Open", Err(err.to_string())),
        }
    }

    fn save_file(&mut self) {
        let path = self.file_bar.path().to_path_buf();
        self.document.set_contents(self.buffer.clone());
        match self.document.save_as(&path) {
            Ok(()) => {
                if let Some(recent) = self.recent.as_mut() {
                    let _ = recent.add(&path);
                }
                self.status = io_status("Saved", Ok(()));
            }
            Err(err) => self.status = io_status("Save", Err(err.to_string())),
        }
    }

    fn run_find(&mut self, term: &str) {
        self.highlights.clear();
        let searcher = Searcher::new(&self.buffer);
        if let Ok(matches) = searcher.find_all(&SearchOptions::new(term)) {
            self.highlights = matches.into_iter().map(|m| m.range()).collect();
        }
    }

    fn toggle_theme(&mut self) {
        self.themes.toggle();
        let dark = self.themes.is_dark();
        let _ = self.preferences.update(|prefs| prefs.ui.dark_mode = dark);
        self.theme_dirty = true;
    }

    fn show_toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                if let Some(action) = self
                    .file_bar
                    .show(ui, &[(FileAction::Open, "Open"), (FileAction::Save, "Save")])
                {
                    match action {
                        FileAction::Open => self.open_file(),
                        FileAction::Save => self.save_file(),
                    }
                }
                self.show_recent_menu(ui);
                ui.separator();

                egui::ComboBox::from_id_source("font_family")
                    .width(110.0)
                    .selected_text(self.family_choice.label())
                    .show_ui(ui, |ui| {
                        for choice in [FamilyChoice::Proportional, FamilyChoice::Monospace] {
                            ui.selectable_value(&mut self.family_choice, choice, choice.label());
                        }
                    });
                if ui.button("Set Font").clicked() {
                    self.font_family = self.family_choice;
                }

                egui::ComboBox::from_id_source("font_size")
                    .width(60.0)
                    .selected_text(self.size_choice.to_string())
                    .show_ui(ui, |ui| {
                        for size in TEXT_FONT_SIZES {
                            ui.selectable_value(&mut self.size_choice, *size, size.to_string());
                        }
                    });
                if ui.button("Size").clicked() {
                    self.font_size = self.size_choice;
                    let size = self.size_choice;
                    let _ = self.preferences.update(|prefs| prefs.editor.font_size = size);
                }
                ui.separator();

                if ui.button("Bold").clicked() {
                    self.toggle_attr(Attr::Bold);
                }
                if ui.button("Italic").clicked() {
                    self.toggle_attr(Attr::Italic);
                }
                if ui.button("Underline").clicked() {
                    self.toggle_attr(Attr::Underline);
                }

                ui.color_edit_button_srgba(&mut self.pick_color);
                if ui.button("Color").clicked() {
                    self.apply_color();
                }
                ui.separator();

                if ui.button("Left").clicked() {
                    self.align(Alignment::Left);
                }
                if ui.button("Center").clicked() {
                    self.align(Alignment::Center);
                }
                if ui.button("Right").clicked() {
                    self.align(Alignment::Right);
                }
                if ui.button("• List").clicked() {
                    self.bullet_list();
                }
                ui.separator();

                if ui.button("Dark / Light").clicked() {
                    self.toggle_theme();
                }
                ui.label(&self.status);
            });
        });
    }

    fn show_recent_menu(&mut self, ui: &mut egui::Ui) {
        let Some(recent) = self.recent.as_ref() else {
            return;
        };
        let entries: Vec<String> = recent
            .iter()
            .map(|path| path.display().to_string())
            .collect();
        if entries.is_empty() {
            return;
        }
        let mut chosen = None;
        ui.menu_button("Recent", |ui| {
            for entry in &entries {
                if ui.button(entry).clicked() {
                    chosen = Some(entry.clone());
                    ui.close_menu();
                }
            }
        });
        if let Some(path) = chosen {
            self.file_bar.path = path;
            self.open_file();
        }
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                ui.label(format!("Words: {}", metrics::word_count(&self.buffer)));
            });
        });
    }

    fn show_editor(&mut self, ctx: &egui::Context) {
        let (normal_color, strong_color) = text_colors(self.themes.active_palette());
        let font_size = self.font_size as f32;
        let family = self.font_family.family();
        let halign = match self.styled.alignment_at(self.cursor_byte) {
            Some(Alignment::Center) => Align::Center,
            Some(Alignment::Right) => Align::RIGHT,
            _ => Align::LEFT,
        };
        let styled = self.styled.clone();
        let highlights = self.highlights.clone();

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                let mut layouter = move |ui: &egui::Ui, text: &str, wrap_width: f32| -> Arc<egui::Galley> {
                    let job = rich_layout_job(
                        text,
                        &styled,
                        font_size,
                        family.clone(),
                        normal_color,
                        strong_color,
                        &highlights,
                        halign,
                        wrap_width,
                    );
                    ui.fonts(|fonts| fonts.layout_job(job))
                };
                let output = egui::TextEdit::multiline(&mut self.buffer)
                    .font(FontId::new(font_size, self.font_family.family()))
                    .desired_width(f32::INFINITY)
                    .desired_rows(30)
                    .layouter(&mut layouter)
                    .show(ui);

                if output.response.changed() {
                    self.styled.reconcile(&self.buffer);
                    self.highlights.clear();
                    self.document.mark_dirty();
                }
                if let Some(range) = output.cursor_range {
                    self.cursor_byte =
                        metrics::char_to_byte(&self.buffer, range.primary.ccursor.index);
                    self.selection = byte_range_from_chars(
                        &self.buffer,
                        range.primary.ccursor.index,
                        range.secondary.ccursor.index,
                    );
                }
            });
        });
    }
}

impl App for NovaWriteApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        if self.theme_dirty {
            apply_palette(ctx, self.themes.is_dark(), self.themes.active_palette());
            self.theme_dirty = false;
        }

        if ctx.input(|i| i.modifiers.command && i.key_pressed(Key::F)) {
            self.find_prompt.open("Find");
        }
        if let Some(term) = self.find_prompt.show(ctx) {
            if !term.is_empty() {
                self.run_find(&term);
            }
        }

        self.show_toolbar(ctx);
        self.show_status_bar(ctx);
        self.show_editor(ctx);
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
        Box::new(|_cc| Box::<NovaWriteApp>::default()),
    )
}
