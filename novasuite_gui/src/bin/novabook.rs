//! NovaBook: the tabbed notebook with rich-text pages and JSON/XML
//! persistence plus a periodic autosave.

use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::{egui, App, Frame, NativeOptions};
use egui::{Align, Color32, FontFamily, FontId, Key};
use novasuite_core::{metrics, Attr};
use novasuite_gui::{
    apply_palette, byte_range_from_chars, hex_of, io_status, rich_layout_job, text_colors, FileBar,
    TextPrompt, BOOK_FONT_SIZES,
};
use novasuite_notebook::{json, xml, AutosaveTimer, Autosaver, Notebook, AUTOSAVE_FILE};
use novasuite_search::{SearchOptions, Searcher};
use novasuite_settings::{PreferencesStore, RecentFilesStore, ThemeManager};

const APP_TITLE: &str = "NovaBook";
const PREFERENCES_FILE: &str = "config/preferences.json";
const RECENT_FILE: &str = "config/recent_files.json";

#[derive(Clone, Copy)]
enum FileAction {
    SaveJson,
    LoadJson,
    SaveXml,
    LoadXml,
}

struct NovaBookApp {
    notebook: Notebook,
    buffers: Vec<String>,
    themes: ThemeManager,
    preferences: PreferencesStore,
    recent: Option<RecentFilesStore>,
    autosaver: Autosaver,
    autosave_timer: AutosaveTimer,
    file_bar: FileBar,
    new_page_prompt: TextPrompt,
    find_prompt: TextPrompt,
    font_size: u16,
    size_choice: u16,
    pick_color: Color32,
    selection: Option<Range<usize>>,
    cursor_byte: usize,
    highlights: Vec<Range<usize>>,
    status: String,
    theme_dirty: bool,
}

impl Default for NovaBookApp {
    fn default() -> Self {
        let preferences = PreferencesStore::load(PREFERENCES_FILE)
            .unwrap_or_else(|_| PreferencesStore::new(PREFERENCES_FILE, Default::default()));
        let mut themes = ThemeManager::builtin();
        if !preferences.preferences().ui.dark_mode {
            themes.toggle();
        }
        let font_size = preferences.preferences().editor.font_size;
        let interval = preferences.preferences().editor.autosave_interval_secs;

        let autosaver = Autosaver::new(AUTOSAVE_FILE);
        let mut status = "Ready".to_string();
        let mut notebook = Notebook::new();
        // 啟動時還原最近的自動儲存快照。 / Restore the latest autosave snapshot on startup.
        match autosaver.restore() {
            Ok(Some((restored, _source))) if !restored.is_empty() => {
                notebook = restored;
                status = "Restored autosave".into();
            }
            _ => {
                notebook.add_page(None);
            }
        }
        let buffers = notebook
            .pages()
            .iter()
            .map(|page| page.body.text().to_owned())
            .collect();

        Self {
            notebook,
            buffers,
            themes,
            preferences,
            recent: RecentFilesStore::load(RECENT_FILE, 10).ok(),
            autosaver,
            autosave_timer: AutosaveTimer::new(Duration::from_secs(interval as u64)),
            file_bar: FileBar::new("notebook.json"),
            new_page_prompt: TextPrompt::default(),
            find_prompt: TextPrompt::default(),
            font_size,
            size_choice: font_size,
            pick_color: Color32::from_rgb(0xd0, 0x30, 0x30),
            selection: None,
            cursor_byte: 0,
            highlights: Vec::new(),
            status,
            theme_dirty: true,
        }
    }
}

impl NovaBookApp {
    fn active_index(&self) -> usize {
        self.notebook.active_index()
    }

    fn add_page(&mut self, title: Option<String>) {
        self.notebook.add_page(title);
        self.buffers.push(String::new());
        self.reset_page_state();
    }

    fn select_page(&mut self, index: usize) {
        if index != self.active_index() {
            self.notebook.set_active(index);
            self.reset_page_state();
        }
    }

    fn reset_page_state(&mut self) {
        self.selection = None;
        self.cursor_byte = 0;
        self.highlights.clear();
    }

    fn adopt_notebook(&mut self, notebook: Notebook) {
        self.buffers = notebook
            .pages()
            .iter()
            .map(|page| page.body.text().to_owned())
            .collect();
        self.notebook = notebook;
        self.reset_page_state();
    }

    fn toggle_attr(&mut self, attr: Attr) {
        if let Some(range) = self.selection.clone() {
            if let Some(page) = self.notebook.active_page_mut() {
                page.body.toggle(range, attr);
            }
        }
    }

    fn apply_color(&mut self) {
        if let Some(range) = self.selection.clone() {
            let color = hex_of(self.pick_color);
            if let Some(page) = self.notebook.active_page_mut() {
                page.body.apply(range, Attr::Color(color));
            }
        }
    }

    fn run_find(&mut self, term: &str) {
        self.highlights.clear();
        let index = self.active_index();
        if let Some(buffer) = self.buffers.get(index) {
            let searcher = Searcher::new(buffer);
            if let Ok(matches) = searcher.find_all(&SearchOptions::new(term)) {
                self.highlights = matches.into_iter().map(|m| m.range()).collect();
            }
        }
    }

    fn handle_file_action(&mut self, action: FileAction) {
        let path = self.file_bar.path().to_path_buf();
        let result = match action {
            FileAction::SaveJson => json::save_json(&self.notebook, &path)
                .map(|()| None)
                .map_err(|err| err.to_string()),
            FileAction::SaveXml => xml::save_xml(&self.notebook, &path)
                .map(|()| None)
                .map_err(|err| err.to_string()),
            FileAction::LoadJson => json::load_json(&path)
                .map(Some)
                .map_err(|err| err.to_string()),
            FileAction::LoadXml => xml::load_xml(&path)
                .map(Some)
                .map_err(|err| err.to_string()),
        };
        let (ok_verb, err_verb) = match action {
            FileAction::SaveJson | FileAction::SaveXml => ("Saved", "Save"),
            FileAction::LoadJson | FileAction::LoadXml => ("Loaded", "Load"),
        };
        match result {
            Ok(loaded) => {
                if let Some(notebook) = loaded {
                    self.adopt_notebook(notebook);
                }
                if let Some(recent) = self.recent.as_mut() {
                    let _ = recent.add(&path);
                }
                self.status = io_status(ok_verb, Ok(()));
            }
            Err(err) => self.status = io_status(err_verb, Err(err)),
        }
    }

    fn autosave_tick(&mut self) {
        if !self.preferences.preferences().editor.autosave_enabled {
            return;
        }
        if self.autosave_timer.due(Instant::now()) {
            let source = self.file_bar.path().to_path_buf();
            let source = source.exists().then_some(source);
            match self.autosaver.snapshot(&self.notebook, source.as_deref()) {
                Ok(()) => self.status = io_status("Autosaved", Ok(())),
                Err(err) => self.status = io_status("Autosave", Err(err.to_string())),
            }
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
                if ui.button("New Page").clicked() {
                    self.new_page_prompt.open("Page name");
                }
                if let Some(action) = self.file_bar.show(
                    ui,
                    &[
                        (FileAction::SaveJson, "Save JSON"),
                        (FileAction::LoadJson, "Load JSON"),
                        (FileAction::SaveXml, "Save XML"),
                        (FileAction::LoadXml, "Load XML"),
                    ],
                ) {
                    self.handle_file_action(action);
                }
                self.show_recent_menu(ui);
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

                ui.label("Size");
                egui::ComboBox::from_id_source("font_size")
                    .width(60.0)
                    .selected_text(self.size_choice.to_string())
                    .show_ui(ui, |ui| {
                        for size in BOOK_FONT_SIZES {
                            ui.selectable_value(&mut self.size_choice, *size, size.to_string());
                        }
                    });
                if ui.button("Set Size").clicked() {
                    self.font_size = self.size_choice;
                    let size = self.size_choice;
                    let _ = self.preferences.update(|prefs| prefs.editor.font_size = size);
                }
                ui.separator();

                if ui.button("Search").clicked() {
                    self.find_prompt.open("Search");
                }
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
            self.file_bar.path = path.clone();
            if path.ends_with(".xml") {
                self.handle_file_action(FileAction::LoadXml);
            } else {
                self.handle_file_action(FileAction::LoadJson);
            }
        }
    }

    fn show_tab_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                let active = self.active_index();
                let titles: Vec<String> = self
                    .notebook
                    .pages()
                    .iter()
                    .map(|page| page.title.clone())
                    .collect();
                for (index, title) in titles.iter().enumerate() {
                    if ui.selectable_label(index == active, title).clicked() {
                        self.select_page(index);
                    }
                }
            });
        });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let index = self.active_index();
            let (line, column) = self
                .buffers
                .get(index)
                .map(|buffer| metrics::line_col_at(buffer, self.cursor_byte))
                .unwrap_or((1, 0));
            ui.label(format!("Line {line} | Column {column}"));
        });
    }

    fn show_editor(&mut self, ctx: &egui::Context) {
        let index = self.active_index();
        let (normal_color, strong_color) = text_colors(self.themes.active_palette());
        let font_size = self.font_size as f32;
        let styled = match self.notebook.page(index) {
            Some(page) => page.body.clone(),
            None => return,
        };
        let highlights = self.highlights.clone();

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(buffer) = self.buffers.get_mut(index) else {
                return;
            };
            egui::ScrollArea::vertical().show(ui, |ui| {
                let mut layouter = move |ui: &egui::Ui, text: &str, wrap_width: f32| -> Arc<egui::Galley> {
                    let job = rich_layout_job(
                        text,
                        &styled,
                        font_size,
                        FontFamily::Proportional,
                        normal_color,
                        strong_color,
                        &highlights,
                        Align::LEFT,
                        wrap_width,
                    );
                    ui.fonts(|fonts| fonts.layout_job(job))
                };
                let output = egui::TextEdit::multiline(buffer)
                    .font(FontId::new(font_size, FontFamily::Proportional))
                    .desired_width(f32::INFINITY)
                    .desired_rows(28)
                    .layouter(&mut layouter)
                    .show(ui);

                if output.response.changed() {
                    if let Some(page) = self.notebook.page_mut(index) {
                        page.body.reconcile(buffer);
                    }
                    self.highlights.clear();
                }
                if let Some(range) = output.cursor_range {
                    self.cursor_byte =
                        metrics::char_to_byte(buffer, range.primary.ccursor.index);
                    self.selection = byte_range_from_chars(
                        buffer,
                        range.primary.ccursor.index,
                        range.secondary.ccursor.index,
                    );
                }
            });
        });
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let (bold, italic, underline, find) = ctx.input(|i| {
            let command = i.modifiers.command;
            (
                command && i.key_pressed(Key::B),
                command && i.key_pressed(Key::I),
                command && i.key_pressed(Key::U),
                command && i.key_pressed(Key::F),
            )
        });
        if bold {
            self.toggle_attr(Attr::Bold);
        }
        if italic {
            self.toggle_attr(Attr::Italic);
        }
        if underline {
            self.toggle_attr(Attr::Underline);
        }
        if find {
            self.find_prompt.open("Search");
        }
    }
}

impl App for NovaBookApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        if self.theme_dirty {
            apply_palette(ctx, self.themes.is_dark(), self.themes.active_palette());
            self.theme_dirty = false;
        }

        self.handle_shortcuts(ctx);
        if let Some(title) = self.new_page_prompt.show(ctx) {
            self.add_page((!title.is_empty()).then_some(title));
        }
        if let Some(term) = self.find_prompt.show(ctx) {
            if !term.is_empty() {
                self.run_find(&term);
            }
        }

        self.autosave_tick(); // 週期快照由更新迴圈驅動。 / Driven from the update loop.
        ctx.request_repaint_after(Duration::from_secs(1));

        self.show_toolbar(ctx);
        self.show_tab_bar(ctx);
        self.show_status_bar(ctx);
        self.show_editor(ctx);
    }
}

fn main() -> eframe::Result<()> {
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(|_cc| Box::<NovaBookApp>::default()),
    )
}
