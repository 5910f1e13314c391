//! NovaSheet: the fixed 25x12 spreadsheet grid with per-cell styling
//! and CSV persistence.

use std::sync::Arc;

use eframe::{egui, App, Frame, NativeOptions};
use egui::{Color32, FontFamily, FontId, Vec2};
use novasuite_gui::{
    apply_palette, hex_of, io_status, parse_color, plain_layout_job, text_colors, FileBar,
    TEXT_FONT_SIZES,
};
use novasuite_settings::{PreferencesStore, ThemeManager};
use novasuite_sheet::{csv, CellStyle, Grid, COLS, ROWS};

const APP_TITLE: &str = "NovaSheet";
const PREFERENCES_FILE: &str = "config/preferences.json";

#[derive(Clone, Copy)]
enum FileAction {
    Save,
    Load,
}

struct NovaSheetApp {
    grid: Grid,
    themes: ThemeManager,
    preferences: PreferencesStore,
    file_bar: FileBar,
    selected: Option<(usize, usize)>,
    font_size: u16,
    size_choice: u16,
    pick_color: Color32,
    status: String,
    theme_dirty: bool,
}

impl Default for NovaSheetApp {
    fn default() -> Self {
        let preferences = PreferencesStore::load(PREFERENCES_FILE)
            .unwrap_or_else(|_| PreferencesStore::new(PREFERENCES_FILE, Default::default()));
        let mut themes = ThemeManager::builtin();
        if !preferences.preferences().ui.dark_mode {
            themes.toggle();
        }
        let font_size = preferences.preferences().editor.font_size;

        Self {
            grid: Grid::new(),
            themes,
            preferences,
            file_bar: FileBar::new("sheet.csv"),
            selected: None,
            font_size,
            size_choice: font_size,
            pick_color: Color32::from_rgb(0xd0, 0x30, 0x30),
            status: "Ready".into(),
            theme_dirty: true,
        }
    }
}

impl NovaSheetApp {
    fn selected_style_mut(&mut self) -> Option<&mut CellStyle> {
        let (row, col) = self.selected?;
        self.grid.cell_mut(row, col).map(|cell| &mut cell.style)
    }

    fn handle_file_action(&mut self, action: FileAction) {
        let path = self.file_bar.path().to_path_buf();
        match action {
            FileAction::Save => match csv::save_csv(&self.grid, &path) {
                Ok(()) => self.status = io_status("Saved", Ok(())),
                Err(err) => self.status = io_status("Save", Err(err.to_string())),
            },
            FileAction::Load => match csv::load_csv(&mut self.grid, &path) {
                Ok(()) => self.status = io_status("Loaded", Ok(())),
                Err(err) => self.status = io_status("Load", Err(err.to_string())),
            },
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
                if ui.button("Dark / Light").clicked() {
                    self.toggle_theme();
                }
                ui.separator();

                // 樣式套用到目前聚焦的儲存格。 / Styling targets the focused cell only.
                if ui.button("Bold").clicked() {
                    if let Some(style) = self.selected_style_mut() {
                        style.bold = true;
                    }
                }
                if ui.button("Italic").clicked() {
                    if let Some(style) = self.selected_style_mut() {
                        style.italic = true;
                    }
                }
                if ui.button("Underline").clicked() {
                    if let Some(style) = self.selected_style_mut() {
                        style.underline = true;
                    }
                }

                ui.color_edit_button_srgba(&mut self.pick_color);
                if ui.button("Text Color").clicked() {
                    let color = hex_of(self.pick_color);
                    if let Some(style) = self.selected_style_mut() {
                        style.color = Some(color);
                    }
                }

                egui::ComboBox::from_id_source("font_size")
                    .width(60.0)
                    .selected_text(self.size_choice.to_string())
                    .show_ui(ui, |ui| {
                        for size in TEXT_FONT_SIZES {
                            ui.selectable_value(&mut self.size_choice, *size, size.to_string());
                        }
                    });
                if ui.button("Set Size").clicked() {
                    let size = self.size_choice;
                    if let Some(style) = self.selected_style_mut() {
                        style.size = Some(size);
                    }
                }
                ui.separator();

                if ui.button("Cell +").clicked() {
                    self.grid.grow_cells();
                }
                if ui.button("Cell -").clicked() {
                    self.grid.shrink_cells();
                }
                ui.separator();

                if let Some(action) = self.file_bar.show(
                    ui,
                    &[(FileAction::Save, "Save CSV"), (FileAction::Load, "Load CSV")],
                ) {
                    self.handle_file_action(action);
                }
                ui.label(&self.status);
            });
        });
    }

    fn show_grid(&mut self, ctx: &egui::Context) {
        let (normal_color, strong_color) = text_colors(self.themes.active_palette());
        let default_size = self.font_size as f32;
        let cell_width = self.grid.cell_width() as f32 * 9.0;
        let cell_pad = self.grid.cell_height() as f32 * 2.0 + 2.0;

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                egui::Grid::new("cells").spacing(Vec2::new(1.0, 1.0)).show(ui, |ui| {
                    for row in 0..ROWS {
                        for col in 0..COLS {
                            let (style, size) = {
                                let cell = self.grid.cell(row, col).expect("cell in bounds");
                                let size = cell.style.size.map(f32::from).unwrap_or(default_size);
                                (cell.style.clone(), size)
                            };
                            let color = style
                                .color
                                .as_deref()
                                .and_then(parse_color)
                                .unwrap_or(if style.bold { strong_color } else { normal_color });
                            let italic = style.italic;
                            let underline = style.underline;
                            let font_id = FontId::new(size, FontFamily::Proportional);
                            let layout_font = font_id.clone();
                            let mut layouter =
                                move |ui: &egui::Ui, text: &str, wrap_width: f32| -> Arc<egui::Galley> {
                                    let job = plain_layout_job(
                                        text,
                                        layout_font.clone(),
                                        color,
                                        italic,
                                        underline,
                                        wrap_width,
                                    );
                                    ui.fonts(|fonts| fonts.layout_job(job))
                                };

                            let cell = self.grid.cell_mut(row, col).expect("cell in bounds");
                            let response = ui.add(
                                egui::TextEdit::singleline(&mut cell.value)
                                    .font(font_id)
                                    .margin(Vec2::new(4.0, cell_pad))
                                    .desired_width(cell_width)
                                    .layouter(&mut layouter),
                            );
                            if response.gained_focus() || response.clicked() {
                                self.selected = Some((row, col));
                            }
                        }
                        ui.end_row();
                    }
                });
            });
        });
    }
}

impl App for NovaSheetApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        if self.theme_dirty {
            apply_palette(ctx, self.themes.is_dark(), self.themes.active_palette());
            self.theme_dirty = false;
        }
        self.show_toolbar(ctx);
        self.show_grid(ctx);
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
        Box::new(|_cc| Box::<NovaSheetApp>::default()),
    )
}
