use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use novasuite_core::Document;
use novasuite_notebook::{json, xml, Notebook};
use novasuite_search::{SearchMode, SearchOptions, Searcher};
use novasuite_settings::{PreferencesStore, ThemeManager};
use novasuite_sheet::{parse_csv, COLS, ROWS};
use walkdir::WalkDir;

const DEFAULT_PREFERENCES_FILE: &str = "config/preferences.json";

#[derive(Parser)]
#[command(
    name = "novasuite-cli",
    about = "Utility commands for the NovaSuite applets",
    author,
    version
)]
struct Cli {
    /// 偏好設定檔路徑；預設為 config/preferences.json。 /
    /// Preferences file path; defaults to config/preferences.json.
    #[arg(long, global = true, value_name = "FILE")]
    preferences_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 在 JSON 與 XML 之間轉換筆記本檔案。 / Convert notebook files between JSON and XML.
    Convert(ConvertArgs),
    /// 搜尋與選用的取代指令。 / Search (and optional replace) across files.
    Search(SearchArgs),
    /// 檢查試算表 CSV 是否超出固定格線。 / Check a sheet CSV against the fixed grid bounds.
    Sheet(SheetArgs),
    /// 匯入/匯出偏好設定。 / Import or export preferences.
    #[command(subcommand)]
    Preferences(PreferencesCommand),
    /// 列出可用主題。 / List available themes.
    #[command(subcommand)]
    Themes(ThemesCommand),
}

#[derive(Args)]
struct ConvertArgs {
    /// 要轉換的筆記本檔案。 / Notebook file to convert.
    input: PathBuf,

    /// 目標格式。 / Target format.
    #[arg(long, value_enum)]
    to: FormatChoice,

    /// 輸出路徑；預設為輸入檔改副檔名。 /
    /// Output path; defaults to the input with the target extension.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FormatChoice {
    Json,
    Xml,
}

impl FormatChoice {
    fn extension(self) -> &'static str {
        match self {
            FormatChoice::Json => "json",
            FormatChoice::Xml => "xml",
        }
    }
}

#[derive(Args)]
struct SearchArgs {
    /// 搜尋樣式（文字或 regex）。 / Pattern to search for (literal or regex).
    pattern: String,

    /// 搜尋的檔案或資料夾；預設為目前目錄。 /
    /// Files or directories to search; defaults to the current directory.
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// 以正規表示式解讀樣式。 / Interpret the pattern as a regex.
    #[arg(long)]
    regex: bool,

    /// 區分大小寫。 / Case sensitive matching.
    #[arg(long)]
    case_sensitive: bool,

    /// 僅匹配完整字詞。 / Match whole words only.
    #[arg(long)]
    whole_word: bool,

    /// 取代文字。 / Replacement text.
    #[arg(long, value_name = "TEXT")]
    replace: Option<String>,

    /// 將取代結果寫回檔案（需搭配 --replace）。 /
    /// Persist replacements to disk (requires --replace).
    #[arg(long, requires = "replace")]
    apply: bool,
}

#[derive(Args)]
struct SheetArgs {
    /// 要檢查的 CSV 檔案。 / CSV file to inspect.
    input: PathBuf,
}

#[derive(Subcommand)]
enum PreferencesCommand {
    /// 匯出目前偏好設定。 / Export the current preferences.
    Export(PreferencesExportArgs),
    /// 匯入偏好設定 JSON。 / Import preferences from JSON.
    Import(PreferencesImportArgs),
}

#[derive(Args)]
struct PreferencesExportArgs {
    /// 輸出檔案路徑。 / Destination file path.
    #[arg(long, value_name = "FILE")]
    output: PathBuf,
}

#[derive(Args)]
struct PreferencesImportArgs {
    /// 來源偏好設定 JSON。 / Source preferences JSON.
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

#[derive(Subcommand)]
enum ThemesCommand {
    /// 列出內建與目錄中的主題。 / List built-in themes plus any from a directory.
    List(ThemesListArgs),
}

#[derive(Args)]
struct ThemesListArgs {
    /// 額外的主題資料夾。 / Optional theme directory.
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let preferences_file = cli
        .preferences_file
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFERENCES_FILE));

    match cli.command {
        Commands::Convert(args) => run_convert(args),
        Commands::Search(args) => run_search(args),
        Commands::Sheet(args) => run_sheet_check(args),
        Commands::Preferences(command) => run_preferences(command, &preferences_file),
        Commands::Themes(command) => run_themes(command),
    }
}

fn run_convert(args: ConvertArgs) -> Result<()> {
    let notebook = load_notebook(&args.input)?;
    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension(args.to.extension()));

    match args.to {
        FormatChoice::Json => json::save_json(&notebook, &output)
            .with_context(|| format!("failed to write {}", output.display()))?,
        FormatChoice::Xml => xml::save_xml(&notebook, &output)
            .with_context(|| format!("failed to write {}", output.display()))?,
    }
    println!(
        "Converted {} -> {} ({} pages)",
        args.input.display(),
        output.display(),
        notebook.len()
    );
    Ok(())
}

/// 依內容起始字元判斷來源格式。 / Sniffs the source format from the first non-space byte.
fn load_notebook(path: &Path) -> Result<Notebook> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let notebook = if contents.trim_start().starts_with('<') {
        xml::from_xml(&contents).with_context(|| format!("failed to parse {}", path.display()))?
    } else {
        json::from_json(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?
    };
    Ok(notebook)
}

const SEARCHABLE_EXTENSIONS: &[&str] = &["txt", "json", "xml", "csv", "md"];

fn run_search(args: SearchArgs) -> Result<()> {
    let mut options = SearchOptions::new(&args.pattern);
    options.mode = if args.regex {
        SearchMode::Regex
    } else {
        SearchMode::Plain
    };
    options.case_sensitive = args.case_sensitive;
    options.whole_word = args.whole_word;

    let roots = if args.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.paths.clone()
    };
    let files = collect_files(&roots)?;

    let mut total_matches = 0;
    let mut files_with_matches = 0;
    let mut total_replacements = 0;

    for file in files {
        // 以編碼偵測讀入，老舊編碼檔案也能搜尋。 /
        // Documents are decoded with detection so legacy-encoded files search too.
        let Ok(document) = Document::open(&file) else {
            continue;
        };
        let searcher = Searcher::new(document.contents());

        if let Some(replacement) = args.replace.as_deref() {
            let outcome = searcher
                .replace_all(replacement, &options)
                .with_context(|| format!("search failed in {}", file.display()))?;
            if outcome.replacements == 0 {
                continue;
            }
            files_with_matches += 1;
            total_replacements += outcome.replacements;
            if args.apply {
                let mut updated = document.clone();
                updated.set_contents(outcome.replaced_text);
                updated
                    .save_as(&file)
                    .with_context(|| format!("failed to rewrite {}", file.display()))?;
            }
            println!("{}: {} replacement(s)", file.display(), outcome.replacements);
        } else {
            let matches = searcher
                .find_all(&options)
                .with_context(|| format!("search failed in {}", file.display()))?;
            if matches.is_empty() {
                continue;
            }
            files_with_matches += 1;
            total_matches += matches.len();
            for found in matches {
                println!(
                    "{}:{}:{}: {}",
                    file.display(),
                    found.line,
                    found.column,
                    found.matched
                );
            }
        }
    }

    if args.replace.is_some() {
        let suffix = if args.apply { "" } else { " (dry run)" };
        println!(
            "{total_replacements} replacement(s) in {files_with_matches} file(s){suffix}"
        );
    } else {
        println!("{total_matches} match(es) in {files_with_matches} file(s)");
    }
    Ok(())
}

fn collect_files(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for root in roots {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        if !root.is_dir() {
            bail!("path does not exist: {}", root.display());
        }
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let searchable = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| SEARCHABLE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if searchable {
                files.push(path.to_path_buf());
            }
        }
    }
    Ok(files)
}

fn run_sheet_check(args: SheetArgs) -> Result<()> {
    let contents = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let rows = parse_csv(&contents)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;

    let row_count = rows.len();
    let col_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    println!("{} rows x {} columns", row_count, col_count);
    if row_count > ROWS || col_count > COLS {
        println!(
            "warning: data beyond the {ROWS}x{COLS} grid is dropped when loaded in NovaSheet"
        );
    }
    Ok(())
}

fn run_preferences(command: PreferencesCommand, preferences_file: &Path) -> Result<()> {
    match command {
        PreferencesCommand::Export(args) => {
            let store = PreferencesStore::load(preferences_file)
                .context("failed to load preferences")?;
            store
                .export_to(&args.output)
                .with_context(|| format!("failed to export to {}", args.output.display()))?;
            println!("Exported preferences to {}", args.output.display());
        }
        PreferencesCommand::Import(args) => {
            let mut store = PreferencesStore::load(preferences_file)
                .context("failed to load preferences")?;
            store
                .import_from(&args.input)
                .with_context(|| format!("failed to import {}", args.input.display()))?;
            println!("Imported preferences from {}", args.input.display());
        }
    }
    Ok(())
}

fn run_themes(command: ThemesCommand) -> Result<()> {
    match command {
        ThemesCommand::List(args) => {
            let manager = match args.dir {
                Some(dir) => ThemeManager::load_from_dir(&dir)
                    .with_context(|| format!("failed to load themes from {}", dir.display()))?,
                None => ThemeManager::builtin(),
            };
            for name in manager.theme_names() {
                println!("{name}");
            }
        }
    }
    Ok(())
}
