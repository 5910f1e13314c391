use std::borrow::Cow;
use std::fs::{self, File, Metadata};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chardetng::EncodingDetector;
use encoding_rs::{Encoding as RsEncoding, BIG5, GBK, SHIFT_JIS, WINDOWS_1252};
use thiserror::Error;

/// 文件目前使用的行尾樣式。 / Line ending style recorded for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
    Cr,
}

impl LineEnding {
    /// 序列化時使用的行尾字串。 / Literal string written out when serialising.
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::Cr => "\r",
        }
    }
}

/// 文件支援的文字編碼。 / Text encodings a document can round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// UTF-8 並在開頭保留 BOM。 / UTF-8 with a leading byte order mark preserved on save.
    Utf8Bom,
    Legacy(LegacyEncoding),
}

impl TextEncoding {
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf8Bom => "utf-8-bom",
            TextEncoding::Legacy(legacy) => legacy.name(),
        }
    }
}

/// 支援的傳統單/多位元編碼。 / Supported legacy byte encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyEncoding {
    Windows1252,
    ShiftJis,
    Gbk,
    Big5,
}

impl LegacyEncoding {
    pub fn name(self) -> &'static str {
        match self {
            LegacyEncoding::Windows1252 => "windows-1252",
            LegacyEncoding::ShiftJis => "shift-jis",
            LegacyEncoding::Gbk => "gbk",
            LegacyEncoding::Big5 => "big5",
        }
    }

    fn to_rs(self) -> &'static RsEncoding {
        match self {
            LegacyEncoding::Windows1252 => WINDOWS_1252,
            LegacyEncoding::ShiftJis => SHIFT_JIS,
            LegacyEncoding::Gbk => GBK,
            LegacyEncoding::Big5 => BIG5,
        }
    }
}

/// 磁碟檔案與記憶體快照的比較結果。 / Result of comparing the on-disk file with the stored snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskState {
    Unchanged,
    Modified,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileSignature {
    len: u64,
    modified_nanos: Option<u128>,
}

impl FileSignature {
    fn from_metadata(metadata: &Metadata) -> Self {
        let modified_nanos = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|duration| duration.as_nanos());
        Self {
            len: metadata.len(),
            modified_nanos,
        }
    }
}

/// 文件載入或儲存時可能發生的錯誤。 / Errors raised while loading or saving a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("file contents are not valid text in any supported encoding")]
    InvalidEncoding,
    #[error("text cannot be represented in target encoding {0}")]
    Unrepresentable(&'static str),
}

/// 純文字文件的記憶體模型，內部行尾一律正規化為 `\n`。 /
/// In-memory model of a plain text file; newlines are normalised to `\n` internally.
#[derive(Debug, Clone)]
pub struct Document {
    path: Option<PathBuf>,
    contents: String,
    line_ending: LineEnding,
    encoding: TextEncoding,
    is_dirty: bool,
    disk_signature: Option<FileSignature>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// 建立空白且尚未存檔的文件。 / Creates an empty, unsaved document.
    pub fn new() -> Self {
        Self {
            path: None,
            contents: String::new(),
            line_ending: LineEnding::Lf,
            encoding: TextEncoding::Utf8,
            is_dirty: false,
            disk_signature: None,
        }
    }

    /// 從磁碟載入，自動偵測編碼與行尾。 / Loads from disk, detecting encoding and line endings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path_ref = path.as_ref();
        let mut file = File::open(path_ref)?;
        let metadata = file.metadata()?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        let (text, encoding) = decode_bytes(&bytes)?;
        let line_ending = detect_line_ending(&text);

        Ok(Self {
            path: Some(path_ref.to_path_buf()),
            contents: normalize_newlines(&text),
            line_ending,
            encoding,
            is_dirty: false,
            disk_signature: Some(FileSignature::from_metadata(&metadata)),
        })
    }

    /// 儲存到既有路徑；未設定路徑時失敗。 / Saves to the current path; fails when none is set.
    pub fn save(&mut self) -> Result<(), DocumentError> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| io::Error::new(ErrorKind::Other, "document has no associated path"))?
            .to_path_buf();
        self.save_as(path)
    }

    /// 另存新路徑並更新快照。 / Saves to a new path and refreshes the disk snapshot.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path_ref = path.as_ref();
        let encoded = self.encode_contents()?;

        // 先寫入暫存檔再改名，避免留下寫到一半的檔案。 /
        // Temp file plus rename so a failed write never truncates the target.
        let tmp_path = path_ref.with_extension("tmp_novasuite");
        {
            let mut tmp_file = File::create(&tmp_path)?;
            tmp_file.write_all(&encoded)?;
            tmp_file.sync_all()?;
        }
        fs::rename(&tmp_path, path_ref)?;

        let metadata = fs::metadata(path_ref)?;
        self.path = Some(path_ref.to_path_buf());
        self.is_dirty = false;
        self.disk_signature = Some(FileSignature::from_metadata(&metadata));
        Ok(())
    }

    /// 目前內容（行尾為 `\n`）。 / Current contents with `\n` line endings.
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// 以新文字取代內容並標記為已修改。 / Replaces the contents and marks the document dirty.
    pub fn set_contents(&mut self, text: impl Into<String>) {
        self.contents = normalize_newlines(&text.into());
        self.is_dirty = true;
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn set_line_ending(&mut self, ending: LineEnding) {
        if self.line_ending != ending {
            self.line_ending = ending;
            self.is_dirty = true;
        }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        if self.encoding != encoding {
            self.encoding = encoding;
            self.is_dirty = true;
        }
    }

    /// 是否仍有未儲存變更。 / Whether unsaved changes exist.
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 更新路徑中繼資料；不影響 dirty 狀態。 / Updates the path metadata without touching dirty state.
    pub fn set_path(&mut self, path: Option<PathBuf>) {
        self.path = path;
        self.disk_signature = None;
    }

    /// 以磁碟內容覆蓋記憶體並重設 dirty。 / Reloads from disk, discarding in-memory changes.
    pub fn reload(&mut self) -> Result<(), DocumentError> {
        let Some(path) = self.path.clone() else {
            return Err(DocumentError::Io(io::Error::new(
                ErrorKind::Other,
                "document has no associated path",
            )));
        };
        *self = Document::open(path)?;
        Ok(())
    }

    /// 檢查磁碟上的檔案是否被外部修改。 / Checks whether the file changed behind our back.
    pub fn check_disk_state(&self) -> Result<DiskState, DocumentError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(DiskState::Unchanged);
        };

        match fs::metadata(path) {
            Ok(metadata) => {
                let signature = FileSignature::from_metadata(&metadata);
                if self
                    .disk_signature
                    .map_or(true, |stored| stored != signature)
                {
                    Ok(DiskState::Modified)
                } else {
                    Ok(DiskState::Unchanged)
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(DiskState::Removed),
            Err(err) => Err(DocumentError::Io(err)),
        }
    }

    fn encode_contents(&self) -> Result<Vec<u8>, DocumentError> {
        let text = self.contents.replace('\n', self.line_ending.as_str());
        let bytes = match self.encoding {
            TextEncoding::Utf8 => text.into_bytes(),
            TextEncoding::Utf8Bom => {
                let mut prefixed = Vec::with_capacity(3 + text.len());
                prefixed.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
                prefixed.extend_from_slice(text.as_bytes());
                prefixed
            }
            TextEncoding::Legacy(legacy) => {
                let (cow, _, had_errors) = legacy.to_rs().encode(&text);
                if had_errors {
                    return Err(DocumentError::Unrepresentable(legacy.name()));
                }
                match cow {
                    Cow::Borrowed(slice) => slice.to_vec(),
                    Cow::Owned(vec) => vec,
                }
            }
        };
        Ok(bytes)
    }
}

fn decode_bytes(bytes: &[u8]) -> Result<(String, TextEncoding), DocumentError> {
    if let Some(stripped) = bytes.strip_prefix(b"\xEF\xBB\xBF") {
        let text = std::str::from_utf8(stripped).map_err(|_| DocumentError::InvalidEncoding)?;
        return Ok((text.to_owned(), TextEncoding::Utf8Bom));
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok((text.to_owned(), TextEncoding::Utf8));
    }

    if let Some(legacy) = detect_legacy_encoding(bytes) {
        let (cow, had_errors) = legacy.to_rs().decode_without_bom_handling(bytes);
        if !had_errors {
            return Ok((cow.into_owned(), TextEncoding::Legacy(legacy)));
        }
    }

    Err(DocumentError::InvalidEncoding)
}

fn detect_legacy_encoding(bytes: &[u8]) -> Option<LegacyEncoding> {
    if bytes.is_empty() {
        return None;
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let guess = detector.guess(None, true);
    if guess == WINDOWS_1252 {
        Some(LegacyEncoding::Windows1252)
    } else if guess == SHIFT_JIS {
        Some(LegacyEncoding::ShiftJis)
    } else if guess == GBK {
        Some(LegacyEncoding::Gbk)
    } else if guess == BIG5 {
        Some(LegacyEncoding::Big5)
    } else {
        None
    }
}

/// 依第一個換行符號推斷行尾偏好。 / Infers the line ending preference from the first newline seen.
fn detect_line_ending(text: &str) -> LineEnding {
    let bytes = text.as_bytes();
    for (idx, byte) in bytes.iter().enumerate() {
        match byte {
            b'\r' => {
                if bytes.get(idx + 1) == Some(&b'\n') {
                    return LineEnding::CrLf;
                }
                return LineEnding::Cr;
            }
            b'\n' => return LineEnding::Lf,
            _ => {}
        }
    }
    LineEnding::Lf
}

fn normalize_newlines(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                result.push('\n');
            }
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::GBK;
    use std::fs;
    use std::thread;
    use std::time::Duration;

    fn seed(path: &Path, bytes: &[u8]) {
        fs::write(path, bytes).expect("failed to seed test file");
    }

    #[test]
    fn open_normalises_crlf_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        seed(&path, b"one\r\ntwo\r\n");

        let doc = Document::open(&path).unwrap();
        assert_eq!(doc.contents(), "one\ntwo\n");
        assert_eq!(doc.line_ending(), LineEnding::CrLf);
        assert_eq!(doc.encoding(), TextEncoding::Utf8);
        assert!(!doc.is_dirty());
    }

    #[test]
    fn open_strips_and_remembers_utf8_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bom.txt");
        seed(&path, b"\xEF\xBB\xBFhello\n");

        let doc = Document::open(&path).unwrap();
        assert_eq!(doc.contents(), "hello\n");
        assert_eq!(doc.encoding(), TextEncoding::Utf8Bom);
    }

    #[test]
    fn open_detects_gbk_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gbk.txt");
        let (encoded, _, _) = GBK.encode("中文測試");
        seed(&path, encoded.as_ref());

        let doc = Document::open(&path).unwrap();
        assert_eq!(doc.contents(), "中文測試");
        assert!(matches!(
            doc.encoding(),
            TextEncoding::Legacy(LegacyEncoding::Gbk)
        ));
    }

    #[test]
    fn save_restores_line_endings_and_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        let mut doc = Document::new();
        doc.set_contents("a\nb\n");
        doc.set_line_ending(LineEnding::CrLf);
        doc.set_encoding(TextEncoding::Utf8Bom);
        doc.save_as(&path).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], b"\xEF\xBB\xBF");
        assert_eq!(&bytes[3..], b"a\r\nb\r\n");
        assert!(!doc.is_dirty());
    }

    #[test]
    fn save_rejects_unrepresentable_characters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.txt");

        let mut doc = Document::new();
        doc.set_contents("漢");
        doc.set_encoding(TextEncoding::Legacy(LegacyEncoding::Windows1252));
        let err = doc.save_as(&path).unwrap_err();
        assert!(matches!(err, DocumentError::Unrepresentable("windows-1252")));
    }

    #[test]
    fn disk_state_tracks_external_modification_and_removal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watched.txt");
        seed(&path, b"alpha");

        let mut doc = Document::open(&path).unwrap();
        assert_eq!(doc.check_disk_state().unwrap(), DiskState::Unchanged);

        thread::sleep(Duration::from_millis(10));
        seed(&path, b"alpha-beta");
        assert_eq!(doc.check_disk_state().unwrap(), DiskState::Modified);

        doc.reload().unwrap();
        assert_eq!(doc.contents(), "alpha-beta");
        assert_eq!(doc.check_disk_state().unwrap(), DiskState::Unchanged);

        fs::remove_file(&path).unwrap();
        assert_eq!(doc.check_disk_state().unwrap(), DiskState::Removed);
    }
}
