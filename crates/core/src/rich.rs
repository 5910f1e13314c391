use std::ops::Range;

use crate::metrics::line_bounds;

/// 可附加在文字範圍上的樣式屬性。 / Inline attribute attachable to a text range.
///
/// Each colour value is its own attribute, so applying a second colour
/// stacks a new span instead of replacing the first; the most recent
/// covering span wins at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attr {
    Bold,
    Italic,
    Underline,
    /// 前景色，格式為 `#RRGGBB`。 / Foreground colour as `#RRGGBB`.
    Color(String),
}

/// 一段帶屬性的位元組範圍（start <= end）。 / An attributed byte range (start <= end).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub attr: Attr,
}

/// 段落對齊方式。 / Paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// 涵蓋整行的對齊範圍。 / Alignment range covering whole lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignSpan {
    pub start: usize,
    pub end: usize,
    pub align: Alignment,
}

/// 單一渲染區段的合成樣式。 / Flattened style for one render segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<String>,
}

/// 文字緩衝加上樣式範圍，取代工具箱內建的文字標籤機制。 /
/// Text buffer plus style spans, standing in for a toolkit's built-in text tags.
///
/// Offsets are byte offsets into `text` and always sit on char
/// boundaries; `reconcile` keeps the spans in step when an editor widget
/// rewrites the string underneath the model.
#[derive(Debug, Clone, Default)]
pub struct StyledText {
    text: String,
    spans: Vec<Span>,
    aligns: Vec<AlignSpan>,
}

impl StyledText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
            aligns: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn aligns(&self) -> &[AlignSpan] {
        &self.aligns
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// 以全新文字取代並清除所有樣式。 / Replaces the text wholesale, dropping all styling.
    pub fn replace_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.spans.clear();
        self.aligns.clear();
    }

    /// 指定位置是否帶有該屬性。 / Whether the attribute is active at the given position.
    pub fn has_attr_at(&self, pos: usize, attr: &Attr) -> bool {
        self.spans
            .iter()
            .any(|span| span.attr == *attr && span.start <= pos && pos < span.end)
    }

    /// 工具箱標籤的切換語意：檢查選取起點決定加或減。 /
    /// Toolkit tag toggle semantics: inspect the selection start to decide add vs remove.
    /// Returns `true` when the attribute is applied afterwards.
    pub fn toggle(&mut self, range: Range<usize>, attr: Attr) -> bool {
        if range.start >= range.end {
            return self.has_attr_at(range.start, &attr);
        }
        if self.has_attr_at(range.start, &attr) {
            self.remove(range, &attr);
            false
        } else {
            self.apply(range, attr);
            true
        }
    }

    /// 在範圍上加上屬性。 / Applies the attribute over the range.
    pub fn apply(&mut self, range: Range<usize>, attr: Attr) {
        let range = self.clamp(range);
        if range.start >= range.end {
            return;
        }
        self.spans.push(Span {
            start: range.start,
            end: range.end,
            attr,
        });
        self.coalesce();
    }

    /// 自範圍移除屬性，必要時切割既有範圍。 / Removes the attribute, splitting spans as needed.
    pub fn remove(&mut self, range: Range<usize>, attr: &Attr) {
        let range = self.clamp(range);
        if range.start >= range.end {
            return;
        }
        let mut kept = Vec::with_capacity(self.spans.len());
        for span in self.spans.drain(..) {
            if span.attr != *attr || span.end <= range.start || span.start >= range.end {
                kept.push(span);
                continue;
            }
            if span.start < range.start {
                kept.push(Span {
                    start: span.start,
                    end: range.start,
                    attr: span.attr.clone(),
                });
            }
            if span.end > range.end {
                kept.push(Span {
                    start: range.end,
                    end: span.end,
                    attr: span.attr,
                });
            }
        }
        self.spans = kept;
    }

    /// 設定選取所涵蓋行的對齊，後設定者覆蓋先前者。 /
    /// Sets alignment for the lines covered by the selection; later settings win.
    pub fn set_alignment(&mut self, range: Range<usize>, align: Alignment) {
        let clamped = self.clamp(range);
        if clamped.start >= clamped.end {
            return;
        }
        let range = line_bounds(&self.text, clamped);
        if range.start >= range.end {
            return;
        }
        let mut kept = Vec::with_capacity(self.aligns.len() + 1);
        for existing in self.aligns.drain(..) {
            if existing.end <= range.start || existing.start >= range.end {
                kept.push(existing);
                continue;
            }
            if existing.start < range.start {
                kept.push(AlignSpan {
                    start: existing.start,
                    end: range.start,
                    align: existing.align,
                });
            }
            if existing.end > range.end {
                kept.push(AlignSpan {
                    start: range.end,
                    end: existing.end,
                    align: existing.align,
                });
            }
        }
        kept.push(AlignSpan {
            start: range.start,
            end: range.end,
            align,
        });
        kept.sort_by_key(|span| span.start);
        self.aligns = kept;
    }

    /// 取得位置所屬的對齊（預設為靠左）。 / Alignment covering the position, if any.
    pub fn alignment_at(&self, pos: usize) -> Option<Alignment> {
        self.aligns
            .iter()
            .find(|span| span.start <= pos && pos < span.end)
            .map(|span| span.align)
    }

    /// 依樣式邊界切割文字，供版面配置使用。 /
    /// Splits the text at style boundaries for layout consumption.
    pub fn segments(&self) -> Vec<(Range<usize>, SegmentStyle)> {
        let len = self.text.len();
        if len == 0 {
            return Vec::new();
        }
        let mut cuts = vec![0, len];
        for span in &self.spans {
            cuts.push(span.start.min(len));
            cuts.push(span.end.min(len));
        }
        cuts.sort_unstable();
        cuts.dedup();

        let mut segments = Vec::with_capacity(cuts.len().saturating_sub(1));
        for pair in cuts.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            if start >= end {
                continue;
            }
            let mut style = SegmentStyle::default();
            for span in &self.spans {
                if span.start <= start && end <= span.end {
                    match &span.attr {
                        Attr::Bold => style.bold = true,
                        Attr::Italic => style.italic = true,
                        Attr::Underline => style.underline = true,
                        // 後加入的顏色優先。 / Later colours take priority.
                        Attr::Color(value) => style.color = Some(value.clone()),
                    }
                }
            }
            segments.push((start..end, style));
        }
        segments
    }

    /// 比對新文字並平移樣式範圍。 / Diffs against the new text and shifts spans to match.
    pub fn reconcile(&mut self, new_text: &str) {
        if self.text == new_text {
            return;
        }
        let (start, removed, inserted) = diff_bounds(&self.text, new_text);
        self.shift(start, removed, inserted);
        self.text = new_text.to_owned();
        self.coalesce();
    }

    fn shift(&mut self, start: usize, removed: usize, inserted: usize) {
        let removed_end = start + removed;
        // 範圍起點偏右、終點偏左：在邊界輸入的文字不繼承樣式。 /
        // Starts bias right and ends bias left so text typed at a boundary
        // does not inherit the span's styling.
        let map_start = |pos: usize| -> usize {
            if pos < start {
                pos
            } else if pos >= removed_end {
                pos - removed + inserted
            } else {
                start
            }
        };
        let map_end = |pos: usize| -> usize {
            if pos <= start {
                pos
            } else if pos >= removed_end {
                pos - removed + inserted
            } else {
                start
            }
        };
        for span in &mut self.spans {
            span.start = map_start(span.start);
            span.end = map_end(span.end);
        }
        for span in &mut self.aligns {
            span.start = map_start(span.start);
            span.end = map_end(span.end);
        }
        self.spans.retain(|span| span.start < span.end);
        self.aligns.retain(|span| span.start < span.end);
    }

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let len = self.text.len();
        let start = range.start.min(len);
        let end = range.end.min(len);
        start..end.max(start)
    }

    /// 合併相鄰且屬性相同的範圍，維持插入順序。 /
    /// Merges touching spans with equal attributes while preserving insertion order.
    fn coalesce(&mut self) {
        let mut merged: Vec<Span> = Vec::with_capacity(self.spans.len());
        for span in self.spans.drain(..) {
            if span.start >= span.end {
                continue;
            }
            if let Some(existing) = merged
                .iter_mut()
                .find(|other| other.attr == span.attr && span.start <= other.end && other.start <= span.end)
            {
                existing.start = existing.start.min(span.start);
                existing.end = existing.end.max(span.end);
            } else {
                merged.push(span);
            }
        }
        self.spans = merged;
    }
}

fn diff_bounds(old: &str, new: &str) -> (usize, usize, usize) {
    let mut prefix = 0;
    for (a, b) in old.chars().zip(new.chars()) {
        if a != b {
            break;
        }
        prefix += a.len_utf8();
    }

    let old_rest = &old[prefix..];
    let new_rest = &new[prefix..];
    let mut suffix = 0;
    for (a, b) in old_rest.chars().rev().zip(new_rest.chars().rev()) {
        if a != b {
            break;
        }
        suffix += a.len_utf8();
    }

    let removed = old_rest.len() - suffix;
    let inserted = new_rest.len() - suffix;
    (prefix, removed, inserted)
}
