use novasuite_core::StyledText;

/// 筆記本中的一個分頁。 / One tabbed page of a notebook.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub title: String,
    pub body: StyledText,
}

impl Page {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: StyledText::new(),
        }
    }

    pub fn with_content(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: StyledText::from_text(content),
        }
    }
}

/// 分頁集合加上目前選取的分頁。 / The collection of pages plus the active tab.
///
/// Serialisation only ever captures titles and plain content; styling
/// lives on the in-memory pages and does not survive a save, matching
/// the original applet.
#[derive(Debug, Clone, Default)]
pub struct Notebook {
    pages: Vec<Page>,
    active: usize,
}

impl Notebook {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新增分頁並設為使用中；未命名時自動編號。 /
    /// Appends a page and makes it active; untitled pages are numbered.
    pub fn add_page(&mut self, title: Option<String>) -> usize {
        let title = match title {
            Some(title) if !title.trim().is_empty() => title,
            _ => format!("Page {}", self.pages.len() + 1),
        };
        self.pages.push(Page::new(title));
        self.active = self.pages.len() - 1;
        self.active
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn set_active(&mut self, index: usize) {
        if index < self.pages.len() {
            self.active = index;
        }
    }

    pub fn active_page(&self) -> Option<&Page> {
        self.pages.get(self.active)
    }

    pub fn active_page_mut(&mut self) -> Option<&mut Page> {
        self.pages.get_mut(self.active)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// 載入時以新的分頁集合取代全部內容。 /
    /// Replaces every page, as a load does; the first page becomes active.
    pub fn replace_pages(&mut self, pages: Vec<Page>) {
        self.pages = pages;
        self.active = 0;
    }
}
