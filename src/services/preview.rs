use crate::models::FileRef;

pub const NO_PREVIEW_TEXT: &str =
    "Preview tidak tersedia. Klik tombol di bawah untuk membuka dokumen lengkap di Google Drive.";

/// State of the document preview overlay: hidden, or showing one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePreview {
    subject: Option<FileRef>,
    visible: bool,
}

impl FilePreview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, file: FileRef) {
        self.subject = Some(file);
        self.visible = true;
    }

    pub fn close(&mut self) {
        self.visible = false;
        self.subject = None;
    }

    pub fn is_open(&self) -> bool {
        self.visible && self.subject.is_some()
    }

    pub fn subject(&self) -> Option<&FileRef> {
        self.subject.as_ref()
    }

    /// Clicks on the dimmed backdrop dismiss the overlay; clicks inside the
    /// content card do not. Returns whether the overlay closed.
    pub fn backdrop_clicked(&mut self, inside_content: bool) -> bool {
        if inside_content || !self.is_open() {
            return false;
        }
        self.close();
        true
    }

    pub fn preview_text(&self) -> Option<&str> {
        let file = self.subject.as_ref()?;
        Some(
            file.preview
                .as_deref()
                .filter(|p| !p.is_empty())
                .unwrap_or(NO_PREVIEW_TEXT),
        )
    }

    pub fn open_url(&self) -> Option<&str> {
        self.subject.as_ref().map(|f| f.gdrive_url.as_str())
    }

    /// Same link as [`Self::open_url`]; Drive picks the download itself.
    pub fn download_url(&self) -> Option<&str> {
        self.open_url()
    }
}
