use std::path::Path;

use serde::{Deserialize, Serialize};

/// Broad file categories we handle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    PlainText,
    Csv,
    Json,
    Pdf,
    Docx,
    Xlsx,
    Image,
    Unknown,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "plain_text",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Image => "image",
            Self::Unknown => "unknown",
        }
    }

    /// Formats whose payload is binary and needs a dedicated parser.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Pdf | Self::Docx | Self::Xlsx | Self::Image)
    }
}

/// Detect the format of an incoming payload. Extension first, then magic
/// bytes — senders routinely mislabel attachments, so the magic check can
/// override an extension that claims plain text.
pub fn detect_format(filename: &str, bytes: &[u8]) -> DocumentFormat {
    let by_magic = detect_by_magic(bytes);
    if by_magic != DocumentFormat::Unknown {
        return by_magic;
    }
    detect_by_extension(filename)
}

fn detect_by_extension(filename: &str) -> DocumentFormat {
    let ext = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "txt" | "md" | "log" | "text" => DocumentFormat::PlainText,
        "csv" | "tsv" => DocumentFormat::Csv,
        "json" => DocumentFormat::Json,
        "pdf" => DocumentFormat::Pdf,
        "doc" | "docx" => DocumentFormat::Docx,
        "xls" | "xlsx" => DocumentFormat::Xlsx,
        "png" | "jpg" | "jpeg" | "tiff" | "bmp" | "webp" => DocumentFormat::Image,
        _ => DocumentFormat::Unknown,
    }
}

fn detect_by_magic(bytes: &[u8]) -> DocumentFormat {
    match bytes {
        [0x25, 0x50, 0x44, 0x46, ..] => DocumentFormat::Pdf, // %PDF
        [0x89, 0x50, 0x4E, 0x47, ..] => DocumentFormat::Image, // PNG
        [0xFF, 0xD8, 0xFF, ..] => DocumentFormat::Image,     // JPEG
        [0x47, 0x49, 0x46, 0x38, ..] => DocumentFormat::Image, // GIF
        // ZIP container: docx and xlsx both start with PK. Distinguishing
        // them needs the central directory, so fall back to the extension.
        _ => DocumentFormat::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_detection() {
        assert_eq!(detect_format("notes.txt", b"hello"), DocumentFormat::PlainText);
        assert_eq!(detect_format("budget.CSV", b"a,b"), DocumentFormat::Csv);
        assert_eq!(detect_format("deck.docx", b"PK..."), DocumentFormat::Docx);
        assert_eq!(detect_format("sheet.xlsx", b"PK..."), DocumentFormat::Xlsx);
        assert_eq!(detect_format("no_extension", b"hello"), DocumentFormat::Unknown);
    }

    #[test]
    fn magic_overrides_misleading_extension() {
        // A PDF renamed to .txt is still a PDF
        assert_eq!(
            detect_format("report.txt", b"%PDF-1.7 rest"),
            DocumentFormat::Pdf
        );
        assert_eq!(
            detect_format("photo.txt", &[0xFF, 0xD8, 0xFF, 0xE0]),
            DocumentFormat::Image
        );
    }

    #[test]
    fn binary_classification() {
        assert!(DocumentFormat::Pdf.is_binary());
        assert!(DocumentFormat::Image.is_binary());
        assert!(!DocumentFormat::Csv.is_binary());
        assert!(!DocumentFormat::PlainText.is_binary());
    }
}
