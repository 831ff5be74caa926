//! Attachment model and file classification helpers.

use serde::{Deserialize, Serialize};

use super::{deserialize_id, deserialize_opt_id};

/// A file attached to a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, alias = "attachmentName", alias = "fileName")]
    pub name: String,
    #[serde(
        default,
        rename = "type",
        alias = "contentType",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<String>,
    #[serde(default, alias = "fileSize", skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(
        default,
        alias = "projectTaskId",
        deserialize_with = "deserialize_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_id: Option<String>,
}

impl Attachment {
    pub fn kind(&self) -> FileKind {
        FileKind::classify(self.content_type.as_deref().unwrap_or(""), &self.name)
    }

    /// Name to save a downloaded copy under.
    pub fn download_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            "attachment"
        } else {
            name
        }
    }
}

/// Coarse file category, used to pick an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Video,
    Audio,
    Pdf,
    Spreadsheet,
    Presentation,
    Document,
    Other,
}

impl FileKind {
    /// Classify by MIME type first, then by file extension.
    pub fn classify(content_type: &str, name: &str) -> Self {
        let mime = content_type.to_ascii_lowercase();
        if mime.starts_with("image/") {
            return FileKind::Image;
        }
        if mime.starts_with("video/") {
            return FileKind::Video;
        }
        if mime.starts_with("audio/") {
            return FileKind::Audio;
        }
        if mime == "application/pdf" {
            return FileKind::Pdf;
        }
        if mime.contains("spreadsheet") || mime.contains("excel") {
            return FileKind::Spreadsheet;
        }
        if mime.contains("presentation") || mime.contains("powerpoint") {
            return FileKind::Presentation;
        }
        if mime.contains("word") || mime.contains("document") {
            return FileKind::Document;
        }

        let name = name.to_ascii_lowercase();
        let ext = name.rsplit('.').next().unwrap_or("");
        match ext {
            "png" | "jpg" | "jpeg" | "gif" | "svg" => FileKind::Image,
            "mp4" | "mov" | "avi" => FileKind::Video,
            "mp3" | "wav" => FileKind::Audio,
            "pdf" => FileKind::Pdf,
            "xlsx" | "xls" => FileKind::Spreadsheet,
            "ppt" | "pptx" => FileKind::Presentation,
            "doc" | "docx" | "txt" => FileKind::Document,
            _ => FileKind::Other,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            FileKind::Image => "🖼️",
            FileKind::Video => "🎥",
            FileKind::Audio => "🎵",
            FileKind::Pdf => "📄",
            FileKind::Spreadsheet => "📊",
            FileKind::Presentation => "📈",
            FileKind::Document => "📝",
            FileKind::Other => "📎",
        }
    }
}

/// Human readable size in powers of 1024, at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_prefers_mime_type() {
        assert_eq!(FileKind::classify("image/png", "notes.txt"), FileKind::Image);
        assert_eq!(FileKind::classify("application/pdf", "x"), FileKind::Pdf);
        assert_eq!(
            FileKind::classify(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "x"
            ),
            FileKind::Spreadsheet
        );
        assert_eq!(
            FileKind::classify("application/msword", "x"),
            FileKind::Document
        );
    }

    #[test]
    fn test_classify_falls_back_to_extension() {
        assert_eq!(FileKind::classify("", "Holiday.JPEG"), FileKind::Image);
        assert_eq!(FileKind::classify("", "deck.pptx"), FileKind::Presentation);
        assert_eq!(FileKind::classify("application/octet-stream", "a.mov"), FileKind::Video);
        assert_eq!(FileKind::classify("", "archive.zip"), FileKind::Other);
        assert_eq!(FileKind::classify("", "README"), FileKind::Other);
        assert_eq!(FileKind::Other.icon(), "📎");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024 + 1), "3 GB");
    }

    #[test]
    fn test_attachment_decoding() {
        let a: Attachment = serde_json::from_str(
            r#"{"id": 5, "attachmentName": "spec.pdf", "contentType": "application/pdf", "size": 2048, "projectTaskId": 9}"#,
        )
        .unwrap();
        assert_eq!(a.name, "spec.pdf");
        assert_eq!(a.task_id.as_deref(), Some("9"));
        assert_eq!(a.kind(), FileKind::Pdf);
        assert_eq!(a.download_name(), "spec.pdf");
    }
}
