use serde::{Deserialize, Serialize};

use super::IntakeError;

/// Media types the parsing service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrescriptionFormat {
    Pdf,
    Jpeg,
    Png,
}

impl PrescriptionFormat {
    /// Match a declared MIME type against the allow-list.
    ///
    /// Case-insensitive; parameters such as `; charset=` are ignored.
    /// `image/jpg` is accepted as a JPEG alias since browsers emit it.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" => Some(Self::Pdf),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Detect the format from magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            // %PDF
            [0x25, 0x50, 0x44, 0x46, ..] => Some(Self::Pdf),
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// A single file submitted by the user. Consumed by one intake run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    /// MIME type as declared by the client, not verified against content.
    pub media_type: String,
    pub file_name: Option<String>,
}

impl UploadRequest {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            file_name: None,
        }
    }

    /// Build a request whose media type is guessed from the file extension.
    /// Unknown extensions yield `application/octet-stream`, which fails validation.
    pub fn from_file_name(bytes: Vec<u8>, file_name: &str) -> Self {
        let media_type = mime_guess::from_path(file_name)
            .first_raw()
            .unwrap_or("application/octet-stream");
        Self::new(bytes, media_type).with_file_name(file_name)
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File name sent to the parser; synthesized from the format when absent.
    pub fn upload_name(&self, format: PrescriptionFormat) -> String {
        match &self.file_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => match format {
                PrescriptionFormat::Pdf => "prescription.pdf".into(),
                PrescriptionFormat::Jpeg => "prescription.jpg".into(),
                PrescriptionFormat::Png => "prescription.png".into(),
            },
        }
    }

    /// Check the declared media type against the allow-list.
    pub fn validate(&self) -> Result<PrescriptionFormat, IntakeError> {
        PrescriptionFormat::from_media_type(&self.media_type).ok_or_else(|| {
            IntakeError::InvalidFileType {
                declared: self.media_type.clone(),
            }
        })
    }
}
