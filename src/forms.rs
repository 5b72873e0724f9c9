//! Form body decoding
//!
//! Case and report submissions arrive as `multipart/form-data` (when a file
//! is attached) or `application/x-www-form-urlencoded`. Both decode into a
//! [`FormData`] of text fields plus any uploaded files.

use std::collections::HashMap;

use bytes::Bytes;
use futures_util::stream;
use tracing::debug;

use crate::types::HrmError;

/// A file part from a multipart body
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    /// A part with no filename or no bytes is an empty file input
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.filename.as_deref().map_or(true, |n| n.trim().is_empty())
    }
}

/// Decoded form fields
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: Vec<(String, UploadedFile)>,
}

impl FormData {
    /// Decode a request body according to its `Content-Type`
    pub async fn parse(content_type: Option<&str>, body: Bytes) -> Result<Self, HrmError> {
        let content_type = content_type.unwrap_or_default();
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "multipart/form-data" => Self::parse_multipart(content_type, body).await,
            "application/x-www-form-urlencoded" | "" => Self::parse_urlencoded(&body),
            other => Err(HrmError::BadRequest(format!(
                "Unsupported content type '{}', expected a form submission",
                other
            ))),
        }
    }

    fn parse_urlencoded(body: &[u8]) -> Result<Self, HrmError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|e| HrmError::BadRequest(format!("Invalid form body: {}", e)))?;

        let mut form = Self::default();
        for (name, value) in pairs {
            form.fields.insert(name, value);
        }
        Ok(form)
    }

    async fn parse_multipart(content_type: &str, body: Bytes) -> Result<Self, HrmError> {
        let boundary = multer::parse_boundary(content_type)?;
        let body = stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
        let mut multipart = multer::Multipart::new(body, boundary);

        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(|m| m.to_string());

            if filename.is_some() {
                let data = field.bytes().await?;
                debug!(field = %name, size = data.len(), "Received file part");
                form.files.push((
                    name,
                    UploadedFile {
                        filename,
                        content_type,
                        data,
                    },
                ));
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    /// Trimmed value of a text field; blank counts as absent
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn owned(&self, name: &str) -> Option<String> {
        self.text(name).map(str::to_string)
    }

    pub fn required(&self, name: &str) -> Result<&str, HrmError> {
        self.text(name)
            .ok_or_else(|| HrmError::BadRequest(format!("Missing required field: {}", name)))
    }

    /// Boolean checkbox-style field; absent means false
    pub fn flag(&self, name: &str) -> Result<bool, HrmError> {
        match self.text(name).map(str::to_ascii_lowercase).as_deref() {
            None | Some("false") | Some("0") | Some("off") | Some("no") => Ok(false),
            Some("true") | Some("1") | Some("on") | Some("yes") => Ok(true),
            Some(other) => Err(HrmError::BadRequest(format!(
                "Invalid boolean for {}: '{}'",
                name, other
            ))),
        }
    }

    /// Boolean field that must be present
    pub fn required_flag(&self, name: &str) -> Result<bool, HrmError> {
        self.required(name)?;
        self.flag(name)
    }

    /// Decimal field
    pub fn number(&self, name: &str) -> Result<f64, HrmError> {
        let raw = self.required(name)?;
        raw.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| HrmError::BadRequest(format!("Invalid number for {}: '{}'", name, raw)))
    }

    /// The single non-empty file under `name`, if any
    pub fn file(&self, name: &str) -> Result<Option<&UploadedFile>, HrmError> {
        let mut files = self
            .files
            .iter()
            .filter(|(field, file)| field == name && !file.is_empty())
            .map(|(_, file)| file);

        let first = files.next();
        if files.next().is_some() {
            return Err(HrmError::BadRequest(format!(
                "At most one file may be attached as '{}'",
                name
            )));
        }
        Ok(first)
    }
}
