//! Multipart form buffering

use std::collections::HashMap;

use axum::extract::{Multipart, multipart::MultipartError};

/// One uploaded file part
#[derive(Debug, Clone)]
pub struct FormFile {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FormFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// A multipart body read fully into memory: text fields by name, file parts in order
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: Vec<FormFile>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await?;
                    // browsers send an empty part for an untouched file input
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    form.files.push(FormFile {
                        field: name,
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
                None => {
                    let text = field.text().await?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    /// Trimmed text value; blank counts as missing
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Remove and return every file sent under `field`
    pub fn take_files(&mut self, field: &str) -> Vec<FormFile> {
        let (taken, kept) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|f| f.field == field);
        self.files = kept;
        taken
    }

    #[cfg(test)]
    pub(crate) fn from_parts(fields: &[(&str, &str)], files: Vec<FormFile>) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(field: &str, name: &str) -> FormFile {
        FormFile {
            field: field.to_string(),
            file_name: name.to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_text_blank_is_missing() {
        let form = FormData::from_parts(&[("projectName", "  Capstone "), ("courseId", " ")], vec![]);
        assert_eq!(form.text("projectName"), Some("Capstone"));
        assert_eq!(form.text("courseId"), None);
        assert_eq!(form.text("absent"), None);
    }

    #[test]
    fn test_take_files_by_field() {
        let mut form = FormData::from_parts(
            &[],
            vec![file("images", "a.png"), file("otherDocuments", "b.pdf"), file("images", "c.gif")],
        );

        let images = form.take_files("images");
        assert_eq!(images.len(), 2);
        assert_eq!(images[1].file_name, "c.gif");
        assert_eq!(images[0].size(), 3);

        assert!(form.take_files("images").is_empty());
        assert_eq!(form.take_files("otherDocuments").len(), 1);
    }
}
