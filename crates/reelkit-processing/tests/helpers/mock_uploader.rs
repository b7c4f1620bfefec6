//! Upload collaborator double.

use async_trait::async_trait;
use reelkit_core::models::MediaFile;
use reelkit_processing::submit::{UploadError, Uploader};
use std::sync::Mutex;

/// Records uploaded files; optionally fails from the `fail_at`-th upload on.
#[derive(Default)]
pub struct MockUploader {
    pub uploaded: Mutex<Vec<MediaFile>>,
    fail_at: Option<(usize, u16, String)>,
}

impl MockUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(index: usize, status: u16, body: &str) -> Self {
        Self {
            uploaded: Mutex::new(Vec::new()),
            fail_at: Some((index, status, body.to_string())),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.uploaded
            .lock()
            .unwrap()
            .iter()
            .map(|f| f.file_name.clone())
            .collect()
    }
}

#[async_trait]
impl Uploader for MockUploader {
    async fn upload(&self, file: &MediaFile) -> Result<String, UploadError> {
        let mut uploaded = self.uploaded.lock().unwrap();
        if let Some((index, status, body)) = &self.fail_at {
            if uploaded.len() >= *index {
                return Err(UploadError::Http {
                    status: *status,
                    body: body.clone(),
                });
            }
        }
        uploaded.push(file.clone());
        Ok(format!("https://cdn.test/{}", file.file_name))
    }
}
