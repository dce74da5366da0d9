//! # cb-storage-local
//!
//! Local filesystem implementation of `MediaStore`.
//! Uploads are decoded, bounded to a maximum edge length, re-encoded as JPEG
//! and written under a sharded directory tree.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use async_trait::async_trait;
use cb_core::traits::MediaStore;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use log::debug;
use tokio::fs;
use uuid::Uuid;

const JPEG_QUALITY: u8 = 85;
const EXTENSION: &str = "jpg";

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/uploads")
    url_prefix: String,
    /// Longest allowed edge in pixels; larger images are downscaled
    max_dimension: u32,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, url_prefix: String, max_dimension: u32) -> Self {
        Self {
            root_path: root,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
            max_dimension: max_dimension.max(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Generates a sharded path: "ab/cd/abcd...jpg"
    fn get_sharded_path(&self, reference: &str) -> PathBuf {
        let mut path = self.root_path.clone();
        path.push(&reference[0..2]);
        path.push(&reference[2..4]);
        path.push(reference);
        path
    }
}

/// References are `<32 hex chars>.jpg`; anything else never touches the disk.
fn check_reference(reference: &str) -> anyhow::Result<()> {
    let valid = reference
        .strip_suffix(EXTENSION)
        .and_then(|stem| stem.strip_suffix('.'))
        .is_some_and(|stem| stem.len() == 32 && stem.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        bail!("invalid media reference {reference:?}");
    }
    Ok(())
}

/// Decodes, downsizes and re-encodes an upload. CPU bound.
fn normalize(data: &[u8], max_dimension: u32) -> anyhow::Result<Vec<u8>> {
    let img = image::load_from_memory(data).context("unsupported or corrupt image")?;
    let img = if img.width() > max_dimension || img.height() > max_dimension {
        img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        img
    };

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))
        .context("failed to encode image")?;
    Ok(out.into_inner())
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, data: Vec<u8>, original_name: &str) -> anyhow::Result<String> {
        if data.is_empty() {
            bail!("empty upload {original_name:?}");
        }

        // 1. Normalize off the async workers
        let max_dimension = self.max_dimension;
        let encoded = tokio::task::spawn_blocking(move || normalize(&data, max_dimension))
            .await
            .context("image worker panicked")??;

        // 2. Pick a unique name
        let reference = format!("{}.{EXTENSION}", Uuid::new_v4().simple());
        let target_path = self.get_sharded_path(&reference);

        // 3. Ensure directory exists and write
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target_path, &encoded)
            .await
            .with_context(|| format!("failed to write {}", target_path.display()))?;

        debug!("Stored {original_name:?} as {reference} ({} bytes)", encoded.len());
        Ok(reference)
    }

    async fn remove(&self, reference: &str) -> anyhow::Result<()> {
        check_reference(reference)?;
        let path = self.get_sharded_path(reference);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} was already gone", path.display());
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
        }
    }

    fn public_url(&self, reference: &str) -> String {
        if check_reference(reference).is_err() {
            return format!("{}/{}", self.url_prefix, reference);
        }
        let rel_path = format!("{}/{}/{}", &reference[0..2], &reference[2..4], reference);
        format!("{}/{}", self.url_prefix, rel_path)
    }
}
