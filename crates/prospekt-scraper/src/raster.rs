//! PDF-to-JPEG rasterization for document-delivered flyers.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::RasterError;
use crate::manifest::DownloadManifest;

/// Render resolution: twice the 72 dpi PDF user-space unit.
pub const RASTER_DPI: u32 = 144;

const SCRATCH_PREFIX: &str = "raster";

/// Renders every page of a downloaded document into `out_dir` as
/// `page_01.jpg, page_02.jpg, …` and returns the resulting manifest.
#[async_trait]
pub trait DocumentRasterizer: Send + Sync {
    async fn rasterize(
        &self,
        document: &Path,
        out_dir: &Path,
    ) -> Result<DownloadManifest, RasterError>;
}

/// Rasterizer backed by poppler's `pdftoppm`.
///
/// Pages are rendered into a scratch directory inside `out_dir` that is
/// removed on every exit path, then moved into place in page order.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    binary: String,
    dpi: u32,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl PdftoppmRasterizer {
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            dpi: RASTER_DPI,
        }
    }
}

#[async_trait]
impl DocumentRasterizer for PdftoppmRasterizer {
    async fn rasterize(
        &self,
        document: &Path,
        out_dir: &Path,
    ) -> Result<DownloadManifest, RasterError> {
        let scratch = tempfile::Builder::new()
            .prefix(".raster-")
            .tempdir_in(out_dir)?;
        let prefix = scratch.path().join(SCRATCH_PREFIX);

        tracing::info!(
            document = %document.display(),
            dpi = self.dpi,
            "rasterizing document"
        );
        let output = tokio::process::Command::new(&self.binary)
            .arg("-jpeg")
            .arg("-jpegopt")
            .arg("quality=90")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(document)
            .arg(&prefix)
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RasterError::BinaryNotFound {
                    binary: self.binary.clone(),
                });
            }
            Err(e) => return Err(RasterError::Io(e)),
        };
        if !output.status.success() {
            return Err(RasterError::ProcessFailed {
                binary: self.binary.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        let rendered = collect_rendered_pages(scratch.path()).await?;
        if rendered.is_empty() {
            return Err(RasterError::NoPages {
                path: document.display().to_string(),
            });
        }
        place_pages(&rendered, out_dir).await
    }
}

/// Rendered page files in `dir`, ordered by page number.
///
/// `pdftoppm` names its output `raster-1.jpg` … or `raster-01.jpg` …
/// depending on the page count, so ordering is numeric, not lexical.
async fn collect_rendered_pages(dir: &Path) -> Result<Vec<PathBuf>, RasterError> {
    let mut numbered: Vec<(u32, PathBuf)> = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(number) = name.to_str().and_then(rendered_page_number) else {
            continue;
        };
        numbered.push((number, entry.path()));
    }
    numbered.sort_by_key(|(n, _)| *n);
    Ok(numbered.into_iter().map(|(_, p)| p).collect())
}

fn rendered_page_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(SCRATCH_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(".jpg")?
        .parse()
        .ok()
}

async fn place_pages(rendered: &[PathBuf], out_dir: &Path) -> Result<DownloadManifest, RasterError> {
    let mut manifest = DownloadManifest::new();
    for page in rendered {
        tokio::fs::rename(page, out_dir.join(manifest.next_file_name())).await?;
        manifest.commit_next();
    }
    Ok(manifest)
}
