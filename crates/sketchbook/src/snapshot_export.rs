//! PNG export of the live waveform canvas.

use crate::{AppError, AppResult};

use sketchbook_core::PixelCanvas;

use std::{panic::Location, path::Path};

use error_location::ErrorLocation;
use image::{ImageFormat, RgbaImage};
use tracing::{info, instrument};

/// Write `canvas` to `path` as a PNG at device-pixel resolution.
///
/// # Errors
///
/// `SnapshotError` when the image cannot be built or written.
#[track_caller]
#[instrument(skip(canvas))]
pub(crate) fn export_png(canvas: &PixelCanvas, path: &Path) -> AppResult<()> {
    let (width, height) = (canvas.width(), canvas.height());

    let image = RgbaImage::from_raw(width, height, canvas.to_rgba_bytes()).ok_or_else(|| {
        AppError::SnapshotError {
            reason: format!("Canvas buffer does not match {}x{}", width, height),
            location: ErrorLocation::from(Location::caller()),
        }
    })?;

    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| AppError::SnapshotError {
            reason: format!("Failed to write {}: {}", path.display(), e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!(
        path = %path.display(),
        width = width,
        height = height,
        painted = canvas.painted_pixels(),
        "Waveform snapshot written"
    );

    Ok(())
}
