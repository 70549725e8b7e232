//! Viewport state and screenshot capture for the reference editor host.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub location: [f64; 3],
    /// Pitch, yaw, roll in degrees.
    pub rotation: [f64; 3],
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            location: [0.0, 0.0, 500.0],
            rotation: [0.0; 3],
        }
    }
}

impl Viewport {
    /// Frame a target point: back the camera off along -X by `distance`.
    pub fn focus(&mut self, target: [f64; 3], distance: f64) {
        self.location = [target[0] - distance, target[1], target[2]];
    }

    pub fn set_rotation(&mut self, rotation: [f64; 3]) {
        self.rotation = rotation;
    }

    /// Capture the viewport to `filepath`, appending `.png` when missing.
    ///
    /// The reference host has no renderer, so the capture is a deterministic
    /// gradient tinted by the view location. Returns the path written.
    pub fn screenshot(&self, filepath: &str) -> Result<PathBuf, String> {
        let path = PathBuf::from(ensure_png_extension(filepath));
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create screenshot directory: {e}"))?;
            }
        }

        let (width, height) = (320u32, 180u32);
        let tint = |axis: f64| (axis.abs() % 256.0) as u8;
        let base = [tint(self.location[0]), tint(self.location[1]), tint(self.location[2])];
        let mut img = image::RgbaImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let fx = (x * 255 / width.max(1)) as u8;
            let fy = (y * 255 / height.max(1)) as u8;
            *pixel = image::Rgba([
                base[0].wrapping_add(fx),
                base[1].wrapping_add(fy),
                base[2],
                255,
            ]);
        }
        img.save(&path)
            .map_err(|e| format!("Failed to take screenshot: {e}"))?;
        Ok(path)
    }
}

/// `.png` is appended exactly once, matching the original capture command.
pub fn ensure_png_extension(filepath: &str) -> String {
    if Path::new(filepath).extension().and_then(|e| e.to_str()) == Some("png") {
        filepath.to_string()
    } else {
        format!("{filepath}.png")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_backs_off_along_negative_x() {
        let mut vp = Viewport::default();
        vp.focus([100.0, 20.0, 30.0], 1000.0);
        assert_eq!(vp.location, [-900.0, 20.0, 30.0]);
    }

    #[test]
    fn screenshot_appends_png_and_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let vp = Viewport::default();

        let raw = dir.path().join("shot").to_string_lossy().to_string();
        let written = vp.screenshot(&raw).unwrap();
        assert_eq!(written.extension().unwrap(), "png");
        assert!(written.is_file());

        let explicit = dir.path().join("shot2.png").to_string_lossy().to_string();
        let written = vp.screenshot(&explicit).unwrap();
        assert!(written.to_string_lossy().ends_with("shot2.png"));
    }

    #[test]
    fn ensure_png_is_idempotent() {
        assert_eq!(ensure_png_extension("a/b.png"), "a/b.png");
        assert_eq!(ensure_png_extension("a/b"), "a/b.png");
    }
}
