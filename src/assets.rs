//! Room images and model file checks done once at startup.
//!
//! A missing or undecodable ON/OFF image is fatal, as is a missing model
//! file when the configured backend needs one.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use image::RgbImage;

/// Where the room images live and how large they are displayed.
#[derive(Clone, Debug)]
pub struct AssetSettings {
    pub on_image: PathBuf,
    pub off_image: PathBuf,
    pub display_width: u32,
    pub display_height: u32,
}

/// Decoded ON/OFF images, already resized to the display size.
#[derive(Clone)]
pub struct RoomAssets {
    pub on: RgbImage,
    pub off: RgbImage,
}

impl RoomAssets {
    pub fn load(settings: &AssetSettings) -> Result<Self> {
        let on = load_image(&settings.on_image, settings)?;
        let off = load_image(&settings.off_image, settings)?;
        log::info!(
            "room images loaded ({}x{}): on={} off={}",
            settings.display_width,
            settings.display_height,
            settings.on_image.display(),
            settings.off_image.display()
        );
        Ok(Self { on, off })
    }

    pub fn image_for(&self, light_on: bool) -> &RgbImage {
        if light_on {
            &self.on
        } else {
            &self.off
        }
    }
}

fn load_image(path: &Path, settings: &AssetSettings) -> Result<RgbImage> {
    require_file(path, "room image")?;
    let image = image::open(path).with_context(|| format!("decode room image {}", path.display()))?;
    Ok(image
        .resize_exact(
            settings.display_width,
            settings.display_height,
            FilterType::Triangle,
        )
        .to_rgb8())
}

/// Fail unless `path` names an existing regular file.
pub fn require_file(path: &Path, what: &str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(anyhow!("{} missing: {}", what, path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn settings(dir: &Path) -> AssetSettings {
        AssetSettings {
            on_image: dir.join("office_on.png"),
            off_image: dir.join("office_off.png"),
            display_width: 8,
            display_height: 5,
        }
    }

    #[test]
    fn loads_and_resizes_both_images() -> Result<()> {
        let dir = tempfile::tempdir()?;
        RgbImage::from_pixel(16, 16, Rgb([250, 240, 200])).save(dir.path().join("office_on.png"))?;
        RgbImage::from_pixel(3, 7, Rgb([10, 10, 20])).save(dir.path().join("office_off.png"))?;

        let assets = RoomAssets::load(&settings(dir.path()))?;
        assert_eq!(assets.on.dimensions(), (8, 5));
        assert_eq!(assets.off.dimensions(), (8, 5));
        assert_eq!(assets.image_for(false).get_pixel(0, 0), &Rgb([10, 10, 20]));
        Ok(())
    }

    #[test]
    fn missing_image_is_fatal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        RgbImage::new(2, 2).save(dir.path().join("office_on.png"))?;

        let err = RoomAssets::load(&settings(dir.path())).err().expect("missing off image");
        assert!(err.to_string().contains("office_off.png"));
        Ok(())
    }

    #[test]
    fn undecodable_image_is_fatal() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("office_on.png"), b"not a png")?;
        RgbImage::new(2, 2).save(dir.path().join("office_off.png"))?;
        assert!(RoomAssets::load(&settings(dir.path())).is_err());
        Ok(())
    }
}
