use std::fmt;
use std::path::{Path, PathBuf};

use image::RgbImage;
use log::debug;
use thiserror::Error;

use super::math::Vec3;

#[derive(Debug, Error)]
#[error("cannot load texture \"{path}\": {source}")]
pub struct TextureError {
    pub path: PathBuf,
    #[source]
    pub source: image::ImageError,
}

pub struct Texture {
    image: RgbImage,
}

impl Texture {
    pub fn load(path: &Path) -> Result<Texture, TextureError> {
        let image = image::open(path)
            .map_err(|source| TextureError {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        debug!(
            "loaded texture {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Texture { image })
    }

    pub fn from_image(image: RgbImage) -> Texture {
        Texture { image }
    }

    /// Nearest texel at `(s, t)` in `[0, 1]^2`, with `t` growing from the bottom row upward.
    pub fn color_at(&self, s: f64, t: f64) -> Vec3 {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return Vec3::zero();
        }
        let x = (s.clamp(0.0, 1.0) * (width - 1) as f64).round() as u32;
        let y = ((1.0 - t.clamp(0.0, 1.0)) * (height - 1) as f64).round() as u32;
        self.image.get_pixel(x, y).0.into()
    }
}

// the default implementation would dump every pixel
impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (width, height) = self.image.dimensions();
        write!(f, "Texture({}x{})", width, height)
    }
}
