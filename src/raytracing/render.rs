use image::{Rgb, RgbImage};
use log::debug;
use rand::{self, Rng};
use rayon::prelude::*;

use super::camera::Camera;
use super::math::Vec3;
use super::tracer::Tracer;

/// Sub-pixel sampling: a `grid x grid` stratified pattern, each sample centered in its
/// cell unless `jitter` moves it randomly inside the cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub grid: u32,
    pub jitter: bool,
}

impl Default for Sampling {
    fn default() -> Self {
        Sampling {
            grid: 2,
            jitter: false,
        }
    }
}

impl Sampling {
    pub fn rays_per_pixel(&self) -> u32 {
        self.grid * self.grid
    }
}

pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec3>,
}

impl From<Vec3> for Rgb<u8> {
    fn from(value: Vec3) -> Self {
        let value = value.clamp01();
        let r = (value.x * 255.0).round() as u8;
        let g = (value.y * 255.0).round() as u8;
        let b = (value.z * 255.0).round() as u8;
        Rgb([r, g, b])
    }
}

impl Framebuffer {
    pub fn pixel(&self, x: u32, y: u32) -> Vec3 {
        self.pixels[x as usize + self.width as usize * y as usize]
    }

    pub fn to_image(&self) -> RgbImage {
        let mut buffer = RgbImage::new(self.width, self.height);
        for (x, y, pixel) in buffer.enumerate_pixels_mut() {
            *pixel = self.pixel(x, y).into();
        }
        buffer
    }
}

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// Average color of the sub-pixel rays of pixel `(x, y)`, row 0 being the top one.
pub fn sample_pixel(
    tracer: &Tracer,
    camera: &Camera,
    (x, y): (u32, u32),
    (width, height): (u32, u32),
    sampling: Sampling,
) -> Vec3 {
    let grid = sampling.grid.max(1);
    let cell = 1.0 / grid as f64;
    let mut color = Vec3::zero();
    for j in 0..grid {
        for i in 0..grid {
            let (x_offset, y_offset) = if sampling.jitter {
                let mut rng = rand::thread_rng();
                (rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0))
            } else {
                (0.5, 0.5)
            };
            let u = (x as f64 + (i as f64 + x_offset) * cell) / width as f64;
            let v = (y as f64 + (j as f64 + y_offset) * cell) / height as f64;
            let ray = camera.shoot_to(u, v);
            color += tracer.trace(&ray, 1);
        }
    }
    color / (grid * grid) as f64
}

/// Renders every pixel, one row per parallel task. The scene is only read, so the
/// result does not depend on the scheduling.
pub fn render(
    tracer: &Tracer,
    camera: &Camera,
    width: u32,
    height: u32,
    sampling: Sampling,
) -> Framebuffer {
    debug!(
        "rendering {}x{} with {} rays per pixel",
        width,
        height,
        sampling.rays_per_pixel()
    );
    let mut pixels = vec![Vec3::zero(); pixel_count(width, height)];
    if width > 0 {
        pixels
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.iter_mut().enumerate() {
                    *pixel = sample_pixel(
                        tracer,
                        camera,
                        (x as u32, y as u32),
                        (width, height),
                        sampling,
                    );
                }
            });
    }

    Framebuffer {
        width,
        height,
        pixels,
    }
}
