use std::f64::consts::PI;

use super::math::Vec3;
use super::texture::Texture;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Refraction {
    pub coefficient: f64,
    /// refractive index relative to vacuum
    pub index: f64,
}

/// How texture coordinates are derived from a hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mapping {
    /// longitude/latitude of the surface normal
    Spherical,
    /// axis aligned rectangle on the xy plane
    Planar {
        origin_x: f64,
        origin_y: f64,
        width: f64,
        height: f64,
    },
}

/// Per-object rule that can override the base color at the hit point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pattern {
    Solid,
    Stripes { width: f64, even: Vec3, odd: Vec3 },
    /// `texture` indexes the scene's texture list
    Texture { texture: usize, mapping: Mapping },
}

/// The recursive ray a surface spawns, chosen by material flag precedence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SecondaryRay {
    Reflect { coefficient: f64 },
    Refract(Refraction),
    Transmit { coefficient: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub color: Vec3,
    pub pattern: Pattern,
    pub reflection: Option<f64>,
    pub refraction: Option<Refraction>,
    pub transparency: Option<f64>,
    pub specular: bool,
}

impl Material {
    pub fn new(color: Vec3) -> Material {
        Material {
            color,
            pattern: Pattern::Solid,
            reflection: None,
            refraction: None,
            transparency: None,
            specular: true,
        }
    }

    pub fn reflective(self, coefficient: f64) -> Material {
        Material {
            reflection: Some(coefficient),
            ..self
        }
    }

    pub fn refractive(self, coefficient: f64, index: f64) -> Material {
        Material {
            refraction: Some(Refraction { coefficient, index }),
            ..self
        }
    }

    pub fn transparent(self, coefficient: f64) -> Material {
        Material {
            transparency: Some(coefficient),
            ..self
        }
    }

    pub fn matte(self) -> Material {
        Material {
            specular: false,
            ..self
        }
    }

    pub fn with_pattern(self, pattern: Pattern) -> Material {
        Material { pattern, ..self }
    }

    /// Lets (dimmed) light through when it sits between a surface and a light.
    pub fn is_translucent(&self) -> bool {
        self.refraction.is_some() || self.transparency.is_some()
    }

    /// Only the first set flag counts: reflective, then refractive, then transparent.
    pub fn secondary_ray(&self) -> Option<SecondaryRay> {
        if let Some(coefficient) = self.reflection {
            Some(SecondaryRay::Reflect { coefficient })
        } else if let Some(refraction) = self.refraction {
            Some(SecondaryRay::Refract(refraction))
        } else {
            self.transparency
                .map(|coefficient| SecondaryRay::Transmit { coefficient })
        }
    }

    pub fn recursive_flags(&self) -> usize {
        [
            self.reflection.is_some(),
            self.refraction.is_some(),
            self.transparency.is_some(),
        ]
        .into_iter()
        .filter(|flag| *flag)
        .count()
    }

    /// Display color at a hit point, `normal` being the surface normal there.
    pub fn color_at(&self, textures: &[Texture], point: Vec3, normal: Vec3) -> Vec3 {
        match self.pattern {
            Pattern::Solid => self.color,
            Pattern::Stripes { width, even, odd } => {
                let ix = (point.x / width).floor() as i64;
                let iz = (point.z / width).floor() as i64;
                if (ix + iz).rem_euclid(2) == 1 {
                    odd
                } else {
                    even
                }
            }
            Pattern::Texture { texture, mapping } => {
                let Some(texture) = textures.get(texture) else {
                    return self.color;
                };
                match mapping.coordinates(point, normal) {
                    Some((s, t)) => texture.color_at(s, t),
                    None => self.color,
                }
            }
        }
    }
}

impl Mapping {
    fn coordinates(&self, point: Vec3, normal: Vec3) -> Option<(f64, f64)> {
        match *self {
            Mapping::Spherical => {
                let s = normal.x.atan2(normal.z) / (2.0 * PI) + 0.5;
                let t = normal.y.clamp(-1.0, 1.0).asin() / PI + 0.5;
                Some((s, t))
            }
            Mapping::Planar {
                origin_x,
                origin_y,
                width,
                height,
            } => {
                let s = (point.x - origin_x) / width;
                let t = (point.y - origin_y) / height;
                (s > 0.0 && s < 1.0 && t > 0.0 && t < 1.0).then_some((s, t))
            }
        }
    }
}
