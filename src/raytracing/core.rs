use super::material::Material;
use super::math::{Ray, Vec3};
use super::solid::{RayIntersectable, Solid};
use super::texture::Texture;

#[derive(Debug)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub lights: Vec<Light>,
    pub textures: Vec<Texture>,
}

#[derive(Debug, Clone, Copy)]
pub struct Light {
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy)]
pub struct SceneObject {
    pub solid: Solid,
    pub material: Material,
}

/// Closest hit of a ray against a scene; `index` is the object's position in the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub index: usize,
    pub point: Vec3,
    pub distance: f64,
}

impl Light {
    pub fn new(position: Vec3) -> Light {
        Light { position }
    }

    /// The two overhead lights every scene gets when it declares none.
    pub fn default_pair() -> Vec<Light> {
        vec![
            Light::new(Vec3::new(-5.0, 40.0, -5.0)),
            Light::new(Vec3::new(30.0, 40.0, -5.0)),
        ]
    }
}

impl SceneObject {
    pub fn new(solid: Solid, material: Material) -> SceneObject {
        SceneObject { solid, material }
    }
}

impl Scene {
    pub fn new(objects: Vec<SceneObject>, lights: Vec<Light>) -> Scene {
        Scene {
            objects,
            lights,
            textures: Vec::new(),
        }
    }

    pub fn object(&self, intersection: &Intersection) -> &SceneObject {
        &self.objects[intersection.index]
    }

    /// Brute force scan of every object, keeping the nearest positive distance.
    /// On equal distances the object inserted first wins.
    pub fn closest_hit(&self, ray: &Ray) -> Option<Intersection> {
        let mut closest: Option<(usize, f64)> = None;
        for (index, object) in self.objects.iter().enumerate() {
            let Some(t) = object.solid.intersect(ray) else {
                continue;
            };
            if t <= 0.0 {
                continue;
            }
            if closest.map_or(true, |(_, closest_t)| t < closest_t) {
                closest = Some((index, t));
            }
        }

        closest.map(|(index, distance)| Intersection {
            index,
            point: ray.at(distance),
            distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raytracing::solid::{Plane, Sphere};
    use approx::assert_abs_diff_eq;

    fn sphere(center: [f64; 3], radius: f64) -> SceneObject {
        SceneObject::new(
            Solid::Sphere(Sphere::new(center.into(), radius)),
            Material::new(Vec3::one()),
        )
    }

    #[test]
    fn closest_hit_picks_nearest_object() {
        let scene = Scene::new(
            vec![
                sphere([0.0, 0.0, -50.0], 5.0),
                sphere([0.0, 0.0, -20.0], 5.0),
                sphere([0.0, 0.0, -80.0], 5.0),
            ],
            Light::default_pair(),
        );
        let ray = Ray::new(Vec3::zero(), -Vec3::z_axis());
        let hit = scene.closest_hit(&ray).unwrap();
        assert_eq!(hit.index, 1);
        assert_abs_diff_eq!(hit.distance, 15.0, epsilon = 1e-9);
        assert_abs_diff_eq!(hit.point, Vec3::new(0.0, 0.0, -15.0), epsilon = 1e-9);
    }

    #[test]
    fn closest_hit_miss_and_empty_scene() {
        let scene = Scene::new(vec![sphere([0.0, 0.0, -50.0], 5.0)], Vec::new());
        assert!(scene.closest_hit(&Ray::new(Vec3::zero(), Vec3::z_axis())).is_none());
        let empty = Scene::new(Vec::new(), Vec::new());
        assert!(empty.closest_hit(&Ray::new(Vec3::zero(), Vec3::z_axis())).is_none());
    }

    #[test]
    fn closest_hit_ties_keep_first_object() {
        let quad = || {
            SceneObject::new(
                Solid::Plane(Plane::new(
                    Vec3::new(-1.0, -1.0, -5.0),
                    Vec3::new(1.0, -1.0, -5.0),
                    Vec3::new(1.0, 1.0, -5.0),
                    Vec3::new(-1.0, 1.0, -5.0),
                )),
                Material::new(Vec3::one()),
            )
        };
        let scene = Scene::new(vec![quad(), quad()], Vec::new());
        let hit = scene.closest_hit(&Ray::new(Vec3::zero(), -Vec3::z_axis())).unwrap();
        assert_eq!(hit.index, 0);
    }
}
