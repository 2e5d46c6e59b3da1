use super::core::{Intersection, Light, Scene};
use super::material::{Refraction, SecondaryRay};
use super::math::{Ray, Vec3};
use super::shading::lighting;
use super::solid::RayIntersectable;

/// Share of the object's own color added regardless of lights.
pub const AMBIENT: f64 = 0.1;
/// Weight of an unobstructed light.
pub const DIRECT_LIGHT: f64 = 0.45;
/// Weight of a light seen through a refractive or transparent occluder.
pub const FILTERED_LIGHT: f64 = 0.25;

/// Linear depth fog along z, between `near` (no fog) and `far` (only fog).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub near: f64,
    pub far: f64,
    pub color: Vec3,
}

impl Default for Fog {
    fn default() -> Self {
        Fog {
            near: -30.0,
            far: -550.0,
            color: Vec3::one(),
        }
    }
}

impl Fog {
    pub fn factor(&self, z: f64) -> f64 {
        if self.far == self.near {
            return 0.0;
        }
        ((z - self.near) / (self.far - self.near)).clamp(0.0, 1.0)
    }

    pub fn apply(&self, color: Vec3, z: f64) -> Vec3 {
        color.lerp(self.color, self.factor(z))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceSettings {
    /// depth at which a hit stops spawning secondary rays; primary rays start at 1
    pub max_depth: u32,
    pub background: Vec3,
    pub fog: Option<Fog>,
}

impl Default for TraceSettings {
    fn default() -> Self {
        TraceSettings {
            max_depth: 5,
            background: Vec3::zero(),
            fog: Some(Fog::default()),
        }
    }
}

/// Light reaching a hit point from one light source, after the shadow test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Visibility {
    Lit,
    Filtered,
    Blocked,
}

impl Visibility {
    pub fn weight(self) -> f64 {
        match self {
            Visibility::Lit => DIRECT_LIGHT,
            Visibility::Filtered => FILTERED_LIGHT,
            Visibility::Blocked => 0.0,
        }
    }
}

pub struct Tracer<'a> {
    scene: &'a Scene,
    settings: TraceSettings,
}

impl<'a> Tracer<'a> {
    pub fn new(scene: &'a Scene, settings: TraceSettings) -> Tracer<'a> {
        Tracer { scene, settings }
    }

    /// Color seen along `ray`; primary rays are traced at depth 1.
    pub fn trace(&self, ray: &Ray, depth: u32) -> Vec3 {
        let Some(hit) = self.scene.closest_hit(ray) else {
            return self.settings.background;
        };
        let local = self.shade(ray, &hit);
        let material = &self.scene.object(&hit).material;

        let color = match material.secondary_ray() {
            Some(secondary) if depth < self.settings.max_depth => match secondary {
                SecondaryRay::Reflect { coefficient } => {
                    local.lerp(self.reflected(ray, &hit, depth), coefficient)
                }
                SecondaryRay::Refract(refraction) => {
                    local.lerp(self.refracted(ray, &hit, refraction, depth), refraction.coefficient)
                }
                SecondaryRay::Transmit { coefficient } => {
                    local.lerp(self.transmitted(ray, &hit, depth), coefficient)
                }
            },
            _ => local,
        };

        match self.settings.fog {
            Some(fog) => fog.apply(color, hit.point.z),
            None => color,
        }
    }

    /// Ambient plus every light's contribution, weighted by its shadow test.
    pub fn shade(&self, ray: &Ray, hit: &Intersection) -> Vec3 {
        let object = self.scene.object(hit);
        let normal = object.solid.normal(hit.point);
        let color = object
            .material
            .color_at(&self.scene.textures, hit.point, normal);

        let mut result = color * AMBIENT;
        for light in &self.scene.lights {
            let visibility = self.visibility(hit.point, light);
            if visibility == Visibility::Blocked {
                continue;
            }
            let direct = lighting(
                light.position,
                -ray.direction,
                hit.point,
                normal,
                color,
                object.material.specular,
            );
            result += direct * visibility.weight();
        }
        result
    }

    /// Shadow test from `point` toward `light`.
    pub fn visibility(&self, point: Vec3, light: &Light) -> Visibility {
        let to_light = light.position - point;
        let shadow_ray = Ray::new(point, to_light);
        match self.scene.closest_hit(&shadow_ray) {
            Some(occluder) if occluder.distance < to_light.len() => {
                if self.scene.object(&occluder).material.is_translucent() {
                    Visibility::Filtered
                } else {
                    Visibility::Blocked
                }
            }
            _ => Visibility::Lit,
        }
    }

    fn reflected(&self, ray: &Ray, hit: &Intersection, depth: u32) -> Vec3 {
        let normal = self.scene.object(hit).solid.normal(hit.point);
        let reflected_ray = Ray::new(hit.point, ray.direction.reflect(normal));
        self.trace(&reflected_ray, depth + 1)
    }

    fn refracted(&self, ray: &Ray, hit: &Intersection, refraction: Refraction, depth: u32) -> Vec3 {
        self.trace(&self.refracted_ray(ray, hit, refraction), depth + 1)
    }

    /// Ray leaving a refractive object: bent into it with the ratio `1 / index`,
    /// followed to the far side of the same object and bent back out with `index`.
    /// Entering with `index` instead would turn shallow entries into total internal
    /// reflection.
    /// A surface without a far side, like a plane, keeps the inner ray.
    fn refracted_ray(&self, ray: &Ray, hit: &Intersection, refraction: Refraction) -> Ray {
        let solid = &self.scene.object(hit).solid;
        let normal = solid.normal(hit.point);
        let inside = bend(ray.direction, normal, 1.0 / refraction.index);
        let inner_ray = Ray::new(hit.point, inside);

        match self.scene.closest_hit(&inner_ray) {
            Some(exit) if exit.index == hit.index => {
                let exit_normal = solid.normal(exit.point);
                let outside = bend(inner_ray.direction, -exit_normal, refraction.index);
                Ray::new(exit.point, outside)
            }
            _ => inner_ray,
        }
    }

    // Continues straight on, skipping the far side of the same object.
    fn transmitted(&self, ray: &Ray, hit: &Intersection, depth: u32) -> Vec3 {
        let through = Ray::new(hit.point, ray.direction);
        match self.scene.closest_hit(&through) {
            Some(exit) if exit.index == hit.index => {
                self.trace(&Ray::new(exit.point, ray.direction), depth + 1)
            }
            _ => self.trace(&through, depth + 1),
        }
    }
}

/// Refracted direction, or the mirror direction past the critical angle.
fn bend(direction: Vec3, normal: Vec3, eta: f64) -> Vec3 {
    direction
        .refract(normal, eta)
        .unwrap_or_else(|| direction.reflect(normal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raytracing::core::SceneObject;
    use crate::raytracing::material::Material;
    use crate::raytracing::solid::{Plane, Solid, Sphere};
    use approx::assert_abs_diff_eq;

    const GREY: Vec3 = Vec3 {
        x: 0.5,
        y: 0.5,
        z: 0.5,
    };

    fn no_fog() -> TraceSettings {
        TraceSettings {
            fog: None,
            ..TraceSettings::default()
        }
    }

    fn floor(material: Material) -> SceneObject {
        SceneObject::new(
            Solid::Plane(Plane::new(
                Vec3::new(-50.0, -10.0, 0.0),
                Vec3::new(50.0, -10.0, 0.0),
                Vec3::new(50.0, -10.0, -100.0),
                Vec3::new(-50.0, -10.0, -100.0),
            )),
            material,
        )
    }

    fn sphere(center: [f64; 3], radius: f64, material: Material) -> SceneObject {
        SceneObject::new(Solid::Sphere(Sphere::new(center.into(), radius)), material)
    }

    fn single_light() -> Vec<Light> {
        vec![Light::new(Vec3::new(0.0, 40.0, -30.0))]
    }

    fn down_at_floor() -> Ray {
        // hits the floor at (0, -10, -30), right under the light
        Ray::new(Vec3::new(0.0, 0.0, -30.0), -Vec3::y_axis())
    }

    #[test]
    fn miss_returns_background_without_fog() {
        let scene = Scene::new(vec![], Light::default_pair());
        let tracer = Tracer::new(&scene, TraceSettings::default());
        let color = tracer.trace(&Ray::new(Vec3::zero(), -Vec3::z_axis()), 1);
        assert_eq!(color, Vec3::zero());

        let settings = TraceSettings {
            background: GREY,
            ..TraceSettings::default()
        };
        let tracer = Tracer::new(&scene, settings);
        assert_eq!(tracer.trace(&Ray::new(Vec3::zero(), Vec3::z_axis()), 1), GREY);
    }

    #[test]
    fn unoccluded_light_uses_direct_weight() {
        let scene = Scene::new(vec![floor(Material::new(GREY).matte())], single_light());
        let tracer = Tracer::new(&scene, no_fog());
        let color = tracer.trace(&down_at_floor(), 1);
        // light straight above: diffuse term equals the color
        assert_abs_diff_eq!(color, GREY * (AMBIENT + DIRECT_LIGHT), epsilon = 1e-9);
    }

    #[test]
    fn opaque_occluder_blocks_light() {
        let scene = Scene::new(
            vec![
                floor(Material::new(GREY).matte()),
                sphere([0.0, 10.0, -30.0], 3.0, Material::new(GREY)),
            ],
            single_light(),
        );
        let tracer = Tracer::new(&scene, no_fog());
        let hit = scene.closest_hit(&down_at_floor()).unwrap();
        assert_eq!(hit.index, 0);
        assert_eq!(tracer.visibility(hit.point, &scene.lights[0]), Visibility::Blocked);
        let color = tracer.shade(&down_at_floor(), &hit);
        assert_abs_diff_eq!(color, GREY * AMBIENT, epsilon = 1e-12);
    }

    #[test]
    fn translucent_occluder_filters_light() {
        for occluder in [
            Material::new(GREY).transparent(0.5),
            Material::new(GREY).refractive(1.0, 1.5),
        ] {
            let scene = Scene::new(
                vec![
                    floor(Material::new(GREY).matte()),
                    sphere([0.0, 10.0, -30.0], 3.0, occluder),
                ],
                single_light(),
            );
            let tracer = Tracer::new(&scene, no_fog());
            let hit = scene.closest_hit(&down_at_floor()).unwrap();
            assert_eq!(tracer.visibility(hit.point, &scene.lights[0]), Visibility::Filtered);
            let color = tracer.shade(&down_at_floor(), &hit);
            assert_abs_diff_eq!(color, GREY * (AMBIENT + FILTERED_LIGHT), epsilon = 1e-9);
        }
    }

    #[test]
    fn occluder_beyond_light_does_not_shadow() {
        let scene = Scene::new(
            vec![
                floor(Material::new(GREY).matte()),
                sphere([0.0, 60.0, -30.0], 3.0, Material::new(GREY)),
            ],
            single_light(),
        );
        let tracer = Tracer::new(&scene, no_fog());
        let hit = scene.closest_hit(&down_at_floor()).unwrap();
        assert_eq!(tracer.visibility(hit.point, &scene.lights[0]), Visibility::Lit);
    }

    #[test]
    fn max_depth_returns_local_color() {
        let materials = [
            Material::new(GREY).reflective(1.0),
            Material::new(GREY).refractive(1.0, 1.3),
            Material::new(GREY).transparent(1.0),
        ];
        for material in materials {
            let scene = Scene::new(
                vec![
                    sphere([0.0, 0.0, -30.0], 5.0, material),
                    // something bright to see if recursion happened
                    sphere([0.0, 0.0, -60.0], 5.0, Material::new(Vec3::one())),
                    sphere([0.0, 0.0, 30.0], 5.0, Material::new(Vec3::one())),
                ],
                Light::default_pair(),
            );
            let settings = no_fog();
            let tracer = Tracer::new(&scene, settings);
            let ray = Ray::new(Vec3::zero(), -Vec3::z_axis());
            let hit = scene.closest_hit(&ray).unwrap();
            let local = tracer.shade(&ray, &hit);
            assert_eq!(tracer.trace(&ray, settings.max_depth), local);
            assert_ne!(tracer.trace(&ray, 1), local);
        }
    }

    #[test]
    fn perfect_mirror_shows_reflection() {
        let scene = Scene::new(
            vec![
                floor(Material::new(GREY).reflective(1.0)),
                sphere([0.0, 30.0, -30.0], 5.0, Material::new(Vec3::one()).matte()),
            ],
            vec![],
        );
        let tracer = Tracer::new(&scene, no_fog());
        let color = tracer.trace(&down_at_floor(), 1);
        // no lights: only the sphere's ambient term comes back from the mirror
        assert_abs_diff_eq!(color, Vec3::one() * AMBIENT, epsilon = 1e-9);
    }

    #[test]
    fn unit_index_refraction_sees_straight_through() {
        let behind = Material::new(Vec3::new(0.0, 1.0, 0.0)).matte();
        let scene = Scene::new(
            vec![
                sphere([0.0, 0.0, -30.0], 5.0, Material::new(GREY).refractive(1.0, 1.0)),
                sphere([0.0, 0.0, -60.0], 5.0, behind),
            ],
            vec![],
        );
        let tracer = Tracer::new(&scene, no_fog());
        let color = tracer.trace(&Ray::new(Vec3::zero(), -Vec3::z_axis()), 1);
        assert_abs_diff_eq!(color, Vec3::new(0.0, 1.0, 0.0) * AMBIENT, epsilon = 1e-9);
    }

    #[test]
    fn glass_sphere_bends_rays_toward_its_axis() {
        let (center, radius, index) = (Vec3::new(0.0, 0.0, -30.0), 5.0, 1.5);
        let glass = Material::new(GREY).refractive(1.0, index);
        let scene = Scene::new(vec![sphere([0.0, 0.0, -30.0], radius, glass)], vec![]);
        let tracer = Tracer::new(&scene, no_fog());
        // enters at 30 degrees from the normal
        let ray = Ray::new(Vec3::new(0.0, 2.5, 0.0), -Vec3::z_axis());
        let hit = scene.closest_hit(&ray).unwrap();
        let refraction = Refraction {
            coefficient: 1.0,
            index,
        };
        let out = tracer.refracted_ray(&ray, &hit, refraction);

        let incidence = 0.5_f64.asin();
        let inner = (0.5 / index).asin();
        let deviation = 2.0 * (incidence - inner);
        assert_abs_diff_eq!(
            out.direction,
            Vec3::new(0.0, -deviation.sin(), -deviation.cos()),
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(out.origin.distance(center), radius, epsilon = 1e-9);
        let chord = 2.0 * radius * inner.cos();
        let inside = Vec3::new(0.0, -(incidence - inner).sin(), -(incidence - inner).cos());
        assert_abs_diff_eq!(out.origin, hit.point + inside * chord, epsilon = 1e-9);
    }

    #[test]
    fn glass_sphere_shows_what_lies_on_the_bent_path() {
        let glass = Material::new(GREY).refractive(1.0, 1.5);
        let mut objects = vec![sphere([0.0, 0.0, -30.0], 5.0, glass)];
        let scene = Scene::new(objects.clone(), vec![]);
        let ray = Ray::new(Vec3::new(0.0, 2.5, 0.0), -Vec3::z_axis());
        let hit = scene.closest_hit(&ray).unwrap();
        let out = Tracer::new(&scene, no_fog()).refracted_ray(
            &ray,
            &hit,
            Refraction {
                coefficient: 1.0,
                index: 1.5,
            },
        );

        // a target on the bent path, well below the straight line y = 2.5
        let target = out.at(30.0);
        assert!(target.y < -5.0);
        let green = Material::new(Vec3::new(0.0, 1.0, 0.0)).matte();
        objects.push(sphere([target.x, target.y, target.z], 2.0, green));
        let scene = Scene::new(objects, vec![]);
        let color = Tracer::new(&scene, no_fog()).trace(&ray, 1);
        assert_abs_diff_eq!(color, Vec3::new(0.0, 1.0, 0.0) * AMBIENT, epsilon = 1e-9);
    }

    #[test]
    fn refraction_through_a_plane_keeps_the_inner_ray() {
        let glass = Material::new(GREY).refractive(1.0, 1.5);
        let green = Material::new(Vec3::new(0.0, 1.0, 0.0)).matte();
        let below = SceneObject::new(
            Solid::Plane(Plane::new(
                Vec3::new(-50.0, -20.0, 0.0),
                Vec3::new(50.0, -20.0, 0.0),
                Vec3::new(50.0, -20.0, -100.0),
                Vec3::new(-50.0, -20.0, -100.0),
            )),
            green,
        );
        let scene = Scene::new(vec![floor(glass), below], vec![]);
        let tracer = Tracer::new(&scene, no_fog());
        let ray = Ray::new(Vec3::new(0.0, 0.0, -30.0), Vec3::new(1.0, -1.0, 0.0));
        let hit = scene.closest_hit(&ray).unwrap();
        assert_eq!(hit.index, 0);

        let out = tracer.refracted_ray(
            &ray,
            &hit,
            Refraction {
                coefficient: 1.0,
                index: 1.5,
            },
        );
        // the plane below is another object, not the far side of the glass
        assert_abs_diff_eq!(out.origin, Vec3::new(10.0, -10.0, -30.0), epsilon = 1e-9);
        let sin_inside = 0.5_f64.sqrt() / 1.5;
        let expected = Vec3::new(sin_inside, -(1.0 - sin_inside * sin_inside).sqrt(), 0.0);
        assert_abs_diff_eq!(out.direction, expected, epsilon = 1e-9);

        let color = tracer.trace(&ray, 1);
        assert_abs_diff_eq!(color, Vec3::new(0.0, 1.0, 0.0) * AMBIENT, epsilon = 1e-9);
    }

    #[test]
    fn bend_past_critical_angle_mirrors() {
        let normal = Vec3::y_axis();
        // 60 degrees from the normal, leaving glass of index 1.5
        let direction = Vec3::new(3.0_f64.sqrt() / 2.0, -0.5, 0.0);
        assert_eq!(direction.refract(normal, 1.5), None);
        assert_abs_diff_eq!(
            bend(direction, normal, 1.5),
            Vec3::new(3.0_f64.sqrt() / 2.0, 0.5, 0.0),
            epsilon = 1e-12
        );
        // below the critical angle it refracts
        let shallow = Vec3::new(0.5, -(0.75_f64).sqrt(), 0.0);
        let bent = bend(shallow, normal, 1.5);
        assert_abs_diff_eq!(bent.x, 0.75, epsilon = 1e-12);
        assert!(bent.y < 0.0);
    }

    #[test]
    fn transparency_blends_with_what_lies_behind() {
        let behind = Material::new(Vec3::new(0.0, 0.0, 1.0)).matte();
        let veil = Material::new(Vec3::new(1.0, 0.0, 0.0)).transparent(0.6);
        let scene = Scene::new(
            vec![
                sphere([0.0, 0.0, -30.0], 5.0, veil),
                sphere([0.0, 0.0, -60.0], 5.0, behind),
            ],
            vec![],
        );
        let tracer = Tracer::new(&scene, no_fog());
        let color = tracer.trace(&Ray::new(Vec3::zero(), -Vec3::z_axis()), 1);
        let expected = Vec3::new(0.4 * AMBIENT, 0.0, 0.6 * AMBIENT);
        assert_abs_diff_eq!(color, expected, epsilon = 1e-9);
    }

    #[test]
    fn fog_boundaries() {
        let fog = Fog::default();
        assert_eq!(fog.factor(fog.near), 0.0);
        assert_eq!(fog.factor(fog.far), 1.0);
        assert_eq!(fog.apply(GREY, fog.near), GREY);
        assert_eq!(fog.apply(GREY, fog.far), fog.color);
        assert_abs_diff_eq!(fog.factor(-290.0), 0.5, epsilon = 1e-12);
        // clamped outside the range
        assert_eq!(fog.factor(0.0), 0.0);
        assert_eq!(fog.factor(-1000.0), 1.0);
    }

    #[test]
    fn fog_applies_on_hits() {
        let scene = Scene::new(vec![floor(Material::new(GREY).matte())], vec![]);
        let settings = TraceSettings {
            fog: Some(Fog {
                near: -10.0,
                far: -50.0,
                color: Vec3::one(),
            }),
            ..TraceSettings::default()
        };
        let tracer = Tracer::new(&scene, settings);
        let color = tracer.trace(&down_at_floor(), 1);
        // hit at z = -30, halfway through the fog
        let expected = (GREY * AMBIENT).lerp(Vec3::one(), 0.5);
        assert_abs_diff_eq!(color, expected, epsilon = 1e-9);
    }
}
