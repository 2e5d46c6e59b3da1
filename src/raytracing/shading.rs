use super::math::Vec3;

/// Phong exponent of the specular highlight.
pub const SHININESS: i32 = 50;

/// Local illumination from a single point light: a diffuse term and, when
/// `specular` is set, a white highlight. The result is not clamped.
pub fn lighting(
    light_position: Vec3,
    view_direction: Vec3,
    hit_point: Vec3,
    normal: Vec3,
    color: Vec3,
    specular: bool,
) -> Vec3 {
    let light_direction = (light_position - hit_point).normalize();
    let diffuse = light_direction.dot(normal).max(0.0);
    let mut result = color * diffuse;

    if specular {
        let reflected = (-light_direction).reflect(normal);
        let alignment = reflected.dot(view_direction.normalize());
        if alignment > 0.0 {
            result += Vec3::one() * alignment.powi(SHININESS);
        }
    }
    result
}
