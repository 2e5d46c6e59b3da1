use super::math::{Ray, Vec3};

/// Tolerance used for every degenerate case: grazing discriminants, rays parallel
/// to a plane and hits too close to the ray origin (shadow acne).
pub const EPSILON: f64 = 1e-3;

pub trait RayIntersectable {
    /// Distance along the ray of the closest valid hit, `None` when there is no hit.
    fn intersect(&self, ray: &Ray) -> Option<f64>;
    /// Outward unit normal at a point that lies on the surface.
    fn normal(&self, point: Vec3) -> Vec3;
}

#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f64,
}

/// A bounded quadrilateral patch, vertices given counter-clockwise around the normal.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    vertices: [Vec3; 4],
    normal: Vec3,
}

/// Right circular cone standing on its base at `center`, apex at `center.y + height`.
#[derive(Debug, Clone, Copy)]
pub struct Cone {
    pub center: Vec3,
    pub radius: f64,
    pub height: f64,
}

/// Vertical cylinder with base at `center`, closed at the top only.
#[derive(Debug, Clone, Copy)]
pub struct Cylinder {
    pub center: Vec3,
    pub radius: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy)]
pub enum Solid {
    Sphere(Sphere),
    Plane(Plane),
    Cone(Cone),
    Cylinder(Cylinder),
}

/// Real roots of `a t^2 + b t + c` in ascending order.
/// Near-zero leading coefficients and near-tangent discriminants count as no solution.
fn solve_quadratic(a: f64, b: f64, c: f64) -> Option<(f64, f64)> {
    if a.abs() < EPSILON {
        return None;
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < EPSILON {
        return None;
    }
    let sqrt_discriminant = discriminant.sqrt();
    let t1 = (-b - sqrt_discriminant) / (2.0 * a);
    let t2 = (-b + sqrt_discriminant) / (2.0 * a);
    // a negative leading coefficient swaps the roots
    Some(if t1 <= t2 { (t1, t2) } else { (t2, t1) })
}

impl Sphere {
    pub fn new(center: Vec3, radius: f64) -> Sphere {
        Sphere { center, radius }
    }
}

impl RayIntersectable for Sphere {
    fn intersect(&self, ray: &Ray) -> Option<f64> {
        let oc = ray.origin - self.center;
        let a = ray.direction.dot(ray.direction);
        let b = 2.0 * ray.direction.dot(oc);
        let c = oc.dot(oc) - self.radius * self.radius;
        let (t1, t2) = solve_quadratic(a, b, c)?;
        if t1 > EPSILON {
            Some(t1)
        } else if t2 > EPSILON {
            Some(t2)
        } else {
            None
        }
    }

    fn normal(&self, point: Vec3) -> Vec3 {
        (point - self.center) / self.radius
    }
}

impl Plane {
    pub fn new(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Plane {
        let normal = (c - b).cross(a - b).normalize();
        Plane {
            vertices: [a, b, c, d],
            normal,
        }
    }

    /// Whether a point of the supporting plane lies inside the quadrilateral (edges included).
    pub fn contains(&self, point: Vec3) -> bool {
        (0..4).all(|i| {
            let from = self.vertices[i];
            let to = self.vertices[(i + 1) % 4];
            (to - from).cross(point - from).dot(self.normal) >= 0.0
        })
    }
}

impl RayIntersectable for Plane {
    fn intersect(&self, ray: &Ray) -> Option<f64> {
        let dv = ray.direction.dot(self.normal);
        if dv.abs() < EPSILON {
            return None;
        }
        let t = (self.vertices[0] - ray.origin).dot(self.normal) / dv;
        if t <= EPSILON {
            return None;
        }
        if self.contains(ray.at(t)) {
            Some(t)
        } else {
            None
        }
    }

    fn normal(&self, _point: Vec3) -> Vec3 {
        self.normal
    }
}

impl Cone {
    pub fn new(center: Vec3, radius: f64, height: f64) -> Cone {
        Cone {
            center,
            radius,
            height,
        }
    }

    pub fn apex(&self) -> Vec3 {
        self.center + Vec3::y_axis() * self.height
    }

    fn contains_height(&self, y: f64) -> bool {
        y >= self.center.y && y <= self.center.y + self.height
    }

    // A line through the apex only touches the surface there, a double root
    // that the discriminant test discards.
    fn apex_hit(&self, ray: &Ray) -> Option<f64> {
        let apex = self.apex();
        let t = (apex - ray.origin).dot(ray.direction) / ray.direction.squared_len();
        if t > EPSILON && ray.at(t).distance(apex) < EPSILON {
            Some(t)
        } else {
            None
        }
    }
}

impl RayIntersectable for Cone {
    fn intersect(&self, ray: &Ray) -> Option<f64> {
        let d = ray.direction;
        let o = ray.origin - self.center;
        let k = (self.radius / self.height).powi(2);
        let a = d.x * d.x + d.z * d.z - k * d.y * d.y;
        let b = 2.0 * (o.x * d.x + o.z * d.z + k * (self.height - o.y) * d.y);
        let c = o.x * o.x + o.z * o.z - k * (self.height - o.y).powi(2);

        let Some((t1, t2)) = solve_quadratic(a, b, c) else {
            return self.apex_hit(ray);
        };
        [t1, t2]
            .into_iter()
            .find(|&t| t > EPSILON && self.contains_height(ray.at(t).y))
    }

    fn normal(&self, point: Vec3) -> Vec3 {
        let alpha = (point.x - self.center.x).atan2(point.z - self.center.z);
        let theta = self.radius.atan2(self.height);
        Vec3::new(
            alpha.sin() * theta.cos(),
            theta.sin(),
            alpha.cos() * theta.cos(),
        )
    }
}

impl Cylinder {
    pub fn new(center: Vec3, radius: f64, height: f64) -> Cylinder {
        Cylinder {
            center,
            radius,
            height,
        }
    }

    fn top(&self) -> f64 {
        self.center.y + self.height
    }

    fn contains_height(&self, y: f64) -> bool {
        y >= self.center.y && y <= self.top()
    }

    fn lateral_intersect(&self, ray: &Ray) -> Option<f64> {
        let d = ray.direction;
        let o = ray.origin - self.center;
        let a = d.x * d.x + d.z * d.z;
        let b = 2.0 * (o.x * d.x + o.z * d.z);
        let c = o.x * o.x + o.z * o.z - self.radius * self.radius;
        let (t1, t2) = solve_quadratic(a, b, c)?;
        [t1, t2]
            .into_iter()
            .find(|&t| t > EPSILON && self.contains_height(ray.at(t).y))
    }

    fn cap_intersect(&self, ray: &Ray) -> Option<f64> {
        if ray.direction.y.abs() <= EPSILON {
            return None;
        }
        let t = (self.top() - ray.origin.y) / ray.direction.y;
        if t <= EPSILON {
            return None;
        }
        let cap_center = Vec3::new(self.center.x, self.top(), self.center.z);
        if ray.at(t).distance(cap_center) > self.radius {
            return None;
        }
        Some(t)
    }
}

impl RayIntersectable for Cylinder {
    fn intersect(&self, ray: &Ray) -> Option<f64> {
        match (self.lateral_intersect(ray), self.cap_intersect(ray)) {
            (Some(lateral), Some(cap)) => Some(lateral.min(cap)),
            (lateral, cap) => lateral.or(cap),
        }
    }

    fn normal(&self, point: Vec3) -> Vec3 {
        if point.y > self.top() - EPSILON {
            return Vec3::y_axis();
        }
        Vec3::new(
            (point.x - self.center.x) / self.radius,
            0.0,
            (point.z - self.center.z) / self.radius,
        )
    }
}

impl RayIntersectable for Solid {
    fn intersect(&self, ray: &Ray) -> Option<f64> {
        let t = match self {
            Solid::Sphere(sphere) => sphere.intersect(ray),
            Solid::Plane(plane) => plane.intersect(ray),
            Solid::Cone(cone) => cone.intersect(ray),
            Solid::Cylinder(cylinder) => cylinder.intersect(ray),
        }?;
        // never let a NaN or an infinity leak out as a distance
        t.is_finite().then_some(t)
    }

    fn normal(&self, point: Vec3) -> Vec3 {
        match self {
            Solid::Sphere(sphere) => sphere.normal(point),
            Solid::Plane(plane) => plane.normal(point),
            Solid::Cone(cone) => cone.normal(point),
            Solid::Cylinder(cylinder) => cylinder.normal(point),
        }
    }
}
