use glam::{Mat4, Vec3, Vec4};

/// View frustum as six inward-facing planes (`xyz` normal, `w` distance),
/// extracted from a view-projection matrix with zero-to-one depth.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    pub planes: [Vec4; 6],
}

impl Frustum {
    pub fn from_matrix(m: Mat4) -> Self {
        let r0 = m.row(0);
        let r1 = m.row(1);
        let r2 = m.row(2);
        let r3 = m.row(3);

        let mut planes = [
            r3 + r0, // left
            r3 - r0, // right
            r3 + r1, // bottom
            r3 - r1, // top
            r2,      // near
            r3 - r2, // far
        ];
        for plane in planes.iter_mut() {
            let len = plane.truncate().length();
            if len > f32::EPSILON {
                *plane /= len;
            }
        }
        Self { planes }
    }

    /// Whether a sphere intersects the frustum (conservative: a sphere
    /// outside any single plane is rejected).
    pub fn contains_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(center) + plane.w >= -radius)
    }
}
