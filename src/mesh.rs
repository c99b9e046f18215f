use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// GPU vertex: position + flat color.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRS,
        }
    }
}

/// Triangle mesh in local space, used for ground ray queries and drawing.
#[derive(Debug, Clone)]
pub struct TriMesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
    min: Vec3,
    max: Vec3,
}

impl TriMesh {
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let (min, max) = positions.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        );
        Self {
            positions,
            indices,
            min,
            max,
        }
    }

    /// Regular grid of `res × res` quads spanning `size` on X/Z, centred on the origin.
    pub fn heightfield(size: f32, res: u32, height: impl Fn(f32, f32) -> f32) -> Self {
        let res = res.max(1);
        let step = size / res as f32;
        let half = size * 0.5;

        let mut positions = Vec::with_capacity(((res + 1) * (res + 1)) as usize);
        for iz in 0..=res {
            for ix in 0..=res {
                let x = -half + ix as f32 * step;
                let z = -half + iz as f32 * step;
                positions.push(Vec3::new(x, height(x, z), z));
            }
        }

        let row = res + 1;
        let mut indices = Vec::with_capacity((res * res * 6) as usize);
        for iz in 0..res {
            for ix in 0..res {
                let i0 = iz * row + ix;
                let i1 = i0 + 1;
                let i2 = i0 + row;
                let i3 = i2 + 1;
                // CCW seen from +Y
                indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
            }
        }

        Self::new(positions, indices)
    }

    #[cfg(test)]
    pub fn bounds(&self) -> (Vec3, Vec3) {
        (self.min, self.max)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Distance along `dir` to the closest triangle hit, if any.
    /// `dir` does not need to be normalised; the result is in units of `dir`.
    pub fn raycast(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        if !ray_hits_aabb(origin, dir, self.min, self.max) {
            return None;
        }

        self.indices
            .chunks_exact(3)
            .filter_map(|tri| {
                let a = *self.positions.get(tri[0] as usize)?;
                let b = *self.positions.get(tri[1] as usize)?;
                let c = *self.positions.get(tri[2] as usize)?;
                ray_triangle(origin, dir, a, b, c)
            })
            .min_by(f32::total_cmp)
    }
}

/// Möller–Trumbore, double sided.
fn ray_triangle(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    const EPS: f32 = 1e-7;

    let e1 = b - a;
    let e2 = c - a;
    let p = dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPS {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(e1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}

fn ray_hits_aabb(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> bool {
    let mut t_min = 0.0_f32;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        if d.abs() < 1e-12 {
            if o < min[axis] || o > max[axis] {
                return false;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn heightfield_has_expected_topology() {
        let mesh = TriMesh::heightfield(10.0, 4, |_, _| 0.0);
        assert_eq!(mesh.positions.len(), 25);
        assert_eq!(mesh.triangle_count(), 32);
        let (min, max) = mesh.bounds();
        assert_relative_eq!(min.x, -5.0);
        assert_relative_eq!(max.z, 5.0);
    }

    #[test]
    fn downward_ray_hits_sloped_field() {
        let mesh = TriMesh::heightfield(10.0, 8, |x, _| x * 0.5);
        let t = mesh
            .raycast(Vec3::new(2.0, 100.0, 1.0), Vec3::NEG_Y)
            .expect("hit");
        assert_relative_eq!(100.0 - t, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn ray_outside_bounds_misses() {
        let mesh = TriMesh::heightfield(10.0, 2, |_, _| 0.0);
        assert!(mesh.raycast(Vec3::new(6.0, 10.0, 0.0), Vec3::NEG_Y).is_none());
    }

    #[test]
    fn ray_pointing_away_misses() {
        let mesh = TriMesh::heightfield(10.0, 2, |_, _| 0.0);
        assert!(mesh.raycast(Vec3::new(0.0, 10.0, 0.0), Vec3::Y).is_none());
    }
}
