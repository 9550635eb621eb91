use super::vertex::{v, Vertex};

pub fn cube_mesh() -> (Vec<Vertex>, Vec<u32>) {
    let p = |x, y, z| [x, y, z];

    let verts = vec![
        // Right face (+X)
        v(p(0.5, -0.5, -0.5), [1.0, 0.0, 0.0]),
        v(p(0.5, 0.5, -0.5), [1.0, 0.0, 0.0]),
        v(p(0.5, 0.5, 0.5), [1.0, 0.0, 0.0]),
        v(p(0.5, -0.5, 0.5), [1.0, 0.0, 0.0]),
        // Left face (-X)
        v(p(-0.5, -0.5, 0.5), [-1.0, 0.0, 0.0]),
        v(p(-0.5, 0.5, 0.5), [-1.0, 0.0, 0.0]),
        v(p(-0.5, 0.5, -0.5), [-1.0, 0.0, 0.0]),
        v(p(-0.5, -0.5, -0.5), [-1.0, 0.0, 0.0]),
        // Top face (+Y)
        v(p(-0.5, 0.5, -0.5), [0.0, 1.0, 0.0]),
        v(p(-0.5, 0.5, 0.5), [0.0, 1.0, 0.0]),
        v(p(0.5, 0.5, 0.5), [0.0, 1.0, 0.0]),
        v(p(0.5, 0.5, -0.5), [0.0, 1.0, 0.0]),
        // Bottom face (-Y)
        v(p(-0.5, -0.5, 0.5), [0.0, -1.0, 0.0]),
        v(p(-0.5, -0.5, -0.5), [0.0, -1.0, 0.0]),
        v(p(0.5, -0.5, -0.5), [0.0, -1.0, 0.0]),
        v(p(0.5, -0.5, 0.5), [0.0, -1.0, 0.0]),
        // Front face (+Z)
        v(p(-0.5, -0.5, 0.5), [0.0, 0.0, 1.0]),
        v(p(0.5, -0.5, 0.5), [0.0, 0.0, 1.0]),
        v(p(0.5, 0.5, 0.5), [0.0, 0.0, 1.0]),
        v(p(-0.5, 0.5, 0.5), [0.0, 0.0, 1.0]),
        // Back face (-Z)
        v(p(0.5, -0.5, -0.5), [0.0, 0.0, -1.0]),
        v(p(-0.5, -0.5, -0.5), [0.0, 0.0, -1.0]),
        v(p(-0.5, 0.5, -0.5), [0.0, 0.0, -1.0]),
        v(p(0.5, 0.5, -0.5), [0.0, 0.0, -1.0]),
    ];

    let mut indices = Vec::with_capacity(36);
    for face in 0..6u32 {
        let base = face * 4;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    (verts, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_mesh_has_six_faces() {
        let (vertices, indices) = cube_mesh();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }
}
