//! Mesh construction: step 1 of the terrain pipeline.
//!
//! True Voronoi/Delaunay mesh construction is an external collaborator
//! this system treats as out of scope. This module stands in for it with a
//! deterministic lattice whose cells are jittered by the `Mesh` RNG
//! sub-stream, which is enough structure for every downstream step (water,
//! mountains, rivers, provinces, navigation) to operate on a face graph
//! with centroids and edge-sharing adjacency.
use crate::controls::Controls;
use atlas_core::FaceId;
use atlas_rng::Seeded;
use atlas_rng::Step;

/// Faces with centroids and edge-sharing neighbor lists, indexed by
/// [`FaceId`].
#[derive(Debug, Clone)]
pub struct Mesh {
    pub cols: u32,
    pub rows: u32,
    pub centroids: Vec<(f64, f64)>,
    pub neighbors: Vec<Vec<FaceId>>,
}

impl Mesh {
    pub fn face_count(&self) -> usize {
        self.centroids.len()
    }
    pub fn centroid(&self, face: FaceId) -> (f64, f64) {
        self.centroids[face as usize]
    }
    pub fn neighbors_of(&self, face: FaceId) -> &[FaceId] {
        &self.neighbors[face as usize]
    }
}

/// Upper bound on face count, keeping a single publish's generation cost
/// bounded regardless of requested map dimensions or mesh spacing.
const MAX_FACES: u32 = 4096;

/// Build a deterministic lattice mesh sized from `(map_width, map_height)`
/// and `controls.mesh_spacing`, jittering centroids with the `Mesh`
/// sub-stream derived from `controls.seed`.
pub fn build_mesh(map_width: u32, map_height: u32, controls: &Controls) -> Mesh {
    let mut rng = Seeded::from_seed_step(controls.seed, Step::Mesh);
    let spacing = controls.mesh_spacing.max(1.0);
    let mut cols = ((map_width as f64 / spacing).round() as u32).max(2);
    let mut rows = ((map_height as f64 / spacing).round() as u32).max(2);
    while cols.saturating_mul(rows) > MAX_FACES {
        if cols > rows {
            cols -= 1;
        } else {
            rows -= 1;
        }
    }
    let cell_w = map_width as f64 / cols as f64;
    let cell_h = map_height as f64 / rows as f64;
    let jitter = (cell_w.min(cell_h)) * 0.25;

    let mut centroids = Vec::with_capacity((cols * rows) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let base_x = (col as f64 + 0.5) * cell_w;
            let base_y = (row as f64 + 0.5) * cell_h;
            let dx = rng.next_range(-jitter, jitter);
            let dy = rng.next_range(-jitter, jitter);
            centroids.push((base_x + dx, base_y + dy));
        }
    }

    let index = |r: i64, c: i64| -> Option<FaceId> {
        if r < 0 || c < 0 || r >= rows as i64 || c >= cols as i64 {
            None
        } else {
            Some((r as u32 * cols + c as u32) as FaceId)
        }
    };
    let mut neighbors = Vec::with_capacity(centroids.len());
    for row in 0..rows as i64 {
        for col in 0..cols as i64 {
            let mut adj = Vec::with_capacity(4);
            for (dr, dc) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                if let Some(n) = index(row + dr, col + dc) {
                    adj.push(n);
                }
            }
            neighbors.push(adj);
        }
    }

    Mesh {
        cols,
        rows,
        centroids,
        neighbors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::normalize;
    use crate::coerce::RawControls;

    #[test]
    fn mesh_is_deterministic_for_equal_controls() {
        let controls = normalize(&RawControls::new());
        let a = build_mesh(1560, 844, &controls);
        let b = build_mesh(1560, 844, &controls);
        assert_eq!(a.centroids, b.centroids);
        assert_eq!(a.neighbors, b.neighbors);
    }

    #[test]
    fn every_neighbor_relationship_is_mutual() {
        let controls = normalize(&RawControls::new());
        let mesh = build_mesh(640, 480, &controls);
        for (face, adj) in mesh.neighbors.iter().enumerate() {
            for &n in adj {
                assert!(mesh.neighbors_of(n).contains(&(face as FaceId)));
            }
        }
    }

    #[test]
    fn face_count_is_bounded() {
        let mut raw = RawControls::new();
        raw.insert("meshSpacing".into(), serde_json::json!(4.0));
        let controls = normalize(&raw);
        let mesh = build_mesh(4096, 4096, &controls);
        assert!(mesh.face_count() as u32 <= MAX_FACES);
    }
}
