//! Province partitioning: step 5 of the terrain pipeline.
//!
//! A Lloyd-relaxed nearest-seed partition: `controls.province_count` seeds
//! are drawn from the `Province` sub-stream, every face joins its nearest
//! seed, then each seed is recentered to the centroid of its faces and the
//! assignment repeats for `controls.province_relax_iterations` rounds. The
//! face assignment is then walked once more to derive each province's
//! outer-edge list and the province-adjacency graph those edges imply.
use std::collections::BTreeSet;

use crate::controls::Controls;
use crate::mesh::Mesh;
use atlas_core::FaceId;
use atlas_rng::Seeded;
use atlas_rng::Step;

#[derive(Debug, Clone)]
pub struct Provinces {
    pub province_of: Vec<u32>,
    /// Per province: every `(face, neighbor)` pair where `face` belongs to
    /// this province and `neighbor` belongs to a different one — the
    /// outward-facing boundary of the province in mesh-adjacency terms.
    pub outer_edges: Vec<Vec<(FaceId, FaceId)>>,
    /// Per province: the sorted, deduplicated set of province ids reachable
    /// across one of its outer edges.
    pub adjacency: Vec<Vec<u32>>,
}

fn nearest_seed(point: (f64, f64), seeds: &[(f64, f64)]) -> u32 {
    let mut best = 0usize;
    let mut best_dist = f64::MAX;
    for (i, &seed) in seeds.iter().enumerate() {
        let dist = (point.0 - seed.0).powi(2) + (point.1 - seed.1).powi(2);
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best as u32
}

/// Partition every face into one of `controls.province_count` provinces.
pub fn assign_provinces(mesh: &Mesh, controls: &Controls) -> Provinces {
    let face_count = mesh.face_count();
    let province_count = controls.province_count.min(face_count.max(1) as u32).max(1);

    let mut rng = Seeded::from_seed_step(controls.seed, Step::Province);
    let mut picked = Vec::with_capacity(province_count as usize);
    let mut pool: Vec<usize> = (0..face_count).collect();
    for _ in 0..province_count {
        if pool.is_empty() {
            break;
        }
        let idx = rng.next_below(pool.len() as u32) as usize;
        picked.push(pool.swap_remove(idx));
    }
    let mut seeds: Vec<(f64, f64)> = picked.iter().map(|&f| mesh.centroid(f as u32)).collect();

    let mut province_of = vec![0u32; face_count];
    for round in 0..=controls.province_relax_iterations {
        for (i, &centroid) in mesh.centroids.iter().enumerate() {
            province_of[i] = nearest_seed(centroid, &seeds);
        }
        if round == controls.province_relax_iterations {
            break;
        }
        let mut sum = vec![(0.0, 0.0); seeds.len()];
        let mut count = vec![0u32; seeds.len()];
        for (i, &centroid) in mesh.centroids.iter().enumerate() {
            let p = province_of[i] as usize;
            sum[p].0 += centroid.0;
            sum[p].1 += centroid.1;
            count[p] += 1;
        }
        for (i, seed) in seeds.iter_mut().enumerate() {
            if count[i] > 0 {
                *seed = (sum[i].0 / count[i] as f64, sum[i].1 / count[i] as f64);
            }
        }
    }

    let province_count = seeds.len();
    let mut outer_edges: Vec<Vec<(FaceId, FaceId)>> = vec![Vec::new(); province_count];
    let mut adjacency_sets: Vec<BTreeSet<u32>> = vec![BTreeSet::new(); province_count];
    for face in 0..face_count as FaceId {
        let province = province_of[face as usize] as usize;
        for &neighbor in mesh.neighbors_of(face) {
            let neighbor_province = province_of[neighbor as usize];
            if neighbor_province as usize != province {
                outer_edges[province].push((face, neighbor));
                adjacency_sets[province].insert(neighbor_province);
            }
        }
    }
    let adjacency: Vec<Vec<u32>> = adjacency_sets.into_iter().map(|set| set.into_iter().collect()).collect();

    Provinces {
        province_of,
        outer_edges,
        adjacency,
    }
}
