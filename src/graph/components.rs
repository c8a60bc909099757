use rustc_hash::FxHashMap;
use tracing::debug;

use super::Graph;

fn find(parent: &mut [u32], mut x: u32) -> u32 {
    while parent[x as usize] != x {
        parent[x as usize] = parent[parent[x as usize] as usize];
        x = parent[x as usize];
    }
    x
}

fn union(parent: &mut [u32], rank: &mut [u8], x: u32, y: u32) {
    let px = find(parent, x);
    let py = find(parent, y);
    if px == py {
        return;
    }
    match rank[px as usize].cmp(&rank[py as usize]) {
        std::cmp::Ordering::Less => parent[px as usize] = py,
        std::cmp::Ordering::Greater => parent[py as usize] = px,
        std::cmp::Ordering::Equal => {
            parent[py as usize] = px;
            rank[px as usize] += 1;
        }
    }
}

impl<N, E> Graph<N, E> {
    /// Recomputes connected-component labels and returns the component
    /// count.
    ///
    /// Edge direction is ignored. Labels are contiguous from 0 in order of
    /// each component's lowest vertex id.
    pub fn update_components(&mut self) -> usize {
        let n = self.vertices.len();
        let mut parent: Vec<u32> = (0..n as u32).collect();
        let mut rank: Vec<u8> = vec![0; n];

        for link in self.edges.iter().flatten() {
            union(&mut parent, &mut rank, link.source.0, link.target.0);
        }

        let mut labels: FxHashMap<u32, u32> = FxHashMap::default();
        for slot in 0..n {
            if self.vertices[slot].is_none() {
                self.props.component[slot] = None;
                continue;
            }
            let root = find(&mut parent, slot as u32);
            let next = labels.len() as u32;
            let label = *labels.entry(root).or_insert(next);
            self.props.component[slot] = Some(label);
        }
        self.component_count = labels.len();
        debug!(
            vertices = self.vertex_count,
            components = self.component_count,
            "graph.update_components"
        );
        self.component_count
    }
}
