use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

use super::{sort_neighbors, IndexView, Neighbor, ProximityIndex, Scored};
use crate::types::ProxHandle;

/// Exact index that scans every entry.
///
/// Insert and remove are O(1); queries are O(n log k).
#[derive(Default)]
pub struct LinearIndex {
    members: Vec<ProxHandle>,
    position: FxHashMap<ProxHandle, usize>,
}

impl LinearIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProximityIndex for LinearIndex {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn insert(&mut self, _view: IndexView<'_>, handle: ProxHandle) {
        if self.position.contains_key(&handle) {
            return;
        }
        self.position.insert(handle, self.members.len());
        self.members.push(handle);
    }

    fn insert_batch(&mut self, view: IndexView<'_>, handles: &[ProxHandle]) {
        self.members.reserve(handles.len());
        self.position.reserve(handles.len());
        for &handle in handles {
            self.insert(view, handle);
        }
    }

    fn remove(&mut self, _view: IndexView<'_>, handle: ProxHandle) {
        let Some(pos) = self.position.remove(&handle) else {
            return;
        };
        self.members.swap_remove(pos);
        if let Some(&moved) = self.members.get(pos) {
            self.position.insert(moved, pos);
        }
    }

    fn k_nearest(&self, view: IndexView<'_>, query: &[f64], k: usize) -> Vec<Neighbor> {
        if k == 0 {
            return Vec::new();
        }
        let mut heap: BinaryHeap<Scored> = BinaryHeap::with_capacity(k + 1);
        for &handle in &self.members {
            let Some(distance) = view.distance_to(handle, query) else {
                continue;
            };
            let candidate = Scored(Neighbor { handle, distance });
            if heap.len() < k {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                heap.pop();
                heap.push(candidate);
            }
        }
        heap.into_sorted_vec().into_iter().map(|s| s.0).collect()
    }

    fn within_radius(&self, view: IndexView<'_>, query: &[f64], radius: f64) -> Vec<Neighbor> {
        let mut found: Vec<Neighbor> = self
            .members
            .iter()
            .filter_map(|&handle| {
                let distance = view.distance_to(handle, query)?;
                (distance <= radius).then_some(Neighbor { handle, distance })
            })
            .collect();
        sort_neighbors(&mut found);
        found
    }

    fn clear(&mut self) {
        self.members.clear();
        self.position.clear();
    }

    fn len(&self) -> usize {
        self.members.len()
    }
}
