use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

use super::{sort_neighbors, IndexView, Neighbor, ProximityIndex, Scored};
use crate::types::ProxHandle;

type LinkList = SmallVec<[ProxHandle; 16]>;

/// Tuning knobs for [`NavigableIndex`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigableParams {
    /// Links created for each inserted entry.
    pub degree: usize,
    /// Beam width of the greedy search.
    pub search_width: usize,
    /// Below this many entries queries scan every entry.
    pub exhaustive_below: usize,
    /// Entry points spread across the members list for each search.
    pub seeds: usize,
    /// Longest link list an entry may hold. Never below `degree`.
    pub max_links: usize,
}

impl Default for NavigableParams {
    fn default() -> Self {
        Self {
            degree: 12,
            search_width: 32,
            exhaustive_below: 32,
            seeds: 4,
            max_links: 24,
        }
    }
}

/// Approximate index over a navigable neighbor graph.
///
/// Each insert links the new entry to its `degree` nearest existing entries
/// in both directions. A list that grows past `max_links` is trimmed back to
/// its `max_links` nearest, so links are not always symmetric. Queries run a
/// beam search from a few fixed seeds. Radius queries always scan, so they
/// never miss an entry.
pub struct NavigableIndex {
    params: NavigableParams,
    members: Vec<ProxHandle>,
    position: FxHashMap<ProxHandle, usize>,
    links: FxHashMap<ProxHandle, LinkList>,
    /// Entries whose link list holds the key.
    incoming: FxHashMap<ProxHandle, FxHashSet<ProxHandle>>,
}

impl Default for NavigableIndex {
    fn default() -> Self {
        Self::new(NavigableParams::default())
    }
}

impl NavigableIndex {
    /// Creates an empty index.
    pub fn new(params: NavigableParams) -> Self {
        let degree = params.degree.max(1);
        Self {
            params: NavigableParams {
                degree,
                search_width: params.search_width.max(1),
                seeds: params.seeds.max(1),
                max_links: params.max_links.max(degree),
                ..params
            },
            members: Vec::new(),
            position: FxHashMap::default(),
            links: FxHashMap::default(),
            incoming: FxHashMap::default(),
        }
    }

    /// Active parameters.
    pub fn params(&self) -> NavigableParams {
        self.params
    }

    /// Links held by `handle`.
    pub fn links(&self, handle: ProxHandle) -> &[ProxHandle] {
        self.links.get(&handle).map_or(&[], |l| l.as_slice())
    }

    fn scan(&self, view: IndexView<'_>, query: &[f64], k: usize) -> Vec<Neighbor> {
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

    fn seed_handles(&self) -> impl Iterator<Item = ProxHandle> + '_ {
        let n = self.members.len();
        let count = self.params.seeds.min(n);
        (0..count).map(move |i| self.members[i * n / count])
    }

    /// Beam search returning up to `width` closest entries found.
    fn beam_search(&self, view: IndexView<'_>, query: &[f64], width: usize) -> Vec<Neighbor> {
        let mut visited: FxHashSet<ProxHandle> = FxHashSet::default();
        let mut frontier: BinaryHeap<Reverse<Scored>> = BinaryHeap::new();
        let mut best: BinaryHeap<Scored> = BinaryHeap::with_capacity(width + 1);

        for seed in self.seed_handles() {
            if !visited.insert(seed) {
                continue;
            }
            if let Some(distance) = view.distance_to(seed, query) {
                let s = Scored(Neighbor { handle: seed, distance });
                frontier.push(Reverse(s));
                best.push(s);
            }
        }
        while best.len() > width {
            best.pop();
        }

        while let Some(Reverse(current)) = frontier.pop() {
            if best.len() >= width && best.peek().is_some_and(|worst| current > *worst) {
                break;
            }
            for &next in self.links(current.0.handle) {
                if !visited.insert(next) {
                    continue;
                }
                let Some(distance) = view.distance_to(next, query) else {
                    continue;
                };
                let s = Scored(Neighbor { handle: next, distance });
                if best.len() < width {
                    best.push(s);
                    frontier.push(Reverse(s));
                } else if best.peek().is_some_and(|worst| s < *worst) {
                    best.pop();
                    best.push(s);
                    frontier.push(Reverse(s));
                }
            }
        }
        best.into_sorted_vec().into_iter().map(|s| s.0).collect()
    }

    fn candidates(&self, view: IndexView<'_>, query: &[f64], k: usize) -> Vec<Neighbor> {
        if self.members.len() < self.params.exhaustive_below.max(1) {
            self.scan(view, query, k)
        } else {
            let mut found = self.beam_search(view, query, self.params.search_width.max(k));
            found.truncate(k);
            found
        }
    }

    fn connect(&mut self, view: IndexView<'_>, a: ProxHandle, b: ProxHandle) {
        if a == b {
            return;
        }
        self.link(view, a, b);
        self.link(view, b, a);
    }

    /// Adds `to` to the list of `from`, trimming the list to its nearest.
    fn link(&mut self, view: IndexView<'_>, from: ProxHandle, to: ProxHandle) {
        let max_links = self.params.max_links;
        let list = self.links.entry(from).or_default();
        if list.contains(&to) {
            return;
        }
        list.push(to);
        self.incoming.entry(to).or_default().insert(from);
        if list.len() <= max_links {
            return;
        }

        let mut ranked: Vec<Neighbor> = list
            .iter()
            .filter_map(|&handle| {
                let distance = view.distance_between(from, handle)?;
                Some(Neighbor { handle, distance })
            })
            .collect();
        sort_neighbors(&mut ranked);
        let keep: LinkList = ranked.iter().take(max_links).map(|n| n.handle).collect();
        let dropped: Vec<ProxHandle> = list
            .iter()
            .copied()
            .filter(|h| !keep.contains(h))
            .collect();
        *list = keep;
        for handle in dropped {
            if let Some(sources) = self.incoming.get_mut(&handle) {
                sources.remove(&from);
            }
        }
    }
}

impl ProximityIndex for NavigableIndex {
    fn name(&self) -> &'static str {
        "navigable"
    }

    fn insert(&mut self, view: IndexView<'_>, handle: ProxHandle) {
        if self.position.contains_key(&handle) {
            return;
        }
        let Some(entry) = view.entry(handle) else {
            return;
        };
        let nearest = self.candidates(view, &entry.coords, self.params.degree);
        self.position.insert(handle, self.members.len());
        self.members.push(handle);
        self.links.entry(handle).or_default();
        for n in &nearest {
            self.connect(view, handle, n.handle);
        }
        trace!(entry = %handle, links = nearest.len(), "navigable.insert");
    }

    fn remove(&mut self, view: IndexView<'_>, handle: ProxHandle) {
        let Some(pos) = self.position.remove(&handle) else {
            return;
        };
        self.members.swap_remove(pos);
        if let Some(&moved) = self.members.get(pos) {
            self.position.insert(moved, pos);
        }

        let outgoing = self.links.remove(&handle).unwrap_or_default();
        for n in &outgoing {
            if let Some(sources) = self.incoming.get_mut(n) {
                sources.remove(&handle);
            }
        }
        let sources = self.incoming.remove(&handle).unwrap_or_default();
        for n in &sources {
            if let Some(list) = self.links.get_mut(n) {
                list.retain(|x| *x != handle);
            }
        }
        let mut former: Vec<ProxHandle> = outgoing.into_vec();
        let extra: Vec<ProxHandle> = sources.into_iter().filter(|n| !former.contains(n)).collect();
        former.extend(extra);
        // Reconnect the orphaned neighborhood so it stays reachable.
        for (i, &a) in former.iter().enumerate() {
            let have = self.links(a).len();
            if have >= self.params.degree {
                continue;
            }
            let mut others: Vec<Neighbor> = former
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .filter_map(|(_, &b)| {
                    let distance = view.distance_between(a, b)?;
                    Some(Neighbor { handle: b, distance })
                })
                .collect();
            sort_neighbors(&mut others);
            for b in others.into_iter().take(self.params.degree - have) {
                self.connect(view, a, b.handle);
            }
        }
        trace!(entry = %handle, repaired = former.len(), "navigable.remove");
    }

    fn k_nearest(&self, view: IndexView<'_>, query: &[f64], k: usize) -> Vec<Neighbor> {
        if k == 0 || self.members.is_empty() {
            return Vec::new();
        }
        self.candidates(view, query, k)
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
        self.links.clear();
        self.incoming.clear();
    }

    fn len(&self) -> usize {
        self.members.len()
    }
}
