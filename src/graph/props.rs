use crate::types::VertexId;

/// Tri-color traversal marker.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Color {
    /// Not discovered.
    #[default]
    White,
    /// Discovered, still on the frontier.
    Gray,
    /// Finished.
    Black,
}

/// Per-vertex property maps, indexed by vertex slot.
#[derive(Default)]
pub(crate) struct VertexProps {
    pub(crate) distance: Vec<f64>,
    pub(crate) predecessor: Vec<Option<VertexId>>,
    pub(crate) color: Vec<Color>,
    pub(crate) component: Vec<Option<u32>>,
}

impl VertexProps {
    pub(crate) fn push_default(&mut self) {
        self.distance.push(f64::INFINITY);
        self.predecessor.push(None);
        self.color.push(Color::White);
        self.component.push(None);
    }

    pub(crate) fn swap_remove(&mut self, slot: usize) {
        self.distance.swap_remove(slot);
        self.predecessor.swap_remove(slot);
        self.color.swap_remove(slot);
        self.component.swap_remove(slot);
    }

    pub(crate) fn clear(&mut self) {
        self.distance.clear();
        self.predecessor.clear();
        self.color.clear();
        self.component.clear();
    }

    /// Moves slot `from` to slot `to` (`to <= from`) during compaction.
    pub(crate) fn move_slot(&mut self, from: usize, to: usize) {
        self.distance[to] = self.distance[from];
        self.predecessor[to] = self.predecessor[from];
        self.color[to] = self.color[from];
        self.component[to] = self.component[from];
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.distance.truncate(len);
        self.predecessor.truncate(len);
        self.color.truncate(len);
        self.component.truncate(len);
    }
}
