//! Octree color quantization over all four channels.
//!
//! Each level splits on one bit of A, R, G and B, so a node has up to 16 children and
//! a full-depth path identifies an exact color. Reduction folds the deepest nodes into
//! their parents until the leaf count fits the requested palette size.

use crate::pixel::{pack, unpack};

/// Depth of a full color path.
pub const MAX_DEPTH: usize = 8;

/// Handle to a node in the quantizer's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default)]
struct Node {
    /// Channel sums in R, G, B, A order.
    sum: [u64; 4],
    pixel_count: u64,
    palette_index: usize,
    children: [Option<NodeId>; 16],
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.pixel_count > 0
    }
}

#[inline]
fn child_index(color: [u8; 4], level: usize) -> usize {
    let mask = 0x80u8 >> level;
    let [r, g, b, a] = color;
    (usize::from(a & mask != 0) << 3)
        | (usize::from(r & mask != 0) << 2)
        | (usize::from(g & mask != 0) << 1)
        | usize::from(b & mask != 0)
}

#[inline]
fn channels(p: u32) -> [u8; 4] {
    let c = unpack(p);
    [c.r, c.g, c.b, c.a]
}

/// Octree quantizer for one palette build.
///
/// Feed every pixel with [`add_color`](Self::add_color), call
/// [`make_palette`](Self::make_palette) once, then map pixels with
/// [`palette_index`](Self::palette_index). Colors added after the palette is made are
/// ignored.
#[derive(Debug, Clone)]
pub struct OctreeQuantizer {
    nodes: Vec<Node>,
    /// Inner nodes by depth, in creation order.
    levels: [Vec<NodeId>; MAX_DEPTH],
    finalized: bool,
}

impl Default for OctreeQuantizer {
    fn default() -> Self {
        Self::new()
    }
}

impl OctreeQuantizer {
    const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        let mut levels: [Vec<NodeId>; MAX_DEPTH] = Default::default();
        levels[0].push(Self::ROOT);
        Self {
            nodes: vec![Node::default()],
            levels,
            finalized: false,
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, depth: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::default());
        if depth < MAX_DEPTH {
            self.levels[depth].push(id);
        }
        id
    }

    pub fn is_empty(&self) -> bool {
        let root = self.node(Self::ROOT);
        !root.is_leaf() && root.children.iter().all(Option::is_none)
    }

    pub fn add_color(&mut self, color: u32) {
        if self.finalized {
            return;
        }
        let c = channels(color);
        let mut node = Self::ROOT;
        for level in 0..MAX_DEPTH {
            let idx = child_index(c, level);
            node = match self.node(node).children[idx] {
                Some(child) => child,
                None => {
                    let child = self.alloc(level + 1);
                    self.node_mut(node).children[idx] = Some(child);
                    child
                }
            };
        }
        let leaf = self.node_mut(node);
        for (sum, v) in leaf.sum.iter_mut().zip(c) {
            *sum += u64::from(v);
        }
        leaf.pixel_count += 1;
    }

    /// Leaves in depth-first pre-order, children visited by ascending index.
    fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if node.is_leaf() {
                out.push(id);
            } else {
                stack.extend(node.children.iter().rev().flatten());
            }
        }
        out
    }

    /// Fold every child of `id` into it, returning how many leaves that removed.
    fn merge_children(&mut self, id: NodeId) -> usize {
        let children = std::mem::take(&mut self.node_mut(id).children);
        let mut merged: usize = 0;
        for child in children.into_iter().flatten() {
            let (sum, count) = {
                let c = self.node(child);
                (c.sum, c.pixel_count)
            };
            let node = self.node_mut(id);
            for (dst, src) in node.sum.iter_mut().zip(sum) {
                *dst += src;
            }
            node.pixel_count += count;
            merged += 1;
        }
        merged.saturating_sub(1)
    }

    /// Reduce the tree to at most `max_colors` leaves and return their average colors.
    ///
    /// Leaf order defines the palette order and the indices returned by
    /// [`palette_index`](Self::palette_index).
    pub fn make_palette(&mut self, max_colors: usize) -> Vec<u32> {
        self.finalized = true;
        if max_colors == 0 {
            return Vec::new();
        }

        let mut leaf_count = self.leaves().len();
        'reduce: for depth in (0..MAX_DEPTH).rev() {
            if leaf_count <= max_colors {
                break;
            }
            let level = std::mem::take(&mut self.levels[depth]);
            for id in level {
                leaf_count -= self.merge_children(id);
                if leaf_count <= max_colors {
                    break 'reduce;
                }
            }
        }

        let mut palette = Vec::with_capacity(leaf_count.min(max_colors));
        for (index, id) in self.leaves().into_iter().take(max_colors).enumerate() {
            let node = self.node_mut(id);
            node.palette_index = index;
            let count = node.pixel_count.max(1);
            let [r, g, b, a] = node.sum.map(|s| (s / count).min(255) as u8);
            palette.push(pack(r, g, b, a));
        }
        palette
    }

    /// Palette index for `color`. Where the exact path was merged away the walk falls
    /// back to the first child present. `None` before the palette is made or when no
    /// colors were added.
    pub fn palette_index(&self, color: u32) -> Option<usize> {
        if !self.finalized {
            return None;
        }
        let c = channels(color);
        let mut id = Self::ROOT;
        for level in 0..=MAX_DEPTH {
            let node = self.node(id);
            if node.is_leaf() {
                return Some(node.palette_index);
            }
            if level == MAX_DEPTH {
                break;
            }
            let exact = node.children[child_index(c, level)];
            id = exact.or_else(|| node.children.iter().flatten().next().copied())?;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_index_bit_order() {
        assert_eq!(child_index([0x80, 0, 0, 0], 0), 4);
        assert_eq!(child_index([0, 0x80, 0, 0], 0), 2);
        assert_eq!(child_index([0, 0, 0x80, 0], 0), 1);
        assert_eq!(child_index([0, 0, 0, 0x80], 0), 8);
        assert_eq!(child_index([0x01, 0x01, 0x01, 0x01], 7), 15);
        assert_eq!(child_index([0x01, 0x01, 0x01, 0x01], 6), 0);
    }

    #[test]
    fn few_colors_are_exact() {
        let colors = [0xFF00_0000, 0xFFFF_0000, 0x8000_FF00, 0xFF12_3456];
        let mut q = OctreeQuantizer::new();
        for _ in 0..3 {
            for &c in &colors {
                q.add_color(c);
            }
        }
        let palette = q.make_palette(16);
        assert_eq!(palette.len(), colors.len());
        for &c in &colors {
            let i = q.palette_index(c).unwrap();
            assert_eq!(palette[i], c);
        }
    }

    #[test]
    fn palette_is_in_tree_order() {
        let mut q = OctreeQuantizer::new();
        q.add_color(0xFFFF_FFFF);
        q.add_color(0x0000_0000);
        let palette = q.make_palette(4);
        assert_eq!(palette, [0x0000_0000, 0xFFFF_FFFF]);
        assert_eq!(q.palette_index(0), Some(0));
    }

    #[test]
    fn reduction_respects_max_colors() {
        let mut q = OctreeQuantizer::new();
        for i in 0..4096u32 {
            q.add_color(0xFF00_0000 | (i * 4099));
        }
        let palette = q.make_palette(16);
        assert!(!palette.is_empty());
        assert!(palette.len() <= 16);
        for i in 0..4096u32 {
            let idx = q.palette_index(0xFF00_0000 | (i * 4099)).unwrap();
            assert!(idx < palette.len());
        }
    }

    #[test]
    fn merged_colors_average() {
        let mut q = OctreeQuantizer::new();
        q.add_color(pack(10, 0, 0, 255));
        q.add_color(pack(11, 0, 0, 255));
        let palette = q.make_palette(1);
        assert_eq!(palette, [pack(10, 0, 0, 255)]);
        assert_eq!(q.palette_index(pack(200, 200, 200, 0)), Some(0));
    }

    #[test]
    fn unfinalized_or_empty_has_no_index() {
        let mut q = OctreeQuantizer::new();
        assert!(q.is_empty());
        q.add_color(0xFFFF_FFFF);
        assert_eq!(q.palette_index(0xFFFF_FFFF), None);

        let mut empty = OctreeQuantizer::new();
        assert!(empty.make_palette(256).is_empty());
        assert_eq!(empty.palette_index(0), None);
    }
}
