use glam::Vec3;

use super::node::Node;

/// Line segments between nearby nodes, rebuilt every frame into storage that
/// is allocated once. Only `segments()[..draw_range]` is live.
#[derive(Debug, Clone)]
pub struct ConnectionBuffer {
    segments: Vec<[Vec3; 2]>,
    pairs: Vec<(usize, usize)>,
    draw_range: usize,
}

impl ConnectionBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            segments: vec![[Vec3::ZERO; 2]; capacity],
            pairs: vec![(0, 0); capacity],
            draw_range: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.segments.len()
    }

    pub fn draw_range(&self) -> usize {
        self.draw_range
    }

    /// Segments emitted by the last rebuild, as group-local endpoints.
    pub fn segments(&self) -> &[[Vec3; 2]] {
        &self.segments[..self.draw_range]
    }

    /// Node index pairs matching `segments()`, always `(lower, higher)`.
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs[..self.draw_range]
    }

    /// Emits every unordered pair closer than `max_distance`, in `(i, j > i)`
    /// order, until capacity is reached. Returns the number emitted.
    pub fn rebuild(&mut self, nodes: &[Node], max_distance: f32) -> usize {
        let capacity = self.capacity();
        let max_sq = max_distance * max_distance;
        let mut count = 0;

        'outer: for (i, a) in nodes.iter().enumerate() {
            for (j, b) in nodes.iter().enumerate().skip(i + 1) {
                if count == capacity {
                    break 'outer;
                }
                if a.position.distance_squared(b.position) < max_sq {
                    self.segments[count] = [a.position, b.position];
                    self.pairs[count] = (i, j);
                    count += 1;
                }
            }
        }

        self.draw_range = count;
        count
    }
}
