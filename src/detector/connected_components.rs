/// Connected components over a foreground mask
/// Two-pass labelling with union-find, 8-connectivity
use crate::models::BitMatrix;

/// Union-Find data structure
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grandparent = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grandparent;
            x = grandparent;
        }
        x
    }

    fn union(&mut self, x: u32, y: u32) {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x != root_y {
            self.parent[root_x.max(root_y) as usize] = root_x.min(root_y);
        }
    }
}

/// Bounding box and pixel count of one component (inclusive edges)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// Leftmost column
    pub min_x: usize,
    /// Topmost row
    pub min_y: usize,
    /// Rightmost column
    pub max_x: usize,
    /// Bottom row
    pub max_y: usize,
    /// Number of foreground pixels
    pub pixels: usize,
}

impl Component {
    /// Width in pixels
    pub fn width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.max_y - self.min_y + 1
    }
}

/// Find connected foreground regions, ordered by first pixel in raster order
pub fn find_components(matrix: &BitMatrix) -> Vec<Component> {
    label_components(matrix).1
}

/// Like [`find_components`], plus a row-major label per pixel: 0 for
/// background, `i + 1` for pixels of `components[i]`
pub fn label_components(matrix: &BitMatrix) -> (Vec<u32>, Vec<Component>) {
    let width = matrix.width();
    let height = matrix.height();

    let mut labels = vec![0u32; width * height];
    let mut next_label = 1u32;
    // label 0 is background
    let mut uf = UnionFind::new(width * height + 1);

    // First pass: provisional labels from the already visited neighbours
    for y in 0..height {
        for x in 0..width {
            if !matrix.get(x, y) {
                continue;
            }

            let mut neighbours = [0u32; 4];
            let mut n = 0;
            if x > 0 && matrix.get(x - 1, y) {
                neighbours[n] = labels[y * width + x - 1];
                n += 1;
            }
            if y > 0 {
                let row = (y - 1) * width;
                if x > 0 && matrix.get(x - 1, y - 1) {
                    neighbours[n] = labels[row + x - 1];
                    n += 1;
                }
                if matrix.get(x, y - 1) {
                    neighbours[n] = labels[row + x];
                    n += 1;
                }
                if x + 1 < width && matrix.get(x + 1, y - 1) {
                    neighbours[n] = labels[row + x + 1];
                    n += 1;
                }
            }

            let idx = y * width + x;
            if n == 0 {
                labels[idx] = next_label;
                next_label += 1;
                continue;
            }

            let min_label = neighbours[..n].iter().copied().min().unwrap_or(next_label);
            labels[idx] = min_label;
            for &label in &neighbours[..n] {
                if label != min_label {
                    uf.union(min_label, label);
                }
            }
        }
    }

    // Second pass: accumulate per root and relabel with component numbers
    let mut slots: Vec<Option<usize>> = vec![None; next_label as usize];
    let mut components: Vec<Component> = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let label = labels[idx];
            if label == 0 {
                continue;
            }
            let root = uf.find(label) as usize;
            let slot = match slots[root] {
                Some(slot) => {
                    let c = &mut components[slot];
                    c.min_x = c.min_x.min(x);
                    c.min_y = c.min_y.min(y);
                    c.max_x = c.max_x.max(x);
                    c.max_y = c.max_y.max(y);
                    c.pixels += 1;
                    slot
                }
                None => {
                    slots[root] = Some(components.len());
                    components.push(Component {
                        min_x: x,
                        min_y: y,
                        max_x: x,
                        max_y: y,
                        pixels: 1,
                    });
                    components.len() - 1
                }
            };
            labels[idx] = slot as u32 + 1;
        }
    }

    (labels, components)
}
