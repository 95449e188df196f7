/// A 2D grid over an equirectangular lattice.
///
/// `x` is the longitude axis and wraps; `y` is the latitude axis and clamps at the
/// poles. Storage is row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

/// 8-neighborhood offsets `(dx, dy)` in reading order: NW, N, NE, W, E, SW, S, SE.
pub const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

impl<T: Clone + Default> Tilemap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T> Tilemap<T> {
    /// Wrap an existing row-major buffer. Returns `None` if the length doesn't match.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == width * height).then_some(Self { width, height, data })
    }

    /// Get the index into the data array, handling horizontal wrapping.
    fn index(&self, x: usize, y: usize) -> usize {
        let x = x % self.width; // Wrap horizontally
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    /// Bounds-checked lookup without wrapping.
    pub fn try_get(&self, x: usize, y: usize) -> Option<&T> {
        if x < self.width && y < self.height {
            self.data.get(y * self.width + x)
        } else {
            None
        }
    }

    /// Resolve a signed offset from `(x, y)`: x wraps modulo the width, y clamps to
    /// `[0, height - 1]` since the top and bottom rows are the poles.
    pub fn offset_clamped(&self, x: usize, y: usize, dx: i64, dy: i64) -> (usize, usize) {
        let nx = (x as i64 + dx).rem_euclid(self.width as i64) as usize;
        let ny = (y as i64 + dy).clamp(0, self.height as i64 - 1) as usize;
        (nx, ny)
    }

    /// The 8 neighbors of `(x, y)` in [`NEIGHBOR_OFFSETS`] order, with horizontal
    /// wrapping and vertical clamping. Always returns 8 positions; at a pole some of
    /// them are cells of the pole row itself.
    pub fn neighbors_8(&self, x: usize, y: usize) -> [(usize, usize); 8] {
        NEIGHBOR_OFFSETS.map(|(dx, dy)| self.offset_clamped(x, y, dx, dy))
    }

    /// Raw row-major values.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// One row of the grid.
    pub fn row(&self, y: usize) -> &[T] {
        &self.data[y * self.width..(y + 1) * self.width]
    }
}
