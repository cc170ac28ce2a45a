use crate::error::{try_alloc, QRResult};

// Bit matrix
//------------------------------------------------------------------------------

/// Rectangular grid of modules, packed 32 per word, rows contiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    w: u32,
    h: u32,
    row_words: usize,
    bits: Vec<u32>,
}

impl BitMatrix {
    pub fn new(w: u32, h: u32) -> QRResult<Self> {
        let row_words = (w as usize).div_ceil(32);
        let bits = try_alloc(row_words.saturating_mul(h as usize), 0u32)?;
        Ok(Self { w, h, row_words, bits })
    }

    pub fn square(side: u32) -> QRResult<Self> {
        Self::new(side, side)
    }

    pub fn width(&self) -> u32 {
        self.w
    }

    pub fn height(&self) -> u32 {
        self.h
    }

    fn index(&self, x: u32, y: u32) -> (usize, u32) {
        debug_assert!(x < self.w && y < self.h, "({x}, {y}) outside {}x{}", self.w, self.h);
        (y as usize * self.row_words + (x as usize >> 5), x & 31)
    }

    /// Returns `false` for coordinates outside the matrix.
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.w || y >= self.h {
            return false;
        }
        let (i, b) = self.index(x, y);
        self.bits[i] >> b & 1 == 1
    }

    pub fn set(&mut self, x: u32, y: u32) {
        let (i, b) = self.index(x, y);
        self.bits[i] |= 1 << b;
    }

    pub fn unset(&mut self, x: u32, y: u32) {
        let (i, b) = self.index(x, y);
        self.bits[i] &= !(1 << b);
    }

    /// Sets the `w`x`h` block whose top-left corner is `(left, top)`, clipped to the matrix.
    pub fn set_region(&mut self, left: u32, top: u32, w: u32, h: u32) {
        let right = left.saturating_add(w).min(self.w);
        let bottom = top.saturating_add(h).min(self.h);
        for y in top..bottom {
            for x in left..right {
                self.set(x, y);
            }
        }
    }

    pub fn count_set(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Row-major iterator over `(x, y, is_set)`.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, bool)> + '_ {
        (0..self.h).flat_map(move |y| (0..self.w).map(move |x| (x, y, self.get(x, y))))
    }
}

#[cfg(test)]
mod bit_matrix_tests {
    use super::BitMatrix;

    #[test]
    fn test_get_set() {
        let mut bm = BitMatrix::new(40, 3).unwrap();
        assert!(!bm.get(33, 1));
        bm.set(33, 1);
        assert!(bm.get(33, 1));
        assert!(!bm.get(32, 1));
        assert!(!bm.get(33, 0));
        bm.unset(33, 1);
        assert!(!bm.get(33, 1));
    }

    #[test]
    fn test_out_of_bounds_reads_unset() {
        let mut bm = BitMatrix::square(5).unwrap();
        bm.set_region(0, 0, 5, 5);
        assert!(!bm.get(5, 0));
        assert!(!bm.get(0, 5));
    }

    #[test]
    fn test_set_region_clips() {
        let mut bm = BitMatrix::square(10).unwrap();
        bm.set_region(8, 8, 4, 4);
        assert_eq!(bm.count_set(), 4);
        assert!(bm.get(9, 9));
    }

    #[test]
    fn test_iter_row_major() {
        let mut bm = BitMatrix::new(3, 2).unwrap();
        bm.set(2, 0);
        let cells: Vec<_> = bm.iter().collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[2], (2, 0, true));
        assert_eq!(cells[3], (0, 1, false));
    }
}
