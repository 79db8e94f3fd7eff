use crate::Float;

// Ghost cell widths, same on both axes. The lower side needs 1 cell because
// interpolation of a staggered component can reach ix - 1; the upper side
// needs 2 because a split trajectory can deposit as far as ix + 2.
pub const GC_LOW: usize = 1;
pub const GC_HIGH: usize = 2;
pub const GC: usize = GC_LOW + GC_HIGH;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;
    #[inline(always)]
    fn add(self, o: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + o.x,
            y: self.y + o.y,
            z: self.z + o.z,
        }
    }
}

impl std::ops::AddAssign for Vec3 {
    #[inline(always)]
    fn add_assign(&mut self, o: Vec3) {
        self.x += o.x;
        self.y += o.y;
        self.z += o.z;
    }
}

impl std::ops::Mul<Vec3> for Float {
    type Output = Vec3;
    #[inline(always)]
    fn mul(self, v: Vec3) -> Vec3 {
        Vec3 {
            x: self * v.x,
            y: self * v.y,
            z: self * v.z,
        }
    }
}

// A 2D grid of 3-component vectors over the logical index range
// [-GC_LOW, nx + GC_HIGH) in each dimension, stored row-major as a 1d vec.
// Here is the layout for nx = 2, ny = 1, with the 1d position in []:
//
//          ix: -1     0      1      2      3
//        ---------------------------------------
// iy: -1 |  [0]  |  [1]  |  [2]  |  [3]  |  [4]  |
//        ---------------------------------------
// iy:  0 |  [5]  |  [6]  |  [7]  |  [8]  |  [9]  |
//        ---------------------------------------
// iy:  1 | [10]  | [11]  | ...
#[derive(Clone)]
pub struct VecGrid {
    data: Vec<Vec3>,
    nx: usize,
    ny: usize,
    nrow: usize,
}

impl VecGrid {
    pub fn new(nx: usize, ny: usize) -> VecGrid {
        VecGrid {
            data: vec![Vec3::ZERO; (nx + GC) * (ny + GC)],
            nx,
            ny,
            nrow: nx + GC,
        }
    }

    #[inline(always)]
    pub fn nx(&self) -> usize {
        self.nx
    }

    #[inline(always)]
    pub fn ny(&self) -> usize {
        self.ny
    }

    #[inline(always)]
    pub fn nrow(&self) -> usize {
        self.nrow
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[Vec3] {
        &self.data
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [Vec3] {
        &mut self.data
    }

    // 1d position of logical cell (ix, iy); ghost cells are reached with
    // negative or >= nx indices.
    #[inline(always)]
    pub fn idx(&self, ix: i32, iy: i32) -> usize {
        if !cfg!(feature = "unchecked") {
            assert!(ix >= -(GC_LOW as i32) && (ix as i64) < (self.nx + GC_HIGH) as i64);
            assert!(iy >= -(GC_LOW as i32) && (iy as i64) < (self.ny + GC_HIGH) as i64);
        }
        (iy + GC_LOW as i32) as usize * self.nrow + (ix + GC_LOW as i32) as usize
    }

    #[inline(always)]
    pub fn get(&self, ix: i32, iy: i32) -> Vec3 {
        self.data[self.idx(ix, iy)]
    }

    #[inline(always)]
    pub fn get_mut(&mut self, ix: i32, iy: i32) -> &mut Vec3 {
        let ij = self.idx(ix, iy);
        &mut self.data[ij]
    }

    pub fn zero(&mut self) {
        for v in self.data.iter_mut() {
            *v = Vec3::ZERO;
        }
    }

    // Elementwise sum of two identically shaped grids, ghosts included.
    // Used to reduce the thread-local deposition grids.
    pub fn add_grid(&mut self, other: &VecGrid) {
        if !cfg!(feature = "unchecked") {
            assert_eq!(self.data.len(), other.data.len());
            assert_eq!(self.nrow, other.nrow);
        }
        for (v, o) in self.data.iter_mut().zip(other.data.iter()) {
            *v += *o;
        }
    }

    // Accumulate a region-local grid (rows [y0, y0 + other.ny) of the full
    // domain) into this full-domain grid, ghost rows included. The region
    // ghost rows land on this grid's neighboring rows or its own ghosts,
    // which a periodic fold afterwards puts back in the interior.
    pub fn add_rows(&mut self, other: &VecGrid, y0: i32) {
        assert_eq!(self.nrow, other.nrow);
        assert!(y0 >= 0 && y0 as usize + other.ny <= self.ny);
        let nrow = self.nrow;
        for r in 0..other.ny + GC {
            let dst = (y0 as usize + r) * nrow;
            let src = r * nrow;
            for i in 0..nrow {
                self.data[dst + i] += other.data[src + i];
            }
        }
    }

    // Shift every cell one column to the left and zero the newly exposed
    // right edge. Used when the moving window advances one cell.
    pub fn shift_left(&mut self) {
        let nrow = self.nrow;
        for row in self.data.chunks_mut(nrow) {
            for i in 0..nrow - 1 {
                row[i] = row[i + 1];
            }
            // fields in the fresh part of the window start from zero
            for v in row[self.nx..].iter_mut() {
                *v = Vec3::ZERO;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idx_covers_ghosts() {
        let g = VecGrid::new(4, 3);
        assert_eq!(g.idx(-1, -1), 0);
        assert_eq!(g.idx(0, 0), (4 + GC) + 1);
        assert_eq!(g.idx(4 + 1, 3 + 1), (4 + GC) * (3 + GC) - 1);
    }

    #[test]
    fn add_rows_offsets_region() {
        let mut full = VecGrid::new(4, 6);
        let mut local = VecGrid::new(4, 3);
        *local.get_mut(2, 0) = Vec3 {
            x: 1.5,
            y: 0.0,
            z: -2.0,
        };
        *local.get_mut(1, -1) = Vec3 {
            x: 0.0,
            y: 3.0,
            z: 0.0,
        };
        full.add_rows(&local, 3);
        assert_eq!(full.get(2, 3).x, 1.5);
        assert_eq!(full.get(2, 3).z, -2.0);
        // region lower ghost row lands one row below the region start
        assert_eq!(full.get(1, 2).y, 3.0);
    }

    #[test]
    fn shift_left_drops_column_zero() {
        let mut g = VecGrid::new(4, 2);
        for iy in 0..2 {
            for ix in 0..4 {
                g.get_mut(ix, iy).x = (10 * iy + ix) as Float;
            }
        }
        g.shift_left();
        assert_eq!(g.get(0, 0).x, 1.0);
        assert_eq!(g.get(2, 1).x, 13.0);
        assert_eq!(g.get(3, 0), Vec3::ZERO);
    }
}
