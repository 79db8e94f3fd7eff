use crate::flds::vfld::{Vec3, VecGrid, GC_LOW};

// Periodic ghost handling for VecGrid. `sync_*` copies interior values into
// the ghost cells of the opposite edge; `fold_*` adds ghost-cell deposits
// back into the interior cells they alias. Callers fold first (after a
// deposition) and sync afterwards so readers always see consistent ghosts.
//
// Raw row r maps to logical iy = r - GC_LOW; the aliasing is
//   iy = -1     <->  iy = ny - 1
//   iy = ny     <->  iy = 0
//   iy = ny + 1 <->  iy = 1
// and the same along x.

pub fn sync_y(g: &mut VecGrid) {
    let nrow = g.nrow();
    let ny = g.ny();
    let fld = g.as_mut_slice();
    copy_row(fld, nrow, 0, ny);
    copy_row(fld, nrow, ny + GC_LOW, 1);
    copy_row(fld, nrow, ny + GC_LOW + 1, 2);
}

pub fn fold_y(g: &mut VecGrid) {
    let nrow = g.nrow();
    let ny = g.ny();
    let fld = g.as_mut_slice();
    add_row(fld, nrow, 0, ny);
    add_row(fld, nrow, ny + GC_LOW, 1);
    add_row(fld, nrow, ny + GC_LOW + 1, 2);
}

pub fn sync_x(g: &mut VecGrid) {
    let nrow = g.nrow();
    let nx = g.nx();
    for row in g.as_mut_slice().chunks_mut(nrow) {
        row[0] = row[nx];
        row[nx + GC_LOW] = row[1];
        row[nx + GC_LOW + 1] = row[2];
    }
}

pub fn fold_x(g: &mut VecGrid) {
    let nrow = g.nrow();
    let nx = g.nx();
    for row in g.as_mut_slice().chunks_mut(nrow) {
        let v = row[0];
        row[nx] += v;
        let v = row[nx + GC_LOW];
        row[1] += v;
        let v = row[nx + GC_LOW + 1];
        row[2] += v;
    }
}

// Open x boundary for a moving window: ghost columns take the nearest
// interior value instead of wrapping around.
pub fn sync_x_open(g: &mut VecGrid) {
    let nrow = g.nrow();
    let nx = g.nx();
    for row in g.as_mut_slice().chunks_mut(nrow) {
        row[0] = row[1];
        row[nx + GC_LOW] = row[nx];
        row[nx + GC_LOW + 1] = row[nx];
    }
}

fn copy_row(fld: &mut [Vec3], nrow: usize, dst: usize, src: usize) {
    let (dst_start, src_start) = (dst * nrow, src * nrow);
    for i in 0..nrow {
        fld[dst_start + i] = fld[src_start + i];
    }
}

fn add_row(fld: &mut [Vec3], nrow: usize, ghost: usize, real: usize) {
    let (ghost_start, real_start) = (ghost * nrow, real * nrow);
    for i in 0..nrow {
        let v = fld[ghost_start + i];
        fld[real_start + i] += v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Float;

    fn fill_interior(g: &mut VecGrid) {
        for iy in 0..g.ny() as i32 {
            for ix in 0..g.nx() as i32 {
                g.get_mut(ix, iy).x = (100 * iy + ix) as Float;
            }
        }
    }

    #[test]
    fn sync_wraps_both_axes() {
        let mut g = VecGrid::new(6, 4);
        fill_interior(&mut g);
        sync_y(&mut g);
        sync_x(&mut g);
        // y ghosts
        assert_eq!(g.get(2, -1).x, g.get(2, 3).x);
        assert_eq!(g.get(2, 4).x, g.get(2, 0).x);
        assert_eq!(g.get(2, 5).x, g.get(2, 1).x);
        // x ghosts
        assert_eq!(g.get(-1, 2).x, g.get(5, 2).x);
        assert_eq!(g.get(6, 2).x, g.get(0, 2).x);
        assert_eq!(g.get(7, 2).x, g.get(1, 2).x);
        // corner goes through both copies
        assert_eq!(g.get(-1, -1).x, g.get(5, 3).x);
    }

    #[test]
    fn fold_moves_ghost_deposits_inside() {
        let mut g = VecGrid::new(6, 4);
        g.get_mut(2, -1).x = 1.0;
        g.get_mut(2, 4).x = 2.0;
        g.get_mut(2, 5).x = 3.0;
        g.get_mut(-1, 1).x = 4.0;
        g.get_mut(6, 1).x = 5.0;
        g.get_mut(7, 1).x = 6.0;
        fold_y(&mut g);
        fold_x(&mut g);
        assert_eq!(g.get(2, 3).x, 1.0);
        assert_eq!(g.get(2, 0).x, 2.0);
        assert_eq!(g.get(2, 1).x, 3.0);
        assert_eq!(g.get(5, 1).x, 4.0);
        assert_eq!(g.get(0, 1).x, 5.0);
        assert_eq!(g.get(1, 1).x, 6.0);
    }

    #[test]
    fn corner_deposit_survives_double_fold() {
        // a deposit in the lower-left corner ghost must end up in the
        // upper-right interior cell, and total charge must not change
        let mut g = VecGrid::new(6, 4);
        g.get_mut(-1, -1).z = 2.5;
        fold_y(&mut g);
        fold_x(&mut g);
        assert_eq!(g.get(5, 3).z, 2.5);
        let total: Float = (0..4)
            .flat_map(|iy| (0..6).map(move |ix| (ix, iy)))
            .map(|(ix, iy)| g.get(ix, iy).z)
            .sum();
        assert_eq!(total, 2.5);
    }

    #[test]
    fn fold_then_sync_is_consistent() {
        let mut g = VecGrid::new(6, 4);
        fill_interior(&mut g);
        g.get_mut(3, 4).x = 7.0;
        fold_y(&mut g);
        fold_x(&mut g);
        sync_y(&mut g);
        sync_x(&mut g);
        // ghost now mirrors the folded interior value
        assert_eq!(g.get(3, 4).x, g.get(3, 0).x);
        assert_eq!(g.get(3, 0).x, 7.0 + 3.0);
    }

    #[test]
    fn open_x_copies_edge() {
        let mut g = VecGrid::new(6, 4);
        fill_interior(&mut g);
        sync_x_open(&mut g);
        assert_eq!(g.get(-1, 2).x, g.get(0, 2).x);
        assert_eq!(g.get(6, 2).x, g.get(5, 2).x);
        assert_eq!(g.get(7, 2).x, g.get(5, 2).x);
    }
}
