use crate::flds::vfld::{Vec3, VecGrid};
use crate::Float;

// Gather E and B at a position inside cell (ix, iy), fractional offset
// (x, y) in [0, 1). Each component is sampled where it lives on the Yee
// lattice: components staggered along an axis use the half-cell rule --
// a fractional coordinate below 0.5 pairs with the cell below and weight
// x + 0.5, otherwise with the cell itself and weight x - 0.5.
#[inline(always)]
pub fn interpolate_fld(
    e: &VecGrid,
    b: &VecGrid,
    ix: i32,
    iy: i32,
    x: Float,
    y: Float,
) -> (Vec3, Vec3) {
    if !cfg!(feature = "unchecked") {
        assert!(ix >= 0 && (ix as usize) < e.nx());
        assert!(iy >= 0 && (iy as usize) < e.ny());
        assert_eq!(e.as_slice().len(), b.as_slice().len());
        assert_eq!(e.nrow(), b.nrow());
    }

    let ih = ix + if x < 0.5 { -1 } else { 0 };
    let jh = iy + if y < 0.5 { -1 } else { 0 };

    let w1h = x + if x < 0.5 { 0.5 } else { -0.5 };
    let w2h = y + if y < 0.5 { 0.5 } else { -0.5 };

    let ef = e.as_slice();
    let bf = b.as_slice();

    // all eight stencil corners; the assertions above keep every one of
    // these inside the ghost frame
    let i00 = e.idx(ix, iy);
    let i01 = e.idx(ix, iy + 1);
    let h00 = e.idx(ih, iy);
    let h01 = e.idx(ih, iy + 1);
    let j00 = e.idx(ix, jh);
    let j01 = e.idx(ix, jh + 1);
    let hj0 = e.idx(ih, jh);
    let hj1 = e.idx(ih, jh + 1);

    let ep;
    let bp;
    unsafe {
        ep = Vec3 {
            x: (ef.get_unchecked(h00).x * (1.0 - w1h) + ef.get_unchecked(h00 + 1).x * w1h)
                * (1.0 - y)
                + (ef.get_unchecked(h01).x * (1.0 - w1h) + ef.get_unchecked(h01 + 1).x * w1h) * y,
            y: (ef.get_unchecked(j00).y * (1.0 - x) + ef.get_unchecked(j00 + 1).y * x)
                * (1.0 - w2h)
                + (ef.get_unchecked(j01).y * (1.0 - x) + ef.get_unchecked(j01 + 1).y * x) * w2h,
            z: (ef.get_unchecked(i00).z * (1.0 - x) + ef.get_unchecked(i00 + 1).z * x) * (1.0 - y)
                + (ef.get_unchecked(i01).z * (1.0 - x) + ef.get_unchecked(i01 + 1).z * x) * y,
        };

        bp = Vec3 {
            x: (bf.get_unchecked(j00).x * (1.0 - x) + bf.get_unchecked(j00 + 1).x * x)
                * (1.0 - w2h)
                + (bf.get_unchecked(j01).x * (1.0 - x) + bf.get_unchecked(j01 + 1).x * x) * w2h,
            y: (bf.get_unchecked(h00).y * (1.0 - w1h) + bf.get_unchecked(h00 + 1).y * w1h)
                * (1.0 - y)
                + (bf.get_unchecked(h01).y * (1.0 - w1h) + bf.get_unchecked(h01 + 1).y * w1h) * y,
            z: (bf.get_unchecked(hj0).z * (1.0 - w1h) + bf.get_unchecked(hj0 + 1).z * w1h)
                * (1.0 - w2h)
                + (bf.get_unchecked(hj1).z * (1.0 - w1h) + bf.get_unchecked(hj1 + 1).z * w1h)
                    * w2h,
        };
    }
    (ep, bp)
}
