use crate::flds::vfld::{VecGrid, GC_LOW};
use crate::Float;

// One single-cell segment of a particle's trajectory over a step.
#[derive(Clone, Copy, Default)]
struct VirtPrtl {
    x0: Float,
    x1: Float,
    y0: Float,
    y1: Float,
    dx: Float,
    dy: Float,
    qvz: Float,
    ix: i32,
    iy: i32,
}

// Deposit the current carried by the trajectory (x0, y0) -> (x0+dx, y0+dy)
// of a particle in cell (ix, iy). A trajectory that crosses a cell boundary
// is split at the crossing into segments that each stay inside one cell
// (up to 3 of them: start cell, x crossing, y crossing), so that the
// summed deposit satisfies discrete charge continuity exactly.
//
// qnx = q * dx_cell / dt, qny = q * dy_cell / dt, qvz = q * uz / gamma.
#[inline(always)]
#[allow(clippy::too_many_arguments)]
pub fn dep_current(
    ix: i32,
    iy: i32,
    di: i32,
    dj: i32,
    x0: Float,
    y0: Float,
    dx: Float,
    dy: Float,
    qnx: Float,
    qny: Float,
    qvz: Float,
    jay: &mut VecGrid,
) {
    if !cfg!(feature = "unchecked") {
        assert!(ix >= 0 && (ix as usize) < jay.nx());
        assert!(iy >= 0 && (iy as usize) < jay.ny());
        assert!(di >= -1 && di <= 1 && dj >= -1 && dj <= 1);
    }

    let mut vp = [VirtPrtl::default(); 3];
    let mut vnp = 1;

    vp[0] = VirtPrtl {
        x0,
        y0,
        dx,
        dy,
        x1: x0 + dx,
        y1: y0 + dy,
        qvz: qvz / 2.0,
        ix,
        iy,
    };

    // x split
    if di != 0 {
        let ib = (di == 1) as i32;
        let delta = (x0 + dx - ib as Float) / dx;

        vp[1].x0 = (1 - ib) as Float;
        vp[1].x1 = (x0 + dx) - di as Float;
        vp[1].dx = dx * delta;
        vp[1].ix = ix + di;

        let ycross = y0 + dy * (1.0 - delta);

        vp[1].y0 = ycross;
        vp[1].y1 = vp[0].y1;
        vp[1].dy = dy * delta;
        vp[1].iy = iy;

        vp[1].qvz = vp[0].qvz * delta;

        // trim the original segment at the crossing
        vp[0].x1 = ib as Float;
        vp[0].dx *= 1.0 - delta;
        vp[0].dy *= 1.0 - delta;
        vp[0].y1 = ycross;
        vp[0].qvz *= 1.0 - delta;

        vnp += 1;
    }

    // y split, applied to whichever segment crosses
    if dj != 0 {
        let isy = (!(vp[0].y1 < 0.0 || vp[0].y1 >= 1.0)) as usize;

        let jb = (dj == 1) as i32;
        let delta = (vp[isy].y1 - jb as Float) / vp[isy].dy;

        vp[vnp].y0 = (1 - jb) as Float;
        vp[vnp].y1 = vp[isy].y1 - dj as Float;
        vp[vnp].dy = vp[isy].dy * delta;
        vp[vnp].iy = vp[isy].iy + dj;

        let xcross = vp[isy].x0 + vp[isy].dx * (1.0 - delta);

        vp[vnp].x0 = xcross;
        vp[vnp].x1 = vp[isy].x1;
        vp[vnp].dx = vp[isy].dx * delta;
        vp[vnp].ix = vp[isy].ix;

        vp[vnp].qvz = vp[isy].qvz * delta;

        vp[isy].y1 = jb as Float;
        vp[isy].dy *= 1.0 - delta;
        vp[isy].dx *= 1.0 - delta;
        vp[isy].x1 = xcross;
        vp[isy].qvz *= 1.0 - delta;

        // when the y crossing happened before the x one, the x segment
        // also moved a row
        if isy < vnp - 1 {
            vp[1].y0 -= dj as Float;
            vp[1].y1 -= dj as Float;
            vp[1].iy += dj;
        }
        vnp += 1;
    }

    let nrow = jay.nrow();
    let fld = jay.as_mut_slice();
    for v in vp.iter().take(vnp) {
        let s0x = [1.0 - v.x0, v.x0];
        let s1x = [1.0 - v.x1, v.x1];
        let s0y = [1.0 - v.y0, v.y0];
        let s1y = [1.0 - v.y1, v.y1];

        let wl1 = qnx * v.dx;
        let wl2 = qny * v.dy;

        let wp1 = [0.5 * (s0y[0] + s1y[0]), 0.5 * (s0y[1] + s1y[1])];
        let wp2 = [0.5 * (s0x[0] + s1x[0]), 0.5 * (s0x[1] + s1x[1])];

        let i00 = (v.iy + GC_LOW as i32) as usize * nrow + (v.ix + GC_LOW as i32) as usize;
        let i01 = i00 + nrow;

        if !cfg!(feature = "unchecked") {
            assert!(i01 + 1 < fld.len());
        }
        unsafe {
            fld.get_unchecked_mut(i00).x += wl1 * wp1[0];
            fld.get_unchecked_mut(i01).x += wl1 * wp1[1];

            fld.get_unchecked_mut(i00).y += wl2 * wp2[0];
            fld.get_unchecked_mut(i00 + 1).y += wl2 * wp2[1];

            fld.get_unchecked_mut(i00).z +=
                v.qvz * (s0x[0] * s0y[0] + s1x[0] * s1y[0] + (s0x[0] * s1y[0] - s1x[0] * s0y[0]) / 2.0);
            fld.get_unchecked_mut(i00 + 1).z +=
                v.qvz * (s0x[1] * s0y[0] + s1x[1] * s1y[0] + (s0x[1] * s1y[0] - s1x[1] * s0y[0]) / 2.0);
            fld.get_unchecked_mut(i01).z +=
                v.qvz * (s0x[0] * s0y[1] + s1x[0] * s1y[1] + (s0x[0] * s1y[1] - s1x[0] * s0y[1]) / 2.0);
            fld.get_unchecked_mut(i01 + 1).z +=
                v.qvz * (s0x[1] * s0y[1] + s1x[1] * s1y[1] + (s0x[1] * s1y[1] - s1x[1] * s0y[1]) / 2.0);
        }
    }
}
