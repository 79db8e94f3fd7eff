use crate::flds::vfld::VecGrid;
use crate::flds::Emf;
use crate::prtls::deposit::dep_current;
use crate::prtls::interp::interpolate_fld;
use crate::prtls::{Prtls, Species};
use crate::{Float, Sim, PRTL_CHUNK_SIZE};
use rayon::prelude::*;
use std::time::Instant;

// Per-run push accounting, carried by the caller instead of hiding behind
// process-wide counters.
#[derive(Clone, Copy, Default, Debug)]
pub struct PushStats {
    pub n_push: u64,
    pub secs: f64,
}

impl PushStats {
    pub fn secs_per_push(&self) -> f64 {
        if self.n_push > 0 {
            self.secs / self.n_push as f64
        } else {
            0.0
        }
    }
}

// Advance every live particle of one region store by a full timestep and
// deposit its current into the region grid: interpolate E and B at the
// particle, Boris-rotate the momentum, push the position, hand the
// trajectory to the depositor. Runs as a parallel-for over particles;
// deposits accumulate in thread-local grids that are summed afterwards,
// so concurrent chunks never write the same node.
pub fn advance(
    prtls: &mut Prtls,
    sp: &Species,
    sim: &Sim,
    emf: &Emf,
    jay: &mut VecGrid,
    y0: i32,
    stats: &mut PushStats,
) {
    let t0 = Instant::now();

    let tem = 0.5 * sim.dt / sp.m_q;
    let dt_dx = sim.dt / sim.dx;
    let dt_dy = sim.dt / sim.dy;

    // auxiliary factors for the current deposit
    let qnx = sp.q * sim.dx / sim.dt;
    let qny = sp.q * sim.dy / sim.dt;
    let q = sp.q;

    let (jnx, jny) = (jay.nx(), jay.ny());
    let e = &emf.e;
    let b = &emf.b;

    if !cfg!(feature = "unchecked") {
        assert_eq!(e.as_slice().len(), b.as_slice().len());
        assert_eq!(jnx, sim.size_x);
    }

    let n_live = prtls.dead.iter().filter(|d| !**d).count() as u64;

    let local = (
        &mut prtls.ix[..],
        &mut prtls.iy[..],
        &mut prtls.x[..],
        &mut prtls.y[..],
        &mut prtls.ux[..],
        &mut prtls.uy[..],
        &mut prtls.uz[..],
        &prtls.dead[..],
    )
        .into_par_iter()
        .with_min_len(PRTL_CHUNK_SIZE)
        .fold(
            || VecGrid::new(jnx, jny),
            |mut jloc, (ix, iy, x, y, ux, uy, uz, dead)| {
                if *dead {
                    return jloc;
                }

                let (mut ep, mut bp) = interpolate_fld(e, b, *ix, *iy, *x, *y);

                // half electric impulse
                ep.x *= tem;
                ep.y *= tem;
                ep.z *= tem;

                let utx = *ux + ep.x;
                let uty = *uy + ep.y;
                let utz = *uz + ep.z;

                // first half of the magnetic rotation
                let utsq = utx * utx + uty * uty + utz * utz;
                let gtem = tem / (1.0 + utsq).sqrt();

                bp.x *= gtem;
                bp.y *= gtem;
                bp.z *= gtem;

                *ux = utx + uty * bp.z - utz * bp.y;
                *uy = uty + utz * bp.x - utx * bp.z;
                *uz = utz + utx * bp.y - uty * bp.x;

                // second half of the rotation
                let otsq = 2.0 / (1.0 + bp.x * bp.x + bp.y * bp.y + bp.z * bp.z);

                bp.x *= otsq;
                bp.y *= otsq;
                bp.z *= otsq;

                let utx = utx + *uy * bp.z - *uz * bp.y;
                let uty = uty + *uz * bp.x - *ux * bp.z;
                let utz = utz + *ux * bp.y - *uy * bp.x;

                // second half electric impulse
                *ux = utx + ep.x;
                *uy = uty + ep.y;
                *uz = utz + ep.z;

                // position push
                let usq = *ux * *ux + *uy * *uy + *uz * *uz;
                let rg = 1.0 / (1.0 + usq).sqrt();

                let dx = dt_dx * rg * *ux;
                let dy = dt_dy * rg * *uy;

                let x1 = *x + dx;
                let y1 = *y + dy;

                let di = (x1 >= 1.0) as i32 - ((x1 < 0.0) as i32);
                let dj = (y1 >= 1.0) as i32 - ((y1 < 0.0) as i32);

                let qvz = q * *uz * rg;

                dep_current(*ix, *iy - y0, di, dj, *x, *y, dx, dy, qnx, qny, qvz, &mut jloc);

                // carry the crossing into the cell index, keep the
                // fraction in [0, 1)
                *x = x1 - di as Float;
                *y = y1 - dj as Float;
                *ix += di;
                *iy += dj;

                jloc
            },
        )
        .reduce(
            || VecGrid::new(jnx, jny),
            |mut a, bgrid| {
                a.add_grid(&bgrid);
                a
            },
        );

    jay.add_grid(&local);

    stats.n_push += n_live;
    stats.secs += t0.elapsed().as_secs_f64();
}
