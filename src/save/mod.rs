use crate::flds::vfld::VecGrid;
use crate::prtls::{Prtls, Species};
use crate::{Float, Region, Sim};
use anyhow::{Context, Result};
use itertools::izip;
use npy_derive::Serializable;

#[derive(Serializable, Debug)]
struct PrtlRec {
    x: Float,
    y: Float,
    ux: Float,
    uy: Float,
    uz: Float,
}

// Deposit the charge of every live particle of one species onto a grid with
// one guard cell at the upper boundaries, fold the guards back in, and
// return the compacted size_x * size_y map.
pub fn charge_map<'a>(
    sim: &Sim,
    sp: &Species,
    stores: impl Iterator<Item = &'a Prtls>,
) -> Vec<Float> {
    let nx = sim.size_x;
    let ny = sim.size_y;
    let nrow = nx + 1;
    let mut charge = vec![0.0 as Float; nrow * (ny + 1)];

    for prtls in stores {
        for (ix, iy, x, y, dead) in izip!(&prtls.ix, &prtls.iy, &prtls.x, &prtls.y, &prtls.dead) {
            if *dead {
                continue;
            }
            let idx = *ix as usize + nrow * *iy as usize;
            let (w1, w2) = (*x, *y);
            charge[idx] += (1.0 - w1) * (1.0 - w2) * sp.q;
            charge[idx + 1] += w1 * (1.0 - w2) * sp.q;
            charge[idx + nrow] += (1.0 - w1) * w2 * sp.q;
            charge[idx + 1 + nrow] += w1 * w2 * sp.q;
        }
    }

    // guard columns wrap in x only for a fixed window
    if !sim.moving_window {
        for j in 0..ny + 1 {
            charge[j * nrow] += charge[nx + j * nrow];
        }
    }
    // y is always periodic
    for i in 0..nx + 1 {
        charge[i] += charge[i + ny * nrow];
    }

    let mut out = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        out.extend_from_slice(&charge[j * nrow..j * nrow + nx]);
    }
    out
}

// x-ux phase space histogram with cloud-in-cell weighting.
pub fn phase_space<'a>(
    sim: &Sim,
    sp: &Species,
    stores: impl Iterator<Item = &'a Prtls>,
    pha_nx: [usize; 2],
    x_range: [Float; 2],
    u_range: [Float; 2],
) -> Vec<Float> {
    let nrow = pha_nx[0];
    let mut buf = vec![0.0 as Float; pha_nx[0] * pha_nx[1]];

    let rdx1 = pha_nx[0] as Float / (x_range[1] - x_range[0]);
    let rdx2 = pha_nx[1] as Float / (u_range[1] - u_range[0]);
    let n_move = sim.n_move.get() as Float;

    for prtls in stores {
        for (ix, x, ux, dead) in izip!(&prtls.ix, &prtls.x, &prtls.ux, &prtls.dead) {
            if *dead {
                continue;
            }
            let xq = (n_move + *ix as Float + x) * sim.dx;
            let uq = *ux;

            let nx1 = (xq - x_range[0]) * rdx1;
            let nx2 = (uq - u_range[0]) * rdx2;

            let i1 = (nx1 + 0.5) as i32;
            let i2 = (nx2 + 0.5) as i32;

            let w1 = nx1 - i1 as Float + 0.5;
            let w2 = nx2 - i2 as Float + 0.5;

            for (jj, wy) in [(i2, 1.0 - w2), (i2 + 1, w2)].iter() {
                if *jj < 0 || *jj >= pha_nx[1] as i32 {
                    continue;
                }
                for (ii, wx) in [(i1, 1.0 - w1), (i1 + 1, w1)].iter() {
                    if *ii < 0 || *ii >= pha_nx[0] as i32 {
                        continue;
                    }
                    buf[*ii as usize + nrow * *jj as usize] += wx * wy * sp.q;
                }
            }
        }
    }
    buf
}

// Strip the ghost frame off one component of a vector grid.
fn compact_component(g: &VecGrid, pick: impl Fn(&crate::flds::vfld::Vec3) -> Float) -> Vec<Float> {
    let mut out = Vec::with_capacity(g.nx() * g.ny());
    for iy in 0..g.ny() as i32 {
        for ix in 0..g.nx() as i32 {
            out.push(pick(&g.as_slice()[g.idx(ix, iy)]));
        }
    }
    out
}

fn save_vfld(g: &VecGrid, outdir: &str, names: [&str; 3]) -> Result<()> {
    for (name, comp) in names.iter().zip(0..3) {
        let data = compact_component(g, |v| match comp {
            0 => v.x,
            1 => v.y,
            _ => v.z,
        });
        npy::to_file(format!("{}/flds/{}.npy", outdir, name), data)
            .context(format!("Could not save {} data to file", name))?;
    }
    Ok(())
}

pub fn save_output(
    t: u32,
    sim: &Sim,
    species: &[Species],
    regions: &[Region],
    emf: &crate::flds::Emf,
) -> Result<()> {
    let cfg = &sim.config;
    if t % cfg.output.output_interval != 0 {
        return Ok(());
    }
    let output_prefix = format!("output/dat_{:05}", t / cfg.output.output_interval);
    std::fs::create_dir_all(&output_prefix).context("Unable to create output directory")?;
    std::fs::create_dir_all(&format!("{}/flds", &output_prefix))
        .context("Unable to create output directory")?;

    for (s, sp) in species.iter().enumerate() {
        let charge = charge_map(sim, sp, regions.iter().map(|r| &r.prtls[s]));
        npy::to_file(
            format!("{}/charge_{}.npy", output_prefix, sp.name),
            charge,
        )
        .context("Could not save charge data to file")?;

        let pha = phase_space(
            sim,
            sp,
            regions.iter().map(|r| &r.prtls[s]),
            [128, 128],
            [0.0, sim.box_x],
            [-2.0, 2.0],
        );
        npy::to_file(format!("{}/pha_{}.npy", output_prefix, sp.name), pha)
            .context("Could not save phase space data to file")?;

        let mut recs = Vec::new();
        for region in regions {
            let prtls = &region.prtls[s];
            for k in (0..prtls.np()).step_by(cfg.output.stride) {
                if prtls.dead[k] {
                    continue;
                }
                recs.push(PrtlRec {
                    x: (sim.n_move.get() as Float + prtls.ix[k] as Float + prtls.x[k]) * sim.dx,
                    y: (prtls.iy[k] as Float + prtls.y[k]) * sim.dy,
                    ux: prtls.ux[k],
                    uy: prtls.uy[k],
                    uz: prtls.uz[k],
                });
            }
        }
        npy::to_file(format!("{}/prtl_{}.npy", output_prefix, sp.name), recs)
            .context("Could not save prtl data to file")?;
    }

    save_vfld(&emf.e, &output_prefix, ["ex", "ey", "ez"])?;
    save_vfld(&emf.b, &output_prefix, ["bx", "by", "bz"])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prtls::Density;
    use crate::{build_test_sim, SpeciesCfg};
    use approx::assert_abs_diff_eq;

    #[test]
    fn charge_map_conserves_total_charge() {
        let sim = build_test_sim();
        let sp = Species::new(&SpeciesCfg {
            name: "electrons".to_string(),
            m_q: -1.0,
            ppc: [2, 2],
            ufl: [0.0; 3],
            uth: [1e-3; 3],
            density: Density::Uniform { n: 1.0 },
        });
        let mut prtls = Prtls::new();
        prtls.inject(&sp, &sim, [0, sim.size_x as i32], [0, sim.size_y as i32]);
        let total: Float = charge_map(&sim, &sp, std::iter::once(&prtls)).iter().sum();
        let expected = sp.q * prtls.np() as Float;
        assert_abs_diff_eq!(total, expected, epsilon = expected.abs() * 1e-3);
    }
}
