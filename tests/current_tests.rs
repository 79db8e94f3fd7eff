mod common;

use approx::assert_abs_diff_eq;
use empic_rs::flds::current::Current;
use empic_rs::flds::Emf;
use empic_rs::prtls::bounds;
use empic_rs::prtls::push::{advance, PushStats};
use empic_rs::save::charge_map;
use empic_rs::{build_regions, drain_transfer, Float};

// Discrete continuity on the full gathered grid: with zero fields the
// particles drift freely; the change of the node charge over one step must
// equal minus the divergence of the deposited current at every node, with
// the region slices and periodic folds included.
#[test]
fn gathered_current_satisfies_continuity() {
    let sim = common::setup_sim(2, false);
    let sp = common::species(-1.0, [0.4, -0.3, 0.2], [0.0; 3], [1, 1]);
    let species = vec![sp];
    let emf = Emf::new(&sim);
    let mut regions = build_regions(&sim, &species);
    let mut jay = Current::new(&sim);
    let mut stats = PushStats::default();

    // skew the distribution so plenty of cell crossings happen
    for region in regions.iter_mut() {
        for (i, x) in region.prtls[0].x.iter_mut().enumerate() {
            *x = (*x + 0.83 * i as Float) % 1.0;
        }
        for (i, y) in region.prtls[0].y.iter_mut().enumerate() {
            *y = (*y + 0.59 * i as Float) % 1.0;
        }
    }

    let rho0 = charge_map(&sim, &species[0], regions.iter().map(|r| &r.prtls[0]));

    jay.zero();
    for region in regions.iter_mut() {
        region.jay.zero();
        advance(
            &mut region.prtls[0],
            &species[0],
            &sim,
            &emf,
            &mut region.jay,
            region.ylims[0],
            &mut stats,
        );
    }
    for region in regions.iter_mut() {
        let ylims = region.ylims;
        bounds::transfer(&mut region.prtls[0], &sim, ylims, false);
    }
    for region in regions.iter() {
        jay.gather(&region.jay, region.ylims[0]);
    }
    jay.reduce_bnd(true);
    drain_transfer(1, &mut regions);

    let rho1 = charge_map(&sim, &species[0], regions.iter().map(|r| &r.prtls[0]));

    let nx = sim.size_x;
    let j = &jay.j;
    for iy in 0..sim.size_y as i32 {
        for ix in 0..nx as i32 {
            let node = iy as usize * nx + ix as usize;
            let drho = (rho1[node] - rho0[node]) / sim.dt;
            let divx = (j.get(ix, iy).x - j.get(ix - 1, iy).x) / sim.dx;
            let divy = (j.get(ix, iy).y - j.get(ix, iy - 1).y) / sim.dy;
            assert_abs_diff_eq!(drho + divx + divy, 0.0, epsilon = 2e-4);
        }
    }
}

// A closed periodic box holds no net current sources: the total deposited
// charge never changes.
#[test]
fn total_charge_is_invariant() {
    let sim = common::setup_sim(3, false);
    let sp = common::species(1.0, [0.5, 0.5, 0.0], [0.1; 3], [2, 2]);
    let species = vec![sp];
    let emf = Emf::new(&sim);
    let mut regions = build_regions(&sim, &species);
    let mut stats = PushStats::default();

    let total0: Float = charge_map(&sim, &species[0], regions.iter().map(|r| &r.prtls[0]))
        .iter()
        .sum();

    for _ in 0..10 {
        for region in regions.iter_mut() {
            region.jay.zero();
            advance(
                &mut region.prtls[0],
                &species[0],
                &sim,
                &emf,
                &mut region.jay,
                region.ylims[0],
                &mut stats,
            );
        }
        for region in regions.iter_mut() {
            let ylims = region.ylims;
            bounds::transfer(&mut region.prtls[0], &sim, ylims, false);
        }
        drain_transfer(1, &mut regions);
    }

    let total1: Float = charge_map(&sim, &species[0], regions.iter().map(|r| &r.prtls[0]))
        .iter()
        .sum();
    assert_abs_diff_eq!(total0, total1, epsilon = total0.abs() * 1e-3 + 1e-4);
}
