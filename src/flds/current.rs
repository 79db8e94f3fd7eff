use crate::flds::ghosts::{fold_x, fold_y, sync_x, sync_x_open, sync_y};
use crate::flds::vfld::VecGrid;
use crate::Sim;

// The full-domain current grid. Regions deposit into their own slices; after
// the advance those slices are gathered here, the periodic ghost deposits are
// folded back inside, and the result is smoothed before the field solve.
pub struct Current {
    pub j: VecGrid,
    wrk: VecGrid,
    n_pass: u8,
}

impl Current {
    pub fn new(sim: &Sim) -> Current {
        Current {
            j: VecGrid::new(sim.size_x, sim.size_y),
            wrk: VecGrid::new(sim.size_x, sim.size_y),
            n_pass: sim.n_pass,
        }
    }

    pub fn zero(&mut self) {
        self.j.zero();
    }

    pub fn gather(&mut self, region_j: &VecGrid, y0: i32) {
        self.j.add_rows(region_j, y0);
    }

    // Fold ghost-cell deposits into the interior and refresh the ghosts.
    // x wraps only when the window is fixed.
    pub fn reduce_bnd(&mut self, periodic_x: bool) {
        fold_y(&mut self.j);
        if periodic_x {
            fold_x(&mut self.j);
        }
        sync_y(&mut self.j);
        if periodic_x {
            sync_x(&mut self.j);
        } else {
            sync_x_open(&mut self.j);
        }
    }

    // Binomial 1-2-1 filter applied n_pass times to each current component,
    // first along x then along y.
    pub fn smooth(&mut self, periodic_x: bool) {
        let weights: [crate::Float; 3] = [0.25, 0.5, 0.25];
        let nx = self.j.nx() as i32;
        let ny = self.j.ny() as i32;

        for _ in 0..self.n_pass {
            // FIRST FILTER IN X-DIRECTION
            for iy in 0..ny {
                for ix in 0..nx {
                    let v = weights[0] * self.j.get(ix - 1, iy)
                        + weights[1] * self.j.get(ix, iy)
                        + weights[2] * self.j.get(ix + 1, iy);
                    *self.wrk.get_mut(ix, iy) = v;
                }
            }
            sync_y(&mut self.wrk);
            if periodic_x {
                sync_x(&mut self.wrk);
            } else {
                sync_x_open(&mut self.wrk);
            }

            // NOW FILTER IN Y-DIRECTION AND PUT VALS BACK IN j
            for iy in 0..ny {
                for ix in 0..nx {
                    let v = weights[0] * self.wrk.get(ix, iy - 1)
                        + weights[1] * self.wrk.get(ix, iy)
                        + weights[2] * self.wrk.get(ix, iy + 1);
                    *self.j.get_mut(ix, iy) = v;
                }
            }
            sync_y(&mut self.j);
            if periodic_x {
                sync_x(&mut self.j);
            } else {
                sync_x_open(&mut self.j);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_test_sim;
    use crate::flds::vfld::Vec3;
    use crate::Float;

    #[test]
    fn smooth_preserves_total_current() {
        let sim = build_test_sim();
        let mut jay = Current::new(&sim);
        *jay.j.get_mut(5, 5) = Vec3 {
            x: 1.0,
            y: -2.0,
            z: 4.0,
        };
        sync_y(&mut jay.j);
        sync_x(&mut jay.j);
        jay.smooth(true);
        let mut tot = Vec3::ZERO;
        for iy in 0..sim.size_y as i32 {
            for ix in 0..sim.size_x as i32 {
                tot += jay.j.get(ix, iy);
            }
        }
        let eps = 1e-5 as Float;
        assert!((tot.x - 1.0).abs() < eps);
        assert!((tot.y + 2.0).abs() < eps);
        assert!((tot.z - 4.0).abs() < eps);
        // the peak got spread out
        assert!(jay.j.get(5, 5).z < 4.0);
    }
}
