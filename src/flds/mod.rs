use crate::{Float, Sim};

pub mod current;
pub mod ghosts;
pub mod vfld;

use crate::flds::ghosts::{sync_x, sync_x_open, sync_y};
use crate::flds::vfld::VecGrid;

// The electromagnetic field pair on the Yee lattice. Ex and By sit at
// (i + 1/2, j), Ey and Bx at (i, j + 1/2), Ez at (i, j), Bz at
// (i + 1/2, j + 1/2); the interpolator's half-cell selection rule assumes
// exactly this staggering, so the two must never drift apart.
pub struct Emf {
    pub e: VecGrid,
    pub b: VecGrid,
    periodic_x: bool,
}

impl Emf {
    pub fn new(sim: &Sim) -> Emf {
        Emf {
            e: VecGrid::new(sim.size_x, sim.size_y),
            b: VecGrid::new(sim.size_x, sim.size_y),
            periodic_x: !sim.moving_window,
        }
    }

    // Advance E and B one timestep with the fully reduced current grid:
    // half-step B, full-step E (including -dt * J), half-step B.
    pub fn advance(&mut self, sim: &Sim, jay: &VecGrid) {
        let dt = sim.dt;
        yee_b(&self.e, &mut self.b, 0.5 * dt / sim.dx, 0.5 * dt / sim.dy);
        self.sync_b();
        yee_e(&self.b, &mut self.e, jay, dt / sim.dx, dt / sim.dy, dt);
        self.sync_e();
        yee_b(&self.e, &mut self.b, 0.5 * dt / sim.dx, 0.5 * dt / sim.dy);
        self.sync_b();
    }

    // Shift the stored fields one cell left when the window advances.
    pub fn move_window(&mut self) {
        self.e.shift_left();
        self.b.shift_left();
        self.sync_e();
        self.sync_b();
    }

    pub fn sync_e(&mut self) {
        sync_y(&mut self.e);
        if self.periodic_x {
            sync_x(&mut self.e);
        } else {
            sync_x_open(&mut self.e);
        }
    }

    pub fn sync_b(&mut self) {
        sync_y(&mut self.b);
        if self.periodic_x {
            sync_x(&mut self.b);
        } else {
            sync_x_open(&mut self.b);
        }
    }
}

fn yee_b(e: &VecGrid, b: &mut VecGrid, dt_dx: Float, dt_dy: Float) {
    for iy in 0..b.ny() as i32 {
        for ix in 0..b.nx() as i32 {
            let e00 = e.get(ix, iy);
            let e10 = e.get(ix + 1, iy);
            let e01 = e.get(ix, iy + 1);
            let bv = b.get_mut(ix, iy);
            bv.x -= dt_dy * (e01.z - e00.z);
            bv.y += dt_dx * (e10.z - e00.z);
            bv.z += dt_dy * (e01.x - e00.x) - dt_dx * (e10.y - e00.y);
        }
    }
}

fn yee_e(b: &VecGrid, e: &mut VecGrid, jay: &VecGrid, dt_dx: Float, dt_dy: Float, dt: Float) {
    for iy in 0..e.ny() as i32 {
        for ix in 0..e.nx() as i32 {
            let b00 = b.get(ix, iy);
            let bm0 = b.get(ix - 1, iy);
            let b0m = b.get(ix, iy - 1);
            let j = jay.get(ix, iy);
            let ev = e.get_mut(ix, iy);
            ev.x += dt_dy * (b00.z - b0m.z) - dt * j.x;
            ev.y -= dt_dx * (b00.z - bm0.z) + dt * j.y;
            ev.z += dt_dx * (b00.y - bm0.y) - dt_dy * (b00.x - b0m.x) - dt * j.z;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_test_sim;

    #[test]
    fn zero_current_keeps_zero_fields() {
        let sim = build_test_sim();
        let mut emf = Emf::new(&sim);
        let jay = VecGrid::new(sim.size_x, sim.size_y);
        for _ in 0..10 {
            emf.advance(&sim, &jay);
        }
        for v in emf.e.as_slice() {
            assert_eq!(*v, vfld::Vec3::ZERO);
        }
        for v in emf.b.as_slice() {
            assert_eq!(*v, vfld::Vec3::ZERO);
        }
    }

    #[test]
    fn current_drives_electric_field() {
        let sim = build_test_sim();
        let mut emf = Emf::new(&sim);
        let mut jay = VecGrid::new(sim.size_x, sim.size_y);
        jay.get_mut(4, 4).z = 1.0;
        emf.advance(&sim, &jay);
        // E_z responds as -dt * J_z at the driven node
        assert_eq!(emf.e.get(4, 4).z, -sim.dt);
        // the disturbance has not reached distant nodes after one step
        assert_eq!(emf.b.get(10, 10), vfld::Vec3::ZERO);
        assert_eq!(emf.e.get(10, 10), vfld::Vec3::ZERO);
    }
}
