use crate::{Float, Sim};
use itertools::izip;
use rand::prelude::*;
use rand_distr::StandardNormal;
use serde::Deserialize;

pub mod bounds;
pub mod deposit;
pub mod interp;
pub mod push;
pub mod sort;

use self::bounds::{Prt, XferBuf};

// Initial density profile along x, in box units.
#[derive(Deserialize, Clone, Copy, Debug)]
#[serde(tag = "profile", rename_all = "lowercase")]
pub enum Density {
    Uniform { n: Float },
    Step { n: Float, start: Float },
    Slab { n: Float, start: Float, end: Float },
}

impl Density {
    pub fn n(&self) -> Float {
        match *self {
            Density::Uniform { n } | Density::Step { n, .. } | Density::Slab { n, .. } => n,
        }
    }
}

// Parameters shared by every particle of a population: the stores hold the
// per-particle state, this holds the per-species constants.
pub struct Species {
    pub name: String,
    pub m_q: Float,
    pub q: Float,
    pub ppc: [usize; 2],
    pub ufl: [Float; 3],
    pub uth: [Float; 3],
    pub density: Density,
}

impl Species {
    pub fn new(cfg: &crate::SpeciesCfg) -> Species {
        let npc = (cfg.ppc[0] * cfg.ppc[1]) as Float;
        let mut n = cfg.density.n();
        if n == 0.0 {
            n = 1.0;
        }
        Species {
            name: cfg.name.clone(),
            m_q: cfg.m_q,
            // one cell at reference density carries unit charge, shared by
            // the macro-particles in it
            q: cfg.m_q.signum() * n.abs() / npc,
            ppc: cfg.ppc,
            ufl: cfg.ufl,
            uth: cfg.uth,
            density: cfg.density,
        }
    }
}

// Structure-of-arrays store for the particles of one species inside one
// region. Deleted particles stay in place as tombstones until the next
// sort/compaction pass.
#[derive(Default)]
pub struct Prtls {
    pub ix: Vec<i32>,
    pub iy: Vec<i32>,
    pub x: Vec<Float>,
    pub y: Vec<Float>,
    pub ux: Vec<Float>,
    pub uy: Vec<Float>,
    pub uz: Vec<Float>,
    pub tag: Vec<u64>,
    pub dead: Vec<bool>,
    pub out_down: XferBuf,
    pub out_up: XferBuf,
    next_tag: u64,
}

impl Prtls {
    pub fn new() -> Prtls {
        Prtls::default()
    }

    #[inline(always)]
    pub fn np(&self) -> usize {
        self.ix.len()
    }

    pub fn n_live(&self) -> usize {
        self.dead.iter().filter(|d| !**d).count()
    }

    // Make room for `extra` more particles, growing capacity in whole
    // blocks so repeated injections amortize.
    pub fn reserve_for(&mut self, extra: usize) {
        let need = self.np() + extra;
        if need > self.ix.capacity() {
            let cap = crate::block_round(need);
            let add = cap - self.np();
            self.ix.reserve_exact(add);
            self.iy.reserve_exact(add);
            self.x.reserve_exact(add);
            self.y.reserve_exact(add);
            self.ux.reserve_exact(add);
            self.uy.reserve_exact(add);
            self.uz.reserve_exact(add);
            self.tag.reserve_exact(add);
            self.dead.reserve_exact(add);
        }
    }

    pub fn push_prt(&mut self, p: Prt) {
        self.ix.push(p.ix);
        self.iy.push(p.iy);
        self.x.push(p.x);
        self.y.push(p.y);
        self.ux.push(p.ux);
        self.uy.push(p.uy);
        self.uz.push(p.uz);
        self.tag.push(p.tag);
        self.dead.push(false);
    }

    // Append everything a neighbor handed over.
    pub fn absorb(&mut self, buf: &mut XferBuf) {
        self.reserve_for(buf.len());
        for &p in buf.as_slice() {
            self.push_prt(p);
        }
    }

    // Inject ppc[0] x ppc[1] particles per cell over the given cell ranges,
    // clipped by the species density profile (profile positions are in box
    // units and slide with the moving window), with fluid plus thermal
    // momenta.
    pub fn inject(&mut self, sp: &Species, sim: &Sim, xrange: [i32; 2], yrange: [i32; 2]) {
        let npc = sp.ppc[0] * sp.ppc[1];

        // positions inside the cell, row-major over the ppc lattice
        let mut poscell = Vec::with_capacity(npc);
        for j in 0..sp.ppc[1] {
            for i in 0..sp.ppc[0] {
                poscell.push((
                    (i as Float + 0.5) / sp.ppc[0] as Float,
                    (j as Float + 0.5) / sp.ppc[1] as Float,
                ));
            }
        }

        let n_move = sim.n_move.get();
        let (start, end) = match sp.density {
            Density::Uniform { .. } => (xrange[0], xrange[1]),
            Density::Step { start, .. } => {
                let s = (start / sim.dx) as i32 - n_move;
                (s.max(xrange[0]), xrange[1])
            }
            Density::Slab { start, end, .. } => {
                let s = (start / sim.dx) as i32 - n_move;
                let e = (end / sim.dx) as i32 - n_move;
                (s.max(xrange[0]), e.min(xrange[1]))
            }
        };
        if start >= end || yrange[0] >= yrange[1] {
            return;
        }

        let n_inj = (end - start) as usize * (yrange[1] - yrange[0]) as usize * npc;
        self.reserve_for(n_inj);

        let mut rng = thread_rng();
        for iy in yrange[0]..yrange[1] {
            for ix in start..end {
                for &(px, py) in poscell.iter() {
                    let mut u = [0.0 as Float; 3];
                    for (d, v) in u.iter_mut().enumerate() {
                        let r: Float = rng.sample(StandardNormal);
                        *v = sp.ufl[d] + sp.uth[d] * r;
                    }
                    let tag = self.next_tag;
                    self.next_tag += 1;
                    self.push_prt(Prt {
                        ix,
                        iy,
                        x: px,
                        y: py,
                        ux: u[0],
                        uy: u[1],
                        uz: u[2],
                        tag,
                    });
                }
            }
        }
    }
}

// Total kinetic energy of a store, using u^2 / (gamma + 1) which stays
// accurate for cold particles.
pub fn kinetic_energy(prtls: &Prtls) -> Float {
    let mut energy = 0.0;
    for (ux, uy, uz, dead) in izip!(&prtls.ux, &prtls.uy, &prtls.uz, &prtls.dead) {
        if *dead {
            continue;
        }
        let usq = ux * ux + uy * uy + uz * uz;
        let gamma = (1.0 + usq).sqrt();
        energy += usq / (gamma + 1.0);
    }
    energy
}
