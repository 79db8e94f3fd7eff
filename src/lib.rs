use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::fs;

pub mod flds;
pub mod prtls;
pub mod save;

use crate::flds::current::Current;
use crate::flds::vfld::VecGrid;
use crate::flds::Emf;
use crate::prtls::push::{advance, PushStats};
use crate::prtls::{bounds, sort, Density, Prtls, Species};

// We use a type alias for f64/Float to easily support
// double and single precision.
#[cfg(feature = "dprec")]
pub type Float = f64;

#[cfg(not(feature = "dprec"))]
pub type Float = f32;

// Particles handled per parallel task before rayon is allowed to split.
pub(crate) const PRTL_CHUNK_SIZE: usize = 8192;

// Buffer capacities grow in whole blocks of this size.
pub(crate) const GROW_BLOCK: usize = 1024;

pub(crate) fn block_round(n: usize) -> usize {
    (n / GROW_BLOCK + 1) * GROW_BLOCK
}

#[derive(Deserialize)]
pub struct Config {
    pub params: Params,
    pub setup: Setup,
    pub output: Output,
    pub species: Vec<SpeciesCfg>,
}

#[derive(Deserialize)]
pub struct Params {
    pub size_x: usize,
    pub size_y: usize,
    pub box_x: Float,
    pub box_y: Float,
    pub dt: Float,
    pub n_pass: u8,
    pub moving_window: bool,
}

#[derive(Deserialize)]
pub struct Setup {
    pub t_final: u32,
    pub n_regions: usize,
    pub sort_interval: u32,
    pub bin_size: usize,
}

#[derive(Deserialize)]
pub struct Output {
    pub write_output: bool,
    pub output_interval: u32,
    pub stride: usize,
}

#[derive(Deserialize)]
pub struct SpeciesCfg {
    pub name: String,
    pub m_q: Float,
    pub ppc: [usize; 2],
    pub ufl: [Float; 3],
    pub uth: [Float; 3],
    pub density: Density,
}

impl Config {
    pub fn new() -> Result<Config> {
        let contents =
            fs::read_to_string("config.toml").context("Could not open the config.toml file")?;
        toml::from_str(&contents).with_context(|| "Could not parse Config file")
    }
}

pub struct Sim {
    pub t: std::cell::Cell<u32>,
    pub n_move: std::cell::Cell<i32>,
    pub t_final: u32,
    pub size_x: usize,
    pub size_y: usize,
    pub box_x: Float,
    pub box_y: Float,
    pub dx: Float,
    pub dy: Float,
    pub dt: Float,
    pub n_regions: usize,
    pub sort_interval: u32,
    pub bin_size: usize,
    pub n_pass: u8,
    pub moving_window: bool,
    pub config: Config,
}

impl Sim {
    pub fn new(cfg: Config) -> Sim {
        Sim {
            t: std::cell::Cell::new(0),
            n_move: std::cell::Cell::new(0),
            t_final: cfg.setup.t_final,
            size_x: cfg.params.size_x,
            size_y: cfg.params.size_y,
            box_x: cfg.params.box_x,
            box_y: cfg.params.box_y,
            dx: cfg.params.box_x / cfg.params.size_x as Float,
            dy: cfg.params.box_y / cfg.params.size_y as Float,
            dt: cfg.params.dt,
            n_regions: cfg.setup.n_regions,
            sort_interval: cfg.setup.sort_interval,
            bin_size: cfg.setup.bin_size,
            n_pass: cfg.params.n_pass,
            moving_window: cfg.params.moving_window,
            config: cfg,
        }
    }

    // True when the window has traveled one more full cell width.
    fn shift_due(&self, iter: u32) -> bool {
        self.moving_window
            && iter as Float * self.dt > self.dx * (self.n_move.get() + 1) as Float
    }
}

// One horizontal slice of the domain: the rows [ylims[0], ylims[1]) of
// every species, plus the slice of the current grid they deposit into.
pub struct Region {
    pub ylims: [i32; 2],
    pub jay: VecGrid,
    pub prtls: Vec<Prtls>,
}

// Cut the domain into n_regions equal stripes and fill each with the
// initial particle distribution of every species.
pub fn build_regions(sim: &Sim, species: &[Species]) -> Vec<Region> {
    let ny_r = (sim.size_y / sim.n_regions) as i32;
    (0..sim.n_regions as i32)
        .map(|r| {
            let ylims = [r * ny_r, (r + 1) * ny_r];
            let prtls = species
                .iter()
                .map(|sp| {
                    let mut p = Prtls::new();
                    p.inject(sp, sim, [0, sim.size_x as i32], ylims);
                    p
                })
                .collect();
            Region {
                ylims,
                jay: VecGrid::new(sim.size_x, ny_r as usize),
                prtls,
            }
        })
        .collect()
}

// Hand every outbound buffer to its destination region. Runs after the
// transfer barrier, one producer and one consumer per buffer.
pub fn drain_transfer(n_species: usize, regions: &mut [Region]) {
    let n = regions.len();
    for r in 0..n {
        for s in 0..n_species {
            let mut up = std::mem::take(&mut regions[r].prtls[s].out_up);
            let mut down = std::mem::take(&mut regions[r].prtls[s].out_down);
            regions[(r + 1) % n].prtls[s].absorb(&mut up);
            regions[(r + n - 1) % n].prtls[s].absorb(&mut down);
            up.clear();
            down.clear();
            regions[r].prtls[s].out_up = up;
            regions[r].prtls[s].out_down = down;
        }
    }
}

// One full simulation step: push + deposit per region, boundary and region
// transfer, current reduction and smoothing, field solve, buffer drain and
// window injection, then a periodic sort/compaction pass. Each phase
// finishes before the next starts.
pub fn step(
    sim: &Sim,
    species: &[Species],
    regions: &mut [Region],
    emf: &mut Emf,
    jay: &mut Current,
    stats: &mut PushStats,
) {
    let iter = sim.t.get() + 1;
    let shift = sim.shift_due(iter);

    jay.zero();
    for region in regions.iter_mut() {
        region.jay.zero();
    }

    for region in regions.iter_mut() {
        for (sp, prtls) in species.iter().zip(region.prtls.iter_mut()) {
            advance(prtls, sp, sim, emf, &mut region.jay, region.ylims[0], stats);
        }
    }

    for region in regions.iter_mut() {
        for prtls in region.prtls.iter_mut() {
            bounds::transfer(prtls, sim, region.ylims, shift);
        }
    }

    for region in regions.iter() {
        jay.gather(&region.jay, region.ylims[0]);
    }
    jay.reduce_bnd(!sim.moving_window);
    jay.smooth(!sim.moving_window);

    emf.advance(sim, &jay.j);
    if shift {
        emf.move_window();
    }

    drain_transfer(species.len(), regions);

    if shift {
        sim.n_move.set(sim.n_move.get() + 1);
        // fresh plasma flows in at the leading edge
        let xr = [sim.size_x as i32 - 1, sim.size_x as i32];
        for region in regions.iter_mut() {
            for (sp, prtls) in species.iter().zip(region.prtls.iter_mut()) {
                prtls.inject(sp, sim, xr, region.ylims);
            }
        }
    }

    if sim.sort_interval > 0 && iter % sim.sort_interval == 0 {
        for region in regions.iter_mut() {
            for prtls in region.prtls.iter_mut() {
                sort::sort(prtls, sim, region.ylims);
            }
        }
    }

    sim.t.set(iter);
}

pub fn run(cfg: Config) -> Result<()> {
    ensure!(
        cfg.params.size_y % cfg.setup.n_regions == 0,
        "Number of cells in y direction must divide evenly into regions"
    );
    ensure!(cfg.setup.bin_size > 0, "bin_size must be positive");
    ensure!(cfg.output.stride > 0, "output stride must be positive");
    ensure!(
        cfg.params.dt < cfg.params.box_x / cfg.params.size_x as Float
            && cfg.params.dt < cfg.params.box_y / cfg.params.size_y as Float,
        "Timestep too large for this grid"
    );
    for sp in cfg.species.iter() {
        ensure!(
            sp.ppc[0] > 0 && sp.ppc[1] > 0,
            "Species {} must have at least one particle per cell",
            sp.name
        );
    }

    let sim = Sim::new(cfg);
    println!("initializing prtls");
    let species: Vec<Species> = sim.config.species.iter().map(Species::new).collect();
    let mut regions = build_regions(&sim, &species);
    let mut emf = Emf::new(&sim);
    let mut jay = Current::new(&sim);
    let mut stats = PushStats::default();

    for t in 0..=sim.t_final {
        if sim.config.output.write_output {
            save::save_output(t, &sim, &species, &regions, &emf)?;
        }
        println!("{}", t);
        step(&sim, &species, &mut regions, &mut emf, &mut jay, &mut stats);
    }

    let energy: Float = regions
        .iter()
        .flat_map(|r| r.prtls.iter())
        .map(prtls::kinetic_energy)
        .sum();
    println!(
        "pushed {} prtls in {:.3} s ({:.1} ns per push), final kinetic energy {:.6e}",
        stats.n_push,
        stats.secs,
        stats.secs_per_push() * 1e9,
        energy
    );
    Ok(())
}

// A small dummy simulation, fixed window, one region, used all over the
// test suite.
pub fn build_test_sim() -> Sim {
    let cfg = Config {
        params: Params {
            size_x: 24,
            size_y: 12,
            box_x: 24.0,
            box_y: 12.0,
            dt: 0.5,
            n_pass: 2,
            moving_window: false,
        },
        setup: Setup {
            t_final: 100,
            n_regions: 1,
            sort_interval: 5,
            bin_size: 4,
        },
        output: Output {
            write_output: false,
            output_interval: 100,
            stride: 4,
        },
        species: Vec::new(),
    };
    Sim::new(cfg)
}
