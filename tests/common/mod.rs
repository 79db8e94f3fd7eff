#![allow(dead_code)]

use empic_rs::prtls::{Density, Species};
use empic_rs::{Config, Float, Output, Params, Setup, Sim, SpeciesCfg};

// Sets up a dummy small simulation so that it can be used in testing.
pub fn setup_sim(n_regions: usize, moving_window: bool) -> Sim {
    let cfg = Config {
        params: Params {
            size_x: 24,
            size_y: 12,
            box_x: 24.0,
            box_y: 12.0,
            dt: 0.5,
            n_pass: 2,
            moving_window,
        },
        setup: Setup {
            t_final: 100,
            n_regions,
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

pub fn species(m_q: Float, ufl: [Float; 3], uth: [Float; 3], ppc: [usize; 2]) -> Species {
    Species::new(&SpeciesCfg {
        name: "test".to_string(),
        m_q,
        ppc,
        ufl,
        uth,
        density: Density::Uniform { n: 1.0 },
    })
}
