mod common;

use empic_rs::prtls::bounds::Prt;
use empic_rs::prtls::{sort, Prtls};
use empic_rs::Float;

fn bin_of(ix: i32, iy: i32, bin: i32, nbx: i32) -> i32 {
    ix / bin + iy / bin * nbx
}

#[test]
fn sorting_a_sorted_store_changes_nothing() {
    let sim = common::setup_sim(1, false);
    let bin = sim.bin_size as i32;
    let nbx = (sim.size_x as i32 + bin - 1) / bin;
    let nby = (sim.size_y as i32 + bin - 1) / bin;

    // one particle per bin, laid out in bin order
    let mut prtls = Prtls::new();
    let mut tag = 0;
    for by in 0..nby {
        for bx in 0..nbx {
            prtls.push_prt(Prt {
                ix: bx * bin + (tag % bin as u64) as i32,
                iy: by * bin + (tag % 2) as i32,
                x: 0.1 + 0.01 * tag as Float,
                y: 0.9 - 0.01 * tag as Float,
                ux: tag as Float,
                uy: -(tag as Float),
                uz: 0.5,
                tag,
            });
            tag += 1;
        }
    }

    let before_ix = prtls.ix.clone();
    let before_x = prtls.x.clone();
    let before_tag = prtls.tag.clone();

    sort::sort(&mut prtls, &sim, [0, sim.size_y as i32]);

    assert_eq!(prtls.ix, before_ix);
    assert_eq!(prtls.x, before_x);
    assert_eq!(prtls.tag, before_tag);
}

#[test]
fn compaction_drops_exactly_the_tombstones() {
    let sim = common::setup_sim(1, false);
    let n = 500;
    let mut prtls = Prtls::new();
    for i in 0..n {
        prtls.push_prt(Prt {
            ix: (i * 7 % sim.size_x as u64) as i32,
            iy: (i * 3 % sim.size_y as u64) as i32,
            x: 0.5,
            y: 0.5,
            ux: i as Float,
            uy: 0.0,
            uz: 0.0,
            tag: i,
        });
    }
    // tombstone every third particle
    let mut expected: Vec<u64> = Vec::new();
    for i in 0..n as usize {
        if i % 3 == 0 {
            prtls.dead[i] = true;
        } else {
            expected.push(prtls.tag[i]);
        }
    }

    sort::sort(&mut prtls, &sim, [0, sim.size_y as i32]);

    assert_eq!(prtls.np(), expected.len());
    assert!(prtls.dead.iter().all(|&d| !d));

    // the survivors are the same multiset, and momentum rode along with
    // the identity
    let mut survivors = prtls.tag.clone();
    survivors.sort_unstable();
    expected.sort_unstable();
    assert_eq!(survivors, expected);
    for i in 0..prtls.np() {
        assert_eq!(prtls.ux[i], prtls.tag[i] as Float);
    }
}

#[test]
fn sorted_store_is_in_bin_order() {
    let sim = common::setup_sim(1, false);
    let bin = sim.bin_size as i32;
    let nbx = (sim.size_x as i32 + bin - 1) / bin;
    let mut prtls = Prtls::new();
    for i in 0..1000u64 {
        prtls.push_prt(Prt {
            ix: (i * 13 % sim.size_x as u64) as i32,
            iy: (i * 5 % sim.size_y as u64) as i32,
            x: 0.25,
            y: 0.25,
            ux: 0.0,
            uy: 0.0,
            uz: 0.0,
            tag: i,
        });
    }

    sort::sort(&mut prtls, &sim, [0, sim.size_y as i32]);

    let mut prev = -1;
    for i in 0..prtls.np() {
        let b = bin_of(prtls.ix[i], prtls.iy[i], bin, nbx);
        assert!(b >= prev);
        prev = b;
    }
}
