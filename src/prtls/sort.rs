use crate::prtls::Prtls;
use crate::{Sim, PRTL_CHUNK_SIZE};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};

// Scan block width; one block's worth of counts is scanned in-place by a
// single task, block totals are scanned recursively and carried back.
const SCAN_BLOCK: usize = 2048;

// Exclusive prefix sum, in place. Decomposes into block-local
// up-sweep/down-sweep scans plus a recursive scan of the block totals and a
// carry pass, so the same shape runs serially or as a parallel-for over
// blocks.
pub(crate) fn prefix_sum(v: &mut [u32]) {
    if v.is_empty() {
        return;
    }
    let mut block_sums: Vec<u32> = v.par_chunks_mut(SCAN_BLOCK).map(scan_block).collect();

    if block_sums.len() > 1 {
        prefix_sum(&mut block_sums);
        v.par_chunks_mut(SCAN_BLOCK)
            .zip(block_sums.par_iter())
            .for_each(|(chunk, carry)| {
                for e in chunk.iter_mut() {
                    *e += carry;
                }
            });
    }
}

// Blelloch scan of one block, padded with zeros up to SCAN_BLOCK. Returns
// the block total.
fn scan_block(chunk: &mut [u32]) -> u32 {
    let mut buf = [0u32; SCAN_BLOCK];
    buf[..chunk.len()].copy_from_slice(chunk);

    // up-sweep
    let mut offset = 1;
    while offset < SCAN_BLOCK {
        let mut i = offset - 1;
        while i + offset < SCAN_BLOCK {
            buf[i + offset] += buf[i];
            i += 2 * offset;
        }
        offset *= 2;
    }

    let total = buf[SCAN_BLOCK - 1];
    buf[SCAN_BLOCK - 1] = 0;

    // down-sweep
    offset = SCAN_BLOCK >> 1;
    while offset > 0 {
        let mut i = offset - 1;
        while i + offset < SCAN_BLOCK {
            let t = buf[i];
            buf[i] = buf[i + offset];
            buf[i + offset] += t;
            i += 2 * offset;
        }
        offset >>= 1;
    }

    chunk.copy_from_slice(&buf[..chunk.len()]);
    total
}

// Write access to a scatter destination from many tasks at once. Sound
// because every live particle reserved a distinct target index through the
// atomic per-bin counters.
struct SyncSlots<T> {
    ptr: *mut T,
    len: usize,
}

unsafe impl<T: Send> Sync for SyncSlots<T> {}

impl<T: Copy> SyncSlots<T> {
    fn new(v: &mut [T]) -> SyncSlots<T> {
        SyncSlots {
            ptr: v.as_mut_ptr(),
            len: v.len(),
        }
    }

    #[inline(always)]
    unsafe fn write(&self, i: usize, val: T) {
        if !cfg!(feature = "unchecked") {
            assert!(i < self.len);
        }
        *self.ptr.add(i) = val;
    }
}

fn par_scatter<T: Copy + Default + Send + Sync>(v: &mut Vec<T>, pos: &[i32], final_size: usize) {
    let mut tmp = vec![T::default(); final_size];
    {
        let slots = SyncSlots::new(&mut tmp[..]);
        v.par_iter()
            .zip(pos.par_iter())
            .with_min_len(PRTL_CHUNK_SIZE)
            .for_each(|(val, &p)| {
                if p >= 0 {
                    unsafe {
                        slots.write(p as usize, *val);
                    }
                }
            });
    }
    v.truncate(final_size);
    v.copy_from_slice(&tmp);
}

// Counting sort of a region store into square spatial bins, dropping
// tombstoned particles. Each live particle captures its arrival rank inside
// its bin; an exclusive prefix sum over the bin counts turns ranks into
// final positions; every array is then scattered in one pass. The new store
// size is the live count.
pub fn sort(prtls: &mut Prtls, sim: &Sim, ylims: [i32; 2]) {
    let n = prtls.np();
    if n == 0 {
        return;
    }

    let bin = sim.bin_size as i32;
    let y0 = ylims[0];
    let nbx = (sim.size_x as i32 + bin - 1) / bin;
    let nby = (ylims[1] - y0 + bin - 1) / bin;
    let nbins = (nbx * nby) as usize;

    let counts: Vec<AtomicU32> = (0..nbins).map(|_| AtomicU32::new(0)).collect();
    let mut pos = vec![0i32; n];

    (
        &prtls.ix[..],
        &prtls.iy[..],
        &prtls.dead[..],
        &mut pos[..],
    )
        .into_par_iter()
        .with_min_len(PRTL_CHUNK_SIZE)
        .for_each(|(ix, iy, dead, p)| {
            if *dead {
                *p = -1;
            } else {
                if !cfg!(feature = "unchecked") {
                    assert!(*ix >= 0 && *iy >= y0);
                }
                let b = (*ix / bin + (*iy - y0) / bin * nbx) as usize;
                *p = counts[b].fetch_add(1, Ordering::Relaxed) as i32;
            }
        });

    let mut bins: Vec<u32> = counts.iter().map(|c| c.load(Ordering::Relaxed)).collect();
    let last = bins[nbins - 1];
    prefix_sum(&mut bins);
    let final_size = (bins[nbins - 1] + last) as usize;

    // turn intra-bin ranks into absolute destinations
    (
        &prtls.ix[..],
        &prtls.iy[..],
        &mut pos[..],
    )
        .into_par_iter()
        .with_min_len(PRTL_CHUNK_SIZE)
        .for_each(|(ix, iy, p)| {
            if *p >= 0 {
                let b = (*ix / bin + (*iy - y0) / bin * nbx) as usize;
                *p += bins[b] as i32;
            }
        });

    par_scatter(&mut prtls.ix, &pos, final_size);
    par_scatter(&mut prtls.iy, &pos, final_size);
    par_scatter(&mut prtls.x, &pos, final_size);
    par_scatter(&mut prtls.y, &pos, final_size);
    par_scatter(&mut prtls.ux, &pos, final_size);
    par_scatter(&mut prtls.uy, &pos, final_size);
    par_scatter(&mut prtls.uz, &pos, final_size);
    par_scatter(&mut prtls.tag, &pos, final_size);

    prtls.dead.truncate(final_size);
    for d in prtls.dead.iter_mut() {
        *d = false;
    }
}
