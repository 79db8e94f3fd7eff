use crate::prtls::Prtls;
use crate::{Float, Sim, PRTL_CHUNK_SIZE};
use rayon::prelude::*;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

// Full state of one particle, as it travels between region stores.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Prt {
    pub ix: i32,
    pub iy: i32,
    pub x: Float,
    pub y: Float,
    pub ux: Float,
    pub uy: Float,
    pub uz: Float,
    pub tag: u64,
}

#[repr(transparent)]
struct Slot(UnsafeCell<Prt>);

// Slots are only written through indices reserved by the atomic counter,
// one writer per slot, so sharing them across the parallel scan is sound.
unsafe impl Sync for Slot {}

// Outbound transfer buffer: many particle tasks append concurrently by
// reserving a slot with an atomic increment-and-fetch; the neighboring
// region drains it after the barrier.
#[derive(Default)]
pub struct XferBuf {
    n: AtomicUsize,
    slots: Vec<Slot>,
}

impl XferBuf {
    pub fn len(&self) -> usize {
        self.n.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        *self.n.get_mut() = 0;
    }

    // Grow (never shrink) to hold at least `cap` entries, rounded up to a
    // whole allocation block. Must happen before the parallel scan; the
    // buffer cannot grow while writers hold slots.
    pub fn ensure_capacity(&mut self, cap: usize) {
        if self.slots.len() < cap {
            let cap = crate::block_round(cap);
            self.slots
                .resize_with(cap, || Slot(UnsafeCell::new(Prt::default())));
        }
    }

    #[inline(always)]
    pub fn push(&self, p: Prt) {
        let idx = self.n.fetch_add(1, Ordering::Relaxed);
        // capacity is sized for the worst case before the scan starts
        assert!(idx < self.slots.len(), "transfer buffer overflow");
        unsafe {
            *self.slots[idx].0.get() = p;
        }
    }

    pub fn as_slice(&mut self) -> &[Prt] {
        let n = *self.n.get_mut();
        // Slot is repr(transparent) over Prt and &mut self guarantees no
        // concurrent writers
        unsafe { std::slice::from_raw_parts(self.slots.as_ptr() as *const Prt, n) }
    }
}

// Classify every live particle of a region store after the push: wrap x
// periodically (or, on a moving-window shift step, slide every particle one
// cell left and drop the ones that fall off the domain), and move particles
// whose row left [y0, y1) into the outbound buffer toward that neighbor,
// tombstoning the source slot. The y index is wrapped here when the particle
// crosses the global domain edge, so receivers always see in-domain rows.
pub fn transfer(prtls: &mut Prtls, sim: &Sim, ylims: [i32; 2], shift: bool) {
    let nx = sim.size_x as i32;
    let ny = sim.size_y as i32;
    let moving_window = sim.moving_window;
    let [y0, y1] = ylims;

    let n = prtls.np();
    prtls.out_down.ensure_capacity(n.max(1));
    prtls.out_up.ensure_capacity(n.max(1));

    let Prtls {
        ix,
        iy,
        x,
        y,
        ux,
        uy,
        uz,
        tag,
        dead,
        out_down,
        out_up,
        ..
    } = prtls;
    let (down, up): (&XferBuf, &XferBuf) = (out_down, out_up);

    (
        &mut ix[..],
        &mut iy[..],
        &x[..],
        &y[..],
        &ux[..],
        &uy[..],
        &uz[..],
        &tag[..],
        &mut dead[..],
    )
        .into_par_iter()
        .with_min_len(PRTL_CHUNK_SIZE)
        .for_each(|(ix, iy, x, y, ux, uy, uz, tag, dead)| {
            if *dead {
                return;
            }

            if moving_window {
                // slide left before the membership test
                if shift {
                    *ix -= 1;
                }
                if *ix < 0 || *ix >= nx {
                    *dead = true;
                    return;
                }
            } else {
                // periodic x
                if *ix < 0 {
                    *ix += nx;
                } else if *ix >= nx {
                    *ix -= nx;
                }
            }

            if *iy < y0 {
                if *iy < 0 {
                    *iy += ny;
                }
                down.push(Prt {
                    ix: *ix,
                    iy: *iy,
                    x: *x,
                    y: *y,
                    ux: *ux,
                    uy: *uy,
                    uz: *uz,
                    tag: *tag,
                });
                *dead = true;
            } else if *iy >= y1 {
                if *iy >= ny {
                    *iy -= ny;
                }
                up.push(Prt {
                    ix: *ix,
                    iy: *iy,
                    x: *x,
                    y: *y,
                    ux: *ux,
                    uy: *uy,
                    uz: *uz,
                    tag: *tag,
                });
                *dead = true;
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_append_keeps_every_entry() {
        let mut buf = XferBuf::default();
        buf.ensure_capacity(4096);
        (0..4096u64).into_par_iter().for_each(|t| {
            buf.push(Prt {
                tag: t,
                ..Prt::default()
            });
        });
        let mut tags: Vec<u64> = buf.as_slice().iter().map(|p| p.tag).collect();
        tags.sort_unstable();
        assert_eq!(tags.len(), 4096);
        for (i, t) in tags.into_iter().enumerate() {
            assert_eq!(i as u64, t);
        }
    }

    #[test]
    fn capacity_rounds_to_blocks() {
        let mut buf = XferBuf::default();
        buf.ensure_capacity(10);
        assert_eq!(buf.slots.len(), 1024);
        buf.ensure_capacity(1500);
        assert_eq!(buf.slots.len(), 2048);
    }
}
