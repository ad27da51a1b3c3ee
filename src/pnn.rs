//! Pairwise-nearest-neighbor clustering over histogram bins.
//!
//! Repeatedly merges the two bins whose union increases the weighted
//! squared error the least (Ward's criterion), until at most `max_colors`
//! bins remain. Candidates are tracked in an array min-heap keyed by merge
//! error; stale entries are revalidated lazily at pop time.

extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use log::debug;
use rgb::RGBA8;

use crate::histogram::Bin;
use crate::palette::Palette;
use crate::{PixelFormat, QuantizeOptions};

fn sqr(x: f64) -> f64 {
    x * x
}

/// Find the cheapest merge partner for `idx` among its forward neighbors.
///
/// Only the forward half of the list is scanned; each pair is still
/// covered because the earlier bin of the pair scans past the later one,
/// and the merge loop re-evaluates whenever a cached result goes stale.
/// The channel sum is accumulated with an early exit against the best
/// error so far.
fn find_nn(bins: &mut [Bin], idx: usize, has_alpha: bool) {
    let mut nn = 0usize;
    let mut err = 1e100_f64;

    let n1 = bins[idx].cnt;
    let wa = bins[idx].ac;
    let wr = bins[idx].rc;
    let wg = bins[idx].gc;
    let wb = bins[idx].bc;

    let mut i = bins[idx].fw as usize;
    while i != 0 {
        let bin = &bins[i];
        let next = bin.fw as usize;
        let n2 = bin.cnt;
        let nerr2 = (n1 * n2) / (n1 + n2);
        if nerr2 >= err {
            i = next;
            continue;
        }

        let mut nerr = 0.0;
        if has_alpha {
            nerr += nerr2 * sqr(bin.ac - wa);
            if nerr >= err {
                i = next;
                continue;
            }
        }
        nerr += nerr2 * sqr(bin.rc - wr);
        if nerr >= err {
            i = next;
            continue;
        }
        nerr += nerr2 * sqr(bin.gc - wg);
        if nerr >= err {
            i = next;
            continue;
        }
        nerr += nerr2 * sqr(bin.bc - wb);
        if nerr < err {
            err = nerr;
            nn = i;
        }
        i = next;
    }

    bins[idx].err = err;
    bins[idx].nn = nn as u32;
}

/// Cluster `bins` down to `max_colors` and emit the palette.
///
/// `bincount` is the packed-key table size for the format; `bincount - 1`
/// doubles as the tombstone stamp for merged-away bins.
pub(crate) fn quantize_bins(
    mut bins: Vec<Bin>,
    bincount: usize,
    max_colors: usize,
    opts: &QuantizeOptions,
) -> Palette {
    let has_alpha = opts.format == PixelFormat::Rgba4444;
    let maxbins = bins.len();
    if maxbins == 0 {
        return Palette::new(has_alpha);
    }

    let mut use_sqrt = opts.use_sqrt;
    if sqr(max_colors as f64) / (maxbins as f64) < 0.022 {
        use_sqrt = false;
    }

    // Link bins in index order; optionally damp counts so heavily
    // populated bins do not dominate the merge order.
    for i in 0..maxbins - 1 {
        bins[i].fw = (i + 1) as u32;
        bins[i + 1].bk = i as u32;
        if use_sqrt {
            bins[i].cnt = bins[i].cnt.sqrt();
        }
    }
    if use_sqrt {
        bins[maxbins - 1].cnt = bins[maxbins - 1].cnt.sqrt();
    }

    // heap[0] holds the live size, heap[1] the root.
    let mut heap = vec![0u32; maxbins + 1];
    for i in 0..maxbins {
        find_nn(&mut bins, i, has_alpha);
        let err = bins[i].err;
        heap[0] += 1;
        let mut l = heap[0] as usize;
        while l > 1 {
            let parent = l >> 1;
            let h = heap[parent] as usize;
            if bins[h].err <= err {
                break;
            }
            heap[l] = h as u32;
            l = parent;
        }
        heap[l] = i as u32;
    }

    let extbins = maxbins.saturating_sub(max_colors);
    let dead = (bincount - 1) as u32;
    let mut i = 0usize;
    while i < extbins {
        // Pop the cheapest candidate, lazily fixing up the heap: a stored
        // error is valid only if neither the bin nor its partner changed
        // since it was computed.
        let b1;
        loop {
            let mut cand = heap[1] as usize;
            {
                let tb = &bins[cand];
                if tb.tm >= tb.mtm && bins[tb.nn as usize].mtm <= tb.tm {
                    b1 = cand;
                    break;
                }
            }
            if bins[cand].mtm == dead {
                cand = heap[heap[0] as usize] as usize;
                heap[1] = cand as u32;
                heap[0] -= 1;
            } else {
                find_nn(&mut bins, cand, has_alpha);
                bins[cand].tm = i as u32;
            }

            let err = bins[cand].err;
            let size = heap[0] as usize;
            let mut l = 1usize;
            loop {
                let mut child = l << 1;
                if child > size {
                    break;
                }
                if child < size
                    && bins[heap[child] as usize].err > bins[heap[child + 1] as usize].err
                {
                    child += 1;
                }
                let h = heap[child] as usize;
                if err <= bins[h].err {
                    break;
                }
                heap[l] = h as u32;
                l = child;
            }
            heap[l] = cand as u32;
        }

        // Merge the partner into b1: weighted average of channel means.
        let nb = bins[b1].nn as usize;
        let n1 = bins[b1].cnt;
        let n2 = bins[nb].cnt;
        let d = 1.0 / (n1 + n2);
        if has_alpha {
            bins[b1].ac = d * (n1 * bins[b1].ac + n2 * bins[nb].ac).round();
        }
        bins[b1].rc = d * (n1 * bins[b1].rc + n2 * bins[nb].rc).round();
        bins[b1].gc = d * (n1 * bins[b1].gc + n2 * bins[nb].gc).round();
        bins[b1].bc = d * (n1 * bins[b1].bc + n2 * bins[nb].bc).round();
        bins[b1].cnt += n2;
        i += 1;
        bins[b1].mtm = i as u32;

        let (fw, bk) = (bins[nb].fw, bins[nb].bk);
        bins[bk as usize].fw = fw;
        bins[fw as usize].bk = bk;
        bins[nb].mtm = dead;
    }

    // Walk the surviving list from the head and emit rounded entries.
    let mut palette = Palette::new(has_alpha);
    let mut i = 0usize;
    loop {
        let mut r = bins[i].rc.round().clamp(0.0, 255.0) as u8;
        let mut g = bins[i].gc.round().clamp(0.0, 255.0) as u8;
        let mut b = bins[i].bc.round().clamp(0.0, 255.0) as u8;
        let mut a = 0xff;
        if has_alpha {
            a = bins[i].ac.round().clamp(0.0, 255.0) as u8;
            if let Some(threshold) = opts.one_bit_alpha {
                a = if a <= threshold { 0x00 } else { 0xff };
            }
            if opts.clear_alpha && a <= opts.clear_alpha_threshold {
                r = opts.clear_alpha_color.r;
                g = opts.clear_alpha_color.g;
                b = opts.clear_alpha_color.b;
                a = 0x00;
            }
        }
        palette.push_unique(RGBA8::new(r, g, b, a));
        i = bins[i].fw as usize;
        if i == 0 {
            break;
        }
    }

    debug!(
        "pnn: {} bins -> {} palette entries (use_sqrt={})",
        maxbins,
        palette.len(),
        use_sqrt
    );
    palette
}
