//! Tile partition and scheduling map (component F, §4.6), grounded on the
//! original's `RenderTileMap`: a single `RwLock`-guarded vector of tiles
//! (§5 "tile map is guarded by a reader-writer lock").

use super::tile::{RenderTile, TileState};
use crate::sampler::SamplerMode;
use parking_lot::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileLayout {
    Linear,
    /// Checker pass: even rows emit even columns first, then odd, then the
    /// row parity swaps — interleaves cache lines across worker threads.
    Tile,
    /// Lattice points enumerated in order of increasing Chebyshev radius
    /// from the image center.
    Spiral,
}

/// Default tile edge length (§4.6 "8x8 or next-pow-2 matching thread
/// count").
#[must_use]
pub fn default_tile_size(thread_count: u32, image_w: u32, image_h: u32) -> u32 {
    let mut size = 8u32;
    while size > 1 {
        let tiles_x = image_w.div_ceil(size);
        let tiles_y = image_h.div_ceil(size);
        if tiles_x * tiles_y >= 4 * thread_count.max(1) {
            break;
        }
        size /= 2;
    }
    size.max(1)
}

fn grid_dims(image_w: u32, image_h: u32, tile_size: u32) -> (u32, u32) {
    (image_w.div_ceil(tile_size), image_h.div_ceil(tile_size))
}

/// Row-major order of `(col, row)` grid coordinates.
fn linear_order(cols: u32, rows: u32) -> Vec<(u32, u32)> {
    (0..rows).flat_map(|r| (0..cols).map(move |c| (c, r))).collect()
}

/// Checkerboard interleave: each row first emits columns with the row's
/// own parity, then the opposite parity.
fn tile_order(cols: u32, rows: u32) -> Vec<(u32, u32)> {
    let mut out = Vec::with_capacity((cols * rows) as usize);
    for r in 0..rows {
        let parity = r % 2;
        for c in 0..cols {
            if c % 2 == parity {
                out.push((c, r));
            }
        }
        for c in 0..cols {
            if c % 2 != parity {
                out.push((c, r));
            }
        }
    }
    out
}

/// Chebyshev-radius spiral from the grid center, increasing radius first,
/// then row-major within each radius ring for a stable order.
fn spiral_order(cols: u32, rows: u32) -> Vec<(u32, u32)> {
    let cx = i64::from(cols) / 2;
    let cy = i64::from(rows) / 2;
    let mut coords: Vec<(u32, u32)> = (0..rows).flat_map(|r| (0..cols).map(move |c| (c, r))).collect();
    coords.sort_by_key(|&(c, r)| {
        let radius = (i64::from(c) - cx).abs().max((i64::from(r) - cy).abs());
        (radius, r, c)
    });
    coords
}

pub struct TileMap {
    tiles: RwLock<Vec<RenderTile>>,
    tile_size: u32,
}

impl TileMap {
    #[must_use]
    pub fn new(
        image_w: u32,
        image_h: u32,
        tile_size: u32,
        layout: TileLayout,
        max_samples: u32,
        sampler_mode: SamplerMode,
        seed: u64,
    ) -> Self {
        let (cols, rows) = grid_dims(image_w, image_h, tile_size);
        let order = match layout {
            TileLayout::Linear => linear_order(cols, rows),
            TileLayout::Tile => tile_order(cols, rows),
            TileLayout::Spiral => spiral_order(cols, rows),
        };

        let tiles = order
            .into_iter()
            .enumerate()
            .map(|(index, (c, r))| {
                let sx = c * tile_size;
                let sy = r * tile_size;
                let ex = (sx + tile_size).min(image_w);
                let ey = (sy + tile_size).min(image_h);
                RenderTile::new(sx, sy, ex, ey, index as u32, max_samples, sampler_mode, seed)
            })
            .collect();

        Self { tiles: RwLock::new(tiles), tile_size }
    }

    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.read().len()
    }

    #[must_use]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Atomically transitions the next `Free` tile whose own progress is
    /// still under `max_iter` samples to `Working` and returns its index,
    /// under a single writer lock — the original's
    /// `getNextTile(maxSample)` filtering by `samplesRendered() <=
    /// maxSample` (§4.6).
    pub fn next_free(&self, max_iter: u32) -> Option<usize> {
        let mut tiles = self.tiles.write();
        for (i, tile) in tiles.iter_mut().enumerate() {
            if tile.state() == TileState::Free && tile.samples_rendered() <= max_iter {
                tile.set_state(TileState::Working);
                return Some(i);
            }
        }
        None
    }

    pub fn with_tile_mut<R>(&self, index: usize, f: impl FnOnce(&mut RenderTile) -> R) -> R {
        let mut tiles = self.tiles.write();
        f(&mut tiles[index])
    }

    pub fn release(&self, index: usize) {
        let mut tiles = self.tiles.write();
        tiles[index].set_state(if tiles[index].is_finished() { TileState::Done } else { TileState::Free });
    }

    #[must_use]
    pub fn all_finished(&self) -> bool {
        self.tiles.read().iter().all(RenderTile::is_finished)
    }

    #[must_use]
    pub fn percentage(&self) -> f32 {
        let tiles = self.tiles.read();
        if tiles.is_empty() {
            return 1.0;
        }
        let finished = tiles.iter().filter(|t| t.is_finished()).count();
        finished as f32 / tiles.len() as f32
    }

    pub fn reset(&self) {
        for tile in self.tiles.write().iter_mut() {
            tile.reset();
        }
    }
}
