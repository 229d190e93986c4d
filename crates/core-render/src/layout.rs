//! Rank-to-pixel layout math for the partitioning strategies.
//!
//! Pure geometry, no IO: each type answers "which rectangle does rank r
//! own" for one partitioning scheme. Both coordinator and worker sides
//! derive their regions from the same layout value, so ownership can never
//! disagree across ranks.

/// Rank index. Mirrors the fabric's rank type without pulling a fabric
/// dependency into pure geometry.
pub type Rank = usize;

/// Vertical strips: rank r owns columns [r·w, r·w+w) with w = ⌊W/P⌋; the
/// last rank additionally owns the W mod P remainder columns. Full image
/// height.
#[derive(Debug, Clone, Copy)]
pub struct Strips {
    image_width: u32,
    procs: usize,
}

impl Strips {
    pub fn new(image_width: u32, procs: usize) -> Self {
        Self { image_width, procs }
    }

    /// Nominal strip width ⌊W/P⌋.
    pub fn base_width(&self) -> u32 {
        self.image_width / self.procs as u32
    }

    pub fn x_origin(&self, rank: Rank) -> u32 {
        self.base_width() * rank as u32
    }

    pub fn width_of(&self, rank: Rank) -> u32 {
        let mut width = self.base_width();
        if rank == self.procs - 1 {
            width += self.image_width % self.procs as u32;
        }
        width
    }
}

/// Square-block grid: S = ⌊√P⌋, rank r < S² owns the S×S grid cell
/// (r mod S, r div S) of nominal size ⌊W/S⌋×⌊H/S⌋. Cells in the last grid
/// column absorb the W mod S remainder columns and cells in the last grid
/// row the H mod S remainder rows, so the cells tile the image exactly.
/// Ranks ≥ S² are outside the grid and render nothing.
#[derive(Debug, Clone, Copy)]
pub struct BlockGrid {
    image_width: u32,
    image_height: u32,
    side: u32,
}

impl BlockGrid {
    pub fn new(image_width: u32, image_height: u32, procs: usize) -> Self {
        Self {
            image_width,
            image_height,
            side: procs.isqrt() as u32,
        }
    }

    /// Grid side S = ⌊√P⌋.
    pub fn side(&self) -> u32 {
        self.side
    }

    /// Ranks that own a grid cell; the rest stay idle.
    pub fn in_grid(&self, rank: Rank) -> bool {
        (rank as u32) < self.side * self.side
    }

    pub fn nominal_size(&self) -> (u32, u32) {
        (self.image_width / self.side, self.image_height / self.side)
    }

    pub fn origin(&self, rank: Rank) -> (u32, u32) {
        debug_assert!(self.in_grid(rank));
        let (bw, bh) = self.nominal_size();
        let rank = rank as u32;
        (bw * (rank % self.side), bh * (rank / self.side))
    }

    /// Cell size for `rank`: nominal, widened by the width remainder in the
    /// last grid column and by the height remainder in the last grid row.
    pub fn size_of(&self, rank: Rank) -> (u32, u32) {
        debug_assert!(self.in_grid(rank));
        let (mut w, mut h) = self.nominal_size();
        let rank = rank as u32;
        if rank % self.side == self.side - 1 {
            w += self.image_width % self.side;
        }
        if rank / self.side == self.side - 1 {
            h += self.image_height % self.side;
        }
        (w, h)
    }
}

/// Cyclic horizontal bands: the image is cut into bands of `cycle` rows
/// (last band possibly shorter); band k belongs to rank k mod P.
#[derive(Debug, Clone, Copy)]
pub struct Bands {
    image_height: u32,
    cycle: u32,
    procs: usize,
}

impl Bands {
    pub fn new(image_height: u32, cycle: u32, procs: usize) -> Self {
        Self {
            image_height,
            cycle,
            procs,
        }
    }

    /// Total band count N = ⌈H/C⌉.
    pub fn count(&self) -> u32 {
        self.image_height.div_ceil(self.cycle)
    }

    pub fn owner(&self, band: u32) -> Rank {
        band as usize % self.procs
    }

    pub fn y_origin(&self, band: u32) -> u32 {
        band * self.cycle
    }

    /// Band height; the last band is truncated to H − k·C.
    pub fn height_of(&self, band: u32) -> u32 {
        self.cycle.min(self.image_height - self.y_origin(band))
    }

    /// Index of `band` within its owner's packed staging buffer.
    pub fn local_index(&self, band: u32) -> u32 {
        band / self.procs as u32
    }

    /// Upper bound on bands per rank, ⌈N/P⌉ + 1. Sizing every worker
    /// buffer to this constant avoids a per-worker size negotiation.
    pub fn max_bands_per_rank(&self) -> u32 {
        self.count().div_ceil(self.procs as u32) + 1
    }

    /// Bands owned by `rank`, in increasing order.
    pub fn bands_of(&self, rank: Rank) -> impl Iterator<Item = u32> + use<> {
        (rank as u32..self.count()).step_by(self.procs)
    }
}

/// Row-major tile iterator for the dynamic strategy: origins advance by
/// `tile_width` across a row, then wrap to the next row of tiles. Tiles at
/// the right and bottom edges may extend past the image and are clipped by
/// [`TileCursor::clipped_size`].
#[derive(Debug, Clone, Copy)]
pub struct TileCursor {
    image_width: u32,
    image_height: u32,
    tile_width: u32,
    tile_height: u32,
    next_x: u32,
    next_y: u32,
}

impl TileCursor {
    pub fn new(image_width: u32, image_height: u32, tile_width: u32, tile_height: u32) -> Self {
        Self {
            image_width,
            image_height,
            tile_width,
            tile_height,
            next_x: 0,
            next_y: 0,
        }
    }

    /// Total number of tiles: ⌈W/Bw⌉·⌈H/Bh⌉.
    pub fn tile_count(&self) -> usize {
        self.image_width.div_ceil(self.tile_width) as usize
            * self.image_height.div_ceil(self.tile_height) as usize
    }

    /// In-image size of the tile at `origin`, clipped to the image edges.
    pub fn clipped_size(&self, origin: (u32, u32)) -> (u32, u32) {
        (
            self.tile_width.min(self.image_width - origin.0),
            self.tile_height.min(self.image_height - origin.1),
        )
    }
}

impl Iterator for TileCursor {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<(u32, u32)> {
        if self.next_y >= self.image_height {
            return None;
        }
        let origin = (self.next_x, self.next_y);
        self.next_x += self.tile_width;
        if self.next_x >= self.image_width {
            self.next_x = 0;
            self.next_y += self.tile_height;
        }
        Some(origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_with_remainder() {
        // W=10, P=3: widths 3, 3, 4 at x = 0, 3, 6.
        let strips = Strips::new(10, 3);
        assert_eq!(strips.base_width(), 3);
        assert_eq!(
            (0..3).map(|r| strips.x_origin(r)).collect::<Vec<_>>(),
            vec![0, 3, 6]
        );
        assert_eq!(
            (0..3).map(|r| strips.width_of(r)).collect::<Vec<_>>(),
            vec![3, 3, 4]
        );
    }

    #[test]
    fn blocks_perfect_square() {
        // 8×8, P=4: S=2, each rank owns a 4×4 cell at (r%2, r/2).
        let grid = BlockGrid::new(8, 8, 4);
        assert_eq!(grid.side(), 2);
        assert_eq!(grid.origin(0), (0, 0));
        assert_eq!(grid.origin(1), (4, 0));
        assert_eq!(grid.origin(2), (0, 4));
        assert_eq!(grid.origin(3), (4, 4));
        for r in 0..4 {
            assert_eq!(grid.size_of(r), (4, 4));
        }
    }

    #[test]
    fn blocks_remainders_go_to_edge_cells() {
        // 13×11, P=4: S=2, nominal 6×5. The right column absorbs the extra
        // column, the bottom row the extra row.
        let grid = BlockGrid::new(13, 11, 4);
        assert_eq!(grid.size_of(0), (6, 5));
        assert_eq!(grid.size_of(1), (7, 5));
        assert_eq!(grid.size_of(2), (6, 6));
        assert_eq!(grid.size_of(3), (7, 6));
        // Origins stay nominal.
        assert_eq!(grid.origin(1), (6, 0));
        assert_eq!(grid.origin(2), (0, 5));
        assert_eq!(grid.origin(3), (6, 5));
    }

    #[test]
    fn blocks_non_square_ranks_idle() {
        // P=5: S=2, ranks 0..3 own cells, rank 4 sits out.
        let grid = BlockGrid::new(8, 8, 5);
        assert_eq!(grid.side(), 2);
        assert!(grid.in_grid(3));
        assert!(!grid.in_grid(4));
    }

    #[test]
    fn bands_with_short_tail() {
        // H=10, C=3, P=3: bands 0..3 at y 0,3,6,9; last height 1.
        let bands = Bands::new(10, 3, 3);
        assert_eq!(bands.count(), 4);
        assert_eq!(bands.owner(0), 0);
        assert_eq!(bands.owner(3), 0);
        assert_eq!(bands.height_of(2), 3);
        assert_eq!(bands.height_of(3), 1);
        assert_eq!(bands.bands_of(0).collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(bands.bands_of(1).collect::<Vec<_>>(), vec![1]);
        assert_eq!(bands.local_index(3), 1);
        assert_eq!(bands.local_index(5), 1);
        assert_eq!(bands.max_bands_per_rank(), 3);
    }

    #[test]
    fn tile_cursor_walks_row_major_and_clips() {
        // 10×10 with 4×4 tiles: nine origins, edges clipped to 2.
        let cursor = TileCursor::new(10, 10, 4, 4);
        assert_eq!(cursor.tile_count(), 9);
        let origins: Vec<_> = cursor.collect();
        assert_eq!(
            origins,
            vec![
                (0, 0),
                (4, 0),
                (8, 0),
                (0, 4),
                (4, 4),
                (8, 4),
                (0, 8),
                (4, 8),
                (8, 8),
            ]
        );
        let cursor = TileCursor::new(10, 10, 4, 4);
        assert_eq!(cursor.clipped_size((8, 0)), (2, 4));
        assert_eq!(cursor.clipped_size((0, 8)), (4, 2));
        assert_eq!(cursor.clipped_size((8, 8)), (2, 2));
    }

    #[test]
    fn tile_cursor_single_tile() {
        let mut cursor = TileCursor::new(4, 4, 8, 8);
        assert_eq!(cursor.tile_count(), 1);
        assert_eq!(cursor.next(), Some((0, 0)));
        assert_eq!(cursor.next(), None);
    }
}
