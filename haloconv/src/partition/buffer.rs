use common::Buffer2;

use crate::kernel::Kernel;
use crate::Rgb;

/// Side of a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
}

/// Double-buffered, halo-padded copy of one band.
///
/// Both buffers are `(height + 2r) x (width + 2r)` where `r` is the kernel
/// radius:
///
/// ```text
/// +---+----------------+---+
/// |   |  top halo (r)  |   |  <- image edge copy, or neighbor's rows
/// +---+----------------+---+
/// | r |    interior    | r |  <- column padding replicates edge columns
/// |   | height x width |   |
/// +---+----------------+---+
/// |   | bottom halo (r)|   |
/// +---+----------------+---+
/// ```
///
/// `current` is read-only during a compute pass; results go to `next`.
#[derive(Debug, Clone)]
pub struct PartitionBuffer {
    current: Buffer2<Rgb>,
    next: Buffer2<Rgb>,
    width: usize,
    height: usize,
    radius: usize,
    is_topmost: bool,
    is_bottommost: bool,
}

impl PartitionBuffer {
    /// Copies the band's `rows` (tightly packed, `width` pixels each) into the
    /// interior and replicates image edges into the padding.
    ///
    /// Halo rows on an internal boundary stay zeroed until the worker fills
    /// them from its neighbor's slot.
    pub fn init(
        rows: &[Rgb],
        width: usize,
        radius: usize,
        is_topmost: bool,
        is_bottommost: bool,
    ) -> Self {
        assert!(width > 0, "band width must be positive");
        assert_eq!(rows.len() % width, 0, "rows must be whole");
        let height = rows.len() / width;
        assert!(height > 0, "band must own at least one row");

        let mut current = Buffer2::new_default(width + 2 * radius, height + 2 * radius);
        for (y, src) in rows.chunks_exact(width).enumerate() {
            current.row_mut(y + radius)[radius..radius + width].copy_from_slice(src);
        }

        pad_edges(&mut current, width, height, radius, is_topmost, is_bottommost);

        Self {
            next: current.clone(),
            current,
            width,
            height,
            radius,
            is_topmost,
            is_bottommost,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Width of a padded row, which is also the width of a halo slot row.
    #[inline]
    pub fn padded_width(&self) -> usize {
        self.width + 2 * self.radius
    }

    /// Computes every interior pixel of `next` from `current`.
    ///
    /// Afterwards the column padding of `next`, and its halo rows on image
    /// edges, replicate the freshly computed edge pixels. Halo rows on
    /// internal boundaries are left to synchronization.
    pub fn compute_interior_rows(&mut self, kernel: &Kernel) {
        assert_eq!(kernel.radius(), self.radius, "kernel radius mismatch");

        let r = self.radius;
        for y in r..r + self.height {
            let out = self.next.row_mut(y);
            for x in r..r + self.width {
                out[x] = kernel.apply(&self.current, x, y);
            }
        }

        pad_edges(
            &mut self.next,
            self.width,
            self.height,
            r,
            self.is_topmost,
            self.is_bottommost,
        );
    }

    /// Exchanges the roles of `current` and `next`.
    #[inline]
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    /// Interior `height x width` pixels of `current`.
    pub fn extract_interior(&self) -> Buffer2<Rgb> {
        self.current.crop(self.radius, self.radius, self.width, self.height)
    }

    /// The `r` padded interior rows of `next` adjacent to `edge`, as published
    /// to the neighbor on that side.
    pub fn boundary_rows(&self, edge: Edge) -> &[Rgb] {
        self.next.rows(self.boundary_range(edge))
    }

    /// Halo rows of `next` on `edge`.
    pub fn halo_rows_mut(&mut self, edge: Edge) -> &mut [Rgb] {
        let range = self.halo_range(edge);
        self.next.rows_mut(range)
    }

    /// Halo rows of `current` on `edge`, filled once before the first round.
    pub fn current_halo_rows_mut(&mut self, edge: Edge) -> &mut [Rgb] {
        let range = self.halo_range(edge);
        self.current.rows_mut(range)
    }

    fn boundary_range(&self, edge: Edge) -> std::ops::Range<usize> {
        let r = self.radius;
        match edge {
            Edge::Top => r..2 * r,
            Edge::Bottom => self.height..self.height + r,
        }
    }

    fn halo_range(&self, edge: Edge) -> std::ops::Range<usize> {
        let r = self.radius;
        match edge {
            Edge::Top => 0..r,
            Edge::Bottom => r + self.height..2 * r + self.height,
        }
    }
}

/// Pads `rows` (tightly packed, `width` pixels each) with `radius` replicated
/// pixels on the left and right.
pub fn padded_rows(rows: &[Rgb], width: usize, radius: usize) -> Vec<Rgb> {
    let padded_width = width + 2 * radius;
    let mut out = Vec::with_capacity(rows.len() / width * padded_width);
    for row in rows.chunks_exact(width) {
        out.extend(std::iter::repeat(row[0]).take(radius));
        out.extend_from_slice(row);
        out.extend(std::iter::repeat(row[width - 1]).take(radius));
    }
    out
}

fn pad_edges(
    buf: &mut Buffer2<Rgb>,
    width: usize,
    height: usize,
    radius: usize,
    top: bool,
    bottom: bool,
) {
    for y in radius..radius + height {
        let row = buf.row_mut(y);
        let left = row[radius];
        let right = row[radius + width - 1];
        row[..radius].fill(left);
        row[radius + width..].fill(right);
    }

    if top {
        for y in 0..radius {
            buf.copy_row(radius, y);
        }
    }
    if bottom {
        let last = radius + height - 1;
        for y in radius + height..2 * radius + height {
            buf.copy_row(last, y);
        }
    }
}
