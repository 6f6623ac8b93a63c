use std::ops::{Deref, DerefMut, Index, IndexMut, Range};

/// Row-major 2D buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer2<T> {
    pixels: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Buffer2<T> {
    pub fn new(width: usize, height: usize, pixels: Vec<T>) -> Self {
        assert_eq!(
            pixels.len(),
            width * height,
            "pixels length must equal width * height"
        );
        Self {
            pixels,
            width,
            height,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        debug_assert!(x < self.width && y < self.height);
        &self.pixels[y * self.width + x]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        debug_assert!(x < self.width && y < self.height);
        &mut self.pixels[y * self.width + x]
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
    pub fn pixels(&self) -> &[T] {
        &self.pixels
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        &self.pixels[self.row_range(y..y + 1)]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let range = self.row_range(y..y + 1);
        &mut self.pixels[range]
    }

    /// Contiguous slice covering the rows in `rows`.
    #[inline]
    pub fn rows(&self, rows: Range<usize>) -> &[T] {
        &self.pixels[self.row_range(rows)]
    }

    #[inline]
    pub fn rows_mut(&mut self, rows: Range<usize>) -> &mut [T] {
        let range = self.row_range(rows);
        &mut self.pixels[range]
    }

    #[inline]
    fn row_range(&self, rows: Range<usize>) -> Range<usize> {
        assert!(
            rows.start <= rows.end && rows.end <= self.height,
            "row range {:?} out of bounds for height {}",
            rows,
            self.height
        );
        rows.start * self.width..rows.end * self.width
    }
}

impl<T: Copy> Buffer2<T> {
    pub fn new_filled(width: usize, height: usize, value: T) -> Self {
        Self {
            pixels: vec![value; width * height],
            width,
            height,
        }
    }

    /// Copies row `src` over row `dst` within the same buffer.
    #[inline]
    pub fn copy_row(&mut self, src: usize, dst: usize) {
        let src = self.row_range(src..src + 1);
        let dst = self.row_range(dst..dst + 1).start;
        self.pixels.copy_within(src, dst);
    }

    /// Copies the `width x height` window whose top-left corner is `(x, y)`.
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> Self {
        assert!(
            x + width <= self.width && y + height <= self.height,
            "crop window out of bounds"
        );
        let mut pixels = Vec::with_capacity(width * height);
        for row in y..y + height {
            pixels.extend_from_slice(&self.row(row)[x..x + width]);
        }
        Self::new(width, height, pixels)
    }

    /// Stacks buffers of equal width top to bottom.
    pub fn concat_rows<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut parts = parts.into_iter();
        let Some(first) = parts.next() else {
            return Self::new(0, 0, Vec::new());
        };
        let width = first.width;
        let mut height = first.height;
        let mut pixels = first.pixels;
        for part in parts {
            assert_eq!(part.width, width, "width mismatch");
            height += part.height;
            pixels.extend(part.pixels);
        }
        Self::new(width, height, pixels)
    }
}

impl<T: Default + Clone> Buffer2<T> {
    pub fn new_default(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![T::default(); width * height],
            width,
            height,
        }
    }
}

impl<T> Index<(usize, usize)> for Buffer2<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        self.get(x, y)
    }
}

impl<T> IndexMut<(usize, usize)> for Buffer2<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        self.get_mut(x, y)
    }
}

impl<T> Deref for Buffer2<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.pixels
    }
}

impl<T> DerefMut for Buffer2<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stores_dimensions() {
        let buf = Buffer2::new(3, 2, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(buf.width(), 3);
        assert_eq!(buf.height(), 2);
        assert_eq!(buf.len(), 6);
    }

    #[test]
    #[should_panic(expected = "pixels length must equal width * height")]
    fn test_new_panics_on_size_mismatch() {
        Buffer2::new(3, 2, vec![1, 2, 3]);
    }

    #[test]
    fn test_index_tuple() {
        let buf = Buffer2::new(3, 2, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(buf[(0, 0)], 10);
        assert_eq!(buf[(2, 1)], 60);
        assert_eq!(*buf.get(1, 1), 50);
    }

    #[test]
    fn test_rows() {
        let buf = Buffer2::new(2, 3, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(buf.row(1), &[3, 4]);
        assert_eq!(buf.rows(1..3), &[3, 4, 5, 6]);
        assert!(buf.rows(2..2).is_empty());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_rows_out_of_bounds() {
        let buf = Buffer2::new(2, 2, vec![1, 2, 3, 4]);
        buf.rows(1..3);
    }

    #[test]
    fn test_copy_row() {
        let mut buf = Buffer2::new(2, 3, vec![1, 2, 3, 4, 5, 6]);
        buf.copy_row(2, 0);
        assert_eq!(buf.pixels(), &[5, 6, 3, 4, 5, 6]);
    }

    #[test]
    fn test_crop() {
        // 4x3:
        //  0  1  2  3
        //  4  5  6  7
        //  8  9 10 11
        let buf = Buffer2::new(4, 3, (0..12).collect());
        let cropped = buf.crop(1, 1, 2, 2);
        assert_eq!(cropped.width(), 2);
        assert_eq!(cropped.height(), 2);
        assert_eq!(cropped.pixels(), &[5, 6, 9, 10]);
    }

    #[test]
    fn test_concat_rows_preserves_order() {
        let a = Buffer2::new(2, 1, vec![1, 2]);
        let b = Buffer2::new(2, 2, vec![3, 4, 5, 6]);
        let joined = Buffer2::concat_rows([a, b]);
        assert_eq!(joined.height(), 3);
        assert_eq!(joined.pixels(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    #[should_panic(expected = "width mismatch")]
    fn test_concat_rows_width_mismatch() {
        let a = Buffer2::new(2, 1, vec![1, 2]);
        let b = Buffer2::new(1, 1, vec![3]);
        Buffer2::concat_rows([a, b]);
    }

    #[test]
    fn test_new_default_and_filled() {
        let buf: Buffer2<u8> = Buffer2::new_default(3, 2);
        assert!(buf.iter().all(|&v| v == 0));
        let buf = Buffer2::new_filled(2, 2, [7u8; 3]);
        assert!(buf.iter().all(|&v| v == [7, 7, 7]));
    }
}
