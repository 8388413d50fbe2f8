//! Compute dispatch grid sizing.

/// 2-D threadgroup (workgroup) size declared by a compute kernel.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WorkgroupSize {
    pub x: u32,
    pub y: u32,
}

impl WorkgroupSize {
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.x > 0 && self.y > 0
    }
}

/// Number of workgroups to dispatch along each axis.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DispatchGrid {
    pub x: u32,
    pub y: u32,
}

impl DispatchGrid {
    /// Smallest grid whose workgroups cover a `width` x `height` image.
    ///
    /// Rounds up, so the last row/column of groups may extend past the image
    /// edge; kernels must bounds-check their writes.
    pub fn covering(width: u32, height: u32, workgroup: WorkgroupSize) -> Self {
        debug_assert!(workgroup.is_valid());
        Self {
            x: width.div_ceil(workgroup.x.max(1)),
            y: height.div_ceil(workgroup.y.max(1)),
        }
    }

    /// Pixel extent covered by the dispatched invocations.
    pub fn covered_extent(self, workgroup: WorkgroupSize) -> (u64, u64) {
        (
            self.x as u64 * workgroup.x as u64,
            self.y as u64 * workgroup.y as u64,
        )
    }

    /// Invocations that fall outside a `width` x `height` image.
    pub fn overdraw(self, width: u32, height: u32, workgroup: WorkgroupSize) -> (u64, u64) {
        let (cw, ch) = self.covered_extent(workgroup);
        (cw - width as u64, ch - height as u64)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.x == 0 || self.y == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hd_with_16x16_rounds_height_up() {
        let wg = WorkgroupSize::new(16, 16);
        let grid = DispatchGrid::covering(1920, 1080, wg);
        assert_eq!(grid, DispatchGrid { x: 120, y: 68 });
        // 1088 rows dispatched: 8 rows of bounds-checked overdraw.
        assert_eq!(grid.overdraw(1920, 1080, wg), (0, 8));
    }

    #[test]
    fn exact_multiple_with_8x8_has_no_overdraw() {
        let wg = WorkgroupSize::new(8, 8);
        let grid = DispatchGrid::covering(800, 600, wg);
        assert_eq!(grid, DispatchGrid { x: 100, y: 75 });
        assert_eq!(grid.overdraw(800, 600, wg), (0, 0));
    }

    #[test]
    fn grid_always_covers_and_is_minimal() {
        let sizes = [1u32, 2, 7, 8, 9, 15, 16, 17, 33, 255, 256, 257, 1023, 1081];
        let workgroups = [
            WorkgroupSize::new(16, 16),
            WorkgroupSize::new(8, 8),
            WorkgroupSize::new(32, 4),
        ];
        for wg in workgroups {
            for &w in &sizes {
                for &h in &sizes {
                    let g = DispatchGrid::covering(w, h, wg);
                    let (cw, ch) = g.covered_extent(wg);
                    assert!(cw >= w as u64 && ch >= h as u64, "{w}x{h} with {wg:?}");
                    // One fewer group on either axis would leave pixels uncovered.
                    assert!((g.x as u64 - 1) * (wg.x as u64) < w as u64);
                    assert!((g.y as u64 - 1) * (wg.y as u64) < h as u64);
                }
            }
        }
    }

    #[test]
    fn zero_sized_image_dispatches_nothing() {
        let g = DispatchGrid::covering(0, 600, WorkgroupSize::new(8, 8));
        assert!(g.is_empty());
    }
}
