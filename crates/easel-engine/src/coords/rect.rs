use super::Vec2;

/// Axis-aligned rectangle in pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    /// Expands the rectangle into two triangles as interleaved `x, y` pairs.
    ///
    /// Vertex order: `(x1,y1) (x2,y1) (x1,y2)` then `(x1,y2) (x2,y1) (x2,y2)`.
    /// The size is not normalized; negative sizes produce mirrored triangles.
    pub fn triangle_list(self) -> [f32; 12] {
        let Vec2 { x: x1, y: y1 } = self.min();
        let Vec2 { x: x2, y: y2 } = self.max();
        [
            x1, y1, //
            x2, y1, //
            x1, y2, //
            x1, y2, //
            x2, y1, //
            x2, y2,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(v: [f32; 12]) -> Vec<(f32, f32)> {
        v.chunks_exact(2).map(|p| (p[0], p[1])).collect()
    }

    #[test]
    fn max_is_origin_plus_size() {
        assert_eq!(Rect::new(1.0, 2.0, 10.0, 20.0).max(), Vec2::new(11.0, 22.0));
    }

    #[test]
    fn triangle_list_matches_vertex_order() {
        let (x, y, w, h) = (10.0, 20.0, 70.0, 10.0);
        assert_eq!(
            pairs(Rect::new(x, y, w, h).triangle_list()),
            vec![
                (x, y),
                (x + w, y),
                (x, y + h),
                (x, y + h),
                (x + w, y),
                (x + w, y + h),
            ]
        );
    }

    #[test]
    fn triangle_list_holds_across_integer_grid() {
        for x in [0u32, 1, 150, 299] {
            for w in [0u32, 7, 299] {
                let (y, h) = (x / 2, w / 3);
                let r = Rect::new(x as f32, y as f32, w as f32, h as f32);
                let v = pairs(r.triangle_list());
                let (x, y, w, h) = (x as f32, y as f32, w as f32, h as f32);
                assert_eq!(v[0], (x, y));
                assert_eq!(v[1], (x + w, y));
                assert_eq!(v[2], (x, y + h));
                assert_eq!(v[3], (x, y + h));
                assert_eq!(v[4], (x + w, y));
                assert_eq!(v[5], (x + w, y + h));
            }
        }
    }

    #[test]
    fn zero_size_collapses_to_a_point() {
        let v = Rect::new(5.0, 5.0, 0.0, 0.0).triangle_list();
        assert!(v.iter().all(|c| *c == 5.0));
    }
}
