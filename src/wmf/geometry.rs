//! Integer geometry in logical metafile units.
//!
//! [`Rect`] keeps the width/height exactly as a record supplied them, so a
//! negative extent (a flip) survives until a backend interprets it.
//! [`Region`] is a set of disjoint, normalized rectangles, which is all the
//! clip records of a WMF stream can ever produce.

/// A point in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rectangle stored as origin plus (possibly negative) extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Build from two corners.
    pub const fn from_ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    #[inline]
    pub const fn right(&self) -> i32 {
        self.left + self.width
    }

    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.top + self.height
    }

    /// Copy with non-negative width and height covering the same area.
    pub fn normalized(&self) -> Self {
        let (l, r) = min_max(self.left, self.right());
        let (t, b) = min_max(self.top, self.bottom());
        Self::from_ltrb(l, t, r, b)
    }

    /// True when the rectangle covers no area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Half-open containment test on the normalized rectangle.
    pub fn contains(&self, p: Point) -> bool {
        let n = self.normalized();
        p.x >= n.left && p.x < n.right() && p.y >= n.top && p.y < n.bottom()
    }

    /// Overlap of two rectangles, or `None` when they do not overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let a = self.normalized();
        let b = other.normalized();
        let l = a.left.max(b.left);
        let t = a.top.max(b.top);
        let r = a.right().min(b.right());
        let bt = a.bottom().min(b.bottom());
        (l < r && t < bt).then(|| Rect::from_ltrb(l, t, r, bt))
    }

    /// Smallest normalized rectangle enclosing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let a = self.normalized();
        let b = other.normalized();
        Rect::from_ltrb(
            a.left.min(b.left),
            a.top.min(b.top),
            a.right().max(b.right()),
            a.bottom().max(b.bottom()),
        )
    }
}

#[inline]
fn min_max(a: i32, b: i32) -> (i32, i32) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Clip area made of disjoint rectangles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    /// The empty region.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.normalized();
        if rect.is_empty() {
            Self::new()
        } else {
            Self { rects: vec![rect] }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// The disjoint rectangles making up this region.
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    pub fn contains(&self, p: Point) -> bool {
        self.rects.iter().any(|r| r.contains(p))
    }

    pub fn bounding_rect(&self) -> Option<Rect> {
        let mut iter = self.rects.iter();
        let first = *iter.next()?;
        Some(iter.fold(first, |acc, r| acc.union(r)))
    }

    /// Area shared with `rect`.
    pub fn intersect(&self, rect: &Rect) -> Region {
        Region {
            rects: self
                .rects
                .iter()
                .filter_map(|r| r.intersection(rect))
                .collect(),
        }
    }

    /// Area shared with another region.
    pub fn intersect_region(&self, other: &Region) -> Region {
        let rects = other
            .rects
            .iter()
            .flat_map(|o| self.rects.iter().filter_map(move |r| r.intersection(o)))
            .collect();
        Region { rects }
    }

    /// Area of this region outside `rect`.
    pub fn subtract(&self, rect: &Rect) -> Region {
        let cut = rect.normalized();
        let mut rects = Vec::with_capacity(self.rects.len() + 3);
        for r in &self.rects {
            if r.intersection(&cut).is_none() {
                rects.push(*r);
                continue;
            }
            // Bands above and below the cut span the full width; the middle
            // band keeps whatever lies left and right of it.
            if cut.top > r.top {
                rects.push(Rect::from_ltrb(r.left, r.top, r.right(), cut.top));
            }
            if cut.bottom() < r.bottom() {
                rects.push(Rect::from_ltrb(r.left, cut.bottom(), r.right(), r.bottom()));
            }
            let mid_top = r.top.max(cut.top);
            let mid_bottom = r.bottom().min(cut.bottom());
            if cut.left > r.left {
                rects.push(Rect::from_ltrb(r.left, mid_top, cut.left, mid_bottom));
            }
            if cut.right() < r.right() {
                rects.push(Rect::from_ltrb(cut.right(), mid_top, r.right(), mid_bottom));
            }
        }
        Region { rects }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_keeps_negative_extent() {
        let r = Rect::new(10, 10, -5, 20);
        assert_eq!(r.width, -5);
        assert_eq!(r.right(), 5);
        assert_eq!(r.normalized(), Rect::new(5, 10, 5, 20));
    }

    #[test]
    fn test_intersection() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(a.intersection(&b), Some(Rect::new(5, 5, 5, 5)));
        assert_eq!(a.intersection(&Rect::new(10, 0, 5, 5)), None);
    }

    #[test]
    fn test_region_subtract_center_leaves_frame() {
        let region = Region::from_rect(Rect::new(0, 0, 30, 30));
        let frame = region.subtract(&Rect::new(10, 10, 10, 10));
        assert_eq!(frame.rects().len(), 4);
        assert!(frame.contains(Point::new(0, 0)));
        assert!(frame.contains(Point::new(25, 15)));
        assert!(!frame.contains(Point::new(15, 15)));
        let area: i32 = frame.rects().iter().map(|r| r.width * r.height).sum();
        assert_eq!(area, 900 - 100);
    }

    #[test]
    fn test_region_subtract_everything() {
        let region = Region::from_rect(Rect::new(0, 0, 10, 10));
        assert!(region.subtract(&Rect::new(-5, -5, 20, 20)).is_empty());
    }

    #[test]
    fn test_region_intersect_after_subtract() {
        let region = Region::from_rect(Rect::new(0, 0, 30, 30))
            .subtract(&Rect::new(10, 0, 10, 30))
            .intersect(&Rect::new(0, 0, 30, 5));
        assert_eq!(region.bounding_rect(), Some(Rect::new(0, 0, 30, 5)));
        assert!(!region.contains(Point::new(15, 2)));
        assert!(region.contains(Point::new(25, 2)));
    }

    #[test]
    fn test_empty_rect_gives_empty_region() {
        assert!(Region::from_rect(Rect::new(3, 3, 0, 10)).is_empty());
    }
}
