use crate::detect::BoundingBox;

/// Intersection over union of two axis-aligned boxes.
///
/// Returns 0 when the boxes do not intersect and when the union is 0
/// (two coincident zero-area boxes).
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let left = a.x.max(b.x);
    let top = a.y.max(b.y);
    let right = a.right().min(b.right());
    let bottom = a.bottom().min(b.bottom());

    let inter_w = right - left;
    let inter_h = bottom - top;
    if inter_w <= 0.0 || inter_h <= 0.0 {
        return 0.0;
    }

    let intersection = inter_w * inter_h;
    let union = a.area() + b.area() - intersection;
    if union <= 0.0 {
        return 0.0;
    }
    intersection / union
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bx(x: f32, y: f32, w: f32, h: f32) -> BoundingBox {
        BoundingBox::new(x, y, w, h)
    }

    #[test]
    fn identical_boxes_overlap_fully() {
        let a = bx(3.0, 4.0, 30.0, 20.0);
        assert_eq!(iou(&a, &a), 1.0);
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = bx(0.0, 0.0, 30.0, 30.0);
        let b = bx(2.0, 2.0, 30.0, 30.0);
        assert_eq!(iou(&a, &b), iou(&b, &a));
        // 28*28 / (900 + 900 - 784)
        let expected = 784.0 / 1016.0;
        assert!((iou(&a, &b) - expected).abs() < 1e-6);
    }

    #[test]
    fn disjoint_and_touching_boxes_do_not_overlap() {
        let a = bx(0.0, 0.0, 10.0, 10.0);
        assert_eq!(iou(&a, &bx(50.0, 50.0, 10.0, 10.0)), 0.0);
        // Shared edge only.
        assert_eq!(iou(&a, &bx(10.0, 0.0, 10.0, 10.0)), 0.0);
    }

    #[test]
    fn degenerate_boxes_yield_zero() {
        let flat = bx(5.0, 5.0, 0.0, 10.0);
        assert_eq!(iou(&flat, &flat), 0.0);
        let point = bx(5.0, 5.0, 0.0, 0.0);
        assert_eq!(iou(&point, &point), 0.0);
        assert_eq!(iou(&point, &bx(0.0, 0.0, 10.0, 10.0)), 0.0);
    }

    #[test]
    fn contained_box_overlap_is_area_ratio() {
        let outer = bx(0.0, 0.0, 20.0, 20.0);
        let inner = bx(5.0, 5.0, 10.0, 10.0);
        assert!((iou(&outer, &inner) - 0.25).abs() < 1e-6);
    }
}
