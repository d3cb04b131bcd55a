use crate::detect::Detection;

/// Keep detections with `score >= confidence_floor` whose width and height
/// both exceed `min_extent`. Relative order is preserved.
pub fn filter_detections(
    detections: Vec<Detection>,
    confidence_floor: f32,
    min_extent: f32,
) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|det| {
            let bbox = det.bbox();
            det.score() >= confidence_floor && bbox.width > min_extent && bbox.height > min_extent
        })
        .collect()
}
