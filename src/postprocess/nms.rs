use crate::detect::Detection;

use super::overlap::iou;

/// Sort detections by descending score. Stable: equal scores keep their
/// input order.
pub fn sort_by_score(detections: &mut [Detection]) {
    detections.sort_by(|a, b| b.score().total_cmp(&a.score()));
}

/// Greedy non-maximum suppression.
///
/// Repeatedly keeps the highest-scoring remaining detection and drops every
/// remaining detection whose overlap with it is `>= overlap_threshold`.
/// Output is in selection order (descending score). Class-agnostic.
pub fn suppress(mut detections: Vec<Detection>, overlap_threshold: f32) -> Vec<Detection> {
    sort_by_score(&mut detections);

    let mut suppressed = vec![false; detections.len()];
    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }
        let bbox = detections[i].bbox();
        for j in (i + 1)..detections.len() {
            if !suppressed[j] && iou(&bbox, &detections[j].bbox()) >= overlap_threshold {
                suppressed[j] = true;
            }
        }
    }

    detections
        .into_iter()
        .zip(suppressed)
        .filter_map(|(det, dropped)| (!dropped).then_some(det))
        .collect()
}
