use std::collections::HashMap;

use crate::detect::Detection;

/// Keep at most `max_per_category` detections per category, in input order.
///
/// Fed with score-descending input this keeps the top-N of each category.
pub fn cap_per_category(detections: Vec<Detection>, max_per_category: usize) -> Vec<Detection> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    detections
        .into_iter()
        .filter(|det| {
            let count = counts.entry(det.category().to_string()).or_insert(0);
            *count += 1;
            *count <= max_per_category
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn det(cat: &str, score: f32) -> Detection {
        Detection::new(cat, score, BoundingBox::new(0.0, 0.0, 50.0, 50.0)).unwrap()
    }

    #[test]
    fn caps_each_category_independently() {
        let input = vec![
            det("chair", 0.9),
            det("cup", 0.85),
            det("chair", 0.8),
            det("chair", 0.7),
            det("cup", 0.65),
            det("chair", 0.6),
        ];
        let kept = cap_per_category(input, 2);
        let view: Vec<(&str, f32)> = kept.iter().map(|d| (d.category(), d.score())).collect();
        assert_eq!(
            view,
            vec![("chair", 0.9), ("cup", 0.85), ("chair", 0.8), ("cup", 0.65)]
        );
    }

    #[test]
    fn input_below_cap_is_unchanged() {
        let input = vec![det("cup", 0.9), det("dog", 0.5)];
        assert_eq!(cap_per_category(input.clone(), 3), input);
    }

    #[test]
    fn zero_cap_drops_everything() {
        assert!(cap_per_category(vec![det("cup", 0.9)], 0).is_empty());
    }

    #[test]
    fn cap_uses_category_not_alias_label() {
        let input = vec![
            det("tv", 0.9).with_label("television"),
            det("tv", 0.8),
            det("tv", 0.7).with_label("screen"),
        ];
        assert_eq!(cap_per_category(input, 2).len(), 2);
    }
}
