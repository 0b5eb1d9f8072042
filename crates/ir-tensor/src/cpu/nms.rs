//! Non-max suppression with optional soft (Gaussian) score decay.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{Result, TensorError};

/// How each box is laid out in the `boxes` input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoxEncoding {
    /// `[y1, x1, y2, x2]`, any pair of diagonal corners.
    #[default]
    Corner,
    /// `[x_center, y_center, width, height]`.
    Center,
}

/// Runtime parameters for [`non_max_suppression`].
#[derive(Debug, Clone, PartialEq)]
pub struct NmsParams {
    pub box_encoding: BoxEncoding,
    pub max_output_boxes_per_class: usize,
    pub iou_threshold: f32,
    pub score_threshold: f32,
    /// Gaussian soft-NMS sigma; 0 disables soft suppression.
    pub soft_nms_sigma: f32,
    pub sort_result_descending: bool,
}

impl Default for NmsParams {
    fn default() -> Self {
        Self {
            box_encoding: BoxEncoding::Corner,
            max_output_boxes_per_class: 0,
            iou_threshold: 0.0,
            score_threshold: 0.0,
            soft_nms_sigma: 0.0,
            sort_result_descending: true,
        }
    }
}

/// One selected box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedBox {
    pub batch: usize,
    pub class: usize,
    pub index: usize,
    pub score: f32,
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    y1: f32,
    x1: f32,
    y2: f32,
    x2: f32,
}

impl Rect {
    fn decode(raw: &[f32], encoding: BoxEncoding) -> Rect {
        match encoding {
            BoxEncoding::Corner => Rect {
                y1: raw[0].min(raw[2]),
                x1: raw[1].min(raw[3]),
                y2: raw[0].max(raw[2]),
                x2: raw[1].max(raw[3]),
            },
            BoxEncoding::Center => {
                let (xc, yc, w, h) = (raw[0], raw[1], raw[2], raw[3]);
                Rect {
                    y1: yc - h / 2.0,
                    x1: xc - w / 2.0,
                    y2: yc + h / 2.0,
                    x2: xc + w / 2.0,
                }
            }
        }
    }

    fn area(&self) -> f32 {
        (self.y2 - self.y1) * (self.x2 - self.x1)
    }

    fn iou(&self, other: &Rect) -> f32 {
        let area_a = self.area();
        let area_b = other.area();
        if area_a <= 0.0 || area_b <= 0.0 {
            return 0.0;
        }
        let inter_y1 = self.y1.max(other.y1);
        let inter_x1 = self.x1.max(other.x1);
        let inter_y2 = self.y2.min(other.y2);
        let inter_x2 = self.x2.min(other.x2);
        let inter = (inter_y2 - inter_y1).max(0.0) * (inter_x2 - inter_x1).max(0.0);
        inter / (area_a + area_b - inter)
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    rect: Rect,
    index: usize,
    score: f32,
    /// Selections made before this candidate was last checked.
    suppress_begin: usize,
}

// Max-heap order: higher score first, lower box index on ties.
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Select boxes per (batch, class).
///
/// - `boxes`: row-major `[num_batches, num_boxes, 4]`
/// - `scores`: row-major `[num_batches, num_classes, num_boxes]`
///
/// Returns the selections ordered by batch, class and selection order, or by
/// descending score when `sort_result_descending` is set.
pub fn non_max_suppression(
    boxes: &[f32],
    boxes_dims: &[usize],
    scores: &[f32],
    scores_dims: &[usize],
    params: &NmsParams,
) -> Result<Vec<SelectedBox>> {
    let (num_batches, num_boxes) = match boxes_dims {
        [b, n, 4] => (*b, *n),
        _ => {
            return Err(TensorError::Other(format!(
                "boxes must have shape [batches, boxes, 4], got {:?}",
                boxes_dims
            )))
        }
    };
    let num_classes = match scores_dims {
        [b, c, n] if *b == num_batches && *n == num_boxes => *c,
        _ => {
            return Err(TensorError::ShapeMismatch {
                expected: vec![num_batches, 0, num_boxes],
                got: scores_dims.to_vec(),
            })
        }
    };
    if boxes.len() != num_batches * num_boxes * 4 {
        return Err(TensorError::LengthMismatch {
            expected: num_batches * num_boxes * 4,
            got: boxes.len(),
        });
    }
    if scores.len() != num_batches * num_classes * num_boxes {
        return Err(TensorError::LengthMismatch {
            expected: num_batches * num_classes * num_boxes,
            got: scores.len(),
        });
    }

    let scale = if params.soft_nms_sigma > 0.0 {
        -0.5 / params.soft_nms_sigma
    } else {
        0.0
    };
    let iou_threshold = params.iou_threshold;
    let decay = |iou: f32| -> f32 {
        if iou <= iou_threshold {
            (scale * iou * iou).exp()
        } else {
            0.0
        }
    };

    let mut selected_all = Vec::new();
    for batch in 0..num_batches {
        let rects: Vec<Rect> = boxes[batch * num_boxes * 4..(batch + 1) * num_boxes * 4]
            .chunks_exact(4)
            .map(|raw| Rect::decode(raw, params.box_encoding))
            .collect();

        for class in 0..num_classes {
            let offset = (batch * num_classes + class) * num_boxes;
            let class_scores = &scores[offset..offset + num_boxes];

            let mut queue: BinaryHeap<Candidate> = class_scores
                .iter()
                .enumerate()
                .filter(|&(_, &score)| score > params.score_threshold)
                .map(|(index, &score)| Candidate {
                    rect: rects[index],
                    index,
                    score,
                    suppress_begin: 0,
                })
                .collect();

            let mut selected: Vec<Candidate> = Vec::new();
            while selected.len() < params.max_output_boxes_per_class {
                let Some(mut next) = queue.pop() else {
                    break;
                };
                let original_score = next.score;
                let mut hard_suppressed = false;

                for kept in selected[next.suppress_begin..].iter().rev() {
                    let iou = next.rect.iou(&kept.rect);
                    next.score *= decay(iou);
                    if iou >= iou_threshold {
                        hard_suppressed = true;
                        break;
                    }
                    if next.score <= params.score_threshold {
                        break;
                    }
                }
                next.suppress_begin = selected.len();

                if hard_suppressed {
                    continue;
                }
                if next.score == original_score {
                    selected.push(next);
                } else if next.score > params.score_threshold {
                    queue.push(next);
                }
            }

            selected_all.extend(selected.into_iter().map(|c| SelectedBox {
                batch,
                class,
                index: c.index,
                score: c.score,
            }));
        }
    }

    if params.sort_result_descending {
        // Stable, so equal keys keep their batch/class/selection order.
        selected_all.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.batch.cmp(&b.batch))
                .then_with(|| a.class.cmp(&b.class))
                .then_with(|| a.index.cmp(&b.index))
        });
    }
    Ok(selected_all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params(max_out: usize, iou: f32, score: f32) -> NmsParams {
        NmsParams {
            max_output_boxes_per_class: max_out,
            iou_threshold: iou,
            score_threshold: score,
            ..NmsParams::default()
        }
    }

    // The classic six-box layout: two clusters of three overlapping boxes.
    fn six_boxes_center() -> Vec<f32> {
        vec![
            0.5, 0.5, 1.0, 1.0, //
            0.5, 0.6, 1.0, 1.0, //
            0.5, 0.4, 1.0, 1.0, //
            0.5, 10.5, 1.0, 1.0, //
            0.5, 10.6, 1.0, 1.0, //
            0.5, 100.5, 1.0, 1.0,
        ]
    }

    fn six_boxes_corner() -> Vec<f32> {
        vec![
            0.0, 0.0, 1.0, 1.0, //
            0.0, 0.1, 1.0, 1.1, //
            0.0, -0.1, 1.0, 0.9, //
            0.0, 10.0, 1.0, 11.0, //
            0.0, 10.1, 1.0, 11.1, //
            0.0, 100.0, 1.0, 101.0,
        ]
    }

    const SIX_SCORES: [f32; 6] = [0.9, 0.75, 0.6, 0.95, 0.5, 0.3];

    fn indices(selected: &[SelectedBox]) -> Vec<usize> {
        selected.iter().map(|s| s.index).collect()
    }

    #[test]
    fn test_suppresses_overlaps() {
        let selected = non_max_suppression(
            &six_boxes_corner(),
            &[1, 6, 4],
            &SIX_SCORES,
            &[1, 1, 6],
            &params(3, 0.5, 0.0),
        )
        .unwrap();
        assert_eq!(indices(&selected), vec![3, 0, 5]);
    }

    #[test]
    fn test_center_encoding_matches_corner() {
        let center = NmsParams {
            box_encoding: BoxEncoding::Center,
            ..params(3, 0.5, 0.0)
        };
        let selected =
            non_max_suppression(&six_boxes_center(), &[1, 6, 4], &SIX_SCORES, &[1, 1, 6], &center)
                .unwrap();
        assert_eq!(indices(&selected), vec![3, 0, 5]);
    }

    #[test]
    fn test_flipped_corners() {
        let mut boxes = six_boxes_corner();
        // Swap the corners of box 0; the decoded rectangle is identical.
        boxes[..4].copy_from_slice(&[1.0, 1.0, 0.0, 0.0]);
        let selected =
            non_max_suppression(&boxes, &[1, 6, 4], &SIX_SCORES, &[1, 1, 6], &params(3, 0.5, 0.0))
                .unwrap();
        assert_eq!(indices(&selected), vec![3, 0, 5]);
    }

    #[test]
    fn test_max_output_limit() {
        let selected = non_max_suppression(
            &six_boxes_corner(),
            &[1, 6, 4],
            &SIX_SCORES,
            &[1, 1, 6],
            &params(2, 0.5, 0.0),
        )
        .unwrap();
        assert_eq!(indices(&selected), vec![3, 0]);

        let none = non_max_suppression(
            &six_boxes_corner(),
            &[1, 6, 4],
            &SIX_SCORES,
            &[1, 1, 6],
            &params(0, 0.5, 0.0),
        )
        .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_score_threshold() {
        let selected = non_max_suppression(
            &six_boxes_corner(),
            &[1, 6, 4],
            &SIX_SCORES,
            &[1, 1, 6],
            &params(3, 0.5, 0.4),
        )
        .unwrap();
        assert_eq!(indices(&selected), vec![3, 0]);
    }

    #[test]
    fn test_two_classes_sorted_by_score() {
        let scores: Vec<f32> = SIX_SCORES
            .iter()
            .chain([0.1, 0.2, 0.99, 0.0, 0.0, 0.0].iter())
            .copied()
            .collect();
        let selected = non_max_suppression(
            &six_boxes_corner(),
            &[1, 6, 4],
            &scores,
            &[1, 2, 6],
            &params(1, 0.5, 0.0),
        )
        .unwrap();
        assert_eq!(selected.len(), 2);
        assert_eq!((selected[0].class, selected[0].index), (1, 2));
        assert_eq!((selected[1].class, selected[1].index), (0, 3));

        let unsorted = NmsParams {
            sort_result_descending: false,
            ..params(1, 0.5, 0.0)
        };
        let selected =
            non_max_suppression(&six_boxes_corner(), &[1, 6, 4], &scores, &[1, 2, 6], &unsorted)
                .unwrap();
        assert_eq!((selected[0].class, selected[0].index), (0, 3));
        assert_eq!((selected[1].class, selected[1].index), (1, 2));
    }

    #[test]
    fn test_soft_nms_decays_scores() {
        // Two boxes with IoU 1/3; soft suppression keeps both but lowers the second.
        let boxes = vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.5, 1.0, 1.5];
        let scores = vec![0.9, 0.8];
        let soft = NmsParams {
            soft_nms_sigma: 0.5,
            ..params(2, 1.0, 0.0)
        };
        let selected = non_max_suppression(&boxes, &[1, 2, 4], &scores, &[1, 1, 2], &soft).unwrap();
        assert_eq!(indices(&selected), vec![0, 1]);
        assert_relative_eq!(selected[0].score, 0.9);
        let iou = 1.0f32 / 3.0;
        assert_relative_eq!(selected[1].score, 0.8 * (-iou * iou).exp(), epsilon = 1e-6);
    }

    #[test]
    fn test_shape_validation() {
        let p = params(1, 0.5, 0.0);
        assert!(non_max_suppression(&[0.0; 6], &[1, 2, 3], &[0.0; 2], &[1, 1, 2], &p).is_err());
        assert!(non_max_suppression(&[0.0; 8], &[1, 2, 4], &[0.0; 3], &[1, 1, 3], &p).is_err());
        assert!(non_max_suppression(&[0.0; 7], &[1, 2, 4], &[0.0; 2], &[1, 1, 2], &p).is_err());
    }
}
