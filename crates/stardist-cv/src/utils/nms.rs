//! Greedy overlap suppression over rasterized polygons
//!
//! Candidates are not compared pairwise. Each one is compared against a single
//! tile-sized raster holding the union of everything accepted so far.

use super::raster::for_each_polygon_pixel;
use crate::polygon::{BoundingBox, Candidate, Point, processing_order};
use crate::traits::OverlapSuppression;
use ndarray::{Array2, Zip, s};
use tracing::debug;

/// A candidate's filled polygon, cropped to its bounding box
#[derive(Debug, Clone)]
pub struct Contour {
    pub bbox: BoundingBox,
    pub mask: Array2<u8>,
}

impl Contour {
    /// Rasterize a candidate after clipping it to the tile.
    ///
    /// Returns `None` when the clipped bounding box has zero area.
    pub fn new(candidate: &Candidate, height: usize, width: usize) -> Option<Self> {
        let clipped: Vec<Point> = candidate
            .vertices
            .iter()
            .map(|p| p.clamp_to(width, height))
            .collect();
        let bbox = BoundingBox::from_points(&clipped)?;
        if bbox.is_degenerate() {
            return None;
        }

        let local: Vec<Point> = clipped
            .iter()
            .map(|p| Point::new(p.x - bbox.xmin, p.y - bbox.ymin))
            .collect();
        let (h, w) = (bbox.height(), bbox.width());
        let mut mask = Array2::<u8>::zeros((h, w));
        for_each_polygon_pixel(&local, h, w, |y, x| mask[[y, x]] = 1);

        Some(Self { bbox, mask })
    }
}

/// Result of one suppression pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuppressionOutcome {
    /// Accepted candidate positions, in processing order.
    pub accepted: Vec<usize>,
    pub rejected: usize,
    pub skipped_degenerate: usize,
}

/// Greedy suppressor using a global accumulator raster
#[derive(Debug, Clone)]
pub struct MaskSuppressor {
    iou_threshold: f64,
}

impl MaskSuppressor {
    pub fn new(iou_threshold: f64) -> Self {
        Self { iou_threshold }
    }

    /// Single greedy pass in descending confidence order. A candidate is
    /// accepted when its IoU with the accumulated accepted area inside its
    /// bounding box is at most the threshold; rejected ones never come back.
    pub fn run(&self, candidates: &[Candidate], height: usize, width: usize) -> SuppressionOutcome {
        let mut outcome = SuppressionOutcome::default();
        if height == 0 || width == 0 {
            outcome.skipped_degenerate = candidates.len();
            return outcome;
        }

        let mut global = Array2::<u8>::zeros((height, width));

        for i in processing_order(candidates) {
            let Some(contour) = Contour::new(&candidates[i], height, width) else {
                debug!("skipping degenerate candidate {}", candidates[i].index);
                outcome.skipped_degenerate += 1;
                continue;
            };

            let b = contour.bbox;
            let mut region = global.slice_mut(s![
                b.ymin as usize..=b.ymax as usize,
                b.xmin as usize..=b.xmax as usize
            ]);

            let (inter, union) = Zip::from(&region)
                .and(&contour.mask)
                .fold((0usize, 0usize), |(inter, union), &g, &m| {
                    let (g, m) = (g != 0, m != 0);
                    (inter + usize::from(g && m), union + usize::from(g || m))
                });

            if union == 0 {
                debug!("skipping candidate {} with empty raster", candidates[i].index);
                outcome.skipped_degenerate += 1;
                continue;
            }

            let iou = inter as f64 / union as f64;
            if iou <= self.iou_threshold {
                outcome.accepted.push(i);
                Zip::from(&mut region)
                    .and(&contour.mask)
                    .for_each(|g, &m| *g |= m);
            } else {
                outcome.rejected += 1;
            }
        }

        debug!(
            "suppression kept {} of {} candidates ({} degenerate)",
            outcome.accepted.len(),
            candidates.len(),
            outcome.skipped_degenerate
        );
        outcome
    }
}

impl Default for MaskSuppressor {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl OverlapSuppression for MaskSuppressor {
    fn suppress(&self, candidates: &[Candidate], height: usize, width: usize) -> Vec<usize> {
        self.run(candidates, height, width).accepted
    }
}

/// IoU of two candidates rasterized on a `height x width` tile
pub fn polygon_iou(a: &Candidate, b: &Candidate, height: usize, width: usize) -> Option<f64> {
    let mut ma = Array2::<u8>::zeros((height, width));
    let mut mb = Array2::<u8>::zeros((height, width));
    for_each_polygon_pixel(&a.vertices, height, width, |y, x| ma[[y, x]] = 1);
    for_each_polygon_pixel(&b.vertices, height, width, |y, x| mb[[y, x]] = 1);

    let (inter, union) = Zip::from(&ma)
        .and(&mb)
        .fold((0usize, 0usize), |(inter, union), &p, &q| {
            (
                inter + usize::from(p != 0 && q != 0),
                union + usize::from(p != 0 || q != 0),
            )
        });

    (union > 0).then(|| inter as f64 / union as f64)
}
