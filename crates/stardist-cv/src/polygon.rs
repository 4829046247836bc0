//! Star-polygon candidates and their bounding boxes
//!
//! Core abstraction for representing reconstructed detections before and
//! after overlap suppression.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Integer pixel coordinate (x = column, y = row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Clamp into `[0, width - 1] x [0, height - 1]`
    pub fn clamp_to(self, width: usize, height: usize) -> Self {
        let max_x = width.saturating_sub(1) as i32;
        let max_y = height.saturating_sub(1) as i32;
        Self::new(self.x.clamp(0, max_x), self.y.clamp(0, max_y))
    }
}

/// Axis-aligned box with inclusive pixel bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl BoundingBox {
    /// Tightest box around the points, `None` for an empty slice
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            xmin: first.x,
            ymin: first.y,
            xmax: first.x,
            ymax: first.y,
        };
        Some(points.iter().fold(init, |b, p| Self {
            xmin: b.xmin.min(p.x),
            ymin: b.ymin.min(p.y),
            xmax: b.xmax.max(p.x),
            ymax: b.ymax.max(p.y),
        }))
    }

    /// Number of pixel columns covered
    pub fn width(&self) -> usize {
        (self.xmax - self.xmin + 1).max(0) as usize
    }

    /// Number of pixel rows covered
    pub fn height(&self) -> usize {
        (self.ymax - self.ymin + 1).max(0) as usize
    }

    /// Zero geometric area: the vertices collapse onto one row or one column.
    pub fn is_degenerate(&self) -> bool {
        self.xmin == self.xmax || self.ymin == self.ymax
    }
}

/// A reconstructed star-convex polygon with the confidence of its center pixel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Position in generation (row-major pixel) order.
    pub index: usize,
    pub center: Point,
    /// Polygon vertices ordered by ray angle.
    pub vertices: Vec<Point>,
    pub confidence: f32,
}

impl Candidate {
    pub fn new(index: usize, center: Point, vertices: Vec<Point>, confidence: f32) -> Self {
        Self {
            index,
            center,
            vertices,
            confidence,
        }
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.vertices)
    }
}

/// Candidates of one sample with batch operations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateCollection {
    candidates: Vec<Candidate>,
}

impl CandidateCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    /// Positions sorted by descending confidence; equal confidences keep
    /// their generation order.
    pub fn processing_order(&self) -> Vec<usize> {
        processing_order(&self.candidates)
    }

    /// Keep the candidates at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> Self {
        indices
            .iter()
            .filter_map(|&i| self.candidates.get(i).cloned())
            .collect()
    }

    pub fn stats(&self) -> CandidateStats {
        if self.candidates.is_empty() {
            return CandidateStats::default();
        }

        let mut total = 0.0f64;
        let mut max_confidence = f32::MIN;
        let mut min_confidence = f32::MAX;
        for c in &self.candidates {
            total += f64::from(c.confidence);
            max_confidence = max_confidence.max(c.confidence);
            min_confidence = min_confidence.min(c.confidence);
        }

        CandidateStats {
            total: self.candidates.len(),
            avg_confidence: total / self.candidates.len() as f64,
            max_confidence,
            min_confidence,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }
}

/// Stable descending-confidence order over a candidate slice
pub fn processing_order(candidates: &[Candidate]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        candidates[b]
            .confidence
            .partial_cmp(&candidates[a].confidence)
            .unwrap_or(Ordering::Equal)
    });
    order
}

impl IntoIterator for CandidateCollection {
    type Item = Candidate;
    type IntoIter = std::vec::IntoIter<Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.into_iter()
    }
}

impl FromIterator<Candidate> for CandidateCollection {
    fn from_iter<T: IntoIterator<Item = Candidate>>(iter: T) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

/// Confidence summary of a candidate collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateStats {
    pub total: usize,
    pub avg_confidence: f64,
    pub max_confidence: f32,
    pub min_confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(index: usize, confidence: f32) -> Candidate {
        Candidate::new(index, Point::new(0, 0), vec![Point::new(0, 0)], confidence)
    }

    #[test]
    fn test_bbox_bounds() {
        let points = [Point::new(3, 7), Point::new(-1, 2), Point::new(5, 4)];
        let bbox = BoundingBox::from_points(&points).unwrap();

        assert_eq!((bbox.xmin, bbox.ymin, bbox.xmax, bbox.ymax), (-1, 2, 5, 7));
        assert_eq!(bbox.width(), 7);
        assert_eq!(bbox.height(), 6);
        assert!(!bbox.is_degenerate());
        assert!(BoundingBox::from_points(&[]).is_none());
    }

    #[test]
    fn test_degenerate_bbox() {
        let same = [Point::new(4, 4); 3];
        assert!(BoundingBox::from_points(&same).unwrap().is_degenerate());

        let row = [Point::new(1, 4), Point::new(6, 4)];
        assert!(BoundingBox::from_points(&row).unwrap().is_degenerate());
    }

    #[test]
    fn test_processing_order_is_stable_on_ties() {
        let collection: CandidateCollection = vec![
            candidate(0, 0.8),
            candidate(1, 0.9),
            candidate(2, 0.8),
            candidate(3, 0.95),
        ]
        .into_iter()
        .collect();

        assert_eq!(collection.processing_order(), vec![3, 1, 0, 2]);
    }

    #[test]
    fn test_stats() {
        let collection = CandidateCollection::from_vec(vec![candidate(0, 0.75), candidate(1, 0.25)]);
        let stats = collection.stats();

        assert_eq!(stats.total, 2);
        assert!((stats.avg_confidence - 0.5).abs() < 1e-9);
        assert_eq!(stats.max_confidence, 0.75);
        assert_eq!(stats.min_confidence, 0.25);
        assert_eq!(CandidateCollection::new().stats().total, 0);
    }

    #[test]
    fn test_point_clamp() {
        assert_eq!(Point::new(-3, 300).clamp_to(256, 256), Point::new(0, 255));
    }
}
