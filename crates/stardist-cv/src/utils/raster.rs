//! Polygon rasterization onto 2-D grids
//!
//! Pixels are addressed by their centers at integer coordinates. A polygon
//! covers every pixel whose center lies inside it (even-odd rule) plus every
//! pixel on its outline, which matches filled-contour drawing.

use crate::polygon::Point;
use ndarray::ArrayViewMut2;

/// Visit every pixel of a closed polygon that falls inside a
/// `height x width` grid. A pixel may be visited more than once.
pub fn for_each_polygon_pixel<F>(vertices: &[Point], height: usize, width: usize, mut visit: F)
where
    F: FnMut(usize, usize),
{
    if vertices.is_empty() || height == 0 || width == 0 {
        return;
    }

    let ymin = vertices.iter().map(|p| p.y).min().unwrap_or(0).max(0);
    let ymax = vertices
        .iter()
        .map(|p| p.y)
        .max()
        .unwrap_or(0)
        .min(height as i32 - 1);

    let n = vertices.len();
    let mut crossings: Vec<f64> = Vec::with_capacity(n);
    for y in ymin..=ymax {
        crossings.clear();
        for i in 0..n {
            let p1 = vertices[i];
            let p2 = vertices[(i + 1) % n];
            if (p1.y <= y && y < p2.y) || (p2.y <= y && y < p1.y) {
                // Exact integer numerator keeps the result translation invariant.
                let num = i64::from(y - p1.y) * i64::from(p2.x - p1.x);
                let den = i64::from(p2.y - p1.y);
                crossings.push(f64::from(p1.x) + num as f64 / den as f64);
            }
        }
        crossings.sort_by(f64::total_cmp);

        for span in crossings.chunks_exact(2) {
            let x0 = span[0].ceil().max(0.0);
            let x1 = span[1].floor().min(width as f64 - 1.0);
            if x0 > x1 {
                continue;
            }
            for x in x0 as usize..=x1 as usize {
                visit(y as usize, x);
            }
        }
    }

    for i in 0..n {
        trace_line(vertices[i], vertices[(i + 1) % n], height, width, &mut visit);
    }
}

/// Fill a polygon into `raster` with `value`
pub fn fill_polygon<T: Copy>(raster: &mut ArrayViewMut2<'_, T>, vertices: &[Point], value: T) {
    let (height, width) = raster.dim();
    for_each_polygon_pixel(vertices, height, width, |y, x| raster[[y, x]] = value);
}

/// Bresenham walk between two points, clipped per pixel
fn trace_line<F>(from: Point, to: Point, height: usize, width: usize, visit: &mut F)
where
    F: FnMut(usize, usize),
{
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (from.x, from.y);

    loop {
        if x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height {
            visit(y as usize, x as usize);
        }
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Number of nonzero cells
pub fn count_nonzero<'a, I>(cells: I) -> usize
where
    I: IntoIterator<Item = &'a u8>,
{
    cells.into_iter().filter(|&&v| v != 0).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn pts(coords: &[(i32, i32)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_square_includes_boundary() {
        let mut raster = Array2::<u8>::zeros((10, 10));
        fill_polygon(
            &mut raster.view_mut(),
            &pts(&[(2, 2), (6, 2), (6, 6), (2, 6)]),
            1,
        );

        assert_eq!(count_nonzero(raster.iter()), 25);
        assert_eq!(raster[[2, 2]], 1);
        assert_eq!(raster[[6, 6]], 1);
        assert_eq!(raster[[7, 6]], 0);
    }

    #[test]
    fn test_single_point_marks_one_pixel() {
        let mut raster = Array2::<u8>::zeros((5, 5));
        fill_polygon(&mut raster.view_mut(), &pts(&[(3, 1), (3, 1), (3, 1)]), 9);

        assert_eq!(count_nonzero(raster.iter()), 1);
        assert_eq!(raster[[1, 3]], 9);
    }

    #[test]
    fn test_triangle_area() {
        let mut raster = Array2::<u8>::zeros((8, 8));
        fill_polygon(&mut raster.view_mut(), &pts(&[(0, 0), (4, 0), (0, 4)]), 1);

        // Rows 0..=4 hold 5, 4, 3, 2, 1 pixels.
        assert_eq!(count_nonzero(raster.iter()), 15);
        assert_eq!(raster[[4, 0]], 1);
        assert_eq!(raster[[4, 1]], 0);
    }

    #[test]
    fn test_clips_outside_grid() {
        let mut raster = Array2::<u8>::zeros((4, 4));
        fill_polygon(
            &mut raster.view_mut(),
            &pts(&[(-5, -5), (10, -5), (10, 10), (-5, 10)]),
            1,
        );

        assert_eq!(count_nonzero(raster.iter()), 16);
    }

    #[test]
    fn test_generic_labels() {
        let mut labels = Array2::<u32>::zeros((3, 3));
        fill_polygon(&mut labels.view_mut(), &pts(&[(0, 0), (1, 0), (1, 1), (0, 1)]), 7);

        assert_eq!(labels.iter().filter(|&&v| v == 7).count(), 4);
    }
}
