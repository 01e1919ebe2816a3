//! Camera raster handed from the camera collaborator to the estimator.

use ndarray::{Array2, Array3};

/// One captured frame, rows x cols (x 3 for colour).
///
/// Colour frames use OpenCV channel order (blue, green, red).
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Gray(Array2<u8>),
    Bgr(Array3<u8>),
}

impl Frame {
    pub fn width(&self) -> usize {
        match self {
            Frame::Gray(px) => px.ncols(),
            Frame::Bgr(px) => px.dim().1,
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Frame::Gray(px) => px.nrows(),
            Frame::Bgr(px) => px.dim().0,
        }
    }

    /// Single-channel intensity view; colour uses BT.601 luma weights.
    pub fn to_gray(&self) -> Array2<u8> {
        match self {
            Frame::Gray(px) => px.clone(),
            Frame::Bgr(px) => {
                let (h, w, _) = px.dim();
                Array2::from_shape_fn((h, w), |(r, c)| {
                    let b = f32::from(px[[r, c, 0]]);
                    let g = f32::from(px[[r, c, 1]]);
                    let rr = f32::from(px[[r, c, 2]]);
                    (0.299 * rr + 0.587 * g + 0.114 * b).round().clamp(0.0, 255.0) as u8
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_white_and_black_map_to_extremes() {
        let mut px = Array3::<u8>::from_elem((2, 3, 3), 255);
        px[[1, 2, 0]] = 0;
        px[[1, 2, 1]] = 0;
        px[[1, 2, 2]] = 0;
        let gray = Frame::Bgr(px).to_gray();
        assert_eq!(gray.dim(), (2, 3));
        assert_eq!(gray[[0, 0]], 255);
        assert_eq!(gray[[1, 2]], 0);
    }

    #[test]
    fn dimensions_follow_rows_and_cols() {
        let f = Frame::Gray(Array2::zeros((720, 1280)));
        assert_eq!(f.width(), 1280);
        assert_eq!(f.height(), 720);
    }
}
