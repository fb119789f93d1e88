//! Vertical image stacking for PNG output.

use super::{unsupported_input, write_atomically, MergeOutcome};
use crate::domain::format::OutputFormat;
use crate::domain::FileKind;
use crate::error::MergeError;
use image::{imageops, ImageFormat, Rgb, RgbImage};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Stacks `images` top to bottom on a white canvas as wide as the widest one.
/// Narrower images are centred horizontally.
///
/// Returns `None` when the combined height does not fit in `u32`.
pub fn stack_images(images: &[RgbImage]) -> Option<RgbImage> {
    let max_width = images.iter().map(RgbImage::width).max().unwrap_or(0);
    let total_height = images
        .iter()
        .try_fold(0u32, |acc, img| acc.checked_add(img.height()))?;

    let mut canvas = RgbImage::from_pixel(max_width, total_height, BACKGROUND);
    let mut y = 0i64;
    for img in images {
        let x = i64::from((max_width - img.width()) / 2);
        imageops::replace(&mut canvas, img, x, y);
        y += i64::from(img.height());
    }

    Some(canvas)
}

fn decode(path: &Path) -> Result<RgbImage, MergeError> {
    if FileKind::from_path(path) != FileKind::Image {
        return Err(unsupported_input(path, OutputFormat::Png));
    }
    let img = image::open(path).map_err(|e| MergeError::conversion(path, e))?;
    Ok(img.to_rgb8())
}

pub fn merge(inputs: &[PathBuf], output: &Path) -> Result<MergeOutcome, MergeError> {
    let images = inputs
        .iter()
        .map(|path| decode(path))
        .collect::<Result<Vec<_>, _>>()?;

    let canvas = stack_images(&images)
        .ok_or_else(|| MergeError::conversion(output, "combined image is too tall"))?;

    write_atomically(output, |file| {
        let mut writer = BufWriter::new(file);
        canvas
            .write_to(&mut writer, ImageFormat::Png)
            .map_err(|e| MergeError::write_failed(output, e))?;
        writer
            .flush()
            .map_err(|e| MergeError::write_failed(output, e))
    })?;

    Ok(MergeOutcome::Written {
        path: output.to_path_buf(),
        inputs: inputs.len(),
        pages: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::fixtures::{leftovers, write_image, write_text};
    use tempfile::TempDir;

    const RED: [u8; 3] = [255, 0, 0];
    const BLUE: [u8; 3] = [0, 0, 255];

    mod stacking_tests {
        use super::*;

        #[test]
        fn test_canvas_dimensions() {
            let images = vec![
                RgbImage::from_pixel(4, 2, Rgb(RED)),
                RgbImage::from_pixel(2, 3, Rgb(BLUE)),
            ];
            let canvas = stack_images(&images).unwrap();
            assert_eq!(canvas.dimensions(), (4, 5));
        }

        #[test]
        fn test_narrow_image_is_centred_on_white() {
            let images = vec![
                RgbImage::from_pixel(4, 2, Rgb(RED)),
                RgbImage::from_pixel(2, 3, Rgb(BLUE)),
            ];
            let canvas = stack_images(&images).unwrap();

            // First image fills the top band.
            assert_eq!(canvas.get_pixel(0, 0).0, RED);
            assert_eq!(canvas.get_pixel(3, 1).0, RED);
            // Second image sits at x = (4 - 2) / 2 = 1, starting at y = 2.
            assert_eq!(canvas.get_pixel(0, 2).0, [255, 255, 255]);
            assert_eq!(canvas.get_pixel(1, 2).0, BLUE);
            assert_eq!(canvas.get_pixel(2, 4).0, BLUE);
            assert_eq!(canvas.get_pixel(3, 4).0, [255, 255, 255]);
        }

        #[test]
        fn test_odd_difference_rounds_left() {
            let images = vec![
                RgbImage::from_pixel(5, 1, Rgb(RED)),
                RgbImage::from_pixel(2, 1, Rgb(BLUE)),
            ];
            let canvas = stack_images(&images).unwrap();
            // (5 - 2) / 2 = 1
            assert_eq!(canvas.get_pixel(0, 1).0, [255, 255, 255]);
            assert_eq!(canvas.get_pixel(1, 1).0, BLUE);
            assert_eq!(canvas.get_pixel(3, 1).0, [255, 255, 255]);
        }
    }

    mod merge_tests {
        use super::*;

        #[test]
        fn test_merge_writes_png_in_order() {
            let temp_dir = TempDir::new().unwrap();
            let inputs = vec![
                write_image(temp_dir.path(), "top.png", 3, 1, RED),
                write_image(temp_dir.path(), "bottom.png", 3, 2, BLUE),
            ];
            let output = temp_dir.path().join("out.png");

            let outcome = merge(&inputs, &output).unwrap();
            assert_eq!(outcome.path(), Some(output.as_path()));

            let decoded = image::open(&output).unwrap().to_rgb8();
            assert_eq!(decoded.dimensions(), (3, 3));
            assert_eq!(decoded.get_pixel(1, 0).0, RED);
            assert_eq!(decoded.get_pixel(1, 2).0, BLUE);
        }

        #[test]
        fn test_merge_accepts_jpeg() {
            let temp_dir = TempDir::new().unwrap();
            let inputs = vec![
                write_image(temp_dir.path(), "a.jpg", 8, 8, RED),
                write_image(temp_dir.path(), "b.png", 4, 4, BLUE),
            ];
            let output = temp_dir.path().join("out.png");

            merge(&inputs, &output).unwrap();
            let decoded = image::open(&output).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (8, 12));
        }

        #[test]
        fn test_corrupt_image_fails_without_output() {
            let temp_dir = TempDir::new().unwrap();
            let inputs = vec![
                write_image(temp_dir.path(), "fine.png", 2, 2, RED),
                write_text(temp_dir.path(), "corrupt.png", "garbage"),
            ];
            let output = temp_dir.path().join("out.png");

            let err = merge(&inputs, &output).unwrap_err();

            assert!(matches!(err, MergeError::Conversion { ref path, .. } if path.ends_with("corrupt.png")));
            assert!(!output.exists());
            assert!(leftovers(temp_dir.path()).is_empty());
        }

        #[test]
        fn test_text_input_is_rejected() {
            let temp_dir = TempDir::new().unwrap();
            let inputs = vec![write_text(temp_dir.path(), "notes.txt", "hi")];
            let err = merge(&inputs, &temp_dir.path().join("out.png")).unwrap_err();
            assert!(matches!(err, MergeError::Conversion { .. }));
        }

        #[test]
        fn test_repeated_merges_have_same_pixels() {
            let temp_dir = TempDir::new().unwrap();
            let inputs = vec![
                write_image(temp_dir.path(), "a.png", 5, 2, RED),
                write_image(temp_dir.path(), "b.png", 3, 4, BLUE),
            ];
            let one = temp_dir.path().join("one.png");
            let two = temp_dir.path().join("two.png");

            merge(&inputs, &one).unwrap();
            merge(&inputs, &two).unwrap();

            let one = image::open(&one).unwrap().to_rgb8();
            let two = image::open(&two).unwrap().to_rgb8();
            assert_eq!(one.as_raw(), two.as_raw());
        }
    }
}
