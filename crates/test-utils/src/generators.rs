//! Test data generators for synthetic water-level rasters.
//!
//! Grids are row-major with row 0 at the north edge, matching how GeoTIFF
//! stores them. The GeoTIFF encoders produce real files through the `tiff`
//! crate so the loader is exercised against genuine container bytes.

use std::io::Cursor;

use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;

/// `(min_lon, min_lat, max_lon, max_lat)`
pub type Extent = (f64, f64, f64, f64);

/// Creates a test grid with predictable values.
///
/// Each cell value is `col * 1000 + row`, so a decoded grid can be checked
/// cell by cell.
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0); // col=1, row=0
/// assert_eq!(grid[10], 1.0);   // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates water-level-like values in metres.
///
/// Deeper in the south-east corner (up to ~12 m), shallow in the north-west.
pub fn create_water_level_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            data.push(0.5 + x_factor * 6.0 + y_factor * 6.0);
        }
    }
    data
}

/// Creates a grid filled with a single value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Replaces every `every`-th sample with `sentinel`, starting at index 0.
pub fn with_sentinels(mut data: Vec<f32>, every: usize, sentinel: f32) -> Vec<f32> {
    if every == 0 {
        return data;
    }
    for value in data.iter_mut().step_by(every) {
        *value = sentinel;
    }
    data
}

/// How the generated file is georeferenced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Georef {
    /// ModelPixelScaleTag + ModelTiepointTag
    PixelScale,
    /// ModelTransformationTag (4x4 affine)
    Transformation,
    /// No GeoTIFF tags at all
    None,
}

/// Encode a single-band f32 GeoTIFF covering `extent`.
pub fn encode_geotiff(width: u32, height: u32, samples: &[f32], extent: Extent) -> Vec<u8> {
    encode::<colortype::Gray32Float>(width, height, samples, extent, Georef::PixelScale, None)
}

/// Encode a single-band f32 GeoTIFF with a GDAL_NODATA tag.
pub fn encode_geotiff_with_nodata(
    width: u32,
    height: u32,
    samples: &[f32],
    extent: Extent,
    nodata: &str,
) -> Vec<u8> {
    encode::<colortype::Gray32Float>(
        width,
        height,
        samples,
        extent,
        Georef::PixelScale,
        Some(nodata),
    )
}

/// Encode a single-band f32 TIFF with the chosen georeferencing.
pub fn encode_geotiff_georef(
    width: u32,
    height: u32,
    samples: &[f32],
    extent: Extent,
    georef: Georef,
) -> Vec<u8> {
    encode::<colortype::Gray32Float>(width, height, samples, extent, georef, None)
}

/// Encode a single-band u16 GeoTIFF.
pub fn encode_geotiff_u16(width: u32, height: u32, samples: &[u16], extent: Extent) -> Vec<u8> {
    encode::<colortype::Gray16>(width, height, samples, extent, Georef::PixelScale, None)
}

/// Encode an interleaved three-band f32 GeoTIFF (`rgb.len() == w * h * 3`).
pub fn encode_geotiff_rgb(width: u32, height: u32, rgb: &[f32], extent: Extent) -> Vec<u8> {
    encode::<colortype::RGB32Float>(width, height, rgb, extent, Georef::PixelScale, None)
}

fn encode<C: ColorType>(
    width: u32,
    height: u32,
    data: &[C::Inner],
    extent: Extent,
    georef: Georef,
    nodata: Option<&str>,
) -> Vec<u8>
where
    [C::Inner]: TiffValue,
{
    let (min_lon, min_lat, max_lon, max_lat) = extent;
    let scale_x = (max_lon - min_lon) / width as f64;
    let scale_y = (max_lat - min_lat) / height as f64;

    let mut buf = Vec::new();
    {
        let mut encoder =
            TiffEncoder::new(Cursor::new(&mut buf)).expect("Failed to create TIFF encoder");
        let mut image = encoder
            .new_image::<C>(width, height)
            .expect("Failed to create TIFF image");

        match georef {
            Georef::PixelScale => {
                let scale = [scale_x, scale_y, 0.0];
                let tiepoint = [0.0, 0.0, 0.0, min_lon, max_lat, 0.0];
                image
                    .encoder()
                    .write_tag(Tag::Unknown(33550), &scale[..])
                    .expect("Failed to write ModelPixelScaleTag");
                image
                    .encoder()
                    .write_tag(Tag::Unknown(33922), &tiepoint[..])
                    .expect("Failed to write ModelTiepointTag");
            }
            Georef::Transformation => {
                let matrix = [
                    scale_x, 0.0, 0.0, min_lon, //
                    0.0, -scale_y, 0.0, max_lat, //
                    0.0, 0.0, 0.0, 0.0, //
                    0.0, 0.0, 0.0, 1.0,
                ];
                image
                    .encoder()
                    .write_tag(Tag::Unknown(34264), &matrix[..])
                    .expect("Failed to write ModelTransformationTag");
            }
            Georef::None => {}
        }

        if let Some(nodata) = nodata {
            image
                .encoder()
                .write_tag(Tag::Unknown(42113), nodata)
                .expect("Failed to write GDAL_NODATA");
        }

        image.write_data(data).expect("Failed to write TIFF data");
    }
    buf
}
