//! GeoTIFF decoding via the `tiff` crate.
//!
//! Georeferencing is read from the GeoTIFF model tags:
//! - `ModelPixelScaleTag` (33550) + `ModelTiepointTag` (33922), or
//! - `ModelTransformationTag` (34264) for north-up affine transforms.
//!
//! Rotated/sheared transforms are rejected; the overlay pipeline assumes an
//! axis-aligned raster whose row 0 is the north edge.

use std::io::{Cursor, Read, Seek};

use num_traits::ToPrimitive;
use overlay_common::{BoundingBox, NoDataPolicy, OverlayError, OverlayResult, RasterDataset};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::{debug, warn};

/// GeoTIFF ModelPixelScaleTag
const MODEL_PIXEL_SCALE: u16 = 33550;
/// GeoTIFF ModelTiepointTag
const MODEL_TIEPOINT: u16 = 33922;
/// GeoTIFF ModelTransformationTag
const MODEL_TRANSFORMATION: u16 = 34264;
/// GDAL_NODATA (ASCII)
const GDAL_NODATA: u16 = 42113;

/// Options controlling how a raster is decoded.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Zero-based band (sample) index to extract.
    pub band: usize,
    /// Sentinels configured for this dataset.
    pub no_data: NoDataPolicy,
    /// Also treat the file's GDAL_NODATA value as a sentinel.
    pub honor_gdal_nodata: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            band: 0,
            no_data: NoDataPolicy::none(),
            honor_gdal_nodata: true,
        }
    }
}

impl LoaderOptions {
    pub fn with_no_data(mut self, no_data: NoDataPolicy) -> Self {
        self.no_data = no_data;
        self
    }

    pub fn with_band(mut self, band: usize) -> Self {
        self.band = band;
        self
    }
}

/// Decode a GeoTIFF buffer with default options.
pub fn load(bytes: &[u8]) -> OverlayResult<RasterDataset> {
    load_with(bytes, &LoaderOptions::default())
}

/// Decode a GeoTIFF buffer into a single-band dataset.
pub fn load_with(bytes: &[u8], options: &LoaderOptions) -> OverlayResult<RasterDataset> {
    if bytes.is_empty() {
        return Err(OverlayError::decode("empty buffer"));
    }

    let mut decoder = Decoder::new(Cursor::new(bytes))
        .map_err(|e| OverlayError::decode(format!("not a TIFF: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| OverlayError::decode(format!("cannot read dimensions: {}", e)))?;
    let width = width as usize;
    let height = height as usize;

    let samples_per_pixel = decoder.get_tag_u32(Tag::SamplesPerPixel).unwrap_or(1) as usize;
    if samples_per_pixel == 0 || options.band >= samples_per_pixel {
        return Err(OverlayError::decode(format!(
            "band {} requested but image has {} sample(s) per pixel",
            options.band, samples_per_pixel
        )));
    }

    let bbox = read_bbox(&mut decoder, width, height)?;

    let file_nodata = if options.honor_gdal_nodata {
        read_gdal_nodata(&mut decoder)
    } else {
        None
    };

    let interleaved = decoder
        .read_image()
        .map_err(|e| OverlayError::decode(format!("cannot read image data: {}", e)))
        .map(to_f32)?;

    let expected = width * height * samples_per_pixel;
    if interleaved.len() != expected {
        return Err(OverlayError::decode(format!(
            "expected {} samples ({}x{}x{}), decoded {}",
            expected,
            width,
            height,
            samples_per_pixel,
            interleaved.len()
        )));
    }

    let samples = if samples_per_pixel == 1 {
        interleaved
    } else {
        debug!(
            band = options.band,
            samples_per_pixel, "Extracting single band from interleaved image"
        );
        interleaved
            .into_iter()
            .skip(options.band)
            .step_by(samples_per_pixel)
            .collect()
    };

    let mut no_data = options.no_data.clone();
    no_data.merge_file_nodata(file_nodata);

    RasterDataset::new(samples, width, height, bbox, no_data)
}

/// Convert any decoded sample buffer to f32.
fn to_f32(result: DecodingResult) -> Vec<f32> {
    fn cast<T: ToPrimitive>(buf: Vec<T>) -> Vec<f32> {
        buf.into_iter()
            .map(|v| v.to_f32().unwrap_or(f32::NAN))
            .collect()
    }

    #[allow(unreachable_patterns)]
    match result {
        DecodingResult::U8(buf) => cast(buf),
        DecodingResult::U16(buf) => cast(buf),
        DecodingResult::U32(buf) => cast(buf),
        DecodingResult::U64(buf) => cast(buf),
        DecodingResult::I8(buf) => cast(buf),
        DecodingResult::I16(buf) => cast(buf),
        DecodingResult::I32(buf) => cast(buf),
        DecodingResult::I64(buf) => cast(buf),
        DecodingResult::F32(buf) => buf,
        DecodingResult::F64(buf) => cast(buf),
        _ => Vec::new(),
    }
}

/// Look up a GeoTIFF tag by numeric code.
///
/// `from_u16_exhaustive` resolves to the named variant when the `tiff` crate
/// knows the tag, which is what the decoder keys its directory by.
fn geo_tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// North-up affine placement of the raster's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GeoTransform {
    origin_x: f64,
    origin_y: f64,
    pixel_width: f64,
    pixel_height: f64,
}

impl GeoTransform {
    fn bbox(&self, width: usize, height: usize) -> OverlayResult<BoundingBox> {
        if !(self.pixel_width > 0.0) || !(self.pixel_height > 0.0) {
            return Err(OverlayError::decode(format!(
                "unsupported pixel size {} x {}",
                self.pixel_width, self.pixel_height
            )));
        }
        let min_lon = self.origin_x;
        let max_lat = self.origin_y;
        let max_lon = min_lon + self.pixel_width * width as f64;
        let min_lat = max_lat - self.pixel_height * height as f64;

        BoundingBox::new(min_lon, min_lat, max_lon, max_lat)
            .map_err(|e| OverlayError::decode(format!("invalid georeferencing: {}", e)))
    }
}

fn read_bbox<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    width: usize,
    height: usize,
) -> OverlayResult<BoundingBox> {
    let scale = decoder.get_tag_f64_vec(geo_tag(MODEL_PIXEL_SCALE)).ok();
    let tiepoint = decoder.get_tag_f64_vec(geo_tag(MODEL_TIEPOINT)).ok();

    let transform = match (scale, tiepoint) {
        (Some(scale), Some(tiepoint)) if scale.len() >= 2 && tiepoint.len() >= 6 => {
            // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
            GeoTransform {
                origin_x: tiepoint[3] - tiepoint[0] * scale[0],
                origin_y: tiepoint[4] + tiepoint[1] * scale[1],
                pixel_width: scale[0],
                pixel_height: scale[1],
            }
        }
        _ => read_model_transformation(decoder)?,
    };

    transform.bbox(width, height)
}

fn read_model_transformation<R: Read + Seek>(
    decoder: &mut Decoder<R>,
) -> OverlayResult<GeoTransform> {
    let m = decoder
        .get_tag_f64_vec(geo_tag(MODEL_TRANSFORMATION))
        .map_err(|_| OverlayError::decode("missing georeferencing tags"))?;

    if m.len() < 16 {
        return Err(OverlayError::decode(format!(
            "ModelTransformationTag has {} values, expected 16",
            m.len()
        )));
    }
    if m[1] != 0.0 || m[4] != 0.0 {
        return Err(OverlayError::decode("rotated rasters are not supported"));
    }

    Ok(GeoTransform {
        origin_x: m[3],
        origin_y: m[7],
        pixel_width: m[0],
        pixel_height: -m[5],
    })
}

fn read_gdal_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f32> {
    let raw = decoder.get_tag_ascii_string(geo_tag(GDAL_NODATA)).ok()?;
    let text = raw.trim_matches(char::from(0)).trim();
    match text.parse::<f32>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(value = %text, "Ignoring unparseable GDAL_NODATA tag");
            None
        }
    }
}
