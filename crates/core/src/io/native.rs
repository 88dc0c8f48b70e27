//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate for decoding and encoding. Georeferencing is read
//! from ModelPixelScale + ModelTiepoint (or ModelTransformation) and the
//! CRS from the EPSG code in the GeoKeyDirectory.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Georef, Raster, RasterElement};
use ndarray::Array3;
use num_traits::NumCast;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{ColorType, Gray32Float, RGB32Float, RGBA32Float};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GEO_ASCII_PARAMS: u16 = 34737;
const PLANAR_SEPARATE: u32 = 2;

/// Read a GeoTIFF file into a multi-band Raster
///
/// All samples of the first image are read and reordered band-major.
/// The file handle is closed when this returns, on success or failure.
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = BufReader::new(File::open(path)?);
    let (data, georef) = decode_geotiff(file)?;
    Raster::from_parts(data, georef.with_source(path))
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    let (data, georef) = decode_geotiff(Cursor::new(data))?;
    Raster::from_parts(data, georef)
}

fn cast_samples<S, T>(buf: Vec<S>) -> Vec<T>
where
    S: NumCast,
    T: RasterElement,
{
    buf.into_iter().map(T::from_sample).collect()
}

/// Internal: decode a GeoTIFF from any `Read + Seek` source
fn decode_geotiff<T, R>(reader: R) -> Result<(Array3<T>, Georef)>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let rows = height as usize;
    let cols = width as usize;

    let planar = decoder
        .get_tag_u32(Tag::PlanarConfiguration)
        .unwrap_or(1);

    let samples: Vec<T> = match decoder.read_image()? {
        DecodingResult::U8(buf) => cast_samples(buf),
        DecodingResult::U16(buf) => cast_samples(buf),
        DecodingResult::U32(buf) => cast_samples(buf),
        DecodingResult::U64(buf) => cast_samples(buf),
        DecodingResult::I8(buf) => cast_samples(buf),
        DecodingResult::I16(buf) => cast_samples(buf),
        DecodingResult::I32(buf) => cast_samples(buf),
        DecodingResult::I64(buf) => cast_samples(buf),
        DecodingResult::F32(buf) => cast_samples(buf),
        DecodingResult::F64(buf) => cast_samples(buf),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF sample format".to_string(),
            ))
        }
    };

    let pixels = rows * cols;
    if pixels == 0 || samples.len() % pixels != 0 {
        return Err(Error::InvalidDimensions {
            bands: if pixels == 0 { 0 } else { samples.len() / pixels },
            width: cols,
            height: rows,
        });
    }
    let bands = samples.len() / pixels;

    let data = if planar == PLANAR_SEPARATE || bands == 1 {
        Array3::from_shape_vec((bands, rows, cols), samples)
            .map_err(|e| Error::Other(e.to_string()))?
    } else {
        // Chunky: samples are interleaved per pixel
        Array3::from_shape_fn((bands, rows, cols), |(b, r, c)| {
            samples[(r * cols + c) * bands + b]
        })
    };

    let transform = read_geotransform(&mut decoder).unwrap_or_default();
    let crs = read_crs(&mut decoder);
    let georef = Georef::new(transform, bands, rows, cols).with_crs(crs);

    Ok((data, georef))
}

/// Attempt to read GeoTransform from TIFF tags
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE))
        .ok();
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT))
        .ok();

    if let (Some(scale), Some(tiepoint)) = (scale, tiepoint) {
        if let Some(transform) = GeoTransform::from_scale_tiepoint(&scale, &tiepoint) {
            return Some(transform);
        }
    }

    decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TRANSFORMATION))
        .ok()
        .and_then(|matrix| GeoTransform::from_model_transformation(&matrix))
}

/// Read the CRS: the EPSG code from the GeoKeyDirectory, or failing that
/// the first citation in GeoAsciiParams
fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    read_epsg(decoder).or_else(|| read_citation(decoder))
}

fn read_epsg<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder
        .get_tag_u16_vec(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY))
        .ok()?;

    // Header: [version, revision, minor, key_count], then 4 shorts per key:
    // [key_id, tiff_tag_location, count, value_or_offset]
    if keys.len() < 4 {
        return None;
    }
    let key_count = keys[3] as usize;
    keys[4..]
        .chunks_exact(4)
        .take(key_count)
        // location 0 means the value is stored inline
        .filter(|entry| entry[1] == 0)
        .find_map(|entry| CRS::from_geokey(entry[0], entry[3]))
}

fn read_citation<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let params = decoder
        .get_tag_ascii_string(Tag::from_u16_exhaustive(GEO_ASCII_PARAMS))
        .ok()?;
    // Entries are '|'-terminated
    let citation = params.split('|').next()?.trim();
    (!citation.is_empty()).then(|| CRS::from_citation(citation))
}

/// Write a Raster to a GeoTIFF file
///
/// Samples are written as 32-bit float. Rasters with 1, 3 or 4 bands are
/// supported; other band counts return `Error::UnsupportedDataType`.
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = BufWriter::new(File::create(path.as_ref())?);
    encode_geotiff(raster, file)
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T>(raster: &Raster<T>) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf))?;
    Ok(buf)
}

/// Internal: encode a Raster as GeoTIFF into any `Write + Seek` sink
fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let (bands, rows, cols) = raster.shape();
    let data = raster.data();

    // Pixel-interleaved f32 samples
    let mut samples = Vec::with_capacity(raster.len());
    for r in 0..rows {
        for c in 0..cols {
            for b in 0..bands {
                samples.push(data[[b, r, c]].to_f64() as f32);
            }
        }
    }

    let mut encoder = TiffEncoder::new(writer)?;
    match bands {
        1 => encode_image::<Gray32Float, _, _>(&mut encoder, raster, &samples),
        3 => encode_image::<RGB32Float, _, _>(&mut encoder, raster, &samples),
        4 => encode_image::<RGBA32Float, _, _>(&mut encoder, raster, &samples),
        n => Err(Error::UnsupportedDataType(format!(
            "cannot write {} band raster (1, 3 or 4 bands supported)",
            n
        ))),
    }
}

fn encode_image<C, T, W>(
    encoder: &mut TiffEncoder<W>,
    raster: &Raster<T>,
    samples: &[f32],
) -> Result<()>
where
    C: ColorType<Inner = f32>,
    T: RasterElement,
    W: Write + Seek,
{
    let mut image = encoder.new_image::<C>(raster.cols() as u32, raster.rows() as u32)?;

    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])?;

    let crs = raster.georef().crs.as_ref();
    let geokeys = geokey_directory(crs);
    image
        .encoder()
        .write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), geokeys.as_slice())?;

    if let Some(citation) = crs.and_then(CRS::citation) {
        let params = format!("{}|", citation);
        image
            .encoder()
            .write_tag(Tag::Unknown(GEO_ASCII_PARAMS), params.as_str())?;
    }

    image.write_data(samples)?;
    Ok(())
}

/// GeoKeyDirectory with model type, raster type and the EPSG code when known
fn geokey_directory(crs: Option<&CRS>) -> Vec<u16> {
    let crs_key = crs.and_then(CRS::to_geokey);
    let model_type = match crs {
        Some(crs) if crs.is_geographic() => 2,
        _ => 1,
    };

    let mut keys: Vec<u16> = vec![
        1024, 0, 1, model_type, // GTModelTypeGeoKey
        1025, 0, 1, 1, // GTRasterTypeGeoKey = RasterPixelIsArea
    ];
    if let Some((key, code)) = crs_key {
        keys.extend_from_slice(&[key, 0, 1, code]);
    }
    if let Some(citation) = crs.and_then(CRS::citation) {
        // GTCitationGeoKey, stored in GeoAsciiParams with its terminator
        let len = (citation.len() + 1) as u16;
        keys.extend_from_slice(&[1026, GEO_ASCII_PARAMS, len, 0]);
    }

    let mut directory = vec![1, 1, 0, (keys.len() / 4) as u16];
    directory.extend(keys);
    directory
}
