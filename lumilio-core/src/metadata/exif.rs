//! EXIF stream extraction. Wraps `kamadak-exif` with the bounded-resource
//! knobs the metadata stage dials per asset kind: fast mode skips thumbnail
//! and maker-note parsing, a file-size ceiling avoids reading huge originals
//! tag-by-tag, and a wall-clock timeout bounds pathological files.

use std::path::Path;
use std::time::Duration;

use exif::{In, Tag, Value};
use lumilio_model::{EngineError, Result};
use tokio::time::timeout;

#[derive(Debug, Clone, Default)]
pub struct ExifData {
    pub dimensions: Option<(u32, u32)>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub lens_model: Option<String>,
    pub iso: Option<u32>,
    pub f_number: Option<f64>,
    pub exposure_time: Option<String>,
    pub focal_length: Option<f64>,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct ExifOptions {
    pub fast_mode: bool,
    pub max_file_size: u64,
    pub timeout: Duration,
}

impl ExifOptions {
    pub const PHOTO: Self = Self {
        fast_mode: false,
        max_file_size: 2 * 1024 * 1024 * 1024,
        timeout: Duration::from_secs(60),
    };

    pub const VIDEO: Self = Self {
        fast_mode: true,
        max_file_size: 20 * 1024 * 1024 * 1024,
        timeout: Duration::from_secs(60),
    };

    pub const AUDIO: Self = Self {
        fast_mode: true,
        max_file_size: 20 * 1024 * 1024 * 1024,
        timeout: Duration::from_secs(60),
    };
}

/// Extracts what EXIF data is present. Absence of an EXIF segment (common
/// for video/audio containers) is not an error — it yields an empty record.
pub async fn extract(path: &Path, options: ExifOptions) -> Result<ExifData> {
    let file_size = tokio::fs::metadata(path).await?.len();
    if file_size > options.max_file_size {
        return Err(EngineError::Precondition(format!(
            "file exceeds EXIF size ceiling: {file_size} > {}",
            options.max_file_size
        )));
    }

    let path = path.to_path_buf();
    let task = tokio::task::spawn_blocking(move || read_exif_blocking(&path, options.fast_mode));

    match timeout(options.timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(EngineError::Internal(format!(
            "EXIF extraction task failed: {join_err}"
        ))),
        Err(_) => Err(EngineError::TransientIo {
            task: "extract_exif".into(),
            source: anyhow::anyhow!("EXIF extraction timed out after {:?}", options.timeout),
        }),
    }
}

fn read_exif_blocking(path: &Path, fast_mode: bool) -> Result<ExifData> {
    let file = std::fs::File::open(path)?;
    let mut bufreader = std::io::BufReader::new(file);
    let exif_reader = exif::Reader::new();

    let fields = match exif_reader.read_from_container(&mut bufreader) {
        Ok(exif) => exif,
        // No EXIF segment present: treat as an empty, successful read.
        Err(_) => return Ok(ExifData::default()),
    };

    let mut data = ExifData::default();

    if let Some(field) = fields.get_field(Tag::ImageWidth, In::PRIMARY)
        && let Some(width) = field.value.get_uint(0)
        && let Some(height_field) = fields.get_field(Tag::ImageLength, In::PRIMARY)
        && let Some(height) = height_field.value.get_uint(0)
    {
        data.dimensions = Some((width, height));
    }

    // `ImageWidth`/`ImageLength` are TIFF-only and rarely populated on
    // ordinary JPEGs, which instead carry `PixelXDimension`/`PixelYDimension`
    // in the Exif sub-IFD. Compose them into the same "WxH" shape the
    // dimensions parser expects.
    if data.dimensions.is_none() {
        data.dimensions = pixel_dimensions(&fields);
    }

    data.camera_make = string_tag(&fields, Tag::Make);
    data.camera_model = string_tag(&fields, Tag::Model);

    if !fast_mode {
        data.lens_model = string_tag(&fields, Tag::LensModel);
        data.iso = fields
            .get_field(Tag::PhotographicSensitivity, In::PRIMARY)
            .and_then(|f| f.value.get_uint(0));
        data.f_number = rational_tag(&fields, Tag::FNumber);
        data.exposure_time = fields
            .get_field(Tag::ExposureTime, In::PRIMARY)
            .map(|f| f.display_value().to_string());
        data.focal_length = rational_tag(&fields, Tag::FocalLength);
        data.gps_latitude = gps_coordinate(&fields, Tag::GPSLatitude, Tag::GPSLatitudeRef);
        data.gps_longitude = gps_coordinate(&fields, Tag::GPSLongitude, Tag::GPSLongitudeRef);
    }

    Ok(data)
}

fn pixel_dimensions(fields: &exif::Exif) -> Option<(u32, u32)> {
    let width = fields.get_field(Tag::PixelXDimension, In::PRIMARY)?.display_value().to_string();
    let height = fields.get_field(Tag::PixelYDimension, In::PRIMARY)?.display_value().to_string();
    super::parse_dimensions(&format!("{width}x{height}"))
}

fn string_tag(fields: &exif::Exif, tag: Tag) -> Option<String> {
    fields
        .get_field(tag, In::PRIMARY)
        .map(|f| f.display_value().to_string().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn rational_tag(fields: &exif::Exif, tag: Tag) -> Option<f64> {
    let field = fields.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Rational(values) => values.first().map(|r| r.to_f64()),
        Value::SRational(values) => values.first().map(|r| r.to_f64()),
        _ => None,
    }
}

fn gps_coordinate(fields: &exif::Exif, value_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let field = fields.get_field(value_tag, In::PRIMARY)?;
    let Value::Rational(values) = &field.value else {
        return None;
    };
    if values.len() < 3 {
        return None;
    }
    let degrees = values[0].to_f64() + values[1].to_f64() / 60.0 + values[2].to_f64() / 3600.0;

    let sign = fields
        .get_field(ref_tag, In::PRIMARY)
        .map(|f| f.display_value().to_string())
        .map(|r| if r.contains('S') || r.contains('W') { -1.0 } else { 1.0 })
        .unwrap_or(1.0);

    Some(degrees * sign)
}
