use std::fmt::Display;
use std::path::{Path, PathBuf};

use fitsio::compat::errors::Error as FitsError;
use fitsio::compat::fitsfile::FitsFile;
use fitsio::compat::hdu::{FitsHdu, HduInfo};
use fitsio::compat::images::ReadImage;
use fitsio::header::{header_byte_len, parse_header_blocks, serialize_header, Card};
use fitsio::image::serialize_image_i16;
use fitsio::primary::build_primary_header;
use fitsio::value::Value;
use ndarray::Array3;

use crate::consts::PIXEL_MAX;
use crate::error::{DarkMakerError, Result};
use crate::frame::{Frame, FrameDescriptor, FrameType, MasterFrame};

/// Zero point for unsigned 16-bit data stored as signed FITS integers.
const UNSIGNED_16_BZERO: f64 = 32_768.0;

/// Characters that fit between the quotes of a string card.
const STRING_VALUE_MAX_LEN: usize = 68;

/// Characters that fit after a COMMENT keyword.
const COMMENT_MAX_LEN: usize = 72;

/// Primary HDU of a FITS file, loaded through `fitsio`.
pub struct FitsReader {
    path: PathBuf,
    file: FitsFile,
    hdu: FitsHdu,
    shape: (usize, usize, usize),
}

impl FitsReader {
    /// Open a FITS file and check its primary array against the file length.
    pub fn open(path: &Path) -> Result<Self> {
        let file = FitsFile::open(path).map_err(|e| match e {
            FitsError::Io(_) => DarkMakerError::FileNotFound(path.to_path_buf()),
            other => invalid(path, other),
        })?;
        let shape = primary_shape(path, file.data())?;

        let hdu = file.primary_hdu().map_err(|e| invalid(path, e))?;
        match hdu.info(&file).map_err(|e| invalid(path, e))? {
            HduInfo::ImageInfo { .. } => {}
            _ => return Err(invalid(path, "primary HDU is not an image")),
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            hdu,
            shape,
        })
    }

    /// (layers, height, width) of the primary data array.
    pub fn shape(&self) -> (usize, usize, usize) {
        self.shape
    }

    pub fn integer_key(&self, keyword: &str) -> Option<i64> {
        self.hdu.read_key::<i64>(&self.file, keyword).ok()
    }

    pub fn text_key(&self, keyword: &str) -> Option<String> {
        self.hdu.read_key::<String>(&self.file, keyword).ok()
    }

    /// First present keyword from `keywords`, as a float.
    fn float_key(&self, keywords: &[&str]) -> Option<f64> {
        keywords
            .iter()
            .find_map(|k| self.hdu.read_key::<f64>(&self.file, k).ok())
    }

    /// Build a descriptor from the header keywords.
    pub fn descriptor(&self) -> Result<FrameDescriptor> {
        let (_, height, width) = self.shape;
        let width = u32::try_from(width)
            .map_err(|_| invalid(&self.path, format!("NAXIS1 = {width}")))?;
        let height = u32::try_from(height)
            .map_err(|_| invalid(&self.path, format!("NAXIS2 = {height}")))?;

        let binning = self
            .float_key(&["XBINNING"])
            .map(|b| b.round() as i64)
            .unwrap_or(1);
        let binning = u32::try_from(binning)
            .map_err(|_| invalid(&self.path, format!("XBINNING = {binning}")))?;

        let exposure = self.float_key(&["EXPTIME", "EXPOSURE"]).unwrap_or(0.0);
        let temperature = self.float_key(&["CCD-TEMP", "SET-TEMP"]).unwrap_or(0.0);
        let filter = self.text_key("FILTER").unwrap_or_default();
        let frame_type = self
            .text_key("IMAGETYP")
            .map(|t| FrameType::from_header_value(&t))
            .unwrap_or_default();

        Ok(FrameDescriptor::new(self.path.clone(), width, height, binning)?
            .with_exposure(exposure)
            .with_temperature(temperature)
            .with_filter(filter)
            .with_frame_type(frame_type))
    }

    /// Decode the primary data array, applying BZERO/BSCALE.
    pub fn read_frame(&self) -> Result<Frame> {
        let (layers, height, width) = self.shape;
        let count = layers
            .checked_mul(height)
            .and_then(|n| n.checked_mul(width))
            .ok_or_else(|| invalid(&self.path, "pixel count overflows"))?;

        let raw = f64::read_image(&self.file, &self.hdu).map_err(|e| invalid(&self.path, e))?;
        if raw.len() != count {
            return Err(invalid(
                &self.path,
                format!("expected {count} pixels, found {}", raw.len()),
            ));
        }

        let bzero = self.float_key(&["BZERO"]).unwrap_or(0.0);
        let bscale = self.float_key(&["BSCALE"]).unwrap_or(1.0);
        let values = raw.into_iter().map(|v| (bzero + bscale * v) as f32).collect();

        let data = Array3::from_shape_vec((layers, height, width), values)
            .map_err(|e| invalid(&self.path, e))?;
        Ok(Frame::new(data))
    }
}

fn invalid(path: &Path, reason: impl Display) -> DarkMakerError {
    DarkMakerError::InvalidFits(format!("{}: {reason}", path.display()))
}

/// Shape of the primary array. The declared data must fit in `bytes`.
fn primary_shape(path: &Path, bytes: &[u8]) -> Result<(usize, usize, usize)> {
    let header_len = header_byte_len(bytes).map_err(|e| invalid(path, e))?;
    let header = bytes
        .get(..header_len)
        .ok_or_else(|| invalid(path, "header runs past end of file"))?;
    let cards = parse_header_blocks(header).map_err(|e| invalid(path, e))?;
    if cards.first().map(Card::keyword_str) != Some("SIMPLE") {
        return Err(invalid(path, "missing SIMPLE keyword"));
    }

    let integer = |keyword: &str| {
        cards
            .iter()
            .find(|c| c.keyword_str() == keyword)
            .and_then(|c| match &c.value {
                Some(Value::Integer(v)) => Some(*v),
                _ => None,
            })
            .ok_or_else(|| invalid(path, format!("missing {keyword}")))
    };
    let dimension = |keyword: &str| {
        let value = integer(keyword)?;
        usize::try_from(value)
            .ok()
            .filter(|&v| v > 0)
            .ok_or_else(|| invalid(path, format!("{keyword} = {value}")))
    };

    let width = dimension("NAXIS1")?;
    let height = dimension("NAXIS2")?;
    let layers = match integer("NAXIS")? {
        2 => 1,
        3 => dimension("NAXIS3")?,
        other => return Err(invalid(path, format!("unsupported NAXIS = {other}"))),
    };
    let bitpix = integer("BITPIX")?;
    let sample_bytes = usize::try_from(bitpix.unsigned_abs() / 8)
        .map_err(|_| invalid(path, format!("BITPIX = {bitpix}")))?;

    let end = layers
        .checked_mul(height)
        .and_then(|n| n.checked_mul(width))
        .and_then(|n| n.checked_mul(sample_bytes))
        .and_then(|n| n.checked_add(header_len))
        .ok_or_else(|| invalid(path, "data size overflows"))?;
    if end > bytes.len() {
        return Err(invalid(
            path,
            format!("data truncated: expected at least {end} bytes, got {}", bytes.len()),
        ));
    }
    Ok((layers, height, width))
}

fn keyword(name: &str) -> [u8; 8] {
    let mut keyword = [b' '; 8];
    for (slot, byte) in keyword.iter_mut().zip(name.bytes()) {
        *slot = byte;
    }
    keyword
}

fn value_card(name: &str, value: Value) -> Card {
    Card {
        keyword: keyword(name),
        value: Some(value),
        comment: None,
    }
}

/// Printable ASCII only; anything else becomes `?`.
fn header_text(text: &str, max_len: usize) -> String {
    text.chars()
        .map(|c| if c == ' ' || c.is_ascii_graphic() { c } else { '?' })
        .take(max_len)
        .collect()
}

fn text_card(name: &str, text: &str) -> Card {
    value_card(name, Value::String(header_text(text, STRING_VALUE_MAX_LEN)))
}

fn comment_card(text: &str) -> Card {
    Card {
        keyword: keyword("COMMENT"),
        value: None,
        comment: Some(header_text(text, COMMENT_MAX_LEN)),
    }
}

fn write_error(path: &Path, e: FitsError) -> DarkMakerError {
    match e {
        FitsError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            DarkMakerError::PermissionError(path.to_path_buf())
        }
        FitsError::Io(e) => DarkMakerError::Io(e),
        other => invalid(path, other),
    }
}

/// Write a master frame as unsigned 16-bit FITS.
///
/// Values are rounded and limited to [0, 65535] here, at encoding time;
/// the combined data itself is never clamped.
pub fn write_master(path: &Path, master: &MasterFrame) -> Result<()> {
    let frame = &master.frame;
    let meta = &master.metadata;

    let mut axes = vec![frame.width(), frame.height()];
    if frame.layers() > 1 {
        axes.push(frame.layers());
    }
    let mut cards = build_primary_header(16, &axes).map_err(|e| invalid(path, e))?;
    cards.extend([
        value_card("BZERO", Value::Float(UNSIGNED_16_BZERO)),
        value_card("BSCALE", Value::Float(1.0)),
        text_card("IMAGETYP", &format!("{} Frame", meta.frame_type)),
        value_card("EXPTIME", Value::Float(meta.exposure)),
        value_card("CCD-TEMP", Value::Float(meta.temperature)),
        text_card("FILTER", &meta.filter),
        value_card("XBINNING", Value::Integer(i64::from(meta.binning))),
        value_card("YBINNING", Value::Integer(i64::from(meta.binning))),
        text_card(
            "DATE",
            &chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        ),
        comment_card(&meta.description),
    ]);

    let pixels: Vec<i16> = frame
        .data
        .iter()
        .map(|&v| (f64::from(v.round().clamp(0.0, PIXEL_MAX)) - UNSIGNED_16_BZERO) as i16)
        .collect();
    let mut bytes = serialize_header(&cards);
    bytes.extend_from_slice(&serialize_image_i16(&pixels));

    let mut file = FitsFile::create(path)
        .overwrite()
        .open()
        .map_err(|e| write_error(path, e))?;
    file.set_data(bytes);
    file.flush().map_err(|e| write_error(path, e))
}
