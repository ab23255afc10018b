//! Extracción de metadata EXIF embebida en imágenes.

use super::gps::dms_to_decimal;
use super::{Analyser, RawEntry, enrich_with_categories};
use crate::record::{GpsCoordinate, MetadataRecord, Rational, TypedValue, format_decimal};
use crate::taxonomy::{Category, TagRule, Visibility, classify};
use exif::{Context, Exif, Field, In, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const DESCRIPTION: &str = "embedded EXIF metadata";
const GPS_DESCRIPTION: &str = "extracted from EXIF GPSInfo metadata";
const DECODING_ERROR: &str = "[DECODING ERROR]";

const LATITUDE_KEY: &str = "GPSInfo => Latitude";
const LONGITUDE_KEY: &str = "GPSInfo => Longitude";
const ALTITUDE_KEY: &str = "GPSInfo => Altitude";
const ALTITUDE_REF_KEY: &str = "GPSInfo:GPSAltitudeRef";

// Etiquetas XP* de Windows (IFD0), codificadas en UTF-16LE.
const XP_TAGS: [(u16, &str); 5] = [
    (0x9C9B, "XPTitle"),
    (0x9C9C, "XPComment"),
    (0x9C9D, "XPAuthor"),
    (0x9C9E, "XPKeywords"),
    (0x9C9F, "XPSubject"),
];

use Category::*;
use Visibility::*;

const TAXONOMY: &[TagRule] = &[
    TagRule::new("DateTimeOriginal", &[Time, CreationTime], Always),
    TagRule::new("DateTimeDigitized", &[Time, CreationTime], Always),
    TagRule::new("CreateDate", &[Time, CreationTime], Always),
    TagRule::new("DateTime", &[Time, ModifyTime], Always),
    TagRule::new("CameraOwnerName", &[Author, AuthorName], Always),
    TagRule::new("OwnerName", &[Author, AuthorName], Always),
    TagRule::new("XPAuthor", &[Author], Always),
    TagRule::new("Copyright", &[Author], Always),
    TagRule::new("Artist", &[Author], Always),
    TagRule::new("UserComment", &[Author, Comment], Always),
    TagRule::new("ImageDescription", &[Author, Comment], Always),
    TagRule::new("Make", &[Tool, Hardware], Always),
    TagRule::new("Model", &[Tool, Hardware], Always),
    TagRule::new("SerialNumber", &[Tool, Hardware], Always),
    TagRule::new("BodySerialNumber", &[Tool], Always),
    TagRule::new("CameraSerialNumber", &[Tool, Hardware], Always),
    TagRule::new("Software", &[Tool, Software], Always),
    TagRule::new("GPSInfo", &[Location], Detailed),
    TagRule::new("GPSInfo:GPSLatitudeRef", &[Location], Detailed),
    TagRule::new("GPSInfo:GPSLatitude", &[Location], Detailed),
    TagRule::new("GPSInfo:GPSLongitudeRef", &[Location], Detailed),
    TagRule::new("GPSInfo:GPSLongitude", &[Location], Detailed),
    TagRule::new("GPSInfo:GPSAltitudeRef", &[Location], Detailed),
    TagRule::new("GPSInfo:GPSAltitude", &[Location], Detailed),
    TagRule::new("GPSInfo:GPSTimeStamp", &[Time], Detailed),
    TagRule::new("GPSInfo:Latitude", &[Location], Detailed),
    TagRule::new("GPSInfo:Longitude", &[Location], Detailed),
    TagRule::new(LATITUDE_KEY, &[Location, PositionLatitude], Always),
    TagRule::new(LONGITUDE_KEY, &[Location, PositionLongitude], Always),
    TagRule::new(ALTITUDE_KEY, &[Location], Always),
];

/// Lee el diccionario EXIF de la imagen principal y deriva la posición GPS.
#[derive(Debug, Default)]
pub struct ExifAnalyser;

impl Analyser for ExifAnalyser {
    fn name(&self) -> &'static str {
        "EXIF"
    }

    fn extract(&self, path: &Path) -> Vec<MetadataRecord> {
        let Some(exif) = read_exif(path) else {
            return Vec::new();
        };

        let mut entries = Vec::new();
        let mut gps_entries = Vec::new();
        let mut gps = GpsFields::default();

        for field in exif.fields().filter(|field| field.ifd_num == In::PRIMARY) {
            if field.tag.context() == Context::Gps {
                gps.collect(field);
                gps_entries.push(RawEntry::new(
                    format!("GPSInfo:{}", field.tag),
                    field_to_text(field),
                    GPS_DESCRIPTION,
                ));
            } else {
                entries.push(RawEntry::new(tag_name(field), field_to_text(field), DESCRIPTION));
            }
        }

        // El lector sigue el puntero al IFD GPS sin exponerlo como campo;
        // `GPSInfo` resume cuántas etiquetas GPS se leyeron.
        if !gps_entries.is_empty() {
            let summary = format!("{} GPS tags", gps_entries.len());
            entries.push(RawEntry::new("GPSInfo", summary, DESCRIPTION));
        }

        let altitude = gps.altitude();
        if let Some((_, label)) = altitude {
            for entry in gps_entries.iter_mut().filter(|e| e.key == ALTITUDE_REF_KEY) {
                entry.value = label.to_string();
            }
        }
        entries.extend(gps_entries);

        let mut records = enrich_with_categories(TAXONOMY, entries);

        if let Some((latitude, longitude)) = gps.position() {
            records.push(synthetic(LATITUDE_KEY, latitude.to_string(), latitude));
            records.push(synthetic(LONGITUDE_KEY, longitude.to_string(), longitude));
        }
        if let Some((meters, _)) = altitude {
            records.push(MetadataRecord::new(
                ALTITUDE_KEY,
                format!("{} meter", format_decimal(meters)),
                GPS_DESCRIPTION,
                classify(TAXONOMY, ALTITUDE_KEY),
            ));
        }

        records
    }
}

fn read_exif(path: &Path) -> Option<Exif> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(error) => {
            log::debug!("EXIF: no se pudo abrir `{}`: {error}", path.display());
            return None;
        }
    };
    let mut bufreader = BufReader::new(&file);
    match exif::Reader::new().read_from_container(&mut bufreader) {
        Ok(exif) => Some(exif),
        Err(error) => {
            log::debug!("EXIF: sin metadata en `{}`: {error}", path.display());
            None
        }
    }
}

fn synthetic(key: &str, value: String, coordinate: GpsCoordinate) -> MetadataRecord {
    MetadataRecord::new(key, value, GPS_DESCRIPTION, classify(TAXONOMY, key))
        .with_typed(TypedValue::Coordinate(coordinate))
}

fn tag_name(field: &Field) -> String {
    if field.tag.context() == Context::Tiff
        && let Some((_, name)) = XP_TAGS.iter().find(|(code, _)| *code == field.tag.number())
    {
        return (*name).to_string();
    }
    field.tag.to_string()
}

fn field_to_text(field: &Field) -> String {
    if field.tag.context() == Context::Tiff
        && XP_TAGS.iter().any(|(code, _)| *code == field.tag.number())
        && let Value::Byte(bytes) = &field.value
    {
        return decode_utf16le(bytes);
    }

    match &field.value {
        Value::Ascii(strings) => strings
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Undefined(bytes, _) => decode_binary(bytes),
        _ => field.display_value().to_string(),
    }
}

fn decode_binary(bytes: &[u8]) -> String {
    let trimmed = trim_nul(bytes);
    match std::str::from_utf8(trimmed) {
        Ok(text) => text.to_string(),
        Err(_) => DECODING_ERROR.to_string(),
    }
}

fn trim_nul(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| *b != 0).map_or(start, |index| index + 1);
    &bytes[start..end]
}

fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string()
}

/// Valores GPS tipados, antes de pasar a texto.
#[derive(Default)]
struct GpsFields {
    latitude: Option<[Rational; 3]>,
    latitude_ref: Option<char>,
    longitude: Option<[Rational; 3]>,
    longitude_ref: Option<char>,
    altitude: Option<Rational>,
    altitude_ref: Option<u8>,
}

impl GpsFields {
    fn collect(&mut self, field: &Field) {
        match field.tag {
            Tag::GPSLatitude => self.latitude = rational_triple(&field.value),
            Tag::GPSLongitude => self.longitude = rational_triple(&field.value),
            Tag::GPSLatitudeRef => self.latitude_ref = reference_char(&field.value),
            Tag::GPSLongitudeRef => self.longitude_ref = reference_char(&field.value),
            Tag::GPSAltitude => {
                if let Value::Rational(values) = &field.value {
                    self.altitude = values.first().map(|r| Rational::new(r.num, r.denom));
                }
            }
            Tag::GPSAltitudeRef => {
                self.altitude_ref = match &field.value {
                    Value::Byte(bytes) | Value::Undefined(bytes, _) => bytes.first().copied(),
                    _ => None,
                };
            }
            _ => {}
        }
    }

    fn position(&self) -> Option<(GpsCoordinate, GpsCoordinate)> {
        let latitude = dms_to_decimal(self.latitude.as_ref()?)?;
        let longitude = dms_to_decimal(self.longitude.as_ref()?)?;
        Some((
            GpsCoordinate::new(latitude, self.latitude_ref?),
            GpsCoordinate::new(longitude, self.longitude_ref?),
        ))
    }

    /// Altitud en metros con signo según la referencia, junto con su etiqueta.
    fn altitude(&self) -> Option<(f64, &'static str)> {
        let magnitude = self.altitude?.to_f64()?;
        match self.altitude_ref? {
            0 => Some((magnitude, "Above sea level")),
            1 => Some((-magnitude, "Below sea level")),
            _ => None,
        }
    }
}

fn rational_triple(value: &Value) -> Option<[Rational; 3]> {
    match value {
        Value::Rational(values) if values.len() >= 3 => Some([
            Rational::new(values[0].num, values[0].denom),
            Rational::new(values[1].num, values[1].denom),
            Rational::new(values[2].num, values[2].denom),
        ]),
        _ => None,
    }
}

fn reference_char(value: &Value) -> Option<char> {
    match value {
        Value::Ascii(strings) => strings
            .first()
            .and_then(|bytes| bytes.first())
            .map(|byte| (*byte as char).to_ascii_uppercase())
            .filter(|reference| matches!(reference, 'N' | 'S' | 'E' | 'W')),
        _ => None,
    }
}
