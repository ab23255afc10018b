//! Hechos derivados: fechas, posición GPS y autores a partir de registros ya clasificados.

use crate::record::{GpsCoordinate, MetadataRecord};
use crate::taxonomy::Category;
use chrono::{NaiveDate, NaiveDateTime};

const DATE_PATTERNS: [&str; 3] = ["%Y:%m:%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%SZ"];

const REFERENCE_PRIORITY: [char; 4] = ['N', 'E', 'W', 'S'];

/// Latitud y longitud con su referencia: `(lat, lat_ref, lon, lon_ref)`.
pub type GpsPair = (f64, char, f64, char);

fn values_in(records: &[MetadataRecord], category: Category) -> impl Iterator<Item = &MetadataRecord> {
    records
        .iter()
        .filter(move |record| record.has_category(category))
}

/// Última fecha de creación que se pueda interpretar.
pub fn creation_date(records: &[MetadataRecord]) -> Option<NaiveDateTime> {
    last_date(records, Category::CreationTime)
}

/// Última fecha de modificación que se pueda interpretar.
pub fn modify_date(records: &[MetadataRecord]) -> Option<NaiveDateTime> {
    last_date(records, Category::ModifyTime)
}

fn last_date(records: &[MetadataRecord], category: Category) -> Option<NaiveDateTime> {
    values_in(records, category)
        .filter_map(|record| parse_date(&record.value))
        .last()
}

pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATE_PATTERNS
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(value, pattern).ok())
        .or_else(|| parse_pdf_date(value))
}

/// Fechas PDF `D:YYYYMMDD[HHmm[SS]]`; la zona horaria final se ignora.
fn parse_pdf_date(value: &str) -> Option<NaiveDateTime> {
    let digits: String = value
        .strip_prefix("D:")?
        .chars()
        .take_while(char::is_ascii_digit)
        .take(14)
        .collect();
    if digits.len() < 8 || digits.len() % 2 != 0 {
        return None;
    }

    let field = |start: usize, len: usize| -> Option<u32> {
        match digits.get(start..start + len) {
            Some(text) => text.parse().ok(),
            None => Some(0),
        }
    };
    let year = i32::try_from(field(0, 4)?).ok()?;
    NaiveDate::from_ymd_opt(year, field(4, 2)?, field(6, 2)?)?.and_hms_opt(
        field(8, 2)?,
        field(10, 2)?,
        field(12, 2)?,
    )
}

/// Posición a partir de las categorías de latitud y longitud.
///
/// Usa el valor tipado del registro si existe y, si no, interpreta el texto.
/// Gana el último valor válido de cada lado.
pub fn gps_coordinates(records: &[MetadataRecord]) -> Option<GpsPair> {
    let latitude = last_coordinate(records, Category::PositionLatitude)?;
    let longitude = last_coordinate(records, Category::PositionLongitude)?;
    Some((
        latitude.degrees,
        latitude.reference,
        longitude.degrees,
        longitude.reference,
    ))
}

fn last_coordinate(records: &[MetadataRecord], category: Category) -> Option<GpsCoordinate> {
    values_in(records, category)
        .filter(|record| !record.value.is_empty())
        .filter_map(|record| {
            record
                .coordinate()
                .or_else(|| parse_gps_specification(&record.value))
        })
        .last()
}

/// Interpreta `"48.1234 N"` o la forma empaquetada `"48,7.30 E"` (grados, minutos y segundos).
pub fn parse_gps_specification(value: &str) -> Option<GpsCoordinate> {
    let reference = REFERENCE_PRIORITY
        .iter()
        .copied()
        .find(|letter| value.contains(*letter))?;
    let remainder = value.replace(reference, "");
    let remainder = remainder.trim();

    let degrees = if remainder.contains(',') && remainder.contains('.') {
        let (degree, rest) = remainder.split_once(',')?;
        let (minutes, seconds) = rest.split_once('.')?;
        let degree: u32 = degree.trim().parse().ok()?;
        let minutes: u32 = minutes.trim().parse().ok()?;
        let seconds: u32 = seconds.trim().parse().ok()?;
        f64::from(degree) + f64::from(minutes) / 60.0 + f64::from(seconds) / 3600.0
    } else {
        remainder.parse().ok()?
    };

    Some(GpsCoordinate::new(degrees, reference))
}

/// Todos los nombres de autor no vacíos, unidos con `"; "`.
pub fn author_name(records: &[MetadataRecord]) -> Option<String> {
    let names: Vec<&str> = values_in(records, Category::AuthorName)
        .map(|record| record.value.as_str())
        .filter(|value| !value.is_empty())
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names.join("; "))
    }
}
