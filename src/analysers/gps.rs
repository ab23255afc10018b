//! Conversión de coordenadas EXIF (grados, minutos, segundos racionales) a grados decimales.

use crate::record::Rational;

/// Convierte la tripleta grados/minutos/segundos en grados decimales.
///
/// Si el denominador de los minutos no es 1, algunos dispositivos empaquetan
/// minutos y segundos en un solo racional `MM.SS`; en ese caso la parte
/// fraccionaria multiplicada por 100 son los segundos y el tercer racional se
/// ignora.
pub fn dms_to_decimal(triple: &[Rational; 3]) -> Option<f64> {
    let degree = triple[0].to_f64()?;
    let (minutes, seconds) = if triple[1].denom == 1 {
        (triple[1].to_f64()?, triple[2].to_f64()?)
    } else {
        let whole = triple[1].to_f64()?;
        let fraction = whole % 1.0;
        (whole - fraction, fraction * 100.0)
    };
    Some(degree + minutes / 60.0 + seconds / 3600.0)
}
