//! Paquetes XMP (RDF/XML) embebidos en cualquier tipo de archivo.

use super::{Analyser, RawEntry, enrich_with_categories};
use crate::record::MetadataRecord;
use crate::taxonomy::{Category, TagRule, Visibility};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

const DESCRIPTION: &str = "embedded XMP metadata";

const PACKET_BOUNDS: [(&[u8], &[u8]); 2] = [
    (b"<x:xmpmeta", b"</x:xmpmeta>"),
    (b"<rdf:RDF", b"</rdf:RDF>"),
];

/// Tamaño de cada lectura mientras se busca el inicio del paquete.
const CHUNK_SIZE: usize = 64 * 1024;
/// Bytes leídos como máximo a partir del inicio del paquete.
const MAX_PACKET_SIZE: usize = 4 * 1024 * 1024;

use Category::*;
use Visibility::Always;

const TAXONOMY: &[TagRule] = &[
    TagRule::new("xmp:CreateDate", &[Time, CreationTime], Always),
    TagRule::new("xmp:MetadataDate", &[Time], Always),
    TagRule::new("xmp:ModifyDate", &[Time, ModifyTime], Always),
    TagRule::new("xmp:CreatorTool", &[Tool], Always),
    TagRule::new("xmp:Author", &[Author, AuthorName], Always),
    TagRule::new("xmp:Nickname", &[Author], Always),
    TagRule::new("tiff:Make", &[Tool, Hardware], Always),
    TagRule::new("tiff:Model", &[Tool, Hardware], Always),
    TagRule::new("tiff:Artist", &[Author], Always),
    TagRule::new("tiff:DateTime", &[Time], Always),
    TagRule::new("tiff:Software", &[Tool, Software], Always),
    TagRule::new("exif:DateTimeDigitized", &[Time, CreationTime], Always),
    TagRule::new("exif:DateTimeOriginal", &[Time, CreationTime], Always),
    TagRule::new("exif:UserComment", &[Author], Always),
    TagRule::new("exif:GPSAltitude", &[Location], Always),
    TagRule::new("exif:GPSAltitudeRef", &[Location], Always),
    TagRule::new("exif:GPSAreaInformation", &[Location], Always),
    TagRule::new("exif:GPSDestBearing", &[Location], Always),
    TagRule::new("exif:GPSDestBearingRef", &[Location], Always),
    TagRule::new("exif:GPSDestDistance", &[Location], Always),
    TagRule::new("exif:GPSDestDistanceRef", &[Location], Always),
    TagRule::new("exif:GPSDestLatitude", &[Location], Always),
    TagRule::new("exif:GPSDestLongitude", &[Location], Always),
    TagRule::new("exif:GPSDifferential", &[Location], Always),
    TagRule::new("exif:GPSLatitude", &[Location, PositionLatitude], Always),
    TagRule::new("exif:GPSLongitude", &[Location, PositionLongitude], Always),
    TagRule::new("exif:GPSSpeed", &[Location], Always),
    TagRule::new("exif:GPSSpeedRef", &[Location], Always),
    TagRule::new("exif:GPSStatus", &[Location], Always),
    TagRule::new("exif:GPSDateTime", &[Time], Always),
    TagRule::new("exif:GPSTimeStamp", &[Time], Always),
    TagRule::new("photoshop:AuthorsPosition", &[Author], Always),
    TagRule::new("photoshop:CaptionWriter", &[Author], Always),
    TagRule::new("photoshop:City", &[Location], Always),
    TagRule::new("photoshop:Country", &[Location], Always),
    TagRule::new("photoshop:Credit", &[Author], Always),
    TagRule::new("photoshop:DateCreated", &[Time, CreationTime], Always),
    TagRule::new("photoshop:History", &[Author, Time], Always),
    TagRule::new("photoshop:Source", &[Author], Always),
];

/// Busca el paquete XMP dentro de los bytes crudos del archivo.
#[derive(Debug, Default)]
pub struct XmpAnalyser;

impl Analyser for XmpAnalyser {
    fn name(&self) -> &'static str {
        "XMP"
    }

    fn extract(&self, path: &Path) -> Vec<MetadataRecord> {
        let candidate = match read_packet_candidate(path) {
            Ok(Some(candidate)) => candidate,
            Ok(None) => return Vec::new(),
            Err(error) => {
                log::debug!("XMP: no se pudo leer `{}`: {error}", path.display());
                return Vec::new();
            }
        };

        let Some(packet) = find_packet(&candidate) else {
            return Vec::new();
        };

        let entries = flatten_xmp_packet(packet)
            .into_iter()
            .map(|(key, value)| RawEntry::new(key, value, DESCRIPTION))
            .collect();

        enrich_with_categories(TAXONOMY, entries)
    }
}

/// Lee el archivo por bloques hasta el primer marcador de apertura y devuelve
/// a lo sumo `MAX_PACKET_SIZE` bytes desde ese punto.
fn read_packet_candidate(path: &Path) -> io::Result<Option<Vec<u8>>> {
    let mut reader = BufReader::new(File::open(path)?);
    // Un marcador partido entre dos bloques sigue completo en la ventana.
    let overlap = PACKET_BOUNDS
        .iter()
        .map(|(open, _)| open.len() - 1)
        .max()
        .unwrap_or(0);

    let mut window = Vec::with_capacity(CHUNK_SIZE + overlap);
    let start = loop {
        let read = reader
            .by_ref()
            .take(CHUNK_SIZE as u64)
            .read_to_end(&mut window)?;
        if read == 0 {
            return Ok(None);
        }
        if let Some(start) = first_opening(&window) {
            break start;
        }
        let consumed = window.len().saturating_sub(overlap);
        window.drain(..consumed);
    };

    let mut candidate = window.split_off(start);
    let remaining = MAX_PACKET_SIZE.saturating_sub(candidate.len());
    reader.take(remaining as u64).read_to_end(&mut candidate)?;
    Ok(Some(candidate))
}

fn first_opening(bytes: &[u8]) -> Option<usize> {
    PACKET_BOUNDS
        .iter()
        .filter_map(|(open, _)| find_bytes(bytes, open))
        .min()
}

fn find_packet(bytes: &[u8]) -> Option<&[u8]> {
    PACKET_BOUNDS.iter().find_map(|(open, close)| {
        let start = find_bytes(bytes, open)?;
        let end = find_bytes(&bytes[start..], close)? + start + close.len();
        Some(&bytes[start..end])
    })
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

enum Frame {
    /// Contenedores sin propiedades (`x:xmpmeta`, `rdf:RDF`, desconocidos).
    Other,
    /// `rdf:Description` o estructura; sus hijos son propiedades con el prefijo dado.
    Description { prefix: String },
    /// Propiedad o elemento de arreglo pendiente de su texto.
    Value {
        key: String,
        text: String,
        has_children: bool,
    },
    /// `rdf:Seq`, `rdf:Bag` o `rdf:Alt`.
    Array { key: String, count: usize },
}

struct Flattener {
    stack: Vec<Frame>,
    pairs: Vec<(String, String)>,
}

impl Flattener {
    fn open(&mut self, element: &BytesStart<'_>) {
        let name = qualified_name(element);
        let frame = match self.stack.last_mut() {
            None | Some(Frame::Other) => {
                if name == "rdf:Description" {
                    self.push_attribute_properties(element, "");
                    Frame::Description {
                        prefix: String::new(),
                    }
                } else {
                    Frame::Other
                }
            }
            Some(Frame::Description { prefix }) => {
                let key = format!("{prefix}{name}");
                self.property_frame(element, key)
            }
            Some(Frame::Array { key, count }) => {
                if name == "rdf:li" {
                    *count += 1;
                    let key = format!("{key}[{count}]");
                    self.property_frame(element, key)
                } else {
                    Frame::Other
                }
            }
            Some(Frame::Value {
                key, has_children, ..
            }) => {
                let key = key.clone();
                if !*has_children {
                    *has_children = true;
                    self.pairs.push((key.clone(), String::new()));
                }
                match name.as_str() {
                    "rdf:Seq" | "rdf:Bag" | "rdf:Alt" => Frame::Array { key, count: 0 },
                    "rdf:Description" => {
                        let prefix = format!("{key}/");
                        self.push_attribute_properties(element, &prefix);
                        Frame::Description { prefix }
                    }
                    _ => Frame::Other,
                }
            }
        };
        self.stack.push(frame);
    }

    /// Marco para una propiedad (o `rdf:li`) según sus atributos RDF.
    fn property_frame(&mut self, element: &BytesStart<'_>, key: String) -> Frame {
        let mut resource = None;
        let mut is_struct = false;
        let mut fields = Vec::new();

        for (attr_name, attr_value) in attributes(element) {
            match attr_name.as_str() {
                "rdf:resource" => resource = Some(attr_value),
                "rdf:parseType" if attr_value == "Resource" => is_struct = true,
                _ if is_property_attribute(&attr_name) => fields.push((attr_name, attr_value)),
                _ => {}
            }
        }

        if is_struct || !fields.is_empty() {
            self.pairs.push((key.clone(), String::new()));
            let prefix = format!("{key}/");
            for (field, value) in fields {
                self.pairs.push((format!("{prefix}{field}"), value));
            }
            return Frame::Description { prefix };
        }

        Frame::Value {
            key,
            text: resource.unwrap_or_default(),
            has_children: false,
        }
    }

    fn push_attribute_properties(&mut self, element: &BytesStart<'_>, prefix: &str) {
        for (attr_name, attr_value) in attributes(element) {
            if is_property_attribute(&attr_name) {
                self.pairs.push((format!("{prefix}{attr_name}"), attr_value));
            }
        }
    }

    fn text(&mut self, content: &str) {
        if let Some(Frame::Value {
            text,
            has_children: false,
            ..
        }) = self.stack.last_mut()
        {
            text.push_str(content);
        }
    }

    fn close(&mut self) {
        if let Some(Frame::Value {
            key,
            text,
            has_children: false,
        }) = self.stack.pop()
        {
            self.pairs.push((key, text.trim().to_string()));
        }
    }
}

/// Aplana todas las propiedades de un paquete XMP en pares `(clave, valor)`.
///
/// Los arreglos producen primero la clave con valor vacío y luego
/// `clave[i]` (desde 1); las estructuras anidadas usan `clave[i]/campo`.
/// Un paquete mal formado devuelve lo leído hasta el error.
pub fn flatten_xmp_packet(packet: &[u8]) -> Vec<(String, String)> {
    let mut reader = Reader::from_reader(packet);
    reader.config_mut().trim_text(true);

    let mut flattener = Flattener {
        stack: Vec::new(),
        pairs: Vec::new(),
    };
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => flattener.open(e),
            Ok(Event::Empty(ref e)) => {
                flattener.open(e);
                flattener.close();
            }
            Ok(Event::End(_)) => flattener.close(),
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map(|text| text.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(e).into_owned());
                flattener.text(&text);
            }
            Ok(Event::CData(ref e)) => flattener.text(&String::from_utf8_lossy(e)),
            Ok(Event::Eof) => break,
            Err(error) => {
                log::debug!("XMP: paquete mal formado: {error}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    flattener.pairs
}

fn qualified_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}

fn attributes(element: &BytesStart<'_>) -> Vec<(String, String)> {
    element
        .attributes()
        .flatten()
        .map(|attr| {
            let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map(|value| value.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            (name, value)
        })
        .collect()
}

fn is_property_attribute(name: &str) -> bool {
    !(name.starts_with("rdf:")
        || name.starts_with("xmlns")
        || name.starts_with("xml:")
        || name == "about")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKET: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    <rdf:Description rdf:about=""
        xmlns:xmp="http://ns.adobe.com/xap/1.0/"
        xmlns:dc="http://purl.org/dc/elements/1.1/"
        xmlns:exif="http://ns.adobe.com/exif/1.0/"
        xmlns:stEvt="http://ns.adobe.com/xap/1.0/sType/ResourceEvent#"
        xmp:CreateDate="2021-06-15T09:30:00"
        xmp:CreatorTool="Adobe Photoshop CC">
      <dc:creator>
        <rdf:Seq>
          <rdf:li>Jane Doe</rdf:li>
          <rdf:li>J. Smith</rdf:li>
        </rdf:Seq>
      </dc:creator>
      <exif:GPSLatitude>48,7.30N</exif:GPSLatitude>
      <xmp:History>
        <rdf:Seq>
          <rdf:li rdf:parseType="Resource">
            <stEvt:action>saved</stEvt:action>
            <stEvt:when>2021-06-16T10:00:00</stEvt:when>
          </rdf:li>
        </rdf:Seq>
      </xmp:History>
    </rdf:Description>
  </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#;

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn flattens_attributes_arrays_and_structures() {
        let pairs = flatten_xmp_packet(PACKET.as_bytes());
        assert_eq!(
            pairs,
            vec![
                pair("xmp:CreateDate", "2021-06-15T09:30:00"),
                pair("xmp:CreatorTool", "Adobe Photoshop CC"),
                pair("dc:creator", ""),
                pair("dc:creator[1]", "Jane Doe"),
                pair("dc:creator[2]", "J. Smith"),
                pair("exif:GPSLatitude", "48,7.30N"),
                pair("xmp:History", ""),
                pair("xmp:History[1]", ""),
                pair("xmp:History[1]/stEvt:action", "saved"),
                pair("xmp:History[1]/stEvt:when", "2021-06-16T10:00:00"),
            ]
        );
    }

    #[test]
    fn empty_description_yields_nothing() {
        let packet = br#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    <rdf:Description rdf:about=""/>
  </rdf:RDF>
</x:xmpmeta>"#;
        assert!(flatten_xmp_packet(packet).is_empty());
    }

    #[test]
    fn packet_is_found_inside_binary_data() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("photo.jpg");
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x10];
        bytes.extend_from_slice(PACKET.as_bytes());
        bytes.extend_from_slice(&[0xFF, 0xD9]);
        std::fs::write(&source, bytes)?;

        let records = XmpAnalyser.extract(&source);
        assert_eq!(records.len(), 10);

        let create = &records[0];
        assert_eq!(create.key, "xmp:CreateDate");
        assert_eq!(create.description, DESCRIPTION);
        assert!(create.has_category(Category::CreationTime));

        let latitude = records
            .iter()
            .find(|r| r.key == "exif:GPSLatitude")
            .ok_or("falta exif:GPSLatitude")?;
        assert!(latitude.has_category(Category::PositionLatitude));

        let creator = records
            .iter()
            .find(|r| r.key == "dc:creator[1]")
            .ok_or("falta dc:creator[1]")?;
        assert_eq!(creator.visibility, Visibility::Full);
        Ok(())
    }

    #[test]
    fn marker_split_across_chunks_is_found() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("clip.mp4");
        let marker = PACKET.find("<x:xmpmeta").ok_or("falta el marcador")?;
        let mut bytes = vec![0u8; CHUNK_SIZE - marker - 4];
        bytes.extend_from_slice(PACKET.as_bytes());
        bytes.extend(std::iter::repeat_n(0u8, CHUNK_SIZE));
        std::fs::write(&source, bytes)?;

        assert_eq!(XmpAnalyser.extract(&source).len(), 10);
        Ok(())
    }

    #[test]
    fn packet_after_several_chunks_is_found() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("clip.mov");
        let mut bytes = vec![0x55u8; CHUNK_SIZE * 3 + 17];
        bytes.extend_from_slice(PACKET.as_bytes());
        std::fs::write(&source, bytes)?;

        let candidate = read_packet_candidate(&source)?.ok_or("falta el paquete")?;
        assert!(candidate.starts_with(b"<x:xmpmeta"));
        assert_eq!(XmpAnalyser.extract(&source).len(), 10);
        Ok(())
    }

    #[test]
    fn candidate_is_capped() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("huge.bin");
        let mut bytes = b"<rdf:RDF>".to_vec();
        bytes.extend(std::iter::repeat_n(b'a', MAX_PACKET_SIZE + CHUNK_SIZE));
        bytes.extend_from_slice(b"</rdf:RDF>");
        std::fs::write(&source, bytes)?;

        let candidate = read_packet_candidate(&source)?.ok_or("falta el inicio")?;
        assert_eq!(candidate.len(), MAX_PACKET_SIZE);
        assert!(XmpAnalyser.extract(&source).is_empty());
        Ok(())
    }

    #[test]
    fn files_without_packet_yield_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let empty = dir.path().join("empty.xmp");
        std::fs::write(&empty, b"")?;
        let text = dir.path().join("notes.txt");
        std::fs::write(&text, b"<rdf:RDF never closed")?;

        assert!(XmpAnalyser.extract(&empty).is_empty());
        assert!(XmpAnalyser.extract(&text).is_empty());
        assert!(XmpAnalyser.extract(&dir.path().join("missing.jpg")).is_empty());
        Ok(())
    }
}
