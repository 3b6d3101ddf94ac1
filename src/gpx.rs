//! GPX waypoint codec.
//!
//! Reading matches elements by local name, so documents with the GPX 1.1
//! default namespace, a prefixed namespace, or no namespace at all parse the
//! same way. Only `<wpt>` elements are read; routes and tracks are skipped.
//!
//! Writing produces a GPX 1.1 document with a `<metadata>` block and one
//! `<wpt>` per waypoint, named by its short name.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};
use crate::{SourceKind, Waypoint, DEFAULT_SYMBOL};

pub const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";
pub const CREATOR: &str = "Fishing Points Deduplicator";

/// A `<wpt>` as read from disk, before it is tagged with a source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawWaypoint {
    pub lat: f64,
    pub lon: f64,
    pub name: Option<String>,
    pub desc: Option<String>,
    pub cmt: Option<String>,
    pub sym: Option<String>,
    pub time: Option<String>,
}

impl RawWaypoint {
    /// Tag with a source; a missing or blank symbol becomes [`DEFAULT_SYMBOL`].
    pub fn into_waypoint(self, kind: SourceKind, source_file: &str) -> Waypoint {
        let mut wpt = Waypoint::new(self.lat, self.lon, kind).with_source_file(source_file);
        wpt.name = self.name.unwrap_or_default();
        wpt.description = self.desc.unwrap_or_default();
        wpt.comment = self.cmt.unwrap_or_default();
        wpt.time = self.time.unwrap_or_default();
        wpt.symbol = self
            .sym
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SYMBOL.to_string());
        wpt
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Name,
    Desc,
    Cmt,
    Sym,
    Time,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"name" => Some(Field::Name),
            b"desc" => Some(Field::Desc),
            b"cmt" => Some(Field::Cmt),
            b"sym" => Some(Field::Sym),
            b"time" => Some(Field::Time),
            _ => None,
        }
    }

    fn slot<'a>(&self, wpt: &'a mut RawWaypoint) -> &'a mut Option<String> {
        match self {
            Field::Name => &mut wpt.name,
            Field::Desc => &mut wpt.desc,
            Field::Cmt => &mut wpt.cmt,
            Field::Sym => &mut wpt.sym,
            Field::Time => &mut wpt.time,
        }
    }
}

/// Read all waypoints from a GPX file.
pub fn read_file(path: &Path) -> Result<Vec<RawWaypoint>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    read_waypoints(BufReader::new(file), path)
}

/// Read all waypoints from a GPX document. `path` is only used in errors.
///
/// Any malformed XML or unusable coordinate fails the whole document.
///
/// # Example
/// ```
/// use std::path::Path;
/// use waypoint_dedup::gpx::read_waypoints;
///
/// let doc = r#"<gpx><wpt lat="36.5" lon="126.2"><name>사각형어초</name></wpt></gpx>"#;
/// let points = read_waypoints(doc.as_bytes(), Path::new("inline.gpx")).unwrap();
/// assert_eq!(points.len(), 1);
/// assert_eq!(points[0].name.as_deref(), Some("사각형어초"));
/// ```
pub fn read_waypoints<R: BufRead>(input: R, path: &Path) -> Result<Vec<RawWaypoint>> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut waypoints = Vec::new();
    let mut current: Option<RawWaypoint> = None;
    // Element depth; wpt_depth is the depth of the open <wpt>
    let mut depth = 0usize;
    let mut wpt_depth = 0usize;
    let mut field: Option<Field> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| Error::xml(path, e))? {
            Event::Eof => break,
            Event::Start(e) => {
                depth += 1;
                let local = e.local_name();
                if current.is_none() && local.as_ref() == b"wpt" {
                    current = Some(start_waypoint(&e, path)?);
                    wpt_depth = depth;
                } else if current.is_some() && depth == wpt_depth + 1 {
                    field = Field::from_local_name(local.as_ref());
                }
            }
            Event::Empty(e) => {
                if current.is_none() && e.local_name().as_ref() == b"wpt" {
                    waypoints.push(start_waypoint(&e, path)?);
                }
            }
            Event::Text(t) => {
                if let (Some(wpt), Some(f)) = (current.as_mut(), field) {
                    let text = t.unescape().map_err(|e| Error::xml(path, e))?;
                    append_text(f.slot(wpt), &text);
                }
            }
            Event::CData(c) => {
                if let (Some(wpt), Some(f)) = (current.as_mut(), field) {
                    let bytes = c.into_inner();
                    append_text(f.slot(wpt), &String::from_utf8_lossy(&bytes));
                }
            }
            Event::End(_) => {
                if current.is_some() && depth == wpt_depth {
                    if let Some(wpt) = current.take() {
                        waypoints.push(wpt);
                    }
                }
                if depth == wpt_depth + 1 {
                    field = None;
                }
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(waypoints)
}

fn append_text(slot: &mut Option<String>, text: &str) {
    match slot {
        Some(existing) => existing.push_str(text),
        None => *slot = Some(text.to_string()),
    }
}

fn start_waypoint(e: &BytesStart<'_>, path: &Path) -> Result<RawWaypoint> {
    let lat = coordinate_attr(e, b"lat", "lat", path)?;
    let lon = coordinate_attr(e, b"lon", "lon", path)?;

    if !crate::GpsPoint::new(lat, lon).is_valid() {
        return Err(Error::OutOfRange { path: path.to_path_buf(), lat, lon });
    }

    Ok(RawWaypoint { lat, lon, ..Default::default() })
}

fn coordinate_attr(e: &BytesStart<'_>, key: &[u8], attribute: &'static str, path: &Path) -> Result<f64> {
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(|err| Error::xml(path, err))?;
        if attr.key.local_name().as_ref() == key {
            let value = attr.unescape_value().map_err(|err| Error::xml(path, err))?;
            return value.trim().parse::<f64>().map_err(|_| Error::InvalidCoordinate {
                path: path.to_path_buf(),
                value: value.to_string(),
            });
        }
    }
    Err(Error::MissingAttribute { path: path.to_path_buf(), attribute })
}

// ============================================================================
// Writing
// ============================================================================

/// Document-level `<metadata>` content.
#[derive(Debug, Clone)]
pub struct GpxMetadata {
    pub name: String,
    pub description: String,
    pub time: DateTime<Utc>,
}

impl GpxMetadata {
    /// Metadata for a deduplicated region file, stamped with the current time.
    pub fn for_region(region_label: &str, radius_m: f64) -> Self {
        Self {
            name: format!("{region_label} Fishing Points"),
            description: format!("Deduplicated fishing points ({radius_m}m radius)"),
            time: Utc::now(),
        }
    }
}

/// Write waypoints to a GPX file, replacing any existing file.
pub fn write_file(path: &Path, waypoints: &[Waypoint], metadata: &GpxMetadata) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut out = BufWriter::new(file);
    write_waypoints(&mut out, waypoints, metadata).map_err(|e| Error::xml(path, e))?;
    out.flush().map_err(|e| Error::io(path, e))
}

/// Serialize waypoints as a GPX 1.1 document.
///
/// Each `<wpt>` carries the short name (or the display label when naming has
/// not run), the original label as `<desc>`, the original comment as `<cmt>`,
/// and the symbol.
pub fn write_waypoints<W: Write>(
    out: W,
    waypoints: &[Waypoint],
    metadata: &GpxMetadata,
) -> std::result::Result<(), quick_xml::Error> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("gpx");
    root.push_attribute(("version", "1.1"));
    root.push_attribute(("creator", CREATOR));
    root.push_attribute(("xmlns", GPX_NAMESPACE));
    writer.write_event(Event::Start(root))?;

    writer.write_event(Event::Start(BytesStart::new("metadata")))?;
    write_text_element(&mut writer, "name", &metadata.name)?;
    write_text_element(&mut writer, "desc", &metadata.description)?;
    let time = metadata.time.to_rfc3339_opts(SecondsFormat::Secs, true);
    write_text_element(&mut writer, "time", &time)?;
    writer.write_event(Event::End(BytesEnd::new("metadata")))?;

    for wpt in waypoints {
        let lat = format!("{:.9}", wpt.latitude());
        let lon = format!("{:.9}", wpt.longitude());
        let mut start = BytesStart::new("wpt");
        start.push_attribute(("lat", lat.as_str()));
        start.push_attribute(("lon", lon.as_str()));
        writer.write_event(Event::Start(start))?;

        let name = wpt.short_name.as_deref().unwrap_or_else(|| wpt.display_label());
        write_text_element(&mut writer, "name", name)?;

        let original = if wpt.name.is_empty() { &wpt.description } else { &wpt.name };
        if !original.is_empty() {
            write_text_element(&mut writer, "desc", original)?;
        }
        if !wpt.comment.is_empty() {
            write_text_element(&mut writer, "cmt", &wpt.comment)?;
        }
        write_text_element(&mut writer, "sym", &wpt.symbol)?;

        writer.write_event(Event::End(BytesEnd::new("wpt")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("gpx")))?;
    Ok(())
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> std::result::Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
