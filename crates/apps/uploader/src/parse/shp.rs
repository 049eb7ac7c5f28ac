//! Zipped shapefile bundles to a GeoJSON FeatureCollection.

use std::io::{Cursor, Read};

use serde_json::{Map, Value, json};
use shapefile::dbase::{self, FieldValue};
use shapefile::{Point, PointM, PointZ, PolygonRing, Shape, ShapeReader};
use tracing::{debug, warn};
use zip::ZipArchive;

use super::float_cell;

#[derive(Default)]
struct Bundle {
    shp: Option<Vec<u8>>,
    shx: Option<Vec<u8>>,
    dbf: Option<Vec<u8>>,
    prj: Option<String>,
}

/// One feature per shape record, carrying its DBF row as `properties`.
///
/// `.shp` and `.dbf` are required; a `.prj` is passed through as `crs`.
pub fn bundle(data: &[u8]) -> Result<Value, String> {
    let bundle = unzip(data)?;
    let shp = bundle.shp.ok_or("archive has no .shp file")?;
    let dbf = bundle.dbf.ok_or("archive has no .dbf file")?;
    if bundle.shx.is_none() {
        debug!("shapefile bundle without .shx, reading records sequentially");
    }

    let shapes = ShapeReader::new(Cursor::new(shp))
        .and_then(|r| r.read())
        .map_err(|e| format!("shp: {e}"))?;

    let mut table = dbase::Reader::new(Cursor::new(dbf)).map_err(|e| format!("dbf: {e}"))?;
    let fields: Vec<String> = table.fields().iter().map(|f| f.name().to_string()).collect();
    let records = table.read().map_err(|e| format!("dbf: {e}"))?;

    if shapes.len() != records.len() {
        return Err(format!(
            "{} shapes but {} attribute rows",
            shapes.len(),
            records.len()
        ));
    }

    let features: Vec<Value> = shapes
        .iter()
        .zip(&records)
        .map(|(shape, record)| {
            let properties: Map<String, Value> = fields
                .iter()
                .map(|name| (name.clone(), record.get(name).map_or(Value::Null, field_value)))
                .collect();
            json!({
                "type": "Feature",
                "geometry": geometry(shape),
                "properties": properties,
            })
        })
        .collect();

    let mut collection = Map::new();
    collection.insert("type".into(), json!("FeatureCollection"));
    collection.insert("features".into(), Value::Array(features));
    if let Some(prj) = bundle.prj {
        collection.insert("crs".into(), Value::String(prj));
    }
    Ok(Value::Object(collection))
}

fn unzip(data: &[u8]) -> Result<Bundle, String> {
    let mut archive = ZipArchive::new(Cursor::new(data)).map_err(|e| format!("zip: {e}"))?;
    let mut bundle = Bundle::default();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| format!("zip: {e}"))?;
        let name = entry.name().to_string();
        if entry.is_dir() || name.starts_with("__MACOSX/") {
            continue;
        }
        let Some((_, ext)) = name.rsplit_once('.') else {
            continue;
        };
        let slot = match ext.to_ascii_lowercase().as_str() {
            "shp" => &mut bundle.shp,
            "shx" => &mut bundle.shx,
            "dbf" => &mut bundle.dbf,
            "prj" => {
                let mut text = String::new();
                entry
                    .read_to_string(&mut text)
                    .map_err(|e| format!("{name}: {e}"))?;
                bundle.prj = Some(text.trim().to_string());
                continue;
            }
            _ => continue,
        };
        if slot.is_some() {
            warn!("archive holds more than one .{ext}, keeping the first");
            continue;
        }
        let mut buf = Vec::new();
        entry
            .read_to_end(&mut buf)
            .map_err(|e| format!("{name}: {e}"))?;
        *slot = Some(buf);
    }
    Ok(bundle)
}

trait Xy {
    fn xy(&self) -> [f64; 2];
}

impl Xy for Point {
    fn xy(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl Xy for PointM {
    fn xy(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl Xy for PointZ {
    fn xy(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

fn geometry(shape: &Shape) -> Value {
    match shape {
        Shape::NullShape => Value::Null,
        Shape::Point(p) => point(p),
        Shape::PointM(p) => point(p),
        Shape::PointZ(p) => point(p),
        Shape::Polyline(l) => lines(l.parts()),
        Shape::PolylineM(l) => lines(l.parts()),
        Shape::PolylineZ(l) => lines(l.parts()),
        Shape::Polygon(p) => polygons(p.rings()),
        Shape::PolygonM(p) => polygons(p.rings()),
        Shape::PolygonZ(p) => polygons(p.rings()),
        Shape::Multipoint(m) => multipoint(m.points()),
        Shape::MultipointM(m) => multipoint(m.points()),
        Shape::MultipointZ(m) => multipoint(m.points()),
        Shape::Multipatch(_) => {
            warn!("multipatch shapes have no GeoJSON form, emitting null geometry");
            Value::Null
        }
    }
}

fn point<P: Xy>(p: &P) -> Value {
    json!({"type": "Point", "coordinates": p.xy()})
}

fn coords<P: Xy>(points: &[P]) -> Vec<[f64; 2]> {
    points.iter().map(Xy::xy).collect()
}

fn lines<P: Xy>(parts: &[Vec<P>]) -> Value {
    match parts {
        [single] => json!({"type": "LineString", "coordinates": coords(single)}),
        _ => json!({
            "type": "MultiLineString",
            "coordinates": parts.iter().map(|p| coords(p)).collect::<Vec<_>>(),
        }),
    }
}

/// Each outer ring opens a polygon; inner rings attach to the last one.
fn polygons<P: Xy>(rings: &[PolygonRing<P>]) -> Value {
    let mut polys: Vec<Vec<Vec<[f64; 2]>>> = Vec::new();
    for ring in rings {
        let ring_coords = coords(ring.points());
        match (ring, polys.last_mut()) {
            (PolygonRing::Inner(_), Some(last)) => last.push(ring_coords),
            _ => polys.push(vec![ring_coords]),
        }
    }
    match polys.as_slice() {
        [single] => json!({"type": "Polygon", "coordinates": single}),
        _ => json!({"type": "MultiPolygon", "coordinates": polys}),
    }
}

fn multipoint<P: Xy>(points: &[P]) -> Value {
    json!({"type": "MultiPoint", "coordinates": coords(points)})
}

fn field_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Character(Some(s)) | FieldValue::Memo(s) => Value::String(s.trim().to_string()),
        FieldValue::Numeric(Some(n)) | FieldValue::Currency(n) | FieldValue::Double(n) => {
            float_cell(*n)
        }
        FieldValue::Float(Some(n)) => float_cell(f64::from(*n)),
        FieldValue::Integer(i) => Value::from(*i),
        FieldValue::Logical(Some(b)) => Value::Bool(*b),
        FieldValue::Date(Some(d)) => {
            Value::String(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day()))
        }
        FieldValue::Character(None)
        | FieldValue::Numeric(None)
        | FieldValue::Float(None)
        | FieldValue::Logical(None)
        | FieldValue::Date(None) => Value::Null,
        other => Value::String(format!("{other:?}")),
    }
}
