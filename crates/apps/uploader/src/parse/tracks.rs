//! GPS exchange formats (GPX, KML, TCX) to GeoJSON.

use roxmltree::{Document, Node};
use serde_json::{Map, Value, json};

type Position = [f64; 2];

/// Waypoints become points; every track segment and route becomes a line.
pub fn gpx(data: &[u8]) -> Result<Value, String> {
    let text = utf8(data)?;
    let doc = Document::parse(text).map_err(|e| e.to_string())?;

    let mut features = Vec::new();
    for node in doc.descendants().filter(Node::is_element) {
        match node.tag_name().name() {
            "wpt" => {
                if let Some(pos) = lat_lon_attrs(node) {
                    let mut props = name_property(node);
                    if let Some(ele) = child_number(node, "ele") {
                        props.insert("ele".into(), json!(ele));
                    }
                    features.push(feature(point(pos), props));
                }
            }
            "trkseg" => {
                let coords = positions(node, "trkpt", lat_lon_attrs);
                // Segments carry no name; use the enclosing track's.
                let props = node.parent().map(name_property).unwrap_or_default();
                push_line(&mut features, coords, props);
            }
            "rte" => {
                let coords = positions(node, "rtept", lat_lon_attrs);
                push_line(&mut features, coords, name_property(node));
            }
            _ => {}
        }
    }
    Ok(collection(features))
}

/// Placemarks with a `Point`, `LineString` or `Polygon` geometry.
pub fn kml(data: &[u8]) -> Result<Value, String> {
    let text = utf8(data)?;
    let doc = Document::parse(text).map_err(|e| e.to_string())?;

    let mut features = Vec::new();
    for placemark in doc
        .descendants()
        .filter(|n| n.has_tag_name_local("Placemark"))
    {
        let props = name_property(placemark);
        for geom in placemark.descendants().filter(Node::is_element) {
            let geometry = match geom.tag_name().name() {
                "Point" => kml_coordinates(geom)
                    .and_then(|c| c.first().copied())
                    .map(point),
                "LineString" => kml_coordinates(geom)
                    .filter(|c| c.len() >= 2)
                    .map(|c| json!({"type": "LineString", "coordinates": c})),
                "Polygon" => kml_polygon(geom),
                _ => None,
            };
            if let Some(geometry) = geometry {
                features.push(feature(geometry, props.clone()));
            }
        }
    }
    Ok(collection(features))
}

/// One line per `Track`; trackpoints without a position are skipped.
pub fn tcx(data: &[u8]) -> Result<Value, String> {
    let text = utf8(data)?;
    let doc = Document::parse(text).map_err(|e| e.to_string())?;

    let mut features = Vec::new();
    for track in doc.descendants().filter(|n| n.has_tag_name_local("Track")) {
        let coords = positions(track, "Trackpoint", |tp| {
            let position = tp.children().find(|n| n.has_tag_name_local("Position"))?;
            let lat = child_number(position, "LatitudeDegrees")?;
            let lon = child_number(position, "LongitudeDegrees")?;
            Some([lon, lat])
        });
        let mut props = Map::new();
        if let Some(activity) = track
            .ancestors()
            .find(|n| n.has_tag_name_local("Activity"))
        {
            if let Some(sport) = activity.attribute("Sport") {
                props.insert("sport".into(), json!(sport));
            }
            if let Some(id) = child_text(activity, "Id") {
                props.insert("id".into(), json!(id));
            }
        }
        push_line(&mut features, coords, props);
    }
    Ok(collection(features))
}

trait LocalName {
    fn has_tag_name_local(&self, name: &str) -> bool;
}

impl LocalName for Node<'_, '_> {
    fn has_tag_name_local(&self, name: &str) -> bool {
        self.is_element() && self.tag_name().name() == name
    }
}

fn utf8(data: &[u8]) -> Result<&str, String> {
    std::str::from_utf8(data).map_err(|e| format!("not UTF-8: {e}"))
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.has_tag_name_local(name))?
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn child_number(node: Node<'_, '_>, name: &str) -> Option<f64> {
    child_text(node, name)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn name_property(node: Node<'_, '_>) -> Map<String, Value> {
    let mut props = Map::new();
    if let Some(name) = child_text(node, "name") {
        props.insert("name".into(), json!(name));
    }
    props
}

fn lat_lon_attrs(node: Node<'_, '_>) -> Option<Position> {
    let lat = node.attribute("lat")?.trim().parse::<f64>().ok()?;
    let lon = node.attribute("lon")?.trim().parse::<f64>().ok()?;
    (lat.is_finite() && lon.is_finite()).then_some([lon, lat])
}

fn positions(
    parent: Node<'_, '_>,
    tag: &str,
    read: impl Fn(Node<'_, '_>) -> Option<Position>,
) -> Vec<Position> {
    parent
        .descendants()
        .filter(|n| n.has_tag_name_local(tag))
        .filter_map(read)
        .collect()
}

/// KML `lon,lat[,alt]` tuples separated by whitespace.
fn kml_coordinates(geom: Node<'_, '_>) -> Option<Vec<Position>> {
    let text = geom
        .descendants()
        .find(|n| n.has_tag_name_local("coordinates"))?
        .text()?;
    let coords: Vec<Position> = text
        .split_whitespace()
        .filter_map(|tuple| {
            let mut parts = tuple.split(',').map(|p| p.trim().parse::<f64>());
            let lon = parts.next()?.ok()?;
            let lat = parts.next()?.ok()?;
            (lon.is_finite() && lat.is_finite()).then_some([lon, lat])
        })
        .collect();
    (!coords.is_empty()).then_some(coords)
}

fn kml_polygon(geom: Node<'_, '_>) -> Option<Value> {
    let rings_of = |boundary: &str| -> Vec<Vec<Position>> {
        geom.children()
            .filter(|n| n.has_tag_name_local(boundary))
            .filter_map(kml_coordinates)
            .collect()
    };
    let mut rings = rings_of("outerBoundaryIs");
    if rings.is_empty() {
        return None;
    }
    rings.truncate(1);
    rings.extend(rings_of("innerBoundaryIs"));
    Some(json!({"type": "Polygon", "coordinates": rings}))
}

fn point(pos: Position) -> Value {
    json!({"type": "Point", "coordinates": pos})
}

fn push_line(features: &mut Vec<Value>, coords: Vec<Position>, props: Map<String, Value>) {
    match coords.len() {
        0 => {}
        1 => features.push(feature(point(coords[0]), props)),
        _ => features.push(feature(
            json!({"type": "LineString", "coordinates": coords}),
            props,
        )),
    }
}

fn feature(geometry: Value, properties: Map<String, Value>) -> Value {
    json!({"type": "Feature", "geometry": geometry, "properties": properties})
}

fn collection(features: Vec<Value>) -> Value {
    json!({"type": "FeatureCollection", "features": features})
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{gpx, kml, tcx};

    #[test]
    fn gpx_waypoints_and_tracks() {
        let doc = br#"<?xml version="1.0"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <wpt lat="37.77" lon="-122.42"><ele>16</ele><name>Ferry Building</name></wpt>
  <trk><name>Embarcadero</name>
    <trkseg>
      <trkpt lat="37.79" lon="-122.39"/>
      <trkpt lat="37.80" lon="-122.40"/>
    </trkseg>
  </trk>
</gpx>"#;
        assert_eq!(
            gpx(doc).unwrap(),
            json!({
                "type": "FeatureCollection",
                "features": [
                    {
                        "type": "Feature",
                        "geometry": {"type": "Point", "coordinates": [-122.42, 37.77]},
                        "properties": {"name": "Ferry Building", "ele": 16.0},
                    },
                    {
                        "type": "Feature",
                        "geometry": {
                            "type": "LineString",
                            "coordinates": [[-122.39, 37.79], [-122.40, 37.80]],
                        },
                        "properties": {"name": "Embarcadero"},
                    },
                ],
            })
        );
    }

    #[test]
    fn kml_placemarks() {
        let doc = br#"<kml xmlns="http://www.opengis.net/kml/2.2"><Document>
  <Placemark><name>Office</name><Point><coordinates>-87.63,41.88,0</coordinates></Point></Placemark>
  <Placemark><name>Block</name><Polygon><outerBoundaryIs><LinearRing>
    <coordinates>0,0 1,0 1,1 0,0</coordinates>
  </LinearRing></outerBoundaryIs></Polygon></Placemark>
</Document></kml>"#;
        let fc = kml(doc).unwrap();
        let features = fc["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(
            features[0]["geometry"],
            json!({"type": "Point", "coordinates": [-87.63, 41.88]})
        );
        assert_eq!(features[0]["properties"]["name"], json!("Office"));
        assert_eq!(features[1]["geometry"]["type"], json!("Polygon"));
        assert_eq!(
            features[1]["geometry"]["coordinates"][0].as_array().unwrap().len(),
            4
        );
    }

    #[test]
    fn tcx_track_becomes_line() {
        let doc = br#"<TrainingCenterDatabase xmlns="http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2">
<Activities><Activity Sport="Running"><Id>2024-05-01T07:00:00Z</Id><Lap><Track>
  <Trackpoint><Position><LatitudeDegrees>40.0</LatitudeDegrees><LongitudeDegrees>-75.0</LongitudeDegrees></Position></Trackpoint>
  <Trackpoint><Time>2024-05-01T07:00:05Z</Time></Trackpoint>
  <Trackpoint><Position><LatitudeDegrees>40.1</LatitudeDegrees><LongitudeDegrees>-75.1</LongitudeDegrees></Position></Trackpoint>
</Track></Lap></Activity></Activities></TrainingCenterDatabase>"#;
        let fc = tcx(doc).unwrap();
        assert_eq!(
            fc["features"][0],
            json!({
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[-75.0, 40.0], [-75.1, 40.1]]},
                "properties": {"sport": "Running", "id": "2024-05-01T07:00:00Z"},
            })
        );
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(gpx(b"<gpx><wpt></gpx>").is_err());
        assert!(kml(&[0xff, 0xfe]).is_err());
    }
}
