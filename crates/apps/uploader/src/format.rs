use bytes::Bytes;
use serde_json::Value;

use crate::error::UploadError;
use crate::parse;

/// Every file type the service accepts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UploadFormat {
    Csv,
    /// Zipped shapefile bundle (`.shp` + `.dbf`, optional `.shx`/`.prj`).
    Shapefile,
    Parquet,
    Gpx,
    Kml,
    Tcx,
    Json,
    Excel,
}

const MIME_TABLE: &[(&str, UploadFormat)] = &[
    ("text/csv", UploadFormat::Csv),
    ("application/csv", UploadFormat::Csv),
    ("application/zip", UploadFormat::Shapefile),
    ("application/x-zip-compressed", UploadFormat::Shapefile),
    ("application/vnd.apache.parquet", UploadFormat::Parquet),
    ("application/x-parquet", UploadFormat::Parquet),
    ("application/gpx+xml", UploadFormat::Gpx),
    ("application/vnd.google-earth.kml+xml", UploadFormat::Kml),
    ("application/vnd.garmin.tcx+xml", UploadFormat::Tcx),
    ("application/json", UploadFormat::Json),
    ("application/geo+json", UploadFormat::Json),
    ("application/vnd.ms-excel", UploadFormat::Excel),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        UploadFormat::Excel,
    ),
];

const EXTENSION_TABLE: &[(&str, UploadFormat)] = &[
    ("csv", UploadFormat::Csv),
    ("zip", UploadFormat::Shapefile),
    ("parquet", UploadFormat::Parquet),
    ("gpx", UploadFormat::Gpx),
    ("kml", UploadFormat::Kml),
    ("tcx", UploadFormat::Tcx),
    ("json", UploadFormat::Json),
    ("geojson", UploadFormat::Json),
    ("xls", UploadFormat::Excel),
    ("xlsx", UploadFormat::Excel),
];

/// Content types that say nothing about the payload.
const GENERIC_MIME: &[&str] = &["", "application/octet-stream"];

impl UploadFormat {
    pub fn name(self) -> &'static str {
        match self {
            UploadFormat::Csv => "CSV",
            UploadFormat::Shapefile => "shapefile",
            UploadFormat::Parquet => "Parquet",
            UploadFormat::Gpx => "GPX",
            UploadFormat::Kml => "KML",
            UploadFormat::Tcx => "TCX",
            UploadFormat::Json => "JSON",
            UploadFormat::Excel => "Excel",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime_essence(mime);
        MIME_TABLE
            .iter()
            .find(|(m, _)| *m == essence)
            .map(|(_, f)| *f)
    }

    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        EXTENSION_TABLE
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, f)| *f)
    }

    /// Resolves the format of an upload part.
    ///
    /// The declared content type decides; the file extension is consulted
    /// only when the content type is missing or generic.
    pub fn detect(mime: Option<&str>, file_name: Option<&str>) -> Result<Self, UploadError> {
        let mime = mime.unwrap_or_default();
        if !GENERIC_MIME.contains(&mime_essence(mime).as_str()) {
            return Self::from_mime(mime).ok_or_else(|| UploadError::UnknownMimeType(mime.into()));
        }
        file_name
            .and_then(Self::from_file_name)
            .ok_or_else(|| {
                let shown = if mime.is_empty() { "unknown" } else { mime };
                UploadError::UnknownMimeType(shown.to_string())
            })
    }

    /// Runs the parser for this format. CPU bound; call off the async runtime.
    pub fn parse(self, data: Bytes) -> Result<Value, UploadError> {
        let parsed = match self {
            UploadFormat::Csv => parse::tabular::csv(&data),
            UploadFormat::Shapefile => parse::shp::bundle(&data),
            UploadFormat::Parquet => parse::tabular::parquet(data),
            UploadFormat::Gpx => parse::tracks::gpx(&data),
            UploadFormat::Kml => parse::tracks::kml(&data),
            UploadFormat::Tcx => parse::tracks::tcx(&data),
            UploadFormat::Json => parse::tabular::json(&data),
            UploadFormat::Excel => parse::tabular::excel(data),
        };
        parsed.map_err(|e| UploadError::parse(self, e))
    }
}

fn mime_essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::UploadFormat;
    use crate::error::UploadError;

    #[test]
    fn mime_wins_over_extension() {
        assert_eq!(
            UploadFormat::detect(Some("text/csv; charset=utf-8"), Some("points.json")),
            Ok(UploadFormat::Csv)
        );
        assert_eq!(
            UploadFormat::detect(Some("application/zip"), Some("tracts.zip")),
            Ok(UploadFormat::Shapefile)
        );
    }

    #[test]
    fn generic_mime_falls_back_to_extension() {
        assert_eq!(
            UploadFormat::detect(Some("application/octet-stream"), Some("route.GPX")),
            Ok(UploadFormat::Gpx)
        );
        assert_eq!(
            UploadFormat::detect(None, Some("rows.parquet")),
            Ok(UploadFormat::Parquet)
        );
        assert_eq!(
            UploadFormat::detect(None, Some("book.xlsx")),
            Ok(UploadFormat::Excel)
        );
    }

    #[test]
    fn unknown_types_are_rejected_with_their_mime() {
        let err = UploadFormat::detect(Some("image/png"), Some("map.csv")).unwrap_err();
        assert_eq!(err, UploadError::UnknownMimeType("image/png".into()));
        assert_eq!(err.to_string(), "Unsupported file type: image/png");

        assert_eq!(
            UploadFormat::detect(None, Some("notes.txt")),
            Err(UploadError::UnknownMimeType("unknown".into()))
        );
        assert_eq!(
            UploadFormat::detect(Some("application/octet-stream"), None),
            Err(UploadError::UnknownMimeType(
                "application/octet-stream".into()
            ))
        );
    }
}
