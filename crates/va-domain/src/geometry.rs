//! Geometría de las cajas de detección.
//!
//! Un `BoundingPolygon` es un polígono plano (SRID 0, sin sistema de
//! referencia) formado por un anillo exterior y anillos interiores opcionales.
//! Con PostGIS se intercambia en WKB (`ST_GeomFromWKB` / `ST_AsBinary`), que
//! conserva cada `f64` bit a bit. El WKT queda para serde, logs y SQL escrito
//! a mano.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DomainError;

/// Identificador de referencia espacial de la columna `bbox`.
pub const BBOX_SRID: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Polígono cerrado y validado. Se serializa como su texto WKT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoundingPolygon {
    exterior: Vec<Point>,
    interiors: Vec<Vec<Point>>,
}

impl BoundingPolygon {
    /// Construye un polígono a partir de su anillo exterior. El anillo se
    /// cierra automáticamente si el último punto no repite al primero.
    pub fn new(exterior: Vec<Point>) -> Result<Self, DomainError> {
        Self::with_holes(exterior, Vec::new())
    }

    pub fn with_holes(exterior: Vec<Point>, interiors: Vec<Vec<Point>>) -> Result<Self, DomainError> {
        let exterior = close_ring(exterior)?;
        let interiors = interiors.into_iter().map(close_ring).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { exterior, interiors })
    }

    /// Caja alineada a los ejes, la forma habitual que emite un detector.
    pub fn rectangle(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<Self, DomainError> {
        if !(x_min < x_max && y_min < y_max) {
            return Err(DomainError::ValidationError(format!(
                "degenerate rectangle ({x_min}, {y_min}) - ({x_max}, {y_max})"
            )));
        }
        Self::new(vec![Point::new(x_min, y_min),
                       Point::new(x_max, y_min),
                       Point::new(x_max, y_max),
                       Point::new(x_min, y_max)])
    }

    pub fn exterior(&self) -> &[Point] { &self.exterior }
    pub fn interiors(&self) -> &[Vec<Point>] { &self.interiors }

    /// Envolvente (x_min, y_min, x_max, y_max) del anillo exterior.
    pub fn envelope(&self) -> (f64, f64, f64, f64) {
        self.exterior.iter().fold((f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
                                  |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)))
    }

    pub fn to_wkt(&self) -> String {
        let mut out = String::from("POLYGON(");
        for (i, ring) in std::iter::once(&self.exterior).chain(self.interiors.iter()).enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push('(');
            let coords: Vec<String> = ring.iter().map(|p| format!("{} {}", p.x, p.y)).collect();
            out.push_str(&coords.join(","));
            out.push(')');
        }
        out.push(')');
        out
    }

    /// Interpreta el texto WKT de un `POLYGON` 2D tal como lo devuelve
    /// `ST_AsText`.
    pub fn from_wkt(wkt: &str) -> Result<Self, DomainError> {
        let trimmed = wkt.trim();
        let tag_len = "POLYGON".len();
        if !trimmed.get(..tag_len).is_some_and(|tag| tag.eq_ignore_ascii_case("POLYGON")) {
            return Err(DomainError::InvalidWkt(format!("expected POLYGON, got '{trimmed}'")));
        }
        let body = trimmed[tag_len..].trim();
        if body.eq_ignore_ascii_case("EMPTY") {
            return Err(DomainError::InvalidWkt("empty polygon".into()));
        }
        let inner = body.strip_prefix('(')
                        .and_then(|b| b.strip_suffix(')'))
                        .ok_or_else(|| DomainError::InvalidWkt(format!("unbalanced parentheses in '{body}'")))?;
        let mut rings = split_rings(inner)?.into_iter().map(parse_ring).collect::<Result<Vec<_>, _>>()?;
        let exterior = rings.remove(0);
        Self::with_holes(exterior, rings)
    }
}

/// Tipo `Polygon` en WKB (OGC/ISO, 2D).
const WKB_POLYGON: u32 = 3;
/// Bit de EWKB que indica un SRID embebido tras el tipo.
const EWKB_SRID_FLAG: u32 = 0x2000_0000;
const EWKB_Z_FLAG: u32 = 0x8000_0000;
const EWKB_M_FLAG: u32 = 0x4000_0000;

impl BoundingPolygon {
    /// WKB little-endian del polígono.
    pub fn to_wkb(&self) -> Vec<u8> {
        let rings: Vec<&Vec<Point>> = std::iter::once(&self.exterior).chain(self.interiors.iter()).collect();
        let points: usize = rings.iter().map(|r| r.len()).sum();
        let mut out = Vec::with_capacity(9 + 4 * rings.len() + 16 * points);
        out.push(1u8);
        out.extend_from_slice(&WKB_POLYGON.to_le_bytes());
        out.extend_from_slice(&(rings.len() as u32).to_le_bytes());
        for ring in rings {
            out.extend_from_slice(&(ring.len() as u32).to_le_bytes());
            for p in ring {
                out.extend_from_slice(&p.x.to_le_bytes());
                out.extend_from_slice(&p.y.to_le_bytes());
            }
        }
        out
    }

    /// Lee un `POLYGON` 2D en WKB (cualquier orden de bytes) tal como lo
    /// devuelve `ST_AsBinary`. Acepta también EWKB con SRID embebido.
    pub fn from_wkb(bytes: &[u8]) -> Result<Self, DomainError> {
        let mut reader = WkbReader::new(bytes)?;
        let raw_type = reader.u32()?;
        if raw_type & (EWKB_Z_FLAG | EWKB_M_FLAG) != 0 {
            return Err(DomainError::InvalidWkb("only 2D polygons are supported".into()));
        }
        if raw_type & EWKB_SRID_FLAG != 0 {
            reader.u32()?;
        }
        let geometry_type = raw_type & !EWKB_SRID_FLAG;
        if geometry_type != WKB_POLYGON {
            return Err(DomainError::InvalidWkb(format!("expected POLYGON (type 3), got type {geometry_type}")));
        }
        let ring_count = reader.u32()?;
        if ring_count == 0 {
            return Err(DomainError::InvalidWkb("empty polygon".into()));
        }
        let mut rings = Vec::new();
        for _ in 0..ring_count {
            let point_count = reader.u32()?;
            let mut ring = Vec::new();
            for _ in 0..point_count {
                let x = reader.f64()?;
                let y = reader.f64()?;
                ring.push(Point::new(x, y));
            }
            rings.push(ring);
        }
        if !reader.is_exhausted() {
            return Err(DomainError::InvalidWkb("trailing bytes after polygon".into()));
        }
        let exterior = rings.remove(0);
        Self::with_holes(exterior, rings)
    }
}

struct WkbReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    little_endian: bool,
}

impl<'a> WkbReader<'a> {
    fn new(bytes: &'a [u8]) -> Result<Self, DomainError> {
        let little_endian = match bytes.first() {
            Some(0) => false,
            Some(1) => true,
            Some(other) => return Err(DomainError::InvalidWkb(format!("unknown byte order {other}"))),
            None => return Err(DomainError::InvalidWkb("empty input".into())),
        };
        Ok(Self { bytes, pos: 1, little_endian })
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DomainError> {
        let chunk = self.bytes
                        .get(self.pos..self.pos + N)
                        .ok_or_else(|| DomainError::InvalidWkb(format!("truncated at byte {}", self.pos)))?;
        self.pos += N;
        let mut buf = [0u8; N];
        buf.copy_from_slice(chunk);
        Ok(buf)
    }

    fn u32(&mut self) -> Result<u32, DomainError> {
        let buf = self.take::<4>()?;
        Ok(if self.little_endian { u32::from_le_bytes(buf) } else { u32::from_be_bytes(buf) })
    }

    fn f64(&mut self) -> Result<f64, DomainError> {
        let buf = self.take::<8>()?;
        Ok(if self.little_endian { f64::from_le_bytes(buf) } else { f64::from_be_bytes(buf) })
    }

    fn is_exhausted(&self) -> bool {
        self.pos == self.bytes.len()
    }
}

impl fmt::Display for BoundingPolygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wkt())
    }
}

impl TryFrom<String> for BoundingPolygon {
    type Error = DomainError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_wkt(&value)
    }
}

impl From<BoundingPolygon> for String {
    fn from(value: BoundingPolygon) -> Self {
        value.to_wkt()
    }
}

fn close_ring(mut ring: Vec<Point>) -> Result<Vec<Point>, DomainError> {
    if ring.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(DomainError::ValidationError("ring contains non-finite coordinates".into()));
    }
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }
    let mut distinct: Vec<Point> = Vec::new();
    for p in &ring {
        if !distinct.contains(p) {
            distinct.push(*p);
        }
    }
    if ring.len() < 4 || distinct.len() < 3 {
        return Err(DomainError::ValidationError(format!(
            "ring needs at least 3 distinct vertices, got {}", distinct.len()
        )));
    }
    Ok(ring)
}

fn split_rings(body: &str) -> Result<Vec<&str>, DomainError> {
    let mut rings = Vec::new();
    let mut rest = body.trim();
    loop {
        let open = rest.strip_prefix('(')
                       .ok_or_else(|| DomainError::InvalidWkt(format!("expected '(' at '{rest}'")))?;
        let close = open.find(')')
                        .ok_or_else(|| DomainError::InvalidWkt(format!("missing ')' in '{open}'")))?;
        rings.push(&open[..close]);
        rest = open[close + 1..].trim_start();
        if rest.is_empty() {
            break;
        }
        rest = rest.strip_prefix(',')
                   .ok_or_else(|| DomainError::InvalidWkt(format!("expected ',' between rings at '{rest}'")))?
                   .trim_start();
    }
    Ok(rings)
}

fn parse_ring(ring: &str) -> Result<Vec<Point>, DomainError> {
    ring.split(',')
        .map(|pair| {
            let coords: Vec<&str> = pair.split_whitespace().collect();
            match coords.as_slice() {
                [x, y] => {
                    let x = x.parse::<f64>().map_err(|e| DomainError::InvalidWkt(format!("x '{x}': {e}")))?;
                    let y = y.parse::<f64>().map_err(|e| DomainError::InvalidWkt(format!("y '{y}': {e}")))?;
                    Ok(Point::new(x, y))
                }
                _ => Err(DomainError::InvalidWkt(format!("expected 2D coordinate, got '{}'", pair.trim()))),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_renders_closed_ring() {
        let b = BoundingPolygon::rectangle(0.0, 0.0, 10.0, 5.5).unwrap();
        assert_eq!(b.to_wkt(), "POLYGON((0 0,10 0,10 5.5,0 5.5,0 0))");
        assert_eq!(b.exterior().len(), 5);
        assert_eq!(b.envelope(), (0.0, 0.0, 10.0, 5.5));
    }

    #[test]
    fn rectangle_rejects_degenerate_box() {
        assert!(BoundingPolygon::rectangle(5.0, 0.0, 5.0, 3.0).is_err());
        assert!(BoundingPolygon::rectangle(0.0, 4.0, 3.0, 1.0).is_err());
    }

    #[test]
    fn parses_postgis_output_with_holes() {
        let wkt = "POLYGON((0 0,20 0,20 20,0 20,0 0),(5 5,6 5,6 6,5 5))";
        let b = BoundingPolygon::from_wkt(wkt).unwrap();
        assert_eq!(b.interiors().len(), 1);
        assert_eq!(b.to_wkt(), wkt);
    }

    #[test]
    fn parses_loose_whitespace_and_lowercase_tag() {
        let b = BoundingPolygon::from_wkt("  polygon ( ( 1 1 , 4 1 , 4 3 , 1 1 ) ) ").unwrap();
        assert_eq!(b.exterior()[1], Point::new(4.0, 1.0));
    }

    #[test]
    fn rejects_other_geometries_and_empty() {
        assert!(matches!(BoundingPolygon::from_wkt("POINT(1 2)"), Err(DomainError::InvalidWkt(_))));
        assert!(matches!(BoundingPolygon::from_wkt("POLYGON EMPTY"), Err(DomainError::InvalidWkt(_))));
        assert!(matches!(BoundingPolygon::from_wkt("POLYGON((0 0 1,1 0 1,1 1 1,0 0 1))"), Err(DomainError::InvalidWkt(_))));
        assert!(BoundingPolygon::from_wkt("POLYGON((0 0,1 1").is_err());
    }

    fn unrounded() -> BoundingPolygon {
        let third = 1.0 / 3.0;
        BoundingPolygon::new(vec![Point::new(0.1 + 0.2, third),
                                  Point::new(0.7 + 0.1, third),
                                  Point::new(0.7 + 0.1, 2.0 / 3.0),
                                  Point::new(0.1 + 0.2, 2.0 / 3.0)]).unwrap()
    }

    #[test]
    fn wkb_keeps_every_bit_of_the_coordinates() {
        let b = unrounded();
        let back = BoundingPolygon::from_wkb(&b.to_wkb()).unwrap();
        assert_eq!(back, b);
        assert_eq!(back.exterior()[0].x.to_bits(), (0.1f64 + 0.2).to_bits());
        // el WKT también es exacto porque `{}` escribe el f64 más corto que lo reproduce
        assert_eq!(BoundingPolygon::from_wkt(&b.to_wkt()).unwrap(), b);
    }

    #[test]
    fn reads_big_endian_and_ewkb_with_srid() {
        let b = BoundingPolygon::rectangle(0.0, 0.0, 1.5, 2.5).unwrap();
        let mut xdr = vec![0u8];
        xdr.extend_from_slice(&(WKB_POLYGON | EWKB_SRID_FLAG).to_be_bytes());
        xdr.extend_from_slice(&0u32.to_be_bytes());
        xdr.extend_from_slice(&1u32.to_be_bytes());
        xdr.extend_from_slice(&5u32.to_be_bytes());
        for p in b.exterior() {
            xdr.extend_from_slice(&p.x.to_be_bytes());
            xdr.extend_from_slice(&p.y.to_be_bytes());
        }
        assert_eq!(BoundingPolygon::from_wkb(&xdr).unwrap(), b);
    }

    #[test]
    fn rejects_malformed_wkb() {
        let wkb = unrounded().to_wkb();
        assert!(matches!(BoundingPolygon::from_wkb(&[]), Err(DomainError::InvalidWkb(_))));
        assert!(matches!(BoundingPolygon::from_wkb(&wkb[..wkb.len() - 3]), Err(DomainError::InvalidWkb(_))));
        let mut point = vec![1u8];
        point.extend_from_slice(&1u32.to_le_bytes());
        point.extend_from_slice(&1.0f64.to_le_bytes());
        point.extend_from_slice(&2.0f64.to_le_bytes());
        assert!(matches!(BoundingPolygon::from_wkb(&point), Err(DomainError::InvalidWkb(_))));
        let mut trailing = wkb.clone();
        trailing.push(0);
        assert!(matches!(BoundingPolygon::from_wkb(&trailing), Err(DomainError::InvalidWkb(_))));
        let mut bad_order = wkb;
        bad_order[0] = 7;
        assert!(BoundingPolygon::from_wkb(&bad_order).is_err());
    }

    #[test]
    fn rejects_collapsed_ring() {
        let err = BoundingPolygon::new(vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)]).unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
        assert!(BoundingPolygon::new(vec![Point::new(f64::NAN, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)]).is_err());
    }
}
