//! Getypeerde waarden die tussen de componenten en de host worden
//! uitgewisseld.

use core::fmt;

use crate::geom::{CurveGeometry, GeomMesh, NurbsSurface, Plane, Point3};
use crate::rfem::RfObject;

/// Beschikbare waardetypes van de engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Een geheel getal, bijvoorbeeld een RFEM-objectnummer.
    Integer(i64),
    /// Een enkele numerieke waarde.
    Number(f64),
    /// Tekst, zoals het paneellabel van een RFEM-object.
    Text(String),
    /// Een 3D-punt.
    Point(Point3),
    /// Een georiënteerd vlak.
    Plane(Plane),
    /// Een curve (lijn, polylijn, boog of NURBS).
    Curve(CurveGeometry),
    /// Een oppervlak.
    Surface(SurfaceValue),
    /// Een driehoeksmesh.
    Mesh(GeomMesh),
    /// Een RFEM-record.
    Rfem(RfObject),
    /// Een lijst van waarden.
    List(Vec<Value>),
}

/// Oppervlakrepresentaties die de conversie kan opleveren.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceValue {
    /// Een NURBS-oppervlak.
    Nurbs(NurbsSurface),
    /// Een vlak oppervlak, beschreven door zijn randcurves. De eerste lus is
    /// de buitenrand, de overige zijn openingen.
    Boundary(Vec<CurveGeometry>),
}

impl Value {
    /// Geeft de variantnaam terug. Wordt gebruikt in foutmeldingen.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Integer(_) => ValueKind::Integer,
            Self::Number(_) => ValueKind::Number,
            Self::Text(_) => ValueKind::Text,
            Self::Point(_) => ValueKind::Point,
            Self::Plane(_) => ValueKind::Plane,
            Self::Curve(_) => ValueKind::Curve,
            Self::Surface(_) => ValueKind::Surface,
            Self::Mesh(_) => ValueKind::Mesh,
            Self::Rfem(_) => ValueKind::Rfem,
            Self::List(_) => ValueKind::List,
        }
    }

    /// Verwacht een `Integer` en retourneert de waarde.
    pub fn expect_integer(&self) -> Result<i64, ValueError> {
        match self {
            Self::Integer(value) => Ok(*value),
            _ => Err(ValueError::type_mismatch("Integer", self.kind())),
        }
    }

    /// Verwacht een `Number`; een `Integer` wordt ook geaccepteerd.
    #[allow(clippy::cast_precision_loss)]
    pub fn expect_number(&self) -> Result<f64, ValueError> {
        match self {
            Self::Number(value) => Ok(*value),
            Self::Integer(value) => Ok(*value as f64),
            _ => Err(ValueError::type_mismatch("Number", self.kind())),
        }
    }

    pub fn expect_point(&self) -> Result<Point3, ValueError> {
        match self {
            Self::Point(point) => Ok(*point),
            _ => Err(ValueError::type_mismatch("Point", self.kind())),
        }
    }

    pub fn expect_plane(&self) -> Result<Plane, ValueError> {
        match self {
            Self::Plane(plane) => Ok(*plane),
            _ => Err(ValueError::type_mismatch("Plane", self.kind())),
        }
    }

    pub fn expect_curve(&self) -> Result<&CurveGeometry, ValueError> {
        match self {
            Self::Curve(curve) => Ok(curve),
            _ => Err(ValueError::type_mismatch("Curve", self.kind())),
        }
    }

    pub fn expect_mesh(&self) -> Result<&GeomMesh, ValueError> {
        match self {
            Self::Mesh(mesh) => Ok(mesh),
            _ => Err(ValueError::type_mismatch("Mesh", self.kind())),
        }
    }

    /// Verwacht een `Rfem`-record.
    pub fn expect_rfem(&self) -> Result<&RfObject, ValueError> {
        match self {
            Self::Rfem(object) => Ok(object),
            _ => Err(ValueError::type_mismatch("Rfem", self.kind())),
        }
    }

    /// Verwacht een `List` en retourneert een slice van de elementen.
    pub fn expect_list(&self) -> Result<&[Value], ValueError> {
        match self {
            Self::List(values) => Ok(values),
            _ => Err(ValueError::type_mismatch("List", self.kind())),
        }
    }
}

/// Beschrijft het type van een [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Number,
    Text,
    Point,
    Plane,
    Curve,
    Surface,
    Mesh,
    Rfem,
    List,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "Integer",
            Self::Number => "Number",
            Self::Text => "Text",
            Self::Point => "Point",
            Self::Plane => "Plane",
            Self::Curve => "Curve",
            Self::Surface => "Surface",
            Self::Mesh => "Mesh",
            Self::Rfem => "Rfem",
            Self::List => "List",
        };
        f.write_str(name)
    }
}

/// Fout die optreedt wanneer een waarde niet het verwachte type heeft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueError {
    expected: &'static str,
    found: ValueKind,
}

impl ValueError {
    #[must_use]
    pub fn type_mismatch(expected: &'static str, found: ValueKind) -> Self {
        Self { expected, found }
    }

    #[must_use]
    pub fn expected(&self) -> &'static str {
        self.expected
    }

    #[must_use]
    pub fn found(&self) -> ValueKind {
        self.found
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "verwachtte type `{}` maar kreeg `{}`",
            self.expected, self.found
        )
    }
}

impl std::error::Error for ValueError {}

/// Gevraagde visuele representatie van een RFEM-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetShape {
    Mesh,
    Surface,
    Curve,
    Point,
    Plane,
    Integer,
}

impl TargetShape {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mesh => "Mesh",
            Self::Surface => "Surface",
            Self::Curve => "Curve",
            Self::Point => "Point",
            Self::Plane => "Plane",
            Self::Integer => "Integer",
        }
    }

    /// Zoekt een doelvorm op naam, hoofdletterongevoelig.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "mesh" => Some(Self::Mesh),
            "surface" | "brep" => Some(Self::Surface),
            "curve" => Some(Self::Curve),
            "point" => Some(Self::Point),
            "plane" => Some(Self::Plane),
            "integer" => Some(Self::Integer),
            _ => None,
        }
    }
}

impl fmt::Display for TargetShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::{TargetShape, Value, ValueKind};
    use crate::geom::{CurveGeometry, GeomMesh, Line3, Plane, Point3};
    use crate::rfem::{RfNode, RfObject};

    #[test]
    fn expect_point_rejects_wrong_type() {
        let err = Value::Integer(4).expect_point().unwrap_err();
        assert_eq!(err.expected(), "Point");
        assert_eq!(err.found(), ValueKind::Integer);
        assert_eq!(err.to_string(), "verwachtte type `Point` maar kreeg `Integer`");
    }

    #[test]
    fn expect_number_accepts_integers() {
        assert_eq!(Value::Integer(3).expect_number(), Ok(3.0));
        assert_eq!(Value::Number(0.25).expect_number(), Ok(0.25));
    }

    #[test]
    fn expect_list_returns_elements() {
        let value = Value::List(vec![Value::Point(Point3::ORIGIN), Value::Integer(1)]);
        let items = value.expect_list().expect("lijst verwacht");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind(), ValueKind::Point);
    }

    #[test]
    fn typed_accessors_return_their_payload() {
        assert_eq!(Value::Integer(12).expect_integer(), Ok(12));
        assert_eq!(Value::Plane(Plane::world_xy()).expect_plane(), Ok(Plane::world_xy()));

        let line = CurveGeometry::Line(Line3::new(Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)));
        assert_eq!(Value::Curve(line.clone()).expect_curve(), Ok(&line));

        let mesh = GeomMesh::new(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], vec![0, 1, 2]);
        let value = Value::Mesh(mesh);
        assert_eq!(value.expect_mesh().map(GeomMesh::triangle_count), Ok(1));

        let node = RfObject::Node(RfNode::new(2, Point3::ORIGIN));
        assert_eq!(Value::Rfem(node.clone()).expect_rfem(), Ok(&node));
        assert!(Value::Number(1.5).expect_integer().is_err());
    }

    #[test]
    fn target_shape_parses_names() {
        assert_eq!(TargetShape::from_name(" Mesh "), Some(TargetShape::Mesh));
        assert_eq!(TargetShape::from_name("brep"), Some(TargetShape::Surface));
        assert_eq!(TargetShape::from_name("vector"), None);
    }
}
