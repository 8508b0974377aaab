//! Cell type metadata for unstructured topology.

use std::fmt;

/// Linear cell types, numbered with their on-disk type codes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CellType {
    /// Placeholder for a deleted or missing cell.
    Empty,
    /// 0D vertex.
    Vertex,
    /// Set of unconnected vertices.
    PolyVertex,
    /// 1D segment.
    Line,
    /// Connected chain of segments.
    PolyLine,
    Triangle,
    /// Strip of triangles sharing edges.
    TriangleStrip,
    /// Planar polygon with any number of points.
    Polygon,
    /// Axis-aligned quad.
    Pixel,
    Quad,
    /// 3D simplex.
    Tetra,
    /// Axis-aligned hexahedron.
    Voxel,
    Hexahedron,
    /// 3D prism.
    Wedge,
    Pyramid,
}

impl Default for CellType {
    fn default() -> Self {
        CellType::Empty
    }
}

impl CellType {
    /// Topological dimension of the cell.
    pub fn dimension(self) -> u8 {
        match self {
            CellType::Empty | CellType::Vertex | CellType::PolyVertex => 0,
            CellType::Line | CellType::PolyLine => 1,
            CellType::Triangle
            | CellType::TriangleStrip
            | CellType::Polygon
            | CellType::Pixel
            | CellType::Quad => 2,
            CellType::Tetra
            | CellType::Voxel
            | CellType::Hexahedron
            | CellType::Wedge
            | CellType::Pyramid => 3,
        }
    }

    /// Numeric type code.
    pub fn code(self) -> u8 {
        match self {
            CellType::Empty => 0,
            CellType::Vertex => 1,
            CellType::PolyVertex => 2,
            CellType::Line => 3,
            CellType::PolyLine => 4,
            CellType::Triangle => 5,
            CellType::TriangleStrip => 6,
            CellType::Polygon => 7,
            CellType::Pixel => 8,
            CellType::Quad => 9,
            CellType::Tetra => 10,
            CellType::Voxel => 11,
            CellType::Hexahedron => 12,
            CellType::Wedge => 13,
            CellType::Pyramid => 14,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => CellType::Empty,
            1 => CellType::Vertex,
            2 => CellType::PolyVertex,
            3 => CellType::Line,
            4 => CellType::PolyLine,
            5 => CellType::Triangle,
            6 => CellType::TriangleStrip,
            7 => CellType::Polygon,
            8 => CellType::Pixel,
            9 => CellType::Quad,
            10 => CellType::Tetra,
            11 => CellType::Voxel,
            12 => CellType::Hexahedron,
            13 => CellType::Wedge,
            14 => CellType::Pyramid,
            _ => return None,
        })
    }

    /// Point count of fixed-size cells; `None` for variable-size cells.
    pub fn point_count(self) -> Option<usize> {
        match self {
            CellType::Empty => Some(0),
            CellType::Vertex => Some(1),
            CellType::Line => Some(2),
            CellType::Triangle => Some(3),
            CellType::Pixel | CellType::Quad | CellType::Tetra => Some(4),
            CellType::Pyramid => Some(5),
            CellType::Wedge => Some(6),
            CellType::Voxel | CellType::Hexahedron => Some(8),
            CellType::PolyVertex
            | CellType::PolyLine
            | CellType::TriangleStrip
            | CellType::Polygon => None,
        }
    }

    /// Smallest legal point count.
    pub fn min_points(self) -> usize {
        match self {
            CellType::PolyVertex => 1,
            CellType::PolyLine => 2,
            CellType::TriangleStrip | CellType::Polygon => 3,
            fixed => fixed.point_count().unwrap_or(0),
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 0..=14 {
            let ty = CellType::from_code(code).unwrap();
            assert_eq!(ty.code(), code);
        }
        assert_eq!(CellType::from_code(15), None);
    }

    #[test]
    fn sizes_and_dimensions() {
        assert_eq!(CellType::Hexahedron.point_count(), Some(8));
        assert_eq!(CellType::Polygon.point_count(), None);
        assert_eq!(CellType::Polygon.min_points(), 3);
        assert_eq!(CellType::Voxel.dimension(), 3);
        assert_eq!(CellType::PolyLine.dimension(), 1);
    }
}
