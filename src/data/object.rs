//! The closed set of data object types.

use std::fmt;
use std::str::FromStr;

use crate::data::attributes::{DataSetAttributes, FieldData};
use crate::data::extent::Extent;
use crate::data::ghost;
use crate::data::image::ImageData;
use crate::data::multiblock::MultiBlockDataSet;
use crate::data::points::Bounds;
use crate::data::poly::PolyData;
use crate::data::rectilinear::RectilinearGrid;
use crate::data::structured_grid::StructuredGrid;
use crate::data::table::Table;
use crate::data::unstructured::UnstructuredGrid;
use crate::consistency::Consistent;
use crate::pipeline_error::{PipelineError, PipelineResult};

/// Type tag of a data object, plus the two abstract names usable in
/// input requirements.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum DataObjectType {
    ImageData,
    RectilinearGrid,
    StructuredGrid,
    UnstructuredGrid,
    PolyData,
    Table,
    MultiBlockDataSet,
    /// Any type with points, cells and attributes.
    DataSet,
    /// Any type at all.
    DataObject,
}

impl DataObjectType {
    pub const CONCRETE: [DataObjectType; 7] = [
        DataObjectType::ImageData,
        DataObjectType::RectilinearGrid,
        DataObjectType::StructuredGrid,
        DataObjectType::UnstructuredGrid,
        DataObjectType::PolyData,
        DataObjectType::Table,
        DataObjectType::MultiBlockDataSet,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DataObjectType::ImageData => "ImageData",
            DataObjectType::RectilinearGrid => "RectilinearGrid",
            DataObjectType::StructuredGrid => "StructuredGrid",
            DataObjectType::UnstructuredGrid => "UnstructuredGrid",
            DataObjectType::PolyData => "PolyData",
            DataObjectType::Table => "Table",
            DataObjectType::MultiBlockDataSet => "MultiBlockDataSet",
            DataObjectType::DataSet => "DataSet",
            DataObjectType::DataObject => "DataObject",
        }
    }

    pub fn is_abstract(self) -> bool {
        matches!(self, DataObjectType::DataSet | DataObjectType::DataObject)
    }

    /// Types described by an [`Extent`].
    pub fn is_structured(self) -> bool {
        matches!(
            self,
            DataObjectType::ImageData
                | DataObjectType::RectilinearGrid
                | DataObjectType::StructuredGrid
        )
    }

    /// Whether a value of type `self` satisfies the requirement `required`.
    pub fn is_a(self, required: DataObjectType) -> bool {
        match required {
            DataObjectType::DataObject => true,
            DataObjectType::DataSet => !matches!(
                self,
                DataObjectType::Table
                    | DataObjectType::MultiBlockDataSet
                    | DataObjectType::DataObject
            ),
            concrete => self == concrete,
        }
    }
}

impl fmt::Display for DataObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataObjectType {
    type Err = PipelineError;

    /// Accepts bare names and the `svtk`-prefixed class names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s.strip_prefix("svtk").unwrap_or(s);
        CONCRETE_AND_ABSTRACT
            .into_iter()
            .find(|t| t.name() == bare)
            .ok_or_else(|| PipelineError::UnknownDataType(s.to_owned()))
    }
}

const CONCRETE_AND_ABSTRACT: [DataObjectType; 9] = [
    DataObjectType::ImageData,
    DataObjectType::RectilinearGrid,
    DataObjectType::StructuredGrid,
    DataObjectType::UnstructuredGrid,
    DataObjectType::PolyData,
    DataObjectType::Table,
    DataObjectType::MultiBlockDataSet,
    DataObjectType::DataSet,
    DataObjectType::DataObject,
];

/// A data object of one of the concrete types.
#[derive(Clone, Debug, PartialEq)]
pub enum DataObject {
    ImageData(ImageData),
    RectilinearGrid(RectilinearGrid),
    StructuredGrid(StructuredGrid),
    UnstructuredGrid(UnstructuredGrid),
    PolyData(PolyData),
    Table(Table),
    MultiBlockDataSet(MultiBlockDataSet),
}

macro_rules! for_data_sets {
    (
        $obj:expr,
        $d:ident => $body:expr,
        table $t:pat => $tbody:expr,
        multiblock $m:pat => $mbody:expr
    ) => {
        match $obj {
            DataObject::ImageData($d) => $body,
            DataObject::RectilinearGrid($d) => $body,
            DataObject::StructuredGrid($d) => $body,
            DataObject::UnstructuredGrid($d) => $body,
            DataObject::PolyData($d) => $body,
            DataObject::Table($t) => $tbody,
            DataObject::MultiBlockDataSet($m) => $mbody,
        }
    };
}

macro_rules! for_all {
    ($obj:expr, $d:ident => $body:expr) => {
        for_data_sets!($obj, $d => $body, table $d => $body, multiblock $d => $body)
    };
}

impl DataObject {
    /// Fresh, empty instance of a concrete type.
    pub fn new_instance(ty: DataObjectType) -> PipelineResult<Self> {
        Ok(match ty {
            DataObjectType::ImageData => ImageData::new().into(),
            DataObjectType::RectilinearGrid => RectilinearGrid::new().into(),
            DataObjectType::StructuredGrid => StructuredGrid::new().into(),
            DataObjectType::UnstructuredGrid => UnstructuredGrid::new().into(),
            DataObjectType::PolyData => PolyData::new().into(),
            DataObjectType::Table => Table::new().into(),
            DataObjectType::MultiBlockDataSet => MultiBlockDataSet::new().into(),
            DataObjectType::DataSet | DataObjectType::DataObject => {
                return Err(PipelineError::AbstractDataType(ty));
            }
        })
    }

    pub fn data_type(&self) -> DataObjectType {
        match self {
            DataObject::ImageData(_) => DataObjectType::ImageData,
            DataObject::RectilinearGrid(_) => DataObjectType::RectilinearGrid,
            DataObject::StructuredGrid(_) => DataObjectType::StructuredGrid,
            DataObject::UnstructuredGrid(_) => DataObjectType::UnstructuredGrid,
            DataObject::PolyData(_) => DataObjectType::PolyData,
            DataObject::Table(_) => DataObjectType::Table,
            DataObject::MultiBlockDataSet(_) => DataObjectType::MultiBlockDataSet,
        }
    }

    /// Same type with no points or cells; arrays keep their names and types.
    pub fn empty_like(&self) -> Self {
        match self {
            DataObject::ImageData(d) => d.empty_like().into(),
            DataObject::RectilinearGrid(d) => d.empty_like().into(),
            DataObject::StructuredGrid(d) => d.empty_like().into(),
            DataObject::UnstructuredGrid(d) => d.empty_like().into(),
            DataObject::PolyData(d) => d.empty_like().into(),
            DataObject::Table(d) => d.empty_like().into(),
            DataObject::MultiBlockDataSet(_) => MultiBlockDataSet::new().into(),
        }
    }

    /// Duplicate all storage.
    pub fn deep_copy(&self) -> Self {
        match self {
            DataObject::ImageData(d) => d.deep_copy().into(),
            DataObject::RectilinearGrid(d) => d.deep_copy().into(),
            DataObject::StructuredGrid(d) => d.deep_copy().into(),
            DataObject::UnstructuredGrid(d) => d.deep_copy().into(),
            DataObject::PolyData(d) => d.deep_copy().into(),
            DataObject::Table(d) => d.deep_copy().into(),
            DataObject::MultiBlockDataSet(d) => d.deep_copy().into(),
        }
    }

    /// Share all storage; later writes on either side detach.
    pub fn shallow_copy(&self) -> Self {
        self.clone()
    }

    pub fn number_of_points(&self) -> usize {
        for_data_sets!(
            self,
            d => d.number_of_points(),
            table _ => 0,
            multiblock m => m.number_of_points()
        )
    }

    pub fn number_of_cells(&self) -> usize {
        for_data_sets!(
            self,
            d => d.number_of_cells(),
            table _ => 0,
            multiblock m => m.number_of_cells()
        )
    }

    /// No points and no cells (no rows for tables, no leaves for composites).
    pub fn is_empty(&self) -> bool {
        match self {
            DataObject::Table(t) => t.number_of_rows() == 0,
            DataObject::MultiBlockDataSet(m) => m.leaves().is_empty(),
            other => other.number_of_points() == 0 && other.number_of_cells() == 0,
        }
    }

    pub fn point_data(&self) -> Option<&DataSetAttributes> {
        for_data_sets!(self, d => Some(d.point_data()), table _ => None, multiblock _ => None)
    }

    pub fn point_data_mut(&mut self) -> Option<&mut DataSetAttributes> {
        for_data_sets!(self, d => Some(d.point_data_mut()), table _ => None, multiblock _ => None)
    }

    pub fn cell_data(&self) -> Option<&DataSetAttributes> {
        for_data_sets!(self, d => Some(d.cell_data()), table _ => None, multiblock _ => None)
    }

    pub fn cell_data_mut(&mut self) -> Option<&mut DataSetAttributes> {
        for_data_sets!(self, d => Some(d.cell_data_mut()), table _ => None, multiblock _ => None)
    }

    pub fn field_data(&self) -> &FieldData {
        for_all!(self, d => d.field_data())
    }

    pub fn field_data_mut(&mut self) -> &mut FieldData {
        for_all!(self, d => d.field_data_mut())
    }

    /// World coordinates of point `i` of a data set.
    pub fn point(&self, i: usize) -> Option<[f64; 3]> {
        match self {
            DataObject::ImageData(d) => d.point(i),
            DataObject::RectilinearGrid(d) => d.point(i),
            DataObject::StructuredGrid(d) => d.points().point(i),
            DataObject::UnstructuredGrid(d) => d.points().point(i),
            DataObject::PolyData(d) => d.points().point(i),
            DataObject::Table(_) | DataObject::MultiBlockDataSet(_) => None,
        }
    }

    /// Structured extent, for the structured types.
    pub fn extent(&self) -> Option<Extent> {
        match self {
            DataObject::ImageData(d) => Some(d.extent()),
            DataObject::RectilinearGrid(d) => Some(d.extent()),
            DataObject::StructuredGrid(d) => Some(d.extent()),
            _ => None,
        }
    }

    /// Attach ghost arrays to a structured data set; other types are left alone.
    pub fn tag_ghosts(&mut self, owned: &Extent, whole: &Extent) -> PipelineResult<()> {
        let Some(extent) = self.extent() else {
            return Ok(());
        };
        if let Some(pd) = self.point_data_mut() {
            pd.add_array(ghost::point_ghost_array(&extent, owned, whole)?)?;
        }
        if let Some(cd) = self.cell_data_mut() {
            cd.add_array(ghost::cell_ghost_array(&extent, owned, whole)?)?;
        }
        Ok(())
    }

    pub fn bounds(&self) -> Option<Bounds> {
        for_data_sets!(self, d => d.bounds(), table _ => None, multiblock m => m.bounds())
    }

    pub fn memory_size(&self) -> usize {
        for_all!(self, d => d.memory_size())
    }

    pub fn as_image(&self) -> Option<&ImageData> {
        match self {
            DataObject::ImageData(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageData> {
        match self {
            DataObject::ImageData(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_poly(&self) -> Option<&PolyData> {
        match self {
            DataObject::PolyData(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_poly_mut(&mut self) -> Option<&mut PolyData> {
        match self {
            DataObject::PolyData(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_rectilinear(&self) -> Option<&RectilinearGrid> {
        match self {
            DataObject::RectilinearGrid(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_structured_grid(&self) -> Option<&StructuredGrid> {
        match self {
            DataObject::StructuredGrid(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_unstructured(&self) -> Option<&UnstructuredGrid> {
        match self {
            DataObject::UnstructuredGrid(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            DataObject::Table(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_multiblock(&self) -> Option<&MultiBlockDataSet> {
        match self {
            DataObject::MultiBlockDataSet(d) => Some(d),
            _ => None,
        }
    }
}

impl Consistent for DataObject {
    fn check_consistency(&self) -> Result<(), PipelineError> {
        match self {
            DataObject::ImageData(d) => d.check_consistency(),
            DataObject::RectilinearGrid(d) => d.check_consistency(),
            DataObject::StructuredGrid(d) => d.check_consistency(),
            DataObject::UnstructuredGrid(d) => d.check_consistency(),
            DataObject::PolyData(d) => d.check_consistency(),
            DataObject::Table(t) => t.row_data().check_tuples(t.number_of_rows()),
            DataObject::MultiBlockDataSet(m) => m
                .leaves()
                .into_iter()
                .try_for_each(Consistent::check_consistency),
        }
    }
}

macro_rules! impl_from {
    ($($t:ident),*) => {
        $(
            impl From<$t> for DataObject {
                fn from(d: $t) -> Self {
                    DataObject::$t(d)
                }
            }
        )*
    };
}

impl_from!(
    ImageData,
    RectilinearGrid,
    StructuredGrid,
    UnstructuredGrid,
    PolyData,
    Table,
    MultiBlockDataSet
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abstract_names_match_families() {
        assert!(DataObjectType::PolyData.is_a(DataObjectType::DataSet));
        assert!(DataObjectType::ImageData.is_a(DataObjectType::DataObject));
        assert!(!DataObjectType::Table.is_a(DataObjectType::DataSet));
        assert!(!DataObjectType::PolyData.is_a(DataObjectType::ImageData));
        assert!(DataObjectType::Table.is_a(DataObjectType::Table));
    }

    #[test]
    fn names_round_trip_at_the_boundary() {
        for ty in CONCRETE_AND_ABSTRACT {
            assert_eq!(ty.name().parse::<DataObjectType>().unwrap(), ty);
        }
        assert_eq!(
            "svtkPolyData".parse::<DataObjectType>().unwrap(),
            DataObjectType::PolyData
        );
        assert!(matches!(
            "vtkMesh".parse::<DataObjectType>(),
            Err(PipelineError::UnknownDataType(_))
        ));
    }

    #[test]
    fn instances_of_every_concrete_type_are_empty() {
        for ty in DataObjectType::CONCRETE {
            let obj = DataObject::new_instance(ty).unwrap();
            assert_eq!(obj.data_type(), ty);
            assert!(obj.is_empty());
            assert!(obj.check_consistency().is_ok());
        }
        assert!(matches!(
            DataObject::new_instance(DataObjectType::DataSet),
            Err(PipelineError::AbstractDataType(DataObjectType::DataSet))
        ));
    }
}
