//! Uniform rectilinear grids.

use crate::data::attributes::{DataSetAttributes, FieldData};
use crate::data::extent::Extent;
use crate::data::ghost::{self, DUPLICATE_CELL, DUPLICATE_POINT};
use crate::data::points::{Bounds, bounds_of};
use crate::consistency::Consistent;
use crate::pipeline_error::{PipelineError, PipelineResult};

const IDENTITY: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Regular lattice of points: `origin + direction · (ijk ∘ spacing)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    extent: Extent,
    spacing: [f64; 3],
    origin: [f64; 3],
    direction: [[f64; 3]; 3],
    point_data: DataSetAttributes,
    cell_data: DataSetAttributes,
    field_data: FieldData,
}

impl Default for ImageData {
    fn default() -> Self {
        Self {
            extent: Extent::EMPTY,
            spacing: [1.0; 3],
            origin: [0.0; 3],
            direction: IDENTITY,
            point_data: DataSetAttributes::new(),
            cell_data: DataSetAttributes::new(),
            field_data: FieldData::new(),
        }
    }
}

impl ImageData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Image with extent `0..n-1` on each axis, unit spacing and zero origin.
    pub fn with_dimensions(dims: [usize; 3]) -> Self {
        Self {
            extent: Extent::from_dimensions(dims),
            ..Self::default()
        }
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn set_extent(&mut self, extent: Extent) -> PipelineResult<()> {
        extent.validate()?;
        self.extent = extent;
        Ok(())
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.extent.dimensions()
    }

    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    pub fn set_spacing(&mut self, spacing: [f64; 3]) -> PipelineResult<()> {
        if spacing.iter().any(|&s| !(s > 0.0)) {
            return Err(PipelineError::InvalidSpacing(spacing));
        }
        self.spacing = spacing;
        Ok(())
    }

    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    pub fn set_origin(&mut self, origin: [f64; 3]) {
        self.origin = origin;
    }

    pub fn direction(&self) -> [[f64; 3]; 3] {
        self.direction
    }

    /// Set the direction matrix; its determinant must be +1 or -1.
    pub fn set_direction(&mut self, direction: [[f64; 3]; 3]) -> PipelineResult<()> {
        let det = determinant(&direction);
        if (det.abs() - 1.0).abs() > 1e-6 {
            return Err(PipelineError::InvalidDirection(det));
        }
        self.direction = direction;
        Ok(())
    }

    pub fn number_of_points(&self) -> usize {
        self.extent.number_of_points()
    }

    pub fn number_of_cells(&self) -> usize {
        self.extent.number_of_cells()
    }

    /// World coordinates of structured point `ijk`.
    pub fn point_at(&self, ijk: [i32; 3]) -> [f64; 3] {
        let local = [
            ijk[0] as f64 * self.spacing[0],
            ijk[1] as f64 * self.spacing[1],
            ijk[2] as f64 * self.spacing[2],
        ];
        let mut p = self.origin;
        for (r, row) in self.direction.iter().enumerate() {
            p[r] += row[0] * local[0] + row[1] * local[1] + row[2] * local[2];
        }
        p
    }

    /// World coordinates of the point with linear index `i`.
    pub fn point(&self, i: usize) -> Option<[f64; 3]> {
        (i < self.number_of_points()).then(|| self.point_at(self.extent.point_ijk(i)))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        if self.extent.is_empty() {
            return None;
        }
        let [i0, i1, j0, j1, k0, k1] = self.extent.0;
        let corners = [i0, i1]
            .into_iter()
            .flat_map(|i| [j0, j1].into_iter().map(move |j| (i, j)))
            .flat_map(|(i, j)| [k0, k1].into_iter().map(move |k| [i, j, k]))
            .map(|ijk| self.point_at(ijk));
        bounds_of(corners)
    }

    pub fn point_data(&self) -> &DataSetAttributes {
        &self.point_data
    }

    pub fn point_data_mut(&mut self) -> &mut DataSetAttributes {
        &mut self.point_data
    }

    pub fn cell_data(&self) -> &DataSetAttributes {
        &self.cell_data
    }

    pub fn cell_data_mut(&mut self) -> &mut DataSetAttributes {
        &mut self.cell_data
    }

    pub fn field_data(&self) -> &FieldData {
        &self.field_data
    }

    pub fn field_data_mut(&mut self) -> &mut FieldData {
        &mut self.field_data
    }

    /// Same geometry, no points, arrays emptied.
    pub fn empty_like(&self) -> Self {
        Self {
            extent: Extent::EMPTY,
            spacing: self.spacing,
            origin: self.origin,
            direction: self.direction,
            point_data: self.point_data.empty_like(),
            cell_data: self.cell_data.empty_like(),
            field_data: FieldData::new(),
        }
    }

    pub fn deep_copy(&self) -> Self {
        Self {
            point_data: self.point_data.deep_copy(),
            cell_data: self.cell_data.deep_copy(),
            field_data: self.field_data.deep_copy(),
            ..self.clone()
        }
    }

    pub fn memory_size(&self) -> usize {
        self.point_data.memory_size() + self.cell_data.memory_size() + self.field_data.memory_size()
    }

    /// Stitch structured pieces into one image covering their union.
    ///
    /// Points and cells tagged as ghosts are skipped, so every owned value
    /// is copied from the piece that owns it. All pieces must share spacing,
    /// origin and direction and carry the same arrays.
    pub fn from_pieces(pieces: &[ImageData]) -> PipelineResult<ImageData> {
        let pieces: Vec<&ImageData> = pieces.iter().filter(|p| !p.extent.is_empty()).collect();
        let Some(first) = pieces.first() else {
            return Ok(ImageData::new());
        };
        for p in &pieces[1..] {
            if p.spacing != first.spacing
                || p.origin != first.origin
                || p.direction != first.direction
            {
                return Err(PipelineError::IncompatiblePieces(
                    "pieces disagree on spacing, origin or direction".into(),
                ));
            }
        }
        let whole = pieces
            .iter()
            .fold(Extent::EMPTY, |acc, p| acc.union(&p.extent));
        let mut out = ImageData {
            extent: whole,
            ..first.empty_like()
        };
        out.point_data = stitch(
            &pieces,
            whole.number_of_points(),
            |p| &p.point_data,
            |p, idx| whole.point_index(p.extent.point_ijk(idx)),
            |p| p.extent.number_of_points(),
            DUPLICATE_POINT,
        )?;
        out.cell_data = stitch(
            &pieces,
            whole.number_of_cells(),
            |p| &p.cell_data,
            |p, idx| whole.cell_index(p.extent.cell_ijk(idx)),
            |p| p.extent.number_of_cells(),
            DUPLICATE_CELL,
        )?;
        out.field_data = first.field_data.clone();
        crate::assert_consistent!(out.check_consistency(), "stitched image");
        Ok(out)
    }

    /// Sub-volume covering `voi` clipped to this image's extent. Geometry is
    /// unchanged, so extracted points keep their world positions.
    pub fn extract_extent(&self, voi: &Extent) -> PipelineResult<ImageData> {
        let sub = self.extent.intersect(voi);
        if sub == self.extent {
            return Ok(self.clone());
        }
        let point_ids: Vec<usize> = (0..sub.number_of_points())
            .map(|i| self.extent.point_index(sub.point_ijk(i)))
            .collect();
        let cell_ids: Vec<usize> = (0..sub.number_of_cells())
            .map(|i| {
                let mut ijk = sub.cell_ijk(i);
                for (a, c) in ijk.iter_mut().enumerate() {
                    let (lo, hi) = self.extent.axis(a);
                    *c = if hi > lo { (*c).clamp(lo, hi - 1) } else { lo };
                }
                self.extent.cell_index(ijk)
            })
            .collect();
        Ok(ImageData {
            extent: sub,
            point_data: self.point_data.extract_tuples(&point_ids)?,
            cell_data: self.cell_data.extract_tuples(&cell_ids)?,
            field_data: self.field_data.clone(),
            ..self.empty_like()
        })
    }

    /// Attach ghost arrays marking everything outside `owned`.
    pub fn tag_ghosts(&mut self, owned: &Extent, whole: &Extent) -> PipelineResult<()> {
        let extent = self.extent;
        self.point_data
            .add_array(ghost::point_ghost_array(&extent, owned, whole)?)?;
        self.cell_data
            .add_array(ghost::cell_ghost_array(&extent, owned, whole)?)?;
        Ok(())
    }
}

fn stitch<'a>(
    pieces: &[&'a ImageData],
    tuples: usize,
    attrs: impl Fn(&'a ImageData) -> &'a DataSetAttributes,
    global_index: impl Fn(&ImageData, usize) -> usize,
    count: impl Fn(&ImageData) -> usize,
    flag: u8,
) -> PipelineResult<DataSetAttributes> {
    let template = attrs(pieces[0]);
    let mut out = template.empty_like();
    let names: Vec<String> = out.names().map(str::to_owned).collect();
    for name in &names {
        let Some(src) = template.array(name) else { continue };
        let mut dst = src.empty_like();
        dst.resize_tuples(tuples);
        for &piece in pieces {
            let piece_attrs = attrs(piece);
            let from = piece_attrs.array(name).ok_or_else(|| {
                PipelineError::IncompatiblePieces(format!("a piece lacks array `{name}`"))
            })?;
            let ghosts = piece_attrs.ghost_array();
            for idx in 0..count(piece) {
                if ghost::is_ghost(ghosts, idx, flag) {
                    continue;
                }
                dst.copy_tuple_from(global_index(piece, idx), from, idx)?;
            }
        }
        out.add_array(dst)?;
    }
    Ok(out)
}

fn determinant(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

impl Consistent for ImageData {
    fn check_consistency(&self) -> Result<(), PipelineError> {
        self.extent.validate()?;
        if !self.point_data.is_empty() {
            self.point_data.check_tuples(self.number_of_points())?;
        }
        if !self.cell_data.is_empty() {
            self.cell_data.check_tuples(self.number_of_cells())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::array::DataArray;
    use crate::data::attributes::AttributeRole;
    use crate::data::ghost::GHOST_ARRAY_NAME;

    fn ramp(extent: Extent) -> ImageData {
        let mut img = ImageData::new();
        img.set_extent(extent).unwrap();
        let values: Vec<f64> = (0..img.number_of_points())
            .map(|i| {
                let [x, y, z] = extent.point_ijk(i);
                (x + 10 * y + 100 * z) as f64
            })
            .collect();
        img.point_data_mut()
            .add_active(AttributeRole::Scalars, DataArray::new("ramp", 1, values).unwrap())
            .unwrap();
        img
    }

    #[test]
    fn geometry_follows_spacing_and_origin() {
        let mut img = ImageData::with_dimensions([3, 2, 1]);
        img.set_spacing([0.5, 2.0, 1.0]).unwrap();
        img.set_origin([1.0, 0.0, -1.0]);
        assert_eq!(img.point(5), Some([2.0, 2.0, -1.0]));
        assert_eq!(img.bounds(), Some([1.0, 2.0, 0.0, 2.0, -1.0, -1.0]));
        assert!(img.set_spacing([0.0, 1.0, 1.0]).is_err());
        assert!(img.set_direction([[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]).is_err());
        img.set_direction([[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
            .unwrap();
        assert_eq!(img.point_at([2, 0, 0]), [0.0, 0.0, -1.0]);
    }

    #[test]
    fn stitching_skips_ghosts() {
        let whole = Extent::new(0, 9, 0, 3, 0, 0);
        let lower_owned = Extent::new(0, 5, 0, 3, 0, 0);
        let upper_owned = Extent::new(5, 9, 0, 3, 0, 0);
        let mut lower = ramp(lower_owned.dilate(1, &whole));
        lower.tag_ghosts(&lower_owned, &whole).unwrap();
        let mut upper = ramp(upper_owned.dilate(1, &whole));
        upper.tag_ghosts(&upper_owned, &whole).unwrap();

        let stitched = ImageData::from_pieces(&[lower, upper]).unwrap();
        assert_eq!(stitched.extent(), whole);
        assert_eq!(stitched, {
            let mut expected = ramp(whole);
            expected.field_data = FieldData::new();
            expected
        });
        assert!(!stitched.point_data().has_array(GHOST_ARRAY_NAME));
    }

    #[test]
    fn extract_clips_to_the_image() {
        let img = ramp(Extent::new(0, 4, 0, 4, 0, 0));
        let sub = img.extract_extent(&Extent::new(2, 6, 1, 2, 0, 0)).unwrap();
        assert_eq!(sub.extent(), Extent::new(2, 4, 1, 2, 0, 0));
        assert_eq!(sub.point_data().scalars().unwrap().component(0, 0), Some(12.0));
        assert_eq!(sub.number_of_points(), 6);
        assert_eq!(sub.point(0), Some([2.0, 1.0, 0.0]));
    }

    #[test]
    fn deep_copy_is_disjoint() {
        let img = ramp(Extent::new(0, 2, 0, 2, 0, 0));
        let copy = img.deep_copy();
        assert_eq!(img, copy);
        assert!(!img.point_data().shares_storage_with(copy.point_data()));
    }
}
