use std::collections::HashMap;

use svtk_pipeline::prelude::*;

fn sphere_surface(pipeline: &Pipeline) -> (AlgorithmId, AlgorithmId) {
    let sample = pipeline.add(SampleFunction::new(
        Sphere::new([0.0; 3], 16.0),
        [64, 64, 64],
        [-31.5, 31.5, -31.5, 31.5, -31.5, 31.5],
    ));
    let contour = pipeline.add(ContourFilter::new(0.0));
    pipeline
        .set_input_connection(contour, 0, pipeline.output_port(sample, 0).unwrap())
        .unwrap();
    (sample, contour)
}

#[test]
fn sphere_contour_is_closed_and_bounded() {
    let pipeline = Pipeline::new();
    let (_, contour) = sphere_surface(&pipeline);
    let surface = pipeline
        .output(pipeline.output_port(contour, 0).unwrap())
        .unwrap();
    let poly = surface.as_poly().expect("contour output is poly data");
    assert!(poly.polys().number_of_cells() > 0);

    let bounds = poly.bounds().unwrap();
    for axis in 0..3 {
        let (lo, hi) = (bounds[2 * axis], bounds[2 * axis + 1]);
        assert!(lo >= -17.0 && hi <= 17.0, "axis {axis}: [{lo}, {hi}]");
        assert!(lo < 0.0 && hi > 0.0, "axis {axis} misses the origin");
    }

    let mut edges: HashMap<(IdType, IdType), usize> = HashMap::new();
    for tri in poly.polys().iter() {
        assert_eq!(tri.len(), 3);
        for k in 0..3 {
            let (a, b) = (tri[k], tri[(k + 1) % 3]);
            *edges.entry((a.min(b), a.max(b))).or_default() += 1;
        }
    }
    assert!(edges.values().all(|&n| n == 2), "surface has boundary or non-manifold edges");
}

#[test]
fn contour_points_lie_near_the_sphere() {
    let pipeline = Pipeline::new();
    let (_, contour) = sphere_surface(&pipeline);
    let surface = pipeline
        .output(pipeline.output_port(contour, 0).unwrap())
        .unwrap();
    for i in 0..surface.number_of_points() {
        let p = surface.point(i).unwrap();
        let r = p.iter().map(|c| c * c).sum::<f64>().sqrt();
        assert!((r - 16.0).abs() < 0.5, "point {i} at radius {r}");
    }
}

#[test]
fn changing_the_iso_value_reruns_only_the_contour() {
    let pipeline = Pipeline::new();
    let (sample, contour) = sphere_surface(&pipeline);
    let port = pipeline.output_port(contour, 0).unwrap();
    let small = pipeline.output(port).unwrap().number_of_points();
    let sample_port = pipeline.output_port(sample, 0).unwrap();
    let sample_time = pipeline.output_information(sample_port).unwrap();

    pipeline
        .configure::<ContourFilter, _>(contour, |c| c.set_value(300.0 - 256.0))
        .unwrap();
    let larger = pipeline.output(port).unwrap().number_of_points();
    assert!(larger > small);
    let after = pipeline.output_information(sample_port).unwrap();
    assert!(std::sync::Arc::ptr_eq(
        sample_time.data_object().unwrap(),
        after.data_object().unwrap()
    ));
}

#[test]
fn elevation_after_contour_colours_by_height() {
    let pipeline = Pipeline::new();
    let (_, contour) = sphere_surface(&pipeline);
    let elevation = pipeline.add(ElevationFilter::new([0.0, 0.0, -16.0], [0.0, 0.0, 16.0]));
    pipeline
        .set_input_connection(elevation, 0, pipeline.output_port(contour, 0).unwrap())
        .unwrap();
    let out = pipeline
        .output(pipeline.output_port(elevation, 0).unwrap())
        .unwrap();
    let heights = out.point_data().unwrap().scalars().unwrap();
    assert_eq!(heights.name(), "Elevation");
    let (lo, hi) = heights.range(0).unwrap();
    assert!(lo >= 0.0 && hi <= 1.0);
    assert!(hi - lo > 0.9);
}
