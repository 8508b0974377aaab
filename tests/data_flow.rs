mod util;

use svtk_pipeline::prelude::*;
use util::*;

#[test]
fn group_collects_named_blocks() {
    let pipeline = Pipeline::new();
    let image = pipeline.add(CountingSource::new([3, 3, 3]));
    let plane = pipeline.add(PlaneSource::new());
    let group = pipeline.add(GroupDataSets::new());
    for src in [image, plane] {
        pipeline
            .add_input_connection(group, 0, pipeline.output_port(src, 0).unwrap())
            .unwrap();
    }
    pipeline
        .configure::<GroupDataSets, _>(group, |g| g.set_block_name(1, "plane"))
        .unwrap();

    let out = pipeline
        .output(pipeline.output_port(group, 0).unwrap())
        .unwrap();
    let blocks = out.as_multiblock().unwrap();
    assert_eq!(blocks.number_of_blocks(), 2);
    assert_eq!(blocks.block_name(0).as_deref(), Some("Block0"));
    assert_eq!(blocks.block_name(1).as_deref(), Some("plane"));
    assert_eq!(blocks.block(0).unwrap().data_type(), DataObjectType::ImageData);
    assert_eq!(blocks.block(1).unwrap().data_type(), DataObjectType::PolyData);
    assert_eq!(out.number_of_points(), 27 + 4);
    let info = pipeline
        .output_information(pipeline.output_port(group, 0).unwrap())
        .unwrap();
    assert!(!info.has(keys::WHOLE_EXTENT));
}

#[test]
fn attribute_table_lists_point_arrays() {
    let pipeline = Pipeline::new();
    let src = pipeline.add(CountingSource::new([2, 3, 4]));
    let table = pipeline.add(AttributeTable::new(FieldAssociation::Points));
    pipeline
        .set_input_connection(table, 0, pipeline.output_port(src, 0).unwrap())
        .unwrap();
    let out = pipeline
        .output(pipeline.output_port(table, 0).unwrap())
        .unwrap();
    let table = out.as_table().unwrap();
    assert_eq!(table.number_of_rows(), 24);
    assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["scalars"]);
    assert_eq!(table.value(23, "scalars"), Some(23.0));
}

#[test]
fn extract_extent_narrows_the_upstream_request() {
    let pipeline = Pipeline::new();
    let src = pipeline.add(CountingSource::new([8, 8, 8]));
    let extract = pipeline.add(ExtractExtent::new(Extent::new(2, 5, 2, 5, 2, 5)));
    pipeline
        .set_input_connection(extract, 0, pipeline.output_port(src, 0).unwrap())
        .unwrap();
    let out = pipeline
        .output(pipeline.output_port(extract, 0).unwrap())
        .unwrap();
    assert_eq!(out.extent(), Some(Extent::new(2, 5, 2, 5, 2, 5)));
    assert_eq!(out.number_of_points(), 64);

    let upstream = pipeline
        .cached_output(pipeline.output_port(src, 0).unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(upstream.number_of_points(), 64);
    let first = out.point_data().unwrap().scalars().unwrap().component(0, 0);
    assert_eq!(first, Some((2 + 2 * 8 + 2 * 64) as f64));
}

#[test]
fn deep_copies_share_no_storage() {
    let pipeline = Pipeline::new();
    let src = pipeline.add(PlaneSource::with_resolution(4, 4));
    let elevation = pipeline.add(ElevationFilter::default());
    pipeline
        .set_input_connection(elevation, 0, pipeline.output_port(src, 0).unwrap())
        .unwrap();
    let out = pipeline
        .output(pipeline.output_port(elevation, 0).unwrap())
        .unwrap();
    let source_out = pipeline
        .cached_output(pipeline.output_port(src, 0).unwrap())
        .unwrap()
        .unwrap();
    let shallow = out.as_poly().unwrap();
    assert!(shallow.points().shares_storage_with(source_out.as_poly().unwrap().points()));
    assert!(source_out.point_data().unwrap().array("Elevation").is_none());

    let copy = out.deep_copy();
    assert_eq!(copy, *out);
    let copied = copy.as_poly().unwrap();
    assert!(!copied.points().shares_storage_with(shallow.points()));
    assert!(!copied.polys().shares_storage_with(shallow.polys()));
    assert!(!copied.point_data().shares_storage_with(shallow.point_data()));
}

#[test]
fn released_outputs_are_regenerated_on_demand() {
    let pipeline = Pipeline::new();
    let source = CountingSource::new([3, 3, 3]);
    let runs = source.counter();
    let src = pipeline.add(source);
    let filter = PassThrough::new();
    let filter_runs = filter.counter();
    let pass = pipeline.add(filter);
    let src_port = pipeline.output_port(src, 0).unwrap();
    pipeline.set_input_connection(pass, 0, src_port).unwrap();
    pipeline.set_release_data_flag(src_port, true).unwrap();

    let out = pipeline.output_port(pass, 0).unwrap();
    assert_eq!(pipeline.output(out).unwrap().number_of_points(), 27);
    assert_eq!(pipeline.cached_output(src_port).unwrap().unwrap().number_of_points(), 0);

    pipeline.update_port(out).unwrap();
    assert_eq!(count(&runs), 1);

    pipeline.modified(pass).unwrap();
    assert_eq!(pipeline.output(out).unwrap().number_of_points(), 27);
    assert_eq!(count(&runs), 2);
    assert_eq!(count(&filter_runs), 2);
}

#[test]
fn release_flag_defaults_come_from_config() {
    let pipeline = Pipeline::with_config(PipelineConfig {
        release_data: true,
        ..PipelineConfig::default()
    });
    let src = pipeline.add(PlaneSource::new());
    assert!(pipeline.release_data_flag(pipeline.output_port(src, 0).unwrap()).unwrap());
}

#[test]
fn shared_producers_satisfy_every_consumer() {
    let pipeline = Pipeline::new();
    let source = CountingSource::new([8, 8, 8]);
    let runs = source.counter();
    let src = pipeline.add(source);
    let src_port = pipeline.output_port(src, 0).unwrap();
    let extract = pipeline.add(ExtractExtent::new(Extent::new(2, 5, 2, 5, 2, 5)));
    pipeline.set_input_connection(extract, 0, src_port).unwrap();
    let group = pipeline.add(GroupDataSets::new());
    pipeline.add_input_connection(group, 0, src_port).unwrap();
    pipeline
        .add_input_connection(group, 0, pipeline.output_port(extract, 0).unwrap())
        .unwrap();

    let out = pipeline
        .output(pipeline.output_port(group, 0).unwrap())
        .unwrap();
    let blocks = out.as_multiblock().unwrap();
    assert_eq!(blocks.block(0).unwrap().number_of_points(), 512);
    assert_eq!(blocks.block(1).unwrap().number_of_points(), 64);
    assert_eq!(
        blocks.block(1).unwrap().extent(),
        Some(Extent::new(2, 5, 2, 5, 2, 5))
    );
    assert_eq!(count(&runs), 1);

    pipeline.update(extract).unwrap();
    assert_eq!(count(&runs), 1);
}
