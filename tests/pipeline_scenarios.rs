//! End-to-end export scenarios over a static surface.

use slidepress::{
    CollectingArchiver, ExportConfig, ExportError, ExportPipeline, PreviewController,
    StaticSurface, TilePolicy, SIZE_CATALOG,
};
use std::sync::Arc;
use tokio::runtime::Runtime;

const PORTRAIT: usize = 0; // 1080x1440

fn loaded_surface(markup: &str) -> Arc<StaticSurface> {
    let surface = Arc::new(StaticSurface::new());
    surface.load(markup).expect("load markup");
    surface
}

fn slide_markup(css_size: &str) -> String {
    format!(
        "<html><head><style>.carousel-slide{{{css_size}background-color:#ffffff}}</style></head>\
         <body><div class=\"carousel-slide\"><h1>Title</h1><p>Body text</p></div></body></html>"
    )
}

#[test]
fn no_marker_elements_fails_with_container_not_found() {
    let rt = Runtime::new().unwrap();
    let surface = loaded_surface("<html><body><div><p>hi</p></div></body></html>");
    let pipeline = ExportPipeline::new(surface, ExportConfig::default());

    let err = rt
        .block_on(pipeline.export(SIZE_CATALOG[PORTRAIT], TilePolicy::FitCenter))
        .unwrap_err();
    match err {
        ExportError::ContainerNotFound { marker } => assert_eq!(marker, "carousel-slide"),
        other => panic!("unexpected: {other:?}"),
    }
    assert!(!pipeline.is_processing());
}

#[test]
fn childless_container_fails_citing_index_one() {
    let rt = Runtime::new().unwrap();
    let surface = loaded_surface(
        "<html><body><div class=\"carousel-slide\">bare text</div></body></html>",
    );
    let pipeline = ExportPipeline::new(surface, ExportConfig::default());

    let err = rt
        .block_on(pipeline.export(SIZE_CATALOG[PORTRAIT], TilePolicy::FitCenter))
        .unwrap_err();
    match err {
        ExportError::ContainerEmpty { index } => assert_eq!(index, 1),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn supersampled_portrait_container_fits_and_grids_as_expected() {
    let rt = Runtime::new().unwrap();
    // 1080x1440 CSS pixels => 2160x2880 supersampled buffer
    let surface = loaded_surface(&slide_markup("width:1080px;height:1440px;"));

    let archiver = Arc::new(CollectingArchiver::new());
    let pipeline = ExportPipeline::new(surface, ExportConfig::default())
        .with_archiver(Box::new(archiver.clone()));

    // fit-and-center: exactly one 1080x1440 tile covering the full canvas
    let images = rt
        .block_on(pipeline.export(SIZE_CATALOG[PORTRAIT], TilePolicy::FitCenter))
        .unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!((images[0].width, images[0].height), (1080, 1440));
    let tile = slidepress::encode::decode_png(&images[0].png).unwrap();
    // scale is exactly 0.5 so content lands at the origin with no margin
    assert_ne!(tile.get_pixel(0, 0).0[3], 0);
    assert_ne!(tile.get_pixel(1079, 1439).0[3], 0);

    // grid: 2 cols x 2 rows, row-major
    let images = rt
        .block_on(pipeline.export(SIZE_CATALOG[PORTRAIT], TilePolicy::Grid))
        .unwrap();
    assert_eq!(images.len(), 4);
    let names: Vec<String> = images.iter().map(|i| i.filename()).collect();
    assert_eq!(names, ["image_1.png", "image_2.png", "image_3.png", "image_4.png"]);

    // archiver saw both runs, entries named in generation order
    let archive_names = archiver.names();
    assert_eq!(archive_names.len(), 2);
    assert!(archive_names.iter().all(|n| n.starts_with("slides_")));
    assert_eq!(
        archiver.last_entry_names(),
        ["image_1.png", "image_2.png", "image_3.png", "image_4.png"]
    );
}

#[test]
fn oversized_container_fails_with_size_exceeded() {
    let rt = Runtime::new().unwrap();
    // 1100 CSS px wide => 2200 supersampled, beyond the 2x1080 bound
    let surface = loaded_surface(&slide_markup("width:1100px;height:200px;"));
    let pipeline = ExportPipeline::new(surface, ExportConfig::default());

    let err = rt
        .block_on(pipeline.export(SIZE_CATALOG[PORTRAIT], TilePolicy::FitCenter))
        .unwrap_err();
    match err {
        ExportError::SizeExceeded {
            index,
            width,
            height,
        } => {
            assert_eq!(index, 1);
            assert_eq!(width, 1100);
            assert_eq!(height, 200);
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(!pipeline.is_processing());
}

#[test]
fn unready_surface_fails_and_busy_flag_resets() {
    let rt = Runtime::new().unwrap();
    let surface = Arc::new(StaticSurface::new()); // never loaded
    let config = ExportConfig {
        ready_timeout_ms: 50,
        ..Default::default()
    };
    let pipeline = ExportPipeline::new(surface, config);

    let err = rt
        .block_on(pipeline.export(SIZE_CATALOG[PORTRAIT], TilePolicy::FitCenter))
        .unwrap_err();
    assert!(matches!(err, ExportError::RenderNotReady(_)));
    assert!(!pipeline.is_processing());

    // a retry is possible after the failed attempt
    let err = rt
        .block_on(pipeline.export(SIZE_CATALOG[PORTRAIT], TilePolicy::FitCenter))
        .unwrap_err();
    assert!(matches!(err, ExportError::RenderNotReady(_)));
}

#[test]
fn export_waits_for_readiness_signal() {
    let rt = Runtime::new().unwrap();
    let surface = Arc::new(StaticSurface::new());
    let config = ExportConfig {
        ready_timeout_ms: 5_000,
        ..Default::default()
    };
    let pipeline = ExportPipeline::new(surface.clone(), config);

    let loader = {
        let surface = surface.clone();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(100));
            surface
                .load(&slide_markup("width:100px;height:100px;"))
                .expect("load");
        })
    };

    let images = rt
        .block_on(pipeline.export(SIZE_CATALOG[2], TilePolicy::FitCenter))
        .unwrap();
    assert_eq!(images.len(), 1);
    loader.join().unwrap();
}

#[test]
fn second_concurrent_export_is_rejected() {
    let rt = Runtime::new().unwrap();
    let surface = Arc::new(StaticSurface::new());
    let config = ExportConfig {
        ready_timeout_ms: 1_000,
        ..Default::default()
    };
    let pipeline = Arc::new(ExportPipeline::new(surface, config));

    rt.block_on(async {
        // first export blocks on readiness that never comes; the second must
        // be rejected while the first is in flight
        let first = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                pipeline
                    .export(SIZE_CATALOG[PORTRAIT], TilePolicy::FitCenter)
                    .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(pipeline.is_processing());

        let second = pipeline
            .export(SIZE_CATALOG[PORTRAIT], TilePolicy::FitCenter)
            .await;
        assert!(matches!(second, Err(ExportError::ExportInProgress)));

        let first = first.await.unwrap();
        assert!(matches!(first, Err(ExportError::RenderNotReady(_))));
        assert!(!pipeline.is_processing());
    });
}

#[test]
fn preview_controller_mirrors_run_outcomes() {
    let rt = Runtime::new().unwrap();
    let mut controller = PreviewController::new();
    controller.select_size(3); // 1:1
    controller.set_policy(TilePolicy::FitCenter);

    // a failing run populates the error surface and clears results
    let empty = loaded_surface("<html><body><p>no slides</p></body></html>");
    let pipeline = ExportPipeline::new(empty, ExportConfig::default());
    controller.set_processing(true);
    let result = rt.block_on(pipeline.export(controller.selected_size(), controller.policy()));
    controller.set_processing(false);
    controller.record_failure(&result.unwrap_err());
    assert!(controller.error_message().unwrap().contains("carousel-slide"));
    assert!(controller.images().is_empty());

    // a successful run replaces the error with preview payloads
    let surface = loaded_surface(&slide_markup("width:100px;height:100px;"));
    let pipeline = ExportPipeline::new(surface, ExportConfig::default());
    let images = rt
        .block_on(pipeline.export(controller.selected_size(), controller.policy()))
        .unwrap();
    controller.record_success(images);
    assert!(controller.error_message().is_none());
    assert_eq!(controller.images().len(), 1);
    let urls = controller.data_urls();
    assert!(urls[0].starts_with("data:image/png;base64,"));
}

#[test]
fn multiple_containers_export_in_document_order() {
    let rt = Runtime::new().unwrap();
    let surface = loaded_surface(
        "<html><head><style>\
         .carousel-slide{width:200px;height:200px}\
         #first{background-color:#ff0000}#second{background-color:#0000ff}\
         </style></head><body>\
         <div class=\"carousel-slide\" id=\"first\"><p>1</p></div>\
         <div class=\"carousel-slide\" id=\"second\"><p>2</p></div>\
         </body></html>",
    );
    let pipeline = ExportPipeline::new(surface, ExportConfig::default());

    let images = rt
        .block_on(pipeline.export(SIZE_CATALOG[2], TilePolicy::FitCenter))
        .unwrap();
    assert_eq!(images.len(), 2);

    // first container is red, second blue, proving order is preserved
    let first = slidepress::encode::decode_png(&images[0].png).unwrap();
    let second = slidepress::encode::decode_png(&images[1].png).unwrap();
    assert_eq!(first.get_pixel(540, 540).0, [255, 0, 0, 255]);
    assert_eq!(second.get_pixel(540, 540).0, [0, 0, 255, 255]);
}
