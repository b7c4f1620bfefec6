mod helpers;

use helpers::fixtures::{image_asset, opaque_video_asset};
use helpers::mock_host::MockHost;
use image::GenericImageView;
use reelkit_core::models::{
    AdjustmentStack, CoverFrame, FilterPreset, MediaAsset, MediaFile, PixelRect,
};
use reelkit_core::PipelineConfig;
use reelkit_processing::geometry::{compute_rendered_rect, scale_factors, CropLayout};
use reelkit_processing::session::{self, CropFrame};
use reelkit_processing::{
    render_filter_style, FilmstripGenerator, HandleRegistry, ImageExport, ImageTransformEngine,
    TrimOutcome, VideoTrimEngine,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[tokio::test(start_paused = true)]
async fn test_full_frame_trim_keeps_native_size() {
    let host = MockHost::new(1920, 1080, 10.0);
    let log = host.log.clone();
    let engine = VideoTrimEngine::new(
        Arc::new(host),
        HandleRegistry::new(),
        PipelineConfig::default(),
    );

    let mut asset = opaque_video_asset(1920, 1080, 10.0);
    asset.set_trim_start(2.0).unwrap();
    asset.set_trim_end(7.0).unwrap();

    let outcome = engine.trim_asset(&asset, |_| {}).await;

    match &outcome {
        TrimOutcome::Encoded {
            width,
            height,
            crop_applied,
            file,
            ..
        } => {
            assert_eq!((*width, *height), (1920, 1080));
            assert!(!crop_applied);
            assert_eq!(file.file_name, "clip_edited.webm");
            assert_eq!(file.mime_type, "video/webm");
        }
        other => panic!("expected an encode, got {:?}", other),
    }

    assert_eq!(log.seeks(), vec![2.0]);
    let captures = log.captures();
    let last = captures.last().unwrap();
    assert!(
        (4.9..=5.1).contains(&last.timestamp),
        "recorded {:.3}s",
        last.timestamp
    );
    assert!(captures.iter().all(|c| (c.width, c.height) == (1920, 1080)));
    assert_eq!(log.live_playbacks.load(Ordering::SeqCst), 0);
}

#[test]
fn test_square_crop_of_landscape_image_is_centered() {
    let file = MediaFile::new("landscape.jpg", "image/jpeg", vec![0u8; 16]);
    let mut asset = MediaAsset::new_image(file, 4000, 3000).unwrap();
    let frame = CropFrame::fit(1080.0, 1080.0, 1.0).unwrap();

    session::set_target_aspect(&mut asset, 1.0, frame).unwrap();
    let region = session::confirm_image_crop(&mut asset, frame).unwrap();
    assert_eq!(region, PixelRect::new(500, 0, 3000, 3000));
}

#[tokio::test]
async fn test_square_crop_renders_square_output() {
    let mut asset = image_asset("landscape.png", 400, 300);
    let frame = CropFrame::fit(1080.0, 1080.0, 1.0).unwrap();
    session::set_target_aspect(&mut asset, 1.0, frame).unwrap();
    assert_eq!(
        session::confirm_image_crop(&mut asset, frame).unwrap(),
        PixelRect::new(50, 0, 300, 300)
    );

    match ImageTransformEngine::from_config(&PipelineConfig::default())
        .export_image(&asset)
        .await
    {
        ImageExport::Rendered { file, width, height } => {
            assert_eq!((width, height), (300, 300));
            let decoded = image::load_from_memory(&file.bytes).unwrap();
            assert_eq!(decoded.dimensions(), (300, 300));
        }
        other => panic!("expected a render, got {:?}", other),
    }
}

#[test]
fn test_clarendon_with_neutral_adjustments() {
    let style = render_filter_style(FilterPreset::Clarendon, &AdjustmentStack::default());
    assert_eq!(
        style.expression,
        "contrast(1.2) saturate(1.25) brightness(100%) contrast(100%) saturate(100%)"
    );
}

#[tokio::test]
async fn test_nine_second_clip_filmstrip() {
    let host = MockHost::new(160, 90, 9.0);
    let generator = FilmstripGenerator::new(
        Arc::new(host),
        HandleRegistry::new(),
        PipelineConfig::default(),
    );
    let mut asset = opaque_video_asset(160, 90, 9.0);

    assert!(generator.generate(&mut asset).await.unwrap());

    let video = asset.video().unwrap();
    let frames = video.thumbnail_frames().unwrap();
    assert_eq!(frames.len(), 9);
    let times: Vec<f64> = frames.iter().map(|f| f.time_seconds).collect();
    assert_eq!(times, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    assert_eq!(video.cover(), Some(&CoverFrame::Thumbnail(0)));
}

#[test]
fn test_portrait_video_in_landscape_container() {
    let rendered = compute_rendered_rect(1080.0 / 1920.0, 1600.0, 900.0).unwrap();
    assert_eq!(rendered.height, 900.0);
    assert!(rendered.width < 1600.0);

    let (scale_x, scale_y) = scale_factors(rendered, 1080, 1920);
    assert!((scale_x - scale_y).abs() > 1e-6);

    let mut layout = CropLayout::new(1080, 1920, 1.0);
    layout.resize(1600.0, 900.0);
    let crop = layout.crop_region().unwrap();
    assert!(crop.is_within(1080, 1920));
    assert!(crop.width <= 1080);
    assert!((crop.width as i64 - crop.height as i64).abs() <= 4);
}
