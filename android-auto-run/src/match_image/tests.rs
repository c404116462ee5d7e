//! Tests for template assets and matching against screen-sized captures

use crate::geometry::{Point, Rect};
use crate::match_image::{
    Bitmap, MatchConfig, MatchEngine, Template, TemplateError, TemplateLibrary,
    create_default_config, create_edge_config,
};
use std::path::PathBuf;

/// Fresh scratch directory under the system temp dir
fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("android-auto-run-{tag}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// 60x40 RGB "screenshot" with a distinct pattern everywhere
fn screenshot() -> Bitmap {
    let (w, h) = (60u32, 40u32);
    let mut data = Vec::new();
    for y in 0..h {
        for x in 0..w {
            data.extend_from_slice(&[(x * 4) as u8, (y * 6) as u8, ((x * y) % 256) as u8]);
        }
    }
    Bitmap::from_raw(w, h, 3, data).unwrap()
}

/// Screen-sized template: the screenshot inside `rect`, transparent elsewhere
fn masked_template(screen: &Bitmap, rect: Rect) -> Bitmap {
    let mut data = Vec::new();
    for y in 0..screen.height() as i32 {
        for x in 0..screen.width() as i32 {
            let px = screen.pixel(x as u32, y as u32);
            let inside = x >= rect.origin.x
                && y >= rect.origin.y
                && x < rect.origin.x + rect.size.width
                && y < rect.origin.y + rect.size.height;
            data.extend_from_slice(&[px[0], px[1], px[2], if inside { 255 } else { 0 }]);
        }
    }
    Bitmap::from_raw(screen.width(), screen.height(), 4, data).unwrap()
}

#[test]
fn test_match_config_defaults() {
    let config = MatchConfig::default();
    assert_eq!(config.default_threshold, 0.05);
    assert_eq!(config.blur_sigma, 1.0);
    assert_eq!(config.canny_high, 255.0);
    assert_eq!(create_default_config(), config);
    assert!(create_edge_config().default_threshold > config.default_threshold);
}

#[test]
fn test_screen_sized_template_ignores_other_regions() {
    let engine = MatchEngine::default();
    let screen = screenshot();
    let template = Template::new("panel", 0.05, masked_template(&screen, Rect::new(10, 5, 20, 10)));

    assert!(engine.score(&screen, template.image()) <= template.threshold());

    // Change everything outside the opaque region: still a match
    let mut changed = screen.data().to_vec();
    for y in 20..40usize {
        for x in 0..60usize {
            let i = (y * 60 + x) * 3;
            changed[i] = 255 - changed[i];
        }
    }
    let changed = Bitmap::from_raw(60, 40, 3, changed).unwrap();
    assert!(engine.score(&changed, template.image()) < 1e-9);
}

#[test]
fn test_negative_threshold_never_matches() {
    let engine = MatchEngine::default();
    let screen = screenshot();
    let template = Template::new("self", -0.001, screen.clone());
    let difference = engine.score(&screen, template.image());
    assert!(difference >= 0.0);
    assert!(difference > template.threshold());
}

#[test]
fn test_load_dir_with_crop_region() {
    let dir = scratch_dir("load");
    let screen = screenshot();
    std::fs::write(dir.join("full.png"), screen.encode_png().unwrap()).unwrap();
    std::fs::write(dir.join("button[12,8,16,10].png"), screen.encode_png().unwrap()).unwrap();
    std::fs::write(dir.join("notes.txt"), b"ignored").unwrap();
    std::fs::write(dir.join("broken.png"), b"not a png").unwrap();

    let library = TemplateLibrary::load_dir(&dir, &MatchConfig::default()).unwrap();
    assert_eq!(library.len(), 2);
    let names: Vec<&str> = library.templates().iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["button[12,8,16,10]", "full"]);

    let button = library.get("button[12,8,16,10]").unwrap();
    assert_eq!((button.image().width(), button.image().height()), (16, 10));
    assert_eq!(button.threshold(), 0.05);

    // The cropped asset is found where it was cut from
    let found = MatchEngine::default().locate(&screen, button.image());
    assert!(found.difference < 1e-9);
    assert_eq!(found.location, Some(Point::new(20, 13)));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_cropped_template_scores_at_its_region() {
    let dir = scratch_dir("region");
    let screen = screenshot();
    let path = dir.join("btn[20,10,15,12].png");
    std::fs::write(&path, screen.encode_png().unwrap()).unwrap();

    let template = Template::open(&path, 0.05).unwrap();
    assert_eq!(template.origin(), Point::new(20, 10));
    assert_eq!((template.image().width(), template.image().height()), (15, 12));

    let engine = MatchEngine::default();
    assert!(engine.score_template(&screen, &template) < 1e-9);
    // Anchored at the corner it would compare the wrong pixels
    assert!(engine.score(&screen, template.image()) > template.threshold());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_crop_region_outside_image() {
    let dir = scratch_dir("crop");
    let path = dir.join("bad[50,30,20,20].png");
    std::fs::write(&path, screenshot().encode_png().unwrap()).unwrap();
    assert!(matches!(
        Template::open(&path, 0.05),
        Err(TemplateError::CropOutOfBounds { .. })
    ));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_load_dir_missing() {
    let missing = std::env::temp_dir().join("android-auto-run-does-not-exist");
    assert!(matches!(
        TemplateLibrary::load_dir(&missing, &MatchConfig::default()),
        Err(TemplateError::DirectoryNotFound { .. })
    ));
}
