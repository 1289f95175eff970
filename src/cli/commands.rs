//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use chrono::Local;
use log::{info, warn};

use crate::capture::{DirectoryFrameSource, FrameSource, FsBlobStore, SyntheticFrameSource};
use crate::collage::CollageComposer;
use crate::config::BoothConfig;
use crate::error::Result;
use crate::session::{Composite, Layout, Orientation, SessionController, SessionEvent};

/// Print the capture and selection quota of every layout.
pub fn show_limits() -> Result<()> {
    println!("{:<8} {:>8} {:>8}", "layout", "capture", "select");
    println!("{:-<26}", "");
    for layout in Layout::ALL {
        println!(
            "{:<8} {:>8} {:>8}",
            layout.as_str(),
            layout.capture_limit(),
            layout.final_limit()
        );
    }
    Ok(())
}

/// Run one complete session and print the saved collage's location.
pub fn run_session(
    config: &BoothConfig,
    layout: Layout,
    orientation: Orientation,
    select: Option<Vec<usize>>,
    frames_dir: Option<&Path>,
) -> Result<()> {
    let frames: Arc<dyn FrameSource> = match frames_dir {
        Some(dir) => Arc::new(DirectoryFrameSource::open(dir, config.mirror_frames)?),
        None => Arc::new(SyntheticFrameSource::new(
            config.frame_width,
            config.frame_height,
        )),
    };
    let store = Arc::new(FsBlobStore::open(&config.photos_dir)?);
    let controller = Arc::new(SessionController::new(
        frames,
        store.clone(),
        CollageComposer::from_config(config),
    ));

    let subscription = controller.subscribe();
    let printer = thread::spawn(move || {
        while let Some(event) = subscription.recv() {
            print_event(&event);
            if matches!(
                event,
                SessionEvent::SessionComplete { .. } | SessionEvent::SessionReset { .. }
            ) {
                break;
            }
        }
    });

    let result = drive_session(&controller, layout, orientation, select);
    if result.is_err() {
        // Unblocks the printer thread.
        controller.reset();
    }
    if printer.join().is_err() {
        warn!("Event printer thread panicked");
    }

    let composite = result?;
    println!(
        "Collage saved: {}",
        store.dir().join(&composite.filename).display()
    );
    Ok(())
}

fn drive_session(
    controller: &SessionController,
    layout: Layout,
    orientation: Orientation,
    select: Option<Vec<usize>>,
) -> Result<Composite> {
    controller.create(layout, orientation);

    loop {
        let outcome = controller.capture()?;
        if outcome.capture_complete {
            break;
        }
    }

    let indices = select.unwrap_or_else(|| (0..layout.final_limit()).collect());
    controller.select(&indices)?;
    controller.finalize()
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::SessionCreated { session_id, limits, .. } => println!(
            "Session {} started: capture {}, keep {}",
            session_id, limits.max_capture_photos, limits.final_photos_needed
        ),
        SessionEvent::PhotoCaptured {
            photo_count,
            max_capture_photos,
            photo,
            ..
        } => println!(
            "  photo {}/{} ({}x{})",
            photo_count,
            max_capture_photos,
            photo.width(),
            photo.height()
        ),
        SessionEvent::SelectionComplete {
            selected_indices, ..
        } => println!("  selected {:?}", selected_indices),
        SessionEvent::SessionComplete {
            filename, collage, ..
        } => println!("  composed {} ({} bytes)", filename, collage.len()),
        SessionEvent::SessionReset { .. } => println!("Session reset"),
    }
}

/// Compose image files directly, bypassing the session.
pub fn compose_files(
    config: &BoothConfig,
    files: &[std::path::PathBuf],
    layout: Layout,
    orientation: Orientation,
    out: &Path,
) -> Result<()> {
    info!("Composing {} files as {} {}", files.len(), layout, orientation);

    let images = files
        .iter()
        .map(|path| image::open(path).map_err(Into::into))
        .collect::<Result<Vec<_>>>()?;

    let composer = CollageComposer::from_config(config);
    let bytes = composer.compose_jpeg(&images, layout, orientation, Local::now().naive_local())?;
    fs::write(out, &bytes)?;

    println!("Collage written: {} ({} bytes)", out.display(), bytes.len());
    Ok(())
}

/// List saved collages, newest first.
pub fn list_photos(config: &BoothConfig) -> Result<()> {
    let store = FsBlobStore::open(&config.photos_dir)?;
    let photos = store.list()?;

    if photos.is_empty() {
        println!("No photos in {}.", store.dir().display());
        return Ok(());
    }

    println!("Photos in {}:", store.dir().display());
    println!("{:-<60}", "");
    for photo in &photos {
        println!(
            "{:<40} {:>8} KB  {}",
            photo.filename,
            photo.size / 1024,
            photo.modified.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!("{:-<60}", "");
    println!("{} photo(s)", photos.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_config(dir: &Path) -> BoothConfig {
        BoothConfig {
            photos_dir: dir.join("photos"),
            frame_width: 64,
            frame_height: 48,
            font_path: Some(dir.join("missing.ttf")),
            ..BoothConfig::default()
        }
    }

    #[test]
    fn test_run_session_saves_one_collage() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());

        run_session(&config, Layout::Double, Orientation::Portrait, Some(vec![0, 2]), None)
            .unwrap();

        let saved = FsBlobStore::open(&config.photos_dir).unwrap().list().unwrap();
        assert_eq!(saved.len(), 1);
        assert!(saved[0].filename.starts_with("photo_"));
    }

    #[test]
    fn test_run_session_bad_selection_fails_cleanly() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());

        let err = run_session(&config, Layout::Double, Orientation::Portrait, Some(vec![0]), None)
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SELECTION");
    }

    #[test]
    fn test_compose_files_writes_jpeg() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let inputs: Vec<_> = (0..2)
            .map(|i| {
                let path = dir.path().join(format!("in{}.png", i));
                image::RgbImage::from_pixel(30, 20, image::Rgb([i * 100, 50, 50]))
                    .save(&path)
                    .unwrap();
                path
            })
            .collect();
        let out = dir.path().join("out.jpg");

        compose_files(&config, &inputs, Layout::Double, Orientation::Landscape, &out).unwrap();
        let decoded = image::open(&out).unwrap();
        // 30x20 scales to 900x600 twice, plus gaps
        assert_eq!((decoded.width(), decoded.height()), (1860, 640));
    }
}
