use crate::all::*;

const VIDEO_EXTENSION: &str = "mp4";

// Decodes every video in `videos_dir` into a numbered image sequence under
// `output_dir/images/`, one decoder run per video. The frame index starts at
// zero so the image names line up with the capture timestamps.
pub fn extract_frames(videos_dir: &Path, output_dir: &Path) -> Result<()> {
  let videos = list_videos(videos_dir)?;
  if videos.is_empty() {
    warn!("No MP4 files found in {}.", videos_dir.display());
    return Ok(());
  }

  let images_dir = output_dir.join("images");
  fs::create_dir_all(&images_dir)
    .context(format!("Failed to create {}.", images_dir.display()))?;

  for video in &videos {
    let stem = video.file_stem()
      .and_then(|s| s.to_str())
      .ok_or(anyhow!("Failed to parse video name {}.", video.display()))?;
    let mut command = Command::new("ffmpeg");
    command
      .arg("-i").arg(video)
      .arg("-start_number").arg("0")
      .arg(images_dir.join(format!("{}_%04d.png", stem)));
    run_command(&mut command, "frame extraction")?;
  }

  info!("Extracted frames from {} videos to {}.", videos.len(), images_dir.display());
  Ok(())
}

fn list_videos(dir: &Path) -> Result<Vec<PathBuf>> {
  let mut videos = vec![];
  let entries = fs::read_dir(dir)
    .context(format!("Failed to read {}.", dir.display()))?;
  for entry in entries {
    let path = entry?.path();
    if path.extension().map_or(false, |e| e == VIDEO_EXTENSION) {
      videos.push(path);
    }
  }
  videos.sort();
  Ok(videos)
}
