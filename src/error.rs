use std::path::PathBuf;

use thiserror::Error;

// Every variant is fatal: the run stops at the first one raised.
#[derive(Debug, Error)]
pub enum PrepError {
  #[error("input path {} does not exist", .0.display())]
  MissingPath(PathBuf),

  #[error("no images found in {}", .0.display())]
  NoImages(PathBuf),

  #[error("{stage} failed with code {code}")]
  CommandFailed { stage: &'static str, code: i32 },

  #[error("cannot parse a frame time from image name {0}")]
  MalformedName(String),

  #[error("poses_bounds.npy has {rows} pose rows but images/ holds {cameras} cameras")]
  CameraMismatch { rows: usize, cameras: usize },

  #[error("camera {camera} has more than one image for time {time}")]
  DuplicateFrame { camera: String, time: u64 },
}
