use crate::all::*;

use std::os::unix::fs::symlink;

pub const CAMERA_MODEL: &str = "PINHOLE";
const MAPPER_BA_TOLERANCE: f64 = 1e-6;
const SPARSE_FILES: &[&str] = &["cameras.bin", "images.bin", "points3D.bin"];

// Reconstruction of one capture instant. A job owns `frame_<time>/`
// exclusively while it runs, so jobs for different timestamps never share
// filesystem state.
pub struct FrameJob<'a> {
  pub time: u64,
  pub frames: &'a [FrameDescriptor],
  pub base: &'a Path,
  pub use_gpu: bool,
}

// Drives every timestamp group in ascending time order. The first failing
// stage aborts the whole run; later timestamps are never started.
pub fn reconstruct_all(
  base: &Path,
  groups: &TimestampGroups,
  pipeline: &dyn ReconstructionPipeline,
  use_gpu: bool,
) -> Result<()> {
  for (time, frames) in groups {
    info!("Processing frame {}.", time);
    let job = FrameJob { time: *time, frames, base, use_gpu };
    job.run(pipeline)?;
  }
  Ok(())
}

impl FrameJob<'_> {
  pub fn frame_dir(&self) -> PathBuf {
    self.base.join(format!("frame_{:04}", self.time))
  }

  fn temp_dir(&self) -> PathBuf {
    self.frame_dir().join("temp")
  }

  pub fn run(&self, pipeline: &dyn ReconstructionPipeline) -> Result<()> {
    self.stage()?;
    self.reconstruct(pipeline)?;
    self.relocate_sparse()?;
    self.clean()?;
    info!("Completed processing frame_{:04}.", self.time);
    Ok(())
  }

  // Builds the working layout: temp/ holds links to the source images plus
  // all intermediate output, images/ and sparse/0/ receive the final results.
  fn stage(&self) -> Result<()> {
    let frame_dir = self.frame_dir();
    let temp_dir = self.temp_dir();
    fs::create_dir_all(temp_dir.join("sparse"))?;
    fs::create_dir_all(frame_dir.join("images"))?;
    fs::create_dir_all(frame_dir.join("sparse").join("0"))?;

    for frame in self.frames {
      let source = self.base.join(&frame.file_path);
      let name = source.file_name()
        .ok_or(anyhow!("Image path {} has no file name.", source.display()))?;
      let link = temp_dir.join(name);
      // `symlink_metadata` also sees a link whose target is gone, so a
      // restage never trips over leftovers from an earlier run.
      if link.symlink_metadata().is_err() {
        symlink(&source, &link)
          .context(format!("Failed to link {} into {}.", source.display(), temp_dir.display()))?;
      }
    }
    Ok(())
  }

  fn reconstruct(&self, pipeline: &dyn ReconstructionPipeline) -> Result<()> {
    let temp_dir = self.temp_dir();
    let database = temp_dir.join("database.db");
    pipeline.extract_features(&FeatureExtractionJob {
      database: database.clone(),
      images: temp_dir.clone(),
      camera_model: CAMERA_MODEL,
      single_camera: false,
      use_gpu: self.use_gpu,
    })?;
    pipeline.match_exhaustive(&ExhaustiveMatchingJob {
      database: database.clone(),
      use_gpu: self.use_gpu,
    })?;
    pipeline.map_sparse(&SparseMappingJob {
      database,
      images: temp_dir.clone(),
      output: temp_dir.join("sparse"),
      ba_tolerance: MAPPER_BA_TOLERANCE,
    })?;
    pipeline.undistort(&UndistortionJob {
      images: temp_dir.clone(),
      sparse_model: temp_dir.join("sparse").join("0"),
      output: self.frame_dir(),
    })
  }

  // The undistorter leaves the refined model files directly under sparse/;
  // move them down into sparse/0/.
  fn relocate_sparse(&self) -> Result<()> {
    let sparse_dir = self.frame_dir().join("sparse");
    for name in SPARSE_FILES {
      let from = sparse_dir.join(name);
      if from.exists() {
        fs::rename(&from, sparse_dir.join("0").join(name))
          .context(format!("Failed to move {} into {}/0.", name, sparse_dir.display()))?;
      }
    }
    Ok(())
  }

  // Deletes temp/ and anything else the pipeline scattered around the frame
  // directory besides the two canonical outputs.
  fn clean(&self) -> Result<()> {
    let temp_dir = self.temp_dir();
    fs::remove_dir_all(&temp_dir)
      .context(format!("Failed to remove {}.", temp_dir.display()))?;
    for entry in fs::read_dir(self.frame_dir())? {
      let entry = entry?;
      let name = entry.file_name();
      if name == "images" || name == "sparse" { continue }
      let path = entry.path();
      if path.is_dir() {
        fs::remove_dir_all(&path)?;
      }
      else {
        fs::remove_file(&path)?;
      }
    }
    Ok(())
  }
}
