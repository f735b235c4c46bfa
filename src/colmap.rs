use crate::all::*;

// Runs the reconstruction stages through the COLMAP command line tool.
pub struct ColmapPipeline {
  pub binary: String,
}

impl Default for ColmapPipeline {
  fn default() -> ColmapPipeline {
    ColmapPipeline { binary: "colmap".to_string() }
  }
}

impl ColmapPipeline {
  fn command(&self, subcommand: &str) -> Command {
    let mut command = Command::new(&self.binary);
    command.arg(subcommand);
    command
  }
}

// COLMAP encodes booleans as 0/1 option values.
fn flag(on: bool) -> &'static str {
  if on { "1" } else { "0" }
}

impl ReconstructionPipeline for ColmapPipeline {
  fn extract_features(&self, job: &FeatureExtractionJob) -> Result<()> {
    let mut command = self.command("feature_extractor");
    command
      .arg("--database_path").arg(&job.database)
      .arg("--image_path").arg(&job.images)
      .arg("--ImageReader.single_camera").arg(flag(job.single_camera))
      .arg("--ImageReader.camera_model").arg(job.camera_model)
      .arg("--SiftExtraction.use_gpu").arg(flag(job.use_gpu));
    run_command(&mut command, "feature extraction")
  }

  fn match_exhaustive(&self, job: &ExhaustiveMatchingJob) -> Result<()> {
    let mut command = self.command("exhaustive_matcher");
    command
      .arg("--database_path").arg(&job.database)
      .arg("--SiftMatching.use_gpu").arg(flag(job.use_gpu));
    run_command(&mut command, "exhaustive matching")
  }

  fn map_sparse(&self, job: &SparseMappingJob) -> Result<()> {
    let mut command = self.command("mapper");
    command
      .arg("--database_path").arg(&job.database)
      .arg("--image_path").arg(&job.images)
      .arg("--output_path").arg(&job.output)
      .arg(format!("--Mapper.ba_global_function_tolerance={}", job.ba_tolerance));
    run_command(&mut command, "sparse mapping")
  }

  fn undistort(&self, job: &UndistortionJob) -> Result<()> {
    let mut command = self.command("image_undistorter");
    command
      .arg("--image_path").arg(&job.images)
      .arg("--input_path").arg(&job.sparse_model)
      .arg("--output_path").arg(&job.output)
      .arg("--output_type").arg("COLMAP");
    run_command(&mut command, "image undistortion")
  }
}
