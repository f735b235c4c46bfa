use crate::all::*;

// Structured arguments for the external reconstruction stages. The
// orchestrator only fills in these records; how they turn into command lines
// is up to the implementation, and tests substitute their own.

#[derive(Clone, Debug)]
pub struct FeatureExtractionJob {
  pub database: PathBuf,
  pub images: PathBuf,
  pub camera_model: &'static str,
  pub single_camera: bool,
  pub use_gpu: bool,
}

#[derive(Clone, Debug)]
pub struct ExhaustiveMatchingJob {
  pub database: PathBuf,
  pub use_gpu: bool,
}

#[derive(Clone, Debug)]
pub struct SparseMappingJob {
  pub database: PathBuf,
  pub images: PathBuf,
  pub output: PathBuf,
  pub ba_tolerance: f64,
}

#[derive(Clone, Debug)]
pub struct UndistortionJob {
  pub images: PathBuf,
  pub sparse_model: PathBuf,
  pub output: PathBuf,
}

// One method per stage, each blocking until the stage has fully completed.
pub trait ReconstructionPipeline {
  fn extract_features(&self, job: &FeatureExtractionJob) -> Result<()>;

  fn match_exhaustive(&self, job: &ExhaustiveMatchingJob) -> Result<()>;

  fn map_sparse(&self, job: &SparseMappingJob) -> Result<()>;

  fn undistort(&self, job: &UndistortionJob) -> Result<()>;
}
