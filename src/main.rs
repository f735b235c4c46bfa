mod all;
mod colmap;
mod command;
mod error;
mod frames;
mod pipeline;
mod poses;
mod reconstruct;
mod transforms;
mod types;
mod util;
mod video;

use all::*;

use clap::Parser;

#[derive(Parser)]
#[clap(about = "Prepare multi-camera captures for frame-by-frame sparse reconstruction")]
struct Args {
  // Root data directory holding images/ and poses_bounds.npy.
  path: String,

  // Decode the directory's *.mp4 videos into images/ first.
  #[clap(long)]
  extract_frames: bool,

  // Run every reconstruction stage without the GPU.
  #[clap(long)]
  no_gpu: bool,
}

fn handle_error(err: &anyhow::Error) {
  for (i, e) in err.chain().enumerate() {
    eprintln!("  {}: {}", i + 1, e);
  }
}

fn main() {
  if let Err(err) = run() {
    handle_error(&err);
    std::process::exit(1);
  }
}

fn run() -> Result<()> {
  let args = Args::parse();
  env_logger::Builder::new()
    .filter_level(LevelFilter::Info)
    .format(util::format_log)
    .init();

  let base = PathBuf::from(&args.path);
  if !base.exists() {
    return Err(PrepError::MissingPath(base).into());
  }
  // Symlinks staged later point at the sources, so the root must be absolute.
  let base = base.canonicalize()
    .context(format!("Failed to resolve {}.", args.path))?;

  if args.extract_frames {
    extract_frames(&base, &base)?;
    info!("Frame extraction completed.");
  }

  let (groups, intrinsics) = prepare_frames(&base)?;
  write_transforms(&base, &groups, &intrinsics)?;

  let pipeline = ColmapPipeline::default();
  reconstruct_all(&base, &groups, &pipeline, !args.no_gpu)
}
