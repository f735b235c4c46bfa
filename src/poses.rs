use crate::all::*;

use serde::Serialize;

pub const POSES_BOUNDS_FILE: &str = "poses_bounds.npy";

// 15 entries of the row-major 3x5 pose block plus the near/far depth bounds.
const POSE_COLUMNS: usize = 17;

// One row of the pose array, as captured.
pub struct PoseRecord {
  pub pose_hwf: Matrix3x5d,
  pub near: f64,
  pub far: f64,
}

// Shared pinhole intrinsics derived from camera 0. The serialized names are
// the ones neural rendering loaders expect.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct CameraIntrinsics {
  #[serde(rename = "w")]
  pub width: f64,
  #[serde(rename = "h")]
  pub height: f64,
  pub fl_x: f64,
  pub fl_y: f64,
  pub cx: f64,
  pub cy: f64,
}

impl CameraIntrinsics {
  // The last column of a raw pose block is [height, width, focal length].
  pub fn from_hwf(pose: &Matrix3x5d) -> CameraIntrinsics {
    let height = pose[(0, 4)];
    let width = pose[(1, 4)];
    let focal = pose[(2, 4)];
    CameraIntrinsics {
      width,
      height,
      fl_x: focal,
      fl_y: focal,
      cx: (width / 2.).floor(),
      cy: (height / 2.).floor(),
    }
  }
}

// Loads `poses_bounds.npy` from the dataset root: a little-endian f64 array
// of shape (N, 17) in C order, one row per camera.
pub fn load_pose_records(path: &Path) -> Result<Vec<PoseRecord>> {
  let file = path.join(POSES_BOUNDS_FILE);
  let bytes = fs::read(&file)
    .context(format!("Failed to read {}.", file.display()))?;
  let npy = npyz::NpyFile::new(&bytes[..])
    .context(format!("Failed to parse {}.", file.display()))?;

  let shape = npy.shape().to_vec();
  if shape.len() != 2 || shape[1] != POSE_COLUMNS as u64 {
    bail!("{} has shape {:?}, expected (N, {}).", file.display(), shape, POSE_COLUMNS);
  }
  if !matches!(npy.order(), npyz::Order::C) {
    bail!("{} is not stored in C order.", file.display());
  }

  let values: Vec<f64> = npy.into_vec()
    .context(format!("Failed to read f64 values from {}.", file.display()))?;
  let records: Vec<PoseRecord> = values.chunks_exact(POSE_COLUMNS)
    .map(|row| PoseRecord {
      pose_hwf: Matrix3x5d::from_row_slice(&row[..15]),
      near: row[15],
      far: row[16],
    })
    .collect();

  let near = records.iter().map(|r| r.near).fold(f64::INFINITY, f64::min);
  let far = records.iter().map(|r| r.far).fold(f64::NEG_INFINITY, f64::max);
  debug!("Loaded {} pose rows, depth bounds [{:.3}, {:.3}].", records.len(), near, far);
  Ok(records)
}

// Converts one raw 3x5 pose block into the homogeneous transform of the
// reconstruction convention. The steps run in a fixed order and must be the
// same for every camera.
pub fn normalize_pose(pose: &Matrix3x5d) -> Matrix4d {
  let mut out = Matrix4d::identity();
  // Reorder the 3x4 block's columns to [c1, c0, -c2, t], dropping the HWF
  // column; the identity bottom row [0, 0, 0, 1] completes the transform.
  for r in 0..3 {
    out[(r, 0)] = pose[(r, 1)];
    out[(r, 1)] = pose[(r, 0)];
    out[(r, 2)] = -pose[(r, 2)];
    out[(r, 3)] = pose[(r, 3)];
  }
  // Flip the sign of the second and third rotation columns.
  for r in 0..3 {
    out[(r, 1)] = -out[(r, 1)];
    out[(r, 2)] = -out[(r, 2)];
  }
  // Swap the first two rows and negate the third, translation included.
  out.swap_rows(0, 1);
  for c in 0..4 {
    out[(2, c)] = -out[(2, c)];
  }
  out
}

// Serializes rows x columns of f64 values in the .npy layout that
// `load_pose_records` reads back.
#[cfg(test)]
pub fn write_poses_npy(file: &Path, rows: &[Vec<f64>]) {
  use npyz::WriterBuilder;
  let columns = rows.first().map_or(0, |r| r.len());
  let mut bytes = vec![];
  let mut writer = npyz::WriteOptions::new()
    .default_dtype()
    .shape(&[rows.len() as u64, columns as u64])
    .writer(&mut bytes)
    .begin_nd()
    .unwrap();
  for row in rows {
    for value in row {
      writer.push(value).unwrap();
    }
  }
  writer.finish().unwrap();
  fs::write(file, bytes).unwrap();
}
