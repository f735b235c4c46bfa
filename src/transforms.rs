use crate::all::*;

use serde::Serialize;

pub const TRANSFORMS_FILE: &str = "transforms.json";

// Dataset-level pose metadata: the shared intrinsics plus one entry per
// grouped frame, in the shape neural rendering loaders read.
#[derive(Serialize)]
struct TransformsFile<'a> {
  #[serde(flatten)]
  intrinsics: CameraIntrinsics,
  frames: Vec<TransformFrame<'a>>,
}

#[derive(Serialize)]
struct TransformFrame<'a> {
  file_path: &'a str,
  transform_matrix: [[f64; 4]; 4],
  camera_id: usize,
  time: u64,
}

// Writes `transforms.json` at the dataset root, replacing any previous one.
pub fn write_transforms(
  path: &Path,
  groups: &TimestampGroups,
  intrinsics: &CameraIntrinsics,
) -> Result<()> {
  let mut frames = vec![];
  for (time, group) in groups {
    for frame in group {
      frames.push(TransformFrame {
        file_path: &frame.file_path,
        transform_matrix: matrix_rows(&frame.transform),
        camera_id: frame.camera_id,
        time: *time,
      });
    }
  }
  let count = frames.len();
  let root = TransformsFile { intrinsics: *intrinsics, frames };
  let file = path.join(TRANSFORMS_FILE);
  let json = serde_json::to_string_pretty(&root)?;
  fs::write(&file, json)
    .context(format!("Failed to write {}.", file.display()))?;
  info!("Wrote {} frame entries to {}.", count, file.display());
  Ok(())
}

// nalgebra stores matrices column-major; the JSON wants nested rows.
fn matrix_rows(m: &Matrix4d) -> [[f64; 4]; 4] {
  let mut rows = [[0.; 4]; 4];
  for r in 0..4 {
    for c in 0..4 {
      rows[r][c] = m[(r, c)];
    }
  }
  rows
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_write_transforms() {
    let dir = tempfile::tempdir().unwrap();
    let mut transform = Matrix4d::identity();
    transform[(0, 3)] = 2.5;
    let mut groups = TimestampGroups::new();
    groups.insert(7, vec![FrameDescriptor {
      file_path: "images/camA_0007.png".to_string(),
      transform,
      camera_id: 0,
    }]);
    let intrinsics = CameraIntrinsics {
      width: 1920., height: 1080., fl_x: 500., fl_y: 500., cx: 960., cy: 540.,
    };
    write_transforms(dir.path(), &groups, &intrinsics).unwrap();

    let text = fs::read_to_string(dir.path().join(TRANSFORMS_FILE)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["w"], 1920.);
    assert_eq!(json["h"], 1080.);
    assert_eq!(json["fl_y"], 500.);
    assert_eq!(json["cx"], 960.);
    let frames = json["frames"].as_array().unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["file_path"], "images/camA_0007.png");
    assert_eq!(frames[0]["camera_id"], 0);
    assert_eq!(frames[0]["time"], 7);
    assert_eq!(frames[0]["transform_matrix"][0][3], 2.5);
    assert_eq!(frames[0]["transform_matrix"][3][3], 1.0);
  }
}
