use crate::all::*;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

// One image scheduled for reconstruction: its path relative to the dataset
// root, the capturing camera and that camera's normalized pose.
#[derive(Clone, Debug)]
pub struct FrameDescriptor {
  pub file_path: String,
  pub transform: Matrix4d,
  pub camera_id: usize,
}

// Frames keyed by capture time. BTreeMap iteration order is the ascending
// processing order required downstream.
pub type TimestampGroups = BTreeMap<u64, Vec<FrameDescriptor>>;

// Lists the dataset images, loads and normalizes the per-camera poses and
// groups the frames by capture time.
pub fn prepare_frames(path: &Path) -> Result<(TimestampGroups, CameraIntrinsics)> {
  let images = list_images(path)?;
  let records = load_pose_records(path)?;
  let poses: Vec<Matrix4d> = records.iter().map(|r| normalize_pose(&r.pose_hwf)).collect();
  let groups = group_frames(&images, &poses)?;
  let intrinsics = CameraIntrinsics::from_hwf(&records[0].pose_hwf);
  info!("Grouped {} images from {} cameras into {} timestamps.",
    images.len(), poses.len(), groups.len());
  Ok((groups, intrinsics))
}

// Relative paths of the dataset's images, lexicographically sorted. An absent
// directory and an empty one are the same condition to the caller.
pub fn list_images(path: &Path) -> Result<Vec<String>> {
  let dir = path.join("images");
  let mut images = vec![];
  if let Ok(entries) = fs::read_dir(&dir) {
    for entry in entries {
      let entry = entry?;
      if let Some(name) = entry.file_name().to_str() {
        let is_image = Path::new(name).extension()
          .and_then(|e| e.to_str())
          .map_or(false, |e| IMAGE_EXTENSIONS.contains(&e));
        if is_image {
          images.push(format!("images/{}", name));
        }
      }
    }
  }
  if images.is_empty() {
    return Err(PrepError::NoImages(dir).into());
  }
  images.sort();
  Ok(images)
}

// Splits an image name of the form `<camera>_<time>.<ext>` into the camera
// name (before the first underscore) and the integer capture time (between
// the last underscore and the extension).
pub fn parse_frame_name(path: &str) -> Result<(&str, u64)> {
  let name = path.rsplit('/').next().unwrap_or(path);
  let malformed = || PrepError::MalformedName(path.to_string());
  let (_, tail) = name.rsplit_once('_').ok_or_else(malformed)?;
  let digits = tail.split('.').next().unwrap_or(tail);
  let time = digits.parse::<u64>().map_err(|_| malformed())?;
  let camera = name.split('_').next().unwrap_or(name);
  Ok((camera, time))
}

// Partitions the images into per-timestamp groups. Cameras get ids in sorted
// name order, which must line up with the pose row order; the counts are
// checked so a misaligned pose file fails here instead of corrupting every
// downstream transform.
pub fn group_frames(images: &[String], poses: &[Matrix4d]) -> Result<TimestampGroups> {
  let mut cameras = BTreeSet::new();
  for image in images {
    let (camera, _) = parse_frame_name(image)?;
    cameras.insert(camera);
  }
  if cameras.len() != poses.len() {
    return Err(PrepError::CameraMismatch {
      rows: poses.len(),
      cameras: cameras.len(),
    }.into());
  }

  let mut groups = TimestampGroups::new();
  for (camera_id, camera) in cameras.iter().enumerate() {
    for image in images {
      let (name, time) = parse_frame_name(image)?;
      if name != *camera { continue }
      let group = groups.entry(time).or_insert_with(Vec::new);
      if group.iter().any(|f| f.camera_id == camera_id) {
        return Err(PrepError::DuplicateFrame { camera: camera.to_string(), time }.into());
      }
      group.push(FrameDescriptor {
        file_path: image.clone(),
        transform: poses[camera_id],
        camera_id,
      });
    }
  }
  Ok(groups)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn make_images(dir: &Path, names: &[&str]) {
    let images = dir.join("images");
    fs::create_dir_all(&images).unwrap();
    for name in names {
      fs::write(images.join(name), b"x").unwrap();
    }
  }

  fn dummy_poses(n: usize) -> Vec<Matrix4d> {
    (0..n).map(|i| Matrix4d::identity() * (i + 1) as f64).collect()
  }

  fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
  }

  #[test]
  fn test_parse_frame_name() {
    assert_eq!(parse_frame_name("camA_0012.png").unwrap(), ("camA", 12));
    assert_eq!(parse_frame_name("images/camA_0012.png").unwrap(), ("camA", 12));
    // Camera is the part before the first underscore, time follows the last.
    assert_eq!(parse_frame_name("cam_left_0003.jpg").unwrap(), ("cam", 3));
  }

  #[test]
  fn test_parse_frame_name_malformed() {
    for name in ["bad.png", "cam_x7.png", "cam_.png"] {
      let err = parse_frame_name(name).unwrap_err();
      assert!(matches!(
        err.downcast_ref::<PrepError>(),
        Some(PrepError::MalformedName(_))
      ));
    }
  }

  #[test]
  fn test_list_images_sorted_and_filtered() {
    let dir = tempfile::tempdir().unwrap();
    make_images(dir.path(), &[
      "b_0001.png", "a_0001.jpg", "c_0001.jpeg", "notes.txt", "d_0001.tiff",
    ]);
    let images = list_images(dir.path()).unwrap();
    assert_eq!(images, owned(&[
      "images/a_0001.jpg", "images/b_0001.png", "images/c_0001.jpeg",
    ]));
  }

  #[test]
  fn test_list_images_absent_or_empty() {
    let dir = tempfile::tempdir().unwrap();
    let missing = list_images(dir.path()).unwrap_err();
    assert!(matches!(
      missing.downcast_ref::<PrepError>(),
      Some(PrepError::NoImages(_))
    ));
    fs::create_dir_all(dir.path().join("images")).unwrap();
    let empty = list_images(dir.path()).unwrap_err();
    assert!(matches!(
      empty.downcast_ref::<PrepError>(),
      Some(PrepError::NoImages(_))
    ));
  }

  #[test]
  fn test_group_frames_by_shared_time() {
    let images = owned(&[
      "images/camA_0000.png", "images/camA_0001.png",
      "images/camB_0000.png", "images/camB_0001.png",
    ]);
    let groups = group_frames(&images, &dummy_poses(2)).unwrap();
    let times: Vec<u64> = groups.keys().copied().collect();
    assert_eq!(times, [0, 1]);
    for (time, group) in &groups {
      assert_eq!(group.len(), 2);
      assert_eq!(group[0].camera_id, 0);
      assert_eq!(group[1].camera_id, 1);
      assert_eq!(group[0].file_path, format!("images/camA_{:04}.png", time));
      assert_eq!(group[1].file_path, format!("images/camB_{:04}.png", time));
    }
    // Every image lands in exactly one group.
    let total: usize = groups.values().map(|g| g.len()).sum();
    assert_eq!(total, images.len());
  }

  #[test]
  fn test_group_frames_prefix_not_substring() {
    // `cam1` must not swallow `cam10`'s images.
    let images = owned(&["images/cam1_0000.png", "images/cam10_0000.png"]);
    let groups = group_frames(&images, &dummy_poses(2)).unwrap();
    let group = &groups[&0];
    assert_eq!(group.len(), 2);
    assert_eq!(group[0].file_path, "images/cam1_0000.png");
    assert_eq!(group[0].camera_id, 0);
    assert_eq!(group[1].file_path, "images/cam10_0000.png");
    assert_eq!(group[1].camera_id, 1);
  }

  #[test]
  fn test_group_frames_pose_row_mismatch() {
    let images = owned(&["images/camA_0000.png"]);
    let err = group_frames(&images, &dummy_poses(2)).unwrap_err();
    match err.downcast_ref::<PrepError>() {
      Some(PrepError::CameraMismatch { rows, cameras }) => {
        assert_eq!(*rows, 2);
        assert_eq!(*cameras, 1);
      },
      _ => panic!("expected a camera mismatch"),
    }
  }

  #[test]
  fn test_group_frames_duplicate_time() {
    let images = owned(&["images/camA_0.jpg", "images/camA_0000.png"]);
    let err = group_frames(&images, &dummy_poses(1)).unwrap_err();
    assert!(matches!(
      err.downcast_ref::<PrepError>(),
      Some(PrepError::DuplicateFrame { time: 0, .. })
    ));
  }

  #[test]
  fn test_prepare_frames_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    make_images(dir.path(), &["b_0000.png", "a_0000.png"]);
    let rows: Vec<Vec<f64>> = (0..2)
      .map(|r| (0..17).map(|c| (r * 17 + c) as f64).collect())
      .collect();
    write_poses_npy(&dir.path().join(POSES_BOUNDS_FILE), &rows);

    let (first, intrinsics) = prepare_frames(dir.path()).unwrap();
    let (second, _) = prepare_frames(dir.path()).unwrap();
    let ids = |groups: &TimestampGroups| -> Vec<(String, usize)> {
      groups[&0].iter().map(|f| (f.file_path.clone(), f.camera_id)).collect()
    };
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(ids(&first), [
      ("images/a_0000.png".to_string(), 0),
      ("images/b_0000.png".to_string(), 1),
    ]);

    // Camera 0's HWF column is [4, 9, 14] in row-major order.
    assert_eq!(intrinsics.height, 4.);
    assert_eq!(intrinsics.width, 9.);
    assert_eq!(intrinsics.fl_x, 14.);
    assert_eq!(intrinsics.cx, 4.);
    assert_eq!(intrinsics.cy, 2.);
  }
}
