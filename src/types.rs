// Eigen-like aliases.
pub type Matrix3d = nalgebra::Matrix3::<f64>;
pub type Matrix4d = nalgebra::Matrix4::<f64>;
// One raw pose row: a 3x4 extrinsic block plus a [height, width, focal] column.
pub type Matrix3x5d = nalgebra::Matrix3x5::<f64>;
