// NOTE This kind of import-all file isn't a common Rust idiom.

pub use crate::{
  colmap::*,
  command::*,
  error::*,
  frames::*,
  pipeline::*,
  poses::*,
  reconstruct::*,
  transforms::*,
  types::*,
  util::*,
  video::*,
};

pub use {
  std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
    process::Command,
  },
  log::{debug, error, info, warn, LevelFilter},
  anyhow::{anyhow, bail, Context as AnyhowContext, Result},
};
