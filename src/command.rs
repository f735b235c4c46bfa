use crate::all::*;

// Runs one external command to completion. Any non-zero exit is fatal for
// the whole run, so the caller only sees `Ok` when the stage fully succeeded.
pub fn run_command(command: &mut Command, stage: &'static str) -> Result<()> {
  info!("Running: {}", render_command(command));
  let status = command.status()
    .context(format!("Failed to start {}.", stage))?;
  if status.success() { return Ok(()) }
  let code = status.code().unwrap_or(-1);
  error!("{} failed with code {}.", stage, code);
  Err(PrepError::CommandFailed { stage, code }.into())
}

fn render_command(command: &Command) -> String {
  let mut s = command.get_program().to_string_lossy().into_owned();
  for arg in command.get_args() {
    s.push(' ');
    s.push_str(&arg.to_string_lossy());
  }
  s
}
