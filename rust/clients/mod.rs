use std::{
    env,
    path::Path,
    process::{Command, Output},
};

use tracing::debug;

use crate::error::{ConversionError, ConversionResult};

pub mod office;
pub mod poppler;

/// Runs an external converter to completion. Spawn failures and non-zero
/// exits become library errors carrying the program's stderr.
pub(crate) fn run_tool(mut command: Command, program: &str) -> ConversionResult<Output> {
    debug!(?command, "running {program}");

    let output = command.output().map_err(|e| {
        ConversionError::library(format!(
            "failed to spawn {program} ({}): {e}",
            command.get_program().to_string_lossy()
        ))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConversionError::library(format!(
            "{program} exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(output)
}

/// Whether `program` can be executed, either as a path or through `PATH`.
pub fn is_available(program: &Path) -> bool {
    if program.components().count() > 1 {
        return program.is_file();
    }
    env::var_os("PATH")
        .map(|paths| {
            env::split_paths(&paths).any(|dir| {
                let candidate = dir.join(program);
                candidate.is_file() || candidate.with_extension("exe").is_file()
            })
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_a_library_error() {
        let err = run_tool(Command::new("fileconv-no-such-program"), "converter").unwrap_err();
        assert!(!err.is_invalid_input());
        assert!(err.to_string().contains("failed to spawn converter"));
    }

    #[test]
    fn unknown_programs_are_unavailable() {
        assert!(!is_available(Path::new("fileconv-no-such-program")));
        assert!(!is_available(Path::new("/nonexistent/dir/soffice")));
    }

    #[cfg(unix)]
    #[test]
    fn failing_exit_keeps_stderr() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo broken page >&2; exit 3"]);
        let err = run_tool(command, "sh").unwrap_err();
        assert!(err.to_string().contains("broken page"), "{err}");
    }
}
