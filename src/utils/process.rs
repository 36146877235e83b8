//! Child-process helpers for the external yt-dlp and ffmpeg tools

use std::ffi::OsStr;
use std::path::Path;
use std::process::Output;

use tokio::process::Command;

use crate::core::models::{AppError, AppResult};

/// Run an external tool to completion, capturing stdout and stderr.
///
/// A spawn failure with `ErrorKind::NotFound` is reported as a distinct
/// tool-missing error so callers can tell "not installed" apart from
/// "ran and failed".
pub async fn run_tool<I, S>(program: &Path, args: I) -> AppResult<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::ToolMissing {
                tool: tool_name(program),
            },
            _ => AppError::Io(e),
        })?;

    Ok(output)
}

/// Run an external tool and require a zero exit status.
pub async fn run_tool_checked<I, S>(program: &Path, args: I) -> AppResult<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = run_tool(program, args).await?;

    if output.status.success() {
        Ok(output)
    } else {
        Err(exit_error(program, &output))
    }
}

/// Build a `ToolFailed` error carrying the exit code, stdout, and stderr of
/// a finished child process.
pub fn exit_error(program: &Path, output: &Output) -> AppError {
    AppError::ToolFailed {
        tool: tool_name(program),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
    }
}

/// Display name for a tool, e.g. "ffmpeg" from "/usr/bin/ffmpeg".
pub fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_tool_name_strips_directories() {
        assert_eq!(tool_name(Path::new("/usr/bin/ffmpeg")), "ffmpeg");
        assert_eq!(tool_name(Path::new("yt-dlp")), "yt-dlp");
    }

    #[tokio::test]
    async fn test_missing_tool_is_distinct() {
        let program = PathBuf::from("/definitely/not/a/real/tool");
        let result = run_tool(&program, ["--version"]).await;

        match result {
            Err(AppError::ToolMissing { tool }) => assert_eq!(tool, "tool"),
            other => panic!("expected ToolMissing, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_captures_output() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fail.sh");
        std::fs::write(&script, "#!/bin/sh\necho out\necho err >&2\nexit 3\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let result = run_tool_checked(&script, std::iter::empty::<&str>()).await;

        match result {
            Err(AppError::ToolFailed {
                tool,
                code,
                stdout,
                stderr,
            }) => {
                assert_eq!(tool, "fail.sh");
                assert_eq!(code, Some(3));
                assert_eq!(stdout, "out");
                assert_eq!(stderr, "err");
            }
            other => panic!("expected ToolFailed, got {:?}", other.map(|_| ())),
        }
    }
}
