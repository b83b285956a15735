//! Running bookmarked commands, copying them and opening the store in an
//! editor. All child processes share our terminal.

use std::env;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use log::{debug, info};

use crate::config::{resolve_editor, shell};
use crate::error::{Error, Result};

/// Executes a command attached to the current terminal.
///
/// # Errors
///
/// Returns an error if command execution fails or exits with non-zero status.
pub fn execute_command(mut command: Command) -> Result<()> {
    let command = command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let subprocess_exit_success = command.spawn()?.wait()?.success();

    if subprocess_exit_success {
        Ok(())
    } else {
        Err(Error::SubProcessExit)
    }
}

/// Runs `line` through the user's shell.
///
/// # Errors
///
/// Returns an error if the shell cannot be spawned or the command fails.
pub fn run_shell_command(line: &str) -> Result<()> {
    let shell = shell();
    info!("Running `{line}` with {shell}");

    let mut command = Command::new(shell);
    command.arg("-c").arg(line);
    execute_command(command)
}

/// A clipboard program with its arguments.
type ClipboardTool = (&'static str, &'static [&'static str]);

const WAYLAND_TOOL: ClipboardTool = ("wl-copy", &[]);
const X11_TOOLS: [ClipboardTool; 2] = [
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

fn clipboard_tool(
    os: &str,
    wayland: bool,
    available: impl Fn(&str) -> bool,
) -> Result<ClipboardTool> {
    match os {
        "macos" => Ok(("pbcopy", &[])),
        "linux" | "freebsd" | "openbsd" | "netbsd" => {
            let wayland_tool = wayland.then_some(WAYLAND_TOOL);
            wayland_tool
                .into_iter()
                .chain(X11_TOOLS)
                .find(|(program, _)| available(program))
                .ok_or(Error::NoClipboardUtility)
        }
        other => Err(Error::ClipboardUnsupported(other.to_string())),
    }
}

fn find_in_path(program: &str) -> bool {
    env::var_os("PATH").is_some_and(|paths| {
        env::split_paths(&paths).any(|dir| dir.join(program).is_file())
    })
}

/// Copies `text` to the system clipboard using the platform's utility.
///
/// # Errors
///
/// Returns [`Error::NoClipboardUtility`] when no utility is installed,
/// [`Error::ClipboardUnsupported`] on other platforms, or a sub process
/// error when the utility fails.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let wayland = env::var_os("WAYLAND_DISPLAY").is_some_and(|d| !d.is_empty());
    let (program, args) = clipboard_tool(env::consts::OS, wayland, find_in_path)?;
    debug!("Copying {} bytes with {program}", text.len());

    let mut command = Command::new(program);
    command.args(args);
    pipe_to(command, text)
}

/// Feeds `text` to the stdin of `command` and waits for it to exit. The
/// child is always reaped, also when writing fails.
///
/// # Errors
///
/// Returns a sub process error if the child cannot be spawned, its stdin
/// cannot be written, or it exits with a non-zero status.
pub fn pipe_to(mut command: Command, text: &str) -> Result<()> {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    let written = child
        .stdin
        .take()
        .map_or(Ok(()), |mut stdin| stdin.write_all(text.as_bytes()));
    let status = child.wait()?;
    written?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::SubProcessExit)
    }
}

/// Quotes `value` for a POSIX shell.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Builds the shell invocation that opens `path` in the resolved editor.
#[must_use]
pub fn editor_command(path: &Path, configured_editor: Option<&str>) -> Command {
    let editor = resolve_editor(configured_editor);
    let line = format!("{editor} {}", shell_quote(&path.to_string_lossy()));

    let mut command = Command::new(shell());
    command.arg("-c").arg(line);
    command
}

/// Opens `path` in the configured editor, `$EDITOR`, or `vi`, and waits for it.
///
/// # Errors
///
/// Returns an error if the editor cannot be started or exits unsuccessfully.
pub fn open_in_editor(path: &Path, configured_editor: Option<&str>) -> Result<()> {
    info!("Opening `{}` in editor", path.display());
    execute_command(editor_command(path, configured_editor))
}
