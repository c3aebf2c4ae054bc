use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Child;
use tokio::process::Command;

/// Controls whether the child's stdin is connected to a pipe. Stdout and
/// stderr are always piped so the executor can accumulate them separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StdinPolicy {
    Piped,
    Null,
}

/// Spawns the requested program with stdout/stderr piped and the child placed
/// in its own process group, so a later timeout can terminate the whole
/// process tree rather than just the direct child.
///
/// The child inherits the parent environment with `extra_env` overlaid.
pub(crate) fn spawn_child_async(
    program: &str,
    args: &[String],
    cwd: &Path,
    extra_env: &HashMap<String, String>,
    stdin: StdinPolicy,
) -> io::Result<Child> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .envs(extra_env)
        .stdin(match stdin {
            StdinPolicy::Piped => Stdio::piped(),
            StdinPolicy::Null => Stdio::null(),
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    cmd.process_group(0);

    cmd.spawn()
}

/// SIGKILLs the process group rooted at `child`. A group that has already
/// exited is not an error.
#[cfg(unix)]
pub(crate) fn kill_child_process_group(child: &mut Child) -> io::Result<()> {
    use std::io::ErrorKind;

    if let Some(pid) = child.id() {
        let pid = pid as libc::pid_t;
        let pgid = unsafe { libc::getpgid(pid) };
        if pgid == -1 {
            let err = io::Error::last_os_error();
            if err.kind() != ErrorKind::NotFound {
                return Err(err);
            }
            return Ok(());
        }

        let result = unsafe { libc::killpg(pgid, libc::SIGKILL) };
        if result == -1 {
            let err = io::Error::last_os_error();
            if err.kind() != ErrorKind::NotFound {
                return Err(err);
            }
        }
    }

    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn kill_child_process_group(_: &mut Child) -> io::Result<()> {
    Ok(())
}
