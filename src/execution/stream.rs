//! Line-oriented forwarding of child process output.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Capacity of the channel carrying output lines.
pub const LINE_CHANNEL_CAPACITY: usize = 64;

/// Forward lines from `reader` into `tx` on a separate task.
///
/// Lines are decoded lossily and stripped of their terminator. Once the
/// receiver is gone the task keeps draining the reader so the writing
/// process never stalls on a full pipe. The task ends at end of stream.
pub fn forward_lines<R>(reader: R, tx: mpsc::Sender<String>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut tx = Some(tx);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let Some(sender) = tx.as_ref() else {
                        continue;
                    };
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\n', '\r'])
                        .to_string();
                    if sender.send(line).await.is_err() {
                        tx = None;
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "output stream read failed");
                    break;
                }
            }
        }
    })
}

/// Take the child's stdout and stderr and merge them, line by line in
/// arrival order, into one receiver. The receiver yields `None` once both
/// streams are closed.
pub fn merge_output(child: &mut Child) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);

    if let Some(stdout) = child.stdout.take() {
        forward_lines(stdout, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(stderr, tx);
    }

    rx
}

/// Configure stdio the way every gateway child runs: no stdin, both
/// output streams piped, killed if the handle is dropped.
pub(crate) fn piped(cmd: &mut Command) -> &mut Command {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
}
