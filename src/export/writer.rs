//! Durable installation of the exported bytes.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::thread;

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

use super::options::{RetryPolicy, WriteStrategy};

/// Install `bytes` at `path` with the given strategy, retrying on I/O errors.
pub fn install_artifact(
    path: &Path,
    bytes: &[u8],
    strategy: WriteStrategy,
    retry: &RetryPolicy,
) -> Result<()> {
    match strategy {
        WriteStrategy::ReplaceInPlace => write_with_retry(path, retry, || replace_in_place(path, bytes)),
        WriteStrategy::AtomicRename => {
            let staged = stage(path, bytes)?;
            let mut pending = Some(staged);
            write_with_retry(path, retry, || {
                let file = pending
                    .take()
                    .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "staged file already consumed"))?;
                file.persist(path).map(|_| ()).map_err(|e| {
                    let error = e.error;
                    pending = Some(e.file);
                    error
                })
            })
        }
    }
}

/// Run `operation` up to `retry.attempts()` times, sleeping `retry.delay`
/// between attempts. The last attempt's error is returned.
pub fn write_with_retry<F>(path: &Path, retry: &RetryPolicy, mut operation: F) -> Result<()>
where
    F: FnMut() -> io::Result<()>,
{
    let attempts = retry.attempts();
    let mut attempt = 1;

    loop {
        match operation() {
            Ok(()) => {
                if attempt > 1 {
                    log::debug!("Wrote {} on attempt {}", path.display(), attempt);
                }
                return Ok(());
            }
            Err(source) if attempt >= attempts => {
                return Err(Error::Write {
                    path: path.to_path_buf(),
                    attempts: attempt,
                    source,
                });
            }
            Err(e) => {
                log::warn!(
                    "Write to {} failed (attempt {}/{}): {}",
                    path.display(),
                    attempt,
                    attempts,
                    e
                );
                thread::sleep(retry.delay);
                attempt += 1;
            }
        }
    }
}

fn replace_in_place(path: &Path, bytes: &[u8]) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::write(path, bytes)
}

/// Write the bytes to a temporary file next to `path`.
fn stage(path: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    let staged = (|| {
        let mut file = NamedTempFile::new_in(directory)?;
        file.write_all(bytes)?;
        file.as_file().sync_all()?;
        Ok::<_, io::Error>(file)
    })();

    staged.map_err(|source| Error::Write {
        path: path.to_path_buf(),
        attempts: 1,
        source,
    })
}
