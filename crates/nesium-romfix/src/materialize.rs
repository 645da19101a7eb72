//! File system side effects, all gated by the dry-run switch.

use std::{
    fs,
    io::{self, BufWriter, Write},
    path::Path,
};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::Error;

#[derive(Debug, Clone, Copy)]
pub struct Materializer {
    dry_run: bool,
}

impl Materializer {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Replace `path` with `header` followed by `content`, cut to `trim_to` bytes.
    pub fn write_rom(
        &self,
        path: &Path,
        header: &[u8],
        content: &[u8],
        trim_to: Option<u64>,
    ) -> Result<(), Error> {
        let content = match trim_to {
            Some(len) => &content[..content.len().min(len as usize)],
            None => content,
        };
        if self.dry_run {
            info!(
                "Dry run: would write {} bytes to {}",
                header.len() + content.len(),
                path.display()
            );
            return Ok(());
        }

        replace_file(path, |out| {
            out.write_all(header)?;
            out.write_all(content)
        })
        .map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            "wrote {} bytes to {}",
            header.len() + content.len(),
            path.display()
        );
        Ok(())
    }

    /// Move `from` to `to`, copying when the two live on different devices.
    pub fn rename(&self, from: &Path, to: &Path) -> Result<(), Error> {
        if self.dry_run {
            info!(
                "Dry run: would move {} to {}",
                from.display(),
                to.display()
            );
            return Ok(());
        }

        let moved = match fs::rename(from, to) {
            Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
                fs::copy(from, to).and_then(|_| fs::remove_file(from))
            }
            other => other,
        };
        moved.map_err(|source| Error::Write {
            path: to.to_path_buf(),
            source,
        })?;
        debug!("moved {} to {}", from.display(), to.display());
        Ok(())
    }

    pub fn remove(&self, path: &Path) -> Result<(), Error> {
        if self.dry_run {
            info!("Dry run: would remove {}", path.display());
            return Ok(());
        }
        fs::remove_file(path).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("removed {}", path.display());
        Ok(())
    }

    pub fn ensure_dir(&self, dir: &Path) -> Result<(), Error> {
        if self.dry_run {
            if !dir.is_dir() {
                info!("Dry run: would create directory {}", dir.display());
            }
            return Ok(());
        }
        fs::create_dir_all(dir).map_err(|source| Error::Write {
            path: dir.to_path_buf(),
            source,
        })
    }
}

/// Stage the new bytes next to `path` and swap them in only once fully written,
/// so a failed write leaves the old file as it was.
fn replace_file<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut staged = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(&mut staged);
        fill(&mut writer)?;
        writer.flush()?;
    }
    if let Some(existing) = fs::metadata(path).ok().filter(|meta| meta.is_file()) {
        staged.as_file().set_permissions(existing.permissions())?;
    }
    staged.persist(path).map_err(|err| err.error)?;
    Ok(())
}
