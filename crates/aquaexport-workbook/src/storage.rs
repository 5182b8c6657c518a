use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Durable storage for serialized documents.
///
/// Implementations report a file held open by another program through an
/// `io::Error` of kind `PermissionDenied` (or the platform's sharing-violation
/// code); the store turns those into `DocumentLocked`.
pub trait DocumentStorage {
    /// Fails when `path` exists but cannot be opened for writing.
    fn probe_writable(&self, path: &Path) -> io::Result<()>;

    /// Replace the contents of `path` with `bytes`, creating parent directories.
    fn persist(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

/// Writes a temp file next to the target and renames it into place, so a
/// failed save never leaves a truncated document behind.
#[derive(Debug, Default, Clone, Copy)]
pub struct AtomicFileStorage;

impl DocumentStorage for AtomicFileStorage {
    fn probe_writable(&self, path: &Path) -> io::Result<()> {
        OpenOptions::new().write(true).open(path).map(drop)
    }

    fn persist(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        if path.exists() {
            self.probe_writable(path)?;
        }
        let mut tmp = temp_builder().tempfile_in(dir)?;
        // Keep the mode of the document being replaced.
        if let Ok(meta) = fs::metadata(path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|err| err.error)?;
        Ok(())
    }
}

/// Temp files default to owner-only; new documents get the umask default of a
/// plain create instead.
fn temp_builder() -> tempfile::Builder<'static, 'static> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".aquaexport");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder
}

impl<T: DocumentStorage + ?Sized> DocumentStorage for &T {
    fn probe_writable(&self, path: &Path) -> io::Result<()> {
        (**self).probe_writable(path)
    }

    fn persist(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        (**self).persist(path, bytes)
    }
}
