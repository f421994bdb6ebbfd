// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Owner-only file helpers for the config directory.
//!
//! Keys, certificates and `authorized_keys` are created with mode `0600`
//! inside a `0700` directory on Unix. Other platforms fall back to the
//! default permissions.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Create `dir` (and parents) readable only by the owner.
pub fn create_private_dir(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

fn open_with_mode(path: &Path, options: &mut OpenOptions, mode: u32) -> io::Result<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_private_dir(parent)?;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    options.open(path)
}

/// Write a new file with the given Unix mode, truncating any existing one.
pub fn write_with_mode(path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
    let mut file = open_with_mode(
        path,
        OpenOptions::new().write(true).create(true).truncate(true),
        mode,
    )?;
    file.write_all(contents)?;
    file.sync_all()
}

/// Write a secret (private key) readable only by the owner.
pub fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    write_with_mode(path, contents, 0o600)
}

/// Append to an owner-only file, creating it if missing.
pub fn append_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = open_with_mode(path, OpenOptions::new().append(true).create(true), 0o600)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn append_creates_parents_and_accumulates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("authorized_keys");

        append_private(&path, b"one\n").unwrap();
        append_private(&path, b"two\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn write_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.pem");

        write_private(&path, b"first version").unwrap();
        write_private(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
    }

    #[cfg(unix)]
    #[test]
    fn private_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg").join("id_ed25519");
        write_private(&path, b"secret").unwrap();

        let file_mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        let dir_mode = fs::metadata(dir.path().join("cfg")).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o700);
    }
}
