use std::io::Write;

use tempfile::NamedTempFile;

/// A fresh temp file holding `bytes`, removed when dropped.
pub fn image_file(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

mod tests {
    use super::*;

    #[test]
    fn images_get_distinct_paths_and_vanish_on_drop() {
        let first = image_file(b"first");
        let second = image_file(b"second");
        assert_ne!(first.path(), second.path());
        assert_eq!(std::fs::read(first.path()).unwrap(), b"first");

        let path = first.path().to_path_buf();
        drop(first);
        assert!(!path.exists());
        assert_eq!(std::fs::read(second.path()).unwrap(), b"second");
    }

    #[test]
    fn creating_an_image_leaves_existing_files_alone() {
        let existing = image_file(b"keep me");
        let _other = image_file(b"overwrite?");
        assert_eq!(std::fs::read(existing.path()).unwrap(), b"keep me");
    }
}
