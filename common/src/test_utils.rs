use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// `<workspace>/test_output`, created on first use.
pub fn test_output_dir() -> &'static Path {
    static DIR: OnceLock<PathBuf> = OnceLock::new();
    DIR.get_or_init(|| {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .expect("common crate lives inside the workspace")
            .join("test_output");
        std::fs::create_dir_all(&dir).expect("Failed to create test_output directory");
        dir
    })
}

pub fn test_output_path(name: &str) -> PathBuf {
    test_output_dir().join(name)
}

/// Like [`test_output_path`], but removes any file a previous run left behind.
pub fn fresh_test_output_path(name: &str) -> PathBuf {
    let path = test_output_path(name);
    match std::fs::remove_file(&path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => panic!("Failed to remove stale {}: {}", path.display(), e),
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_path_removes_stale_file() {
        let path = test_output_path("common_stale.txt");
        std::fs::write(&path, b"stale").unwrap();

        let fresh = fresh_test_output_path("common_stale.txt");
        assert_eq!(fresh, path);
        assert!(!fresh.exists());
        assert!(fresh.starts_with(test_output_dir()));
    }
}
