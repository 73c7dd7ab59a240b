//! Filesystem access behind a trait, so config loading, payload reading and
//! `init` can run against an in-memory store in tests.

use std::io;
use std::path::Path;

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Create or truncate `path` and write `content`.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

pub fn default_fs() -> &'static RealFs {
    static INSTANCE: RealFs = RealFs;
    &INSTANCE
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// In-memory filesystem keyed by path.
    #[derive(Debug, Default)]
    pub struct MockFs {
        files: Mutex<BTreeMap<PathBuf, String>>,
    }

    impl MockFs {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_file(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
            let fs = Self::new();
            fs.files.lock().unwrap().insert(path.into(), content.into());
            fs
        }

        pub fn contents(&self, path: &Path) -> Option<String> {
            self.files.lock().unwrap().get(path).cloned()
        }
    }

    impl FileSystem for MockFs {
        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            self.contents(path).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such file: {}", path.display()),
                )
            })
        }

        fn write(&self, path: &Path, content: &str) -> io::Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), content.to_string());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.lock().unwrap().contains_key(path)
        }
    }

    #[test]
    fn test_mock_round_trip() {
        let fs = MockFs::with_file("/data/a.json", "{}");
        assert!(fs.exists(Path::new("/data/a.json")));
        assert!(fs.read_to_string(Path::new("/data/b.json")).is_err());

        fs.write(Path::new("/data/b.json"), "[]").unwrap();
        assert_eq!(fs.read_to_string(Path::new("/data/b.json")).unwrap(), "[]");
    }
}
