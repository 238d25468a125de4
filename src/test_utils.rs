#[cfg(test)]
pub mod fixtures {
    use std::fs::{self, File};
    use std::io::Read;
    use std::path::Path;
    use tempfile::TempDir;

    /// Create `files` (slash-separated, relative) under `root`, each holding
    /// its own relative path as content.
    pub fn write_files(root: &Path, files: &[&str]) {
        for name in files {
            let path = root.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, name).unwrap();
        }
    }

    /// A fresh temporary profile directory containing `files`.
    pub fn profile_with(files: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        write_files(temp.path(), files);
        temp
    }

    /// Entry names and contents of a `.tar.zst` archive, in archive order.
    pub fn read_archive(path: &Path) -> Vec<(String, Vec<u8>)> {
        let decoder = zstd::Decoder::new(File::open(path).unwrap()).unwrap();
        let mut archive = tar::Archive::new(decoder);
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let name = entry.path().unwrap().to_string_lossy().into_owned();
                let mut content = Vec::new();
                entry.read_to_end(&mut content).unwrap();
                (name, content)
            })
            .collect()
    }

    /// Sorted file names directly inside `dir`.
    pub fn list_dir(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
