use derive_new::new;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Eq, PartialEq, new)]
pub struct FileSpec {
    pub path: PathBuf,
    pub content: String,
}

pub fn write_file(file_spec: FileSpec) {
    // make sure the parent directory exists
    if let Some(parent) = file_spec.path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("Failed to create directory {:?}: {}", parent, e));
    }

    std::fs::write(&file_spec.path, &file_spec.content)
        .unwrap_or_else(|e| panic!("Failed to write file {:?}: {}", file_spec.path, e));
}

/// Write `files_count` files with generated names and content into `dir`
pub fn write_generated_files(dir: &Path, files_count: usize) -> Vec<FileSpec> {
    use fake::Fake;
    use fake::faker::lorem::en::{Word, Words};

    (0..files_count)
        .map(|i| {
            let file_name = format!("{}-{}.txt", Word().fake::<String>(), i);
            let content = Words(5..10).fake::<Vec<String>>().join(" ");
            let file_spec = FileSpec::new(dir.join(file_name), content);
            write_file(file_spec.clone());
            file_spec
        })
        .collect()
}

pub fn delete_path(path: &Path) {
    if path.is_dir() {
        std::fs::remove_dir_all(path)
            .unwrap_or_else(|e| panic!("Failed to delete directory {:?}: {}", path, e));
    } else {
        std::fs::remove_file(path)
            .unwrap_or_else(|e| panic!("Failed to delete file {:?}: {}", path, e));
    }
}
