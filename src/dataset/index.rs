//! Class Directory Index
//!
//! Scans a directory tree where each immediate subdirectory is a class and
//! every image file underneath it (recursively) is a sample of that class:
//!
//! ```text
//! root/
//! ├── cat/
//! │   ├── cat_001.jpg
//! │   └── extra/cat_002.png
//! └── dog/
//!     └── dog_001.jpg
//! ```
//!
//! Class ids are assigned densely in directory-enumeration order starting at
//! zero. Subdirectory names are sorted before enumeration so the mapping is
//! stable across re-scans; callers should still persist the class-name↔id
//! mapping alongside trained weights.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::utils::error::{DomainPairError, Result};

/// Image file extensions accepted by the scanner (case-insensitive)
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "gif"];

/// A single image sample with its label and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSample {
    /// Absolute path to the image file
    pub path: PathBuf,
    /// Class label index
    pub label: usize,
    /// Class name (the containing subdirectory's basename)
    pub class_name: String,
}

/// A directory-per-class image classification dataset.
///
/// Owns the flat `(path, label)` index built at scan time. An optional
/// `subset` restricts the effective length and indexing to a caller-supplied
/// list of original indices, which realizes train/validation splits without
/// copying any image data.
#[derive(Debug, Clone)]
pub struct ClassificationDataset {
    /// Root directory of the dataset
    root_dir: PathBuf,
    /// All samples, ordered class by class
    samples: Vec<ImageSample>,
    /// Class names in dense-id order
    class_names: Vec<String>,
    /// Mapping from class name to label index
    class_to_idx: HashMap<String, usize>,
    /// Effective view over `samples`; None means the whole set
    subset: Option<Vec<usize>>,
}

impl ClassificationDataset {
    /// Scan `root_dir` and build the index.
    ///
    /// Fails with [`DomainPairError::DirectoryStructure`] when the root has
    /// no class subdirectories. Image decodability is *not* checked here;
    /// a corrupt image surfaces at element-access time (see
    /// [`crate::dataset::paired::DomainPairDataset`]).
    pub fn new<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        let root_dir = root_dir.as_ref();
        if !root_dir.exists() {
            return Err(DomainPairError::PathNotFound(root_dir.to_path_buf()));
        }
        let root_dir = root_dir.canonicalize()?;
        info!("Scanning classification dataset at {:?}", root_dir);

        // Immediate subdirectories are classes
        let mut class_dirs: Vec<(String, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(&root_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    class_dirs.push((name.to_string(), entry.path()));
                }
            }
        }
        class_dirs.sort_by(|a, b| a.0.cmp(&b.0));

        if class_dirs.is_empty() {
            return Err(DomainPairError::DirectoryStructure(root_dir));
        }

        let class_names: Vec<String> = class_dirs.iter().map(|(n, _)| n.clone()).collect();
        let class_to_idx: HashMap<String, usize> = class_names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        // Every image file under a class directory, recursively, belongs to
        // that class
        let mut samples = Vec::new();
        for (label, (class_name, class_dir)) in class_dirs.iter().enumerate() {
            let mut paths: Vec<PathBuf> = WalkDir::new(class_dir)
                .min_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.path().to_path_buf())
                .filter(|p| is_image_file(p))
                .collect();
            paths.sort();

            debug!(
                "Class '{}' (label {}): {} samples",
                class_name,
                label,
                paths.len()
            );

            for path in paths {
                samples.push(ImageSample {
                    path,
                    label,
                    class_name: class_name.clone(),
                });
            }
        }

        info!(
            "Indexed {} samples across {} classes",
            samples.len(),
            class_names.len()
        );

        Ok(Self {
            root_dir,
            samples,
            class_names,
            class_to_idx,
            subset: None,
        })
    }

    /// Restrict the dataset view to a list of original indices.
    ///
    /// After this, `len()` returns the subset length and all element access
    /// maps through the subset before touching the underlying sample list.
    pub fn with_subset(mut self, subset: Vec<usize>) -> Self {
        self.subset = Some(subset);
        self
    }

    /// Effective number of samples (subset-aware)
    pub fn len(&self) -> usize {
        match &self.subset {
            Some(subset) => subset.len(),
            None => self.samples.len(),
        }
    }

    /// Check if the effective view is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of classes
    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Class names in dense-id order
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    /// Mapping from class name to label index
    pub fn class_to_idx(&self) -> &HashMap<String, usize> {
        &self.class_to_idx
    }

    /// Dataset root directory
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Map a view index to an index into the underlying sample list
    pub fn resolve(&self, view_idx: usize) -> usize {
        match &self.subset {
            Some(subset) => subset[view_idx],
            None => view_idx,
        }
    }

    /// Get a sample by view index (maps through the subset)
    pub fn get(&self, view_idx: usize) -> &ImageSample {
        &self.samples[self.resolve(view_idx)]
    }

    /// Labels of the effective view, in view order
    pub fn labels(&self) -> Vec<usize> {
        (0..self.len()).map(|i| self.get(i).label).collect()
    }

    /// Per-class sample counts of the effective view
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.num_classes()];
        for i in 0..self.len() {
            counts[self.get(i).label] += 1;
        }
        counts
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::testutil::fixture_root;
    use std::fs::{self, File};
    use tempfile::TempDir;

    #[test]
    fn test_class_map_matches_subdirectories() {
        let root = fixture_root(&[("cat", 3), ("dog", 2), ("fox", 1)]);
        let ds = ClassificationDataset::new(root.path()).unwrap();

        assert_eq!(ds.num_classes(), 3);
        assert_eq!(ds.class_names(), &["cat", "dog", "fox"]);
        assert_eq!(ds.len(), 6);
    }

    #[test]
    fn test_labels_match_directory_assignment() {
        let root = fixture_root(&[("cat", 2), ("dog", 2)]);
        let ds = ClassificationDataset::new(root.path()).unwrap();

        for i in 0..ds.len() {
            let sample = ds.get(i);
            assert_eq!(ds.class_to_idx()[&sample.class_name], sample.label);
            assert!(sample
                .path
                .to_string_lossy()
                .contains(sample.class_name.as_str()));
        }
    }

    #[test]
    fn test_recursive_files_belong_to_class() {
        let root = fixture_root(&[("cat", 1)]);
        let nested = root.path().join("cat").join("extra");
        fs::create_dir_all(&nested).unwrap();
        File::create(nested.join("deep.png")).unwrap();

        let ds = ClassificationDataset::new(root.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert!(ds.labels().iter().all(|&l| l == 0));
    }

    #[test]
    fn test_non_image_files_skipped() {
        let root = fixture_root(&[("cat", 2)]);
        File::create(root.path().join("cat").join("notes.txt")).unwrap();

        let ds = ClassificationDataset::new(root.path()).unwrap();
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn test_empty_root_is_structure_error() {
        let root = TempDir::new().unwrap();
        let err = ClassificationDataset::new(root.path()).unwrap_err();
        assert!(matches!(err, DomainPairError::DirectoryStructure(_)));
    }

    #[test]
    fn test_missing_root_is_path_error() {
        let err = ClassificationDataset::new("/nonexistent/dataset/root").unwrap_err();
        assert!(matches!(err, DomainPairError::PathNotFound(_)));
    }

    #[test]
    fn test_subset_view() {
        let root = fixture_root(&[("cat", 3), ("dog", 3)]);
        let ds = ClassificationDataset::new(root.path()).unwrap();

        // pick one cat (index 1) and two dogs (indices 3, 5)
        let view = ds.clone().with_subset(vec![1, 3, 5]);
        assert_eq!(view.len(), 3);
        assert_eq!(view.labels(), vec![0, 1, 1]);
        assert_eq!(view.resolve(2), 5);
        assert_eq!(view.class_counts(), vec![1, 2]);
    }
}
