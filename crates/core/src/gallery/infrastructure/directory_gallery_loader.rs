use std::fs;
use std::path::{Path, PathBuf};

use crate::detection::domain::face_encoder::FaceEncoder;
use crate::gallery::domain::gallery::{Gallery, GalleryEntry, GalleryError};
use crate::shared::constants::DEFAULT_GALLERY_EXTENSION;
use crate::shared::frame::Frame;

/// Builds a [`Gallery`] from a directory of reference images.
///
/// Only files with the configured extension are considered. Each image
/// contributes the first face the encoder finds, labelled with the file
/// name minus its extension. Images with no face, or that fail to decode or
/// encode, are skipped; only an unreadable directory is an error.
pub struct DirectoryGalleryLoader {
    extension: String,
}

impl DirectoryGalleryLoader {
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_lowercase(),
        }
    }

    pub fn load(
        &self,
        directory: &Path,
        encoder: &mut dyn FaceEncoder,
    ) -> Result<Gallery, GalleryError> {
        if !directory.is_dir() {
            return Err(GalleryError::NotFound(directory.to_path_buf()));
        }
        let unreadable = |source| GalleryError::Unreadable {
            path: directory.to_path_buf(),
            source,
        };

        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(directory).map_err(unreadable)? {
            let path = dir_entry.map_err(unreadable)?.path();
            if !path.is_file() || !self.accepts(&path) {
                continue;
            }
            if let Some(entry) = self.load_entry(&path, encoder) {
                entries.push(entry);
            }
        }

        log::info!(
            "Loaded {} known face(s) from {}",
            entries.len(),
            directory.display()
        );
        Ok(Gallery::from_entries(entries))
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.to_lowercase() == self.extension)
    }

    fn load_entry(&self, path: &Path, encoder: &mut dyn FaceEncoder) -> Option<GalleryEntry> {
        let label = label_for(path)?;

        let frame = match image::open(path) {
            Ok(img) => Frame::from_rgb_image(img.to_rgb8(), 0),
            Err(e) => {
                log::warn!("Skipping {}: cannot decode image: {e}", path.display());
                return None;
            }
        };

        match encoder.encode(&frame) {
            Ok(faces) => match faces.into_iter().next() {
                Some(face) => Some(GalleryEntry::new(label, face.embedding)),
                None => {
                    log::debug!("Skipping {}: no face detected", path.display());
                    None
                }
            },
            Err(e) => {
                log::warn!("Skipping {}: face encoding failed: {e}", path.display());
                None
            }
        }
    }
}

impl Default for DirectoryGalleryLoader {
    fn default() -> Self {
        Self::new(DEFAULT_GALLERY_EXTENSION)
    }
}

/// Everything before the first `.` of the file name: `bob.smith.png` is `bob`.
fn label_for(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    let label = name.split('.').next().unwrap_or_default();
    if label.is_empty() {
        return None;
    }
    Some(label.to_string())
}

/// Convenience for the common case: `png` images in `directory`.
pub fn load_gallery(
    directory: impl Into<PathBuf>,
    encoder: &mut dyn FaceEncoder,
) -> Result<Gallery, GalleryError> {
    DirectoryGalleryLoader::default().load(&directory.into(), encoder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_embedding::{DetectedFace, FaceEmbedding};
    use crate::shared::bounding_box::BoundingBox;
    use std::collections::HashSet;
    use tempfile::TempDir;

    /// Encodes the red channel of the top-left pixel as "number of faces";
    /// each face's embedding is `[green]`.
    struct PixelCodedEncoder {
        calls: usize,
    }

    impl FaceEncoder for PixelCodedEncoder {
        fn encode(
            &mut self,
            frame: &Frame,
        ) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
            self.calls += 1;
            let px = &frame.data()[..3];
            if px[0] == 255 {
                return Err("model failure".into());
            }
            Ok((0..px[0])
                .map(|i| {
                    DetectedFace::new(
                        BoundingBox::new(0, 1, 1, 0),
                        FaceEmbedding::new(vec![px[1] as f32 + i as f32]),
                    )
                })
                .collect())
        }
    }

    fn write_image(dir: &Path, name: &str, faces: u8, id: u8) {
        let mut img = image::RgbImage::new(4, 4);
        for p in img.pixels_mut() {
            *p = image::Rgb([faces, id, 0]);
        }
        img.save(dir.join(name)).unwrap();
    }

    fn labels(gallery: &Gallery) -> HashSet<String> {
        gallery.labels().map(str::to_string).collect()
    }

    #[test]
    fn test_loads_one_entry_per_image_with_a_face() {
        let dir = TempDir::new().unwrap();
        write_image(dir.path(), "alice.png", 1, 10);
        write_image(dir.path(), "bob.png", 1, 20);

        let mut encoder = PixelCodedEncoder { calls: 0 };
        let gallery = DirectoryGalleryLoader::default()
            .load(dir.path(), &mut encoder)
            .unwrap();

        assert_eq!(labels(&gallery), HashSet::from(["alice".into(), "bob".into()]));
        let alice = gallery.entries().iter().find(|e| e.label == "alice").unwrap();
        assert_eq!(alice.embedding.values(), &[10.0]);
    }

    #[test]
    fn test_label_stops_at_first_dot() {
        let dir = TempDir::new().unwrap();
        write_image(dir.path(), "bob.smith.png", 1, 20);

        let mut encoder = PixelCodedEncoder { calls: 0 };
        let gallery = load_gallery(dir.path(), &mut encoder).unwrap();

        assert_eq!(gallery.labels().collect::<Vec<_>>(), vec!["bob"]);
    }

    #[test]
    fn test_images_without_faces_are_skipped() {
        let dir = TempDir::new().unwrap();
        write_image(dir.path(), "alice.png", 1, 10);
        write_image(dir.path(), "empty.png", 0, 0);

        let mut encoder = PixelCodedEncoder { calls: 0 };
        let gallery = load_gallery(dir.path(), &mut encoder).unwrap();

        assert_eq!(labels(&gallery), HashSet::from(["alice".into()]));
        assert_eq!(encoder.calls, 2);
    }

    #[test]
    fn test_first_face_is_used_when_image_has_several() {
        let dir = TempDir::new().unwrap();
        write_image(dir.path(), "group.png", 3, 40);

        let mut encoder = PixelCodedEncoder { calls: 0 };
        let gallery = load_gallery(dir.path(), &mut encoder).unwrap();

        assert_eq!(gallery.len(), 1);
        assert_eq!(gallery.entries()[0].embedding.values(), &[40.0]);
    }

    #[test]
    fn test_other_extensions_and_undecodable_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        write_image(dir.path(), "alice.png", 1, 10);
        write_image(dir.path(), "carol.bmp", 1, 30);
        fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        fs::write(dir.path().join("broken.png"), b"not a png").unwrap();
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let mut encoder = PixelCodedEncoder { calls: 0 };
        let gallery = load_gallery(dir.path(), &mut encoder).unwrap();

        assert_eq!(labels(&gallery), HashSet::from(["alice".into()]));
        assert_eq!(encoder.calls, 1);
    }

    #[test]
    fn test_encoder_failure_skips_image() {
        let dir = TempDir::new().unwrap();
        write_image(dir.path(), "alice.png", 1, 10);
        write_image(dir.path(), "faulty.png", 255, 0);

        let mut encoder = PixelCodedEncoder { calls: 0 };
        let gallery = load_gallery(dir.path(), &mut encoder).unwrap();

        assert_eq!(labels(&gallery), HashSet::from(["alice".into()]));
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        write_image(dir.path(), "dave.PNG", 1, 50);

        let mut encoder = PixelCodedEncoder { calls: 0 };
        let gallery = DirectoryGalleryLoader::new(".png")
            .load(dir.path(), &mut encoder)
            .unwrap();

        assert_eq!(labels(&gallery), HashSet::from(["dave".into()]));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let mut encoder = PixelCodedEncoder { calls: 0 };
        let result = load_gallery(&missing, &mut encoder);

        assert!(matches!(result, Err(GalleryError::NotFound(p)) if p == missing));
    }
}
