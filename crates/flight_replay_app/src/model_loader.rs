// SPDX-License-Identifier: MIT OR Apache-2.0
//! Asynchronous aircraft model loading.
//!
//! Models are RON files describing the aircraft as a set of colored boxes.
//! Loading runs on a worker thread and reports back over a channel, which
//! the UI thread drains once per frame.

use crate::mesh::{srgb_to_linear, MeshData};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Read chunk size, also the granularity of progress reports
const READ_CHUNK_SIZE: usize = 4 * 1024;

/// One box of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPart {
    /// Part name, for diagnostics
    pub name: String,
    /// Box center in model space
    pub center: [f32; 3],
    /// Box size along X, Y and Z
    pub size: [f32; 3],
    /// Color (sRGB)
    pub color: [u8; 3],
}

/// Model file contents. The nose points along +Z, up is +Y.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    /// Display name
    pub name: String,
    /// Boxes making up the model
    pub parts: Vec<ModelPart>,
}

/// A loaded model ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModel {
    /// Display name
    pub name: String,
    /// Triangle mesh
    pub mesh: MeshData,
}

/// Handle to the uploaded model, stored in the tracked object slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHandle {
    /// Display name
    pub name: String,
    /// Triangles uploaded to the GPU
    pub triangle_count: usize,
}

/// Errors that can occur while loading a model
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    /// IO error
    #[error("Failed to read {path}: {message}")]
    Io {
        /// Model file
        path: PathBuf,
        /// IO error message
        message: String,
    },
    /// The file is not valid UTF-8
    #[error("Model file is not valid UTF-8")]
    InvalidUtf8,
    /// The file is not a valid model definition
    #[error("Failed to parse model: {0}")]
    Parse(String),
    /// The model has no parts
    #[error("Model '{0}' has no parts")]
    Empty(String),
    /// A part has a bad size or position
    #[error("Model part '{0}' has a non-finite or non-positive dimension")]
    InvalidPart(String),
}

/// Message from the loader thread
#[derive(Debug)]
pub enum LoadEvent {
    /// Fraction of the file read so far
    Progress(f32),
    /// The model finished loading
    Loaded(LoadedModel),
    /// The model failed to load
    Failed(LoadError),
}

/// Loader state as seen by the UI
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    /// Still reading, with the last reported fraction
    Loading {
        /// Fraction read, 0 to 1
        progress: f32,
    },
    /// Model published
    Loaded,
    /// Gave up; the replay runs without a model
    Failed(String),
}

/// Parse a model definition and build its mesh.
pub fn parse_model(text: &str) -> Result<LoadedModel, LoadError> {
    let definition: ModelDefinition =
        ron::from_str(text).map_err(|e| LoadError::Parse(e.to_string()))?;
    build_model(definition)
}

fn build_model(definition: ModelDefinition) -> Result<LoadedModel, LoadError> {
    if definition.parts.is_empty() {
        return Err(LoadError::Empty(definition.name));
    }

    let mut mesh = MeshData::new();
    for part in &definition.parts {
        let center = Vec3::from(part.center);
        let size = Vec3::from(part.size);
        if !center.is_finite() || !size.is_finite() || size.min_element() <= 0.0 {
            return Err(LoadError::InvalidPart(part.name.clone()));
        }
        mesh.push_box(center, size, srgb_to_linear(part.color));
    }

    Ok(LoadedModel {
        name: definition.name,
        mesh,
    })
}

/// Read a file, reporting the fraction read after each chunk.
fn read_with_progress(
    path: &Path,
    event_tx: &mpsc::UnboundedSender<LoadEvent>,
) -> Result<String, LoadError> {
    let io_error = |e: std::io::Error| LoadError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut file = std::fs::File::open(path).map_err(io_error)?;
    let total = file.metadata().map(|m| m.len()).unwrap_or(0);

    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    loop {
        let read = file.read(&mut chunk).map_err(io_error)?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);
        if total > 0 {
            let fraction = (bytes.len() as f32 / total as f32).min(1.0);
            let _ = event_tx.send(LoadEvent::Progress(fraction));
        }
    }

    String::from_utf8(bytes).map_err(|_| LoadError::InvalidUtf8)
}

/// Worker that loads one model and exits
fn load_worker(path: PathBuf, event_tx: mpsc::UnboundedSender<LoadEvent>) {
    let result = read_with_progress(&path, &event_tx).and_then(|text| parse_model(&text));
    let event = match result {
        Ok(model) => LoadEvent::Loaded(model),
        Err(e) => LoadEvent::Failed(e),
    };
    // The receiver is gone if the app already shut down
    let _ = event_tx.send(event);
}

/// Loads the aircraft model in the background
pub struct ModelLoader {
    /// File being loaded
    path: PathBuf,
    /// Channel for receiving loader events
    event_rx: mpsc::UnboundedReceiver<LoadEvent>,
    /// Current status
    status: LoadStatus,
}

impl ModelLoader {
    /// Start loading `path` on a worker thread
    pub fn spawn(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tracing::info!("Loading model {}", path.display());
        let worker_path = path.clone();
        std::thread::spawn(move || {
            load_worker(worker_path, event_tx);
        });

        Self {
            path,
            event_rx,
            status: LoadStatus::Loading { progress: 0.0 },
        }
    }

    /// Current status
    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Drain pending loader events.
    ///
    /// Returns the model on the frame it finishes loading. Failures are
    /// logged and leave the status at [`LoadStatus::Failed`].
    pub fn poll(&mut self) -> Option<LoadedModel> {
        let mut loaded = None;

        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                LoadEvent::Progress(fraction) => {
                    tracing::debug!("{:.0}% loaded", fraction * 100.0);
                    self.status = LoadStatus::Loading { progress: fraction };
                }
                LoadEvent::Loaded(model) => {
                    tracing::info!(
                        "Loaded model '{}' ({} triangles) from {}",
                        model.name,
                        model.mesh.triangle_count(),
                        self.path.display()
                    );
                    self.status = LoadStatus::Loaded;
                    loaded = Some(model);
                }
                LoadEvent::Failed(e) => {
                    tracing::error!("Failed to load model {}: {e}", self.path.display());
                    self.status = LoadStatus::Failed(e.to_string());
                }
            }
        }

        loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    const TWO_PARTS: &str = r#"(
        name: "Test",
        parts: [
            (name: "body", center: (0.0, 0.0, 0.0), size: (2.0, 2.0, 10.0), color: (255, 255, 255)),
            (name: "wing", center: (0.0, 0.0, 1.0), size: (12.0, 0.4, 2.0), color: (128, 128, 128)),
        ],
    )"#;

    fn wait_for_result(loader: &mut ModelLoader) -> Option<LoadedModel> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(model) = loader.poll() {
                return Some(model);
            }
            if !matches!(loader.status(), LoadStatus::Loading { .. }) {
                return None;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn test_parse_model() {
        let model = parse_model(TWO_PARTS).unwrap();
        assert_eq!(model.name, "Test");
        assert_eq!(model.mesh.vertices.len(), 48);
        assert_eq!(model.mesh.triangle_count(), 24);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_model("(name: "), Err(LoadError::Parse(_))));
        assert_eq!(
            parse_model("(name: \"Nothing\", parts: [])").unwrap_err(),
            LoadError::Empty("Nothing".to_string())
        );
        let flat = r#"(name: "Flat", parts: [
            (name: "sheet", center: (0.0, 0.0, 0.0), size: (1.0, 0.0, 1.0), color: (0, 0, 0)),
        ])"#;
        assert_eq!(
            parse_model(flat).unwrap_err(),
            LoadError::InvalidPart("sheet".to_string())
        );
    }

    #[test]
    fn test_missing_file_fails() {
        let mut loader = ModelLoader::spawn("does/not/exist/aircraft.ron");
        assert_eq!(wait_for_result(&mut loader), None);
        assert!(matches!(loader.status(), LoadStatus::Failed(_)));
    }

    #[test]
    fn test_loads_file_with_progress() {
        let path = std::env::temp_dir().join(format!(
            "flight_replay_model_{}.ron",
            std::process::id()
        ));
        std::fs::write(&path, TWO_PARTS).unwrap();

        let mut loader = ModelLoader::spawn(&path);
        let model = wait_for_result(&mut loader).unwrap();
        assert_eq!(model.name, "Test");
        assert_eq!(loader.status(), &LoadStatus::Loaded);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_bundled_aircraft() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/models/aircraft.ron");
        let text = std::fs::read_to_string(path).unwrap();
        let model = parse_model(&text).unwrap();
        assert!(model.mesh.triangle_count() > 0);
    }
}
