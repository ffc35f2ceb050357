//! # Project Documents
//!
//! Load and save the sequencer state: one track plus the transport settings.
//!
//! ## Document Format
//! ```json
//! {
//!   "track": { "id": "demo", "name": "Demo Track", "notes": [...],
//!              "channel": 1, "bank": 1, "program": 1 },
//!   "tempo": 120,
//!   "syncMode": "internal",
//!   "loop": false,
//!   "octave": 0
//! }
//! ```
//!
//! ## Permissive Loading
//! Documents are merged field by field into the current state. A field is
//! applied only if it is present and has the right shape; anything else is
//! skipped with a debug log and leaves the current value alone. Only a
//! document that does not parse at all, or is not an object, is an error.
//!
//! - `track`: applied if truthy and a well-formed track
//! - `tempo`: applied if a positive number
//! - `syncMode`: applied if `"internal"` or `"external"`
//! - `loop`: applied if a boolean
//! - `octave`: applied if an integer in `-128..=127`
//!
//! ## Example
//! ```rust
//! use midiseq::project::{Project, SyncMode};
//!
//! let mut project = Project::default();
//! project.merge_json(r#"{ "tempo": 90, "loop": "yes" }"#)?;
//!
//! assert_eq!(project.tempo, 90.0);
//! assert!(!project.looping); // "yes" is not a boolean
//! assert_eq!(project.sync_mode, SyncMode::Internal);
//! # Ok::<(), midiseq::SeqError>(())
//! ```

use crate::error::SeqError;
use crate::note::Track;
use crate::playback::PlaybackSettings;
use crate::smf;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Where the sequencer takes its clock from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    #[default]
    Internal,
    External,
}

/// The complete sequencer state that gets saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub track: Track,
    pub tempo: f64,
    pub sync_mode: SyncMode,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub octave: i8,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            track: Track::demo(),
            tempo: 120.0,
            sync_mode: SyncMode::Internal,
            looping: false,
            octave: 0,
        }
    }
}

/// The input formats [`Project::merge_path`] understands, picked by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Json,
    Yaml,
    Midi,
}

impl FileKind {
    /// `.mid`/`.midi` and `.yaml`/`.yml` (any case); everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("mid") | Some("midi") => FileKind::Midi,
            Some("yaml") | Some("yml") => FileKind::Yaml,
            _ => FileKind::Json,
        }
    }
}

impl Project {
    /// Default project with `path` merged in.
    ///
    /// # Errors
    /// - `SeqError::Io` if the file cannot be read
    /// - `SeqError::Project` if a JSON/YAML document does not parse
    pub fn load_path(path: impl AsRef<Path>) -> Result<Self, SeqError> {
        let mut project = Self::default();
        project.merge_path(path)?;
        Ok(project)
    }

    /// Merge a project document or MIDI file into this project.
    ///
    /// A MIDI file replaces the track's notes, gives the track a fresh id and
    /// names it after the file stem. Channel, bank and program are kept.
    pub fn merge_path(&mut self, path: impl AsRef<Path>) -> Result<(), SeqError> {
        let path = path.as_ref();
        let kind = FileKind::from_path(path);
        debug!("Loading {} as {:?}", path.display(), kind);

        match kind {
            FileKind::Midi => {
                let bytes = fs::read(path)?;
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.merge_midi(&bytes, name);
                Ok(())
            }
            FileKind::Yaml => self.merge_yaml(&fs::read_to_string(path)?),
            FileKind::Json => self.merge_json(&fs::read_to_string(path)?),
        }
    }

    pub fn merge_json(&mut self, text: &str) -> Result<(), SeqError> {
        let doc: Value = serde_json::from_str(text)
            .map_err(|e| SeqError::Project(format!("not valid JSON: {}", e)))?;
        self.merge_value(&doc)
    }

    pub fn merge_yaml(&mut self, text: &str) -> Result<(), SeqError> {
        let doc: Value = serde_yaml::from_str(text)
            .map_err(|e| SeqError::Project(format!("not valid YAML: {}", e)))?;
        self.merge_value(&doc)
    }

    /// Apply each well-formed field of `doc`.
    ///
    /// # Errors
    /// `SeqError::Project` if `doc` is not an object.
    pub fn merge_value(&mut self, doc: &Value) -> Result<(), SeqError> {
        let fields = doc
            .as_object()
            .ok_or_else(|| SeqError::Project("expected an object at the top level".to_string()))?;

        if let Some(value) = fields.get("track").filter(|v| is_truthy(v)) {
            match serde_json::from_value::<Track>(value.clone()) {
                Ok(track) => self.track = track,
                Err(e) => debug!("Ignoring track: {}", e),
            }
        }

        if let Some(value) = fields.get("tempo") {
            match value.as_f64() {
                Some(tempo) if tempo > 0.0 => self.tempo = tempo,
                _ => debug!("Ignoring tempo {}", value),
            }
        }

        if let Some(value) = fields.get("syncMode") {
            match serde_json::from_value::<SyncMode>(value.clone()) {
                Ok(mode) => self.sync_mode = mode,
                Err(_) => debug!("Ignoring syncMode {}", value),
            }
        }

        if let Some(value) = fields.get("loop") {
            match value.as_bool() {
                Some(looping) => self.looping = looping,
                None => debug!("Ignoring loop {}", value),
            }
        }

        if let Some(value) = fields.get("octave") {
            match value.as_i64().and_then(|n| i8::try_from(n).ok()) {
                Some(octave) => self.octave = octave,
                None => debug!("Ignoring octave {}", value),
            }
        }

        Ok(())
    }

    /// Replace the track's notes with the notes decoded from `bytes`.
    pub fn merge_midi(&mut self, bytes: &[u8], name: impl Into<String>) {
        let decoded = smf::decode(bytes);
        info!(
            "Loaded {} notes from MIDI ({} ticks per beat)",
            decoded.notes.len(),
            decoded.ticks_per_beat
        );

        self.track.id = Uuid::new_v4().to_string();
        self.track.name = name.into();
        self.track.notes = decoded.into_notes();
    }

    /// Write the project as pretty-printed JSON.
    pub fn save_path(&self, path: impl AsRef<Path>) -> Result<(), SeqError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        debug!("Saved project to {}", path.display());
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, SeqError> {
        serde_json::to_string_pretty(self).map_err(|e| SeqError::Project(e.to_string()))
    }

    /// The track as a Standard MIDI File at the project tempo.
    pub fn to_midi(&self) -> Result<Vec<u8>, SeqError> {
        smf::encode_track(&self.track, self.tempo)
    }

    pub fn playback_settings(&self) -> PlaybackSettings {
        PlaybackSettings {
            tempo_bpm: self.tempo,
            channel: self.track.channel,
            octave_shift: self.octave,
            looping: self.looping,
        }
    }
}

/// JavaScript-style truthiness, which decides whether `track` is applied.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Note;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_defaults() {
        let project = Project::default();

        assert_eq!(project.tempo, 120.0);
        assert_eq!(project.sync_mode, SyncMode::Internal);
        assert!(!project.looping);
        assert_eq!(project.octave, 0);
        assert_eq!(project.track.id, "demo");
        assert_eq!(project.track.notes.len(), 12);
    }

    #[test]
    fn test_partial_document_keeps_other_fields() {
        let mut project = Project::default();
        project.looping = true;

        project.merge_json(r#"{ "tempo": 100 }"#).unwrap();

        assert_eq!(project.tempo, 100.0);
        assert!(project.looping);
        assert_eq!(project.track.id, "demo");
    }

    #[test]
    fn test_wrong_types_are_ignored() {
        let mut project = Project::default();

        let result = project.merge_json(
            r#"{
                "tempo": "fast",
                "syncMode": "midi-clock",
                "loop": "yes",
                "octave": 2.5,
                "track": { "name": "no notes" }
            }"#,
        );

        assert!(result.is_ok());
        assert_eq!(project, Project::default());
    }

    #[test]
    fn test_falsy_values_are_skipped() {
        let mut project = Project::default();

        project
            .merge_json(r#"{ "tempo": 0, "track": null, "loop": false, "octave": -2 }"#)
            .unwrap();

        assert_eq!(project.tempo, 120.0);
        assert_eq!(project.track.id, "demo");
        assert!(!project.looping);
        assert_eq!(project.octave, -2);
    }

    #[test]
    fn test_full_document() {
        let mut project = Project::default();

        project
            .merge_json(
                r#"{
                    "track": {
                        "id": "t1",
                        "name": "Bass",
                        "notes": [
                            { "id": "n1", "pitch": 36, "startTime": 0, "duration": 2, "velocity": 90 },
                            { "id": "n2", "pitch": 38, "startTime": 2, "duration": 2, "velocity": 90, "muted": true }
                        ],
                        "channel": 2,
                        "bank": 1,
                        "program": 34
                    },
                    "tempo": 96,
                    "syncMode": "external",
                    "loop": true,
                    "octave": -1
                }"#,
            )
            .unwrap();

        assert_eq!(project.track.name, "Bass");
        assert_eq!(project.track.notes.len(), 2);
        assert!(project.track.notes[1].muted);
        assert_eq!(project.sync_mode, SyncMode::External);

        let settings = project.playback_settings();
        assert_eq!(settings.tempo_bpm, 96.0);
        assert_eq!(settings.channel, 2);
        assert_eq!(settings.octave_shift, -1);
        assert!(settings.looping);
    }

    #[test]
    fn test_invalid_documents_are_errors() {
        let mut project = Project::default();

        assert!(matches!(
            project.merge_json("{ not json"),
            Err(SeqError::Project(_))
        ));
        assert!(matches!(
            project.merge_json("[1, 2, 3]"),
            Err(SeqError::Project(_))
        ));
        assert_eq!(project, Project::default());
    }

    #[test]
    fn test_yaml_document() {
        let mut project = Project::default();

        project
            .merge_yaml("tempo: 140\nsyncMode: external\nloop: true\n")
            .unwrap();

        assert_eq!(project.tempo, 140.0);
        assert_eq!(project.sync_mode, SyncMode::External);
        assert!(project.looping);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("song.json");

        let mut project = Project::default();
        project.tempo = 87.5;
        project.octave = 3;
        project.track.notes[0].muted = true;
        project.save_path(&path).unwrap();

        let loaded = Project::load_path(&path).unwrap();
        assert_eq!(loaded, project);
    }

    #[test]
    fn test_saved_json_uses_document_names() {
        let json = Project::default().to_json().unwrap();

        assert!(json.contains("\"syncMode\": \"internal\""));
        assert!(json.contains("\"loop\": false"));
        assert!(json.contains("\"startTime\""));
    }

    #[test]
    fn test_load_midi_file() {
        let notes = vec![Note::new(48, 0.0, 1.0, 70), Note::new(52, 1.0, 1.0, 70)];
        let bytes = smf::encode(&notes, 120.0).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("Riff.MID");
        fs::write(&path, bytes).unwrap();

        let mut project = Project::default();
        project.track.channel = 5;
        project.merge_path(&path).unwrap();

        assert_eq!(project.track.name, "Riff");
        assert_ne!(project.track.id, "demo");
        assert_eq!(project.track.channel, 5);
        let pitches: Vec<u8> = project.track.notes.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![48, 52]);
    }

    #[test]
    fn test_unknown_extension_is_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "octave": 1 }}"#).unwrap();

        let project = Project::load_path(file.path()).unwrap();
        assert_eq!(project.octave, 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();

        let result = Project::load_path(dir.path().join("missing.json"));
        assert!(matches!(result, Err(SeqError::Io(_))));
    }

    #[test]
    fn test_file_kind() {
        assert_eq!(FileKind::from_path(Path::new("a.midi")), FileKind::Midi);
        assert_eq!(FileKind::from_path(Path::new("a.YML")), FileKind::Yaml);
        assert_eq!(FileKind::from_path(Path::new("a")), FileKind::Json);
    }
}
