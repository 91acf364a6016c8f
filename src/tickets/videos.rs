//! Video attachment validation and disk storage.
//!
//! Uploads arrive in batches; each file is validated on its own and the
//! valid ones are stored even when siblings fail.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::MediaConfig;

use super::models::TicketVideo;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub data: Vec<u8>,
}

pub fn file_extension(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) => name[idx..].to_lowercase(),
        None => String::new(),
    }
}

/// One message per violated constraint; an empty result means the file is
/// acceptable.
pub fn validate_upload(name: &str, size: i64, config: &MediaConfig) -> Vec<String> {
    let mut errors = Vec::new();

    let ext = file_extension(name);
    if !config.allowed_video_extensions.contains(&ext) {
        errors.push(format!(
            "Extensão \"{}\" não permitida. Use: {}",
            ext,
            config.allowed_video_extensions.join(", ")
        ));
    }
    if size > config.max_video_bytes {
        let max_mb = config.max_video_bytes as f64 / (1024.0 * 1024.0);
        errors.push(format!("Arquivo excede o limite de {:.0} MB.", max_mb));
    }
    errors
}

/// Partitions a batch into storable files and per-file error messages.
pub fn split_batch(
    files: Vec<UploadedFile>,
    config: &MediaConfig,
) -> (Vec<UploadedFile>, Vec<String>) {
    let mut valid = Vec::new();
    let mut errors = Vec::new();
    for file in files {
        let file_errors = validate_upload(&file.name, file.data.len() as i64, config);
        if file_errors.is_empty() {
            valid.push(file);
        } else {
            errors.extend(file_errors);
        }
    }
    (valid, errors)
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn ticket_dir(ticket_id: Uuid) -> String {
    format!("videos/ticket_{}", ticket_id.simple())
}

/// Writes the file under `<storage>/videos/ticket_<id>/` and returns the
/// recorded row. A short random prefix keeps repeated uploads of the same
/// filename from clobbering each other.
pub fn store_video(
    storage_path: &str,
    ticket_id: Uuid,
    uploaded_by: Option<Uuid>,
    description: &str,
    file: &UploadedFile,
) -> io::Result<TicketVideo> {
    let rel_dir = ticket_dir(ticket_id);
    let dir = Path::new(storage_path).join(&rel_dir);
    fs::create_dir_all(&dir)?;

    let prefix = &Uuid::new_v4().simple().to_string()[..8];
    let stored_name = format!("{}_{}", prefix, sanitize_filename(&file.name));
    let rel_path = format!("{}/{}", rel_dir, stored_name);
    fs::write(dir.join(&stored_name), &file.data)?;

    info!(
        "Stored video {} ({} bytes) for ticket {}",
        file.name,
        file.data.len(),
        ticket_id
    );

    Ok(TicketVideo {
        id: Uuid::new_v4(),
        ticket_id,
        file_path: rel_path,
        original_name: file.name.clone(),
        size_bytes: file.data.len() as i64,
        description: description.to_string(),
        uploaded_by,
        uploaded_at: Utc::now(),
    })
}

/// Best effort: a missing file on disk does not block removal of the row.
pub fn delete_video_file(storage_path: &str, video: &TicketVideo) {
    let path: PathBuf = Path::new(storage_path).join(&video.file_path);
    if let Err(e) = fs::remove_file(&path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Could not remove video file {}: {e}", path.display());
        }
    }
}

/// Removes every stored file of a ticket along with its media directory.
pub fn delete_ticket_files(storage_path: &str, ticket_id: Uuid, videos: &[TicketVideo]) {
    for video in videos {
        delete_video_file(storage_path, video);
    }
    let dir = Path::new(storage_path).join(ticket_dir(ticket_id));
    if let Err(e) = fs::remove_dir(&dir) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Could not remove media dir {}: {e}", dir.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media_config() -> MediaConfig {
        MediaConfig {
            storage_path: "./media".into(),
            allowed_video_extensions: vec![".mp4".into(), ".webm".into()],
            max_video_bytes: 1024,
        }
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let config = media_config();
        assert!(validate_upload("clip.MP4", 10, &config).is_empty());
        assert!(validate_upload("clip.WebM", 10, &config).is_empty());
    }

    #[test]
    fn rejected_file_gets_one_message_per_constraint() {
        let config = media_config();
        let errors = validate_upload("notes.txt", 4096, &config);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains(".txt"));
        assert!(errors[1].contains("limite"));
    }

    #[test]
    fn oversized_batch_member_does_not_sink_the_rest() {
        let config = media_config();
        let files = vec![
            UploadedFile {
                name: "a.mp4".into(),
                data: vec![0; 100],
            },
            UploadedFile {
                name: "b.mp4".into(),
                data: vec![0; 2048],
            },
            UploadedFile {
                name: "c.webm".into(),
                data: vec![0; 100],
            },
        ];

        let (valid, errors) = split_batch(files, &config);

        assert_eq!(valid.len(), 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(valid[0].name, "a.mp4");
        assert_eq!(valid[1].name, "c.webm");
    }

    #[test]
    fn stored_file_lands_under_the_ticket_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = tmp.path().to_str().unwrap();
        let ticket_id = Uuid::new_v4();
        let file = UploadedFile {
            name: "câmera 1.mp4".into(),
            data: vec![1, 2, 3],
        };

        let video = store_video(storage, ticket_id, None, "entrada", &file).unwrap();

        assert!(video
            .file_path
            .starts_with(&format!("videos/ticket_{}/", ticket_id.simple())));
        assert_eq!(video.size_bytes, 3);
        assert_eq!(video.original_name, "câmera 1.mp4");
        let on_disk = Path::new(storage).join(&video.file_path);
        assert_eq!(fs::read(on_disk).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn delete_ticket_files_clears_the_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = tmp.path().to_str().unwrap();
        let ticket_id = Uuid::new_v4();
        let file = UploadedFile {
            name: "a.mp4".into(),
            data: vec![0; 4],
        };
        let video = store_video(storage, ticket_id, None, "", &file).unwrap();

        delete_ticket_files(storage, ticket_id, &[video]);

        let dir = Path::new(storage).join(format!("videos/ticket_{}", ticket_id.simple()));
        assert!(!dir.exists());
    }
}
