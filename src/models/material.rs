use serde::Serialize;

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "webp", "bmp", "svg"];
const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mov", "avi", "mkv", "webm", "m4v"];

/// What a lesson's material link points at, judged by its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    Document,
    Image,
    Video,
    Other,
}

impl MaterialKind {
    pub fn from_link(link: &str) -> Self {
        let path = link.split(['?', '#']).next().unwrap_or_default();
        let file_name = path.rsplit('/').next().unwrap_or_default();

        let extension = match file_name.rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() => extension.to_ascii_lowercase(),
            _ => return MaterialKind::Other,
        };

        if extension == "pdf" {
            MaterialKind::Document
        } else if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            MaterialKind::Image
        } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            MaterialKind::Video
        } else {
            MaterialKind::Other
        }
    }
}
