use ropey::Rope;
use url::Url;

/// In-memory representation of one versioned scene document.
///
/// Offsets used throughout the front end are character offsets into the
/// document text, matching the rope's char indexing.
#[derive(Debug, Clone)]
pub struct TextDocument {
    pub uri: Url,
    pub version: i32,
    content: Rope,
}

impl TextDocument {
    pub fn new(uri: Url, version: i32, text: &str) -> Self {
        Self {
            uri,
            version,
            content: Rope::from_str(text),
        }
    }

    pub fn text(&self) -> String {
        self.content.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.content.len_chars()
    }

    /// Slice `[start, end)` in char indices, clamped to the document.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let len = self.content.len_chars();
        let s = start.min(len);
        let e = end.min(len).max(s);
        self.content.slice(s..e).to_string()
    }

    /// Replace the whole content, bumping the version.
    pub fn update(&mut self, version: i32, text: &str) {
        self.version = version;
        self.content = Rope::from_str(text);
    }

    /// Scene name: the last path segment with a `.txt` suffix stripped.
    pub fn scene_name(&self) -> Option<String> {
        scene_name_of(&self.uri)
    }
}

/// Scene name for a scene URI (`.../startup.txt` -> `startup`).
pub fn scene_name_of(uri: &Url) -> Option<String> {
    let segment = uri.path_segments()?.next_back()?;
    if segment.is_empty() {
        return None;
    }
    let name = segment.strip_suffix(".txt").unwrap_or(segment);
    Some(name.to_string())
}

/// Directory prefix shared by all scenes of a project, with a trailing slash.
pub fn project_path_of(uri: &Url) -> Option<String> {
    let path = uri.path();
    let idx = path.rfind('/')?;
    let mut base = uri.clone();
    base.set_path(&path[..=idx]);
    Some(base.to_string())
}
