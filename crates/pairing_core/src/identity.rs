use thiserror::Error;

/// Segment that separates the account/container prefix of a subject from the
/// object's path inside its container.
pub const BLOB_PATH_MARKER: &str = "/blobs/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("subject '{0}' has no '/blobs/' segment")]
    MissingMarker(String),
}

/// One of the two letters that distinguish companion objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairSuffix {
    A,
    B,
}

impl PairSuffix {
    pub fn from_char(value: char) -> Option<Self> {
        match value {
            'a' => Some(Self::A),
            'b' => Some(Self::B),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::A => 'a',
            Self::B => 'b',
        }
    }

    pub fn companion(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// Location of an object inside its container, split into the parts pairing
/// cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPath {
    pub relative_path: String,
    pub folder: String,
    pub file_name: String,
    pub extension: Option<String>,
}

impl ObjectPath {
    /// Parses `.../blobs/<folder>/<file_name>.<ext>`. The last `/blobs/`
    /// occurrence wins, so containers literally named `blobs` still resolve.
    /// A name without an extension keeps an empty `file_name`.
    pub fn from_subject(subject: &str) -> Result<Self, PathError> {
        let Some(marker_at) = subject.rfind(BLOB_PATH_MARKER) else {
            return Err(PathError::MissingMarker(subject.to_string()));
        };
        let relative_path = &subject[marker_at + BLOB_PATH_MARKER.len()..];

        let (folder, object_name) = match relative_path.rfind('/') {
            Some(index) => (&relative_path[..index], &relative_path[index + 1..]),
            None => ("", relative_path),
        };

        let (file_name, extension) = match object_name.rfind('.') {
            Some(index) => (
                &object_name[..index],
                Some(object_name[index + 1..].to_string()),
            ),
            None => ("", None),
        };

        Ok(Self {
            relative_path: relative_path.to_string(),
            folder: folder.to_string(),
            file_name: file_name.to_string(),
            extension,
        })
    }

    pub fn suffix_char(&self) -> Option<char> {
        self.file_name.chars().last()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectIdentity {
    pub path: ObjectPath,
    pub suffix: PairSuffix,
}

impl ObjectIdentity {
    /// Returns `None` when the object has no extension or its file name does
    /// not end in a pairing letter.
    pub fn from_path(path: ObjectPath) -> Option<Self> {
        path.extension.as_ref()?;
        let suffix = PairSuffix::from_char(path.suffix_char()?)?;
        Some(Self { path, suffix })
    }

    pub fn pair_key(&self) -> &str {
        &self.path.file_name
    }

    pub fn companion(&self) -> CompanionIdentity {
        let suffix = self.suffix.companion();
        let base = &self.path.file_name[..self.path.file_name.len() - 1];
        let file_name = format!("{base}{}", suffix.as_char());

        let mut relative_path = String::with_capacity(self.path.relative_path.len());
        if !self.path.folder.is_empty() {
            relative_path.push_str(&self.path.folder);
            relative_path.push('/');
        }
        relative_path.push_str(&file_name);
        if let Some(extension) = &self.path.extension {
            relative_path.push('.');
            relative_path.push_str(extension);
        }

        CompanionIdentity {
            relative_path,
            file_name,
            suffix,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionIdentity {
    pub relative_path: String,
    pub file_name: String,
    pub suffix: PairSuffix,
}
