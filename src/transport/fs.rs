use std::fs;
use std::io;
use std::path::Path;

use crate::errors::SourceError;

/// Read a whole file as UTF-8 text.
///
/// A missing file maps to `SourceError::NotFound`; invalid UTF-8 maps to
/// `SourceError::Decode`; other I/O failures pass through as `Io`.
pub fn read_utf8(path: &Path) -> Result<String, SourceError> {
    let bytes = fs::read(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => SourceError::NotFound {
            location: path.display().to_string(),
        },
        _ => SourceError::Io(err),
    })?;
    String::from_utf8(bytes).map_err(|err| SourceError::Decode {
        location: path.display().to_string(),
        reason: format!("file is not valid UTF-8: {err}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_utf8_text() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("articles.json");
        fs::write(&path, "{\"title\": \"Café\"}\n").unwrap();
        assert_eq!(read_utf8(&path).unwrap(), "{\"title\": \"Café\"}\n");
    }

    #[test]
    fn missing_file_is_not_found() {
        let temp = tempdir().unwrap();
        let err = read_utf8(&temp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
    }

    #[test]
    fn invalid_utf8_is_a_decode_failure() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("bad.json");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            read_utf8(&path).unwrap_err(),
            SourceError::Decode { .. }
        ));
    }

    #[test]
    fn directories_surface_as_io_errors() {
        let temp = tempdir().unwrap();
        assert!(matches!(
            read_utf8(temp.path()).unwrap_err(),
            SourceError::Io(_)
        ));
    }
}
