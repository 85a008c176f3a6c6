use std::fs;
use std::io::Write;

use camino::Utf8Path;

use crate::error::AnnotatorError;

pub fn write_atomic(dest: &Utf8Path, bytes: &[u8]) -> Result<(), AnnotatorError> {
    let parent = match dest.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| AnnotatorError::Filesystem(format!("create {parent}: {err}")))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".residue-annotator")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| AnnotatorError::Filesystem(err.to_string()))?;
    temp.write_all(bytes)
        .map_err(|err| AnnotatorError::Filesystem(err.to_string()))?;
    temp.flush()
        .map_err(|err| AnnotatorError::Filesystem(err.to_string()))?;
    temp.persist(dest.as_std_path())
        .map_err(|err| AnnotatorError::Filesystem(format!("persist {dest}: {}", err.error)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    #[test]
    fn writes_and_replaces() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let dest = root.join("nested").join("table.tsv");

        write_atomic(&dest, b"first").unwrap();
        write_atomic(&dest, b"second").unwrap();

        let content = fs::read_to_string(dest.as_std_path()).unwrap();
        assert_eq!(content, "second");
        let leftovers = fs::read_dir(root.join("nested").as_std_path())
            .unwrap()
            .count();
        assert_eq!(leftovers, 1);
    }
}
