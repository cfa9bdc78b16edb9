use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Error;

/// One entry of a JSON input file. The cost extractor emits objects with a
/// `meterId` field plus per-resource cost columns we don't consume; a bare
/// array of id strings is accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum InputEntry {
    Id(String),
    Record {
        #[serde(rename = "meterId", alias = "MeterId")]
        meter_id: String,
    },
}

/// Read the origin meter id set from `path`: a JSON array, or a plain-text
/// file with one id per line (`#` comments and blank lines skipped). The
/// result is distinct and sorted.
pub fn read_meter_ids(path: &Path) -> Result<BTreeSet<String>, Error> {
    let data = fs::read_to_string(path)
        .map_err(|e| Error::Configuration(format!("cannot read {}: {e}", path.display())))?;

    let ids: BTreeSet<String> = if data.trim_start().starts_with('[') {
        let entries: Vec<InputEntry> = serde_json::from_str(&data).map_err(|e| {
            Error::Configuration(format!("invalid meter list in {}: {e}", path.display()))
        })?;
        entries
            .into_iter()
            .map(|entry| match entry {
                InputEntry::Id(id) => id,
                InputEntry::Record { meter_id } => meter_id,
            })
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect()
    } else {
        data.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect()
    };

    if ids.is_empty() {
        return Err(Error::Configuration(format!(
            "no meter ids found in {}",
            path.display()
        )));
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("pricemap-test-{name}"));
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_plain_text_lines() {
        let path = write_temp(
            "plain.txt",
            "# origin meters\nm-aaa\n\n  m-bbb  \nm-aaa\n",
        );
        let ids = read_meter_ids(&path).unwrap();
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        assert_eq!(ids, ["m-aaa", "m-bbb"]);
    }

    #[test]
    fn reads_json_string_array() {
        let path = write_temp("strings.json", r#"["m-bbb", "m-aaa", "m-aaa"]"#);
        let ids = read_meter_ids(&path).unwrap();
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        assert_eq!(ids, ["m-aaa", "m-bbb"]);
    }

    #[test]
    fn reads_json_records_with_extra_fields() {
        let path = write_temp(
            "records.json",
            r#"[
                {"meterId": "m-aaa", "resourceId": "/vm/1", "cost": 12.5},
                {"meterId": "m-bbb", "resourceId": "/vm/2", "cost": 3.0}
            ]"#,
        );
        let ids = read_meter_ids(&path).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("m-aaa"));
        assert!(ids.contains("m-bbb"));
    }

    #[test]
    fn empty_file_is_a_configuration_error() {
        let path = write_temp("empty.txt", "\n# nothing here\n");
        let err = read_meter_ids(&path).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let err = read_meter_ids(Path::new("/nonexistent/meters.txt")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
