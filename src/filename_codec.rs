//! Encodes and decodes rotated log filenames:
//! `<base>-<build>-<YYYY>-<MM>-<DD>-<HH>[-<MI>][-<digit>].log[.gz]`
//! (`spec.md` §4.2).

use std::path::{Path, PathBuf};

/// The fields packed into one rotated filename.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DecodedName {
    pub build: u32,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: Option<u32>,
    pub digit: Option<u32>,
}

/// A filename is unrecognizable: wrong suffix, wrong prefix, or a
/// non-integer token where one was expected. Per `spec.md` §4.2, the
/// `ArchiveScanner` deletes files that fail to decode.
#[derive(Debug)]
pub struct CodecError;

/// Builds and parses filenames for one `(directory, basename)` pair.
pub struct FileNameCodec<'a> {
    directory: &'a Path,
    base: &'a str,
}

impl<'a> FileNameCodec<'a> {
    pub fn new(directory: &'a Path, base: &'a str) -> Self {
        Self { directory, base }
    }

    /// Encodes one rotated-file path. `minute` must be `Some` iff the
    /// rotation interval is `MINUTE`; `digit` is `Some(n)` (`n >= 1`) only
    /// when a same-boundary file already exists.
    #[allow(clippy::too_many_arguments)]
    pub fn encode(
        &self,
        build: u32,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: Option<u32>,
        digit: Option<u32>,
        compressed: bool,
    ) -> PathBuf {
        let mut name = format!("{}-{build}-{year:04}-{month:02}-{day:02}-{hour:02}", self.base);
        if let Some(mi) = minute {
            name.push_str(&format!("-{mi:02}"));
        }
        if let Some(d) = digit {
            name.push_str(&format!("-{d}"));
        }
        name.push_str(".log");
        if compressed {
            name.push_str(".gz");
        }
        self.directory.join(name)
    }

    /// Builds the mirror filenames: `<base>-latest.log` / `<base>-previous.log`.
    pub fn mirror_path(&self) -> PathBuf {
        self.directory.join(format!("{}-latest.log", self.base))
    }
    pub fn previous_mirror_path(&self) -> PathBuf {
        self.directory.join(format!("{}-previous.log", self.base))
    }

    /// Decodes a bare filename (no directory component) produced by
    /// [`encode`](Self::encode). `minute_present` must match the interval
    /// that was active when the file could have been written; the scanner
    /// knows this from the writer's current configuration, which is what
    /// removes the ambiguity the source's fallthrough parsing otherwise has.
    pub fn decode(&self, filename: &str, minute_present: bool) -> Result<DecodedName, CodecError> {
        let stripped = filename.strip_suffix(".log.gz").ok_or(CodecError)?;
        let prefix = format!("{}-", self.base);
        let rest = stripped.strip_prefix(&prefix).ok_or(CodecError)?;

        let tokens: Vec<&str> = rest.split('-').collect();
        // `build, year, month, day, hour[, minute]`
        let expected_len = if minute_present { 6 } else { 5 };
        let (time_tokens, digit_token) = if tokens.len() == expected_len + 1 {
            (&tokens[..expected_len], Some(tokens[expected_len]))
        } else if tokens.len() == expected_len {
            (&tokens[..expected_len], None)
        } else {
            return Err(CodecError);
        };

        let build: u32 = time_tokens[0].parse().map_err(|_| CodecError)?;
        let year: i32 = time_tokens[1].parse().map_err(|_| CodecError)?;
        let month: u32 = time_tokens[2].parse().map_err(|_| CodecError)?;
        let day: u32 = time_tokens[3].parse().map_err(|_| CodecError)?;
        let hour: u32 = time_tokens[4].parse().map_err(|_| CodecError)?;
        let minute = if minute_present {
            Some(time_tokens[5].parse().map_err(|_| CodecError)?)
        } else {
            None
        };
        let digit = digit_token
            .map(|t| t.parse::<u32>())
            .transpose()
            .map_err(|_| CodecError)?;

        Ok(DecodedName {
            build,
            year,
            month,
            day,
            hour,
            minute,
            digit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn encodes_hourly_filename() {
        let codec = FileNameCodec::new(Path::new("/var/log"), "node");
        let path = codec.encode(1480, 2024, 3, 15, 13, None, None, true);
        assert_eq!(path, Path::new("/var/log/node-1480-2024-03-15-13.log.gz"));
    }

    #[test]
    fn encodes_minute_filename() {
        let codec = FileNameCodec::new(Path::new("/var/log"), "node");
        let path = codec.encode(1480, 2024, 3, 15, 13, Some(25), None, true);
        assert_eq!(
            path,
            Path::new("/var/log/node-1480-2024-03-15-13-25.log.gz")
        );
    }

    #[test]
    fn roundtrips_with_disambiguation_digit() {
        let codec = FileNameCodec::new(Path::new("/var/log"), "node");
        let path = codec.encode(7, 2024, 3, 15, 13, None, Some(2), true);
        let filename = path.file_name().unwrap().to_str().unwrap();
        let decoded = codec.decode(filename, false).unwrap();
        assert_eq!(decoded.build, 7);
        assert_eq!(decoded.year, 2024);
        assert_eq!(decoded.month, 3);
        assert_eq!(decoded.day, 15);
        assert_eq!(decoded.hour, 13);
        assert_eq!(decoded.minute, None);
        assert_eq!(decoded.digit, Some(2));
    }

    #[test]
    fn roundtrips_with_minute_and_digit() {
        let codec = FileNameCodec::new(Path::new("/var/log"), "node");
        let path = codec.encode(7, 2024, 3, 15, 13, Some(5), Some(1), true);
        let filename = path.file_name().unwrap().to_str().unwrap();
        let decoded = codec.decode(filename, true).unwrap();
        assert_eq!(decoded.minute, Some(5));
        assert_eq!(decoded.digit, Some(1));
    }

    #[test]
    fn rejects_uncompressed_suffix() {
        let codec = FileNameCodec::new(Path::new("/var/log"), "node");
        assert!(codec.decode("node-7-2024-03-15-13.log", false).is_err());
    }

    #[test]
    fn rejects_foreign_prefix() {
        let codec = FileNameCodec::new(Path::new("/var/log"), "node");
        assert!(codec
            .decode("other-7-2024-03-15-13.log.gz", false)
            .is_err());
    }
}
