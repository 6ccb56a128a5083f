//! SCCS `prs` output parsing.

use super::SccsError;
use crate::config::TimestampZone;
use crate::record::ChangeRecord;
use chrono::NaiveDateTime;
use std::path::Path;

/// Line prefix opening a delta block.
pub const DELTA_MARKER: &str = "@@sccs2svn-delta@@";
/// Line closing a delta block.
pub const END_MARKER: &str = "@@sccs2svn-end@@";

/// `prs -d` data specification producing one block per delta:
/// a header line (type, SID, user, date, time), the comment lines,
/// and the end marker. `prs` expands the `\t` and `\n` escapes itself.
pub const PRS_FORMAT: &str = concat!(
    "@@sccs2svn-delta@@",
    "\\t:DT:", // delta type, D or R
    "\\t:I:",  // SID
    "\\t:P:",  // programmer
    "\\t:D:",  // yy/mm/dd
    "\\t:T:",  // hh:mm:ss
    "\\n:C:",  // comments
    "\\n@@sccs2svn-end@@"
);

/// Header of a delta block whose comment is still being read.
#[derive(Debug)]
struct PendingDelta {
    removed: bool,
    version: String,
    author: String,
    date: NaiveDateTime,
    comment: String,
}

/// Parse `prs` output for `sfile` into change records, oldest first.
///
/// Comment text is kept verbatim, including line terminators, because
/// grouping compares comments exactly. Removed deltas are dropped.
pub fn parse_prs_output(
    sfile: &Path,
    output: &str,
    zone: TimestampZone,
) -> Result<Vec<ChangeRecord>, SccsError> {
    let mut records = Vec::new();
    let mut pending: Option<PendingDelta> = None;

    for line in output.split_inclusive('\n') {
        if line.starts_with(END_MARKER) {
            let delta = pending
                .take()
                .ok_or_else(|| SccsError::parse(sfile, "end marker without a delta header"))?;
            if delta.removed {
                tracing::debug!("Skipping removed delta {} of {}", delta.version, sfile.display());
                continue;
            }
            records.push(ChangeRecord::new(
                sfile,
                delta.version,
                delta.author,
                zone.resolve(delta.date),
                delta.comment,
            ));
            continue;
        }

        if let Some(header) = line.strip_prefix(DELTA_MARKER) {
            if let Some(open) = &pending {
                return Err(SccsError::parse(
                    sfile,
                    format!("delta {} is not terminated", open.version),
                ));
            }
            pending = Some(parse_header(sfile, header)?);
            continue;
        }

        match pending.as_mut() {
            Some(delta) => delta.comment.push_str(line),
            None if line.trim().is_empty() => {}
            None => tracing::debug!("Ignoring prs output outside a delta: {:?}", line),
        }
    }

    if let Some(open) = pending {
        return Err(SccsError::parse(
            sfile,
            format!("delta {} is not terminated", open.version),
        ));
    }

    // prs lists the newest delta first
    records.reverse();
    Ok(records)
}

fn parse_header(sfile: &Path, header: &str) -> Result<PendingDelta, SccsError> {
    let header = header.trim_end_matches(['\n', '\r']);
    let fields: Vec<&str> = header.strip_prefix('\t').unwrap_or(header).split('\t').collect();
    if fields.len() != 5 {
        return Err(SccsError::parse(
            sfile,
            format!("malformed delta header {:?}", header),
        ));
    }

    let date = parse_date(fields[3], fields[4]).ok_or_else(|| {
        SccsError::parse(
            sfile,
            format!("bad date '{} {}' on delta {}", fields[3], fields[4], fields[1]),
        )
    })?;

    Ok(PendingDelta {
        removed: fields[0].trim() == "R",
        version: fields[1].trim().to_string(),
        author: fields[2].trim().to_string(),
        date,
        comment: String::new(),
    })
}

/// Parse the `:D:` and `:T:` fields. Two-digit years are tried first.
fn parse_date(date: &str, time: &str) -> Option<NaiveDateTime> {
    let stamp = format!("{} {}", date.trim(), time.trim());
    NaiveDateTime::parse_from_str(&stamp, "%y/%m/%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(&stamp, "%Y/%m/%d %H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const SFILE: &str = "/src/proj/SCCS/s.main.c";

    fn block(kind: &str, sid: &str, user: &str, date: &str, comment: &str) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\n{}{}\n",
            DELTA_MARKER, kind, sid, user, date, comment, END_MARKER
        )
    }

    #[test]
    fn test_parse_oldest_first() {
        let output = [
            block("D", "1.2", "ann", "05/11/14\t08:00:01", "second\n"),
            block("D", "1.1", "ann", "05/11/13\t10:00:00", "first\n"),
        ]
        .concat();

        let records = parse_prs_output(Path::new(SFILE), &output, TimestampZone::Utc).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].version(), "1.1");
        assert_eq!(records[1].version(), "1.2");
        assert_eq!(records[0].author(), "ann");
        assert_eq!(records[0].path(), Path::new(SFILE));
        let t = records[1].timestamp();
        assert_eq!((t.year(), t.month(), t.day()), (2005, 11, 14));
        assert_eq!((t.hour(), t.minute(), t.second()), (8, 0, 1));
    }

    #[test]
    fn test_multiline_comment_verbatim() {
        let output = block("D", "1.3", "ann", "98/01/02\t03:04:05", "line one\n  line two\n");
        let records = parse_prs_output(Path::new(SFILE), &output, TimestampZone::Utc).unwrap();
        assert_eq!(records[0].comment(), "line one\n  line two\n");
        assert_eq!(records[0].timestamp().year(), 1998);
    }

    #[test]
    fn test_empty_comment() {
        let output = block("D", "1.1", "ann", "98/01/02\t03:04:05", "");
        let records = parse_prs_output(Path::new(SFILE), &output, TimestampZone::Utc).unwrap();
        assert_eq!(records[0].comment(), "");
    }

    #[test]
    fn test_removed_delta_skipped() {
        let output = [
            block("R", "1.3", "ann", "99/05/05\t00:00:00", "oops\n"),
            block("D", "1.2", "ann", "99/05/04\t00:00:00", "keep\n"),
        ]
        .concat();
        let records = parse_prs_output(Path::new(SFILE), &output, TimestampZone::Utc).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].version(), "1.2");
    }

    #[test]
    fn test_four_digit_year() {
        let output = block("D", "1.1", "ann", "2003/07/08\t09:10:11", "x\n");
        let records = parse_prs_output(Path::new(SFILE), &output, TimestampZone::Utc).unwrap();
        assert_eq!(records[0].timestamp().year(), 2003);
    }

    #[test]
    fn test_malformed_header() {
        let output = format!("{}\tD\t1.1\tann\n{}\n", DELTA_MARKER, END_MARKER);
        let err = parse_prs_output(Path::new(SFILE), &output, TimestampZone::Utc).unwrap_err();
        assert!(matches!(err, SccsError::ParseError { .. }));
    }

    #[test]
    fn test_bad_date() {
        let output = block("D", "1.1", "ann", "05/13/45\t10:00:00", "x\n");
        let err = parse_prs_output(Path::new(SFILE), &output, TimestampZone::Utc).unwrap_err();
        assert!(err.to_string().contains("bad date"));
    }

    #[test]
    fn test_unterminated_delta() {
        let output = format!("{}\tD\t1.1\tann\t05/11/13\t10:00:00\ncomment\n", DELTA_MARKER);
        let err = parse_prs_output(Path::new(SFILE), &output, TimestampZone::Utc).unwrap_err();
        assert!(err.to_string().contains("not terminated"));
    }

    #[test]
    fn test_empty_output() {
        let records = parse_prs_output(Path::new(SFILE), "", TimestampZone::Utc).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_format_uses_markers() {
        assert!(PRS_FORMAT.starts_with(DELTA_MARKER));
        assert!(PRS_FORMAT.ends_with(END_MARKER));
    }
}
