//! Committed revisions and the sinks that receive them
//!
//! Every committed transaction is handed to a [`RevisionSink`] as a
//! [`Revision`]. [`DumpWriter`] serializes revisions in the Subversion
//! dumpfile format (version 2), suitable for `svnadmin load`.
//! [`MemorySink`] keeps them in memory.

use std::io::Write;

use crate::error::Result;
use crate::node::{
    format_svn_date, NodeKind, Props, Revnum, PROP_REVISION_AUTHOR, PROP_REVISION_DATE,
    PROP_REVISION_LOG,
};
use chrono::{DateTime, Utc};

/// Dumpfile format version written by [`DumpWriter`]
pub const DUMP_FORMAT_VERSION: u32 = 2;

/// What happened to a node within a revision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAction {
    Add,
    Change,
    Delete,
}

impl NodeAction {
    fn as_dump_str(&self) -> &'static str {
        match self {
            NodeAction::Add => "add",
            NodeAction::Change => "change",
            NodeAction::Delete => "delete",
        }
    }
}

/// One node record of a revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeChange {
    pub path: String,
    pub kind: NodeKind,
    pub action: NodeAction,
    /// Full property set, present when properties were set in this revision
    /// (always present for additions)
    pub props: Option<Props>,
    /// New contents, present when text was written in this revision
    pub text: Option<Vec<u8>>,
}

/// A committed revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub number: Revnum,
    pub author: String,
    pub log: String,
    pub date: DateTime<Utc>,
    pub changes: Vec<NodeChange>,
}

impl Revision {
    /// Revision properties in the form Subversion stores them
    pub fn props(&self) -> Props {
        let mut props = Props::new();
        props.insert(PROP_REVISION_AUTHOR.to_string(), self.author.clone());
        props.insert(PROP_REVISION_DATE.to_string(), format_svn_date(&self.date));
        props.insert(PROP_REVISION_LOG.to_string(), self.log.clone());
        props
    }
}

/// Destination for committed revisions
pub trait RevisionSink {
    /// Persist one revision. Revisions arrive in increasing order.
    fn write_revision(&mut self, revision: &Revision) -> Result<()>;
}

/// Sink that keeps every revision in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    revisions: Vec<Revision>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revisions(&self) -> &[Revision] {
        &self.revisions
    }
}

impl RevisionSink for MemorySink {
    fn write_revision(&mut self, revision: &Revision) -> Result<()> {
        self.revisions.push(revision.clone());
        Ok(())
    }
}

/// Dumpfile stream writer
pub struct DumpWriter<W: Write> {
    out: W,
    header_written: bool,
}

impl<W: Write> DumpWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            header_written: false,
        }
    }

    /// Flush and return the underlying writer
    pub fn into_inner(mut self) -> Result<W> {
        self.write_header()?;
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_header(&mut self) -> Result<()> {
        if !self.header_written {
            write!(
                self.out,
                "SVN-fs-dump-format-version: {}\n\n",
                DUMP_FORMAT_VERSION
            )?;
            self.header_written = true;
        }
        Ok(())
    }

    fn write_node(&mut self, node: &NodeChange) -> Result<()> {
        writeln!(self.out, "Node-path: {}", node.path)?;
        if node.action != NodeAction::Delete {
            if let Some(kind) = node.kind.as_dump_str() {
                writeln!(self.out, "Node-kind: {}", kind)?;
            }
        }
        writeln!(self.out, "Node-action: {}", node.action.as_dump_str())?;

        if node.action == NodeAction::Delete {
            self.out.write_all(b"\n\n")?;
            return Ok(());
        }

        let props = node.props.as_ref().map(encode_props);
        let prop_len = props.as_ref().map_or(0, Vec::len);
        let text_len = node.text.as_ref().map_or(0, Vec::len);

        if props.is_some() {
            writeln!(self.out, "Prop-content-length: {}", prop_len)?;
        }
        if node.text.is_some() {
            writeln!(self.out, "Text-content-length: {}", text_len)?;
        }
        if props.is_some() || node.text.is_some() {
            writeln!(self.out, "Content-length: {}", prop_len + text_len)?;
        }
        self.out.write_all(b"\n")?;

        if let Some(props) = &props {
            self.out.write_all(props)?;
        }
        if let Some(text) = &node.text {
            self.out.write_all(text)?;
        }
        self.out.write_all(b"\n\n")?;
        Ok(())
    }
}

impl<W: Write> RevisionSink for DumpWriter<W> {
    fn write_revision(&mut self, revision: &Revision) -> Result<()> {
        self.write_header()?;

        let props = encode_props(&revision.props());
        writeln!(self.out, "Revision-number: {}", revision.number)?;
        writeln!(self.out, "Prop-content-length: {}", props.len())?;
        writeln!(self.out, "Content-length: {}", props.len())?;
        self.out.write_all(b"\n")?;
        self.out.write_all(&props)?;
        self.out.write_all(b"\n")?;

        for node in &revision.changes {
            self.write_node(node)?;
        }
        Ok(())
    }
}

/// Encode a property hash terminated by `PROPS-END`
fn encode_props(props: &Props) -> Vec<u8> {
    let mut buf = Vec::new();
    for (name, value) in props {
        buf.extend_from_slice(format!("K {}\n", name.len()).as_bytes());
        buf.extend_from_slice(name.as_bytes());
        buf.push(b'\n');
        buf.extend_from_slice(format!("V {}\n", value.len()).as_bytes());
        buf.extend_from_slice(value.as_bytes());
        buf.push(b'\n');
    }
    buf.extend_from_slice(b"PROPS-END\n");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn revision(changes: Vec<NodeChange>) -> Revision {
        Revision {
            number: 1,
            author: "ann".to_string(),
            log: "initial".to_string(),
            date: Utc.with_ymd_and_hms(2005, 11, 13, 10, 0, 0).unwrap(),
            changes,
        }
    }

    fn dump(revision: &Revision) -> String {
        let mut writer = DumpWriter::new(Vec::new());
        writer.write_revision(revision).unwrap();
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_encode_props() {
        let mut props = Props::new();
        props.insert("svn:eol-style".to_string(), "native".to_string());
        let encoded = String::from_utf8(encode_props(&props)).unwrap();
        assert_eq!(encoded, "K 13\nsvn:eol-style\nV 6\nnative\nPROPS-END\n");
    }

    #[test]
    fn test_revision_header() {
        let out = dump(&revision(vec![]));
        assert!(out.starts_with("SVN-fs-dump-format-version: 2\n\n"));
        assert!(out.contains("Revision-number: 1\n"));
        assert!(out.contains("K 10\nsvn:author\nV 3\nann\n"));
        assert!(out.contains("K 8\nsvn:date\nV 27\n2005-11-13T10:00:00.000000Z\n"));
        assert!(out.contains("K 7\nsvn:log\nV 7\ninitial\n"));
    }

    #[test]
    fn test_file_add_lengths() {
        let out = dump(&revision(vec![NodeChange {
            path: "proj/main.c".to_string(),
            kind: NodeKind::File,
            action: NodeAction::Add,
            props: Some(Props::new()),
            text: Some(b"int x;\n".to_vec()),
        }]));
        assert!(out.contains(
            "Node-path: proj/main.c\nNode-kind: file\nNode-action: add\n\
             Prop-content-length: 10\nText-content-length: 7\nContent-length: 17\n\n\
             PROPS-END\nint x;\n\n\n"
        ));
    }

    #[test]
    fn test_change_without_props_omits_prop_block() {
        let out = dump(&revision(vec![NodeChange {
            path: "proj/main.c".to_string(),
            kind: NodeKind::File,
            action: NodeAction::Change,
            props: None,
            text: Some(b"x".to_vec()),
        }]));
        assert!(!out.contains("PROPS-END\nx"));
        assert!(out.contains(
            "Node-action: change\nText-content-length: 1\nContent-length: 1\n\nx\n\n"
        ));
    }

    #[test]
    fn test_delete_has_no_kind() {
        let out = dump(&revision(vec![NodeChange {
            path: "old-".to_string(),
            kind: NodeKind::Dir,
            action: NodeAction::Delete,
            props: None,
            text: None,
        }]));
        assert!(out.contains("Node-path: old-\nNode-action: delete\n\n\n"));
        assert!(!out.contains("Node-kind"));
    }

    #[test]
    fn test_memory_sink_records() {
        let mut sink = MemorySink::new();
        sink.write_revision(&revision(vec![])).unwrap();
        assert_eq!(sink.revisions().len(), 1);
        assert_eq!(sink.revisions()[0].author, "ann");
    }
}
