//! XML encoding and decoding of shards
//!
//! A shard document has a `head` carrying the year and the preamble, and a
//! `doc` holding one `entry` element per diary entry in stored order:
//!
//! ```xml
//! <root>
//!   <head>
//!     <year>2023</year>
//!     <text>Diary of the year 2023.</text>
//!   </head>
//!   <doc>
//!     <entry date_time="2023-05-01T10:00:00" type="text">hello</entry>
//!     <entry date_time="2023-05-01T11:00:00" type="photo">
//!       <text>caption</text>
//!       <photo>IMG_20230501_110000_0.jpg</photo>
//!     </entry>
//!   </doc>
//! </root>
//! ```

use std::fmt::Display;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::entry::{Entry, EntryKind};
use crate::shard::{Shard, ShardError, ShardResult, ShardYear};
use crate::time::{format_timestamp, parse_timestamp, Timestamp};

const TAG_TEXT: &str = "text";
const TAG_PHOTO: &str = "photo";

/// Create an empty shard for a year that has no document yet
pub fn new_empty(year: ShardYear, preamble: impl Into<String>) -> Shard {
    Shard::new_empty(year, preamble)
}

/// Encode a shard as an XML document
pub fn encode(shard: &Shard) -> ShardResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(xml_error)?;
    open(&mut writer, BytesStart::new("root"))?;

    open(&mut writer, BytesStart::new("head"))?;
    leaf(&mut writer, "year", &shard.year.to_string())?;
    leaf(&mut writer, TAG_TEXT, &shard.preamble)?;
    close(&mut writer, "head")?;

    open(&mut writer, BytesStart::new("doc"))?;
    for entry in &shard.entries {
        write_entry(&mut writer, entry)?;
    }
    close(&mut writer, "doc")?;

    close(&mut writer, "root")?;

    String::from_utf8(writer.into_inner()).map_err(xml_error)
}

/// Decode an XML document into a shard
pub fn decode(document: &str) -> ShardResult<Shard> {
    let mut reader = Reader::from_str(document);
    let mut builder = ShardBuilder::default();
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            ShardError::xml(format!("at byte {}: {}", reader.buffer_position(), e))
        })?;

        match event {
            Event::Start(start) => {
                path.push(element_name(&start));
                builder.open(&path, &start)?;
                text.clear();
            }
            Event::Empty(start) => {
                path.push(element_name(&start));
                builder.open(&path, &start)?;
                builder.close(&path, String::new())?;
                path.pop();
                text.clear();
            }
            Event::Text(t) => text.push_str(&t.unescape().map_err(xml_error)?),
            Event::CData(c) => text.push_str(std::str::from_utf8(&c).map_err(xml_error)?),
            Event::End(_) => {
                builder.close(&path, std::mem::take(&mut text))?;
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open_element) = path.last() {
        return Err(ShardError::xml(format!(
            "document ends inside <{}>",
            open_element
        )));
    }

    builder.finish()
}

fn write_entry(writer: &mut Writer<Vec<u8>>, entry: &Entry) -> ShardResult<()> {
    let timestamp = format_timestamp(&entry.timestamp);
    let mut start = BytesStart::new("entry");
    start.push_attribute(("date_time", timestamp.as_str()));
    start.push_attribute(("type", entry.type_tag()));

    match &entry.kind {
        EntryKind::Text if entry.body.is_empty() => {
            writer.write_event(Event::Empty(start)).map_err(xml_error)?;
        }
        EntryKind::Text => {
            open(writer, start)?;
            writer
                .write_event(Event::Text(BytesText::new(&entry.body)))
                .map_err(xml_error)?;
            close(writer, "entry")?;
        }
        EntryKind::Photo { asset_ref } => {
            open(writer, start)?;
            leaf(writer, TAG_TEXT, &entry.body)?;
            leaf(writer, TAG_PHOTO, file_name(asset_ref))?;
            close(writer, "entry")?;
        }
    }

    Ok(())
}

fn open(writer: &mut Writer<Vec<u8>>, start: BytesStart<'_>) -> ShardResult<()> {
    writer.write_event(Event::Start(start)).map_err(xml_error)
}

fn close(writer: &mut Writer<Vec<u8>>, name: &str) -> ShardResult<()> {
    writer.write_event(Event::End(BytesEnd::new(name))).map_err(xml_error)
}

/// Write `<name>text</name>`, or `<name/>` for empty text so that the
/// indenting writer cannot put whitespace inside it
fn leaf(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> ShardResult<()> {
    if text.is_empty() {
        return writer
            .write_event(Event::Empty(BytesStart::new(name)))
            .map_err(xml_error);
    }
    open(writer, BytesStart::new(name))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    close(writer, name)
}

fn file_name(asset_ref: &str) -> &str {
    Path::new(asset_ref)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(asset_ref)
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn attribute(start: &BytesStart<'_>, name: &str) -> ShardResult<Option<String>> {
    match start.try_get_attribute(name).map_err(xml_error)? {
        Some(attr) => Ok(Some(attr.unescape_value().map_err(xml_error)?.into_owned())),
        None => Ok(None),
    }
}

fn xml_error<E: Display>(err: E) -> ShardError {
    ShardError::xml(err.to_string())
}

/// Position of an element below the root, e.g. `doc/entry/photo`
fn location(path: &[String]) -> String {
    path.get(1..).map(|inner| inner.join("/")).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryTag {
    Text,
    Photo,
}

/// An `entry` element whose children have not all been read yet
#[derive(Debug)]
struct PendingEntry {
    timestamp: Timestamp,
    tag: EntryTag,
    caption: Option<String>,
    asset: Option<String>,
}

impl PendingEntry {
    fn from_start(start: &BytesStart<'_>) -> ShardResult<Self> {
        let raw = attribute(start, "date_time")?
            .ok_or_else(|| ShardError::malformed("entry without a date_time attribute"))?;
        let timestamp = parse_timestamp(&raw)
            .ok_or_else(|| ShardError::malformed(format!("entry has unparseable date_time '{}'", raw)))?;

        let tag = match attribute(start, "type")?.as_deref() {
            Some(TAG_TEXT) => EntryTag::Text,
            Some(TAG_PHOTO) => EntryTag::Photo,
            Some(other) => {
                return Err(ShardError::malformed(format!(
                    "entry at {} has unsupported type '{}'",
                    raw, other
                )))
            }
            None => {
                return Err(ShardError::malformed(format!(
                    "entry at {} has no type",
                    raw
                )))
            }
        };

        Ok(Self {
            timestamp,
            tag,
            caption: None,
            asset: None,
        })
    }

    /// Build the entry; `direct_text` is the text directly inside `entry`
    fn finish(self, direct_text: String) -> ShardResult<Entry> {
        match self.tag {
            EntryTag::Text => Ok(Entry {
                timestamp: self.timestamp,
                body: direct_text,
                kind: EntryKind::Text,
            }),
            EntryTag::Photo => {
                let asset_ref = self
                    .asset
                    .filter(|asset| !asset.is_empty())
                    .ok_or_else(|| {
                        ShardError::malformed(format!(
                            "photo entry at {} has no photo file name",
                            format_timestamp(&self.timestamp)
                        ))
                    })?;
                Ok(Entry {
                    timestamp: self.timestamp,
                    body: self.caption.unwrap_or_default(),
                    kind: EntryKind::Photo { asset_ref },
                })
            }
        }
    }
}

#[derive(Debug, Default)]
struct ShardBuilder {
    year: Option<ShardYear>,
    preamble: String,
    entries: Vec<Entry>,
    pending: Option<PendingEntry>,
}

impl ShardBuilder {
    fn open(&mut self, path: &[String], start: &BytesStart<'_>) -> ShardResult<()> {
        if location(path) == "doc/entry" {
            self.pending = Some(PendingEntry::from_start(start)?);
        }
        Ok(())
    }

    fn close(&mut self, path: &[String], text: String) -> ShardResult<()> {
        match location(path).as_str() {
            "head/year" => {
                let year = text.trim().parse::<ShardYear>().map_err(|_| {
                    ShardError::malformed(format!("shard year '{}' is not a number", text.trim()))
                })?;
                self.year = Some(year);
            }
            "head/text" => self.preamble = text,
            "doc/entry/text" => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.caption = Some(text);
                }
            }
            "doc/entry/photo" => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.asset = Some(text);
                }
            }
            "doc/entry" => {
                if let Some(pending) = self.pending.take() {
                    self.entries.push(pending.finish(text)?);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> ShardResult<Shard> {
        let year = self
            .year
            .ok_or_else(|| ShardError::malformed("shard header has no year"))?;
        Ok(Shard {
            year,
            preamble: self.preamble,
            entries: self.entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, s).unwrap()
    }

    fn sample_shard() -> Shard {
        let mut shard = new_empty(2023, "Diary of the year 2023.");
        shard.push(Entry::text(ts(2023, 5, 1, 10, 0, 0), "hello"));
        shard.push(Entry::photo(ts(2023, 5, 1, 11, 0, 0), "at the lake", "IMG_20230501_110000_0.jpg"));
        shard
    }

    #[test]
    fn test_encode_layout() -> ShardResult<()> {
        let document = encode(&sample_shard())?;

        assert!(document.starts_with("<?xml"));
        assert!(document.contains("<year>2023</year>"));
        assert!(document.contains("<text>Diary of the year 2023.</text>"));
        assert!(document.contains(r#"<entry date_time="2023-05-01T10:00:00" type="text">hello</entry>"#));
        assert!(document.contains(r#"<entry date_time="2023-05-01T11:00:00" type="photo">"#));
        assert!(document.contains("<photo>IMG_20230501_110000_0.jpg</photo>"));

        // Stored order is kept
        let text_pos = document.find("hello").unwrap();
        let photo_pos = document.find("at the lake").unwrap();
        assert!(text_pos < photo_pos);

        Ok(())
    }

    #[test]
    fn test_round_trip() -> ShardResult<()> {
        let shard = sample_shard();
        assert_eq!(decode(&encode(&shard)?)?, shard);

        let empty = new_empty(1999, "");
        assert_eq!(decode(&encode(&empty)?)?, empty);

        Ok(())
    }

    #[test]
    fn test_round_trip_keeps_text_verbatim() -> ShardResult<()> {
        let mut shard = new_empty(2020, "  leading & trailing  ");
        shard.push(Entry::text(ts(2020, 1, 1, 0, 0, 0), "<b>bold</b> \"quoted\" & 'single'"));
        shard.push(Entry::text(ts(2020, 1, 1, 0, 0, 1), "line one\nline two\n\n  indented"));
        shard.push(Entry::text(ts(2020, 1, 1, 0, 0, 2), ""));
        shard.push(Entry::text(ts(2020, 1, 1, 0, 0, 3), "   "));
        shard.push(Entry::photo(ts(2020, 1, 1, 0, 0, 4), "", "IMG_20200101_000004_0.png"));

        assert_eq!(decode(&encode(&shard)?)?, shard);
        Ok(())
    }

    #[test]
    fn test_photo_is_stored_as_basename() -> ShardResult<()> {
        let mut shard = new_empty(2023, "");
        shard.push(Entry {
            timestamp: ts(2023, 5, 1, 11, 0, 0),
            body: String::new(),
            kind: EntryKind::Photo {
                asset_ref: "/abs/path/Img/IMG_20230501_110000_0.jpg".to_string(),
            },
        });

        let document = encode(&shard)?;
        assert!(document.contains("<photo>IMG_20230501_110000_0.jpg</photo>"));
        assert!(!document.contains("/abs/path"));
        Ok(())
    }

    #[test]
    fn test_decode_foreign_document() -> ShardResult<()> {
        // Written by another tool: no declaration, no indentation, CDATA body
        let document = concat!(
            "<root><head><year>2018</year><text>Das isch es Johr 2018.</text></head><doc>",
            "<entry date_time=\"2018-03-04T05:06:07\" type=\"text\"><![CDATA[a < b]]></entry>",
            "<entry date_time=\"2018-03-05T00:00:00\" type=\"photo\"><photo>x.jpg</photo><text>cap</text></entry>",
            "</doc></root>"
        );

        let shard = decode(document)?;
        assert_eq!(shard.year, 2018);
        assert_eq!(shard.preamble, "Das isch es Johr 2018.");
        assert_eq!(shard.len(), 2);
        assert_eq!(shard.entries[0].body, "a < b");
        assert_eq!(shard.entries[1].asset_ref(), Some("x.jpg"));
        assert_eq!(shard.entries[1].body, "cap");
        Ok(())
    }

    #[test]
    fn test_decode_missing_parts_are_lenient() -> ShardResult<()> {
        // No preamble and no doc section
        let shard = decode("<root><head><year>2021</year></head></root>")?;
        assert_eq!(shard, new_empty(2021, ""));
        Ok(())
    }

    #[test]
    fn test_decode_rejects_malformed_shards() {
        let cases = [
            // No year
            "<root><head><text>x</text></head><doc/></root>",
            // Year is not a number
            "<root><head><year>twenty</year></head><doc/></root>",
            // Entry without timestamp
            "<root><head><year>2020</year></head><doc><entry type=\"text\">x</entry></doc></root>",
            // Unparseable timestamp
            "<root><head><year>2020</year></head><doc><entry date_time=\"yesterday\" type=\"text\">x</entry></doc></root>",
            // Unknown entry type
            "<root><head><year>2020</year></head><doc><entry date_time=\"2020-01-01T00:00:00\" type=\"video\">x</entry></doc></root>",
            // Photo without file name
            "<root><head><year>2020</year></head><doc><entry date_time=\"2020-01-01T00:00:00\" type=\"photo\"><text>x</text></entry></doc></root>",
        ];

        for document in cases {
            let err = decode(document).unwrap_err();
            assert!(matches!(err, ShardError::Malformed(_)), "{document}: {err}");
        }
    }

    #[test]
    fn test_decode_rejects_broken_xml() {
        let truncated = "<root><head><year>2020</year></head><doc>";
        assert!(matches!(decode(truncated), Err(ShardError::Xml(_))));

        let mismatched = "<root><head><year>2020</head></root>";
        assert!(decode(mismatched).unwrap_err().is_malformed());

        assert!(matches!(decode(""), Err(ShardError::Malformed(_))));
    }

    fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1i32..=9999, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..60)
            .prop_map(|(y, mo, d, h, mi, s)| ts(y, mo, d, h, mi, s))
    }

    fn arb_entry() -> impl Strategy<Value = Entry> {
        prop_oneof![
            (arb_timestamp(), "[\\PC\n]{0,40}").prop_map(|(t, body)| Entry::text(t, body)),
            (arb_timestamp(), "[\\PC\n]{0,40}", "[A-Za-z0-9_]{1,20}\\.(jpg|png)")
                .prop_map(|(t, caption, asset)| Entry::photo(t, caption, asset)),
        ]
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(
            year in -50i32..10000,
            preamble in "[\\PC\n]{0,40}",
            entries in proptest::collection::vec(arb_entry(), 0..8),
        ) {
            let shard = Shard { year, preamble, entries };
            let decoded = decode(&encode(&shard).unwrap()).unwrap();
            prop_assert_eq!(decoded, shard);
        }
    }
}
