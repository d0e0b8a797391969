//! Record codec.
//!
//! Pure functions, no state. Every length read from a buffer is bounds-checked
//! before it is used, so truncated or hostile buffers fail with
//! [`DecodeError::TooShort`] instead of reading out of range.

use byteorder::{ByteOrder, LittleEndian};
use tracing::warn;

use crate::error::{DecodeError, EncodeError};
use crate::record::{
    Record, HEADER_LEN, LEN_PREFIX, MAX_RECORD_LEN, TITLE_LEN_OFFSET, TITLE_OFFSET,
};
use crate::store::RecordKey;

/// Encode a record for writing.
///
/// Rejects ratings outside `[1, 5]`, empty titles and records larger than
/// [`MAX_RECORD_LEN`]. Never truncates.
pub fn encode_record(record: &Record) -> Result<Vec<u8>, EncodeError> {
    if !record.has_valid_rating() {
        return Err(EncodeError::RatingOutOfRange {
            rating: record.rating,
        });
    }
    if record.title.is_empty() {
        return Err(EncodeError::EmptyTitle);
    }
    let len = record.encoded_len();
    if len > MAX_RECORD_LEN {
        return Err(EncodeError::RecordTooLarge {
            len,
            max: MAX_RECORD_LEN,
        });
    }
    Ok(write_record(record))
}

/// Lay out a record without validation.
pub(crate) fn write_record(record: &Record) -> Vec<u8> {
    let title = record.title.as_bytes();
    let description = record.description.as_bytes();

    let mut buf = vec![0u8; record.encoded_len()];
    buf[0] = record.tag;
    buf[1] = record.rating;
    LittleEndian::write_u32(
        &mut buf[TITLE_LEN_OFFSET..TITLE_OFFSET],
        title.len() as u32,
    );

    let title_end = TITLE_OFFSET + title.len();
    buf[TITLE_OFFSET..title_end].copy_from_slice(title);

    let desc_start = title_end + LEN_PREFIX;
    LittleEndian::write_u32(&mut buf[title_end..desc_start], description.len() as u32);
    buf[desc_start..].copy_from_slice(description);
    buf
}

/// Decode a record buffer.
///
/// Bytes past the end of the description are ignored (accounts may be
/// allocated larger than their content). Neither `tag` nor `rating` is
/// checked; see [`decode_expecting`].
pub fn decode_record(buf: &[u8]) -> Result<Record, DecodeError> {
    let available = buf.len();
    let too_short = |needed: usize| DecodeError::TooShort { needed, available };

    if available < HEADER_LEN {
        return Err(too_short(HEADER_LEN));
    }
    let tag = buf[0];
    let rating = buf[1];

    let title_len = LittleEndian::read_u32(&buf[TITLE_LEN_OFFSET..TITLE_OFFSET]) as usize;
    let title_end = TITLE_OFFSET
        .checked_add(title_len)
        .ok_or_else(|| too_short(usize::MAX))?;
    let desc_start = title_end
        .checked_add(LEN_PREFIX)
        .ok_or_else(|| too_short(usize::MAX))?;
    if desc_start > available {
        return Err(too_short(desc_start));
    }

    let description_len = LittleEndian::read_u32(&buf[title_end..desc_start]) as usize;
    let desc_end = desc_start
        .checked_add(description_len)
        .ok_or_else(|| too_short(usize::MAX))?;
    if desc_end > available {
        return Err(too_short(desc_end));
    }

    let title = std::str::from_utf8(&buf[TITLE_OFFSET..title_end])
        .map_err(|_| DecodeError::InvalidUtf8 { field: "title" })?;
    let description = std::str::from_utf8(&buf[desc_start..desc_end])
        .map_err(|_| DecodeError::InvalidUtf8 {
            field: "description",
        })?;

    Ok(Record {
        tag,
        rating,
        title: title.to_string(),
        description: description.to_string(),
    })
}

/// Decode a record and require a specific tag.
pub fn decode_expecting(buf: &[u8], expected: u8) -> Result<Record, DecodeError> {
    let record = decode_record(buf)?;
    if record.tag != expected {
        return Err(DecodeError::UnexpectedTag {
            found: record.tag,
            expected,
        });
    }
    Ok(record)
}

/// Decode a fetched batch, keeping input order.
///
/// Absent buffers and decode failures are dropped, so the result may be
/// shorter than the input. A batch that decodes to nothing is not an error.
pub fn decode_batch<'a, I>(entries: I, accepted_tag: Option<u8>) -> Vec<Record>
where
    I: IntoIterator<Item = (&'a RecordKey, Option<&'a [u8]>)>,
{
    let mut records = Vec::new();
    for (key, buf) in entries {
        let Some(buf) = buf else {
            continue;
        };
        let decoded = match accepted_tag {
            Some(tag) => decode_expecting(buf, tag),
            None => decode_record(buf),
        };
        match decoded {
            Ok(record) => records.push(record),
            Err(e) => warn!(key = %key, error = %e, "skipping undecodable record"),
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{MIN_RECORD_LEN, RECORD_TAG};

    fn sample() -> Record {
        Record::new("Alien", 5, "In space no one can hear you scream.")
    }

    #[test]
    fn test_wire_layout() {
        let buf = encode_record(&Record::new("Up", 3, "Balloons")).unwrap();
        let mut expected = vec![RECORD_TAG, 3];
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(b"Up");
        expected.extend_from_slice(&8u32.to_le_bytes());
        expected.extend_from_slice(b"Balloons");
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_roundtrip() {
        let record = sample();
        let buf = encode_record(&record).unwrap();
        assert_eq!(decode_record(&buf).unwrap(), record);
    }

    #[test]
    fn test_roundtrip_multibyte_utf8() {
        let record = Record::new("Amélie", 4, "Le fabuleux destin d'Amélie Poulain 🎬");
        let buf = encode_record(&record).unwrap();
        assert_eq!(decode_record(&buf).unwrap(), record);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let record = sample();
        let mut buf = encode_record(&record).unwrap();
        buf.extend_from_slice(&[0u8; 64]);
        assert_eq!(decode_record(&buf).unwrap(), record);
    }

    #[test]
    fn test_decode_too_short_header() {
        let err = decode_record(&[1, 5, 0]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TooShort {
                needed: 6,
                available: 3
            }
        );
    }

    #[test]
    fn test_decode_title_overruns_buffer() {
        let mut buf = vec![1, 5];
        buf.extend_from_slice(&100u32.to_le_bytes());
        buf.extend_from_slice(b"short");
        let err = decode_record(&buf).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TooShort {
                needed: 110,
                available: 11
            }
        );
    }

    #[test]
    fn test_decode_description_overruns_buffer() {
        let mut buf = encode_record(&sample()).unwrap();
        buf.truncate(buf.len() - 1);
        assert!(matches!(
            decode_record(&buf),
            Err(DecodeError::TooShort { .. })
        ));
    }

    #[test]
    fn test_decode_huge_lengths_do_not_overflow() {
        let mut buf = vec![1, 5];
        buf.extend_from_slice(&u32::MAX.to_le_bytes());
        buf.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decode_record(&buf),
            Err(DecodeError::TooShort { .. })
        ));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let mut buf = write_record(&Record::new("ab", 3, "ok"));
        buf[TITLE_OFFSET] = 0xff;
        assert_eq!(
            decode_record(&buf).unwrap_err(),
            DecodeError::InvalidUtf8 { field: "title" }
        );

        let mut buf = write_record(&Record::new("ab", 3, "ok"));
        let last = buf.len() - 1;
        buf[last] = 0xc3;
        assert_eq!(
            decode_record(&buf).unwrap_err(),
            DecodeError::InvalidUtf8 {
                field: "description"
            }
        );
    }

    #[test]
    fn test_decode_does_not_validate_rating_or_tag() {
        let record = Record::new("Zardoz", 42, "").with_tag(9);
        let buf = write_record(&record);
        assert_eq!(decode_record(&buf).unwrap(), record);
    }

    #[test]
    fn test_decode_expecting_tag() {
        let buf = write_record(&Record::new("Heat", 4, "").with_tag(2));
        assert_eq!(
            decode_expecting(&buf, RECORD_TAG).unwrap_err(),
            DecodeError::UnexpectedTag {
                found: 2,
                expected: RECORD_TAG
            }
        );
        assert_eq!(decode_expecting(&buf, 2).unwrap().title, "Heat");
    }

    #[test]
    fn test_encode_rejects_bad_rating() {
        for rating in [0u8, 6, 255] {
            let err = encode_record(&Record::new("x", rating, "")).unwrap_err();
            assert_eq!(err, EncodeError::RatingOutOfRange { rating });
        }
    }

    #[test]
    fn test_encode_rejects_empty_title() {
        assert_eq!(
            encode_record(&Record::new("", 3, "no title")).unwrap_err(),
            EncodeError::EmptyTitle
        );
    }

    #[test]
    fn test_encode_size_bound() {
        let fits = "d".repeat(MAX_RECORD_LEN - MIN_RECORD_LEN - 1);
        assert!(encode_record(&Record::new("t", 3, fits)).is_ok());

        let over = "d".repeat(MAX_RECORD_LEN - MIN_RECORD_LEN);
        assert_eq!(
            encode_record(&Record::new("t", 3, over)).unwrap_err(),
            EncodeError::RecordTooLarge {
                len: MAX_RECORD_LEN + 1,
                max: MAX_RECORD_LEN
            }
        );
    }

    #[test]
    fn test_decode_batch_skips_failures() {
        let keys: Vec<RecordKey> = (0u8..4).map(|i| RecordKey::derive(&[&[i]])).collect();
        let alien = encode_record(&Record::new("Alien", 5, "")).unwrap();
        let batman = encode_record(&Record::new("Batman", 4, "")).unwrap();
        let other_tag = write_record(&Record::new("Cars", 2, "").with_tag(3));
        let buffers: Vec<Option<&[u8]>> = vec![
            Some(alien.as_slice()),
            Some(&[1u8, 2, 3][..]),
            None,
            Some(batman.as_slice()),
        ];

        let records = decode_batch(keys.iter().zip(buffers), Some(RECORD_TAG));
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Alien", "Batman"]);

        let records = decode_batch(
            keys.iter().zip([Some(other_tag.as_slice())]),
            Some(RECORD_TAG),
        );
        assert!(records.is_empty());

        let records = decode_batch(keys.iter().zip([Some(other_tag.as_slice())]), None);
        assert_eq!(records.len(), 1);
    }
}
