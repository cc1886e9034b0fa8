//! Raw log to [`EventPayload`] decoding.
//!
//! Indexed parameters arrive as 32-byte topic words; non-indexed ones
//! are packed into the `data` blob in 32-byte words. Each kind knows
//! which slots carry which fields.

use crate::events::descriptor::EventDescriptor;
use crate::events::types::{EventKind, EventPayload, RawLog};
use crate::utils::hex::{be_bytes_to_decimal, parse_hex_bytes, word_to_address, HexError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("log topic0 {actual} does not match descriptor topic {expected}")]
    TopicMismatch { expected: String, actual: String },

    #[error("{kind} log is missing topic {index}")]
    MissingTopic { kind: EventKind, index: usize },

    #[error("{kind} log data holds {actual} words, expected at least {expected}")]
    ShortData {
        kind: EventKind,
        expected: usize,
        actual: usize,
    },

    #[error("malformed hex field: {0}")]
    Hex(#[from] HexError),
}

/// Decodes `log` according to `descriptor`.
///
/// # Errors
///
/// Returns [`DecodeError`] when the log does not carry the topics or
/// data words the event signature promises. Decode failures are
/// expected from misbehaving contracts sharing a topic hash and must
/// not abort the surrounding batch.
pub fn decode(descriptor: &EventDescriptor, log: &RawLog) -> Result<EventPayload, DecodeError> {
    let topic0 = log
        .topics
        .first()
        .ok_or(DecodeError::MissingTopic {
            kind: descriptor.kind,
            index: 0,
        })?;
    if !topic0.eq_ignore_ascii_case(descriptor.topic0) {
        return Err(DecodeError::TopicMismatch {
            expected: descriptor.topic0.to_string(),
            actual: topic0.clone(),
        });
    }

    let kind = descriptor.kind;
    let mut payload = EventPayload::default();
    match kind {
        EventKind::HeroTransferred => {
            payload.from = Some(topic_address(log, 1, kind)?);
            payload.to = Some(topic_address(log, 2, kind)?);
            payload.token_id = Some(topic_decimal(log, 3, kind)?);
        }
        EventKind::HeroMinted => {
            payload.owner = Some(topic_address(log, 1, kind)?);
            payload.token_id = Some(topic_decimal(log, 2, kind)?);
        }
        EventKind::HeroEvolved => {
            payload.token_id = Some(topic_decimal(log, 1, kind)?);
            let data = data_words(log, 1, kind)?;
            payload.stage = Some(word_low_byte(&data[0]));
        }
        EventKind::HeroStaked | EventKind::HeroUnstaked => {
            payload.owner = Some(topic_address(log, 1, kind)?);
            payload.token_id = Some(topic_decimal(log, 2, kind)?);
        }
        EventKind::ListingCreated => {
            payload.token_id = Some(topic_decimal(log, 1, kind)?);
            payload.from = Some(topic_address(log, 2, kind)?);
            let data = data_words(log, 1, kind)?;
            payload.price = Some(be_bytes_to_decimal(&data[0]));
        }
        EventKind::ListingSold => {
            payload.token_id = Some(topic_decimal(log, 1, kind)?);
            payload.from = Some(topic_address(log, 2, kind)?);
            payload.to = Some(topic_address(log, 3, kind)?);
            let data = data_words(log, 1, kind)?;
            payload.price = Some(be_bytes_to_decimal(&data[0]));
        }
        EventKind::ListingCancelled => {
            payload.token_id = Some(topic_decimal(log, 1, kind)?);
            payload.from = Some(topic_address(log, 2, kind)?);
        }
        EventKind::EssenceTransferred => {
            payload.from = Some(topic_address(log, 1, kind)?);
            payload.to = Some(topic_address(log, 2, kind)?);
            let data = data_words(log, 1, kind)?;
            payload.amount = Some(be_bytes_to_decimal(&data[0]));
        }
        EventKind::EssenceMinted | EventKind::EssenceBurned => {
            payload.owner = Some(topic_address(log, 1, kind)?);
            let data = data_words(log, 1, kind)?;
            payload.amount = Some(be_bytes_to_decimal(&data[0]));
        }
        EventKind::ActivityCreated => {
            payload.owner = Some(topic_address(log, 1, kind)?);
            let data = data_words(log, 2, kind)?;
            payload.activity_kind = Some(word_low_byte(&data[0]));
            payload.amount = Some(be_bytes_to_decimal(&data[1]));
        }
    }
    Ok(payload)
}

fn topic_word(log: &RawLog, index: usize, kind: EventKind) -> Result<Vec<u8>, DecodeError> {
    let topic = log
        .topics
        .get(index)
        .ok_or(DecodeError::MissingTopic { kind, index })?;
    let bytes = parse_hex_bytes(topic)?;
    if bytes.len() != 32 {
        return Err(DecodeError::Hex(HexError::Length {
            expected: 32,
            actual: bytes.len(),
        }));
    }
    Ok(bytes)
}

fn topic_address(log: &RawLog, index: usize, kind: EventKind) -> Result<String, DecodeError> {
    Ok(word_to_address(&topic_word(log, index, kind)?)?)
}

fn topic_decimal(log: &RawLog, index: usize, kind: EventKind) -> Result<String, DecodeError> {
    Ok(be_bytes_to_decimal(&topic_word(log, index, kind)?))
}

fn data_words(
    log: &RawLog,
    expected: usize,
    kind: EventKind,
) -> Result<Vec<[u8; 32]>, DecodeError> {
    let bytes = parse_hex_bytes(&log.data)?;
    let words: Vec<[u8; 32]> = bytes
        .chunks_exact(32)
        .map(|chunk| {
            let mut word = [0u8; 32];
            word.copy_from_slice(chunk);
            word
        })
        .collect();
    if words.len() < expected {
        return Err(DecodeError::ShortData {
            kind,
            expected,
            actual: words.len(),
        });
    }
    Ok(words)
}

fn word_low_byte(word: &[u8; 32]) -> u8 {
    word[31]
}
