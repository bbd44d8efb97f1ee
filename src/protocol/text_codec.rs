//! Incremental framing for the text protocol, on top of
//! [`tokio_util::codec`].
//!
//! The decoder tolerates arbitrary TCP segmentation: any number of bytes may
//! arrive per read, including a split between `\r` and `\n`, and partial
//! input simply yields no frame. Malformed input surfaces as an in-band
//! [`TextFrame::Error`] rather than a stream error, so the connection stays
//! usable after a `CLIENT_ERROR`; only transport failures are `io::Error`.

use std::io;

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::protocol::text::{
    valid_key, Command, DeleteCommand, ProtocolError, Response, RetrievalCommand, RetrievalVerb,
    StorageCommand, StorageVerb, MAX_COMMAND_LENGTH,
};

/// One decoded unit: either a complete command or a protocol error to be
/// reported to the client.
#[derive(Clone, Debug, PartialEq)]
pub enum TextFrame {
    Command(Command),
    Error(ProtocolError),
}

#[derive(Debug, PartialEq)]
enum ParserState {
    /// Accumulating a command line up to CRLF.
    Header,
    /// A storage header is parsed; reading `num_bytes` + CRLF of payload.
    DataBlock,
}

pub struct MemcacheTextCodec {
    state: ParserState,
    pending: Option<StorageCommand>,
    /// Set when the pending data block must be consumed and dropped, with
    /// this error reported in its place.
    discard: Option<ProtocolError>,
    /// Maximum accepted `num_bytes` per value; 0 means unlimited.
    item_size_limit: u32,
}

impl MemcacheTextCodec {
    pub fn new(item_size_limit: u32) -> MemcacheTextCodec {
        MemcacheTextCodec {
            state: ParserState::Header,
            pending: None,
            discard: None,
            item_size_limit,
        }
    }

    /// Parses one command line (CRLF already stripped). `Ok(None)` means a
    /// storage header was accepted and the codec now expects its data block.
    fn parse_header(&mut self, line: &[u8]) -> Result<Option<Command>, ProtocolError> {
        let line = match std::str::from_utf8(line) {
            Ok(line) => line.trim(),
            Err(_) => return Err(ProtocolError::UnknownCommand),
        };
        let terms: Vec<&str> = line.split(' ').collect();

        match terms[0] {
            "set" => self.unpack_storage(StorageVerb::Set, &terms).map(|_| None),
            "add" => self.unpack_storage(StorageVerb::Add, &terms).map(|_| None),
            "replace" => self
                .unpack_storage(StorageVerb::Replace, &terms)
                .map(|_| None),
            "append" => self
                .unpack_storage(StorageVerb::Append, &terms)
                .map(|_| None),
            "prepend" => self
                .unpack_storage(StorageVerb::Prepend, &terms)
                .map(|_| None),
            "cas" => self.unpack_storage(StorageVerb::Cas, &terms).map(|_| None),
            "get" => unpack_retrieval(RetrievalVerb::Get, &terms).map(Some),
            "gets" => unpack_retrieval(RetrievalVerb::Gets, &terms).map(Some),
            "delete" => unpack_delete(&terms).map(Some),
            _ => Err(ProtocolError::UnknownCommand),
        }
    }

    fn unpack_storage(&mut self, verb: StorageVerb, terms: &[&str]) -> Result<(), ProtocolError> {
        // `cas` carries one extra term, the expected token.
        let (min_terms, max_terms) = match verb {
            StorageVerb::Cas => (6, 7),
            _ => (5, 6),
        };
        if terms.len() < min_terms || terms.len() > max_terms {
            return Err(ProtocolError::invalid_storage_command());
        }

        let key = terms[1];
        if !valid_key(key) {
            return Err(ProtocolError::invalid_key());
        }
        let flags = terms[2]
            .parse::<u16>()
            .map_err(|_| ProtocolError::invalid_flags())?;
        let exptime = terms[3]
            .parse::<i32>()
            .map_err(|_| ProtocolError::invalid_exptime())?;
        let num_bytes = terms[4]
            .parse::<u32>()
            .map_err(|_| ProtocolError::invalid_bytes())?;
        let cas_unique = match verb {
            StorageVerb::Cas => terms[5]
                .parse::<i64>()
                .map_err(|_| ProtocolError::invalid_cas_unique())?,
            _ => 0,
        };
        let mut no_reply = false;
        if terms.len() == max_terms {
            if terms[terms.len() - 1] == "noreply" {
                no_reply = true;
            } else {
                return Err(ProtocolError::no_reply_expected());
            }
        }

        if self.item_size_limit > 0 && num_bytes > self.item_size_limit {
            // The announced block still has to be consumed to keep the
            // stream synchronized; it is dropped once read.
            self.discard = Some(ProtocolError::object_too_large());
        }
        self.pending = Some(StorageCommand {
            verb,
            key: key.to_string(),
            flags,
            exptime,
            num_bytes,
            cas_unique,
            no_reply,
            data: Bytes::new(),
        });
        self.state = ParserState::DataBlock;
        Ok(())
    }
}

fn unpack_retrieval(verb: RetrievalVerb, terms: &[&str]) -> Result<Command, ProtocolError> {
    let mut keys = Vec::with_capacity(terms.len() - 1);
    for key in &terms[1..] {
        if !valid_key(key) {
            return Err(ProtocolError::invalid_key());
        }
        keys.push(key.to_string());
    }
    Ok(Command::Retrieval(RetrievalCommand { verb, keys }))
}

fn unpack_delete(terms: &[&str]) -> Result<Command, ProtocolError> {
    if terms.len() < 2 || terms.len() > 3 {
        return Err(ProtocolError::invalid_delete_command());
    }
    let key = terms[1];
    if !valid_key(key) {
        return Err(ProtocolError::invalid_key());
    }
    let mut no_reply = false;
    if terms.len() == 3 {
        if terms[2] == "noreply" {
            no_reply = true;
        } else {
            return Err(ProtocolError::no_reply_expected());
        }
    }
    Ok(Command::Delete(DeleteCommand {
        key: key.to_string(),
        no_reply,
    }))
}

fn find_crlf(src: &[u8]) -> Option<usize> {
    src.windows(2).position(|w| w == b"\r\n")
}

impl Decoder for MemcacheTextCodec {
    type Item = TextFrame;
    type Error = io::Error;

    /// EOF on a command boundary ends the stream cleanly; EOF with half a
    /// command buffered (or a consumed header still waiting on its data
    /// block) is a transport error.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<TextFrame>, io::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                if src.is_empty() && self.state == ParserState::Header {
                    Ok(None)
                } else {
                    Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed in the middle of a command",
                    ))
                }
            }
        }
    }

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<TextFrame>, io::Error> {
        loop {
            match self.state {
                ParserState::Header => {
                    let pos = match find_crlf(src) {
                        Some(pos) => pos,
                        None => {
                            if src.len() > MAX_COMMAND_LENGTH {
                                src.clear();
                                return Ok(Some(TextFrame::Error(
                                    ProtocolError::command_line_too_long(),
                                )));
                            }
                            return Ok(None);
                        }
                    };
                    let line = src.split_to(pos + 2);
                    if pos > MAX_COMMAND_LENGTH {
                        return Ok(Some(TextFrame::Error(
                            ProtocolError::command_line_too_long(),
                        )));
                    }
                    match self.parse_header(&line[..pos]) {
                        Ok(Some(command)) => return Ok(Some(TextFrame::Command(command))),
                        Ok(None) => continue,
                        Err(err) => return Ok(Some(TextFrame::Error(err))),
                    }
                }
                ParserState::DataBlock => {
                    let num_bytes = self
                        .pending
                        .as_ref()
                        .map(|command| command.num_bytes as usize)
                        .expect("data block state without a pending storage command");
                    let needed = num_bytes + 2;
                    if src.len() < needed {
                        src.reserve(needed - src.len());
                        return Ok(None);
                    }

                    let mut block = src.split_to(needed);
                    let trailer = block.split_off(num_bytes);
                    self.state = ParserState::Header;
                    let mut command = self
                        .pending
                        .take()
                        .expect("data block state without a pending storage command");

                    // noreply suppresses even the error line; the dropped
                    // command leaves the loop in header state for whatever
                    // is buffered next.
                    if let Some(err) = self.discard.take() {
                        if command.no_reply {
                            continue;
                        }
                        return Ok(Some(TextFrame::Error(err)));
                    }
                    if &trailer[..] != b"\r\n" {
                        if command.no_reply {
                            continue;
                        }
                        return Ok(Some(TextFrame::Error(ProtocolError::bad_data_chunk())));
                    }
                    command.data = block.freeze();
                    return Ok(Some(TextFrame::Command(Command::Storage(command))));
                }
            }
        }
    }
}

impl Encoder<Response> for MemcacheTextCodec {
    type Error = io::Error;

    fn encode(&mut self, response: Response, dst: &mut BytesMut) -> Result<(), io::Error> {
        response.write_to(dst);
        Ok(())
    }
}
