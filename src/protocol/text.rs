//! Types of the memcached text protocol: the three-variant command union,
//! the response set, and the three-class protocol error model.
//!
//! See: https://github.com/memcached/memcached/blob/master/doc/protocol.txt

use std::fmt;

use bytes::{Bytes, BytesMut};

pub const MAX_KEY_LENGTH: usize = 250;
pub const MAX_COMMAND_LENGTH: usize = 300;

/// A key is 1..=250 bytes of `[0-9A-Za-z_]`.
pub fn valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LENGTH
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// The six storage verbs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageVerb {
    Set,
    Add,
    Replace,
    Append,
    Prepend,
    Cas,
}

impl StorageVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageVerb::Set => "set",
            StorageVerb::Add => "add",
            StorageVerb::Replace => "replace",
            StorageVerb::Append => "append",
            StorageVerb::Prepend => "prepend",
            StorageVerb::Cas => "cas",
        }
    }
}

/// The two retrieval verbs. `gets` additionally reports CAS tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetrievalVerb {
    Get,
    Gets,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StorageCommand {
    pub verb: StorageVerb,
    pub key: String,
    pub flags: u16,
    pub exptime: i32,
    pub num_bytes: u32,
    /// Only meaningful for `cas`.
    pub cas_unique: i64,
    pub no_reply: bool,
    pub data: Bytes,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RetrievalCommand {
    pub verb: RetrievalVerb,
    pub keys: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeleteCommand {
    pub key: String,
    pub no_reply: bool,
}

/// Client command.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Storage(StorageCommand),
    Retrieval(RetrievalCommand),
    Delete(DeleteCommand),
}

/// Protocol-level error. Doubles as an error value inside the parser and as
/// a writable response line; the wire form is produced by
/// [`Response::write_to`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// `ERROR\r\n` — the command name is not recognized.
    UnknownCommand,
    /// `CLIENT_ERROR <msg>\r\n` — the client sent a malformed command.
    Client(String),
    /// `SERVER_ERROR <msg>\r\n` — a server-side condition reported in-band.
    Server(String),
}

impl ProtocolError {
    pub(crate) fn invalid_storage_command() -> ProtocolError {
        ProtocolError::Client("storage commands must take exactly 5 or 6 terms".to_string())
    }

    pub(crate) fn invalid_delete_command() -> ProtocolError {
        ProtocolError::Client("delete must take exactly 2 or 3 terms".to_string())
    }

    pub(crate) fn invalid_key() -> ProtocolError {
        ProtocolError::Client("malformed key".to_string())
    }

    pub(crate) fn invalid_flags() -> ProtocolError {
        ProtocolError::Client("malformed flags".to_string())
    }

    pub(crate) fn invalid_exptime() -> ProtocolError {
        ProtocolError::Client("malformed exptime".to_string())
    }

    pub(crate) fn invalid_bytes() -> ProtocolError {
        ProtocolError::Client("malformed bytes".to_string())
    }

    pub(crate) fn invalid_cas_unique() -> ProtocolError {
        ProtocolError::Client("malformed cas_unique".to_string())
    }

    pub(crate) fn no_reply_expected() -> ProtocolError {
        ProtocolError::Client("expected 'noreply' as last term".to_string())
    }

    pub(crate) fn command_line_too_long() -> ProtocolError {
        ProtocolError::Client(format!(
            "command line exceeding {} bytes",
            MAX_COMMAND_LENGTH
        ))
    }

    pub(crate) fn bad_data_chunk() -> ProtocolError {
        ProtocolError::Client("bad data chunk".to_string())
    }

    pub(crate) fn object_too_large() -> ProtocolError {
        ProtocolError::Server("object too large for cache".to_string())
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::UnknownCommand => write!(f, "unknown command"),
            ProtocolError::Client(msg) => write!(f, "client error: {}", msg),
            ProtocolError::Server(msg) => write!(f, "server error: {}", msg),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// One `VALUE` block of a retrieval response.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueEntry {
    pub key: String,
    pub flags: u16,
    pub cas_unique: i64,
    pub data: Bytes,
}

/// Server response.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Stored,
    NotStored,
    Exists,
    NotFound,
    Deleted,
    /// Found values in request order, terminated by `END`. `with_cas` adds
    /// the CAS token term (the `gets` form).
    Values {
        entries: Vec<ValueEntry>,
        with_cas: bool,
    },
    Error(ProtocolError),
}

impl Response {
    pub fn write_to(&self, dst: &mut BytesMut) {
        match self {
            Response::Stored => dst.extend_from_slice(b"STORED\r\n"),
            Response::NotStored => dst.extend_from_slice(b"NOT_STORED\r\n"),
            Response::Exists => dst.extend_from_slice(b"EXISTS\r\n"),
            Response::NotFound => dst.extend_from_slice(b"NOT_FOUND\r\n"),
            Response::Deleted => dst.extend_from_slice(b"DELETED\r\n"),
            Response::Values { entries, with_cas } => {
                for entry in entries {
                    let header = if *with_cas {
                        format!(
                            "VALUE {} {} {} {}\r\n",
                            entry.key,
                            entry.flags,
                            entry.data.len(),
                            entry.cas_unique
                        )
                    } else {
                        format!(
                            "VALUE {} {} {}\r\n",
                            entry.key,
                            entry.flags,
                            entry.data.len()
                        )
                    };
                    dst.extend_from_slice(header.as_bytes());
                    dst.extend_from_slice(&entry.data);
                    dst.extend_from_slice(b"\r\n");
                }
                dst.extend_from_slice(b"END\r\n");
            }
            Response::Error(ProtocolError::UnknownCommand) => dst.extend_from_slice(b"ERROR\r\n"),
            Response::Error(ProtocolError::Client(msg)) => {
                dst.extend_from_slice(format!("CLIENT_ERROR {}\r\n", msg).as_bytes())
            }
            Response::Error(ProtocolError::Server(msg)) => {
                dst.extend_from_slice(format!("SERVER_ERROR {}\r\n", msg).as_bytes())
            }
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::new();
        self.write_to(&mut dst);
        dst.freeze()
    }
}
