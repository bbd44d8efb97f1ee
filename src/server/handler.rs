use std::sync::Arc;

use crate::cache::engine::{CasOutcome, StorageEngine};
use crate::cache::value::Value;
use crate::protocol::text::{
    Command, DeleteCommand, ProtocolError, Response, RetrievalCommand, RetrievalVerb,
    StorageCommand, StorageVerb, ValueEntry,
};

/// Maps decoded text commands onto storage engine operations and engine
/// outcomes back onto responses. `None` means nothing is written, which is
/// how `noreply` is honored (errors included).
pub struct TextCommandHandler {
    storage: Arc<StorageEngine>,
}

impl TextCommandHandler {
    pub fn new(storage: Arc<StorageEngine>) -> TextCommandHandler {
        TextCommandHandler { storage }
    }

    pub fn handle_command(&self, command: Command) -> Option<Response> {
        match command {
            Command::Storage(command) => self.store(command),
            Command::Retrieval(command) => Some(self.retrieve(command)),
            Command::Delete(command) => self.delete(command),
        }
    }

    fn store(&self, command: StorageCommand) -> Option<Response> {
        let no_reply = command.no_reply;
        let response = match command.verb {
            StorageVerb::Set => {
                let value = Value::new(command.flags, command.data);
                if self.storage.set(&command.key, value) {
                    Response::Stored
                } else {
                    Response::NotStored
                }
            }
            StorageVerb::Cas => {
                let mut value = Value::new(command.flags, command.data);
                value.cas_unique = command.cas_unique;
                match self.storage.cas(&command.key, value) {
                    CasOutcome::Stored => Response::Stored,
                    CasOutcome::Exists => Response::Exists,
                    CasOutcome::NotFound => Response::NotFound,
                }
            }
            verb => Response::Error(ProtocolError::Server(format!(
                "{} not yet implemented",
                verb.as_str()
            ))),
        };
        if no_reply {
            None
        } else {
            Some(response)
        }
    }

    fn retrieve(&self, command: RetrievalCommand) -> Response {
        let with_cas = command.verb == RetrievalVerb::Gets;
        let mut entries = Vec::new();
        // misses are silently omitted; hits keep request order
        for key in command.keys {
            if let Some(value) = self.storage.get(&key) {
                entries.push(ValueEntry {
                    key,
                    flags: value.flags,
                    cas_unique: value.cas_unique,
                    data: value.data,
                });
            }
        }
        Response::Values { entries, with_cas }
    }

    fn delete(&self, command: DeleteCommand) -> Option<Response> {
        let response = if self.storage.delete(&command.key) {
            Response::Deleted
        } else {
            Response::NotFound
        };
        if command.no_reply {
            None
        } else {
            Some(response)
        }
    }
}
