//! Client-side session state.
//!
//! AMCP is half-duplex: the server answers commands strictly in order and
//! a reply carries no correlation id. The session therefore keeps at most
//! one command in flight and queues the rest.
//!
//! ```text
//!   enqueue ──► [ queue ] ──► in flight ──complete(frame)──► Dispatch
//!                   ▲                                          │
//!                   └────────── next command released ◄────────┘
//! ```

use std::collections::VecDeque;

use crate::dispatch::{Dispatch, ResponseDispatcher};
use crate::encoder::EncodedCommand;
use crate::error::AmcpError;
use crate::operation::OperationKind;
use crate::response::ResponseFrame;

#[derive(Debug, Default)]
pub struct Session {
    dispatcher: ResponseDispatcher,
    queue: VecDeque<EncodedCommand>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command. Returns it back when it may be written right away.
    pub fn enqueue(&mut self, command: EncodedCommand) -> Result<Option<EncodedCommand>, AmcpError> {
        self.queue.push_back(command);
        if self.dispatcher.is_idle() {
            self.release()
        } else {
            Ok(None)
        }
    }

    /// Hand the reply to the outstanding command to the dispatcher.
    ///
    /// Returns what it decoded together with the next command to write.
    pub fn complete(
        &mut self,
        frame: &ResponseFrame,
    ) -> Result<(Dispatch, Option<EncodedCommand>), AmcpError> {
        let dispatch = self.dispatcher.dispatch(frame)?;
        let next = self.release()?;
        Ok((dispatch, next))
    }

    /// The kind of the command in flight.
    pub fn outstanding(&self) -> Option<OperationKind> {
        self.dispatcher.outstanding()
    }

    /// `true` when nothing is in flight and nothing is queued.
    pub fn is_idle(&self) -> bool {
        self.dispatcher.is_idle() && self.queue.is_empty()
    }

    /// Commands waiting behind the one in flight.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Drop the in-flight command and everything queued.
    pub fn reset(&mut self) {
        self.dispatcher.reset();
        self.queue.clear();
    }

    fn release(&mut self) -> Result<Option<EncodedCommand>, AmcpError> {
        match self.queue.pop_front() {
            Some(command) => {
                self.dispatcher.begin(command.kind())?;
                Ok(Some(command))
            }
            None => Ok(None),
        }
    }
}
