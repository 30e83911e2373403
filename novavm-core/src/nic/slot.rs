// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! One NIC connection slot: state machine, reader thread and bounded
//! receive queue, following the same "background producer, synchronous
//! consumer" shape as a pull-mode audio callback, but over a socket
//! instead of a DSP.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::NicError;

pub const QUEUE_DEPTH: usize = 16;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SlotState {
    Idle,
    Listening,
    Connecting,
    Connected,
    RemoteClosed,
    Error,
}

struct SharedQueue {
    messages: Mutex<VecDeque<Vec<u8>>>,
    overflowed: AtomicBool,
}

impl SharedQueue {
    fn new() -> Self {
        Self {
            messages: Mutex::new(VecDeque::new()),
            overflowed: AtomicBool::new(false),
        }
    }

    fn push(&self, msg: Vec<u8>) {
        let mut q = self.messages.lock().unwrap();
        if q.len() >= QUEUE_DEPTH {
            q.pop_front();
            self.overflowed.store(true, Ordering::SeqCst);
        }
        q.push_back(msg);
    }

    fn pop(&self) -> Option<Vec<u8>> {
        self.messages.lock().unwrap().pop_front()
    }

    fn is_empty(&self) -> bool {
        self.messages.lock().unwrap().is_empty()
    }
}

pub struct NicSlot {
    pub state: SlotState,
    pub error: Option<NicError>,
    stream: Option<TcpStream>,
    pending_accept: Option<Arc<Mutex<Option<TcpStream>>>>,
    queue: Arc<SharedQueue>,
    stop: Arc<AtomicBool>,
    remote_closed: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl NicSlot {
    pub fn new() -> Self {
        Self {
            state: SlotState::Idle,
            error: None,
            stream: None,
            pending_accept: None,
            queue: Arc::new(SharedQueue::new()),
            stop: Arc::new(AtomicBool::new(false)),
            remote_closed: Arc::new(AtomicBool::new(false)),
            reader: None,
        }
    }

    /// Reconciles `state` with what the reader thread observed since the
    /// last check: a clean EOF on a connected stream becomes `RemoteClosed`.
    pub fn sync_state(&mut self) {
        if self.state == SlotState::Connected && self.remote_closed.load(Ordering::SeqCst) {
            self.state = SlotState::RemoteClosed;
        }
    }

    pub fn disconnect(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
        *self = Self::new();
    }

    pub fn connect(&mut self, host: &str, port: u16) {
        self.disconnect();
        self.state = SlotState::Connecting;
        let addr = format!("{}:{}", host, port);
        let resolved = addr.to_socket_addrs().ok().and_then(|mut it| it.next());
        match resolved {
            Some(sock_addr) => match TcpStream::connect_timeout(&sock_addr, CONNECT_TIMEOUT) {
                Ok(stream) => {
                    if self.adopt_stream(stream).is_err() {
                        self.state = SlotState::Error;
                        self.error = Some(NicError::Network);
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    self.state = SlotState::Error;
                    self.error = Some(NicError::Timeout);
                }
                Err(_) => {
                    self.state = SlotState::Error;
                    self.error = Some(NicError::Network);
                }
            },
            None => {
                self.state = SlotState::Error;
                self.error = Some(NicError::Network);
            }
        }
    }

    pub fn listen(&mut self, port: u16) {
        self.disconnect();
        match TcpListener::bind(("0.0.0.0", port)) {
            Ok(listener) => {
                self.state = SlotState::Listening;
                let stop = self.stop.clone();
                // One-shot accept task; the accepted stream is handed to
                // `accept()` on the CPU thread.
                let accepted: Arc<Mutex<Option<TcpStream>>> = Arc::new(Mutex::new(None));
                let accepted_slot = accepted.clone();
                thread::spawn(move || {
                    if let Ok((stream, _)) = listener.accept() {
                        if !stop.load(Ordering::SeqCst) {
                            *accepted_slot.lock().unwrap() = Some(stream);
                        }
                    }
                });
                self.pending_accept = Some(accepted);
            }
            Err(_) => {
                self.state = SlotState::Error;
                self.error = Some(NicError::Network);
            }
        }
    }

    pub fn accept(&mut self) {
        if let Some(pending) = self.pending_accept.take() {
            if let Some(stream) = pending.lock().unwrap().take() {
                if self.adopt_stream(stream).is_err() {
                    self.state = SlotState::Error;
                    self.error = Some(NicError::Network);
                }
            }
        }
    }

    fn adopt_stream(&mut self, stream: TcpStream) -> Result<(), NicError> {
        let reader_stream = stream.try_clone().map_err(|_| NicError::Network)?;
        self.stream = Some(stream);
        self.state = SlotState::Connected;
        self.error = None;
        self.stop = Arc::new(AtomicBool::new(false));
        self.remote_closed = Arc::new(AtomicBool::new(false));
        let stop = self.stop.clone();
        let queue = self.queue.clone();
        let remote_closed = self.remote_closed.clone();
        self.reader = Some(spawn_reader(reader_stream, queue, stop, remote_closed));
        Ok(())
    }

    pub fn send(&mut self, payload: &[u8]) -> Result<(), NicError> {
        let stream = self.stream.as_mut().ok_or(NicError::Network)?;
        let len = if payload.len() >= 256 { 0u8 } else { payload.len() as u8 };
        stream.write_all(&[len]).map_err(|_| NicError::Network)?;
        stream.write_all(payload).map_err(|_| NicError::Network)?;
        Ok(())
    }

    pub fn receive(&mut self) -> Option<Vec<u8>> {
        self.queue.pop()
    }

    pub fn data_ready(&self) -> bool {
        if !self.queue.is_empty() {
            return true;
        }
        self.pending_accept
            .as_ref()
            .map(|pending| pending.lock().unwrap().is_some())
            .unwrap_or(false)
    }

    pub fn queue_overflowed(&self) -> bool {
        self.queue.overflowed.swap(false, Ordering::SeqCst)
    }
}

impl Default for NicSlot {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_reader(
    mut stream: TcpStream,
    queue: Arc<SharedQueue>,
    stop: Arc<AtomicBool>,
    remote_closed: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut len_byte = [0u8; 1];
        while !stop.load(Ordering::SeqCst) {
            match stream.read_exact(&mut len_byte) {
                Ok(()) => {
                    let len = if len_byte[0] == 0 { 256 } else { len_byte[0] as usize };
                    let mut buf = vec![0u8; len];
                    if stream.read_exact(&mut buf).is_err() {
                        remote_closed.store(true, Ordering::SeqCst);
                        break;
                    }
                    queue.push(buf);
                }
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                    remote_closed.store(true, Ordering::SeqCst);
                    break;
                }
                Err(_) => break,
            }
        }
    })
}
