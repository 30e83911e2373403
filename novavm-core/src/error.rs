// This file is part of novavm.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

//! Controller error taxonomies. VGC errors are never signalled (bad
//! commands are dropped silently); DMA, FIO and NIC each surface theirs
//! through a dedicated error-code register, backed by these enums.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaError {
    #[error("unknown DMA/blitter command")]
    BadCommand,
    #[error("unknown space id")]
    BadSpace,
    #[error("address or length out of range")]
    Range,
    #[error("invalid argument combination")]
    BadArgs,
    #[error("destination space is write-protected")]
    WriteProt,
}

impl DmaError {
    /// Register-bank encoding.
    pub fn code(self) -> u8 {
        match self {
            DmaError::BadCommand => 1,
            DmaError::BadSpace => 2,
            DmaError::Range => 3,
            DmaError::BadArgs => 4,
            DmaError::WriteProt => 5,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FioError {
    #[error("file not found")]
    NotFound,
    #[error("host i/o error")]
    Io,
}

impl FioError {
    pub fn code(self) -> u8 {
        match self {
            FioError::NotFound => 1,
            FioError::Io => 2,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NicError {
    #[error("socket or protocol error")]
    Network,
    #[error("remote peer closed the connection")]
    RemoteClosed,
    #[error("receive queue overflowed")]
    QueueOverflow,
    #[error("connect attempt timed out")]
    Timeout,
}

impl NicError {
    pub fn code(self) -> u8 {
        match self {
            NicError::Network => 1,
            NicError::RemoteClosed => 2,
            NicError::QueueOverflow => 3,
            NicError::Timeout => 4,
        }
    }
}
