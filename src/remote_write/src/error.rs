// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use thiserror::Error;

use crate::decompress::Encoding;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(#[from] InnerError);

impl From<anyhow::Error> for Error {
    fn from(source: anyhow::Error) -> Self {
        Self(InnerError::Other { source })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorKind {
    UnsupportedEncoding,
    Decompression,
    MalformedMessage,
    UnsupportedWireType,
    Forward,
    Internal,
}

impl ErrorKind {
    /// Whether the failure was caused by the request itself rather than by
    /// this process or its downstream.
    pub fn is_client_error(&self) -> bool {
        match self {
            ErrorKind::UnsupportedEncoding
            | ErrorKind::Decompression
            | ErrorKind::MalformedMessage
            | ErrorKind::UnsupportedWireType => true,
            ErrorKind::Forward | ErrorKind::Internal => false,
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self.0 {
            InnerError::UnsupportedEncoding { .. } => ErrorKind::UnsupportedEncoding,
            InnerError::Decompression { .. } | InnerError::DecompressedTooLarge { .. } => {
                ErrorKind::Decompression
            }
            InnerError::MalformedMessage { .. } => ErrorKind::MalformedMessage,
            InnerError::UnsupportedWireType { .. } => ErrorKind::UnsupportedWireType,
            InnerError::Forward { .. } => ErrorKind::Forward,
            InnerError::Config { .. } | InnerError::Other { .. } => ErrorKind::Internal,
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self(InnerError::MalformedMessage { msg: msg.into() })
    }

    pub(crate) fn unsupported_wire_type(wire_type: u8) -> Self {
        Self(InnerError::UnsupportedWireType { wire_type })
    }
}

#[derive(Error, Debug)]
pub(crate) enum InnerError {
    #[error("unsupported encoding:{encoding:?}, expected snappy or zstd")]
    UnsupportedEncoding { encoding: String },

    #[error("failed to decompress {encoding} payload, err:{source}")]
    Decompression {
        encoding: Encoding,
        source: anyhow::Error,
    },

    #[error("decompressed {encoding} payload is too large, max:{max}, current:{current}")]
    DecompressedTooLarge {
        encoding: Encoding,
        current: u64,
        max: u64,
    },

    #[error("malformed remote write message, {msg}")]
    MalformedMessage { msg: String },

    #[error("unsupported wire type:{wire_type}")]
    UnsupportedWireType { wire_type: u8 },

    #[error("failed to forward series, err:{source}")]
    Forward { source: anyhow::Error },

    #[error("invalid config, err:{source}")]
    Config { source: anyhow::Error },

    #[error(transparent)]
    Other {
        #[from]
        source: anyhow::Error,
    },
}
