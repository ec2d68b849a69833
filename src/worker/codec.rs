// src/worker/codec.rs

//! Length-delimited framing with bincode payloads.

use std::io;
use std::marker::PhantomData;

use bytes::{Bytes, BytesMut};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use crate::worker::protocol::{WorkerRequest, WorkerResponse};

/// Frames `Out` messages on the way out and decodes `In` messages on the
/// way in.
#[derive(Debug)]
pub struct WireCodec<Out, In> {
    frames: LengthDelimitedCodec,
    _marker: PhantomData<fn(Out) -> In>,
}

/// Codec for the coordinator side of a connection.
pub type ClientCodec = WireCodec<WorkerRequest, WorkerResponse>;
/// Codec for the worker side of a connection.
pub type ServerCodec = WireCodec<WorkerResponse, WorkerRequest>;

impl<Out, In> WireCodec<Out, In> {
    pub fn new() -> Self {
        Self {
            frames: LengthDelimitedCodec::new(),
            _marker: PhantomData,
        }
    }
}

impl<Out, In> Default for WireCodec<Out, In> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Out: Serialize, In> Encoder<Out> for WireCodec<Out, In> {
    type Error = io::Error;

    fn encode(&mut self, item: Out, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let bytes = bincode::serialize(&item).map_err(io::Error::other)?;
        self.frames.encode(Bytes::from(bytes), dst)
    }
}

impl<Out, In: DeserializeOwned> Decoder for WireCodec<Out, In> {
    type Item = In;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.frames.decode(src)? {
            Some(frame) => {
                let item = bincode::deserialize(&frame).map_err(io::Error::other)?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_request_reaches_server_intact() {
        let mut client = ClientCodec::new();
        let mut server = ServerCodec::new();
        let mut buf = BytesMut::new();

        let request = WorkerRequest::Execute {
            command: "wc -w < part1.txt > count1.txt".into(),
            workdir: Some("/srv/share".into()),
        };
        client.encode(request.clone(), &mut buf).unwrap();

        assert_eq!(server.decode(&mut buf).unwrap(), Some(request));
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_frame_waits_for_more_bytes() {
        let mut server = ServerCodec::new();
        let mut client = ClientCodec::new();
        let mut full = BytesMut::new();
        server
            .encode(
                WorkerResponse::Completed {
                    exit_code: 3,
                    stderr_tail: "no such file".into(),
                },
                &mut full,
            )
            .unwrap();

        let mut partial = full.split_to(full.len() - 2);
        assert_eq!(client.decode(&mut partial).unwrap(), None);

        partial.unsplit(full);
        assert!(matches!(
            client.decode(&mut partial).unwrap(),
            Some(WorkerResponse::Completed { exit_code: 3, .. })
        ));
    }

    #[test]
    fn garbage_payload_is_an_error() {
        let mut frames = LengthDelimitedCodec::new();
        let mut buf = BytesMut::new();
        frames.encode(Bytes::from_static(&[0xff; 3]), &mut buf).unwrap();

        let mut client = ClientCodec::new();
        assert!(client.decode(&mut buf).is_err());
    }
}
