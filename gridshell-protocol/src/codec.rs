//! Message codec for IPC framing

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::messages::{ClientRequest, HostEvent};

/// Maximum message size (16 MB)
const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Protocol codec error
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Codec for ClientRequest (encoding) and HostEvent (decoding)
/// Used by the client side
#[derive(Debug, Default)]
pub struct ClientCodec;

impl ClientCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for ClientCodec {
    type Item = HostEvent;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        decode_message(src)
    }
}

impl Encoder<ClientRequest> for ClientCodec {
    type Error = CodecError;

    fn encode(&mut self, item: ClientRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_message(&item, dst)
    }
}

/// Codec for HostEvent (encoding) and ClientRequest (decoding)
/// Used by the host side
#[derive(Debug, Default)]
pub struct HostCodec;

impl HostCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for HostCodec {
    type Item = ClientRequest;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        decode_message(src)
    }
}

impl Encoder<HostEvent> for HostCodec {
    type Error = CodecError;

    fn encode(&mut self, item: HostEvent, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_message(&item, dst)
    }
}

/// Decode a length-prefixed message
fn decode_message<T: serde::de::DeserializeOwned>(
    src: &mut BytesMut,
) -> Result<Option<T>, CodecError> {
    // Need at least 4 bytes for length prefix
    if src.len() < 4 {
        return Ok(None);
    }

    // Peek at length without consuming
    let len = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;

    if len > MAX_MESSAGE_SIZE {
        return Err(CodecError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    // Check if we have the full message
    if src.len() < 4 + len {
        src.reserve(4 + len - src.len());
        return Ok(None);
    }

    src.advance(4);
    let data = src.split_to(len);

    let msg: T = bincode::deserialize(&data)?;
    Ok(Some(msg))
}

/// Encode a length-prefixed message
fn encode_message<T: serde::Serialize>(item: &T, dst: &mut BytesMut) -> Result<(), CodecError> {
    let data = bincode::serialize(item)?;

    if data.len() > MAX_MESSAGE_SIZE {
        return Err(CodecError::MessageTooLarge {
            size: data.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    dst.reserve(4 + data.len());
    dst.put_u32(data.len() as u32);
    dst.put_slice(&data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CreateError, SessionId, SessionInfo};

    #[test]
    fn test_request_roundtrip() {
        let mut client_codec = ClientCodec::new();
        let mut host_codec = HostCodec::new();

        let msg = ClientRequest::Create {
            cwd: Some("/home/user".into()),
        };

        let mut buf = BytesMut::new();
        client_codec.encode(msg.clone(), &mut buf).unwrap();

        let decoded = host_codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_event_roundtrip() {
        let mut client_codec = ClientCodec::new();
        let mut host_codec = HostCodec::new();

        let msg = HostEvent::Output {
            id: SessionId::generate(),
            data: b"hello\r\n".to_vec(),
        };

        let mut buf = BytesMut::new();
        host_codec.encode(msg.clone(), &mut buf).unwrap();

        let decoded = client_codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_partial_message() {
        let mut client_codec = ClientCodec::new();
        let mut host_codec = HostCodec::new();

        let msg = ClientRequest::Shutdown;

        let mut buf = BytesMut::new();
        client_codec.encode(msg, &mut buf).unwrap();

        // Split buffer to simulate partial read
        let mut partial = buf.split_to(2);

        // Should return None for partial message
        assert!(host_codec.decode(&mut partial).unwrap().is_none());

        // Add rest of message
        partial.unsplit(buf);

        assert!(host_codec.decode(&mut partial).unwrap().is_some());
    }

    #[test]
    fn test_message_too_large_on_decode() {
        let mut codec = HostCodec::new();
        let mut buf = BytesMut::new();

        let huge_size: u32 = (MAX_MESSAGE_SIZE + 1) as u32;
        buf.put_u32(huge_size);

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(CodecError::MessageTooLarge { .. })));
    }

    #[test]
    fn test_all_request_variants() {
        let mut client_codec = ClientCodec::new();
        let mut host_codec = HostCodec::new();

        let id = SessionId::generate();
        let messages = vec![
            ClientRequest::Create { cwd: None },
            ClientRequest::Create {
                cwd: Some("/tmp".into()),
            },
            ClientRequest::Write {
                id,
                data: vec![0x1b, 0x5b, 0x41], // Up arrow
            },
            ClientRequest::Resize {
                id,
                cols: 120,
                rows: 40,
            },
            ClientRequest::Destroy { id },
            ClientRequest::Shutdown,
        ];

        for msg in messages {
            let mut buf = BytesMut::new();
            client_codec.encode(msg.clone(), &mut buf).unwrap();
            let decoded = host_codec.decode(&mut buf).unwrap().unwrap();
            assert_eq!(msg, decoded);
        }
    }

    #[test]
    fn test_all_event_variants() {
        let mut client_codec = ClientCodec::new();
        let mut host_codec = HostCodec::new();

        let id = SessionId::generate();
        let messages = vec![
            HostEvent::Created {
                session: SessionInfo {
                    id,
                    serial: 1,
                    cwd: Some("/home/user".into()),
                    cols: 80,
                    rows: 24,
                },
            },
            HostEvent::CreateFailed {
                error: CreateError::CapacityExceeded { max: 9 },
            },
            HostEvent::CreateFailed {
                error: CreateError::SpawnFailed {
                    message: "no such shell".into(),
                },
            },
            HostEvent::Output {
                id,
                data: b"$ ".to_vec(),
            },
            HostEvent::Ended { id, exit_code: 0 },
        ];

        for msg in messages {
            let mut buf = BytesMut::new();
            host_codec.encode(msg.clone(), &mut buf).unwrap();
            let decoded = client_codec.decode(&mut buf).unwrap().unwrap();
            assert_eq!(msg, decoded);
        }
    }

    #[test]
    fn test_multiple_messages_in_buffer() {
        let mut client_codec = ClientCodec::new();
        let mut host_codec = HostCodec::new();

        let id = SessionId::generate();
        let msg1 = ClientRequest::Create { cwd: None };
        let msg2 = ClientRequest::Resize {
            id,
            cols: 80,
            rows: 24,
        };
        let msg3 = ClientRequest::Shutdown;

        let mut buf = BytesMut::new();
        client_codec.encode(msg1.clone(), &mut buf).unwrap();
        client_codec.encode(msg2.clone(), &mut buf).unwrap();
        client_codec.encode(msg3.clone(), &mut buf).unwrap();

        assert_eq!(host_codec.decode(&mut buf).unwrap().unwrap(), msg1);
        assert_eq!(host_codec.decode(&mut buf).unwrap().unwrap(), msg2);
        assert_eq!(host_codec.decode(&mut buf).unwrap().unwrap(), msg3);

        // Buffer should be empty now
        assert!(host_codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_output_order_preserved_in_buffer() {
        // Framing must not reorder consecutive output chunks from the
        // same session.
        let mut client_codec = ClientCodec::new();
        let mut host_codec = HostCodec::new();

        let id = SessionId::generate();
        let mut buf = BytesMut::new();
        for chunk in [b"A".to_vec(), b"B".to_vec(), b"C".to_vec()] {
            host_codec
                .encode(HostEvent::Output { id, data: chunk }, &mut buf)
                .unwrap();
        }

        let mut seen = Vec::new();
        while let Some(HostEvent::Output { data, .. }) = client_codec.decode(&mut buf).unwrap() {
            seen.extend_from_slice(&data);
        }
        assert_eq!(seen, b"ABC");
    }
}
