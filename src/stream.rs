//! Read-once response bodies over an output artifact.
//!
//! The output file can be large (PDFs with embedded fonts), so it is
//! streamed in chunks instead of buffered. The stream owns the
//! [`TempArtifact`]: the file is released as soon as the last chunk has
//! been read, or when the stream is dropped early because the client went
//! away. Either way nothing outlives the response.

use crate::error::GatewayError;
use crate::pipeline::artifact::TempArtifact;
use axum::body::Bytes;
use futures::stream::{self, Stream};
use tokio::io::AsyncReadExt;

const CHUNK_SIZE: usize = 64 * 1024;

/// Open the artifact and turn it into a chunked byte stream.
///
/// # Returns
/// The file size (for `Content-Length`) and the stream.
pub async fn read_once(
    artifact: TempArtifact,
) -> Result<
    (
        u64,
        impl Stream<Item = std::io::Result<Bytes>> + Send + 'static,
    ),
    GatewayError,
> {
    let file = tokio::fs::File::open(artifact.path())
        .await
        .map_err(|e| GatewayError::io("opening converted file", e))?;
    let len = file
        .metadata()
        .await
        .map_err(|e| GatewayError::io("reading converted file size", e))?
        .len();

    let body = stream::unfold(Some((file, artifact)), |state| async move {
        let (mut file, artifact) = match state {
            Some(open) => open,
            None => return None,
        };
        let mut buf = vec![0u8; CHUNK_SIZE];
        match file.read(&mut buf).await {
            Ok(0) => {
                drop(file);
                artifact.release();
                None
            }
            Ok(n) => {
                buf.truncate(n);
                Some((Ok(Bytes::from(buf)), Some((file, artifact))))
            }
            Err(e) => {
                drop(file);
                artifact.release();
                Some((Err(e), None))
            }
        }
    });

    Ok((len, body))
}
