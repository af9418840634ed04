use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

/// Pull cursor over the chunks of a streaming tool call.
#[async_trait]
pub trait StreamResult: Send {
    /// Pull the next chunk. Returns Ok(None) once the stream is exhausted.
    async fn next(&mut self) -> Result<Option<Value>>;
    /// Close the stream and release any underlying resources.
    async fn close(&mut self) -> Result<()>;
}

/// StreamResult backed by a channel of `Result<Value>`.
pub struct ChannelStreamResult {
    rx: mpsc::Receiver<Result<Value>>,
}

impl ChannelStreamResult {
    pub fn new(rx: mpsc::Receiver<Result<Value>>) -> Self {
        Self { rx }
    }
}

#[async_trait]
impl StreamResult for ChannelStreamResult {
    async fn next(&mut self) -> Result<Option<Value>> {
        match self.rx.recv().await {
            Some(Ok(v)) => Ok(Some(v)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.rx.close();
        Ok(())
    }
}

/// StreamResult over chunks that are already in memory.
pub struct VecStreamResult {
    items: std::vec::IntoIter<Value>,
}

impl VecStreamResult {
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }
}

#[async_trait]
impl StreamResult for VecStreamResult {
    async fn next(&mut self) -> Result<Option<Value>> {
        Ok(self.items.next())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

pub fn boxed_channel_stream(rx: mpsc::Receiver<Result<Value>>) -> Box<dyn StreamResult> {
    Box::new(ChannelStreamResult::new(rx))
}

pub fn boxed_vec_stream(items: Vec<Value>) -> Box<dyn StreamResult> {
    Box::new(VecStreamResult::new(items))
}

/// Drain a stream to its end, closing it afterwards.
///
/// The first error aborts the drain; chunks read before it are dropped.
pub async fn collect_chunks(stream: &mut dyn StreamResult) -> Result<Vec<Value>> {
    let mut chunks = Vec::new();
    loop {
        match stream.next().await {
            Ok(Some(chunk)) => chunks.push(chunk),
            Ok(None) => break,
            Err(e) => {
                if let Err(close_err) = stream.close().await {
                    debug!(error = %close_err, "closing aborted stream failed");
                }
                return Err(e);
            }
        }
    }
    stream.close().await?;
    Ok(chunks)
}
