//! TCP listener for the streamed sensor feed.
//!
//! The feed is a sequence of pretty-printed JSON objects, one per sample. Only one
//! sensor source is served at a time: the listener is closed while a connection is
//! active and re-bound after it drops.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpListener;

use crate::config::SensorNames;
use crate::error::Result;
use crate::fusion::{SensorFusion, SensorSample};

/// A sample ends at a line holding only the closing brace of the top-level object.
const CHUNK_TERMINATOR: &str = "}";

pub struct SensorServer {
    addr: String,
    names: SensorNames,
    fusion: SensorFusion,
}

impl SensorServer {
    pub fn new(addr: impl Into<String>, names: SensorNames, fusion: SensorFusion) -> Self {
        Self {
            addr: addr.into(),
            names,
            fusion,
        }
    }

    /// Accepts sensor connections one after another, forever.
    ///
    /// Only bind/accept failures end the loop; a broken connection is logged and the
    /// listener comes back up.
    pub async fn run(mut self) -> Result<()> {
        loop {
            let listener = TcpListener::bind(&self.addr).await?;
            tracing::info!(addr = %self.addr, "Server started");
            let (stream, peer) = listener.accept().await?;
            drop(listener);

            tracing::info!(%peer, "Connected");
            if let Err(e) = self.serve(stream).await {
                tracing::warn!(error = %e, "sensor connection failed");
            }
            tracing::info!("*** Disconnected ***");
        }
    }

    /// Feeds every sample on `reader` through sensor fusion until end of stream.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn serve<R>(&mut self, reader: R) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(reader);
        let mut chunk = String::new();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                if !chunk.trim().is_empty() {
                    tracing::debug!(bytes = chunk.len(), "dropping incomplete sample");
                }
                return Ok(());
            }
            // Invalid UTF-8 only spoils the sample it is in.
            let line = String::from_utf8_lossy(&buf);
            chunk.push_str(&line);

            if line.trim_end_matches(['\r', '\n']) == CHUNK_TERMINATOR {
                self.ingest(&chunk);
                chunk.clear();
            }
        }
    }

    fn ingest(&mut self, chunk: &str) {
        match SensorSample::from_json(chunk, &self.names) {
            Ok(sample) => {
                // Rejections are logged by fusion.
                let _ = self.fusion.process(&sample);
            }
            Err(e) => tracing::warn!(error = %e, "undecodable sensor sample"),
        }
    }

    pub fn fusion(&self) -> &SensorFusion {
        &self.fusion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    const FEED: &str = r#"{
  "Magnetometer": {
    "values": [
      22.5,
      -4.0,
      -38.1
    ]
  },
  "Gravity": {
    "values": [
      0.0,
      0.0,
      9.8
    ]
  }
}
{
  "Magnetometer": {
    "values": [
      22.5,
      -4.0,
      -38.1
    ]
  }
}
{ this is not json
}
{
  "Gravity": {
    "values": [
      0.0,
      0.0,
      9.8
    ]
  },
  "Magnetometer": {
    "values": [
      0.0,
      30.0,
      -38.1
    ]
  }
}
"#;

    #[tokio::test]
    async fn serve_splits_and_fuses_samples() {
        let (fusion, headings) = SensorFusion::new();
        let mut server = SensorServer::new("127.0.0.1:0", SensorNames::default(), fusion);

        server.serve(FEED.as_bytes()).await.expect("stream ends cleanly");

        assert_eq!(server.fusion().accepted(), 2);
        assert_eq!(server.fusion().rejected(), 1);
        let heading = headings.current().expect("heading published");
        assert!((heading.y() - 1.0).abs() < 1.0e-9);
    }

    #[tokio::test]
    async fn garbled_bytes_do_not_drop_the_connection() {
        let (fusion, headings) = SensorFusion::new();
        let mut server = SensorServer::new("127.0.0.1:0", SensorNames::default(), fusion);

        let mut feed = b"{ \"Gravity\": \xff\xfe\n}\n".to_vec();
        feed.extend_from_slice(FEED.as_bytes());
        server.serve(&feed[..]).await.expect("stream ends cleanly");

        assert_eq!(server.fusion().accepted(), 2);
        assert!(headings.current().is_some());
    }

    #[tokio::test]
    async fn run_accepts_a_tcp_sensor_source() {
        let reserved = TcpListener::bind("127.0.0.1:0").await.expect("bind free port");
        let addr = reserved.local_addr().expect("local address");
        drop(reserved);

        let (fusion, mut headings) = SensorFusion::new();
        let server = SensorServer::new(addr.to_string(), SensorNames::default(), fusion);
        let task = tokio::spawn(server.run());

        let mut stream = loop {
            match tokio::net::TcpStream::connect(addr).await {
                Ok(stream) => break stream,
                Err(_) => tokio::time::sleep(std::time::Duration::from_millis(10)).await,
            }
        };
        stream.write_all(FEED.as_bytes()).await.expect("feed written");
        stream.flush().await.expect("feed flushed");

        // Either the first or the last sample, depending on how far the server got.
        let heading = headings.wait_ready().await.expect("heading published");
        assert!(heading.x() > 0.9 || heading.y() > 0.9);
        task.abort();
    }
}
