use std::io::Write;

use twmap_model::RenderFrame;

/// Consumer of render frames: painting, tooltips and legend live behind it.
///
/// [`Session::render_into`](crate::Session::render_into) hands a sink each
/// frame after a filter change; the sink decides when and how to repaint.
pub trait RenderSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), Self::Error>;
}

/// Writes each frame as one JSON document followed by a newline.
#[derive(Debug)]
pub struct JsonSink<W> {
    writer: W,
    pretty: bool,
}

impl<W: Write> JsonSink<W> {
    /// One compact document per line.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: false,
        }
    }

    /// Indented documents, for terminals.
    pub fn pretty(writer: W) -> Self {
        Self {
            writer,
            pretty: true,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderSink for JsonSink<W> {
    type Error = serde_json::Error;

    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), Self::Error> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, frame)?;
        } else {
            serde_json::to_writer(&mut self.writer, frame)?;
        }
        writeln!(self.writer).map_err(serde_json::Error::io)?;
        self.writer.flush().map_err(serde_json::Error::io)
    }
}
