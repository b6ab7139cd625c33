//! Audible background tracks through rodio.

use std::{fs, io::Cursor, path::Path, sync::Arc};

use character_showcase_core::{Result, ShowcaseError, Track};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

/// Default output device. Must outlive every track created from it.
pub struct AudioOutput {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl AudioOutput {
    pub fn open() -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|err| ShowcaseError::Audio(format!("failed to open audio output: {err}")))?;
        tracing::info!("audio output opened");
        Ok(Self {
            _stream: stream,
            handle,
        })
    }

    /// Reads `path` into memory and prepares a paused, looping track.
    pub fn track(&self, path: &Path, volume: f32) -> Result<RodioTrack> {
        let data: Arc<[u8]> = fs::read(path)
            .map_err(|err| ShowcaseError::Audio(format!("{}: {err}", path.display())))?
            .into();
        let sink = looped_sink(&self.handle, &data, volume)?;
        Ok(RodioTrack {
            handle: self.handle.clone(),
            data,
            volume,
            sink,
        })
    }
}

pub struct RodioTrack {
    handle: OutputStreamHandle,
    data: Arc<[u8]>,
    volume: f32,
    sink: Sink,
}

fn looped_sink(handle: &OutputStreamHandle, data: &Arc<[u8]>, volume: f32) -> Result<Sink> {
    let sink = Sink::try_new(handle)
        .map_err(|err| ShowcaseError::Audio(format!("failed to create sink: {err}")))?;
    let source = Decoder::new_looped(Cursor::new(Arc::clone(data)))
        .map_err(|err| ShowcaseError::Audio(format!("failed to decode track: {err}")))?;
    sink.pause();
    sink.set_volume(volume);
    sink.append(source);
    Ok(sink)
}

impl Track for RodioTrack {
    fn play(&mut self) -> Result<()> {
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.sink.pause();
        Ok(())
    }

    fn rewind(&mut self) -> Result<()> {
        // Sinks cannot seek, so the decoder is rebuilt from the start.
        let was_playing = !self.sink.is_paused();
        let fresh = looped_sink(&self.handle, &self.data, self.volume)?;
        let stale = std::mem::replace(&mut self.sink, fresh);
        stale.stop();
        if was_playing {
            self.sink.play();
        }
        Ok(())
    }

    fn is_playing(&self) -> bool {
        !self.sink.is_paused()
    }
}
