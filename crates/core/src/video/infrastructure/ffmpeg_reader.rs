use std::path::Path;

use ffmpeg_next::format::context::Input;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video as VideoFrame;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Reads a video file through ffmpeg-next as a lazy stream of RGB frames.
///
/// Frames are numbered in decode order from 0. Damage inside the file never
/// surfaces as an `Err` item: unreadable packets are dropped, and a frame
/// that cannot be converted to RGB ends the stream. Callers therefore see a
/// possibly short, but well-formed, sequence.
pub struct FfmpegReader {
    input: Option<OpenInput>,
}

struct OpenInput {
    ictx: Input,
    stream_index: usize,
}

// Safety: FfmpegReader is moved to the reader thread as a whole and only
// touched from one thread at a time.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self { input: None }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        let ictx = ffmpeg_next::format::input(path)?;

        let (stream_index, decoder) = video_decoder(&ictx)?;
        let stream = ictx.stream(stream_index).ok_or("No video stream found")?;
        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps: frame_rate(stream.rate()),
            total_frames: usize::try_from(stream.frames()).unwrap_or(0),
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };

        log::info!(
            "Opened {} ({}x{}, {:.2} fps, ~{} frames, {})",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames,
            metadata.codec
        );

        self.input = Some(OpenInput { ictx, stream_index });
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let Some(input) = self.input.as_mut() else {
            return Box::new(std::iter::once(Err("FfmpegReader: not opened".into())));
        };

        match RgbDecoder::new(&input.ictx) {
            Ok(decoder) => Box::new(FrameStream {
                ictx: &mut input.ictx,
                stream_index: input.stream_index,
                decoder,
                next_index: 0,
                dropped_packets: 0,
                phase: Phase::Reading,
            }),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn close(&mut self) {
        self.input = None;
    }
}

/// Index of the best video stream and a decoder for it.
fn video_decoder(
    ictx: &Input,
) -> Result<(usize, ffmpeg_next::decoder::Video), Box<dyn std::error::Error>> {
    let stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or("No video stream found")?;
    let context = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
    Ok((stream.index(), context.decoder().video()?))
}

fn frame_rate(rate: ffmpeg_next::Rational) -> f64 {
    if rate.denominator() == 0 {
        0.0
    } else {
        f64::from(rate)
    }
}

/// Decoder plus the converter to packed RGB24 at source resolution.
struct RgbDecoder {
    decoder: ffmpeg_next::decoder::Video,
    to_rgb: scaling::Context,
}

impl RgbDecoder {
    fn new(ictx: &Input) -> Result<Self, Box<dyn std::error::Error>> {
        let (_, decoder) = video_decoder(ictx)?;
        let to_rgb = scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg_next::format::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            scaling::Flags::BILINEAR,
        )?;
        Ok(Self { decoder, to_rgb })
    }

    /// Next decoded picture already converted to RGB, if one is ready.
    fn receive(&mut self, index: usize) -> Option<Result<Frame, ffmpeg_next::Error>> {
        let mut decoded = VideoFrame::empty();
        self.decoder.receive_frame(&mut decoded).ok()?;

        let mut rgb = VideoFrame::empty();
        Some(self.to_rgb.run(&decoded, &mut rgb).map(|()| {
            let (width, height) = (self.decoder.width(), self.decoder.height());
            Frame::new(packed_rgb(&rgb, width, height), width, height, 3, index)
        }))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    Reading,
    Draining,
    Finished,
}

struct FrameStream<'a> {
    ictx: &'a mut Input,
    stream_index: usize,
    decoder: RgbDecoder,
    next_index: usize,
    dropped_packets: usize,
    phase: Phase,
}

impl FrameStream<'_> {
    /// Pulls one ready frame from the decoder. A conversion failure ends
    /// the stream.
    fn take_ready(&mut self) -> Option<Frame> {
        match self.decoder.receive(self.next_index)? {
            Ok(frame) => {
                self.next_index += 1;
                Some(frame)
            }
            Err(e) => {
                log::warn!(
                    "Cannot convert frame {} to RGB: {e}. Ending stream...",
                    self.next_index
                );
                self.finish();
                None
            }
        }
    }

    /// Sends the next packet of our stream to the decoder. Returns `false`
    /// once the container has no packets left.
    fn feed(&mut self) -> bool {
        for (stream, packet) in self.ictx.packets() {
            if stream.index() != self.stream_index {
                continue;
            }
            if let Err(e) = self.decoder.decoder.send_packet(&packet) {
                self.dropped_packets += 1;
                log::debug!("Dropping unreadable packet: {e}");
                continue;
            }
            return true;
        }
        false
    }

    fn finish(&mut self) {
        if self.phase == Phase::Finished {
            return;
        }
        self.phase = Phase::Finished;
        if self.dropped_packets > 0 {
            log::warn!(
                "{} unreadable packets dropped, {} frames decoded",
                self.dropped_packets,
                self.next_index
            );
        }
    }
}

impl Iterator for FrameStream<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.phase {
                Phase::Finished => return None,
                Phase::Reading => {
                    if let Some(frame) = self.take_ready() {
                        return Some(Ok(frame));
                    }
                    if self.phase == Phase::Finished {
                        return None;
                    }
                    if !self.feed() {
                        let _ = self.decoder.decoder.send_eof();
                        self.phase = Phase::Draining;
                    }
                }
                Phase::Draining => {
                    let frame = self.take_ready();
                    if frame.is_none() {
                        self.finish();
                    }
                    return frame.map(Ok);
                }
            }
        }
    }
}

/// Copies the first plane into a buffer without ffmpeg's row padding.
fn packed_rgb(rgb: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let row_bytes = width as usize * 3;
    rgb.data(0)
        .chunks(rgb.stride(0))
        .take(height as usize)
        .flat_map(|row| &row[..row_bytes])
        .copied()
        .collect()
}
