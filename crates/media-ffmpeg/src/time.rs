use crate::error::{MediaFfmpegError, Result};

/// Rational value as reported by `ffprobe` for time bases and frame rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /// Creates a validated rational value.
    ///
    /// # Example
    /// ```
    /// use media_ffmpeg::Rational;
    ///
    /// let rate = Rational::new(30_000, 1_001).expect("valid");
    /// assert_eq!(rate.num, 30_000);
    /// assert_eq!(rate.den, 1_001);
    /// ```
    pub fn new(num: i32, den: i32) -> Result<Self> {
        if den <= 0 || num == 0 {
            return Err(MediaFfmpegError::InvalidRational { num, den });
        }

        Ok(Self { num, den })
    }

    /// Parses a `num/den` text into a rational.
    ///
    /// # Example
    /// ```
    /// use media_ffmpeg::Rational;
    ///
    /// let tb = Rational::parse("1/15360").expect("valid");
    /// assert_eq!(tb.den, 15360);
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let (num, den) = input
            .split_once('/')
            .ok_or_else(|| MediaFfmpegError::Parse {
                context: "rational",
                value: input.to_string(),
            })?;
        let num = parse_i32(num, "rational num")?;
        let den = parse_i32(den, "rational den")?;
        Self::new(num, den)
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

/// Estimates a frame count from a container duration and a frame rate.
///
/// Partial trailing frames are not counted.
///
/// # Example
/// ```
/// use media_ffmpeg::{Rational, frames_in_duration};
///
/// let rate = Rational::new(30, 1).expect("valid");
/// assert_eq!(frames_in_duration(1.2, rate), 36);
/// ```
pub fn frames_in_duration(duration_seconds: f64, frame_rate: Rational) -> u64 {
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return 0;
    }
    let frames = duration_seconds * frame_rate.as_f64();
    // Guard against 35.999999 style float error before flooring.
    (frames + 1e-6).floor().max(0.0) as u64
}

fn parse_i32(value: &str, context: &'static str) -> Result<i32> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| MediaFfmpegError::Parse {
            context,
            value: value.to_string(),
        })
}
