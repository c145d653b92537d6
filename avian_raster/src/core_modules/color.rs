// THEORY:
// The `Color` module is the smallest unit the aggregation engine reasons about.
// It is a "dumb" data container for one RGBA value: the key of every frequency
// table and the second half of every `(percentage, color)` pair in the output.
//
// Key architectural principles:
// 1.  **Exact identity**: Two pixels are the same color only if all four
//     channels match. There is no tolerance, binning or color-space math here;
//     the engine counts what is in the raster.
// 2.  **Total order**: `Color` derives `Ord` over (red, green, blue, alpha).
//     When two colors cover exactly the same share of an image, the ranking
//     falls back to this order, so output never depends on hash iteration.
// 3.  **Alpha-aware display**: Sources without an alpha channel are stored
//     fully opaque and print as an RGB triple. Translucent colors print all
//     four channels.

pub mod color {
    use crate::error::{Error, Result};
    use image::Rgba;
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;

    pub type Channel = u8;

    pub const CHANNELS: usize = 4;

    const OPAQUE: Channel = Channel::MAX;

    /// A single RGBA color value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct Color {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255).
        pub alpha: Channel,
    }

    impl Color {
        /// An opaque color.
        pub const fn rgb(red: Channel, green: Channel, blue: Channel) -> Self {
            Self::rgba(red, green, blue, OPAQUE)
        }

        pub const fn rgba(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Self {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// `bytes` must hold at least `CHANNELS` values.
        pub(crate) fn from_bytes(bytes: &[Channel]) -> Self {
            Self::rgba(bytes[0], bytes[1], bytes[2], bytes[3])
        }

        pub fn is_opaque(&self) -> bool {
            self.alpha == OPAQUE
        }

        pub fn channels(&self) -> [Channel; CHANNELS] {
            [self.red, self.green, self.blue, self.alpha]
        }
    }

    impl From<Rgba<u8>> for Color {
        fn from(pixel: Rgba<u8>) -> Self {
            let [red, green, blue, alpha] = pixel.0;
            Self::rgba(red, green, blue, alpha)
        }
    }

    impl From<Color> for Rgba<u8> {
        fn from(color: Color) -> Self {
            Rgba(color.channels())
        }
    }

    impl fmt::Display for Color {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            if self.is_opaque() {
                write!(f, "({}, {}, {})", self.red, self.green, self.blue)
            } else {
                write!(
                    f,
                    "({}, {}, {}, {})",
                    self.red, self.green, self.blue, self.alpha
                )
            }
        }
    }

    /// Parses `r,g,b` or `r,g,b,a`, optionally wrapped in parentheses, which
    /// is also the `Display` form.
    impl FromStr for Color {
        type Err = Error;

        fn from_str(s: &str) -> Result<Self> {
            let inner = s
                .trim()
                .trim_start_matches('(')
                .trim_end_matches(')');
            let channels = inner
                .split(',')
                .map(|part| part.trim().parse::<Channel>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| Error::invalid_input(format!("'{s}' is not a color; expected r,g,b or r,g,b,a with values 0-255")))?;

            match channels.as_slice() {
                [r, g, b] => Ok(Self::rgb(*r, *g, *b)),
                [r, g, b, a] => Ok(Self::rgba(*r, *g, *b, *a)),
                _ => Err(Error::invalid_input(format!(
                    "'{s}' has {} channels; expected 3 or 4",
                    channels.len()
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::color::*;

    #[test]
    fn ordering_is_lexicographic_by_channel() {
        let mut colors = vec![
            Color::rgb(0, 0, 255),
            Color::rgb(0, 255, 0),
            Color::rgba(0, 0, 255, 10),
            Color::rgb(255, 0, 0),
        ];
        colors.sort();
        assert_eq!(
            colors,
            vec![
                Color::rgba(0, 0, 255, 10),
                Color::rgb(0, 0, 255),
                Color::rgb(0, 255, 0),
                Color::rgb(255, 0, 0),
            ]
        );
    }

    #[test]
    fn display_hides_opaque_alpha() {
        assert_eq!(Color::rgb(255, 0, 0).to_string(), "(255, 0, 0)");
        assert_eq!(Color::rgba(1, 2, 3, 4).to_string(), "(1, 2, 3, 4)");
    }

    #[test]
    fn parses_display_form_and_bare_triples() {
        assert_eq!("(34, 139, 34)".parse::<Color>().unwrap(), Color::rgb(34, 139, 34));
        assert_eq!("34,139,34".parse::<Color>().unwrap(), Color::rgb(34, 139, 34));
        assert_eq!("1,2,3,4".parse::<Color>().unwrap(), Color::rgba(1, 2, 3, 4));
    }

    #[test]
    fn rejects_malformed_colors() {
        assert!("256,0,0".parse::<Color>().is_err());
        assert!("1,2".parse::<Color>().is_err());
        assert!("red".parse::<Color>().is_err());
        assert!("1,2,3,4,5".parse::<Color>().unwrap_err().is_user_error());
    }

    #[test]
    fn converts_to_and_from_image_pixels() {
        let pixel = image::Rgba([9u8, 8, 7, 6]);
        let color = Color::from(pixel);
        assert_eq!(color.channels(), [9, 8, 7, 6]);
        assert_eq!(image::Rgba::<u8>::from(color), pixel);
    }
}
