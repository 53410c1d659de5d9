//! Color themes for the renderer and marble palettes.
//!
//! Themes are plain values handed to the renderer and marbles; nothing here
//! is global. Custom themes can be loaded from JSON where colors are written
//! as `#rgb`, `#rrggbb`, `#rrggbbaa` or one of a few CSS names.

use serde::{Deserialize, Serialize};

use crate::stage::ShapeKind;

/// RGBA color representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Error returned when a color string cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid color: {0}")]
pub struct ColorParseError(String);

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    /// Builds a color from hue (degrees), saturation and lightness (percent).
    #[allow(clippy::many_single_char_names)]
    pub fn hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 360.0;
        let s = (saturation / 100.0).clamp(0.0, 1.0);
        let l = (lightness / 100.0).clamp(0.0, 1.0);

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let channel = |t: f32| {
            let t = t.rem_euclid(1.0);
            let v = if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            };
            to_channel(v)
        };

        Self::rgb(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
    }

    /// Returns the same color with the alpha replaced (0.0 - 1.0).
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: to_channel(alpha),
            ..self
        }
    }

    /// Alpha as a 0.0 - 1.0 fraction.
    pub fn alpha(&self) -> f32 {
        f32::from(self.a) / 255.0
    }

    /// Parses `#rgb`, `#rrggbb`, `#rrggbbaa` or a small set of CSS color names.
    pub fn parse(value: &str) -> Result<Self, ColorParseError> {
        let value = value.trim();
        let named = match value.to_ascii_lowercase().as_str() {
            "black" => Some(Self::BLACK),
            "white" => Some(Self::WHITE),
            "red" => Some(Self::RED),
            "cyan" => Some(Self::CYAN),
            "yellow" => Some(Self::YELLOW),
            "transparent" => Some(Self::TRANSPARENT),
            _ => None,
        };
        if let Some(color) = named {
            return Ok(color);
        }

        let hex = value
            .strip_prefix('#')
            .filter(|hex| hex.is_ascii())
            .ok_or_else(|| ColorParseError(value.to_string()))?;
        let digit = |i: usize, len: usize| {
            u8::from_str_radix(&hex[i..i + len], 16).map_err(|_| ColorParseError(value.to_string()))
        };

        match hex.len() {
            3 => Ok(Self::rgb(digit(0, 1)? * 17, digit(1, 1)? * 17, digit(2, 1)? * 17)),
            6 => Ok(Self::rgb(digit(0, 2)?, digit(2, 2)?, digit(4, 2)?)),
            8 => Ok(Self::new(digit(0, 2)?, digit(2, 2)?, digit(4, 2)?, digit(6, 2)?)),
            _ => Err(ColorParseError(value.to_string())),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        if color.a == 255 {
            format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", color.r, color.g, color.b, color.a)
        }
    }
}

/// Drawing style for one kind of stage entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityStyle {
    pub fill: Color,
    pub outline: Color,
    pub bloom: Color,
    /// Glow radius in pixels; 0 disables the glow.
    #[serde(default)]
    pub bloom_radius: f32,
}

/// Styles for each stage shape kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityStyles {
    #[serde(rename = "box")]
    pub box_: EntityStyle,
    pub circle: EntityStyle,
    pub polyline: EntityStyle,
}

impl EntityStyles {
    pub fn get(&self, kind: ShapeKind) -> &EntityStyle {
        match kind {
            ShapeKind::Box => &self.box_,
            ShapeKind::Circle => &self.circle,
            ShapeKind::Polyline => &self.polyline,
        }
    }
}

/// Complete visual theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorTheme {
    pub background: Color,
    /// Base lightness (percent) of marble bodies.
    pub marble_lightness: f32,
    pub marble_winning_border: Color,
    pub skill_color: Color,
    pub cool_time_indicator: Color,
    pub entity: EntityStyles,
    #[serde(default)]
    pub rank_stroke: Option<Color>,
    pub rank_background: Color,
    pub minimap_background: Color,
    pub minimap_viewport: Color,
    pub winner_background: Color,
    #[serde(default)]
    pub winner_outline: Option<Color>,
    pub winner_text: Color,
    #[serde(default)]
    pub marble_glow: Option<Color>,
    /// Hues (degrees) marbles pick their color from.
    pub marble_palette: Vec<f32>,
}

/// Names accepted by [`ColorTheme::by_name`].
pub const THEME_NAMES: [&str; 2] = ["dark", "light"];

impl Default for ColorTheme {
    fn default() -> Self {
        Self::dark()
    }
}

impl ColorTheme {
    /// Neon-on-black theme.
    pub fn dark() -> Self {
        let style = |fill: Color, bloom: Color| EntityStyle {
            fill,
            outline: fill,
            bloom,
            bloom_radius: 15.0,
        };
        Self {
            background: Color::BLACK,
            marble_lightness: 75.0,
            marble_winning_border: Color::WHITE,
            skill_color: Color::WHITE,
            cool_time_indicator: Color::RED,
            entity: EntityStyles {
                box_: style(Color::CYAN, Color::CYAN),
                circle: style(Color::YELLOW, Color::YELLOW),
                polyline: style(Color::WHITE, Color::CYAN),
            },
            rank_stroke: Some(Color::BLACK),
            rank_background: Color::WHITE.with_alpha(0.2),
            minimap_background: Color::rgb(0x33, 0x33, 0x33),
            minimap_viewport: Color::WHITE,
            winner_background: Color::BLACK.with_alpha(0.5),
            winner_outline: Some(Color::BLACK),
            winner_text: Color::WHITE,
            marble_glow: Some(Color::WHITE.with_alpha(0.3)),
            marble_palette: vec![160.0, 190.0, 210.0, 260.0, 320.0, 340.0, 25.0, 50.0, 120.0],
        }
    }

    /// Flat light theme.
    pub fn light() -> Self {
        Self {
            background: Color::rgb(0xee, 0xee, 0xee),
            marble_lightness: 50.0,
            marble_winning_border: Color::BLACK,
            skill_color: Color::rgb(0x66, 0x99, 0xcc),
            cool_time_indicator: Color::rgb(0x99, 0x99, 0x99),
            entity: EntityStyles {
                box_: EntityStyle {
                    fill: Color::rgb(0x22, 0x6f, 0x92),
                    outline: Color::BLACK,
                    bloom: Color::CYAN,
                    bloom_radius: 0.0,
                },
                circle: EntityStyle {
                    fill: Color::YELLOW,
                    outline: Color::rgb(0xed, 0x7e, 0x11),
                    bloom: Color::YELLOW,
                    bloom_radius: 0.0,
                },
                polyline: EntityStyle {
                    fill: Color::WHITE,
                    outline: Color::BLACK,
                    bloom: Color::CYAN,
                    bloom_radius: 0.0,
                },
            },
            rank_stroke: Some(Color::BLACK),
            rank_background: Color::BLACK.with_alpha(0.5),
            minimap_background: Color::rgb(0xfe, 0xfe, 0xfe),
            minimap_viewport: Color::rgb(0x66, 0x99, 0xcc),
            winner_background: Color::WHITE.with_alpha(0.5),
            winner_outline: Some(Color::BLACK),
            winner_text: Color::rgb(0xcc, 0xcc, 0xcc),
            marble_glow: Some(Color::BLACK.with_alpha(0.5)),
            marble_palette: vec![0.0, 30.0, 60.0, 120.0, 180.0, 210.0, 270.0, 300.0, 330.0],
        }
    }

    /// Looks up a built-in theme by name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            _ => None,
        }
    }

    /// Loads a custom theme from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the theme to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
