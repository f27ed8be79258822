use serde::{Deserialize, Serialize};

/// Straight-alpha RGBA8 color as it appears in a [`RenderSpec`](crate::RenderSpec).
///
/// Serialized as `#RRGGBB` / `#RRGGBBAA` hex, the format the statement records
/// carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Premultiply into the RGBA8 quad the raster surfaces consume.
    pub fn to_premul_array(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

pub(crate) fn parse_hex(s: &str) -> Result<Rgba8, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    let (r, g, b, a) = match s.len() {
        6 => {
            let r = hex_byte(&s[0..2])?;
            let g = hex_byte(&s[2..4])?;
            let b = hex_byte(&s[4..6])?;
            (r, g, b, 255)
        }
        8 => {
            let r = hex_byte(&s[0..2])?;
            let g = hex_byte(&s[2..4])?;
            let b = hex_byte(&s[4..6])?;
            let a = hex_byte(&s[6..8])?;
            (r, g, b, a)
        }
        _ => {
            return Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned());
        }
    };

    Ok(Rgba8 { r, g, b, a })
}

impl Serialize for Rgba8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgba8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_hex_rgb_and_rgba() {
        let c: Rgba8 = serde_json::from_value(json!("#ff0000")).unwrap();
        assert_eq!(c, Rgba8::rgb(255, 0, 0));

        let c: Rgba8 = serde_json::from_value(json!("#0000FF80")).unwrap();
        assert_eq!(
            c,
            Rgba8 {
                r: 0,
                g: 0,
                b: 255,
                a: 128
            }
        );
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(serde_json::from_value::<Rgba8>(json!("#12345")).is_err());
        assert!(serde_json::from_value::<Rgba8>(json!("#gggggg")).is_err());
    }

    #[test]
    fn hex_roundtrip() {
        let c = Rgba8::rgb(0x4c, 0xaf, 0x50);
        assert_eq!(c.to_hex(), "#4caf50");
        assert_eq!(parse_hex(&c.to_hex()).unwrap(), c);
    }

    #[test]
    fn premultiply_matches_rounding() {
        let c = Rgba8 {
            r: 100,
            g: 50,
            b: 200,
            a: 128,
        };
        assert_eq!(
            c.to_premul_array(),
            [
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128
            ]
        );
    }
}
