use crate::{
    color::Rgba8,
    error::{ColorblockError, ColorblockResult},
};

/// One of the three independent text regions on the card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Zone {
    Heading,
    Statement,
    Footer,
}

/// Horizontal anchoring shared by every line of every zone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Input bundle for one render: text, typography and background.
///
/// Built fresh from the external statement record at the start of each render;
/// nothing here is cached between renders.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderSpec {
    pub heading: Option<String>,
    pub statement: String,
    pub footer: Option<String>,

    pub heading_font_size_px: u32,
    pub statement_font_size_px: u32,
    pub footer_font_size_px: u32,

    pub text_alignment: TextAlign,

    /// Fallback / default canvas fill.
    pub background_color: Rgba8,
    /// Optional source bitmap stretched to cover the canvas.
    pub background_image_url: Option<String>,

    pub heading_font_color: Rgba8,
    pub statement_font_color: Rgba8,
    pub footer_font_color: Rgba8,
}

impl Default for RenderSpec {
    fn default() -> Self {
        Self {
            heading: None,
            statement: String::new(),
            footer: None,
            heading_font_size_px: 48,
            statement_font_size_px: 60,
            footer_font_size_px: 36,
            text_alignment: TextAlign::Center,
            background_color: Rgba8::BLACK,
            background_image_url: None,
            heading_font_color: Rgba8::WHITE,
            statement_font_color: Rgba8::WHITE,
            footer_font_color: Rgba8::WHITE,
        }
    }
}

impl RenderSpec {
    /// Zone text as seen by layout. Empty string means the zone is absent.
    pub fn zone_text(&self, zone: Zone) -> &str {
        match zone {
            Zone::Heading => self.heading.as_deref().unwrap_or(""),
            Zone::Statement => &self.statement,
            Zone::Footer => self.footer.as_deref().unwrap_or(""),
        }
    }

    pub fn zone_font_size_px(&self, zone: Zone) -> u32 {
        match zone {
            Zone::Heading => self.heading_font_size_px,
            Zone::Statement => self.statement_font_size_px,
            Zone::Footer => self.footer_font_size_px,
        }
    }

    pub fn zone_font_color(&self, zone: Zone) -> Rgba8 {
        match zone {
            Zone::Heading => self.heading_font_color,
            Zone::Statement => self.statement_font_color,
            Zone::Footer => self.footer_font_color,
        }
    }

    /// Present means non-empty text; whitespace-only text still counts (it
    /// renders as preserved blank lines).
    pub fn zone_present(&self, zone: Zone) -> bool {
        !self.zone_text(zone).is_empty()
    }

    pub fn validate(&self) -> ColorblockResult<()> {
        if self.heading_font_size_px == 0 {
            return Err(ColorblockError::validation(
                "heading_font_size_px must be > 0",
            ));
        }
        if self.statement_font_size_px == 0 {
            return Err(ColorblockError::validation(
                "statement_font_size_px must be > 0",
            ));
        }
        if self.footer_font_size_px == 0 {
            return Err(ColorblockError::validation(
                "footer_font_size_px must be > 0",
            ));
        }
        if let Some(url) = &self.background_image_url
            && url.trim().is_empty()
        {
            return Err(ColorblockError::validation(
                "background_image_url must be non-empty when set",
            ));
        }
        Ok(())
    }
}
