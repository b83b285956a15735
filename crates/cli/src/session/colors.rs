use crossterm::style::{Attribute, Color};

use super::views::Tone;

/// Foreground, background and attributes of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub foreground: Option<Color>,
    pub background: Option<Color>,
    pub bold: bool,
    pub italic: bool,
}

impl Style {
    const fn fg(ansi: u8) -> Self {
        Self {
            foreground: Some(Color::AnsiValue(ansi)),
            background: None,
            bold: false,
            italic: false,
        }
    }

    const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    const fn on(mut self, ansi: u8) -> Self {
        self.background = Some(Color::AnsiValue(ansi));
        self
    }

    /// Attributes to set before printing, in order.
    #[must_use]
    pub fn attributes(&self) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        if self.bold {
            attributes.push(Attribute::Bold);
        }
        if self.italic {
            attributes.push(Attribute::Italic);
        }
        attributes
    }
}

/// Trait for converting a tone to terminal styling
pub trait AsTermStyle {
    fn as_term_style(&self) -> Style;
}

impl AsTermStyle for Tone {
    fn as_term_style(&self) -> Style {
        match self {
            Tone::Normal => Style {
                foreground: None,
                background: None,
                bold: false,
                italic: false,
            },
            Tone::Title => Style::fg(205).bold(),
            Tone::Danger | Tone::Error => Style::fg(196).bold(),
            Tone::Muted | Tone::Placeholder => Style::fg(241),
            Tone::Selected | Tone::FocusedLabel => Style::fg(170).bold(),
            Tone::Id => Style::fg(244),
            Tone::Group | Tone::Label => Style::fg(141),
            Tone::Tag => Style::fg(141).on(236),
            Tone::Command => Style::fg(245),
            Tone::Description => Style::fg(241).italic(),
            Tone::Time => Style::fg(246),
            Tone::NewGroup => Style::fg(141).italic(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_styles() {
        let title = Tone::Title.as_term_style();
        assert_eq!(title.foreground, Some(Color::AnsiValue(205)));
        assert_eq!(title.attributes(), vec![Attribute::Bold]);

        let tag = Tone::Tag.as_term_style();
        assert_eq!(tag.background, Some(Color::AnsiValue(236)));

        assert!(Tone::Normal.as_term_style().attributes().is_empty());
        assert_eq!(
            Tone::Description.as_term_style().attributes(),
            vec![Attribute::Italic]
        );
    }
}
