use crate::assets::fonts::FontBook;

/// Width of a single unbroken run of text at a font size.
///
/// Wrapping and auto-fit only ever ask for widths, so tests can drive them with closures and
/// production code with a shaped [`FontBook`].
pub trait TextMeasure {
    /// Advance width of `text` at `font_size` px.
    fn measure(&mut self, text: &str, font_size: f64) -> f64;
}

impl<F> TextMeasure for F
where
    F: FnMut(&str, f64) -> f64,
{
    fn measure(&mut self, text: &str, font_size: f64) -> f64 {
        self(text, font_size)
    }
}

/// Every character advances by `em` times the font size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedAdvance {
    /// Advance per character, in ems.
    pub em: f64,
}

impl TextMeasure for FixedAdvance {
    fn measure(&mut self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * self.em * font_size
    }
}

/// Measures with a registered face of a [`FontBook`].
pub struct FontMeasurer<'a> {
    book: &'a mut FontBook,
    family: &'a str,
    weight: u16,
    letter_spacing: f64,
}

impl<'a> FontMeasurer<'a> {
    /// Measurer for `family` at `weight` with extra per-character spacing.
    pub fn new(book: &'a mut FontBook, family: &'a str, weight: u16, letter_spacing: f64) -> Self {
        Self {
            book,
            family,
            weight,
            letter_spacing,
        }
    }
}

impl TextMeasure for FontMeasurer<'_> {
    fn measure(&mut self, text: &str, font_size: f64) -> f64 {
        self.book
            .measure(self.family, self.weight, text, font_size, self.letter_spacing)
    }
}
