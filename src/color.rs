//! CSS color values.

use cssparser::Parser;

use crate::error::*;
use crate::parsers::Parse;

impl Parse for cssparser::RGBA {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<cssparser::RGBA, ParseError<'i>> {
        let loc = parser.current_source_location();

        match cssparser::Color::parse(parser)? {
            cssparser::Color::RGBA(rgba) => Ok(rgba),
            cssparser::Color::CurrentColor => Err(loc.new_custom_error(ValueErrorKind::Value(
                "currentColor is not allowed here".to_string(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cssparser::RGBA;

    #[test]
    fn parses_color_forms() {
        assert_eq!(RGBA::parse_str("#ff8040"), Ok(RGBA::new(255, 128, 64, 255)));
        assert_eq!(RGBA::parse_str("red"), Ok(RGBA::new(255, 0, 0, 255)));
        assert_eq!(
            RGBA::parse_str("rgb(16, 32, 64)"),
            Ok(RGBA::new(16, 32, 64, 255))
        );
    }

    #[test]
    fn rejects_non_colors() {
        assert!(RGBA::parse_str("").is_err());
        assert!(RGBA::parse_str("currentColor").is_err());
        assert!(RGBA::parse_str("wavelength(620nm)").is_err());
    }
}
