//! Parser for SVG path data.

use std::fmt;
use std::iter::Enumerate;
use std::str;
use std::str::Bytes;

use crate::path_builder::*;

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum Token {
    Number(f64),
    Flag(bool),
    Command(u8),
    Comma,
}

use crate::path_parser::Token::{Comma, Command, Flag, Number};

#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a [u8],
    ci: Enumerate<Bytes<'a>>,
    current: Option<(usize, u8)>,
    flags_required: u8,
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum LexError {
    ParseFloatError,
    UnexpectedByte(u8),
    UnexpectedEof,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        let mut ci = input.bytes().enumerate();
        let current = ci.next();
        Lexer {
            input: input.as_bytes(),
            ci,
            current,
            flags_required: 0,
        }
    }

    // Flag tokens need context from the parser: only the argument sequence of
    // an elliptical arc contains them, and then exactly two in a row.  When
    // the parser reaches that point it calls this method, and the lexer
    // switches from reading digit runs as numbers to reading two single
    // '0'/'1' characters.
    pub fn require_flags(&mut self) {
        self.flags_required = 2;
    }

    fn current_pos(&mut self) -> usize {
        match self.current {
            None => self.input.len(),
            Some((pos, _)) => pos,
        }
    }

    fn advance(&mut self) {
        self.current = self.ci.next();
    }

    fn advance_over_whitespace(&mut self) -> bool {
        let mut found_some = false;
        while self.current.is_some() && self.current.unwrap().1.is_ascii_whitespace() {
            found_some = true;
            self.current = self.ci.next();
        }
        found_some
    }

    fn advance_over_optional(&mut self, needle: u8) -> bool {
        match self.current {
            Some((_, c)) if c == needle => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn advance_over_digits(&mut self) -> bool {
        let mut found_some = false;
        while self.current.is_some() && self.current.unwrap().1.is_ascii_digit() {
            found_some = true;
            self.current = self.ci.next();
        }
        found_some
    }

    fn advance_over_simple_number(&mut self) -> bool {
        let _ = self.advance_over_optional(b'-') || self.advance_over_optional(b'+');
        let found_digit = self.advance_over_digits();
        let _ = self.advance_over_optional(b'.');
        self.advance_over_digits() || found_digit
    }

    fn match_number(&mut self) -> Result<Token, LexError> {
        // remember the beginning
        let (start_pos, _) = self.current.unwrap();
        if !self.advance_over_simple_number() && start_pos != self.current_pos() {
            match self.current {
                None => return Err(LexError::UnexpectedEof),
                Some((_pos, c)) => return Err(LexError::UnexpectedByte(c)),
            }
        }
        if self.advance_over_optional(b'e') || self.advance_over_optional(b'E') {
            let _ = self.advance_over_optional(b'-') || self.advance_over_optional(b'+');
            let _ = self.advance_over_digits();
        }
        let end_pos = match self.current {
            None => self.input.len(),
            Some((i, _)) => i,
        };

        // bare unwrap here should be safe since we've already checked all the
        // bytes in the range
        match str::from_utf8(&self.input[start_pos..end_pos])
            .unwrap()
            .parse::<f64>()
        {
            Ok(n) => Ok(Number(n)),
            Err(_e) => Err(LexError::ParseFloatError),
        }
    }

    fn input_len(&self) -> usize {
        self.input.len()
    }
}

impl Iterator for Lexer<'_> {
    type Item = (usize, Result<Token, LexError>);

    fn next(&mut self) -> Option<Self::Item> {
        // eat whitespace
        self.advance_over_whitespace();

        match self.current {
            // commas are separators
            Some((pos, c)) if c == b',' => {
                self.advance();
                Some((pos, Ok(Comma)))
            }

            // alphabetic chars are commands
            Some((pos, c)) if c.is_ascii_alphabetic() => {
                let token = Command(c);
                self.advance();
                Some((pos, Ok(token)))
            }

            Some((pos, c)) if self.flags_required > 0 && c.is_ascii_digit() => match c {
                b'0' => {
                    self.flags_required -= 1;
                    self.advance();
                    Some((pos, Ok(Flag(false))))
                }
                b'1' => {
                    self.flags_required -= 1;
                    self.advance();
                    Some((pos, Ok(Flag(true))))
                }
                _ => Some((pos, Err(LexError::UnexpectedByte(c)))),
            },

            Some((pos, c)) if c.is_ascii_digit() || c == b'-' || c == b'+' || c == b'.' => {
                Some((pos, self.match_number()))
            }

            Some((pos, c)) => {
                self.advance();
                Some((pos, Err(LexError::UnexpectedByte(c))))
            }

            None => None,
        }
    }
}

// Recursive descent parser for path data, per the grammar in
// https://www.w3.org/TR/SVG/paths.html#PathDataBNF
//
// Commas between coordinates are optional, whitespace is optional, and a run
// of numbers after a command letter repeats the command:
//
//     M 10 20 30 40
//     M10,20,30,40
//     M-10,20-30-40
//     M.1-2,3E2-4
pub struct PathParser<'b> {
    tokens: Lexer<'b>,
    current_pos_and_token: Option<(usize, Result<Token, LexError>)>,

    builder: &'b mut PathBuilder,

    // Current point; adjusted at every command.  A relative command with no
    // prior point adds to the (0, 0) origin, i.e. behaves as absolute.
    current_x: f64,
    current_y: f64,

    // Last control point from previous cubic curve command, used to reflect
    // the new control point for smooth cubic curve commands.
    cubic_reflection_x: f64,
    cubic_reflection_y: f64,

    // Last control point from previous quadratic curve command, used to
    // reflect the new control point for smooth quadratic curve commands.
    quadratic_reflection_x: f64,
    quadratic_reflection_y: f64,

    // Start point of current subpath (i.e. position of last moveto);
    // used for closepath.
    subpath_start_x: f64,
    subpath_start_y: f64,
}

impl<'b> PathParser<'b> {
    pub fn new(builder: &'b mut PathBuilder, path_str: &'b str) -> PathParser<'b> {
        let mut lexer = Lexer::new(path_str);
        let pt = lexer.next();
        PathParser {
            tokens: lexer,
            current_pos_and_token: pt,

            builder,

            current_x: 0.0,
            current_y: 0.0,

            cubic_reflection_x: 0.0,
            cubic_reflection_y: 0.0,

            quadratic_reflection_x: 0.0,
            quadratic_reflection_y: 0.0,

            subpath_start_x: 0.0,
            subpath_start_y: 0.0,
        }
    }

    // The match_* methods either consume the token they ask for and return
    // the unwrapped value, or return an error without advancing the token
    // stream.  They can be used to probe for a particular kind of token,
    // fail to match it, and try some other type.

    fn match_command(&mut self) -> Result<u8, ParseError> {
        let result = match &self.current_pos_and_token {
            Some((_, Ok(Command(c)))) => Ok(*c),
            Some((pos, Ok(t))) => Err(ParseError::new(*pos, UnexpectedToken(*t))),
            Some((pos, Err(e))) => Err(ParseError::new(*pos, LexError(*e))),
            None => Err(ParseError::new(self.tokens.input_len(), UnexpectedEof)),
        };
        if result.is_ok() {
            self.current_pos_and_token = self.tokens.next();
        }
        result
    }

    fn match_number(&mut self) -> Result<f64, ParseError> {
        let result = match &self.current_pos_and_token {
            Some((_, Ok(Number(n)))) => Ok(*n),
            Some((pos, Ok(t))) => Err(ParseError::new(*pos, UnexpectedToken(*t))),
            Some((pos, Err(e))) => Err(ParseError::new(*pos, LexError(*e))),
            None => Err(ParseError::new(self.tokens.input_len(), UnexpectedEof)),
        };
        if result.is_ok() {
            self.current_pos_and_token = self.tokens.next();
        }
        result
    }

    fn match_number_and_flags(&mut self) -> Result<(f64, bool, bool), ParseError> {
        // We can't just do self.match_number() here: if we do find a number,
        // the lexer must be told to switch to looking for flags *before* it
        // is advanced to the next token, or it will treat the flag characters
        // as numbers.
        let n = match &self.current_pos_and_token {
            Some((_, Ok(Number(n)))) => Ok(*n),
            Some((pos, Ok(t))) => Err(ParseError::new(*pos, UnexpectedToken(*t))),
            Some((pos, Err(e))) => Err(ParseError::new(*pos, LexError(*e))),
            None => Err(ParseError::new(self.tokens.input_len(), UnexpectedEof)),
        }?;

        self.tokens.require_flags();
        self.current_pos_and_token = self.tokens.next();

        self.eat_optional_comma();
        let f1 = self.match_flag()?;

        self.eat_optional_comma();
        let f2 = self.match_flag()?;

        Ok((n, f1, f2))
    }

    fn match_comma(&mut self) -> Result<(), ParseError> {
        let result = match &self.current_pos_and_token {
            Some((_, Ok(Comma))) => Ok(()),
            Some((pos, Ok(t))) => Err(ParseError::new(*pos, UnexpectedToken(*t))),
            Some((pos, Err(e))) => Err(ParseError::new(*pos, LexError(*e))),
            None => Err(ParseError::new(self.tokens.input_len(), UnexpectedEof)),
        };
        if result.is_ok() {
            self.current_pos_and_token = self.tokens.next();
        }
        result
    }

    fn eat_optional_comma(&mut self) {
        let _ = self.match_comma();
    }

    // Convenience function; like match_number, but eats a leading comma if present.
    fn match_comma_number(&mut self) -> Result<f64, ParseError> {
        self.eat_optional_comma();
        self.match_number()
    }

    fn match_flag(&mut self) -> Result<bool, ParseError> {
        let result = match self.current_pos_and_token {
            Some((_, Ok(Flag(f)))) => Ok(f),
            Some((pos, Ok(t))) => Err(ParseError::new(pos, UnexpectedToken(t))),
            Some((pos, Err(e))) => Err(ParseError::new(pos, LexError(e))),
            None => Err(ParseError::new(self.tokens.input_len(), UnexpectedEof)),
        };
        if result.is_ok() {
            self.current_pos_and_token = self.tokens.next();
        }
        result
    }

    // peek_* methods are the twins of match_*, but don't consume the token

    fn peek_command(&mut self) -> Option<u8> {
        match &self.current_pos_and_token {
            Some((_, Ok(Command(c)))) => Some(*c),
            _ => None,
        }
    }

    fn peek_number(&mut self) -> Option<f64> {
        match &self.current_pos_and_token {
            Some((_, Ok(Number(n)))) => Some(*n),
            _ => None,
        }
    }

    /// Entry point for parsing a blob of path data.
    pub fn parse(&mut self) -> Result<(), ParseError> {
        if self.current_pos_and_token.is_none() {
            return Ok(());
        }

        self.moveto_drawto_command_groups()
    }

    fn error(&self, kind: ErrorKind) -> ParseError {
        match self.current_pos_and_token {
            Some((pos, _)) => ParseError {
                position: pos,
                kind,
            },
            None => ParseError { position: 0, kind },
        }
    }

    fn coordinate_pair(&mut self) -> Result<(f64, f64), ParseError> {
        Ok((self.match_number()?, self.match_comma_number()?))
    }

    fn set_current_point(&mut self, x: f64, y: f64) {
        self.current_x = x;
        self.current_y = y;

        self.cubic_reflection_x = self.current_x;
        self.cubic_reflection_y = self.current_y;

        self.quadratic_reflection_x = self.current_x;
        self.quadratic_reflection_y = self.current_y;
    }

    fn set_cubic_reflection_and_current_point(&mut self, x3: f64, y3: f64, x4: f64, y4: f64) {
        self.cubic_reflection_x = x3;
        self.cubic_reflection_y = y3;

        self.current_x = x4;
        self.current_y = y4;

        self.quadratic_reflection_x = self.current_x;
        self.quadratic_reflection_y = self.current_y;
    }

    fn set_quadratic_reflection_and_current_point(&mut self, a: f64, b: f64, c: f64, d: f64) {
        self.quadratic_reflection_x = a;
        self.quadratic_reflection_y = b;

        self.current_x = c;
        self.current_y = d;

        self.cubic_reflection_x = self.current_x;
        self.cubic_reflection_y = self.current_y;
    }

    fn emit_move_to(&mut self, x: f64, y: f64) {
        self.set_current_point(x, y);

        self.subpath_start_x = self.current_x;
        self.subpath_start_y = self.current_y;

        self.builder.move_to(self.current_x, self.current_y);
    }

    fn emit_line_to(&mut self, x: f64, y: f64) {
        self.set_current_point(x, y);

        self.builder.line_to(self.current_x, self.current_y);
    }

    fn emit_curve_to(&mut self, x2: f64, y2: f64, x3: f64, y3: f64, x4: f64, y4: f64) {
        self.set_cubic_reflection_and_current_point(x3, y3, x4, y4);

        self.builder.curve_to(x2, y2, x3, y3, x4, y4);
    }

    fn emit_quadratic_curve_to(&mut self, a: f64, b: f64, c: f64, d: f64) {
        // raise the quadratic Bézier to cubic
        let x2 = (self.current_x + 2.0 * a) / 3.0;
        let y2 = (self.current_y + 2.0 * b) / 3.0;
        let x4 = c;
        let y4 = d;
        let x3 = (x4 + 2.0 * a) / 3.0;
        let y3 = (y4 + 2.0 * b) / 3.0;

        self.set_quadratic_reflection_and_current_point(a, b, c, d);

        self.builder.quadratic_curve_to(x2, y2, x3, y3, x4, y4);
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_arc(
        &mut self,
        rx: f64,
        ry: f64,
        x_axis_rotation: f64,
        large_arc: LargeArc,
        sweep: Sweep,
        x: f64,
        y: f64,
    ) {
        let (start_x, start_y) = (self.current_x, self.current_y);

        self.set_current_point(x, y);

        self.builder.arc(
            start_x,
            start_y,
            rx,
            ry,
            x_axis_rotation,
            large_arc,
            sweep,
            self.current_x,
            self.current_y,
        );
    }

    fn moveto_argument_sequence(&mut self, absolute: bool) -> Result<(), ParseError> {
        let (mut x, mut y) = self.coordinate_pair()?;

        if !absolute {
            x += self.current_x;
            y += self.current_y;
        }

        self.emit_move_to(x, y);

        // further coordinate pairs demote to lineto
        if self.match_comma().is_ok() || self.peek_number().is_some() {
            self.lineto_argument_sequence(absolute)
        } else {
            Ok(())
        }
    }

    fn moveto(&mut self) -> Result<(), ParseError> {
        match self.match_command()? {
            b'M' => self.moveto_argument_sequence(true),
            b'm' => self.moveto_argument_sequence(false),
            c => Err(self.error(ErrorKind::UnexpectedCommand(c))),
        }
    }

    fn moveto_drawto_command_group(&mut self) -> Result<(), ParseError> {
        self.moveto()?;
        self.optional_drawto_commands().map(|_| ())
    }

    fn moveto_drawto_command_groups(&mut self) -> Result<(), ParseError> {
        loop {
            self.moveto_drawto_command_group()?;

            if self.current_pos_and_token.is_none() {
                break;
            }
        }

        Ok(())
    }

    fn optional_drawto_commands(&mut self) -> Result<bool, ParseError> {
        while self.drawto_command()? {
            // everything happens in the drawto_command() calls.
        }

        Ok(false)
    }

    fn match_if_drawto_command_with_absolute(&mut self) -> Option<(u8, bool)> {
        let cmd = self.peek_command();
        let result = match cmd {
            Some(b'M') => None,
            Some(b'm') => None,
            Some(c) => {
                let c_up = c.to_ascii_uppercase();
                if c == c_up {
                    Some((c_up, true))
                } else {
                    Some((c_up, false))
                }
            }
            _ => None,
        };
        if result.is_some() {
            let _ = self.match_command();
        }
        result
    }

    fn drawto_command(&mut self) -> Result<bool, ParseError> {
        match self.match_if_drawto_command_with_absolute() {
            Some((b'Z', _)) => {
                self.emit_close_path();
                Ok(true)
            }
            Some((b'L', abs)) => {
                self.lineto_argument_sequence(abs)?;
                Ok(true)
            }
            Some((b'H', abs)) => {
                self.horizontal_lineto_argument_sequence(abs)?;
                Ok(true)
            }
            Some((b'V', abs)) => {
                self.vertical_lineto_argument_sequence(abs)?;
                Ok(true)
            }
            Some((b'C', abs)) => {
                self.curveto_argument_sequence(abs)?;
                Ok(true)
            }
            Some((b'S', abs)) => {
                self.smooth_curveto_argument_sequence(abs)?;
                Ok(true)
            }
            Some((b'Q', abs)) => {
                self.quadratic_curveto_argument_sequence(abs)?;
                Ok(true)
            }
            Some((b'T', abs)) => {
                self.smooth_quadratic_curveto_argument_sequence(abs)?;
                Ok(true)
            }
            Some((b'A', abs)) => {
                self.elliptical_arc_argument_sequence(abs)?;
                Ok(true)
            }
            Some((c, _)) => Err(self.error(ErrorKind::UnexpectedCommand(c))),
            None => Ok(false),
        }
    }

    fn emit_close_path(&mut self) {
        let (x, y) = (self.subpath_start_x, self.subpath_start_y);
        self.set_current_point(x, y);

        self.builder.close_path();
    }

    fn should_break_arg_sequence(&mut self) -> bool {
        if self.match_comma().is_ok() {
            // A comma means the sequence continues; eat it so the next loop
            // iteration starts at the next argument.
            false
        } else {
            self.peek_number().is_none()
        }
    }

    fn lineto_argument_sequence(&mut self, absolute: bool) -> Result<(), ParseError> {
        loop {
            let (mut x, mut y) = self.coordinate_pair()?;

            if !absolute {
                x += self.current_x;
                y += self.current_y;
            }

            self.emit_line_to(x, y);

            if self.should_break_arg_sequence() {
                break;
            }
        }

        Ok(())
    }

    fn horizontal_lineto_argument_sequence(&mut self, absolute: bool) -> Result<(), ParseError> {
        loop {
            let mut x = self.match_number()?;

            if !absolute {
                x += self.current_x;
            }

            let y = self.current_y;

            self.emit_line_to(x, y);

            if self.should_break_arg_sequence() {
                break;
            }
        }

        Ok(())
    }

    fn vertical_lineto_argument_sequence(&mut self, absolute: bool) -> Result<(), ParseError> {
        loop {
            let mut y = self.match_number()?;

            if !absolute {
                y += self.current_y;
            }

            let x = self.current_x;

            self.emit_line_to(x, y);

            if self.should_break_arg_sequence() {
                break;
            }
        }

        Ok(())
    }

    fn curveto_argument_sequence(&mut self, absolute: bool) -> Result<(), ParseError> {
        loop {
            let (mut x2, mut y2) = self.coordinate_pair()?;

            self.eat_optional_comma();
            let (mut x3, mut y3) = self.coordinate_pair()?;

            self.eat_optional_comma();
            let (mut x4, mut y4) = self.coordinate_pair()?;

            if !absolute {
                x2 += self.current_x;
                y2 += self.current_y;
                x3 += self.current_x;
                y3 += self.current_y;
                x4 += self.current_x;
                y4 += self.current_y;
            }

            self.emit_curve_to(x2, y2, x3, y3, x4, y4);

            if self.should_break_arg_sequence() {
                break;
            }
        }

        Ok(())
    }

    fn smooth_curveto_argument_sequence(&mut self, absolute: bool) -> Result<(), ParseError> {
        loop {
            let (mut x3, mut y3) = self.coordinate_pair()?;
            self.eat_optional_comma();
            let (mut x4, mut y4) = self.coordinate_pair()?;

            if !absolute {
                x3 += self.current_x;
                y3 += self.current_y;
                x4 += self.current_x;
                y4 += self.current_y;
            }

            // The first control point is the reflection of the previous
            // curve's control point; if the previous command was not a curve
            // the reflection state equals the current point.
            let (x2, y2) = (
                self.current_x + self.current_x - self.cubic_reflection_x,
                self.current_y + self.current_y - self.cubic_reflection_y,
            );

            self.emit_curve_to(x2, y2, x3, y3, x4, y4);

            if self.should_break_arg_sequence() {
                break;
            }
        }

        Ok(())
    }

    fn quadratic_curveto_argument_sequence(&mut self, absolute: bool) -> Result<(), ParseError> {
        loop {
            let (mut a, mut b) = self.coordinate_pair()?;
            self.eat_optional_comma();
            let (mut c, mut d) = self.coordinate_pair()?;

            if !absolute {
                a += self.current_x;
                b += self.current_y;
                c += self.current_x;
                d += self.current_y;
            }

            self.emit_quadratic_curve_to(a, b, c, d);

            if self.should_break_arg_sequence() {
                break;
            }
        }

        Ok(())
    }

    fn smooth_quadratic_curveto_argument_sequence(
        &mut self,
        absolute: bool,
    ) -> Result<(), ParseError> {
        loop {
            let (mut c, mut d) = self.coordinate_pair()?;

            if !absolute {
                c += self.current_x;
                d += self.current_y;
            }

            let (a, b) = (
                self.current_x + self.current_x - self.quadratic_reflection_x,
                self.current_y + self.current_y - self.quadratic_reflection_y,
            );

            self.emit_quadratic_curve_to(a, b, c, d);

            if self.should_break_arg_sequence() {
                break;
            }
        }

        Ok(())
    }

    fn elliptical_arc_argument_sequence(&mut self, absolute: bool) -> Result<(), ParseError> {
        loop {
            let rx = self.match_number()?.abs();
            let ry = self.match_comma_number()?.abs();

            self.eat_optional_comma();
            let (x_axis_rotation, f1, f2) = self.match_number_and_flags()?;

            let large_arc = LargeArc(f1);

            let sweep = if f2 { Sweep::Positive } else { Sweep::Negative };

            self.eat_optional_comma();

            let (mut x, mut y) = self.coordinate_pair()?;

            if !absolute {
                x += self.current_x;
                y += self.current_y;
            }

            self.emit_arc(rx, ry, x_axis_rotation, large_arc, sweep, x, y);

            if self.should_break_arg_sequence() {
                break;
            }
        }

        Ok(())
    }
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    UnexpectedToken(Token),
    UnexpectedCommand(u8),
    UnexpectedEof,
    LexError(LexError),
}

#[derive(Debug, PartialEq)]
pub struct ParseError {
    pub position: usize,
    pub kind: ErrorKind,
}

impl ParseError {
    fn new(pos: usize, k: ErrorKind) -> ParseError {
        ParseError {
            position: pos,
            kind: k,
        }
    }
}

use crate::path_parser::ErrorKind::*;

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self.kind {
            UnexpectedToken(_t) => "unexpected token",
            UnexpectedCommand(_c) => "unexpected command",
            UnexpectedEof => "unexpected end of data",
            LexError(_le) => "error processing token",
        };
        write!(f, "error at position {}: {}", self.position, description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_builder::PathCommand;

    fn parse(path_str: &str) -> (Vec<PathCommand>, Result<(), ParseError>) {
        let mut builder = PathBuilder::default();
        let result = builder.parse(path_str);
        let path = builder.into_path();

        assert_eq!(path.is_errored(), result.is_err());

        (path.commands().to_vec(), result)
    }

    fn parse_ok(path_str: &str) -> Vec<PathCommand> {
        let (commands, result) = parse(path_str);
        result.unwrap();
        commands
    }

    fn moveto(x: f64, y: f64) -> PathCommand {
        PathCommand::MoveTo(x, y)
    }

    fn lineto(x: f64, y: f64) -> PathCommand {
        PathCommand::LineTo(x, y)
    }

    fn curveto(x2: f64, y2: f64, x3: f64, y3: f64, x4: f64, y4: f64) -> PathCommand {
        PathCommand::CurveTo(CubicBezierCurve {
            pt1: (x2, y2),
            pt2: (x3, y3),
            to: (x4, y4),
        })
    }

    fn quadto(x2: f64, y2: f64, x3: f64, y3: f64, x4: f64, y4: f64) -> PathCommand {
        PathCommand::QuadraticTo(CubicBezierCurve {
            pt1: (x2, y2),
            pt2: (x3, y3),
            to: (x4, y4),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn arc(
        rx: f64,
        ry: f64,
        xr: f64,
        large_arc: bool,
        sweep: bool,
        x3: f64,
        y3: f64,
        x4: f64,
        y4: f64,
    ) -> PathCommand {
        PathCommand::Arc(EllipticalArc {
            r: (rx, ry),
            x_axis_rotation: xr,
            large_arc: LargeArc(large_arc),
            sweep: if sweep {
                Sweep::Positive
            } else {
                Sweep::Negative
            },
            from: (x3, y3),
            to: (x4, y4),
        })
    }

    #[test]
    fn handles_empty_data() {
        assert!(parse_ok("").is_empty());
    }

    #[test]
    fn handles_numbers() {
        assert_eq!(parse_ok("M 10 20"), vec![moveto(10.0, 20.0)]);
        assert_eq!(parse_ok("M -10 -20"), vec![moveto(-10.0, -20.0)]);
        assert_eq!(parse_ok("M-.10-0.20"), vec![moveto(-0.10, -0.20)]);
        assert_eq!(parse_ok("M10.5.50"), vec![moveto(10.5, 0.50)]);
        assert_eq!(parse_ok("M .10E1 .20e-4"), vec![moveto(1.0, 0.000020)]);
        assert_eq!(parse_ok("M-10.10E2-0.20e-3"), vec![moveto(-1010.0, -0.00020)]);

        // a decimal point right after an exponent starts the next number
        assert_eq!(parse_ok("M1e2.5"), vec![moveto(100.0, 0.5)]);
    }

    #[test]
    fn moveto_implicit_lineto() {
        assert_eq!(
            parse_ok("M10 20 30 40"),
            vec![moveto(10.0, 20.0), lineto(30.0, 40.0)]
        );

        assert_eq!(
            parse_ok("m10 20 30 40"),
            vec![moveto(10.0, 20.0), lineto(40.0, 60.0)]
        );
    }

    #[test]
    fn relative_commands_add_to_current_point() {
        assert_eq!(
            parse_ok("M10 10 l5 6 h4 v-2"),
            vec![
                moveto(10.0, 10.0),
                lineto(15.0, 16.0),
                lineto(19.0, 16.0),
                lineto(19.0, 14.0),
            ]
        );

        // with no prior point, relative behaves as absolute
        assert_eq!(parse_ok("m5 6"), vec![moveto(5.0, 6.0)]);
    }

    #[test]
    fn parses_curves() {
        assert_eq!(
            parse_ok("M0 0 C 1 2 3 4 5 6"),
            vec![moveto(0.0, 0.0), curveto(1.0, 2.0, 3.0, 4.0, 5.0, 6.0)]
        );

        assert_eq!(
            parse_ok("M0 0 c 1 2 3 4 5 6"),
            vec![moveto(0.0, 0.0), curveto(1.0, 2.0, 3.0, 4.0, 5.0, 6.0)]
        );
    }

    #[test]
    fn smooth_curve_reflects_previous_control_point() {
        assert_eq!(
            parse_ok("M0 0 C 1 2 3 4 5 6 S 7 8 9 10"),
            vec![
                moveto(0.0, 0.0),
                curveto(1.0, 2.0, 3.0, 4.0, 5.0, 6.0),
                // first control point = 2 * (5, 6) - (3, 4)
                curveto(7.0, 8.0, 7.0, 8.0, 9.0, 10.0),
            ]
        );

        // S after a non-curve uses the current point as control point
        assert_eq!(
            parse_ok("M1 2 S 7 8 9 10"),
            vec![moveto(1.0, 2.0), curveto(1.0, 2.0, 7.0, 8.0, 9.0, 10.0)]
        );
    }

    #[test]
    fn quadratic_is_raised_to_cubic() {
        assert_eq!(
            parse_ok("M0 0 Q 3 3 6 0"),
            vec![moveto(0.0, 0.0), quadto(2.0, 2.0, 4.0, 2.0, 6.0, 0.0)]
        );
    }

    #[test]
    fn smooth_quadratic_reflects_control_point() {
        assert_eq!(
            parse_ok("M0 0 Q 3 3 6 0 T 12 0"),
            vec![
                moveto(0.0, 0.0),
                quadto(2.0, 2.0, 4.0, 2.0, 6.0, 0.0),
                // reflected control point = 2 * (6, 0) - (3, 3) = (9, -3)
                quadto(8.0, -2.0, 10.0, -2.0, 12.0, 0.0),
            ]
        );
    }

    #[test]
    fn parses_arcs_with_packed_flags() {
        assert_eq!(
            parse_ok("M1 2 A5 5 0 1 0 7 2"),
            vec![
                moveto(1.0, 2.0),
                arc(5.0, 5.0, 0.0, true, false, 1.0, 2.0, 7.0, 2.0)
            ]
        );

        // flags need not be separated from the following coordinates
        assert_eq!(
            parse_ok("M1 2 a5 5 0 017 2"),
            vec![
                moveto(1.0, 2.0),
                arc(5.0, 5.0, 0.0, false, true, 1.0, 2.0, 8.0, 4.0)
            ]
        );
    }

    #[test]
    fn close_resets_to_subpath_start() {
        assert_eq!(
            parse_ok("M10 10 L20 10 20 20 Z l5 5"),
            vec![
                moveto(10.0, 10.0),
                lineto(20.0, 10.0),
                lineto(20.0, 20.0),
                PathCommand::ClosePath,
                lineto(15.0, 15.0),
            ]
        );
    }

    #[test]
    fn error_keeps_parsed_prefix() {
        let (commands, result) = parse("M10 10 L20 20 !");
        assert_eq!(commands, vec![moveto(10.0, 10.0), lineto(20.0, 20.0)]);

        let err = result.unwrap_err();
        assert_eq!(err.position, 14);
        assert_eq!(err.kind, ErrorKind::LexError(super::LexError::UnexpectedByte(b'!')));
    }

    #[test]
    fn unrecognized_command_is_an_error() {
        let (commands, result) = parse("M10 10 F20 20");
        assert_eq!(commands, vec![moveto(10.0, 10.0)]);
        assert!(matches!(
            result.unwrap_err().kind,
            ErrorKind::UnexpectedCommand(b'F')
        ));
    }

    #[test]
    fn detects_bogus_numbers() {
        assert!(parse("M+").1.is_err());
        assert!(parse("M10e").1.is_err());
        assert!(parse("M10e+x").1.is_err());
    }

    #[test]
    fn number_before_moveto_is_an_error() {
        let (commands, result) = parse("10 20 M1 2");
        assert!(commands.is_empty());
        assert!(result.is_err());
    }
}
