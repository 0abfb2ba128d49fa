use anyhow::Result;

/// One meaningful line of an INI file.
#[derive(Debug, PartialEq, Eq)]
pub enum Item<'a> {
    /// `[section]` header; contents apply to this section until the next header.
    Section(&'a str),
    /// `key=value` assignment.
    Assignment(&'a str, &'a str),
}

#[derive(Debug, thiserror::Error)]
#[error("bad INI syntax at byte {at}, in line '{line}': {detail}")]
pub struct Error {
    at: usize,
    line: String,
    detail: String,
}

pub fn parse(text: &str) -> Result<Vec<Item<'_>>> {
    use combine::EasyParser;
    ini::items()
        .easy_parse(text)
        .map(|(items, _remainder)| items)
        .map_err(|e| {
            let at = e.position.translate_position(text);
            // report just the offending line:
            let start = text[..at].rfind('\n').map_or(0, |i| i + 1);
            let end = text[at..].find('\n').map_or(text.len(), |i| at + i);
            // combine's error type borrows the input, so keep it stringified:
            Error {
                at,
                line: text[start..end].to_string(),
                detail: format!("{}", e),
            }
            .into()
        })
}

pub mod util {

    use combine::parser::char::{alpha_num, char, letter, space};
    use combine::parser::range::recognize;
    use combine::{between, eof, one_of, optional, satisfy, skip_many, skip_many1, Parser};

    rule! {
        ident() -> &'a str, {
            recognize(letter().or(char('_')).and(skip_many(alpha_num().or(char('_')))))
        }
    }

    // runs to the end of the line but leaves the newline itself for
    // blank(), so a comment on the last line still parses.
    rule! {
        comment() -> (), {
            one_of("#;".chars())
                .and(skip_many(satisfy(|c: char| c != '\n')))
                .map(|_| ())
        }
    }

    rule! {
        blank() -> (), {
            skip_many1(comment().or(space().map(|_| ())))
        }
    }

    rule! {
        pad() -> (), {
            skip_many1(satisfy(|c: char| c == ' ' || c == '\t' || c == '\r'))
        }
    }

    wrap! {
        padded(parser), {
            between(optional(pad()), optional(pad()), parser)
        }
    }

    wrap! {
        bracketed(parser), {
            between(char('['), char(']'), parser)
        }
    }

    rule! {
        eol() -> (), {
            char('\n').and(optional(blank())).map(|_| ()).or(eof())
        }
    }

    wrap! {
        line(parser), {
            padded(parser).skip(eol())
        }
    }

}

mod ini {

    use combine::parser::char::char;
    use combine::parser::range::recognize;
    use combine::{eof, many, optional, satisfy, skip_many, Parser};

    use super::util::*;
    use super::Item;

    rule! {
        section() -> Item<'a>, {
            bracketed(ident()).map(Item::Section)
        }
    }

    // everything to the end of the line, trailing whitespace dropped.
    rule! {
        value() -> &'a str, {
            recognize(skip_many(satisfy(|c: char| c != '\n'))).map(|v: &str| v.trim_end())
        }
    }

    rule! {
        assignment() -> Item<'a>, {
            ident()
                .skip(padded(char('=')))
                .and(value())
                .map(|(k, v)| Item::Assignment(k, v))
        }
    }

    rule! {
        item() -> Item<'a>, {
            line(section().or(assignment()))
        }
    }

    rule! {
        items() -> Vec<Item<'a>>, {
            optional(blank()).with(many(item())).skip(eof())
        }
    }
}
