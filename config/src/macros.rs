//! Shorthand for the combine parsers in `parse`: `rule!` declares a named
//! parser over `&str` input, `wrap!` a combinator that decorates another
//! parser. Both exist to keep the `combine::parser!` where-clause out of
//! the grammar definitions.

macro_rules! rule (
    ($name:ident( $($arg: ident :  $arg_type: ty),* ) -> $ret:ty, $body:expr) => (
        combine::parser!{
            pub fn $name['a, I]($($arg : $arg_type),*)(I) -> $ret
                where
                [I: combine::stream::RangeStream<
                 Range = &'a str,
                 Token = char>,
                 I::Error: combine::ParseError<char, &'a str, <I as combine::stream::StreamOnce>::Position>,
            ]            {
                $body
            }
        }
    );
);

macro_rules! wrap {
    ($name:ident($inner: ident), $body:expr) => (
        combine::parser!{
            pub fn $name['a, I, P]($inner: P)(I) -> P::Output
                where
                [I: combine::stream::RangeStream<
                 Range = &'a str,
                 Token = char>,
                 I::Error: combine::ParseError<char, &'a str, <I as combine::stream::StreamOnce>::Position>,
                 P: combine::Parser<I>,
            ]            {
                $body
            }
        }
    );
}
