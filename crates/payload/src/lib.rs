mod decode;
mod extract;
mod literal;

pub use decode::{decode, decode_text, DecodeError};
pub use extract::{
    as_float, as_int, as_text, dig, dig_first, first_list, first_text, parse_geo_point, FieldPath,
};
pub use literal::parse_literal;
