mod centavos;

pub mod op;
mod secret;

pub use centavos::{Centavos, CentavosConversionError, BRL_CURRENCY_CODE, BRL_CURRENCY_CODE_LOWER};
pub use secret::Secret;
